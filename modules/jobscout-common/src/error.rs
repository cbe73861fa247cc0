use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobScoutError {
    #[error("unknown source: {0}")]
    UnknownSource(String),

    #[error("listing extraction failed: {0}")]
    Extraction(String),

    #[error("detail fetch failed: {0}")]
    Fetch(String),

    #[error("scoring failed: {0}")]
    Scoring(String),

    #[error("browser session error: {0}")]
    Session(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
