use std::time::Duration;

use anyhow::{Context, Result};

use crate::listing::{Candidate, NavigationRef};
use crate::traits::RenderSession;

/// Fetch the visible text of one candidate's detail view.
///
/// Click-through: click the stored handle, read the page, then navigate
/// back so the listing is restored for the next candidate. Direct-link:
/// load the URL and read the page. Any render error here (stale handle,
/// navigation failure, unexpected dialog) means the caller skips this
/// candidate, never the batch.
pub async fn fetch(
    session: &mut dyn RenderSession,
    candidate: &Candidate,
    settle: Duration,
) -> Result<String> {
    match &candidate.nav {
        NavigationRef::Click(handle) => {
            session
                .click(*handle)
                .await
                .context("Click navigation failed")?;
            tokio::time::sleep(settle).await;
            let text = session
                .page_text()
                .await
                .context("Failed to read detail page")?;
            session
                .go_back()
                .await
                .context("Back navigation failed")?;
            Ok(text)
        }
        NavigationRef::Direct(url) => {
            session
                .load(url)
                .await
                .with_context(|| format!("Failed to load {url}"))?;
            tokio::time::sleep(settle).await;
            session
                .page_text()
                .await
                .context("Failed to read detail page")
        }
    }
}
