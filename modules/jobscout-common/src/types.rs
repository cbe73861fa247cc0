/// One scored posting. Immutable once created; owned by the aggregator
/// until the ranked report is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationResult {
    pub source_id: String,
    pub title: String,
    /// Suitability score parsed from the first line of the model response.
    /// 0 when the first line carried no parseable number.
    pub score: u32,
    /// Full narrative assessment from the model, first line included.
    pub analysis: String,
}
