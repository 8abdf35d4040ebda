pub mod charts;
mod domain;
mod parser;
mod summary;

pub use charts::{
    ChartError, ChartRenderer, GroupBreakdownChart, ProportionChart, RenderedCharts, Rgb,
    Segment, Slice, StackedRow,
};
pub use domain::{GroupTally, Tally, VoteChoice, VoteRecord};
pub use summary::{VoteSummary, ASSEMBLY_HANDLE, CAMPAIGN_HASHTAG};

#[derive(Debug, thiserror::Error)]
pub enum ScrutinError {
    #[error("failed to read vote record: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid vote record: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("vote record is missing required field `{field}`")]
    MissingField { field: String },
}
