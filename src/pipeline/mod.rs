mod error;
mod pipeline;

pub use error::PipelineError;
pub use pipeline::{Pipeline, PipelineOptions, Ranking, RANK};
