use thiserror::Error;

use crate::reference::Category;

/// Terminal failures of a pipeline run. A run yields either a full ranking or one of these.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Settings are inconsistent or unusable.
    #[error("invalid configuration: {0:#}")]
    Config(anyhow::Error),

    /// A reference layer source is missing or unreadable.
    #[error("failed to load {category} reference layer: {source:#}")]
    Reference {
        category: Category,
        #[source]
        source: anyhow::Error,
    },

    /// The supplied geometries are unusable (unsupported format, nothing to score).
    #[error("invalid input: {0:#}")]
    Input(anyhow::Error),

    /// A collection could not be expressed in the requested CRS.
    #[error("reprojection failed: {0:#}")]
    Projection(anyhow::Error),

    /// Derived columns could not be computed or attached.
    #[error("scoring failed: {0:#}")]
    Scoring(anyhow::Error),

    /// Results could not be written.
    #[error("failed to write output: {0:#}")]
    Output(anyhow::Error),
}
