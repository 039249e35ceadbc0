//! Error types for graph construction and pipeline runs.

use std::path::PathBuf;

use thiserror::Error;

use crate::completion::CompletionError;
use crate::tools::pdf_search::ToolError;

/// Malformed graph. Always a construction-time defect, never a consequence
/// of run-time data.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("duplicate stage id `{0}`")]
    DuplicateStage(String),

    #[error("stage `{stage}` depends on unknown stage `{dependency}`")]
    UnknownDependency { stage: String, dependency: String },

    #[error("stage `{stage}` depends on `{dependency}`, which is declared later")]
    ForwardDependency { stage: String, dependency: String },

    #[error("dependency cycle involving stage `{0}`")]
    Cycle(String),
}

/// A stage's invocation failed. Fatal to the run; carries the failing stage
/// and the underlying cause.
#[derive(Debug, Error)]
#[error("stage `{stage_id}` failed: {cause}")]
pub struct StageError {
    pub stage_id: String,
    #[source]
    pub cause: StageFailure,
}

#[derive(Debug, Error)]
pub enum StageFailure {
    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("output is not valid {expected}: {reason}")]
    InvalidOutput {
        expected: &'static str,
        reason: String,
    },

    #[error("failed to write artifact `{}`: {source}", path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("stage task aborted: {0}")]
    Aborted(#[from] tokio::task::JoinError),
}

/// Terminal stages missing or empty — a graph/configuration defect rather
/// than a runtime data problem.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("terminal stage `{0}` is not part of the graph")]
    MissingTerminal(String),

    #[error("terminal stage `{0}` produced no output")]
    EmptyTerminal(String),
}

/// Everything a pipeline run can fail with.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Stage(#[from] StageError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
