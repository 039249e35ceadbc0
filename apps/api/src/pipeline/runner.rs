//! Execution engine: walks the graph in topological order, dispatches
//! concurrent stages onto tasks, serializes around barrier stages, and
//! assembles the terminal result.
//!
//! Scheduling rules, all deliberately conservative:
//! - a progress event fires before each dispatch, once per stage, ordinals
//!   1..=n — including for a stage that subsequently fails;
//! - a stage's context is exactly its `depends_on` outputs in declared
//!   order; the control task blocks on an in-flight dependency at the point
//!   a dependent needs it, and joins in dispatch order;
//! - a `concurrent: false` stage drains every in-flight task before it runs
//!   and completes before anything later is dispatched — serial stages
//!   double as synchronization barriers for shared downstream artifacts;
//! - outputs are recorded and artifacts written on the control task only,
//!   so writes land in a deterministic order;
//! - the first failure stops dispatch, aborts what is still running, and
//!   fails the run. Artifacts already written stay on disk.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::pipeline::error::{PipelineError, RunError, StageError, StageFailure};
use crate::pipeline::graph::PipelineGraph;

/// Observer invoked once per stage, right before dispatch: `(label, ordinal)`.
/// Runs inline on the control task; a slow observer slows the pipeline and
/// that is the caller's problem.
pub type ProgressObserver = Arc<dyn Fn(&str, usize) + Send + Sync>;

/// Ids of the two stages whose output forms the run result.
#[derive(Debug, Clone)]
pub struct TerminalStages {
    pub judgement: String,
    pub rewrite: String,
}

/// Terminal outputs plus the artifact paths actually written, in write order.
#[derive(Debug)]
pub struct RunResult {
    pub judgement: String,
    pub rewrite: String,
    pub artifacts: Vec<PathBuf>,
}

/// Per-run mutable state. The context map only ever grows, and only the
/// control task touches it.
#[derive(Default)]
struct RunState {
    context: HashMap<String, String>,
    in_flight: Vec<(usize, JoinHandle<Result<String, StageError>>)>,
    artifacts: Vec<PathBuf>,
}

impl RunState {
    fn abort_in_flight(&mut self) {
        for (_, handle) in self.in_flight.drain(..) {
            handle.abort();
        }
    }
}

/// Dropping a run mid-flight (caller timeout, failure unwind) must stop
/// outstanding stage tasks rather than leak them.
impl Drop for RunState {
    fn drop(&mut self) {
        self.abort_in_flight();
    }
}

pub struct Runner {
    graph: PipelineGraph,
    terminals: TerminalStages,
    observer: Option<ProgressObserver>,
}

impl Runner {
    pub fn new(graph: PipelineGraph, terminals: TerminalStages) -> Self {
        Self {
            graph,
            terminals,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: ProgressObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Executes every stage exactly once and assembles the run result.
    pub async fn run(&self) -> Result<RunResult, RunError> {
        let mut state = RunState::default();
        debug!(stages = self.graph.len(), "starting pipeline run");

        for (position, &index) in self.graph.topological_order().iter().enumerate() {
            let stage = &self.graph.stages()[index];

            if let Some(observer) = &self.observer {
                observer(&stage.label, position + 1);
            }
            debug!(stage = %stage.id, ordinal = position + 1, "stage ready");

            // Settle any dependency still in flight, then copy the upstream
            // outputs in depends_on order. Validation guarantees every
            // dependency was dispatched earlier in this walk.
            let mut context = Vec::with_capacity(stage.depends_on.len());
            for dependency in &stage.depends_on {
                if !state.context.contains_key(dependency.as_str()) {
                    self.settle(&mut state, Some(dependency.as_str())).await?;
                }
                context.push(state.context[dependency.as_str()].clone());
            }

            if stage.concurrent {
                let worker = Arc::clone(&stage.worker);
                let template = stage.template.clone();
                let stage_id = stage.id.clone();
                debug!(stage = %stage.id, worker = %stage.worker.id(), "dispatching concurrent stage");
                let handle = tokio::spawn(async move {
                    worker
                        .execute(&template, &context)
                        .await
                        .map_err(|cause| StageError { stage_id, cause })
                });
                state.in_flight.push((index, handle));
            } else {
                // Barrier: nothing may overlap with a serial stage.
                self.settle(&mut state, None).await?;
                let output = stage
                    .worker
                    .execute(&stage.template, &context)
                    .await
                    .map_err(|cause| StageError {
                        stage_id: stage.id.clone(),
                        cause,
                    })?;
                self.record(&mut state, index, output).await?;
            }
        }

        // Join any concurrent stage nothing downstream depended on.
        self.settle(&mut state, None).await?;

        self.assemble(state)
    }

    /// Joins in-flight stages in dispatch order. With `until` set, stops once
    /// that stage's output is recorded; with `None`, drains everything
    /// (barrier semantics).
    async fn settle(&self, state: &mut RunState, until: Option<&str>) -> Result<(), RunError> {
        while !state.in_flight.is_empty() {
            let (index, handle) = state.in_flight.remove(0);
            let stage = &self.graph.stages()[index];

            let output = match handle.await {
                Ok(Ok(output)) => output,
                Ok(Err(stage_error)) => return Err(stage_error.into()),
                Err(join_error) => {
                    return Err(StageError {
                        stage_id: stage.id.clone(),
                        cause: StageFailure::Aborted(join_error),
                    }
                    .into())
                }
            };
            self.record(state, index, output).await?;

            if until == Some(stage.id.as_str()) {
                break;
            }
        }
        Ok(())
    }

    /// Appends a completed stage's output to the run context and writes its
    /// artifact. Overwrite semantics: a pre-existing file at the path is
    /// replaced, never appended to.
    async fn record(
        &self,
        state: &mut RunState,
        index: usize,
        output: String,
    ) -> Result<(), RunError> {
        let stage = &self.graph.stages()[index];

        if let Some(path) = &stage.artifact_path {
            tokio::fs::write(path, output.as_bytes())
                .await
                .map_err(|source| StageError {
                    stage_id: stage.id.clone(),
                    cause: StageFailure::Artifact {
                        path: path.clone(),
                        source,
                    },
                })?;
            state.artifacts.push(path.clone());
            debug!(stage = %stage.id, path = %path.display(), "artifact written");
        }

        debug!(stage = %stage.id, "stage complete");
        state.context.insert(stage.id.clone(), output);
        Ok(())
    }

    fn assemble(&self, mut state: RunState) -> Result<RunResult, RunError> {
        let judgement = terminal_output(&state.context, &self.terminals.judgement)?;
        let rewrite = terminal_output(&state.context, &self.terminals.rewrite)?;
        let artifacts = std::mem::take(&mut state.artifacts);

        Ok(RunResult {
            judgement,
            rewrite,
            artifacts,
        })
    }
}

fn terminal_output(
    context: &HashMap<String, String>,
    id: &str,
) -> Result<String, PipelineError> {
    let output = context
        .get(id)
        .ok_or_else(|| PipelineError::MissingTerminal(id.to_string()))?;
    if output.trim().is_empty() {
        return Err(PipelineError::EmptyTerminal(id.to_string()));
    }
    Ok(output.clone())
}
