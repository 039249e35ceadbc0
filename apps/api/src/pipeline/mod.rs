//! Task pipeline orchestrator — a validated DAG of worker-bound stages,
//! executed in dependency order with explicit context propagation and
//! stage-by-stage progress reporting.
//!
//! Nothing in here knows about résumés, PDFs, or HTTP: the engine sees
//! stages, workers, and templates, and the `evaluation` module supplies the
//! concrete graph.

pub mod error;
pub mod graph;
pub mod runner;
pub mod worker;

pub use error::{GraphError, PipelineError, RunError, StageError, StageFailure};
pub use graph::{OutputShape, PipelineGraph, Stage, TaskTemplate};
pub use runner::{ProgressObserver, RunResult, Runner, TerminalStages};
pub use worker::Worker;

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;

    use crate::completion::{Completion, CompletionError, CompletionRequest};
    use crate::pipeline::graph::{OutputShape, Stage, TaskTemplate};
    use crate::pipeline::worker::Worker;

    #[derive(Default)]
    struct Behavior {
        output: Option<String>,
        delay: Option<Duration>,
        fail: bool,
    }

    /// Scripted completion backend keyed by the worker's role string.
    /// Records call events (`start:<role>` / `end:<role>` / `fail:<role>`)
    /// and the exact prompt each role received.
    #[derive(Default)]
    pub(crate) struct StubCompletion {
        behaviors: HashMap<String, Behavior>,
        events: Arc<Mutex<Vec<String>>>,
        prompts: Arc<Mutex<HashMap<String, String>>>,
    }

    pub(crate) fn stub() -> StubCompletion {
        StubCompletion::default()
    }

    impl StubCompletion {
        pub(crate) fn respond(mut self, role: &str, output: &str) -> Self {
            self.behaviors.entry(role.to_string()).or_default().output =
                Some(output.to_string());
            self
        }

        pub(crate) fn respond_after(mut self, role: &str, output: &str, delay: Duration) -> Self {
            let behavior = self.behaviors.entry(role.to_string()).or_default();
            behavior.output = Some(output.to_string());
            behavior.delay = Some(delay);
            self
        }

        pub(crate) fn fail(mut self, role: &str) -> Self {
            self.behaviors.entry(role.to_string()).or_default().fail = true;
            self
        }

        pub(crate) fn events_handle(&self) -> Arc<Mutex<Vec<String>>> {
            Arc::clone(&self.events)
        }

        pub(crate) fn prompts_handle(&self) -> Arc<Mutex<HashMap<String, String>>> {
            Arc::clone(&self.prompts)
        }

        pub(crate) fn into_capability(self) -> Arc<dyn Completion> {
            Arc::new(self)
        }
    }

    #[async_trait]
    impl Completion for StubCompletion {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
            self.events
                .lock()
                .unwrap()
                .push(format!("start:{}", request.system));
            self.prompts
                .lock()
                .unwrap()
                .insert(request.system.clone(), request.prompt.clone());

            let behavior = self.behaviors.get(&request.system);
            if let Some(delay) = behavior.and_then(|b| b.delay) {
                tokio::time::sleep(delay).await;
            }
            if behavior.map(|b| b.fail).unwrap_or(false) {
                self.events
                    .lock()
                    .unwrap()
                    .push(format!("fail:{}", request.system));
                return Err(CompletionError::Api {
                    status: 500,
                    message: "stub failure".to_string(),
                });
            }

            let output = behavior
                .and_then(|b| b.output.clone())
                .unwrap_or_else(|| format!("{} output", request.system));
            self.events
                .lock()
                .unwrap()
                .push(format!("end:{}", request.system));
            Ok(output)
        }
    }

    /// Plain-text stage whose worker role equals the stage id, so stub
    /// behaviors and recorded events can be keyed by stage.
    pub(crate) fn stage(
        id: &str,
        capability: &Arc<dyn Completion>,
        depends_on: &[&str],
        concurrent: bool,
    ) -> Stage {
        Stage {
            id: id.to_string(),
            label: format!("running {id}"),
            template: TaskTemplate {
                description: format!("task {id}"),
                expected_output: "free text".to_string(),
                shape: OutputShape::Text,
            },
            worker: Arc::new(Worker::new(id, id, Arc::clone(capability))),
            depends_on: depends_on.iter().map(|d| d.to_string()).collect(),
            artifact_path: None,
            concurrent,
        }
    }
}
