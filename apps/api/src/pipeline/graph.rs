//! Pipeline graph: the declarative shape of one run.
//!
//! Declaration order is load-bearing. It must already be a valid topological
//! order (every dependency declared first), it numbers the progress events,
//! and it breaks ties when two stages become runnable at the same time.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use crate::pipeline::error::GraphError;
use crate::pipeline::worker::Worker;

/// How a stage's output must be shaped. Checked by the worker after the
/// capability returns; a mismatch fails the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    /// Free text / markdown. Must be non-empty.
    Text,
    /// A single JSON value. Code fences are tolerated and stripped.
    Json,
}

/// Declarative specification of one unit of work. The execution engine
/// passes it to the worker verbatim and never looks inside.
#[derive(Debug, Clone)]
pub struct TaskTemplate {
    /// Instructions, fully rendered (per-run inputs already substituted).
    pub description: String,
    /// What the output should look like, appended to the prompt.
    pub expected_output: String,
    pub shape: OutputShape,
}

/// One executable unit of the pipeline.
pub struct Stage {
    /// Unique within a run.
    pub id: String,
    /// Human-readable progress label.
    pub label: String,
    pub template: TaskTemplate,
    pub worker: Arc<Worker>,
    /// Upstream stage ids whose output this stage consumes, in order.
    /// All of them must be declared before this stage.
    pub depends_on: Vec<String>,
    /// When set, the stage's raw output text is written here on completion
    /// (overwrite, never append).
    pub artifact_path: Option<PathBuf>,
    /// `true`: may overlap with other in-flight concurrent stages it does
    /// not depend on. `false`: acts as a barrier (see the runner).
    pub concurrent: bool,
}

/// Validated stage list plus its fixed topological order.
pub struct PipelineGraph {
    stages: Vec<Stage>,
    order: Vec<usize>,
}

impl std::fmt::Debug for PipelineGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineGraph")
            .field(
                "stages",
                &self.stages.iter().map(|s| &s.id).collect::<Vec<_>>(),
            )
            .field("order", &self.order)
            .finish()
    }
}

impl PipelineGraph {
    /// Validates the stage list and fixes the execution order.
    pub fn new(stages: Vec<Stage>) -> Result<Self, GraphError> {
        validate(&stages)?;
        let order = topological_order(&stages)?;
        Ok(Self { stages, order })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Stage indices in execution order. Deterministic: among runnable
    /// candidates the smallest declaration index always comes first, so a
    /// declaration order that is already topological comes back unchanged.
    pub fn topological_order(&self) -> &[usize] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn stage(&self, id: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }
}

fn validate(stages: &[Stage]) -> Result<(), GraphError> {
    let mut declared: HashSet<&str> = HashSet::new();

    for stage in stages {
        if declared.contains(stage.id.as_str()) {
            return Err(GraphError::DuplicateStage(stage.id.clone()));
        }

        for dependency in &stage.depends_on {
            if *dependency == stage.id {
                return Err(GraphError::Cycle(stage.id.clone()));
            }
            if !declared.contains(dependency.as_str()) {
                // Not declared before this stage: either declared later
                // (which would also admit cycles) or entirely unknown.
                if stages.iter().any(|s| s.id == *dependency) {
                    return Err(GraphError::ForwardDependency {
                        stage: stage.id.clone(),
                        dependency: dependency.clone(),
                    });
                }
                return Err(GraphError::UnknownDependency {
                    stage: stage.id.clone(),
                    dependency: dependency.clone(),
                });
            }
        }

        declared.insert(stage.id.as_str());
    }

    Ok(())
}

/// Kahn's algorithm with a min-heap on declaration index, so ties always
/// resolve to the earliest-declared stage. `validate` already rejects the
/// edges that could form a cycle, but the check stays: this function does
/// not assume its input came through `validate`.
fn topological_order(stages: &[Stage]) -> Result<Vec<usize>, GraphError> {
    let index_of: HashMap<&str, usize> = stages
        .iter()
        .enumerate()
        .map(|(index, stage)| (stage.id.as_str(), index))
        .collect();

    let mut indegree = vec![0usize; stages.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); stages.len()];

    for (index, stage) in stages.iter().enumerate() {
        for dependency in &stage.depends_on {
            let upstream = *index_of.get(dependency.as_str()).ok_or_else(|| {
                GraphError::UnknownDependency {
                    stage: stage.id.clone(),
                    dependency: dependency.clone(),
                }
            })?;
            indegree[index] += 1;
            dependents[upstream].push(index);
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = indegree
        .iter()
        .enumerate()
        .filter(|(_, &degree)| degree == 0)
        .map(|(index, _)| Reverse(index))
        .collect();

    let mut order = Vec::with_capacity(stages.len());
    while let Some(Reverse(index)) = ready.pop() {
        order.push(index);
        for &dependent in &dependents[index] {
            indegree[dependent] -= 1;
            if indegree[dependent] == 0 {
                ready.push(Reverse(dependent));
            }
        }
    }

    if order.len() != stages.len() {
        let blocked = indegree
            .iter()
            .position(|&degree| degree > 0)
            .map(|index| stages[index].id.clone())
            .unwrap_or_default();
        return Err(GraphError::Cycle(blocked));
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::{stage, stub};

    #[test]
    fn test_declaration_order_is_returned_when_already_topological() {
        let capability = stub().into_capability();
        let graph = PipelineGraph::new(vec![
            stage("a", &capability, &[], true),
            stage("b", &capability, &[], true),
            stage("c", &capability, &["a", "b"], false),
            stage("d", &capability, &["c"], false),
        ])
        .unwrap();

        assert_eq!(graph.topological_order(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_every_stage_appears_after_its_dependencies() {
        let capability = stub().into_capability();
        let graph = PipelineGraph::new(vec![
            stage("a", &capability, &[], true),
            stage("b", &capability, &["a"], false),
            stage("c", &capability, &["a"], true),
            stage("d", &capability, &["b", "c"], false),
        ])
        .unwrap();

        let order = graph.topological_order();
        let position = |id: &str| {
            order
                .iter()
                .position(|&index| graph.stages()[index].id == id)
                .unwrap()
        };
        assert!(position("a") < position("b"));
        assert!(position("a") < position("c"));
        assert!(position("b") < position("d"));
        assert!(position("c") < position("d"));
    }

    #[test]
    fn test_duplicate_stage_id_is_rejected() {
        let capability = stub().into_capability();
        let err = PipelineGraph::new(vec![
            stage("a", &capability, &[], true),
            stage("a", &capability, &[], false),
        ])
        .unwrap_err();

        assert!(matches!(err, GraphError::DuplicateStage(id) if id == "a"));
    }

    #[test]
    fn test_unknown_dependency_is_rejected() {
        let capability = stub().into_capability();
        let err = PipelineGraph::new(vec![stage("a", &capability, &["ghost"], false)]).unwrap_err();

        assert!(matches!(
            err,
            GraphError::UnknownDependency { stage, dependency }
                if stage == "a" && dependency == "ghost"
        ));
    }

    #[test]
    fn test_forward_dependency_is_rejected() {
        let capability = stub().into_capability();
        let err = PipelineGraph::new(vec![
            stage("a", &capability, &["b"], false),
            stage("b", &capability, &[], false),
        ])
        .unwrap_err();

        assert!(matches!(
            err,
            GraphError::ForwardDependency { stage, dependency }
                if stage == "a" && dependency == "b"
        ));
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let capability = stub().into_capability();
        let err = PipelineGraph::new(vec![stage("a", &capability, &["a"], false)]).unwrap_err();

        assert!(matches!(err, GraphError::Cycle(id) if id == "a"));
    }

    #[test]
    fn test_kahn_tie_break_prefers_earliest_declared() {
        // Three roots, no edges between them: the heap must not reorder.
        let capability = stub().into_capability();
        let graph = PipelineGraph::new(vec![
            stage("first", &capability, &[], true),
            stage("second", &capability, &[], true),
            stage("third", &capability, &[], true),
        ])
        .unwrap();

        assert_eq!(graph.topological_order(), &[0, 1, 2]);
    }

    #[test]
    fn test_stage_lookup_by_id() {
        let capability = stub().into_capability();
        let graph = PipelineGraph::new(vec![stage("only", &capability, &[], false)]).unwrap();

        assert!(graph.stage("only").is_some());
        assert!(graph.stage("missing").is_none());
        assert_eq!(graph.len(), 1);
    }
}
