//! Résumé evaluation pipeline — builds the per-run worker set and stage
//! graph, executes it, and shapes the terminal outputs.
//!
//! Flow: extract (JD ∥ résumé) → analyze JD / user input / résumé →
//! evaluate → advise → final judgement + rewrite. The work is split across
//! two backends: extraction, analysis, and rewriting on OpenAI; the
//! judgement-flavored stages on Gemini.

pub mod handlers;
pub mod models;
pub mod prompts;

use std::path::PathBuf;
use std::sync::Arc;

use crate::completion::{strip_code_fences, Backends};
use crate::errors::AppError;
use crate::evaluation::models::JudgementReport;
use crate::pipeline::{
    GraphError, OutputShape, PipelineGraph, ProgressObserver, Runner, Stage, TaskTemplate,
    TerminalStages, Worker,
};
use crate::tools::pdf_search::PdfSearchTool;

/// Stage whose JSON output becomes the judgement half of the run result.
pub const JUDGEMENT_STAGE: &str = "final_judgement";
/// Stage whose markdown output becomes the rewritten résumé.
pub const REWRITE_STAGE: &str = "resume_rewrite";

/// Per-run inputs handed over by the upload handler.
#[derive(Debug, Clone)]
pub struct EvaluationInputs {
    pub jd_path: PathBuf,
    pub resume_path: PathBuf,
    pub additional_info: String,
    /// Run-private directory for stage artifacts. Must already exist.
    pub artifact_dir: PathBuf,
}

/// Everything the caller needs from a finished run.
#[derive(Debug)]
pub struct EvaluationOutcome {
    pub judgement: JudgementReport,
    pub improved_resume: String,
    pub artifacts: Vec<PathBuf>,
}

/// Builds the nine-stage graph for one run. Workers and stages are
/// constructed fresh from the static templates plus the run's inputs and
/// discarded with the run; nothing is shared across runs except the backend
/// clients.
pub fn build_graph(
    inputs: &EvaluationInputs,
    backends: &Backends,
) -> Result<PipelineGraph, GraphError> {
    let json_role = |role: &str| format!("{role} {}", prompts::JSON_ONLY);

    let jd_extractor = Arc::new(
        Worker::new(
            "job_description_extractor",
            prompts::JD_EXTRACTOR_ROLE,
            Arc::clone(&backends.openai),
        )
        .with_tool(PdfSearchTool::new(&inputs.jd_path)),
    );
    let jd_analyst = Arc::new(Worker::new(
        "job_description_analyst",
        json_role(prompts::JD_ANALYST_ROLE),
        Arc::clone(&backends.openai),
    ));
    let resume_extractor = Arc::new(
        Worker::new(
            "resume_extractor",
            prompts::RESUME_EXTRACTOR_ROLE,
            Arc::clone(&backends.openai),
        )
        .with_tool(PdfSearchTool::new(&inputs.resume_path)),
    );
    let user_input_analyst = Arc::new(Worker::new(
        "user_input_analyst",
        prompts::USER_INPUT_ANALYST_ROLE,
        Arc::clone(&backends.openai),
    ));
    let resume_analyst = Arc::new(Worker::new(
        "resume_analyst",
        json_role(prompts::RESUME_ANALYST_ROLE),
        Arc::clone(&backends.openai),
    ));
    let evaluator = Arc::new(Worker::new(
        "evaluator",
        prompts::EVALUATOR_ROLE,
        Arc::clone(&backends.gemini),
    ));
    let advisor = Arc::new(Worker::new(
        "advisor",
        prompts::ADVISOR_ROLE,
        Arc::clone(&backends.gemini),
    ));
    let reporter = Arc::new(Worker::new(
        "reporter",
        json_role(prompts::REPORTER_ROLE),
        Arc::clone(&backends.gemini),
    ));
    let resume_writer = Arc::new(Worker::new(
        "resume_writer",
        prompts::RESUME_WRITER_ROLE,
        Arc::clone(&backends.openai),
    ));

    let template = |description: &str, expected: &str, shape: OutputShape| TaskTemplate {
        description: description.to_string(),
        expected_output: expected.to_string(),
        shape,
    };
    let artifact = |name: &str| Some(inputs.artifact_dir.join(name));

    let stages = vec![
        Stage {
            id: "job_description_extraction".to_string(),
            label: "Extracting data from Job Description".to_string(),
            template: template(
                prompts::JD_EXTRACTION_TASK,
                prompts::JD_EXTRACTION_OUTPUT,
                OutputShape::Text,
            ),
            worker: jd_extractor,
            depends_on: vec![],
            artifact_path: None,
            concurrent: true,
        },
        Stage {
            id: "job_description_analysis".to_string(),
            label: "Analyzing Job Description".to_string(),
            template: template(
                prompts::JD_ANALYSIS_TASK,
                prompts::JD_ANALYSIS_OUTPUT,
                OutputShape::Json,
            ),
            worker: jd_analyst,
            depends_on: vec!["job_description_extraction".to_string()],
            artifact_path: artifact("job_description_analysis.json"),
            concurrent: false,
        },
        Stage {
            id: "resume_extraction".to_string(),
            label: "Extracting data from Resume".to_string(),
            template: template(
                prompts::RESUME_EXTRACTION_TASK,
                prompts::RESUME_EXTRACTION_OUTPUT,
                OutputShape::Text,
            ),
            worker: resume_extractor,
            depends_on: vec![],
            artifact_path: None,
            concurrent: true,
        },
        Stage {
            id: "user_input_analysis".to_string(),
            label: "Analyzing user input".to_string(),
            template: TaskTemplate {
                description: prompts::user_input_task(&inputs.additional_info),
                expected_output: prompts::USER_INPUT_OUTPUT.to_string(),
                shape: OutputShape::Text,
            },
            worker: user_input_analyst,
            depends_on: vec![],
            artifact_path: None,
            concurrent: false,
        },
        Stage {
            id: "resume_analysis".to_string(),
            label: "Analyzing Resume".to_string(),
            template: template(
                prompts::RESUME_ANALYSIS_TASK,
                prompts::RESUME_ANALYSIS_OUTPUT,
                OutputShape::Json,
            ),
            worker: resume_analyst,
            depends_on: vec![
                "resume_extraction".to_string(),
                "user_input_analysis".to_string(),
            ],
            artifact_path: artifact("resume_analysis.json"),
            concurrent: false,
        },
        Stage {
            id: "evaluation".to_string(),
            label: "Evaluating Resume against Job Description".to_string(),
            template: template(
                prompts::EVALUATION_TASK,
                prompts::EVALUATION_OUTPUT,
                OutputShape::Text,
            ),
            worker: evaluator,
            depends_on: vec![
                "job_description_analysis".to_string(),
                "resume_analysis".to_string(),
            ],
            artifact_path: artifact("evaluation.md"),
            concurrent: false,
        },
        Stage {
            id: "advice".to_string(),
            label: "Generating suggestions for improvements".to_string(),
            template: template(prompts::ADVICE_TASK, prompts::ADVICE_OUTPUT, OutputShape::Text),
            worker: advisor,
            depends_on: vec![
                "job_description_analysis".to_string(),
                "resume_analysis".to_string(),
                "evaluation".to_string(),
            ],
            artifact_path: artifact("advice.md"),
            concurrent: false,
        },
        Stage {
            id: JUDGEMENT_STAGE.to_string(),
            label: "Preparing final results".to_string(),
            template: template(
                prompts::FINAL_JUDGEMENT_TASK,
                prompts::FINAL_JUDGEMENT_OUTPUT,
                OutputShape::Json,
            ),
            worker: reporter,
            depends_on: vec!["evaluation".to_string(), "advice".to_string()],
            artifact_path: artifact("final_judgement.json"),
            concurrent: false,
        },
        Stage {
            id: REWRITE_STAGE.to_string(),
            label: "Generating improved resume".to_string(),
            template: template(
                prompts::RESUME_REWRITE_TASK,
                prompts::RESUME_REWRITE_OUTPUT,
                OutputShape::Text,
            ),
            worker: resume_writer,
            depends_on: vec![
                "resume_analysis".to_string(),
                "evaluation".to_string(),
                "advice".to_string(),
            ],
            artifact_path: artifact("improved_resume.md"),
            concurrent: false,
        },
    ];

    PipelineGraph::new(stages)
}

/// Runs the full pipeline and shapes the result for the calling layer.
pub async fn evaluate(
    inputs: EvaluationInputs,
    backends: &Backends,
    observer: Option<ProgressObserver>,
) -> Result<EvaluationOutcome, AppError> {
    let graph = build_graph(&inputs, backends)?;
    let terminals = TerminalStages {
        judgement: JUDGEMENT_STAGE.to_string(),
        rewrite: REWRITE_STAGE.to_string(),
    };

    let mut runner = Runner::new(graph, terminals);
    if let Some(observer) = observer {
        runner = runner.with_observer(observer);
    }

    let result = runner.run().await?;

    let judgement: JudgementReport = serde_json::from_str(strip_code_fences(&result.judgement))
        .map_err(|e| AppError::Llm(format!("judgement stage returned an unexpected shape: {e}")))?;
    let improved_resume = strip_code_fences(&result.rewrite).trim().to_string();

    Ok(EvaluationOutcome {
        judgement,
        improved_resume,
        artifacts: result.artifacts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::stub;
    use std::io::Write;
    use std::sync::Mutex;

    fn write_fixture(dir: &std::path::Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{content}").unwrap();
        path
    }

    fn stub_backends() -> Backends {
        let json_role = |role: &str| format!("{role} {}", prompts::JSON_ONLY);
        let judgement = r#"{"Evaluating Score": 74, "Evaluating Statement": "Solid fit.", "Suggestions": ["Quantify impact"]}"#;

        let openai = stub()
            .respond(&json_role(prompts::JD_ANALYST_ROLE), r#"{"title": "Engineer"}"#)
            .respond(
                &json_role(prompts::RESUME_ANALYST_ROLE),
                r#"{"summary": "Backend engineer"}"#,
            )
            .respond(
                prompts::RESUME_WRITER_ROLE,
                "```markdown\n# Jane Doe\n\nBackend Engineer\n```",
            )
            .into_capability();
        let gemini = stub()
            .respond(&json_role(prompts::REPORTER_ROLE), judgement)
            .into_capability();

        Backends { openai, gemini }
    }

    fn inputs(dir: &std::path::Path) -> EvaluationInputs {
        let jd_path = write_fixture(dir, "job_description.txt", "Rust engineer wanted.");
        let resume_path = write_fixture(dir, "resume.txt", "Jane Doe, backend engineer.");
        let artifact_dir = dir.join("artifacts");
        std::fs::create_dir_all(&artifact_dir).unwrap();
        EvaluationInputs {
            jd_path,
            resume_path,
            additional_info: "Targeting systems roles.".to_string(),
            artifact_dir,
        }
    }

    #[test]
    fn test_graph_builds_with_declaration_order_already_topological() {
        let dir = tempfile::tempdir().unwrap();
        let graph = build_graph(&inputs(dir.path()), &stub_backends()).unwrap();

        assert_eq!(graph.len(), 9);
        let expected: Vec<usize> = (0..9).collect();
        assert_eq!(graph.topological_order(), expected.as_slice());
        assert!(graph.stage(JUDGEMENT_STAGE).is_some());
        assert!(graph.stage(REWRITE_STAGE).is_some());
    }

    #[test]
    fn test_only_extraction_stages_are_concurrent() {
        let dir = tempfile::tempdir().unwrap();
        let graph = build_graph(&inputs(dir.path()), &stub_backends()).unwrap();

        let concurrent: Vec<&str> = graph
            .stages()
            .iter()
            .filter(|s| s.concurrent)
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(
            concurrent,
            vec!["job_description_extraction", "resume_extraction"]
        );
    }

    #[test]
    fn test_additional_info_is_rendered_into_the_user_input_stage() {
        let dir = tempfile::tempdir().unwrap();
        let graph = build_graph(&inputs(dir.path()), &stub_backends()).unwrap();

        let stage = graph.stage("user_input_analysis").unwrap();
        assert!(stage.template.description.contains("Targeting systems roles."));
    }

    #[tokio::test]
    async fn test_evaluate_end_to_end_with_stub_backends() {
        let dir = tempfile::tempdir().unwrap();
        let inputs = inputs(dir.path());
        let artifact_dir = inputs.artifact_dir.clone();

        let seen: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let observer: ProgressObserver =
            Arc::new(move |_, ordinal| sink.lock().unwrap().push(ordinal));

        let outcome = evaluate(inputs, &stub_backends(), Some(observer))
            .await
            .unwrap();

        assert_eq!(outcome.judgement.statement, "Solid fit.");
        assert_eq!(outcome.improved_resume, "# Jane Doe\n\nBackend Engineer");
        assert_eq!(outcome.artifacts.len(), 6);

        // One gapless progress event per stage.
        assert_eq!(seen.lock().unwrap().clone(), (1..=9).collect::<Vec<_>>());

        // The judgement artifact is on disk, verbatim stage output.
        let judgement_file =
            std::fs::read_to_string(artifact_dir.join("final_judgement.json")).unwrap();
        assert!(judgement_file.contains("Evaluating Score"));
    }
}
