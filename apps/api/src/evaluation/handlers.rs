//! Axum route handler for the analysis API.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use axum::Json;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::evaluation::models::AnalyzeResponse;
use crate::evaluation::{evaluate, EvaluationInputs};
use crate::pipeline::ProgressObserver;
use crate::state::AppState;

struct Upload {
    filename: String,
    data: Bytes,
}

/// POST /analyze
///
/// Multipart form: `resume` (PDF), `job_description` (PDF), `additional_info`
/// (optional text). Stages the uploads in a run-private temp directory, runs
/// the evaluation pipeline, and returns the judgement plus the rewritten
/// résumé. The temp directory (and the uploads with it) is deleted when the
/// run ends; artifacts stay under the run's output directory and are served
/// at `improved_resume_path`.
pub async fn handle_analyze(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let mut resume_upload: Option<Upload> = None;
    let mut jd_upload: Option<Upload> = None;
    let mut additional_info = String::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("resume") => resume_upload = Some(read_pdf_field(field, "resume").await?),
            Some("job_description") => {
                jd_upload = Some(read_pdf_field(field, "job_description").await?)
            }
            Some("additional_info") => {
                additional_info = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Could not read additional_info: {e}")))?;
            }
            _ => {}
        }
    }

    let resume_upload =
        resume_upload.ok_or_else(|| AppError::Validation("Missing `resume` file".to_string()))?;
    let jd_upload = jd_upload
        .ok_or_else(|| AppError::Validation("Missing `job_description` file".to_string()))?;

    let run_id = Uuid::new_v4();

    // Uploads live in a run-private temp dir; dropping it deletes them.
    let staging = tempfile::tempdir()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create staging dir: {e}")))?;
    let resume_path = staging.path().join("resume.pdf");
    let jd_path = staging.path().join("job_description.pdf");
    tokio::fs::write(&resume_path, &resume_upload.data)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to stage resume: {e}")))?;
    tokio::fs::write(&jd_path, &jd_upload.data)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to stage job description: {e}")))?;

    let artifact_dir = state.config.output_dir.join(run_id.to_string());
    tokio::fs::create_dir_all(&artifact_dir)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to create artifact dir: {e}")))?;

    info!(
        %run_id,
        resume = %resume_upload.filename,
        job_description = %jd_upload.filename,
        "starting evaluation run"
    );

    let progress: ProgressObserver = Arc::new(move |label: &str, ordinal: usize| {
        info!(%run_id, ordinal, "{label}");
    });

    let outcome = evaluate(
        EvaluationInputs {
            jd_path,
            resume_path,
            additional_info,
            artifact_dir,
        },
        &state.backends,
        Some(progress),
    )
    .await?;

    info!(%run_id, artifacts = outcome.artifacts.len(), "evaluation run complete");

    Ok(Json(AnalyzeResponse {
        judgement: outcome.judgement,
        improved_resume: outcome.improved_resume,
        improved_resume_path: format!("output/{run_id}/improved_resume.md"),
    }))
}

async fn read_pdf_field(field: Field<'_>, part: &str) -> Result<Upload, AppError> {
    let filename = field.file_name().unwrap_or_default().to_string();
    if !has_pdf_extension(&filename) {
        return Err(AppError::Validation(format!("{part} must be a PDF file")));
    }

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("Could not read {part}: {e}")))?;
    if data.is_empty() {
        return Err(AppError::Validation(format!("{part} upload is empty")));
    }

    Ok(Upload { filename, data })
}

fn has_pdf_extension(filename: &str) -> bool {
    filename.to_lowercase().ends_with(".pdf")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pdf_extension_check_is_case_insensitive() {
        assert!(has_pdf_extension("resume.pdf"));
        assert!(has_pdf_extension("Resume.PDF"));
        assert!(!has_pdf_extension("resume.docx"));
        assert!(!has_pdf_extension("resume"));
        assert!(!has_pdf_extension(""));
    }
}
