//! Document-search tool: surfaces the text of exactly one document so an
//! extraction stage can reason over it.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to read `{path}`: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to extract text from `{path}`: {message}")]
    Extract { path: String, message: String },

    #[error("document extraction task was cancelled")]
    Cancelled,
}

/// Search tool bound to one document at construction. The binding is final:
/// a worker carrying this tool reads this file and no other.
#[derive(Debug, Clone)]
pub struct PdfSearchTool {
    path: PathBuf,
}

impl PdfSearchTool {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the full document text. PDF parsing is CPU-bound, so it runs on
    /// the blocking pool. Anything else is read as UTF-8 text, which also
    /// keeps test fixtures trivial.
    pub async fn load_text(&self) -> Result<String, ToolError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || extract_text(&path))
            .await
            .map_err(|_| ToolError::Cancelled)?
    }
}

fn extract_text(path: &Path) -> Result<String, ToolError> {
    let is_pdf = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);

    if is_pdf {
        pdf_extract::extract_text(path).map_err(|e| ToolError::Extract {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    } else {
        std::fs::read_to_string(path).map_err(|source| ToolError::Read {
            path: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_load_text_reads_plain_text_documents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("job_description.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Senior Rust Engineer, remote, 5+ years").unwrap();

        let tool = PdfSearchTool::new(&path);
        let text = tool.load_text().await.unwrap();
        assert!(text.contains("Senior Rust Engineer"));
    }

    #[tokio::test]
    async fn test_load_text_missing_file_is_a_read_error() {
        let tool = PdfSearchTool::new("/nonexistent/resume.txt");
        let err = tool.load_text().await.unwrap_err();
        assert!(matches!(err, ToolError::Read { .. }));
    }

    #[test]
    fn test_tool_stays_bound_to_its_path() {
        let tool = PdfSearchTool::new("uploads/resume.pdf");
        assert_eq!(tool.path(), Path::new("uploads/resume.pdf"));
    }
}
