//! Workers: a named role bound to one completion backend and zero or more
//! document-search tools.

use std::sync::Arc;

use tracing::debug;

use crate::completion::{strip_code_fences, Completion, CompletionRequest};
use crate::pipeline::error::StageFailure;
use crate::pipeline::graph::{OutputShape, TaskTemplate};
use crate::tools::pdf_search::PdfSearchTool;

/// A stateless role. Tools are fixed at construction; a worker is never
/// rebound to another document, and it holds no state between stages.
pub struct Worker {
    id: String,
    /// System prompt describing the role.
    role: String,
    capability: Arc<dyn Completion>,
    tools: Vec<PdfSearchTool>,
}

impl Worker {
    pub fn new(
        id: impl Into<String>,
        role: impl Into<String>,
        capability: Arc<dyn Completion>,
    ) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
            capability,
            tools: Vec::new(),
        }
    }

    pub fn with_tool(mut self, tool: PdfSearchTool) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Executes one unit of work: loads each bound document, renders the
    /// template plus upstream context into a prompt, invokes the capability,
    /// and checks the output against the template's declared shape.
    pub async fn execute(
        &self,
        template: &TaskTemplate,
        context: &[String],
    ) -> Result<String, StageFailure> {
        let mut documents = Vec::with_capacity(self.tools.len());
        for tool in &self.tools {
            debug!(worker = %self.id, document = %tool.path().display(), "loading document");
            documents.push(tool.load_text().await?);
        }

        let prompt = render_prompt(template, context, &documents);
        debug!(
            worker = %self.id,
            prompt_chars = prompt.len(),
            "dispatching completion"
        );

        let output = self
            .capability
            .complete(&CompletionRequest {
                system: self.role.clone(),
                prompt,
            })
            .await?;

        check_shape(template.shape, &output)?;
        Ok(output)
    }
}

/// Prompt layout: task instructions, then each bound document, then the
/// upstream outputs in `depends_on` order, then the expected output shape.
/// The context section carries all and only the declared upstream outputs.
fn render_prompt(template: &TaskTemplate, context: &[String], documents: &[String]) -> String {
    let mut prompt = String::new();
    prompt.push_str(&template.description);

    for document in documents {
        prompt.push_str("\n\n# Document\n\n");
        prompt.push_str(document);
    }

    if !context.is_empty() {
        prompt.push_str("\n\n# Context\n\n");
        prompt.push_str(&context.join("\n\n---\n\n"));
    }

    prompt.push_str("\n\n# Expected output\n\n");
    prompt.push_str(&template.expected_output);
    prompt
}

fn check_shape(shape: OutputShape, output: &str) -> Result<(), StageFailure> {
    match shape {
        OutputShape::Text => {
            if output.trim().is_empty() {
                return Err(StageFailure::InvalidOutput {
                    expected: "text",
                    reason: "output is empty".to_string(),
                });
            }
        }
        OutputShape::Json => {
            let stripped = strip_code_fences(output);
            if let Err(e) = serde_json::from_str::<serde_json::Value>(stripped) {
                return Err(StageFailure::InvalidOutput {
                    expected: "JSON",
                    reason: e.to_string(),
                });
            }
        }
    }
    Ok(())
}
