//! Wire types for the evaluation pipeline's terminal outputs.

use serde::{Deserialize, Serialize};

/// Final judgement produced by the reporting stage. Field names match what
/// the web client validates before rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgementReport {
    #[serde(rename = "Evaluating Score")]
    pub score: Score,
    #[serde(rename = "Evaluating Statement")]
    pub statement: String,
    #[serde(rename = "Suggestions")]
    pub suggestions: Vec<String>,
}

/// The score comes back as `87` on a good day and `"87/100"` on others.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Score {
    Number(f64),
    Text(String),
}

/// Response body for `POST /analyze`.
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    #[serde(flatten)]
    pub judgement: JudgementReport,
    pub improved_resume: String,
    pub improved_resume_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_judgement_parses_numeric_score() {
        let json = r#"{
            "Evaluating Score": 82,
            "Evaluating Statement": "Strong backend fit with a gap in cloud experience.",
            "Suggestions": ["Quantify the migration project", "Lead with Rust experience"]
        }"#;
        let report: JudgementReport = serde_json::from_str(json).unwrap();
        assert!(matches!(report.score, Score::Number(n) if (n - 82.0).abs() < f64::EPSILON));
        assert_eq!(report.suggestions.len(), 2);
    }

    #[test]
    fn test_judgement_parses_textual_score() {
        let json = r#"{
            "Evaluating Score": "82/100",
            "Evaluating Statement": "Strong fit.",
            "Suggestions": []
        }"#;
        let report: JudgementReport = serde_json::from_str(json).unwrap();
        assert!(matches!(report.score, Score::Text(s) if s == "82/100"));
    }

    #[test]
    fn test_judgement_missing_suggestions_fails() {
        let json = r#"{
            "Evaluating Score": 82,
            "Evaluating Statement": "Strong fit."
        }"#;
        assert!(serde_json::from_str::<JudgementReport>(json).is_err());
    }

    #[test]
    fn test_analyze_response_flattens_judgement_fields() {
        let response = AnalyzeResponse {
            judgement: JudgementReport {
                score: Score::Number(75.0),
                statement: "Decent fit.".to_string(),
                suggestions: vec!["Tighten the summary".to_string()],
            },
            improved_resume: "# Jane Doe".to_string(),
            improved_resume_path: "output/abc/improved_resume.md".to_string(),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["Evaluating Score"], 75.0);
        assert_eq!(value["improved_resume_path"], "output/abc/improved_resume.md");
    }
}
