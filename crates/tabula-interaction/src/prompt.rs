//! System instruction template and oracle reply parsing.
//!
//! The oracle must answer with a raw JSON object (`output_type`, `code`,
//! `explanation`). Models routinely wrap JSON in markdown fences anyway, so
//! parsing strips them before deserializing. A reply that still fails to
//! parse is an oracle failure, never an execution failure.

use minijinja::{context, Environment};
use serde::Deserialize;
use std::str::FromStr;
use tabula_core::{GeneratedCode, OutputKind, Result, TabulaError};

const SYSTEM_INSTRUCTION_TEMPLATE: &str = r#"You are an expert data analyst assistant. You help users analyze CSV data by generating Python code using pandas.

DATASET CONTEXT:
{{ dataset_context }}

RESPONSE FORMAT (CRITICAL):
You MUST respond with valid JSON in this exact structure:
{
  "output_type": "exploratory" | "visualization" | "modification",
  "code": "Python code here",
  "explanation": "Brief explanation of what the code does"
}

OUTPUT TYPES:
1. exploratory: answering questions, showing data, calculating metrics or statistics.
   Code should PRINT results using print().
2. visualization: creating plots or charts.
   Code MUST save the plot with plt.savefig('plot.png', bbox_inches='tight', dpi=100) and then call plt.close().
3. modification: producing a new or transformed dataset the user wants to keep or download.
   Code MUST assign the resulting DataFrame to the 'result' variable.
   Do NOT use this for calculations or statistics - those are exploratory.

IMPORTANT RULES:
1. The DataFrame is available as the variable 'df' - do NOT try to load it.
2. Only 'df', 'pd', 'np' and 'plt' are available; do not import anything else.
3. For modifications, ALWAYS assign to the 'result' variable.
4. Use vectorized pandas operations and handle missing values gracefully.
5. Reference the dataset context above for column names, types, and ranges.
6. Return ONLY valid JSON, no extra text before or after.
7. Do NOT wrap the JSON in markdown code blocks - return raw JSON only."#;

/// Renders the per-turn system instruction with the current dataset context.
pub fn render_system_instruction(dataset_context: &str) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("system", SYSTEM_INSTRUCTION_TEMPLATE)
        .map_err(|e| TabulaError::internal(format!("bad prompt template: {}", e)))?;
    let template = env
        .get_template("system")
        .map_err(|e| TabulaError::internal(format!("bad prompt template: {}", e)))?;
    template
        .render(context! { dataset_context => dataset_context })
        .map_err(|e| TabulaError::internal(format!("prompt render failed: {}", e)))
}

#[derive(Debug, Deserialize)]
struct RawReply {
    #[serde(default)]
    output_type: Option<String>,
    code: String,
    #[serde(default)]
    explanation: Option<String>,
}

/// Strips a leading/trailing markdown code fence, if present.
fn strip_markdown_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Parses the oracle's JSON reply into generated code.
///
/// An unknown or missing `output_type` degrades to `exploratory`; the
/// sandbox's own classification is authoritative anyway.
pub fn parse_generated(raw: &str) -> Result<GeneratedCode> {
    let cleaned = strip_markdown_fences(raw);
    let reply: RawReply = serde_json::from_str(cleaned).map_err(|e| {
        TabulaError::Oracle(format!(
            "reply was not the expected JSON shape: {} (reply: {})",
            e,
            truncated(raw, 200)
        ))
    })?;

    let declared_kind = reply
        .output_type
        .as_deref()
        .and_then(|k| OutputKind::from_str(k).ok())
        .unwrap_or(OutputKind::Exploratory);

    Ok(GeneratedCode {
        declared_kind,
        code: reply.code,
        explanation: reply.explanation.unwrap_or_default(),
    })
}

fn truncated(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_instruction_embeds_dataset_context() {
        let rendered = render_system_instruction("Dataset: t\nShape: 3 rows x 2 columns").unwrap();
        assert!(rendered.contains("Shape: 3 rows x 2 columns"));
        assert!(rendered.contains("'result' variable"));
    }

    #[test]
    fn parses_raw_json_reply() {
        let generated = parse_generated(
            r#"{"output_type": "modification", "code": "result = df", "explanation": "copy"}"#,
        )
        .unwrap();
        assert_eq!(generated.declared_kind, OutputKind::Modification);
        assert_eq!(generated.code, "result = df");
        assert_eq!(generated.explanation, "copy");
    }

    #[test]
    fn strips_markdown_fences() {
        let fenced = "```json\n{\"output_type\": \"exploratory\", \"code\": \"print(1)\"}\n```";
        let generated = parse_generated(fenced).unwrap();
        assert_eq!(generated.code, "print(1)");

        let bare_fence = "```\n{\"code\": \"print(2)\"}\n```";
        assert_eq!(parse_generated(bare_fence).unwrap().code, "print(2)");
    }

    #[test]
    fn unknown_kind_degrades_to_exploratory() {
        let generated =
            parse_generated(r#"{"output_type": "mystery", "code": "print(1)"}"#).unwrap();
        assert_eq!(generated.declared_kind, OutputKind::Exploratory);
    }

    #[test]
    fn non_json_reply_is_an_oracle_error() {
        let result = parse_generated("Sure! Here is some code: print(1)");
        assert!(matches!(result, Err(TabulaError::Oracle(_))));
    }
}
