//! Execution sandbox: runs AI-generated Python snippets in an isolated
//! subprocess and classifies the outcome.
//!
//! Each run gets a fresh scratch directory holding an isolated copy of the
//! dataset. The snippet executes in a separate OS process (stronger isolation
//! than an in-process symbol-table restriction) under a wall-clock timeout;
//! the process is killed when the budget is exceeded or the caller goes away.
//! Artifacts come back as in-memory bytes and the scratch is removed on every
//! path, so a mid-failure chart or table can never leak into permanent
//! storage.

pub mod harness;

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tabula_core::{dataframes_equal, DataFrame, ExecutionOutput, Result, SnippetRunner, TabulaError};
use tokio::process::Command;

/// Report written by the harness after the snippet ran.
#[derive(Debug, Deserialize)]
struct ExecutionReport {
    ok: bool,
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    error: Option<String>,
}

fn parse_report(raw: &str) -> Result<ExecutionReport> {
    serde_json::from_str(raw)
        .map_err(|e| TabulaError::Execution(format!("unreadable execution report: {}", e)))
}

/// Classifies a finished run from the scratch directory contents.
///
/// Precedence: a saved chart wins; otherwise a `result` table that actually
/// differs from the input copy is a modification; everything else is
/// exploratory. The oracle's declared kind plays no part here.
fn classify_outcome(scratch: &Path, input: &DataFrame, stdout: String) -> Result<ExecutionOutput> {
    let plot_path = scratch.join(harness::PLOT_FILE);
    if plot_path.exists() {
        let png = std::fs::read(&plot_path)?;
        return Ok(ExecutionOutput::Visualization { png, stdout });
    }

    let result_path = scratch.join(harness::RESULT_FILE);
    if result_path.exists() {
        let bytes = std::fs::read(&result_path)?;
        let table = DataFrame::from_csv_bytes(&bytes)?;
        if !dataframes_equal(input, &table) {
            return Ok(ExecutionOutput::Modification { table, stdout });
        }
    }

    Ok(ExecutionOutput::Exploratory { stdout })
}

/// Subprocess-based snippet runner.
pub struct PythonSandbox {
    python_bin: String,
    timeout: Duration,
}

impl Default for PythonSandbox {
    fn default() -> Self {
        Self::new("python3", Duration::from_secs(30))
    }
}

impl PythonSandbox {
    pub fn new(python_bin: impl Into<String>, timeout: Duration) -> Self {
        Self {
            python_bin: python_bin.into(),
            timeout,
        }
    }

    async fn prepare_scratch(&self, code: &str, table: &DataFrame) -> Result<tempfile::TempDir> {
        let scratch = tempfile::tempdir()?;
        let csv = table.to_csv_string()?;
        tokio::fs::write(scratch.path().join(harness::INPUT_FILE), csv).await?;
        tokio::fs::write(scratch.path().join(harness::SNIPPET_FILE), code).await?;
        tokio::fs::write(
            scratch.path().join(harness::HARNESS_FILE),
            harness::HARNESS_SOURCE,
        )
        .await?;
        Ok(scratch)
    }
}

#[async_trait]
impl SnippetRunner for PythonSandbox {
    async fn run(&self, code: &str, table: &DataFrame) -> Result<ExecutionOutput> {
        let scratch = self.prepare_scratch(code, table).await?;

        let child = Command::new(&self.python_bin)
            .arg(harness::HARNESS_FILE)
            .current_dir(scratch.path())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                TabulaError::Execution(format!(
                    "failed to spawn sandbox interpreter '{}': {}",
                    self.python_bin, e
                ))
            })?;

        // Dropping the wait future on timeout kills the child (kill_on_drop).
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(timeout_secs = self.timeout.as_secs(), "sandbox run timed out");
                return Err(TabulaError::ExecutionTimeout {
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        let report_path = scratch.path().join(harness::REPORT_FILE);
        if !report_path.exists() {
            // Harness itself crashed (missing interpreter deps, OOM kill, ...)
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TabulaError::Execution(format!(
                "sandbox harness failed (exit: {:?}): {}",
                output.status.code(),
                stderr.trim()
            )));
        }

        let report = parse_report(&tokio::fs::read_to_string(&report_path).await?)?;
        if !report.ok {
            return Err(TabulaError::Execution(
                report
                    .error
                    .unwrap_or_else(|| "snippet failed without a traceback".to_string()),
            ));
        }

        classify_outcome(scratch.path(), table, report.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn table(cells: &[&str]) -> DataFrame {
        DataFrame::new(
            vec!["x".into()],
            cells.iter().map(|c| vec![c.to_string()]).collect(),
        )
        .unwrap()
    }

    #[test]
    fn report_parsing() {
        let report = parse_report(r#"{"ok": true, "stdout": "42\n", "error": null}"#).unwrap();
        assert!(report.ok);
        assert_eq!(report.stdout, "42\n");

        let failed = parse_report(r#"{"ok": false, "error": "NameError: boom"}"#).unwrap();
        assert!(!failed.ok);
        assert_eq!(failed.error.as_deref(), Some("NameError: boom"));

        assert!(parse_report("not json").is_err());
    }

    #[test]
    fn chart_wins_classification() {
        let scratch = TempDir::new().unwrap();
        std::fs::write(scratch.path().join(harness::PLOT_FILE), b"fake-png").unwrap();
        // Even with a result table present, the chart takes precedence
        std::fs::write(scratch.path().join(harness::RESULT_FILE), "x\n9\n").unwrap();

        let outcome = classify_outcome(scratch.path(), &table(&["1"]), "out".into()).unwrap();
        match outcome {
            ExecutionOutput::Visualization { png, stdout } => {
                assert_eq!(png, b"fake-png");
                assert_eq!(stdout, "out");
            }
            other => panic!("expected visualization, got {:?}", other),
        }
    }

    #[test]
    fn distinct_result_table_is_a_modification() {
        let scratch = TempDir::new().unwrap();
        std::fs::write(scratch.path().join(harness::RESULT_FILE), "x\n1\n2\n").unwrap();

        let outcome = classify_outcome(scratch.path(), &table(&["1"]), String::new()).unwrap();
        match outcome {
            ExecutionOutput::Modification { table: result, .. } => {
                assert_eq!(result, table(&["1", "2"]));
            }
            other => panic!("expected modification, got {:?}", other),
        }
    }

    #[test]
    fn identical_result_table_stays_exploratory() {
        let scratch = TempDir::new().unwrap();
        std::fs::write(scratch.path().join(harness::RESULT_FILE), "x\n1\n").unwrap();

        let outcome =
            classify_outcome(scratch.path(), &table(&["1"]), "mean: 1.0".into()).unwrap();
        assert_eq!(
            outcome,
            ExecutionOutput::Exploratory {
                stdout: "mean: 1.0".into()
            }
        );
    }

    #[test]
    fn bare_stdout_is_exploratory() {
        let scratch = TempDir::new().unwrap();
        let outcome = classify_outcome(scratch.path(), &table(&["1"]), "hello".into()).unwrap();
        assert_eq!(outcome.kind(), tabula_core::OutputKind::Exploratory);
        assert_eq!(outcome.stdout(), "hello");
    }

    // Requires python3 with pandas + matplotlib on PATH.
    #[tokio::test]
    #[ignore]
    async fn end_to_end_exploratory_run() {
        let sandbox = PythonSandbox::default();
        let outcome = sandbox
            .run("print(df['x'].astype(int).sum())", &table(&["1", "2", "3"]))
            .await
            .unwrap();
        match outcome {
            ExecutionOutput::Exploratory { stdout } => assert_eq!(stdout.trim(), "6"),
            other => panic!("expected exploratory, got {:?}", other),
        }
    }

    // Requires python3; the sleep never finishes inside the budget.
    #[tokio::test]
    #[ignore]
    async fn end_to_end_timeout() {
        let sandbox = PythonSandbox::new("python3", Duration::from_millis(300));
        let result = sandbox
            .run("import time\ntime.sleep(5)", &table(&["1"]))
            .await;
        assert!(matches!(
            result,
            Err(TabulaError::ExecutionTimeout { .. })
        ));
    }
}
