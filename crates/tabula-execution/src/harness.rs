//! Embedded Python harness for the execution sandbox.
//!
//! The harness runs inside the scratch directory and speaks a small file
//! protocol with the Rust side:
//!
//! - reads `input.csv` (the isolated dataset copy) and `snippet.py`
//! - executes the snippet with a fixed symbol table: `df`, `pd`, `np`, `plt`,
//!   plus the reserved `result` output slot
//! - captures everything printed to stdout
//! - writes `result.csv` when `result` ended up bound to a DataFrame
//! - a chart is whatever the snippet saved to `plot.png` in the scratch
//! - always writes `report.json` with `ok`, `stdout`, and `error`
//!
//! The matplotlib backend is forced to Agg before pyplot loads so headless
//! execution never touches a display.

/// Name of the harness file inside the scratch directory.
pub const HARNESS_FILE: &str = "harness.py";
/// Dataset copy handed to the snippet.
pub const INPUT_FILE: &str = "input.csv";
/// The AI-generated snippet.
pub const SNIPPET_FILE: &str = "snippet.py";
/// Execution report written by the harness.
pub const REPORT_FILE: &str = "report.json";
/// Well-known chart output path inside the scratch.
pub const PLOT_FILE: &str = "plot.png";
/// Table written when the snippet bound `result` to a DataFrame.
pub const RESULT_FILE: &str = "result.csv";

pub const HARNESS_SOURCE: &str = r#"
import io
import json
import sys
import traceback


def main():
    import matplotlib
    matplotlib.use("Agg")

    import pandas as pd
    import numpy as np
    import matplotlib.pyplot as plt

    df = pd.read_csv("input.csv")
    with open("snippet.py", "r", encoding="utf-8") as f:
        code = f.read()

    scope = {"df": df, "pd": pd, "np": np, "plt": plt}

    report = {"ok": True, "stdout": "", "error": None}
    buffer = io.StringIO()
    real_stdout = sys.stdout
    sys.stdout = buffer
    try:
        exec(code, scope)
    except BaseException:
        report["ok"] = False
        report["error"] = traceback.format_exc()
    finally:
        sys.stdout = real_stdout
    report["stdout"] = buffer.getvalue()

    if report["ok"]:
        result = scope.get("result")
        if isinstance(result, pd.DataFrame):
            result.to_csv("result.csv", index=False)

    with open("report.json", "w", encoding="utf-8") as f:
        json.dump(report, f)


main()
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn harness_references_the_protocol_files() {
        for file in [INPUT_FILE, SNIPPET_FILE, REPORT_FILE, RESULT_FILE] {
            assert!(HARNESS_SOURCE.contains(file), "missing {}", file);
        }
    }

    #[test]
    fn harness_forces_headless_backend() {
        assert!(HARNESS_SOURCE.contains("matplotlib.use(\"Agg\")"));
        let backend_idx = HARNESS_SOURCE.find("matplotlib.use").unwrap();
        let pyplot_idx = HARNESS_SOURCE.find("import matplotlib.pyplot").unwrap();
        assert!(backend_idx < pyplot_idx);
    }
}
