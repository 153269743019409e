use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tabula_application::AppContext;
use tabula_core::{CodeOracle, OracleRequest, OracleReply, TabulaError};
use tabula_execution::PythonSandbox;
use tabula_infrastructure::{AppConfig, DataPaths};
use tabula_interaction::GeminiOracle;

pub mod chat;
pub mod project;
pub mod query;
pub mod version;

pub struct CliContext {
    pub app: AppContext,
}

/// Loads the configuration and wires the full service graph.
pub fn build(config_path: &Path) -> anyhow::Result<CliContext> {
    let config = AppConfig::load_or_init(config_path)?;
    let paths = DataPaths::new(&config.data_dir);

    let oracle: Arc<dyn CodeOracle> = match GeminiOracle::from_env(&config.oracle.api_key_env) {
        Ok(oracle) => Arc::new(oracle.with_model(&config.oracle.model)),
        Err(err) => {
            tracing::debug!(error = %err, "oracle not configured");
            Arc::new(DisabledOracle {
                reason: err.to_string(),
            })
        }
    };
    let runner = Arc::new(PythonSandbox::new(
        &config.python_bin,
        Duration::from_secs(config.sandbox_timeout_secs),
    ));

    let app = AppContext::new(paths, oracle, runner, config.preview_rows)?;
    Ok(CliContext { app })
}

/// Stand-in oracle used when no API key is configured. Commands that never
/// reach the oracle keep working; `ask` reports the missing key.
struct DisabledOracle {
    reason: String,
}

#[async_trait]
impl CodeOracle for DisabledOracle {
    async fn generate(&self, _request: OracleRequest) -> tabula_core::Result<OracleReply> {
        Err(TabulaError::Oracle(self.reason.clone()))
    }
}
