//! Query orchestration: one user query, end to end.
//!
//! A turn is: load the current dataset, ask the oracle for a snippet, run it
//! in the sandbox, classify the outcome, persist artifacts and (for
//! modifications) commit a new version, then append the assistant message.
//! Turns within one chat are serialized by a per-chat mutex held for the whole
//! turn; turns on different chats of the same project run concurrently and
//! are ordered only by their version commits.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use tabula_core::{
    dataset_profile, CodeOracle, ExecutionOutput, Message, ModificationSummary, OracleRequest,
    OutputKind, ProjectRepository, Result, SnippetRunner, TabulaError, Version,
    VersionProvenance,
};
use tabula_infrastructure::ArtifactStore;

use crate::chat_service::ChatService;
use crate::version_engine::VersionEngine;

/// What one query turn produced, mirroring the persisted assistant message.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    /// False when the oracle or sandbox failed; the failure is still
    /// recorded as an assistant turn.
    pub success: bool,
    pub kind: Option<OutputKind>,
    /// The assistant message as persisted
    pub message: Message,
    /// Set only when the turn committed a new version
    pub new_version: Option<Version>,
    pub error: Option<String>,
}

pub struct QueryOrchestrator {
    projects: Arc<dyn ProjectRepository>,
    chats: Arc<ChatService>,
    engine: Arc<VersionEngine>,
    oracle: Arc<dyn CodeOracle>,
    runner: Arc<dyn SnippetRunner>,
    artifacts: ArtifactStore,
    preview_rows: usize,
    chat_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl QueryOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        projects: Arc<dyn ProjectRepository>,
        chats: Arc<ChatService>,
        engine: Arc<VersionEngine>,
        oracle: Arc<dyn CodeOracle>,
        runner: Arc<dyn SnippetRunner>,
        artifacts: ArtifactStore,
        preview_rows: usize,
    ) -> Self {
        Self {
            projects,
            chats,
            engine,
            oracle,
            runner,
            artifacts,
            preview_rows,
            chat_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Runs one natural-language query through the full pipeline.
    ///
    /// Oracle and sandbox failures do not bubble out as `Err`: they are
    /// persisted as error turns and reported through the outcome, so the
    /// conversation survives a bad generation. `Err` is reserved for
    /// missing projects/chats and storage faults.
    pub async fn handle_query(
        &self,
        project_id: &str,
        chat_id: &str,
        query: &str,
    ) -> Result<QueryOutcome> {
        let project = self
            .projects
            .find_by_id(project_id)
            .await?
            .ok_or_else(|| TabulaError::project_not_found(project_id))?;
        self.chats.get_chat(project_id, chat_id).await?;

        let lock = self.chat_lock(chat_id).await;
        let _turn = lock.lock().await;

        let table = self.engine.current(project_id).await?;
        let prior_context = self.chats.oracle_context(project_id, chat_id).await?;
        let dataset_context = dataset_profile(&table, &project.name);

        self.chats
            .append_message(project_id, chat_id, Message::user(chat_id, query))
            .await?;

        // The oracle call goes out without any storage lock held.
        let request = OracleRequest {
            query: query.to_string(),
            dataset_context,
            prior_context,
        };
        let reply = match self.oracle.generate(request).await {
            Ok(reply) => reply,
            Err(err) => {
                tracing::warn!(project_id, chat_id, error = %err, "oracle turn failed");
                return self.record_failure(project_id, chat_id, None, err).await;
            }
        };
        let generated = reply.generated;

        let output = match self.runner.run(&generated.code, &table).await {
            Ok(output) => output,
            Err(err) if err.is_execution_failure() => {
                tracing::warn!(project_id, chat_id, error = %err, "sandbox run failed");
                return self
                    .record_failure(project_id, chat_id, Some(generated), err)
                    .await;
            }
            Err(err) => return Err(err),
        };

        let mut assistant = Message::assistant(chat_id, turn_content(&generated, &output));
        assistant.code = Some(generated.code);
        assistant.explanation = Some(generated.explanation);
        assistant.output_kind = Some(output.kind());
        assistant.output = Some(output.stdout().to_string());

        let mut new_version = None;
        match output {
            ExecutionOutput::Visualization { png, .. } => {
                let path = self.artifacts.save_chart(&png)?;
                assistant.plot_path = Some(path.display().to_string());
            }
            ExecutionOutput::Modification { table: modified, .. } => {
                // The runner compares against its own input copy; re-check
                // against the committed current version before versioning.
                if self.engine.has_changed(project_id, &modified).await? {
                    let summary = ModificationSummary::between(&table, &modified, self.preview_rows);
                    let path = self.artifacts.save_modified_table(chat_id, &modified)?;
                    assistant.modified_table_path = Some(path.display().to_string());
                    assistant.modification_summary = Some(summary);

                    let provenance = VersionProvenance::from_message(chat_id, &assistant.id);
                    let version = self
                        .engine
                        .commit_new(project_id, &modified, None, Some(provenance))
                        .await?;
                    new_version = Some(version);
                } else {
                    assistant.output_kind = Some(OutputKind::Exploratory);
                }
            }
            ExecutionOutput::Exploratory { .. } => {}
        }

        self.chats
            .set_oracle_context(project_id, chat_id, reply.updated_context)
            .await?;
        let persisted = self
            .chats
            .append_message(project_id, chat_id, assistant)
            .await?;

        tracing::info!(
            project_id,
            chat_id,
            kind = ?persisted.output_kind,
            new_version = new_version.as_ref().map(|v| v.version_number),
            "query turn completed"
        );
        Ok(QueryOutcome {
            success: true,
            kind: persisted.output_kind,
            message: persisted,
            new_version,
            error: None,
        })
    }

    /// Persists a failed turn as an assistant error message. No artifact is
    /// written and no version is committed on this path.
    async fn record_failure(
        &self,
        project_id: &str,
        chat_id: &str,
        generated: Option<tabula_core::GeneratedCode>,
        err: TabulaError,
    ) -> Result<QueryOutcome> {
        let mut message = Message::assistant_error(chat_id, failure_explanation(&err), err.to_string());
        if let Some(generated) = generated {
            message.code = Some(generated.code);
            message.explanation = Some(generated.explanation);
        }
        let persisted = self
            .chats
            .append_message(project_id, chat_id, message)
            .await?;
        Ok(QueryOutcome {
            success: false,
            kind: None,
            message: persisted,
            new_version: None,
            error: Some(err.to_string()),
        })
    }

    async fn chat_lock(&self, chat_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.chat_locks.lock().await;
        // A strong count of 1 means no turn holds the entry anymore; dropping
        // it keeps the map bounded by in-flight turns instead of growing with
        // every chat ever queried.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(chat_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    #[cfg(test)]
    async fn chat_lock_entries(&self) -> usize {
        self.chat_locks.lock().await.len()
    }
}

fn turn_content(generated: &tabula_core::GeneratedCode, output: &ExecutionOutput) -> String {
    if !generated.explanation.trim().is_empty() {
        return generated.explanation.clone();
    }
    match output {
        ExecutionOutput::Exploratory { stdout } if !stdout.trim().is_empty() => stdout.clone(),
        ExecutionOutput::Exploratory { .. } => "The query ran but produced no output.".to_string(),
        ExecutionOutput::Visualization { .. } => "Here is the requested chart.".to_string(),
        ExecutionOutput::Modification { .. } => "The dataset has been updated.".to_string(),
    }
}

fn failure_explanation(err: &TabulaError) -> String {
    match err {
        TabulaError::Oracle(_) => {
            "I could not generate runnable code for this query. Please try rephrasing it."
                .to_string()
        }
        TabulaError::ExecutionTimeout { seconds } => format!(
            "The generated code did not finish within {} seconds and was stopped.",
            seconds
        ),
        TabulaError::Execution(_) => {
            "The generated code failed while running against your dataset.".to_string()
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
