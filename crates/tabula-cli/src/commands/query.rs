use anyhow::Result;
use tabula_core::OutputKind;

use super::CliContext;

pub async fn ask(ctx: &CliContext, project_id: &str, chat_id: &str, query: &str) -> Result<()> {
    let outcome = ctx
        .app
        .orchestrator
        .handle_query(project_id, chat_id, query)
        .await?;

    if !outcome.success {
        println!("{}", outcome.message.content);
        if let Some(error) = outcome.error {
            println!("  ({})", error);
        }
        return Ok(());
    }

    println!("{}", outcome.message.content);
    match outcome.kind {
        Some(OutputKind::Exploratory) => {
            if let Some(output) = outcome.message.output.filter(|o| !o.trim().is_empty()) {
                println!("{}", output.trim_end());
            }
        }
        Some(OutputKind::Visualization) => {
            if let Some(plot) = outcome.message.plot_path {
                println!("Chart saved to {}", plot);
            }
        }
        Some(OutputKind::Modification) => {
            if let Some(version) = outcome.new_version {
                println!(
                    "Committed version {}: {}",
                    version.version_number, version.change_description
                );
            }
            if let Some(path) = outcome.message.modified_table_path {
                println!("Modified table available at {}", path);
            }
        }
        None => {}
    }
    Ok(())
}
