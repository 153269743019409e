use std::path::Path;

use anyhow::{Context, Result};

use super::CliContext;

pub async fn list(ctx: &CliContext, project_id: &str) -> Result<()> {
    let versions = ctx.app.versions.list_versions(project_id).await?;
    for version in &versions {
        println!(
            "v{}  {}  {} rows x {} cols  {} bytes  {}",
            version.version_number,
            version.created_at.format("%Y-%m-%d %H:%M:%S"),
            version.row_count,
            version.column_count,
            version.file_size_bytes,
            version.change_description
        );
    }
    let stats = ctx.app.versions.version_stats(project_id).await?;
    println!(
        "{} version(s), {} bytes total",
        stats.version_count, stats.total_size_bytes
    );
    Ok(())
}

pub async fn revert(ctx: &CliContext, project_id: &str, version: u32) -> Result<()> {
    let committed = ctx.app.versions.revert(project_id, version, None).await?;
    println!(
        "Committed version {}: {}",
        committed.version_number, committed.change_description
    );
    Ok(())
}

pub async fn export(
    ctx: &CliContext,
    project_id: &str,
    version: u32,
    out: &Path,
) -> Result<()> {
    let source = ctx.app.versions.download_path(project_id, version).await?;
    std::fs::copy(&source, out)
        .with_context(|| format!("failed to copy snapshot to {}", out.display()))?;
    println!("Exported v{} to {}", version, out.display());
    Ok(())
}
