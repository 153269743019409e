use std::path::Path;

use anyhow::{Context, Result};

use super::CliContext;

pub async fn upload(ctx: &CliContext, file: &Path, name: Option<&str>) -> Result<()> {
    let bytes = std::fs::read(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let filename = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.csv".to_string());

    let project = ctx.app.projects.create_project(&bytes, &filename, name).await?;
    println!(
        "Created project '{}' ({}): {} rows x {} columns, version 1",
        project.name, project.id, project.total_rows, project.total_columns
    );
    Ok(())
}

pub async fn list(ctx: &CliContext) -> Result<()> {
    let projects = ctx.app.projects.list_projects().await?;
    if projects.is_empty() {
        println!("No projects.");
        return Ok(());
    }
    for project in projects {
        println!(
            "{}  {}  v{}  {} rows x {} cols  ({} chats)",
            project.id,
            project.name,
            project.current_version,
            project.total_rows,
            project.total_columns,
            project.chat_ids.len()
        );
    }
    Ok(())
}

pub async fn delete(ctx: &CliContext, project_id: &str) -> Result<()> {
    ctx.app.projects.delete_project(project_id).await?;
    println!("Deleted project {}", project_id);
    Ok(())
}
