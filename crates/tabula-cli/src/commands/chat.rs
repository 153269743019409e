use anyhow::Result;

use super::CliContext;

pub async fn create(ctx: &CliContext, project_id: &str, name: Option<&str>) -> Result<()> {
    let chat = ctx.app.chats.create_chat(project_id, name).await?;
    println!("Created chat '{}' ({})", chat.name, chat.id);
    Ok(())
}

pub async fn list(ctx: &CliContext, project_id: &str) -> Result<()> {
    let chats = ctx.app.chats.list_chats(project_id).await?;
    if chats.is_empty() {
        println!("No chats.");
        return Ok(());
    }
    for chat in chats {
        println!(
            "{}  {}  {} messages  (updated {})",
            chat.id,
            chat.name,
            chat.message_count,
            chat.updated_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}

pub async fn history(ctx: &CliContext, project_id: &str, chat_id: &str) -> Result<()> {
    let messages = ctx.app.chats.list_messages(project_id, chat_id).await?;
    for message in messages {
        println!("[{}] {}", message.role, message.content);
        if let Some(code) = &message.code {
            for line in code.lines() {
                println!("    | {}", line);
            }
        }
        if let Some(error) = &message.error {
            println!("    error: {}", error);
        }
        if let Some(plot) = &message.plot_path {
            println!("    chart: {}", plot);
        }
    }
    Ok(())
}
