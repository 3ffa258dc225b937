//! Interactive chat REPL.
//!
//! Renders the conversation and the two interruption surfaces (candidate
//! list, decision menu) and forwards user intents to the controller. Input
//! is read one intent at a time, so at most one request is ever in flight.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use assistant_client::HttpAssistantClient;
use assistant_core::{
    Attachment, Candidate, ChatController, ClientState, HitlDecision, InterruptMode, MessageRole,
};
use assistant_infrastructure::TomlStateStore;

/// Action name reported for an edited action; the backend tracks the actual
/// pending tool itself.
const EDITED_ACTION_NAME: &str = "pending_action";

pub async fn run_chat(document: Option<String>) -> Result<()> {
    let backend = Arc::new(HttpAssistantClient::from_env()?);
    let store = Arc::new(TomlStateStore::new_default()?);
    let state = ClientState::new(store);

    if state.user_id().await.is_none() || state.service_token().await.is_none() {
        println!(
            "{}",
            "Идентификация не настроена: выполните `edms-assistant login`.".red()
        );
        return Ok(());
    }

    let controller = ChatController::new(backend, state).await;
    controller.set_document_id(document).await;

    let mut rl = DefaultEditor::new()?;
    let mut printed = 0usize;

    println!(
        "{}",
        "Начните диалог с агентом (/quit — выход, /reset — новый диалог, /file <путь> — вложение)."
            .bright_black()
    );

    loop {
        match controller.interrupt_mode().await {
            InterruptMode::None => {
                let line = match rl.readline("вы> ") {
                    Ok(line) => line,
                    Err(ReadlineError::Interrupted) => continue,
                    Err(ReadlineError::Eof) => break,
                    Err(e) => return Err(e.into()),
                };
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(input);

                match input {
                    "/quit" | "/exit" => break,
                    "/reset" => {
                        controller.reset().await?;
                        printed = 0;
                        println!("{}", "Начат новый диалог.".bright_black());
                        continue;
                    }
                    _ if input.starts_with("/file ") => {
                        attach_file(&controller, input.trim_start_matches("/file ").trim()).await;
                        continue;
                    }
                    _ if input.starts_with("/doc ") => {
                        let id = input.trim_start_matches("/doc ").trim();
                        controller.set_document_id(Some(id.to_string())).await;
                        println!("{}", format!("Документ закреплён: {id}").bright_black());
                        continue;
                    }
                    _ => {
                        if let Err(e) = controller.submit(input).await {
                            println!("{}", e.to_string().red());
                        }
                    }
                }
            }
            InterruptMode::AwaitingClarification { candidates } => {
                render_candidates(&candidates);
                let line = match rl.readline("выбор> ") {
                    Ok(line) => line,
                    Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                        controller.cancel_clarification().await;
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                };
                let input = line.trim();
                if input.is_empty() {
                    controller.cancel_clarification().await;
                    println!("{}", "Уточнение отменено.".bright_black());
                    continue;
                }

                // A number picks from the list; anything else goes to the
                // backend verbatim (id or free text).
                let selection = input
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| candidates.get(i))
                    .map(|c| c.id.clone())
                    .unwrap_or_else(|| input.to_string());

                if let Err(e) = controller.select_candidate(&selection).await {
                    println!("{}", e.to_string().red());
                }
            }
            InterruptMode::AwaitingHitlDecision => {
                println!("{}", "Требуется подтверждение действия:".bright_yellow());
                println!(
                    "{}",
                    "  1 — подтвердить, 2 — редактировать, 3 — отклонить (пустая строка — отмена)"
                        .bright_black()
                );
                let line = match rl.readline("решение> ") {
                    Ok(line) => line,
                    Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                        controller.cancel_decision().await;
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                };

                let decision = match line.trim() {
                    "" | "cancel" => {
                        controller.cancel_decision().await;
                        println!("{}", "Подтверждение отменено.".bright_black());
                        continue;
                    }
                    "1" | "approve" | "да" => HitlDecision::Approve,
                    "2" | "edit" => {
                        let content = match rl.readline("изменения> ") {
                            Ok(line) => line.trim().to_string(),
                            Err(_) => continue,
                        };
                        HitlDecision::Edit {
                            action_name: EDITED_ACTION_NAME.to_string(),
                            content,
                        }
                    }
                    "3" | "reject" | "нет" => {
                        let message = match rl.readline("причина> ") {
                            Ok(line) => {
                                let trimmed = line.trim();
                                (!trimmed.is_empty()).then(|| trimmed.to_string())
                            }
                            Err(_) => None,
                        };
                        HitlDecision::Reject { message }
                    }
                    other => {
                        println!("{}", format!("Неизвестный вариант: {other}").red());
                        continue;
                    }
                };

                if let Err(e) = controller.decide(decision).await {
                    println!("{}", e.to_string().red());
                }
            }
        }

        printed = print_new_messages(&controller, printed).await;
    }

    Ok(())
}

async fn attach_file(controller: &ChatController, path: &str) {
    let file_name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string());

    match fs::read(path) {
        Ok(bytes) => {
            controller
                .set_attachment(Some(Attachment::new(file_name.clone(), bytes)))
                .await;
            println!("{}", format!("Вложение готово: {file_name}").bright_black());
        }
        Err(e) => println!("{}", format!("Не удалось прочитать файл {path}: {e}").red()),
    }
}

fn render_candidates(candidates: &[Candidate]) {
    println!("{}", "Требуется уточнение:".bright_yellow());
    for (i, candidate) in candidates.iter().enumerate() {
        let mut line = format!("  {}. {}", i + 1, candidate.full_name());
        if let Some(post) = &candidate.post {
            line.push_str(&format!(" — {post}"));
        }
        if let Some(department) = &candidate.department {
            line.push_str(&format!(" ({department})"));
        }
        println!("{}", line.yellow());
    }
    println!(
        "{}",
        "Введите номер, id или текст (пустая строка — отмена).".bright_black()
    );
}

/// Prints assistant messages appended since the last call; user messages are
/// already on screen as typed input.
async fn print_new_messages(controller: &ChatController, printed: usize) -> usize {
    let messages = controller.messages().await;
    for message in &messages[printed..] {
        if message.role == MessageRole::Assistant {
            for line in message.content.lines() {
                println!("{} {}", "агент>".bright_magenta(), line.bright_blue());
            }
        }
    }
    messages.len()
}
