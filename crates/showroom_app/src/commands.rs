use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use client_logging::client_warn;
use showroom_client::{ApiError, CatalogApi, NotificationSink, ProductQuery, SessionManager, TaskTracker};
use showroom_core::{ScrapeKind, TaskNotice, TaskOutcome, TaskRowView, TaskStatus};

/// Prints terminal notifications as they arrive from the polling loop.
pub struct TermNotifier;

impl NotificationSink for TermNotifier {
    fn notify(&self, notice: TaskNotice) {
        match notice.outcome {
            TaskOutcome::Success => {
                println!("task #{} ({}) completed", notice.local_id, notice.kind);
            }
            TaskOutcome::Failure => {
                let detail = notice.detail.as_deref().unwrap_or("no detail");
                println!("task #{} ({}) failed: {}", notice.local_id, notice.kind, detail);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Help,
    Login { username: String, password: String },
    Submit { kind: ScrapeKind, urls: Vec<String> },
    Tasks,
    Readiness,
    Sync,
    Cleanup,
    CancelAll,
    Dismiss(u64),
    Products { search: Option<String> },
    Logout,
    Quit,
    Empty,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Command::Empty;
    };
    match verb {
        "help" => Command::Help,
        "login" => match (parts.next(), parts.next()) {
            (Some(username), Some(password)) => Command::Login {
                username: username.to_string(),
                password: password.to_string(),
            },
            _ => Command::Unknown("usage: login <username> <password>".to_string()),
        },
        "submit" => {
            let Some(kind) = parts.next().and_then(ScrapeKind::parse) else {
                return Command::Unknown(
                    "usage: submit <labirint|intecron> <url-or-slug>...".to_string(),
                );
            };
            let urls: Vec<String> = parts.map(str::to_string).collect();
            if urls.is_empty() {
                return Command::Unknown(
                    "usage: submit <labirint|intecron> <url-or-slug>...".to_string(),
                );
            }
            Command::Submit { kind, urls }
        }
        "tasks" => Command::Tasks,
        "readiness" => Command::Readiness,
        "sync" => Command::Sync,
        "cleanup" => Command::Cleanup,
        "cancel-all" => Command::CancelAll,
        "dismiss" => match parts.next().and_then(|raw| raw.parse::<u64>().ok()) {
            Some(id) => Command::Dismiss(id),
            None => Command::Unknown("usage: dismiss <task-number>".to_string()),
        },
        "products" => Command::Products {
            search: parts.next().map(str::to_string),
        },
        "logout" => Command::Logout,
        "quit" | "exit" => Command::Quit,
        other => Command::Unknown(format!("unknown command: {other} (try `help`)")),
    }
}

const HELP: &str = "commands:
  login <username> <password>
  submit <labirint|intecron> <url-or-slug>...
  tasks                 show tracked tasks
  readiness             show server task quotas
  sync                  reconcile with the server
  cleanup               clear my server-side tasks
  cancel-all            cancel every task (elevated role)
  dismiss <number>      drop one row locally
  products [search]     list catalog products
  logout
  quit";

fn render_rows(rows: &[TaskRowView]) {
    if rows.is_empty() {
        println!("no tracked tasks");
        return;
    }
    for row in rows {
        let status = match row.status {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        };
        let started = DateTime::<Utc>::from_timestamp_millis(row.started_at_ms)
            .map(|dt| dt.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        let mut line = format!(
            "#{:<3} {:<9} {:<9} {:>3}%  {} url(s)  started {}",
            row.local_id, row.kind, status, row.progress, row.url_count, started
        );
        if let Some(error) = &row.error {
            line.push_str(&format!("  [{error}]"));
        }
        println!("{line}");
    }
}

fn report_error(err: &ApiError) {
    match err {
        ApiError::SessionExpired | ApiError::NoRefreshToken => {
            println!("session expired; please `login` again");
        }
        ApiError::RateLimited { detail } => {
            println!("task limit hit: {detail} (wait, or run `sync`)");
        }
        _ => println!("error: {err}"),
    }
}

/// Drives the interactive loop until `quit` or stdin closes.
///
/// Stdin is read on a plain thread feeding `lines`; this loop stays on the
/// runtime so notifications and polling keep flowing between commands.
pub async fn run_loop(
    session: Arc<SessionManager>,
    tracker: Arc<TaskTracker>,
    catalog: Arc<CatalogApi>,
    lines: Receiver<String>,
) {
    println!("showroom console ready (try `help`)");
    loop {
        let line = match lines.try_recv() {
            Ok(line) => line,
            Err(TryRecvError::Empty) => {
                // Redraw only when polling actually changed something.
                if tracker.consume_dirty() {
                    render_rows(&tracker.rows());
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
                continue;
            }
            Err(TryRecvError::Disconnected) => break,
        };

        match parse_command(&line) {
            Command::Empty => {}
            Command::Help => println!("{HELP}"),
            Command::Unknown(message) => println!("{message}"),
            Command::Login { username, password } => {
                match session.login(&username, &password).await {
                    Ok(user) => println!("logged in as {} ({})", user.username, user.role),
                    Err(err) => report_error(&err),
                }
            }
            Command::Submit { kind, urls } => match tracker.submit(kind, &urls).await {
                Ok(outcome) => {
                    println!(
                        "task #{} accepted ({} url(s) sent)",
                        outcome.local_id,
                        outcome.submitted.len()
                    );
                    if !outcome.dropped.is_empty() {
                        println!("dropped invalid: {}", outcome.dropped.join(", "));
                    }
                }
                Err(err) => report_error(&err),
            },
            Command::Tasks => render_rows(&tracker.rows()),
            Command::Readiness => match tracker.readiness().await {
                Ok(snapshot) => {
                    println!(
                        "ready: {}  can start: {}  you: {}/{}  total: {}/{}",
                        snapshot.ready,
                        snapshot.can_start_task,
                        snapshot.user_tasks,
                        snapshot.max_user_tasks,
                        snapshot.total_tasks,
                        snapshot.max_total_tasks
                    );
                    for issue in &snapshot.issues {
                        println!("  issue [{}]: {}", issue.kind, issue.message);
                    }
                }
                Err(err) => report_error(&err),
            },
            Command::Sync => match tracker.sync().await {
                Ok(report) => {
                    println!(
                        "synchronized: you {} / total {} active task(s)",
                        report.user_tasks, report.total_tasks
                    );
                    if report.cleared_local > 0 {
                        println!("cleared {} stale local row(s)", report.cleared_local);
                    }
                }
                Err(err) => report_error(&err),
            },
            Command::Cleanup => match tracker.cleanup_own().await {
                Ok(cleaned) => println!("cleaned {cleaned} server-side task record(s)"),
                Err(err) => report_error(&err),
            },
            Command::CancelAll => {
                let elevated = session
                    .current_user()
                    .map(|user| user.is_elevated())
                    .unwrap_or(false);
                if !elevated {
                    println!("cancel-all needs an elevated role");
                    continue;
                }
                match tracker.cancel_all().await {
                    Ok(cancelled) => println!("cancelled {cancelled} task(s) system-wide"),
                    Err(err) => report_error(&err),
                }
            }
            Command::Dismiss(local_id) => {
                if tracker.dismiss(local_id) {
                    println!("dismissed #{local_id}");
                } else {
                    println!("no tracked task #{local_id}");
                }
            }
            Command::Products { search } => {
                let query = ProductQuery {
                    search,
                    ..ProductQuery::default()
                };
                match catalog.list_products(&query).await {
                    Ok(page) => {
                        println!("{} product(s) total", page.total);
                        for product in &page.items {
                            println!(
                                "  {:<6} {:<30} {:<12} {}",
                                product.id,
                                product.name,
                                product.brand.as_deref().unwrap_or("-"),
                                if product.is_active { "active" } else { "hidden" }
                            );
                        }
                    }
                    Err(ApiError::Superseded) => {
                        client_warn!("product listing superseded mid-flight");
                    }
                    Err(err) => report_error(&err),
                }
            }
            Command::Logout => {
                session.logout().await;
                println!("logged out");
            }
            Command::Quit => break,
        }
    }
    catalog.teardown();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_submit_with_kind_and_urls() {
        assert_eq!(
            parse_command("submit labirint royal /katalog/loft"),
            Command::Submit {
                kind: ScrapeKind::Labirint,
                urls: vec!["royal".to_string(), "/katalog/loft".to_string()],
            }
        );
    }

    #[test]
    fn submit_without_urls_is_rejected() {
        assert!(matches!(parse_command("submit labirint"), Command::Unknown(_)));
        assert!(matches!(parse_command("submit doors x"), Command::Unknown(_)));
    }

    #[test]
    fn parses_dismiss_with_numeric_id() {
        assert_eq!(parse_command("dismiss 3"), Command::Dismiss(3));
        assert!(matches!(parse_command("dismiss many"), Command::Unknown(_)));
    }

    #[test]
    fn blank_input_is_a_noop() {
        assert_eq!(parse_command("   "), Command::Empty);
    }

    #[test]
    fn quit_and_exit_are_synonyms() {
        assert_eq!(parse_command("quit"), Command::Quit);
        assert_eq!(parse_command("exit"), Command::Quit);
    }
}
