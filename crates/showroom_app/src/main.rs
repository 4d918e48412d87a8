mod commands;
mod config;
mod logging;

use std::io::BufRead;
use std::sync::{mpsc, Arc};

use chrono::Utc;
use client_logging::client_info;
use showroom_client::{CatalogApi, FileSessionStore, SessionManager, TaskTracker};

#[tokio::main]
async fn main() {
    logging::initialize(logging::LogDestination::File);
    let config = config::AppConfig::from_env();

    let store = Arc::new(FileSessionStore::new(config.state_dir.clone()));
    let session = match SessionManager::new(&config.client, store) {
        Ok(session) => Arc::new(session),
        Err(err) => {
            eprintln!("failed to build API client: {err}");
            std::process::exit(1);
        }
    };

    let tracker = Arc::new(TaskTracker::new(
        session.clone(),
        Arc::new(commands::TermNotifier),
        Arc::new(|| Utc::now().timestamp()),
    ));
    let catalog = Arc::new(CatalogApi::new(session.clone()));

    // Non-interactive login when credentials come from the environment and
    // no stored session survived.
    if !session.is_authenticated() {
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            match session.login(username, password).await {
                Ok(user) => println!("logged in as {}", user.username),
                Err(err) => eprintln!("login failed: {err}"),
            }
        } else {
            println!("not logged in; use `login <username> <password>`");
        }
    } else if !session.check_token_validity().await {
        println!("stored session is stale; it will refresh on first use or ask you to log in");
    }

    client_info!("polling every {:?}", config.client.poll_interval);
    let polling = tracker.clone().spawn_polling(config.client.poll_interval);

    // Plain reader thread; the async loop drains it without blocking.
    let (line_tx, line_rx) = mpsc::channel::<String>();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if line_tx.send(line).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    commands::run_loop(session, tracker, catalog, line_rx).await;

    polling.stopped().await;
    client_info!("console shut down");
}
