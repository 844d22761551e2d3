use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::time;

use eyre::{Context, Result};
use parley::app::App;
use parley::app::services::{ActionService, ShutdownCoordinator};
use parley::backend::new_backend;
use parley::chat::Chat;
use parley::cli::Command;
use parley::config::{Configuration, init_logger, verbose};
use parley::models::{Action, Event};
use parley::storage::new_store;
use tokio::{io::BufReader, sync::mpsc, task};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Command::new();
    if cmd.version() {
        cmd.print_version();
        return Ok(());
    }

    std::panic::set_hook(Box::new(|panic_info| {
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));

    let config = cmd.get_config()?;
    init_logger(&config.log)?;
    let log_path = config.log.file.path.clone();
    Configuration::init(config)?;
    let config = Configuration::instance();
    verbose!("[+] Logger initialized, writing to {}", log_path);

    verbose!("[+] Initializing backend...");
    let backend = new_backend(&config.backend).wrap_err("initializing backend")?;

    verbose!("[+] Initializing storage...");
    let store = new_store(&config.storage).wrap_err("initializing storage")?;
    let chat = Chat::load(store).await;
    verbose!("[+] Loaded {} conversations", chat.conversations().len());

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    let (action_tx, action_rx) = mpsc::unbounded_channel::<Action>();
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

    let mut task_set = task::JoinSet::new();
    let token = CancellationToken::new();
    let pending_tasks = Arc::new(AtomicUsize::new(0));

    let mut action_service = ActionService::new(
        chat,
        backend,
        action_rx,
        Arc::new(event_tx),
        token.clone(),
        pending_tasks.clone(),
    );

    task_set.spawn(async move { action_service.run().await });

    let mut app = App::new(action_tx, event_rx, token.clone(), std::io::stdout());
    if let Err(err) = app.run(BufReader::new(tokio::io::stdin())).await {
        eprintln!("Error: {}", err);
    }

    let coordinator = ShutdownCoordinator {
        pending_tasks: pending_tasks.clone(),
        shutdown_complete: shutdown_tx,
        timeout: None,
    };
    task_set.spawn(coordinator.wait_for_completion());

    match tokio::time::timeout(time::Duration::from_secs(15), shutdown_rx).await {
        Ok(Ok(Ok(_))) => {}
        Ok(Ok(Err(e))) => eprintln!("Shutdown error: {}", e),
        Ok(Err(e)) => eprintln!("Shutdown error: {}", e),
        Err(_) => eprintln!("Shutdown timeout reached"),
    }

    task_set.abort_all();
    while let Some(res) = task_set.join_next().await {
        match res {
            Ok(Ok(_)) => {}
            Ok(Err(err)) => log::error!("Task error: {}", err),
            Err(err) if err.is_cancelled() => {}
            Err(err) => log::error!("Task error: {}", err),
        }
    }

    Ok(())
}
