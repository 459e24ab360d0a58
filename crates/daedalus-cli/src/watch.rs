//! Watch mode.
//!
//! Runs happen on the blocking pool. When a new batch of changes arrives
//! while a run is in flight, that run is cancelled and a fresh one starts
//! once it has returned the session.

use std::ffi::OsStr;
use std::time::Duration;

use daedalus_config::{ChangeBatch, FileWatcher, CONFIG_FILE_NAME};
use daedalus_gen::GeneratorError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::CliError;
use crate::session::{Outcome, Session};

const DEBOUNCE: Duration = Duration::from_millis(200);

type RunHandle = JoinHandle<(Session, Result<Outcome, CliError>)>;

/// Regenerates on every change until the watcher shuts down.
pub async fn watch(mut session: Session) -> Result<(), CliError> {
    let mut builder = FileWatcher::builder()
        .with_debounce(DEBOUNCE)
        .watch_path(session.source_dir())?
        .watch_path_optional(session.config_path())
        .watch_extensions(&["rs", "toml", "json"]);
    if let Some(name) = session.output_path().file_name().and_then(OsStr::to_str) {
        builder = builder.ignore_file_name(name);
    }
    let mut watcher = builder.build()?;
    info!(path = %session.source_dir().display(), "Watching for changes");

    let mut reload = false;
    loop {
        if reload {
            if let Err(err) = session.reload() {
                error!(error = %err, "Failed to reload configuration; keeping the previous one");
            }
        }

        let cancel = CancellationToken::new();
        let mut task = spawn_run(session, cancel.clone());

        let next = tokio::select! {
            joined = &mut task => {
                let (returned, result) = joined?;
                session = returned;
                log_result(result);
                watcher.next_batch().await
            }
            batch = watcher.next_batch() => {
                cancel.cancel();
                let (returned, result) = task.await?;
                session = returned;
                log_result(result);
                batch
            }
        };

        let Some(batch) = next else {
            info!("Watcher stopped");
            return Ok(());
        };
        reload = touches_config(&batch, &session);
        info!(changed = batch.paths.len(), reload, "Change detected, regenerating");
    }
}

fn spawn_run(mut session: Session, cancel: CancellationToken) -> RunHandle {
    session.set_cancellation(cancel);
    tokio::task::spawn_blocking(move || {
        let result = session.run();
        (session, result)
    })
}

fn log_result(result: Result<Outcome, CliError>) {
    match result {
        Ok(outcome) if outcome.failed => warn!(
            errors = outcome.summary.errors,
            warnings = outcome.summary.warnings,
            "Generated with diagnostics"
        ),
        Ok(_) => {}
        Err(CliError::Generator(GeneratorError::Cancelled)) => info!("Run cancelled by a newer change"),
        Err(err) => error!(error = %err, "Generation failed"),
    }
}

fn touches_config(batch: &ChangeBatch, session: &Session) -> bool {
    let config = session.config_path();
    batch
        .paths
        .iter()
        .any(|path| path.ends_with(CONFIG_FILE_NAME) || path.file_name() == config.file_name())
}
