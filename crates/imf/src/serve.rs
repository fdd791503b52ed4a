// SPDX-FileCopyrightText: 2026 iMessageForwarder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `imf serve`: open both stores and run the plain and mutual-TLS listeners.

use std::future::Future;
use std::sync::Arc;

use imf_config::ImfConfig;
use imf_core::ImfError;
use imf_gateway::{tls, AppState, CommandExporter};
use imf_storage::{AttachmentResolver, HistoryStore, QueueStore};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::shutdown;

/// Run the relay until SIGINT/SIGTERM or until a listener fails.
pub async fn run_serve(config: ImfConfig) -> Result<(), ImfError> {
    init_tracing(&config.service.log_level);

    let queue_path = required(config.storage.queue_path.as_deref(), "QUEUE_PATH")?;
    let chat_path = required(config.storage.chat_path.as_deref(), "CHAT_PATH")?;
    let home_dir = config.history.resolved_home_dir().ok_or_else(|| {
        ImfError::Config("cannot determine the home directory, set history.home_dir".into())
    })?;

    let queue = QueueStore::open(queue_path).await?;
    let history = HistoryStore::open(chat_path).await?;
    info!(queue_path, chat_path, home_dir = %home_dir.display(), "stores opened");

    let state = AppState {
        service_name: Arc::from(config.service.name.as_str()),
        queue: queue.clone(),
        history: history.clone(),
        attachments: AttachmentResolver::new(history, home_dir),
        exporter: Arc::new(CommandExporter::from_config(&config.exporter, chat_path)),
        echo_rows: config.status.echo_rows,
    };

    let acceptor = tls::load_acceptor(&config.tls)?;
    let host = config.server.bind_address.as_str();
    let plain = imf_gateway::bind(host, config.server.http_port).await?;
    let secure = imf_gateway::bind(host, config.server.https_port).await?;

    let shutdown = shutdown::install_signal_handler();
    let (plain_result, tls_result) = tokio::join!(
        cancel_on_exit(
            shutdown.clone(),
            imf_gateway::serve_plain(plain, imf_gateway::plain_router(state.clone()), shutdown.clone()),
        ),
        cancel_on_exit(
            shutdown.clone(),
            imf_gateway::serve_tls(secure, acceptor, imf_gateway::secure_router(state), shutdown.clone()),
        ),
    );

    if let Err(e) = queue.checkpoint().await {
        warn!(error = %e, "final WAL checkpoint failed");
    }
    info!("relay stopped");

    plain_result.and(tls_result)
}

/// Cancel `token` once `fut` completes so one failed listener stops the other.
async fn cancel_on_exit<F>(token: CancellationToken, fut: F) -> Result<(), ImfError>
where
    F: Future<Output = Result<(), ImfError>>,
{
    let result = fut.await;
    if let Err(e) = &result {
        error!(error = %e, "listener failed");
    }
    token.cancel();
    result
}

fn required<'a>(value: Option<&'a str>, var: &str) -> Result<&'a str, ImfError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ImfError::Config(format!("{var} is not set")))
}

/// Initialize the tracing subscriber with an env filter.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("imf={log_level},warn")));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .try_init();
}
