//! MCP server for the appbridge automation bridge.
#![deny(clippy::print_stdout, clippy::print_stderr)]

use std::io::ErrorKind;
use std::io::Result as IoResult;
use std::path::PathBuf;
use std::sync::Arc;

use appbridge_core::config::Config;
use appbridge_core::config::load_config;
use appbridge_core::config::load_config_from_file;
use appbridge_core::dispatch::Dispatcher;
use appbridge_core::exec::ExecutorOptions;
use appbridge_core::mode::ModeManager;
use appbridge_core::mode::ModeRegistry;
use appbridge_mcp_types::JSONRPCMessage;
use appbridge_mcp_types::methods;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::io::{self};
use tokio::sync::mpsc;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod elicitation;
pub(crate) mod message_processor;
mod outgoing_message;
pub mod tool_catalog;

use crate::message_processor::MessageProcessor;
use crate::outgoing_message::OutgoingMessage;
use crate::outgoing_message::OutgoingMessageSender;

/// Size of the bounded channel between the stdin reader and the processor.
const CHANNEL_CAPACITY: usize = 128;

pub async fn run_main(config_path: Option<PathBuf>) -> IoResult<()> {
    let config = match config_path {
        Some(path) => load_config_from_file(&path),
        None => load_config(),
    }
    .map_err(|e| std::io::Error::new(ErrorKind::InvalidData, format!("error loading config: {e}")))?;

    // Install the tracing subscriber. MCP uses stdout for the protocol, so
    // logs must go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .init();

    run_with_config(Arc::new(config)).await
}

async fn run_with_config(config: Arc<Config>) -> IoResult<()> {
    // Set up channels.
    let (incoming_tx, mut incoming_rx) = mpsc::channel::<JSONRPCMessage>(CHANNEL_CAPACITY);
    let (outgoing_tx, mut outgoing_rx) = mpsc::unbounded_channel::<OutgoingMessage>();

    let mode_manager = Arc::new(ModeManager::new(
        config.default_mode,
        ModeRegistry::from_modes_config(&config.modes),
    ));

    // Mode changes re-partition the advertised tools; tell the client.
    {
        let notify_tx = outgoing_tx.clone();
        mode_manager.on_mode_change(Box::new(move |old_mode, new_mode| {
            debug!(%old_mode, %new_mode, "notifying tool list change");
            let _ = notify_tx.send(OutgoingMessage::Notification {
                method: methods::NOTIFICATIONS_TOOL_LIST_CHANGED.to_string(),
                params: None,
            });
        }));
    }

    let executor = ExecutorOptions::new(config.executor_path.clone());
    let dispatcher = Arc::new(Dispatcher::new(config.clone(), mode_manager, executor));

    // --- Stdin reader ---
    let stdin_handle = tokio::spawn(async move {
        let stdin = io::stdin();
        let reader = BufReader::new(stdin);
        let mut lines = reader.lines();

        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<JSONRPCMessage>(&line) {
                Ok(msg) => {
                    if incoming_tx.send(msg).await.is_err() {
                        break;
                    }
                }
                Err(e) => error!("failed to deserialize JSON-RPC message: {e}"),
            }
        }

        debug!("stdin reader finished (EOF)");
    });

    // --- Stdout writer ---
    let stdout_handle = tokio::spawn(async move {
        let mut stdout = io::stdout();
        while let Some(outgoing_message) = outgoing_rx.recv().await {
            let msg: JSONRPCMessage = outgoing_message.into();
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if let Err(e) = stdout.write_all(json.as_bytes()).await {
                        error!("failed to write to stdout: {e}");
                        break;
                    }
                    if let Err(e) = stdout.write_all(b"\n").await {
                        error!("failed to write newline to stdout: {e}");
                        break;
                    }
                    if let Err(e) = stdout.flush().await {
                        error!("failed to flush stdout: {e}");
                        break;
                    }
                }
                Err(e) => error!("failed to serialize JSON-RPC message: {e}"),
            }
        }
        info!("stdout writer exited (channel closed)");
    });

    // --- Message processor ---
    let processor_handle = tokio::spawn(async move {
        let outgoing = OutgoingMessageSender::new(outgoing_tx);
        let mut processor = MessageProcessor::new(outgoing, dispatcher);
        while let Some(msg) = incoming_rx.recv().await {
            match msg {
                JSONRPCMessage::Request(request) => processor.process_request(request).await,
                JSONRPCMessage::Response(response) => processor.process_response(response).await,
                JSONRPCMessage::Notification(notification) => {
                    processor.process_notification(notification);
                }
                JSONRPCMessage::Error(err) => processor.process_error(err),
            }
        }
        info!("processor task exited (channel closed)");
    });

    // Wait for tasks to complete.
    let _ = stdin_handle.await;
    let _ = processor_handle.await;
    let _ = stdout_handle.await;

    Ok(())
}
