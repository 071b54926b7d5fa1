use std::sync::{Arc, LazyLock};

use missive_common::{Signal, internal, logging};
use missive_delivery::{MailerConfig, Worker};
use missive_dispatch::{AuthGate, BatchSendEndpoint, DispatchService};
use missive_queue::{JobStore, QueueConfig};
use serde::Deserialize;
use tokio::sync::broadcast;

/// Top-level service configuration and lifecycle
///
/// Deserialised from the RON configuration file; owns the queue, the worker,
/// the transport, and the credential gate, and wires them together at
/// startup.
#[derive(Debug, Default, Deserialize)]
pub struct Missive {
    #[serde(default)]
    queue: QueueConfig,
    #[serde(default)]
    worker: Worker,
    #[serde(default)]
    mailer: MailerConfig,
    #[serde(default)]
    auth: AuthGate,
}

pub static SHUTDOWN_BROADCAST: LazyLock<broadcast::Sender<Signal>> = LazyLock::new(|| {
    let (sender, _receiver) = broadcast::channel(64);
    sender
});

async fn shutdown() -> anyhow::Result<()> {
    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            internal!("CTRL+C entered -- Enter it again to force shutdown");
        }
        _ = terminate.recv() => {
            internal!("Terminate signal received, shutting down");
        }
    };

    let mut receiver = SHUTDOWN_BROADCAST.subscribe();

    SHUTDOWN_BROADCAST
        .send(Signal::Shutdown)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Interrupted, e.to_string()))?;

    loop {
        tokio::select! {
            sig = receiver.recv() => {
                match sig {
                    Ok(s) => tracing::debug!("Received {s:?}"),
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(e) => tracing::debug!("Received: {e:?}"),
                }
            }

            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    Ok(())
}

impl Missive {
    /// Build the authenticated batch-send surface backed by `store`
    ///
    /// This is the seam for whatever transport embeds the service: hand it
    /// the store the worker consumes from and expose `submit` however you
    /// like.
    #[must_use]
    pub fn batch_endpoint(&self, store: Arc<dyn JobStore>) -> BatchSendEndpoint {
        BatchSendEndpoint::new(self.auth.clone(), DispatchService::new(store))
    }

    /// Run the service until a shutdown signal arrives
    ///
    /// # Errors
    ///
    /// This function will return an error if the worker cannot be served.
    pub async fn run(mut self) -> anyhow::Result<()> {
        logging::init();

        let store = self.queue.clone().into_store();
        let mailer = self.mailer.clone().into_mailer();
        self.worker.init(Arc::clone(&store), mailer);

        internal!("Controller running");

        let ret = tokio::select! {
            r = self.worker.serve(SHUTDOWN_BROADCAST.subscribe()) => {
                r.map_err(anyhow::Error::from)
            }
            r = shutdown() => {
                r
            }
        };

        internal!("Shutting down...");

        ret
    }
}
