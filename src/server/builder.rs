// ────────────────────────────────
// src/server/builder.rs
// ────────────────────────────────
use super::handler::Responder;
use super::session::{ClientInterrupt, SessionOutcome, SessionRunner};
use crate::config::EndpointConfig;
use anyhow::{Context, Result};
use std::future::Future;
use std::net::SocketAddr;
use tokio::sync::oneshot;

/// Builder so `main.rs` (or a test) can inject its responder.
pub struct ServerBuilder<R> {
    config: EndpointConfig,
    responder: Option<R>,
    bound: Option<oneshot::Sender<SocketAddr>>,
}

impl<R> ServerBuilder<R>
where
    R: Responder + Send + 'static,
{
    pub fn new(config: EndpointConfig) -> Self {
        Self {
            config,
            responder: None,
            bound: None,
        }
    }

    pub fn with_responder(mut self, responder: R) -> Self {
        self.responder = Some(responder);
        self
    }

    /// Report the listener's actual address once it is bound.
    pub fn notify_bound(mut self, tx: oneshot::Sender<SocketAddr>) -> Self {
        self.bound = Some(tx);
        self
    }

    /// Serve clients one after another until `shutdown` resolves or an
    /// accept fails. Returns the number of finished sessions.
    pub async fn serve<F>(self, shutdown: F) -> Result<usize>
    where
        F: Future<Output = ()>,
    {
        let mut responder = self
            .responder
            .context("responder must be set via with_responder()")?;

        let interrupt = ClientInterrupt::new();
        let mut runner = SessionRunner::new(self.config).with_client_interrupt(interrupt.clone());
        runner.start().context("Failed to open provisioning listener")?;
        let listener_interrupt = runner.interrupt_handle()?;

        if let (Some(tx), Some(addr)) = (self.bound, runner.local_addr()) {
            let _ = tx.send(addr);
        }
        tracing::info!("Provisioning endpoint listening on {:?}", runner.local_addr());

        let worker_interrupt = interrupt.clone();

        let mut worker = tokio::task::spawn_blocking(move || {
            let mut sessions = 0usize;
            let result = loop {
                if worker_interrupt.is_stopping() {
                    break Ok(sessions);
                }
                match runner.serve_one(&mut responder) {
                    Ok(SessionOutcome::Interrupted) => {}
                    Ok(_) => sessions += 1,
                    Err(_) if worker_interrupt.is_stopping() => break Ok(sessions),
                    Err(err) => break Err(err),
                }
            };
            runner.shutdown();
            result
        });

        let joined = tokio::select! {
            joined = &mut worker => joined,
            _ = shutdown => {
                tracing::info!("Shutdown requested, interrupting provisioning endpoint");
                interrupt.stop();
                listener_interrupt.interrupt();
                worker.await
            }
        };

        let sessions = joined
            .context("Session worker panicked")?
            .context("Provisioning session failed")?;
        Ok(sessions)
    }
}
