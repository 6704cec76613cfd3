use super::manager::{Command, ManagerStats};
use hostres_application::ports::HostCache;
use hostres_application::scheduler::{Completion, InvalidationReason, RequestId};
use hostres_application::services::DnsSettings;
use hostres_domain::{
    AbortReason, ContextId, DomainError, HostEntry, Hostname, ResolveError, ResolveParameters,
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::debug;

fn manager_gone() -> ResolveError {
    ResolveError::Aborted(AbortReason::ManagerShutDown)
}

/// Cloneable handle to a running resolver manager.
///
/// Every method is a message to the manager task; none of them block.
#[derive(Clone)]
pub struct HostResolver {
    commands: mpsc::UnboundedSender<Command>,
    shutdown: CancellationToken,
}

impl HostResolver {
    pub(crate) fn new(commands: mpsc::UnboundedSender<Command>, shutdown: CancellationToken) -> Self {
        Self { commands, shutdown }
    }

    /// Starts resolving `host` in the default context.
    ///
    /// Invalid hostnames are rejected here; every other outcome is delivered
    /// through the returned request.
    pub fn resolve(
        &self,
        host: &str,
        params: ResolveParameters,
    ) -> Result<ResolveRequest, DomainError> {
        self.resolve_in(ContextId::DEFAULT, host, params)
    }

    pub fn resolve_in(
        &self,
        context: ContextId,
        host: &str,
        params: ResolveParameters,
    ) -> Result<ResolveRequest, DomainError> {
        let host = Hostname::parse(host)?;
        let (reply, completion) = oneshot::channel();
        let (id_tx, id_rx) = oneshot::channel();

        let sent = self.commands.send(Command::Resolve {
            host,
            params,
            context,
            reply,
            id_tx,
        });
        if sent.is_err() {
            debug!("Resolve issued after manager shutdown");
        }

        Ok(ResolveRequest {
            completion: Some(completion),
            id_rx: Some(id_rx),
            commands: self.commands.clone(),
        })
    }

    /// Registers a resolve context. `None` resolves without caching.
    pub async fn register_context(
        &self,
        cache: Option<Arc<dyn HostCache>>,
    ) -> Result<ContextId, ResolveError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::RegisterContext { cache, reply })
            .map_err(|_| manager_gone())?;
        rx.await.map_err(|_| manager_gone())
    }

    /// Aborts the context's jobs with `ContextShutDown` and drops its cache.
    pub fn deregister_context(&self, context: ContextId) {
        let _ = self.commands.send(Command::DeregisterContext(context));
    }

    pub fn invalidate_caches(&self, reason: InvalidationReason) {
        let _ = self.commands.send(Command::Invalidate(reason));
    }

    pub fn update_settings(&self, settings: DnsSettings) {
        let _ = self.commands.send(Command::UpdateSettings(settings));
    }

    pub fn set_insecure_dns_enabled(&self, enabled: bool) {
        let _ = self.commands.send(Command::SetInsecureDnsEnabled(enabled));
    }

    /// Changes admission limits. `max_queued_stages == 0` means unbounded.
    pub fn set_limits(&self, max_concurrent_stages: usize, max_queued_stages: usize) {
        let _ = self.commands.send(Command::SetLimits {
            max_concurrent_stages: max_concurrent_stages.max(1),
            max_queued_stages,
        });
    }

    pub async fn stats(&self) -> Result<ManagerStats, ResolveError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Stats(reply))
            .map_err(|_| manager_gone())?;
        rx.await.map_err(|_| manager_gone())
    }

    /// Stops the manager. Outstanding requests complete with
    /// `Aborted(ManagerShutDown)`.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled() || self.commands.is_closed()
    }
}

/// An outstanding resolution. Dropping it before completion cancels the
/// request; the job itself may keep running for other requests.
pub struct ResolveRequest {
    completion: Option<oneshot::Receiver<Completion>>,
    id_rx: Option<oneshot::Receiver<RequestId>>,
    commands: mpsc::UnboundedSender<Command>,
}

impl ResolveRequest {
    pub async fn wait(self) -> Result<HostEntry, ResolveError> {
        self.wait_with_info().await.result
    }

    /// Waits for the completion, including staleness of any cache entry
    /// that was found but not used.
    pub async fn wait_with_info(mut self) -> Completion {
        let completion = match self.completion.as_mut() {
            Some(receiver) => receiver.await.ok(),
            None => None,
        };
        self.completion = None;

        completion.unwrap_or_else(|| Completion {
            result: Err(manager_gone()),
            stale_info: None,
        })
    }
}

impl Drop for ResolveRequest {
    fn drop(&mut self) {
        if self.completion.take().is_none() {
            return;
        }
        if let Some(id_rx) = self.id_rx.take() {
            let _ = self.commands.send(Command::Cancel(id_rx));
        }
    }
}
