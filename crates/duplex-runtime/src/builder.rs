//! Runtime Builder API
//!
//! Wires the router, both effect queues and one supervised session per
//! network side, then hands back a handle for monitoring and shutdown.

use std::sync::Arc;

use duplex_core::{BridgeError, BridgeResult, ContactDirectory, ControlAdapter, FieldAdapter};
use tokio::{sync::watch, task::JoinHandle};
use tracing::info;

use crate::effects::effect_channels;
use crate::router::{Router, RouterConfig};
use crate::session::{ControlSession, FieldSession};
use crate::supervisor::{RetryPolicy, Supervisor, SupervisorStats};

// ----------------------------------------------------------------------------
// Runtime Builder
// ----------------------------------------------------------------------------

/// Builder for a running relay
pub struct RuntimeBuilder {
    router_config: RouterConfig,
    directory: ContactDirectory,
    retry_policy: RetryPolicy,
}

impl RuntimeBuilder {
    pub fn new(router_config: RouterConfig, directory: ContactDirectory) -> Self {
        Self {
            router_config,
            directory,
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Delay policy shared by both supervisors
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Spawn both supervisors on the current tokio runtime
    pub fn build_and_start<C, F>(self, control: C, field: F) -> RuntimeHandle
    where
        C: ControlAdapter + 'static,
        F: FieldAdapter + 'static,
    {
        info!(
            "Starting relay for operator {}",
            self.router_config.operator_id
        );

        let router = Arc::new(Router::new(self.router_config, self.directory));
        let (dispatcher, queues) = effect_channels();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let control_session =
            ControlSession::new(control, router.clone(), dispatcher.clone(), queues.control);
        let field_session = FieldSession::new(field, router.clone(), dispatcher, queues.field);

        let control_supervisor =
            Supervisor::new(control_session, self.retry_policy, shutdown_rx.clone());
        let field_supervisor = Supervisor::new(field_session, self.retry_policy, shutdown_rx);

        let control_status = control_supervisor.subscribe();
        let field_status = field_supervisor.subscribe();

        RuntimeHandle {
            router,
            shutdown: shutdown_tx,
            control_status,
            field_status,
            control_handle: Some(tokio::spawn(control_supervisor.run())),
            field_handle: Some(tokio::spawn(field_supervisor.run())),
        }
    }
}

// ----------------------------------------------------------------------------
// Runtime Handle
// ----------------------------------------------------------------------------

/// Handle to a running relay
pub struct RuntimeHandle {
    router: Arc<Router>,
    shutdown: watch::Sender<bool>,
    control_status: watch::Receiver<SupervisorStats>,
    field_status: watch::Receiver<SupervisorStats>,
    control_handle: Option<JoinHandle<SupervisorStats>>,
    field_handle: Option<JoinHandle<SupervisorStats>>,
}

impl RuntimeHandle {
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub fn control_status(&self) -> watch::Receiver<SupervisorStats> {
        self.control_status.clone()
    }

    pub fn field_status(&self) -> watch::Receiver<SupervisorStats> {
        self.field_status.clone()
    }

    /// Wait for both supervisors to stop on their own
    ///
    /// Both tasks are always joined; the control side's error wins if both fail.
    pub async fn wait(&mut self) -> BridgeResult<()> {
        let control = join(self.control_handle.take()).await;
        let field = join(self.field_handle.take()).await;
        control.and(field)
    }

    /// Signal shutdown and wait for both sides to disconnect
    pub async fn shutdown(mut self) -> BridgeResult<()> {
        info!("Shutting down relay");
        // Receivers live inside the supervisors; if both are gone so is the work.
        let _ = self.shutdown.send(true);
        self.wait().await?;
        info!("Relay shut down");
        Ok(())
    }
}

async fn join(handle: Option<JoinHandle<SupervisorStats>>) -> BridgeResult<()> {
    let Some(handle) = handle else {
        return Ok(());
    };

    let stats = handle
        .await
        .map_err(|e| BridgeError::Task(format!("Supervisor task panicked: {}", e)))?;
    info!(
        "{} side stopped after {} sessions, {} failures",
        stats.side, stats.sessions_started, stats.failures
    );
    Ok(())
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
