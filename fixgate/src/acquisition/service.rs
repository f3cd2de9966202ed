//! Tokio service owning a [`Coordinator`].
//!
//! The coordinator itself is a synchronous state machine. The service runs
//! it inside one background task and serializes everything that reaches it:
//!
//! ```text
//! ┌──────────────────┐   Command (bounded)   ┌──────────────────────────┐
//! │ CoordinatorHandle│──────────────────────►│                          │
//! └──────────────────┘                       │   run loop               │
//! ┌──────────────────┐   Event (unbounded)   │   (owns Coordinator)     │
//! │ Backend / timers │──────────────────────►│                          │
//! └──────────────────┘                       └──────────────────────────┘
//! ```
//!
//! Backend completions go through the unbounded event channel so a backend
//! callback never blocks. Host commands are bounded.
//!
//! # Lifecycle
//!
//! 1. **Creation**: `start()` spawns the run loop
//! 2. **Operation**: hosts drive the coordinator through `handle()`
//! 3. **Shutdown**: `shutdown()` stops the coordinator and waits for the task

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::backend::{LocationBackend, Platform};
use super::completion::{EventReceiver, RequestToken};
use super::coordinator::Coordinator;
use super::error::ServiceError;
use super::host::Host;
use super::readiness::Readiness;
use super::state::Fix;

/// Capacity of the host command channel.
pub const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Host-side request to the coordinator service.
pub enum Command {
    Start,
    Register(Box<dyn Host>),
    Unregister,
    Stop,
    Reset,
    RequestPermission,
    RequestPermissionExplained,
    RequestSettingsResolution,
    /// Deliver a permission result directly, bypassing the completion handle.
    PermissionResult {
        token: RequestToken,
        granted: bool,
        reply: oneshot::Sender<bool>,
    },
    SettingsResolutionResult {
        token: RequestToken,
        accepted: bool,
    },
    BestFix(oneshot::Sender<Option<Fix>>),
    Readiness(oneshot::Sender<Readiness>),
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Start => "Start",
            Self::Register(_) => "Register",
            Self::Unregister => "Unregister",
            Self::Stop => "Stop",
            Self::Reset => "Reset",
            Self::RequestPermission => "RequestPermission",
            Self::RequestPermissionExplained => "RequestPermissionExplained",
            Self::RequestSettingsResolution => "RequestSettingsResolution",
            Self::PermissionResult { .. } => "PermissionResult",
            Self::SettingsResolutionResult { .. } => "SettingsResolutionResult",
            Self::BestFix(_) => "BestFix",
            Self::Readiness(_) => "Readiness",
        };
        f.write_str(name)
    }
}

/// Cloneable async front end to a running [`CoordinatorService`].
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<Command>,
}

impl CoordinatorHandle {
    async fn send(&self, command: Command) -> Result<(), ServiceError> {
        self.tx.send(command).await.map_err(|_| ServiceError::Closed)
    }

    async fn query<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.send(make(reply)).await?;
        rx.await.map_err(|_| ServiceError::Closed)
    }

    pub async fn start(&self) -> Result<(), ServiceError> {
        self.send(Command::Start).await
    }

    pub async fn register(&self, host: Box<dyn Host>) -> Result<(), ServiceError> {
        self.send(Command::Register(host)).await
    }

    pub async fn unregister(&self) -> Result<(), ServiceError> {
        self.send(Command::Unregister).await
    }

    pub async fn stop(&self) -> Result<(), ServiceError> {
        self.send(Command::Stop).await
    }

    pub async fn reset(&self) -> Result<(), ServiceError> {
        self.send(Command::Reset).await
    }

    pub async fn request_permission(&self) -> Result<(), ServiceError> {
        self.send(Command::RequestPermission).await
    }

    pub async fn request_permission_explained(&self) -> Result<(), ServiceError> {
        self.send(Command::RequestPermissionExplained).await
    }

    pub async fn request_settings_resolution(&self) -> Result<(), ServiceError> {
        self.send(Command::RequestSettingsResolution).await
    }

    /// Returns whether the permission is granted after applying the result.
    pub async fn permission_result(
        &self,
        token: RequestToken,
        granted: bool,
    ) -> Result<bool, ServiceError> {
        self.query(|reply| Command::PermissionResult {
            token,
            granted,
            reply,
        })
        .await
    }

    pub async fn settings_resolution_result(
        &self,
        token: RequestToken,
        accepted: bool,
    ) -> Result<(), ServiceError> {
        self.send(Command::SettingsResolutionResult { token, accepted })
            .await
    }

    pub async fn best_fix(&self) -> Result<Option<Fix>, ServiceError> {
        self.query(Command::BestFix).await
    }

    pub async fn readiness(&self) -> Result<Readiness, ServiceError> {
        self.query(Command::Readiness).await
    }

    /// True while the service task is accepting commands.
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Background task running a [`Coordinator`].
pub struct CoordinatorService {
    handle: CoordinatorHandle,
    task: Option<JoinHandle<()>>,
    shutdown_token: CancellationToken,
}

impl CoordinatorService {
    /// Spawn the run loop. Must be called within a tokio runtime.
    pub fn start<B, P>(coordinator: Coordinator<B, P>, events: EventReceiver) -> Self
    where
        B: LocationBackend + 'static,
        P: Platform + 'static,
    {
        let (tx, commands) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let shutdown_token = CancellationToken::new();

        let task_shutdown = shutdown_token.clone();
        let task = Some(tokio::spawn(async move {
            run(coordinator, commands, events, task_shutdown).await;
        }));

        info!("Location coordinator service started");

        Self {
            handle: CoordinatorHandle { tx },
            task,
            shutdown_token,
        }
    }

    pub fn handle(&self) -> CoordinatorHandle {
        self.handle.clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Get the shutdown token for external coordination.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Stop the coordinator and wait for the task to finish.
    pub async fn shutdown(mut self) {
        info!("Shutting down location coordinator service");
        self.shutdown_token.cancel();

        if let Some(task) = self.task.take() {
            match task.await {
                Ok(()) => info!("Location coordinator service stopped"),
                Err(e) => tracing::error!("Location coordinator task panicked: {}", e),
            }
        }
    }
}

impl Drop for CoordinatorService {
    fn drop(&mut self) {
        self.shutdown_token.cancel();
    }
}

async fn run<B: LocationBackend, P: Platform>(
    mut coordinator: Coordinator<B, P>,
    mut commands: mpsc::Receiver<Command>,
    mut events: EventReceiver,
    shutdown: CancellationToken,
) {
    tracing::debug!("Coordinator run loop started");

    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => break,

            // Completions that already happened apply before new commands.
            // The coordinator holds a sender, so this never yields None.
            Some(event) = events.recv() => coordinator.handle(event),

            command = commands.recv() => match command {
                Some(command) => apply(&mut coordinator, command),
                None => {
                    tracing::debug!("All coordinator handles dropped");
                    break;
                }
            },
        }
    }

    coordinator.stop();
    tracing::debug!("Coordinator run loop stopped");
}

fn apply<B: LocationBackend, P: Platform>(coordinator: &mut Coordinator<B, P>, command: Command) {
    tracing::trace!(?command, "Applying command");
    match command {
        Command::Start => coordinator.start(),
        Command::Register(host) => coordinator.register(host),
        Command::Unregister => coordinator.unregister(),
        Command::Stop => coordinator.stop(),
        Command::Reset => coordinator.reset(),
        Command::RequestPermission => coordinator.request_permission(),
        Command::RequestPermissionExplained => coordinator.request_permission_explained(),
        Command::RequestSettingsResolution => coordinator.request_settings_resolution(),
        Command::PermissionResult {
            token,
            granted,
            reply,
        } => {
            let granted = coordinator.on_permission_result(token, granted);
            let _ = reply.send(granted);
        }
        Command::SettingsResolutionResult { token, accepted } => {
            coordinator.on_settings_resolution_result(token, accepted)
        }
        Command::BestFix(reply) => {
            let _ = reply.send(coordinator.best_fix().cloned());
        }
        Command::Readiness(reply) => {
            let _ = reply.send(coordinator.readiness());
        }
    }
}
