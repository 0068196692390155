use std::sync::mpsc;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use wayline_core::{Collaborators, Location, LocationListener, WaylineError, WaylineResult};

use crate::service::{NavigationService, ServiceLifecycleState};
use crate::template::NotificationTemplate;

/// Messages processed by the service thread, strictly in arrival order.
#[derive(Debug, Clone)]
pub enum ServiceCommand {
    Start,
    Fix(Location),
    LowMemory,
    /// Acknowledged once every command queued before it has been processed.
    Flush(mpsc::Sender<()>),
    Stop,
}

/// Forwards location fixes into the service inbox.
struct InboxListener {
    tx: mpsc::Sender<ServiceCommand>,
}

impl LocationListener for InboxListener {
    fn on_location_updated(&self, location: &Location) {
        if self.tx.send(ServiceCommand::Fix(location.clone())).is_err() {
            tracing::trace!("Navigation service gone, dropping fix");
        }
    }
}

/// Runs a [`NavigationService`] on a dedicated thread.
///
/// Start, fix delivery, and stop all go through one inbox, so a fix is fully
/// processed before the next command is looked at and a stop always waits for
/// the in-flight reaction. Dropping the handle stops the service.
pub struct ServiceHandle {
    tx: mpsc::Sender<ServiceCommand>,
    state: Arc<Mutex<ServiceLifecycleState>>,
    thread: Option<JoinHandle<()>>,
}

impl ServiceHandle {
    /// Create the service (registering its channel) and spawn its thread.
    pub fn spawn(deps: Collaborators, template: NotificationTemplate) -> WaylineResult<Self> {
        let (tx, rx) = mpsc::channel();
        let listener = Arc::new(InboxListener { tx: tx.clone() });
        let service = NavigationService::create(deps, template, listener);
        let state = Arc::new(Mutex::new(service.state()));

        let thread_state = state.clone();
        let thread = std::thread::Builder::new()
            .name("navigation-service".into())
            .spawn(move || run_service(service, rx, thread_state))
            .map_err(|e| WaylineError::Other(format!("Failed to spawn service thread: {e}")))?;

        Ok(Self {
            tx,
            state,
            thread: Some(thread),
        })
    }

    /// Start the service and wait until the start has been applied, so the
    /// location subscription is in place when this returns.
    pub fn start(&self) -> WaylineResult<()> {
        self.send(ServiceCommand::Start)?;
        self.flush()
    }

    /// Block until the service thread has processed every command queued
    /// so far, fixes forwarded by the location listener included.
    pub fn flush(&self) -> WaylineResult<()> {
        let (ack_tx, ack_rx) = mpsc::channel();
        self.send(ServiceCommand::Flush(ack_tx))?;
        ack_rx.recv().map_err(|_| WaylineError::ServiceGone)
    }

    pub fn low_memory(&self) -> WaylineResult<()> {
        self.send(ServiceCommand::LowMemory)
    }

    /// Lifecycle state as of the last command the service thread finished.
    pub fn state(&self) -> ServiceLifecycleState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stop the service and wait for teardown to finish. No-op after the first call.
    pub fn stop(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };
        if self.tx.send(ServiceCommand::Stop).is_err() {
            tracing::warn!("Navigation service thread exited before stop");
        }
        if thread.join().is_err() {
            tracing::error!("Navigation service thread panicked");
        }
    }

    fn send(&self, command: ServiceCommand) -> WaylineResult<()> {
        if self.thread.is_none() {
            return Err(WaylineError::ServiceGone);
        }
        self.tx.send(command).map_err(|_| WaylineError::ServiceGone)
    }
}

impl Drop for ServiceHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_service(
    mut service: NavigationService,
    rx: mpsc::Receiver<ServiceCommand>,
    state: Arc<Mutex<ServiceLifecycleState>>,
) {
    let publish = |s: ServiceLifecycleState| {
        *state.lock().unwrap_or_else(PoisonError::into_inner) = s;
    };

    while let Ok(command) = rx.recv() {
        match command {
            ServiceCommand::Start => service.start(),
            ServiceCommand::Fix(location) => {
                let outcome = service.on_location_updated(&location);
                tracing::trace!("Tick at {} -> {outcome:?}", location.timestamp);
            }
            ServiceCommand::LowMemory => service.on_low_memory(),
            ServiceCommand::Flush(ack) => {
                let _ = ack.send(());
            }
            ServiceCommand::Stop => {
                service.stop();
                publish(service.state());
                break;
            }
        }
        publish(service.state());
    }

    // Anything still queued behind the stop is dropped with the receiver.
    tracing::debug!("Navigation service thread exiting");
}
