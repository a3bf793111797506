//! Alarm service connection
//!
//! Boundary to the component that actually rings: while it is connected it
//! knows which alarm is currently firing. The dismissal flow reads the
//! latest connection state and can ask the service to stop.

use tokio::sync::watch;
use tracing::info;

use crate::alarm::AlarmId;

/// Connection state of the ringing alarm service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Disconnected,
    Connected { alarm_id: AlarmId },
}

/// Handle to the ringing alarm service
pub trait AlarmController: Send + Sync {
    /// Latest-value stream of the connection state
    fn state(&self) -> watch::Receiver<ControllerState>;

    /// Stop the ringing service entirely
    fn stop_service(&self);
}

/// In-process controller used by the demo binary and tests
pub struct InProcessController {
    state_tx: watch::Sender<ControllerState>,
}

impl Default for InProcessController {
    fn default() -> Self {
        Self::new()
    }
}

impl InProcessController {
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(ControllerState::Disconnected);
        Self { state_tx }
    }

    /// Mark the service connected with the given ringing alarm
    pub fn connect(&self, alarm_id: AlarmId) {
        self.state_tx
            .send_replace(ControllerState::Connected { alarm_id });
    }

    pub fn disconnect(&self) {
        self.state_tx.send_replace(ControllerState::Disconnected);
    }
}

impl AlarmController for InProcessController {
    fn state(&self) -> watch::Receiver<ControllerState> {
        self.state_tx.subscribe()
    }

    fn stop_service(&self) {
        info!("alarm service stopping");
        self.state_tx.send_replace(ControllerState::Disconnected);
    }
}
