//! Shared test doubles for the dismissal flow

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::broadcast;

use voxalarm::alarm::{Alarm, AlarmId, DismissType};
use voxalarm::error::{AlarmError, AlarmResult};
use voxalarm::recognizer::{RecognizerEvent, SttRecognizer};
use voxalarm::store::AlarmRepository;

/// Repository over a fixed set of alarms, counting loads
pub struct MemoryRepository {
    alarms: HashMap<i64, Alarm>,
    loads: AtomicUsize,
}

impl MemoryRepository {
    pub fn new(alarms: impl IntoIterator<Item = Alarm>) -> Self {
        Self {
            alarms: alarms.into_iter().map(|a| (a.id.0, a)).collect(),
            loads: AtomicUsize::new(0),
        }
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AlarmRepository for MemoryRepository {
    async fn alarm(&self, id: AlarmId) -> AlarmResult<Alarm> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.alarms
            .get(&id.0)
            .cloned()
            .ok_or(AlarmError::NotFound(id))
    }
}

/// Recognizer whose event stream is fed explicitly by the test
pub struct ManualRecognizer {
    events: broadcast::Sender<RecognizerEvent>,
    starts: AtomicUsize,
    subscriptions: AtomicUsize,
}

impl Default for ManualRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualRecognizer {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            events,
            starts: AtomicUsize::new(0),
            subscriptions: AtomicUsize::new(0),
        }
    }

    /// Deliver one recognizer event to subscribers
    pub fn feed(&self, event: RecognizerEvent) {
        let _ = self.events.send(event);
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }
}

impl SttRecognizer for ManualRecognizer {
    fn subscribe(&self) -> broadcast::Receiver<RecognizerEvent> {
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        self.events.subscribe()
    }

    fn start_listening(&self) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn stop(&self) {}
}

/// A say-it alarm with the given id and scripts
pub fn say_it_alarm(id: i64, scripts: &[&str]) -> Alarm {
    let mut alarm = Alarm::new(7, 30).expect("valid time");
    alarm.id = AlarmId(id);
    alarm.label = "test alarm".to_string();
    alarm.dismiss_type = DismissType::SayIt;
    alarm.say_it_scripts = scripts.iter().map(|s| s.to_string()).collect();
    alarm
}
