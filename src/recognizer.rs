//! Speech recognizer boundary
//!
//! The speech engine itself is platform plumbing; the core only consumes
//! its event stream. `ScriptedRecognizer` is an in-process engine that
//! replays queued utterances, used by the demo binary and tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::debug;

/// Lifecycle events reported by a speech engine.
///
/// For one utterance the engine reports `Ready`, then zero or more
/// `Processing` partials, then a single `Done` (or `Error`). Events arrive
/// in chronological order.
#[derive(Debug, Clone, PartialEq)]
pub enum RecognizerEvent {
    /// Engine not started
    Idle,
    /// Engine ready to capture an utterance
    Ready,
    /// Live partial transcript while the user speaks
    Processing { partial: String },
    /// Final transcript for the utterance
    Done { text: String },
    /// Engine failure
    Error { message: String },
}

/// A speech-to-text engine viewed from the dismissal flow
pub trait SttRecognizer: Send + Sync {
    /// Subscribe to the engine's event stream
    fn subscribe(&self) -> broadcast::Receiver<RecognizerEvent>;

    /// Begin capturing one utterance
    fn start_listening(&self);

    /// Stop capturing and release the microphone
    fn stop(&self);
}

/// One queued utterance for the scripted engine
#[derive(Debug, Clone)]
pub enum ScriptedUtterance {
    /// Recognized speech: emits Ready, a partial, then Done
    Heard(String),
    /// Engine failure: emits Ready then Error
    Failure(String),
}

/// Replays a queue of utterances, one per `start_listening` call.
pub struct ScriptedRecognizer {
    events: broadcast::Sender<RecognizerEvent>,
    queue: Mutex<VecDeque<ScriptedUtterance>>,
    /// Delay between emitted events, zero for tests
    pace: Duration,
}

impl ScriptedRecognizer {
    pub fn new(utterances: impl IntoIterator<Item = ScriptedUtterance>, pace: Duration) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            events,
            queue: Mutex::new(utterances.into_iter().collect()),
            pace,
        }
    }

    fn emit(&self, event: RecognizerEvent) {
        // No subscribers is fine; the engine doesn't care who listens
        let _ = self.events.send(event);
    }
}

impl SttRecognizer for ScriptedRecognizer {
    fn subscribe(&self) -> broadcast::Receiver<RecognizerEvent> {
        self.events.subscribe()
    }

    fn start_listening(&self) {
        let next = match self.queue.lock() {
            Ok(mut queue) => queue.pop_front(),
            Err(_) => None,
        };

        let Some(utterance) = next else {
            debug!("scripted recognizer exhausted, ignoring start_listening");
            return;
        };

        let events = self.events.clone();
        let pace = self.pace;
        tokio::spawn(async move {
            let _ = events.send(RecognizerEvent::Ready);
            tokio::time::sleep(pace).await;

            match utterance {
                ScriptedUtterance::Heard(text) => {
                    let half = text.len() / 2;
                    let partial = text
                        .char_indices()
                        .take_while(|(i, _)| *i < half)
                        .map(|(_, c)| c)
                        .collect::<String>();
                    let _ = events.send(RecognizerEvent::Processing { partial });
                    tokio::time::sleep(pace).await;
                    let _ = events.send(RecognizerEvent::Done { text });
                }
                ScriptedUtterance::Failure(message) => {
                    let _ = events.send(RecognizerEvent::Error { message });
                }
            }
        });
    }

    fn stop(&self) {
        debug!("scripted recognizer stopped");
        self.emit(RecognizerEvent::Idle);
    }
}
