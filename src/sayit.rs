//! Say-it dismissal flow
//!
//! Orchestrates "recite to dismiss" for one ringing alarm: load the alarm's
//! scripts, consume the recognizer's event stream, judge each utterance
//! against the current script, and advance until every script is satisfied.
//!
//! All state transitions go through the pure [`reduce`] function; the flow
//! is the single writer, so the machine needs no locking.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use crate::controller::{AlarmController, ControllerState};
use crate::matching;
use crate::recognizer::{RecognizerEvent, SttRecognizer};
use crate::store::AlarmRepository;

/// Why a dismissal flow ended without completing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SayItError {
    /// The stored alarm could not be read
    AlarmLoadFailed,
    /// No service connection to resolve which alarm is ringing
    ServiceDisconnected,
    /// The speech engine itself failed
    SpeechRecognizer,
}

impl fmt::Display for SayItError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            SayItError::AlarmLoadFailed => "couldn't read the alarm's scripts",
            SayItError::ServiceDisconnected => "couldn't find the ringing alarm",
            SayItError::SpeechRecognizer => "speech recognition failed",
        };
        f.write_str(message)
    }
}

/// Outcome of the current utterance attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptStatus {
    /// Listening or waiting for the final transcript
    InProgress,
    /// Script satisfied, waiting to advance to the next one
    Success,
    /// Utterance didn't match; the user may retry
    Failed,
}

/// The script being recited and what has been heard so far
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SayItAttempt {
    pub script: String,
    pub transcript: String,
}

impl SayItAttempt {
    fn fresh(script: String) -> Self {
        Self {
            script,
            transcript: String::new(),
        }
    }
}

/// Position in the script list, 1-indexed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptCount {
    pub current: usize,
    pub total: usize,
}

/// State of one dismissal flow
#[derive(Debug, Clone, PartialEq)]
pub enum SayItState {
    /// Flow not yet started
    Idle,
    /// Alarm and scripts loaded, not yet listening
    Ready,
    /// Reciting script `count.current` of `count.total`
    InProgress {
        status: AttemptStatus,
        attempt: SayItAttempt,
        count: ScriptCount,
    },
    /// Every script satisfied (or there were none)
    Completed,
    Error(SayItError),
}

impl SayItState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SayItState::Completed | SayItState::Error(_))
    }
}

/// Advance the dismissal state machine by one recognizer event.
///
/// `scripts` is the alarm's full ordered script list. Terminal states
/// absorb every event; anything delivered late leaves them unchanged.
pub fn reduce(state: SayItState, event: &RecognizerEvent, scripts: &[String]) -> SayItState {
    if state.is_terminal() {
        return state;
    }

    match event {
        RecognizerEvent::Idle => state,

        RecognizerEvent::Ready => match state {
            // Previous script satisfied: move on to the next one
            SayItState::InProgress {
                status: AttemptStatus::Success,
                count,
                ..
            } => match scripts.get(count.current) {
                Some(script) => SayItState::InProgress {
                    status: AttemptStatus::InProgress,
                    attempt: SayItAttempt::fresh(script.clone()),
                    count: ScriptCount {
                        current: count.current + 1,
                        total: count.total,
                    },
                },
                None => SayItState::Completed,
            },
            // Retry (or re-listen): same script and count, fresh transcript
            SayItState::InProgress { attempt, count, .. } => SayItState::InProgress {
                status: AttemptStatus::InProgress,
                attempt: SayItAttempt::fresh(attempt.script),
                count,
            },
            // First utterance of the flow
            _ => match scripts.first() {
                Some(script) => SayItState::InProgress {
                    status: AttemptStatus::InProgress,
                    attempt: SayItAttempt::fresh(script.clone()),
                    count: ScriptCount {
                        current: 1,
                        total: scripts.len(),
                    },
                },
                None => SayItState::Completed,
            },
        },

        RecognizerEvent::Processing { partial } => match state {
            // Live feedback: only the transcript changes
            SayItState::InProgress {
                status,
                attempt,
                count,
            } => SayItState::InProgress {
                status,
                attempt: SayItAttempt {
                    script: attempt.script,
                    transcript: partial.clone(),
                },
                count,
            },
            other => other,
        },

        RecognizerEvent::Done { text } => match state {
            SayItState::InProgress { attempt, count, .. } => {
                let matched = matching::matches_script(&attempt.script, text);
                let attempt = SayItAttempt {
                    script: attempt.script,
                    transcript: text.clone(),
                };
                if matched {
                    if count.current < count.total {
                        SayItState::InProgress {
                            status: AttemptStatus::Success,
                            attempt,
                            count,
                        }
                    } else {
                        SayItState::Completed
                    }
                } else {
                    SayItState::InProgress {
                        status: AttemptStatus::Failed,
                        attempt,
                        count,
                    }
                }
            }
            other => other,
        },

        RecognizerEvent::Error { message } => {
            warn!("recognizer failed: {message}");
            SayItState::Error(SayItError::SpeechRecognizer)
        }
    }
}

/// One "recite to dismiss" flow for a ringing alarm.
///
/// Owns the collaborator handles exclusively for the duration of the flow
/// and publishes its state on a latest-value stream.
pub struct SayItFlow {
    repository: Arc<dyn AlarmRepository>,
    controller: Arc<dyn AlarmController>,
    recognizer: Arc<dyn SttRecognizer>,
    state_tx: watch::Sender<SayItState>,
}

impl SayItFlow {
    pub fn new(
        repository: Arc<dyn AlarmRepository>,
        controller: Arc<dyn AlarmController>,
        recognizer: Arc<dyn SttRecognizer>,
    ) -> Self {
        let (state_tx, _) = watch::channel(SayItState::Idle);
        Self {
            repository,
            controller,
            recognizer,
            state_tx,
        }
    }

    /// Observable dismissal state
    pub fn state(&self) -> watch::Receiver<SayItState> {
        self.state_tx.subscribe()
    }

    /// Run the flow to a terminal state.
    ///
    /// Resolves the ringing alarm from the controller, loads its scripts,
    /// then consumes recognizer events until `Completed` or `Error`. An
    /// alarm with no scripts completes immediately without touching the
    /// recognizer.
    pub async fn run(&self) {
        let alarm_id = {
            let state = self.controller.state();
            let current = *state.borrow();
            match current {
                ControllerState::Connected { alarm_id } => alarm_id,
                ControllerState::Disconnected => {
                    warn!("no service connection; cannot resolve the ringing alarm");
                    self.set_state(SayItState::Error(SayItError::ServiceDisconnected));
                    return;
                }
            }
        };

        let alarm = match self.repository.alarm(alarm_id).await {
            Ok(alarm) => alarm,
            Err(e) => {
                error!("loading alarm {alarm_id} failed: {e}");
                self.set_state(SayItState::Error(SayItError::AlarmLoadFailed));
                return;
            }
        };

        let scripts = alarm.say_it_scripts;
        if scripts.is_empty() {
            info!("alarm {alarm_id} has no scripts, nothing to recite");
            self.set_state(SayItState::Completed);
            return;
        }

        let mut events = self.recognizer.subscribe();
        info!(
            "say-it flow ready: {} script(s) for alarm {alarm_id}",
            scripts.len()
        );
        self.set_state(SayItState::Ready);

        loop {
            match events.recv().await {
                Ok(event) => {
                    let current = self.state_tx.borrow().clone();
                    let next = reduce(current, &event, &scripts);
                    let done = next.is_terminal();
                    self.set_state(next);
                    if done {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!("recognizer stream lagged, {missed} event(s) dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("recognizer stream closed");
                    break;
                }
            }
        }
    }

    /// Ask the recognizer to capture the next utterance
    pub fn start_listening(&self) {
        self.recognizer.start_listening();
    }

    /// Stop listening without tearing the service down
    pub fn stop_listening(&self) {
        self.recognizer.stop();
    }

    /// Stop listening and stop the ringing service
    pub fn shutdown(&self) {
        info!("say-it flow shutting down");
        self.recognizer.stop();
        self.controller.stop_service();
    }

    fn set_state(&self, next: SayItState) {
        debug!("say-it state: {next:?}");
        self.state_tx.send_replace(next);
    }
}
