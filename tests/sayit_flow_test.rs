//! End-to-end tests of the say-it dismissal flow against fake collaborators

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::timeout;

use voxalarm::alarm::AlarmId;
use voxalarm::controller::{AlarmController, InProcessController};
use voxalarm::recognizer::RecognizerEvent;
use voxalarm::sayit::{AttemptStatus, SayItError, SayItFlow, SayItState};

mod common;
use common::{say_it_alarm, ManualRecognizer, MemoryRepository};

fn ready() -> RecognizerEvent {
    RecognizerEvent::Ready
}

fn done(text: &str) -> RecognizerEvent {
    RecognizerEvent::Done {
        text: text.to_string(),
    }
}

/// Wait until the flow state satisfies `pred`, with a safety timeout
async fn wait_for(
    rx: &mut watch::Receiver<SayItState>,
    pred: impl FnMut(&SayItState) -> bool,
) -> SayItState {
    timeout(Duration::from_secs(5), rx.wait_for(pred))
        .await
        .expect("timed out waiting for state")
        .expect("state stream closed")
        .clone()
}

struct Harness {
    flow: Arc<SayItFlow>,
    recognizer: Arc<ManualRecognizer>,
    repository: Arc<MemoryRepository>,
    controller: Arc<InProcessController>,
}

fn harness(alarms: Vec<voxalarm::alarm::Alarm>, ringing: Option<AlarmId>) -> Harness {
    let repository = Arc::new(MemoryRepository::new(alarms));
    let controller = Arc::new(InProcessController::new());
    if let Some(id) = ringing {
        controller.connect(id);
    }
    let recognizer = Arc::new(ManualRecognizer::new());
    let flow = Arc::new(SayItFlow::new(
        repository.clone(),
        controller.clone(),
        recognizer.clone(),
    ));
    Harness {
        flow,
        recognizer,
        repository,
        controller,
    }
}

#[tokio::test]
async fn test_three_exact_recitations_complete_the_flow() {
    let scripts = ["alpha bravo charlie", "delta echo foxtrot", "golf hotel india"];
    let h = harness(vec![say_it_alarm(1, &scripts)], Some(AlarmId(1)));
    let mut state = h.flow.state();

    let runner = tokio::spawn({
        let flow = h.flow.clone();
        async move { flow.run().await }
    });
    wait_for(&mut state, |s| *s == SayItState::Ready).await;

    for script in scripts {
        h.recognizer.feed(ready());
        h.recognizer.feed(done(script));
    }

    timeout(Duration::from_secs(5), runner)
        .await
        .expect("flow did not finish")
        .expect("flow task panicked");
    assert_eq!(*state.borrow(), SayItState::Completed);
}

#[tokio::test]
async fn test_mismatched_utterance_fails_in_place_then_retry_succeeds() {
    let h = harness(
        vec![say_it_alarm(1, &["open the pod bay doors"])],
        Some(AlarmId(1)),
    );
    let mut state = h.flow.state();

    let runner = tokio::spawn({
        let flow = h.flow.clone();
        async move { flow.run().await }
    });
    wait_for(&mut state, |s| *s == SayItState::Ready).await;

    h.recognizer.feed(ready());
    h.recognizer.feed(done("singing daisy bell instead"));

    let failed = wait_for(&mut state, |s| {
        matches!(
            s,
            SayItState::InProgress {
                status: AttemptStatus::Failed,
                ..
            }
        )
    })
    .await;
    match failed {
        SayItState::InProgress { attempt, count, .. } => {
            assert_eq!(attempt.script, "open the pod bay doors");
            assert_eq!(attempt.transcript, "singing daisy bell instead");
            assert_eq!((count.current, count.total), (1, 1));
        }
        other => panic!("expected failed attempt, got {other:?}"),
    }

    // User tries again
    h.recognizer.feed(ready());
    h.recognizer.feed(done("open the pod bay doors"));

    timeout(Duration::from_secs(5), runner)
        .await
        .expect("flow did not finish")
        .expect("flow task panicked");
    assert_eq!(*state.borrow(), SayItState::Completed);
}

#[tokio::test]
async fn test_partial_transcripts_stream_into_the_attempt() {
    let h = harness(vec![say_it_alarm(1, &["good morning"])], Some(AlarmId(1)));
    let mut state = h.flow.state();

    tokio::spawn({
        let flow = h.flow.clone();
        async move { flow.run().await }
    });
    wait_for(&mut state, |s| *s == SayItState::Ready).await;

    h.recognizer.feed(ready());
    h.recognizer.feed(RecognizerEvent::Processing {
        partial: "good mor".to_string(),
    });

    let live = wait_for(&mut state, |s| {
        matches!(s, SayItState::InProgress { attempt, .. } if !attempt.transcript.is_empty())
    })
    .await;
    match live {
        SayItState::InProgress {
            status, attempt, ..
        } => {
            assert_eq!(status, AttemptStatus::InProgress);
            assert_eq!(attempt.transcript, "good mor");
        }
        other => panic!("expected live attempt, got {other:?}"),
    }

    h.recognizer.feed(done("good morning"));
    wait_for(&mut state, |s| *s == SayItState::Completed).await;
}

#[tokio::test]
async fn test_empty_script_list_completes_without_recognizer() {
    let h = harness(vec![say_it_alarm(1, &[])], Some(AlarmId(1)));

    h.flow.run().await;

    assert_eq!(*h.flow.state().borrow(), SayItState::Completed);
    assert_eq!(h.recognizer.subscription_count(), 0);
    assert_eq!(h.recognizer.start_count(), 0);
}

#[tokio::test]
async fn test_disconnected_service_errors_without_repository_call() {
    let h = harness(vec![say_it_alarm(1, &["a script"])], None);

    h.flow.run().await;

    assert_eq!(
        *h.flow.state().borrow(),
        SayItState::Error(SayItError::ServiceDisconnected)
    );
    assert_eq!(h.repository.load_count(), 0);
    assert_eq!(h.recognizer.subscription_count(), 0);
}

#[tokio::test]
async fn test_missing_alarm_reports_load_failure() {
    let h = harness(vec![], Some(AlarmId(99)));

    h.flow.run().await;

    assert_eq!(
        *h.flow.state().borrow(),
        SayItState::Error(SayItError::AlarmLoadFailed)
    );
    assert_eq!(h.repository.load_count(), 1);
}

#[tokio::test]
async fn test_recognizer_failure_is_terminal() {
    let h = harness(vec![say_it_alarm(1, &["a script"])], Some(AlarmId(1)));
    let mut state = h.flow.state();

    let runner = tokio::spawn({
        let flow = h.flow.clone();
        async move { flow.run().await }
    });
    wait_for(&mut state, |s| *s == SayItState::Ready).await;

    h.recognizer.feed(ready());
    h.recognizer.feed(RecognizerEvent::Error {
        message: "audio focus lost".to_string(),
    });

    timeout(Duration::from_secs(5), runner)
        .await
        .expect("flow did not finish")
        .expect("flow task panicked");
    assert_eq!(
        *state.borrow(),
        SayItState::Error(SayItError::SpeechRecognizer)
    );

    // Abandoning the flow stops the ringing service too
    h.flow.shutdown();
    assert_eq!(
        *h.controller.state().borrow(),
        voxalarm::controller::ControllerState::Disconnected
    );
}
