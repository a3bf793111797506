//! VoxAlarm - Voice-Dismissal Alarm Clock
//!
//! Demo binary: seeds an alarm, registers wake-ups, then simulates a fire
//! and drives the say-it dismissal flow with a scripted recognizer.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDateTime;
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use voxalarm::alarm::{Alarm, AlarmId, WeeklyRepeat};
use voxalarm::config::Config;
use voxalarm::controller::InProcessController;
use voxalarm::error::AlarmResult;
use voxalarm::recognizer::{ScriptedRecognizer, ScriptedUtterance};
use voxalarm::sayit::{AttemptStatus, SayItFlow, SayItState};
use voxalarm::schedule::{AlarmScheduler, SystemClock};
use voxalarm::store::AlarmStore;
use voxalarm::worker::SchedulerWorker;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Alarm database path (overrides config)
    #[arg(long)]
    db: Option<PathBuf>,
}

/// Demo scheduler: logs registrations instead of talking to an OS service
struct LogScheduler;

impl AlarmScheduler for LogScheduler {
    fn schedule(&self, id: AlarmId, fire_at: NaiveDateTime) -> AlarmResult<()> {
        info!("⏰ alarm {id} registered for {fire_at}");
        Ok(())
    }

    fn cancel(&self, id: AlarmId) -> AlarmResult<()> {
        info!("alarm {id} registration cancelled");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load()?;

    // Setup logging
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::from_str(&config.log_level).unwrap_or(Level::INFO)
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("VoxAlarm v{} starting...", env!("CARGO_PKG_VERSION"));

    let db_path = args.db.unwrap_or_else(|| PathBuf::from(&config.db_path));
    let store = Arc::new(AlarmStore::open(db_path)?);

    if store.all()?.is_empty() {
        seed_demo_alarm(&store, &config)?;
    }

    // Register wake-ups for everything enabled
    let worker = SchedulerWorker::new(
        store.clone(),
        Arc::new(LogScheduler),
        Arc::new(SystemClock),
        config.snooze_minutes,
    );
    worker.register_all()?;

    let Some(alarm) = store.all()?.into_iter().find(|a| a.enabled) else {
        warn!("no enabled alarm to demonstrate with");
        return Ok(());
    };

    info!(
        "simulating fire of alarm {} '{}' ({} script(s))",
        alarm.id,
        alarm.label,
        alarm.say_it_scripts.len()
    );
    run_dismissal_demo(store, &alarm).await;

    Ok(())
}

fn seed_demo_alarm(store: &AlarmStore, config: &Config) -> Result<()> {
    let mut alarm = Alarm::new(7, 0)?;
    alarm.weekly_repeat = WeeklyRepeat::everyday();
    alarm.label = "morning demo".to_string();
    alarm.ringtone = config.default_ringtone.clone();
    alarm.say_it_scripts = vec![
        "I am awake now".to_string(),
        "Today will be a good day".to_string(),
    ];
    let id = store.insert(&alarm)?;
    info!("seeded demo alarm {id}");
    Ok(())
}

/// Simulate the ringing service and recite the scripts, botching the first
/// attempt to show the retry path.
async fn run_dismissal_demo(store: Arc<AlarmStore>, alarm: &Alarm) {
    let controller = Arc::new(InProcessController::new());
    controller.connect(alarm.id);

    // One bad utterance first, then each script verbatim
    let mut utterances = vec![ScriptedUtterance::Heard(
        "mumbling something else entirely".to_string(),
    )];
    utterances.extend(
        alarm
            .say_it_scripts
            .iter()
            .map(|s| ScriptedUtterance::Heard(s.to_lowercase())),
    );
    let recognizer = Arc::new(ScriptedRecognizer::new(
        utterances,
        Duration::from_millis(150),
    ));

    let flow = Arc::new(SayItFlow::new(store, controller, recognizer));
    let mut state_rx = flow.state();

    let runner = tokio::spawn({
        let flow = flow.clone();
        async move { flow.run().await }
    });

    loop {
        let current = state_rx.borrow_and_update().clone();
        match current {
            SayItState::Ready => {
                info!("🗣️ say-it ready, listening for the first script");
                flow.start_listening();
            }
            SayItState::InProgress {
                status: AttemptStatus::Success,
                count,
                ..
            } => {
                info!("script {}/{} done, next one", count.current, count.total);
                flow.start_listening();
            }
            SayItState::InProgress {
                status: AttemptStatus::Failed,
                attempt,
                ..
            } => {
                info!("heard '{}', try again", attempt.transcript);
                flow.start_listening();
            }
            SayItState::InProgress { attempt, .. } => {
                if !attempt.transcript.is_empty() {
                    info!("hearing: '{}'", attempt.transcript);
                }
            }
            SayItState::Completed => {
                info!("✅ all scripts recited, alarm dismissed");
                break;
            }
            SayItState::Error(e) => {
                warn!("dismissal failed: {e}");
                break;
            }
            SayItState::Idle => {}
        }

        if state_rx.changed().await.is_err() {
            break;
        }
    }

    flow.shutdown();
    let _ = runner.await;
}
