//! Scheduler worker
//!
//! Bridges the alarm store and the OS-level scheduler: computes the next
//! fire time for each enabled alarm and keeps registrations current as
//! alarms fire, snooze, or are deleted.

use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::alarm::{Alarm, AlarmId};
use crate::error::AlarmResult;
use crate::schedule::{self, AlarmScheduler, Clock};
use crate::store::AlarmStore;

pub struct SchedulerWorker {
    store: Arc<AlarmStore>,
    scheduler: Arc<dyn AlarmScheduler>,
    clock: Arc<dyn Clock>,
    snooze_minutes: u32,
}

impl SchedulerWorker {
    pub fn new(
        store: Arc<AlarmStore>,
        scheduler: Arc<dyn AlarmScheduler>,
        clock: Arc<dyn Clock>,
        snooze_minutes: u32,
    ) -> Self {
        Self {
            store,
            scheduler,
            clock,
            // A zero snooze would re-fire immediately
            snooze_minutes: snooze_minutes.max(1),
        }
    }

    /// Register wake-ups for every enabled alarm. Returns how many were
    /// scheduled.
    pub fn register_all(&self) -> AlarmResult<usize> {
        let mut scheduled = 0;
        for alarm in self.store.all()? {
            if !alarm.enabled {
                debug!("alarm {} disabled, skipping", alarm.id);
                continue;
            }
            self.register(&alarm)?;
            scheduled += 1;
        }
        info!("{scheduled} alarm(s) scheduled");
        Ok(scheduled)
    }

    /// Register the next wake-up for one alarm
    pub fn register(&self, alarm: &Alarm) -> AlarmResult<NaiveDateTime> {
        let fire_at = schedule::next_fire_time(
            alarm.time_of_day(),
            &alarm.weekly_repeat,
            self.clock.now(),
        );
        self.scheduler.schedule(alarm.id, fire_at)?;
        debug!("alarm {} scheduled for {fire_at}", alarm.id);
        Ok(fire_at)
    }

    /// After an alarm fires: repeating alarms get their next occurrence,
    /// one-time alarms are disabled.
    pub fn reschedule_after_fire(&self, alarm: &Alarm) -> AlarmResult<Option<NaiveDateTime>> {
        if alarm.weekly_repeat.is_repeating() {
            Ok(Some(self.register(alarm)?))
        } else {
            self.store.set_enabled(alarm.id, false)?;
            debug!("one-time alarm {} disabled after firing", alarm.id);
            Ok(None)
        }
    }

    /// Register a snoozed wake-up, seconds truncated at this boundary
    pub fn snooze(&self, id: AlarmId) -> AlarmResult<NaiveDateTime> {
        let fire_at = schedule::snooze_fire_time(self.snooze_minutes, self.clock.now());
        let fire_at = fire_at
            .date()
            .and_time(schedule::truncate_to_minute(fire_at.time()));
        self.scheduler.schedule(id, fire_at)?;
        info!("alarm {id} snoozed until {fire_at}");
        Ok(fire_at)
    }

    /// Delete an alarm and cancel its pending wake-up
    pub fn remove(&self, id: AlarmId) -> AlarmResult<()> {
        self.scheduler.cancel(id)?;
        self.store.delete(id)?;
        Ok(())
    }
}
