//! Fire-time computation
//!
//! Pure date arithmetic for when an alarm should next ring, plus the
//! boundary trait for whatever registers OS-level wake-ups.

use chrono::{Datelike, Duration, Local, NaiveDateTime, NaiveTime, Timelike};

use crate::alarm::{AlarmId, Weekday, WeeklyRepeat};
use crate::error::AlarmResult;

/// Injectable time source so fire-time math is testable
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Wall-clock time in the local timezone
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Registers and cancels OS-level wake-ups for computed fire times
pub trait AlarmScheduler: Send + Sync {
    fn schedule(&self, id: AlarmId, fire_at: NaiveDateTime) -> AlarmResult<()>;
    fn cancel(&self, id: AlarmId) -> AlarmResult<()>;
}

/// Next absolute fire time for an alarm time-of-day and repeat set.
///
/// Picks today when the time of day is still ahead and today is a repeat day
/// (or the alarm is one-time). Otherwise: one-time alarms fire tomorrow;
/// repeating alarms fire on the next repeat day strictly after today, or
/// wrap to the earliest repeat day next week. A repeat day equal to today
/// whose time has already passed therefore lands a full week out.
///
/// Seconds and sub-seconds of the result are zero.
pub fn next_fire_time(time: NaiveTime, repeat: &WeeklyRepeat, now: NaiveDateTime) -> NaiveDateTime {
    let time = truncate_to_minute(time);
    let today = Weekday::from_chrono(now.weekday());

    let fires_today = time > now.time() && (repeat.contains(today) || !repeat.is_repeating());

    let date = if fires_today {
        now.date()
    } else if !repeat.is_repeating() {
        now.date() + Duration::days(1)
    } else if let Some(day) = repeat.first_after(today) {
        let ahead = day.iso_number() - today.iso_number();
        now.date() + Duration::days(ahead as i64)
    } else {
        // All repeat days this week are behind us: wrap to next week's earliest
        let first = repeat.first().unwrap_or(today);
        let ahead = 7 - today.iso_number() + first.iso_number();
        now.date() + Duration::days(ahead as i64)
    };

    date.and_time(time)
}

/// Fire time for a snoozed alarm: `now` plus the snooze interval.
///
/// Pure addition; second truncation happens where the result is scheduled.
pub fn snooze_fire_time(snooze_minutes: u32, now: NaiveDateTime) -> NaiveDateTime {
    now + Duration::minutes(snooze_minutes as i64)
}

/// Zero the seconds and sub-second fields
pub fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    time.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn time(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn test_next_repeat_day_later_this_week() {
        // Thursday; repeat Mon/Wed/Fri; today is not a repeat day
        let now = at(2024, 7, 18, 3, 33);
        let repeat =
            WeeklyRepeat::new([Weekday::Monday, Weekday::Wednesday, Weekday::Friday]);
        let fire = next_fire_time(time(13, 33), &repeat, now);
        assert_eq!(fire, at(2024, 7, 19, 13, 33));
    }

    #[test]
    fn test_same_day_repeat_already_passed_goes_to_next_week() {
        // Thursday 09:00, alarm 07:00, repeat {Thursday}
        let now = at(2024, 7, 18, 9, 0);
        let repeat = WeeklyRepeat::new([Weekday::Thursday]);
        let fire = next_fire_time(time(7, 0), &repeat, now);
        assert_eq!(fire, at(2024, 7, 25, 7, 0));
    }

    #[test]
    fn test_same_day_repeat_still_ahead_fires_today() {
        let now = at(2024, 7, 18, 6, 0);
        let repeat = WeeklyRepeat::new([Weekday::Thursday]);
        let fire = next_fire_time(time(7, 0), &repeat, now);
        assert_eq!(fire, at(2024, 7, 18, 7, 0));
    }

    #[test]
    fn test_one_time_alarm_passed_fires_tomorrow() {
        let now = at(2024, 7, 18, 9, 0);
        let fire = next_fire_time(time(7, 0), &WeeklyRepeat::none(), now);
        assert_eq!(fire, at(2024, 7, 19, 7, 0));
    }

    #[test]
    fn test_one_time_alarm_still_ahead_fires_today() {
        let now = at(2024, 7, 18, 9, 0);
        let fire = next_fire_time(time(21, 15), &WeeklyRepeat::none(), now);
        assert_eq!(fire, at(2024, 7, 18, 21, 15));
    }

    #[test]
    fn test_exact_minute_counts_as_passed() {
        // Alarm time equal to now is not "strictly after"
        let now = at(2024, 7, 18, 7, 0);
        let fire = next_fire_time(time(7, 0), &WeeklyRepeat::none(), now);
        assert_eq!(fire, at(2024, 7, 19, 7, 0));
    }

    #[test]
    fn test_wrap_skips_earlier_days_this_week() {
        // Saturday; repeat Mon/Tue; both behind us, wrap to Monday next week
        let now = at(2024, 7, 20, 12, 0);
        let repeat = WeeklyRepeat::new([Weekday::Monday, Weekday::Tuesday]);
        let fire = next_fire_time(time(8, 30), &repeat, now);
        assert_eq!(fire, at(2024, 7, 22, 8, 30));
    }

    #[test]
    fn test_everyday_alarm_rolls_to_tomorrow_when_passed() {
        let now = at(2024, 7, 18, 9, 0);
        let fire = next_fire_time(time(7, 0), &WeeklyRepeat::everyday(), now);
        assert_eq!(fire, at(2024, 7, 19, 7, 0));
    }

    #[test]
    fn test_result_has_zero_seconds() {
        let now = at(2024, 7, 18, 6, 0);
        let odd = NaiveTime::from_hms_milli_opt(7, 0, 31, 250).unwrap();
        let fire = next_fire_time(odd, &WeeklyRepeat::none(), now);
        assert_eq!(fire, at(2024, 7, 18, 7, 0));
    }

    #[test]
    fn test_snooze_is_plain_addition() {
        let now = at(2024, 7, 18, 6, 57);
        assert_eq!(snooze_fire_time(10, now), at(2024, 7, 18, 7, 7));
        assert_eq!(snooze_fire_time(5, at(2024, 7, 18, 23, 58)), at(2024, 7, 19, 0, 3));
    }
}
