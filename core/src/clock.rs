//! In-game clock: minutes into the current day plus a day counter.

use crate::{
    event::{ChangeNotifier, ChangeSource},
    provider::SnapshotProvider,
};
use serde::{Deserialize, Serialize};

pub const MINUTES_PER_DAY: f32 = 24.0 * 60.0;

/// Persisted clock fragment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockRecord {
    pub current_minutes: f32,
    pub current_day:     u32,
}

impl Default for ClockRecord {
    fn default() -> Self {
        Self {
            current_minutes: 6.0 * 60.0,
            current_day:     1,
        }
    }
}

#[derive(Debug, Default)]
pub struct GameClock {
    record:   ClockRecord,
    notifier: Option<ChangeNotifier>,
}

impl GameClock {
    pub fn new(notifier: Option<ChangeNotifier>) -> Self {
        Self {
            record: ClockRecord::default(),
            notifier,
        }
    }

    pub fn current_day(&self) -> u32 {
        self.record.current_day
    }

    pub fn current_minutes(&self) -> f32 {
        self.record.current_minutes
    }

    /// Advance by `minutes`, rolling over into following days. Returns the
    /// number of day boundaries crossed.
    pub fn advance_minutes(&mut self, minutes: f32) -> u32 {
        let mut total = self.record.current_minutes + minutes.max(0.0);
        let mut crossed = 0;
        while total >= MINUTES_PER_DAY {
            total -= MINUTES_PER_DAY;
            crossed += 1;
        }
        self.record.current_minutes = total;
        self.record.current_day += crossed;
        crossed
    }

    /// Sleep until `wake_minutes` on the next day. Returns the new day, which
    /// callers forward to the day-rollover drop roller.
    pub fn sleep_until(&mut self, wake_minutes: f32) -> u32 {
        self.record.current_day += 1;
        self.record.current_minutes = wake_minutes.clamp(0.0, MINUTES_PER_DAY - 1.0);
        if let Some(n) = &self.notifier {
            n.notify(ChangeSource::Clock);
        }
        self.record.current_day
    }
}

impl SnapshotProvider for GameClock {
    type Fragment = ClockRecord;

    fn name(&self) -> &'static str {
        "clock"
    }

    fn capture(&self) -> ClockRecord {
        self.record
    }

    fn restore(&mut self, fragment: ClockRecord) {
        self.record = fragment;
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_rolls_over_days() {
        let mut clock = GameClock::new(None);
        let crossed = clock.advance_minutes(MINUTES_PER_DAY);
        assert_eq!(crossed, 1);
        assert_eq!(clock.current_day(), 2);
        assert_eq!(clock.current_minutes(), 6.0 * 60.0);
    }

    #[test]
    fn sleep_moves_to_next_day() {
        let mut clock = GameClock::new(None);
        assert_eq!(clock.sleep_until(7.0 * 60.0), 2);
        assert_eq!(clock.current_minutes(), 420.0);
    }
}
