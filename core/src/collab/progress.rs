//! In-memory player, money, milestone and environment collaborators.

use crate::{
    event::{ChangeNotifier, ChangeSource},
    provider::{MilestoneProvider, SnapshotProvider},
    snapshot::{EnvironmentTotals, PlayerPose},
};

#[derive(Debug, Default)]
pub struct MemoryPlayer {
    pub pose: PlayerPose,
}

impl SnapshotProvider for MemoryPlayer {
    type Fragment = PlayerPose;

    fn name(&self) -> &'static str {
        "player"
    }

    fn capture(&self) -> PlayerPose {
        self.pose
    }

    fn restore(&mut self, fragment: PlayerPose) {
        self.pose = fragment;
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

#[derive(Debug, Default)]
pub struct MemoryMoney {
    amount:   i64,
    notifier: Option<ChangeNotifier>,
}

impl MemoryMoney {
    pub fn new(notifier: Option<ChangeNotifier>) -> Self {
        Self { amount: 0, notifier }
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// Spend `cost` if affordable.
    pub fn try_spend(&mut self, cost: i64) -> bool {
        if cost < 0 || cost > self.amount {
            return false;
        }
        self.amount -= cost;
        if let Some(n) = &self.notifier {
            n.notify(ChangeSource::Money);
        }
        true
    }
}

impl SnapshotProvider for MemoryMoney {
    type Fragment = i64;

    fn name(&self) -> &'static str {
        "money"
    }

    fn capture(&self) -> i64 {
        self.amount
    }

    fn restore(&mut self, fragment: i64) {
        self.amount = fragment;
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// Milestones are an ordered list of labels; the index points at the
/// current one.
#[derive(Debug)]
pub struct MemoryMilestones {
    labels:           Vec<String>,
    index:            u32,
    /// How many progress re-evaluations were requested.
    pub progress_updates: u32,
}

impl MemoryMilestones {
    pub fn new(labels: &[&str]) -> Self {
        Self {
            labels: labels.iter().map(|l| l.to_string()).collect(),
            index: 0,
            progress_updates: 0,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }
}

impl SnapshotProvider for MemoryMilestones {
    type Fragment = u32;

    fn name(&self) -> &'static str {
        "milestone"
    }

    fn capture(&self) -> u32 {
        self.index
    }

    fn restore(&mut self, fragment: u32) {
        self.index = fragment;
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

impl MilestoneProvider for MemoryMilestones {
    fn current_label(&self) -> String {
        self.labels
            .get(self.index as usize)
            .cloned()
            .unwrap_or_default()
    }

    fn request_progress_update(&mut self) {
        self.progress_updates += 1;
    }
}

#[derive(Debug, Default)]
pub struct MemoryEnvironment {
    totals:   EnvironmentTotals,
    notifier: Option<ChangeNotifier>,
}

impl MemoryEnvironment {
    pub fn new(notifier: Option<ChangeNotifier>) -> Self {
        Self { totals: EnvironmentTotals::default(), notifier }
    }

    pub fn add(&mut self, cozy: i32, nature: i32) {
        self.totals.cozy += cozy;
        self.totals.nature += nature;
        if let Some(n) = &self.notifier {
            n.notify(ChangeSource::Environment);
        }
    }
}

impl SnapshotProvider for MemoryEnvironment {
    type Fragment = EnvironmentTotals;

    fn name(&self) -> &'static str {
        "environment"
    }

    fn capture(&self) -> EnvironmentTotals {
        self.totals
    }

    fn restore(&mut self, fragment: EnvironmentTotals) {
        self.totals = fragment;
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
