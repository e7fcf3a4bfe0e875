//! Change notifications and scene signals.
//!
//! RULE: Collaborators never call the slot store directly when their state
//! changes. They push a ChangeSource onto the change channel; the store
//! drains the channel once per tick and saves if anything arrived.

use crate::types::SceneName;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, Receiver, Sender};

/// Which collaborator reported a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeSource {
    Inventory,
    PlacedObjects,
    Environment,
    Money,
    Milestone,
    Clock,
    Appearance,
}

/// Sending half, cloned into every collaborator that can request a save.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    tx: Sender<ChangeSource>,
}

impl ChangeNotifier {
    /// Never fails: once the store is gone there is nobody left to save,
    /// so a closed channel just drops the notification.
    pub fn notify(&self, source: ChangeSource) {
        let _ = self.tx.send(source);
    }
}

/// Receiving half, owned by the slot store.
#[derive(Debug)]
pub struct ChangeQueue {
    rx: Receiver<ChangeSource>,
}

impl ChangeQueue {
    /// Take everything queued since the last drain, in arrival order.
    pub fn drain(&self) -> Vec<ChangeSource> {
        self.rx.try_iter().collect()
    }
}

pub fn change_channel() -> (ChangeNotifier, ChangeQueue) {
    let (tx, rx) = mpsc::channel();
    (ChangeNotifier { tx }, ChangeQueue { rx })
}

/// Scene transitions raised by the host application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SceneEvent {
    /// A scene finished loading.
    Loaded { scene: SceneName },
    /// The active scene switched.
    ActiveChanged { from: SceneName, to: SceneName },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_queue() {
        let (notifier, queue) = change_channel();
        notifier.notify(ChangeSource::Inventory);
        notifier.clone().notify(ChangeSource::Money);
        assert_eq!(queue.drain(), vec![ChangeSource::Inventory, ChangeSource::Money]);
        assert!(queue.drain().is_empty());
    }
}
