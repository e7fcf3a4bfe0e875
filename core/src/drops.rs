//! Day-rollover drop roller.
//!
//! When the player sleeps into a new day, every placed furniture item rolls
//! its drop table. Hits become pickups scattered around the item: spawned
//! immediately in the active scene, registered only for other scenes so
//! they appear when that scene next loads.
//!
//! The roll needs the complete placed-object list, so it waits for the
//! placed-object store to finish loading. The wait is bounded: after
//! `wait_timeout_secs` the roll proceeds anyway with a warning.
//!
//! Execution: queued by on_sleep_advanced_day(), performed by tick().
//! Days at or before the last processed day are ignored.

use crate::{
    config::RolloverConfig,
    error::SaveResult,
    pickup::WorldPickupRegistry,
    provider::{ItemCatalog, PlacedObjectProvider},
    rng::DropRng,
    snapshot::PlacedObjectRecord,
    types::Vec3,
};

const NO_MATERIAL: &str = "None";

#[derive(Debug, Clone, Copy)]
struct PendingRoll {
    day:         u32,
    waited_secs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RolloverSummary {
    pub day:        u32,
    /// Spawned in the active scene (and registered).
    pub spawned:    usize,
    /// Registered for scenes that are not loaded.
    pub registered: usize,
    /// The placed-object store never became ready within the timeout.
    pub timed_out:  bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloverStatus {
    Idle,
    Waiting { day: u32 },
    Rolled(RolloverSummary),
}

pub struct RolloverDrops {
    config:             RolloverConfig,
    last_processed_day: Option<u32>,
    pending:            Option<PendingRoll>,
}

impl RolloverDrops {
    pub fn new(config: RolloverConfig) -> Self {
        Self { config, last_processed_day: None, pending: None }
    }

    /// Whether `day` is later than the last processed day.
    pub fn is_new_day(&self, day: u32) -> bool {
        self.last_processed_day.map_or(true, |last| day > last)
    }

    /// Queue a roll for `day`. Returns false if the day was already handled.
    pub fn on_sleep_advanced_day(&mut self, day: u32) -> bool {
        if !self.is_new_day(day) {
            log::debug!("[drops] day {day} already processed, ignoring");
            return false;
        }
        self.last_processed_day = Some(day);
        self.pending = Some(PendingRoll { day, waited_secs: 0.0 });
        log::info!("[drops] sleep advanced to day {day}; drop roll queued");
        true
    }

    pub fn is_waiting(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the queued roll (owner torn down).
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn tick(
        &mut self,
        dt_secs:      f64,
        placed:       &dyn PlacedObjectProvider,
        catalog:      &dyn ItemCatalog,
        registry:     &mut WorldPickupRegistry,
        active_scene: &str,
    ) -> SaveResult<RolloverStatus> {
        let Some(mut pending) = self.pending else {
            return Ok(RolloverStatus::Idle);
        };

        let timed_out = !placed.is_ready();
        if timed_out {
            pending.waited_secs += dt_secs.max(0.0);
            if pending.waited_secs < self.config.wait_timeout_secs {
                self.pending = Some(pending);
                return Ok(RolloverStatus::Waiting { day: pending.day });
            }
            log::warn!(
                "[drops] placed objects still loading after {:.1}s; rolling day {} anyway",
                pending.waited_secs,
                pending.day
            );
        }
        self.pending = None;

        let mut summary = self.roll(pending.day, &placed.capture(), catalog, registry, active_scene)?;
        summary.timed_out = timed_out;
        log::info!(
            "[drops] day {}: {} spawned, {} registered for other scenes",
            summary.day,
            summary.spawned,
            summary.registered
        );
        Ok(RolloverStatus::Rolled(summary))
    }

    fn roll(
        &self,
        day:          u32,
        placed:       &[PlacedObjectRecord],
        catalog:      &dyn ItemCatalog,
        registry:     &mut WorldPickupRegistry,
        active_scene: &str,
    ) -> SaveResult<RolloverSummary> {
        let mut rng = DropRng::for_day(self.config.seed, day);
        let mut summary = RolloverSummary { day, ..RolloverSummary::default() };

        for record in placed {
            for chance in catalog.drop_table(&record.furniture_id) {
                let id = chance.material_id.trim();
                if id.is_empty() || id == NO_MATERIAL || chance.rate <= 0.0 {
                    continue;
                }
                let roll = rng.value();
                log::debug!("[drops] {} rolled {roll:.3} against {:.3} for {id}", record.furniture_id, chance.rate);
                if roll > chance.rate {
                    continue;
                }
                let position = self.spawn_position(record.position, &mut rng);
                if record.scene_name == active_scene {
                    if registry.spawn_now(active_scene, id, position)? {
                        summary.spawned += 1;
                    }
                } else if registry.register(&record.scene_name, id, position, None)? {
                    summary.registered += 1;
                }
            }
        }
        Ok(summary)
    }

    /// Random point in a circle of `spawn_radius` around `base`, raised by
    /// `spawn_y_offset`.
    fn spawn_position(&self, base: Vec3, rng: &mut DropRng) -> Vec3 {
        let (cx, cz) = rng.inside_unit_circle();
        Vec3::new(
            base.x + cx * self.config.spawn_radius,
            base.y + self.config.spawn_y_offset,
            base.z + cz * self.config.spawn_radius,
        )
    }
}
