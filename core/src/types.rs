//! Shared primitive types used across the persistence layer.

use crate::error::{SaveError, SaveResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a loadable scene, e.g. `"Village"` or `"MainMenu"`.
pub type SceneName = String;

/// Identifier of a material or furniture item.
pub type ItemId = String;

/// Squared distance below which two un-anchored pickups count as the same one.
pub const POSITION_TOLERANCE_SQ: f32 = 0.01;

/// Strict comparison: a squared distance of exactly the tolerance is not a match.
pub fn within_tolerance(sq_distance: f32) -> bool {
    sq_distance < POSITION_TOLERANCE_SQ
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn sqr_distance(self, other: Vec3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    pub fn offset(self, dx: f32, dy: f32, dz: f32) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Quat = Quat { x: 0.0, y: 0.0, z: 0.0, w: 1.0 };
}

/// Hue/saturation/value color, each channel in [0.0, 1.0].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Hsv {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

impl Hsv {
    pub fn new(h: f32, s: f32, v: f32) -> Self {
        Self { h, s, v }
    }
}

// ── Slot keys ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Story,
    Creative,
}

const CREATIVE_PREFIX: &str = "creative";

/// A validated, non-empty save slot key such as `Story0` or `Creative2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey(String);

impl SlotKey {
    /// Parse a raw key. Blank input yields `Ok(None)` (callers treat it as
    /// "no slot"); keys that could escape the save directory are rejected.
    pub fn parse(raw: &str) -> SaveResult<Option<Self>> {
        let key = raw.trim();
        if key.is_empty() {
            return Ok(None);
        }
        if key.contains(['/', '\\']) || key.contains("..") {
            return Err(SaveError::InvalidSlotKey {
                key:    key.to_string(),
                reason: "path separators are not allowed",
            });
        }
        Ok(Some(Self(key.to_string())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Anything that does not start with `Creative` (any case) is a story slot.
    pub fn kind(&self) -> SlotKind {
        let is_creative = self
            .0
            .get(..CREATIVE_PREFIX.len())
            .is_some_and(|p| p.eq_ignore_ascii_case(CREATIVE_PREFIX));
        if is_creative {
            SlotKind::Creative
        } else {
            SlotKind::Story
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerance_is_strict() {
        assert!(!within_tolerance(0.01));
        assert!(within_tolerance(0.0099));
    }

    #[test]
    fn slot_kind_follows_prefix() {
        let story = SlotKey::parse("Story0").unwrap().unwrap();
        let creative = SlotKey::parse("creative3").unwrap().unwrap();
        assert_eq!(story.kind(), SlotKind::Story);
        assert_eq!(creative.kind(), SlotKind::Creative);
    }

    #[test]
    fn blank_key_is_no_slot() {
        assert!(SlotKey::parse("   ").unwrap().is_none());
    }

    #[test]
    fn traversal_key_is_rejected() {
        assert!(SlotKey::parse("../Story0").is_err());
    }
}
