//! Persistence configuration.
//!
//! Every field has a default so a partial (or empty) JSON file is valid.
//! In tests, use SaveConfig::default_test().

use crate::types::SlotKey;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which build produced the save files. Each channel gets its own
/// directory so editor experiments never clobber release saves.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BuildChannel {
    Editor,
    Demo,
    #[default]
    Release,
}

impl BuildChannel {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Editor  => "editor",
            Self::Demo    => "demo",
            Self::Release => "release",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RolloverConfig {
    /// Longest time to wait for the placed-object store before rolling drops anyway.
    pub wait_timeout_secs: f64,
    /// Radius of the circle around a placed object that drops land in.
    pub spawn_radius: f32,
    /// Height added to the object's position for spawned drops.
    pub spawn_y_offset: f32,
    /// Master seed for drop rolls. Each day derives its own stream.
    pub seed: u64,
}

impl Default for RolloverConfig {
    fn default() -> Self {
        Self {
            wait_timeout_secs: 2.0,
            spawn_radius:      1.0,
            spawn_y_offset:    1.0,
            seed:              0x5EED_D209,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveConfig {
    pub persistent_root: PathBuf,
    pub build_channel: BuildChannel,
    pub file_extension: String,
    pub autosave_interval_secs: f64,
    pub main_menu_scene: String,
    /// Preference database. Relative paths resolve against `persistent_root`.
    pub prefs_path: PathBuf,
    pub pickup_blob_key: String,
    /// Template used to instantiate pickups. `None` disables respawning.
    pub pickup_template: Option<String>,
    pub rollover: RolloverConfig,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            persistent_root:        PathBuf::from("./saves"),
            build_channel:          BuildChannel::Release,
            file_extension:         "json".into(),
            autosave_interval_secs: 300.0,
            main_menu_scene:        "MainMenu".into(),
            prefs_path:             PathBuf::from("prefs.sqlite3"),
            pickup_blob_key:        "DropMaterialSave".into(),
            pickup_template:        Some("Materials/DropMaterial".into()),
            rollover:               RolloverConfig::default(),
        }
    }
}

impl SaveConfig {
    /// Load from a JSON config file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {}: {e}", path.display()))?;
        let config: SaveConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {}: {e}", path.display()))?;
        if config.autosave_interval_secs <= 0.0 {
            anyhow::bail!(
                "autosave_interval_secs must be positive, got {}",
                config.autosave_interval_secs
            );
        }
        Ok(config)
    }

    /// Config rooted at `root` with the editor channel, for unit tests.
    pub fn default_test(root: &Path) -> Self {
        Self {
            persistent_root: root.to_path_buf(),
            build_channel:   BuildChannel::Editor,
            ..Self::default()
        }
    }

    pub fn is_main_menu(&self, scene: &str) -> bool {
        scene == self.main_menu_scene
    }

    /// `{root}/{channel}`
    pub fn slot_dir(&self) -> PathBuf {
        self.persistent_root.join(self.build_channel.dir_name())
    }

    /// `{root}/{channel}/{key}.{ext}`
    pub fn slot_path(&self, key: &SlotKey) -> PathBuf {
        self.slot_dir()
            .join(format!("{}.{}", key.as_str(), self.file_extension))
    }

    pub fn prefs_file(&self) -> PathBuf {
        if self.prefs_path.is_absolute() {
            self.prefs_path.clone()
        } else {
            self.persistent_root.join(&self.prefs_path)
        }
    }
}
