use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::telemetry::logging;
use crate::world::policy::{EmptyAction, TriggerPolicy};

pub const PLUGIN_VERSION: PluginVersion = PluginVersion::new(1, 1, 0);
pub const SETTINGS_FILE: &str = "half_looted_emptier.yaml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PluginVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl PluginVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parses `MAJOR.MINOR.PATCH`; missing trailing parts count as zero.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.trim().split('.');
        let major = parts.next()?.trim().parse().ok()?;
        let minor = match parts.next() {
            Some(part) => part.trim().parse().ok()?,
            None => 0,
        };
        let patch = match parts.next() {
            Some(part) => part.trim().parse().ok()?,
            None => 0,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(major, minor, patch))
    }
}

impl std::fmt::Display for PluginVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerMode {
    Remaining,
    Looted,
}

/// Plugin settings as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(rename = "Version", default)]
    pub version: String,
    #[serde(rename = "Emptying Trigger Mode")]
    pub trigger_mode: TriggerMode,
    #[serde(rename = "Number Of Items To Trigger Emptying")]
    pub trigger_threshold: i64,
    #[serde(rename = "Delay Before Emptying Container Seconds")]
    pub delay_seconds: f32,
    #[serde(rename = "Remove Items Instead Of Dropping")]
    pub remove_instead_of_drop: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: PLUGIN_VERSION.to_string(),
            trigger_mode: TriggerMode::Looted,
            trigger_threshold: 1,
            delay_seconds: 30.0,
            remove_instead_of_drop: false,
        }
    }
}

/// One step of the upgrade path. Applied when the stored version is older
/// than `before`.
struct Migration {
    before: PluginVersion,
    apply: fn(&mut Settings, &Settings),
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        before: PluginVersion::new(1, 0, 0),
        apply: reset_all,
    },
    Migration {
        before: PluginVersion::new(1, 1, 0),
        apply: reset_trigger,
    },
];

fn reset_all(settings: &mut Settings, defaults: &Settings) {
    *settings = defaults.clone();
}

// 1.1.0 replaced item-signature matching with count thresholds.
fn reset_trigger(settings: &mut Settings, defaults: &Settings) {
    settings.trigger_mode = defaults.trigger_mode;
    settings.trigger_threshold = defaults.trigger_threshold;
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub path: PathBuf,
    pub created: bool,
    pub migrated_from: Option<String>,
    pub corrections: Vec<String>,
}

impl Settings {
    pub fn path(root: &Path) -> PathBuf {
        root.join("config").join(SETTINGS_FILE)
    }

    pub fn parse(text: &str) -> Result<Self, String> {
        if text.trim().is_empty() {
            return Ok(Self {
                version: String::new(),
                ..Self::default()
            });
        }
        serde_yaml::from_str(text).map_err(|err| format!("settings parse failed: {}", err))
    }

    pub fn to_yaml(&self) -> Result<String, String> {
        serde_yaml::to_string(self).map_err(|err| format!("settings encode failed: {}", err))
    }

    /// Reads the settings file, upgrading and validating it, then writes the
    /// result back so the file always reflects the running version.
    pub fn load_or_create(root: &Path) -> Result<(Self, LoadReport), String> {
        let path = Self::path(root);
        let (mut settings, created) = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|err| format!("read {} failed: {}", path.display(), err))?;
            (Self::parse(&text)?, false)
        } else {
            logging::log_game(&format!("no settings at {}, writing defaults", path.display()));
            (Self::default(), true)
        };

        let migrated_from = settings.migrate();
        let corrections = settings.validate();
        settings.save(&path)?;

        Ok((
            settings,
            LoadReport {
                path,
                created,
                migrated_from,
                corrections,
            },
        ))
    }

    pub fn save(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|err| format!("create {} failed: {}", parent.display(), err))?;
        }
        let text = self.to_yaml()?;
        std::fs::write(path, text).map_err(|err| format!("write {} failed: {}", path.display(), err))
    }

    pub fn stored_version(&self) -> Option<PluginVersion> {
        PluginVersion::parse(&self.version)
    }

    /// Brings an older record up to `PLUGIN_VERSION`. Returns the version
    /// string it was upgraded from, if any upgrade ran.
    pub fn migrate(&mut self) -> Option<String> {
        let stored = self.stored_version();
        let needs_upgrade = match stored {
            Some(version) => version.cmp(&PLUGIN_VERSION) == Ordering::Less,
            None => true,
        };
        if !needs_upgrade {
            return None;
        }

        logging::log_game("config changes detected, updating");
        let previous = self.version.clone();
        let defaults = Self::default();
        for migration in MIGRATIONS {
            let applies = stored.map_or(true, |version| version < migration.before);
            if applies {
                (migration.apply)(self, &defaults);
            }
        }

        self.version = PLUGIN_VERSION.to_string();
        logging::log_game(&format!(
            "config update complete, updated from version '{}' to {}",
            previous, PLUGIN_VERSION
        ));
        Some(previous)
    }

    /// Pulls out-of-range values back into range, describing each fix.
    pub fn validate(&mut self) -> Vec<String> {
        let mut corrections = Vec::new();
        if self.trigger_threshold < 1 {
            corrections.push(format!(
                "trigger threshold {} raised to 1",
                self.trigger_threshold
            ));
            self.trigger_threshold = 1;
        }
        if self.trigger_threshold > i64::from(u32::MAX) {
            corrections.push(format!(
                "trigger threshold {} lowered to {}",
                self.trigger_threshold,
                u32::MAX
            ));
            self.trigger_threshold = i64::from(u32::MAX);
        }
        if !self.delay_seconds.is_finite() || self.delay_seconds < 0.0 {
            corrections.push(format!("delay {} set to 0", self.delay_seconds));
            self.delay_seconds = 0.0;
        }
        for correction in &corrections {
            logging::log_error(&format!("settings: {}", correction));
        }
        corrections
    }

    pub fn trigger_policy(&self) -> TriggerPolicy {
        let threshold = u32::try_from(self.trigger_threshold.max(1)).unwrap_or(u32::MAX);
        match self.trigger_mode {
            TriggerMode::Looted => TriggerPolicy::LootedCount { threshold },
            TriggerMode::Remaining => TriggerPolicy::RemainingCount { threshold },
        }
    }

    pub fn empty_action(&self) -> EmptyAction {
        EmptyAction::from_seconds(self.delay_seconds, self.remove_instead_of_drop)
    }
}
