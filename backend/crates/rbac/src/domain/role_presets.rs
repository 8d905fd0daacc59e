//! Role Presets
//!
//! The fixed `(level, name)` table roles are provisioned from at startup.
//! The table is data: the core only relies on ascending level meaning more
//! privilege.

use thiserror::Error;

use crate::domain::value_object::role_level::RoleLevel;

/// Preset table shipped with the service
const DEFAULT_PRESETS: &[(RoleLevel, &str)] = &[
    (1, "Viewer"),
    (2, "Reporter"),
    (3, "Editor"),
    (4, "Manager"),
    (5, "Administrator"),
];

/// Preset table validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresetError {
    #[error("Role preset table is empty")]
    Empty,

    #[error("Role preset at level {0} has an empty name")]
    EmptyName(RoleLevel),

    #[error("Duplicate role level {0}")]
    DuplicateLevel(RoleLevel),

    #[error("Duplicate role name {0:?}")]
    DuplicateName(String),
}

/// One `(level, name)` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePreset {
    pub level: RoleLevel,
    pub name: String,
}

/// Validated preset table, ascending by level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePresets(Vec<RolePreset>);

impl RolePresets {
    /// Validate and sort a preset table.
    ///
    /// Levels and names must be unique and names non-empty.
    pub fn new<N: Into<String>>(
        presets: impl IntoIterator<Item = (RoleLevel, N)>,
    ) -> Result<Self, PresetError> {
        let mut entries: Vec<RolePreset> = presets
            .into_iter()
            .map(|(level, name)| RolePreset {
                level,
                name: name.into().trim().to_string(),
            })
            .collect();

        if entries.is_empty() {
            return Err(PresetError::Empty);
        }

        if let Some(blank) = entries.iter().find(|p| p.name.is_empty()) {
            return Err(PresetError::EmptyName(blank.level));
        }

        entries.sort_by_key(|p| p.level);
        if let Some(pair) = entries.windows(2).find(|w| w[0].level == w[1].level) {
            return Err(PresetError::DuplicateLevel(pair[0].level));
        }

        let mut names: Vec<&str> = entries.iter().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        if let Some(pair) = names.windows(2).find(|w| w[0] == w[1]) {
            return Err(PresetError::DuplicateName(pair[0].to_string()));
        }

        Ok(Self(entries))
    }

    /// Presets ascending by level
    pub fn iter(&self) -> impl Iterator<Item = &RolePreset> {
        self.0.iter()
    }

    /// Most privileged preset
    pub fn highest(&self) -> &RolePreset {
        // Construction rejects empty tables
        &self.0[self.0.len() - 1]
    }

    pub fn get(&self, level: RoleLevel) -> Option<&RolePreset> {
        self.0.iter().find(|p| p.level == level)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for RolePresets {
    fn default() -> Self {
        Self(
            DEFAULT_PRESETS
                .iter()
                .map(|&(level, name)| RolePreset {
                    level,
                    name: name.to_string(),
                })
                .collect(),
        )
    }
}
