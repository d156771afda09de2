use serde::Deserialize;

use crate::error::ConfigError;

/// World dimensions as authored in the `[world]` table of a config file.
///
/// Chunk counts and voxel counts are per axis; X and Z always share a size.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct WorldConfig {
    /// Number of chunks along X and Z.
    #[serde(default = "default_size_xz")]
    pub size_xz: u32,
    /// Number of chunks along Y.
    #[serde(default = "default_size_y")]
    pub size_y: u32,
    /// Voxels per chunk along X and Z.
    #[serde(default = "default_chunk_size_xz")]
    pub chunk_size_xz: u32,
    /// Voxels per chunk along Y.
    #[serde(default = "default_chunk_size_y")]
    pub chunk_size_y: u32,
    /// View distance in chunks along X and Z.
    #[serde(default = "default_view_distance_xz")]
    pub view_distance_xz: u32,
    /// View distance in chunks along Y.
    #[serde(default = "default_view_distance_y")]
    pub view_distance_y: u32,
    /// Surface materials, one submesh per entry.
    #[serde(default = "default_surface_materials")]
    pub surface_materials: Vec<String>,
}

fn default_size_xz() -> u32 {
    1
}
fn default_size_y() -> u32 {
    1
}
fn default_chunk_size_xz() -> u32 {
    2
}
fn default_chunk_size_y() -> u32 {
    2
}
fn default_view_distance_xz() -> u32 {
    12
}
fn default_view_distance_y() -> u32 {
    8
}
fn default_surface_materials() -> Vec<String> {
    vec!["default".to_string()]
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            size_xz: default_size_xz(),
            size_y: default_size_y(),
            chunk_size_xz: default_chunk_size_xz(),
            chunk_size_y: default_chunk_size_y(),
            view_distance_xz: default_view_distance_xz(),
            view_distance_y: default_view_distance_y(),
            surface_materials: default_surface_materials(),
        }
    }
}

impl WorldConfig {
    /// Shorthand for tests and tools that only care about the grid shape.
    pub fn with_sizes(size_xz: u32, size_y: u32, chunk_size_xz: u32, chunk_size_y: u32) -> Self {
        Self {
            size_xz,
            size_y,
            chunk_size_xz,
            chunk_size_y,
            ..Self::default()
        }
    }

    /// Parses a bare world table (no `[world]` header).
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: WorldConfig = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Rejects shapes the spatial index cannot represent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let axes = [
            ("size_xz", self.size_xz),
            ("size_y", self.size_y),
            ("chunk_size_xz", self.chunk_size_xz),
            ("chunk_size_y", self.chunk_size_y),
        ];
        for (name, v) in axes {
            if v == 0 {
                return Err(ConfigError::Invalid(format!("{name} must be at least 1")));
            }
        }
        if self.surface_materials.is_empty() {
            return Err(ConfigError::Invalid(
                "surface_materials must name at least one material".into(),
            ));
        }
        // World bounds and per-chunk strides are computed in i32.
        let fits = |a: u32, b: u32| a.checked_mul(b).is_some_and(|v| v <= i32::MAX as u32);
        if !fits(self.size_xz, self.chunk_size_xz) || !fits(self.size_y, self.chunk_size_y) {
            return Err(ConfigError::Invalid("world bounds overflow i32".into()));
        }
        let chunk_voxels = (self.chunk_size_xz as u64)
            * (self.chunk_size_xz as u64)
            * (self.chunk_size_y as u64);
        let chunk_count = (self.size_xz as u64) * (self.size_xz as u64) * (self.size_y as u64);
        if chunk_voxels > i32::MAX as u64 || chunk_count > i32::MAX as u64 {
            return Err(ConfigError::Invalid("chunk or voxel count overflow".into()));
        }
        if !fits(self.view_distance_xz, self.chunk_size_xz)
            || !fits(self.view_distance_y, self.chunk_size_y)
        {
            return Err(ConfigError::Invalid("view distance overflow".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_past_i32_are_rejected() {
        assert!(WorldConfig::with_sizes(2, 1, 2, 2).validate().is_ok());
        let wide = WorldConfig::with_sizes(65_536, 1, 32_768, 2);
        let err = wide.validate().unwrap_err();
        assert!(
            matches!(&err, ConfigError::Invalid(msg) if msg.contains("world bounds")),
            "{err}"
        );
        let tall = WorldConfig::with_sizes(1, 3, 1, 1 << 30);
        assert!(matches!(tall.validate(), Err(ConfigError::Invalid(_))));
    }
}
