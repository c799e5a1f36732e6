//! Board configuration loaded from `.swimlane/config.toml`.

use std::{fs, path::Path};

use anyhow::{Context, Result, bail};
use serde::Deserialize;

const CONFIG_DIR: &str = ".swimlane";
const CONFIG_FILE: &str = "config.toml";

/// Top-level board configuration.
///
/// Every field has a usable default; a missing config file is not an
/// error.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct BoardConfig {
    /// Drag gesture tuning.
    #[serde(default)]
    pub drag: DragConfig,
}

impl BoardConfig {
    /// Load configuration from `<base_dir>/.swimlane/config.toml`.
    ///
    /// # Errors
    /// Returns an error when the file exists but cannot be read, parsed,
    /// or validated.
    pub fn load(base_dir: impl AsRef<Path>) -> Result<Self> {
        let config_path = base_dir.as_ref().join(CONFIG_DIR).join(CONFIG_FILE);
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        self.drag.validate()
    }
}

/// Tuning for the drag-to-move gesture.
#[derive(Debug, Clone, Deserialize)]
pub struct DragConfig {
    /// Visual width of a column, in points.
    #[serde(default = "default_column_width")]
    pub column_width: f32,
    /// Fraction of the column width a drag must cover to change columns.
    #[serde(default = "default_threshold_fraction")]
    pub threshold_fraction: f32,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            column_width: default_column_width(),
            threshold_fraction: default_threshold_fraction(),
        }
    }
}

impl DragConfig {
    /// Effective displacement threshold handed to the gesture classifier.
    #[must_use]
    pub fn threshold(&self) -> f32 {
        self.column_width * self.threshold_fraction
    }

    fn validate(&self) -> Result<()> {
        if !self.column_width.is_finite() || self.column_width <= 0.0 {
            bail!("drag.column_width must be a positive finite number");
        }
        if !self.threshold_fraction.is_finite()
            || self.threshold_fraction <= 0.0
            || self.threshold_fraction > 1.0
        {
            bail!("drag.threshold_fraction must be within (0, 1]");
        }
        Ok(())
    }
}

const fn default_column_width() -> f32 {
    // Matches a 0.8-screen-width column on a typical 400pt viewport.
    320.0
}

const fn default_threshold_fraction() -> f32 {
    0.3
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, body: &str) {
        let config_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(&config_dir)
            .unwrap_or_else(|err| panic!("must create config dir: {err}"));
        fs::write(config_dir.join(CONFIG_FILE), body)
            .unwrap_or_else(|err| panic!("must write config: {err}"));
    }

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = TempDir::new()?;
        let config = BoardConfig::load(dir.path())?;
        assert!((config.drag.column_width - 320.0).abs() < f32::EPSILON);
        assert!((config.drag.threshold() - 96.0).abs() < f32::EPSILON);
        Ok(())
    }

    #[test]
    fn file_overrides_drag_settings() -> Result<()> {
        let dir = TempDir::new()?;
        write_config(
            &dir,
            "[drag]\ncolumn_width = 200.0\nthreshold_fraction = 0.5\n",
        );
        let config = BoardConfig::load(dir.path())?;
        assert!((config.drag.threshold() - 100.0).abs() < f32::EPSILON);
        Ok(())
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() -> Result<()> {
        let dir = TempDir::new()?;
        write_config(&dir, "[drag]\nthreshold_fraction = 0.25\n");
        let config = BoardConfig::load(dir.path())?;
        assert!((config.drag.column_width - 320.0).abs() < f32::EPSILON);
        assert!((config.drag.threshold() - 80.0).abs() < f32::EPSILON);
        Ok(())
    }

    #[test]
    fn out_of_range_fraction_is_rejected() {
        let dir = TempDir::new().unwrap_or_else(|err| panic!("must create tempdir: {err}"));
        write_config(&dir, "[drag]\nthreshold_fraction = 1.5\n");
        assert!(BoardConfig::load(dir.path()).is_err());

        write_config(&dir, "[drag]\ncolumn_width = -10.0\n");
        assert!(BoardConfig::load(dir.path()).is_err());
    }
}
