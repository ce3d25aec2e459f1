use crate::types::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path))?;
        Self::from_yaml(&contents).with_context(|| format!("Invalid config {}", path))
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Falls back to built-in thresholds when the file does not exist.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        let k = self.edges.blur_kernel_size;
        if k <= 0 || k % 2 == 0 {
            anyhow::bail!("edges.blur_kernel_size must be odd and positive, got {}", k);
        }
        if self.hough.dist_resolution <= 0.0 || self.hough.angle_resolution <= 0.0 {
            anyhow::bail!("hough resolutions must be positive");
        }
        if !(0.0..=1.0).contains(&self.lanes.top_ratio) {
            anyhow::bail!("lanes.top_ratio must lie in [0, 1]");
        }
        if !(0.0..=1.0).contains(&self.region.apex_y_ratio) {
            anyhow::bail!("region.apex_y_ratio must lie in [0, 1]");
        }
        if self.overlay.line_width <= 0 {
            anyhow::bail!("overlay.line_width must be positive");
        }
        Ok(())
    }
}
