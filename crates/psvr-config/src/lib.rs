use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// Bridge configuration, read from `psvr-bridge/config.toml` under the user
/// config directory. Missing file or fields fall back to defaults; the
/// command line overrides whatever was loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// VRidge server host.
    pub server: String,
    pub imu: ImuConfig,
    pub output: OutputConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: "localhost".into(),
            imu: ImuConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImuConfig {
    /// Madgwick filter gain. Higher converges faster but is noisier.
    pub madgwick_beta: f64,
    /// Stationary window for gyro-bias calibration, seconds.
    pub calibration_secs: f64,
    /// Whether to run calibration before tracking starts.
    pub gyro_compensation: bool,
}

impl Default for ImuConfig {
    fn default() -> Self {
        Self {
            madgwick_beta: 0.1,
            calibration_secs: 5.0,
            gyro_compensation: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Which tracking-frame shape to send.
    pub mode: OutputMode,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            mode: OutputMode::Quaternion,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Euler angles + position.
    Angles,
    /// Quaternion + position.
    Quaternion,
    /// Position only.
    Position,
}

impl AppConfig {
    /// `<user config dir>/psvr-bridge/config.toml`.
    pub fn path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .context("Could not determine the user config directory")?
            .join("psvr-bridge");
        Ok(dir.join("config.toml"))
    }

    /// Load from disk, or defaults when no file exists.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;
        if !path.exists() {
            info!("No config file, using defaults");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config =
            toml::from_str(&contents).with_context(|| format!("Bad config {}", path.display()))?;
        info!(?path, "Loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.server, "localhost");
        assert_eq!(config.imu.madgwick_beta, 0.1);
        assert_eq!(config.imu.calibration_secs, 5.0);
        assert!(!config.imu.gyro_compensation);
        assert_eq!(config.output.mode, OutputMode::Quaternion);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            server = "vr-desktop"

            [output]
            mode = "angles"
            "#,
        )
        .unwrap();
        assert_eq!(config.server, "vr-desktop");
        assert_eq!(config.output.mode, OutputMode::Angles);
        assert_eq!(config.imu.madgwick_beta, 0.1);
    }
}
