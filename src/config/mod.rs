//! Configuration loading and validation

mod schema;

pub use schema::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a YAML file
pub fn load_config(path: &Path) -> Result<HologramConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let config: HologramConfig = serde_yaml::from_str(&contents)
        .with_context(|| format!("failed to parse config file {:?}", path))?;
    config.validate()?;
    Ok(config)
}

/// Load from `path` when given, otherwise use defaults
pub fn load_or_default(path: Option<&Path>) -> Result<HologramConfig> {
    match path {
        Some(path) => load_config(path),
        None => Ok(HologramConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_minimal_config() {
        let yaml = r#"
audio:
  sample_rate: 48000
  buffer_size: 256

master:
  volume: 0.7
"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.audio.sample_rate, 48000);
        assert_eq!(config.master.volume, 0.7);
        assert_eq!(config.reverb.seconds, 5.0);
    }

    #[test]
    fn test_load_example_config() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(include_str!("../../hologram.example.yaml").as_bytes())
            .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.synth_settings().silence_floor, 0.001);
        assert_eq!(config.timing.intensity_ramp_secs, 0.5);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"timing:\n  silence_floor: 0\n").unwrap();

        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_errors() {
        let err = load_config(Path::new("/nonexistent/hologram.yaml")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn test_load_or_default_without_path() {
        let config = load_or_default(None).unwrap();
        assert_eq!(config, HologramConfig::default());
    }
}
