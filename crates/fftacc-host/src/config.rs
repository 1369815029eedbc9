//! TOML host configuration
//!
//! ```toml
//! [poll]
//! max_polls = 500
//!
//! [[accelerator]]
//! instance = 0
//! device_id = "0xCAFEAFFE"
//! access = "strict"
//! overflow = "error"
//! addressing = "byte"
//! irq = true
//!
//! [[accelerator]]
//! instance = 1
//! addressing = "word"
//! ```

use crate::error::{HostError, Result};
use fftacc_core::protocol::PollConfig;
use fftacc_core::regs::DEFAULT_DEVICE_ID;
use fftacc_core::{AccessPolicy, AcceleratorConfig, AddressMode, OverflowPolicy};
use std::fs;
use std::path::Path;

/// Whole configuration file
#[derive(Debug, Default, serde::Deserialize)]
pub struct HostConfig {
    /// Accelerator instances to attach
    #[serde(default, rename = "accelerator")]
    pub accelerators: Vec<InstanceSettings>,
    /// Polling bound shared by every instance
    #[serde(default)]
    pub poll: PollConfig,
}

/// Settings for one accelerator instance
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct InstanceSettings {
    /// Registry key
    #[serde(default)]
    pub instance: u32,
    /// DEVID value
    #[serde(default = "default_device_id", deserialize_with = "deserialize_hex_u32")]
    pub device_id: u32,
    /// Invalid access handling
    #[serde(default)]
    pub access: AccessPolicy,
    /// Cursor overflow handling
    #[serde(default)]
    pub overflow: OverflowPolicy,
    /// Offset decoding
    #[serde(default)]
    pub addressing: AddressMode,
    /// Wire the interrupt line to a host latch
    #[serde(default)]
    pub irq: bool,
}

impl Default for InstanceSettings {
    fn default() -> Self {
        Self {
            instance: 0,
            device_id: DEFAULT_DEVICE_ID,
            access: AccessPolicy::default(),
            overflow: OverflowPolicy::default(),
            addressing: AddressMode::default(),
            irq: false,
        }
    }
}

impl InstanceSettings {
    /// Core configuration for this instance
    pub fn accelerator_config(&self) -> AcceleratorConfig {
        AcceleratorConfig {
            device_id: self.device_id,
            access: self.access,
            overflow: self.overflow,
            addressing: self.addressing,
        }
    }
}

fn default_device_id() -> u32 {
    DEFAULT_DEVICE_ID
}

/// Deserialize a u32 that can be hex (0x...) or decimal
fn deserialize_hex_u32<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum HexOrInt {
        Int(u32),
        Str(String),
    }

    match HexOrInt::deserialize(deserializer)? {
        HexOrInt::Int(n) => Ok(n),
        HexOrInt::Str(s) => parse_number(&s).map_err(serde::de::Error::custom),
    }
}

/// Parse a number that can be hex (0x...) or decimal
pub fn parse_number(s: &str) -> std::result::Result<u32, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("invalid hex: {}", e))
    } else {
        s.parse().map_err(|e| format!("invalid number: {}", e))
    }
}

impl HostConfig {
    /// Load a configuration from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse a configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: HostConfig =
            toml::from_str(content).map_err(|e| HostError::Config(e.to_string()))?;

        if config.poll.max_polls == 0 {
            return Err(HostError::Config("poll.max_polls must be at least 1".into()));
        }

        let mut seen = std::collections::BTreeSet::new();
        for entry in &config.accelerators {
            if !seen.insert(entry.instance) {
                return Err(HostError::DuplicateInstance(entry.instance));
            }
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("0x10"), Ok(16));
        assert_eq!(parse_number(" 0XcafeAFFE "), Ok(0xCAFE_AFFE));
        assert_eq!(parse_number("42"), Ok(42));
        assert!(parse_number("0xZZ").is_err());
        assert!(parse_number("-1").is_err());
    }

    #[test]
    fn test_full_file() {
        let config = HostConfig::from_toml_str(
            r#"
            [poll]
            max_polls = 50

            [[accelerator]]
            instance = 0
            device_id = "0xFACECAFE"
            irq = true

            [[accelerator]]
            instance = 3
            device_id = 1234
            access = "permissive"
            overflow = "ignore"
            addressing = "word"
            "#,
        )
        .unwrap();

        assert_eq!(config.poll.max_polls, 50);
        assert_eq!(config.accelerators.len(), 2);

        let first = &config.accelerators[0];
        assert_eq!(first.device_id, 0xFACE_CAFE);
        assert!(first.irq);
        assert_eq!(first.access, AccessPolicy::Strict);

        let second = config.accelerators[1].accelerator_config();
        assert_eq!(second.device_id, 1234);
        assert_eq!(second.access, AccessPolicy::Permissive);
        assert_eq!(second.overflow, OverflowPolicy::Ignore);
        assert_eq!(second.addressing, AddressMode::Word);
    }

    #[test]
    fn test_defaults() {
        let config = HostConfig::from_toml_str("[[accelerator]]\n").unwrap();
        assert_eq!(config.poll, PollConfig::default());
        assert_eq!(config.accelerators[0], InstanceSettings::default());

        let empty = HostConfig::from_toml_str("").unwrap();
        assert!(empty.accelerators.is_empty());
    }

    #[test]
    fn test_rejects_bad_files() {
        assert!(matches!(
            HostConfig::from_toml_str("[[accelerator]]\ninstance = 1\n[[accelerator]]\ninstance = 1\n"),
            Err(HostError::DuplicateInstance(1))
        ));
        assert!(matches!(
            HostConfig::from_toml_str("[poll]\nmax_polls = 0\n"),
            Err(HostError::Config(_))
        ));
        assert!(matches!(
            HostConfig::from_toml_str("[[accelerator]]\naccess = \"loose\"\n"),
            Err(HostError::Config(_))
        ));
    }
}
