//! Backend parsing and the instance registry
//!
//! Backends are opened from strings of the form `name` or
//! `name:key1=value1,key2=value2`. The only backend is the in-process
//! simulator; its parameters override the per-instance settings.
//!
//! The [`DeviceRegistry`] maps instance ids to attached handles. Instances are
//! independent: each has its own register file, cursors and session lock.

use crate::config::{parse_number, HostConfig, InstanceSettings};
use crate::error::{HostError, Result};
use crate::handle::AcceleratorHandle;
use crate::irq::IrqLatch;
use fftacc_core::protocol::PollConfig;
use fftacc_core::{AccessPolicy, Accelerator, AddressMode, OverflowPolicy};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Parsed backend parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendParams {
    /// Backend name as given
    pub name: String,
    /// Key-value parameters
    pub params: HashMap<String, String>,
}

/// Parse a backend string into name and parameters
///
/// Format: "name" or "name:key1=value1,key2=value2"
///
/// # Example
/// ```ignore
/// let params = parse_backend_params("sim:id=0xfacecafe")?;
/// assert_eq!(params.name, "sim");
/// assert_eq!(params.params.get("id"), Some(&"0xfacecafe".to_string()));
/// ```
pub fn parse_backend_params(s: &str) -> Result<BackendParams> {
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));

    let mut params = HashMap::new();
    if !opts_str.is_empty() {
        for opt in opts_str.split(',') {
            if let Some((key, value)) = opt.split_once('=') {
                params.insert(key.trim().to_string(), value.trim().to_string());
            } else {
                return Err(HostError::InvalidParameter(format!(
                    "'{}' (expected key=value)",
                    opt
                )));
            }
        }
    }

    Ok(BackendParams {
        name: name.trim().to_string(),
        params,
    })
}

fn parse_access(value: &str) -> Result<AccessPolicy> {
    match value.to_ascii_lowercase().as_str() {
        "strict" => Ok(AccessPolicy::Strict),
        "permissive" | "legacy" => Ok(AccessPolicy::Permissive),
        _ => Err(HostError::InvalidParameter(format!("access={}", value))),
    }
}

fn parse_overflow(value: &str) -> Result<OverflowPolicy> {
    match value.to_ascii_lowercase().as_str() {
        "error" => Ok(OverflowPolicy::Error),
        "ignore" => Ok(OverflowPolicy::Ignore),
        _ => Err(HostError::InvalidParameter(format!("overflow={}", value))),
    }
}

fn parse_addressing(value: &str) -> Result<AddressMode> {
    match value.to_ascii_lowercase().as_str() {
        "byte" => Ok(AddressMode::Byte),
        "word" => Ok(AddressMode::Word),
        _ => Err(HostError::InvalidParameter(format!("addressing={}", value))),
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "on" | "yes" | "true" => Ok(true),
        "0" | "off" | "no" | "false" => Ok(false),
        _ => Err(HostError::InvalidParameter(format!("{}={}", key, value))),
    }
}

/// Apply backend parameters on top of `base`
pub fn apply_params(base: &InstanceSettings, params: &BackendParams) -> Result<InstanceSettings> {
    let mut settings = base.clone();
    for (key, value) in &params.params {
        match key.as_str() {
            "instance" => {
                settings.instance = parse_number(value)
                    .map_err(|e| HostError::InvalidParameter(format!("instance: {}", e)))?
            }
            "id" | "device_id" => {
                settings.device_id = parse_number(value)
                    .map_err(|e| HostError::InvalidParameter(format!("id: {}", e)))?
            }
            "access" => settings.access = parse_access(value)?,
            "overflow" => settings.overflow = parse_overflow(value)?,
            "addressing" => settings.addressing = parse_addressing(value)?,
            "irq" => settings.irq = parse_flag(key, value)?,
            _ => {
                return Err(HostError::InvalidParameter(format!(
                    "unknown key '{}' for backend {}",
                    key, params.name
                )))
            }
        }
    }
    Ok(settings)
}

/// Build a handle for an in-process accelerator
pub fn open_simulator(settings: &InstanceSettings, poll: PollConfig) -> AcceleratorHandle {
    let mut accelerator = Accelerator::new(settings.accelerator_config());

    log::info!(
        "Opening simulated accelerator {} (id 0x{:08X}, {:?} access, {:?} addressing)",
        settings.instance,
        settings.device_id,
        settings.access,
        settings.addressing
    );

    if settings.irq {
        let latch = IrqLatch::new();
        accelerator.attach_irq(Box::new(latch.line()));
        AcceleratorHandle::new(settings.instance, Box::new(accelerator), poll).with_irq(latch)
    } else {
        AcceleratorHandle::new(settings.instance, Box::new(accelerator), poll)
    }
}

/// Open a backend and create a handle
///
/// `base` supplies the settings the backend string does not override.
pub fn open_backend(
    backend: &str,
    base: &InstanceSettings,
    poll: PollConfig,
) -> Result<AcceleratorHandle> {
    let params = parse_backend_params(backend)?;

    match params.name.as_str() {
        "sim" | "dummy" | "model" => {
            let settings = apply_params(base, &params)?;
            Ok(open_simulator(&settings, poll))
        }
        _ => Err(HostError::UnknownBackend(params.name)),
    }
}

/// Information about a backend
pub struct BackendInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all available backends
pub fn available_backends() -> Vec<BackendInfo> {
    vec![BackendInfo {
        name: "sim",
        aliases: &["dummy", "model"],
        description: "In-process accelerator model \
                      (id=<hex>,access=<strict|permissive>,overflow=<error|ignore>,\
                      addressing=<byte|word>,irq=<on|off>,instance=<n>)",
    }]
}

/// Short list of backend names for CLI help
pub fn backend_names_short() -> String {
    let names: Vec<&str> = available_backends().iter().map(|b| b.name).collect();
    names.join(", ")
}

/// Attached accelerator instances, keyed by instance id
#[derive(Default)]
pub struct DeviceRegistry {
    devices: BTreeMap<u32, Arc<AcceleratorHandle>>,
}

impl DeviceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach every instance listed in `config` to the simulator backend
    pub fn from_config(config: &HostConfig) -> Result<Self> {
        let mut registry = Self::new();
        for settings in &config.accelerators {
            registry.attach(open_simulator(settings, config.poll))?;
        }
        Ok(registry)
    }

    /// Attach a handle under its instance id
    pub fn attach(&mut self, handle: AcceleratorHandle) -> Result<Arc<AcceleratorHandle>> {
        let instance = handle.instance();
        if self.devices.contains_key(&instance) {
            return Err(HostError::DuplicateInstance(instance));
        }
        let handle = Arc::new(handle);
        self.devices.insert(instance, Arc::clone(&handle));
        log::debug!("attached instance {}", instance);
        Ok(handle)
    }

    /// Detach an instance
    ///
    /// Fails with `Busy` while a session is open on it.
    pub fn detach(&mut self, instance: u32) -> Result<Arc<AcceleratorHandle>> {
        let handle = self.get(instance)?;
        if handle.is_busy() {
            return Err(HostError::Busy(instance));
        }
        self.devices.remove(&instance);
        log::debug!("detached instance {}", instance);
        Ok(handle)
    }

    /// Look an instance up
    pub fn get(&self, instance: u32) -> Result<Arc<AcceleratorHandle>> {
        self.devices
            .get(&instance)
            .cloned()
            .ok_or(HostError::NoSuchInstance(instance))
    }

    /// Attached instance ids in ascending order
    pub fn instances(&self) -> impl Iterator<Item = u32> + '_ {
        self.devices.keys().copied()
    }

    /// Number of attached instances
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether no instance is attached
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fftacc_core::Register;

    #[test]
    fn test_parse_backend_params() {
        let p = parse_backend_params("sim").unwrap();
        assert_eq!(p.name, "sim");
        assert!(p.params.is_empty());

        let p = parse_backend_params("sim:id=0x1234,addressing=word").unwrap();
        assert_eq!(p.params.get("id"), Some(&"0x1234".to_string()));
        assert_eq!(p.params.get("addressing"), Some(&"word".to_string()));

        assert!(matches!(
            parse_backend_params("sim:irq"),
            Err(HostError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_apply_params() {
        let base = InstanceSettings::default();
        let p = parse_backend_params(
            "sim:instance=2,id=0xFACECAFE,access=permissive,overflow=ignore,addressing=word,irq=on",
        )
        .unwrap();
        let s = apply_params(&base, &p).unwrap();
        assert_eq!(s.instance, 2);
        assert_eq!(s.device_id, 0xFACE_CAFE);
        assert_eq!(s.access, AccessPolicy::Permissive);
        assert_eq!(s.overflow, OverflowPolicy::Ignore);
        assert_eq!(s.addressing, AddressMode::Word);
        assert!(s.irq);

        let bad = parse_backend_params("sim:speed=9").unwrap();
        assert!(apply_params(&base, &bad).is_err());
        let bad = parse_backend_params("sim:addressing=nibble").unwrap();
        assert!(apply_params(&base, &bad).is_err());
    }

    #[test]
    fn test_open_backend() {
        let h = open_backend("sim:id=0x11", &InstanceSettings::default(), PollConfig::default())
            .unwrap();
        assert_eq!(h.read_register(Register::DevId).unwrap(), 0x11);
        assert!(h.irq().is_none());

        assert!(matches!(
            open_backend("ch341a", &InstanceSettings::default(), PollConfig::default()),
            Err(HostError::UnknownBackend(name)) if name == "ch341a"
        ));
    }

    #[test]
    fn test_registry_lifecycle() {
        let mut reg = DeviceRegistry::new();
        let poll = PollConfig::default();
        let settings = |instance| InstanceSettings {
            instance,
            ..InstanceSettings::default()
        };

        reg.attach(open_simulator(&settings(1), poll)).unwrap();
        reg.attach(open_simulator(&settings(0), poll)).unwrap();
        assert!(matches!(
            reg.attach(open_simulator(&settings(1), poll)),
            Err(HostError::DuplicateInstance(1))
        ));
        assert_eq!(reg.instances().collect::<Vec<_>>(), vec![0, 1]);

        let held = reg.get(1).unwrap();
        let session = held.open_session().unwrap();
        assert!(matches!(reg.detach(1), Err(HostError::Busy(1))));
        drop(session);
        reg.detach(1).unwrap();

        assert!(matches!(reg.get(1), Err(HostError::NoSuchInstance(1))));
        assert_eq!(reg.len(), 1);
    }
}
