//! Target registration and bank configuration
//!
//! This module provides a centralized registry for the memory transports the
//! tool can drive, parses target and bank strings from the command line, and
//! ties the configured flash banks to the opened target.

use atflasher_core::flash::{BankConfig, FlashBank};
use atflasher_core::transport::MemoryTransport;
use std::collections::HashMap;
use thiserror::Error;

/// Errors from opening a target or configuring its banks
#[derive(Debug, Error)]
pub enum TargetError {
    /// No target with this name is compiled in
    #[error("Unknown target: {0}")]
    UnknownTarget(String),

    /// Option is not of the form key=value
    #[error("Invalid parameter format: '{0}' (expected key=value)")]
    ParamFormat(String),

    /// Option value does not parse
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    /// Option not understood by the target
    #[error("Unknown parameter for {target}: {key}")]
    UnknownParam { target: String, key: String },

    /// Bank string rejected
    #[error("Invalid bank '{spec}': {source} (expected <base>,<size>,<index>,<target>)")]
    BankConfig {
        spec: String,
        #[source]
        source: atflasher_core::Error,
    },

    /// Bank names a target other than the opened one
    #[error("Bank {index} belongs to target '{bank_target}', but '{target}' is open")]
    BankTarget {
        index: u32,
        bank_target: String,
        target: String,
    },

    /// Two banks share an index
    #[error("Bank index {0} configured twice")]
    DuplicateBank(u32),

    /// No bank with this index
    #[error("No bank with index {0}")]
    NoSuchBank(u32),
}

/// Information about a target
pub struct TargetInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all available targets (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_targets() -> Vec<TargetInfo> {
    let mut targets = Vec::new();

    #[cfg(feature = "dummy")]
    targets.push(TargetInfo {
        name: "dummy",
        aliases: &["emulator"],
        description: "In-memory AT32 emulator (device_id=,flash_kb=,mask=,halted=,examined=,protected=,busy=)",
    });

    targets
}

/// Generate a short list of target names for CLI help
pub fn target_names_short() -> String {
    let targets = available_targets();
    let names: Vec<&str> = targets.iter().map(|t| t.name).collect();
    names.join(", ")
}

/// Parsed target parameters
#[derive(Debug)]
pub struct TargetParams {
    /// Target name as given
    pub name: String,
    /// Key-value parameters
    pub params: HashMap<String, String>,
}

impl TargetParams {
    /// Numeric parameter, hex with a `0x` prefix or decimal
    #[allow(dead_code)]
    pub fn number(&self, key: &str) -> Result<Option<u32>, TargetError> {
        self.params
            .get(key)
            .map(|value| {
                parse_number(value).ok_or_else(|| TargetError::InvalidValue {
                    key: key.to_string(),
                    value: value.clone(),
                })
            })
            .transpose()
    }

    /// Boolean parameter (`1`/`0`, `true`/`false`, `yes`/`no`)
    #[allow(dead_code)]
    pub fn flag(&self, key: &str) -> Result<Option<bool>, TargetError> {
        self.params
            .get(key)
            .map(|value| match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(TargetError::InvalidValue {
                    key: key.to_string(),
                    value: value.clone(),
                }),
            })
            .transpose()
    }

    /// Reject any key outside `known`
    #[allow(dead_code)]
    fn check_keys(&self, known: &[&str]) -> Result<(), TargetError> {
        match self.params.keys().find(|k| !known.contains(&k.as_str())) {
            Some(key) => Err(TargetError::UnknownParam {
                target: self.name.clone(),
                key: key.clone(),
            }),
            None => Ok(()),
        }
    }
}

fn parse_number(s: &str) -> Option<u32> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).ok()
    } else {
        s.parse().ok()
    }
}

/// Parse a target string into name and parameters
///
/// Format: "name" or "name:key1=value1,key2=value2"
pub fn parse_target_params(s: &str) -> Result<TargetParams, TargetError> {
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));

    let mut params = HashMap::new();
    if !opts_str.is_empty() {
        for opt in opts_str.split(',') {
            if let Some((key, value)) = opt.split_once('=') {
                params.insert(key.to_string(), value.to_string());
            } else {
                return Err(TargetError::ParamFormat(opt.to_string()));
            }
        }
    }

    Ok(TargetParams {
        name: name.to_string(),
        params,
    })
}

/// Boxed transport for dynamic dispatch
pub type BoxedTarget = Box<dyn MemoryTransport>;

/// Open a target by its command line string
pub fn open_target(spec: &str) -> Result<(String, BoxedTarget), TargetError> {
    let params = parse_target_params(spec)?;

    let target = match params.name.as_str() {
        #[cfg(feature = "dummy")]
        "dummy" | "emulator" => open_dummy(&params)?,

        _ => return Err(TargetError::UnknownTarget(params.name)),
    };

    Ok((params.name, target))
}

#[cfg(feature = "dummy")]
fn open_dummy(params: &TargetParams) -> Result<BoxedTarget, TargetError> {
    use atflasher_dummy::{DummyConfig, DummyTarget};

    params.check_keys(&[
        "device_id",
        "flash_kb",
        "mask",
        "halted",
        "examined",
        "protected",
        "busy",
    ])?;

    let mut config = DummyConfig::default();
    if let Some(id) = params.number("device_id")? {
        config.device_id = id;
    }
    if let Some(kb) = params.number("flash_kb")? {
        config.flash_size_kb = u16::try_from(kb).map_err(|_| TargetError::InvalidValue {
            key: "flash_kb".into(),
            value: kb.to_string(),
        })?;
    }
    if let Some(mask) = params.number("mask")? {
        config.mask_revision = u8::try_from(mask).map_err(|_| TargetError::InvalidValue {
            key: "mask".into(),
            value: mask.to_string(),
        })?;
    }
    if let Some(halted) = params.flag("halted")? {
        config.halted = halted;
    }
    if let Some(examined) = params.flag("examined")? {
        config.examined = examined;
    }
    if let Some(protected) = params.flag("protected")? {
        config.write_protected = protected;
    }
    if let Some(busy) = params.number("busy")? {
        config.busy_cycles = busy;
    }

    log::info!(
        "Opening dummy target (id 0x{:08x}, {} kB)",
        config.device_id,
        config.flash_size_kb
    );
    Ok(Box::new(DummyTarget::new(config)))
}

/// Parse a bank string `<base>,<size>,<index>,<target>`
pub fn parse_bank_spec(spec: &str) -> Result<BankConfig, TargetError> {
    let fields: Vec<&str> = spec.split(',').collect();
    BankConfig::from_args(&fields).map_err(|source| TargetError::BankConfig {
        spec: spec.to_string(),
        source,
    })
}

/// Build the banks for an opened target
///
/// With no bank strings a single main bank 1 at index 0 is configured.
pub fn configure_banks(target_name: &str, specs: &[String]) -> Result<Vec<FlashBank>, TargetError> {
    if specs.is_empty() {
        let mut config = BankConfig::main_bank();
        config.target = target_name.to_string();
        return Ok(vec![FlashBank::new(config)]);
    }

    let mut banks: Vec<FlashBank> = Vec::with_capacity(specs.len());
    for spec in specs {
        let config = parse_bank_spec(spec)?;
        if config.target != target_name {
            return Err(TargetError::BankTarget {
                index: config.index,
                bank_target: config.target,
                target: target_name.to_string(),
            });
        }
        if banks.iter().any(|b| b.index() == config.index) {
            return Err(TargetError::DuplicateBank(config.index));
        }
        log::debug!("Configured bank {} at 0x{:08x}", config.index, config.base);
        banks.push(FlashBank::new(config));
    }
    Ok(banks)
}

/// An opened target and the flash banks configured on it
pub struct Session {
    /// Target name
    pub name: String,
    /// Memory transport
    pub target: BoxedTarget,
    /// Configured banks
    pub banks: Vec<FlashBank>,
}

impl Session {
    /// Open the target and configure its banks
    pub fn open(spec: &str, bank_specs: &[String]) -> Result<Self, TargetError> {
        let (name, target) = open_target(spec)?;
        let banks = configure_banks(&name, bank_specs)?;
        Ok(Self {
            name,
            target,
            banks,
        })
    }

    /// Bank by index together with the transport
    pub fn bank_mut(
        &mut self,
        index: u32,
    ) -> Result<(&mut FlashBank, &mut BoxedTarget), TargetError> {
        let bank = self
            .banks
            .iter_mut()
            .find(|b| b.index() == index)
            .ok_or(TargetError::NoSuchBank(index))?;
        Ok((bank, &mut self.target))
    }
}
