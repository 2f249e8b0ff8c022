//! Configuration file support for ncmd
//!
//! Loads and validates ncmd configuration from TOML files.
//! Default location: /etc/beluganos/ncmd.toml

use crate::error::{NcmdError, NcmdResult};
use netcfg_common::shell::{SYSTEMCTL_CMD, VTYSH_CMD};
use netcfg_common::Shell;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/beluganos/ncmd.toml";

/// What to do with frr when a vtysh change is rolled back
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoRestart {
    /// Leave frr running with whatever it has
    #[default]
    None,
    /// `systemctl restart frr`
    Restart,
    /// `systemctl reload frr`
    Reload,
}

impl AutoRestart {
    /// Shell that brings frr back to its saved config, if any
    pub fn shell(&self) -> Option<Shell> {
        match self {
            AutoRestart::None => None,
            AutoRestart::Restart => Some(Shell::new(SYSTEMCTL_CMD, ["restart", "frr"])),
            AutoRestart::Reload => Some(Shell::new(SYSTEMCTL_CMD, ["reload", "frr"])),
        }
    }
}

/// Where request shells run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorMode {
    /// In this process
    #[default]
    Local,
    /// Through a `cfgd` child process
    Cfgd,
}

/// FRR configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrrConfig {
    #[serde(default)]
    pub auto_restart: AutoRestart,

    /// vtysh binary
    #[serde(default = "default_vtysh")]
    pub vtysh: String,

    /// Saved frr config file
    #[serde(default = "default_frr_config_path")]
    pub config_path: String,

    /// Network instance served by vtysh without `-N`
    #[serde(default = "default_instance")]
    pub default_instance: String,
}

/// gobgpd configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GobgpdConfig {
    /// Rendered gobgpd config file
    #[serde(default = "default_gobgp_config_path")]
    pub config_path: String,

    /// Restart the service on commit and rollback
    #[serde(default = "default_gobgp_restart")]
    pub restart: bool,

    /// systemd unit of gobgpd
    #[serde(default = "default_gobgp_service")]
    pub service: String,
}

/// A managed file with no other settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathConfig {
    pub path: String,
}

/// Executor configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default)]
    pub mode: ExecutorMode,

    /// cfgd binary, used in `cfgd` mode
    #[serde(default = "default_cfgd_path")]
    pub cfgd_path: String,

    /// Report every step and run nothing
    #[serde(default)]
    pub dry_run: bool,
}

/// Complete ncmd configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NcmdConfig {
    #[serde(default)]
    pub frr: FrrConfig,

    #[serde(default)]
    pub gobgp: GobgpdConfig,

    #[serde(default = "default_sysctl")]
    pub sysctl: PathConfig,

    #[serde(default = "default_vrf")]
    pub vrf: PathConfig,

    #[serde(default = "default_network")]
    pub network: PathConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,
}

// Default functions
fn default_vtysh() -> String {
    VTYSH_CMD.to_string()
}

fn default_frr_config_path() -> String {
    "/etc/frr/frr.conf".to_string()
}

fn default_instance() -> String {
    "mic".to_string()
}

fn default_gobgp_config_path() -> String {
    "/etc/frr/gobgpd.toml".to_string()
}

fn default_gobgp_restart() -> bool {
    true
}

fn default_gobgp_service() -> String {
    "gobgpd".to_string()
}

fn default_cfgd_path() -> String {
    "/usr/bin/cfgd".to_string()
}

fn default_sysctl() -> PathConfig {
    PathConfig {
        path: "/etc/sysctl.d/30-beluganos.conf".to_string(),
    }
}

fn default_vrf() -> PathConfig {
    PathConfig {
        path: "/etc/vrf.conf".to_string(),
    }
}

fn default_network() -> PathConfig {
    PathConfig {
        path: "/etc/netplan/02-beluganos.yaml".to_string(),
    }
}

// Default implementations
impl Default for FrrConfig {
    fn default() -> Self {
        Self {
            auto_restart: AutoRestart::default(),
            vtysh: default_vtysh(),
            config_path: default_frr_config_path(),
            default_instance: default_instance(),
        }
    }
}

impl Default for GobgpdConfig {
    fn default() -> Self {
        Self {
            config_path: default_gobgp_config_path(),
            restart: default_gobgp_restart(),
            service: default_gobgp_service(),
        }
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            mode: ExecutorMode::default(),
            cfgd_path: default_cfgd_path(),
            dry_run: false,
        }
    }
}

impl Default for NcmdConfig {
    fn default() -> Self {
        Self {
            frr: FrrConfig::default(),
            gobgp: GobgpdConfig::default(),
            sysctl: default_sysctl(),
            vrf: default_vrf(),
            network: default_network(),
            executor: ExecutorConfig::default(),
        }
    }
}

impl NcmdConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> NcmdResult<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                NcmdError::configuration(format!(
                    "Failed to parse config file {}: {}",
                    path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(NcmdError::io(path, e)),
        }
    }

    /// Load from default location or defaults
    pub fn load() -> NcmdResult<Self> {
        Self::load_or_default(DEFAULT_CONFIG_PATH)
    }

    /// Validate configuration
    pub fn validate(&self) -> NcmdResult<()> {
        let paths = [
            ("frr.vtysh", &self.frr.vtysh),
            ("frr.config_path", &self.frr.config_path),
            ("frr.default_instance", &self.frr.default_instance),
            ("gobgp.config_path", &self.gobgp.config_path),
            ("gobgp.service", &self.gobgp.service),
            ("sysctl.path", &self.sysctl.path),
            ("vrf.path", &self.vrf.path),
            ("network.path", &self.network.path),
        ];
        for (field, value) in paths {
            if value.is_empty() {
                return Err(NcmdError::configuration(format!(
                    "{} must not be empty",
                    field
                )));
            }
        }

        if self.executor.mode == ExecutorMode::Cfgd && self.executor.cfgd_path.is_empty() {
            return Err(NcmdError::configuration(
                "executor.cfgd_path must not be empty in cfgd mode",
            ));
        }

        Ok(())
    }
}
