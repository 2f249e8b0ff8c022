//! Backend emitters for netcfg.
//!
//! Each emitter is a [`Processor`](netcfg_model::Processor) that collects
//! the changed parts of a tree in its own backend syntax:
//!
//! - [`daemon_config`]: gobgpd TOML lines ([`GobgpConfig`])
//! - [`datastore`]: interface datastore mutations ([`InterfaceMutations`])
//! - [`cli`]: vtysh sessions ([`CliProcessor`], [`VtySession`])
//!
//! # Example
//!
//! ```ignore
//! use netcfg_emit::GobgpConfig;
//! use netcfg_model::process_network_instances;
//!
//! let mut gobgp = GobgpConfig::new();
//! process_network_instances(&mut gobgp, false, &nis)?;
//! std::fs::write("/etc/frr/gobgpd.toml", gobgp.bytes())?;
//! ```

pub mod cli;
pub mod daemon_config;
pub mod datastore;
pub mod error;

pub use cli::{vtysh_args, vtysh_instance_args, vtysh_save, CliProcessor, VtyBatch, VtySession};
pub use daemon_config::{merge_config, GobgpConfig};
pub use datastore::{InterfaceMutations, Mutation, MutationKind};
pub use error::{EmitError, EmitResult};
