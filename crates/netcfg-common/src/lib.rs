//! Common infrastructure for the netcfg configuration tools.
//!
//! This crate provides the pieces every tool shares:
//!
//! - [`changes`]: per-node change tracking ([`ChangeSet`])
//! - [`shell`]: one external command invocation ([`Shell`])
//! - [`command`]: transactional Do/End/Undo execution ([`CommandSequence`])
//! - [`remote`]: the remote execution boundary used by `cfgd`
//! - [`backup`]: per-subsystem backup/rollback/commit plans
//! - [`error`]: error types for all of the above
//!
//! # Example
//!
//! ```ignore
//! use netcfg_common::{BackupPlan, CommandSequence, ShellCommand, Shell, UpdateType};
//!
//! let mut cmds = CommandSequence::new();
//! cmds.once(UpdateType::Sysctl, BackupPlan::sysctl("/etc/sysctl.d/30-beluganos.conf").command());
//! cmds.add(ShellCommand::new(Some(Shell::new("/bin/true", ["x"])), None, None));
//! cmds.do_all().await?;
//! cmds.end_all().await?;
//! ```

pub mod backup;
pub mod changes;
pub mod command;
pub mod error;
pub mod remote;
pub mod shell;

// Re-export commonly used items at crate root
pub use backup::BackupPlan;
pub use changes::ChangeSet;
pub use command::{Command, CommandAction, CommandSequence, Monitor, ShellCommand, UpdateType};
pub use error::{NetCfgError, NetCfgResult};
pub use remote::{
    ExecResult, ExecuteReply, ExecuteRequest, Execution, LocalResponder, ProcessExecutor,
    RemoteExecutor, RemoteShellCommand,
};
pub use shell::Shell;
