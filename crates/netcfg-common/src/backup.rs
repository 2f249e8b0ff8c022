//! Backup, rollback and commit of managed configuration files.
//!
//! Each subsystem (FRR, gobgpd, sysctl, VRF, netplan) keeps its own backup
//! next to the file it manages. A [`BackupPlan`] renders into a single
//! [`ShellCommand`]:
//!
//! - Do: `cp -f <path> <path>.backup`, or drop a stale backup when the file
//!   does not exist yet
//! - Undo: `cp -f <path>.backup <path>` (or `rm -f <path>` when there was no
//!   file to back up) followed by the subsystem's restore hooks
//! - End: the subsystem's reload hooks followed by `rm -f <path>.backup`
//!
//! A missing backup after Do records that the file was absent.
//! Plans are never merged across subsystems.

use crate::command::ShellCommand;
use crate::shell::{shellword, Shell, CP_CMD, NETPLAN_CMD, RM_CMD, SYSCTL_CMD, SYSTEMCTL_CMD};

/// Suffix appended to a managed file to name its backup.
pub const BACKUP_SUFFIX: &str = ".backup";

/// Shell used to chain several steps into one action.
const SH_CMD: &str = "/bin/sh";

/// Returns the backup path for `path`.
pub fn backup_path(path: &str) -> String {
    format!("{}{}", path, BACKUP_SUFFIX)
}

/// Backup/rollback/commit steps for one managed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupPlan {
    path: String,
    restore_file: bool,
    on_undo: Vec<Shell>,
    on_commit: Vec<Shell>,
}

impl BackupPlan {
    /// Plan that restores the file on undo and only drops the backup on
    /// commit.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            restore_file: true,
            on_undo: Vec::new(),
            on_commit: Vec::new(),
        }
    }

    /// Adds a step run after the file is restored.
    pub fn on_undo(mut self, shell: Shell) -> Self {
        self.on_undo.push(shell);
        self
    }

    /// Adds a step run before the backup is removed.
    pub fn on_commit(mut self, shell: Shell) -> Self {
        self.on_commit.push(shell);
        self
    }

    /// Leaves the managed file alone on undo; only the undo hooks run.
    pub fn keep_file_on_undo(mut self) -> Self {
        self.restore_file = false;
        self
    }

    /// `sysctl -p <path>` on commit.
    pub fn sysctl(path: impl Into<String>) -> Self {
        let path = path.into();
        let load = Shell::new(SYSCTL_CMD, ["-p", path.as_str()]);
        Self::new(path).on_commit(load)
    }

    /// `systemctl restart vrf` on commit.
    pub fn vrf(path: impl Into<String>) -> Self {
        Self::new(path).on_commit(Shell::new(SYSTEMCTL_CMD, ["restart", "vrf"]))
    }

    /// `netplan apply` on commit.
    pub fn network(path: impl Into<String>) -> Self {
        Self::new(path).on_commit(Shell::new(NETPLAN_CMD, ["apply"]))
    }

    /// gobgpd config. With `restart`, the service restarts on undo and on
    /// commit; otherwise the daemon is expected to pick the file up itself.
    pub fn gobgp(path: impl Into<String>, service: &str, restart: bool) -> Self {
        let plan = Self::new(path);
        if !restart {
            return plan;
        }
        let restart = Shell::new(SYSTEMCTL_CMD, ["restart", service]);
        plan.on_undo(restart.clone()).on_commit(restart)
    }

    /// FRR config. vtysh edits only touch the running config, so undo
    /// leaves the file in place and runs `restore` (a restart or reload of
    /// frr) when given; commit saves the running config with `write file`.
    pub fn frr(path: impl Into<String>, vtysh: &str, restore: Option<Shell>) -> Self {
        let mut plan = Self::new(path)
            .keep_file_on_undo()
            .on_commit(Shell::new(vtysh, ["-c", "write file"]));
        if let Some(restore) = restore {
            plan = plan.on_undo(restore);
        }
        plan
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn backup_path(&self) -> String {
        backup_path(&self.path)
    }

    /// `cp -f <path> <backup>` if the file exists, `rm -f <backup>` if not.
    pub fn backup_shell(&self) -> Shell {
        script(&self.backup_script())
    }

    /// `cp -f <backup> <path>` if a backup exists, `rm -f <path>` if not.
    pub fn rollback_shell(&self) -> Shell {
        script(&self.rollback_script())
    }

    /// `rm -f <backup>`
    pub fn remove_shell(&self) -> Shell {
        Shell::new(RM_CMD, ["-f".to_string(), self.backup_path()])
    }

    fn backup_script(&self) -> String {
        let backup = self.backup_path();
        if_exists(
            &self.path,
            &Shell::new(CP_CMD, ["-f", self.path.as_str(), backup.as_str()]),
            &self.remove_shell(),
        )
    }

    fn rollback_script(&self) -> String {
        let backup = self.backup_path();
        if_exists(
            &backup,
            &Shell::new(CP_CMD, ["-f", backup.as_str(), self.path.as_str()]),
            &Shell::new(RM_CMD, ["-f", self.path.as_str()]),
        )
    }

    /// Renders the plan into one transactional command.
    pub fn command(&self) -> ShellCommand {
        let mut undo = Vec::new();
        if self.restore_file {
            undo.push(Step::Script(self.rollback_script()));
        }
        undo.extend(self.on_undo.iter().cloned().map(Step::Run));

        let mut end: Vec<Step> = self.on_commit.iter().cloned().map(Step::Run).collect();
        end.push(Step::Run(self.remove_shell()));

        ShellCommand::new(
            Some(self.backup_shell()),
            chain(&undo),
            chain(&end),
        )
    }
}

/// One part of a chained action.
#[derive(Debug, Clone)]
enum Step {
    Run(Shell),
    Script(String),
}

impl Step {
    fn text(&self) -> String {
        match self {
            Step::Run(shell) => shell.to_string(),
            Step::Script(script) => script.clone(),
        }
    }
}

/// `if [ -e <path> ]; then <then>; else <otherwise>; fi`
fn if_exists(path: &str, then: &Shell, otherwise: &Shell) -> String {
    format!(
        "if [ -e {} ]; then {}; else {}; fi",
        shellword(path),
        then,
        otherwise
    )
}

fn script(text: &str) -> Shell {
    Shell::new(SH_CMD, ["-c", text])
}

/// Joins steps into one `/bin/sh -c "a && b"` invocation.
fn chain(steps: &[Step]) -> Option<Shell> {
    match steps {
        [] => None,
        [Step::Run(one)] => Some(one.clone()),
        many => Some(script(&many.iter().map(Step::text).collect::<Vec<_>>().join(" && "))),
    }
}
