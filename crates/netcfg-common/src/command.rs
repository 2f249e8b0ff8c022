//! Transactional command executor.
//!
//! A [`CommandSequence`] holds an ordered list of [`Command`]s and drives
//! them through three phases:
//!
//! - [`CommandSequence::do_all`]: run every command in order. On the first
//!   failure the already-succeeded prefix is undone in reverse order and the
//!   original error is returned. Commands after the failing one are never
//!   touched.
//! - [`CommandSequence::end_all`]: finalize every command in order, stopping
//!   at the first failure without any undo.
//! - [`CommandSequence::undo_all`]: undo every command in reverse order.
//!   Failures are reported to the monitor and the sweep continues.
//!
//! Every step is reported to the sequence's monitor as
//! `(action, command, output)`. In dry-run mode the monitor sees each step
//! with empty output and nothing is executed.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;

use crate::error::{NetCfgError, NetCfgResult};
use crate::shell::Shell;

/// Lifecycle action of a transactional command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandAction {
    Do,
    End,
    Undo,
}

impl fmt::Display for CommandAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CommandAction::Do => "DO",
            CommandAction::End => "END",
            CommandAction::Undo => "UNDO",
        };
        f.write_str(s)
    }
}

/// One reversible operation.
#[async_trait]
pub trait Command: Send + Sync {
    /// Applies the operation.
    async fn do_command(&self) -> NetCfgResult<Vec<u8>>;

    /// Finalizes (persists) an applied operation.
    async fn end_command(&self) -> NetCfgResult<Vec<u8>>;

    /// Reverts an applied operation.
    async fn undo_command(&self) -> NetCfgResult<Vec<u8>>;

    /// Human readable line for the given action, used by monitors.
    fn line(&self, action: CommandAction) -> String;
}

/// Binds a Do, Undo and End shell to the three command actions.
///
/// A missing shell makes the corresponding action a no-op.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellCommand {
    do_shell: Option<Shell>,
    undo_shell: Option<Shell>,
    end_shell: Option<Shell>,
}

impl ShellCommand {
    pub fn new(do_shell: Option<Shell>, undo_shell: Option<Shell>, end_shell: Option<Shell>) -> Self {
        Self {
            do_shell,
            undo_shell,
            end_shell,
        }
    }

    /// Returns the shell bound to `action`, if any.
    pub fn shell(&self, action: CommandAction) -> Option<&Shell> {
        match action {
            CommandAction::Do => self.do_shell.as_ref(),
            CommandAction::End => self.end_shell.as_ref(),
            CommandAction::Undo => self.undo_shell.as_ref(),
        }
    }

    async fn exec(&self, action: CommandAction) -> NetCfgResult<Vec<u8>> {
        match self.shell(action) {
            Some(shell) => shell.exec().await,
            None => Ok(Vec::new()),
        }
    }
}

#[async_trait]
impl Command for ShellCommand {
    async fn do_command(&self) -> NetCfgResult<Vec<u8>> {
        self.exec(CommandAction::Do).await
    }

    async fn end_command(&self) -> NetCfgResult<Vec<u8>> {
        self.exec(CommandAction::End).await
    }

    async fn undo_command(&self) -> NetCfgResult<Vec<u8>> {
        self.exec(CommandAction::Undo).await
    }

    fn line(&self, action: CommandAction) -> String {
        match self.shell(action) {
            Some(shell) if !shell.is_empty() => shell.to_string(),
            _ => "-".to_string(),
        }
    }
}

/// Callback invoked for every executed (or dry-run) step.
pub type Monitor = Box<dyn FnMut(CommandAction, &dyn Command, &[u8]) + Send>;

fn log_monitor() -> Monitor {
    Box::new(|action: CommandAction, cmd: &dyn Command, output: &[u8]| {
        tracing::debug!(
            action = %action,
            command = %cmd.line(action),
            output = %String::from_utf8_lossy(output).trim(),
            "Command step"
        );
    })
}

/// Subsystem slots that must appear at most once per sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateType {
    /// FRR configuration backup/restore around vtysh commands.
    Vty,
    /// Kernel sysctl file.
    Sysctl,
    /// VRF definition file.
    SysVrf,
    /// netplan network file.
    Network,
    /// gobgpd configuration file backup/restore.
    Gobgp,
    /// Rendered gobgpd configuration.
    GobgpConfig,
}

/// Ordered, transactional batch of commands.
pub struct CommandSequence {
    commands: Vec<Box<dyn Command>>,
    slots: HashMap<UpdateType, usize>,
    monitor: Monitor,
    dry_run: bool,
}

impl Default for CommandSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CommandSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSequence")
            .field("len", &self.commands.len())
            .field("slots", &self.slots)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CommandSequence {
    /// Creates an empty sequence reporting steps through `tracing`.
    pub fn new() -> Self {
        Self::with_monitor(log_monitor())
    }

    pub fn with_monitor(monitor: Monitor) -> Self {
        Self {
            commands: Vec::new(),
            slots: HashMap::new(),
            monitor,
            dry_run: false,
        }
    }

    pub fn set_dry_run(&mut self, dry_run: bool) {
        self.dry_run = dry_run;
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Appends a command.
    pub fn add(&mut self, cmd: impl Command + 'static) {
        self.commands.push(Box::new(cmd));
    }

    /// Replaces the command at `pos`.
    pub fn set(&mut self, cmd: impl Command + 'static, pos: usize) -> NetCfgResult<()> {
        let len = self.commands.len();
        let slot = self.commands.get_mut(pos).ok_or_else(|| {
            NetCfgError::internal(format!("command position {} out of range ({})", pos, len))
        })?;
        *slot = Box::new(cmd);
        Ok(())
    }

    /// Appends `cmd` unless the `slot` already holds a command.
    ///
    /// Returns true when the command was added.
    pub fn once(&mut self, slot: UpdateType, cmd: impl Command + 'static) -> bool {
        if self.slots.contains_key(&slot) {
            return false;
        }
        self.slots.insert(slot, self.commands.len());
        self.add(cmd);
        true
    }

    /// Replaces the command held by `slot`, or appends it when the slot is
    /// empty.
    pub fn set_slot(&mut self, slot: UpdateType, cmd: impl Command + 'static) -> NetCfgResult<()> {
        match self.slots.get(&slot) {
            Some(&pos) => self.set(cmd, pos),
            None => {
                self.slots.insert(slot, self.commands.len());
                self.add(cmd);
                Ok(())
            }
        }
    }

    /// Position of the command held by `slot`.
    pub fn slot(&self, slot: UpdateType) -> Option<usize> {
        self.slots.get(&slot).copied()
    }

    /// Drops every command and slot. The monitor and dry-run flag are kept.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.slots.clear();
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> impl Iterator<Item = &dyn Command> {
        self.commands.iter().map(|cmd| cmd.as_ref())
    }

    /// Runs every command's Do action in order.
    ///
    /// On the first failure the succeeded prefix is undone in reverse order
    /// and the failing command's error is returned.
    pub async fn do_all(&mut self) -> NetCfgResult<()> {
        let Self {
            commands,
            monitor,
            dry_run,
            ..
        } = self;

        if *dry_run {
            for cmd in commands.iter() {
                monitor(CommandAction::Do, cmd.as_ref(), &[]);
            }
            return Ok(());
        }

        tracing::info!(count = commands.len(), "Applying commands");

        // commands[..done] have succeeded and are the only ones undone on
        // failure.
        let mut done = 0usize;
        for cmd in commands.iter() {
            match cmd.do_command().await {
                Ok(output) => {
                    monitor(CommandAction::Do, cmd.as_ref(), &output);
                    done += 1;
                }
                Err(e) => {
                    monitor(CommandAction::Do, cmd.as_ref(), e.output());
                    tracing::error!(
                        command = %cmd.line(CommandAction::Do),
                        error = %e,
                        rollback = done,
                        "Command failed, rolling back"
                    );
                    Self::undo_range(&commands[..done], monitor).await;
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    /// Runs every command's End action in order, stopping at the first
    /// failure. Nothing is undone.
    pub async fn end_all(&mut self) -> NetCfgResult<()> {
        let Self {
            commands,
            monitor,
            dry_run,
            ..
        } = self;

        for cmd in commands.iter() {
            if *dry_run {
                monitor(CommandAction::End, cmd.as_ref(), &[]);
                continue;
            }

            match cmd.end_command().await {
                Ok(output) => monitor(CommandAction::End, cmd.as_ref(), &output),
                Err(e) => {
                    monitor(CommandAction::End, cmd.as_ref(), e.output());
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    /// Runs every command's Undo action in reverse order. Failures are
    /// reported to the monitor and never stop the sweep.
    pub async fn undo_all(&mut self) {
        let Self {
            commands,
            monitor,
            dry_run,
            ..
        } = self;

        if *dry_run {
            for cmd in commands.iter().rev() {
                monitor(CommandAction::Undo, cmd.as_ref(), &[]);
            }
            return;
        }

        Self::undo_range(commands, monitor).await;
    }

    async fn undo_range(commands: &[Box<dyn Command>], monitor: &mut Monitor) {
        for cmd in commands.iter().rev() {
            match cmd.undo_command().await {
                Ok(output) => monitor(CommandAction::Undo, cmd.as_ref(), &output),
                Err(e) => {
                    tracing::warn!(
                        command = %cmd.line(CommandAction::Undo),
                        error = %e,
                        "Undo failed"
                    );
                    monitor(CommandAction::Undo, cmd.as_ref(), e.output());
                }
            }
        }
    }
}
