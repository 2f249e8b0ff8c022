//! Recording mocks for the command executor and the remote boundary
//!
//! Mocks write one entry per invocation into a shared [`Journal`] so a test
//! can assert the exact order in which a sequence touched them.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use netcfg_common::{
    Command, CommandAction, ExecResult, ExecuteReply, ExecuteRequest, Execution, NetCfgError,
    NetCfgResult, RemoteExecutor,
};

/// Shared, ordered log of invocations
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: impl Into<String>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry.into());
        }
    }

    /// Snapshot of every entry so far
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

/// Command with scripted per-action failures
///
/// Every invocation is journaled as `<name>.<do|end|undo>`, whether it
/// fails or not. A successful invocation returns the command name as its
/// output.
#[derive(Debug, Clone)]
pub struct RecordingCommand {
    name: String,
    failures: HashSet<CommandAction>,
    journal: Journal,
}

impl RecordingCommand {
    pub fn new(name: impl Into<String>, journal: &Journal) -> Self {
        Self {
            name: name.into(),
            failures: HashSet::new(),
            journal: journal.clone(),
        }
    }

    /// Make `action` fail
    pub fn failing(mut self, action: CommandAction) -> Self {
        self.failures.insert(action);
        self
    }

    fn invoke(&self, action: CommandAction) -> NetCfgResult<Vec<u8>> {
        let action_name = action.to_string().to_lowercase();
        self.journal.record(format!("{}.{}", self.name, action_name));
        if self.failures.contains(&action) {
            return Err(NetCfgError::ShellCommandFailed {
                command: self.line(action),
                exit_code: 1,
                output: format!("{} failed", self.name),
            });
        }
        Ok(self.name.as_bytes().to_vec())
    }
}

#[async_trait]
impl Command for RecordingCommand {
    async fn do_command(&self) -> NetCfgResult<Vec<u8>> {
        self.invoke(CommandAction::Do)
    }

    async fn end_command(&self) -> NetCfgResult<Vec<u8>> {
        self.invoke(CommandAction::End)
    }

    async fn undo_command(&self) -> NetCfgResult<Vec<u8>> {
        self.invoke(CommandAction::Undo)
    }

    fn line(&self, action: CommandAction) -> String {
        format!("{} {}", self.name, action)
    }
}

/// Remote executor that runs nothing
///
/// Each shell is journaled by its command line and answered with that line
/// as output. Shells whose line contains one of the scripted patterns fail,
/// which truncates the reply exactly like a real responder.
#[derive(Debug, Clone, Default)]
pub struct RecordingExecutor {
    fail_on: Vec<String>,
    journal: Journal,
}

impl RecordingExecutor {
    pub fn new(journal: &Journal) -> Self {
        Self {
            fail_on: Vec::new(),
            journal: journal.clone(),
        }
    }

    /// Fail any shell whose command line contains `pattern`
    pub fn failing_on(mut self, pattern: impl Into<String>) -> Self {
        self.fail_on.push(pattern.into());
        self
    }
}

#[async_trait]
impl RemoteExecutor for RecordingExecutor {
    async fn execute(&self, request: &ExecuteRequest) -> Execution {
        let mut reply = ExecuteReply::default();

        for shell in &request.shells {
            let line = shell.to_string();
            self.journal.record(line.clone());
            reply.results.push(ExecResult::new(line.as_bytes()));

            if self.fail_on.iter().any(|p| line.contains(p.as_str())) {
                let message = format!("scripted failure: {}", line);
                reply.error = Some(message.clone());
                let error = NetCfgError::remote(reply.results.len(), message, line);
                return Execution {
                    reply,
                    error: Some(error),
                };
            }
        }

        Execution { reply, error: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netcfg_common::Shell;

    #[tokio::test]
    async fn test_recording_command() {
        let journal = Journal::new();
        let cmd = RecordingCommand::new("a", &journal).failing(CommandAction::Undo);

        assert_eq!(cmd.do_command().await.unwrap(), b"a");
        tokio_test::assert_err!(cmd.undo_command().await);
        assert_eq!(journal.entries(), vec!["a.do", "a.undo"]);
    }

    #[tokio::test]
    async fn test_recording_executor_truncates_at_failure() {
        let journal = Journal::new();
        let executor = RecordingExecutor::new(&journal).failing_on("two");
        let request = ExecuteRequest::new(vec![
            Shell::new("echo", ["one"]),
            Shell::new("echo", ["two"]),
            Shell::new("echo", ["three"]),
        ]);

        let execution = executor.execute(&request).await;
        assert_eq!(execution.reply.results.len(), 2);
        assert!(execution.reply.error.is_some());
        assert!(matches!(
            execution.error,
            Some(NetCfgError::Remote { completed: 2, .. })
        ));
        assert_eq!(journal.entries(), vec!["echo one", "echo two"]);
    }
}
