//! Remote execution boundary.
//!
//! A caller batches [`Shell`]s into an [`ExecuteRequest`]; a responder runs
//! them strictly in order and stops at the first failure. The reply holds
//! every result obtained so far, including the failing one, so the caller
//! knows exactly which steps ran.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command as Process;

use crate::command::{Command, CommandAction, ShellCommand};
use crate::error::{NetCfgError, NetCfgResult};
use crate::shell::{communicate, Shell};

/// Ordered batch of shells to run remotely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub shells: Vec<Shell>,
}

impl ExecuteRequest {
    pub fn new(shells: Vec<Shell>) -> Self {
        Self { shells }
    }
}

/// Captured output of one executed shell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecResult {
    pub output: String,
}

impl ExecResult {
    pub fn new(output: &[u8]) -> Self {
        Self {
            output: String::from_utf8_lossy(output).into_owned(),
        }
    }

    /// Output split into lines.
    pub fn lines(&self) -> Vec<&str> {
        self.output.split('\n').collect()
    }
}

/// Results of an [`ExecuteRequest`], truncated at the first failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteReply {
    pub results: Vec<ExecResult>,
    /// Failure that stopped the batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Reply plus the typed error that stopped the batch, if any.
#[derive(Debug)]
pub struct Execution {
    pub reply: ExecuteReply,
    pub error: Option<NetCfgError>,
}

impl Execution {
    pub fn into_result(self) -> NetCfgResult<ExecuteReply> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.reply),
        }
    }
}

/// Runs a batch of shells on behalf of a caller.
#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    async fn execute(&self, request: &ExecuteRequest) -> Execution;
}

/// Executes requests in-process.
///
/// This is the responder side of the boundary: `cfgd` wraps it, and tests
/// use it directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalResponder;

#[async_trait]
impl RemoteExecutor for LocalResponder {
    async fn execute(&self, request: &ExecuteRequest) -> Execution {
        let mut reply = ExecuteReply::default();

        for shell in &request.shells {
            match shell.exec().await {
                Ok(output) => reply.results.push(ExecResult::new(&output)),
                Err(e) => {
                    tracing::error!(command = %shell, error = %e, "Execute failed");
                    reply.results.push(ExecResult::new(e.output()));
                    reply.error = Some(e.to_string());
                    return Execution {
                        reply,
                        error: Some(e),
                    };
                }
            }
        }

        Execution { reply, error: None }
    }
}

/// Sends requests to a `cfgd` process over stdin/stdout as JSON.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    program: String,
    args: Vec<String>,
}

impl ProcessExecutor {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    async fn call(&self, request: &ExecuteRequest) -> NetCfgResult<(ExecuteReply, Option<i32>)> {
        let payload = serde_json::to_vec(request)?;
        let spawn_err = |e: std::io::Error| NetCfgError::ShellExec {
            command: self.program.clone(),
            source: e,
        };

        let child = Process::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(spawn_err)?;

        let output = communicate(child, Some(&payload))
            .await
            .map_err(spawn_err)?;
        let reply: ExecuteReply = serde_json::from_slice(&output.stdout)?;
        let code = if output.status.success() {
            None
        } else {
            Some(output.status.code().unwrap_or(-1))
        };
        Ok((reply, code))
    }
}

#[async_trait]
impl RemoteExecutor for ProcessExecutor {
    async fn execute(&self, request: &ExecuteRequest) -> Execution {
        match self.call(request).await {
            Ok((reply, code)) => {
                let error = match (&reply.error, code) {
                    (None, None) => None,
                    (message, code) => {
                        let message = message
                            .clone()
                            .unwrap_or_else(|| format!("exit code {}", code.unwrap_or(-1)));
                        let output = reply
                            .results
                            .last()
                            .map(|r| r.output.clone())
                            .unwrap_or_default();
                        Some(NetCfgError::remote(reply.results.len(), message, output))
                    }
                };
                Execution { reply, error }
            }
            Err(e) => Execution {
                reply: ExecuteReply::default(),
                error: Some(e),
            },
        }
    }
}

/// A [`ShellCommand`] whose shells run through a [`RemoteExecutor`].
#[derive(Clone)]
pub struct RemoteShellCommand {
    shells: ShellCommand,
    executor: Arc<dyn RemoteExecutor>,
}

impl RemoteShellCommand {
    pub fn new(shells: ShellCommand, executor: Arc<dyn RemoteExecutor>) -> Self {
        Self { shells, executor }
    }

    async fn run(&self, action: CommandAction) -> NetCfgResult<Vec<u8>> {
        let shell = match self.shells.shell(action) {
            Some(shell) if !shell.is_empty() => shell.clone(),
            _ => return Ok(Vec::new()),
        };

        let reply = self
            .executor
            .execute(&ExecuteRequest::new(vec![shell]))
            .await
            .into_result()?;

        Ok(reply
            .results
            .into_iter()
            .next()
            .map(|r| r.output.into_bytes())
            .unwrap_or_default())
    }
}

#[async_trait]
impl Command for RemoteShellCommand {
    async fn do_command(&self) -> NetCfgResult<Vec<u8>> {
        self.run(CommandAction::Do).await
    }

    async fn end_command(&self) -> NetCfgResult<Vec<u8>> {
        self.run(CommandAction::End).await
    }

    async fn undo_command(&self) -> NetCfgResult<Vec<u8>> {
        self.run(CommandAction::Undo).await
    }

    fn line(&self, action: CommandAction) -> String {
        self.shells.line(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Shell {
        Shell::new("sh", ["-c", script])
    }

    #[tokio::test]
    async fn test_local_responder_all_succeed() {
        let request = ExecuteRequest::new(vec![sh("echo one"), sh("echo two")]);
        let execution = LocalResponder.execute(&request).await;

        assert!(execution.error.is_none());
        let outputs: Vec<&str> = execution
            .reply
            .results
            .iter()
            .map(|r| r.output.as_str())
            .collect();
        assert_eq!(outputs, vec!["one\n", "two\n"]);
    }

    #[tokio::test]
    async fn test_local_responder_stops_at_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("third-ran");
        let request = ExecuteRequest::new(vec![
            sh("echo ok"),
            sh("echo bad; exit 2"),
            sh(&format!("touch {}", marker.display())),
        ]);

        let execution = LocalResponder.execute(&request).await;

        assert_eq!(execution.reply.results.len(), 2);
        assert_eq!(execution.reply.results[0].output, "ok\n");
        assert_eq!(execution.reply.results[1].output, "bad");
        assert!(execution.reply.error.is_some());
        assert!(matches!(
            execution.error,
            Some(NetCfgError::ShellCommandFailed { exit_code: 2, .. })
        ));
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_process_executor_streams_large_request() {
        // Echoes the request back inside the reply while still reading it.
        let responder = ProcessExecutor::new(
            "sh",
            ["-c", r#"printf '{"results":[],"request":'; cat; printf '}'"#],
        );
        let big = Shell::new("/usr/bin/tee", ["/dev/null"]).with_input(vec![b'a'; 1 << 20]);
        let request = ExecuteRequest::new(vec![big]);

        let execution = tokio::time::timeout(
            std::time::Duration::from_secs(10),
            responder.execute(&request),
        )
        .await
        .expect("responder should finish");

        assert!(execution.error.is_none());
        assert!(execution.reply.results.is_empty());
    }

    #[tokio::test]
    async fn test_process_executor_reports_exit_code() {
        let responder = ProcessExecutor::new("sh", ["-c", r#"cat >/dev/null; printf '{"results":[]}'; exit 4"#]);
        let execution = responder.execute(&ExecuteRequest::default()).await;

        let err = execution.error.expect("non-zero exit is an error");
        assert!(err.to_string().contains("exit code 4"));
    }

    #[test]
    fn test_result_lines() {
        let result = ExecResult::new(b"a\nb");
        assert_eq!(result.lines(), vec!["a", "b"]);
    }

    #[test]
    fn test_reply_wire_format() {
        let reply = ExecuteReply {
            results: vec![ExecResult::new(b"done")],
            error: None,
        };
        let json = serde_json::to_string(&reply).unwrap();
        assert_eq!(json, r#"{"results":[{"output":"done"}]}"#);
        let back: ExecuteReply = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reply);
    }

    #[tokio::test]
    async fn test_remote_shell_command_uses_executor() {
        let cmd = RemoteShellCommand::new(
            ShellCommand::new(Some(sh("echo applied")), None, None),
            Arc::new(LocalResponder),
        );

        assert_eq!(cmd.do_command().await.unwrap(), b"applied\n");
        assert!(cmd.undo_command().await.unwrap().is_empty());
        assert_eq!(cmd.line(CommandAction::Undo), "-");
    }

    #[tokio::test]
    async fn test_remote_shell_command_propagates_failure() {
        let cmd = RemoteShellCommand::new(
            ShellCommand::new(Some(sh("echo nope; exit 1")), None, None),
            Arc::new(LocalResponder),
        );

        let err = cmd.do_command().await.unwrap_err();
        assert_eq!(err.output(), b"nope");
    }
}
