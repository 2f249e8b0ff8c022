//! Shell command primitive.
//!
//! A [`Shell`] captures exactly one external invocation: a program, its
//! argument vector and optional bytes fed to its stdin. It is a plain value;
//! executing it never mutates it and never retries.
//!
//! # Example
//!
//! ```ignore
//! use netcfg_common::shell::{Shell, SYSCTL_CMD};
//!
//! let reload = Shell::new(SYSCTL_CMD, ["-p", "/etc/sysctl.d/30-beluganos.conf"]);
//! let output = reload.exec().await?;
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::process::{Output, Stdio};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};

use crate::error::{NetCfgError, NetCfgResult};

/// Path to the `vtysh` FRRouting shell.
pub const VTYSH_CMD: &str = "/usr/bin/vtysh";

/// Path to the `cp` command used for config backups.
pub const CP_CMD: &str = "/bin/cp";

/// Path to the `rm` command used to drop config backups.
pub const RM_CMD: &str = "/bin/rm";

/// Path to the `tee` command used to write rendered config files.
pub const TEE_CMD: &str = "/usr/bin/tee";

/// Path to the `systemctl` service manager.
pub const SYSTEMCTL_CMD: &str = "/bin/systemctl";

/// Path to the `sysctl` command.
pub const SYSCTL_CMD: &str = "/sbin/sysctl";

/// Path to the `netplan` command.
pub const NETPLAN_CMD: &str = "/usr/sbin/netplan";

/// Regex for characters that need escaping in shell double-quotes.
/// Matches: $, `, ", \, and newline
static SHELL_ESCAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([$`"\\\n])"#).expect("Invalid regex pattern"));

/// Characters that make an argument ambiguous when printed bare.
static SHELL_SPECIAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\s$`"'\\|&;<>()*?#]"#).expect("Invalid regex pattern"));

/// Quotes a string for safe use in shell commands.
///
/// The string is wrapped in double quotes and `$`, `` ` ``, `"`, `\` and
/// newline are escaped.
///
/// ```
/// use netcfg_common::shell::shellquote;
///
/// assert_eq!(shellquote("simple"), "\"simple\"");
/// assert_eq!(shellquote("with$var"), "\"with\\$var\"");
/// ```
pub fn shellquote(s: &str) -> String {
    let escaped = SHELL_ESCAPE_RE.replace_all(s, r"\$1");
    format!("\"{}\"", escaped)
}

/// Returns `arg` bare when the shell reads it as one word, quoted otherwise.
pub fn shellword(arg: &str) -> String {
    if arg.is_empty() || SHELL_SPECIAL_RE.is_match(arg) {
        shellquote(arg)
    } else {
        arg.to_string()
    }
}

/// One external command invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shell {
    /// Program to run. An empty program makes the shell a no-op.
    pub program: String,
    /// Argument vector, passed without shell interpretation.
    #[serde(default)]
    pub args: Vec<String>,
    /// Bytes written to the program's stdin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Vec<u8>>,
}

impl Shell {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            input: None,
        }
    }

    /// Attaches stdin bytes to the invocation.
    pub fn with_input(mut self, input: impl Into<Vec<u8>>) -> Self {
        self.input = Some(input.into());
        self
    }

    /// True for a shell that runs nothing.
    pub fn is_empty(&self) -> bool {
        self.program.is_empty()
    }

    /// Runs the command and returns its combined stdout and stderr.
    ///
    /// An empty shell returns empty output. A non-zero exit is returned as
    /// [`NetCfgError::ShellCommandFailed`] carrying the captured output.
    pub async fn exec(&self) -> NetCfgResult<Vec<u8>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }

        let line = self.to_string();
        tracing::debug!(command = %line, "Executing shell command");

        let stdin = if self.input.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        };

        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| NetCfgError::ShellExec {
                command: line.clone(),
                source: e,
            })?;

        let output = communicate(child, self.input.as_deref())
            .await
            .map_err(|e| NetCfgError::ShellExec {
                command: line.clone(),
                source: e,
            })?;

        let mut combined = output.stdout;
        combined.extend_from_slice(&output.stderr);

        if output.status.success() {
            tracing::debug!(command = %line, "Command succeeded");
            return Ok(combined);
        }

        let exit_code = output.status.code().unwrap_or(-1);
        let text = String::from_utf8_lossy(&combined).trim().to_string();
        tracing::warn!(
            command = %line,
            exit_code = exit_code,
            output = %text,
            "Command failed"
        );

        Err(NetCfgError::ShellCommandFailed {
            command: line,
            exit_code,
            output: text,
        })
    }
}

/// Feeds `input` to the child's stdin while its stdout and stderr are
/// drained, then waits for it to exit. Stdin is closed once the input is
/// written. A child that exits without reading all of it is not an error.
pub(crate) async fn communicate(mut child: Child, input: Option<&[u8]>) -> io::Result<Output> {
    let stdin = child.stdin.take();
    let feed = async move {
        if let (Some(input), Some(mut pipe)) = (input, stdin) {
            match pipe.write_all(input).await {
                Err(e) if e.kind() != io::ErrorKind::BrokenPipe => return Err(e),
                _ => {}
            }
        }
        Ok::<(), io::Error>(())
    };

    let (fed, output) = tokio::join!(feed, child.wait_with_output());
    fed?;
    output
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", shellword(arg))?;
        }
        Ok(())
    }
}
