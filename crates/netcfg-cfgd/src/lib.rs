//! cfgd - remote shell responder
//!
//! `cfgd` is the far side of the remote execution boundary. It reads one
//! JSON [`ExecuteRequest`] from its input, runs the shells in order through
//! a [`RemoteExecutor`] and writes the JSON [`ExecuteReply`] to its output.
//! A reply carrying an error is still written in full; the caller decides
//! what to do with the partial results.

use anyhow::Context;
use async_trait::async_trait;
use netcfg_common::{ExecResult, ExecuteReply, ExecuteRequest, Execution, RemoteExecutor};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

/// Responder that logs each shell and runs nothing.
///
/// Every shell is answered with empty output.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunResponder;

#[async_trait]
impl RemoteExecutor for DryRunResponder {
    async fn execute(&self, request: &ExecuteRequest) -> Execution {
        let mut reply = ExecuteReply::default();
        for shell in &request.shells {
            info!(command = %shell, "dry-run");
            reply.results.push(ExecResult::default());
        }
        Execution { reply, error: None }
    }
}

/// Reads a whole request from `input`.
pub async fn read_request<R>(mut input: R) -> anyhow::Result<ExecuteRequest>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    input
        .read_to_end(&mut buf)
        .await
        .context("failed to read request")?;
    serde_json::from_slice(&buf).context("failed to parse request")
}

/// Writes `reply` to `output` as one JSON document.
pub async fn write_reply<W>(mut output: W, reply: &ExecuteReply) -> anyhow::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let payload = serde_json::to_vec(reply).context("failed to encode reply")?;
    output
        .write_all(&payload)
        .await
        .context("failed to write reply")?;
    output.flush().await.context("failed to flush reply")?;
    Ok(())
}

/// Serves one request: read, execute, write.
///
/// Returns the reply that was written. A failed shell is not an error of
/// this function; it shows up in [`ExecuteReply::error`].
pub async fn respond<R, W>(
    executor: &dyn RemoteExecutor,
    input: R,
    output: W,
) -> anyhow::Result<ExecuteReply>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let request = read_request(input).await?;
    info!(shells = request.shells.len(), "Executing request");

    let Execution { reply, error } = executor.execute(&request).await;
    match &error {
        Some(e) => warn!(
            completed = reply.results.len(),
            error = %e,
            "Request stopped at first failure"
        ),
        None => debug!(completed = reply.results.len(), "Request complete"),
    }

    write_reply(output, &reply).await?;
    Ok(reply)
}
