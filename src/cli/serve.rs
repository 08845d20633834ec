//! cli::serve
//!
//! Line-delimited JSON transport over stdio.
//!
//! # Protocol
//!
//! Each input line is one request, each output line one response:
//!
//! ```text
//! {"id": 7, "tool": "get_issue", "arguments": {"issue_number": 3}}
//! {"id": 7, "envelope": {"status": "success", "result": {...}}}
//! ```
//!
//! Every request runs on its own task, so responses can come back in a
//! different order; `id` is echoed verbatim for correlation. A line that is
//! not a valid request still gets a response, with `id` null when it could
//! not be read.

use std::sync::Arc;

use anyhow::Result;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};

use crate::envelope::{Envelope, ErrorKind};
use crate::forge::ClientFactory;
use crate::gateway::Gateway;

/// One request line.
#[derive(Debug, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Value,
    pub tool: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Encode one response line (without the newline).
pub fn response_line(id: &Value, envelope: &Envelope) -> String {
    json!({
        "id": id,
        "envelope": envelope.to_value(),
    })
    .to_string()
}

/// Parse a request line; a malformed one yields the response to send back.
fn parse_request(line: &str) -> Result<Request, String> {
    serde_json::from_str::<Request>(line).map_err(|e| {
        // Keep the id when only the rest of the request is wrong.
        let id = serde_json::from_str::<Value>(line)
            .ok()
            .and_then(|v| v.get("id").cloned())
            .unwrap_or(Value::Null);
        let envelope = Envelope::error(
            ErrorKind::InvalidArgument,
            format!("malformed request: {}", e),
        );
        response_line(&id, &envelope)
    })
}

/// Serve the process's stdin and stdout until stdin closes.
pub async fn serve_stdio<F>(gateway: Arc<Gateway<F>>) -> Result<()>
where
    F: ClientFactory + 'static,
{
    serve(
        gateway,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await
}

/// Serve requests from `input`, writing responses to `output`.
///
/// Returns once `input` is exhausted and every in-flight request has been
/// answered.
pub async fn serve<F, R, W>(gateway: Arc<Gateway<F>>, input: R, mut output: W) -> Result<()>
where
    F: ClientFactory + 'static,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    // Single writer so response lines never interleave.
    let writer = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            output.write_all(line.as_bytes()).await?;
            output.write_all(b"\n").await?;
            output.flush().await?;
        }
        Ok::<_, std::io::Error>(())
    });

    let mut tasks = JoinSet::new();
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let request = match parse_request(&line) {
            Ok(request) => request,
            Err(response) => {
                tracing::warn!("malformed request line");
                let _ = tx.send(response);
                continue;
            }
        };

        tracing::debug!(tool = %request.tool, id = %request.id, "request");
        let gateway = Arc::clone(&gateway);
        let tx = tx.clone();
        tasks.spawn(async move {
            let envelope = gateway.call(&request.tool, request.arguments).await;
            let _ = tx.send(response_line(&request.id, &envelope));
        });
        reap(&mut tasks);
    }

    while let Some(joined) = tasks.join_next().await {
        report(joined);
    }
    drop(tx);
    writer.await??;
    Ok(())
}

/// Drop finished request tasks without waiting; returns how many.
fn reap(tasks: &mut JoinSet<()>) -> usize {
    let mut reaped = 0;
    while let Some(joined) = tasks.try_join_next() {
        report(joined);
        reaped += 1;
    }
    reaped
}

fn report(joined: Result<(), JoinError>) {
    if let Err(err) = joined {
        tracing::error!(error = %err, "request task failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{OverrideSource, Resolver};
    use crate::forge::mock::{self, MockClientFactory, MockForge};

    #[test]
    fn response_echoes_id() {
        let envelope = Envelope::error(ErrorKind::NotFound, "gone");
        let line = response_line(&json!("req-1"), &envelope);
        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["id"], "req-1");
        assert_eq!(value["envelope"]["error"]["kind"], "not_found");
    }

    #[test]
    fn malformed_request_keeps_id() {
        let response = parse_request(r#"{"id": 4, "arguments": {}}"#).unwrap_err();
        let value: Value = serde_json::from_str(&response).unwrap();
        assert_eq!(value["id"], 4);
        assert_eq!(value["envelope"]["error"]["kind"], "invalid_argument");

        let response = parse_request("not json").unwrap_err();
        let value: Value = serde_json::from_str(&response).unwrap();
        assert!(value["id"].is_null());
    }

    #[tokio::test]
    async fn finished_tasks_are_reaped() {
        let mut tasks = JoinSet::new();
        for _ in 0..3 {
            tasks.spawn(async {});
        }
        tasks.spawn(async { panic!("boom") });

        let mut reaped = 0;
        while !tasks.is_empty() {
            tokio::task::yield_now().await;
            reaped += reap(&mut tasks);
        }
        assert_eq!(reaped, 4);
        assert_eq!(reap(&mut tasks), 0);
    }

    #[tokio::test]
    async fn answers_every_request() {
        let forge = MockForge::new().with_repository(mock::repository("acme/widgets"));
        let resolver = Resolver::new(vec![Arc::new(
            OverrideSource::new()
                .with("GITHUB_TOKEN", "ghp_1234567890")
                .with("GITHUB_REPOSITORY", "acme/widgets"),
        )]);
        let gateway = Arc::new(Gateway::new(resolver, MockClientFactory::new(forge)));

        let input = concat!(
            r#"{"id": 1, "tool": "get_repository", "arguments": {}}"#,
            "\n\n",
            r#"{"id": 2, "tool": "no_such_tool"}"#,
            "\n",
            "garbage\n",
        );
        let (client, server) = tokio::io::duplex(64 * 1024);
        serve(gateway, BufReader::new(input.as_bytes()), server)
            .await
            .unwrap();

        let mut out = String::new();
        let mut reader = BufReader::new(client);
        use tokio::io::AsyncReadExt;
        reader.read_to_string(&mut out).await.unwrap();

        let mut responses: Vec<Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(responses.len(), 3);
        responses.sort_by_key(|v| v["id"].as_i64().unwrap_or(0));
        assert!(responses[0]["id"].is_null());
        assert_eq!(responses[1]["envelope"]["status"], "success");
        assert_eq!(responses[2]["envelope"]["error"]["kind"], "invalid_argument");
    }
}
