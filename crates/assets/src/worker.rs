//! Request/response boundary for running scans away from the caller.
//!
//! [`ScanWorker`] owns a scanner on a tokio task and answers one request at a
//! time over a channel. [`serve_lines`] exposes the same worker as a
//! JSON-lines loop so a host can run it in a separate process.

use crate::node::AssetNode;
use crate::scanner::AssetScanner;
use crate::{AssetError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};

const QUEUE_DEPTH: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub root_path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScanOutcome {
    Tree { tree: AssetNode },
    Error { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub root_path: PathBuf,
    pub outcome: ScanOutcome,
}

impl ScanResponse {
    pub fn error(root_path: PathBuf, message: impl Into<String>) -> Self {
        Self {
            root_path,
            outcome: ScanOutcome::Error {
                message: message.into(),
            },
        }
    }

    pub fn into_tree(self) -> std::result::Result<AssetNode, String> {
        match self.outcome {
            ScanOutcome::Tree { tree } => Ok(tree),
            ScanOutcome::Error { message } => Err(message),
        }
    }
}

/// Run one request synchronously
pub fn handle_request(scanner: &AssetScanner, request: &ScanRequest) -> ScanResponse {
    if let Some(user_data) = &request.user_data_path {
        log::debug!(
            "Scan of {} requested with user data at {}",
            request.root_path.display(),
            user_data.display()
        );
    }
    match scanner.scan(&request.root_path) {
        Ok(tree) => ScanResponse {
            root_path: request.root_path.clone(),
            outcome: ScanOutcome::Tree { tree },
        },
        Err(err) => {
            log::warn!("Scan of {} failed: {err}", request.root_path.display());
            ScanResponse::error(request.root_path.clone(), err.to_string())
        }
    }
}

type Job = (ScanRequest, oneshot::Sender<ScanResponse>);

pub struct ScanWorker;

impl ScanWorker {
    /// Start the worker task. Requests are served in arrival order on the
    /// blocking pool; there is no cancellation of an in-flight scan.
    pub fn spawn(scanner: AssetScanner) -> ScanWorkerHandle {
        let (tx, mut rx) = mpsc::channel::<Job>(QUEUE_DEPTH);
        let scanner = Arc::new(scanner);

        tokio::spawn(async move {
            while let Some((request, reply)) = rx.recv().await {
                let root_path = request.root_path.clone();
                let scanner = Arc::clone(&scanner);
                let response =
                    tokio::task::spawn_blocking(move || handle_request(&scanner, &request))
                        .await
                        .unwrap_or_else(|err| {
                            ScanResponse::error(root_path, format!("scan task failed: {err}"))
                        });
                if reply.send(response).is_err() {
                    log::debug!("Scan requester went away before the reply");
                }
            }
            log::debug!("Scan worker stopped");
        });

        ScanWorkerHandle { tx }
    }
}

#[derive(Clone)]
pub struct ScanWorkerHandle {
    tx: mpsc::Sender<Job>,
}

impl ScanWorkerHandle {
    pub async fn scan(&self, request: ScanRequest) -> Result<ScanResponse> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send((request, reply_tx))
            .await
            .map_err(|_| AssetError::Worker("request queue closed".to_string()))?;
        reply_rx
            .await
            .map_err(|_| AssetError::Worker("worker dropped the request".to_string()))
    }
}

/// Serve JSON-line requests from `reader`, writing one JSON-line response per
/// request. Malformed lines get an error response with an empty root path.
/// Returns the number of requests answered once the input ends.
pub async fn serve_lines<R, W>(handle: &ScanWorkerHandle, reader: R, mut writer: W) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut served = 0;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<ScanRequest>(line) {
            Ok(request) => handle.scan(request).await?,
            Err(err) => ScanResponse::error(PathBuf::new(), format!("invalid scan request: {err}")),
        };

        let mut bytes = serde_json::to_vec(&response)
            .map_err(|err| AssetError::Worker(format!("serialize response: {err}")))?;
        bytes.push(b'\n');
        writer.write_all(&bytes).await?;
        writer.flush().await?;
        served += 1;
    }
    Ok(served)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn worker_returns_tree_or_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "import os\n").unwrap();
        let handle = ScanWorker::spawn(AssetScanner::default());

        let ok = handle
            .scan(ScanRequest {
                root_path: dir.path().to_path_buf(),
                user_data_path: None,
            })
            .await
            .unwrap();
        let tree = ok.into_tree().unwrap();
        assert_eq!(tree.children().unwrap().len(), 1);

        let missing = dir.path().join("missing");
        let err = handle
            .scan(ScanRequest {
                root_path: missing.clone(),
                user_data_path: None,
            })
            .await
            .unwrap();
        assert_eq!(err.root_path, missing);
        assert!(err.into_tree().unwrap_err().contains("Unable to access"));
    }

    #[tokio::test]
    async fn serves_json_lines() {
        let dir = tempdir().unwrap();
        let handle = ScanWorker::spawn(AssetScanner::default());
        let request = serde_json::to_string(&ScanRequest {
            root_path: dir.path().to_path_buf(),
            user_data_path: Some(dir.path().join("user")),
        })
        .unwrap();
        let input = format!("{request}\n\nnot json\n");

        let mut output = Vec::new();
        let served = serve_lines(&handle, input.as_bytes(), &mut output)
            .await
            .unwrap();
        assert_eq!(served, 2);

        let lines: Vec<serde_json::Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines[0]["outcome"]["status"], "tree");
        assert_eq!(lines[0]["outcome"]["tree"]["type"], "directory");
        assert_eq!(lines[1]["outcome"]["status"], "error");
    }
}
