//! Child-process client for the metadata worker.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use super::error::{WorkerError, WorkerResult};
use super::protocol::{
    methods, ConnectionParams, ErrorInfo, ExecuteQueryParams, ExecuteQueryResponse,
    RequestEnvelope, ResponseEnvelope,
};
use crate::config::Settings;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const WORKER_BINARY: &str = "sprocket-worker";

/// Requests awaiting a response, keyed by request id.
#[derive(Default)]
struct InFlight {
    waiting: Mutex<HashMap<String, oneshot::Sender<ResponseEnvelope>>>,
}

impl InFlight {
    async fn register(&self, id: &str) -> oneshot::Receiver<ResponseEnvelope> {
        let (tx, rx) = oneshot::channel();
        self.waiting.lock().await.insert(id.to_string(), tx);
        rx
    }

    async fn forget(&self, id: &str) {
        self.waiting.lock().await.remove(id);
    }

    async fn complete(&self, response: ResponseEnvelope) {
        match self.waiting.lock().await.remove(&response.id) {
            Some(tx) => {
                let _ = tx.send(response);
            }
            None => trace!(id = %response.id, "dropping response with no waiter"),
        }
    }

    /// Fail everything still waiting once the worker's stdout closes.
    async fn abandon_all(&self) {
        for (id, tx) in self.waiting.lock().await.drain() {
            let _ = tx.send(ResponseEnvelope::failure(
                id,
                ErrorInfo::new("WORKER_EXITED", "worker process exited"),
            ));
        }
    }
}

/// NDJSON client for a spawned worker process.
///
/// Each request carries a fresh UUID; a background task routes response
/// lines back to the caller waiting on that id.
pub struct WorkerClient {
    stdin: Mutex<BufWriter<ChildStdin>>,
    in_flight: Arc<InFlight>,
    _child: Child,
    reader: JoinHandle<()>,
    timeout: Duration,
}

impl WorkerClient {
    pub async fn spawn<P: AsRef<Path>>(worker_path: P) -> WorkerResult<Self> {
        Self::spawn_with_timeout(worker_path, DEFAULT_TIMEOUT).await
    }

    /// Spawn the configured worker, using the connection timeout for every
    /// request.
    pub async fn spawn_with_settings(settings: &Settings) -> WorkerResult<Self> {
        let path = locate_worker(settings)?;
        let timeout = Duration::from_secs(settings.connection.timeout_seconds);
        Self::spawn_with_timeout(path, timeout).await
    }

    pub async fn spawn_with_timeout<P: AsRef<Path>>(
        worker_path: P,
        timeout: Duration,
    ) -> WorkerResult<Self> {
        let path = worker_path.as_ref();
        let mut child = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(WorkerError::SpawnFailed)?;

        let stdin = child.stdin.take().ok_or(WorkerError::StdioUnavailable)?;
        let stdout = child.stdout.take().ok_or(WorkerError::StdioUnavailable)?;

        let in_flight = Arc::new(InFlight::default());
        let reader = tokio::spawn(route_responses(stdout, Arc::clone(&in_flight)));
        debug!(path = %path.display(), "worker spawned");

        Ok(Self {
            stdin: Mutex::new(BufWriter::new(stdin)),
            in_flight,
            _child: child,
            reader,
            timeout,
        })
    }

    /// Call a worker method and decode its result.
    pub async fn call<P, R>(&self, method: &str, params: P) -> WorkerResult<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let request = RequestEnvelope {
            id: uuid::Uuid::new_v4().to_string(),
            method: method.to_string(),
            params: serde_json::to_value(params).map_err(WorkerError::SerializeFailed)?,
        };
        let mut line = serde_json::to_string(&request).map_err(WorkerError::SerializeFailed)?;
        line.push('\n');

        let rx = self.in_flight.register(&request.id).await;
        if let Err(err) = self.send_line(&line).await {
            self.in_flight.forget(&request.id).await;
            return Err(err);
        }

        let response = match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(WorkerError::ChannelClosed),
            Err(_) => {
                self.in_flight.forget(&request.id).await;
                return Err(WorkerError::Timeout(self.timeout.as_secs()));
            }
        };

        match response.into_result() {
            Ok(value) => serde_json::from_value(value).map_err(WorkerError::DeserializeFailed),
            Err(info) => Err(info.into()),
        }
    }

    async fn send_line(&self, line: &str) -> WorkerResult<()> {
        let mut stdin = self.stdin.lock().await;
        stdin
            .write_all(line.as_bytes())
            .await
            .map_err(WorkerError::WriteFailed)?;
        stdin.flush().await.map_err(WorkerError::WriteFailed)
    }

    /// Run one catalog query; rows come back positionally.
    pub async fn execute_query(
        &self,
        connection: &ConnectionParams,
        sql: &str,
    ) -> WorkerResult<ExecuteQueryResponse> {
        let params = ExecuteQueryParams {
            connection: connection.clone(),
            sql: sql.to_string(),
            args: None,
        };
        self.call(methods::EXECUTE_QUERY, params).await
    }

    /// `false` once the worker's stdout has closed.
    pub fn is_alive(&self) -> bool {
        !self.reader.is_finished()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

async fn route_responses(stdout: ChildStdout, in_flight: Arc<InFlight>) {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => match serde_json::from_str::<ResponseEnvelope>(&line) {
                Ok(response) => in_flight.complete(response).await,
                Err(err) => warn!(error = %err, "unparseable worker response"),
            },
            Ok(None) => break,
            Err(err) => {
                warn!(error = %err, "worker stdout read failed");
                break;
            }
        }
    }
    in_flight.abandon_all().await;
}

/// The configured worker path, else `sprocket-worker` next to the project or
/// on `PATH`.
fn locate_worker(settings: &Settings) -> WorkerResult<PathBuf> {
    if let Some(path) = settings.worker_path() {
        return Ok(path);
    }

    let local = [
        PathBuf::from(WORKER_BINARY),
        Path::new("worker").join(WORKER_BINARY),
    ];
    let on_path = std::env::var_os("PATH")
        .map(|paths| {
            std::env::split_paths(&paths)
                .map(|dir| dir.join(WORKER_BINARY))
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    local
        .into_iter()
        .chain(on_path)
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| {
            WorkerError::SpawnFailed(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{WORKER_BINARY} not found; set worker.path in sprocket.toml"),
            ))
        })
}
