//! Local inference server supervision.
//!
//! Spawns a llama.cpp-style HTTP server against a downloaded model, watches
//! its stdout for the readiness marker, and proxies completion queries to it
//! over loopback HTTP. At most one server process is live at a time.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{watch, RwLock};

use crate::error::{Error, Result};
use crate::models::manager::ModelLifecycleManager;
use super::types::{CompletionRequest, CompletionResponse, QueryOptions};

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Inference server binary; resolved via PATH unless absolute.
    pub command: String,
    pub host: String,
    pub port: u16,
    pub ctx_size: u32,
    /// Stdout line fragment that signals the server accepts requests.
    pub readiness_marker: String,
    /// Upper bound on waiting for the readiness marker. Startup time scales
    /// with model size, which is why readiness is marker-driven rather than
    /// a fixed delay.
    pub startup_timeout: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            command: "llama-cpp-server".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8080,
            ctx_size: 2048,
            readiness_marker: "HTTP server listening".to_string(),
            startup_timeout: Duration::from_secs(30),
        }
    }
}

struct ServerProcess {
    child: Child,
    ready: bool,
    model_path: PathBuf,
    /// Ties the handle to the monitor task watching it, so a stale monitor
    /// never clears a newer server's handle.
    generation: u64,
}

/// Supervises the single local inference server subprocess.
///
/// State machine: Stopped -> Starting -> Ready, with Starting -> Failed on
/// spawn errors or a readiness timeout, and any state -> Stopped when the
/// subprocess exits. A post-readiness exit raises nothing at that moment;
/// the next `query` observes it as `NotReady`.
pub struct InferenceSupervisor {
    config: SupervisorConfig,
    manager: Arc<ModelLifecycleManager>,
    client: reqwest::Client,
    process: Arc<RwLock<Option<ServerProcess>>>,
    generation: AtomicU64,
}

impl InferenceSupervisor {
    pub fn new(manager: Arc<ModelLifecycleManager>, config: SupervisorConfig) -> Self {
        Self {
            config,
            manager,
            client: reqwest::Client::new(),
            process: Arc::new(RwLock::new(None)),
            generation: AtomicU64::new(0),
        }
    }

    pub fn with_default_config(manager: Arc<ModelLifecycleManager>) -> Self {
        Self::new(manager, SupervisorConfig::default())
    }

    pub async fn is_ready(&self) -> bool {
        self.process
            .read()
            .await
            .as_ref()
            .map(|p| p.ready)
            .unwrap_or(false)
    }

    /// Path of the model the live server was started with, if any.
    pub async fn active_model_path(&self) -> Option<PathBuf> {
        self.process
            .read()
            .await
            .as_ref()
            .map(|p| p.model_path.clone())
    }

    /// Launch the server for a downloaded model and wait until it is ready.
    ///
    /// No-op success if a server is already ready. Resolves on the first of
    /// {readiness marker observed, startup timeout elapsed}; the timeout
    /// kills the subprocess before failing.
    pub async fn start(&self, model_id: &str) -> Result<()> {
        if self.is_ready().await {
            info!("Inference server is already running");
            return Ok(());
        }

        if self.manager.get(model_id).is_none() {
            return Err(Error::ModelNotFound(model_id.to_string()));
        }
        if !self.manager.is_downloaded(model_id) {
            return Err(Error::ModelNotDownloaded(model_id.to_string()));
        }
        let model_path = self
            .manager
            .model_path(model_id)
            .ok_or_else(|| Error::ModelNotFound(model_id.to_string()))?;

        info!("Starting inference server with model {}", model_path.display());

        let mut child = Command::new(&self.config.command)
            .arg("--model")
            .arg(&model_path)
            .arg("--host")
            .arg(&self.config.host)
            .arg("--port")
            .arg(self.config.port.to_string())
            .arg("--ctx-size")
            .arg(self.config.ctx_size.to_string())
            .arg("--threads")
            .arg(worker_threads().to_string())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut guard = self.process.write().await;
            // A handle still sitting here belongs to a dead or stuck server;
            // replace it.
            if let Some(mut old) = guard.take() {
                let _ = old.child.start_kill();
            }
            *guard = Some(ServerProcess {
                child,
                ready: false,
                model_path,
                generation,
            });
        }

        if let Some(stderr) = stderr {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("inference stderr: {}", line);
                }
            });
        }

        let (ready_tx, mut ready_rx) = watch::channel(false);
        let marker = self.config.readiness_marker.clone();
        let slot = Arc::clone(&self.process);

        if let Some(stdout) = stdout {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("inference stdout: {}", line);
                    if line.contains(&marker) {
                        let _ = ready_tx.send(true);
                    }
                }

                // Stdout closing means the server exited. Clear the handle so
                // the next query reports NotReady; no error is raised here.
                info!("Inference server exited");
                let mut guard = slot.write().await;
                if guard.as_ref().map(|p| p.generation) == Some(generation) {
                    if let Some(mut process) = guard.take() {
                        let _ = process.child.wait().await;
                    }
                }
            });
        }

        let became_ready = tokio::time::timeout(self.config.startup_timeout, async {
            loop {
                if *ready_rx.borrow_and_update() {
                    return;
                }
                if ready_rx.changed().await.is_err() {
                    // Sender gone: the server exited before becoming ready.
                    // Wait out the startup window like the readiness poll in
                    // the desktop shell does.
                    std::future::pending::<()>().await;
                }
            }
        })
        .await;

        match became_ready {
            Ok(()) => {
                if let Some(process) = self.process.write().await.as_mut() {
                    process.ready = true;
                }
                info!("Inference server is ready");
                Ok(())
            }
            Err(_) => {
                warn!(
                    "Inference server not ready within {:?}, giving up",
                    self.config.startup_timeout
                );
                self.stop().await;
                Err(Error::StartupTimeout(self.config.startup_timeout.as_secs()))
            }
        }
    }

    /// Terminate the server if one is running. Idempotent; never fails.
    /// Returns false when nothing was running.
    pub async fn stop(&self) -> bool {
        let mut guard = self.process.write().await;
        match guard.take() {
            Some(mut process) => {
                info!("Stopping inference server");
                if let Err(e) = process.child.start_kill() {
                    warn!("Failed to kill inference server: {}", e);
                }
                let _ = process.child.wait().await;
                true
            }
            None => false,
        }
    }

    /// Proxy one completion query to the live server and return the text of
    /// the first choice.
    pub async fn query(&self, prompt: &str, options: &QueryOptions) -> Result<String> {
        {
            let guard = self.process.read().await;
            if !guard.as_ref().map(|p| p.ready).unwrap_or(false) {
                return Err(Error::NotReady);
            }
        }

        debug!("Sending query ({} chars)", prompt.len());

        let body = CompletionRequest::new(prompt, options);
        let url = format!(
            "http://{}:{}/v1/completions",
            self.config.host, self.config.port
        );

        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!("Inference server rejected query: {}", detail);
            return Err(Error::Upstream(detail));
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("invalid completion payload: {}", e)))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.text)
            .ok_or_else(|| Error::Upstream("completion contained no choices".to_string()))
    }
}

/// Half the host's logical CPUs, at least one.
fn worker_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| (n.get() / 2).max(1))
        .unwrap_or(1)
}
