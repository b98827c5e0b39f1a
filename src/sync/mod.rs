//! Remote synchronization of notebooks
//!
//! Requests run on a background tokio runtime. The UI thread submits a
//! [`SyncTask`] and drains finished [`SyncEvent`]s once per frame.

pub mod github;

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::core::config::GitHubSettings;
use crate::core::notebook::Notebook;
use github::{GitHubClient, GitHubConfig, RemoteEntry, RepoAccess};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SyncError {
    #[error("GitHub sync is not configured")]
    NotConfigured,
    #[error("GitHub rejected the token")]
    Unauthorized,
    #[error("not found on GitHub")]
    NotFound,
    #[error("the remote copy changed since it was last fetched")]
    Conflict,
    #[error("GitHub returned {status}: {body}")]
    Http { status: u16, body: String },
    #[error("network error: {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Work submitted to the background worker
#[derive(Debug, Clone)]
pub enum SyncTask {
    CheckAccess,
    ListNotes,
    Fetch(String),
    Publish(Notebook),
    Delete { slug: String, sha: String },
}

impl SyncTask {
    fn label(&self) -> String {
        match self {
            SyncTask::CheckAccess => "check access".to_string(),
            SyncTask::ListNotes => "list notes".to_string(),
            SyncTask::Fetch(slug) => format!("fetch {}", slug),
            SyncTask::Publish(nb) => format!("publish {}", nb.slug),
            SyncTask::Delete { slug, .. } => format!("delete {}", slug),
        }
    }
}

/// Finished work reported back to the UI
#[derive(Debug, Clone)]
pub enum SyncEvent {
    Access(RepoAccess),
    Listed(Vec<RemoteEntry>),
    Fetched(Notebook),
    /// `notebook` is the exact copy that was written as blob `sha`
    Published { notebook: Notebook, sha: String },
    Deleted(String),
    Failed { task: String, error: SyncError },
}

/// Owns the runtime and the result channel
pub struct SyncWorker {
    runtime: tokio::runtime::Runtime,
    tx: Sender<SyncEvent>,
    rx: Receiver<SyncEvent>,
    in_flight: usize,
}

impl SyncWorker {
    pub fn new() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("inkpad-sync")
            .enable_all()
            .build()
            .context("Failed to start sync runtime")?;
        let (tx, rx) = mpsc::channel();
        Ok(Self {
            runtime,
            tx,
            rx,
            in_flight: 0,
        })
    }

    /// Whether any submitted task has not reported back yet
    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    /// Submit a task. `repaint` is called once the result is queued.
    pub fn submit<F>(&mut self, settings: &GitHubSettings, task: SyncTask, repaint: F)
    where
        F: Fn() + Send + 'static,
    {
        let tx = self.tx.clone();
        let label = task.label();
        let client = GitHubConfig::from_settings(settings).and_then(GitHubClient::new);
        tracing::info!("Sync task: {}", label);
        self.in_flight += 1;

        self.runtime.spawn(async move {
            let event = match client {
                Ok(client) => run_task(&client, task).await,
                Err(e) => Err(e),
            }
            .unwrap_or_else(|error| {
                tracing::error!("Sync task {} failed: {}", label, error);
                SyncEvent::Failed { task: label, error }
            });
            // Receiver dropped means the app is shutting down
            let _ = tx.send(event);
            repaint();
        });
    }

    /// Collect finished events without blocking
    pub fn drain(&mut self) -> Vec<SyncEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    self.in_flight = self.in_flight.saturating_sub(1);
                    events.push(event);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        events
    }
}

async fn run_task(client: &GitHubClient, task: SyncTask) -> Result<SyncEvent, SyncError> {
    Ok(match task {
        SyncTask::CheckAccess => SyncEvent::Access(client.check_access().await?),
        SyncTask::ListNotes => SyncEvent::Listed(client.list_notes().await?),
        SyncTask::Fetch(slug) => SyncEvent::Fetched(client.fetch_note(&slug).await?),
        SyncTask::Publish(notebook) => {
            let sha = client.put_note(&notebook).await?;
            SyncEvent::Published { notebook, sha }
        }
        SyncTask::Delete { slug, sha } => {
            client.delete_note(&slug, &sha).await?;
            SyncEvent::Deleted(slug)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_unconfigured_task_fails_fast() {
        let mut worker = SyncWorker::new().unwrap();
        let settings = GitHubSettings::default();
        worker.submit(&settings, SyncTask::ListNotes, || {});
        assert!(worker.is_busy());

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut events = Vec::new();
        while events.is_empty() && Instant::now() < deadline {
            events = worker.drain();
            std::thread::sleep(Duration::from_millis(10));
        }

        assert!(matches!(
            events.as_slice(),
            [SyncEvent::Failed { error: SyncError::NotConfigured, .. }]
        ));
        assert!(!worker.is_busy());
    }
}
