//! Background batch ingestion jobs.
//!
//! [`JobCoordinator::submit`] records a job and returns its id immediately;
//! a single background worker receives job ids over a `flume` channel and
//! processes each job's inputs in fixed-size concurrent groups with a short
//! pause between groups. Per-input failures are captured into that input's
//! outcome slot and never abort the rest of the job; a job only reports
//! [`JobStatus::Failed`] when the coordinator itself faults.
//!
//! There is no mid-job cancellation: [`JobCoordinator::shutdown`] stops
//! intake and drains whatever is already queued.

use super::pipeline::{IngestOrigin, IngestionPipeline};
use crate::error::{RagError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Inputs processed concurrently per group.
const GROUP_SIZE: usize = 5;
/// Pause between groups, to avoid hammering the embedding service.
const GROUP_PAUSE: Duration = Duration::from_millis(100);

/// Lifecycle of a batch job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Outcome of one input within a job, recorded at the input's index.
#[derive(Debug, Clone, Serialize)]
pub struct InputOutcome {
    /// Display label of the input (file name, URL, or text label).
    pub input: String,
    pub success: bool,
    pub chunks_written: usize,
    /// Failure message when `success` is false.
    pub error: Option<String>,
}

/// Aggregate counts for a completed job.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub total_chunks: usize,
}

/// Externally visible record of a batch job.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: String,
    /// Display labels of the inputs, in submission order.
    pub inputs: Vec<String>,
    pub status: JobStatus,
    /// Percentage of inputs finished, 0..=100.
    pub progress: u8,
    /// One slot per input; `None` until that input finishes.
    pub results: Vec<Option<InputOutcome>>,
    pub summary: Option<BatchSummary>,
    /// Coordinator fault message; per-input failures live in `results`.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

fn origin_label(origin: &IngestOrigin) -> String {
    match origin {
        IngestOrigin::Text { name, .. } => name
            .clone()
            .unwrap_or_else(|| "pasted text".to_string()),
        IngestOrigin::File { path } => path.to_string_lossy().into_owned(),
        IngestOrigin::Url { url } => url.clone(),
    }
}

type JobMap = Arc<Mutex<HashMap<String, Job>>>;
type PendingMap = Arc<Mutex<HashMap<String, Vec<IngestOrigin>>>>;

/// Accepts batch submissions and runs them on a background worker.
pub struct JobCoordinator {
    jobs: JobMap,
    pending: PendingMap,
    sender: Mutex<Option<flume::Sender<String>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl JobCoordinator {
    pub fn new(pipeline: Arc<IngestionPipeline>) -> Self {
        let jobs: JobMap = Arc::new(Mutex::new(HashMap::new()));
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let (sender, receiver) = flume::unbounded::<String>();

        let worker = tokio::spawn(run_worker(
            receiver,
            pipeline,
            jobs.clone(),
            pending.clone(),
        ));

        Self {
            jobs,
            pending,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Queue a batch of origins and return the new job's id immediately.
    pub async fn submit(&self, origins: Vec<IngestOrigin>) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let job = Job {
            id: id.clone(),
            inputs: origins.iter().map(origin_label).collect(),
            status: JobStatus::Pending,
            progress: 0,
            results: vec![None; origins.len()],
            summary: None,
            error: None,
            created_at: Utc::now(),
        };

        self.jobs.lock().await.insert(id.clone(), job);
        self.pending.lock().await.insert(id.clone(), origins);

        let sender = self.sender.lock().await;
        match sender.as_ref() {
            Some(tx) => tx
                .send(id.clone())
                .map_err(|_| RagError::job_fault("job worker is not running"))?,
            None => return Err(RagError::job_fault("coordinator is shut down")),
        }

        tracing::info!(job_id = %id, "queued batch job");
        Ok(id)
    }

    /// Snapshot of one job, or `None` for an unknown id.
    pub async fn get_status(&self, id: &str) -> Option<Job> {
        self.jobs.lock().await.get(id).cloned()
    }

    /// Snapshots of every known job, newest first.
    pub async fn list_jobs(&self) -> Vec<Job> {
        let mut jobs: Vec<Job> = self.jobs.lock().await.values().cloned().collect();
        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs
    }

    /// Stop accepting submissions and wait for queued jobs to drain.
    pub async fn shutdown(&self) {
        // Dropping the sender lets the worker drain the queue and exit.
        self.sender.lock().await.take();
        if let Some(handle) = self.worker.lock().await.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "job worker ended abnormally");
            }
        }
    }
}

impl std::fmt::Debug for JobCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobCoordinator").finish_non_exhaustive()
    }
}

async fn run_worker(
    receiver: flume::Receiver<String>,
    pipeline: Arc<IngestionPipeline>,
    jobs: JobMap,
    pending: PendingMap,
) {
    while let Ok(job_id) = receiver.recv_async().await {
        run_job(&job_id, &pipeline, &jobs, &pending).await;
    }
    tracing::debug!("job worker drained and stopped");
}

async fn run_job(job_id: &str, pipeline: &Arc<IngestionPipeline>, jobs: &JobMap, pending: &PendingMap) {
    let origins = pending.lock().await.remove(job_id);
    let Some(origins) = origins else {
        // Inputs vanished between submit and pickup; this is a coordinator
        // fault, not an input failure.
        if let Some(job) = jobs.lock().await.get_mut(job_id) {
            job.status = JobStatus::Failed;
            job.error = Some("job inputs missing at pickup".to_string());
        }
        tracing::error!(job_id = %job_id, "job inputs missing at pickup");
        return;
    };

    let total = origins.len();
    if let Some(job) = jobs.lock().await.get_mut(job_id) {
        job.status = JobStatus::Processing;
    }
    tracing::info!(job_id = %job_id, inputs = total, "processing batch job");

    let indexed: Vec<(usize, IngestOrigin)> = origins.into_iter().enumerate().collect();
    let mut first_group = true;
    for group in indexed.chunks(GROUP_SIZE) {
        if !first_group {
            tokio::time::sleep(GROUP_PAUSE).await;
        }
        first_group = false;

        let tasks = group.iter().map(|(index, origin)| {
            let index = *index;
            let origin = origin.clone();
            let label = origin_label(&origin);
            async move {
                let outcome = match pipeline.ingest(origin).await {
                    Ok(report) => InputOutcome {
                        input: label,
                        success: true,
                        chunks_written: report.chunks_written,
                        error: None,
                    },
                    Err(e) => InputOutcome {
                        input: label,
                        success: false,
                        chunks_written: 0,
                        error: Some(e.to_string()),
                    },
                };

                // Outcome and progress land under one lock acquisition so
                // concurrent completions never clobber each other.
                let mut jobs = jobs.lock().await;
                if let Some(job) = jobs.get_mut(job_id) {
                    job.results[index] = Some(outcome);
                    let completed = job.results.iter().filter(|r| r.is_some()).count();
                    job.progress = ((100 * completed + total / 2) / total.max(1)) as u8;
                }
            }
        });
        futures::future::join_all(tasks).await;
    }

    let mut jobs = jobs.lock().await;
    if let Some(job) = jobs.get_mut(job_id) {
        let successful = job
            .results
            .iter()
            .flatten()
            .filter(|o| o.success)
            .count();
        let total_chunks = job
            .results
            .iter()
            .flatten()
            .map(|o| o.chunks_written)
            .sum();
        job.summary = Some(BatchSummary {
            total,
            successful,
            failed: total - successful,
            total_chunks,
        });
        job.status = JobStatus::Completed;
        job.progress = 100;
        tracing::info!(
            job_id = %job_id,
            successful,
            failed = total - successful,
            total_chunks,
            "batch job completed"
        );
    }
}
