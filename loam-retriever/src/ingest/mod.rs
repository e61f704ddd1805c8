//! Ingestion: turning origins into embedded, stored chunks.
//!
//! [`pipeline`] runs one origin end to end; [`job_queue`] coordinates
//! batches of origins as background jobs.

pub mod job_queue;
pub mod pipeline;

pub use job_queue::{BatchSummary, InputOutcome, Job, JobCoordinator, JobStatus};
pub use pipeline::{IngestOrigin, IngestReport, IngestionPipeline};
