//! Parallel parse phase
//!
//! Locations are grouped into batches and parsed on a dedicated rayon pool.
//! Consecutive entries of the same archive share one batch (and one open
//! handle, released when the batch ends). Results are collected back in
//! enumeration order, so whatever runs later sees the same sequence as a
//! sequential parse would produce.

use crate::core::archive::ArchiveReader;
use crate::error::{ImportError, Result};
use crate::models::descriptor::ClassDescriptor;
use crate::models::location::{Location, Storage};
use crate::parsers::classfile::parse_class;
use parking_lot::Mutex;
use rayon::prelude::*;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Upper bound on locations handled by one task
const BATCH_SIZE: usize = 256;

/// Progress update information for parallel operations
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub current: usize,
    pub total: usize,
    pub message: String,
}

impl ProgressUpdate {
    /// Create a new progress update
    pub fn new(current: usize, total: usize, message: impl Into<String>) -> Self {
        Self {
            current,
            total,
            message: message.into(),
        }
    }

    /// Calculate progress percentage
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.current as f64 / self.total as f64) * 100.0
        }
    }
}

pub type ProgressCallback = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;

/// Descriptors and failures of one parse phase
#[derive(Debug, Default)]
pub struct ParseOutcome {
    /// Parsed classes, in enumeration order, each carrying its source location
    pub descriptors: Vec<ClassDescriptor>,
    pub failures: Vec<ImportError>,
    /// Locations never read because the phase was cancelled
    pub skipped: usize,
}

impl ParseOutcome {
    pub fn is_complete(&self) -> bool {
        self.skipped == 0
    }
}

/// Per-location result; `None` when cancelled before the read
type LocationResult = Option<Result<ClassDescriptor>>;

pub struct ParsePhase<'a> {
    worker_threads: usize,
    cancel: &'a CancellationToken,
    progress: Option<&'a ProgressCallback>,
}

impl<'a> ParsePhase<'a> {
    pub fn new(worker_threads: usize, cancel: &'a CancellationToken) -> Self {
        Self {
            worker_threads: worker_threads.max(1),
            cancel,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: Option<&'a ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    pub fn run(&self, locations: &[Location]) -> ParseOutcome {
        let batches = batches(locations);
        let total = locations.len();
        let counter = Mutex::new(0usize);

        let process = |batch: &&[Location]| -> Vec<LocationResult> {
            let results = parse_batch(batch, self.cancel);
            if let Some(progress) = self.progress {
                let current = {
                    let mut count = counter.lock();
                    *count += batch.len();
                    *count
                };
                progress(ProgressUpdate::new(
                    current,
                    total,
                    format!("Parsed {}/{} class files", current, total),
                ));
            }
            results
        };

        let per_batch: Vec<Vec<LocationResult>> = if self.worker_threads == 1 {
            batches.iter().map(process).collect()
        } else {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(self.worker_threads)
                .thread_name(|index| format!("classimport-parse-{}", index))
                .build()
            {
                Ok(pool) => pool.install(|| batches.par_iter().map(process).collect()),
                Err(err) => {
                    tracing::warn!(error = %err, "Could not start parse workers, parsing sequentially");
                    batches.iter().map(process).collect()
                }
            }
        };

        let mut outcome = ParseOutcome::default();
        for result in per_batch.into_iter().flatten() {
            match result {
                Some(Ok(descriptor)) => outcome.descriptors.push(descriptor),
                Some(Err(err)) => outcome.failures.push(err),
                None => outcome.skipped += 1,
            }
        }
        outcome
    }
}

/// Split locations into runs of loose files and runs of entries of a single
/// archive, each at most `BATCH_SIZE` long
fn batches(locations: &[Location]) -> Vec<&[Location]> {
    let mut batches = Vec::new();
    let mut start = 0;
    for end in 1..=locations.len() {
        let split = end == locations.len()
            || end - start == BATCH_SIZE
            || archive_of(&locations[end]) != archive_of(&locations[start]);
        if split {
            batches.push(&locations[start..end]);
            start = end;
        }
    }
    batches
}

fn archive_of(location: &Location) -> Option<&Path> {
    match location.storage() {
        Storage::ArchiveEntry { archive, .. } => Some(archive),
        Storage::Loose(_) => None,
    }
}

fn parse_batch(batch: &[Location], cancel: &CancellationToken) -> Vec<LocationResult> {
    let Some(first) = batch.first() else {
        return Vec::new();
    };

    match archive_of(first) {
        None => batch
            .iter()
            .map(|location| {
                if cancel.is_cancelled() {
                    return None;
                }
                Some(location.read_bytes().and_then(|bytes| decode(location, &bytes)))
            })
            .collect(),
        Some(archive) => {
            if cancel.is_cancelled() {
                return batch.iter().map(|_| None).collect();
            }
            let mut reader = match ArchiveReader::open(archive) {
                Ok(reader) => reader,
                Err(err) => {
                    let reason = err.to_string();
                    return batch
                        .iter()
                        .map(|location| Some(Err(ImportError::unreadable(location.uri(), &reason))))
                        .collect();
                }
            };
            batch
                .iter()
                .map(|location| {
                    if cancel.is_cancelled() {
                        return None;
                    }
                    let bytes = match location.storage() {
                        Storage::ArchiveEntry { name, .. } => reader
                            .read(name)
                            .map_err(|err| ImportError::unreadable(location.uri(), err)),
                        Storage::Loose(_) => location.read_bytes(),
                    };
                    Some(bytes.and_then(|bytes| decode(location, &bytes)))
                })
                .collect()
        }
    }
}

fn decode(location: &Location, bytes: &[u8]) -> Result<ClassDescriptor> {
    let descriptor =
        parse_class(bytes).map_err(|err| ImportError::malformed(location.uri(), err))?;
    tracing::trace!(class = %descriptor.name, location = %location, "Parsed class file");
    Ok(descriptor.with_source(location.clone()))
}
