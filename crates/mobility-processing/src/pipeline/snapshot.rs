//! Snapshot persistence.
//!
//! Stages never write files themselves. After each stage the pipeline hands
//! the new frame to a [`SnapshotSink`]:
//!
//! - [`CsvSnapshotWriter`] writes `{prefix}_{n}.csv` into a directory
//! - [`MemorySnapshotStore`] keeps copies in memory
//!
//! Snapshots are overwritten on every run and never read back by the pipeline.
//! [`read_snapshot`] is provided for downstream consumers.

use crate::error::{Result, ResultExt};
use crate::pipeline::progress::PipelineStage;
use parking_lot::Mutex;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::info;

/// Destination for the frame produced by each stage.
pub trait SnapshotSink: Send + Sync {
    /// Persist the snapshot of `stage`. Returns the path written, if any.
    fn persist(&self, stage: PipelineStage, df: &DataFrame) -> Result<Option<PathBuf>>;
}

/// Writes each snapshot as a comma-separated file with a header row.
///
/// Nulls are written as empty fields, dates as `YYYY-MM-DD`.
#[derive(Debug, Clone)]
pub struct CsvSnapshotWriter {
    output_dir: PathBuf,
    prefix: String,
}

impl CsvSnapshotWriter {
    pub fn new(output_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Path the snapshot of `stage` is written to.
    pub fn path_for(&self, stage: PipelineStage) -> Option<PathBuf> {
        stage
            .snapshot_number()
            .map(|n| self.output_dir.join(format!("{}_{}.csv", self.prefix, n)))
    }
}

impl SnapshotSink for CsvSnapshotWriter {
    fn persist(&self, stage: PipelineStage, df: &DataFrame) -> Result<Option<PathBuf>> {
        let Some(path) = self.path_for(stage) else {
            return Ok(None);
        };

        fs::create_dir_all(&self.output_dir)
            .context(format!("Creating {}", self.output_dir.display()))?;
        let mut file = File::create(&path).context(format!("Creating {}", path.display()))?;

        // CsvWriter needs a mutable frame; columns are shared, so this is cheap.
        let mut frame = df.clone();
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .with_quote_char(b'"')
            .finish(&mut frame)
            .context(format!("Writing {}", path.display()))?;

        info!("Snapshot saved: {}", path.display());
        Ok(Some(path))
    }
}

/// Keeps a copy of every snapshot in memory.
#[derive(Default)]
pub struct MemorySnapshotStore {
    snapshots: Mutex<Vec<(PipelineStage, DataFrame)>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent snapshot stored for `stage`.
    pub fn get(&self, stage: PipelineStage) -> Option<DataFrame> {
        self.snapshots
            .lock()
            .iter()
            .rev()
            .find(|(s, _)| *s == stage)
            .map(|(_, df)| df.clone())
    }

    /// Stages stored so far, in arrival order.
    pub fn stages(&self) -> Vec<PipelineStage> {
        self.snapshots.lock().iter().map(|(s, _)| *s).collect()
    }

    pub fn len(&self) -> usize {
        self.snapshots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.lock().is_empty()
    }
}

impl SnapshotSink for MemorySnapshotStore {
    fn persist(&self, stage: PipelineStage, df: &DataFrame) -> Result<Option<PathBuf>> {
        self.snapshots.lock().push((stage, df.clone()));
        Ok(None)
    }
}

/// Read a snapshot written by [`CsvSnapshotWriter`].
///
/// Empty fields become nulls and `YYYY-MM-DD` strings are parsed as dates.
pub fn read_snapshot(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|opts| opts.with_try_parse_dates(true))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .context(format!("Opening {}", path.display()))?
        .finish()
        .context(format!("Reading {}", path.display()))
}
