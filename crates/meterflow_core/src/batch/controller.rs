//! The batch controller: drives the transform pipeline over a list of
//! source files, tracks per-file status, and commits the cached results.
//!
//! Files are processed strictly sequentially so progress and
//! cancellation stay deterministic; one file's failure never aborts the
//! batch. The commit phase validates every destination before the first
//! write and halts wholesale on a locked destination, leaving the cached
//! grids intact for a retry.

use std::path::{Path, PathBuf};

use super::manifest::OutputTarget;
use super::validate::{validate_targets, ValidationReport};
use crate::export::{ExportError, ExportFormatter, ExportResult, SheetWriter};
use crate::models::{FileStatus, JobPhase, OutputGrid, ProgressFn};
use crate::reader::RowReader;
use crate::transform::{Layout, TransformEngine};
use crate::workers::CancelToken;

/// One source file tracked through the batch.
#[derive(Debug, Clone)]
pub struct BatchEntry {
    /// The source file path.
    pub source: PathBuf,
    /// Current per-file status.
    pub status: FileStatus,
    /// Failure message, when status is Failed.
    pub error: Option<String>,
    /// Cached transform result, when status is Done.
    pub grid: Option<OutputGrid>,
    /// Proposed destination, when status is Done.
    pub target: Option<OutputTarget>,
}

impl BatchEntry {
    fn new(source: PathBuf) -> Self {
        Self {
            source,
            status: FileStatus::Queued,
            error: None,
            grid: None,
            target: None,
        }
    }
}

/// Outcome of the commit phase.
#[derive(Debug)]
pub enum CommitOutcome {
    /// Every destination was written.
    Complete(Vec<PathBuf>),
    /// Validation failed; nothing was written.
    Blocked(ValidationReport),
    /// Entry `index`'s destination is locked; the phase halted there.
    /// Cached results are retained, so commit can be re-run once the
    /// file is closed.
    Locked { index: usize, path: PathBuf },
    /// Cancelled at a checkpoint; already-written files are kept.
    Cancelled,
    /// A non-retryable write failure.
    Failed { index: usize, message: String },
}

/// A resumable save: everything needed to retry one write after the
/// destination is unlocked, without re-running the transform.
pub struct SaveCommand {
    /// The computed grid to write.
    pub grid: OutputGrid,
    /// Layout identity (drives styling).
    pub layout: Layout,
    /// Source the grid came from (drives the sheet name).
    pub source: PathBuf,
    /// Destination path.
    pub dest: PathBuf,
}

impl SaveCommand {
    /// Execute the save. Retryable on [`ExportError::DestinationLocked`].
    pub fn run(
        &self,
        writer: &mut dyn SheetWriter,
        progress: Option<&ProgressFn>,
    ) -> ExportResult<()> {
        ExportFormatter::new().write(
            &self.grid,
            &self.layout,
            &self.source,
            &self.dest,
            writer,
            progress,
        )
    }
}

/// Drives TransformEngine + save over an ordered list of source files.
pub struct BatchController {
    entries: Vec<BatchEntry>,
    layout: Layout,
    phase: JobPhase,
}

impl BatchController {
    /// Create a controller over the given files. Single-file jobs are
    /// just a batch of one.
    pub fn new(files: Vec<PathBuf>, layout: Layout) -> Self {
        Self {
            entries: files.into_iter().map(BatchEntry::new).collect(),
            layout,
            phase: JobPhase::Selecting,
        }
    }

    /// Current job phase.
    pub fn phase(&self) -> JobPhase {
        self.phase
    }

    /// The tracked entries.
    pub fn entries(&self) -> &[BatchEntry] {
        &self.entries
    }

    /// Per-file statuses, in order.
    pub fn statuses(&self) -> Vec<FileStatus> {
        self.entries.iter().map(|e| e.status).collect()
    }

    /// The layout this batch converts with.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Run the transform over every queued file, strictly in order.
    ///
    /// Per-file failures mark the entry Failed and continue. The cancel
    /// token is observed before each file; on cancellation, every
    /// non-terminal entry becomes Cancelled and the phase transitions to
    /// Cancelled (already-Done entries are retained).
    pub fn convert_all(
        &mut self,
        reader: &dyn RowReader,
        cancel: &CancelToken,
        progress: Option<&ProgressFn>,
    ) {
        self.phase = JobPhase::Converting;
        let engine = TransformEngine::new();
        let total = self.entries.len();

        for index in 0..total {
            if cancel.is_cancelled() {
                self.cancel_pending();
                return;
            }
            self.entries[index].status = FileStatus::Processing;
            tracing::info!(
                "converting file {}/{}: {}",
                index + 1,
                total,
                self.entries[index].source.display()
            );

            match convert_one(reader, &engine, &self.entries[index].source, &self.layout, progress)
            {
                Ok(grid) => {
                    let entry = &mut self.entries[index];
                    entry.target = Some(OutputTarget::default_for(&entry.source));
                    entry.grid = Some(grid);
                    entry.status = FileStatus::Done;
                }
                Err(message) => {
                    tracing::warn!(
                        "file failed, continuing batch: {}: {}",
                        self.entries[index].source.display(),
                        message
                    );
                    let entry = &mut self.entries[index];
                    entry.error = Some(message);
                    entry.status = FileStatus::Failed;
                }
            }
        }
        self.phase = JobPhase::BatchReview;
    }

    fn cancel_pending(&mut self) {
        for entry in &mut self.entries {
            if !entry.status.is_terminal() {
                entry.status = FileStatus::Cancelled;
            }
        }
        self.phase = JobPhase::Cancelled;
    }

    /// Edit one entry's output file name.
    pub fn set_file_name(&mut self, index: usize, name: &str) {
        if let Some(target) = self.entries.get_mut(index).and_then(|e| e.target.as_mut()) {
            target.set_file_name(name);
        }
    }

    /// Edit one entry's output directory.
    pub fn set_directory(&mut self, index: usize, dir: impl Into<PathBuf>) {
        if let Some(target) = self.entries.get_mut(index).and_then(|e| e.target.as_mut()) {
            target.set_save_dir(dir.into());
        }
    }

    /// Point every entry at one output directory.
    pub fn set_directory_for_all(&mut self, dir: impl Into<PathBuf>) {
        let dir = dir.into();
        for entry in &mut self.entries {
            if let Some(target) = entry.target.as_mut() {
                target.set_save_dir(dir.clone());
            }
        }
    }

    /// The committable targets (Done entries), in order.
    fn committable(&self) -> Vec<(usize, &OutputTarget)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.status == FileStatus::Done)
            .filter_map(|(i, e)| e.target.as_ref().map(|t| (i, t)))
            .collect()
    }

    /// Validate every committable destination without writing anything.
    pub fn validate_targets(&self) -> ValidationReport {
        let targets: Vec<&OutputTarget> =
            self.committable().into_iter().map(|(_, t)| t).collect();
        validate_targets(&targets)
    }

    /// Destinations that already exist on disk (for the caller's
    /// overwrite confirmation step).
    pub fn existing_targets(&self) -> Vec<PathBuf> {
        self.committable()
            .into_iter()
            .map(|(_, t)| t.save_path())
            .filter(|p| p.exists())
            .collect()
    }

    /// Commit phase: validate everything, then write each cached result
    /// in order.
    ///
    /// A locked destination halts the whole phase (so the user is never
    /// left with a confusingly-numbered partial batch) and reports which
    /// entry blocked; the cached grids survive, so the commit is
    /// re-runnable from the start once the file is closed.
    pub fn commit(
        &mut self,
        writer: &mut dyn SheetWriter,
        cancel: &CancelToken,
        progress: Option<&ProgressFn>,
    ) -> CommitOutcome {
        let report = self.validate_targets();
        if !report.is_ok() {
            return CommitOutcome::Blocked(report);
        }

        self.phase = JobPhase::Creating;
        let jobs: Vec<(usize, PathBuf)> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.status == FileStatus::Done && e.grid.is_some())
            .filter_map(|(i, e)| e.target.as_ref().map(|t| (i, t.save_path())))
            .collect();
        let total = jobs.len();
        let mut written = Vec::with_capacity(total);

        for (done, (index, dest)) in jobs.into_iter().enumerate() {
            if cancel.is_cancelled() {
                self.phase = JobPhase::Cancelled;
                return CommitOutcome::Cancelled;
            }
            let entry = &self.entries[index];
            let Some(grid) = entry.grid.clone() else {
                continue;
            };
            let command = SaveCommand {
                grid,
                layout: self.layout.clone(),
                source: entry.source.clone(),
                dest: dest.clone(),
            };
            match command.run(writer, None) {
                Ok(()) => {
                    written.push(dest);
                    if let Some(callback) = progress {
                        callback((((done + 1) * 100) / total.max(1)) as u8);
                    }
                }
                Err(ExportError::DestinationLocked { path }) => {
                    tracing::warn!(
                        "destination locked, halting commit at entry {}: {}",
                        index,
                        path.display()
                    );
                    self.phase = JobPhase::BatchReview;
                    return CommitOutcome::Locked { index, path };
                }
                Err(other) => {
                    self.phase = JobPhase::BatchReview;
                    return CommitOutcome::Failed {
                        index,
                        message: other.to_string(),
                    };
                }
            }
        }

        self.phase = JobPhase::Complete;
        CommitOutcome::Complete(written)
    }

    /// Build the resumable save command for a single-file job's entry.
    pub fn save_command(&self, index: usize) -> Option<SaveCommand> {
        let entry = self.entries.get(index)?;
        let grid = entry.grid.clone()?;
        let target = entry.target.as_ref()?;
        Some(SaveCommand {
            grid,
            layout: self.layout.clone(),
            source: entry.source.clone(),
            dest: target.save_path(),
        })
    }
}

/// Read and transform one source file.
///
/// Progress: 0 at read start, 50 once the table is in memory, 50-90
/// across the transform (emitted by the engine).
fn convert_one(
    reader: &dyn RowReader,
    engine: &TransformEngine,
    source: &Path,
    layout: &Layout,
    progress: Option<&ProgressFn>,
) -> Result<OutputGrid, String> {
    if let Some(callback) = progress {
        callback(0);
    }
    let table = reader.read_rows(source).map_err(|e| e.to_string())?;
    engine
        .apply(&table, layout, progress)
        .map_err(|e| format!("{}: {}", source.display(), e))
}
