use crate::discovery::CandidateWalker;
use crate::extractors::{ContentExtractor, ExtractorRegistry};
use crate::progress::{CancelFlag, ProgressSink, ProgressState};
use crate::{
    CandidateFile, Diagnostic, FileMetadata, Keyword, MatchReason, MatchRecord, SearchError,
    SearchOptions, SearchOutcome, SearchReport, SearchRequest,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchStatus {
    Idle,
    Running,
    Completed,
    Cancelled,
}

/// Answer of the cancel boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelAck {
    Requested,
    NotRunning,
}

struct Shared {
    status: Mutex<SearchStatus>,
    cancel: CancelFlag,
}

impl Shared {
    fn status(&self) -> MutexGuard<'_, SearchStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Marks the orchestrator busy for the lifetime of one run.
///
/// Dropping it without a recorded outcome (a panicking worker) returns the
/// orchestrator to `Idle` so later searches are not locked out.
struct RunGuard {
    shared: Arc<Shared>,
    run_id: Uuid,
    outcome: Option<SearchStatus>,
}

impl RunGuard {
    fn finish(&mut self, outcome: SearchOutcome) {
        self.outcome = Some(match outcome {
            SearchOutcome::Completed => SearchStatus::Completed,
            SearchOutcome::Cancelled => SearchStatus::Cancelled,
        });
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        *self.shared.status() = self.outcome.unwrap_or(SearchStatus::Idle);
    }
}

/// Runs one keyword search at a time over a directory tree.
///
/// Files are processed strictly in discovery order on a single worker. Each
/// file may contribute a filename match and a content match; extraction
/// failures are kept as diagnostics and never stop the run.
#[derive(Clone)]
pub struct SearchOrchestrator {
    registry: ExtractorRegistry,
    options: SearchOptions,
    shared: Arc<Shared>,
}

impl Default for SearchOrchestrator {
    fn default() -> Self {
        Self::new(ExtractorRegistry::default(), SearchOptions::default())
    }
}

impl SearchOrchestrator {
    pub fn new(registry: ExtractorRegistry, options: SearchOptions) -> Self {
        Self {
            registry,
            options,
            shared: Arc::new(Shared {
                status: Mutex::new(SearchStatus::Idle),
                cancel: CancelFlag::default(),
            }),
        }
    }

    pub fn status(&self) -> SearchStatus {
        *self.shared.status()
    }

    /// Asks a running search to stop before its next file.
    pub fn cancel(&self) -> CancelAck {
        let status = self.shared.status();
        if *status == SearchStatus::Running {
            self.shared.cancel.request();
            info!("search cancellation requested");
            CancelAck::Requested
        } else {
            CancelAck::NotRunning
        }
    }

    /// Runs a search to completion on the calling thread.
    pub fn run(
        &self,
        request: &SearchRequest,
        progress: &dyn ProgressSink,
    ) -> Result<SearchReport, SearchError> {
        let (keyword, guard) = self.begin(request)?;
        Ok(self.execute(request, &keyword, progress, guard))
    }

    /// Validates the request and hands the search to a blocking worker of the
    /// current tokio runtime.
    pub fn start<P>(&self, request: SearchRequest, progress: P) -> Result<SearchHandle, SearchError>
    where
        P: ProgressSink + 'static,
    {
        let runtime = Handle::try_current().map_err(|error| SearchError::Worker(error.to_string()))?;
        let (keyword, guard) = self.begin(&request)?;
        let run_id = guard.run_id;
        let worker = self.clone();

        let task = runtime
            .spawn_blocking(move || worker.execute(&request, &keyword, &progress, guard));

        Ok(SearchHandle { run_id, task })
    }

    fn begin(&self, request: &SearchRequest) -> Result<(Keyword, RunGuard), SearchError> {
        let mut status = self.shared.status();
        if *status == SearchStatus::Running {
            return Err(SearchError::AlreadyRunning);
        }

        let keyword = request.validate()?;
        *status = SearchStatus::Running;
        self.shared.cancel.reset();

        Ok((
            keyword,
            RunGuard {
                shared: Arc::clone(&self.shared),
                run_id: Uuid::new_v4(),
                outcome: None,
            },
        ))
    }

    fn execute(
        &self,
        request: &SearchRequest,
        keyword: &Keyword,
        progress: &dyn ProgressSink,
        mut guard: RunGuard,
    ) -> SearchReport {
        let run_id = guard.run_id;
        let span = info_span!("search", %run_id);
        let _entered = span.enter();

        info!(
            directory = %request.directory.display(),
            keyword = keyword.as_str(),
            formats = ?request.formats.iter().collect::<Vec<_>>(),
            show_metadata = request.show_metadata,
            "search started"
        );

        let mut walker = CandidateWalker::new(&request.directory, request.formats, &self.options);
        let mut candidates = Vec::new();
        let mut cancelled = false;
        for candidate in walker.by_ref() {
            if self.shared.cancel.is_requested() {
                cancelled = true;
                break;
            }
            candidates.push(candidate);
        }
        let mut diagnostics = walker.take_diagnostics();

        let total = candidates.len();
        progress.on_start(total);
        info!(total, "candidate files enumerated");

        let mut matches = Vec::new();
        let mut processed = 0;
        for candidate in &candidates {
            if cancelled || self.shared.cancel.is_requested() {
                cancelled = true;
                break;
            }

            self.process_file(
                candidate,
                keyword,
                request.show_metadata,
                &mut matches,
                &mut diagnostics,
            );

            processed += 1;
            progress.on_progress(ProgressState { processed, total });
        }

        let outcome = if cancelled {
            SearchOutcome::Cancelled
        } else {
            SearchOutcome::Completed
        };
        guard.finish(outcome);

        info!(
            ?outcome,
            processed,
            total,
            matches = matches.len(),
            failures = diagnostics.len(),
            "search finished"
        );

        SearchReport {
            run_id,
            outcome,
            matches,
            diagnostics,
            processed,
            total,
        }
    }

    fn process_file(
        &self,
        candidate: &CandidateFile,
        keyword: &Keyword,
        show_metadata: bool,
        matches: &mut Vec<MatchRecord>,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let file_name = candidate.file_name();
        let metadata = if show_metadata {
            file_metadata(&candidate.path)
        } else {
            None
        };

        let record = |reason| MatchRecord {
            file_name: file_name.clone(),
            path: candidate.path.clone(),
            reason,
            metadata: metadata.clone(),
        };

        if keyword.matches(&file_name) {
            matches.push(record(MatchReason::FileName));
        }

        let Some(extractor) = self.registry.get(candidate.kind) else {
            debug!(path = %candidate.path.display(), kind = %candidate.kind, "no extractor registered");
            return;
        };

        debug!(path = %candidate.path.display(), kind = %candidate.kind, "scanning content");
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            extractor.find_match(&candidate.path, keyword)
        }));

        let reason = match outcome {
            Ok(Ok(Some(location))) => {
                matches.push(record(MatchReason::Content(location)));
                return;
            }
            Ok(Ok(None)) => return,
            Ok(Err(error)) => error.to_string(),
            Err(_) => "extractor panicked".to_string(),
        };

        warn!(path = %candidate.path.display(), kind = %candidate.kind, %reason, "failed to read document");
        diagnostics.push(Diagnostic {
            path: candidate.path.clone(),
            kind: Some(candidate.kind),
            reason,
        });
    }
}

fn file_metadata(path: &Path) -> Option<FileMetadata> {
    match std::fs::metadata(path).and_then(|metadata| metadata.modified()) {
        Ok(modified) => Some(FileMetadata {
            modified: DateTime::<Utc>::from(modified),
            path: path.to_path_buf(),
        }),
        Err(error) => {
            warn!(path = %path.display(), %error, "could not read file metadata");
            None
        }
    }
}

/// A search running on a blocking worker.
pub struct SearchHandle {
    run_id: Uuid,
    task: JoinHandle<SearchReport>,
}

impl SearchHandle {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub async fn wait(self) -> Result<SearchReport, SearchError> {
        self.task
            .await
            .map_err(|error| SearchError::Worker(error.to_string()))
    }
}
