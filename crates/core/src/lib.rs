pub mod discovery;
pub mod error;
pub mod extractors;
pub mod models;
pub mod orchestrator;
pub mod progress;

#[cfg(test)]
mod test_support;

pub use discovery::CandidateWalker;
pub use error::{ExtractionError, SearchError};
pub use extractors::{
    CalamineExtractor, ContentExtractor, DocxExtractor, ExtractorRegistry, LopdfExtractor,
    PptxExtractor,
};
pub use models::{
    CandidateFile, ContentLocation, Diagnostic, FileMetadata, FormatKind, FormatSet, Keyword,
    MatchReason, MatchRecord, SearchOptions, SearchOutcome, SearchReport, SearchRequest,
    NO_RESULTS_SENTINEL,
};
pub use orchestrator::{CancelAck, SearchHandle, SearchOrchestrator, SearchStatus};
pub use progress::{CancelFlag, NoProgress, ProgressSink, ProgressState};
