use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

use crate::SearchError;

/// Literal shown when a search produced no match at all.
pub const NO_RESULTS_SENTINEL: &str = "Nenhum resultado encontrado.";

const METADATA_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    Pdf,
    Word,
    Spreadsheet,
    Presentation,
}

impl FormatKind {
    pub const ALL: [FormatKind; 4] = [
        FormatKind::Pdf,
        FormatKind::Word,
        FormatKind::Spreadsheet,
        FormatKind::Presentation,
    ];

    /// Canonical extension, without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            FormatKind::Pdf => "pdf",
            FormatKind::Word => "docx",
            FormatKind::Spreadsheet => "xlsx",
            FormatKind::Presentation => "pptx",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FormatKind::Pdf => "PDF",
            FormatKind::Word => "Word",
            FormatKind::Spreadsheet => "Excel",
            FormatKind::Presentation => "PowerPoint",
        }
    }

    pub fn from_extension(extension: &str, case_insensitive: bool) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| {
            if case_insensitive {
                kind.extension().eq_ignore_ascii_case(extension)
            } else {
                kind.extension() == extension
            }
        })
    }

    pub fn from_path(path: &Path, case_insensitive: bool) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| Self::from_extension(ext, case_insensitive))
    }

    fn bit(self) -> u8 {
        match self {
            FormatKind::Pdf => 0b0001,
            FormatKind::Word => 0b0010,
            FormatKind::Spreadsheet => 0b0100,
            FormatKind::Presentation => 0b1000,
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FormatKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(FormatKind::Pdf),
            "word" | "docx" => Ok(FormatKind::Word),
            "excel" | "xlsx" | "spreadsheet" => Ok(FormatKind::Spreadsheet),
            "powerpoint" | "pptx" | "presentation" => Ok(FormatKind::Presentation),
            other => Err(format!(
                "unknown format '{other}' (expected pdf, word, excel or powerpoint)"
            )),
        }
    }
}

/// The set of format toggles enabled for a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatSet(u8);

impl FormatSet {
    pub fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        FormatKind::ALL.into_iter().collect()
    }

    pub fn insert(&mut self, kind: FormatKind) {
        self.0 |= kind.bit();
    }

    pub fn contains(&self, kind: FormatKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = FormatKind> + '_ {
        FormatKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(*kind))
    }
}

impl FromIterator<FormatKind> for FormatSet {
    fn from_iter<I: IntoIterator<Item = FormatKind>>(iter: I) -> Self {
        let mut set = FormatSet::empty();
        for kind in iter {
            set.insert(kind);
        }
        set
    }
}

/// A validated, non-empty search needle compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword {
    raw: String,
    folded: String,
}

impl Keyword {
    pub fn new(raw: &str) -> Result<Self, SearchError> {
        if raw.is_empty() {
            return Err(SearchError::EmptyKeyword);
        }

        Ok(Self {
            raw: raw.to_string(),
            folded: raw.to_lowercase(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, haystack: &str) -> bool {
        haystack.to_lowercase().contains(&self.folded)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub directory: PathBuf,
    pub keyword: String,
    pub formats: FormatSet,
    pub show_metadata: bool,
}

impl SearchRequest {
    pub fn new(directory: impl Into<PathBuf>, keyword: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            keyword: keyword.into(),
            formats: FormatSet::all(),
            show_metadata: false,
        }
    }

    pub fn with_formats(mut self, formats: FormatSet) -> Self {
        self.formats = formats;
        self
    }

    pub fn with_metadata(mut self, show_metadata: bool) -> Self {
        self.show_metadata = show_metadata;
        self
    }

    pub fn validate(&self) -> Result<Keyword, SearchError> {
        if self.directory.as_os_str().is_empty() {
            return Err(SearchError::EmptyDirectory);
        }

        Keyword::new(&self.keyword)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    pub path: PathBuf,
    pub kind: FormatKind,
}

impl CandidateFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

/// Where inside a document the keyword was found.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "number", rename_all = "snake_case")]
pub enum ContentLocation {
    Page(u32),
    Word,
    Spreadsheet,
    Slide(u32),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchReason {
    FileName,
    Content(ContentLocation),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileMetadata {
    pub modified: DateTime<Utc>,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchRecord {
    pub file_name: String,
    pub path: PathBuf,
    pub reason: MatchReason,
    pub metadata: Option<FileMetadata>,
}

impl fmt::Display for MatchRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            MatchReason::FileName => write!(f, "{} (Nome do arquivo)", self.file_name)?,
            MatchReason::Content(ContentLocation::Page(page)) => {
                write!(f, "{} - Página {page}", self.file_name)?
            }
            MatchReason::Content(ContentLocation::Word) => write!(f, "{} (Word)", self.file_name)?,
            MatchReason::Content(ContentLocation::Spreadsheet) => {
                write!(f, "{} (Excel)", self.file_name)?
            }
            MatchReason::Content(ContentLocation::Slide(slide)) => {
                write!(f, "{} - Slide {slide}", self.file_name)?
            }
        }

        if let Some(metadata) = &self.metadata {
            write!(
                f,
                " | Modificado: {} | Local: {}",
                metadata.modified.format(METADATA_TIMESTAMP_FORMAT),
                metadata.path.display()
            )?;
        }

        Ok(())
    }
}

/// A file or directory that contributed nothing because it could not be read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub path: PathBuf,
    pub kind: Option<FormatKind>,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchOutcome {
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchReport {
    pub run_id: Uuid,
    pub outcome: SearchOutcome,
    pub matches: Vec<MatchRecord>,
    pub diagnostics: Vec<Diagnostic>,
    pub processed: usize,
    pub total: usize,
}

impl SearchReport {
    pub fn lines(&self) -> Vec<String> {
        self.matches.iter().map(ToString::to_string).collect()
    }

    /// Result listing as shown to the user, one match per line.
    pub fn render(&self) -> String {
        if self.matches.is_empty() {
            NO_RESULTS_SENTINEL.to_string()
        } else {
            self.lines().join("\n")
        }
    }
}

/// Tuning knobs for traversal; the defaults walk every level without following
/// links and only accept lowercase extensions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchOptions {
    pub follow_symlinks: bool,
    pub max_depth: Option<usize>,
    pub case_insensitive_extensions: bool,
}
