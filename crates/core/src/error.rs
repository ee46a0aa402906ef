use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    Pdf(String),

    #[error("word parse error: {0}")]
    Word(String),

    #[error("spreadsheet parse error: {0}")]
    Spreadsheet(String),

    #[error("presentation parse error: {0}")]
    Presentation(String),

    #[error("xml error: {0}")]
    Xml(String),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

impl From<quick_xml::Error> for ExtractionError {
    fn from(error: quick_xml::Error) -> Self {
        Self::Xml(error.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for ExtractionError {
    fn from(error: quick_xml::events::attributes::AttrError) -> Self {
        Self::Xml(error.to_string())
    }
}

/// Errors surfaced synchronously at the start-search boundary.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("a directory is required")]
    EmptyDirectory,

    #[error("a keyword is required")]
    EmptyKeyword,

    #[error("a search is already in progress")]
    AlreadyRunning,

    #[error("search worker failed: {0}")]
    Worker(String),
}
