use super::ContentExtractor;
use crate::{ContentLocation, ExtractionError, FormatKind, Keyword};
use lopdf::Document;
use std::path::Path;
use tracing::debug;

/// Scans page text in page-tree order and reports the first page that matches.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfExtractor;

impl ContentExtractor for LopdfExtractor {
    fn kind(&self) -> FormatKind {
        FormatKind::Pdf
    }

    fn find_match(
        &self,
        path: &Path,
        keyword: &Keyword,
    ) -> Result<Option<ContentLocation>, ExtractionError> {
        let document =
            Document::load(path).map_err(|error| ExtractionError::Pdf(error.to_string()))?;

        let pages = document.get_pages();
        debug!(path = %path.display(), pages = pages.len(), "scanning pdf pages");

        for page_no in pages.keys().copied() {
            let text = document
                .extract_text(&[page_no])
                .map_err(|error| ExtractionError::Pdf(error.to_string()))?;

            if keyword.matches(&text) {
                return Ok(Some(ContentLocation::Page(page_no)));
            }
        }

        Ok(None)
    }
}
