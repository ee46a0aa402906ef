pub mod pdf;
pub mod presentation;
pub mod spreadsheet;
pub mod word;

pub use pdf::LopdfExtractor;
pub use presentation::PptxExtractor;
pub use spreadsheet::CalamineExtractor;
pub use word::DocxExtractor;

use crate::{ContentLocation, ExtractionError, FormatKind, Keyword};
use std::path::Path;
use std::sync::Arc;

/// Answers whether one document mentions the keyword, stopping at the first hit.
pub trait ContentExtractor: Send + Sync {
    fn kind(&self) -> FormatKind;

    fn find_match(
        &self,
        path: &Path,
        keyword: &Keyword,
    ) -> Result<Option<ContentLocation>, ExtractionError>;
}

/// One extractor slot per [`FormatKind`].
#[derive(Clone)]
pub struct ExtractorRegistry {
    slots: [Option<Arc<dyn ContentExtractor>>; 4],
}

impl ExtractorRegistry {
    pub fn empty() -> Self {
        Self {
            slots: [None, None, None, None],
        }
    }

    /// Registers an extractor, replacing any previous one for the same kind.
    pub fn register<E: ContentExtractor + 'static>(&mut self, extractor: E) {
        let slot = slot_index(extractor.kind());
        self.slots[slot] = Some(Arc::new(extractor));
    }

    pub fn get(&self, kind: FormatKind) -> Option<Arc<dyn ContentExtractor>> {
        self.slots[slot_index(kind)].clone()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(LopdfExtractor);
        registry.register(DocxExtractor);
        registry.register(CalamineExtractor);
        registry.register(PptxExtractor);
        registry
    }
}

fn slot_index(kind: FormatKind) -> usize {
    match kind {
        FormatKind::Pdf => 0,
        FormatKind::Word => 1,
        FormatKind::Spreadsheet => 2,
        FormatKind::Presentation => 3,
    }
}
