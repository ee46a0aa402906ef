use super::ContentExtractor;
use crate::{ContentLocation, ExtractionError, FormatKind, Keyword};
use docx_rs::{DocumentChild, Paragraph, ParagraphChild, RunChild};
use std::path::Path;

/// Checks body paragraphs of a `.docx` in document order.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocxExtractor;

impl ContentExtractor for DocxExtractor {
    fn kind(&self) -> FormatKind {
        FormatKind::Word
    }

    fn find_match(
        &self,
        path: &Path,
        keyword: &Keyword,
    ) -> Result<Option<ContentLocation>, ExtractionError> {
        let bytes = std::fs::read(path)?;
        let docx =
            docx_rs::read_docx(&bytes).map_err(|error| ExtractionError::Word(error.to_string()))?;

        let found = docx.document.children.iter().any(|child| match child {
            DocumentChild::Paragraph(paragraph) => keyword.matches(&paragraph_text(paragraph)),
            _ => false,
        });

        Ok(found.then_some(ContentLocation::Word))
    }
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    collect_runs(&paragraph.children, &mut text);
    text
}

fn collect_runs(children: &[ParagraphChild], output: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                for run_child in &run.children {
                    if let RunChild::Text(text) = run_child {
                        output.push_str(&text.text);
                    }
                }
            }
            ParagraphChild::Hyperlink(link) => collect_runs(&link.children, output),
            _ => {}
        }
    }
}
