use super::ContentExtractor;
use crate::{ContentLocation, ExtractionError, FormatKind, Keyword};
use calamine::{open_workbook, Data, Reader, Xlsx};
use std::path::Path;

/// All-or-nothing check over every non-empty cell of every worksheet.
///
/// Every sheet is read, not only the first, so the whole workbook counts as
/// the document's content. Date cells are compared in their
/// `%Y-%m-%d %H:%M:%S` form rather than as serial numbers.
#[derive(Debug, Default, Clone, Copy)]
pub struct CalamineExtractor;

impl ContentExtractor for CalamineExtractor {
    fn kind(&self) -> FormatKind {
        FormatKind::Spreadsheet
    }

    fn find_match(
        &self,
        path: &Path,
        keyword: &Keyword,
    ) -> Result<Option<ContentLocation>, ExtractionError> {
        let mut workbook: Xlsx<_> = open_workbook(path)
            .map_err(|error: calamine::XlsxError| ExtractionError::Spreadsheet(error.to_string()))?;

        let sheet_names = workbook.sheet_names().to_vec();
        for sheet_name in &sheet_names {
            let range = workbook
                .worksheet_range(sheet_name)
                .map_err(|error| ExtractionError::Spreadsheet(error.to_string()))?;

            let found = range
                .rows()
                .flatten()
                .filter_map(cell_text)
                .any(|text| keyword.matches(&text));

            if found {
                return Ok(Some(ContentLocation::Spreadsheet));
            }
        }

        Ok(None)
    }
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::DateTime(value) => Some(
            value
                .as_datetime()
                .map(|datetime| datetime.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| cell.to_string()),
        ),
        Data::DateTimeIso(text) | Data::DurationIso(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}
