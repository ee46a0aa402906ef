use crate::{CandidateFile, Diagnostic, FormatKind, FormatSet, SearchOptions};
use std::cmp::Ordering;
use std::path::Path;
use tracing::warn;
use walkdir::{DirEntry, WalkDir};

/// Depth-first walk yielding files whose extension maps to an enabled format.
///
/// Within a directory, files are visited before subdirectories and both are
/// ordered by name, so repeated walks over an unchanged tree agree. Entries
/// that cannot be read are skipped and kept as diagnostics.
pub struct CandidateWalker {
    entries: walkdir::IntoIter,
    formats: FormatSet,
    case_insensitive_extensions: bool,
    diagnostics: Vec<Diagnostic>,
}

impl CandidateWalker {
    pub fn new(root: &Path, formats: FormatSet, options: &SearchOptions) -> Self {
        let mut walk = WalkDir::new(root)
            .follow_links(options.follow_symlinks)
            .sort_by(files_before_directories);
        if let Some(depth) = options.max_depth {
            walk = walk.max_depth(depth);
        }

        Self {
            entries: walk.into_iter(),
            formats,
            case_insensitive_extensions: options.case_insensitive_extensions,
            diagnostics: Vec::new(),
        }
    }

    /// Traversal failures seen so far.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    fn candidate(&self, entry: &DirEntry) -> Option<CandidateFile> {
        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if !is_file {
            return None;
        }

        let kind = FormatKind::from_path(entry.path(), self.case_insensitive_extensions)?;
        self.formats.contains(kind).then(|| CandidateFile {
            path: entry.path().to_path_buf(),
            kind,
        })
    }
}

impl Iterator for CandidateWalker {
    type Item = CandidateFile;

    fn next(&mut self) -> Option<Self::Item> {
        if self.formats.is_empty() {
            return None;
        }

        loop {
            match self.entries.next()? {
                Ok(entry) => {
                    if let Some(candidate) = self.candidate(&entry) {
                        return Some(candidate);
                    }
                }
                Err(error) => {
                    let path = error
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_default();
                    warn!(path = %path.display(), error = %error, "skipping unreadable entry");
                    self.diagnostics.push(Diagnostic {
                        path,
                        kind: None,
                        reason: error.to_string(),
                    });
                }
            }
        }
    }
}

fn files_before_directories(left: &DirEntry, right: &DirEntry) -> Ordering {
    left.file_type()
        .is_dir()
        .cmp(&right.file_type().is_dir())
        .then_with(|| left.file_name().cmp(right.file_name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn discover_candidates(
        root: &Path,
        formats: FormatSet,
        options: &SearchOptions,
    ) -> (Vec<CandidateFile>, Vec<Diagnostic>) {
        let mut walker = CandidateWalker::new(root, formats, options);
        let candidates: Vec<CandidateFile> = walker.by_ref().collect();
        (candidates, walker.take_diagnostics())
    }

    fn names(candidates: &[CandidateFile]) -> Vec<String> {
        candidates.iter().map(CandidateFile::file_name).collect()
    }

    #[test]
    fn discovery_is_recursive_and_filtered() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let base = dir.path();
        let nested = base.join("nested");
        fs::create_dir(&nested)?;

        fs::write(base.join("a.pdf"), b"%PDF-1.4")?;
        fs::write(base.join("b.docx"), b"")?;
        fs::write(base.join("c.txt"), b"")?;
        fs::write(nested.join("d.pptx"), b"")?;
        fs::write(nested.join("e.xlsx"), b"")?;

        let (candidates, diagnostics) =
            discover_candidates(base, FormatSet::all(), &SearchOptions::default());

        assert_eq!(names(&candidates), vec!["a.pdf", "b.docx", "d.pptx", "e.xlsx"]);
        assert_eq!(candidates[2].kind, FormatKind::Presentation);
        assert!(diagnostics.is_empty());
        Ok(())
    }

    #[test]
    fn files_come_before_subdirectories() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let base = dir.path();
        fs::create_dir(base.join("a"))?;
        fs::write(base.join("a").join("inner.pdf"), b"")?;
        fs::write(base.join("z.pdf"), b"")?;

        let (candidates, _) =
            discover_candidates(base, FormatSet::all(), &SearchOptions::default());
        assert_eq!(names(&candidates), vec!["z.pdf", "inner.pdf"]);
        Ok(())
    }

    #[test]
    fn disabled_formats_are_skipped() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("a.pdf"), b"")?;
        fs::write(dir.path().join("b.docx"), b"")?;

        let formats: FormatSet = [FormatKind::Word].into_iter().collect();
        let (candidates, _) = discover_candidates(dir.path(), formats, &SearchOptions::default());
        assert_eq!(names(&candidates), vec!["b.docx"]);

        let (none, _) =
            discover_candidates(dir.path(), FormatSet::empty(), &SearchOptions::default());
        assert!(none.is_empty());
        Ok(())
    }

    #[test]
    fn extensions_match_exactly_by_default() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        fs::write(dir.path().join("LOUD.PDF"), b"")?;
        fs::write(dir.path().join("quiet.pdf"), b"")?;

        let (strict, _) =
            discover_candidates(dir.path(), FormatSet::all(), &SearchOptions::default());
        assert_eq!(names(&strict), vec!["quiet.pdf"]);

        let lenient = SearchOptions {
            case_insensitive_extensions: true,
            ..SearchOptions::default()
        };
        let (lenient, _) = discover_candidates(dir.path(), FormatSet::all(), &lenient);
        assert_eq!(names(&lenient), vec!["LOUD.PDF", "quiet.pdf"]);
        Ok(())
    }

    #[test]
    fn max_depth_limits_recursion() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let nested = dir.path().join("nested");
        fs::create_dir(&nested)?;
        fs::write(dir.path().join("top.pdf"), b"")?;
        fs::write(nested.join("deep.pdf"), b"")?;

        let options = SearchOptions {
            max_depth: Some(1),
            ..SearchOptions::default()
        };
        let (candidates, _) = discover_candidates(dir.path(), FormatSet::all(), &options);
        assert_eq!(names(&candidates), vec!["top.pdf"]);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_entry_does_not_stop_the_walk() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let base = dir.path();
        let sibling = base.join("z");
        fs::create_dir(&sibling)?;
        fs::write(base.join("a.pdf"), b"")?;
        fs::write(sibling.join("sibling.pdf"), b"")?;
        std::os::unix::fs::symlink(base, base.join("loop"))?;

        let options = SearchOptions {
            follow_symlinks: true,
            ..SearchOptions::default()
        };
        let (candidates, diagnostics) = discover_candidates(base, FormatSet::all(), &options);

        assert_eq!(names(&candidates), vec!["a.pdf", "sibling.pdf"]);
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].kind.is_none());
        assert!(diagnostics[0].path.ends_with("loop"));
        Ok(())
    }

    #[test]
    fn missing_root_is_a_diagnostic_not_a_panic() {
        let (candidates, diagnostics) = discover_candidates(
            Path::new("/definitely/not/here/docscan"),
            FormatSet::all(),
            &SearchOptions::default(),
        );
        assert!(candidates.is_empty());
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].kind.is_none());
    }
}
