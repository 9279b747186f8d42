//! Input discovery: list the documents a run will process.
//!
//! Discovery is deliberately shallow: one directory, no recursion, exact
//! (case-sensitive) extension match. Results are sorted by file name so two
//! runs over the same directory visit documents in the same order, although
//! nothing downstream depends on that order.
//!
//! [`check_pdf_header`] validates the `%PDF` magic bytes before a file is
//! handed to pdfium, so a mislabelled or truncated file fails at the open
//! stage with a readable message instead of an opaque pdfium error code.

use crate::error::{PipelineError, RenderError};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// List regular files in `dir` whose extension equals `extension`.
///
/// A missing input directory is not an error: it yields no documents.
pub fn discover_documents(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, PipelineError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Input directory '{}' does not exist", dir.display());
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(PipelineError::InputDirUnreadable {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut documents = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in '{}': {}", dir.display(), e);
                continue;
            }
        };
        let path = entry.path();
        let matches_ext = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == extension);
        if matches_ext && path.is_file() {
            documents.push(path);
        }
    }

    documents.sort();
    debug!(
        "Discovered {} '.{}' documents in {}",
        documents.len(),
        extension,
        dir.display()
    );
    Ok(documents)
}

/// How far into the file the `%PDF-` signature may start. pdfium accepts
/// leading junk (a BOM, blank lines) before the header.
pub const PDF_HEADER_WINDOW: u64 = 1024;

/// Verify that `path` is readable and carries a `%PDF-` signature within its
/// first [`PDF_HEADER_WINDOW`] bytes.
pub fn check_pdf_header(path: &Path) -> Result<(), RenderError> {
    let file = std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => RenderError::Open("permission denied".into()),
        _ => RenderError::Open(e.to_string()),
    })?;

    let mut head = Vec::with_capacity(PDF_HEADER_WINDOW as usize);
    file.take(PDF_HEADER_WINDOW)
        .read_to_end(&mut head)
        .map_err(|e| RenderError::Open(e.to_string()))?;

    if head.is_empty() {
        return Err(RenderError::Open("file is empty".into()));
    }
    if !head.windows(5).any(|w| w == b"%PDF-") {
        let shown = &head[..head.len().min(8)];
        return Err(RenderError::Open(format!(
            "file is not a valid PDF (first bytes: {:?})",
            String::from_utf8_lossy(shown)
        )));
    }
    Ok(())
}

/// File stem used to name a document's artifacts.
pub fn document_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovers_only_matching_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.pdf"), b"%PDF-1.4").unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"%PDF-1.4").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"hello").unwrap();
        std::fs::write(dir.path().join("upper.PDF"), b"%PDF-1.4").unwrap();
        std::fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let docs = discover_documents(dir.path(), "pdf").unwrap();
        let names: Vec<_> = docs
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
    }

    #[test]
    fn missing_directory_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let docs = discover_documents(&dir.path().join("absent"), "pdf").unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn header_check_accepts_pdf_and_rejects_others() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.pdf");
        let bad = dir.path().join("bad.pdf");
        let empty = dir.path().join("empty.pdf");
        std::fs::write(&good, b"%PDF-1.7\n").unwrap();
        std::fs::write(&bad, b"this is not a pdf").unwrap();
        std::fs::write(&empty, b"").unwrap();

        assert!(check_pdf_header(&good).is_ok());
        let err = check_pdf_header(&bad).unwrap_err().to_string();
        assert!(err.contains("not a valid PDF"), "got: {err}");
        assert!(check_pdf_header(&empty).is_err());
        assert!(check_pdf_header(&dir.path().join("missing.pdf")).is_err());
    }

    #[test]
    fn header_check_tolerates_preamble_within_window() {
        let dir = tempfile::tempdir().unwrap();

        let bom = dir.path().join("bom.pdf");
        std::fs::write(&bom, b"\xEF\xBB\xBF\r\n%PDF-1.4\n1 0 obj\n").unwrap();
        assert!(check_pdf_header(&bom).is_ok());

        let mut padded = vec![b'\n'; 1000];
        padded.extend_from_slice(b"%PDF-1.7\n");
        let late = dir.path().join("late.pdf");
        std::fs::write(&late, &padded).unwrap();
        assert!(check_pdf_header(&late).is_ok());

        let mut too_far = vec![b' '; PDF_HEADER_WINDOW as usize];
        too_far.extend_from_slice(b"%PDF-1.7\n");
        let beyond = dir.path().join("beyond.pdf");
        std::fs::write(&beyond, &too_far).unwrap();
        assert!(check_pdf_header(&beyond).is_err());
    }

    #[test]
    fn stem_strips_extension() {
        assert_eq!(document_stem(Path::new("in/jane_doe.pdf")), "jane_doe");
    }
}
