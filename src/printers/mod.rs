//! System printers: listing, duplex/orientation preferences, PDF printing through Acrobat

#[cfg(windows)]
mod spooler;

use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrinterError {
    #[error("Nie znaleziono drukarki: {0}")]
    NotFound(String),

    #[error("{call} failed: {source}")]
    Os {
        call: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Nie znaleziono Adobe Reader/Acrobat - sprawdź instalację")]
    AcrobatMissing,

    #[error("printer access is only available on Windows")]
    Unsupported,
}

/// Duplex mode (`DMDUP_*`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Duplex {
    #[default]
    Simplex = 1,
    LongEdge = 2,
    ShortEdge = 3,
}

/// Page orientation (`DMORIENT_*`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Portrait = 1,
    Landscape = 2,
}

/// Installed printers, the system default first, the rest by name
pub fn list_printers() -> Result<Vec<String>, PrinterError> {
    #[cfg(windows)]
    {
        let mut names = spooler::enum_printers()?;
        let default = spooler::default_printer();
        sort_printers(&mut names, default.as_deref());
        Ok(names)
    }
    #[cfg(not(windows))]
    {
        Err(PrinterError::Unsupported)
    }
}

/// Fail fast when a configured printer is not installed
pub fn ensure_printer_exists(name: &str) -> Result<(), PrinterError> {
    if list_printers()?.iter().any(|p| p == name) {
        Ok(())
    } else {
        Err(PrinterError::NotFound(name.to_string()))
    }
}

#[cfg(any(windows, test))]
fn sort_printers(names: &mut [String], default: Option<&str>) {
    names.sort_by_key(|name| (Some(name.as_str()) != default, name.to_lowercase()));
}

/// Printer defaults changed for the duration of a print run
///
/// The previous settings come back when the guard is dropped. Failures are
/// logged and printing goes on with whatever the printer had.
pub struct PrinterPrefsGuard {
    #[cfg(windows)]
    _inner: Option<spooler::DevModeOverride>,
}

pub fn apply_printer_prefs(printer: &str, duplex: Duplex, orientation: Orientation) -> PrinterPrefsGuard {
    #[cfg(windows)]
    {
        let inner = match spooler::DevModeOverride::apply(printer, duplex as i16, orientation as i16) {
            Ok(guard) => Some(guard),
            Err(e) => {
                tracing::warn!("Printer settings left unchanged for {printer}: {e}");
                None
            }
        };
        PrinterPrefsGuard { _inner: inner }
    }
    #[cfg(not(windows))]
    {
        tracing::debug!("Ignoring {duplex:?}/{orientation:?} for {printer}");
        PrinterPrefsGuard {}
    }
}

const ACROBAT_PATHS: &[&str] = &[
    r"C:\Program Files\Adobe\Acrobat DC\Acrobat\Acrobat.exe",
    r"C:\Program Files\Adobe\Acrobat Reader DC\Reader\AcroRd32.exe",
    r"C:\Program Files (x86)\Adobe\Acrobat Reader DC\Reader\AcroRd32.exe",
];

/// Send a PDF to a printer through Acrobat's `/N /T` command line
///
/// The job is handed over asynchronously; callers pace consecutive jobs.
pub fn print_pdf(printer: &str, pdf: &Path) -> Result<(), PrinterError> {
    let acrobat = ACROBAT_PATHS
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .ok_or(PrinterError::AcrobatMissing)?;

    Command::new(acrobat)
        .arg("/N")
        .arg("/T")
        .arg(pdf)
        .arg(printer)
        .spawn()
        .map_err(|source| PrinterError::Os {
            call: "Acrobat",
            source,
        })?;
    Ok(())
}

/// PDF files in `root`, sorted by name; subfolders only when `recursive`
pub fn collect_pdfs(root: &Path, recursive: bool) -> std::io::Result<Vec<PathBuf>> {
    let walker = walkdir::WalkDir::new(root)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .sort_by_file_name();

    let mut pdfs = Vec::new();
    for entry in walker {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() && is_pdf(entry.path()) {
            pdfs.push(entry.into_path());
        }
    }
    Ok(pdfs)
}

fn is_pdf(path: &Path) -> bool {
    path.extension().is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_printer_comes_first() {
        let mut names = vec![
            "zebra".to_string(),
            "Microsoft Print to PDF".to_string(),
            "HP LaserJet".to_string(),
            "brother".to_string(),
        ];
        sort_printers(&mut names, Some("HP LaserJet"));
        assert_eq!(names, vec!["HP LaserJet", "brother", "Microsoft Print to PDF", "zebra"]);
    }

    #[test]
    fn test_sort_without_default() {
        let mut names = vec!["b".to_string(), "A".to_string()];
        sort_printers(&mut names, None);
        assert_eq!(names, vec!["A", "b"]);
    }

    #[test]
    fn test_collect_pdfs_flat() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("b.pdf"), b"").unwrap();
        std::fs::write(dir.path().join("A.PDF"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("c.pdf"), b"").unwrap();

        let names: Vec<_> = collect_pdfs(dir.path(), false)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["A.PDF", "b.pdf"]);
    }

    #[test]
    fn test_collect_pdfs_recursive() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("c.pdf"), b"").unwrap();

        let found = collect_pdfs(dir.path(), true).unwrap();
        assert_eq!(found, vec![dir.path().join("a.pdf"), dir.path().join("sub").join("c.pdf")]);
    }

    #[test]
    fn test_collect_pdfs_missing_folder_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(collect_pdfs(&dir.path().join("missing"), false).is_err());
    }
}
