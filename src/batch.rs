//! Extraction of many names against one [`Catalog`].
//!
//! With the `parallel` feature each name runs as its own Rayon task. The
//! decoded archives are shared read-only and every extraction opens its own
//! file handle, so tasks never contend on a cursor. Without the feature the
//! same work runs sequentially. Results always come back in input order.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::catalog::Catalog;
use crate::error::{BbfsError, Result};

/// One successfully written output.
#[derive(Debug, Clone)]
pub struct ExtractedFile {
    pub name:   String,
    pub path:   PathBuf,
    pub size:   usize,
    /// BLAKE3 of the written bytes.
    pub digest: blake3::Hash,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub extracted: Vec<ExtractedFile>,
    pub missing:   Vec<String>,
    pub failed:    Vec<(String, BbfsError)>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty() && self.failed.is_empty()
    }
}

// ── In-memory batch ──────────────────────────────────────────────────────────

/// Resolve and extract every name. One result per name, in input order.
pub fn extract_batch<S: AsRef<str> + Sync>(catalog: &Catalog, names: &[S]) -> Vec<Result<Vec<u8>>> {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        names.par_iter().map(|name| catalog.read_file(name.as_ref())).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        names.iter().map(|name| catalog.read_file(name.as_ref())).collect()
    }
}

// ── Extraction to disk ───────────────────────────────────────────────────────

/// Extract every name under `out_dir`, creating parent directories.
///
/// A missing name writes nothing and is listed in
/// [`BatchReport::missing`]. Names are made relative first; see
/// [`output_path`].
pub fn extract_to_dir<S: AsRef<str> + Sync>(
    catalog: &Catalog,
    names:   &[S],
    out_dir: &Path,
) -> BatchReport {
    let write_one = |name: &S| -> Result<ExtractedFile> {
        let name = name.as_ref();
        let path = output_path(out_dir, name).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("{name:?} has no usable path component"))
        })?;
        let data = catalog.read_file(name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &data)?;
        Ok(ExtractedFile {
            name: name.to_owned(),
            path,
            size: data.len(),
            digest: blake3::hash(&data),
        })
    };

    #[cfg(feature = "parallel")]
    let outcomes: Vec<Result<ExtractedFile>> = {
        use rayon::prelude::*;
        names.par_iter().map(write_one).collect()
    };

    #[cfg(not(feature = "parallel"))]
    let outcomes: Vec<Result<ExtractedFile>> = names.iter().map(write_one).collect();

    let mut report = BatchReport::default();
    for (name, outcome) in names.iter().zip(outcomes) {
        match outcome {
            Ok(file) => report.extracted.push(file),
            Err(e) if e.is_not_found() => report.missing.push(name.as_ref().to_owned()),
            Err(e) => {
                tracing::warn!(name = name.as_ref(), error = %e, "extraction failed");
                report.failed.push((name.as_ref().to_owned(), e));
            }
        }
    }
    report
}

/// Where `name` lands under `out_dir`. Root, prefix, `.` and `..`
/// components are dropped and backslashes count as separators. `None` when
/// nothing is left.
pub fn output_path(out_dir: &Path, name: &str) -> Option<PathBuf> {
    let unified = name.replace('\\', "/");
    let relative: PathBuf = Path::new(&unified)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();
    if relative.as_os_str().is_empty() {
        None
    } else {
        Some(out_dir.join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_keeps_relative_names() {
        let out = Path::new("/out");
        assert_eq!(output_path(out, "data/foo.bin"), Some(PathBuf::from("/out/data/foo.bin")));
        assert_eq!(output_path(out, "Data\\Sub\\x.dat"), Some(PathBuf::from("/out/Data/Sub/x.dat")));
    }

    #[test]
    fn output_path_cannot_escape() {
        let out = Path::new("/out");
        assert_eq!(output_path(out, "/etc/passwd"), Some(PathBuf::from("/out/etc/passwd")));
        assert_eq!(output_path(out, "../../x"), Some(PathBuf::from("/out/x")));
        assert_eq!(output_path(out, "a/./../b"), Some(PathBuf::from("/out/a/b")));
        assert_eq!(output_path(out, ".."), None);
        assert_eq!(output_path(out, ""), None);
    }

    #[test]
    fn empty_catalog_reports_everything_missing() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Catalog::new();
        let report = extract_to_dir(&catalog, &["a", "b"], dir.path());
        assert_eq!(report.missing, ["a", "b"]);
        assert!(report.extracted.is_empty());
        assert!(!report.is_complete());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);

        let results = extract_batch(&catalog, &["a"]);
        assert!(results[0].as_ref().unwrap_err().is_not_found());
    }
}
