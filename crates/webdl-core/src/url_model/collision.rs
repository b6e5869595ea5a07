//! Output-path collision avoidance: `name.ext` -> `name(1).ext`, `name(2).ext`, ...

use std::path::{Path, PathBuf};

/// Splits a filename into stem and extension; the extension keeps its dot.
/// A leading dot (hidden file) does not count as an extension separator.
fn split_ext(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) if i > 0 => name.split_at(i),
        _ => (name, ""),
    }
}

/// Returns `path` itself when nothing exists there, otherwise the first
/// `name(k).ext` in the same directory, for the smallest unused `k >= 1`.
pub fn next_available_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }

    let file_name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download.bin".to_string());
    let (stem, ext) = split_ext(&file_name);
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

    let mut k = 1u32;
    loop {
        let candidate = dir.join(format!("{}({}){}", stem, k, ext));
        if !candidate.exists() {
            return candidate;
        }
        k += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn split_ext_shapes() {
        assert_eq!(split_ext("hello.pdf"), ("hello", ".pdf"));
        assert_eq!(split_ext("archive.tar.gz"), ("archive.tar", ".gz"));
        assert_eq!(split_ext("noext"), ("noext", ""));
        assert_eq!(split_ext(".bashrc"), (".bashrc", ""));
    }

    #[test]
    fn free_path_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("new.bin");
        assert_eq!(next_available_path(&p), p);
    }

    #[test]
    fn picks_smallest_unused_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("hello.pdf");
        fs::write(&p, b"x").unwrap();
        assert_eq!(next_available_path(&p), dir.path().join("hello(1).pdf"));

        fs::write(dir.path().join("hello(1).pdf"), b"x").unwrap();
        fs::write(dir.path().join("hello(2).pdf"), b"x").unwrap();
        assert_eq!(next_available_path(&p), dir.path().join("hello(3).pdf"));
    }

    #[test]
    fn no_extension() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("data");
        fs::write(&p, b"x").unwrap();
        assert_eq!(next_available_path(&p), dir.path().join("data(1)"));
    }
}
