//! Source-tree scans for layering contracts.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// One source line reported by a scan.
pub struct Hit {
    pub file: String,
    pub line: usize,
    pub text: String,
}

impl fmt::Debug for Hit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.text.trim())
    }
}

fn root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

fn walk(dir: &Path, files: &mut Vec<PathBuf>) {
    let entries =
        fs::read_dir(dir).unwrap_or_else(|e| panic!("failed to read dir {}: {e}", dir.display()));
    for entry in entries {
        let path = entry
            .unwrap_or_else(|e| panic!("failed to read dir entry: {e}"))
            .path();
        if path.is_dir() {
            walk(&path, files);
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            files.push(path);
        }
    }
}

/// Every `.rs` file under `relative_dir`, sorted.
pub fn rust_sources(relative_dir: &str) -> Vec<PathBuf> {
    let mut files = Vec::new();
    walk(&root().join(relative_dir), &mut files);
    files.sort();
    files
}

/// Lines of every `.rs` file under `relative_dir` for which `select` holds.
fn scan(
    relative_dir: &str,
    file_filter: impl Fn(&Path) -> bool,
    select: impl Fn(&str) -> bool,
) -> Vec<Hit> {
    let root = root();
    rust_sources(relative_dir)
        .into_iter()
        .filter(|file| file_filter(file))
        .flat_map(|file| {
            let content = fs::read_to_string(&file)
                .unwrap_or_else(|e| panic!("failed to read {}: {e}", file.display()));
            let name = file
                .strip_prefix(&root)
                .unwrap_or(&file)
                .to_string_lossy()
                .replace('\\', "/");
            content
                .lines()
                .enumerate()
                .filter(|(_, text)| select(text))
                .map(|(idx, text)| Hit {
                    file: name.clone(),
                    line: idx + 1,
                    text: text.to_string(),
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Lines under `relative_dir` mentioning any of `patterns`.
pub fn lines_mentioning(relative_dir: &str, patterns: &[&str]) -> Vec<Hit> {
    scan(relative_dir, |_| true, |text| patterns.iter().any(|p| text.contains(p)))
}

/// Lines of `mod.rs` files that are neither module declarations nor comments.
pub fn mod_file_bodies(relative_dir: &str) -> Vec<Hit> {
    scan(
        relative_dir,
        |file| file.file_name().is_some_and(|name| name == "mod.rs"),
        |text| {
            let line = text.trim();
            !(line.is_empty()
                || line.starts_with("//")
                || line.starts_with("pub mod ")
                || line.starts_with("mod ")
                || line.starts_with("#[cfg"))
        },
    )
}

pub fn path_exists(relative_path: &str) -> bool {
    root().join(relative_path).exists()
}
