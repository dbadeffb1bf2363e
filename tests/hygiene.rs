//! Source hygiene budgets for every crate in the repository.
//!
//! Production sources (everything under a `src/` that is not a `*_test.rs`
//! sibling) are scanned for patterns that panic or drop errors. Budgets only
//! ever go down.

use std::fs;
use std::path::{Path, PathBuf};

const SOURCE_ROOTS: [&str; 3] = ["src", "canvas/src", "telemetry/src"];

/// `(pattern, budget)`.
const BUDGETS: &[(&str, usize)] = &[
    (".unwrap()", 0),
    (".expect(", 0),
    ("panic!(", 0),
    ("unreachable!(", 0),
    ("todo!(", 0),
    ("unimplemented!(", 0),
    ("let _ =", 0),
    // env lookups, the goal-id reply and the topic payload fallback.
    (".ok()", 4),
    ("#[allow(dead_code)]", 0),
];

struct SourceFile {
    path: PathBuf,
    content: String,
}

fn source_files() -> Vec<SourceFile> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let mut files = Vec::new();
    for dir in SOURCE_ROOTS {
        collect(&root.join(dir), &mut files);
    }
    files
}

fn collect(dir: &Path, out: &mut Vec<SourceFile>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for path in entries.flatten().map(|e| e.path()) {
        if path.is_dir() {
            collect(&path, out);
            continue;
        }
        let is_rs = path.extension().is_some_and(|e| e == "rs");
        let is_test = path.to_string_lossy().ends_with("_test.rs");
        if is_rs && !is_test {
            if let Ok(content) = fs::read_to_string(&path) {
                out.push(SourceFile { path, content });
            }
        }
    }
}

fn hits(files: &[SourceFile], pattern: &str) -> Vec<(String, usize)> {
    files
        .iter()
        .filter_map(|f| {
            let count = f.content.lines().filter(|line| line.contains(pattern)).count();
            (count > 0).then(|| (f.path.display().to_string(), count))
        })
        .collect()
}

#[test]
fn sources_are_found() {
    let files = source_files();
    assert!(files.iter().any(|f| f.path.ends_with("src/main.rs")));
    assert!(files.iter().any(|f| f.path.ends_with("canvas/src/engine.rs")));
    assert!(files.iter().any(|f| f.path.ends_with("telemetry/src/store.rs")));
}

#[test]
fn pattern_budgets_hold() {
    let files = source_files();
    let mut over = Vec::new();
    for &(pattern, budget) in BUDGETS {
        let found = hits(&files, pattern);
        let count: usize = found.iter().map(|(_, c)| c).sum();
        if count > budget {
            let listing: Vec<String> = found.iter().map(|(p, c)| format!("    {p}: {c}")).collect();
            over.push(format!("{pattern} found {count}, budget {budget}\n{}", listing.join("\n")));
        }
    }
    assert!(over.is_empty(), "hygiene budgets exceeded:\n{}", over.join("\n"));
}
