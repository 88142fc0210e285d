//! Source file discovery.
//!
//! Walks the configured source root, applies include paths and ignore
//! patterns, and reads every matching `.ts`/`.tsx`/`.js`/`.jsx` file into a
//! `SourceFile` for the engine. Ignore patterns without glob wildcards are
//! treated as literal directory prefixes; patterns with `*` or `?` are
//! matched as globs.

use std::path::{Path, PathBuf};

use colored::Colorize;
use glob::Pattern;
use walkdir::WalkDir;

use crate::config::TEST_FILE_PATTERNS;
use crate::core::SourceFile;

/// Check if a pattern contains glob wildcards (* or ?).
fn is_glob_pattern(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Result of discovering source files.
pub struct DiscoveredFiles {
    /// Files in deterministic (path-sorted) order, with contents read.
    pub files: Vec<SourceFile>,
    /// Paths that matched but could not be read, or walk errors.
    pub skipped_count: usize,
}

pub fn discover_files(
    base_dir: &Path,
    includes: &[String],
    ignore_patterns: &[String],
    ignore_test_files: bool,
    verbose: bool,
) -> DiscoveredFiles {
    let mut skipped_count = 0;

    let mut literal_ignore_paths: Vec<PathBuf> = Vec::new();
    let mut glob_patterns: Vec<Pattern> = Vec::new();
    for pattern in ignore_patterns {
        if is_glob_pattern(pattern) {
            match Pattern::new(pattern) {
                Ok(compiled) => glob_patterns.push(compiled),
                Err(e) => {
                    if verbose {
                        eprintln!(
                            "{} Invalid ignore pattern '{}': {}",
                            "warning:".bold().yellow(),
                            pattern,
                            e
                        );
                    }
                }
            }
        } else {
            literal_ignore_paths.push(base_dir.join(pattern));
        }
    }

    if ignore_test_files {
        for pattern in TEST_FILE_PATTERNS {
            if let Ok(compiled) = Pattern::new(pattern) {
                glob_patterns.push(compiled);
            }
        }
    }

    let dirs_to_walk: Vec<PathBuf> = if includes.is_empty() {
        vec![base_dir.to_path_buf()]
    } else {
        let mut dirs = Vec::new();
        for include in includes {
            let path = base_dir.join(include);
            if path.exists() {
                dirs.push(path);
            } else if verbose {
                eprintln!(
                    "{} Include path does not exist: {}",
                    "warning:".bold().yellow(),
                    path.display()
                );
            }
        }
        dirs
    };

    let mut paths: Vec<PathBuf> = Vec::new();
    for dir in dirs_to_walk {
        for entry in WalkDir::new(dir) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    skipped_count += 1;
                    if verbose {
                        eprintln!("{} Cannot access path: {}", "warning:".bold().yellow(), e);
                    }
                    continue;
                }
            };
            let path = entry.path();
            let path_str = path.to_string_lossy();

            if literal_ignore_paths
                .iter()
                .any(|ignored| path.starts_with(ignored))
            {
                continue;
            }
            if glob_patterns.iter().any(|p| p.matches(&path_str)) {
                continue;
            }
            if path.is_file() && is_analyzable_file(path) && !paths.contains(&path.to_path_buf()) {
                paths.push(path.to_path_buf());
            }
        }
    }

    // Deterministic input order; the manifest's record and file order
    // depend on it.
    paths.sort();

    let mut files = Vec::new();
    for path in paths {
        match std::fs::read_to_string(&path) {
            Ok(text) => files.push(SourceFile::new(path.to_string_lossy(), text)),
            Err(e) => {
                skipped_count += 1;
                if verbose {
                    eprintln!(
                        "{} Cannot read {}: {}",
                        "warning:".bold().yellow(),
                        path.display(),
                        e
                    );
                }
            }
        }
    }

    DiscoveredFiles {
        files,
        skipped_count,
    }
}

fn is_analyzable_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("tsx" | "ts" | "jsx" | "js")
    )
}

#[cfg(test)]
mod tests {
    use std::fs::{self, File};
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    fn paths(result: &DiscoveredFiles) -> Vec<&str> {
        result.files.iter().map(|f| f.path.as_str()).collect()
    }

    #[test]
    fn test_discovers_component_files_with_content() {
        let dir = tempdir().unwrap();
        let dir_path = dir.path();

        let mut app = File::create(dir_path.join("app.tsx")).unwrap();
        write!(app, "export const x = 1;").unwrap();
        File::create(dir_path.join("utils.ts")).unwrap();
        File::create(dir_path.join("style.css")).unwrap();

        let result = discover_files(dir_path, &[], &[], false, false);

        assert_eq!(result.files.len(), 2);
        let app_file = result
            .files
            .iter()
            .find(|f| f.path.ends_with("app.tsx"))
            .unwrap();
        assert_eq!(app_file.text, "export const x = 1;");
    }

    #[test]
    fn test_order_is_deterministic() {
        let dir = tempdir().unwrap();
        let dir_path = dir.path();

        File::create(dir_path.join("b.tsx")).unwrap();
        File::create(dir_path.join("a.tsx")).unwrap();
        File::create(dir_path.join("c.tsx")).unwrap();

        let result = discover_files(dir_path, &[], &[], false, false);
        let names = paths(&result);
        assert!(names[0].ends_with("a.tsx"));
        assert!(names[1].ends_with("b.tsx"));
        assert!(names[2].ends_with("c.tsx"));
    }

    #[test]
    fn test_glob_ignore_pattern() {
        let dir = tempdir().unwrap();
        let dir_path = dir.path();

        let node_modules = dir_path.join("node_modules");
        fs::create_dir(&node_modules).unwrap();
        File::create(node_modules.join("lib.ts")).unwrap();
        File::create(dir_path.join("app.tsx")).unwrap();

        let result = discover_files(
            dir_path,
            &[],
            &["**/node_modules/**".to_owned()],
            false,
            false,
        );

        assert_eq!(result.files.len(), 1);
        assert!(result.files[0].path.ends_with("app.tsx"));
    }

    #[test]
    fn test_literal_ignore_path() {
        let dir = tempdir().unwrap();
        let dir_path = dir.path();

        let generated = dir_path.join("generated");
        fs::create_dir(&generated).unwrap();
        File::create(generated.join("types.ts")).unwrap();
        File::create(dir_path.join("app.tsx")).unwrap();

        let result = discover_files(dir_path, &[], &["generated".to_owned()], false, false);

        assert_eq!(result.files.len(), 1);
        assert!(result.files[0].path.ends_with("app.tsx"));
    }

    #[test]
    fn test_includes_restrict_the_walk() {
        let dir = tempdir().unwrap();
        let dir_path = dir.path();

        let src = dir_path.join("src");
        fs::create_dir(&src).unwrap();
        File::create(src.join("app.tsx")).unwrap();
        let lib = dir_path.join("lib");
        fs::create_dir(&lib).unwrap();
        File::create(lib.join("utils.ts")).unwrap();

        let result = discover_files(dir_path, &["src".to_owned()], &[], false, false);

        assert_eq!(result.files.len(), 1);
        assert!(result.files[0].path.ends_with("src/app.tsx"));
    }

    #[test]
    fn test_test_files_ignored_when_enabled() {
        let dir = tempdir().unwrap();
        let dir_path = dir.path();

        File::create(dir_path.join("app.tsx")).unwrap();
        File::create(dir_path.join("app.test.tsx")).unwrap();
        File::create(dir_path.join("utils.spec.ts")).unwrap();

        let result = discover_files(dir_path, &[], &[], true, false);

        assert_eq!(result.files.len(), 1);
        assert!(result.files[0].path.ends_with("app.tsx"));
    }

    #[test]
    fn test_overlapping_includes_deduplicate() {
        let dir = tempdir().unwrap();
        let dir_path = dir.path();

        let src = dir_path.join("src");
        let components = src.join("components");
        fs::create_dir_all(&components).unwrap();
        File::create(components.join("Button.tsx")).unwrap();

        let result = discover_files(
            dir_path,
            &["src".to_owned(), "src/components".to_owned()],
            &[],
            false,
            false,
        );

        assert_eq!(result.files.len(), 1);
    }

    #[test]
    fn test_is_analyzable_file() {
        assert!(is_analyzable_file(Path::new("app.tsx")));
        assert!(is_analyzable_file(Path::new("app.ts")));
        assert!(is_analyzable_file(Path::new("app.jsx")));
        assert!(is_analyzable_file(Path::new("app.js")));
        assert!(!is_analyzable_file(Path::new("style.css")));
        assert!(!is_analyzable_file(Path::new("data.json")));
    }
}
