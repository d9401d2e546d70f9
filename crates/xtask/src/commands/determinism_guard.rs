//! Determinism guard for the decision tier
//!
//! Scans `kingdom-core` sources for wall-clock reads, unseeded randomness and
//! unordered collections. Hash maps are tolerated when the line above carries
//! the marker comment `// determinism-guard: lookup-only`, meaning the map is
//! never iterated. Imports and `#[cfg(test)]` modules are not scanned.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::fs;
use std::path::{Path, PathBuf};

const LOOKUP_MARKER: &str = "determinism-guard: lookup-only";

/// Patterns that are never allowed, with a hint on what to use instead.
const FORBIDDEN: &[(&str, &str)] = &[
    ("SystemTime", "use SimTime from the TimeSource"),
    ("Instant::now", "use SimTime from the TimeSource"),
    ("Utc::now", "use SimTime from the TimeSource"),
    ("thread_rng", "use a named PcgStream"),
    ("rand::random", "use a named PcgStream"),
    ("OsRng", "use a named PcgStream"),
];

/// Patterns allowed only under the lookup marker.
const UNORDERED: &[&str] = &["HashMap", "HashSet"];

/// Reject nondeterministic constructs in the decision tier
#[derive(Parser, Debug)]
pub struct DeterminismGuard {
    /// Source root to scan
    #[arg(long, value_name = "DIR", default_value = "crates/game/core/src")]
    root: PathBuf,
}

/// One offending line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: PathBuf,
    pub line: usize,
    pub pattern: &'static str,
    pub hint: &'static str,
}

impl DeterminismGuard {
    pub fn execute(self) -> Result<()> {
        let mut files = Vec::new();
        collect_sources(&self.root, &mut files)?;
        files.sort();

        let mut violations = Vec::new();
        for file in &files {
            let text = fs::read_to_string(file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            violations.extend(scan(file, &text));
        }

        println!(
            "{} {} files under {}",
            style("Scanned:").bold().cyan(),
            files.len(),
            self.root.display()
        );

        if violations.is_empty() {
            println!("{}", style("✓ No nondeterministic constructs found").green().bold());
            return Ok(());
        }

        for violation in &violations {
            eprintln!(
                "{} {}:{} uses {} ({})",
                style("✗").red().bold(),
                violation.path.display(),
                violation.line,
                style(violation.pattern).yellow(),
                style(violation.hint).dim()
            );
        }
        anyhow::bail!("{} determinism violation(s)", violations.len())
    }
}

fn collect_sources(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in
        fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_dir() {
            collect_sources(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            files.push(path);
        }
    }
    Ok(())
}

/// Scan one file's text.
pub fn scan(path: &Path, text: &str) -> Vec<Violation> {
    let mut violations = Vec::new();
    let mut previous = "";

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.starts_with("#[cfg(test)]") {
            break;
        }
        let code = line.split("//").next().unwrap_or_default();
        let is_import = code.starts_with("use ") || code.starts_with("pub use ");

        for &(pattern, hint) in FORBIDDEN {
            if code.contains(pattern) {
                violations.push(Violation {
                    path: path.to_path_buf(),
                    line: index + 1,
                    pattern,
                    hint,
                });
            }
        }
        if !is_import && !previous.contains(LOOKUP_MARKER) {
            for &pattern in UNORDERED {
                if code.contains(pattern) {
                    violations.push(Violation {
                        path: path.to_path_buf(),
                        line: index + 1,
                        pattern,
                        hint: "use BTreeMap, or mark a lookup-only map",
                    });
                }
            }
        }
        previous = line;
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(text: &str) -> Vec<&'static str> {
        scan(Path::new("lib.rs"), text)
            .into_iter()
            .map(|violation| violation.pattern)
            .collect()
    }

    #[test]
    fn test_wall_clock_is_rejected() {
        let found = patterns("fn now() -> u64 {\n    std::time::SystemTime::now();\n}\n");
        assert_eq!(found, ["SystemTime"]);
    }

    #[test]
    fn test_marked_lookup_map_passes() {
        let text = "use std::collections::HashMap;\n\
                    // determinism-guard: lookup-only\n\
                    let counts: HashMap<u32, u32> = HashMap::new();\n";
        assert!(patterns(text).is_empty());
    }

    #[test]
    fn test_unmarked_map_is_rejected() {
        let found = patterns("let seen = HashSet::new();\n");
        assert_eq!(found, ["HashSet"]);
    }

    #[test]
    fn test_comments_and_tests_are_ignored() {
        let text = "// no thread_rng here\n\
                    #[cfg(test)]\n\
                    mod tests { fn f() { rand::random::<u8>(); } }\n";
        assert!(patterns(text).is_empty());
    }

    #[test]
    fn test_scans_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("engine");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("clock.rs"), "let t = Instant::now();\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "thread_rng").unwrap();

        let mut files = Vec::new();
        collect_sources(dir.path(), &mut files).unwrap();
        assert_eq!(files, [nested.join("clock.rs")]);
    }
}
