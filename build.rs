use grep::regex::RegexMatcher;
use grep::searcher::{Searcher, Sink, SinkMatch};
use std::error::Error;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// Only the crate's own sources are linted; anything else in the checkout is ignored.
const SOURCE_DIRS: [&str; 4] = ["baseline", "src", "tests", "benches"];

/// Which lines a rule reports once the regex has matched.
#[derive(Clone, Copy)]
enum LineFilter {
    /// Report matches in code, skipping comment lines and string literals.
    CodeOnly,
    /// Report every match.
    All,
}

struct Rule {
    name: &'static str,
    pattern: &'static str,
    filter: LineFilter,
    advice: &'static str,
}

const RULES: [Rule; 3] = [
    Rule {
        name: "underscore-prefixed variables",
        pattern: r"\b(_[a-zA-Z0-9_]+)\b",
        filter: LineFilter::CodeOnly,
        advice: "Either use the variable (removing the underscore) or remove it completely.",
    },
    Rule {
        name: "#[allow(dead_code)] attributes",
        pattern: r"#\s*\[\s*allow\s*\(\s*dead_code\s*\)\s*\]",
        filter: LineFilter::All,
        advice: "Either use the code (removing the attribute) or remove it completely.",
    },
    Rule {
        name: "forbidden comment patterns",
        pattern: r"(//|/\*).*(?:FIXED|CORRECTED|FIX|FIXES|NEW|CHANGED|CHANGES|CHANGE|MODIFIED|MODIFIES|MODIFY|UPDATED|UPDATES|UPDATE)",
        filter: LineFilter::All,
        advice: "Comments describing edit history are not allowed. Describe the code instead.",
    },
];

// A custom "Sink" for the grep searcher. It collects all matching lines
// from a single file to build a comprehensive error message.
struct ViolationCollector {
    violations: Vec<String>,
    file_path: PathBuf,
    filter: LineFilter,
}

impl ViolationCollector {
    fn new(file_path: &Path, filter: LineFilter) -> Self {
        Self {
            violations: Vec::new(),
            file_path: file_path.to_path_buf(),
            filter,
        }
    }

    fn check_and_get_error_message(&self, rule: &Rule) -> Option<String> {
        if self.violations.is_empty() {
            return None;
        }

        let file_name = self.file_path.to_str().unwrap_or("?");
        let mut error_msg = format!(
            "\n❌ ERROR: Found {} {} in {}:\n",
            self.violations.len(),
            rule.name,
            file_name
        );
        for violation in &self.violations {
            error_msg.push_str(&format!("   {violation}\n"));
        }
        error_msg.push_str(&format!(
            "\n⚠️ {} are not allowed in this project.\n   {}\n",
            rule.name, rule.advice
        ));

        Some(error_msg)
    }
}

fn is_comment_or_string(line_text: &str) -> bool {
    if line_text.trim_start().starts_with("//") {
        return true;
    }
    // Odd-numbered segments between quotes are string contents.
    line_text
        .split('"')
        .enumerate()
        .any(|(i, part)| i % 2 == 1 && part.contains('_'))
}

impl Sink for ViolationCollector {
    type Error = std::io::Error;

    fn matched(&mut self, _: &Searcher, mat: &SinkMatch) -> Result<bool, Self::Error> {
        let line_number = mat.line_number().unwrap_or(0);
        let line_text = std::str::from_utf8(mat.bytes()).unwrap_or("").trim_end();

        if matches!(self.filter, LineFilter::CodeOnly) && is_comment_or_string(line_text) {
            return Ok(true);
        }

        self.violations.push(format!("{line_number}:{line_text}"));
        Ok(true)
    }
}

fn rust_sources() -> Vec<PathBuf> {
    SOURCE_DIRS
        .iter()
        .flat_map(|dir| WalkDir::new(dir).into_iter().filter_map(|e| e.ok()))
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
        .map(|e| e.path().to_path_buf())
        .collect()
}

fn scan(rule: &Rule, sources: &[PathBuf]) -> Result<(), Box<dyn Error>> {
    let matcher = RegexMatcher::new_line_matcher(rule.pattern)?;
    let mut searcher = Searcher::new();

    for path in sources {
        let mut collector = ViolationCollector::new(path, rule.filter);
        searcher.search_path(&matcher, path, &mut collector)?;
        if let Some(error_message) = collector.check_and_get_error_message(rule) {
            return Err(error_message.into());
        }
    }
    Ok(())
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    for dir in SOURCE_DIRS {
        println!("cargo:rerun-if-changed={dir}");
    }

    let sources = rust_sources();
    for rule in &RULES {
        if let Err(e) = scan(rule, &sources) {
            // The `eprintln!` here is what shows the error in `cargo`'s output.
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
