//! Repo-local lint that keeps the student records backend hexagonal.
//!
//! The backend splits into three layers under `backend/src`:
//!
//! - `domain`: records, tokens, the cache-aside store and the use-case
//!   orchestrator. It must not name adapters or infrastructure crates.
//! - `inbound`: the actix-web surface. It drives the domain through its
//!   ports and must not reach into `outbound` or storage crates.
//! - `outbound`: Postgres, Redis, Argon2, JWT and the course client. It must
//!   not depend on the HTTP surface.
//!
//! One file-level rule sits on top of the layer rules: the student use-case
//! orchestrator reaches persistent data only through the `StudentRecords`
//! port, so it must never name the repository or cache ports directly.
//!
//! Run it with `cargo run -p architecture-lint` from anywhere in the
//! workspace.

use std::collections::BTreeSet;
use std::fmt;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::Dir;
use syn::visit::Visit;

/// Crate name the backend's own integration code imports it under.
const BACKEND_CRATE: &str = "student_records";

/// Infrastructure crates only the outbound layer may use.
const STORAGE_CRATES: [&str; 9] = [
    "argon2",
    "bb8",
    "bb8_redis",
    "diesel",
    "diesel_async",
    "diesel_migrations",
    "jsonwebtoken",
    "redis",
    "reqwest",
];

/// HTTP framework crates only the inbound layer (and the binary) may use.
const HTTP_CRATES: [&str; 5] = [
    "actix_http",
    "actix_web",
    "actix_web_prom",
    "utoipa",
    "utoipa_swagger_ui",
];

/// Ports the orchestrator must not bypass.
const ORCHESTRATOR_FILE: &str = "domain/student_service.rs";
const BYPASSED_PORTS: [&str; 2] = ["StudentRepository", "StudentCache"];

/// A single boundary violation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Violation {
    /// File path relative to `backend/src`.
    pub file: Utf8PathBuf,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file, self.message)
    }
}

/// Failure modes returned by the lint.
#[derive(Debug)]
pub enum ArchitectureLintError {
    /// Reading the source tree failed.
    Io(io::Error),
    /// A path under `backend/src` was not valid UTF-8.
    NonUtf8Path(String),
    /// A file could not be parsed as Rust.
    Parse { file: Utf8PathBuf, message: String },
    /// One or more boundary violations were found.
    Violations(Vec<Violation>),
}

impl fmt::Display for ArchitectureLintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read backend sources: {err}"),
            Self::NonUtf8Path(path) => write!(f, "source path is not UTF-8: {path}"),
            Self::Parse { file, message } => write!(f, "failed to parse {file}: {message}"),
            Self::Violations(violations) => {
                writeln!(f, "architecture boundary violations:")?;
                for violation in violations {
                    writeln!(f, "- {violation}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ArchitectureLintError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ArchitectureLintError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// A Rust source file to be linted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintSource {
    /// Path relative to `backend/src`.
    pub file: Utf8PathBuf,
    pub contents: String,
}

impl LintSource {
    pub fn new(file: impl Into<Utf8PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            contents: contents.into(),
        }
    }
}

/// Lint the layered modules under `backend_dir/src`.
///
/// Files outside `domain`, `inbound` and `outbound` (the binary, middleware,
/// test support) are not checked.
pub fn lint_backend_sources(backend_dir: &Utf8Path) -> Result<(), ArchitectureLintError> {
    let src = Dir::open_ambient_dir(backend_dir.join("src"), ambient_authority())?;
    let mut sources = Vec::new();
    for layer in Layer::ALL {
        let Some(dir) = open_optional_dir(&src, layer.root())? else {
            continue;
        };
        collect_sources(&dir, Utf8Path::new(layer.root()), &mut sources)?;
    }
    lint_sources(&sources)
}

/// Lint in-memory sources. Paths must be relative to `backend/src`.
pub fn lint_sources(sources: &[LintSource]) -> Result<(), ArchitectureLintError> {
    let mut violations = BTreeSet::new();
    for source in sources {
        let Some(layer) = Layer::of(&source.file) else {
            continue;
        };
        let parsed =
            syn::parse_file(&source.contents).map_err(|err| ArchitectureLintError::Parse {
                file: source.file.clone(),
                message: err.to_string(),
            })?;
        let mut collector = PathCollector::default();
        collector.visit_file(&parsed);
        violations.extend(
            layer
                .check(&collector.paths)
                .into_iter()
                .chain(check_orchestrator(&source.file, &collector.paths))
                .map(|message| Violation {
                    file: source.file.clone(),
                    message,
                }),
        );
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ArchitectureLintError::Violations(
            violations.into_iter().collect(),
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layer {
    Domain,
    Inbound,
    Outbound,
}

impl Layer {
    const ALL: [Self; 3] = [Self::Domain, Self::Inbound, Self::Outbound];

    const fn root(self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }

    fn of(file: &Utf8Path) -> Option<Self> {
        let first = file.components().next()?.as_str();
        Self::ALL.into_iter().find(|layer| layer.root() == first)
    }

    fn forbidden_modules(self) -> &'static [&'static str] {
        match self {
            Self::Domain => &["inbound", "outbound"],
            Self::Inbound => &["outbound"],
            Self::Outbound => &["inbound"],
        }
    }

    fn forbids_crate(self, name: &str) -> bool {
        match self {
            Self::Domain => STORAGE_CRATES.contains(&name) || HTTP_CRATES.contains(&name),
            Self::Inbound => STORAGE_CRATES.contains(&name),
            Self::Outbound => HTTP_CRATES.contains(&name),
        }
    }

    fn check(self, paths: &BTreeSet<Vec<String>>) -> BTreeSet<String> {
        let layer = self.root();
        let mut messages = BTreeSet::new();
        for segments in paths {
            if let Some(module) = internal_root(segments)
                .filter(|module| self.forbidden_modules().contains(module))
            {
                messages.insert(format!("{layer} must not depend on crate::{module}"));
            }
            if let Some(name) = external_root(segments).filter(|name| self.forbids_crate(name)) {
                messages.insert(format!("{layer} must not depend on `{name}`"));
            }
        }
        messages
    }
}

fn check_orchestrator(file: &Utf8Path, paths: &BTreeSet<Vec<String>>) -> Vec<String> {
    if file.as_str() != ORCHESTRATOR_FILE {
        return Vec::new();
    }
    BYPASSED_PORTS
        .into_iter()
        .filter(|port| paths.iter().any(|segments| segments.iter().any(|s| s == port)))
        .map(|port| format!("student service must reach storage through StudentRecords, not {port}"))
        .collect()
}

fn is_relative(segment: &str) -> bool {
    matches!(segment, "crate" | "self" | "super")
}

/// The first backend module named by a path, if the path is internal.
fn internal_root(segments: &[String]) -> Option<&str> {
    let first = segments.first()?.as_str();
    if Layer::ALL.iter().any(|layer| layer.root() == first) {
        return Some(first);
    }
    let index = if is_relative(first) {
        segments.iter().position(|segment| !is_relative(segment))?
    } else if first == BACKEND_CRATE {
        1
    } else {
        return None;
    };
    segments.get(index).map(String::as_str)
}

fn external_root(segments: &[String]) -> Option<&str> {
    let first = segments.first()?.as_str();
    (!is_relative(first) && first != BACKEND_CRATE).then_some(first)
}

#[derive(Default)]
struct PathCollector {
    paths: BTreeSet<Vec<String>>,
}

impl PathCollector {
    fn record_use_tree(&mut self, tree: &syn::UseTree, mut prefix: Vec<String>) {
        match tree {
            syn::UseTree::Path(path) => {
                prefix.push(path.ident.to_string());
                self.record_use_tree(&path.tree, prefix);
            }
            syn::UseTree::Name(name) => {
                prefix.push(name.ident.to_string());
                self.paths.insert(prefix);
            }
            syn::UseTree::Rename(rename) => {
                prefix.push(rename.ident.to_string());
                self.paths.insert(prefix);
            }
            syn::UseTree::Glob(_) => {
                prefix.push("*".to_owned());
                self.paths.insert(prefix);
            }
            syn::UseTree::Group(group) => {
                for item in &group.items {
                    self.record_use_tree(item, prefix.clone());
                }
            }
        }
    }
}

impl<'ast> Visit<'ast> for PathCollector {
    fn visit_path(&mut self, node: &'ast syn::Path) {
        let segments: Vec<String> = node
            .segments
            .iter()
            .map(|segment| segment.ident.to_string())
            .collect();
        if !segments.is_empty() {
            self.paths.insert(segments);
        }
        syn::visit::visit_path(self, node);
    }

    fn visit_item_use(&mut self, node: &'ast syn::ItemUse) {
        self.record_use_tree(&node.tree, Vec::new());
    }
}

fn open_optional_dir(parent: &Dir, name: &str) -> Result<Option<Dir>, ArchitectureLintError> {
    match parent.open_dir(name) {
        Ok(dir) => Ok(Some(dir)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn collect_sources(
    dir: &Dir,
    relative: &Utf8Path,
    sources: &mut Vec<LintSource>,
) -> Result<(), ArchitectureLintError> {
    for entry in dir.entries()? {
        let entry = entry?;
        let name = entry
            .file_name()
            .into_string()
            .map_err(|raw| ArchitectureLintError::NonUtf8Path(raw.to_string_lossy().into_owned()))?;
        let path = relative.join(&name);
        if entry.file_type()?.is_dir() {
            collect_sources(&entry.open_dir()?, &path, sources)?;
        } else if path.extension() == Some("rs") {
            let contents = dir.read_to_string(&name)?;
            sources.push(LintSource::new(path, contents));
        }
    }
    Ok(())
}
