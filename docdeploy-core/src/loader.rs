//! Descriptor discovery and loading.
//!
//! # Search rules
//!
//! ```text
//! docdeploy deploy [path...]
//!   path is a directory  -> walk it, load every file named like --config-file
//!   path is a file       -> load it directly
//!   no path              -> $SSM_DOCUMENT_PATH, else "."
//! ```
//!
//! Every descriptor is read, `$VAR` / `${VAR}` references are expanded from
//! the process environment, the text is decoded with the selected parser and
//! the result is normalized into a [`Document`].

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;

use crate::error::{io_err, LoadError};
use crate::types::{Document, DocumentConfig};

/// Descriptor file name matched during directory walks.
pub const DEFAULT_CONFIG_FILE: &str = "document.yml";

/// Environment variable consulted when no search path is given.
pub const SEARCH_PATH_ENV: &str = "SSM_DOCUMENT_PATH";

// ---------------------------------------------------------------------------
// 1. Options
// ---------------------------------------------------------------------------

/// Decoder used for descriptor files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigParser {
    #[default]
    Yaml,
    Json,
}

impl FromStr for ConfigParser {
    type Err = LoadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yml" | "yaml" => Ok(Self::Yaml),
            "json" => Ok(Self::Json),
            other => Err(LoadError::UnsupportedParser(other.to_string())),
        }
    }
}

/// How descriptors are discovered and decoded.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// File name (or `*`/`?` glob) matched while walking directories.
    pub config_file: String,
    pub parser: ConfigParser,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            config_file: DEFAULT_CONFIG_FILE.to_string(),
            parser: ConfigParser::Yaml,
        }
    }
}

// ---------------------------------------------------------------------------
// 2. Entry points
// ---------------------------------------------------------------------------

/// Resolve the search paths: explicit args, else `$SSM_DOCUMENT_PATH`, else `.`.
pub fn search_paths(args: &[PathBuf]) -> Vec<PathBuf> {
    if !args.is_empty() {
        return args.to_vec();
    }
    match std::env::var(SEARCH_PATH_ENV) {
        Ok(path) if !path.is_empty() => vec![PathBuf::from(path)],
        _ => vec![PathBuf::from(".")],
    }
}

/// Load every descriptor reachable from `paths`, in walk order.
pub fn load_documents(paths: &[PathBuf], options: &LoadOptions) -> Result<Vec<Document>, LoadError> {
    let mut documents = Vec::new();

    for path in paths {
        let meta = fs::metadata(path).map_err(|e| io_err(path, e))?;
        if meta.is_dir() {
            documents.extend(load_documents_from_dir(path, options)?);
        } else if meta.is_file() {
            documents.push(load_document_from_file(path, options.parser)?);
        } else {
            return Err(LoadError::UnsupportedPath(path.clone()));
        }
    }

    tracing::debug!("loaded {} document descriptor(s)", documents.len());
    Ok(documents)
}

/// Walk `dir` recursively and load every file whose name matches
/// `options.config_file`.
pub fn load_documents_from_dir(dir: &Path, options: &LoadOptions) -> Result<Vec<Document>, LoadError> {
    let start = Instant::now();
    let mut files = Vec::new();
    let mut scanned = 0usize;
    walk(dir, &mut |path| {
        scanned += 1;
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| glob_match(&options.config_file, name));
        if matches {
            files.push(path.to_path_buf());
        }
    })?;

    if files.is_empty() {
        return Err(LoadError::NoDocuments {
            path: dir.to_path_buf(),
            scanned,
            elapsed: start.elapsed(),
        });
    }

    files
        .iter()
        .map(|file| load_document_from_file(file, options.parser))
        .collect()
}

/// Read, interpolate, decode and normalize a single descriptor file.
pub fn load_document_from_file(path: &Path, parser: ConfigParser) -> Result<Document, LoadError> {
    let raw = fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let interpolated = interpolate_env(&raw);

    let config: DocumentConfig = match parser {
        ConfigParser::Yaml => {
            serde_yaml::from_str(&interpolated).map_err(|source| LoadError::ParseYaml {
                path: path.to_path_buf(),
                source,
            })?
        }
        ConfigParser::Json => {
            serde_json::from_str(&interpolated).map_err(|source| LoadError::ParseJson {
                path: path.to_path_buf(),
                source,
            })?
        }
    };

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let base_dir = path.parent().unwrap_or(Path::new("."));

    let mut document = Document::from_config(config, stem, base_dir);
    document.source_path = Some(path.to_path_buf());
    Ok(document)
}

// ---------------------------------------------------------------------------
// 3. Helpers
// ---------------------------------------------------------------------------

/// Visit every regular file under `dir`, in lexical order.
fn walk(dir: &Path, visit: &mut dyn FnMut(&Path)) -> Result<(), LoadError> {
    let mut entries = fs::read_dir(dir)
        .map_err(|e| io_err(dir, e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| io_err(dir, e))?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            walk(&path, visit)?;
        } else {
            visit(&path);
        }
    }
    Ok(())
}

/// Shell-style match supporting `*` and `?`.
pub fn glob_match(pattern: &str, name: &str) -> bool {
    fn go(p: &[char], n: &[char]) -> bool {
        match (p.first(), n.first()) {
            (None, None) => true,
            (Some('*'), _) => go(&p[1..], n) || (!n.is_empty() && go(p, &n[1..])),
            (Some('?'), Some(_)) => go(&p[1..], &n[1..]),
            (Some(a), Some(b)) if a == b => go(&p[1..], &n[1..]),
            _ => false,
        }
    }
    let p: Vec<char> = pattern.chars().collect();
    let n: Vec<char> = name.chars().collect();
    go(&p, &n)
}

/// Expand `$NAME` and `${NAME}` from the environment. Unset variables expand
/// to the empty string; a `$` not followed by a name is kept as is.
pub fn interpolate_env(input: &str) -> String {
    interpolate_with(input, |name| std::env::var(name).ok())
}

fn interpolate_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(braced) = after.strip_prefix('{') {
            if let Some(end) = braced.find('}') {
                out.push_str(&lookup(&braced[..end]).unwrap_or_default());
                rest = &braced[end + 1..];
                continue;
            }
        }

        let len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        if len == 0 {
            out.push('$');
        } else {
            out.push_str(&lookup(&after[..len]).unwrap_or_default());
        }
        rest = &after[len..];
    }

    out.push_str(rest);
    out
}
