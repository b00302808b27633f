//! Include and composition resolution.
//!
//! `!include` accepts a URL, a directory or a single file. Directory
//! includes expand recursively in sorted-filename order, skipping hidden
//! entries. Included lines are re-indented with the whitespace that
//! preceded the `!include` token, so nesting stays readable, and each line
//! remembers its origin file so errors point at the right place.
//!
//! Any filesystem read marks the composed workspace as not portable: its
//! source can no longer be reconstructed without the external files.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ErrorCode, ParserError, Result};
use crate::features::{restricted_mode_error, Feature, Features};
use crate::preprocess::preprocess;
use crate::remote::{remote_error, UrlFetcher};

/// One logical line with its origin, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SourceLine {
    /// Display name of the origin: a path, a URL or a caller-chosen name.
    pub(crate) file: String,
    /// 1-based line number within the origin.
    pub(crate) number: usize,
    pub(crate) text: String,
    /// Directory nested relative includes resolve against. `None` for
    /// string and URL sources.
    pub(crate) dir: Option<PathBuf>,
}

pub(crate) fn is_url(target: &str) -> bool {
    let lower = target.to_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}

pub(crate) fn file_error(path: &Path, cause: &dyn std::fmt::Display) -> ParserError {
    ParserError::new(
        ErrorCode::E600,
        format!("could not read \"{}\": {cause}", path.display()),
    )
}

/// Turn raw source text into dispatchable lines.
pub(crate) fn source_lines(
    content: &str,
    file: &str,
    dir: Option<PathBuf>,
    indent: &str,
) -> Vec<SourceLine> {
    preprocess(content)
        .into_iter()
        .map(|line| SourceLine {
            file: file.to_owned(),
            number: line.number,
            text: if line.text.is_empty() || indent.is_empty() {
                line.text
            } else {
                format!("{indent}{}", line.text)
            },
            dir: dir.clone(),
        })
        .collect()
}

/// Resolve an `!include` target into lines plus whether the filesystem was
/// touched.
pub(crate) fn resolve_include(
    target: &str,
    indent: &str,
    dir: Option<&Path>,
    fetcher: Option<&dyn UrlFetcher>,
    features: &Features,
    restricted: bool,
) -> Result<(Vec<SourceLine>, bool)> {
    if is_url(target) {
        features.check_url(target)?;
        let fetcher =
            fetcher.ok_or_else(|| remote_error(target, "no url fetcher is configured"))?;
        let fetched = fetcher.fetch(target)?;
        return Ok((source_lines(&fetched.content, target, None, indent), false));
    }

    if restricted {
        return Err(restricted_mode_error("a file system include"));
    }
    features.check(Feature::FileSystem)?;

    let path = resolve_path(target, dir)?;
    if path.is_dir() {
        let mut files = Vec::new();
        collect_files(&path, &mut files)?;
        let mut lines = Vec::new();
        for file in &files {
            lines.extend(file_lines(file, indent)?);
        }
        Ok((lines, true))
    } else {
        Ok((file_lines(&path, indent)?, true))
    }
}

/// Read a whole extends or script target, which may be a file or a URL.
/// Returns the content, a display name, the directory for nested relative
/// resolution and whether the filesystem was touched.
pub(crate) fn read_target(
    target: &str,
    dir: Option<&Path>,
    fetcher: Option<&dyn UrlFetcher>,
    features: &Features,
    restricted: bool,
) -> Result<(String, String, Option<PathBuf>, bool)> {
    if is_url(target) {
        features.check_url(target)?;
        let fetcher =
            fetcher.ok_or_else(|| remote_error(target, "no url fetcher is configured"))?;
        let fetched = fetcher.fetch(target)?;
        return Ok((fetched.content, target.to_owned(), None, false));
    }

    if restricted {
        return Err(restricted_mode_error("reading a file"));
    }
    features.check(Feature::FileSystem)?;

    let path = resolve_path(target, dir)?;
    let content = read_file(&path)?;
    let display = path.display().to_string();
    let parent = path.parent().map(Path::to_path_buf);
    Ok((content, display, parent, true))
}

pub(crate) fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| file_error(path, &e))
}

/// Resolve a possibly relative target against the current file's
/// directory.
pub(crate) fn resolve_path(target: &str, dir: Option<&Path>) -> Result<PathBuf> {
    let candidate = Path::new(target);
    if candidate.is_absolute() {
        return Ok(candidate.to_path_buf());
    }
    match dir {
        Some(dir) => Ok(dir.join(candidate)),
        None => Err(file_error(
            candidate,
            &"relative paths cannot be resolved when parsing from a string",
        )),
    }
}

/// Collect the files under `dir` recursively, in sorted-filename order,
/// skipping hidden entries.
pub(crate) fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| file_error(dir, &e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| file_error(dir, &e))?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if !hidden {
            paths.push(entry.path());
        }
    }
    paths.sort();

    for path in paths {
        if path.is_dir() {
            collect_files(&path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

fn file_lines(path: &Path, indent: &str) -> Result<Vec<SourceLine>> {
    let content = read_file(path)?;
    Ok(source_lines(
        &content,
        &path.display().to_string(),
        path.parent().map(Path::to_path_buf),
        indent,
    ))
}
