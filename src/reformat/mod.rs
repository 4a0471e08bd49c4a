// src/reformat/mod.rs

//! Stage-2 input reformatter.
//!
//! The synthesis tool reads the stage-1 model through a fixed-column parser
//! that rejects the spacing the atmosphere tool writes. This module rewrites
//! the model line by line:
//!
//! - runs of whitespace collapse to one space;
//! - `TEFF` lines get fixed field spacing ([`recreate_vars_line`]);
//! - `READ DECK6 72` becomes `READ DECK6 64`.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::bytes::Regex;
use thiserror::Error;
use tracing::debug;

use crate::fs::FileSystem;
use crate::workdir::collect_files;

const TEFF_PREFIX: &[u8] = b"TEFF";
const DECK_LAYERS_FROM: &[u8] = b"READ DECK6 72";
const DECK_LAYERS_TO: &[u8] = b"READ DECK6 64";

#[derive(Error, Debug)]
pub enum ReformatError {
    #[error("error while walking {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("malformed TEFF line (expected 5 fields, got {fields}): {line:?}")]
    MalformedTeffLine { line: String, fields: usize },
}

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

static DECK_LAYERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("READ DECK6 72").expect("valid regex"));

/// Rebuild a `TEFF` line from its space-separated tokens.
///
/// A 6-byte second field needs one more leading space than any other
/// width for the synthesis tool to pick it up from the right column.
pub fn recreate_vars_line(fields: &[&[u8]]) -> Result<Vec<u8>, ReformatError> {
    let [name, teff, log_g, third, fourth, ..] = fields else {
        return Err(ReformatError::MalformedTeffLine {
            line: String::from_utf8_lossy(&fields.join(&b' ')).into_owned(),
            fields: fields.len(),
        });
    };

    let name_gap: &[u8] = if teff.len() == 6 { b"  " } else { b" " };
    let parts: [&[u8]; 9] = [name, name_gap, teff, b" ", log_g, b"  ", third, b"   ", fourth];
    Ok(parts.concat())
}

/// Apply the whitespace collapse and both repair rules to one line.
///
/// Lines are handled as raw bytes; anything that is not ASCII whitespace
/// or one of the repaired prefixes passes through unchanged.
pub fn reformat_line(line: &[u8]) -> Result<Vec<u8>, ReformatError> {
    let collapsed = WHITESPACE.replace_all(line, &b" "[..]);

    if collapsed.starts_with(TEFF_PREFIX) {
        let fields: Vec<&[u8]> = collapsed.split(|b| *b == b' ').collect();
        return recreate_vars_line(&fields);
    }
    if collapsed.starts_with(DECK_LAYERS_FROM) {
        return Ok(DECK_LAYERS.replace_all(&collapsed, DECK_LAYERS_TO).into_owned());
    }
    Ok(collapsed.into_owned())
}

/// Reformat every file under `dir` whose name starts with `prefix`.
///
/// Files are visited in sorted walk order and their reformatted lines are
/// concatenated, each terminated by `\n`.
pub fn reformat_stage2_input(
    fs: &dyn FileSystem,
    dir: &Path,
    prefix: &str,
) -> Result<Vec<u8>, ReformatError> {
    let mut files = Vec::new();
    collect_files(fs, dir, &mut files).map_err(|source| ReformatError::Walk {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut contents = Vec::new();
    for path in files.iter().filter(|p| has_prefix(p, prefix)) {
        debug!(file = %path.display(), "reformatting stage-1 output");
        reformat_file(fs, path, &mut contents)?;
    }

    Ok(contents)
}

fn has_prefix(path: &Path, prefix: &str) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(prefix))
}

fn reformat_file(fs: &dyn FileSystem, path: &Path, out: &mut Vec<u8>) -> Result<(), ReformatError> {
    let io_err = |source: anyhow::Error| ReformatError::Io {
        path: path.to_path_buf(),
        source,
    };

    let reader = BufReader::new(fs.open_read(path).map_err(io_err)?);
    for line in reader.split(b'\n') {
        let mut line = line.map_err(|e| io_err(e.into()))?;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        out.extend_from_slice(&reformat_line(&line)?);
        out.push(b'\n');
    }
    Ok(())
}
