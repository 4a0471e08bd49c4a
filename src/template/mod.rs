// src/template/mod.rs

//! Input-file templating for the two legacy tools.
//!
//! Templates are stored in the control-file tree and use the legacy
//! `{{.Teff}}` / `{{.LogG}}` placeholder form. [`render`] rewrites those
//! field references into plain Jinja expressions and renders them with
//! `minijinja`. Only `{{ }}` is a delimiter: block and comment tags are
//! moved onto control characters, so `{%` and `{#` in a deck are plain text.
//! The renderer only substitutes text; number formatting is decided by
//! [`params`].

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use minijinja::syntax::SyntaxConfig;
use minijinja::{Environment, UndefinedBehavior};
use regex::Regex;
use thiserror::Error;
use tracing::info;

use crate::errors::GenerationError;
use crate::fs::FileSystem;

pub mod params;

pub use params::{model_input_vars, synthesis_input_vars};

/// Variable name → pre-formatted value.
pub type TemplateVars = BTreeMap<&'static str, String>;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("reading template {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("error while parsing the template: {0}")]
    Parse(#[source] minijinja::Error),

    #[error("error while executing the template: {0}")]
    Render(#[source] minijinja::Error),
}

/// `{{.Name}}`, optionally with inner spaces or trim markers.
static FIELD_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{(-?)\s*\.([A-Za-z_][A-Za-z0-9_]*)\s*(-?)\}\}").expect("valid regex")
});

fn normalize_field_refs(template: &str) -> String {
    FIELD_REF
        .replace_all(template, "{{$1 $2 $3}}")
        .into_owned()
}

fn legacy_syntax() -> Result<SyntaxConfig, minijinja::Error> {
    SyntaxConfig::builder()
        .variable_delimiters("{{", "}}")
        .block_delimiters("\u{2}%", "%\u{3}")
        .comment_delimiters("\u{2}#", "#\u{3}")
        .build()
}

/// Render `template` with `vars`.
///
/// Fails with [`TemplateError::Parse`] on malformed template syntax and with
/// [`TemplateError::Render`] if a referenced variable is missing.
pub fn render(template: &str, vars: &TemplateVars) -> Result<String, TemplateError> {
    let source = normalize_field_refs(template);

    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(true);
    env.set_syntax(legacy_syntax().map_err(TemplateError::Parse)?);

    let tmpl = env
        .template_from_str(&source)
        .map_err(TemplateError::Parse)?;

    tmpl.render(vars).map_err(TemplateError::Render)
}

/// Read a template through `fs`, render it and write the result to every
/// path in `outputs`.
pub fn render_file(
    fs: &dyn FileSystem,
    template_path: &Path,
    outputs: &[&Path],
    vars: &TemplateVars,
) -> Result<(), GenerationError> {
    let template = fs
        .read_to_string(template_path)
        .map_err(|source| TemplateError::Read {
            path: template_path.display().to_string(),
            source,
        })?;

    let contents = render(&template, vars)?;

    for out in outputs {
        info!(filename = %out.display(), "generating input file");
        fs.write(out, contents.as_bytes())
            .map_err(|source| GenerationError::Write {
                path: out.display().to_string(),
                source,
            })?;
    }
    Ok(())
}
