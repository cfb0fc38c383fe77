//! Command implementations.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use mml_change::{ChangeRequest, Model, ModelConfig};
use mml_core::NodeId;
use mml_filter::{default_filters, FilterTables};
use mml_parser::{empty_element, export_document, MomlFilter, ParserConfig};
use tracing::{debug, info};

const ORIGINATOR: &str = "mml";

/// Options of `mml apply`.
#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    pub document: PathBuf,
    /// `name=value` parameter overrides, applied in order.
    pub overrides: Vec<String>,
    /// MML files applied in the document's top-level, in order.
    pub changes: Vec<PathBuf>,
    /// Filter tables replacing the built-in ones.
    pub filter_tables: Option<PathBuf>,
    pub no_filters: bool,
    pub skip_errors: bool,
}

/// Split a `name=value` override.
pub fn parse_override(text: &str) -> Result<(&str, &str)> {
    match text.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value)),
        _ => bail!("invalid override '{text}': expected name=value"),
    }
}

fn filters(options: &ApplyOptions) -> Result<Vec<Arc<dyn MomlFilter>>> {
    if options.no_filters {
        return Ok(Vec::new());
    }
    match &options.filter_tables {
        Some(path) => {
            let tables = FilterTables::from_file(path)
                .with_context(|| format!("failed to load filter tables from {}", path.display()))?;
            Ok(tables.filters()?)
        }
        None => Ok(default_filters()?),
    }
}

fn directory_of(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Load `document` into a fresh model and return it with its top-level.
fn load(options: &ApplyOptions) -> Result<(Model, NodeId)> {
    let parser = ParserConfig::default()
        .with_filters_enabled(!options.no_filters)
        .with_error_skipping(options.skip_errors);
    let mut model = Model::with_config(ModelConfig::default().with_parser(parser));
    model.set_filters(Some(filters(options)?));

    let text = std::fs::read_to_string(&options.document)
        .with_context(|| format!("failed to read {}", options.document.display()))?;
    model
        .execute(
            ChangeRequest::new(ORIGINATOR, None, text)
                .with_base(directory_of(&options.document))
                .with_description(format!("load {}", options.document.display())),
        )
        .with_context(|| format!("failed to load {}", options.document.display()))?;

    let Some(top) = model.graph().roots().last().copied() else {
        bail!("{} defines no top-level object", options.document.display());
    };
    debug!(top = %model.graph().full_name(top), "document loaded");
    Ok((model, top))
}

/// `mml apply`: load, apply overrides then change files, and return the
/// resulting document.
pub fn run_apply(options: &ApplyOptions) -> Result<String> {
    let (mut model, top) = load(options)?;

    for text in &options.overrides {
        let (name, value) = parse_override(text)?;
        let moml = empty_element("property", &[("name", name), ("value", value)]);
        model
            .execute(ChangeRequest::new(ORIGINATOR, Some(top), moml).undoable(true))
            .with_context(|| format!("failed to set {name}"))?;
        info!(parameter = name, value, "parameter set");
    }

    for path in &options.changes {
        let moml = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        model
            .execute(
                ChangeRequest::new(ORIGINATOR, Some(top), moml)
                    .with_base(directory_of(path))
                    .undoable(true)
                    .with_description(format!("apply {}", path.display())),
            )
            .with_context(|| format!("failed to apply {}", path.display()))?;
        info!(change = %path.display(), "change applied");
    }

    Ok(export_document(model.graph(), top)?)
}

/// `mml show`: load and return the document as parsed.
pub fn run_show(options: &ApplyOptions) -> Result<String> {
    let (model, top) = load(options)?;
    Ok(export_document(model.graph(), top)?)
}
