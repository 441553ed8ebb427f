use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use super::definition::PanelCatalog;
use super::parse::parse_panel_catalog;

const BUILTIN_CATALOG: &str = include_str!("../../assets/panels.json");

pub fn load_panel_catalog(path: Option<&Path>) -> Result<PanelCatalog> {
    let (source, raw) = match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read panel catalog {}", path.display()))?;
            (path.display().to_string(), raw)
        }
        None => ("built-in catalog".to_owned(), BUILTIN_CATALOG.to_owned()),
    };

    let raw_catalog =
        parse_panel_catalog(&raw).with_context(|| format!("failed to parse {source}"))?;
    let catalog = PanelCatalog::from_raw(raw_catalog)
        .with_context(|| format!("invalid panel definitions in {source}"))?;

    log::info!("loaded {} panel(s) from {source}", catalog.panels.len());
    Ok(catalog)
}
