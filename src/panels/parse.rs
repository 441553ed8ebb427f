use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;

use crate::filter::{ElementKey, FallbackPolicy, RawCorrelationEntry};

const SUPPORTED_VERSION: u32 = 1;

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawCatalog {
    #[serde(default = "default_version")]
    pub(super) version: u32,
    pub(super) panels: Vec<RawPanel>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawPanel {
    pub(super) id: String,
    pub(super) title: String,
    #[serde(default)]
    pub(super) table_key: Option<String>,
    #[serde(default)]
    pub(super) mirror_to: Vec<String>,
    #[serde(default)]
    pub(super) query_context: Value,
    #[serde(default)]
    pub(super) families: HashMap<String, String>,
    #[serde(default)]
    pub(super) metrics: Vec<RawMetric>,
    #[serde(default)]
    pub(super) rates: Vec<RawRate>,
    #[serde(default)]
    pub(super) breakdowns: Vec<RawBreakdown>,
    #[serde(default)]
    pub(super) model: RawModel,
    #[serde(default)]
    pub(super) initial_filter: Option<RawSelection>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawMetric {
    pub(super) key: String,
    pub(super) label: String,
    pub(super) count: u64,
    #[serde(default)]
    pub(super) select: Option<ElementKey>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawRate {
    pub(super) key: String,
    pub(super) label: String,
    pub(super) numerator: String,
    pub(super) denominator: String,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawBreakdown {
    pub(super) key: String,
    pub(super) label: String,
    #[serde(default)]
    pub(super) dimension: Option<String>,
    #[serde(default = "default_exclusive")]
    pub(super) exclusive: bool,
    pub(super) entries: Vec<RawEntry>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawEntry {
    pub(super) key: String,
    pub(super) label: String,
    pub(super) count: u64,
    #[serde(default)]
    pub(super) percentage: Option<f64>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub(super) struct RawModel {
    #[serde(default)]
    pub(super) fallback: FallbackPolicy,
    #[serde(default)]
    pub(super) entries: Vec<RawCorrelationEntry>,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawSelection {
    pub(super) dimension: String,
    pub(super) value: String,
    #[serde(default)]
    pub(super) label: Option<String>,
}

fn default_version() -> u32 {
    SUPPORTED_VERSION
}

fn default_exclusive() -> bool {
    true
}

pub(super) fn parse_panel_catalog(raw: &str) -> Result<RawCatalog> {
    let catalog: RawCatalog =
        serde_json::from_str(raw).context("invalid JSON in panel catalog")?;

    if catalog.version != SUPPORTED_VERSION {
        return Err(anyhow!(
            "unsupported panel catalog version {} (expected {SUPPORTED_VERSION})",
            catalog.version
        ));
    }

    if catalog.panels.is_empty() {
        Err(anyhow!("panel catalog declares no panels"))
    } else {
        Ok(catalog)
    }
}
