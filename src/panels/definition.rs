use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::filter::{
    Breakdown, BreakdownEntry, CorrelationModel, Dataset, ElementKey, FieldRef, FilterSelection,
    Metric, ModelError, PresentationBinding, Rate,
};

use super::parse::{RawCatalog, RawPanel};

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("panel `{0}` is declared more than once")]
    DuplicatePanel(String),

    #[error("panel `{panel}`: key `{key}` is declared more than once")]
    DuplicateKey { panel: String, key: String },

    #[error("panel `{panel}`: key `{key}` must not contain '.'")]
    InvalidKey { panel: String, key: String },

    #[error("panel `{panel}`: rate `{rate}` refers to unknown field `{field}`")]
    UnknownRateField {
        panel: String,
        rate: String,
        field: String,
    },

    #[error("panel `{panel}` mirrors its selection to unknown panel `{sibling}`")]
    UnknownSibling { panel: String, sibling: String },

    #[error("panel `{panel}` has an invalid correlation model")]
    Model {
        panel: String,
        #[source]
        source: ModelError,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ElementSource {
    Metric(String),
    Entry { breakdown: String, entry: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub key: ElementKey,
    pub label: String,
    pub source: ElementSource,
}

#[derive(Debug)]
pub struct PanelDefinition {
    pub id: String,
    pub title: String,
    pub base: Arc<Dataset>,
    pub model: CorrelationModel,
    pub binding: PresentationBinding,
    pub elements: Vec<Element>,
    pub table_key: Option<String>,
    pub mirror_to: Vec<String>,
    pub query_context: Value,
    pub initial_filter: Option<FilterSelection>,
    selectable: BTreeSet<ElementKey>,
}

impl PanelDefinition {
    fn from_raw(raw: RawPanel) -> Result<Self, PanelError> {
        let panel = raw.id.clone();
        let mut seen_keys = HashSet::new();
        let mut claim_key = |key: &str| -> Result<(), PanelError> {
            if key.contains('.') {
                return Err(PanelError::InvalidKey {
                    panel: panel.clone(),
                    key: key.to_owned(),
                });
            }
            if !seen_keys.insert(key.to_owned()) {
                return Err(PanelError::DuplicateKey {
                    panel: panel.clone(),
                    key: key.to_owned(),
                });
            }
            Ok(())
        };

        let mut elements = Vec::new();
        let mut metrics = Vec::with_capacity(raw.metrics.len());
        for metric in raw.metrics {
            claim_key(&metric.key)?;
            if let Some(key) = metric.select {
                elements.push(Element {
                    key,
                    label: metric.label.clone(),
                    source: ElementSource::Metric(metric.key.clone()),
                });
            }
            metrics.push(Metric {
                key: metric.key,
                label: metric.label,
                count: metric.count,
            });
        }

        let mut breakdowns = Vec::with_capacity(raw.breakdowns.len());
        for breakdown in raw.breakdowns {
            claim_key(&breakdown.key)?;

            let mut entry_keys = HashSet::new();
            let mut entries = Vec::with_capacity(breakdown.entries.len());
            for entry in breakdown.entries {
                if !entry_keys.insert(entry.key.clone()) {
                    return Err(PanelError::DuplicateKey {
                        panel: raw.id.clone(),
                        key: format!("{}.{}", breakdown.key, entry.key),
                    });
                }

                if let Some(dimension) = &breakdown.dimension {
                    elements.push(Element {
                        key: ElementKey::new(dimension.as_str(), entry.key.as_str()),
                        label: entry.label.clone(),
                        source: ElementSource::Entry {
                            breakdown: breakdown.key.clone(),
                            entry: entry.key.clone(),
                        },
                    });
                }

                entries.push(BreakdownEntry {
                    key: entry.key,
                    label: entry.label,
                    count: entry.count,
                    percentage: entry.percentage,
                });
            }

            breakdowns.push(Breakdown {
                key: breakdown.key,
                label: breakdown.label,
                dimension: breakdown.dimension,
                exclusive: breakdown.exclusive,
                entries,
            });
        }

        let counts_only = Dataset {
            metrics,
            breakdowns,
            rates: Vec::new(),
        };

        let mut rates = Vec::with_capacity(raw.rates.len());
        for rate in raw.rates {
            claim_key(&rate.key)?;
            let numerator = FieldRef::parse(&rate.numerator);
            let denominator = FieldRef::parse(&rate.denominator);
            for (field, name) in [(&numerator, &rate.numerator), (&denominator, &rate.denominator)]
            {
                if counts_only.count(field).is_none() {
                    return Err(PanelError::UnknownRateField {
                        panel: raw.id.clone(),
                        rate: rate.key.clone(),
                        field: name.clone(),
                    });
                }
            }
            rates.push(Rate {
                key: rate.key,
                label: rate.label,
                numerator,
                denominator,
                value: 0.0,
            });
        }

        let base = Dataset {
            rates,
            ..counts_only
        }
        .into_base();
        warn_on_open_breakdowns(&raw.id, &base);

        let selectable = elements
            .iter()
            .map(|element| element.key.clone())
            .collect::<BTreeSet<_>>();

        let model = CorrelationModel::new(
            &base,
            &selectable,
            &raw.model.entries,
            raw.model.fallback,
        )
        .map_err(|source| PanelError::Model {
            panel: raw.id.clone(),
            source,
        })?;

        let mut definition = Self {
            id: raw.id,
            title: raw.title,
            base: Arc::new(base),
            model,
            binding: PresentationBinding::new(raw.families),
            elements,
            table_key: raw.table_key,
            mirror_to: raw.mirror_to,
            query_context: raw.query_context,
            initial_filter: None,
            selectable,
        };

        definition.initial_filter = raw.initial_filter.and_then(|seed| {
            let key = ElementKey::new(seed.dimension, seed.value);
            let label = seed
                .label
                .or_else(|| definition.element(&key).map(|element| element.label.clone()))
                .unwrap_or_else(|| key.value.clone());
            definition.accept_seed(Some(FilterSelection::from_key(key, label)))
        });

        Ok(definition)
    }

    pub fn accepts(&self, key: &ElementKey) -> bool {
        self.selectable.contains(key)
    }

    pub fn element(&self, key: &ElementKey) -> Option<&Element> {
        self.elements.iter().find(|element| &element.key == key)
    }

    pub fn accept_seed(&self, seed: Option<FilterSelection>) -> Option<FilterSelection> {
        let seed = seed?;
        if self.accepts(seed.key()) {
            Some(seed)
        } else {
            log::warn!(
                "panel {} ignores seed {} outside its selectable set",
                self.id,
                seed.key()
            );
            None
        }
    }

    pub fn dimensions(&self) -> BTreeSet<&str> {
        self.selectable
            .iter()
            .map(|key| key.dimension.as_str())
            .collect()
    }
}

fn warn_on_open_breakdowns(panel: &str, base: &Dataset) {
    for breakdown in base.breakdowns.iter().filter(|breakdown| breakdown.exclusive) {
        let sum = breakdown.percentage_sum();
        if breakdown.total() > 0 && (sum - 100.0).abs() > 1.0 {
            log::warn!(
                "panel {panel}: percentages of `{}` sum to {sum:.1}, expected 100",
                breakdown.key
            );
        }
    }
}

#[derive(Debug)]
pub struct PanelCatalog {
    pub panels: Vec<Arc<PanelDefinition>>,
}

impl PanelCatalog {
    pub(super) fn from_raw(raw: RawCatalog) -> Result<Self, PanelError> {
        let mut ids = HashSet::new();
        for panel in &raw.panels {
            if !ids.insert(panel.id.clone()) {
                return Err(PanelError::DuplicatePanel(panel.id.clone()));
            }
        }

        for panel in &raw.panels {
            if let Some(sibling) = panel.mirror_to.iter().find(|sibling| !ids.contains(*sibling)) {
                return Err(PanelError::UnknownSibling {
                    panel: panel.id.clone(),
                    sibling: sibling.clone(),
                });
            }
        }

        let panels = raw
            .panels
            .into_iter()
            .map(|panel| PanelDefinition::from_raw(panel).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { panels })
    }

    pub fn panel(&self, id: &str) -> Option<&Arc<PanelDefinition>> {
        self.panels.iter().find(|panel| panel.id == id)
    }
}
