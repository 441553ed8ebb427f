use std::collections::{BTreeSet, HashMap};

use serde::Deserialize;
use thiserror::Error;

use super::dataset::{Dataset, FieldRef};
use super::selection::ElementKey;

const MAX_OVERRIDE: f64 = 1e12;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("directive for {key} targets unknown field `{field}`")]
    UnknownField { key: ElementKey, field: String },

    #[error("directive for {key} on `{field}` has invalid scale factor {factor} (must be finite and > 0)")]
    InvalidFactor {
        key: ElementKey,
        field: String,
        factor: f64,
    },

    #[error("directive for {key} on `{field}` has override {value} (must be finite and at most {max})", max = MAX_OVERRIDE)]
    InvalidOverride {
        key: ElementKey,
        field: String,
        value: f64,
    },

    #[error("directive for {key} on `{field}` has clamp min {min} above max {max}")]
    InvalidClamp {
        key: ElementKey,
        field: String,
        min: u64,
        max: u64,
    },

    #[error("correlation entry {key} is not a selectable element of this panel")]
    UnknownSelection { key: ElementKey },

    #[error("correlation entry {key} is declared more than once")]
    DuplicateEntry { key: ElementKey },

    #[error("fallback ratio {0} must be in (0, 1]")]
    InvalidFallback(f64),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Adjustment {
    Scale(f64),
    Override(f64),
    Clamp { min: Option<u64>, max: Option<u64> },
}

impl Adjustment {
    pub fn apply(self, count: u64) -> u64 {
        let adjusted = match self {
            Self::Scale(factor) => (count as f64 * factor).round(),
            Self::Override(value) => value.round(),
            Self::Clamp { min, max } => {
                let mut bounded = count;
                if let Some(max) = max {
                    bounded = bounded.min(max);
                }
                if let Some(min) = min {
                    bounded = bounded.max(min);
                }
                return bounded;
            }
        };

        if adjusted.is_finite() {
            adjusted.max(0.0) as u64
        } else {
            0
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Directive {
    pub field: FieldRef,
    pub adjustment: Adjustment,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    #[default]
    Identity,
    UniformScale(f64),
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawDirective {
    Scale {
        field: String,
        factor: f64,
    },
    Override {
        field: String,
        value: f64,
    },
    Clamp {
        field: String,
        #[serde(default)]
        min: Option<u64>,
        #[serde(default)]
        max: Option<u64>,
    },
}

impl RawDirective {
    fn field(&self) -> &str {
        match self {
            Self::Scale { field, .. } | Self::Override { field, .. } | Self::Clamp { field, .. } => {
                field
            }
        }
    }

    fn validate(&self, key: &ElementKey, base: &Dataset) -> Result<Directive, ModelError> {
        let field_name = self.field();
        let field = FieldRef::parse(field_name);
        if base.count(&field).is_none() {
            return Err(ModelError::UnknownField {
                key: key.clone(),
                field: field_name.to_owned(),
            });
        }

        let adjustment = match *self {
            Self::Scale { factor, .. } => {
                if !factor.is_finite() || factor <= 0.0 {
                    return Err(ModelError::InvalidFactor {
                        key: key.clone(),
                        field: field_name.to_owned(),
                        factor,
                    });
                }
                Adjustment::Scale(factor)
            }
            Self::Override { value, .. } => {
                if !value.is_finite() || value > MAX_OVERRIDE {
                    return Err(ModelError::InvalidOverride {
                        key: key.clone(),
                        field: field_name.to_owned(),
                        value,
                    });
                }
                Adjustment::Override(value)
            }
            Self::Clamp { min, max, .. } => {
                if let (Some(min), Some(max)) = (min, max)
                    && min > max
                {
                    return Err(ModelError::InvalidClamp {
                        key: key.clone(),
                        field: field_name.to_owned(),
                        min,
                        max,
                    });
                }
                Adjustment::Clamp { min, max }
            }
        };

        Ok(Directive { field, adjustment })
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawCorrelationEntry {
    pub dimension: String,
    pub value: String,
    #[serde(default)]
    pub directives: Vec<RawDirective>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CorrelationModel {
    entries: HashMap<String, HashMap<String, Vec<Directive>>>,
    fallback: FallbackPolicy,
}

impl CorrelationModel {
    pub fn new(
        base: &Dataset,
        selectable: &BTreeSet<ElementKey>,
        raw_entries: &[RawCorrelationEntry],
        fallback: FallbackPolicy,
    ) -> Result<Self, ModelError> {
        if let FallbackPolicy::UniformScale(ratio) = fallback
            && (!ratio.is_finite() || ratio <= 0.0 || ratio > 1.0)
        {
            return Err(ModelError::InvalidFallback(ratio));
        }

        let mut entries: HashMap<String, HashMap<String, Vec<Directive>>> = HashMap::new();

        for raw in raw_entries {
            let key = ElementKey::new(raw.dimension.as_str(), raw.value.as_str());
            if !selectable.contains(&key) {
                return Err(ModelError::UnknownSelection { key });
            }

            let directives = raw
                .directives
                .iter()
                .map(|directive| directive.validate(&key, base))
                .collect::<Result<Vec<_>, _>>()?;

            let by_value = entries.entry(key.dimension.clone()).or_default();
            if by_value.contains_key(&key.value) {
                return Err(ModelError::DuplicateEntry { key });
            }
            by_value.insert(key.value, directives);
        }

        Ok(Self { entries, fallback })
    }

    pub fn entry(&self, dimension: &str, value: &str) -> Option<&[Directive]> {
        self.entries
            .get(dimension)
            .and_then(|by_value| by_value.get(value))
            .map(Vec::as_slice)
    }

    pub fn fallback(&self) -> FallbackPolicy {
        self.fallback
    }

    pub fn entry_count(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }
}
