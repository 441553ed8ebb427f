use std::sync::Arc;

use super::dataset::Dataset;
use super::model::{Adjustment, CorrelationModel, FallbackPolicy};
use super::selection::FilterSelection;

#[derive(Clone, Debug, PartialEq)]
pub enum SnapshotOrigin {
    Base,
    Adjusted { directives: usize },
    Fallback(FallbackPolicy),
}

impl SnapshotOrigin {
    pub fn is_filtered(&self) -> bool {
        !matches!(self, Self::Base)
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Base => "sem filtro".to_owned(),
            Self::Adjusted { directives } => format!("{directives} ajuste(s) aplicados"),
            Self::Fallback(FallbackPolicy::Identity) => {
                "filtro sem tabela de correlação (valores inalterados)".to_owned()
            }
            Self::Fallback(FallbackPolicy::UniformScale(ratio)) => {
                format!("filtro sem tabela de correlação (redução uniforme x{ratio})")
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct Snapshot {
    pub dataset: Arc<Dataset>,
    pub origin: SnapshotOrigin,
}

/// Without a selection the returned dataset is the base `Arc` itself.
pub fn recompute(
    base: &Arc<Dataset>,
    selection: Option<&FilterSelection>,
    model: &CorrelationModel,
) -> Snapshot {
    let Some(selection) = selection else {
        return Snapshot {
            dataset: Arc::clone(base),
            origin: SnapshotOrigin::Base,
        };
    };

    let Some(directives) = model.entry(selection.dimension(), selection.value()) else {
        let policy = model.fallback();
        log::debug!(
            "no correlation entry for {}, applying fallback {policy:?}",
            selection.key()
        );

        let dataset = match policy {
            FallbackPolicy::Identity => Arc::clone(base),
            FallbackPolicy::UniformScale(ratio) => {
                let mut derived = Dataset::clone(base);
                for count in derived.all_counts_mut() {
                    *count = Adjustment::Scale(ratio).apply(*count);
                }
                derived.recompute_derived_fields();
                Arc::new(derived)
            }
        };

        return Snapshot {
            dataset,
            origin: SnapshotOrigin::Fallback(policy),
        };
    };

    let mut derived = Dataset::clone(base);
    for directive in directives {
        if let Some(count) = derived.count_mut(&directive.field) {
            *count = directive.adjustment.apply(*count);
        }
    }
    derived.recompute_derived_fields();

    log::debug!(
        "recomputed snapshot for {} with {} directive(s)",
        selection.key(),
        directives.len()
    );

    Snapshot {
        dataset: Arc::new(derived),
        origin: SnapshotOrigin::Adjusted {
            directives: directives.len(),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::filter::dataset::{Breakdown, BreakdownEntry, FieldRef, Metric, Rate};
    use crate::filter::model::{RawCorrelationEntry, RawDirective};
    use crate::filter::selection::ElementKey;

    fn metric(key: &str, count: u64) -> Metric {
        Metric {
            key: key.to_owned(),
            label: key.to_owned(),
            count,
        }
    }

    fn entry(key: &str, count: u64) -> BreakdownEntry {
        BreakdownEntry {
            key: key.to_owned(),
            label: key.to_owned(),
            count,
            percentage: None,
        }
    }

    fn base() -> Arc<Dataset> {
        Arc::new(
            Dataset {
                metrics: vec![
                    metric("elegiveis", 8950),
                    metric("vinculados", 7720),
                    metric("naoVinculados", 1230),
                ],
                breakdowns: vec![Breakdown {
                    key: "risco".to_owned(),
                    label: "Nível de risco".to_owned(),
                    dimension: Some("risco".to_owned()),
                    exclusive: true,
                    entries: vec![
                        entry("baixo", 4210),
                        entry("moderado", 2630),
                        entry("alto", 1480),
                        entry("muito-alto", 630),
                    ],
                }],
                rates: vec![Rate {
                    key: "taxaVinculados".to_owned(),
                    label: "Taxa de vinculação".to_owned(),
                    numerator: FieldRef::parse("vinculados"),
                    denominator: FieldRef::parse("elegiveis"),
                    value: 0.0,
                }],
            }
            .into_base(),
        )
    }

    fn selectable() -> BTreeSet<ElementKey> {
        BTreeSet::from([
            ElementKey::new("status-vinculacao", "vinculados"),
            ElementKey::new("status-vinculacao", "naoVinculados"),
            ElementKey::new("risco", "baixo"),
            ElementKey::new("risco", "moderado"),
            ElementKey::new("risco", "alto"),
            ElementKey::new("risco", "muito-alto"),
        ])
    }

    fn model(fallback: FallbackPolicy) -> CorrelationModel {
        let entries = vec![
            RawCorrelationEntry {
                dimension: "status-vinculacao".to_owned(),
                value: "vinculados".to_owned(),
                directives: vec![RawDirective::Scale {
                    field: "naoVinculados".to_owned(),
                    factor: 0.1,
                }],
            },
            RawCorrelationEntry {
                dimension: "risco".to_owned(),
                value: "alto".to_owned(),
                directives: vec![
                    RawDirective::Scale {
                        field: "risco.baixo".to_owned(),
                        factor: 0.2,
                    },
                    RawDirective::Override {
                        field: "risco.moderado".to_owned(),
                        value: -500.0,
                    },
                    RawDirective::Scale {
                        field: "risco.alto".to_owned(),
                        factor: 2.5,
                    },
                ],
            },
            RawCorrelationEntry {
                dimension: "risco".to_owned(),
                value: "muito-alto".to_owned(),
                directives: vec![
                    RawDirective::Override {
                        field: "risco.baixo".to_owned(),
                        value: 0.0,
                    },
                    RawDirective::Override {
                        field: "risco.moderado".to_owned(),
                        value: 0.0,
                    },
                    RawDirective::Override {
                        field: "risco.alto".to_owned(),
                        value: 0.0,
                    },
                    RawDirective::Override {
                        field: "risco.muito-alto".to_owned(),
                        value: 0.0,
                    },
                ],
            },
        ];

        CorrelationModel::new(&base(), &selectable(), &entries, fallback).unwrap()
    }

    fn all_counts(dataset: &Dataset) -> Vec<u64> {
        dataset
            .metrics
            .iter()
            .map(|metric| metric.count)
            .chain(
                dataset
                    .breakdowns
                    .iter()
                    .flat_map(|breakdown| breakdown.entries.iter().map(|entry| entry.count)),
            )
            .collect()
    }

    #[test]
    fn no_selection_returns_the_base_itself() {
        let base = base();
        let snapshot = recompute(&base, None, &model(FallbackPolicy::Identity));

        assert!(Arc::ptr_eq(&snapshot.dataset, &base));
        assert_eq!(snapshot.origin, SnapshotOrigin::Base);
        assert!(!snapshot.origin.is_filtered());
    }

    #[test]
    fn scaling_a_sibling_leaves_the_selected_count_alone() {
        let base = base();
        let selection = FilterSelection::new("status-vinculacao", "vinculados", "Vinculados");
        let snapshot = recompute(&base, Some(&selection), &model(FallbackPolicy::Identity));
        let derived = &snapshot.dataset;

        let expected = (1230.0f64 * 0.1).round() as u64;
        assert_eq!(derived.metric("naoVinculados").unwrap().count, expected);
        assert_eq!(derived.metric("vinculados").unwrap().count, 7720);

        let vinculados = derived.metric("vinculados").unwrap().count as f64;
        let elegiveis = derived.metric("elegiveis").unwrap().count as f64;
        let expected_rate = (vinculados / elegiveis * 100.0 * 10.0).round() / 10.0;
        assert_eq!(derived.rate("taxaVinculados").unwrap().value, expected_rate);
        assert_eq!(snapshot.origin, SnapshotOrigin::Adjusted { directives: 1 });

        assert_eq!(base.metric("naoVinculados").unwrap().count, 1230);
    }

    #[test]
    fn percentages_are_recomputed_from_adjusted_counts() {
        let base = base();
        let selection = FilterSelection::new("risco", "alto", "Alto");
        let snapshot = recompute(&base, Some(&selection), &model(FallbackPolicy::Identity));
        let risco = snapshot.dataset.breakdown("risco").unwrap();

        let counts = risco.entries.iter().map(|entry| entry.count).collect::<Vec<_>>();
        assert_eq!(counts, vec![842, 0, 3700, 630]);

        let total = counts.iter().sum::<u64>() as f64;
        for entry in &risco.entries {
            let expected = ((entry.count as f64 / total * 100.0) * 10.0).round() / 10.0;
            assert_eq!(entry.percentage, Some(expected));
        }
        assert!((risco.percentage_sum() - 100.0).abs() <= 1.0);

        let base_risco = base.breakdown("risco").unwrap();
        assert!((base_risco.percentage_sum() - 100.0).abs() <= 1.0);
    }

    #[test]
    fn saturated_counts_do_not_overflow_totals() {
        let entries = [RawCorrelationEntry {
            dimension: "risco".to_owned(),
            value: "baixo".to_owned(),
            directives: vec![
                RawDirective::Scale {
                    field: "risco.baixo".to_owned(),
                    factor: 1e30,
                },
                RawDirective::Scale {
                    field: "risco.moderado".to_owned(),
                    factor: 1e30,
                },
            ],
        }];
        let model =
            CorrelationModel::new(&base(), &selectable(), &entries, FallbackPolicy::Identity)
                .unwrap();

        let selection = FilterSelection::new("risco", "baixo", "Baixo");
        let snapshot = recompute(&base(), Some(&selection), &model);
        let risco = snapshot.dataset.breakdown("risco").unwrap();

        assert_eq!(risco.total(), u64::MAX);
        for entry in &risco.entries {
            assert!(entry.percentage.is_some_and(|share| (0.0..=100.0).contains(&share)));
        }
    }

    #[test]
    fn emptied_breakdown_reports_zero_percentages() {
        let selection = FilterSelection::new("risco", "muito-alto", "Muito alto");
        let snapshot = recompute(&base(), Some(&selection), &model(FallbackPolicy::Identity));
        let risco = snapshot.dataset.breakdown("risco").unwrap();

        for entry in &risco.entries {
            assert_eq!(entry.percentage, Some(0.0));
            assert!(entry.percentage.is_some_and(f64::is_finite));
        }
    }

    #[test]
    fn missing_entry_keeps_counts_but_reports_filtered() {
        let base = base();
        let selection = FilterSelection::new("risco", "baixo", "Baixo");
        let snapshot = recompute(&base, Some(&selection), &model(FallbackPolicy::Identity));

        assert!(Arc::ptr_eq(&snapshot.dataset, &base));
        assert_eq!(
            snapshot.origin,
            SnapshotOrigin::Fallback(FallbackPolicy::Identity)
        );
        assert!(snapshot.origin.is_filtered());
    }

    #[test]
    fn uniform_fallback_shrinks_every_count() {
        let base = base();
        let selection = FilterSelection::new("risco", "baixo", "Baixo");
        let snapshot = recompute(
            &base,
            Some(&selection),
            &model(FallbackPolicy::UniformScale(0.85)),
        );

        let expected = all_counts(&base)
            .into_iter()
            .map(|count| (count as f64 * 0.85).round() as u64)
            .collect::<Vec<_>>();
        assert_eq!(all_counts(&snapshot.dataset), expected);
        assert!(!Arc::ptr_eq(&snapshot.dataset, &base));
    }

    #[test]
    fn recomputation_is_deterministic() {
        let base = base();
        let model = model(FallbackPolicy::UniformScale(0.85));

        for selection in [
            FilterSelection::new("risco", "alto", "Alto"),
            FilterSelection::new("risco", "baixo", "Baixo"),
            FilterSelection::new("status-vinculacao", "vinculados", "Vinculados"),
        ] {
            let first = recompute(&base, Some(&selection), &model);
            let second = recompute(&base, Some(&selection), &model);
            assert_eq!(*first.dataset, *second.dataset);
        }
    }

    #[test]
    fn every_selection_keeps_rates_and_shares_in_range() {
        let base = base();
        let model = model(FallbackPolicy::Identity);

        for key in selectable() {
            let selection = FilterSelection::from_key(key, "");
            let snapshot = recompute(&base, Some(&selection), &model);
            for rate in &snapshot.dataset.rates {
                assert!(rate.value >= 0.0);
            }
            for breakdown in &snapshot.dataset.breakdowns {
                let sum = breakdown.percentage_sum();
                assert!(sum == 0.0 || (sum - 100.0).abs() <= 1.0);
            }
        }
    }
}
