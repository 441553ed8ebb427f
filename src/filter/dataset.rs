use std::fmt;

use crate::util::share_percent;

/// `"metric"` or `"breakdown.entry"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FieldRef {
    Metric(String),
    Entry { breakdown: String, entry: String },
}

impl FieldRef {
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('.') {
            Some((breakdown, entry)) => Self::Entry {
                breakdown: breakdown.to_owned(),
                entry: entry.to_owned(),
            },
            None => Self::Metric(raw.to_owned()),
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Metric(key) => f.write_str(key),
            Self::Entry { breakdown, entry } => write!(f, "{breakdown}.{entry}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Metric {
    pub key: String,
    pub label: String,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BreakdownEntry {
    pub key: String,
    pub label: String,
    pub count: u64,
    pub percentage: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Breakdown {
    pub key: String,
    pub label: String,
    pub dimension: Option<String>,
    pub exclusive: bool,
    pub entries: Vec<BreakdownEntry>,
}

impl Breakdown {
    pub fn total(&self) -> u64 {
        self.entries
            .iter()
            .fold(0u64, |total, entry| total.saturating_add(entry.count))
    }

    pub fn percentage_sum(&self) -> f64 {
        self.entries
            .iter()
            .map(|entry| entry.percentage.unwrap_or(0.0))
            .sum()
    }

    fn recompute_percentages(&mut self) {
        let total = self.total();
        for entry in &mut self.entries {
            entry.percentage = Some(share_percent(entry.count, total));
        }
    }

    fn fill_missing_percentages(&mut self) {
        let total = self.total();
        for entry in &mut self.entries {
            if entry.percentage.is_none() {
                entry.percentage = Some(share_percent(entry.count, total));
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Rate {
    pub key: String,
    pub label: String,
    pub numerator: FieldRef,
    pub denominator: FieldRef,
    pub value: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    pub metrics: Vec<Metric>,
    pub breakdowns: Vec<Breakdown>,
    pub rates: Vec<Rate>,
}

impl Dataset {
    pub fn into_base(mut self) -> Self {
        for breakdown in &mut self.breakdowns {
            breakdown.fill_missing_percentages();
        }
        self.recompute_rates();
        self
    }

    pub fn metric(&self, key: &str) -> Option<&Metric> {
        self.metrics.iter().find(|metric| metric.key == key)
    }

    pub fn breakdown(&self, key: &str) -> Option<&Breakdown> {
        self.breakdowns.iter().find(|breakdown| breakdown.key == key)
    }

    pub fn rate(&self, key: &str) -> Option<&Rate> {
        self.rates.iter().find(|rate| rate.key == key)
    }

    pub fn count(&self, field: &FieldRef) -> Option<u64> {
        match field {
            FieldRef::Metric(key) => self.metric(key).map(|metric| metric.count),
            FieldRef::Entry { breakdown, entry } => self
                .breakdown(breakdown)?
                .entries
                .iter()
                .find(|candidate| &candidate.key == entry)
                .map(|entry| entry.count),
        }
    }

    pub(super) fn count_mut(&mut self, field: &FieldRef) -> Option<&mut u64> {
        match field {
            FieldRef::Metric(key) => self
                .metrics
                .iter_mut()
                .find(|metric| &metric.key == key)
                .map(|metric| &mut metric.count),
            FieldRef::Entry { breakdown, entry } => self
                .breakdowns
                .iter_mut()
                .find(|candidate| &candidate.key == breakdown)?
                .entries
                .iter_mut()
                .find(|candidate| &candidate.key == entry)
                .map(|entry| &mut entry.count),
        }
    }

    pub(super) fn all_counts_mut(&mut self) -> impl Iterator<Item = &mut u64> {
        let metrics = self.metrics.iter_mut().map(|metric| &mut metric.count);
        let entries = self
            .breakdowns
            .iter_mut()
            .flat_map(|breakdown| breakdown.entries.iter_mut().map(|entry| &mut entry.count));
        metrics.chain(entries)
    }

    pub(super) fn recompute_derived_fields(&mut self) {
        for breakdown in &mut self.breakdowns {
            breakdown.recompute_percentages();
        }
        self.recompute_rates();
    }

    fn recompute_rates(&mut self) {
        let values = self
            .rates
            .iter()
            .map(|rate| {
                let numerator = self.count(&rate.numerator).unwrap_or(0);
                let denominator = self.count(&rate.denominator).unwrap_or(0);
                share_percent(numerator, denominator)
            })
            .collect::<Vec<_>>();

        for (rate, value) in self.rates.iter_mut().zip(values) {
            rate.value = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn age_breakdown() -> Breakdown {
        Breakdown {
            key: "faixaEtaria".to_owned(),
            label: "Faixa etária".to_owned(),
            dimension: Some("faixa-etaria".to_owned()),
            exclusive: true,
            entries: vec![
                BreakdownEntry {
                    key: "0-19".to_owned(),
                    label: "0 a 19".to_owned(),
                    count: 1,
                    percentage: None,
                },
                BreakdownEntry {
                    key: "20-59".to_owned(),
                    label: "20 a 59".to_owned(),
                    count: 1,
                    percentage: None,
                },
                BreakdownEntry {
                    key: "60+".to_owned(),
                    label: "60 ou mais".to_owned(),
                    count: 1,
                    percentage: Some(40.0),
                },
            ],
        }
    }

    #[test]
    fn totals_saturate_instead_of_overflowing() {
        let mut breakdown = age_breakdown();
        breakdown.entries[0].count = u64::MAX;
        breakdown.entries[1].count = u64::MAX;

        assert_eq!(breakdown.total(), u64::MAX);

        let mut dataset = Dataset {
            breakdowns: vec![breakdown],
            ..Dataset::default()
        };
        dataset.recompute_derived_fields();
        assert!(
            dataset.breakdowns[0]
                .entries
                .iter()
                .all(|entry| entry.percentage.is_some_and(f64::is_finite))
        );
    }

    #[test]
    fn field_refs_split_on_first_dot() {
        assert_eq!(
            FieldRef::parse("vinculados"),
            FieldRef::Metric("vinculados".to_owned())
        );
        assert_eq!(
            FieldRef::parse("exames.IMC/Peso"),
            FieldRef::Entry {
                breakdown: "exames".to_owned(),
                entry: "IMC/Peso".to_owned(),
            }
        );
        assert_eq!(FieldRef::parse("exames.IMC/Peso").to_string(), "exames.IMC/Peso");
    }

    #[test]
    fn base_keeps_given_percentages_and_fills_missing_ones() {
        let dataset = Dataset {
            breakdowns: vec![age_breakdown()],
            ..Dataset::default()
        }
        .into_base();

        let breakdown = dataset.breakdown("faixaEtaria").unwrap();
        let percentages = breakdown
            .entries
            .iter()
            .map(|entry| entry.percentage)
            .collect::<Vec<_>>();
        assert_eq!(percentages, vec![Some(33.3), Some(33.3), Some(40.0)]);
    }

    #[test]
    fn recomputation_discards_stale_percentages() {
        let mut dataset = Dataset {
            breakdowns: vec![age_breakdown()],
            ..Dataset::default()
        };
        dataset.recompute_derived_fields();

        let breakdown = dataset.breakdown("faixaEtaria").unwrap();
        assert_eq!(breakdown.entries[2].percentage, Some(33.3));
        assert!((breakdown.percentage_sum() - 100.0).abs() <= 1.0);
    }

    #[test]
    fn rates_follow_counts_and_survive_zero_denominators() {
        let mut dataset = Dataset {
            metrics: vec![
                Metric {
                    key: "elegiveis".to_owned(),
                    label: "Elegíveis".to_owned(),
                    count: 0,
                },
                Metric {
                    key: "vinculados".to_owned(),
                    label: "Vinculados".to_owned(),
                    count: 10,
                },
            ],
            rates: vec![Rate {
                key: "taxaVinculados".to_owned(),
                label: "Taxa de vinculação".to_owned(),
                numerator: FieldRef::parse("vinculados"),
                denominator: FieldRef::parse("elegiveis"),
                value: 99.0,
            }],
            ..Dataset::default()
        };

        dataset.recompute_derived_fields();
        assert_eq!(dataset.rate("taxaVinculados").unwrap().value, 0.0);

        *dataset.count_mut(&FieldRef::parse("elegiveis")).unwrap() = 40;
        dataset.recompute_derived_fields();
        assert_eq!(dataset.rate("taxaVinculados").unwrap().value, 25.0);
    }
}
