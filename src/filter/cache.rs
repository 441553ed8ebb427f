use std::sync::Arc;

use super::dataset::Dataset;
use super::model::CorrelationModel;
use super::recalc::{Snapshot, recompute};
use super::selection::{ElementKey, FilterSelection};

#[derive(Debug, Default)]
pub struct SnapshotCache {
    entry: Option<SnapshotCacheEntry>,
    computations: u64,
}

#[derive(Debug)]
struct SnapshotCacheEntry {
    key: Option<ElementKey>,
    snapshot: Snapshot,
}

impl SnapshotCache {
    pub fn get_or_compute(
        &mut self,
        base: &Arc<Dataset>,
        selection: Option<&FilterSelection>,
        model: &CorrelationModel,
    ) -> &Snapshot {
        let key = selection.map(|selection| selection.key().clone());

        if self.entry.as_ref().is_some_and(|cached| cached.key != key) {
            self.entry = None;
        }

        let computations = &mut self.computations;
        let cached = self.entry.get_or_insert_with(|| {
            *computations += 1;
            SnapshotCacheEntry {
                snapshot: recompute(base, selection, model),
                key,
            }
        });
        &cached.snapshot
    }

    pub fn computations(&self) -> u64 {
        self.computations
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::filter::dataset::Metric;
    use crate::filter::model::FallbackPolicy;

    fn fixture() -> (Arc<Dataset>, CorrelationModel) {
        let base = Arc::new(Dataset {
            metrics: vec![Metric {
                key: "cadastrados".to_owned(),
                label: "Cadastrados".to_owned(),
                count: 100,
            }],
            ..Dataset::default()
        });
        let selectable = BTreeSet::from([ElementKey::new("etapa-funil", "cadastrados")]);
        let model =
            CorrelationModel::new(&base, &selectable, &[], FallbackPolicy::UniformScale(0.5))
                .unwrap();
        (base, model)
    }

    #[test]
    fn recomputes_once_per_distinct_selection() {
        let (base, model) = fixture();
        let mut cache = SnapshotCache::default();
        let selection = FilterSelection::new("etapa-funil", "cadastrados", "Cadastrados");

        for _ in 0..3 {
            cache.get_or_compute(&base, None, &model);
        }
        assert_eq!(cache.computations(), 1);

        for _ in 0..3 {
            let snapshot = cache.get_or_compute(&base, Some(&selection), &model);
            assert_eq!(snapshot.dataset.metric("cadastrados").unwrap().count, 50);
        }
        assert_eq!(cache.computations(), 2);

        let relabelled = FilterSelection::new("etapa-funil", "cadastrados", "Outro rótulo");
        cache.get_or_compute(&base, Some(&relabelled), &model);
        assert_eq!(cache.computations(), 2);

        let snapshot = cache.get_or_compute(&base, None, &model);
        assert!(Arc::ptr_eq(&snapshot.dataset, &base));
        assert_eq!(cache.computations(), 3);
    }
}
