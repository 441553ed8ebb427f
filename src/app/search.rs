use std::collections::HashSet;
use std::sync::Arc;

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::filter::ElementKey;
use crate::panels::PanelDefinition;

use super::{SearchMatchCache, ViewModel};

/// Element of one panel, as addressed by the dashboard.
pub(super) type PanelElement = (String, ElementKey);

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

/// Elements whose label or value fuzzy-matches `query`.
pub(super) fn search_elements(
    definitions: &[Arc<PanelDefinition>],
    query: &str,
) -> HashSet<PanelElement> {
    let matcher = SkimMatcherV2::default();
    definitions
        .iter()
        .flat_map(|definition| {
            definition.elements.iter().filter_map(|element| {
                let matched = fuzzy_match_score(&matcher, &element.label, query).is_some()
                    || fuzzy_match_score(&matcher, &element.key.value, query).is_some();
                matched.then(|| (definition.id.clone(), element.key.clone()))
            })
        })
        .collect()
}

impl ViewModel {
    pub(super) fn cached_search_matches(&mut self) -> Option<Arc<HashSet<PanelElement>>> {
        let search_query = self.search.trim();
        if search_query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.query == search_query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matches = Arc::new(search_elements(
            self.dashboard.definitions(),
            search_query,
        ));
        self.search_match_cache = Some(SearchMatchCache {
            query: search_query.to_owned(),
            matches: Arc::clone(&matches),
        });

        Some(matches)
    }
}
