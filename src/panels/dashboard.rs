use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use crate::filter::{
    ChannelSink, ClickScope, ElementKey, FilterSelection, LocalFilterChange, LocalFilterStore,
    NavigationSink,
};

use super::definition::{PanelCatalog, PanelDefinition};
use super::panel::Panel;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigationRequest {
    pub key: String,
    pub context: Option<String>,
}

#[derive(Debug, Default)]
pub struct NavigationLog {
    requests: Vec<NavigationRequest>,
}

impl NavigationLog {
    pub fn last(&self) -> Option<&NavigationRequest> {
        self.requests.last()
    }

    pub fn requests(&self) -> &[NavigationRequest] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

impl NavigationSink for NavigationLog {
    fn navigate_to_table(&mut self, key: &str, context: Option<&str>) {
        log::info!(
            "navigation requested: table={key} context={}",
            context.unwrap_or("-")
        );
        self.requests.push(NavigationRequest {
            key: key.to_owned(),
            context: context.map(str::to_owned),
        });
    }
}

pub struct Dashboard {
    catalog: PanelCatalog,
    mounted: HashMap<String, Panel>,
    store: LocalFilterStore,
    tx: Sender<LocalFilterChange>,
    rx: Receiver<LocalFilterChange>,
    navigation: NavigationLog,
}

impl Dashboard {
    pub fn new(catalog: PanelCatalog) -> Self {
        let (tx, rx) = mpsc::channel();
        let mut store = LocalFilterStore::default();
        for definition in &catalog.panels {
            store.store(&definition.id, definition.initial_filter.clone());
        }

        let mut dashboard = Self {
            catalog,
            mounted: HashMap::new(),
            store,
            tx,
            rx,
            navigation: NavigationLog::default(),
        };

        dashboard.mirror_initial_filters();

        let ids = dashboard
            .catalog
            .panels
            .iter()
            .map(|definition| definition.id.clone())
            .collect::<Vec<_>>();
        for id in ids {
            dashboard.mount(&id);
        }

        dashboard
    }

    pub fn definitions(&self) -> &[Arc<PanelDefinition>] {
        &self.catalog.panels
    }

    fn definition(&self, panel_id: &str) -> Option<&Arc<PanelDefinition>> {
        self.catalog.panel(panel_id)
    }

    pub fn panel(&self, panel_id: &str) -> Option<&Panel> {
        self.mounted.get(panel_id)
    }

    pub fn panel_mut(&mut self, panel_id: &str) -> Option<&mut Panel> {
        self.mounted.get_mut(panel_id)
    }

    pub fn is_mounted(&self, panel_id: &str) -> bool {
        self.mounted.contains_key(panel_id)
    }

    pub fn mount(&mut self, panel_id: &str) -> bool {
        let Some(definition) = self.definition(panel_id).cloned() else {
            return false;
        };

        let seed = self.store.seed_for(panel_id);
        let panel = Panel::mount(definition, seed)
            .with_sink(ChannelSink::new(panel_id, self.tx.clone()));
        self.mounted.insert(panel_id.to_owned(), panel);
        true
    }

    pub fn unmount(&mut self, panel_id: &str) {
        self.mounted.remove(panel_id);
    }

    pub fn click(&mut self, panel_id: &str, key: &ElementKey, scope: &mut ClickScope) -> bool {
        let Some(panel) = self.mounted.get_mut(panel_id) else {
            return false;
        };

        let handled = panel.click(scope, key);
        self.sync();
        handled
    }

    pub fn clear(&mut self, panel_id: &str) {
        if let Some(panel) = self.mounted.get_mut(panel_id) {
            panel.clear();
        }
        self.sync();
    }

    pub fn clear_all(&mut self) {
        for panel in self.mounted.values_mut() {
            panel.clear();
        }
        self.sync();
    }

    /// Returns the number of changes processed.
    pub fn sync(&mut self) -> usize {
        let changes = self.rx.try_iter().collect::<Vec<_>>();
        for change in &changes {
            let previous = self.store.seed_for(&change.panel_id);
            self.store
                .store(&change.panel_id, change.selection.clone());
            self.mirror(change, previous.as_ref());
        }
        changes.len()
    }

    /// Catalog seeds reach siblings that have no seed of their own.
    fn mirror_initial_filters(&mut self) {
        let seeded = self
            .catalog
            .panels
            .iter()
            .filter_map(|definition| {
                let seed = definition.initial_filter.clone()?;
                definition
                    .accepts(seed.key())
                    .then(|| (Arc::clone(definition), seed))
            })
            .collect::<Vec<_>>();

        for (source, seed) in seeded {
            for sibling_id in &source.mirror_to {
                let Some(sibling) = self.definition(sibling_id).cloned() else {
                    continue;
                };
                if sibling.initial_filter.is_none() && sibling.accepts(seed.key()) {
                    self.store.store(sibling_id, Some(seed.clone()));
                }
            }
        }
    }

    fn current_key(&self, panel_id: &str) -> Option<ElementKey> {
        match self.mounted.get(panel_id) {
            Some(panel) => panel.selection().map(|selection| selection.key().clone()),
            None => self
                .store
                .seed_for(panel_id)
                .map(|selection| selection.key().clone()),
        }
    }

    fn mirror(&mut self, change: &LocalFilterChange, previous: Option<&FilterSelection>) {
        let Some(source) = self.definition(&change.panel_id).cloned() else {
            return;
        };

        for sibling_id in &source.mirror_to {
            let Some(sibling) = self.definition(sibling_id).cloned() else {
                continue;
            };

            // A clear only reaches siblings still showing what was cleared.
            let accepted = match &change.selection {
                Some(selection) => sibling.accepts(selection.key()),
                None => previous.is_some_and(|previous| {
                    self.current_key(sibling_id).as_ref() == Some(previous.key())
                }),
            };
            if !accepted {
                log::debug!(
                    "panel {sibling_id} keeps its selection despite the change in {}",
                    change.panel_id
                );
                continue;
            }

            self.store.store(sibling_id, change.selection.clone());
            if self.is_mounted(sibling_id) {
                self.mount(sibling_id);
            }
        }
    }

    pub fn navigate(&mut self, panel_id: &str) -> bool {
        let Some(definition) = self.definition(panel_id).cloned() else {
            return false;
        };
        let Some(table_key) = definition.table_key.as_deref() else {
            return false;
        };

        let context = self
            .mounted
            .get(panel_id)
            .and_then(Panel::navigation_context);
        self.navigation
            .navigate_to_table(table_key, context.as_deref());
        true
    }

    pub fn navigation(&self) -> &NavigationLog {
        &self.navigation
    }

    pub fn active_filter_count(&self) -> usize {
        self.mounted
            .values()
            .filter(|panel| panel.selection().is_some())
            .count()
    }

    pub fn stored_filter_count(&self) -> usize {
        self.store.active_count()
    }
}
