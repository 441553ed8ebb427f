use std::sync::Arc;

use crate::filter::{
    ClickScope, ElementKey, ElementState, FilterSelection, SelectionSink, Snapshot, SnapshotCache,
    ToggleController,
};

use super::definition::PanelDefinition;

#[derive(Debug)]
pub struct Panel {
    definition: Arc<PanelDefinition>,
    controller: ToggleController,
    cache: SnapshotCache,
}

impl Panel {
    pub fn mount(definition: Arc<PanelDefinition>, seed: Option<FilterSelection>) -> Self {
        let seed = definition.accept_seed(seed);
        Self {
            controller: ToggleController::mount(seed),
            cache: SnapshotCache::default(),
            definition,
        }
    }

    pub fn with_sink(mut self, sink: impl SelectionSink + 'static) -> Self {
        self.controller = self.controller.with_sink(sink);
        self
    }

    pub fn definition(&self) -> &Arc<PanelDefinition> {
        &self.definition
    }

    pub fn selection(&self) -> Option<&FilterSelection> {
        self.controller.selection()
    }

    pub fn click(&mut self, scope: &mut ClickScope, key: &ElementKey) -> bool {
        let Some(element) = self.definition.element(key) else {
            log::warn!(
                "panel {} received a click on unknown element {key}",
                self.definition.id
            );
            return false;
        };

        self.controller
            .on_element_click(scope, &key.dimension, &key.value, &element.label);
        true
    }

    pub fn clear(&mut self) {
        self.controller.clear();
    }

    pub fn snapshot(&mut self) -> &Snapshot {
        self.cache.get_or_compute(
            &self.definition.base,
            self.controller.selection(),
            &self.definition.model,
        )
    }

    pub fn element_state(&self, key: &ElementKey) -> ElementState {
        self.definition
            .binding
            .state_of(&key.dimension, &key.value, self.controller.selection())
    }

    pub fn navigation_context(&self) -> Option<String> {
        self.controller
            .selection()
            .map(|selection| selection.key().to_string())
    }

    pub fn computations(&self) -> u64 {
        self.cache.computations()
    }
}
