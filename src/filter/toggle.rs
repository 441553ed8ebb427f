use super::propagation::SelectionSink;
use super::selection::FilterSelection;

#[derive(Debug, Default)]
pub struct ClickScope {
    stopped: bool,
}

impl ClickScope {
    pub fn stop_propagation(&mut self) {
        self.stopped = true;
    }

    pub fn is_propagation_stopped(&self) -> bool {
        self.stopped
    }
}

pub fn toggle(
    current: Option<&FilterSelection>,
    clicked: FilterSelection,
) -> Option<FilterSelection> {
    match current {
        Some(active) if *active == clicked => None,
        _ => Some(clicked),
    }
}

pub struct ToggleController {
    selection: Option<FilterSelection>,
    sink: Option<Box<dyn SelectionSink>>,
}

impl ToggleController {
    /// The seed is read only here.
    pub fn mount(local_filter: Option<FilterSelection>) -> Self {
        Self {
            selection: local_filter,
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: impl SelectionSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn selection(&self) -> Option<&FilterSelection> {
        self.selection.as_ref()
    }

    pub fn on_element_click(
        &mut self,
        scope: &mut ClickScope,
        dimension: &str,
        value: &str,
        label: &str,
    ) -> Option<&FilterSelection> {
        scope.stop_propagation();

        let clicked = FilterSelection::new(dimension, value, label);
        self.selection = toggle(self.selection.as_ref(), clicked);
        log::debug!(
            "selection is now {}",
            self.selection
                .as_ref()
                .map_or_else(|| "none".to_owned(), ToString::to_string)
        );

        self.notify();
        self.selection.as_ref()
    }

    pub fn clear(&mut self) {
        if self.selection.take().is_some() {
            self.notify();
        }
    }

    fn notify(&mut self) {
        if let Some(sink) = self.sink.as_mut() {
            sink.notify(self.selection.as_ref());
        }
    }
}

impl std::fmt::Debug for ToggleController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToggleController")
            .field("selection", &self.selection)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}
