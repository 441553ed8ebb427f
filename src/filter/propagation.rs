use std::collections::HashMap;
use std::sync::mpsc::Sender;

use super::selection::FilterSelection;

pub trait SelectionSink {
    fn notify(&mut self, selection: Option<&FilterSelection>);
}

impl<F> SelectionSink for F
where
    F: FnMut(Option<&FilterSelection>),
{
    fn notify(&mut self, selection: Option<&FilterSelection>) {
        self(selection)
    }
}

pub trait NavigationSink {
    fn navigate_to_table(&mut self, key: &str, context: Option<&str>);
}

#[derive(Clone, Debug, PartialEq)]
pub struct LocalFilterChange {
    pub panel_id: String,
    pub selection: Option<FilterSelection>,
}

#[derive(Clone, Debug)]
pub struct ChannelSink {
    panel_id: String,
    tx: Sender<LocalFilterChange>,
}

impl ChannelSink {
    pub fn new(panel_id: impl Into<String>, tx: Sender<LocalFilterChange>) -> Self {
        Self {
            panel_id: panel_id.into(),
            tx,
        }
    }
}

impl SelectionSink for ChannelSink {
    fn notify(&mut self, selection: Option<&FilterSelection>) {
        let change = LocalFilterChange {
            panel_id: self.panel_id.clone(),
            selection: selection.cloned(),
        };
        if self.tx.send(change).is_err() {
            log::debug!(
                "container for panel {} is gone, dropping selection change",
                self.panel_id
            );
        }
    }
}

/// Values stored here only seed panels when they are (re)mounted.
#[derive(Debug, Default)]
pub struct LocalFilterStore {
    filters: HashMap<String, FilterSelection>,
}

impl LocalFilterStore {
    pub fn store(&mut self, panel_id: &str, selection: Option<FilterSelection>) {
        match selection {
            Some(selection) => {
                self.filters.insert(panel_id.to_owned(), selection);
            }
            None => {
                self.filters.remove(panel_id);
            }
        }
    }

    pub fn seed_for(&self, panel_id: &str) -> Option<FilterSelection> {
        self.filters.get(panel_id).cloned()
    }

    pub fn active_count(&self) -> usize {
        self.filters.len()
    }
}
