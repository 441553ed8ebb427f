use std::collections::HashMap;

use super::selection::FilterSelection;

pub const DIMMED_OPACITY: f32 = 0.35;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ElementState {
    pub active: bool,
    pub dimmed: bool,
}

impl ElementState {
    pub fn opacity(self) -> f32 {
        if self.dimmed { DIMMED_OPACITY } else { 1.0 }
    }
}

/// A selection dims only elements of its own dimension family.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PresentationBinding {
    families: HashMap<String, String>,
}

impl PresentationBinding {
    pub fn new(families: HashMap<String, String>) -> Self {
        Self { families }
    }

    pub fn family_of<'a>(&'a self, dimension: &'a str) -> &'a str {
        self.families
            .get(dimension)
            .map(String::as_str)
            .unwrap_or(dimension)
    }

    pub fn state_of(
        &self,
        own_dimension: &str,
        own_value: &str,
        selection: Option<&FilterSelection>,
    ) -> ElementState {
        let Some(selection) = selection else {
            return ElementState::default();
        };

        let active = selection.matches(own_dimension, own_value);
        let same_family = self.family_of(selection.dimension()) == self.family_of(own_dimension);

        ElementState {
            active,
            dimmed: !active && same_family,
        }
    }
}
