mod dashboard;
mod definition;
mod load;
mod panel;
mod parse;

pub use dashboard::Dashboard;
pub use definition::{ElementSource, PanelCatalog, PanelDefinition};
pub use load::load_panel_catalog;
