mod binding;
mod cache;
mod dataset;
mod model;
mod propagation;
mod recalc;
mod selection;
mod toggle;

pub use binding::{ElementState, PresentationBinding};
pub use cache::SnapshotCache;
pub use dataset::{Breakdown, BreakdownEntry, Dataset, FieldRef, Metric, Rate};
pub use model::{CorrelationModel, FallbackPolicy, ModelError, RawCorrelationEntry};
pub use propagation::{
    ChannelSink, LocalFilterChange, LocalFilterStore, NavigationSink, SelectionSink,
};
pub use recalc::{Snapshot, SnapshotOrigin};
pub use selection::{ElementKey, FilterSelection};
pub use toggle::{ClickScope, ToggleController};
