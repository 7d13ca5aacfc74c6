//! AIMM Diagram — the interactive model editor core.
//!
//! Holds the live factor graph and the construction protocol around it:
//! placing factor nodes, drawing and weighting links, the two-node selection
//! used for manual linking, factor inspector popovers, and conversion of the
//! graph into the backend's model record. Nothing here renders; a UI
//! subscribes to [`GraphEvent`]s and [`EditorEvent`]s instead.

pub mod controller;
pub mod graph;
pub mod link;
pub mod node;
pub mod popover;
pub mod position;
pub mod selection;
pub mod serialize;
pub mod types;

pub use controller::DiagramController;
pub use graph::{GraphStats, GraphStore};
pub use popover::{Popover, PopoverController};
pub use position::PositionAllocator;
pub use selection::SelectionTracker;
pub use serialize::ModelMeta;
pub use types::*;
