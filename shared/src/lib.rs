pub mod classify;
pub mod colors;
pub mod distance;
pub mod fetch;
pub mod hexagon;
pub mod recolor;
pub mod topology;

pub use classify::{DistanceCategory, classify, classify_entry, describe_minutes};
pub use distance::{DistanceTable, DistanceTableError, HexId};
pub use fetch::{FetchSequence, FetchTicket};
pub use hexagon::{Bounds, HexGeometry, HexStyle, Hexagon, HexagonSet, LonLat};
pub use recolor::{HexSurface, RecolorSummary, recolor};
pub use topology::{Topology, TopologyError};
