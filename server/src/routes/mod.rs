pub mod api;
pub mod distances;
