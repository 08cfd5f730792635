pub mod ai;
pub mod catalog;
pub mod core;
pub mod draft;
pub mod plan;
pub mod resources;
pub mod series;
