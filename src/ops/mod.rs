pub mod collision;
pub mod container_index;
pub mod drag;
pub mod engine;
pub mod position;
