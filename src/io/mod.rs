pub mod config_io;
pub mod lock;
pub mod log;
pub mod store;
pub mod sync;
pub mod watcher;
