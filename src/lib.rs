pub mod config;
pub mod sync;
pub mod template_sync;
pub mod workflow;
