//! CLI command handlers.

pub mod chunk;
pub mod config;
pub mod event;
pub mod index;
pub mod schema;

pub use chunk::{ChunkCommandInput, run_chunk};
pub use config::{run_config_show, run_config_validate};
pub use event::run_event;
pub use index::{IndexCommandInput, run_index};
pub use schema::run_event_schema;
