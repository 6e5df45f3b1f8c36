//! Step result stores backing the workflow driver.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStepStore;
pub use sqlite::SqliteStepStore;
