//! Vector store adapters.

pub mod memory;
pub mod pinecone;

pub use memory::MemoryVectorStore;
pub use pinecone::{PineconeVectorStore, PineconeVectorStoreConfig};
