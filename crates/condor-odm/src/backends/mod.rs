//! Document store backends

pub mod document;
pub mod memory;
#[cfg(feature = "mongodb")]
pub mod mongodb;

pub use document::DocumentBackend;
pub use memory::MemoryBackend;
#[cfg(feature = "mongodb")]
pub use mongodb::{MongoBackend, MongoBackendBuilder, MongoTransaction};
