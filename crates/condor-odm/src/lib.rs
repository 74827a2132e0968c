//! # Condor ODM
//!
//! Executes [`condor_cond::Cond`] filters against a document store.
//!
//! - **Backends**: [`DocumentBackend`] with an in-memory implementation and,
//!   behind the `mongodb` feature, the MongoDB driver
//! - **Queries**: [`Query`], [`FindOptions`] and [`Page`] for reads,
//!   [`Pipeline`] for aggregations
//! - **Collections**: [`Model`] types resolved through a [`CollectionRegistry`]
//! - **Settings**: [`MongoSettings`] from TOML, environment or defaults
//!
//! ## Quick Start
//!
//! ```rust
//! use condor_cond::{args, Cond};
//! use condor_odm::{Database, MemoryBackend, Model, Page};
//! use bson::doc;
//!
//! struct Article;
//! impl Model for Article {}
//!
//! # futures::executor::block_on(async {
//! let db = Database::new(MemoryBackend::new());
//! db.insert::<Article>(doc! { "title": "Rust tips", "views": 120 }).await?;
//! db.insert::<Article>(doc! { "title": "Go tips", "views": 3 }).await?;
//!
//! let popular = Cond::new()
//! 	.filter(args!["views >", 100])?
//! 	.like("title", "rust")?;
//! let page = db.find::<Article>(&popular, Page::new(1, 20).to_options()).await?;
//! assert_eq!(page.len(), 1);
//! # Ok::<(), condor_odm::OdmError>(())
//! # }).unwrap();
//! ```

pub mod backends;
pub mod database;
pub mod error;
pub mod options;
pub mod pipeline;
pub mod query;
pub mod registry;
pub mod settings;

pub use backends::{DocumentBackend, MemoryBackend};
#[cfg(feature = "mongodb")]
pub use backends::{MongoBackend, MongoBackendBuilder, MongoTransaction};
pub use database::Database;
pub use error::{OdmError, OdmResult};
pub use options::{FindOptions, Page, UpdateResult};
pub use pipeline::Pipeline;
pub use query::Query;
pub use registry::{CollectionRegistry, Model, collection_name_for};
pub use settings::MongoSettings;
