//! Typed database handle
//!
//! [`Database`] ties a backend to a [`CollectionRegistry`] and executes
//! [`Cond`] filters against the collection of a [`Model`] type.
//!
//! A `Cond` discarded by a `false` guard is never sent to the backend: reads
//! return nothing and writes affect nothing.

use bson::Document;
use condor_cond::Cond;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::backends::DocumentBackend;
use crate::error::OdmResult;
use crate::options::{FindOptions, UpdateResult};
use crate::pipeline::Pipeline;
use crate::query::Query;
use crate::registry::{CollectionRegistry, Model};
use crate::settings::MongoSettings;

/// Backend plus collection registry
///
/// # Example
///
/// ```rust
/// use condor_cond::Cond;
/// use condor_odm::{Database, FindOptions, MemoryBackend, Model};
/// use bson::doc;
///
/// struct User;
/// impl Model for User {}
///
/// # futures::executor::block_on(async {
/// let db = Database::new(MemoryBackend::new());
/// db.insert::<User>(doc! { "name": "Alice", "age": 30 }).await.unwrap();
/// db.insert::<User>(doc! { "name": "Bob", "age": 12 }).await.unwrap();
///
/// let adults = Cond::new().gte("age", 18).unwrap();
/// let found = db.find::<User>(&adults, FindOptions::new()).await.unwrap();
/// assert_eq!(found.len(), 1);
///
/// let include_minors = false;
/// let skipped = Cond::new().filter(condor_cond::args![include_minors, "age", 12]).unwrap();
/// assert_eq!(db.delete::<User>(&skipped).await.unwrap(), 0);
/// # });
/// ```
pub struct Database<B: DocumentBackend> {
	backend: B,
	registry: CollectionRegistry,
	default_limit: Option<i64>,
}

impl<B: DocumentBackend> Database<B> {
	pub fn new(backend: B) -> Self {
		Self {
			backend,
			registry: CollectionRegistry::new(),
			default_limit: None,
		}
	}

	/// Create a handle using the read defaults of `settings`.
	pub fn with_settings(backend: B, settings: &MongoSettings) -> Self {
		Self::new(backend).with_default_limit(settings.default_limit)
	}

	pub fn with_registry(mut self, registry: CollectionRegistry) -> Self {
		self.registry = registry;
		self
	}

	/// Limit applied to reads whose options do not set one.
	pub fn with_default_limit(mut self, limit: Option<i64>) -> Self {
		self.default_limit = limit;
		self
	}

	pub fn backend(&self) -> &B {
		&self.backend
	}

	pub fn registry(&self) -> &CollectionRegistry {
		&self.registry
	}

	/// Collection name of `T`.
	pub fn collection<T: Model>(&self) -> String {
		self.registry.resolve::<T>()
	}

	/// Documents of `T` matching `cond`.
	pub async fn find<T: Model>(&self, cond: &Cond, options: FindOptions) -> OdmResult<Vec<Document>> {
		let collection = self.collection::<T>();
		if skipped("find", &collection, cond) {
			return Ok(Vec::new());
		}
		let filter = cond.to_bson();
		let options = options.or_limit(self.default_limit);
		debug!(backend = self.backend.name(), collection = %collection, filter = %filter, "find");
		self.backend.find_many(&collection, filter, options).await
	}

	/// First document of `T` matching `cond`.
	pub async fn find_one<T: Model>(&self, cond: &Cond) -> OdmResult<Option<Document>> {
		let collection = self.collection::<T>();
		if skipped("find_one", &collection, cond) {
			return Ok(None);
		}
		let filter = cond.to_bson();
		debug!(backend = self.backend.name(), collection = %collection, filter = %filter, "find_one");
		self.backend.find_one(&collection, filter).await
	}

	/// Matching documents deserialized into `T`.
	pub async fn find_as<T>(&self, cond: &Cond, options: FindOptions) -> OdmResult<Vec<T>>
	where
		T: Model + DeserializeOwned,
	{
		self.find::<T>(cond, options)
			.await?
			.into_iter()
			.map(|document| Ok(bson::deserialize_from_document(document)?))
			.collect()
	}

	/// Number of documents of `T` matching `cond`.
	pub async fn count<T: Model>(&self, cond: &Cond) -> OdmResult<u64> {
		let collection = self.collection::<T>();
		if skipped("count", &collection, cond) {
			return Ok(0);
		}
		let filter = cond.to_bson();
		debug!(backend = self.backend.name(), collection = %collection, filter = %filter, "count");
		self.backend.count(&collection, filter).await
	}

	/// Apply `update` to every document of `T` matching `cond`.
	pub async fn update<T: Model>(&self, cond: &Cond, update: Document) -> OdmResult<UpdateResult> {
		let collection = self.collection::<T>();
		if skipped("update", &collection, cond) {
			return Ok(UpdateResult::default());
		}
		let filter = cond.to_bson();
		debug!(backend = self.backend.name(), collection = %collection, filter = %filter, "update");
		self.backend.update_many(&collection, filter, update).await
	}

	/// Delete every document of `T` matching `cond`.
	pub async fn delete<T: Model>(&self, cond: &Cond) -> OdmResult<u64> {
		let collection = self.collection::<T>();
		if skipped("delete", &collection, cond) {
			return Ok(0);
		}
		let filter = cond.to_bson();
		debug!(backend = self.backend.name(), collection = %collection, filter = %filter, "delete");
		self.backend.delete_many(&collection, filter).await
	}

	/// Insert a raw document into the collection of `T`.
	pub async fn insert<T: Model>(&self, document: Document) -> OdmResult<String> {
		let collection = self.collection::<T>();
		debug!(backend = self.backend.name(), collection = %collection, "insert");
		self.backend.insert_one(&collection, document).await
	}

	/// Serialize `model` and insert it into its collection.
	pub async fn insert_model<T>(&self, model: &T) -> OdmResult<String>
	where
		T: Model + Serialize,
	{
		let document = bson::serialize_to_document(model)?;
		self.insert::<T>(document).await
	}

	/// Run an aggregation over the collection of `T`.
	pub async fn aggregate<T: Model>(&self, pipeline: Pipeline) -> OdmResult<Vec<Document>> {
		let collection = self.collection::<T>();
		if pipeline.is_skipped() {
			debug!(operation = "aggregate", collection = %collection, "condition skipped, backend not contacted");
			return Ok(Vec::new());
		}
		debug!(backend = self.backend.name(), collection = %collection, stages = pipeline.len(), "aggregate");
		self.backend.aggregate(&collection, pipeline.into_stages()).await
	}

	/// Execute a collection-bound [`Query`].
	pub async fn run(&self, query: &Query) -> OdmResult<Vec<Document>> {
		let collection = query.collection_name();
		if skipped("run", collection, query.cond()) {
			return Ok(Vec::new());
		}
		let filter = query.build_filter();
		let options = query.options().clone().or_limit(self.default_limit);
		debug!(backend = self.backend.name(), collection = %collection, filter = %filter, "run");
		self.backend.find_many(collection, filter, options).await
	}
}

fn skipped(operation: &str, collection: &str, cond: &Cond) -> bool {
	if cond.is_skipped() {
		debug!(operation, collection, "condition skipped, backend not contacted");
	}
	cond.is_skipped()
}
