//! MongoDB driver backend
//!
//! # Example
//!
//! ```rust,no_run
//! use condor_cond::Cond;
//! use condor_odm::{DocumentBackend, FindOptions, MongoBackend};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = MongoBackend::connect("mongodb://localhost:27017")
//! 	.await?
//! 	.with_database("myapp");
//!
//! let adults = Cond::new().gte("age", 18)?;
//! let users = backend
//! 	.find_many("users", adults.to_bson(), FindOptions::new().limit(20))
//! 	.await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use bson::{Bson, Document, doc};
use futures::stream::TryStreamExt;
use mongodb::options::ClientOptions;
use mongodb::{Client, ClientSession, Database};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::document::DocumentBackend;
use crate::error::{OdmError, OdmResult};
use crate::options::{FindOptions, UpdateResult};
use crate::settings::MongoSettings;

/// MongoDB backend
///
/// Cloning is cheap; clones share the driver's connection pool.
///
/// # Example
///
/// ```rust,no_run
/// use condor_odm::MongoBackend;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MongoBackend::builder()
/// 	.url("mongodb://localhost:27017")
/// 	.database("mydb")
/// 	.max_pool_size(100)
/// 	.min_pool_size(10)
/// 	.build()
/// 	.await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MongoBackend {
	client: Arc<Client>,
	database_name: String,
}

/// A running MongoDB transaction
///
/// Transactions need a replica set or a sharded cluster; a standalone server
/// rejects them.
pub struct MongoTransaction {
	session: Option<ClientSession>,
}

impl MongoTransaction {
	fn new(session: ClientSession) -> Self {
		Self {
			session: Some(session),
		}
	}

	/// Session to pass to driver calls that must run inside the transaction.
	pub fn session(&mut self) -> OdmResult<&mut ClientSession> {
		self.session
			.as_mut()
			.ok_or_else(|| OdmError::InvalidOperation("Transaction already consumed".to_string()))
	}

	/// Commit the transaction
	pub async fn commit(mut self) -> OdmResult<()> {
		let mut session = self
			.session
			.take()
			.ok_or_else(|| OdmError::InvalidOperation("Transaction already consumed".to_string()))?;

		session
			.commit_transaction()
			.await
			.map_err(|e| OdmError::Execution(format!("Failed to commit MongoDB transaction: {}", e)))
	}

	/// Roll the transaction back
	pub async fn rollback(mut self) -> OdmResult<()> {
		let mut session = self
			.session
			.take()
			.ok_or_else(|| OdmError::InvalidOperation("Transaction already consumed".to_string()))?;

		session.abort_transaction().await.map_err(|e| {
			OdmError::Execution(format!("Failed to rollback MongoDB transaction: {}", e))
		})
	}
}

/// Builder for configuring MongoDB connections
#[derive(Debug, Clone)]
pub struct MongoBackendBuilder {
	url: String,
	database: String,
	max_pool_size: Option<u32>,
	min_pool_size: Option<u32>,
	max_idle_time_secs: Option<u64>,
}

impl Default for MongoBackendBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl MongoBackendBuilder {
	/// Create a builder with the default settings
	pub fn new() -> Self {
		Self::from_settings(&MongoSettings::default())
	}

	/// Create a builder from loaded settings
	///
	/// # Example
	///
	/// ```rust
	/// use condor_odm::{MongoBackendBuilder, MongoSettings};
	///
	/// let settings = MongoSettings::from_toml_str("[mongodb]\ndatabase = \"shop\"\n").unwrap();
	/// let builder = MongoBackendBuilder::from_settings(&settings).max_pool_size(20);
	/// ```
	pub fn from_settings(settings: &MongoSettings) -> Self {
		Self {
			url: settings.url.clone(),
			database: settings.database.clone(),
			max_pool_size: settings.max_pool_size,
			min_pool_size: settings.min_pool_size,
			max_idle_time_secs: settings.max_idle_time_secs,
		}
	}

	/// Set the connection URL
	pub fn url(mut self, url: impl Into<String>) -> Self {
		self.url = url.into();
		self
	}

	/// Set the database name
	pub fn database(mut self, database: impl Into<String>) -> Self {
		self.database = database.into();
		self
	}

	/// Set the maximum connection pool size
	pub fn max_pool_size(mut self, size: u32) -> Self {
		self.max_pool_size = Some(size);
		self
	}

	/// Set the minimum connection pool size
	pub fn min_pool_size(mut self, size: u32) -> Self {
		self.min_pool_size = Some(size);
		self
	}

	/// Set the maximum idle time of pooled connections in seconds
	pub fn max_idle_time_secs(mut self, secs: u64) -> Self {
		self.max_idle_time_secs = Some(secs);
		self
	}

	/// Build the backend
	///
	/// The driver connects lazily; use [`DocumentBackend::health_check`] to
	/// verify the server is reachable.
	pub async fn build(self) -> OdmResult<MongoBackend> {
		let mut options = ClientOptions::parse(&self.url)
			.await
			.map_err(|e| OdmError::Connection(e.to_string()))?;

		if let Some(max_size) = self.max_pool_size {
			options.max_pool_size = Some(max_size);
		}
		if let Some(min_size) = self.min_pool_size {
			options.min_pool_size = Some(min_size);
		}
		if let Some(idle_time) = self.max_idle_time_secs {
			options.max_idle_time = Some(Duration::from_secs(idle_time));
		}

		let client =
			Client::with_options(options).map_err(|e| OdmError::Connection(e.to_string()))?;
		debug!(database = %self.database, "MongoDB client created");

		Ok(MongoBackend {
			client: Arc::new(client),
			database_name: self.database,
		})
	}
}

impl MongoBackend {
	/// Connect with a connection string, using the `test` database
	pub async fn connect(url: &str) -> OdmResult<Self> {
		MongoBackendBuilder::new().url(url).build().await
	}

	/// Connect with loaded settings
	pub async fn from_settings(settings: &MongoSettings) -> OdmResult<Self> {
		settings.validate()?;
		MongoBackendBuilder::from_settings(settings).build().await
	}

	pub fn builder() -> MongoBackendBuilder {
		MongoBackendBuilder::new()
	}

	/// Switch to another database on the same client
	pub fn with_database(mut self, database_name: &str) -> Self {
		self.database_name = database_name.to_string();
		self
	}

	pub fn database_name(&self) -> &str {
		&self.database_name
	}

	/// Driver handle of the current database
	pub fn database(&self) -> Database {
		self.client.database(&self.database_name)
	}

	/// Begin a transaction
	pub async fn begin_transaction(&self) -> OdmResult<MongoTransaction> {
		let mut session = self.client.start_session().await.map_err(|e| {
			OdmError::Connection(format!("Failed to start MongoDB session: {}", e))
		})?;

		session.start_transaction().await.map_err(|e| {
			OdmError::Execution(format!("Failed to start MongoDB transaction: {}", e))
		})?;

		Ok(MongoTransaction::new(session))
	}

	fn collection(&self, name: &str) -> mongodb::Collection<Document> {
		self.database().collection::<Document>(name)
	}
}

fn id_to_string(id: Bson) -> String {
	match id {
		Bson::ObjectId(oid) => oid.to_hex(),
		Bson::String(s) => s,
		other => other.to_string(),
	}
}

fn update_result(result: mongodb::results::UpdateResult) -> UpdateResult {
	let upserted_id = result.upserted_id.map(id_to_string);
	UpdateResult::new(
		result.matched_count,
		result.modified_count,
		u64::from(upserted_id.is_some()),
		upserted_id,
	)
}

#[async_trait]
impl DocumentBackend for MongoBackend {
	fn name(&self) -> &'static str {
		"mongodb"
	}

	async fn health_check(&self) -> OdmResult<()> {
		self.database()
			.run_command(doc! { "ping": 1 })
			.await
			.map_err(|e| OdmError::Connection(format!("Health check failed: {}", e)))?;
		Ok(())
	}

	async fn find_one(&self, collection: &str, filter: Document) -> OdmResult<Option<Document>> {
		self.collection(collection)
			.find_one(filter)
			.await
			.map_err(OdmError::from)
	}

	async fn find_many(
		&self,
		collection: &str,
		filter: Document,
		options: FindOptions,
	) -> OdmResult<Vec<Document>> {
		let mut mongo_options = mongodb::options::FindOptions::default();
		mongo_options.limit = options.limit;
		mongo_options.skip = options.skip;
		mongo_options.sort = options.sort;
		mongo_options.projection = options.projection;
		mongo_options.batch_size = options.batch_size;

		let cursor = self
			.collection(collection)
			.find(filter)
			.with_options(mongo_options)
			.await?;

		cursor
			.try_collect()
			.await
			.map_err(OdmError::from)
	}

	async fn count(&self, collection: &str, filter: Document) -> OdmResult<u64> {
		self.collection(collection)
			.count_documents(filter)
			.await
			.map_err(OdmError::from)
	}

	async fn insert_one(&self, collection: &str, document: Document) -> OdmResult<String> {
		let result = self
			.collection(collection)
			.insert_one(document)
			.await?;

		Ok(id_to_string(result.inserted_id))
	}

	async fn insert_many(
		&self,
		collection: &str,
		documents: Vec<Document>,
	) -> OdmResult<Vec<String>> {
		let result = self
			.collection(collection)
			.insert_many(documents)
			.await?;

		// inserted_ids is keyed by input position
		let mut ids: Vec<(usize, Bson)> = result.inserted_ids.into_iter().collect();
		ids.sort_by_key(|(index, _)| *index);
		Ok(ids.into_iter().map(|(_, id)| id_to_string(id)).collect())
	}

	async fn update_one(
		&self,
		collection: &str,
		filter: Document,
		update: Document,
	) -> OdmResult<UpdateResult> {
		let result = self
			.collection(collection)
			.update_one(filter, update)
			.await?;

		Ok(update_result(result))
	}

	async fn update_many(
		&self,
		collection: &str,
		filter: Document,
		update: Document,
	) -> OdmResult<UpdateResult> {
		let result = self
			.collection(collection)
			.update_many(filter, update)
			.await?;

		Ok(update_result(result))
	}

	async fn delete_one(&self, collection: &str, filter: Document) -> OdmResult<u64> {
		let result = self
			.collection(collection)
			.delete_one(filter)
			.await?;

		Ok(result.deleted_count)
	}

	async fn delete_many(&self, collection: &str, filter: Document) -> OdmResult<u64> {
		let result = self
			.collection(collection)
			.delete_many(filter)
			.await?;

		Ok(result.deleted_count)
	}

	async fn aggregate(
		&self,
		collection: &str,
		pipeline: Vec<Document>,
	) -> OdmResult<Vec<Document>> {
		let cursor = self
			.collection(collection)
			.aggregate(pipeline)
			.await?;

		cursor
			.try_collect()
			.await
			.map_err(OdmError::from)
	}
}
