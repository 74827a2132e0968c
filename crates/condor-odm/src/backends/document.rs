//! Document-oriented backend trait

use async_trait::async_trait;
use bson::Document;

use crate::error::OdmResult;
use crate::options::{FindOptions, UpdateResult};

/// Operations a document store has to provide.
///
/// Filters are plain documents, usually produced by
/// [`condor_cond::Cond::to_bson`]; an empty filter matches everything.
///
/// # Example
///
/// ```rust,ignore
/// use condor_odm::DocumentBackend;
/// use bson::{doc, Document};
///
/// async fn find_user(db: &dyn DocumentBackend, email: &str) -> OdmResult<Option<Document>> {
/// 	db.find_one("users", doc! { "email": email }).await
/// }
/// ```
#[async_trait]
pub trait DocumentBackend: Send + Sync {
	/// Short backend name, used in logs.
	fn name(&self) -> &'static str;

	/// Check that the store is reachable.
	async fn health_check(&self) -> OdmResult<()>;

	/// First document matching `filter`.
	async fn find_one(&self, collection: &str, filter: Document) -> OdmResult<Option<Document>>;

	/// Every document matching `filter`, shaped by `options`.
	async fn find_many(
		&self,
		collection: &str,
		filter: Document,
		options: FindOptions,
	) -> OdmResult<Vec<Document>>;

	/// Number of documents matching `filter`.
	async fn count(&self, collection: &str, filter: Document) -> OdmResult<u64>;

	/// Insert one document and return its id as a string.
	async fn insert_one(&self, collection: &str, document: Document) -> OdmResult<String>;

	/// Insert several documents and return their ids in input order.
	async fn insert_many(&self, collection: &str, documents: Vec<Document>)
	-> OdmResult<Vec<String>>;

	/// Apply `update` to the first document matching `filter`.
	async fn update_one(
		&self,
		collection: &str,
		filter: Document,
		update: Document,
	) -> OdmResult<UpdateResult>;

	/// Apply `update` to every document matching `filter`.
	async fn update_many(
		&self,
		collection: &str,
		filter: Document,
		update: Document,
	) -> OdmResult<UpdateResult>;

	/// Delete the first document matching `filter`; returns 0 or 1.
	async fn delete_one(&self, collection: &str, filter: Document) -> OdmResult<u64>;

	/// Delete every document matching `filter`.
	async fn delete_many(&self, collection: &str, filter: Document) -> OdmResult<u64>;

	/// Run an aggregation pipeline.
	async fn aggregate(&self, collection: &str, pipeline: Vec<Document>)
	-> OdmResult<Vec<Document>>;
}
