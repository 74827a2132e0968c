//! Collection-bound queries
//!
//! A [`Query`] pairs a collection name with a [`Cond`] and read options.
//!
//! # Example
//!
//! ```rust
//! use condor_cond::args;
//! use condor_odm::Query;
//! use bson::doc;
//!
//! let query = Query::new("users")
//! 	.filter(args!["age >=", 18])?
//! 	.sort(doc! { "name": 1 })
//! 	.limit(10);
//!
//! assert_eq!(query.build_filter(), doc! { "age": { "$gte": 18 } });
//! # Ok::<(), condor_cond::CondError>(())
//! ```

use bson::Document;
use condor_cond::{Arg, Cond, CondResult};

use crate::options::{FindOptions, Page};

/// Query over one collection
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
	collection: String,
	cond: Cond,
	options: FindOptions,
}

impl Query {
	/// Create a query matching every document of `collection`.
	pub fn new(collection: &str) -> Self {
		Self {
			collection: collection.to_string(),
			cond: Cond::new(),
			options: FindOptions::default(),
		}
	}

	/// Replace the condition.
	pub fn with_cond(mut self, cond: Cond) -> Self {
		self.cond = cond;
		self
	}

	/// Add conditions in any shape accepted by [`Cond::filter`].
	pub fn filter(mut self, args: Vec<Arg>) -> CondResult<Self> {
		self.cond = self.cond.filter(args)?;
		Ok(self)
	}

	/// Add a `$or` group, see [`Cond::or`].
	pub fn or(mut self, args: Vec<Arg>) -> CondResult<Self> {
		self.cond = self.cond.or(args)?;
		Ok(self)
	}

	/// Replace the read options.
	pub fn with_options(mut self, options: FindOptions) -> Self {
		self.options = options;
		self
	}

	pub fn sort(mut self, sort: Document) -> Self {
		self.options.sort = Some(sort);
		self
	}

	pub fn limit(mut self, limit: i64) -> Self {
		self.options.limit = Some(limit);
		self
	}

	pub fn skip(mut self, skip: u64) -> Self {
		self.options.skip = Some(skip);
		self
	}

	pub fn projection(mut self, projection: Document) -> Self {
		self.options.projection = Some(projection);
		self
	}

	/// Select one page; sort and projection are kept.
	pub fn page(mut self, page: Page) -> Self {
		self.options = page.apply(self.options);
		self
	}

	pub fn collection_name(&self) -> &str {
		&self.collection
	}

	pub fn cond(&self) -> &Cond {
		&self.cond
	}

	pub fn options(&self) -> &FindOptions {
		&self.options
	}

	/// Serialized filter document; empty matches everything.
	pub fn build_filter(&self) -> Document {
		self.cond.to_bson()
	}

	/// Whether a `false` guard discarded the condition.
	pub fn is_skipped(&self) -> bool {
		self.cond.is_skipped()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use bson::doc;
	use condor_cond::args;
	use rstest::rstest;

	#[rstest]
	fn test_new_query() {
		let query = Query::new("users");
		assert_eq!(query.collection_name(), "users");
		assert!(query.build_filter().is_empty());
		assert!(!query.is_skipped());
		assert_eq!(query.options(), &FindOptions::default());
	}

	#[rstest]
	fn test_filter_and_or() {
		let query = Query::new("users")
			.filter(args!["active", true])
			.unwrap()
			.or(args![doc! { "role": "admin", "team": "ops" }])
			.unwrap();

		assert_eq!(
			query.build_filter(),
			doc! { "active": true, "$or": [{ "role": "admin" }, { "team": "ops" }] }
		);
	}

	#[rstest]
	fn test_skipped_query() {
		let query = Query::new("users").filter(args![false, "a", 1]).unwrap();
		assert!(query.is_skipped());
		assert!(query.build_filter().is_empty());
	}

	#[rstest]
	fn test_page_keeps_sort() {
		let query = Query::new("users")
			.sort(doc! { "name": 1 })
			.page(Page::new(3, 10));

		assert_eq!(query.options().skip, Some(20));
		assert_eq!(query.options().limit, Some(10));
		assert_eq!(query.options().sort, Some(doc! { "name": 1 }));
	}
}
