//! Read options, pagination and write results

use bson::Document;

/// Options for multi-document reads
///
/// # Example
///
/// ```rust
/// use condor_odm::FindOptions;
/// use bson::doc;
///
/// let options = FindOptions::new()
/// 	.limit(10)
/// 	.skip(20)
/// 	.sort(doc! { "created_at": -1 });
/// assert_eq!(options.limit, Some(10));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
	/// Maximum number of documents to return
	pub limit: Option<i64>,
	/// Number of documents to skip
	pub skip: Option<u64>,
	/// Sort specification, `1` ascending and `-1` descending
	pub sort: Option<Document>,
	/// Projection specification
	pub projection: Option<Document>,
	/// Cursor batch size
	pub batch_size: Option<u32>,
}

impl FindOptions {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn limit(mut self, limit: i64) -> Self {
		self.limit = Some(limit);
		self
	}

	pub fn skip(mut self, skip: u64) -> Self {
		self.skip = Some(skip);
		self
	}

	pub fn sort(mut self, sort: Document) -> Self {
		self.sort = Some(sort);
		self
	}

	pub fn projection(mut self, projection: Document) -> Self {
		self.projection = Some(projection);
		self
	}

	pub fn batch_size(mut self, batch_size: u32) -> Self {
		self.batch_size = Some(batch_size);
		self
	}

	/// Fill in `limit` when none was set.
	pub fn or_limit(mut self, limit: Option<i64>) -> Self {
		if self.limit.is_none() {
			self.limit = limit;
		}
		self
	}
}

/// One page of a paginated read, numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
	page: u64,
	per_page: u64,
}

impl Page {
	/// Create a page; page `0` is treated as page `1`.
	///
	/// # Example
	///
	/// ```rust
	/// use condor_odm::Page;
	///
	/// let options = Page::new(3, 25).to_options();
	/// assert_eq!(options.skip, Some(50));
	/// assert_eq!(options.limit, Some(25));
	/// ```
	pub fn new(page: u64, per_page: u64) -> Self {
		Self {
			page: page.max(1),
			per_page,
		}
	}

	pub fn page(&self) -> u64 {
		self.page
	}

	pub fn per_page(&self) -> u64 {
		self.per_page
	}

	/// Number of documents before this page.
	pub fn offset(&self) -> u64 {
		(self.page - 1).saturating_mul(self.per_page)
	}

	/// Skip/limit options selecting this page.
	pub fn to_options(&self) -> FindOptions {
		FindOptions::new()
			.skip(self.offset())
			.limit(i64::try_from(self.per_page).unwrap_or(i64::MAX))
	}

	/// Apply this page to existing options, keeping sort and projection.
	pub fn apply(&self, options: FindOptions) -> FindOptions {
		let paged = self.to_options();
		FindOptions {
			limit: paged.limit,
			skip: paged.skip,
			..options
		}
	}
}

/// Outcome of an update operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateResult {
	/// Documents matched by the filter
	pub matched_count: u64,
	/// Documents actually changed
	pub modified_count: u64,
	/// Documents inserted by an upsert
	pub upserted_count: u64,
	/// Identifier of the upserted document
	pub upserted_id: Option<String>,
}

impl UpdateResult {
	pub fn new(
		matched_count: u64,
		modified_count: u64,
		upserted_count: u64,
		upserted_id: Option<String>,
	) -> Self {
		Self {
			matched_count,
			modified_count,
			upserted_count,
			upserted_id,
		}
	}
}
