//! Aggregation pipeline builder

use bson::{Document, doc};
use condor_cond::Cond;

use crate::query::Query;

/// Ordered list of aggregation stages
///
/// # Example
///
/// ```rust
/// use condor_cond::Cond;
/// use condor_odm::Pipeline;
/// use bson::doc;
///
/// let cond = Cond::new().equal("status", "paid")?;
/// let pipeline = Pipeline::new()
/// 	.match_cond(&cond)
/// 	.group(doc! { "_id": "$customer", "total": { "$sum": "$amount" } })
/// 	.sort(doc! { "total": -1 })
/// 	.limit(5);
///
/// assert_eq!(pipeline.len(), 4);
/// assert_eq!(pipeline.stages()[0], doc! { "$match": { "status": "paid" } });
/// # Ok::<(), condor_cond::CondError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
	stages: Vec<Document>,
	skipped: bool,
}

impl Pipeline {
	pub fn new() -> Self {
		Self::default()
	}

	/// Derive `$match`, `$sort`, `$skip`, `$limit` and `$project` stages, in
	/// that order, from a query.
	pub fn from_query(query: &Query) -> Self {
		let options = query.options();
		let mut pipeline = Self::new().match_cond(query.cond());

		if let Some(sort) = &options.sort {
			pipeline = pipeline.sort(sort.clone());
		}
		if let Some(skip) = options.skip {
			pipeline = pipeline.skip(skip);
		}
		if let Some(limit) = options.limit {
			pipeline = pipeline.limit(limit);
		}
		if let Some(projection) = &options.projection {
			pipeline = pipeline.project(projection.clone());
		}
		pipeline
	}

	/// Add a `$match` stage from a condition; nothing is added for an empty
	/// filter.
	///
	/// A skipped condition marks the whole pipeline as skipped, so it
	/// yields no documents when executed.
	pub fn match_cond(mut self, cond: &Cond) -> Self {
		if cond.is_skipped() {
			self.skipped = true;
			return self;
		}
		self.match_doc(cond.to_bson())
	}

	/// Add a `$match` stage; nothing is added for an empty filter.
	pub fn match_doc(mut self, filter: Document) -> Self {
		if !filter.is_empty() {
			self.stages.push(doc! { "$match": filter });
		}
		self
	}

	pub fn sort(mut self, sort: Document) -> Self {
		self.stages.push(doc! { "$sort": sort });
		self
	}

	pub fn skip(mut self, skip: u64) -> Self {
		self.stages
			.push(doc! { "$skip": i64::try_from(skip).unwrap_or(i64::MAX) });
		self
	}

	pub fn limit(mut self, limit: i64) -> Self {
		self.stages.push(doc! { "$limit": limit });
		self
	}

	pub fn project(mut self, projection: Document) -> Self {
		self.stages.push(doc! { "$project": projection });
		self
	}

	pub fn group(mut self, group: Document) -> Self {
		self.stages.push(doc! { "$group": group });
		self
	}

	/// Append a raw stage.
	pub fn stage(mut self, stage: Document) -> Self {
		self.stages.push(stage);
		self
	}

	/// Whether a skipped condition was matched.
	pub fn is_skipped(&self) -> bool {
		self.skipped
	}

	pub fn stages(&self) -> &[Document] {
		&self.stages
	}

	pub fn len(&self) -> usize {
		self.stages.len()
	}

	pub fn is_empty(&self) -> bool {
		self.stages.is_empty()
	}

	pub fn into_stages(self) -> Vec<Document> {
		self.stages
	}
}

impl From<Pipeline> for Vec<Document> {
	fn from(pipeline: Pipeline) -> Self {
		pipeline.stages
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use condor_cond::args;

	#[test]
	fn test_from_query_stage_order() {
		let query = Query::new("users")
			.filter(args!["age >=", 18])
			.unwrap()
			.sort(doc! { "name": 1 })
			.skip(10)
			.limit(5)
			.projection(doc! { "name": 1 });

		let pipeline = Pipeline::from_query(&query);
		assert_eq!(pipeline.len(), 5); // match, sort, skip, limit, project

		assert_eq!(pipeline.stages()[0], doc! { "$match": { "age": { "$gte": 18 } } });
		assert!(pipeline.stages()[1].contains_key("$sort"));
		assert_eq!(pipeline.stages()[2], doc! { "$skip": 10_i64 });
		assert_eq!(pipeline.stages()[3], doc! { "$limit": 5_i64 });
		assert!(pipeline.stages()[4].contains_key("$project"));
	}

	#[test]
	fn test_empty_filter_adds_no_match() {
		let pipeline = Pipeline::new().match_cond(&Cond::new()).limit(1);
		assert_eq!(pipeline.len(), 1);
		assert!(pipeline.stages()[0].contains_key("$limit"));
	}

	#[test]
	fn test_skipped_cond_marks_pipeline() {
		let cond = Cond::new().filter(args![false, "a", 1]).unwrap();
		let pipeline = Pipeline::new().match_cond(&cond).limit(3);
		assert!(pipeline.is_skipped());

		let query = Query::new("items").with_cond(cond);
		assert!(Pipeline::from_query(&query).is_skipped());
		assert!(!Pipeline::new().match_cond(&Cond::new()).is_skipped());
	}

	#[test]
	fn test_raw_stage() {
		let stages: Vec<Document> = Pipeline::new()
			.stage(doc! { "$count": "total" })
			.into();
		assert_eq!(stages, vec![doc! { "$count": "total" }]);
	}
}
