//! In-process document backend
//!
//! Keeps collections in memory and evaluates the filter vocabulary emitted by
//! `condor-cond`: equality, `$ne`, `$gt`, `$gte`, `$lt`, `$lte`, `$in`,
//! `$nin`, `$regex`/`$options`, `$not`, `$or`, plus `$and`, `$nor`, `$eq` and
//! `$exists`. Field paths may be dotted.
//!
//! Aggregation supports `$match`, `$sort`, `$skip`, `$limit` and `$project`.
//! Updates support `$set`, `$unset` and `$inc` on dotted paths, and are applied
//! to all matched documents or to none.

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{Bson, Document};
use parking_lot::RwLock;
use regex::RegexBuilder;
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::trace;

use super::document::DocumentBackend;
use crate::error::{OdmError, OdmResult};
use crate::options::{FindOptions, UpdateResult};

/// In-memory backend
///
/// # Example
///
/// ```rust
/// use condor_odm::{DocumentBackend, FindOptions, MemoryBackend};
/// use bson::doc;
///
/// # futures::executor::block_on(async {
/// let backend = MemoryBackend::new();
/// backend.insert_one("users", doc! { "name": "Alice", "age": 30 }).await.unwrap();
///
/// let found = backend
/// 	.find_many("users", doc! { "age": { "$gte": 18 } }, FindOptions::new())
/// 	.await
/// 	.unwrap();
/// assert_eq!(found.len(), 1);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct MemoryBackend {
	collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryBackend {
	pub fn new() -> Self {
		Self::default()
	}

	/// Snapshot of a collection, in insertion order.
	pub fn documents(&self, collection: &str) -> Vec<Document> {
		self.collections
			.read()
			.get(collection)
			.cloned()
			.unwrap_or_default()
	}

	/// Drop every collection.
	pub fn clear(&self) {
		self.collections.write().clear();
	}

	fn select(&self, collection: &str, filter: &Document) -> OdmResult<Vec<Document>> {
		let collections = self.collections.read();
		let Some(documents) = collections.get(collection) else {
			return Ok(Vec::new());
		};

		let mut selected = Vec::new();
		for document in documents {
			if matches(document, filter)? {
				selected.push(document.clone());
			}
		}
		Ok(selected)
	}

	fn update(
		&self,
		collection: &str,
		filter: &Document,
		update: &Document,
		many: bool,
	) -> OdmResult<UpdateResult> {
		validate_update(update)?;

		let mut collections = self.collections.write();
		let Some(documents) = collections.get_mut(collection) else {
			return Ok(UpdateResult::default());
		};

		// Staged on copies so a failing document leaves the collection untouched.
		let mut staged = Vec::new();
		for (index, document) in documents.iter().enumerate() {
			if !matches(document, filter)? {
				continue;
			}
			let mut updated = document.clone();
			apply_update(&mut updated, update)?;
			staged.push((index, updated));
			if !many {
				break;
			}
		}

		let mut result = UpdateResult::default();
		for (index, updated) in staged {
			result.matched_count += 1;
			if documents[index] != updated {
				result.modified_count += 1;
				documents[index] = updated;
			}
		}
		Ok(result)
	}

	fn delete(&self, collection: &str, filter: &Document, many: bool) -> OdmResult<u64> {
		let mut collections = self.collections.write();
		let Some(documents) = collections.get_mut(collection) else {
			return Ok(0);
		};

		let mut doomed = Vec::new();
		for (index, document) in documents.iter().enumerate() {
			if matches(document, filter)? {
				doomed.push(index);
				if !many {
					break;
				}
			}
		}
		for index in doomed.iter().rev() {
			documents.remove(*index);
		}
		let deleted = doomed.len() as u64;
		Ok(deleted)
	}
}

#[async_trait]
impl DocumentBackend for MemoryBackend {
	fn name(&self) -> &'static str {
		"memory"
	}

	async fn health_check(&self) -> OdmResult<()> {
		Ok(())
	}

	async fn find_one(&self, collection: &str, filter: Document) -> OdmResult<Option<Document>> {
		Ok(self.select(collection, &filter)?.into_iter().next())
	}

	async fn find_many(
		&self,
		collection: &str,
		filter: Document,
		options: FindOptions,
	) -> OdmResult<Vec<Document>> {
		let mut documents = self.select(collection, &filter)?;
		trace!(collection, matched = documents.len(), "memory find");

		if let Some(sort) = &options.sort {
			sort_documents(&mut documents, sort);
		}
		let documents = window(documents, options.skip, options.limit);
		match &options.projection {
			Some(projection) => documents
				.iter()
				.map(|document| project(document, projection))
				.collect(),
			None => Ok(documents),
		}
	}

	async fn count(&self, collection: &str, filter: Document) -> OdmResult<u64> {
		Ok(self.select(collection, &filter)?.len() as u64)
	}

	async fn insert_one(&self, collection: &str, document: Document) -> OdmResult<String> {
		let mut ids = self.insert_many(collection, vec![document]).await?;
		ids.pop()
			.ok_or_else(|| OdmError::Execution("insert produced no id".to_string()))
	}

	async fn insert_many(
		&self,
		collection: &str,
		documents: Vec<Document>,
	) -> OdmResult<Vec<String>> {
		let mut collections = self.collections.write();
		let stored = collections.entry(collection.to_string()).or_default();

		let mut ids = Vec::with_capacity(documents.len());
		for mut document in documents {
			if !document.contains_key("_id") {
				document.insert("_id", ObjectId::new());
			}
			ids.push(id_to_string(document.get("_id")));
			stored.push(document);
		}
		Ok(ids)
	}

	async fn update_one(
		&self,
		collection: &str,
		filter: Document,
		update: Document,
	) -> OdmResult<UpdateResult> {
		self.update(collection, &filter, &update, false)
	}

	async fn update_many(
		&self,
		collection: &str,
		filter: Document,
		update: Document,
	) -> OdmResult<UpdateResult> {
		self.update(collection, &filter, &update, true)
	}

	async fn delete_one(&self, collection: &str, filter: Document) -> OdmResult<u64> {
		self.delete(collection, &filter, false)
	}

	async fn delete_many(&self, collection: &str, filter: Document) -> OdmResult<u64> {
		self.delete(collection, &filter, true)
	}

	async fn aggregate(
		&self,
		collection: &str,
		pipeline: Vec<Document>,
	) -> OdmResult<Vec<Document>> {
		let mut documents = self.documents(collection);

		for stage in &pipeline {
			let Some((name, spec)) = stage.iter().next() else {
				return Err(OdmError::InvalidOperation("empty pipeline stage".to_string()));
			};
			documents = match (name.as_str(), spec) {
				("$match", Bson::Document(filter)) => {
					let mut kept = Vec::new();
					for document in documents {
						if matches(&document, filter)? {
							kept.push(document);
						}
					}
					kept
				}
				("$sort", Bson::Document(sort)) => {
					sort_documents(&mut documents, sort);
					documents
				}
				("$skip", value) => window(documents, Some(stage_number(name, value)?), None),
				("$limit", value) => {
					let limit = i64::try_from(stage_number(name, value)?).unwrap_or(i64::MAX);
					window(documents, None, Some(limit))
				}
				("$project", Bson::Document(projection)) => documents
					.iter()
					.map(|document| project(document, projection))
					.collect::<OdmResult<_>>()?,
				_ => {
					return Err(OdmError::InvalidOperation(format!(
						"unsupported pipeline stage {}",
						name
					)));
				}
			};
		}
		Ok(documents)
	}
}

fn id_to_string(id: Option<&Bson>) -> String {
	match id {
		Some(Bson::ObjectId(oid)) => oid.to_hex(),
		Some(Bson::String(s)) => s.clone(),
		Some(other) => other.to_string(),
		None => String::new(),
	}
}

fn stage_number(stage: &str, value: &Bson) -> OdmResult<u64> {
	let number = match value {
		Bson::Int32(n) => i64::from(*n),
		Bson::Int64(n) => *n,
		_ => -1,
	};
	u64::try_from(number).map_err(|_| {
		OdmError::InvalidOperation(format!("{} expects a non-negative integer", stage))
	})
}

fn window(documents: Vec<Document>, skip: Option<u64>, limit: Option<i64>) -> Vec<Document> {
	let skip = usize::try_from(skip.unwrap_or(0)).unwrap_or(usize::MAX);
	let iter = documents.into_iter().skip(skip);
	match limit {
		// a limit of zero means "no limit", as in the driver
		Some(limit) if limit != 0 => iter
			.take(usize::try_from(limit.unsigned_abs()).unwrap_or(usize::MAX))
			.collect(),
		_ => iter.collect(),
	}
}

/// Whether `document` satisfies `filter`.
pub(crate) fn matches(document: &Document, filter: &Document) -> OdmResult<bool> {
	for (key, condition) in filter {
		let matched = match key.as_str() {
			"$or" => logical(document, condition)?.into_iter().any(|m| m),
			"$and" => logical(document, condition)?.into_iter().all(|m| m),
			"$nor" => !logical(document, condition)?.into_iter().any(|m| m),
			other if other.starts_with('$') => {
				return Err(OdmError::InvalidOperation(format!(
					"unsupported top-level operator {}",
					other
				)));
			}
			path => matches_condition(lookup(document, path), condition)?,
		};
		if !matched {
			return Ok(false);
		}
	}
	Ok(true)
}

fn logical(document: &Document, clauses: &Bson) -> OdmResult<Vec<bool>> {
	let Bson::Array(clauses) = clauses else {
		return Err(OdmError::InvalidOperation(
			"logical operators expect an array".to_string(),
		));
	};
	clauses
		.iter()
		.map(|clause| match clause {
			Bson::Document(filter) => matches(document, filter),
			_ => Err(OdmError::InvalidOperation(
				"logical clauses must be documents".to_string(),
			)),
		})
		.collect()
}

fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
	let mut segments = path.split('.');
	let mut current = document.get(segments.next()?)?;
	for segment in segments {
		current = match current {
			Bson::Document(inner) => inner.get(segment)?,
			_ => return None,
		};
	}
	Some(current)
}

fn is_operator_document(condition: &Bson) -> Option<&Document> {
	match condition {
		Bson::Document(spec) if !spec.is_empty() && spec.keys().all(|k| k.starts_with('$')) => {
			Some(spec)
		}
		_ => None,
	}
}

fn matches_condition(value: Option<&Bson>, condition: &Bson) -> OdmResult<bool> {
	let Some(spec) = is_operator_document(condition) else {
		return Ok(equals(value, condition));
	};

	for (operator, operand) in spec {
		let matched = match operator.as_str() {
			"$eq" => equals(value, operand),
			"$ne" => !equals(value, operand),
			"$gt" => compares(value, operand, |o| o == Ordering::Greater),
			"$gte" => compares(value, operand, |o| o != Ordering::Less),
			"$lt" => compares(value, operand, |o| o == Ordering::Less),
			"$lte" => compares(value, operand, |o| o != Ordering::Greater),
			"$in" => in_list(value, operand)?,
			"$nin" => !in_list(value, operand)?,
			"$exists" => value.is_some() == truthy(operand),
			"$regex" => regex_match(value, operand, spec.get_str("$options").unwrap_or(""))?,
			"$options" => true,
			"$not" => !matches_condition(value, operand)?,
			other => {
				return Err(OdmError::InvalidOperation(format!(
					"unsupported operator {}",
					other
				)));
			}
		};
		if !matched {
			return Ok(false);
		}
	}
	Ok(true)
}

fn equals(value: Option<&Bson>, expected: &Bson) -> bool {
	match value {
		None => matches!(expected, Bson::Null),
		Some(Bson::Array(items)) if !matches!(expected, Bson::Array(_)) => {
			items.iter().any(|item| same(item, expected))
		}
		Some(actual) => same(actual, expected),
	}
}

fn same(a: &Bson, b: &Bson) -> bool {
	match (as_number(a), as_number(b)) {
		(Some(x), Some(y)) => x == y,
		_ => a == b,
	}
}

fn compares(value: Option<&Bson>, operand: &Bson, accept: impl Fn(Ordering) -> bool) -> bool {
	let candidates: Vec<&Bson> = match value {
		None => return false,
		Some(Bson::Array(items)) => items.iter().collect(),
		Some(actual) => vec![actual],
	};
	candidates
		.into_iter()
		.any(|candidate| order(candidate, operand).is_some_and(&accept))
}

fn in_list(value: Option<&Bson>, operand: &Bson) -> OdmResult<bool> {
	let Bson::Array(options) = operand else {
		return Err(OdmError::InvalidOperation(
			"$in/$nin expect an array".to_string(),
		));
	};
	Ok(options.iter().any(|option| equals(value, option)))
}

fn regex_match(value: Option<&Bson>, pattern: &Bson, options: &str) -> OdmResult<bool> {
	let (pattern, options) = match pattern {
		Bson::String(pattern) => (pattern.as_str(), options),
		Bson::RegularExpression(regex) => (regex.pattern.as_str(), regex.options.as_str()),
		_ => {
			return Err(OdmError::InvalidOperation(
				"$regex expects a string".to_string(),
			));
		}
	};
	let regex = RegexBuilder::new(pattern)
		.case_insensitive(options.contains('i'))
		.multi_line(options.contains('m'))
		.dot_matches_new_line(options.contains('s'))
		.build()
		.map_err(|e| OdmError::InvalidOperation(format!("invalid $regex: {}", e)))?;

	Ok(match value {
		Some(Bson::String(s)) => regex.is_match(s),
		Some(Bson::Array(items)) => items
			.iter()
			.any(|item| matches!(item, Bson::String(s) if regex.is_match(s))),
		_ => false,
	})
}

fn as_number(value: &Bson) -> Option<f64> {
	match value {
		Bson::Int32(n) => Some(f64::from(*n)),
		Bson::Int64(n) => Some(*n as f64),
		Bson::Double(n) => Some(*n),
		_ => None,
	}
}

fn truthy(value: &Bson) -> bool {
	match value {
		Bson::Boolean(b) => *b,
		Bson::Null => false,
		other => as_number(other).is_none_or(|n| n != 0.0),
	}
}

fn order(a: &Bson, b: &Bson) -> Option<Ordering> {
	if let (Some(x), Some(y)) = (as_number(a), as_number(b)) {
		return x.partial_cmp(&y);
	}
	match (a, b) {
		(Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
		(Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
		(Bson::DateTime(x), Bson::DateTime(y)) => Some(x.cmp(y)),
		(Bson::ObjectId(x), Bson::ObjectId(y)) => Some(x.cmp(y)),
		(Bson::Timestamp(x), Bson::Timestamp(y)) => Some(x.cmp(y)),
		_ => None,
	}
}

fn sort_documents(documents: &mut [Document], sort: &Document) {
	documents.sort_by(|a, b| {
		for (path, direction) in sort {
			let descending = as_number(direction).is_some_and(|d| d < 0.0);
			let ordering = match (lookup(a, path), lookup(b, path)) {
				(None, None) => Ordering::Equal,
				(None, Some(_)) => Ordering::Less,
				(Some(_), None) => Ordering::Greater,
				(Some(x), Some(y)) => order(x, y).unwrap_or(Ordering::Equal),
			};
			let ordering = if descending {
				ordering.reverse()
			} else {
				ordering
			};
			if ordering != Ordering::Equal {
				return ordering;
			}
		}
		Ordering::Equal
	});
}

fn project(document: &Document, projection: &Document) -> OdmResult<Document> {
	let inclusive = projection
		.iter()
		.filter(|(key, _)| key.as_str() != "_id")
		.map(|(_, flag)| truthy(flag))
		.collect::<Vec<_>>();
	if inclusive.iter().any(|&f| f) && inclusive.iter().any(|&f| !f) {
		return Err(OdmError::InvalidOperation(
			"projection cannot mix inclusion and exclusion".to_string(),
		));
	}
	let keep_id = projection.get("_id").is_none_or(truthy);

	if inclusive.first().copied().unwrap_or(false) {
		let mut projected = Document::new();
		if keep_id && let Some(id) = document.get("_id") {
			projected.insert("_id", id.clone());
		}
		for (path, _) in projection.iter().filter(|(key, _)| key.as_str() != "_id") {
			if let Some(value) = lookup(document, path) {
				set_path(&mut projected, path, value.clone())?;
			}
		}
		Ok(projected)
	} else {
		let mut projected = document.clone();
		for (path, _) in projection.iter().filter(|(key, _)| key.as_str() != "_id") {
			remove_path(&mut projected, path);
		}
		if !keep_id {
			projected.remove("_id");
		}
		Ok(projected)
	}
}

fn validate_update(update: &Document) -> OdmResult<()> {
	if update.is_empty() {
		return Err(OdmError::InvalidOperation(
			"update document must not be empty".to_string(),
		));
	}
	for (operator, fields) in update {
		if !matches!(operator.as_str(), "$set" | "$unset" | "$inc") {
			return Err(OdmError::InvalidOperation(format!(
				"unsupported update operator {}",
				operator
			)));
		}
		if !matches!(fields, Bson::Document(_)) {
			return Err(OdmError::InvalidOperation(format!(
				"{} expects a document",
				operator
			)));
		}
	}
	Ok(())
}

fn apply_update(document: &mut Document, update: &Document) -> OdmResult<()> {
	for (operator, fields) in update {
		let Bson::Document(fields) = fields else {
			continue;
		};
		for (field, value) in fields {
			match operator.as_str() {
				"$set" => set_path(document, field, value.clone())?,
				"$unset" => remove_path(document, field),
				"$inc" => {
					let incremented = increment(lookup(document, field), value).ok_or_else(|| {
						OdmError::InvalidOperation(format!(
							"cannot apply $inc to field {}: non-numeric or overflowing",
							field
						))
					})?;
					set_path(document, field, incremented)?;
				}
				_ => {}
			}
		}
	}
	Ok(())
}

/// Write `value` at a dotted path, creating intermediate documents.
fn set_path(document: &mut Document, path: &str, value: Bson) -> OdmResult<()> {
	let Some((head, rest)) = path.split_once('.') else {
		document.insert(path, value);
		return Ok(());
	};
	if !document.contains_key(head) {
		document.insert(head, Document::new());
	}
	match document.get_mut(head) {
		Some(Bson::Document(inner)) => set_path(inner, rest, value),
		_ => Err(OdmError::InvalidOperation(format!(
			"cannot create field {} inside non-document {}",
			rest, head
		))),
	}
}

/// Remove the value at a dotted path; missing segments are ignored.
fn remove_path(document: &mut Document, path: &str) {
	match path.split_once('.') {
		None => {
			document.remove(path);
		}
		Some((head, rest)) => {
			if let Some(Bson::Document(inner)) = document.get_mut(head) {
				remove_path(inner, rest);
			}
		}
	}
}

fn increment(current: Option<&Bson>, by: &Bson) -> Option<Bson> {
	match (current.unwrap_or(&Bson::Int32(0)), by) {
		(Bson::Int32(a), Bson::Int32(b)) => Some(
			a.checked_add(*b)
				.map_or(Bson::Int64(i64::from(*a) + i64::from(*b)), Bson::Int32),
		),
		(Bson::Int32(a), Bson::Int64(b)) => i64::from(*a).checked_add(*b).map(Bson::Int64),
		(Bson::Int64(a), Bson::Int32(b)) => a.checked_add(i64::from(*b)).map(Bson::Int64),
		(Bson::Int64(a), Bson::Int64(b)) => a.checked_add(*b).map(Bson::Int64),
		(a, b) => Some(Bson::Double(as_number(a)? + as_number(b)?)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use bson::doc;
	use rstest::*;

	fn sample_people() -> Vec<Document> {
		vec![
			doc! { "_id": 1, "name": "Alice", "age": 30, "tags": ["admin", "dev"], "address": { "city": "Paris" } },
			doc! { "_id": 2, "name": "bob", "age": 17, "tags": ["dev"], "address": { "city": "Lyon" } },
			doc! { "_id": 3, "name": "Carol", "age": 45.5, "status": "inactive" },
		]
	}

	#[fixture]
	fn people() -> Vec<Document> {
		sample_people()
	}

	fn ids(documents: &[Document], filter: Document) -> Vec<i32> {
		documents
			.iter()
			.filter(|d| matches(d, &filter).unwrap())
			.map(|d| d.get_i32("_id").unwrap())
			.collect()
	}

	#[rstest]
	#[case::equality(doc! { "name": "bob" }, vec![2])]
	#[case::array_contains(doc! { "tags": "admin" }, vec![1])]
	#[case::dotted(doc! { "address.city": "Lyon" }, vec![2])]
	#[case::missing_is_null(doc! { "status": Bson::Null }, vec![1, 2])]
	#[case::ne(doc! { "status": { "$ne": "inactive" } }, vec![1, 2])]
	#[case::gt_mixed_numbers(doc! { "age": { "$gt": 30 } }, vec![3])]
	#[case::range(doc! { "age": { "$gte": 17, "$lte": 30 } }, vec![1, 2])]
	#[case::not_range(doc! { "age": { "$not": { "$gte": 17, "$lte": 30 } } }, vec![3])]
	#[case::in_list(doc! { "name": { "$in": ["Alice", "Carol"] } }, vec![1, 3])]
	#[case::nin(doc! { "name": { "$nin": ["Alice"] } }, vec![2, 3])]
	#[case::regex_ci(doc! { "name": { "$regex": "^B.*", "$options": "i" } }, vec![2])]
	#[case::regex_cs(doc! { "name": { "$regex": "^B.*" } }, Vec::<i32>::new())]
	#[case::not_regex(doc! { "name": { "$not": { "$regex": ".*o.*", "$options": "i" } } }, vec![1])]
	#[case::or(doc! { "$or": [{ "age": { "$lt": 18 } }, { "status": "inactive" }] }, vec![2, 3])]
	#[case::exists(doc! { "address": { "$exists": false } }, vec![3])]
	#[case::empty(doc! {}, vec![1, 2, 3])]
	fn test_matches(people: Vec<Document>, #[case] filter: Document, #[case] expected: Vec<i32>) {
		assert_eq!(ids(&people, filter), expected);
	}

	#[rstest]
	fn test_unknown_operator_is_rejected(people: Vec<Document>) {
		let err = matches(&people[0], &doc! { "age": { "$near": 1 } }).unwrap_err();
		assert!(matches!(err, OdmError::InvalidOperation(_)));
	}

	#[rstest]
	fn test_sort_and_window(mut people: Vec<Document>) {
		sort_documents(&mut people, &doc! { "age": -1 });
		let names: Vec<_> = people.iter().map(|d| d.get_str("name").unwrap()).collect();
		assert_eq!(names, vec!["Carol", "Alice", "bob"]);

		let page = window(people, Some(1), Some(1));
		assert_eq!(page.len(), 1);
		assert_eq!(page[0].get_str("name").unwrap(), "Alice");
	}

	#[rstest]
	fn test_projection(people: Vec<Document>) {
		let included = project(&people[0], &doc! { "name": 1, "_id": 0 }).unwrap();
		assert_eq!(included, doc! { "name": "Alice" });

		let excluded = project(&people[2], &doc! { "status": 0 }).unwrap();
		assert_eq!(excluded, doc! { "_id": 3, "name": "Carol", "age": 45.5 });

		assert!(project(&people[0], &doc! { "name": 1, "age": 0 }).is_err());
	}

	#[rstest]
	fn test_increment() {
		assert_eq!(increment(Some(&Bson::Int32(1)), &Bson::Int32(2)), Some(Bson::Int32(3)));
		assert_eq!(increment(None, &Bson::Int64(5)), Some(Bson::Int64(5)));
		assert_eq!(
			increment(Some(&Bson::Double(1.5)), &Bson::Int32(1)),
			Some(Bson::Double(2.5))
		);
		assert_eq!(increment(Some(&Bson::String("x".into())), &Bson::Int32(1)), None);
		assert_eq!(increment(Some(&Bson::Int32(i32::MAX)), &Bson::Int32(1)), Some(Bson::Int64(1 << 31)));
	}

	#[rstest]
	#[case::int64(Bson::Int64(i64::MAX), Bson::Int64(1))]
	#[case::int64_by_int32(Bson::Int64(i64::MAX), Bson::Int32(1))]
	#[case::int32_by_int64(Bson::Int32(1), Bson::Int64(i64::MAX))]
	fn test_increment_overflow_is_none(#[case] current: Bson, #[case] by: Bson) {
		assert_eq!(increment(Some(&current), &by), None);
	}

	#[tokio::test]
	async fn test_inc_overflow_is_rejected() {
		let backend = MemoryBackend::new();
		backend
			.insert_one("counters", doc! { "_id": 1, "n": i64::MAX })
			.await
			.unwrap();

		let err = backend
			.update_many("counters", doc! {}, doc! { "$inc": { "n": 1_i64 } })
			.await
			.unwrap_err();
		assert!(matches!(err, OdmError::InvalidOperation(_)));
		assert_eq!(backend.documents("counters")[0].get_i64("n").unwrap(), i64::MAX);
	}

	#[tokio::test]
	async fn test_failed_update_leaves_collection_untouched() {
		let backend = MemoryBackend::new();
		backend
			.insert_many("items", vec![doc! { "_id": 1, "n": 1 }, doc! { "_id": 2, "n": "x" }])
			.await
			.unwrap();

		let result = backend
			.update_many(
				"items",
				doc! {},
				doc! { "$set": { "tag": "t" }, "$inc": { "n": 1 } },
			)
			.await;
		assert!(result.is_err());
		assert_eq!(
			backend.documents("items"),
			vec![doc! { "_id": 1, "n": 1 }, doc! { "_id": 2, "n": "x" }]
		);
	}

	#[tokio::test]
	async fn test_dotted_update_paths() {
		let backend = MemoryBackend::new();
		backend.insert_many("people", sample_people()).await.unwrap();

		backend
			.update_one(
				"people",
				doc! { "_id": 1 },
				doc! { "$set": { "address.city": "Lyon", "stats.visits": 1 } },
			)
			.await
			.unwrap();
		backend
			.update_one("people", doc! { "_id": 1 }, doc! { "$inc": { "stats.visits": 2 } })
			.await
			.unwrap();
		backend
			.update_one("people", doc! { "_id": 2 }, doc! { "$unset": { "address.city": "" } })
			.await
			.unwrap();

		let alice = backend.find_one("people", doc! { "_id": 1 }).await.unwrap().unwrap();
		assert_eq!(alice.get_document("address").unwrap(), &doc! { "city": "Lyon" });
		assert_eq!(alice.get_document("stats").unwrap(), &doc! { "visits": 3 });
		assert!(!alice.contains_key("address.city"));
		assert_eq!(backend.count("people", doc! { "address.city": "Lyon" }).await.unwrap(), 1);

		let bob = backend.find_one("people", doc! { "_id": 2 }).await.unwrap().unwrap();
		assert_eq!(bob.get_document("address").unwrap(), &Document::new());

		let err = backend
			.update_one("people", doc! { "_id": 1 }, doc! { "$set": { "name.first": "A" } })
			.await
			.unwrap_err();
		assert!(matches!(err, OdmError::InvalidOperation(_)));
	}

	#[rstest]
	fn test_dotted_projection(people: Vec<Document>) {
		let included = project(&people[0], &doc! { "address.city": 1, "_id": 0 }).unwrap();
		assert_eq!(included, doc! { "address": { "city": "Paris" } });

		let excluded = project(&people[1], &doc! { "address.city": 0, "tags": 0 }).unwrap();
		assert_eq!(excluded, doc! { "_id": 2, "name": "bob", "age": 17, "address": {} });
	}

	#[tokio::test]
	async fn test_crud_cycle() {
		let backend = MemoryBackend::new();
		let ids = backend
			.insert_many("people", sample_people())
			.await
			.unwrap();
		assert_eq!(ids, vec!["1", "2", "3"]);

		let generated = backend.insert_one("people", doc! { "name": "Dan" }).await.unwrap();
		assert_eq!(generated.len(), 24);
		assert_eq!(backend.count("people", doc! {}).await.unwrap(), 4);

		let result = backend
			.update_many(
				"people",
				doc! { "tags": "dev" },
				doc! { "$inc": { "age": 1 }, "$set": { "team": "core" } },
			)
			.await
			.unwrap();
		assert_eq!(result.matched_count, 2);
		assert_eq!(result.modified_count, 2);

		let bob = backend
			.find_one("people", doc! { "name": "bob" })
			.await
			.unwrap()
			.unwrap();
		assert_eq!(bob.get_i32("age").unwrap(), 18);
		assert_eq!(bob.get_str("team").unwrap(), "core");

		assert_eq!(
			backend
				.delete_one("people", doc! { "team": "core" })
				.await
				.unwrap(),
			1
		);
		assert_eq!(
			backend
				.delete_many("people", doc! { "age": { "$exists": true } })
				.await
				.unwrap(),
			2
		);
		assert_eq!(backend.documents("people").len(), 1);
	}

	#[tokio::test]
	async fn test_update_rejects_replacement_document() {
		let backend = MemoryBackend::new();
		let err = backend
			.update_one("people", doc! {}, doc! { "name": "x" })
			.await
			.unwrap_err();
		assert!(matches!(err, OdmError::InvalidOperation(_)));
	}

	#[tokio::test]
	async fn test_aggregate() {
		let backend = MemoryBackend::new();
		backend.insert_many("people", sample_people()).await.unwrap();

		let result = backend
			.aggregate(
				"people",
				vec![
					doc! { "$match": { "age": { "$gte": 17 } } },
					doc! { "$sort": { "age": 1 } },
					doc! { "$skip": 1 },
					doc! { "$limit": 1 },
					doc! { "$project": { "name": 1, "_id": 0 } },
				],
			)
			.await
			.unwrap();
		assert_eq!(result, vec![doc! { "name": "Alice" }]);

		let err = backend
			.aggregate("people", vec![doc! { "$lookup": {} }])
			.await
			.unwrap_err();
		assert!(matches!(err, OdmError::InvalidOperation(_)));
	}

	#[tokio::test]
	async fn test_missing_collection_is_empty() {
		let backend = MemoryBackend::new();
		assert!(backend.find_one("nothing", doc! {}).await.unwrap().is_none());
		assert_eq!(backend.delete_many("nothing", doc! {}).await.unwrap(), 0);
		assert_eq!(
			backend
				.update_many("nothing", doc! {}, doc! { "$set": { "a": 1 } })
				.await
				.unwrap(),
			UpdateResult::default()
		);
	}
}
