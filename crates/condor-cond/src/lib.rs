//! # Condor Cond
//!
//! Dynamic condition builder for MongoDB filters.
//!
//! A [`Cond`] accepts conditions in several call shapes and normalizes them
//! into one condition tree, which serializes to a `bson::Document`:
//!
//! - **Field calls**: `["age", 18]`, `["age >", 18]`, `["age", ">=", 18]`
//! - **Maps**: `{"age >=": 18, "status": "active"}`, one condition per entry
//! - **Lists**: a flattened call, or independent items (maps become `$or` groups)
//! - **Nested builders**: embedded as resolved sub-documents
//! - **Guards**: a leading `false` discards the whole builder
//!
//! Field tokens may carry an embedded operator suffix, split off by
//! [`get_op`]. Recognized operators are listed on [`Operator`].
//!
//! ## Quick Start
//!
//! ```
//! use condor_cond::{args, Cond};
//! use bson::doc;
//!
//! let include_archived = false;
//! let cond = Cond::new()
//! 	.filter(args![doc! { "age >=": 18, "status": "active" }])?
//! 	.not_between("score", 10, 20)?
//! 	.or(args![doc! { "role": "admin", "owner": "me" }])?;
//!
//! assert_eq!(
//! 	cond.to_bson(),
//! 	doc! {
//! 		"age": { "$gte": 18 },
//! 		"status": "active",
//! 		"score": { "$not": { "$gte": 10, "$lte": 20 } },
//! 		"$or": [{ "role": "admin" }, { "owner": "me" }],
//! 	}
//! );
//!
//! let archived = Cond::new().filter(args![include_archived, "archived", true])?;
//! assert!(archived.is_skipped());
//! # Ok::<(), condor_cond::CondError>(())
//! ```
//!
//! ## Merge rules
//!
//! Top-level conditions of an AND builder are merged into one flat document.
//! When two conditions target the same key the later one wins. Use
//! [`Cond::and`] inside an OR builder, or [`Cond::or`], to keep both.
//! Every [`Cond::or`] group lands under the same `$or` key, so a second
//! group on an AND builder replaces the first.

pub mod arg;
pub mod cond;
mod dispatch;
pub mod error;
pub mod operator;
pub mod tree;

pub use arg::Arg;
pub use cond::Cond;
pub use error::{CondError, CondResult};
pub use operator::{DEFAULT_OPERATOR, Operator, get_op};
pub use tree::{Combine, ConditionTree, Element, OR_KEY, PrimitiveCondition};
