//! # Condor
//!
//! Build MongoDB filters from loosely shaped calls, then run them.
//!
//! - [`cond`]: the condition builder (always available)
//! - [`odm`]: backends, queries, pipelines and collection names (feature `odm`)
//!
//! ## Feature Flags
//!
//! - `odm` (default) - Execution layer with the in-memory backend
//! - `mongodb` - MongoDB driver backend
//! - `full` - All features enabled
//!
//! ## Quick Start
//!
//! ```rust
//! use condor::prelude::*;
//! use bson::doc;
//!
//! struct Order;
//! impl Model for Order {}
//!
//! # futures::executor::block_on(async {
//! let db = Database::new(MemoryBackend::new());
//! db.insert::<Order>(doc! { "status": "paid", "total": 120 }).await?;
//!
//! let cond = Cond::new()
//! 	.filter(args![doc! { "status": "paid", "total >=": 100 }])?;
//! assert_eq!(db.count::<Order>(&cond).await?, 1);
//! # Ok::<(), OdmError>(())
//! # }).unwrap();
//! ```

pub use condor_cond as cond;
#[cfg(feature = "odm")]
pub use condor_odm as odm;

pub use condor_cond::{Arg, Cond, CondError, CondResult, Operator, args, get_op};

#[cfg(feature = "odm")]
pub use condor_odm::{
	CollectionRegistry, Database, DocumentBackend, FindOptions, MemoryBackend, Model, OdmError,
	MongoSettings, OdmResult, Page, Pipeline, Query,
};

#[cfg(feature = "mongodb")]
pub use condor_odm::MongoBackend;

/// Commonly used items
pub mod prelude {
	pub use condor_cond::{Arg, Cond, CondError, CondResult, args};

	#[cfg(feature = "odm")]
	pub use condor_odm::{
		Database, DocumentBackend, FindOptions, MemoryBackend, Model, OdmError, OdmResult, Page,
		Pipeline, Query,
	};
}
