//! # docsql-query
//!
//! Mongo-style filter documents compiled to SQL.
//!
//! This crate provides:
//! - [`filter`]: the compiler from filter documents to a typed expression tree
//! - [`QueryBuilder`]: one statement against one table, rendered and executed
//!   through a [`Storage`](docsql_core::Storage)
//! - [`Collection`]: a named model with its properties
//! - [`RecordFactory`] and [`Record`] for turning rows into records
//!
//! ## Quick Start
//!
//! ```rust
//! use docsql_query::QueryBuilder;
//! use serde_json::json;
//!
//! let mut query = QueryBuilder::new("customers")
//!     .unwrap()
//!     .find(&json!({
//!         "$or": [
//!             { "age": { "$gt": 20 } },
//!             { "lives": { "$in": ["arusha", "mbeya"] } }
//!         ]
//!     }))
//!     .unwrap();
//!
//! assert_eq!(
//!     query.render().unwrap(),
//!     "SELECT * FROM customers WHERE (age > 20 OR lives IN ('arusha','mbeya'))"
//! );
//! ```
//!
//! Running a statement needs a storage and a record factory:
//!
//! ```ignore
//! let customers = QueryBuilder::new("customers")?
//!     .find(&json!({ "active": true }))?
//!     .exec(&mut storage, &Record::from_row)
//!     .await?
//!     .into_records();
//! ```

pub mod builder;
pub mod collection;
pub mod error;
pub mod filter;
pub mod record;

pub use builder::{Arity, OrderBy, OrderDirection, Outcome, Projection, QueryBuilder, StatementKind};
pub use collection::Collection;
pub use error::{QueryError, Result};
pub use filter::{compile, compile_with, CompareOp, Expression, LogicalOp};
pub use record::{Record, RecordFactory};
