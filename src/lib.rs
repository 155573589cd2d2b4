//! # Schemaguard
//!
//! Checks a live PostgreSQL or MySQL database against an authored schema
//! file before a migration runs.
//!
//! Schemaguard provides:
//! - Catalog introspection into a plain [`Schema`] value
//! - Structural drift reports between the live and target schema
//! - Detection of rows that would break foreign key and NOT NULL constraints
//! - Dry-run-first repair of those rows
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use schemaguard::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), CoreError> {
//!     let target = schemaguard::schema_file::load("schema.json").await?;
//!     let mut db = Database::connect(&DbConfig {
//!         host: "localhost".into(),
//!         port: 5432,
//!         username: "app".into(),
//!         database: "shop".into(),
//!         ..Default::default()
//!     })
//!     .await?;
//!
//!     let issues = Validator::new(&mut db, ValidationConfig::default())
//!         .validate_all(&target)
//!         .await?;
//!     println!("{}", ValidationReport::new("default", issues).summary.total_issues);
//!
//!     db.close().await
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub use schemaguard_core::*;

/// Commonly used types.
pub mod prelude {
    pub use schemaguard_core::{
        Column, CoreError, CoreResult, Database, DbConfig, FixResults, ForeignKey,
        ForeignKeyAction, NullAction, Remediator, SafetyMode, Schema, SchemaComparison, Table,
        ValidationConfig, ValidationIssue, ValidationReport, Validator, compare, validate_schema,
    };
}
