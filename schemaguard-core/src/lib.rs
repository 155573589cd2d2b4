//! # schemaguard-core
//!
//! Schema introspection, diff, validation and repair engine for PostgreSQL
//! and MySQL.
//!
//! This crate provides functionality for:
//! - Reading the live catalog into a [`Schema`]
//! - Comparing a live schema against an authored target schema
//! - Finding rows that would break foreign key and NOT NULL constraints
//! - Repairing those rows, simulated by default and applied only on confirmation
//! - Self-consistency checks on a schema file with no database at all
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────────┐     ┌──────────────────┐
//! │ Schema file  │────▶│     Differ     │◀────│ Catalog (live DB)│
//! └──────────────┘     └────────────────┘     └──────────────────┘
//!        │                                             │
//!        ▼                                             ▼
//! ┌──────────────┐     ┌────────────────┐     ┌──────────────────┐
//! │  Validator   │────▶│   Remediator   │────▶│ DELETE / UPDATE  │
//! └──────────────┘     └────────────────┘     └──────────────────┘
//! ```
//!
//! All vendor SQL lives behind the [`Dialect`] trait; the rest of the engine
//! never branches on the vendor.
//!
//! ## Example
//!
//! ```rust,ignore
//! use schemaguard_core::{
//!     Database, DbConfig, ForeignKeyAction, Remediator, SafetyMode, ValidationConfig, Validator,
//! };
//!
//! async fn check(config: &DbConfig) -> Result<(), Box<dyn std::error::Error>> {
//!     let target = schemaguard_core::schema_file::load("schema.json").await?;
//!     let mut db = Database::connect(config).await?;
//!
//!     let current = db.get_current_schema().await?;
//!     let comparison = schemaguard_core::compare(&current, &target);
//!     println!("{}", comparison.summary());
//!
//!     let issues = Validator::new(&mut db, ValidationConfig::default())
//!         .validate_foreign_keys(&target)
//!         .await?;
//!     println!("{} foreign key issues", issues.len());
//!
//!     let mut remediator = Remediator::new(&mut db, ValidationConfig::default(), SafetyMode::DryRun);
//!     let results = remediator
//!         .fix_foreign_key_violations(&target, ForeignKeyAction::Remove)
//!         .await?;
//!     println!("{:?}", results);
//!
//!     db.close().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod consistency;
pub mod database;
pub mod dialect;
pub mod diff;
pub mod error;
pub mod executor;
pub mod logging;
pub mod model;
pub mod remediate;
pub mod report;
pub mod schema_file;
pub mod validate;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{ConnectionsConfig, DbConfig, NamedConnection, ValidationConfig};
pub use consistency::validate_schema;
pub use database::{Database, pick_identifier};
pub use dialect::{DatabaseType, Dialect, MySql, Postgres, RowIdentifier};
pub use diff::{ColumnDiff, ForeignKeyDifference, SchemaComparison, TableDifference, compare};
pub use error::{CoreError, CoreResult};
pub use executor::{Executor, TextRow};
pub use model::{Column, ForeignKey, Schema, SchemaSnapshot, Table};
pub use remediate::{FixResult, FixResults, ForeignKeyAction, NullAction, Remediator, SafetyMode};
pub use report::{ReportSummary, SchemaInfo, TableSummary, ValidationReport};
pub use validate::{IssueKind, Severity, ValidationIssue, Validator};

/// Version of the engine crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
