//! sql_assistant - convenience helpers over SeaORM sessions
//!
//! This library wraps SeaORM's connection and transaction API with a handful
//! of CRUD helpers: fetch one row, fetch a filtered/joined/aggregated
//! collection, create a row, bulk-update rows and upsert a row. Every helper
//! can run in a caller-supplied session or open its own, and can either return
//! failures or swallow them and return `None`.
//!
//! # Modules
//!
//! * [`assistant`] - The helper itself and its construction
//! * [`ops`] - Plain operations taking an explicit session
//! * [`middleware`] - Session injection and error suppression
//! * [`session`] - Sessions, the session factory and the schema base
//! * [`query`] - Fetch descriptors for multi-row reads
//! * [`config`] - Database and logging configuration
//! * [`logger`] - Injectable logger and default log sinks

/// The data access helper
pub mod assistant;

/// Configuration module for database and logging settings
pub mod config;

/// Default values and fixed message text
pub mod constants;

/// Error taxonomy and failure classification
pub mod error;

/// Logging utilities and default process-wide sinks
pub mod logger;

/// Session injection and error suppression wrappers
pub mod middleware;

/// Data operations on an explicit session
pub mod ops;

/// Fetch descriptors: predicates, ordering, grouping, joins, aggregates, projection
pub mod query;

/// Sessions over SeaORM connections
pub mod session;

/// Value rendering and primary key helpers
pub mod utils;

pub use assistant::{SqlAssistant, SqlAssistantBuilder};
pub use error::{AssistantError, Result};
pub use logger::Logger;
pub use middleware::{Call, OnError, SessionScope};
pub use query::{col, Aggregate, Fetch, Join, JoinKind, Rows};
pub use session::{SchemaBase, Session, SessionFactory};
