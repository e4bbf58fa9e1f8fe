//! Declarative-infrastructure adapters for the Archestra API.
//!
//! # Overview
//! A plan/apply host drives this crate through [`ArchestraProvider`]: it
//! configures the provider once, plans each resource against its schema, then
//! calls create, read, update, delete or import with JSON documents. Each
//! call returns the new state (or none) plus [`Diagnostics`].
//!
//! # Design
//! - Resources and data sources are typed ([`Resource`], [`DataSource`]) and
//!   erased to JSON handlers at the registry boundary.
//! - Host values are tri-state ([`Value`]); null fields are omitted from
//!   requests and absent response fields become null.
//! - Failures never panic or return `Err`: validation, transport and API
//!   problems all become diagnostics, and failed operations leave the host's
//!   state untouched.

pub mod config;
pub mod data_sources;
pub mod diag;
pub mod framework;
pub mod provider;
pub mod resources;
pub mod schema;
pub mod value;

pub use config::{ConfigError, ProviderConfig};
pub use diag::{AttributePath, Diagnostic, Diagnostics, Severity};
pub use framework::{DataSource, DataSourceHandler, OperationContext, Resource, ResourceHandler, StateResult};
pub use provider::ArchestraProvider;
pub use schema::{Attribute, AttributeKind, PlanModifier, PlannedChange, Presence, Schema};
pub use value::Value;
