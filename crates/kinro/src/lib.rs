//! Kinro - a client for schema-modelling diagrams.
//!
//! Users define schemas (classes with typed attributes, attribute
//! properties, and typed relationships between classes) on a REST backend;
//! this crate keeps a node-and-edge view of that schema in sync with it.
//!
//! - [`store::DiagramStore`] owns the view and turns gestures into backend calls
//! - [`layout::LayoutEngine`] places nodes that have never been positioned
//! - [`remote::Backend`] is the REST surface, with HTTP and in-memory backends
//! - [`export::svg::SvgExporter`] renders the laid-out view
//!
//! # Examples
//!
//! ```rust
//! use kinro::{
//!     remote::InMemoryBackend,
//!     store::{DiagramStore, StructuralChange},
//! };
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let mut store = DiagramStore::new(InMemoryBackend::new());
//! store.reload().await?;
//!
//! store
//!     .apply_structural_change(StructuralChange::CreateClass {
//!         name: "Persona".to_string(),
//!     })
//!     .await?;
//!
//! assert_eq!(store.view().nodes()[0].label(), "Persona");
//! # Ok::<(), kinro::KinroError>(())
//! # }).unwrap();
//! ```

pub mod config;
pub mod data;
pub mod export;
pub mod layout;
pub mod remote;
pub mod store;
pub mod view;

mod error;

pub use kinro_core::{color, geometry, identifier, schema, validation};

pub use error::KinroError;
