//! Remote sync client.
//!
//! The [`Backend`] trait has one async method per REST call the client makes.
//! Request bodies are the payload types in this module; responses are the
//! [`schema`](kinro_core::schema) records.
//!
//! Two implementations are provided:
//! - [`HttpBackend`] talks to the REST server (feature `http`)
//! - [`InMemoryBackend`] keeps the same semantics in process, for offline
//!   snapshots and tests

#[cfg(feature = "http")]
mod http;
mod memory;

#[cfg(feature = "http")]
pub use http::HttpBackend;
pub use memory::{InMemoryBackend, Snapshot};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use kinro_core::{
    geometry::Point,
    identifier::Id,
    schema::{
        Attribute, ClassRecord, Connection, DataRow, DataType, Property, PropertyKind,
        RelationKind, RowContent,
    },
};

/// Failure of a single remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("{method} {path} returned {status}: {detail}")]
    Status {
        method: String,
        path: String,
        status: u16,
        detail: String,
    },

    #[error("{resource} `{id}` not found")]
    NotFound { resource: &'static str, id: Id },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("unexpected response body: {0}")]
    Decode(String),
}

/// Body of `POST /classes/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewClass {
    pub name: String,
}

/// Body of `PATCH /classes/{id}`. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_y: Option<f32>,
}

impl ClassPatch {
    /// A patch that only changes the name.
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// A patch that only changes the position.
    pub fn position(position: Point) -> Self {
        Self {
            position_x: Some(position.x()),
            position_y: Some(position.y()),
            ..Self::default()
        }
    }
}

/// Body of `POST /attributes/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAttribute {
    pub class_id: Id,
    pub name: String,
    pub data_type: DataType,
}

/// Body of `PATCH /attributes/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
}

/// Body of `POST /properties/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProperty {
    pub attribute_id: Id,
    #[serde(rename = "name")]
    pub kind: PropertyKind,
    pub value: String,
}

/// Body of `PATCH /properties/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyPatch {
    #[serde(rename = "name", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<PropertyKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Body of `POST /connections/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewConnection {
    pub source_class: Id,
    pub target_class: Id,
    pub relationship_type: RelationKind,
}

/// One element of the `POST /data/batch` body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDataRow {
    pub class_id: Id,
    pub content: RowContent,
}

/// Body of `PATCH /data/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPatch {
    pub content: RowContent,
}

/// The REST resources the client consumes.
///
/// Every method maps to exactly one request. Implementations report failures
/// as [`RemoteError`] and never retry.
#[allow(async_fn_in_trait)]
pub trait Backend {
    /// `GET /classes/`
    async fn fetch_classes(&self) -> Result<Vec<ClassRecord>, RemoteError>;

    /// `POST /classes/`
    async fn create_class(&self, class: &NewClass) -> Result<ClassRecord, RemoteError>;

    /// `PATCH /classes/{id}`
    async fn update_class(&self, id: &Id, patch: &ClassPatch)
    -> Result<ClassRecord, RemoteError>;

    /// `DELETE /classes/{id}`
    async fn delete_class(&self, id: &Id) -> Result<(), RemoteError>;

    /// `POST /attributes/`
    async fn create_attribute(&self, attribute: &NewAttribute)
    -> Result<Attribute, RemoteError>;

    /// `PATCH /attributes/{id}`
    async fn update_attribute(
        &self,
        id: &Id,
        patch: &AttributePatch,
    ) -> Result<Attribute, RemoteError>;

    /// `DELETE /attributes/{id}`
    async fn delete_attribute(&self, id: &Id) -> Result<(), RemoteError>;

    /// `POST /properties/`
    async fn create_property(&self, property: &NewProperty) -> Result<Property, RemoteError>;

    /// `PATCH /properties/{id}`
    async fn update_property(
        &self,
        id: &Id,
        patch: &PropertyPatch,
    ) -> Result<Property, RemoteError>;

    /// `DELETE /properties/{id}`
    async fn delete_property(&self, id: &Id) -> Result<(), RemoteError>;

    /// `GET /connections/`
    async fn fetch_connections(&self) -> Result<Vec<Connection>, RemoteError>;

    /// `POST /connections/`
    async fn create_connection(
        &self,
        connection: &NewConnection,
    ) -> Result<Connection, RemoteError>;

    /// `DELETE /connections/{id}`
    async fn delete_connection(&self, id: &Id) -> Result<(), RemoteError>;

    /// `GET /data/{class_id}/data/`
    async fn fetch_class_data(&self, class_id: &Id) -> Result<Vec<DataRow>, RemoteError>;

    /// `POST /data/batch`
    async fn create_data_batch(&self, rows: &[NewDataRow]) -> Result<(), RemoteError>;

    /// `PATCH /data/{id}`
    async fn update_data(&self, id: &Id, patch: &DataPatch) -> Result<DataRow, RemoteError>;

    /// `DELETE /data/{id}`
    async fn delete_data(&self, id: &Id) -> Result<(), RemoteError>;

    /// `DELETE /data/batch`
    async fn delete_data_batch(&self, ids: &[Id]) -> Result<(), RemoteError>;
}
