//! In-process backend with the reference server's semantics.
//!
//! Used for offline snapshots and as the observable backend in tests: every
//! call is recorded as `"METHOD /path"` before it is served, and the backend
//! can be switched offline to simulate transport failures.

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use kinro_core::{
    identifier::Id,
    schema::{Attribute, ClassRecord, Connection, DataRow, Property},
};

use super::{
    AttributePatch, Backend, ClassPatch, DataPatch, NewAttribute, NewClass, NewConnection,
    NewDataRow, NewProperty, PropertyPatch, RemoteError,
};

/// Serialized backend state: the class list, the connection list and any
/// loaded data rows.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub classes: Vec<ClassRecord>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub data: Vec<DataRow>,
}

#[derive(Debug, Default)]
struct State {
    snapshot: Snapshot,
    next_id: u64,
    requests: Vec<String>,
    offline: bool,
}

impl State {
    /// Records a request and fails it when offline.
    fn record(&mut self, method: &str, path: impl AsRef<str>) -> Result<(), RemoteError> {
        let request = format!("{method} {}", path.as_ref());
        trace!(request:? = request; "In-memory request");
        self.requests.push(request);
        if self.offline {
            return Err(RemoteError::Transport("backend is offline".to_string()));
        }
        Ok(())
    }

    fn issue_id(&mut self) -> Id {
        let id = Id::from(self.next_id);
        self.next_id += 1;
        id
    }

    fn class_mut(&mut self, id: &Id) -> Result<&mut ClassRecord, RemoteError> {
        self.snapshot
            .classes
            .iter_mut()
            .find(|class| &class.id == id)
            .ok_or_else(|| not_found("class", id))
    }

    fn attribute_mut(&mut self, id: &Id) -> Result<&mut Attribute, RemoteError> {
        self.snapshot
            .classes
            .iter_mut()
            .flat_map(|class| class.attributes.iter_mut())
            .find(|attribute| &attribute.id == id)
            .ok_or_else(|| not_found("attribute", id))
    }

    fn property_mut(&mut self, id: &Id) -> Result<&mut Property, RemoteError> {
        self.snapshot
            .classes
            .iter_mut()
            .flat_map(|class| class.attributes.iter_mut())
            .flat_map(|attribute| attribute.properties.iter_mut())
            .find(|property| &property.id == id)
            .ok_or_else(|| not_found("property", id))
    }

    fn has_class(&self, id: &Id) -> bool {
        self.snapshot.classes.iter().any(|class| &class.id == id)
    }
}

fn not_found(resource: &'static str, id: &Id) -> RemoteError {
    RemoteError::NotFound {
        resource,
        id: id.clone(),
    }
}

/// Backend that serves requests from memory.
///
/// Ids are issued sequentially as decimal strings, continuing after the
/// largest numeric id found in a seeding snapshot. Deleting a class removes
/// its attributes, properties and data rows together with every connection
/// that touches it.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
}

impl InMemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::from_snapshot(Snapshot::default())
    }

    /// Creates a backend holding `snapshot`.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let next_id = max_numeric_id(&snapshot) + 1;
        debug!(
            classes = snapshot.classes.len(),
            connections = snapshot.connections.len(),
            next_id;
            "Seeding in-memory backend"
        );
        Self {
            state: Mutex::new(State {
                snapshot,
                next_id,
                ..State::default()
            }),
        }
    }

    /// Returns a copy of the current state.
    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot.clone()
    }

    /// Every request served so far, as `"METHOD /path"`, oldest first.
    pub fn requests(&self) -> Vec<String> {
        self.lock().requests.clone()
    }

    /// Forgets the recorded requests.
    pub fn clear_requests(&self) {
        self.lock().requests.clear();
    }

    /// While offline every request is recorded and then fails with
    /// [`RemoteError::Transport`].
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn max_numeric_id(snapshot: &Snapshot) -> u64 {
    let class_ids = snapshot.classes.iter().flat_map(|class| {
        std::iter::once(&class.id).chain(class.attributes.iter().flat_map(|attribute| {
            std::iter::once(&attribute.id)
                .chain(attribute.properties.iter().map(|property| &property.id))
        }))
    });
    let connection_ids = snapshot.connections.iter().map(|connection| &connection.id);
    let row_ids = snapshot.data.iter().map(|row| &row.id);

    class_ids
        .chain(connection_ids)
        .chain(row_ids)
        .filter_map(|id| id.as_str().parse::<u64>().ok())
        .max()
        .unwrap_or(0)
}

impl Backend for InMemoryBackend {
    async fn fetch_classes(&self) -> Result<Vec<ClassRecord>, RemoteError> {
        let mut state = self.lock();
        state.record("GET", "/classes/")?;
        Ok(state.snapshot.classes.clone())
    }

    async fn create_class(&self, class: &NewClass) -> Result<ClassRecord, RemoteError> {
        let mut state = self.lock();
        state.record("POST", "/classes/")?;
        let record = ClassRecord {
            id: state.issue_id(),
            name: class.name.clone(),
            position_x: 0.0,
            position_y: 0.0,
            attributes: Vec::new(),
        };
        state.snapshot.classes.push(record.clone());
        Ok(record)
    }

    async fn update_class(
        &self,
        id: &Id,
        patch: &ClassPatch,
    ) -> Result<ClassRecord, RemoteError> {
        let mut state = self.lock();
        state.record("PATCH", format!("/classes/{id}"))?;
        let class = state.class_mut(id)?;
        if let Some(name) = &patch.name {
            class.name = name.clone();
        }
        if let Some(x) = patch.position_x {
            class.position_x = x;
        }
        if let Some(y) = patch.position_y {
            class.position_y = y;
        }
        Ok(class.clone())
    }

    async fn delete_class(&self, id: &Id) -> Result<(), RemoteError> {
        let mut state = self.lock();
        state.record("DELETE", format!("/classes/{id}"))?;
        if !state.has_class(id) {
            return Err(not_found("class", id));
        }
        let snapshot = &mut state.snapshot;
        snapshot.classes.retain(|class| &class.id != id);
        snapshot.data.retain(|row| &row.class_id != id);
        snapshot
            .connections
            .retain(|connection| !connection.touches(id));
        Ok(())
    }

    async fn create_attribute(
        &self,
        attribute: &NewAttribute,
    ) -> Result<Attribute, RemoteError> {
        let mut state = self.lock();
        state.record("POST", "/attributes/")?;
        if !state.has_class(&attribute.class_id) {
            return Err(not_found("class", &attribute.class_id));
        }
        let record = Attribute {
            id: state.issue_id(),
            class_id: attribute.class_id.clone(),
            name: attribute.name.clone(),
            data_type: attribute.data_type,
            properties: Vec::new(),
        };
        state
            .class_mut(&attribute.class_id)?
            .attributes
            .push(record.clone());
        Ok(record)
    }

    async fn update_attribute(
        &self,
        id: &Id,
        patch: &AttributePatch,
    ) -> Result<Attribute, RemoteError> {
        let mut state = self.lock();
        state.record("PATCH", format!("/attributes/{id}"))?;
        let attribute = state.attribute_mut(id)?;
        if let Some(name) = &patch.name {
            attribute.name = name.clone();
        }
        if let Some(data_type) = patch.data_type {
            attribute.data_type = data_type;
        }
        Ok(attribute.clone())
    }

    async fn delete_attribute(&self, id: &Id) -> Result<(), RemoteError> {
        let mut state = self.lock();
        state.record("DELETE", format!("/attributes/{id}"))?;
        let owner = state
            .snapshot
            .classes
            .iter_mut()
            .find(|class| class.attributes.iter().any(|attribute| &attribute.id == id))
            .ok_or_else(|| not_found("attribute", id))?;
        owner.attributes.retain(|attribute| &attribute.id != id);
        Ok(())
    }

    async fn create_property(&self, property: &NewProperty) -> Result<Property, RemoteError> {
        let mut state = self.lock();
        state.record("POST", "/properties/")?;
        let id = state.issue_id();
        let attribute = state.attribute_mut(&property.attribute_id)?;
        let record = Property {
            id,
            attribute_id: property.attribute_id.clone(),
            kind: property.kind,
            value: property.value.clone(),
        };
        attribute.properties.push(record.clone());
        Ok(record)
    }

    async fn update_property(
        &self,
        id: &Id,
        patch: &PropertyPatch,
    ) -> Result<Property, RemoteError> {
        let mut state = self.lock();
        state.record("PATCH", format!("/properties/{id}"))?;
        let property = state.property_mut(id)?;
        if let Some(kind) = patch.kind {
            property.kind = kind;
        }
        if let Some(value) = &patch.value {
            property.value = value.clone();
        }
        Ok(property.clone())
    }

    async fn delete_property(&self, id: &Id) -> Result<(), RemoteError> {
        let mut state = self.lock();
        state.record("DELETE", format!("/properties/{id}"))?;
        let owner = state
            .snapshot
            .classes
            .iter_mut()
            .flat_map(|class| class.attributes.iter_mut())
            .find(|attribute| attribute.properties.iter().any(|property| &property.id == id))
            .ok_or_else(|| not_found("property", id))?;
        owner.properties.retain(|property| &property.id != id);
        Ok(())
    }

    async fn fetch_connections(&self) -> Result<Vec<Connection>, RemoteError> {
        let mut state = self.lock();
        state.record("GET", "/connections/")?;
        Ok(state.snapshot.connections.clone())
    }

    async fn create_connection(
        &self,
        connection: &NewConnection,
    ) -> Result<Connection, RemoteError> {
        let mut state = self.lock();
        state.record("POST", "/connections/")?;
        for endpoint in [&connection.source_class, &connection.target_class] {
            if !state.has_class(endpoint) {
                return Err(not_found("class", endpoint));
            }
        }
        let record = Connection {
            id: state.issue_id(),
            source_class: connection.source_class.clone(),
            target_class: connection.target_class.clone(),
            relationship_type: connection.relationship_type,
        };
        state.snapshot.connections.push(record.clone());
        Ok(record)
    }

    async fn delete_connection(&self, id: &Id) -> Result<(), RemoteError> {
        let mut state = self.lock();
        state.record("DELETE", format!("/connections/{id}"))?;
        let before = state.snapshot.connections.len();
        state
            .snapshot
            .connections
            .retain(|connection| &connection.id != id);
        if state.snapshot.connections.len() == before {
            return Err(not_found("connection", id));
        }
        Ok(())
    }

    async fn fetch_class_data(&self, class_id: &Id) -> Result<Vec<DataRow>, RemoteError> {
        let mut state = self.lock();
        state.record("GET", format!("/data/{class_id}/data/"))?;
        Ok(state
            .snapshot
            .data
            .iter()
            .filter(|row| &row.class_id == class_id)
            .cloned()
            .collect())
    }

    async fn create_data_batch(&self, rows: &[NewDataRow]) -> Result<(), RemoteError> {
        let mut state = self.lock();
        state.record("POST", "/data/batch")?;
        if let Some(row) = rows.iter().find(|row| !state.has_class(&row.class_id)) {
            return Err(not_found("class", &row.class_id));
        }
        for row in rows {
            let record = DataRow {
                id: state.issue_id(),
                class_id: row.class_id.clone(),
                content: row.content.clone(),
            };
            state.snapshot.data.push(record);
        }
        Ok(())
    }

    async fn update_data(&self, id: &Id, patch: &DataPatch) -> Result<DataRow, RemoteError> {
        let mut state = self.lock();
        state.record("PATCH", format!("/data/{id}"))?;
        let row = state
            .snapshot
            .data
            .iter_mut()
            .find(|row| &row.id == id)
            .ok_or_else(|| not_found("data row", id))?;
        row.content = patch.content.clone();
        Ok(row.clone())
    }

    async fn delete_data(&self, id: &Id) -> Result<(), RemoteError> {
        let mut state = self.lock();
        state.record("DELETE", format!("/data/{id}"))?;
        let before = state.snapshot.data.len();
        state.snapshot.data.retain(|row| &row.id != id);
        if state.snapshot.data.len() == before {
            return Err(not_found("data row", id));
        }
        Ok(())
    }

    async fn delete_data_batch(&self, ids: &[Id]) -> Result<(), RemoteError> {
        let mut state = self.lock();
        state.record("DELETE", "/data/batch")?;
        state.snapshot.data.retain(|row| !ids.contains(&row.id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use kinro_core::schema::{DataType, RelationKind};

    use super::*;

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    #[test]
    fn test_ids_continue_after_snapshot() {
        let backend = InMemoryBackend::from_snapshot(Snapshot {
            classes: vec![ClassRecord {
                id: Id::from(41u64),
                name: "Seed".to_string(),
                position_x: 0.0,
                position_y: 0.0,
                attributes: Vec::new(),
            }],
            ..Snapshot::default()
        });

        let created = block_on(backend.create_class(&NewClass {
            name: "Next".to_string(),
        }))
        .unwrap();
        assert_eq!(created.id, Id::from(42u64));
    }

    #[test]
    fn test_delete_class_cascades() {
        let backend = InMemoryBackend::new();
        block_on(async {
            let a = backend
                .create_class(&NewClass { name: "A".into() })
                .await
                .unwrap();
            let b = backend
                .create_class(&NewClass { name: "B".into() })
                .await
                .unwrap();
            backend
                .create_attribute(&NewAttribute {
                    class_id: b.id.clone(),
                    name: "code".into(),
                    data_type: DataType::Text,
                })
                .await
                .unwrap();
            backend
                .create_connection(&NewConnection {
                    source_class: a.id.clone(),
                    target_class: b.id.clone(),
                    relationship_type: RelationKind::OneToOne,
                })
                .await
                .unwrap();

            backend.delete_class(&b.id).await.unwrap();
        });

        let snapshot = backend.snapshot();
        assert_eq!(snapshot.classes.len(), 1);
        assert!(snapshot.connections.is_empty());
    }

    #[test]
    fn test_offline_requests_are_recorded_and_fail() {
        let backend = InMemoryBackend::new();
        backend.set_offline(true);

        let result = block_on(backend.fetch_classes());

        assert!(matches!(result, Err(RemoteError::Transport(_))));
        assert_eq!(backend.requests(), ["GET /classes/"]);
    }

    #[test]
    fn test_unknown_ids_are_not_found() {
        let backend = InMemoryBackend::new();
        let result = block_on(backend.delete_connection(&Id::new("missing")));
        assert_eq!(
            result,
            Err(RemoteError::NotFound {
                resource: "connection",
                id: Id::new("missing")
            })
        );
    }
}
