//! The diagram state store.
//!
//! [`DiagramStore`] is the single owner of the rendered [`DiagramView`]. It
//! translates user gestures into backend calls and keeps the view in step
//! with the backend:
//!
//! - position changes are applied locally first and persisted on the final
//!   drag tick, best effort
//! - structural changes are validated, sent, and on success followed by a
//!   full reload; on failure the view is left untouched
//! - a reload fetches classes and connections together, rebuilds the view,
//!   lays out unplaced nodes and swaps the result in as a whole
//!
//! Every mutating operation takes `&mut self`, so reloads never interleave.

mod change;
mod gesture;

pub use change::{StructuralChange, duplicate_name};
pub use gesture::{ConnectionGesture, GestureOutcome};

use std::mem;

use log::{debug, info, trace, warn};

use kinro_core::{
    geometry::Point,
    identifier::Id,
    schema::{Connection, DataRow, RelationKind, RowContent},
    validation::{
        ValidationError, validate_attribute_name, validate_class_name, validate_property_value,
    },
};

use crate::{
    config::LayoutConfig,
    data::{self, DataTable},
    error::KinroError,
    layout::LayoutEngine,
    remote::{
        AttributePatch, Backend, ClassPatch, DataPatch, NewAttribute, NewClass, NewConnection,
        NewDataRow, NewProperty, PropertyPatch,
    },
    view::{DiagramView, EdgeView, NodeView, Placement},
};

/// Owner of the diagram view, generic over the backend it syncs with.
#[derive(Debug)]
pub struct DiagramStore<B> {
    backend: B,
    layout: LayoutEngine,
    view: DiagramView,
    gesture: ConnectionGesture,
}

impl<B: Backend> DiagramStore<B> {
    /// Creates a store with an empty view and the default layout settings.
    /// Call [`reload`](Self::reload) to populate it.
    pub fn new(backend: B) -> Self {
        Self::with_layout(backend, LayoutConfig::default())
    }

    pub fn with_layout(backend: B, layout: LayoutConfig) -> Self {
        Self {
            backend,
            layout: LayoutEngine::new(layout),
            view: DiagramView::default(),
            gesture: ConnectionGesture::Idle,
        }
    }

    pub fn view(&self) -> &DiagramView {
        &self.view
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn gesture(&self) -> &ConnectionGesture {
        &self.gesture
    }

    /// Refetches the class and connection lists and replaces the view.
    ///
    /// # Errors
    ///
    /// Returns [`KinroError::Reload`] if either fetch fails; the previous
    /// view is kept.
    pub async fn reload(&mut self) -> Result<(), KinroError> {
        debug!("Reloading diagram");

        let (classes, connections) = tokio::join!(
            self.backend.fetch_classes(),
            self.backend.fetch_connections()
        );
        let classes = classes.map_err(|err| {
            warn!(err:%; "Failed to fetch classes, keeping current view");
            KinroError::Reload(err)
        })?;
        let connections = connections.map_err(|err| {
            warn!(err:%; "Failed to fetch connections, keeping current view");
            KinroError::Reload(err)
        })?;

        let mut view = DiagramView::build(classes, connections);
        self.layout.apply(&mut view);
        trace!(view:?; "Rebuilt view");

        info!(
            nodes = view.nodes().len(),
            edges = view.edges().len();
            "Diagram reloaded"
        );
        self.view = view;
        Ok(())
    }

    /// Moves a node.
    ///
    /// The local position changes immediately. When `is_final` is set the
    /// position is also persisted; a failure to persist is logged and the
    /// local position is kept.
    ///
    /// # Errors
    ///
    /// Returns [`KinroError::NodeNotFound`] if no node has `id`.
    pub async fn apply_position_change(
        &mut self,
        id: &Id,
        position: Point,
        is_final: bool,
    ) -> Result<(), KinroError> {
        let node = self
            .view
            .node_mut(id)
            .ok_or_else(|| KinroError::NodeNotFound(id.clone()))?;
        node.place(position, Placement::Dragged);
        trace!(id:% = id, x = position.x(), y = position.y(); "Node moved");

        if is_final {
            match self
                .backend
                .update_class(id, &ClassPatch::position(position))
                .await
            {
                Ok(_) => debug!(id:% = id; "Position persisted"),
                Err(err) => warn!(id:% = id, err:%; "Failed to persist position"),
            }
        }
        Ok(())
    }

    /// Applies a structural change.
    ///
    /// Input is validated before anything is sent. On success the view is
    /// reloaded, except for renames which patch the label in place. Returns
    /// the id of the created entity for creating changes.
    ///
    /// # Errors
    ///
    /// - [`KinroError::Validation`], [`KinroError::NodeNotFound`] or
    ///   [`KinroError::DuplicateConnection`] if the change is rejected
    ///   locally; nothing is sent.
    /// - [`KinroError::Remote`] if the backend refuses the change; the view
    ///   is untouched.
    /// - [`KinroError::Reload`] if the change succeeded but the reload
    ///   after it failed.
    pub async fn apply_structural_change(
        &mut self,
        change: StructuralChange,
    ) -> Result<Option<Id>, KinroError> {
        let name = change.name();
        let reloads = change.reloads();
        info!(change = name; "Applying structural change");

        let created = self.send_change(change).await.inspect_err(|err| {
            warn!(change = name, err:%; "Structural change failed");
        })?;

        if reloads {
            self.reload().await?;
        }
        Ok(created)
    }

    async fn send_change(&mut self, change: StructuralChange) -> Result<Option<Id>, KinroError> {
        match change {
            StructuralChange::CreateClass { name } => {
                validate_class_name(&name)?;
                let class = self.backend.create_class(&NewClass { name }).await?;
                Ok(Some(class.id))
            }
            StructuralChange::RenameClass { id, name } => {
                validate_class_name(&name)?;
                self.require_node(&id)?;
                self.backend
                    .update_class(&id, &ClassPatch::rename(name.clone()))
                    .await?;
                self.view.rename_node(&id, &name);
                Ok(None)
            }
            StructuralChange::DeleteClass { id } => {
                self.require_node(&id)?;
                self.backend.delete_class(&id).await?;
                Ok(None)
            }
            StructuralChange::DuplicateClass { id } => {
                let label = self.require_node(&id)?.label().to_string();
                let class = self
                    .backend
                    .create_class(&NewClass {
                        name: duplicate_name(&label),
                    })
                    .await?;
                Ok(Some(class.id))
            }
            StructuralChange::CreateAttribute {
                class_id,
                name,
                data_type,
            } => {
                validate_attribute_name(&name)?;
                self.require_node(&class_id)?;
                let attribute = self
                    .backend
                    .create_attribute(&NewAttribute {
                        class_id,
                        name,
                        data_type,
                    })
                    .await?;
                Ok(Some(attribute.id))
            }
            StructuralChange::UpdateAttribute {
                id,
                name,
                data_type,
            } => {
                if name.is_none() && data_type.is_none() {
                    return Err(ValidationError::EmptyAttributeUpdate.into());
                }
                if let Some(name) = &name {
                    validate_attribute_name(name)?;
                }
                self.backend
                    .update_attribute(&id, &AttributePatch { name, data_type })
                    .await?;
                Ok(None)
            }
            StructuralChange::DeleteAttribute { id } => {
                self.backend.delete_attribute(&id).await?;
                Ok(None)
            }
            StructuralChange::CreateProperty {
                attribute_id,
                kind,
                value,
            } => {
                validate_property_value(kind, &value)?;
                let property = self
                    .backend
                    .create_property(&NewProperty {
                        attribute_id,
                        kind,
                        value: value.trim().to_string(),
                    })
                    .await?;
                Ok(Some(property.id))
            }
            StructuralChange::UpdateProperty { id, kind, value } => {
                validate_property_value(kind, &value)?;
                self.backend
                    .update_property(
                        &id,
                        &PropertyPatch {
                            kind: Some(kind),
                            value: Some(value.trim().to_string()),
                        },
                    )
                    .await?;
                Ok(None)
            }
            StructuralChange::DeleteProperty { id } => {
                self.backend.delete_property(&id).await?;
                Ok(None)
            }
            StructuralChange::Connect {
                source,
                target,
                kind,
            } => {
                let connection = self.send_connect(source, target, kind).await?;
                Ok(Some(connection.id))
            }
            StructuralChange::Disconnect { id } => {
                self.backend.delete_connection(&id).await?;
                Ok(None)
            }
        }
    }

    /// Creates a connection after checking both endpoints and the
    /// duplicate guard.
    async fn send_connect(
        &self,
        source: Id,
        target: Id,
        kind: RelationKind,
    ) -> Result<Connection, KinroError> {
        self.require_node(&source)?;
        self.require_node(&target)?;
        if self.view.has_connection(&source, &target) {
            info!(source:% = source, target:% = target; "Connection already exists");
            return Err(KinroError::DuplicateConnection {
                from: source,
                to: target,
            });
        }
        let connection = self
            .backend
            .create_connection(&NewConnection {
                source_class: source,
                target_class: target,
                relationship_type: kind,
            })
            .await?;
        Ok(connection)
    }

    fn require_node(&self, id: &Id) -> Result<&NodeView, KinroError> {
        self.view
            .node(id)
            .ok_or_else(|| KinroError::NodeNotFound(id.clone()))
    }

    /// Starts a connection gesture from `source` to `target`, replacing any
    /// pending one.
    ///
    /// # Errors
    ///
    /// Returns [`KinroError::NodeNotFound`] if either endpoint is not in the
    /// view.
    pub fn begin_connection(&mut self, source: Id, target: Id) -> Result<(), KinroError> {
        self.require_node(&source)?;
        self.require_node(&target)?;
        debug!(source:% = source, target:% = target; "Connection gesture started");
        self.gesture = ConnectionGesture::PendingRelationshipChoice { source, target };
        Ok(())
    }

    /// Completes the pending gesture with relationship type `kind`.
    ///
    /// The gesture is back to idle whatever the result.
    ///
    /// # Errors
    ///
    /// Returns [`KinroError::NoPendingConnection`] if no gesture is pending,
    /// or the error of the connect change if it failed for a reason other
    /// than a duplicate.
    pub async fn choose_relationship(
        &mut self,
        kind: RelationKind,
    ) -> Result<GestureOutcome, KinroError> {
        let ConnectionGesture::PendingRelationshipChoice { source, target } =
            mem::take(&mut self.gesture)
        else {
            return Err(KinroError::NoPendingConnection);
        };

        let connection = match self.send_connect(source, target, kind).await {
            Ok(connection) => connection,
            Err(KinroError::DuplicateConnection { from, to }) => {
                return Ok(GestureOutcome::Rejected {
                    source: from,
                    target: to,
                });
            }
            Err(err) => {
                warn!(err:%; "Connection gesture failed");
                return Err(err);
            }
        };

        self.reload().await?;
        info!(id:% = connection.id, kind:% = kind; "Connection committed");
        Ok(GestureOutcome::Committed(EdgeView::from(&connection)))
    }

    /// Cancels the pending gesture.
    ///
    /// # Errors
    ///
    /// Returns [`KinroError::NoPendingConnection`] if no gesture is pending.
    pub fn abort_connection(&mut self) -> Result<GestureOutcome, KinroError> {
        match mem::take(&mut self.gesture) {
            ConnectionGesture::Idle => Err(KinroError::NoPendingConnection),
            ConnectionGesture::PendingRelationshipChoice { .. } => {
                debug!("Connection gesture aborted");
                Ok(GestureOutcome::Aborted)
            }
        }
    }

    /// Fetches the data rows of a class.
    pub async fn class_data(&self, class_id: &Id) -> Result<DataTable, KinroError> {
        let rows = self.backend.fetch_class_data(class_id).await?;
        debug!(class_id:% = class_id, rows = rows.len(); "Fetched class data");
        Ok(DataTable::from_rows(rows))
    }

    /// Returns the attribute names of a class, in order. These are the
    /// columns an import for the class accepts.
    pub fn template_columns(&self, class_id: &Id) -> Result<Vec<String>, KinroError> {
        Ok(self
            .require_node(class_id)?
            .data()
            .attributes
            .iter()
            .map(|attribute| attribute.name.clone())
            .collect())
    }

    /// Imports rows into a class.
    ///
    /// Cells whose key is not an attribute name are dropped, then rows
    /// without any non-empty cell are dropped. The remaining rows are created
    /// in one batch and the view is reloaded. Returns the number of rows
    /// created; nothing is sent when no row remains.
    pub async fn import_rows(
        &mut self,
        class_id: &Id,
        rows: Vec<RowContent>,
    ) -> Result<usize, KinroError> {
        let columns = self.template_columns(class_id)?;
        let received = rows.len();

        let batch: Vec<NewDataRow> = rows
            .iter()
            .map(|content| data::filter_to_attributes(content, &columns))
            .filter(|content| !data::is_blank(content))
            .map(|content| NewDataRow {
                class_id: class_id.clone(),
                content,
            })
            .collect();

        if batch.is_empty() {
            info!(class_id:% = class_id, received; "No importable rows");
            return Ok(0);
        }

        self.backend.create_data_batch(&batch).await?;
        info!(class_id:% = class_id, received, imported = batch.len(); "Rows imported");

        self.reload().await?;
        Ok(batch.len())
    }

    /// Replaces the content of one data row.
    pub async fn update_row(&self, id: &Id, content: RowContent) -> Result<DataRow, KinroError> {
        let row = self.backend.update_data(id, &DataPatch { content }).await?;
        debug!(id:% = id; "Row updated");
        Ok(row)
    }

    /// Deletes one data row.
    pub async fn delete_row(&self, id: &Id) -> Result<(), KinroError> {
        self.backend.delete_data(id).await?;
        info!(id:% = id; "Row deleted");
        Ok(())
    }

    /// Deletes data rows in one batch. Returns the number of ids sent;
    /// nothing is sent for an empty list.
    pub async fn delete_rows(&self, ids: &[Id]) -> Result<usize, KinroError> {
        if ids.is_empty() {
            return Ok(0);
        }
        self.backend.delete_data_batch(ids).await?;
        info!(count = ids.len(); "Rows deleted");
        Ok(ids.len())
    }
}

#[cfg(test)]
mod tests {
    use kinro_core::schema::{ClassRecord, DataType, PropertyKind};

    use super::*;
    use crate::remote::{InMemoryBackend, Snapshot};

    fn seeded() -> DiagramStore<InMemoryBackend> {
        let class = |id: u64, name: &str| ClassRecord {
            id: Id::from(id),
            name: name.to_string(),
            position_x: 0.0,
            position_y: 0.0,
            attributes: Vec::new(),
        };
        DiagramStore::new(InMemoryBackend::from_snapshot(Snapshot {
            classes: vec![class(1, "A"), class(2, "B")],
            ..Snapshot::default()
        }))
    }

    #[tokio::test]
    async fn test_validation_failures_send_nothing() {
        let mut store = seeded();
        store.reload().await.unwrap();
        store.backend().clear_requests();

        let changes = [
            StructuralChange::CreateClass {
                name: "  ".to_string(),
            },
            StructuralChange::CreateAttribute {
                class_id: Id::from(1u64),
                name: "bad name".to_string(),
                data_type: DataType::Text,
            },
            StructuralChange::UpdateAttribute {
                id: Id::new("x"),
                name: None,
                data_type: None,
            },
            StructuralChange::CreateProperty {
                attribute_id: Id::new("x"),
                kind: PropertyKind::MaxLength,
                value: "ten".to_string(),
            },
        ];
        for change in changes {
            let result = store.apply_structural_change(change).await;
            assert!(matches!(result, Err(KinroError::Validation(_))));
        }
        assert!(store.backend().requests().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_node_sends_nothing() {
        let mut store = seeded();
        store.reload().await.unwrap();
        store.backend().clear_requests();

        let result = store
            .apply_structural_change(StructuralChange::DeleteClass { id: Id::from(9u64) })
            .await;
        assert!(matches!(result, Err(KinroError::NodeNotFound(_))));

        let result = store
            .apply_position_change(&Id::from(9u64), Point::new(1.0, 1.0), true)
            .await;
        assert!(matches!(result, Err(KinroError::NodeNotFound(_))));

        assert!(store.backend().requests().is_empty());
    }

    #[tokio::test]
    async fn test_choose_without_pending_gesture() {
        let mut store = seeded();
        let result = store.choose_relationship(RelationKind::OneToOne).await;
        assert!(matches!(result, Err(KinroError::NoPendingConnection)));
        assert!(matches!(
            store.abort_connection(),
            Err(KinroError::NoPendingConnection)
        ));
    }

    #[tokio::test]
    async fn test_abort_returns_to_idle() {
        let mut store = seeded();
        store.reload().await.unwrap();

        store
            .begin_connection(Id::from(1u64), Id::from(2u64))
            .unwrap();
        assert_eq!(
            store.gesture().pending(),
            Some((&Id::from(1u64), &Id::from(2u64)))
        );

        assert_eq!(store.abort_connection().unwrap(), GestureOutcome::Aborted);
        assert!(store.gesture().is_idle());
    }

    #[tokio::test]
    async fn test_delete_rows_with_no_ids_sends_nothing() {
        let store = seeded();
        assert_eq!(store.delete_rows(&[]).await.unwrap(), 0);
        assert!(store.backend().requests().is_empty());
    }
}
