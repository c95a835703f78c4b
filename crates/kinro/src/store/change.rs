//! Structural edits of the schema.

use kinro_core::{
    identifier::Id,
    schema::{DataType, PropertyKind, RelationKind},
};

/// An edit that changes the schema on the backend.
///
/// Each variant maps to exactly one remote call. Every variant except
/// [`RenameClass`](StructuralChange::RenameClass) is followed by a full
/// reload once the backend confirms it.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuralChange {
    CreateClass {
        name: String,
    },
    RenameClass {
        id: Id,
        name: String,
    },
    DeleteClass {
        id: Id,
    },
    /// Creates a new, empty class named after the source class with a
    /// `" (Copia)"` suffix.
    DuplicateClass {
        id: Id,
    },
    CreateAttribute {
        class_id: Id,
        name: String,
        data_type: DataType,
    },
    /// Changes the name, the data type, or both. At least one must be set.
    UpdateAttribute {
        id: Id,
        name: Option<String>,
        data_type: Option<DataType>,
    },
    DeleteAttribute {
        id: Id,
    },
    CreateProperty {
        attribute_id: Id,
        kind: PropertyKind,
        value: String,
    },
    UpdateProperty {
        id: Id,
        kind: PropertyKind,
        value: String,
    },
    DeleteProperty {
        id: Id,
    },
    Connect {
        source: Id,
        target: Id,
        kind: RelationKind,
    },
    Disconnect {
        id: Id,
    },
}

impl StructuralChange {
    /// Short name used in log records.
    pub fn name(&self) -> &'static str {
        match self {
            StructuralChange::CreateClass { .. } => "create_class",
            StructuralChange::RenameClass { .. } => "rename_class",
            StructuralChange::DeleteClass { .. } => "delete_class",
            StructuralChange::DuplicateClass { .. } => "duplicate_class",
            StructuralChange::CreateAttribute { .. } => "create_attribute",
            StructuralChange::UpdateAttribute { .. } => "update_attribute",
            StructuralChange::DeleteAttribute { .. } => "delete_attribute",
            StructuralChange::CreateProperty { .. } => "create_property",
            StructuralChange::UpdateProperty { .. } => "update_property",
            StructuralChange::DeleteProperty { .. } => "delete_property",
            StructuralChange::Connect { .. } => "connect",
            StructuralChange::Disconnect { .. } => "disconnect",
        }
    }

    /// Whether a successful change is followed by a full reload.
    pub fn reloads(&self) -> bool {
        !matches!(self, StructuralChange::RenameClass { .. })
    }
}

/// Name given to the copy of a class labelled `label`.
pub fn duplicate_name(label: &str) -> String {
    format!("{label} (Copia)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_rename_skips_reload() {
        let rename = StructuralChange::RenameClass {
            id: Id::new("1"),
            name: "A".to_string(),
        };
        let delete = StructuralChange::DeleteClass { id: Id::new("1") };
        assert!(!rename.reloads());
        assert!(delete.reloads());
    }

    #[test]
    fn test_duplicate_name() {
        assert_eq!(duplicate_name("Persona"), "Persona (Copia)");
    }
}
