//! The schema data model as exchanged with the backend.
//!
//! Field names follow the backend's JSON bodies (`position_x`, `class_id`,
//! `data_type`, `source_class`, ...). Collections that the backend may send
//! as `null` are read as empty.
//!
//! # Overview
//!
//! - [`ClassRecord`] - A user-defined schema entity, rendered as a diagram node
//! - [`Attribute`] - A typed field of a class
//! - [`Property`] - A constraint attached to an attribute
//! - [`Connection`] - A directed, typed relationship between two classes
//! - [`DataRow`] - One row of tabular data loaded into a class

use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{geometry::Point, identifier::Id, validation::ValidationError};

/// Content of a data row: column name to cell value, in column order.
pub type RowContent = IndexMap<String, serde_json::Value>;

/// Data type tag of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Integer,
    Text,
    Boolean,
    Date,
    Float,
    Json,
    Uuid,
}

impl DataType {
    /// Every data type, in presentation order.
    pub const ALL: [DataType; 7] = [
        DataType::Integer,
        DataType::Text,
        DataType::Boolean,
        DataType::Date,
        DataType::Float,
        DataType::Json,
        DataType::Uuid,
    ];

    /// Returns the wire name of the data type.
    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Integer => "integer",
            DataType::Text => "text",
            DataType::Boolean => "boolean",
            DataType::Date => "date",
            DataType::Float => "float",
            DataType::Json => "json",
            DataType::Uuid => "uuid",
        }
    }

    /// Returns the human-readable label shown next to an attribute.
    pub fn label(self) -> &'static str {
        match self {
            DataType::Integer => "Number",
            DataType::Text => "Text",
            DataType::Boolean => "Active/Inactive",
            DataType::Date => "Date",
            DataType::Float => "Decimal",
            DataType::Json => "JSON object",
            DataType::Uuid => "Unique identifier",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .into_iter()
            .find(|data_type| data_type.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownDataType(s.to_string()))
    }
}

/// Recognized kinds of attribute property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    MaxLength,
    MinLength,
    NoSpecialChars,
    Required,
}

impl PropertyKind {
    pub const ALL: [PropertyKind; 4] = [
        PropertyKind::MaxLength,
        PropertyKind::MinLength,
        PropertyKind::NoSpecialChars,
        PropertyKind::Required,
    ];

    /// Returns the wire name of the property kind.
    pub fn as_str(self) -> &'static str {
        match self {
            PropertyKind::MaxLength => "max_length",
            PropertyKind::MinLength => "min_length",
            PropertyKind::NoSpecialChars => "no_special_chars",
            PropertyKind::Required => "required",
        }
    }

    /// Returns the human-readable label of the property kind.
    pub fn label(self) -> &'static str {
        match self {
            PropertyKind::MaxLength => "Max. characters",
            PropertyKind::MinLength => "Min. characters",
            PropertyKind::NoSpecialChars => "No special characters",
            PropertyKind::Required => "Required",
        }
    }

    /// Whether values of this kind are character counts.
    pub fn takes_length(self) -> bool {
        matches!(self, PropertyKind::MaxLength | PropertyKind::MinLength)
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PropertyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownPropertyKind(s.to_string()))
    }
}

/// Cardinality of a connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationKind {
    #[default]
    #[serde(rename = "1-1")]
    OneToOne,
    #[serde(rename = "1-N")]
    OneToMany,
    #[serde(rename = "N-N")]
    ManyToMany,
}

impl RelationKind {
    pub const ALL: [RelationKind; 3] = [
        RelationKind::OneToOne,
        RelationKind::OneToMany,
        RelationKind::ManyToMany,
    ];

    /// Returns the wire name, which is also the edge label.
    pub fn as_str(self) -> &'static str {
        match self {
            RelationKind::OneToOne => "1-1",
            RelationKind::OneToMany => "1-N",
            RelationKind::ManyToMany => "N-N",
        }
    }

    /// Returns the glyph used in incoming-relationship summaries.
    pub fn glyph(self) -> char {
        match self {
            RelationKind::OneToOne => '—',
            RelationKind::OneToMany => '→',
            RelationKind::ManyToMany => '↔',
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RelationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::UnknownRelationKind(s.to_string()))
    }
}

/// A class as returned by `GET /classes/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub id: Id,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub position_x: f32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub position_y: f32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: Vec<Attribute>,
}

impl ClassRecord {
    /// Returns the stored position of the class.
    pub fn position(&self) -> Point {
        Point::new(self.position_x, self.position_y)
    }

    /// Whether the stored position was explicitly set.
    ///
    /// `(0, 0)` is the sentinel for "never placed"; any other value is
    /// authoritative and wins over computed layout.
    pub fn has_authoritative_position(&self) -> bool {
        !self.position().is_zero()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: Id,
    pub class_id: Id,
    pub name: String,
    pub data_type: DataType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: Id,
    pub attribute_id: Id,
    #[serde(rename = "name")]
    pub kind: PropertyKind,
    pub value: String,
}

/// A directed relationship from `source_class` to `target_class`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub id: Id,
    pub source_class: Id,
    pub target_class: Id,
    pub relationship_type: RelationKind,
}

impl Connection {
    /// Whether this connection joins the ordered pair `(source, target)`.
    pub fn joins(&self, source: &Id, target: &Id) -> bool {
        &self.source_class == source && &self.target_class == target
    }

    /// Whether either endpoint is `class_id`.
    pub fn touches(&self, class_id: &Id) -> bool {
        &self.source_class == class_id || &self.target_class == class_id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataRow {
    pub id: Id,
    pub class_id: Id,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: RowContent,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_class_record_from_backend_json() {
        let class: ClassRecord = serde_json::from_value(json!({
            "id": "6b1c",
            "name": "Persona",
            "position_x": 120.5,
            "position_y": 0.0,
            "attributes": [{
                "id": "a1",
                "class_id": "6b1c",
                "name": "edad",
                "data_type": "integer",
                "properties": [
                    {"id": "p1", "attribute_id": "a1", "name": "required", "value": "true"}
                ]
            }],
            "data_entries": []
        }))
        .unwrap();

        assert_eq!(class.name, "Persona");
        assert!(class.has_authoritative_position());
        assert_eq!(class.attributes[0].data_type, DataType::Integer);
        assert_eq!(class.attributes[0].properties[0].kind, PropertyKind::Required);
    }

    #[test]
    fn test_null_fields_read_as_defaults() {
        let class: ClassRecord = serde_json::from_value(json!({
            "id": 1,
            "name": "Empty",
            "position_x": null,
            "attributes": null
        }))
        .unwrap();

        assert!(!class.has_authoritative_position());
        assert!(class.attributes.is_empty());
    }

    #[test]
    fn test_connection_wire_names() {
        let connection: Connection = serde_json::from_value(json!({
            "id": 9,
            "source_class": 1,
            "target_class": 2,
            "relationship_type": "1-N"
        }))
        .unwrap();

        assert_eq!(connection.relationship_type, RelationKind::OneToMany);
        assert!(connection.joins(&Id::from(1u64), &Id::from(2u64)));
        assert!(!connection.joins(&Id::from(2u64), &Id::from(1u64)));
        assert!(connection.touches(&Id::from(2u64)));
    }

    #[test]
    fn test_unknown_relationship_type_is_rejected() {
        let result: Result<Connection, _> = serde_json::from_value(json!({
            "id": 9,
            "source_class": 1,
            "target_class": 2,
            "relationship_type": "N-1"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_from_str_round_trips_wire_names() {
        for data_type in DataType::ALL {
            assert_eq!(data_type.as_str().parse::<DataType>().unwrap(), data_type);
        }
        for kind in PropertyKind::ALL {
            assert_eq!(kind.as_str().parse::<PropertyKind>().unwrap(), kind);
        }
        assert_eq!("1-n".parse::<RelationKind>().unwrap(), RelationKind::OneToMany);
        assert!("decimal".parse::<DataType>().is_err());
    }

    #[test]
    fn test_row_content_keeps_column_order() {
        let row: DataRow = serde_json::from_value(json!({
            "id": "r1",
            "class_id": "c1",
            "content": {"zeta": "1", "alpha": "2"}
        }))
        .unwrap();

        let keys: Vec<_> = row.content.keys().map(String::as_str).collect();
        assert_eq!(keys, ["zeta", "alpha"]);
    }

    #[test]
    fn test_nested_json_cell_keeps_key_order() {
        let row: DataRow = serde_json::from_str(
            r#"{"id": "r1", "class_id": "c1", "content": {"meta": {"z": 1, "a": 2}}}"#,
        )
        .unwrap();

        let meta = row.content["meta"].as_object().unwrap();
        let keys: Vec<_> = meta.keys().map(String::as_str).collect();
        assert_eq!(keys, ["z", "a"]);
        assert_eq!(serde_json::to_string(&row.content).unwrap(), r#"{"meta":{"z":1,"a":2}}"#);
    }
}
