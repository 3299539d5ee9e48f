//! Labels: identity plus free-form metadata.
//!
//! Two labels are equal iff their ids are equal; name and metadata never take
//! part in equality or hashing.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::errors::{TreeError, TreeResult};
use crate::value::Value;

/// Free-form metadata bag attached to a label.
pub type Metadata = BTreeMap<String, Value>;

/// Identity key of a label.
///
/// Ids of one kind order naturally (numbers, text, element-wise sequences).
/// Across kinds the variant order decides: `Int < Text < Seq < Map`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LabelId {
    Int(i64),
    Text(String),
    Seq(Vec<LabelId>),
    Map(BTreeMap<String, String>),
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelId::Int(i) => write!(f, "{i}"),
            LabelId::Text(s) => write!(f, "{s}"),
            LabelId::Seq(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            LabelId::Map(map) => {
                let parts: Vec<String> = map.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

impl From<&str> for LabelId {
    fn from(s: &str) -> Self {
        LabelId::Text(s.to_string())
    }
}

impl From<String> for LabelId {
    fn from(s: String) -> Self {
        LabelId::Text(s)
    }
}

impl From<i64> for LabelId {
    fn from(i: i64) -> Self {
        LabelId::Int(i)
    }
}

impl<T: Into<LabelId>> From<Vec<T>> for LabelId {
    fn from(items: Vec<T>) -> Self {
        LabelId::Seq(items.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone)]
pub struct Label {
    pub id: LabelId,
    pub name: String,
    pub meta: Metadata,
}

impl Label {
    /// Label whose id defaults to its name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: LabelId::Text(name.clone()),
            name,
            meta: Metadata::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<LabelId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_meta(mut self, meta: Metadata) -> Self {
        self.meta = meta;
        self
    }

    pub fn with_meta_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn meta_value(&self, key: &str) -> Option<&Value> {
        self.meta.get(key)
    }
}

impl PartialEq for Label {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Label {}

impl Hash for Label {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl From<&str> for Label {
    fn from(name: &str) -> Self {
        Label::new(name)
    }
}

impl From<String> for Label {
    fn from(name: String) -> Self {
        Label::new(name)
    }
}

/// Parses a label from its TOML representation.
///
/// Accepted shapes:
/// - `"Food"`: name and id
/// - `2014`: integer id, named by its decimal form
/// - `{ name = "2014", id = ["2014-01-01", "2014-12-31"], meta = { started_on = "2014-01-01" } }`
impl TryFrom<toml::Value> for Label {
    type Error = TreeError;

    fn try_from(spec: toml::Value) -> TreeResult<Self> {
        match spec {
            toml::Value::String(name) => Ok(Label::new(name)),
            toml::Value::Integer(i) => Ok(Label::new(i.to_string()).with_id(i)),
            toml::Value::Table(mut table) => {
                let name = match table.remove("name") {
                    Some(toml::Value::String(name)) => name,
                    Some(other) => {
                        return Err(TreeError::InvalidLabelSpec(format!(
                            "label name must be a string, got {}",
                            other.type_str()
                        )))
                    }
                    None => {
                        return Err(TreeError::InvalidLabelSpec(
                            "label table without name".to_string(),
                        ))
                    }
                };
                let mut label = Label::new(name);
                if let Some(id) = table.remove("id") {
                    label.id = label_id_from_toml(id)?;
                }
                match table.remove("meta") {
                    Some(toml::Value::Table(meta)) => {
                        for (key, value) in meta {
                            label.meta.insert(key, value_from_toml(value)?);
                        }
                    }
                    Some(other) => {
                        return Err(TreeError::InvalidLabelSpec(format!(
                            "label meta must be a table, got {}",
                            other.type_str()
                        )))
                    }
                    None => {}
                }
                Ok(label)
            }
            other => Err(TreeError::InvalidLabelSpec(format!(
                "unsupported label representation: {}",
                other.type_str()
            ))),
        }
    }
}

impl std::str::FromStr for Label {
    type Err = TreeError;

    /// Parses an inline TOML value, e.g. `{ name = "Food", id = 3 }`.
    fn from_str(s: &str) -> TreeResult<Self> {
        let wrapped = format!("label = {s}");
        let mut table: toml::Table = toml::from_str(&wrapped)
            .map_err(|e| TreeError::InvalidLabelSpec(format!("parse {s}: {e}")))?;
        let spec = table
            .remove("label")
            .ok_or_else(|| TreeError::InvalidLabelSpec(format!("parse {s}: empty")))?;
        Label::try_from(spec)
    }
}

fn label_id_from_toml(value: toml::Value) -> TreeResult<LabelId> {
    match value {
        toml::Value::String(s) => Ok(LabelId::Text(s)),
        toml::Value::Integer(i) => Ok(LabelId::Int(i)),
        toml::Value::Array(items) => items
            .into_iter()
            .map(label_id_from_toml)
            .collect::<TreeResult<Vec<_>>>()
            .map(LabelId::Seq),
        toml::Value::Table(table) => table
            .into_iter()
            .map(|(k, v)| match v {
                toml::Value::String(s) => Ok((k, s)),
                other => Err(TreeError::InvalidLabelSpec(format!(
                    "label id table values must be strings, got {}",
                    other.type_str()
                ))),
            })
            .collect::<TreeResult<BTreeMap<_, _>>>()
            .map(LabelId::Map),
        other => Err(TreeError::InvalidLabelSpec(format!(
            "unsupported label id: {}",
            other.type_str()
        ))),
    }
}

fn value_from_toml(value: toml::Value) -> TreeResult<Value> {
    match value {
        toml::Value::String(s) => Ok(Value::Text(s)),
        toml::Value::Integer(i) => Ok(Value::Int(i)),
        toml::Value::Float(f) => Ok(Value::Float(f)),
        toml::Value::Boolean(b) => Ok(Value::Text(b.to_string())),
        toml::Value::Datetime(d) => Ok(Value::Text(d.to_string())),
        other => Err(TreeError::InvalidLabelSpec(format!(
            "metadata values must be scalars, got {}",
            other.type_str()
        ))),
    }
}
