//! Domain entities: catalog descriptors and filter tree nodes

use std::borrow::Cow;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize};

/// Kind of value an operator expects on the right-hand side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// No constraint on the value
    #[default]
    Any,
    /// Unary operator (e.g. "is empty"); value must be null
    None,
    Bool,
    Number,
    Text,
    List,
}

impl ValueKind {
    pub fn is_any(&self) -> bool {
        matches!(self, ValueKind::Any)
    }

    /// Whether `value` is acceptable for an operator of this kind.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueKind::Any, _) => true,
            (ValueKind::None, Value::Null) => true,
            (ValueKind::Bool, Value::Bool(_)) => true,
            (ValueKind::Number, Value::Number(_)) => true,
            (ValueKind::Text, Value::Text(_)) => true,
            (ValueKind::List, Value::List(_)) => true,
            _ => false,
        }
    }

    /// Value a freshly created condition starts with.
    pub fn default_value(&self) -> Value {
        match self {
            ValueKind::Any | ValueKind::None => Value::Null,
            ValueKind::Bool => Value::Bool(false),
            ValueKind::Number => Value::Number(0.into()),
            ValueKind::Text => Value::Text(String::new()),
            ValueKind::List => Value::List(Vec::new()),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueKind::Any => "any",
            ValueKind::None => "none",
            ValueKind::Bool => "bool",
            ValueKind::Number => "number",
            ValueKind::Text => "text",
            ValueKind::List => "list",
        };
        f.write_str(s)
    }
}

/// Comparison operator applicable to a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operator {
    pub name: String,
    pub caption: String,
    /// Expected value kind (defaults to `any`)
    #[serde(default, skip_serializing_if = "ValueKind::is_any")]
    pub value: ValueKind,
}

impl Operator {
    pub fn new(name: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            caption: caption.into(),
            value: ValueKind::Any,
        }
    }

    pub fn with_value(mut self, kind: ValueKind) -> Self {
        self.value = kind;
        self
    }
}

/// Filterable attribute of an external record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub caption: String,
    /// Operators valid for this field, in display order
    #[serde(default)]
    pub operators: Vec<Operator>,
}

impl Field {
    pub fn new(name: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            caption: caption.into(),
            operators: Vec::new(),
        }
    }

    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.operators.push(operator);
        self
    }

    pub fn operator(&self, name: &str) -> Option<&Operator> {
        self.operators.iter().find(|o| o.name == name)
    }

    pub fn first_operator(&self) -> Option<&Operator> {
        self.operators.first()
    }
}

/// Named logical combinator (AND/OR).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub caption: String,
}

impl Group {
    pub fn new(name: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            caption: caption.into(),
        }
    }
}

/// Groups used when a catalog does not declare its own.
pub fn default_groups() -> Vec<Group> {
    vec![Group::new("and", "And"), Group::new("or", "Or")]
}

/// Fields and groups supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<Group>>,
}

impl Catalog {
    pub fn new(fields: Vec<Field>) -> Self {
        Self {
            fields,
            groups: None,
        }
    }

    pub fn with_groups(mut self, groups: Vec<Group>) -> Self {
        self.groups = Some(groups);
        self
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Declared groups, or the and/or defaults.
    pub fn effective_groups(&self) -> Cow<'_, [Group]> {
        match &self.groups {
            Some(groups) => Cow::Borrowed(groups.as_slice()),
            None => Cow::Owned(default_groups()),
        }
    }

    /// Group names compare case-insensitively ("AND" matches "and").
    pub fn group(&self, name: &str) -> Option<Group> {
        self.effective_groups()
            .iter()
            .find(|g| g.name.eq_ignore_ascii_case(name))
            .cloned()
    }
}

/// Opaque node identifier, unique within one tree.
///
/// Numeric keys keep their JSON form, so negative and fractional keys
/// survive a round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeKey {
    Number(serde_json::Number),
    Text(String),
}

impl NodeKey {
    /// The key as a non-negative integer, if it is one.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            NodeKey::Number(n) => n.as_u64(),
            NodeKey::Text(_) => None,
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKey::Number(n) => write!(f, "{n}"),
            NodeKey::Text(s) => f.write_str(s),
        }
    }
}

impl FromStr for NodeKey {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.parse::<serde_json::Number>()
            .map(NodeKey::Number)
            .unwrap_or_else(|_| NodeKey::Text(s.to_string())))
    }
}

impl From<u64> for NodeKey {
    fn from(n: u64) -> Self {
        NodeKey::Number(n.into())
    }
}

impl From<&str> for NodeKey {
    fn from(s: &str) -> Self {
        NodeKey::Text(s.to_string())
    }
}

impl From<String> for NodeKey {
    fn from(s: String) -> Self {
        NodeKey::Text(s)
    }
}

/// Right-hand side of a condition.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    List(Vec<Value>),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::None,
            Value::Bool(_) => ValueKind::Bool,
            Value::Number(_) => ValueKind::Number,
            Value::Text(_) => ValueKind::Text,
            Value::List(_) => ValueKind::List,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Text(s) => write!(f, "{s:?}"),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Parses JSON literals (`18`, `true`, `["a","b"]`, `null`); anything else is text.
impl FromStr for Value {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(serde_json::from_str::<Value>(s).unwrap_or_else(|_| Value::Text(s.to_string())))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n.into())
    }
}

/// NaN and infinities have no JSON form and become `Null`.
impl From<f64> for Value {
    fn from(n: f64) -> Self {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

/// Leaf predicate: `field operator value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub key: NodeKey,
    pub field: String,
    pub operator: String,
    #[serde(default)]
    pub value: Value,
}

impl Condition {
    pub fn new(
        key: impl Into<NodeKey>,
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            key: key.into(),
            field: field.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }
}

/// Keyed branch combining child items under one group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionGroup {
    pub key: NodeKey,
    pub group_name: String,
    #[serde(default)]
    pub items: Vec<FilterItem>,
}

impl ConditionGroup {
    pub fn new(key: impl Into<NodeKey>, group_name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            group_name: group_name.into(),
            items: Vec::new(),
        }
    }

    pub fn with_item(mut self, item: impl Into<FilterItem>) -> Self {
        self.items.push(item.into());
        self
    }

    /// Drops the key and promotes the branch to a tree root.
    pub fn into_root(self) -> FilterValue {
        FilterValue {
            group_name: self.group_name,
            items: self.items,
        }
    }
}

/// Child of a branch: either a nested group or a condition.
///
/// Serialized without a tag; a node carrying `groupName` is a group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterItem {
    Group(ConditionGroup),
    Condition(Condition),
}

// Branching on `groupName` up front lets a malformed node report the field
// that is actually missing or invalid.
impl<'de> Deserialize<'de> for FilterItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let node = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        if node.contains_key("groupName") {
            ConditionGroup::deserialize(serde_json::Value::Object(node))
                .map(FilterItem::Group)
                .map_err(|e| de::Error::custom(format!("invalid group: {e}")))
        } else {
            Condition::deserialize(serde_json::Value::Object(node))
                .map(FilterItem::Condition)
                .map_err(|e| de::Error::custom(format!("invalid condition: {e}")))
        }
    }
}

impl FilterItem {
    pub fn key(&self) -> &NodeKey {
        match self {
            FilterItem::Group(g) => &g.key,
            FilterItem::Condition(c) => &c.key,
        }
    }

    pub fn as_group(&self) -> Option<&ConditionGroup> {
        match self {
            FilterItem::Group(g) => Some(g),
            FilterItem::Condition(_) => None,
        }
    }

    pub fn as_condition(&self) -> Option<&Condition> {
        match self {
            FilterItem::Condition(c) => Some(c),
            FilterItem::Group(_) => None,
        }
    }
}

impl From<Condition> for FilterItem {
    fn from(c: Condition) -> Self {
        FilterItem::Condition(c)
    }
}

impl From<ConditionGroup> for FilterItem {
    fn from(g: ConditionGroup) -> Self {
        FilterItem::Group(g)
    }
}

/// Root of a filter tree. Same shape as [`ConditionGroup`] without a key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterValue {
    pub group_name: String,
    #[serde(default)]
    pub items: Vec<FilterItem>,
}

impl FilterValue {
    pub fn new(group_name: impl Into<String>) -> Self {
        Self {
            group_name: group_name.into(),
            items: Vec::new(),
        }
    }

    pub fn with_item(mut self, item: impl Into<FilterItem>) -> Self {
        self.items.push(item.into());
        self
    }

    /// Demotes the root to a keyed branch, e.g. to nest one tree in another.
    pub fn into_group(self, key: impl Into<NodeKey>) -> ConditionGroup {
        ConditionGroup {
            key: key.into(),
            group_name: self.group_name,
            items: self.items,
        }
    }
}

impl Default for FilterValue {
    fn default() -> Self {
        Self::new("and")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_kind_accepts() {
        assert!(ValueKind::Any.accepts(&Value::Null));
        assert!(ValueKind::Number.accepts(&Value::from(3)));
        assert!(!ValueKind::Number.accepts(&Value::from("3")));
        assert!(ValueKind::None.accepts(&Value::Null));
        assert!(!ValueKind::Text.accepts(&Value::Null));
    }

    #[test]
    fn test_default_value_matches_kind() {
        for kind in [
            ValueKind::None,
            ValueKind::Bool,
            ValueKind::Number,
            ValueKind::Text,
            ValueKind::List,
        ] {
            assert!(kind.accepts(&kind.default_value()), "{kind}");
        }
    }

    #[test]
    fn test_node_key_from_str() {
        assert_eq!("17".parse::<NodeKey>().unwrap(), NodeKey::from(17));
        assert_eq!(
            "a-b".parse::<NodeKey>().unwrap(),
            NodeKey::Text("a-b".to_string())
        );
    }

    #[test]
    fn test_value_from_str() {
        assert_eq!("18".parse::<Value>().unwrap(), Value::from(18));
        assert_eq!("true".parse::<Value>().unwrap(), Value::Bool(true));
        assert_eq!("bob".parse::<Value>().unwrap(), Value::from("bob"));
        assert_eq!(
            r#"["a", 1]"#.parse::<Value>().unwrap(),
            Value::List(vec![Value::from("a"), Value::from(1)])
        );
    }

    #[test]
    fn test_nan_becomes_null() {
        assert_eq!(Value::from(f64::NAN), Value::Null);
    }

    #[test]
    fn test_value_display() {
        let v = Value::List(vec![Value::from("x"), Value::from(2), Value::Null]);
        assert_eq!(v.to_string(), r#"["x", 2, null]"#);
    }

    #[test]
    fn test_catalog_default_groups_case_insensitive() {
        let catalog = Catalog::default();
        assert_eq!(catalog.group("AND").map(|g| g.name), Some("and".to_string()));
        assert!(catalog.group("xor").is_none());
    }

    #[test]
    fn test_declared_groups_replace_defaults() {
        let catalog = Catalog::default().with_groups(vec![Group::new("all", "All")]);
        assert!(catalog.group("all").is_some());
        assert!(catalog.group("and").is_none());
    }

    #[test]
    fn test_malformed_condition_names_missing_field() {
        let err = serde_json::from_str::<FilterItem>(r#"{"key":1,"field":"age","value":3}"#)
            .unwrap_err()
            .to_string();
        assert!(err.contains("invalid condition"), "{err}");
        assert!(err.contains("missing field `operator`"), "{err}");
    }

    #[test]
    fn test_malformed_group_names_invalid_field() {
        let err = serde_json::from_str::<FilterItem>(r#"{"key":1,"groupName":"or","items":3}"#)
            .unwrap_err()
            .to_string();
        assert!(err.contains("invalid group"), "{err}");
    }

    #[test]
    fn test_root_group_conversion() {
        let root = FilterValue::new("or").with_item(Condition::new(1, "a", "eq", 1));
        let group = root.clone().into_group(9);
        assert_eq!(group.key, NodeKey::from(9));
        assert_eq!(group.into_root(), root);
    }
}
