//! Filter control: the contract between a host and the filter tree.
//!
//! The host owns the tree and hands it to the control as props. Edits never
//! mutate the props; the control computes the complete replacement tree and
//! passes it to the host's [`ChangeListener`]. The host decides what to keep
//! and re-renders by calling [`FilterControl::set_filter_value`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::domain::{
    validate, Catalog, Condition, ConditionGroup, Edit, FilterValue, Limits, NodeKey, Target,
    ValidationReport, Value,
};

/// Receives the whole replacement tree after every accepted edit.
pub trait ChangeListener {
    fn on_filter_value_changed(&mut self, value: FilterValue);
}

impl<F> ChangeListener for F
where
    F: FnMut(FilterValue),
{
    fn on_filter_value_changed(&mut self, value: FilterValue) {
        self(value)
    }
}

/// Listener that keeps only the most recent tree.
#[derive(Debug, Default)]
pub struct LatestValue {
    value: Option<FilterValue>,
    changes: usize,
}

impl LatestValue {
    pub fn value(&self) -> Option<&FilterValue> {
        self.value.as_ref()
    }

    pub fn take(&mut self) -> Option<FilterValue> {
        self.value.take()
    }

    /// Number of notifications received.
    pub fn changes(&self) -> usize {
        self.changes
    }
}

impl ChangeListener for LatestValue {
    fn on_filter_value_changed(&mut self, value: FilterValue) {
        self.changes += 1;
        self.value = Some(value);
    }
}

/// What to do with a replacement tree that fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationPolicy {
    /// Reject the edit; the listener is not called
    #[default]
    Strict,
    /// Notify anyway and return the violations
    Report,
}

/// How keys for new nodes are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStyle {
    /// One past the largest numeric key in the tree
    #[default]
    Sequential,
    /// Random v4 UUID text keys
    Uuid,
}

impl KeyStyle {
    /// Sequential keys fall back to a UUID once the numeric range is used up.
    pub fn next_key(&self, tree: &FilterValue) -> NodeKey {
        match self {
            KeyStyle::Sequential => tree.next_numeric_key().unwrap_or_else(|| {
                warn!("numeric keys exhausted, using a uuid key");
                uuid_key()
            }),
            KeyStyle::Uuid => uuid_key(),
        }
    }
}

fn uuid_key() -> NodeKey {
    NodeKey::Text(Uuid::new_v4().to_string())
}

/// Inputs supplied by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterControlProps {
    pub catalog: Catalog,
    pub filter_value: FilterValue,
}

pub struct FilterControl<L> {
    props: FilterControlProps,
    listener: L,
    policy: ValidationPolicy,
    key_style: KeyStyle,
    limits: Limits,
}

impl<L: ChangeListener> FilterControl<L> {
    pub fn new(props: FilterControlProps, listener: L) -> Self {
        Self {
            props,
            listener,
            policy: ValidationPolicy::default(),
            key_style: KeyStyle::default(),
            limits: Limits::default(),
        }
    }

    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_key_style(mut self, key_style: KeyStyle) -> Self {
        self.key_style = key_style;
        self
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn props(&self) -> &FilterControlProps {
        &self.props
    }

    pub fn catalog(&self) -> &Catalog {
        &self.props.catalog
    }

    pub fn filter_value(&self) -> &FilterValue {
        &self.props.filter_value
    }

    /// Host re-render with a new tree.
    pub fn set_filter_value(&mut self, filter_value: FilterValue) {
        self.props.filter_value = filter_value;
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    pub fn into_listener(self) -> L {
        self.listener
    }

    pub fn new_key(&self) -> NodeKey {
        self.key_style.next_key(&self.props.filter_value)
    }

    /// Validate the current props.
    pub fn validate(&self) -> ValidationReport {
        validate(&self.props.filter_value, &self.props.catalog, &self.limits)
    }

    /// Apply one user edit and notify the listener with the resulting tree.
    ///
    /// Returns the violations of the replacement tree (always empty under
    /// [`ValidationPolicy::Strict`]).
    #[instrument(level = "debug", skip(self))]
    pub fn dispatch(&mut self, edit: Edit) -> ApplicationResult<ValidationReport> {
        let edits = self.expand(edit);
        self.commit(&edits)
    }

    /// Add a condition on `field` using the field's first operator.
    pub fn add_condition(&mut self, parent: Target, field: &str) -> ApplicationResult<NodeKey> {
        self.add_condition_with(parent, field, None, None)
    }

    /// Add a condition; a missing operator falls back to the field's first
    /// one, a missing value to the operator kind's default.
    pub fn add_condition_with(
        &mut self,
        parent: Target,
        field: &str,
        operator: Option<&str>,
        value: Option<Value>,
    ) -> ApplicationResult<NodeKey> {
        let descriptor = self
            .props
            .catalog
            .field(field)
            .ok_or_else(|| ApplicationError::UnknownField(field.to_string()))?;
        let (operator_name, kind) = match operator {
            Some(name) => (
                name.to_string(),
                descriptor.operator(name).map(|o| o.value).unwrap_or_default(),
            ),
            None => {
                let first = descriptor
                    .first_operator()
                    .ok_or_else(|| ApplicationError::NoOperators(field.to_string()))?;
                (first.name.clone(), first.value)
            }
        };

        let key = self.new_key();
        let condition = Condition::new(
            key.clone(),
            field,
            operator_name,
            value.unwrap_or_else(|| kind.default_value()),
        );
        self.dispatch(Edit::AddCondition { parent, condition })?;
        Ok(key)
    }

    /// Add an empty group; without a name, the catalog's first group is used.
    pub fn add_group(
        &mut self,
        parent: Target,
        group_name: Option<&str>,
    ) -> ApplicationResult<NodeKey> {
        let group = match group_name {
            Some(name) => self
                .props
                .catalog
                .group(name)
                .ok_or_else(|| ApplicationError::UnknownGroup(name.to_string()))?,
            None => self
                .props
                .catalog
                .effective_groups()
                .first()
                .cloned()
                .ok_or_else(|| ApplicationError::UnknownGroup(String::new()))?,
        };

        let key = self.new_key();
        self.dispatch(Edit::AddGroup {
            parent,
            group: ConditionGroup::new(key.clone(), group.name),
        })?;
        Ok(key)
    }

    pub fn remove(&mut self, key: &NodeKey) -> ApplicationResult<ValidationReport> {
        self.dispatch(Edit::Remove { key: key.clone() })
    }

    /// Append the edits that keep a condition consistent with the catalog.
    fn expand(&self, edit: Edit) -> Vec<Edit> {
        let reset = self.reset_edits(&edit);
        std::iter::once(edit).chain(reset).collect()
    }

    /// A field change falls back to the new field's first operator when the
    /// current one does not apply. A value the resulting operator's kind
    /// rejects is replaced by that kind's default.
    fn reset_edits(&self, edit: &Edit) -> Vec<Edit> {
        let (key, new_field, new_operator) = match edit {
            Edit::SetField { key, field } => (key, Some(field.as_str()), None),
            Edit::SetOperator { key, operator } => (key, None, Some(operator.as_str())),
            _ => return Vec::new(),
        };
        let current = self
            .props
            .filter_value
            .find(key)
            .and_then(|(_, node)| node.as_condition());
        let Some(current) = current else {
            return Vec::new();
        };
        let field_name = new_field.unwrap_or(current.field.as_str());
        let Some(field) = self.props.catalog.field(field_name) else {
            return Vec::new();
        };

        let mut edits = Vec::new();
        let operator_name = new_operator.unwrap_or(current.operator.as_str());
        let operator = match (field.operator(operator_name), new_operator) {
            (Some(operator), _) => operator,
            (None, None) => {
                let Some(first) = field.first_operator() else {
                    return edits;
                };
                debug!(
                    "field change on {key}: operator '{}' reset to '{}'",
                    current.operator, first.name
                );
                edits.push(Edit::SetOperator {
                    key: key.clone(),
                    operator: first.name.clone(),
                });
                first
            }
            // unknown operator: left for validation to report
            (None, Some(_)) => return edits,
        };

        if !operator.value.accepts(&current.value) {
            debug!(
                "value of {key} reset: operator '{}' expects {}",
                operator.name, operator.value
            );
            edits.push(Edit::SetValue {
                key: key.clone(),
                value: operator.value.default_value(),
            });
        }
        edits
    }

    fn commit(&mut self, edits: &[Edit]) -> ApplicationResult<ValidationReport> {
        let next = self.props.filter_value.apply_all(edits)?;
        let report = validate(&next, &self.props.catalog, &self.limits);

        if !report.is_valid() {
            match self.policy {
                ValidationPolicy::Strict => {
                    warn!("edit rejected: {report}");
                    return Err(ApplicationError::Rejected(report));
                }
                ValidationPolicy::Report => warn!("edit accepted with violations: {report}"),
            }
        }

        info!("filter value changed: {} node(s)", next.len());
        self.listener.on_filter_value_changed(next);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Field, FilterBuilder, Operator, ValueKind};

    fn catalog() -> Catalog {
        Catalog::new(vec![
            Field::new("age", "Age")
                .with_operator(Operator::new("gt", "Greater than").with_value(ValueKind::Number))
                .with_operator(Operator::new("lt", "Less than").with_value(ValueKind::Number))
                .with_operator(Operator::new("between", "Between").with_value(ValueKind::List)),
            Field::new("name", "Name")
                .with_operator(Operator::new("contains", "Contains").with_value(ValueKind::Text)),
            Field::new("born", "Born")
                .with_operator(Operator::new("gt", "After").with_value(ValueKind::Text)),
        ])
    }

    fn props() -> FilterControlProps {
        FilterControlProps {
            catalog: catalog(),
            filter_value: FilterBuilder::new("and").condition("age", "gt", 18).build(),
        }
    }

    #[test]
    fn test_dispatch_notifies_with_whole_tree() {
        let mut seen = Vec::new();
        let mut control = FilterControl::new(props(), |v: FilterValue| seen.push(v));

        control
            .dispatch(Edit::SetValue {
                key: NodeKey::from(1),
                value: Value::from(30),
            })
            .unwrap();
        // props are not mutated by the control
        assert_eq!(control.filter_value(), &props().filter_value);
        drop(control);

        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].conditions()[0].1.value, Value::from(30));
    }

    #[test]
    fn test_strict_policy_rejects_invalid_replacement() {
        let mut control = FilterControl::new(props(), LatestValue::default());
        let err = control
            .dispatch(Edit::SetOperator {
                key: NodeKey::from(1),
                operator: "contains".into(),
            })
            .unwrap_err();

        assert!(matches!(err, ApplicationError::Rejected(_)));
        assert_eq!(control.listener().changes(), 0);
    }

    #[test]
    fn test_report_policy_notifies_with_violations() {
        let mut control = FilterControl::new(props(), LatestValue::default())
            .with_policy(ValidationPolicy::Report);
        let report = control
            .dispatch(Edit::SetOperator {
                key: NodeKey::from(1),
                operator: "contains".into(),
            })
            .unwrap();

        assert_eq!(report.len(), 1);
        assert_eq!(control.listener().changes(), 1);
    }

    #[test]
    fn test_set_field_resets_inapplicable_operator() {
        let mut control = FilterControl::new(props(), LatestValue::default());
        control
            .dispatch(Edit::SetField {
                key: NodeKey::from(1),
                field: "name".into(),
            })
            .unwrap();

        let next = control.listener_mut().take().unwrap();
        let (_, condition) = next.conditions()[0];
        assert_eq!(condition.field, "name");
        assert_eq!(condition.operator, "contains");
        assert_eq!(condition.value, Value::Text(String::new()));
    }

    #[test]
    fn test_set_field_keeps_applicable_operator() {
        let mut props = props();
        props.catalog.fields.push(
            Field::new("height", "Height")
                .with_operator(Operator::new("lt", "Less than").with_value(ValueKind::Number))
                .with_operator(Operator::new("gt", "Greater than").with_value(ValueKind::Number)),
        );
        let mut control = FilterControl::new(props, LatestValue::default());
        control
            .dispatch(Edit::SetField {
                key: NodeKey::from(1),
                field: "height".into(),
            })
            .unwrap();

        let next = control.listener().value().unwrap();
        let (_, condition) = next.conditions()[0];
        assert_eq!(condition.operator, "gt");
        assert_eq!(condition.value, Value::from(18));
    }

    #[test]
    fn test_set_operator_resets_value_of_other_kind() {
        let mut control = FilterControl::new(props(), LatestValue::default());
        control
            .dispatch(Edit::SetOperator {
                key: NodeKey::from(1),
                operator: "between".into(),
            })
            .unwrap();

        assert_eq!(control.listener().changes(), 1);
        let next = control.listener().value().unwrap();
        let (_, condition) = next.conditions()[0];
        assert_eq!(condition.operator, "between");
        assert_eq!(condition.value, Value::List(Vec::new()));
    }

    #[test]
    fn test_set_operator_keeps_value_of_same_kind() {
        let mut control = FilterControl::new(props(), LatestValue::default());
        control
            .dispatch(Edit::SetOperator {
                key: NodeKey::from(1),
                operator: "lt".into(),
            })
            .unwrap();

        let next = control.listener().value().unwrap();
        assert_eq!(next.conditions()[0].1.value, Value::from(18));
    }

    #[test]
    fn test_set_field_resets_value_when_same_operator_changes_kind() {
        let mut control = FilterControl::new(props(), LatestValue::default());
        control
            .dispatch(Edit::SetField {
                key: NodeKey::from(1),
                field: "born".into(),
            })
            .unwrap();

        let next = control.listener().value().unwrap();
        let (_, condition) = next.conditions()[0];
        assert_eq!(condition.operator, "gt");
        assert_eq!(condition.value, Value::Text(String::new()));
    }

    #[test]
    fn test_sequential_keys_fall_back_to_uuid_when_exhausted() {
        let props = FilterControlProps {
            catalog: catalog(),
            filter_value: FilterBuilder::new("and").build(),
        };
        let mut control = FilterControl::new(props, LatestValue::default());
        control.set_filter_value(
            FilterValue::new("and").with_item(Condition::new(u64::MAX, "age", "gt", 1)),
        );

        let key = control.add_condition(Target::Root, "age").unwrap();

        assert!(matches!(key, NodeKey::Text(_)));
        assert_eq!(control.listener().value().unwrap().items.len(), 2);
    }

    #[test]
    fn test_add_condition_uses_first_operator_and_next_key() {
        let mut control = FilterControl::new(props(), LatestValue::default());
        let key = control.add_condition(Target::Root, "name").unwrap();

        assert_eq!(key, NodeKey::from(2));
        let next = control.listener().value().unwrap();
        assert_eq!(next.conditions()[1].1.operator, "contains");
    }

    #[test]
    fn test_add_condition_with_explicit_operator_and_value() {
        let mut control = FilterControl::new(props(), LatestValue::default());
        control
            .add_condition_with(Target::Root, "age", Some("lt"), Some(Value::from(65)))
            .unwrap();

        let next = control.listener().value().unwrap();
        let (_, condition) = next.conditions()[1];
        assert_eq!(condition.operator, "lt");
        assert_eq!(condition.value, Value::from(65));
    }

    #[test]
    fn test_add_condition_unknown_field() {
        let mut control = FilterControl::new(props(), LatestValue::default());
        let err = control.add_condition(Target::Root, "nope").unwrap_err();
        assert!(matches!(err, ApplicationError::UnknownField(f) if f == "nope"));
    }

    #[test]
    fn test_add_group_defaults_to_first_group() {
        let mut control =
            FilterControl::new(props(), LatestValue::default()).with_key_style(KeyStyle::Uuid);
        let key = control.add_group(Target::Root, None).unwrap();

        assert!(matches!(key, NodeKey::Text(_)));
        let next = control.listener().value().unwrap();
        assert_eq!(next.items[1].as_group().unwrap().group_name, "and");
    }

    #[test]
    fn test_limits_apply_to_dispatch() {
        let mut control = FilterControl::new(props(), LatestValue::default())
            .with_limits(Limits { max_depth: Some(2) });
        let group = control.add_group(Target::Root, Some("or")).unwrap();
        let next = control.listener_mut().take().unwrap();
        control.set_filter_value(next);

        let err = control
            .add_condition(Target::Group(group), "age")
            .unwrap_err();
        assert!(matches!(err, ApplicationError::Rejected(_)), "{err}");
    }
}
