//! Boundary validation of filter trees against a catalog.
//!
//! Validation collects every violation instead of stopping at the first one,
//! so a host can surface all problems of an edited tree at once.

use std::collections::HashSet;
use std::fmt;

use itertools::Itertools;
use tracing::{debug, instrument};

use crate::domain::entities::{Catalog, FilterValue, NodeKey, ValueKind};
use crate::domain::error::{DomainError, DomainResult};
use crate::domain::tree::{NodePath, NodeRef};

/// Structural limits applied on top of catalog checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Limits {
    /// Maximum tree depth (a bare root has depth 1)
    pub max_depth: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    UnknownField {
        path: NodePath,
        field: String,
    },
    OperatorNotApplicable {
        path: NodePath,
        field: String,
        operator: String,
    },
    UnknownGroup {
        path: NodePath,
        group: String,
    },
    DuplicateKey {
        path: NodePath,
        key: NodeKey,
    },
    ValueKindMismatch {
        path: NodePath,
        operator: String,
        expected: ValueKind,
        found: ValueKind,
    },
    TooDeep {
        depth: usize,
        max_depth: usize,
    },
    DuplicateFieldName(String),
    DuplicateOperatorName {
        field: String,
        operator: String,
    },
    DuplicateGroupName(String),
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::UnknownField { path, field } => {
                write!(f, "{path}: unknown field '{field}'")
            }
            Violation::OperatorNotApplicable {
                path,
                field,
                operator,
            } => write!(
                f,
                "{path}: operator '{operator}' is not applicable to field '{field}'"
            ),
            Violation::UnknownGroup { path, group } => {
                write!(f, "{path}: unknown group '{group}'")
            }
            Violation::DuplicateKey { path, key } => write!(f, "{path}: duplicate key '{key}'"),
            Violation::ValueKindMismatch {
                path,
                operator,
                expected,
                found,
            } => write!(
                f,
                "{path}: operator '{operator}' expects a {expected} value, found {found}"
            ),
            Violation::TooDeep { depth, max_depth } => {
                write!(f, "tree depth {depth} exceeds maximum {max_depth}")
            }
            Violation::DuplicateFieldName(name) => write!(f, "duplicate field '{name}'"),
            Violation::DuplicateOperatorName { field, operator } => {
                write!(f, "field '{field}': duplicate operator '{operator}'")
            }
            Violation::DuplicateGroupName(name) => write!(f, "duplicate group '{name}'"),
        }
    }
}

/// All violations found in one validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter()
    }

    /// Turns a non-empty report into [`DomainError::InvalidFilter`].
    pub fn into_result(self) -> DomainResult<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(DomainError::InvalidFilter(self))
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.violations.len() {
            0 => f.write_str("no violations"),
            1 => write!(f, "{}", self.violations[0]),
            n => write!(
                f,
                "{n} violations: {}",
                self.violations.iter().join("; ")
            ),
        }
    }
}

/// Check a tree against the catalog and limits.
#[instrument(level = "debug", skip_all)]
pub fn validate(tree: &FilterValue, catalog: &Catalog, limits: &Limits) -> ValidationReport {
    let mut violations = Vec::new();
    let mut seen: HashSet<&NodeKey> = HashSet::new();

    for (path, node) in tree.iter() {
        if let Some(key) = node.key() {
            if !seen.insert(key) {
                violations.push(Violation::DuplicateKey {
                    path: path.clone(),
                    key: key.clone(),
                });
            }
        }

        match node {
            NodeRef::Root(_) | NodeRef::Group(_) => {
                let group = node.group_name().unwrap_or_default();
                if catalog.group(group).is_none() {
                    violations.push(Violation::UnknownGroup {
                        path,
                        group: group.to_string(),
                    });
                }
            }
            NodeRef::Condition(condition) => {
                let Some(field) = catalog.field(&condition.field) else {
                    violations.push(Violation::UnknownField {
                        path,
                        field: condition.field.clone(),
                    });
                    continue;
                };
                let Some(operator) = field.operator(&condition.operator) else {
                    violations.push(Violation::OperatorNotApplicable {
                        path,
                        field: condition.field.clone(),
                        operator: condition.operator.clone(),
                    });
                    continue;
                };
                if !operator.value.accepts(&condition.value) {
                    violations.push(Violation::ValueKindMismatch {
                        path,
                        operator: operator.name.clone(),
                        expected: operator.value,
                        found: condition.value.kind(),
                    });
                }
            }
        }
    }

    if let Some(max_depth) = limits.max_depth {
        let depth = tree.depth();
        if depth > max_depth {
            violations.push(Violation::TooDeep { depth, max_depth });
        }
    }

    debug!("validated tree: {} violation(s)", violations.len());
    ValidationReport { violations }
}

impl Catalog {
    /// Self-consistency of the catalog: names must be unique.
    pub fn check(&self) -> ValidationReport {
        let mut violations: Vec<Violation> = self
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .duplicates()
            .map(|name| Violation::DuplicateFieldName(name.to_string()))
            .collect();

        for field in &self.fields {
            violations.extend(
                field
                    .operators
                    .iter()
                    .map(|o| o.name.as_str())
                    .duplicates()
                    .map(|operator| Violation::DuplicateOperatorName {
                        field: field.name.clone(),
                        operator: operator.to_string(),
                    }),
            );
        }

        violations.extend(
            self.effective_groups()
                .iter()
                .map(|g| g.name.to_ascii_lowercase())
                .duplicates()
                .map(Violation::DuplicateGroupName),
        );

        ValidationReport { violations }
    }

    /// Like [`Catalog::check`], but as an error.
    pub fn ensure_consistent(&self) -> DomainResult<()> {
        let report = self.check();
        if report.is_valid() {
            Ok(())
        } else {
            Err(DomainError::InvalidCatalog(report))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Condition, ConditionGroup, Field, Group, Operator, Value};

    fn catalog() -> Catalog {
        Catalog::new(vec![
            Field::new("age", "Age")
                .with_operator(Operator::new("gt", "Greater than").with_value(ValueKind::Number))
                .with_operator(Operator::new("empty", "Is empty").with_value(ValueKind::None)),
            Field::new("name", "Name").with_operator(Operator::new("contains", "Contains")),
        ])
    }

    #[test]
    fn test_minimal_tree_is_valid() {
        let tree = FilterValue::new("AND").with_item(Condition::new(1, "age", "gt", 18));
        let report = validate(&tree, &catalog(), &Limits::default());
        assert!(report.is_valid(), "{report}");
    }

    #[test]
    fn test_collects_all_violations() {
        let tree = FilterValue::new("xor")
            .with_item(Condition::new(1, "height", "gt", 1))
            .with_item(Condition::new(2, "name", "gt", "x"))
            .with_item(Condition::new(2, "age", "gt", "old"));
        let report = validate(&tree, &catalog(), &Limits::default());

        assert_eq!(report.len(), 5, "{report}");
        assert!(matches!(report.violations[0], Violation::UnknownGroup { .. }));
        assert!(matches!(report.violations[1], Violation::UnknownField { .. }));
        assert!(matches!(
            report.violations[2],
            Violation::OperatorNotApplicable { .. }
        ));
        assert!(matches!(report.violations[3], Violation::DuplicateKey { .. }));
        assert!(matches!(
            report.violations[4],
            Violation::ValueKindMismatch {
                expected: ValueKind::Number,
                found: ValueKind::Text,
                ..
            }
        ));
    }

    #[test]
    fn test_nested_group_name_checked() {
        let tree = FilterValue::new("and").with_item(ConditionGroup::new(1, "nand"));
        let report = validate(&tree, &catalog(), &Limits::default());
        assert_eq!(
            report.violations,
            vec![Violation::UnknownGroup {
                path: NodePath::from(vec![0]),
                group: "nand".to_string()
            }]
        );
    }

    #[test]
    fn test_max_depth() {
        let tree = FilterValue::new("and").with_item(
            ConditionGroup::new(1, "or").with_item(Condition::new(2, "age", "empty", Value::Null)),
        );
        let limits = Limits { max_depth: Some(2) };
        let report = validate(&tree, &catalog(), &limits);
        assert_eq!(
            report.violations,
            vec![Violation::TooDeep {
                depth: 3,
                max_depth: 2
            }]
        );
    }

    #[test]
    fn test_into_result() {
        assert!(ValidationReport::default().into_result().is_ok());
        let report = ValidationReport {
            violations: vec![Violation::DuplicateFieldName("a".into())],
        };
        assert!(matches!(
            report.into_result(),
            Err(DomainError::InvalidFilter(_))
        ));
    }

    #[test]
    fn test_catalog_check_reports_duplicates() {
        let catalog = Catalog::new(vec![
            Field::new("a", "A")
                .with_operator(Operator::new("eq", "="))
                .with_operator(Operator::new("eq", "==")),
            Field::new("a", "A again"),
        ])
        .with_groups(vec![Group::new("and", "And"), Group::new("AND", "And")]);

        let report = catalog.check();
        assert_eq!(report.len(), 3, "{report}");
        assert!(catalog.ensure_consistent().is_err());
        assert!(self::catalog().ensure_consistent().is_ok());
    }
}
