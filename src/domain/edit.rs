//! Pure tree edits. Every edit produces a complete replacement tree and
//! leaves the input untouched.

use std::fmt;

use tracing::{debug, instrument};

use crate::domain::entities::{Condition, ConditionGroup, FilterItem, FilterValue, NodeKey, Value};
use crate::domain::error::{DomainError, DomainResult};

/// Branch addressed by an edit: the root or a keyed group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Target {
    #[default]
    Root,
    Group(NodeKey),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Root => f.write_str("root"),
            Target::Group(key) => write!(f, "group {key}"),
        }
    }
}

impl From<Option<NodeKey>> for Target {
    fn from(key: Option<NodeKey>) -> Self {
        key.map(Target::Group).unwrap_or(Target::Root)
    }
}

/// A single user edit.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    AddCondition {
        parent: Target,
        condition: Condition,
    },
    AddGroup {
        parent: Target,
        group: ConditionGroup,
    },
    Remove {
        key: NodeKey,
    },
    SetField {
        key: NodeKey,
        field: String,
    },
    SetOperator {
        key: NodeKey,
        operator: String,
    },
    SetValue {
        key: NodeKey,
        value: Value,
    },
    SetGroupName {
        target: Target,
        group_name: String,
    },
}

impl FilterValue {
    /// Apply `edit` to a copy of this tree.
    #[instrument(level = "debug", skip(self))]
    pub fn apply(&self, edit: &Edit) -> DomainResult<FilterValue> {
        let mut next = self.clone();
        next.apply_in_place(edit)?;
        Ok(next)
    }

    /// Apply edits in order; fails on the first edit that does not apply.
    pub fn apply_all<'e>(&self, edits: impl IntoIterator<Item = &'e Edit>) -> DomainResult<FilterValue> {
        let mut next = self.clone();
        for edit in edits {
            next.apply_in_place(edit)?;
        }
        Ok(next)
    }

    fn apply_in_place(&mut self, edit: &Edit) -> DomainResult<()> {
        match edit {
            Edit::AddCondition { parent, condition } => {
                self.ensure_absent(&condition.key)?;
                self.branch_items_mut(parent)?
                    .push(FilterItem::Condition(condition.clone()));
            }
            Edit::AddGroup { parent, group } => {
                let subtree = FilterValue {
                    group_name: String::new(),
                    items: vec![FilterItem::Group(group.clone())],
                };
                for key in subtree.keys() {
                    self.ensure_absent(key)?;
                }
                if let Some(key) = duplicated_key(&subtree) {
                    return Err(DomainError::DuplicateKey(key));
                }
                self.branch_items_mut(parent)?
                    .push(FilterItem::Group(group.clone()));
            }
            Edit::Remove { key } => {
                if remove_item(&mut self.items, key).is_none() {
                    return Err(DomainError::NodeNotFound(key.clone()));
                }
            }
            Edit::SetField { key, field } => {
                self.condition_mut(key)?.field = field.clone();
            }
            Edit::SetOperator { key, operator } => {
                self.condition_mut(key)?.operator = operator.clone();
            }
            Edit::SetValue { key, value } => {
                self.condition_mut(key)?.value = value.clone();
            }
            Edit::SetGroupName { target, group_name } => match target {
                Target::Root => self.group_name = group_name.clone(),
                Target::Group(key) => match find_item_mut(&mut self.items, key) {
                    Some(FilterItem::Group(g)) => g.group_name = group_name.clone(),
                    Some(FilterItem::Condition(_)) => {
                        return Err(DomainError::NotAGroup(key.clone()))
                    }
                    None => return Err(DomainError::NodeNotFound(key.clone())),
                },
            },
        }
        debug!("applied edit");
        Ok(())
    }

    fn ensure_absent(&self, key: &NodeKey) -> DomainResult<()> {
        if self.contains_key(key) {
            Err(DomainError::DuplicateKey(key.clone()))
        } else {
            Ok(())
        }
    }

    fn branch_items_mut(&mut self, target: &Target) -> DomainResult<&mut Vec<FilterItem>> {
        match target {
            Target::Root => Ok(&mut self.items),
            Target::Group(key) => match find_item_mut(&mut self.items, key) {
                Some(FilterItem::Group(g)) => Ok(&mut g.items),
                Some(FilterItem::Condition(_)) => Err(DomainError::NotAGroup(key.clone())),
                None => Err(DomainError::NodeNotFound(key.clone())),
            },
        }
    }

    fn condition_mut(&mut self, key: &NodeKey) -> DomainResult<&mut Condition> {
        match find_item_mut(&mut self.items, key) {
            Some(FilterItem::Condition(c)) => Ok(c),
            Some(FilterItem::Group(_)) => Err(DomainError::NotACondition(key.clone())),
            None => Err(DomainError::NodeNotFound(key.clone())),
        }
    }
}

fn find_item_mut<'a>(items: &'a mut [FilterItem], key: &NodeKey) -> Option<&'a mut FilterItem> {
    for item in items.iter_mut() {
        if item.key() == key {
            return Some(item);
        }
        if let FilterItem::Group(g) = item {
            if let Some(found) = find_item_mut(&mut g.items, key) {
                return Some(found);
            }
        }
    }
    None
}

fn remove_item(items: &mut Vec<FilterItem>, key: &NodeKey) -> Option<FilterItem> {
    if let Some(index) = items.iter().position(|item| item.key() == key) {
        return Some(items.remove(index));
    }
    items.iter_mut().find_map(|item| match item {
        FilterItem::Group(g) => remove_item(&mut g.items, key),
        FilterItem::Condition(_) => None,
    })
}

fn duplicated_key(tree: &FilterValue) -> Option<NodeKey> {
    let mut seen = std::collections::HashSet::new();
    tree.keys().into_iter().find(|k| !seen.insert(*k)).cloned()
}
