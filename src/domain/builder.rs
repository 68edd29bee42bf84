//! Fluent construction of filter trees with sequential numeric keys.

use crate::domain::entities::{Condition, ConditionGroup, FilterItem, FilterValue, NodeKey, Value};

/// Builds a [`FilterValue`], numbering nodes 1, 2, 3, ... in pre-order.
///
/// ```ignore
/// let tree = FilterBuilder::new("and")
///     .condition("age", "gt", 18)
///     .group("or", |g| g.condition("name", "eq", "bob").condition("name", "eq", "eve"))
///     .build();
/// ```
#[derive(Debug)]
pub struct FilterBuilder {
    group_name: String,
    items: Vec<FilterItem>,
    next_key: u64,
}

impl FilterBuilder {
    pub fn new(group_name: impl Into<String>) -> Self {
        Self::starting_at(group_name, 1)
    }

    /// Start numbering at `first_key`, e.g. to build a subtree for an existing tree.
    pub fn starting_at(group_name: impl Into<String>, first_key: u64) -> Self {
        Self {
            group_name: group_name.into(),
            items: Vec::new(),
            next_key: first_key,
        }
    }

    fn take_key(&mut self) -> NodeKey {
        let key = NodeKey::from(self.next_key);
        self.next_key += 1;
        key
    }

    pub fn condition(
        mut self,
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        let key = self.take_key();
        self.items
            .push(Condition::new(key, field, operator, value).into());
        self
    }

    pub fn group(
        mut self,
        group_name: impl Into<String>,
        build: impl FnOnce(FilterBuilder) -> FilterBuilder,
    ) -> Self {
        let key = self.take_key();
        let child = build(Self::starting_at(group_name, self.next_key));
        self.next_key = child.next_key;
        self.items.push(
            ConditionGroup {
                key,
                group_name: child.group_name,
                items: child.items,
            }
            .into(),
        );
        self
    }

    pub fn build(self) -> FilterValue {
        FilterValue {
            group_name: self.group_name,
            items: self.items,
        }
    }

    /// Build as a keyed branch instead of a root.
    pub fn build_group(self, key: impl Into<NodeKey>) -> ConditionGroup {
        self.build().into_group(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_follow_preorder() {
        let tree = FilterBuilder::new("and")
            .condition("age", "gt", 18)
            .group("or", |g| {
                g.condition("name", "eq", "bob")
                    .group("and", |g| g.condition("active", "eq", true))
            })
            .condition("city", "eq", "Oslo")
            .build();

        let keys: Vec<String> = tree.keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["1", "2", "3", "4", "5", "6"]);
        assert_eq!(tree.depth(), 4);
    }

    #[test]
    fn test_starting_at_continues_numbering() {
        let group = FilterBuilder::starting_at("or", 8)
            .condition("a", "eq", 1)
            .build_group(7);
        assert_eq!(group.key, NodeKey::from(7));
        assert_eq!(group.items[0].key(), &NodeKey::from(8));
    }
}
