//! Text rendering of filter trees via termtree.

use termtree::Tree;
use tracing::instrument;

use crate::domain::entities::{Catalog, Condition, FilterItem, FilterValue};

pub trait TreeDisplay {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeDisplay for FilterValue {
    fn to_tree_string(&self) -> Tree<String> {
        render(self, None)
    }
}

/// Render `tree`; with a catalog, names are replaced by their captions.
#[instrument(level = "debug", skip_all)]
pub fn render(tree: &FilterValue, catalog: Option<&Catalog>) -> Tree<String> {
    let labels = Labels { catalog };
    let mut root = Tree::new(labels.group(&tree.group_name));
    push_items(&labels, &tree.items, &mut root);
    root
}

fn push_items(labels: &Labels<'_>, items: &[FilterItem], parent: &mut Tree<String>) {
    for item in items {
        match item {
            FilterItem::Group(g) => {
                let mut child = Tree::new(format!("[{}] {}", g.key, labels.group(&g.group_name)));
                push_items(labels, &g.items, &mut child);
                parent.push(child);
            }
            FilterItem::Condition(c) => {
                parent.push(Tree::new(format!("[{}] {}", c.key, labels.condition(c))));
            }
        }
    }
}

struct Labels<'a> {
    catalog: Option<&'a Catalog>,
}

impl Labels<'_> {
    fn group(&self, name: &str) -> String {
        self.catalog
            .and_then(|c| c.group(name))
            .map(|g| g.caption)
            .unwrap_or_else(|| name.to_uppercase())
    }

    fn condition(&self, c: &Condition) -> String {
        let field = self.catalog.and_then(|cat| cat.field(&c.field));
        let field_label = field.map_or(c.field.as_str(), |f| f.caption.as_str());
        let operator_label = field
            .and_then(|f| f.operator(&c.operator))
            .map_or(c.operator.as_str(), |o| o.caption.as_str());
        if c.value.is_null() {
            format!("{field_label} {operator_label}")
        } else {
            format!("{field_label} {operator_label} {}", c.value)
        }
    }
}
