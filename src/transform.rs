//! In-place rewriting of labels and leaf values.
//!
//! Replacements are computed against the tree as it was before the call and
//! written afterwards, so a transformer never observes its own edits.

use tracing::{debug, instrument};

use crate::arena::{Content, DataSet, NodeIndex, NodeRef};
use crate::errors::{TreeError, TreeResult};
use crate::label::Label;
use crate::value::Value;

fn collect_labels<F>(start: NodeRef<'_>, mut f: F) -> Vec<(NodeIndex, Option<Label>)>
where
    F: FnMut(Option<&Label>, NodeRef<'_>) -> Option<Label>,
{
    start
        .iter()
        .map(|node| (node.index(), f(node.label(), node)))
        .collect()
}

fn collect_values<F>(start: NodeRef<'_>, mut f: F) -> Vec<(NodeIndex, Option<Value>)>
where
    F: FnMut(Option<&Value>, NodeRef<'_>) -> Option<Value>,
{
    start
        .iter()
        .filter(|node| !node.has_child_list())
        .map(|node| {
            let current = match &node.node().content {
                Content::Scalar(value) => Some(value),
                _ => None,
            };
            (node.index(), f(current, node))
        })
        .collect()
}

impl DataSet {
    /// Replaces every label with `f(label, node)`.
    #[instrument(level = "debug", skip_all)]
    pub fn transform_labels<F>(&mut self, f: F) -> &mut Self
    where
        F: FnMut(Option<&Label>, NodeRef<'_>) -> Option<Label>,
    {
        let updates = collect_labels(self.root(), f);
        self.write_labels(updates)
    }

    /// [`DataSet::transform_labels`] restricted to the subtree at `index`.
    pub fn transform_labels_at<F>(&mut self, index: NodeIndex, f: F) -> TreeResult<&mut Self>
    where
        F: FnMut(Option<&Label>, NodeRef<'_>) -> Option<Label>,
    {
        let start = self.node(index).ok_or(TreeError::NodeNotFound(index))?;
        let updates = collect_labels(start, f);
        Ok(self.write_labels(updates))
    }

    /// Replaces the payload of every leaf with `f(value, node)`; nodes holding
    /// a child list, even an empty one, are left as they are.
    #[instrument(level = "debug", skip_all)]
    pub fn transform_values<F>(&mut self, f: F) -> &mut Self
    where
        F: FnMut(Option<&Value>, NodeRef<'_>) -> Option<Value>,
    {
        let updates = collect_values(self.root(), f);
        self.write_values(updates)
    }

    pub fn transform_values_at<F>(&mut self, index: NodeIndex, f: F) -> TreeResult<&mut Self>
    where
        F: FnMut(Option<&Value>, NodeRef<'_>) -> Option<Value>,
    {
        let start = self.node(index).ok_or(TreeError::NodeNotFound(index))?;
        let updates = collect_values(start, f);
        Ok(self.write_values(updates))
    }

    fn write_labels(&mut self, updates: Vec<(NodeIndex, Option<Label>)>) -> &mut Self {
        debug!(count = updates.len(), "writing labels");
        for (index, label) in updates {
            if let Some(entry) = self.entry_mut(index) {
                entry.label = label;
            }
        }
        self
    }

    fn write_values(&mut self, updates: Vec<(NodeIndex, Option<Value>)>) -> &mut Self {
        debug!(count = updates.len(), "writing leaf values");
        for (index, value) in updates {
            if let Some(entry) = self.entry_mut(index) {
                entry.content = value.map_or(Content::Absent, Content::Scalar);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Payload;

    fn report() -> DataSet {
        DataSet::branch(
            "Report",
            vec![
                DataSet::branch(
                    "Office 1",
                    vec![DataSet::leaf("January", 100), DataSet::empty("February")],
                ),
                DataSet::leaf("Office 2", 50),
            ],
        )
    }

    #[test]
    fn given_label_transformer_when_applied_then_every_label_replaced() {
        let mut tree = report();
        tree.transform_labels(|label, _| label.map(|l| Label::new(l.name.to_uppercase())));
        let names: Vec<_> = tree
            .root()
            .iter()
            .map(|n| n.label().unwrap().name.clone())
            .collect();
        assert_eq!(
            names,
            vec!["REPORT", "OFFICE 1", "JANUARY", "FEBRUARY", "OFFICE 2"]
        );
    }

    #[test]
    fn given_value_transformer_when_applied_then_leaves_rewritten() {
        let mut tree = report();
        tree.transform_values(|value, _| match value {
            Some(v) => v.checked_mul(&Value::Int(2)),
            None => Some(Value::zero()),
        });
        let expected = DataSet::branch(
            "Report",
            vec![
                DataSet::branch(
                    "Office 1",
                    vec![DataSet::leaf("January", 200), DataSet::leaf("February", 0)],
                ),
                DataSet::leaf("Office 2", 100),
            ],
        );
        assert_eq!(tree, expected);
    }

    #[test]
    fn given_node_argument_when_transforming_then_context_is_visible() {
        let mut tree = report();
        tree.transform_labels(|label, node| {
            let label = label?.clone();
            let depth = node.ancestors().len() as i64;
            Some(label.with_meta_value("depth", depth))
        });
        let january = tree
            .root()
            .find_by(|n| n.label().is_some_and(|l| l.name == "January"))
            .unwrap();
        assert_eq!(january.label().unwrap().meta_value("depth"), Some(&Value::Int(2)));
    }

    #[test]
    fn given_subtree_index_when_transforming_then_rest_untouched() {
        let mut tree = report();
        let office = tree.root().children().next().unwrap().index();
        tree.transform_values_at(office, |_, _| Some(Value::Int(1))).unwrap();
        assert_eq!(tree.sum().unwrap(), Some(Value::Int(52)));
        let office2 = tree.root().children().nth(1).unwrap();
        assert!(matches!(office2.payload(), Payload::Scalar(Value::Int(50))));
    }

    #[test]
    fn given_stale_index_when_transforming_then_node_not_found() {
        let mut tree = report();
        let office = tree.root().children().next().unwrap().index();
        let root = tree.root_index();
        tree.set_data(root, 1).unwrap();
        let result = tree.transform_labels_at(office, |label, _| label.cloned());
        assert!(matches!(result, Err(TreeError::NodeNotFound(_))));
    }
}
