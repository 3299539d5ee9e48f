//! Folding leaf values: `value`, `reduce`, `sum`, `average`, emptiness.

use tracing::{instrument, trace};

use crate::arena::{DataSet, NodeRef, Payload};
use crate::errors::{TreeError, TreeResult};
use crate::label::Label;
use crate::value::Value;

/// Leaf values arranged in the shape of the tree they were read from.
#[derive(Debug, Clone, PartialEq)]
pub enum Reducible<'a> {
    Leaf(Option<&'a Value>),
    Nested(Vec<Reducible<'a>>),
}

impl<'a> Reducible<'a> {
    /// All leaf slots in depth-first order, absent ones included.
    pub fn flatten(&self) -> Vec<Option<&'a Value>> {
        match self {
            Reducible::Leaf(value) => vec![*value],
            Reducible::Nested(items) => items.iter().flat_map(Reducible::flatten).collect(),
        }
    }

    /// Present leaf values in depth-first order.
    pub fn present(&self) -> Vec<&'a Value> {
        self.flatten().into_iter().flatten().collect()
    }
}

impl<'a> NodeRef<'a> {
    /// Scalar of a leaf; `None` for an absent payload or an empty child list.
    pub fn value(&self) -> TreeResult<Option<&'a Value>> {
        if self.is_branch() {
            return Err(TreeError::NotALeaf(self.id().clone()));
        }
        Ok(match self.payload() {
            Payload::Scalar(value) => Some(value),
            _ => None,
        })
    }

    pub fn reducible_values(&self) -> Reducible<'a> {
        match self.payload() {
            Payload::Absent => Reducible::Leaf(None),
            Payload::Scalar(value) => Reducible::Leaf(Some(value)),
            Payload::Children(children) => {
                Reducible::Nested(children.iter().map(|child| child.reducible_values()).collect())
            }
        }
    }

    /// Applies `f` once to the nested leaf values of this subtree.
    pub fn reduce<R, F>(&self, f: F) -> R
    where
        F: FnOnce(Reducible<'a>) -> R,
    {
        f(self.reducible_values())
    }

    /// Sum of every present leaf value below this node, `None` if there is none.
    #[instrument(level = "trace", skip(self), fields(id = %self.id()))]
    pub fn sum(&self) -> TreeResult<Option<Value>> {
        let mut values = self.reducible_values().present().into_iter();
        let Some(first) = values.next() else {
            return Ok(None);
        };
        values
            .try_fold(first.clone(), |acc, value| {
                acc.checked_add(value).ok_or_else(|| TreeError::IncompatibleValues {
                    op: "+",
                    left: acc.clone(),
                    right: value.clone(),
                })
            })
            .map(Some)
    }

    /// Arithmetic mean of the present leaf values.
    pub fn average(&self) -> TreeResult<Option<f64>> {
        let values = self.reducible_values().present();
        if values.is_empty() {
            return Ok(None);
        }
        let mut total = 0.0;
        for value in &values {
            let number = value.as_f64().ok_or_else(|| TreeError::IncompatibleValues {
                op: "average",
                left: Value::Float(total),
                right: (*value).clone(),
            })?;
            total += number;
        }
        Ok(Some(total / values.len() as f64))
    }

    /// Absent payloads are empty, scalars by their own notion, child lists
    /// when every child is empty.
    pub fn is_empty(&self) -> bool {
        match self.payload() {
            Payload::Absent => true,
            Payload::Scalar(value) => value.is_empty(),
            Payload::Children(children) => children.iter().all(|child| child.is_empty()),
        }
    }

    /// Each child paired with its sum.
    pub fn child_sum(&self) -> TreeResult<Vec<(NodeRef<'a>, Option<Value>)>> {
        self.children()
            .map(|child| Ok((child, child.sum()?)))
            .collect()
    }

    /// Each child paired with the sum of its leaves labeled like each of `labels`.
    #[instrument(level = "trace", skip_all, fields(id = %self.id(), labels = labels.len()))]
    pub fn child_sum_by_labels(
        &self,
        labels: &[Label],
    ) -> TreeResult<Vec<(NodeRef<'a>, Vec<(Label, Option<Value>)>)>> {
        let mut sums = Vec::with_capacity(self.child_count());
        for child in self.children() {
            let mut per_label = Vec::with_capacity(labels.len());
            for label in labels {
                let sum = child.filter_by_label(label.id.clone())?.sum()?;
                trace!(child = %child.id(), label = %label, ?sum, "label sum");
                per_label.push((label.clone(), sum));
            }
            sums.push((child, per_label));
        }
        Ok(sums)
    }

    /// [`NodeRef::child_sum_by_labels`] over the labels of every leaf below this node.
    pub fn child_sum_by_leaf_labels(
        &self,
    ) -> TreeResult<Vec<(NodeRef<'a>, Vec<(Label, Option<Value>)>)>> {
        let labels: Vec<Label> = self.leaf_labels().into_iter().cloned().collect();
        self.child_sum_by_labels(&labels)
    }
}

impl DataSet {
    pub fn value(&self) -> TreeResult<Option<&Value>> {
        self.root().value()
    }

    pub fn reducible_values(&self) -> Reducible<'_> {
        self.root().reducible_values()
    }

    pub fn reduce<'s, R, F>(&'s self, f: F) -> R
    where
        F: FnOnce(Reducible<'s>) -> R,
    {
        self.root().reduce(f)
    }

    pub fn sum(&self) -> TreeResult<Option<Value>> {
        self.root().sum()
    }

    pub fn average(&self) -> TreeResult<Option<f64>> {
        self.root().average()
    }
}
