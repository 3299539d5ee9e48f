//! Structural unification of two trees by label identity.
//!
//! Children are paired by label; matched pairs merge recursively, unmatched
//! children are copied through (left order first, then right-only children in
//! right order). Leaf pairs resolve through a combiner. Both operands are left
//! untouched and the result carries the left operand's id and label.

use std::fmt;

use tracing::{debug, instrument, trace};

use crate::arena::{Data, DataSet, NodeRef, Payload};
use crate::errors::{TreeError, TreeResult};
use crate::label::Label;
use crate::value::Value;

/// How absent operands are treated when combining two leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullPolicy {
    /// An absent operand counts as zero.
    ZeroFill,
    /// An absent operand on either side yields absent.
    Propagate,
    /// An absent or zero right operand yields absent, as does an absent left.
    NullOnZeroDivisor,
}

/// Binary operator over leaf values with its null-handling policy.
#[derive(Clone, Copy)]
pub struct Operator {
    pub name: &'static str,
    pub op: fn(&Value, &Value) -> Option<Value>,
    pub policy: NullPolicy,
}

impl Operator {
    pub const ADD: Operator = Operator {
        name: "+",
        op: Value::checked_add,
        policy: NullPolicy::ZeroFill,
    };
    pub const SUB: Operator = Operator {
        name: "-",
        op: Value::checked_sub,
        policy: NullPolicy::ZeroFill,
    };
    pub const MUL: Operator = Operator {
        name: "*",
        op: Value::checked_mul,
        policy: NullPolicy::Propagate,
    };
    pub const DIV: Operator = Operator {
        name: "/",
        op: Value::checked_div,
        policy: NullPolicy::NullOnZeroDivisor,
    };

    pub fn new(name: &'static str, op: fn(&Value, &Value) -> Option<Value>, policy: NullPolicy) -> Self {
        Self { name, op, policy }
    }

    /// Combines two leaf values under this operator's null policy.
    pub fn apply(&self, left: Option<&Value>, right: Option<&Value>) -> Option<Value> {
        match (self.policy, left, right) {
            (_, None, None) => None,
            (NullPolicy::ZeroFill, left, right) => {
                let zero = Value::zero();
                (self.op)(left.unwrap_or(&zero), right.unwrap_or(&zero))
            }
            (NullPolicy::NullOnZeroDivisor, Some(l), Some(r)) if !r.is_zero() => (self.op)(l, r),
            (NullPolicy::Propagate, Some(l), Some(r)) => (self.op)(l, r),
            _ => {
                trace!(op = self.name, "null policy yields absent");
                None
            }
        }
    }
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operator")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .finish()
    }
}

fn shape(node: NodeRef<'_>) -> String {
    let name = node.label().map_or("(no label)", |label| label.name.as_str());
    match node.payload() {
        Payload::Absent => format!("{name} (absent)"),
        Payload::Scalar(value) => format!("{name} (value {value})"),
        Payload::Children(children) => format!("{name} ({} children)", children.len()),
    }
}

fn scalar<'a>(payload: Payload<'a>) -> Option<&'a Value> {
    match payload {
        Payload::Scalar(value) => Some(value),
        _ => None,
    }
}

fn merge_nodes<F>(left: NodeRef<'_>, right: NodeRef<'_>, combiner: &mut F) -> TreeResult<DataSet>
where
    F: FnMut(Option<&Label>, Option<&Value>, Option<&Value>) -> Option<Value>,
{
    match (left.payload(), right.payload()) {
        (Payload::Children(_), Payload::Scalar(_)) | (Payload::Scalar(_), Payload::Children(_)) => {
            Err(TreeError::ShapeConflict {
                left: shape(left),
                right: shape(right),
            })
        }
        (Payload::Children(_), Payload::Children(_) | Payload::Absent)
        | (Payload::Absent, Payload::Children(_)) => merge_children(left, right, combiner),
        (l, r) => {
            let value = combiner(left.label(), scalar(l), scalar(r));
            Ok(DataSet::shell(left, Data::from(value)))
        }
    }
}

fn merge_children<F>(left: NodeRef<'_>, right: NodeRef<'_>, combiner: &mut F) -> TreeResult<DataSet>
where
    F: FnMut(Option<&Label>, Option<&Value>, Option<&Value>) -> Option<Value>,
{
    let mut result = DataSet::shell(left, Data::Children(Vec::new()));
    let root = result.root_index();

    let mut unmatched: Vec<NodeRef<'_>> = right.children().collect();
    for child in left.children() {
        match unmatched.iter().position(|other| other.label() == child.label()) {
            Some(position) => {
                let other = unmatched.remove(position);
                trace!(label = ?child.label().map(|l| &l.name), "merging matched children");
                result.add_child(root, merge_nodes(child, other, combiner)?)?;
            }
            None => {
                result.add_child(root, child.deep_dup())?;
            }
        }
    }
    if !unmatched.is_empty() {
        debug!(count = unmatched.len(), "appending right-only children");
    }
    for other in unmatched {
        result.add_child(root, other.deep_dup())?;
    }
    Ok(result)
}

impl<'a> NodeRef<'a> {
    /// Merges `other` into a copy of this subtree; right leaf values overwrite left ones.
    pub fn merge(&self, other: NodeRef<'_>) -> TreeResult<DataSet> {
        self.merge_with(other, |_, _, right| right.cloned())
    }

    /// Merges with `combiner(label, left, right)` resolving every leaf pair.
    #[instrument(level = "debug", skip_all, fields(left = %self.id(), right = %other.id()))]
    pub fn merge_with<F>(&self, other: NodeRef<'_>, mut combiner: F) -> TreeResult<DataSet>
    where
        F: FnMut(Option<&Label>, Option<&Value>, Option<&Value>) -> Option<Value>,
    {
        merge_nodes(*self, other, &mut combiner)
    }

    /// Arithmetic merge of leaf values with `operator`.
    #[instrument(level = "debug", skip_all, fields(op = operator.name))]
    pub fn combine(&self, other: NodeRef<'_>, operator: Operator) -> TreeResult<DataSet> {
        self.merge_with(other, move |_, left, right| operator.apply(left, right))
    }
}

impl DataSet {
    pub fn merge(&self, other: &DataSet) -> TreeResult<DataSet> {
        self.root().merge(other.root())
    }

    pub fn merge_with<F>(&self, other: &DataSet, combiner: F) -> TreeResult<DataSet>
    where
        F: FnMut(Option<&Label>, Option<&Value>, Option<&Value>) -> Option<Value>,
    {
        self.root().merge_with(other.root(), combiner)
    }

    pub fn combine(&self, other: &DataSet, operator: Operator) -> TreeResult<DataSet> {
        self.root().combine(other.root(), operator)
    }
}
