//! Structural equality, hashing and ordering of nodes.
//!
//! Child lists compare as multisets: both sides are sorted canonically
//! before an element-wise comparison, so insertion order never affects
//! equality. Each child list is sorted once per comparison.
//!
//! Ordering precedence, applied lexicographically:
//! 1. absent payload sorts first
//! 2. scalar before child list
//! 3. label ids: unlabeled first, then the [`LabelId`](crate::LabelId) order
//! 4. numeric scalars by value, numbers before text
//! 5. child count, or size of a text scalar
//! 6. canonical tie-break (scalar, sorted children) keeping `Ord`
//!    consistent with `Eq`

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::arena::{DataSet, NodeRef, Payload};
use crate::label::Label;

/// A node together with its children, recursively, in canonical order.
struct Canonical<'a> {
    node: NodeRef<'a>,
    children: Vec<Canonical<'a>>,
}

impl<'a> Canonical<'a> {
    fn build(node: NodeRef<'a>) -> Self {
        let mut children: Vec<Canonical<'a>> = node.children().map(Canonical::build).collect();
        children.sort_by(|x, y| x.canonical_cmp(y));
        Canonical { node, children }
    }

    /// Shape, label id, scalar, then sorted children pairwise.
    fn canonical_cmp(&self, other: &Canonical<'_>) -> Ordering {
        self.node
            .shape_rank()
            .cmp(&other.node.shape_rank())
            .then_with(|| cmp_labels(self.node.label(), other.node.label()))
            .then_with(|| match (self.node.payload(), other.node.payload()) {
                (Payload::Scalar(x), Payload::Scalar(y)) => x.total_cmp(y),
                _ => Ordering::Equal,
            })
            .then_with(|| {
                self.children
                    .iter()
                    .zip(&other.children)
                    .map(|(x, y)| x.canonical_cmp(y))
                    .find(|ord| ord.is_ne())
                    .unwrap_or_else(|| self.children.len().cmp(&other.children.len()))
            })
    }
}

impl<'a> NodeRef<'a> {
    /// Children in canonical order.
    pub fn sorted_children(&self) -> Vec<NodeRef<'a>> {
        Canonical::build(*self)
            .children
            .into_iter()
            .map(|c| c.node)
            .collect()
    }

    /// Leaf-or-branch shape rank: absent, scalar, child list.
    fn shape_rank(&self) -> u8 {
        match self.payload() {
            Payload::Absent => 0,
            Payload::Scalar(_) => 1,
            Payload::Children(_) => 2,
        }
    }

    fn precedence_cmp(&self, other: &NodeRef<'_>) -> Ordering {
        // 1 + 2: presence, then scalar before child list
        let shape = self.shape_rank().cmp(&other.shape_rank());
        if shape != Ordering::Equal {
            return shape;
        }

        // 3: label identity
        let labels = cmp_labels(self.label(), other.label());
        if labels != Ordering::Equal {
            return labels;
        }

        match (self.payload(), other.payload()) {
            // 4 + 5 for scalars
            (Payload::Scalar(x), Payload::Scalar(y)) => match (x.is_numeric(), y.is_numeric()) {
                (true, true) => x.total_cmp(y),
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (false, false) => x.size().cmp(&y.size()),
            },
            // 5 for child lists
            (Payload::Children(x), Payload::Children(y)) => x.len().cmp(&y.len()),
            _ => Ordering::Equal,
        }
    }

    /// Compares nodes of possibly different trees.
    pub fn cmp_node(&self, other: &NodeRef<'_>) -> Ordering {
        self.precedence_cmp(other).then_with(|| {
            Canonical::build(*self).canonical_cmp(&Canonical::build(*other))
        })
    }

    /// Structural equality across trees: labels by identity, child lists as multisets.
    pub fn eq_node(&self, other: &NodeRef<'_>) -> bool {
        if self.label() != other.label() {
            return false;
        }
        match (self.payload(), other.payload()) {
            (Payload::Absent, Payload::Absent) => true,
            (Payload::Scalar(x), Payload::Scalar(y)) => x == y,
            (Payload::Children(x), Payload::Children(y)) => {
                x.len() == y.len()
                    && Canonical::build(*self)
                        .canonical_cmp(&Canonical::build(*other))
                        .is_eq()
            }
            _ => false,
        }
    }

    /// Hash consistent with [`NodeRef::eq_node`]: child hashes are combined
    /// independently of their order.
    pub fn structural_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.label().hash(&mut hasher);
        match self.payload() {
            Payload::Absent => 0u8.hash(&mut hasher),
            Payload::Scalar(value) => {
                1u8.hash(&mut hasher);
                value.hash(&mut hasher);
            }
            Payload::Children(children) => {
                2u8.hash(&mut hasher);
                let mut child_hashes: Vec<u64> =
                    children.iter().map(|c| c.structural_hash()).collect();
                child_hashes.sort_unstable();
                child_hashes.hash(&mut hasher);
            }
        }
        hasher.finish()
    }
}

fn cmp_labels(a: Option<&Label>, b: Option<&Label>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => x.id.cmp(&y.id),
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.eq_node(other)
    }
}

impl Eq for NodeRef<'_> {}

impl Hash for NodeRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.structural_hash());
    }
}

impl PartialOrd for NodeRef<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NodeRef<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_node(other)
    }
}

impl PartialEq for DataSet {
    fn eq(&self, other: &Self) -> bool {
        self.root().eq_node(&other.root())
    }
}

impl Eq for DataSet {}

impl Hash for DataSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.root().hash(state);
    }
}

impl PartialOrd for DataSet {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DataSet {
    fn cmp(&self, other: &Self) -> Ordering {
        self.root().cmp_node(&other.root())
    }
}
