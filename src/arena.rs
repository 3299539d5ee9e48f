use std::fmt;

use generational_arena::{Arena, Index};
use itertools::Itertools;
use tracing::{instrument, trace};

use crate::errors::{TreeError, TreeResult};
use crate::id::{IdGenerator, NodeId, UuidGenerator};
use crate::label::Label;
use crate::value::Value;

/// Handle of a node inside its [`DataSet`] arena.
pub type NodeIndex = Index;

/// Stored content of a node: exactly one of absent, scalar or child list.
#[derive(Debug, Clone)]
pub(crate) enum Content {
    Absent,
    Scalar(Value),
    Children(Vec<Index>),
}

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug, Clone)]
pub(crate) struct TreeNode {
    pub(crate) id: NodeId,
    pub(crate) label: Option<Label>,
    pub(crate) content: Content,
    /// Index of parent node in the arena, None for the root
    pub(crate) parent: Option<Index>,
}

/// Owned payload handed to constructors and [`DataSet::set_data`].
///
/// Child data sets are moved into the receiving tree.
#[derive(Debug, Clone)]
pub enum Data {
    Absent,
    Scalar(Value),
    Children(Vec<DataSet>),
}

impl From<Value> for Data {
    fn from(value: Value) -> Self {
        Data::Scalar(value)
    }
}

impl From<Option<Value>> for Data {
    fn from(value: Option<Value>) -> Self {
        value.map_or(Data::Absent, Data::Scalar)
    }
}

impl From<i64> for Data {
    fn from(value: i64) -> Self {
        Data::Scalar(Value::Int(value))
    }
}

impl From<i32> for Data {
    fn from(value: i32) -> Self {
        Data::Scalar(Value::from(value))
    }
}

impl From<f64> for Data {
    fn from(value: f64) -> Self {
        Data::Scalar(Value::Float(value))
    }
}

impl From<&str> for Data {
    fn from(value: &str) -> Self {
        Data::Scalar(Value::from(value))
    }
}

impl From<Vec<DataSet>> for Data {
    fn from(children: Vec<DataSet>) -> Self {
        Data::Children(children)
    }
}

/// Borrowed view of a node's payload.
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    Absent,
    Scalar(&'a Value),
    Children(ChildList<'a>),
}

/// Borrowed, ordered child list of a node.
#[derive(Clone, Copy)]
pub struct ChildList<'a> {
    set: &'a DataSet,
    indices: &'a [Index],
}

impl<'a> ChildList<'a> {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<NodeRef<'a>> {
        self.indices.get(position).map(|&index| NodeRef::new(self.set, index))
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let set = self.set;
        self.indices.iter().map(move |&index| NodeRef::new(set, index))
    }
}

impl fmt::Debug for ChildList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// A labeled data tree.
///
/// Nodes live in a generational arena owned by the tree; parents own their
/// children through index lists and every child keeps a non-owning parent
/// index. `Clone` is a deep copy.
#[derive(Debug, Clone)]
pub struct DataSet {
    arena: Arena<TreeNode>,
    root: Index,
}

impl DataSet {
    /// Creates a tree with a fresh uuid for its root.
    pub fn new(label: Option<Label>, data: impl Into<Data>) -> Self {
        Self::with_id(UuidGenerator.generate(), label, data)
    }

    pub fn with_id(id: NodeId, label: Option<Label>, data: impl Into<Data>) -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(TreeNode {
            id,
            label,
            content: Content::Absent,
            parent: None,
        });
        let mut set = Self { arena, root };
        set.install(root, data.into());
        set
    }

    /// Labeled leaf holding a scalar.
    pub fn leaf(label: impl Into<Label>, value: impl Into<Value>) -> Self {
        Self::new(Some(label.into()), Data::Scalar(value.into()))
    }

    /// Labeled branch owning `children`.
    pub fn branch(label: impl Into<Label>, children: Vec<DataSet>) -> Self {
        Self::new(Some(label.into()), Data::Children(children))
    }

    /// Labeled node without payload.
    pub fn empty(label: impl Into<Label>) -> Self {
        Self::new(Some(label.into()), Data::Absent)
    }

    /// Copies the subtree rooted at `src` into a new, independent tree.
    #[instrument(level = "trace", skip(src))]
    pub(crate) fn from_subtree(src: NodeRef<'_>) -> Self {
        let mut arena = Arena::new();
        let root = graft(&mut arena, None, src);
        Self { arena, root }
    }

    /// Unpopulated copy of `src`: same id and label, given content.
    pub(crate) fn shell(src: NodeRef<'_>, data: Data) -> Self {
        Self::with_id(src.id().clone(), src.label().cloned(), data)
    }

    pub fn root(&self) -> NodeRef<'_> {
        NodeRef::new(self, self.root)
    }

    pub fn root_index(&self) -> NodeIndex {
        self.root
    }

    pub fn node(&self, index: NodeIndex) -> Option<NodeRef<'_>> {
        self.arena.get(index).map(|_| NodeRef::new(self, index))
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root().is_empty()
    }

    /// Appends `child` to the node at `parent`.
    ///
    /// An absent payload becomes a one-element child list; a scalar payload
    /// cannot take children.
    #[instrument(level = "debug", skip(self, child))]
    pub fn add_child(&mut self, parent: NodeIndex, child: DataSet) -> TreeResult<NodeIndex> {
        let node = self.arena.get(parent).ok_or(TreeError::NodeNotFound(parent))?;
        if let Content::Scalar(_) = node.content {
            return Err(TreeError::NotEnumerable(node.id.clone()));
        }
        let child_index = graft(&mut self.arena, Some(parent), child.root());
        let node = &mut self.arena[parent];
        match &mut node.content {
            Content::Children(children) => children.push(child_index),
            content => *content = Content::Children(vec![child_index]),
        }
        trace!(id = %self.arena[child_index].id, "child added");
        Ok(child_index)
    }

    /// Replaces the payload of the node at `index`.
    ///
    /// The previous children are dropped from the tree; new children are
    /// re-parented to `index`.
    #[instrument(level = "debug", skip(self, data))]
    pub fn set_data(&mut self, index: NodeIndex, data: impl Into<Data>) -> TreeResult<()> {
        if !self.arena.contains(index) {
            return Err(TreeError::NodeNotFound(index));
        }
        self.clear_children(index);
        self.install(index, data.into());
        Ok(())
    }

    pub fn set_label(&mut self, index: NodeIndex, label: Option<Label>) -> TreeResult<()> {
        let node = self
            .arena
            .get_mut(index)
            .ok_or(TreeError::NodeNotFound(index))?;
        node.label = label;
        Ok(())
    }

    pub(crate) fn entry(&self, index: Index) -> &TreeNode {
        &self.arena[index]
    }

    pub(crate) fn entry_mut(&mut self, index: Index) -> Option<&mut TreeNode> {
        self.arena.get_mut(index)
    }

    fn install(&mut self, index: Index, data: Data) {
        let content = match data {
            Data::Absent => Content::Absent,
            Data::Scalar(value) => Content::Scalar(value),
            Data::Children(children) => Content::Children(
                children
                    .iter()
                    .map(|child| graft(&mut self.arena, Some(index), child.root()))
                    .collect(),
            ),
        };
        self.arena[index].content = content;
    }

    fn clear_children(&mut self, index: Index) {
        let mut stack = match &self.arena[index].content {
            Content::Children(children) => children.clone(),
            _ => return,
        };
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.remove(current) {
                if let Content::Children(children) = node.content {
                    stack.extend(children);
                }
            }
        }
        self.arena[index].content = Content::Absent;
    }
}

/// Copies the subtree at `src` into `arena` below `parent`, returning the new index.
fn graft(arena: &mut Arena<TreeNode>, parent: Option<Index>, src: NodeRef<'_>) -> Index {
    let node = src.node();
    let index = arena.insert(TreeNode {
        id: node.id.clone(),
        label: node.label.clone(),
        content: Content::Absent,
        parent,
    });
    let content = match &node.content {
        Content::Absent => Content::Absent,
        Content::Scalar(value) => Content::Scalar(value.clone()),
        Content::Children(children) => Content::Children(
            children
                .iter()
                .map(|&child| graft(arena, Some(index), NodeRef::new(src.set, child)))
                .collect(),
        ),
    };
    arena[index].content = content;
    index
}

/// Read-only cursor on one node of a [`DataSet`].
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    pub(crate) set: &'a DataSet,
    pub(crate) index: Index,
}

impl<'a> NodeRef<'a> {
    pub(crate) fn new(set: &'a DataSet, index: Index) -> Self {
        Self { set, index }
    }

    pub(crate) fn node(&self) -> &'a TreeNode {
        self.set.entry(self.index)
    }

    pub(crate) fn at(&self, index: Index) -> NodeRef<'a> {
        NodeRef::new(self.set, index)
    }

    pub fn index(&self) -> NodeIndex {
        self.index
    }

    pub fn dataset(&self) -> &'a DataSet {
        self.set
    }

    pub fn id(&self) -> &'a NodeId {
        &self.node().id
    }

    pub fn label(&self) -> Option<&'a Label> {
        self.node().label.as_ref()
    }

    pub fn payload(&self) -> Payload<'a> {
        match &self.node().content {
            Content::Absent => Payload::Absent,
            Content::Scalar(value) => Payload::Scalar(value),
            Content::Children(indices) => Payload::Children(ChildList {
                set: self.set,
                indices: indices.as_slice(),
            }),
        }
    }

    pub(crate) fn child_indices(&self) -> &'a [Index] {
        match &self.node().content {
            Content::Children(indices) => indices.as_slice(),
            _ => &[],
        }
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.node().parent.map(|parent| self.at(parent))
    }

    /// Immediate children, empty unless the payload is a child list.
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let set = self.set;
        self.child_indices()
            .iter()
            .map(move |&index| NodeRef::new(set, index))
    }

    pub fn child_count(&self) -> usize {
        self.child_indices().len()
    }

    /// True if the payload is a child list, even an empty one.
    pub fn has_child_list(&self) -> bool {
        matches!(self.node().content, Content::Children(_))
    }

    /// True if the payload is neither a scalar nor a child list.
    pub fn is_absent(&self) -> bool {
        matches!(self.node().content, Content::Absent)
    }

    pub fn is_branch(&self) -> bool {
        self.child_count() > 0
    }

    pub fn is_leaf(&self) -> bool {
        !self.is_branch()
    }

    /// A branch whose immediate children are all leaves.
    pub fn is_twig(&self) -> bool {
        self.is_branch() && self.children().all(|child| child.is_leaf())
    }

    pub fn is_root(&self) -> bool {
        self.node().parent.is_none()
    }

    /// A node without siblings: the root or an only child.
    pub fn is_oneling(&self) -> bool {
        self.siblings().is_empty()
    }

    pub fn siblings(&self) -> Vec<NodeRef<'a>> {
        match self.parent() {
            Some(parent) => parent
                .children()
                .filter(|child| child.index != self.index)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Ancestors from the root down to the parent.
    pub fn ancestors(&self) -> Vec<NodeRef<'a>> {
        let mut ancestors = Vec::new();
        let mut current = self.parent();
        while let Some(node) = current {
            ancestors.push(node);
            current = node.parent();
        }
        ancestors.reverse();
        ancestors
    }

    /// Labels from the root down to this node.
    pub fn label_path(&self) -> Vec<Option<&'a Label>> {
        self.ancestors()
            .iter()
            .chain(std::iter::once(self))
            .map(|node| node.label())
            .collect()
    }

    /// Immediate children that are leaves.
    pub fn leafs(&self) -> Vec<NodeRef<'a>> {
        self.children().filter(|child| child.is_leaf()).collect()
    }

    /// Immediate children that are branches.
    pub fn child_branches(&self) -> Vec<NodeRef<'a>> {
        self.children().filter(|child| child.is_branch()).collect()
    }

    /// Unique labels of every leaf below this node, in first-seen order.
    pub fn leaf_labels(&self) -> Vec<&'a Label> {
        self.iter()
            .skip(1)
            .filter(|node| node.is_leaf())
            .filter_map(|node| node.label())
            .unique()
            .collect()
    }

    pub fn depth(&self) -> usize {
        1 + self.children().map(|child| child.depth()).max().unwrap_or(0)
    }

    /// Finds the node with `id` in this subtree.
    pub fn find(&self, id: &NodeId) -> Option<NodeRef<'a>> {
        self.iter().find(|node| node.id() == id)
    }

    /// First node in pre-order matching `predicate`.
    pub fn find_by<P>(&self, mut predicate: P) -> Option<NodeRef<'a>>
    where
        P: FnMut(&NodeRef<'a>) -> bool,
    {
        self.iter().find(|node| predicate(node))
    }

    /// Pre-order traversal starting at this node.
    pub fn iter(&self) -> TreeIterator<'a> {
        TreeIterator::new(*self)
    }

    pub fn iter_postorder(&self) -> PostOrderIterator<'a> {
        PostOrderIterator::new(*self)
    }

    /// Independent copy of this subtree; node ids are kept.
    pub fn deep_dup(&self) -> DataSet {
        DataSet::from_subtree(*self)
    }
}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.node();
        let mut s = f.debug_struct("NodeRef");
        s.field("id", &node.id)
            .field("label", &node.label.as_ref().map(|l| &l.name));
        match self.payload() {
            Payload::Absent => s.field("data", &Option::<Value>::None),
            Payload::Scalar(value) => s.field("data", value),
            Payload::Children(children) => s.field("children", &children),
        };
        s.finish()
    }
}

pub struct TreeIterator<'a> {
    set: &'a DataSet,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(start: NodeRef<'a>) -> Self {
        Self {
            set: start.set,
            stack: vec![start.index],
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = NodeRef::new(self.set, self.stack.pop()?);
        // Push children in reverse order for left-to-right traversal
        self.stack.extend(current.child_indices().iter().rev());
        Some(current)
    }
}

pub struct PostOrderIterator<'a> {
    set: &'a DataSet,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(start: NodeRef<'a>) -> Self {
        Self {
            set: start.set,
            stack: vec![(start.index, false)],
        }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current, visited)) = self.stack.pop() {
            let node = NodeRef::new(self.set, current);
            if visited {
                return Some(node);
            }
            self.stack.push((current, true));
            for &child in node.child_indices().iter().rev() {
                self.stack.push((child, false));
            }
        }
        None
    }
}
