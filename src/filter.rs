//! Predicate-driven pruning of a data tree.
//!
//! A predicate receives the result node being assembled at the current level
//! and a candidate child of the source tree, and answers with a [`Verdict`]:
//!
//! - `Keep`: the candidate and its whole subtree are copied into the result.
//! - `Drop`: the candidate is discarded; with [`OrphanStrategy::Adopt`] its
//!   subtree is filtered with the same predicate and the survivors are
//!   attached to the candidate's former parent.
//! - `Undecided`: a branch candidate is filtered recursively and kept if
//!   anything survives; a leaf candidate is kept only with `keep_leafs`.
//!
//! The source tree is never modified.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use crate::arena::{Data, DataSet, NodeRef};
use crate::errors::{TreeError, TreeResult};
use crate::label::LabelId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Keep,
    Drop,
    Undecided,
}

impl From<bool> for Verdict {
    fn from(keep: bool) -> Self {
        if keep {
            Verdict::Keep
        } else {
            Verdict::Drop
        }
    }
}

impl From<Option<bool>> for Verdict {
    fn from(decision: Option<bool>) -> Self {
        decision.map_or(Verdict::Undecided, Verdict::from)
    }
}

/// What happens to the descendants of a dropped node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrphanStrategy {
    #[default]
    Discard,
    Adopt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub keep_leafs: bool,
    pub orphan_strategy: OrphanStrategy,
}

type Predicate<'p> = Box<dyn FnMut(NodeRef<'_>, NodeRef<'_>) -> Verdict + 'p>;

enum Criterion<'p> {
    Predicate(Predicate<'p>),
    LabelId(LabelId),
}

impl Criterion<'_> {
    fn evaluate(&mut self, accumulator: NodeRef<'_>, candidate: NodeRef<'_>) -> Verdict {
        match self {
            Criterion::Predicate(predicate) => predicate(accumulator, candidate),
            Criterion::LabelId(id) if candidate.is_leaf() => {
                Verdict::from(candidate.label().is_some_and(|label| label.id == *id))
            }
            Criterion::LabelId(_) => Verdict::Undecided,
        }
    }

    /// Verdict for a root that has no child list.
    fn evaluate_root(&mut self, node: NodeRef<'_>) -> Verdict {
        match self {
            Criterion::Predicate(predicate) => predicate(node, node),
            Criterion::LabelId(id) => {
                Verdict::from(node.label().is_some_and(|label| label.id == *id))
            }
        }
    }
}

/// Configurable filter run.
///
/// ```ignore
/// let result = Filter::new()
///     .predicate(|_, node| Verdict::from(node.is_leaf()))
///     .orphan_strategy(OrphanStrategy::Adopt)
///     .apply(tree.root())?;
/// ```
#[derive(Default)]
pub struct Filter<'p> {
    criterion: Option<Criterion<'p>>,
    options: FilterOptions,
}

impl<'p> Filter<'p> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn predicate<P>(mut self, predicate: P) -> Self
    where
        P: FnMut(NodeRef<'_>, NodeRef<'_>) -> Verdict + 'p,
    {
        self.criterion = Some(Criterion::Predicate(Box::new(predicate)));
        self
    }

    /// Keeps leaves whose label id equals `id`, in their original position.
    pub fn label_id(mut self, id: impl Into<LabelId>) -> Self {
        self.criterion = Some(Criterion::LabelId(id.into()));
        self
    }

    pub fn keep_leafs(mut self, keep_leafs: bool) -> Self {
        self.options.keep_leafs = keep_leafs;
        self
    }

    pub fn orphan_strategy(mut self, strategy: OrphanStrategy) -> Self {
        self.options.orphan_strategy = strategy;
        self
    }

    pub fn options(mut self, options: FilterOptions) -> Self {
        self.options = options;
        self
    }

    #[instrument(level = "debug", skip_all, fields(root = %node.id()))]
    pub fn apply(&mut self, node: NodeRef<'_>) -> TreeResult<DataSet> {
        let options = self.options;
        let criterion = self.criterion.as_mut().ok_or_else(|| {
            TreeError::InvalidOperation("filter needs a predicate or a label id".to_string())
        })?;

        if !node.has_child_list() {
            let verdict = criterion.evaluate_root(node);
            trace!(?verdict, "filtering a node without child list");
            return Ok(match verdict {
                Verdict::Keep => node.deep_dup(),
                Verdict::Undecided if options.keep_leafs => node.deep_dup(),
                _ => DataSet::shell(node, Data::Absent),
            });
        }
        filter_children(criterion, options, node)
    }
}

fn filter_children(
    criterion: &mut Criterion<'_>,
    options: FilterOptions,
    node: NodeRef<'_>,
) -> TreeResult<DataSet> {
    if node.child_count() == 0 {
        return Ok(node.deep_dup());
    }

    let mut result = DataSet::shell(node, Data::Children(Vec::new()));
    let root = result.root_index();

    for candidate in node.children() {
        let verdict = criterion.evaluate(result.root(), candidate);
        trace!(id = %candidate.id(), ?verdict, "filter verdict");

        match verdict {
            Verdict::Keep => {
                result.add_child(root, candidate.deep_dup())?;
            }
            Verdict::Undecided | Verdict::Drop
                if candidate.has_child_list()
                    && (verdict == Verdict::Undecided
                        || options.orphan_strategy == OrphanStrategy::Adopt) =>
            {
                let filtered = filter_children(criterion, options, candidate)?;
                if filtered.root().child_count() == 0 {
                    continue;
                }
                if verdict == Verdict::Undecided {
                    result.add_child(root, filtered)?;
                } else {
                    debug!(id = %candidate.id(), "adopting orphans of dropped node");
                    for orphan in filtered.root().children() {
                        result.add_child(root, orphan.deep_dup())?;
                    }
                }
            }
            Verdict::Undecided if options.keep_leafs && !candidate.has_child_list() => {
                result.add_child(root, candidate.deep_dup())?;
            }
            _ => {}
        }
    }
    Ok(result)
}

impl<'a> NodeRef<'a> {
    /// Filters this subtree with default options.
    pub fn filter<P>(&self, predicate: P) -> TreeResult<DataSet>
    where
        P: FnMut(NodeRef<'_>, NodeRef<'_>) -> Verdict,
    {
        Filter::new().predicate(predicate).apply(*self)
    }

    pub fn filter_with_options<P>(&self, predicate: P, options: FilterOptions) -> TreeResult<DataSet>
    where
        P: FnMut(NodeRef<'_>, NodeRef<'_>) -> Verdict,
    {
        Filter::new().predicate(predicate).options(options).apply(*self)
    }

    /// Keeps only the leaves labeled `id` together with their ancestors.
    pub fn filter_by_label(&self, id: impl Into<LabelId>) -> TreeResult<DataSet> {
        Filter::new().label_id(id).apply(*self)
    }

    /// Collapses every non-root branch that is an only child, attaching its
    /// children to its grandparent.
    ///
    /// A leaf that is an only child has nothing to re-attach and is kept.
    #[instrument(level = "debug", skip(self), fields(root = %self.id()))]
    pub fn compact_onelings(&self) -> TreeResult<DataSet> {
        Filter::new()
            .predicate(|_, node| {
                if node.is_oneling() && !node.is_root() && node.has_child_list() {
                    Verdict::Drop
                } else {
                    Verdict::Undecided
                }
            })
            .keep_leafs(true)
            .orphan_strategy(OrphanStrategy::Adopt)
            .apply(*self)
    }
}

impl DataSet {
    pub fn filter<P>(&self, predicate: P) -> TreeResult<DataSet>
    where
        P: FnMut(NodeRef<'_>, NodeRef<'_>) -> Verdict,
    {
        self.root().filter(predicate)
    }

    pub fn filter_with_options<P>(&self, predicate: P, options: FilterOptions) -> TreeResult<DataSet>
    where
        P: FnMut(NodeRef<'_>, NodeRef<'_>) -> Verdict,
    {
        self.root().filter_with_options(predicate, options)
    }

    pub fn filter_by_label(&self, id: impl Into<LabelId>) -> TreeResult<DataSet> {
        self.root().filter_by_label(id)
    }

    pub fn compact_onelings(&self) -> TreeResult<DataSet> {
        self.root().compact_onelings()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Payload;
    use crate::label::Label;

    fn leaf(name: &str, value: i64) -> DataSet {
        DataSet::leaf(name, value)
    }

    #[test]
    fn given_no_criterion_when_applied_then_invalid_operation() {
        let tree = DataSet::branch("Root", vec![leaf("a", 1)]);
        let result = Filter::new().keep_leafs(true).apply(tree.root());
        assert!(matches!(result, Err(TreeError::InvalidOperation(_))));
    }

    #[test]
    fn given_true_predicate_when_filtering_then_identity() {
        let tree = DataSet::branch(
            "Root",
            vec![DataSet::branch("A", vec![leaf("x", 1)]), leaf("b", 2)],
        );
        assert_eq!(tree.filter(|_, _| Verdict::Keep).unwrap(), tree);
    }

    #[test]
    fn given_false_predicate_when_filtering_then_labeled_empty_child_list() {
        let tree = DataSet::branch("Root", vec![leaf("a", 1), leaf("b", 2)]);
        let result = tree.filter(|_, _| Verdict::Drop).unwrap();
        assert_eq!(result.root().label(), tree.root().label());
        assert!(matches!(result.root().payload(), Payload::Children(c) if c.is_empty()));
    }

    #[test]
    fn given_empty_child_list_when_filtering_then_empty_copy() {
        let tree = DataSet::new(Some(Label::new("Root")), Vec::<DataSet>::new());
        let result = tree.filter(|_, _| Verdict::Drop).unwrap();
        assert_eq!(result, tree);
        assert!(result.root().has_child_list());
    }

    #[test]
    fn given_leaf_root_when_filtering_then_copy_or_label_only() {
        let tree = leaf("a", 1);
        assert_eq!(tree.filter(|_, _| Verdict::Keep).unwrap(), tree);
        let dropped = tree.filter(|_, _| Verdict::Undecided).unwrap();
        assert!(dropped.root().is_absent());
        assert_eq!(dropped.root().label(), tree.root().label());
        assert_eq!(tree.filter_by_label("a").unwrap(), tree);
    }

    #[test]
    fn given_undecided_leaves_when_keep_leafs_then_kept() {
        let tree = DataSet::branch(
            "Root",
            vec![DataSet::branch("A", vec![leaf("x", 1)]), leaf("b", 2)],
        );
        let options = FilterOptions {
            keep_leafs: true,
            ..FilterOptions::default()
        };
        assert_eq!(
            tree.filter_with_options(|_, _| Verdict::Undecided, options).unwrap(),
            tree
        );
        let pruned = tree.filter(|_, _| Verdict::Undecided).unwrap();
        assert_eq!(pruned.root().child_count(), 0);
    }

    #[test]
    fn given_accumulator_when_filtering_then_predicate_sees_result_so_far() {
        let tree = DataSet::branch("Root", vec![leaf("a", 1), leaf("b", 2), leaf("c", 3)]);
        // keep at most two children
        let result = tree
            .filter(|acc, _| Verdict::from(acc.child_count() < 2))
            .unwrap();
        assert_eq!(result.root().child_count(), 2);
    }

    #[test]
    fn given_dropped_branch_when_adopting_then_descendants_move_up() {
        let tree = DataSet::branch(
            "Root",
            vec![DataSet::branch("A", vec![leaf("C", 3)]), leaf("B", 2)],
        );
        let options = FilterOptions {
            orphan_strategy: OrphanStrategy::Adopt,
            ..FilterOptions::default()
        };
        let result = tree
            .filter_with_options(
                |_, node| {
                    if node.label().map(|l| l.name.as_str()) == Some("A") {
                        Verdict::Drop
                    } else {
                        Verdict::from(node.is_leaf())
                    }
                },
                options,
            )
            .unwrap();
        let expected = DataSet::branch("Root", vec![leaf("B", 2), leaf("C", 3)]);
        assert_eq!(result, expected);
        assert!(result.root().children().all(|c| c.parent().unwrap().is_root()));
    }

    #[test]
    fn given_oneling_branch_when_compacting_then_children_attach_to_grandparent() {
        let tree = DataSet::branch(
            "Expenses per year",
            vec![DataSet::branch(
                "Food",
                vec![leaf("Junk food", 1), leaf("Super foods", 2)],
            )],
        );
        let compacted = tree.compact_onelings().unwrap();
        let expected = DataSet::branch(
            "Expenses per year",
            vec![leaf("Super foods", 2), leaf("Junk food", 1)],
        );
        assert_eq!(compacted, expected);
    }

    #[test]
    fn given_leaf_only_child_when_compacting_then_kept() {
        let tree = DataSet::branch(
            "Expenses per year",
            vec![DataSet::branch("Food", vec![leaf("Junk food", 1)])],
        );
        let compacted = tree.compact_onelings().unwrap();
        let expected = DataSet::branch("Expenses per year", vec![leaf("Junk food", 1)]);
        assert_eq!(compacted, expected);
    }
}
