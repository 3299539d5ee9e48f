use std::fmt;

use termtree::Tree;
use tracing::instrument;

use crate::arena::{DataSet, NodeRef, Payload};
use crate::config::RenderSettings;

pub trait TreeRender {
    fn to_tree_string(&self, settings: &RenderSettings) -> Tree<String>;
}

fn node_line(node: NodeRef<'_>, settings: &RenderSettings) -> String {
    let mut line = node
        .label()
        .map_or_else(|| settings.unlabeled.clone(), |label| label.name.clone());
    if settings.show_values {
        if let Payload::Scalar(value) = node.payload() {
            line.push_str(&format!(": {value}"));
        }
    }
    if settings.show_ids {
        line.push_str(&format!(" [{}]", node.id()));
    }
    line
}

/// Renders the subtree at `node`, one line per node.
pub fn to_tree_string(node: NodeRef<'_>, settings: &RenderSettings) -> Tree<String> {
    let leaves: Vec<_> = node
        .children()
        .map(|child| to_tree_string(child, settings))
        .collect();
    Tree::new(node_line(node, settings)).with_leaves(leaves)
}

impl TreeRender for NodeRef<'_> {
    #[instrument(level = "trace", skip_all)]
    fn to_tree_string(&self, settings: &RenderSettings) -> Tree<String> {
        to_tree_string(*self, settings)
    }
}

impl TreeRender for DataSet {
    fn to_tree_string(&self, settings: &RenderSettings) -> Tree<String> {
        to_tree_string(self.root(), settings)
    }
}

impl fmt::Display for DataSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", to_tree_string(self.root(), &RenderSettings::default()))
    }
}
