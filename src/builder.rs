//! Builder for data sets with explicit ids or an injected id source.

use tracing::{instrument, warn};

use crate::arena::{Data, DataSet};
use crate::errors::{TreeError, TreeResult};
use crate::id::{IdGenerator, NodeId, UuidGenerator};
use crate::label::Label;

/// Constructs a [`DataSet`] node by node.
///
/// ```ignore
/// let ids = SequentialIds::new("report");
/// let tree = DataSetBuilder::new()
///     .id_generator(&ids)
///     .label("Office 1")
///     .child(DataSet::leaf("January", 100))
///     .build()?;
/// ```
pub struct DataSetBuilder<'g> {
    id: Option<NodeId>,
    id_generator: &'g dyn IdGenerator,
    label: Option<Label>,
    data: Data,
    scalar_with_children: bool,
}

impl Default for DataSetBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'g> DataSetBuilder<'g> {
    pub fn new() -> Self {
        Self {
            id: None,
            id_generator: &UuidGenerator,
            label: None,
            data: Data::Absent,
            scalar_with_children: false,
        }
    }

    /// Explicit id; takes precedence over the generator.
    pub fn id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn id_generator(mut self, ids: &'g dyn IdGenerator) -> Self {
        self.id_generator = ids;
        self
    }

    pub fn label(mut self, label: impl Into<Label>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Replaces the payload, including children appended so far.
    pub fn data(mut self, data: impl Into<Data>) -> Self {
        self.data = data.into();
        self.scalar_with_children = false;
        self
    }

    /// Appends a child. An absent payload becomes a child list; appending to
    /// a scalar makes [`DataSetBuilder::build`] fail.
    pub fn child(mut self, child: DataSet) -> Self {
        match &mut self.data {
            Data::Children(children) => children.push(child),
            Data::Absent => self.data = Data::Children(vec![child]),
            Data::Scalar(_) => self.scalar_with_children = true,
        }
        self
    }

    /// Fails with [`TreeError::NotEnumerable`] if a child was appended to a scalar.
    #[instrument(level = "trace", skip(self))]
    pub fn build(self) -> TreeResult<DataSet> {
        let id = self.id.unwrap_or_else(|| self.id_generator.generate());
        if self.scalar_with_children {
            warn!(%id, "child appended to scalar payload");
            return Err(TreeError::NotEnumerable(id));
        }
        Ok(DataSet::with_id(id, self.label, self.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::Payload;
    use crate::id::SequentialIds;
    use crate::value::Value;

    #[test]
    fn given_id_generator_when_building_then_uses_generated_id() {
        let ids = SequentialIds::new("n");
        let first = DataSetBuilder::new().id_generator(&ids).build().unwrap();
        let second = DataSetBuilder::new().id_generator(&ids).label("x").build().unwrap();
        assert_eq!(first.root().id(), &NodeId::new("n-1"));
        assert_eq!(second.root().id(), &NodeId::new("n-2"));
    }

    #[test]
    fn given_explicit_id_when_building_then_id_wins() {
        let ids = SequentialIds::new("n");
        let tree = DataSetBuilder::new()
            .id_generator(&ids)
            .id("the_unique_id")
            .build()
            .unwrap();
        assert_eq!(tree.root().id().as_str(), "the_unique_id");
    }

    #[test]
    fn given_children_when_building_then_child_list_in_order() {
        let tree = DataSetBuilder::new()
            .label("Office 1")
            .child(DataSet::leaf("January", 100))
            .child(DataSet::leaf("February", 600))
            .build()
            .unwrap();
        let names: Vec<_> = tree
            .root()
            .children()
            .map(|c| c.label().unwrap().name.clone())
            .collect();
        assert_eq!(names, vec!["January", "February"]);
        assert!(matches!(tree.root().payload(), Payload::Children(c) if c.len() == 2));
    }

    #[test]
    fn given_scalar_data_when_appending_child_then_not_enumerable() {
        let result = DataSetBuilder::new()
            .id("x")
            .label("x")
            .data(5)
            .child(DataSet::leaf("y", 1))
            .build();
        assert_eq!(result.unwrap_err(), TreeError::NotEnumerable(NodeId::new("x")));
    }

    #[test]
    fn given_rejected_child_when_data_replaced_then_builds() {
        let tree = DataSetBuilder::new()
            .data(5)
            .child(DataSet::leaf("y", 1))
            .data(7)
            .build()
            .unwrap();
        assert!(matches!(tree.root().payload(), Payload::Scalar(Value::Int(7))));
    }
}
