//! Labeled data trees for hierarchical numeric aggregation.
//!
//! A [`DataSet`] is a tree whose nodes carry an optional [`Label`] and either
//! nothing, a scalar [`Value`], or an ordered list of children. On top of it:
//!
//! - structural equality and ordering that ignore child order ([`compare`])
//! - predicate-driven pruning with orphan adoption ([`filter`])
//! - label-matched merging and arithmetic combination ([`merge`])
//! - sums, averages and arbitrary folds over leaf values ([`reduce`])
//! - in-place rewriting of labels and values ([`transform`])

pub mod arena;
pub mod builder;
pub mod compare;
pub mod config;
pub mod errors;
pub mod filter;
pub mod id;
pub mod label;
pub mod merge;
pub mod reduce;
pub mod render;
pub mod transform;
pub mod util;
pub mod value;

pub use arena::{ChildList, Data, DataSet, NodeIndex, NodeRef, Payload, PostOrderIterator, TreeIterator};
pub use builder::DataSetBuilder;
pub use config::{FilterSettings, RenderSettings, Settings};
pub use errors::{TreeError, TreeResult};
pub use filter::{Filter, FilterOptions, OrphanStrategy, Verdict};
pub use id::{IdGenerator, NodeId, SequentialIds, UuidGenerator};
pub use label::{Label, LabelId, Metadata};
pub use merge::{NullPolicy, Operator};
pub use reduce::Reducible;
pub use render::TreeRender;
pub use value::Value;
