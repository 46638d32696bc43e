//! Predicate capability sets.
//!
//! A [`DialectCapabilities`] value lists the predicate kinds the translator
//! may render for one configuration. Callers can check a tree up front, or
//! split a conjunction into a part the engine evaluates and a part they
//! evaluate themselves.

use std::collections::BTreeSet;

use crate::core::predicate::{PredicateKind, PredicateNode};
use crate::error::{Result, SpatialError};

/// Kinds supported by the Snowflake dialect out of the box.
const SNOWFLAKE_DEFAULTS: [PredicateKind; 22] = [
    PredicateKind::Include,
    PredicateKind::Exclude,
    PredicateKind::And,
    PredicateKind::Or,
    PredicateKind::Not,
    PredicateKind::Equal,
    PredicateKind::NotEqual,
    PredicateKind::LessThan,
    PredicateKind::LessThanOrEqual,
    PredicateKind::GreaterThan,
    PredicateKind::GreaterThanOrEqual,
    PredicateKind::IsNull,
    PredicateKind::Between,
    PredicateKind::Like,
    PredicateKind::BBox,
    PredicateKind::Contains,
    PredicateKind::Crosses,
    PredicateKind::Disjoint,
    PredicateKind::Intersects,
    PredicateKind::Within,
    PredicateKind::DWithin,
    PredicateKind::Beyond,
];

/// Immutable set of translatable predicate kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialectCapabilities {
    kinds: BTreeSet<PredicateKind>,
}

impl Default for DialectCapabilities {
    fn default() -> Self {
        Self::snowflake()
    }
}

impl DialectCapabilities {
    /// Default Snowflake set. `Equals`, `Overlaps` and `Touches` are off
    /// until enabled in configuration.
    pub fn snowflake() -> Self {
        Self::from_kinds(SNOWFLAKE_DEFAULTS)
    }

    /// Every kind the translator knows how to render.
    pub fn all() -> Self {
        Self::from_kinds(PredicateKind::ALL)
    }

    pub fn from_kinds(kinds: impl IntoIterator<Item = PredicateKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
        }
    }

    /// Builder: add `kind` to the set.
    pub fn enable(mut self, kind: PredicateKind) -> Self {
        self.kinds.insert(kind);
        self
    }

    /// Builder: remove `kind` from the set.
    pub fn disable(mut self, kind: PredicateKind) -> Self {
        self.kinds.remove(&kind);
        self
    }

    pub fn supports(&self, kind: PredicateKind) -> bool {
        self.kinds.contains(&kind)
    }

    /// Supported kinds in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = PredicateKind> + '_ {
        self.kinds.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// True when every node in the tree is supported.
    pub fn fully_supports(&self, node: &PredicateNode) -> bool {
        self.supports(node.kind()) && node.children().iter().all(|c| self.fully_supports(c))
    }

    /// Walk the whole tree and fail on the first unsupported node.
    ///
    /// The error context is the path from the root, e.g.
    /// `root > AND[1] > NOT[0]`.
    pub fn check(&self, node: &PredicateNode) -> Result<()> {
        self.check_at(node, "root".to_string())
    }

    fn check_at(&self, node: &PredicateNode, path: String) -> Result<()> {
        let kind = node.kind();
        if !self.supports(kind) {
            return Err(SpatialError::unsupported(kind, path));
        }
        for (i, child) in node.children().iter().enumerate() {
            self.check_at(child, format!("{} > {}[{}]", path, kind, i))?;
        }
        Ok(())
    }

    /// Split a filter into a pre-filter the engine can evaluate and a
    /// post-filter the caller must apply to returned rows.
    ///
    /// Only a top-level `AND` is partitioned; any other unsupported tree goes
    /// to the post-filter whole.
    pub fn split(&self, node: &PredicateNode) -> (Option<PredicateNode>, Option<PredicateNode>) {
        if self.fully_supports(node) {
            return (Some(node.clone()), None);
        }

        match node {
            PredicateNode::And(children) if self.supports(PredicateKind::And) => {
                let (pre, post): (Vec<_>, Vec<_>) = children
                    .iter()
                    .cloned()
                    .partition(|c| self.fully_supports(c));
                (conjunction(pre), conjunction(post))
            }
            _ => (None, Some(node.clone())),
        }
    }
}

fn conjunction(mut nodes: Vec<PredicateNode>) -> Option<PredicateNode> {
    match nodes.len() {
        0 => None,
        1 => nodes.pop(),
        _ => Some(PredicateNode::And(nodes)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::{Envelope, Geometry};
    use crate::core::predicate::{Expr, SpatialKind};

    fn touches() -> PredicateNode {
        PredicateNode::spatial(
            SpatialKind::Touches,
            Expr::column("geom"),
            Expr::geometry(Geometry::point(1.0, 1.0), None),
        )
    }

    fn bbox() -> PredicateNode {
        PredicateNode::bbox("geom", Envelope::new(0.0, 0.0, 1.0, 1.0).unwrap(), None)
    }

    #[test]
    fn test_snowflake_defaults() {
        let caps = DialectCapabilities::snowflake();
        assert!(caps.supports(PredicateKind::BBox));
        assert!(caps.supports(PredicateKind::DWithin));
        assert!(!caps.supports(PredicateKind::Touches));
        assert!(!caps.supports(PredicateKind::Equals));
        assert!(!caps.supports(PredicateKind::Overlaps));
        assert_eq!(DialectCapabilities::all().len(), PredicateKind::ALL.len());
    }

    #[test]
    fn test_enable_disable() {
        let caps = DialectCapabilities::snowflake()
            .enable(PredicateKind::Touches)
            .disable(PredicateKind::Like);
        assert!(caps.supports(PredicateKind::Touches));
        assert!(!caps.supports(PredicateKind::Like));
    }

    #[test]
    fn test_check_reports_path() {
        let caps = DialectCapabilities::snowflake();
        let tree = PredicateNode::And(vec![bbox(), PredicateNode::not(touches())]);
        match caps.check(&tree).unwrap_err() {
            SpatialError::UnsupportedPredicate { kind, context } => {
                assert_eq!(kind, PredicateKind::Touches);
                assert_eq!(context, "root > AND[1] > NOT[0]");
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(caps.check(&bbox()).is_ok());
    }

    #[test]
    fn test_split_partitions_top_level_and() {
        let caps = DialectCapabilities::snowflake();
        let tree = PredicateNode::And(vec![bbox(), touches(), PredicateNode::Include]);
        let (pre, post) = caps.split(&tree);
        assert_eq!(
            pre,
            Some(PredicateNode::And(vec![bbox(), PredicateNode::Include]))
        );
        assert_eq!(post, Some(touches()));
    }

    #[test]
    fn test_split_whole_tree() {
        let caps = DialectCapabilities::snowflake();
        assert_eq!(caps.split(&bbox()), (Some(bbox()), None));

        let or = PredicateNode::Or(vec![bbox(), touches()]);
        assert_eq!(caps.split(&or), (None, Some(or.clone())));
    }
}
