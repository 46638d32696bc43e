//! Abstract predicate tree handed to the translator by the query layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::geometry::{Envelope, Geometry, Srid};

/// Spatial predicate kind. Distance kinds carry their distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op", content = "distance")]
pub enum SpatialKind {
    #[serde(rename = "bbox")]
    BBox,
    Contains,
    Crosses,
    Disjoint,
    Equals,
    Intersects,
    Overlaps,
    Touches,
    Within,
    #[serde(rename = "dwithin")]
    DWithin(f64),
    Beyond(f64),
}

impl SpatialKind {
    pub fn tag(&self) -> PredicateKind {
        match self {
            SpatialKind::BBox => PredicateKind::BBox,
            SpatialKind::Contains => PredicateKind::Contains,
            SpatialKind::Crosses => PredicateKind::Crosses,
            SpatialKind::Disjoint => PredicateKind::Disjoint,
            SpatialKind::Equals => PredicateKind::Equals,
            SpatialKind::Intersects => PredicateKind::Intersects,
            SpatialKind::Overlaps => PredicateKind::Overlaps,
            SpatialKind::Touches => PredicateKind::Touches,
            SpatialKind::Within => PredicateKind::Within,
            SpatialKind::DWithin(_) => PredicateKind::DWithin,
            SpatialKind::Beyond(_) => PredicateKind::Beyond,
        }
    }

    /// Distance for `DWithin`/`Beyond`.
    pub fn distance(&self) -> Option<f64> {
        match self {
            SpatialKind::DWithin(d) | SpatialKind::Beyond(d) => Some(*d),
            _ => None,
        }
    }
}

/// Binary comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl ComparisonOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::NotEq => "<>",
            ComparisonOp::Lt => "<",
            ComparisonOp::LtEq => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::GtEq => ">=",
        }
    }
}

/// Literal operand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum Literal {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Geometry {
        geometry: Geometry,
        #[serde(default)]
        srid: Srid,
    },
    Envelope {
        envelope: Envelope,
        #[serde(default)]
        srid: Srid,
    },
}

/// Expression leaf: a column reference or a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
    Column(String),
    Literal(Literal),
}

impl Expr {
    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column(name.into())
    }

    pub fn geometry(geometry: Geometry, srid: Srid) -> Self {
        Expr::Literal(Literal::Geometry { geometry, srid })
    }

    pub fn envelope(envelope: Envelope, srid: Srid) -> Self {
        Expr::Literal(Literal::Envelope { envelope, srid })
    }

    pub fn text(value: impl Into<String>) -> Self {
        Expr::Literal(Literal::Text(value.into()))
    }

    pub fn int(value: i64) -> Self {
        Expr::Literal(Literal::Integer(value))
    }
}

/// Predicate tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateNode {
    /// Matches every row.
    Include,
    /// Matches no row.
    Exclude,
    And(Vec<PredicateNode>),
    Or(Vec<PredicateNode>),
    Not(Box<PredicateNode>),
    Comparison {
        op: ComparisonOp,
        left: Expr,
        right: Expr,
    },
    IsNull(Expr),
    Between {
        expr: Expr,
        lower: Expr,
        upper: Expr,
    },
    Like {
        expr: Expr,
        pattern: String,
        #[serde(default)]
        case_insensitive: bool,
    },
    Spatial {
        kind: SpatialKind,
        left: Expr,
        right: Expr,
        /// The property and literal appeared in reverse syntactic order.
        #[serde(default)]
        swapped: bool,
    },
}

impl PredicateNode {
    /// Spatial node with operands in syntactic order.
    pub fn spatial(kind: SpatialKind, left: Expr, right: Expr) -> Self {
        PredicateNode::Spatial {
            kind,
            left,
            right,
            swapped: false,
        }
    }

    /// Bounding-box filter of `column` against `envelope`.
    pub fn bbox(column: impl Into<String>, envelope: Envelope, srid: Srid) -> Self {
        Self::spatial(
            SpatialKind::BBox,
            Expr::column(column),
            Expr::envelope(envelope, srid),
        )
    }

    pub fn compare(op: ComparisonOp, left: Expr, right: Expr) -> Self {
        PredicateNode::Comparison { op, left, right }
    }

    pub fn not(node: PredicateNode) -> Self {
        PredicateNode::Not(Box::new(node))
    }

    /// Kind tag used for capability checks.
    pub fn kind(&self) -> PredicateKind {
        match self {
            PredicateNode::Include => PredicateKind::Include,
            PredicateNode::Exclude => PredicateKind::Exclude,
            PredicateNode::And(_) => PredicateKind::And,
            PredicateNode::Or(_) => PredicateKind::Or,
            PredicateNode::Not(_) => PredicateKind::Not,
            PredicateNode::Comparison { op, .. } => match op {
                ComparisonOp::Eq => PredicateKind::Equal,
                ComparisonOp::NotEq => PredicateKind::NotEqual,
                ComparisonOp::Lt => PredicateKind::LessThan,
                ComparisonOp::LtEq => PredicateKind::LessThanOrEqual,
                ComparisonOp::Gt => PredicateKind::GreaterThan,
                ComparisonOp::GtEq => PredicateKind::GreaterThanOrEqual,
            },
            PredicateNode::IsNull(_) => PredicateKind::IsNull,
            PredicateNode::Between { .. } => PredicateKind::Between,
            PredicateNode::Like { .. } => PredicateKind::Like,
            PredicateNode::Spatial { kind, .. } => kind.tag(),
        }
    }

    /// Direct children of logical nodes; empty for leaves.
    pub fn children(&self) -> &[PredicateNode] {
        match self {
            PredicateNode::And(c) | PredicateNode::Or(c) => c,
            PredicateNode::Not(c) => std::slice::from_ref(c.as_ref()),
            _ => &[],
        }
    }
}

/// Fieldless tag for every predicate node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateKind {
    Include,
    Exclude,
    And,
    Or,
    Not,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    IsNull,
    Between,
    Like,
    #[serde(rename = "bbox")]
    BBox,
    Contains,
    Crosses,
    Disjoint,
    Equals,
    Intersects,
    Overlaps,
    Touches,
    Within,
    #[serde(rename = "dwithin")]
    DWithin,
    Beyond,
}

impl PredicateKind {
    pub const ALL: [PredicateKind; 25] = [
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
        PredicateKind::Equals,
        PredicateKind::Intersects,
        PredicateKind::Overlaps,
        PredicateKind::Touches,
        PredicateKind::Within,
        PredicateKind::DWithin,
        PredicateKind::Beyond,
    ];

    pub fn is_spatial(&self) -> bool {
        *self >= PredicateKind::BBox
    }

    pub fn name(&self) -> &'static str {
        match self {
            PredicateKind::Include => "INCLUDE",
            PredicateKind::Exclude => "EXCLUDE",
            PredicateKind::And => "AND",
            PredicateKind::Or => "OR",
            PredicateKind::Not => "NOT",
            PredicateKind::Equal => "EQUAL",
            PredicateKind::NotEqual => "NOT_EQUAL",
            PredicateKind::LessThan => "LESS_THAN",
            PredicateKind::LessThanOrEqual => "LESS_THAN_OR_EQUAL",
            PredicateKind::GreaterThan => "GREATER_THAN",
            PredicateKind::GreaterThanOrEqual => "GREATER_THAN_OR_EQUAL",
            PredicateKind::IsNull => "IS_NULL",
            PredicateKind::Between => "BETWEEN",
            PredicateKind::Like => "LIKE",
            PredicateKind::BBox => "BBOX",
            PredicateKind::Contains => "CONTAINS",
            PredicateKind::Crosses => "CROSSES",
            PredicateKind::Disjoint => "DISJOINT",
            PredicateKind::Equals => "EQUALS",
            PredicateKind::Intersects => "INTERSECTS",
            PredicateKind::Overlaps => "OVERLAPS",
            PredicateKind::Touches => "TOUCHES",
            PredicateKind::Within => "WITHIN",
            PredicateKind::DWithin => "DWITHIN",
            PredicateKind::Beyond => "BEYOND",
        }
    }

    /// Case-insensitive lookup by name; `_` and `-` are interchangeable.
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = name.trim().to_uppercase().replace('-', "_");
        Self::ALL.into_iter().find(|k| k.name() == wanted)
    }
}

impl fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
