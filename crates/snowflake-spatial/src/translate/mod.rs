//! Predicate tree to SQL translation.
//!
//! [`FilterToSql`] renders a [`PredicateNode`] tree as a SQL boolean
//! expression for one [`Dialect`]. The whole tree is checked against the
//! active [`DialectCapabilities`] before any text is produced, so an
//! unsupported node never yields a partial fragment.
//!
//! Rendering rules:
//!
//! | Node                       | SQL                                         |
//! |----------------------------|---------------------------------------------|
//! | `And` / `Or`               | `(a AND b)` / `(a OR b)`                    |
//! | `Not`                      | `NOT (a)`                                   |
//! | `Include` / `Exclude`      | `1 = 1` / `0 = 1`                           |
//! | `Intersects`, `Within`, .. | `ST_INTERSECTS(a, b) = 1`                   |
//! | `BBox`                     | `ST_INTERSECTS(a, b)`                       |
//! | `DWithin` / `Beyond`       | `ST_DISTANCE(a, b)<d` / `ST_DISTANCE(a, b)>d` |
//! | geometry literal           | `ST_GEOMFROMTEXT('wkt'[, srid])`            |

use std::fmt::Write;

use tracing::debug;

use crate::codec::wkt;
use crate::core::geometry::{Geometry, Srid};
use crate::core::predicate::{Expr, Literal, PredicateKind, PredicateNode, SpatialKind};
use crate::core::traits::Dialect;
use crate::dialect::{DialectCapabilities, TypeRegistry};
use crate::drivers::SnowflakeDialect;
use crate::error::{Result, SpatialError};

const TRUE_SQL: &str = "1 = 1";
const FALSE_SQL: &str = "0 = 1";

/// Translate `node` with the Snowflake dialect described by `registry`,
/// including its quoting and backslash escaping rules.
pub fn translate(
    node: &PredicateNode,
    registry: &TypeRegistry,
    capabilities: &DialectCapabilities,
) -> Result<String> {
    let dialect = SnowflakeDialect::from_registry(registry);
    FilterToSql::new(&dialect, capabilities).encode_to_string(node)
}

/// Stateful renderer owning its output buffer.
///
/// One instance per in-flight query; the buffer is reused across calls.
pub struct FilterToSql<'a, D: Dialect + ?Sized> {
    dialect: &'a D,
    capabilities: &'a DialectCapabilities,
    out: String,
    /// Logical ancestors of the node being rendered, as (kind, child index).
    path: Vec<(PredicateKind, usize)>,
    failed: Option<PredicateKind>,
}

impl<'a, D: Dialect + ?Sized> FilterToSql<'a, D> {
    pub fn new(dialect: &'a D, capabilities: &'a DialectCapabilities) -> Self {
        Self {
            dialect,
            capabilities,
            out: String::with_capacity(256),
            path: Vec::new(),
            failed: None,
        }
    }

    /// Render `node` as a boolean SQL expression.
    ///
    /// Errors raised while rendering name the failing node and its path,
    /// e.g. `translating DWITHIN at root > AND[1]`.
    pub fn encode_to_string(&mut self, node: &PredicateNode) -> Result<String> {
        self.out.clear();
        self.path.clear();
        self.failed = None;
        self.capabilities.check(node)?;
        if let Err(e) = self.visit(node) {
            self.out.clear();
            let context = self.failure_context();
            self.path.clear();
            self.failed = None;
            return Err(e.with_context(context));
        }
        let sql = std::mem::take(&mut self.out);
        debug!("Translated {} filter for {}: {}", node.kind(), self.dialect.name(), sql);
        Ok(sql)
    }

    /// Render `node` prefixed with `WHERE `.
    pub fn encode_where(&mut self, node: &PredicateNode) -> Result<String> {
        let sql = self.encode_to_string(node)?;
        Ok(format!("WHERE {}", sql))
    }

    fn failure_context(&self) -> String {
        let mut context = String::from("translating ");
        match self.failed {
            Some(kind) => context.push_str(kind.name()),
            None => context.push_str("filter"),
        }
        context.push_str(" at root");
        for (kind, index) in &self.path {
            let _ = write!(context, " > {}[{}]", kind, index);
        }
        context
    }

    fn visit(&mut self, node: &PredicateNode) -> Result<()> {
        let result = self.render(node);
        if result.is_err() && self.failed.is_none() {
            self.failed = Some(node.kind());
        }
        result
    }

    fn render(&mut self, node: &PredicateNode) -> Result<()> {
        match node {
            PredicateNode::Include => self.out.push_str(TRUE_SQL),
            PredicateNode::Exclude => self.out.push_str(FALSE_SQL),
            PredicateNode::And(children) => {
                self.logical(PredicateKind::And, children, " AND ", TRUE_SQL)?
            }
            PredicateNode::Or(children) => {
                self.logical(PredicateKind::Or, children, " OR ", FALSE_SQL)?
            }
            PredicateNode::Not(inner) => {
                self.out.push_str("NOT (");
                self.path.push((PredicateKind::Not, 0));
                self.visit(inner)?;
                self.path.pop();
                self.out.push(')');
            }
            PredicateNode::Comparison { op, left, right } => {
                self.expr(left)?;
                self.out.push(' ');
                self.out.push_str(op.as_sql());
                self.out.push(' ');
                self.expr(right)?;
            }
            PredicateNode::IsNull(expr) => {
                self.expr(expr)?;
                self.out.push_str(" IS NULL");
            }
            PredicateNode::Between { expr, lower, upper } => {
                self.expr(expr)?;
                self.out.push_str(" BETWEEN ");
                self.expr(lower)?;
                self.out.push_str(" AND ");
                self.expr(upper)?;
            }
            PredicateNode::Like {
                expr,
                pattern,
                case_insensitive,
            } => {
                self.expr(expr)?;
                self.out
                    .push_str(if *case_insensitive { " ILIKE " } else { " LIKE " });
                let literal = self.dialect.string_literal(pattern);
                self.out.push_str(&literal);
            }
            PredicateNode::Spatial {
                kind,
                left,
                right,
                swapped,
            } => self.spatial(kind, left, right, *swapped)?,
        }
        Ok(())
    }

    fn logical(
        &mut self,
        kind: PredicateKind,
        children: &[PredicateNode],
        sep: &str,
        empty: &str,
    ) -> Result<()> {
        if children.is_empty() {
            self.out.push_str(empty);
            return Ok(());
        }
        self.out.push('(');
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                self.out.push_str(sep);
            }
            // Left on the stack when the child fails
            self.path.push((kind, i));
            self.visit(child)?;
            self.path.pop();
        }
        self.out.push(')');
        Ok(())
    }

    fn spatial(&mut self, kind: &SpatialKind, left: &Expr, right: &Expr, swapped: bool) -> Result<()> {
        if let Some(distance) = kind.distance() {
            if !distance.is_finite() || distance < 0.0 {
                return Err(SpatialError::InvalidPredicate(format!(
                    "{} distance must be finite and non-negative, got {}",
                    kind.tag(),
                    distance
                )));
            }
            self.out.push_str(self.dialect.distance_function());
            self.out.push('(');
            self.expr(left)?;
            self.out.push_str(", ");
            self.expr(right)?;
            self.out.push(')');
            self.out
                .push(if matches!(kind, SpatialKind::DWithin(_)) { '<' } else { '>' });
            // Debug formatting keeps the fractional part ("3.0")
            let _ = write!(self.out, "{:?}", distance);
            return Ok(());
        }

        let (a, b) = if swapped { (right, left) } else { (left, right) };
        self.out.push_str(self.dialect.spatial_function(kind));
        self.out.push('(');
        self.expr(a)?;
        self.out.push_str(", ");
        self.expr(b)?;
        self.out.push(')');
        if !matches!(kind, SpatialKind::BBox) {
            self.out.push_str(self.dialect.boolean_suffix());
        }
        Ok(())
    }

    fn expr(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Column(name) => {
                let quoted = self.dialect.quote_ident(name)?;
                self.out.push_str(&quoted);
            }
            Expr::Literal(literal) => self.literal(literal)?,
        }
        Ok(())
    }

    fn literal(&mut self, literal: &Literal) -> Result<()> {
        match literal {
            Literal::Null => self.out.push_str("NULL"),
            Literal::Bool(b) => self.out.push_str(if *b { "TRUE" } else { "FALSE" }),
            Literal::Integer(v) => {
                let _ = write!(self.out, "{}", v);
            }
            Literal::Float(v) => {
                if !v.is_finite() {
                    return Err(SpatialError::InvalidPredicate(format!(
                        "float literal must be finite, got {}",
                        v
                    )));
                }
                let _ = write!(self.out, "{:?}", v);
            }
            Literal::Text(s) => {
                let quoted = self.dialect.string_literal(s);
                self.out.push_str(&quoted);
            }
            Literal::Geometry { geometry, srid } => self.geometry(geometry, *srid)?,
            Literal::Envelope { envelope, srid } => {
                envelope.validate()?;
                self.geometry(&envelope.to_polygon(), *srid)?;
            }
        }
        Ok(())
    }

    fn geometry(&mut self, geometry: &Geometry, srid: Srid) -> Result<()> {
        let text = wkt::encode_text(geometry)?;
        self.out.push_str(self.dialect.geometry_from_text());
        self.out.push('(');
        let quoted = self.dialect.string_literal(&text);
        self.out.push_str(&quoted);
        if let Some(srid) = srid {
            let _ = write!(self.out, ", {}", srid);
        }
        self.out.push(')');
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::Envelope;
    use crate::core::predicate::{ComparisonOp, PredicateKind};

    fn square() -> Geometry {
        Geometry::polygon_from(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0), (0.0, 0.0)])
    }

    fn render(node: &PredicateNode) -> Result<String> {
        translate(node, &TypeRegistry::snowflake(), &DialectCapabilities::snowflake())
    }

    #[test]
    fn test_intersects_polygon() {
        let node = PredicateNode::spatial(
            SpatialKind::Intersects,
            Expr::column("geom"),
            Expr::geometry(square(), None),
        );
        assert_eq!(
            render(&node).unwrap(),
            "ST_INTERSECTS(\"geom\", ST_GEOMFROMTEXT('POLYGON((0 0, 1 0, 1 1, 0 1, 0 0))')) = 1"
        );
    }

    #[test]
    fn test_bbox_has_no_suffix() {
        let env = Envelope::new(0.0, 0.0, 10.0, 10.0).unwrap();
        let sql = render(&PredicateNode::bbox("geom", env, None)).unwrap();
        assert_eq!(
            sql,
            "ST_INTERSECTS(\"geom\", ST_GEOMFROMTEXT('POLYGON((0 0, 10 0, 10 10, 0 10, 0 0))'))"
        );
        assert!(!sql.ends_with("= 1"));
    }

    #[test]
    fn test_dwithin_and_beyond() {
        let dwithin = PredicateNode::spatial(
            SpatialKind::DWithin(3.0),
            Expr::column("geom"),
            Expr::geometry(Geometry::point(5.0, 5.0), None),
        );
        assert_eq!(
            render(&dwithin).unwrap(),
            "ST_DISTANCE(\"geom\", ST_GEOMFROMTEXT('POINT(5 5)'))<3.0"
        );

        let beyond = PredicateNode::spatial(
            SpatialKind::Beyond(0.1 + 0.2),
            Expr::column("geom"),
            Expr::geometry(Geometry::point(5.0, 5.0), None),
        );
        assert_eq!(
            render(&beyond).unwrap(),
            "ST_DISTANCE(\"geom\", ST_GEOMFROMTEXT('POINT(5 5)'))>0.30000000000000004"
        );
    }

    #[test]
    fn test_negative_distance_rejected() {
        let node = PredicateNode::spatial(
            SpatialKind::DWithin(-1.0),
            Expr::column("geom"),
            Expr::geometry(Geometry::point(0.0, 0.0), None),
        );
        let err = render(&node).unwrap_err();
        assert!(matches!(err.root_cause(), SpatialError::InvalidPredicate(_)));
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_render_error_names_node_path() {
        let tree = PredicateNode::And(vec![
            PredicateNode::IsNull(Expr::column("deleted_at")),
            PredicateNode::not(PredicateNode::spatial(
                SpatialKind::Beyond(f64::NAN),
                Expr::column("geom"),
                Expr::geometry(Geometry::point(0.0, 0.0), None),
            )),
        ]);
        let dialect = SnowflakeDialect::default();
        let caps = DialectCapabilities::snowflake();
        let mut encoder = FilterToSql::new(&dialect, &caps);
        let err = encoder.encode_to_string(&tree).unwrap_err();
        assert!(err
            .to_string()
            .starts_with("translating BEYOND at root > AND[1] > NOT[0]: Invalid predicate"));

        // State is reset for the next filter
        let err = encoder
            .encode_to_string(&PredicateNode::IsNull(Expr::column("")))
            .unwrap_err();
        assert!(err.to_string().starts_with("translating IS_NULL at root: "));
        assert_eq!(
            encoder.encode_to_string(&PredicateNode::Include).unwrap(),
            "1 = 1"
        );
    }

    #[test]
    fn test_swapped_reverses_operands() {
        let node = PredicateNode::Spatial {
            kind: SpatialKind::Within,
            left: Expr::column("geom"),
            right: Expr::geometry(Geometry::point(1.0, 2.0), Some(4326)),
            swapped: true,
        };
        assert_eq!(
            render(&node).unwrap(),
            "ST_WITHIN(ST_GEOMFROMTEXT('POINT(1 2)', 4326), \"geom\") = 1"
        );
    }

    #[test]
    fn test_crosses_maps_to_intersects() {
        let node = PredicateNode::spatial(
            SpatialKind::Crosses,
            Expr::column("route"),
            Expr::geometry(Geometry::line_from(&[(0.0, 0.0), (2.0, 2.0)]), None),
        );
        assert!(render(&node)
            .unwrap()
            .starts_with("ST_INTERSECTS(\"route\", ST_GEOMFROMTEXT('LINESTRING(0 0, 2 2)'))"));
    }

    #[test]
    fn test_unsupported_emits_nothing() {
        let touches = PredicateNode::spatial(
            SpatialKind::Touches,
            Expr::column("geom"),
            Expr::geometry(square(), None),
        );
        let tree = PredicateNode::And(vec![PredicateNode::Include, touches]);

        let dialect = SnowflakeDialect::default();
        let caps = DialectCapabilities::snowflake();
        let mut encoder = FilterToSql::new(&dialect, &caps);
        match encoder.encode_to_string(&tree).unwrap_err() {
            SpatialError::UnsupportedPredicate { kind, .. } => {
                assert_eq!(kind, PredicateKind::Touches)
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(encoder.out.is_empty());

        let caps = DialectCapabilities::snowflake().enable(PredicateKind::Touches);
        let mut encoder = FilterToSql::new(&dialect, &caps);
        assert!(encoder.encode_to_string(&tree).unwrap().contains("ST_TOUCHES"));
    }

    #[test]
    fn test_logical_nesting() {
        let tree = PredicateNode::Or(vec![
            PredicateNode::And(vec![
                PredicateNode::compare(ComparisonOp::GtEq, Expr::column("lanes"), Expr::int(2)),
                PredicateNode::IsNull(Expr::column("closed_at")),
            ]),
            PredicateNode::not(PredicateNode::Like {
                expr: Expr::column("name"),
                pattern: "O'Brien%".into(),
                case_insensitive: true,
            }),
        ]);
        assert_eq!(
            render(&tree).unwrap(),
            "((\"lanes\" >= 2 AND \"closed_at\" IS NULL) OR NOT (\"name\" ILIKE 'O''Brien%'))"
        );
    }

    #[test]
    fn test_empty_logical_nodes() {
        assert_eq!(render(&PredicateNode::And(vec![])).unwrap(), "1 = 1");
        assert_eq!(render(&PredicateNode::Or(vec![])).unwrap(), "0 = 1");
        assert_eq!(render(&PredicateNode::Exclude).unwrap(), "0 = 1");
    }

    #[test]
    fn test_scalar_literals() {
        let node = PredicateNode::Between {
            expr: Expr::column("speed"),
            lower: Expr::Literal(Literal::Float(2.5)),
            upper: Expr::Literal(Literal::Integer(80)),
        };
        assert_eq!(render(&node).unwrap(), "\"speed\" BETWEEN 2.5 AND 80");

        let node = PredicateNode::compare(
            ComparisonOp::NotEq,
            Expr::column("paved"),
            Expr::Literal(Literal::Bool(false)),
        );
        assert_eq!(render(&node).unwrap(), "\"paved\" <> FALSE");

        let nan = PredicateNode::compare(
            ComparisonOp::Eq,
            Expr::column("x"),
            Expr::Literal(Literal::Float(f64::NAN)),
        );
        assert!(render(&nan).is_err());
    }

    #[test]
    fn test_bad_identifier_rejected() {
        let node = PredicateNode::IsNull(Expr::column(""));
        assert!(matches!(
            render(&node).unwrap_err().root_cause(),
            SpatialError::Config(_)
        ));
    }

    #[test]
    fn test_encode_where_and_buffer_reuse() {
        let dialect = SnowflakeDialect::default();
        let caps = DialectCapabilities::snowflake();
        let mut encoder = FilterToSql::new(&dialect, &caps);
        assert_eq!(
            encoder.encode_where(&PredicateNode::Include).unwrap(),
            "WHERE 1 = 1"
        );
        assert_eq!(
            encoder
                .encode_to_string(&PredicateNode::IsNull(Expr::column("g")))
                .unwrap(),
            "\"g\" IS NULL"
        );
    }
}
