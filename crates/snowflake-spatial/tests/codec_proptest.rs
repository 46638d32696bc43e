//! Property tests for the geometry codecs and predicate rendering.

use proptest::prelude::*;

use snowflake_spatial::{
    decode_binary, decode_text, encode_binary, encode_text, translate, Coord,
    DialectCapabilities, Envelope, Expr, Geometry, Polygon, PredicateNode, SpatialKind,
    TypeRegistry,
};

fn ordinate() -> impl Strategy<Value = f64> {
    prop_oneof![
        -1.0e7..1.0e7f64,
        prop::num::f64::NORMAL,
        Just(0.0),
        Just(-0.0),
    ]
}

fn coord() -> impl Strategy<Value = Coord> {
    (ordinate(), ordinate()).prop_map(|(x, y)| Coord::new(x, y))
}

fn line() -> impl Strategy<Value = Vec<Coord>> {
    prop::collection::vec(coord(), 2..8)
}

fn ring() -> impl Strategy<Value = Vec<Coord>> {
    prop::collection::vec(coord(), 3..8).prop_map(|mut coords| {
        let first = coords[0];
        coords.push(first);
        coords
    })
}

fn polygon() -> impl Strategy<Value = Polygon> {
    (ring(), prop::collection::vec(ring(), 0..3))
        .prop_map(|(exterior, interiors)| Polygon::new(exterior, interiors))
}

fn geometry() -> impl Strategy<Value = Geometry> {
    let leaf = prop_oneof![
        coord().prop_map(Geometry::Point),
        line().prop_map(Geometry::LineString),
        polygon().prop_map(Geometry::Polygon),
        prop::collection::vec(coord(), 0..5).prop_map(Geometry::MultiPoint),
        prop::collection::vec(line(), 0..4).prop_map(Geometry::MultiLineString),
        prop::collection::vec(polygon(), 0..3).prop_map(Geometry::MultiPolygon),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop::collection::vec(inner, 0..4).prop_map(Geometry::GeometryCollection)
    })
}

fn render(node: &PredicateNode) -> String {
    translate(
        node,
        &TypeRegistry::snowflake(),
        &DialectCapabilities::all(),
    )
    .unwrap()
}

proptest! {
    #[test]
    fn wkb_round_trip(g in geometry()) {
        let bytes = encode_binary(&g).unwrap();
        prop_assert_eq!(decode_binary(&bytes).unwrap(), g);
    }

    #[test]
    fn wkt_round_trip(g in geometry()) {
        let text = encode_text(&g).unwrap();
        prop_assert_eq!(decode_text(&text).unwrap(), g);
    }

    #[test]
    fn linear_ring_degrades_to_line(coords in ring()) {
        let ring = Geometry::LinearRing(coords.clone());
        let text = encode_text(&ring).unwrap();
        prop_assert!(text.starts_with("LINESTRING("));
        prop_assert_eq!(decode_text(&text).unwrap(), Geometry::LineString(coords));
    }

    #[test]
    fn truncated_wkb_never_panics(g in geometry(), cut in 0usize..64) {
        let bytes = encode_binary(&g).unwrap();
        let end = bytes.len().saturating_sub(cut + 1);
        prop_assert!(decode_binary(&bytes[..end]).is_err());
    }

    #[test]
    fn envelope_contains_every_vertex(g in geometry()) {
        if let Some(env) = g.envelope() {
            prop_assert!(env.validate().is_ok());
            g.for_each_coord(&mut |c| {
                assert!(c.x >= env.min_x && c.x <= env.max_x);
                assert!(c.y >= env.min_y && c.y <= env.max_y);
            });
        }
    }

    #[test]
    fn distance_is_rendered_exactly(d in 0.0..1.0e9f64, beyond in any::<bool>()) {
        let kind = if beyond { SpatialKind::Beyond(d) } else { SpatialKind::DWithin(d) };
        let node = PredicateNode::spatial(
            kind,
            Expr::column("geom"),
            Expr::geometry(Geometry::point(1.0, 1.0), None),
        );
        let sql = render(&node);
        let op = if beyond { ">" } else { "<" };
        let (_, tail) = sql.rsplit_once(op).unwrap();
        prop_assert_eq!(tail.parse::<f64>().unwrap(), d);
    }

    #[test]
    fn bbox_never_has_suffix(
        x in -180.0..180.0f64,
        y in -90.0..90.0f64,
        w in 0.0..10.0f64,
        h in 0.0..10.0f64,
        swapped in any::<bool>(),
    ) {
        let env = Envelope::new(x, y, x + w, y + h).unwrap();
        let node = PredicateNode::Spatial {
            kind: SpatialKind::BBox,
            left: Expr::column("geom"),
            right: Expr::envelope(env, Some(4326)),
            swapped,
        };
        let sql = render(&node);
        prop_assert!(sql.starts_with("ST_INTERSECTS("));
        prop_assert!(sql.ends_with(')'));
        prop_assert!(!sql.contains("= 1"));
    }

    #[test]
    fn swapped_reverses_arguments(
        kind in prop_oneof![
            Just(SpatialKind::Contains),
            Just(SpatialKind::Disjoint),
            Just(SpatialKind::Equals),
            Just(SpatialKind::Intersects),
            Just(SpatialKind::Overlaps),
            Just(SpatialKind::Touches),
            Just(SpatialKind::Within),
        ],
        x in -100.0..100.0f64,
    ) {
        let literal = Expr::geometry(Geometry::point(x, 0.0), None);
        let straight = PredicateNode::Spatial {
            kind,
            left: Expr::column("geom"),
            right: literal.clone(),
            swapped: false,
        };
        let reversed = PredicateNode::Spatial {
            kind,
            left: Expr::column("geom"),
            right: literal,
            swapped: true,
        };
        let a = render(&straight);
        let b = render(&reversed);
        let point = format!("ST_GEOMFROMTEXT('POINT({} 0)')", x);
        let expected_a = format!("(\"geom\", {}) = 1", point);
        let expected_b = format!("({}, \"geom\") = 1", point);
        prop_assert!(a.contains(&expected_a));
        prop_assert!(b.contains(&expected_b));
    }
}
