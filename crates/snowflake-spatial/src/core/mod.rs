//! Core types shared by the codec, translator and resolver.
//!
//! - [`geometry`]: geometry model and envelope
//! - [`predicate`]: predicate tree and kind tags
//! - [`identifier`]: identifier validation and quoting
//! - [`traits`]: `Dialect` strategy and `ScalarQuery` backend handle
//! - [`value`]: scalar values returned by a backend

pub mod geometry;
pub mod identifier;
pub mod predicate;
pub mod traits;
pub mod value;

pub use geometry::{Coord, Envelope, Geometry, Polygon, Srid};
pub use predicate::{ComparisonOp, Expr, Literal, PredicateKind, PredicateNode, SpatialKind};
pub use traits::{Dialect, ScalarQuery};
pub use value::ScalarValue;
