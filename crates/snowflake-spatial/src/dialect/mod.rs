//! Dialect tables: geometry type registry and predicate capabilities.
//!
//! Both are immutable after construction and are meant to be built once per
//! configuration and shared (`Arc`) across translations.
//!
//! ```rust,ignore
//! let registry = TypeRegistry::snowflake();
//! let caps = DialectCapabilities::snowflake().enable(PredicateKind::Touches);
//! let sql = translate(&filter, &registry, &caps)?;
//! ```

mod capabilities;
mod registry;

pub use capabilities::DialectCapabilities;
pub use registry::{GenericSqlType, GeometryKind, TypeRegistry, GEOMETRY_TYPES};
