//! Snowflake driver.
//!
//! - [`SnowflakeDialect`]: SQL syntax strategy for Snowflake GEOMETRY

mod dialect;

pub use dialect::SnowflakeDialect;
