//! MR25Hxx chip variants and geometry
//!
//! The geometry table is static: every supported variant maps to exactly
//! one [`Geometry`], looked up once when a device is attached.

mod table;
mod types;

pub use table::{lookup, GEOMETRY_TABLE};
pub use types::{Geometry, Variant};
