//! Static geometry table

use super::types::{Geometry, Variant};

const KIB: u32 = 1024;

/// Geometry of every supported variant
pub static GEOMETRY_TABLE: [(Variant, Geometry); 4] = [
    (Variant::Mr25h40, Geometry::new(512 * KIB, 3)),
    (Variant::Mr25h10, Geometry::new(128 * KIB, 3)),
    (Variant::Mr25h256, Geometry::new(32 * KIB, 2)),
    (Variant::Mr25h128, Geometry::new(16 * KIB, 2)),
];

/// Look up the geometry of a variant
pub fn lookup(variant: Variant) -> Geometry {
    match variant {
        Variant::Mr25h40 => GEOMETRY_TABLE[0].1,
        Variant::Mr25h10 => GEOMETRY_TABLE[1].1,
        Variant::Mr25h256 => GEOMETRY_TABLE[2].1,
        Variant::Mr25h128 => GEOMETRY_TABLE[3].1,
    }
}
