/// Data types for modeling sequential ray tracing systems.
pub(crate) mod cursor;
pub(super) mod math;
pub(crate) mod medium;
pub(crate) mod sequential_model;

pub(crate) use cursor::Cursor;
pub(crate) use math::array::argmin;

pub(crate) type Float = f64;

pub(crate) const EPSILON: Float = Float::EPSILON;
