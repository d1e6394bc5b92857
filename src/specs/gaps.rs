use serde::{Deserialize, Serialize};

use crate::core::Float;
use crate::materials::Medium;

/// Specifies a gap between two surfaces in a sequential optical system.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GapSpec {
    pub thickness: Float,
    pub medium: Medium,
}

/// Shorthand for a gap filled with a constant, wavelength-independent
/// refractive index, e.g. `n!(1.515)`.
#[macro_export]
macro_rules! n {
    ($n:expr) => {
        $crate::Medium::RefractiveIndex($n)
    };
}
