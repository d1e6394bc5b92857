//! Refractive media.
//!
//! A gap between two surfaces is filled with a [`Medium`], which is either a
//! constant refractive index or a key into a materials catalog. Resolving a
//! material key into a refractive index at a particular wavelength is the job
//! of a host-supplied [`MaterialCatalog`] implementation; this crate does not
//! ship one. A system built with a [`Medium::Material`] gap and no catalog
//! (or a catalog that does not recognize the key) fails to build with
//! [`SystemErrorKind::MaterialUnknown`](crate::SystemErrorKind::MaterialUnknown).
use serde::{Deserialize, Serialize};

use crate::core::Float;

/// The refractive medium filling a gap between two surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Medium {
    /// A constant refractive index, independent of wavelength.
    RefractiveIndex(Float),

    /// A named material resolved against a [`MaterialCatalog`] at build time.
    Material(String),
}

/// A source of refractive index data keyed by material name.
///
/// Implementations typically wrap a dispersion-formula database (e.g. the
/// Sellmeier coefficients published by a glass manufacturer). This crate
/// treats the catalog as an external collaborator: it only consumes the
/// resolved scalar returned here.
pub trait MaterialCatalog: std::fmt::Debug {
    /// Returns the refractive index of `name` at `wavelength`, or `None` if
    /// the material is not recognized.
    fn refractive_index(&self, name: &str, wavelength: Float) -> Option<Float>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FixedCatalog;

    impl MaterialCatalog for FixedCatalog {
        fn refractive_index(&self, name: &str, _wavelength: Float) -> Option<Float> {
            match name {
                "N-BK7" => Some(1.515),
                _ => None,
            }
        }
    }

    #[test]
    fn catalog_resolves_known_material() {
        let catalog = FixedCatalog;
        assert_eq!(catalog.refractive_index("N-BK7", 0.5876), Some(1.515));
    }

    #[test]
    fn catalog_rejects_unknown_material() {
        let catalog = FixedCatalog;
        assert_eq!(catalog.refractive_index("SF11", 0.5876), None);
    }
}
