/// Resolution of a gap's [`Medium`](crate::Medium) into a scalar refractive
/// index at a given wavelength.
use crate::core::Float;
use crate::error::SystemError;
use crate::materials::{MaterialCatalog, Medium};

/// A resolved, real-valued refractive index.
///
/// Absorption (a complex refractive index) is out of scope: this engine
/// traces real geometric rays through lossless media only.
pub(crate) type RefractiveIndex = Float;

pub(crate) fn resolve(
    medium: &Medium,
    wavelength: Float,
    catalog: Option<&dyn MaterialCatalog>,
    gap_index: usize,
) -> Result<RefractiveIndex, SystemError> {
    match medium {
        Medium::RefractiveIndex(n) => Ok(*n),
        Medium::Material(name) => catalog
            .and_then(|c| c.refractive_index(name, wavelength))
            .ok_or_else(|| SystemError::material_unknown(gap_index, name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Catalog;
    impl MaterialCatalog for Catalog {
        fn refractive_index(&self, name: &str, _wavelength: Float) -> Option<Float> {
            (name == "N-BK7").then_some(1.515)
        }
    }

    #[test]
    fn resolves_constant_medium() {
        let n = resolve(&Medium::RefractiveIndex(1.0), 0.5876, None, 0).unwrap();
        assert_eq!(n, 1.0);
    }

    #[test]
    fn resolves_material_with_catalog() {
        let n = resolve(
            &Medium::Material("N-BK7".to_string()),
            0.5876,
            Some(&Catalog),
            1,
        )
        .unwrap();
        assert_eq!(n, 1.515);
    }

    #[test]
    fn unresolved_material_is_an_error() {
        let err = resolve(&Medium::Material("SF11".to_string()), 0.5876, Some(&Catalog), 1)
            .unwrap_err();
        assert_eq!(err.kind, crate::error::SystemErrorKind::MaterialUnknown);
        assert_eq!(err.surface_or_gap_index, Some(1));
    }

    #[test]
    fn material_without_catalog_is_an_error() {
        let err = resolve(&Medium::Material("N-BK7".to_string()), 0.5876, None, 0).unwrap_err();
        assert_eq!(err.kind, crate::error::SystemErrorKind::MaterialUnknown);
    }
}
