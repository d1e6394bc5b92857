/// Quadratic (order 2) polynomials.
use anyhow::Result;

use crate::core::{Float, math::constants::SOLVER_DENOM_TOL};

pub(crate) struct Quadratic {
    a: Float,
    b: Float,
    c: Float,
}

impl Quadratic {
    pub fn new(a: Float, b: Float, c: Float) -> Result<Self> {
        if a.abs() < SOLVER_DENOM_TOL {
            return Err(anyhow::anyhow!(
                "Coefficient 'a' is too close to zero for a quadratic polynomial."
            ));
        }
        Ok(Self { a, b, c })
    }

    /// Returns the roots of the quadratic polynomial ax^2 + bx + c = 0. The
    /// smaller root is always returned first.
    ///
    /// Uses the numerically stable form of the quadratic formula that avoids
    /// catastrophic cancellation between `-b` and `sqrt(discriminant)`:
    /// `u = -b - sign(b) * sqrt(discriminant)`, `root1 = u / 2a`, `root2 = 2c / u`.
    ///
    /// We do not address the following cases:
    /// - Complex roots: this implementation only handles real roots.
    /// - a == 0: this cannot be the case as we check for it in `new`.
    pub fn roots(&self) -> Result<(Float, Float)> {
        let discriminant = self.b * self.b - 4.0 * self.a * self.c;
        if discriminant < 0.0 {
            return Err(anyhow::anyhow!(
                "No real roots exist for the given quadratic polynomial."
            ));
        }

        if discriminant.abs() < SOLVER_DENOM_TOL {
            let root = -self.b / (2.0 * self.a);
            return Ok((root, root));
        }

        // This works so long as signum never returns zero, which is the case for
        // Rust's f32 and f64 types.
        let u = -self.b - self.b.signum() * discriminant.sqrt();

        let root1 = u / (2.0 * self.a);
        let root2 = 2.0 * self.c / u;

        if root1 > root2 {
            return Ok((root2, root1));
        }

        Ok((root1, root2))
    }
}
