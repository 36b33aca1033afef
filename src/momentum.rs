//! Four-momentum vector type shared by truth particles and reconstructed
//! objects.
//!
//! All momenta are stored in GeV; unit conversion happens once, at parse
//! time, never here.

/// A four-momentum (px, py, pz, E) in GeV.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FourMomentum {
    /// Momentum x-component.
    pub px: f64,
    /// Momentum y-component.
    pub py: f64,
    /// Momentum z-component.
    pub pz: f64,
    /// Energy.
    pub e: f64,
}

impl FourMomentum {
    /// Construct from components.
    pub fn new(px: f64, py: f64, pz: f64, e: f64) -> Self {
        Self { px, py, pz, e }
    }

    /// Transverse momentum, `sqrt(px^2 + py^2)`.
    pub fn pt(&self) -> f64 {
        self.px.hypot(self.py)
    }

    /// Magnitude of the three-momentum.
    pub fn p(&self) -> f64 {
        (self.px * self.px + self.py * self.py + self.pz * self.pz).sqrt()
    }

    /// Invariant mass, 0 for spacelike vectors.
    pub fn mass(&self) -> f64 {
        let m2 = self.e * self.e - self.p() * self.p();
        if m2 > 0.0 {
            m2.sqrt()
        } else {
            0.0
        }
    }

    /// Azimuthal angle in (-pi, pi].
    pub fn phi(&self) -> f64 {
        self.py.atan2(self.px)
    }

    /// Pseudorapidity. Returns a large finite value for vectors collinear
    /// with the beam axis instead of +/-inf.
    pub fn eta(&self) -> f64 {
        let p = self.p();
        if p == 0.0 {
            return 0.0;
        }
        if (p - self.pz.abs()) < 1e-12 {
            return if self.pz >= 0.0 { 1e10 } else { -1e10 };
        }
        0.5 * ((p + self.pz) / (p - self.pz)).ln()
    }

    /// Angular separation `sqrt(deta^2 + dphi^2)`, with the azimuthal
    /// difference wrapped into [-pi, pi].
    pub fn delta_r(&self, other: &FourMomentum) -> f64 {
        let deta = self.eta() - other.eta();
        let dphi = wrap_phi(self.phi() - other.phi());
        deta.hypot(dphi)
    }
}

/// Wrap an angle difference into [-pi, pi].
fn wrap_phi(mut dphi: f64) -> f64 {
    use std::f64::consts::PI;
    while dphi > PI {
        dphi -= 2.0 * PI;
    }
    while dphi < -PI {
        dphi += 2.0 * PI;
    }
    dphi
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_pt_and_mass() {
        let p = FourMomentum::new(3.0, 4.0, 0.0, 13.0);
        assert!((p.pt() - 5.0).abs() < 1e-12);
        assert!((p.mass() - 12.0).abs() < 1e-12);
    }

    #[test]
    fn test_spacelike_mass_clamped() {
        let p = FourMomentum::new(1.0, 0.0, 0.0, 0.5);
        assert_eq!(p.mass(), 0.0);
    }

    #[test]
    fn test_delta_r_wraps_phi() {
        // Two vectors straddling the phi = pi seam should be close, not
        // nearly 2*pi apart.
        let a = FourMomentum::new(-1.0, 0.01, 0.0, 1.1);
        let b = FourMomentum::new(-1.0, -0.01, 0.0, 1.1);
        assert!(a.delta_r(&b) < 0.1);
    }

    #[test]
    fn test_beam_axis_eta_is_finite() {
        let p = FourMomentum::new(0.0, 0.0, 7000.0, 7000.0);
        assert!(p.eta().is_finite());
        assert!(p.eta() > 0.0);
    }

    proptest! {
        #[test]
        fn prop_delta_r_symmetric(
            ax in -100.0f64..100.0, ay in -100.0f64..100.0, az in -100.0f64..100.0,
            bx in -100.0f64..100.0, by in -100.0f64..100.0, bz in -100.0f64..100.0,
        ) {
            let a = FourMomentum::new(ax, ay, az, 200.0);
            let b = FourMomentum::new(bx, by, bz, 200.0);
            let dr_ab = a.delta_r(&b);
            let dr_ba = b.delta_r(&a);
            prop_assert!(dr_ab >= 0.0);
            prop_assert!((dr_ab - dr_ba).abs() < 1e-9);
        }

        #[test]
        fn prop_delta_r_self_is_zero(
            px in -100.0f64..100.0, py in -100.0f64..100.0, pz in -100.0f64..100.0,
        ) {
            let p = FourMomentum::new(px, py, pz, 200.0);
            prop_assert!(p.delta_r(&p).abs() < 1e-12);
        }
    }
}
