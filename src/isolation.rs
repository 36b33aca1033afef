//! Cone isolation sums.
//!
//! One generic evaluator replaces the per-object-kind overloads: any type
//! exposing a momentum, a transverse momentum and (optionally) detector
//! identity tags can appear on either side of the sum.

use crate::momentum::FourMomentum;
use crate::reco::{EflowObject, Lepton, Photon, Tower, Track};

/// Capability set required of isolation candidates and of the objects
/// summed around them.
pub trait IsolationObject {
    /// Four-momentum of the object.
    fn momentum(&self) -> &FourMomentum;

    /// Transverse momentum.
    fn pt(&self) -> f64 {
        self.momentum().pt()
    }

    /// Detector-level identity tags, or `None` for object kinds without a
    /// detector identity (calorimeter towers).
    fn identity_tags(&self) -> Option<&[u64]> {
        None
    }
}

impl IsolationObject for Lepton {
    fn momentum(&self) -> &FourMomentum {
        &self.momentum
    }
    fn identity_tags(&self) -> Option<&[u64]> {
        Some(&self.tags)
    }
}

impl IsolationObject for Photon {
    fn momentum(&self) -> &FourMomentum {
        &self.momentum
    }
    fn identity_tags(&self) -> Option<&[u64]> {
        Some(&self.tags)
    }
}

impl IsolationObject for Track {
    fn momentum(&self) -> &FourMomentum {
        &self.momentum
    }
    fn identity_tags(&self) -> Option<&[u64]> {
        Some(&self.tags)
    }
}

impl IsolationObject for Tower {
    fn momentum(&self) -> &FourMomentum {
        &self.momentum
    }
}

impl IsolationObject for EflowObject {
    fn momentum(&self) -> &FourMomentum {
        &self.momentum
    }
    fn identity_tags(&self) -> Option<&[u64]> {
        Some(&self.tags)
    }
}

/// Result of a cone isolation sum.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IsolationSum {
    /// Scalar sum of the transverse momenta inside the cone.
    pub sum_pt: f64,
    /// Number of contributing objects.
    pub count: u32,
}

/// Sum the transverse momentum of every object with `pt >= pt_min` inside
/// the cone `delta_r <= cone_dr` around `candidate`.
///
/// When both the candidate and an object expose identity tags, an object
/// sharing any tag with the candidate is excluded so the candidate is not
/// counted against itself. Inputs are never mutated.
pub fn isolation_sum<C, O>(candidate: &C, objects: &[O], cone_dr: f64, pt_min: f64) -> IsolationSum
where
    C: IsolationObject,
    O: IsolationObject,
{
    let mut result = IsolationSum::default();

    for object in objects {
        if object.pt() < pt_min {
            continue;
        }
        if candidate.momentum().delta_r(object.momentum()) > cone_dr {
            continue;
        }
        if shares_identity(candidate, object) {
            continue;
        }
        result.sum_pt += object.pt();
        result.count += 1;
    }

    result
}

/// Whether candidate and object carry a common detector identity tag.
fn shares_identity<C: IsolationObject, O: IsolationObject>(candidate: &C, object: &O) -> bool {
    match (candidate.identity_tags(), object.identity_tags()) {
        (Some(a), Some(b)) => a.iter().any(|tag| b.contains(tag)),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// A momentum with the given pt at the given angular offset in phi
    /// from the x axis, at eta = 0.
    fn at_phi(pt: f64, phi: f64) -> FourMomentum {
        FourMomentum::new(pt * phi.cos(), pt * phi.sin(), 0.0, pt)
    }

    fn lepton_at_origin() -> Lepton {
        Lepton {
            momentum: at_phi(25.0, 0.0),
            tags: vec![7],
        }
    }

    #[test]
    fn test_cone_and_threshold_cuts() {
        let candidate = lepton_at_origin();
        // pts [1, 2, 3] at delta_r ~ [0.05, 0.15, 0.4].
        let tracks = vec![
            Track {
                momentum: at_phi(1.0, 0.05),
                tags: vec![1],
            },
            Track {
                momentum: at_phi(2.0, 0.15),
                tags: vec![2],
            },
            Track {
                momentum: at_phi(3.0, 0.4),
                tags: vec![3],
            },
        ];

        let result = isolation_sum(&candidate, &tracks, 0.2, 0.0);
        assert!((result.sum_pt - 3.0).abs() < 1e-9);
        assert_eq!(result.count, 2);

        // Raising the pt threshold drops the softest track.
        let result = isolation_sum(&candidate, &tracks, 0.2, 1.5);
        assert!((result.sum_pt - 2.0).abs() < 1e-9);
        assert_eq!(result.count, 1);
    }

    #[test]
    fn test_candidate_excluded_by_identity_tag() {
        let candidate = lepton_at_origin();
        let tracks = vec![
            // The candidate's own track.
            Track {
                momentum: at_phi(25.0, 0.0),
                tags: vec![7],
            },
            Track {
                momentum: at_phi(2.0, 0.1),
                tags: vec![8],
            },
        ];
        let result = isolation_sum(&candidate, &tracks, 0.3, 0.0);
        assert!((result.sum_pt - 2.0).abs() < 1e-9);
        assert_eq!(result.count, 1);
    }

    #[test]
    fn test_towers_never_excluded() {
        let candidate = lepton_at_origin();
        // A tower exactly on the candidate still contributes: no identity.
        let towers = vec![Tower {
            momentum: at_phi(25.0, 0.0),
        }];
        let result = isolation_sum(&candidate, &towers, 0.3, 0.0);
        assert!((result.sum_pt - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_photon_candidate_vs_eflow() {
        let candidate = Photon {
            momentum: at_phi(40.0, 0.0),
            tags: vec![11],
        };
        let eflow = vec![
            EflowObject {
                momentum: at_phi(5.0, 0.1),
                tags: vec![11],
            },
            EflowObject {
                momentum: at_phi(4.0, 0.1),
                tags: vec![12],
            },
        ];
        let result = isolation_sum(&candidate, &eflow, 0.3, 0.0);
        assert!((result.sum_pt - 4.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_sum_bounded_by_total_pt(
            phis in proptest::collection::vec(-3.0f64..3.0, 0..20),
        ) {
            let candidate = lepton_at_origin();
            let tracks: Vec<Track> = phis
                .iter()
                .enumerate()
                .map(|(i, &phi)| Track {
                    momentum: at_phi(1.0 + i as f64, phi),
                    tags: vec![100 + i as u64],
                })
                .collect();
            let total: f64 = tracks.iter().map(|t| t.momentum.pt()).sum();
            let result = isolation_sum(&candidate, &tracks, 0.4, 0.0);
            prop_assert!(result.sum_pt <= total + 1e-9);
            prop_assert!(result.count as usize <= tracks.len());
        }
    }
}
