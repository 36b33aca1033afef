//! Physics-service seam: species classification helpers and PDG charge
//! lookup consumed by the truth-association engine.
//!
//! The engine only depends on the [`PhysicsService`] trait so analyses can
//! swap in their own classification rules; [`StandardPhysics`] implements
//! the standard PDG numbering-scheme conventions.

use crate::event::Event;
use crate::reco::TauDecayMode;

/// PDG ids the classifiers care about.
const PDG_ELECTRON: i64 = 11;
const PDG_MUON: i64 = 13;
const PDG_PI0: i64 = 111;

/// Species classification helpers and charge lookup.
pub trait PhysicsService {
    /// Whether the particle at `index` belongs to the initial colliding
    /// state.
    fn is_initial_state(&self, event: &Event, index: usize) -> bool;

    /// Whether `pdg_id` names a hadron containing a b quark.
    fn is_b_hadron(&self, pdg_id: i64) -> bool;

    /// Classify the decay mode of the truth tau at `index`.
    fn tau_decay_mode(&self, event: &Event, index: usize) -> TauDecayMode;

    /// Electric charge of the species in thirds of |e| (so a proton is +3
    /// and an electron -3), signed with the id.
    fn charge_thirds(&self, pdg_id: i64) -> i32;
}

/// Standard PDG numbering-scheme implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardPhysics;

impl PhysicsService for StandardPhysics {
    fn is_initial_state(&self, event: &Event, index: usize) -> bool {
        // Beam particles are the only ones with no recorded mother.
        event
            .particles
            .get(index)
            .map(|p| p.mother1.is_none() && p.mother2.is_none())
            .unwrap_or(false)
    }

    fn is_b_hadron(&self, pdg_id: i64) -> bool {
        let aid = pdg_id.abs();
        // Mesons: b in the hundreds digit; baryons: b in the thousands
        // digit. The bare quark (id 5) is not a hadron.
        (100..1000).contains(&aid) && (aid / 100) % 10 == 5
            || (1000..10000).contains(&aid) && (aid / 1000) % 10 == 5
    }

    fn tau_decay_mode(&self, event: &Event, index: usize) -> TauDecayMode {
        // Follow the tau through its same-species copies to the decaying
        // one, then classify its direct daughters.
        let mut tau = index;
        loop {
            match event
                .daughters(tau)
                .find(|&d| event.particles[d].abs_pdg() == 15)
            {
                Some(copy) => tau = copy,
                None => break,
            }
        }

        let mut charged = 0u32;
        let mut neutrals = 0u32;
        for daughter in event.daughters(tau) {
            let pdg = event.particles[daughter].abs_pdg();
            if pdg == PDG_ELECTRON {
                return TauDecayMode::Electron;
            }
            if pdg == PDG_MUON {
                return TauDecayMode::Muon;
            }
            if pdg == PDG_PI0 {
                neutrals += 1;
            } else if self.charge_thirds(pdg) != 0 {
                charged += 1;
            }
        }

        match (charged, neutrals) {
            (1, 0) => TauDecayMode::OneProng,
            (1, _) => TauDecayMode::OneProngNeutrals,
            (3, 0) => TauDecayMode::ThreeProng,
            (3, _) => TauDecayMode::ThreeProngNeutrals,
            _ => TauDecayMode::Other,
        }
    }

    fn charge_thirds(&self, pdg_id: i64) -> i32 {
        let aid = pdg_id.abs();
        let sign = if pdg_id < 0 { -1 } else { 1 };

        let magnitude = match aid {
            // Quarks: down-type -1/3, up-type +2/3.
            1..=6 => quark_thirds(aid),
            // Charged leptons.
            11 | 13 | 15 => -3,
            // Neutrinos, gauge bosons, Higgs.
            12 | 14 | 16 | 21 | 22 | 23 | 25 => 0,
            24 => 3,
            // Mesons: q1 qbar2 from the hundreds/tens digits. When the
            // leading quark is down-type the positive id carries the
            // anti-quark, flipping the sign.
            100..=999 => {
                let q1 = (aid / 100) % 10;
                let q2 = (aid / 10) % 10;
                let diff = quark_thirds(q1) - quark_thirds(q2);
                if q1 % 2 == 1 {
                    -diff
                } else {
                    diff
                }
            }
            // Baryons: sum of the three quark charges.
            1000..=9999 => {
                let q1 = (aid / 1000) % 10;
                let q2 = (aid / 100) % 10;
                let q3 = (aid / 10) % 10;
                quark_thirds(q1) + quark_thirds(q2) + quark_thirds(q3)
            }
            _ => {
                log::debug!("no charge known for PDG id {}", pdg_id);
                0
            }
        };

        sign * magnitude
    }
}

/// Charge of a bare quark in thirds of |e|.
fn quark_thirds(quark: i64) -> i32 {
    match quark {
        1 | 3 | 5 => -1,
        2 | 4 | 6 => 2,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Particle;

    fn particle(pdg_id: i64, mother1: Option<usize>) -> Particle {
        Particle {
            pdg_id,
            mother1,
            ..Default::default()
        }
    }

    #[test]
    fn test_charges() {
        let physics = StandardPhysics;
        assert_eq!(physics.charge_thirds(11), -3); // e-
        assert_eq!(physics.charge_thirds(-11), 3); // e+
        assert_eq!(physics.charge_thirds(211), 3); // pi+
        assert_eq!(physics.charge_thirds(-211), -3); // pi-
        assert_eq!(physics.charge_thirds(321), 3); // K+
        assert_eq!(physics.charge_thirds(111), 0); // pi0
        assert_eq!(physics.charge_thirds(2212), 3); // p
        assert_eq!(physics.charge_thirds(2112), 0); // n
        assert_eq!(physics.charge_thirds(521), 3); // B+
        assert_eq!(physics.charge_thirds(411), 3); // D+
        assert_eq!(physics.charge_thirds(22), 0); // photon
        assert_eq!(physics.charge_thirds(24), 3); // W+
        assert_eq!(physics.charge_thirds(-24), -3); // W-
    }

    #[test]
    fn test_b_hadrons() {
        let physics = StandardPhysics;
        assert!(physics.is_b_hadron(511)); // B0
        assert!(physics.is_b_hadron(-521)); // B-
        assert!(physics.is_b_hadron(5122)); // Lambda_b
        assert!(!physics.is_b_hadron(5)); // bare b quark
        assert!(!physics.is_b_hadron(411)); // D+
        assert!(!physics.is_b_hadron(2212)); // proton
    }

    #[test]
    fn test_initial_state() {
        let physics = StandardPhysics;
        let mut event = Event::default();
        event.particles.push(particle(2212, None));
        event.particles.push(particle(5, Some(0)));
        assert!(physics.is_initial_state(&event, 0));
        assert!(!physics.is_initial_state(&event, 1));
        assert!(!physics.is_initial_state(&event, 99));
    }

    #[test]
    fn test_tau_decay_modes() {
        let physics = StandardPhysics;

        // tau -> tau copy -> pi- pi0 nu_tau: one prong with neutrals.
        let mut event = Event::default();
        event.particles.push(particle(15, None)); // 0
        event.particles.push(particle(15, Some(0))); // 1, copy
        event.particles.push(particle(-211, Some(1))); // 2
        event.particles.push(particle(111, Some(1))); // 3
        event.particles.push(particle(16, Some(1))); // 4
        assert_eq!(
            physics.tau_decay_mode(&event, 0),
            TauDecayMode::OneProngNeutrals
        );

        // tau -> mu nu nu.
        let mut event = Event::default();
        event.particles.push(particle(15, None));
        event.particles.push(particle(13, Some(0)));
        event.particles.push(particle(14, Some(0)));
        event.particles.push(particle(16, Some(0)));
        assert_eq!(physics.tau_decay_mode(&event, 0), TauDecayMode::Muon);

        // tau -> 3 charged pions.
        let mut event = Event::default();
        event.particles.push(particle(15, None));
        for pdg in [-211, 211, -211, 16] {
            event.particles.push(particle(pdg, Some(0)));
        }
        assert_eq!(physics.tau_decay_mode(&event, 0), TauDecayMode::ThreeProng);
    }
}
