//! Tau jet tagging and promotion.
//!
//! A tau-matched jet does not stay a jet: it is removed from the jet
//! collection and reconstituted as a [`Tau`] object. Promotion collects
//! the matched indices first and rebuilds the jet vector afterwards, so
//! re-running a tagger over an already-promoted event finds nothing new.

use std::collections::BTreeSet;

use crate::event::Event;
use crate::physics::PhysicsService;
use crate::reco::{Jet, RecEvent, Tau, TauCharge};

use super::{cone_collect, is_last, prune_shared_truth, walk_to_species, MatchStrategy, TagConfig};

/// PDG id of the tau lepton.
const PDG_TAU: i64 = 15;

/// Tags jets originating from hadronic tau decays and promotes them to
/// tau objects.
///
/// Jets are preselected on track count: a hadronic tau leaves exactly 1
/// or 3 charged tracks.
pub struct TauTagger {
    config: TagConfig,
}

impl TauTagger {
    /// Build a tagger with the given configuration.
    pub fn new(config: TagConfig) -> Self {
        Self { config }
    }

    /// Run the configured strategy over one event. Matched jets are
    /// removed from `rec.jets` and appended to `rec.taus`.
    pub fn tag<P: PhysicsService>(&self, event: &Event, rec: &mut RecEvent, physics: &P) {
        let promoted = match self.config.strategy {
            MatchStrategy::TruthSeeded => self.match_truth_seeded(event, rec, physics),
            MatchStrategy::RecoSeeded => self.match_reco_seeded(event, rec),
            MatchStrategy::Hybrid => self.match_hybrid(event, rec, physics),
        };
        promote(event, rec, promoted, physics);
    }

    /// Jet indices passing the 1-or-3-track preselection.
    fn preselected(&self, jets: &[Jet]) -> Vec<usize> {
        (0..jets.len())
            .filter(|&j| jets[j].ntracks == 1 || jets[j].ntracks == 3)
            .collect()
    }

    /// Indices of the terminal, non-initial-state truth taus.
    fn truth_seeds<P: PhysicsService>(&self, event: &Event, physics: &P) -> Vec<usize> {
        (0..event.particles.len())
            .filter(|&i| {
                !physics.is_initial_state(event, i)
                    && event.particles[i].abs_pdg() == PDG_TAU
                    && is_last(event, i, |p| p.abs_pdg() == PDG_TAU)
            })
            .collect()
    }

    fn match_truth_seeded<P: PhysicsService>(
        &self,
        event: &Event,
        rec: &mut RecEvent,
        physics: &P,
    ) -> BTreeSet<usize> {
        let mut eligible = self.preselected(&rec.jets);
        let mut promoted = BTreeSet::new();

        for seed in self.truth_seeds(event, physics) {
            let matched = cone_collect(
                &event.particles[seed].momentum,
                &rec.jets,
                &eligible,
                self.config.delta_r_max,
                self.config.exclusive,
            );
            for &j in &matched.retained {
                rec.jets[j].truth = Some(seed);
                rec.jets[j].tautag = true;
                promoted.insert(j);
            }
            // Promoted jets are no longer available to later seeds;
            // evicted ones are.
            eligible.retain(|j| !matched.retained.contains(j));
        }

        promoted
    }

    /// Walk every constituent of every preselected jet back to a truth
    /// tau; matched jets get their truth back-reference set.
    fn ancestry_candidates(&self, event: &Event, rec: &mut RecEvent) -> Vec<usize> {
        let mut candidates = Vec::new();
        for i in self.preselected(&rec.jets) {
            let mut matched = None;
            for &constituent in &rec.jets[i].constituents {
                matched = walk_to_species(event, constituent, |e, idx| {
                    e.particles[idx].abs_pdg() == PDG_TAU
                });
                if matched.is_some() {
                    break;
                }
            }
            if let Some(truth) = matched {
                rec.jets[i].truth = Some(truth);
                candidates.push(i);
            }
        }
        candidates
    }

    fn match_reco_seeded(&self, event: &Event, rec: &mut RecEvent) -> BTreeSet<usize> {
        let mut candidates = self.ancestry_candidates(event, rec);
        if self.config.exclusive {
            candidates = prune_shared_truth(event, &rec.jets, candidates);
        }
        for &j in &candidates {
            rec.jets[j].tautag = true;
        }
        candidates.into_iter().collect()
    }

    fn match_hybrid<P: PhysicsService>(
        &self,
        event: &Event,
        rec: &mut RecEvent,
        physics: &P,
    ) -> BTreeSet<usize> {
        let mut pool = self.ancestry_candidates(event, rec);
        let mut promoted = BTreeSet::new();

        for seed in self.truth_seeds(event, physics) {
            let matched = cone_collect(
                &event.particles[seed].momentum,
                &rec.jets,
                &pool,
                self.config.delta_r_max,
                self.config.exclusive,
            );
            for &j in &matched.retained {
                rec.jets[j].truth = Some(seed);
                rec.jets[j].tautag = true;
                promoted.insert(j);
            }
            pool.retain(|j| !matched.touched.contains(j));
        }

        promoted
    }
}

/// Remove the matched jets from the collection and append the
/// corresponding tau objects. Rebuilds the jet vector in one pass instead
/// of erasing while iterating.
fn promote<P: PhysicsService>(
    event: &Event,
    rec: &mut RecEvent,
    promoted: BTreeSet<usize>,
    physics: &P,
) {
    if promoted.is_empty() {
        return;
    }

    for &j in &promoted {
        rec.taus.push(jet_to_tau(event, &rec.jets[j], physics));
    }

    let jets = std::mem::take(&mut rec.jets);
    rec.jets = jets
        .into_iter()
        .enumerate()
        .filter_map(|(i, jet)| (!promoted.contains(&i)).then_some(jet))
        .collect();
}

/// Reconstitute one jet as a tau object: momentum, track count and truth
/// back-reference are copied; the net charge comes from the summed PDG
/// charges of the constituents and the decay mode from the physics
/// service.
fn jet_to_tau<P: PhysicsService>(event: &Event, jet: &Jet, physics: &P) -> Tau {
    let mut thirds = 0i32;
    for &constituent in &jet.constituents {
        if let Some(particle) = event.particles.get(constituent) {
            thirds += physics.charge_thirds(particle.pdg_id);
        }
    }
    let charge = match thirds {
        3 => TauCharge::Positive,
        -3 => TauCharge::Negative,
        _ => TauCharge::Undetermined,
    };

    let decay_mode = jet
        .truth
        .map(|t| physics.tau_decay_mode(event, t))
        .unwrap_or_default();

    Tau {
        momentum: jet.momentum,
        ntracks: jet.ntracks,
        truth: jet.truth,
        charge,
        decay_mode,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Particle;
    use crate::physics::StandardPhysics;
    use crate::reco::TauDecayMode;
    use crate::tagging::tests::at;

    fn particle(pdg_id: i64, eta: f64, phi: f64, mother1: Option<usize>) -> Particle {
        Particle {
            pdg_id,
            momentum: at(eta, phi),
            mother1,
            ..Default::default()
        }
    }

    /// Beam + tau -> pi- pi+ pi- nu_tau around (0, 0).
    fn tau_event() -> Event {
        let mut event = Event::default();
        event.particles.push(particle(2212, 5.0, 0.0, None)); // 0 beam
        event.particles.push(particle(15, 0.0, 0.0, Some(0))); // 1 tau
        event.particles.push(particle(-211, 0.0, 0.02, Some(1))); // 2
        event.particles.push(particle(211, 0.0, -0.02, Some(1))); // 3
        event.particles.push(particle(-211, 0.02, 0.0, Some(1))); // 4
        event.particles.push(particle(16, 1.0, 1.0, Some(1))); // 5
        event
    }

    fn tau_jet() -> Jet {
        Jet::new(at(0.0, 0.05), 3, vec![2, 3, 4])
    }

    fn config(strategy: MatchStrategy) -> TagConfig {
        TagConfig {
            strategy,
            delta_r_max: 0.3,
            exclusive: true,
        }
    }

    #[test]
    fn test_truth_seeded_promotes_matched_jet() {
        let event = tau_event();
        let mut rec = RecEvent {
            jets: vec![tau_jet(), Jet::new(at(2.0, 2.0), 5, vec![])],
            ..Default::default()
        };
        TauTagger::new(config(MatchStrategy::TruthSeeded)).tag(&event, &mut rec, &StandardPhysics);

        assert_eq!(rec.taus.len(), 1);
        assert_eq!(rec.jets.len(), 1); // the far jet survives
        let tau = &rec.taus[0];
        assert_eq!(tau.ntracks, 3);
        assert_eq!(tau.truth, Some(1));
        assert_eq!(tau.charge, TauCharge::Negative);
        assert_eq!(tau.decay_mode, TauDecayMode::ThreeProng);
    }

    #[test]
    fn test_track_count_preselection() {
        let event = tau_event();
        // Right place, wrong track multiplicity.
        let mut rec = RecEvent {
            jets: vec![Jet::new(at(0.0, 0.05), 2, vec![2, 3, 4])],
            ..Default::default()
        };
        TauTagger::new(config(MatchStrategy::TruthSeeded)).tag(&event, &mut rec, &StandardPhysics);
        assert!(rec.taus.is_empty());
        assert_eq!(rec.jets.len(), 1);
    }

    #[test]
    fn test_promotion_is_idempotent() {
        let event = tau_event();
        let mut rec = RecEvent {
            jets: vec![tau_jet()],
            ..Default::default()
        };
        let tagger = TauTagger::new(config(MatchStrategy::TruthSeeded));
        tagger.tag(&event, &mut rec, &StandardPhysics);
        assert_eq!(rec.taus.len(), 1);
        assert!(rec.jets.is_empty());

        // Second pass: the matched jet is gone, nothing is re-promoted.
        tagger.tag(&event, &mut rec, &StandardPhysics);
        assert_eq!(rec.taus.len(), 1);
        assert!(rec.jets.is_empty());
    }

    #[test]
    fn test_net_charge_derivation() {
        let physics = StandardPhysics;
        let mut event = tau_event();

        // pi+ pi+ pi-: net +1 e.
        event.particles[2].pdg_id = 211;
        event.particles[3].pdg_id = 211;
        event.particles[4].pdg_id = -211;
        let tau = jet_to_tau(&event, &tau_jet(), &physics);
        assert_eq!(tau.charge, TauCharge::Positive);

        // pi- pi- pi+: net -1 e.
        event.particles[2].pdg_id = -211;
        event.particles[3].pdg_id = -211;
        event.particles[4].pdg_id = 211;
        let tau = jet_to_tau(&event, &tau_jet(), &physics);
        assert_eq!(tau.charge, TauCharge::Negative);

        // pi+ pi+ pi+: net +3 e, undetermined.
        event.particles[2].pdg_id = 211;
        event.particles[3].pdg_id = 211;
        event.particles[4].pdg_id = 211;
        let tau = jet_to_tau(&event, &tau_jet(), &physics);
        assert_eq!(tau.charge, TauCharge::Undetermined);
    }

    #[test]
    fn test_matched_jet_flagged_before_promotion() {
        let event = tau_event();
        let mut rec = RecEvent {
            jets: vec![tau_jet()],
            ..Default::default()
        };
        let tagger = TauTagger::new(config(MatchStrategy::TruthSeeded));
        let promoted = tagger.match_truth_seeded(&event, &mut rec, &StandardPhysics);
        assert_eq!(promoted.len(), 1);
        assert!(rec.jets[0].tautag);
    }

    #[test]
    fn test_stale_constituent_index_is_no_match() {
        let event = tau_event();
        // Constituent index beyond the particle arena: the ancestry walk
        // treats it as a dead end, not a panic.
        let mut rec = RecEvent {
            jets: vec![Jet::new(at(0.0, 0.05), 1, vec![99])],
            ..Default::default()
        };
        TauTagger::new(config(MatchStrategy::RecoSeeded)).tag(&event, &mut rec, &StandardPhysics);
        assert!(rec.taus.is_empty());
        assert_eq!(rec.jets.len(), 1);
        assert!(!rec.jets[0].tautag);
    }

    #[test]
    fn test_reco_seeded_walks_constituents() {
        let event = tau_event();
        let mut rec = RecEvent {
            // Far from the truth tau in angle: reco seeding does not care.
            jets: vec![Jet::new(at(1.0, 1.0), 1, vec![2])],
            ..Default::default()
        };
        TauTagger::new(config(MatchStrategy::RecoSeeded)).tag(&event, &mut rec, &StandardPhysics);
        assert_eq!(rec.taus.len(), 1);
        assert_eq!(rec.taus[0].truth, Some(1));
    }

    #[test]
    fn test_reco_seeded_exclusive_keeps_closer_jet() {
        let event = tau_event();
        let mut rec = RecEvent {
            jets: vec![
                Jet::new(at(0.0, 0.4), 1, vec![2]), // farther from the tau
                Jet::new(at(0.0, 0.05), 3, vec![3, 4]),
            ],
            ..Default::default()
        };
        TauTagger::new(config(MatchStrategy::RecoSeeded)).tag(&event, &mut rec, &StandardPhysics);
        assert_eq!(rec.taus.len(), 1);
        // The nearer jet was promoted; the farther one stays a plain jet.
        assert_eq!(rec.jets.len(), 1);
        assert!((rec.jets[0].momentum.phi() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_hybrid_confirms_ancestry_with_cone() {
        let event = tau_event();
        let mut rec = RecEvent {
            jets: vec![
                // Ancestry match but far outside the cone: not promoted.
                Jet::new(at(1.5, 1.5), 1, vec![2]),
                // Ancestry match inside the cone: promoted.
                Jet::new(at(0.0, 0.05), 3, vec![3, 4]),
            ],
            ..Default::default()
        };
        TauTagger::new(config(MatchStrategy::Hybrid)).tag(&event, &mut rec, &StandardPhysics);
        assert_eq!(rec.taus.len(), 1);
        assert_eq!(rec.jets.len(), 1);
        assert_eq!(rec.taus[0].truth, Some(1));
        assert_eq!(rec.taus[0].ntracks, 3);
    }
}
