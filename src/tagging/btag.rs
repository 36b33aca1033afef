//! Heavy-flavor (b) jet tagging.

use crate::event::Event;
use crate::physics::PhysicsService;
use crate::reco::RecEvent;

use super::{cone_collect, is_last, prune_shared_truth, walk_to_species, MatchStrategy, TagConfig};

/// PDG id of the b quark.
const PDG_B: i64 = 5;

/// Tags jets originating from b quarks.
///
/// Truth seeds are terminal b quarks (the last copy before
/// hadronization); ancestry walks target terminal b hadrons. There is no
/// jet preselection for heavy flavor.
pub struct BTagger {
    config: TagConfig,
}

impl BTagger {
    /// Build a tagger with the given configuration.
    pub fn new(config: TagConfig) -> Self {
        Self { config }
    }

    /// Run the configured strategy over one event, setting the `btag`
    /// flag (and, for ancestry-based strategies, the truth back-reference)
    /// on matched jets.
    pub fn tag<P: PhysicsService>(&self, event: &Event, rec: &mut RecEvent, physics: &P) {
        match self.config.strategy {
            MatchStrategy::TruthSeeded => self.tag_truth_seeded(event, rec, physics),
            MatchStrategy::RecoSeeded => self.tag_reco_seeded(event, rec, physics),
            MatchStrategy::Hybrid => self.tag_hybrid(event, rec, physics),
        }
    }

    /// Indices of the terminal, non-initial-state b quarks.
    fn truth_seeds<P: PhysicsService>(&self, event: &Event, physics: &P) -> Vec<usize> {
        (0..event.particles.len())
            .filter(|&i| {
                !physics.is_initial_state(event, i)
                    && event.particles[i].abs_pdg() == PDG_B
                    && is_last(event, i, |p| p.abs_pdg() == PDG_B)
            })
            .collect()
    }

    fn tag_truth_seeded<P: PhysicsService>(&self, event: &Event, rec: &mut RecEvent, physics: &P) {
        let eligible: Vec<usize> = (0..rec.jets.len()).collect();
        for seed in self.truth_seeds(event, physics) {
            let matched = cone_collect(
                &event.particles[seed].momentum,
                &rec.jets,
                &eligible,
                self.config.delta_r_max,
                self.config.exclusive,
            );
            for &j in &matched.retained {
                rec.jets[j].btag = true;
            }
        }
    }

    /// Walk every constituent of every jet back to a terminal b hadron;
    /// matched jets get their truth back-reference set.
    fn ancestry_candidates<P: PhysicsService>(
        &self,
        event: &Event,
        rec: &mut RecEvent,
        physics: &P,
    ) -> Vec<usize> {
        let mut candidates = Vec::new();
        for i in 0..rec.jets.len() {
            let mut matched = None;
            for &constituent in &rec.jets[i].constituents {
                matched = walk_to_species(event, constituent, |e, idx| {
                    physics.is_b_hadron(e.particles[idx].pdg_id)
                        && is_last(e, idx, |p| physics.is_b_hadron(p.pdg_id))
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

    fn tag_reco_seeded<P: PhysicsService>(&self, event: &Event, rec: &mut RecEvent, physics: &P) {
        let mut candidates = self.ancestry_candidates(event, rec, physics);
        if self.config.exclusive {
            candidates = prune_shared_truth(event, &rec.jets, candidates);
        }
        for &j in &candidates {
            rec.jets[j].btag = true;
        }
    }

    fn tag_hybrid<P: PhysicsService>(&self, event: &Event, rec: &mut RecEvent, physics: &P) {
        let mut pool = self.ancestry_candidates(event, rec, physics);
        for seed in self.truth_seeds(event, physics) {
            let matched = cone_collect(
                &event.particles[seed].momentum,
                &rec.jets,
                &pool,
                self.config.delta_r_max,
                self.config.exclusive,
            );
            for &j in &matched.retained {
                rec.jets[j].btag = true;
            }
            // Collected jets leave the pool, evicted ones included.
            pool.retain(|j| !matched.touched.contains(j));
        }
    }
}
