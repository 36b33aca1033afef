//! Truth-association engine: tagging reconstructed jets with the truth
//! particles they originate from.
//!
//! Three interchangeable strategies exist per tag kind:
//!
//! - **truth-seeded**: seed from terminal truth particles of the target
//!   species and collect jets inside a ΔR cone;
//! - **reco-seeded**: seed from jets and walk constituent ancestry chains
//!   back to the target species;
//! - **hybrid**: reco-seeded ancestry preselection confirmed by
//!   truth-seeded cone matching.
//!
//! The strategies are thin compositions of two primitives, [`cone_collect`]
//! and [`walk_to_species`], plus the per-kind preselection rule. All are
//! deterministic given the same inputs and configuration.

mod btag;
mod tau;

pub use btag::BTagger;
pub use tau::TauTagger;

use anyhow::Context;
use log::debug;
use serde::Deserialize;
use std::path::Path;

use crate::event::{Event, Particle};
use crate::momentum::FourMomentum;
use crate::reco::Jet;

/// Matching strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStrategy {
    /// Seed from terminal truth particles, match jets by ΔR.
    TruthSeeded,
    /// Seed from jets, walk constituent ancestry to the target species.
    RecoSeeded,
    /// Reco-seeded preselection, then truth-seeded ΔR confirmation.
    Hybrid,
}

/// Configuration of one tagger.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct TagConfig {
    /// Matching strategy.
    pub strategy: MatchStrategy,

    /// Maximum angular separation between a truth particle and a jet.
    pub delta_r_max: f64,

    /// Enforce at most one tagged jet per truth particle (and vice
    /// versa), resolved by nearest ΔR.
    pub exclusive: bool,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            strategy: MatchStrategy::TruthSeeded,
            delta_r_max: 0.5,
            exclusive: true,
        }
    }
}

/// Root configuration for a tagging pass, loadable from a TOML file:
///
/// ```toml
/// [btag]
/// strategy = "reco-seeded"
/// delta_r_max = 0.5
/// exclusive = true
///
/// [tautag]
/// strategy = "hybrid"
/// delta_r_max = 0.3
/// ```
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TaggingConfig {
    /// Heavy-flavor tagger settings.
    #[serde(default)]
    pub btag: TagConfig,

    /// Tau tagger settings.
    #[serde(default)]
    pub tautag: TagConfig,
}

impl TaggingConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}

/// Jets collected around one truth particle.
pub(crate) struct ConeMatch {
    /// Jet indices retained after exclusivity resolution.
    pub retained: Vec<usize>,
    /// Every jet index that was collected at some point during the scan,
    /// including ones later evicted by a closer jet.
    pub touched: Vec<usize>,
}

/// Collect the eligible jets with ΔR(truth, jet) inside the cone.
///
/// In exclusive mode at most one jet is retained: a newly accepted jet
/// evicts the previously retained one and tightens the effective
/// threshold to its own ΔR, so the scan converges on the nearest jet.
pub(crate) fn cone_collect(
    truth: &FourMomentum,
    jets: &[Jet],
    eligible: &[usize],
    delta_r_max: f64,
    exclusive: bool,
) -> ConeMatch {
    let mut retained = Vec::new();
    let mut touched = Vec::new();
    let mut threshold = delta_r_max;

    for &j in eligible {
        let delta_r = truth.delta_r(&jets[j].momentum);
        if delta_r > threshold {
            continue;
        }
        if exclusive {
            retained.pop();
            threshold = delta_r;
        }
        retained.push(j);
        touched.push(j);
    }

    ConeMatch { retained, touched }
}

/// Walk a constituent's mother chain backward until a particle satisfying
/// `is_target` is found.
///
/// The walk stops without a match at the hard-process boundary (status 3),
/// at a particle with two distinct mothers, or when the chain runs out. A
/// missing or out-of-range ancestor is logged and treated as no match,
/// never as an error.
pub(crate) fn walk_to_species<F>(event: &Event, start: usize, is_target: F) -> Option<usize>
where
    F: Fn(&Event, usize) -> bool,
{
    let mut current = start;
    loop {
        let particle = match event.particles.get(current) {
            Some(particle) => particle,
            None => {
                debug!("ancestry walk hit a missing particle (index {})", current);
                return None;
            }
        };

        if particle.status == 3 {
            return None;
        }
        if is_target(event, current) {
            return Some(current);
        }
        // Two distinct mothers end the walk: the chain is no longer a
        // simple radiation/decay history.
        if particle.mother2.is_some() && particle.mother2 != particle.mother1 {
            return None;
        }
        match particle.mother1 {
            Some(mother) => current = mother,
            None => return None,
        }
    }
}

/// Whether the particle at `index` is the last of its kind in the decay
/// chain, i.e. no daughter satisfies `same_species`.
pub(crate) fn is_last<F>(event: &Event, index: usize, same_species: F) -> bool
where
    F: Fn(&Particle) -> bool,
{
    !event
        .particles
        .iter()
        .any(|p| p.mother1 == Some(index) && same_species(p))
}

/// Exclusivity pruning for reco-seeded matching: when several candidate
/// jets resolved to the same truth particle, keep the one with the
/// smallest ΔR to it and drop the rest. Candidate order is otherwise
/// preserved.
pub(crate) fn prune_shared_truth(
    event: &Event,
    jets: &[Jet],
    mut candidates: Vec<usize>,
) -> Vec<usize> {
    let mut i = 0;
    while i < candidates.len() {
        let truth = jets[candidates[i]].truth;
        if truth.is_none() {
            i += 1;
            continue;
        }
        let mut best = truth_delta_r(event, jets, candidates[i]);
        let mut j = i + 1;
        while j < candidates.len() {
            if jets[candidates[j]].truth == truth {
                let delta_r = truth_delta_r(event, jets, candidates[j]);
                if delta_r < best {
                    candidates.swap(i, j);
                    best = delta_r;
                }
                candidates.remove(j);
            } else {
                j += 1;
            }
        }
        i += 1;
    }
    candidates
}

/// ΔR between a jet and its matched truth particle.
fn truth_delta_r(event: &Event, jets: &[Jet], jet: usize) -> f64 {
    match jets[jet].truth {
        Some(t) => event.particles[t].momentum.delta_r(&jets[jet].momentum),
        None => f64::MAX,
    }
}
