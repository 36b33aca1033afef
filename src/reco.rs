//! Reconstructed-object model: jets, taus, leptons, photons and the
//! detector-level objects isolation sums run over.
//!
//! Jets are produced by an external clustering service and refer to their
//! constituents by index into the truth-particle arena of the event they
//! were clustered from.

use crate::momentum::FourMomentum;

/// A reconstructed jet.
#[derive(Debug, Clone, Default)]
pub struct Jet {
    /// Jet four-momentum in GeV.
    pub momentum: FourMomentum,

    /// Number of charged tracks associated with the jet.
    pub ntracks: u32,

    /// Constituent truth particles, as indices into
    /// [`Event::particles`](crate::event::Event::particles).
    pub constituents: Vec<usize>,

    /// Matched truth particle, set by the truth-association engine.
    pub truth: Option<usize>,

    /// Heavy-flavor tag.
    pub btag: bool,

    /// Tau tag, set when a tau match is found. The matched jet is
    /// subsequently promoted out of the jet collection.
    pub tautag: bool,
}

impl Jet {
    /// Construct an untagged jet.
    pub fn new(momentum: FourMomentum, ntracks: u32, constituents: Vec<usize>) -> Self {
        Self {
            momentum,
            ntracks,
            constituents,
            truth: None,
            btag: false,
            tautag: false,
        }
    }
}

/// Net charge of a promoted tau, derived from the summed PDG charge of
/// the jet constituents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TauCharge {
    /// Constituent charges summed to +1 e.
    Positive,
    /// Constituent charges summed to -1 e.
    Negative,
    /// Constituent charges did not sum to +/-1 e.
    #[default]
    Undetermined,
}

/// Hadronic tau decay-mode classes, assigned by the physics service from
/// the matched truth tau's decay products.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TauDecayMode {
    /// tau -> e nu nu (leptonic, usually not reconstructed as a jet).
    Electron,
    /// tau -> mu nu nu.
    Muon,
    /// Single charged hadron, no neutral pions.
    OneProng,
    /// Single charged hadron plus neutral pions.
    OneProngNeutrals,
    /// Three charged hadrons, no neutral pions.
    ThreeProng,
    /// Three charged hadrons plus neutral pions.
    ThreeProngNeutrals,
    /// Anything else, or an unresolvable decay chain.
    #[default]
    Other,
}

/// A tau object promoted from a tau-tagged jet.
#[derive(Debug, Clone, Default)]
pub struct Tau {
    /// Momentum copied from the promoted jet.
    pub momentum: FourMomentum,

    /// Track count copied from the promoted jet.
    pub ntracks: u32,

    /// Matched truth tau.
    pub truth: Option<usize>,

    /// Net charge from the constituent PDG charges.
    pub charge: TauCharge,

    /// Decay-mode classification of the matched truth tau.
    pub decay_mode: TauDecayMode,
}

/// A reconstructed lepton candidate for isolation studies.
#[derive(Debug, Clone, Default)]
pub struct Lepton {
    /// Lepton four-momentum.
    pub momentum: FourMomentum,
    /// Detector-level identity tags (one per detector object the lepton
    /// was built from).
    pub tags: Vec<u64>,
}

/// A reconstructed photon candidate for isolation studies.
#[derive(Debug, Clone, Default)]
pub struct Photon {
    /// Photon four-momentum.
    pub momentum: FourMomentum,
    /// Detector-level identity tags.
    pub tags: Vec<u64>,
}

/// A charged track.
#[derive(Debug, Clone, Default)]
pub struct Track {
    /// Track four-momentum.
    pub momentum: FourMomentum,
    /// Detector-level identity tags.
    pub tags: Vec<u64>,
}

/// A calorimeter tower. Towers carry no detector-level identity, so a
/// candidate is never excluded from a tower sum.
#[derive(Debug, Clone, Default)]
pub struct Tower {
    /// Tower four-momentum.
    pub momentum: FourMomentum,
}

/// A generic particle-flow object.
#[derive(Debug, Clone, Default)]
pub struct EflowObject {
    /// Object four-momentum.
    pub momentum: FourMomentum,
    /// Detector-level identity tags.
    pub tags: Vec<u64>,
}

/// Reconstructed view of one event: the jet collection handed in by the
/// clustering service plus the tau objects promoted out of it.
#[derive(Debug, Clone, Default)]
pub struct RecEvent {
    /// Plain jets. Tau promotion removes jets from this collection.
    pub jets: Vec<Jet>,
    /// Promoted tau objects.
    pub taus: Vec<Tau>,
    /// Reconstructed lepton candidates.
    pub leptons: Vec<Lepton>,
    /// Reconstructed photon candidates.
    pub photons: Vec<Photon>,
    /// Charged tracks.
    pub tracks: Vec<Track>,
    /// Calorimeter towers.
    pub towers: Vec<Tower>,
    /// Particle-flow objects.
    pub eflow: Vec<EflowObject>,
}
