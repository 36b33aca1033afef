//! # hepmatch - HepMC Event Ingestion and Truth Matching
//!
//! `hepmatch` reads simulated particle-collision events from the HepMC2
//! `IO_GenEvent` ASCII format, reconstructs per-particle ancestry, and
//! associates externally clustered jets with the truth particles they
//! originate from (heavy-flavor and tau tagging), plus cone isolation
//! sums for lepton and photon candidates.
//!
//! ## Key Features
//!
//! - **Streaming reader**: events are parsed one at a time off a
//!   `BufRead` with a single line of lookahead; arbitrarily large inputs
//!   need constant memory.
//!
//! - **Ancestry arena**: mother links are stable indices into the
//!   per-event particle arena, acyclic by construction, with at most two
//!   mothers per particle.
//!
//! - **Unit normalization**: momenta are converted to GeV exactly once,
//!   at ingestion, from the declared energy unit.
//!
//! - **Three matching strategies**: truth-seeded ΔR matching,
//!   reco-seeded ancestry walking, and a hybrid of the two, each with
//!   configurable cone size and exclusivity.
//!
//! - **Tau promotion**: tau-matched jets become dedicated tau objects
//!   with derived net charge and decay-mode classification.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use hepmatch::hepmc::HepmcReader;
//! use hepmatch::reco::{Jet, RecEvent};
//! use hepmatch::physics::StandardPhysics;
//! use hepmatch::tagging::{BTagger, TagConfig};
//!
//! let mut reader = HepmcReader::open("events.hepmc")?;
//! let tagger = BTagger::new(TagConfig::default());
//!
//! let mut events = Vec::new();
//! for event in reader.events() {
//!     events.push(event?);
//! }
//!
//! for event in &events {
//!     // Jets come from an external clustering service.
//!     let mut rec = RecEvent::default();
//!     rec.jets.push(Jet::new(Default::default(), 2, vec![]));
//!
//!     tagger.tag(event, &mut rec, &StandardPhysics);
//! }
//!
//! let summary = reader.finalize();
//! println!("mean cross-section: {} pb", summary.xsection);
//! # Ok::<(), hepmatch::hepmc::HepmcError>(())
//! ```
//!
//! ## Architecture
//!
//! The library is organized into the following modules:
//!
//! - [`hepmc`]: streaming record parser and event builder
//! - [`event`]: truth-level event model and sample accumulators
//! - [`momentum`]: four-momentum vector type
//! - [`reco`]: reconstructed objects (jets, taus, isolation inputs)
//! - [`physics`]: species classification and PDG charge lookup
//! - [`tagging`]: truth-association engine
//! - [`isolation`]: cone isolation sums
//!
//! The reader depends on nothing else; tagging consumes a finished
//! [`event::Event`] plus externally supplied jets; isolation depends only
//! on reconstructed-object accessors. Tagging and isolation are pure per
//! event, so they can be fanned out across workers as long as events are
//! produced in file order.

// Documentation lints - enforce complete documentation for publication
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod event;
pub mod hepmc;
pub mod isolation;
pub mod momentum;
pub mod physics;
pub mod reco;
pub mod tagging;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::event::{Event, Particle, SampleInfo, SampleSummary, Vertex};
    pub use crate::hepmc::{Events, HepmcError, HepmcReader, ParseSession, ReadStatus};
    pub use crate::isolation::{isolation_sum, IsolationObject, IsolationSum};
    pub use crate::momentum::FourMomentum;
    pub use crate::physics::{PhysicsService, StandardPhysics};
    pub use crate::reco::{
        EflowObject, Jet, Lepton, Photon, RecEvent, Tau, TauCharge, TauDecayMode, Tower, Track,
    };
    pub use crate::tagging::{BTagger, MatchStrategy, TagConfig, TaggingConfig, TauTagger};
}
