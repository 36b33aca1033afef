//! Truth-level event model.
//!
//! Particles live in an arena (`Event::particles`, file order preserved)
//! and refer to their mothers by index into that arena. Because a mother is
//! always parsed before its daughters, mother indices are strictly smaller
//! than the daughter's own index and the ancestry graph is acyclic by
//! construction.

use crate::momentum::FourMomentum;

/// A truth particle record.
#[derive(Debug, Clone, Default)]
pub struct Particle {
    /// Per-event barcode from the input file. Unique within one event, not
    /// necessarily contiguous.
    pub barcode: i32,

    /// PDG species id (signed).
    pub pdg_id: i64,

    /// Four-momentum in GeV (unit conversion already applied).
    pub momentum: FourMomentum,

    /// Generator status code. Status 3 marks the hard-process boundary.
    pub status: i32,

    /// Barcode of the decay vertex this particle flows into; 0 when the
    /// particle does not decay. Drives ancestry resolution.
    pub end_vertex: i32,

    /// First mother, as an index into `Event::particles`.
    pub mother1: Option<usize>,

    /// Second mother. Ancestry beyond two mothers is truncated at parse
    /// time.
    pub mother2: Option<usize>,
}

impl Particle {
    /// Unsigned PDG species id.
    pub fn abs_pdg(&self) -> i64 {
        self.pdg_id.abs()
    }
}

/// A vertex record. Only used as transient context while the reader
/// resolves ancestry; vertices are not retained in the event.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vertex {
    /// Per-event barcode.
    pub barcode: i32,
    /// Proper decay length (ctau), in the file's length unit.
    pub ctau: f64,
}

/// One fully parsed event.
#[derive(Debug, Clone, Default)]
pub struct Event {
    /// Event number from the `E` line.
    pub number: i64,

    /// Particles in file order.
    pub particles: Vec<Particle>,

    /// Event scale (Q) in GeV.
    pub scale: f64,

    /// Strong coupling at the event scale.
    pub alpha_qcd: f64,

    /// Electromagnetic coupling at the event scale.
    pub alpha_qed: f64,

    /// Signal process id.
    pub process_id: i32,

    /// Event weight. When several weights are declared only the first is
    /// retained.
    pub weight: f64,

    /// Bjorken-x of the two incoming partons, from the PDF-info line.
    pub x: (f64, f64),

    /// Factorization scale from the PDF-info line.
    pub pdf_scale: f64,

    /// PDF values x*f(x) for the two incoming partons.
    pub xpdf: (f64, f64),
}

impl Event {
    /// Iterate over the arena indices of the daughters of `index`, i.e.
    /// every particle listing `index` as a mother.
    pub fn daughters(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.particles.iter().enumerate().filter_map(move |(i, p)| {
            if p.mother1 == Some(index) || p.mother2 == Some(index) {
                Some(i)
            } else {
                None
            }
        })
    }
}

/// Sample-level state: running accumulators and header metadata that
/// outlive any single event. Owned by the caller, threaded through the
/// reader, finalized once at end of stream.
#[derive(Debug, Clone, Default)]
pub struct SampleInfo {
    /// Running cross-section sum over all cross-section lines seen.
    pub xsection_sum: f64,

    /// Running cross-section-error sum.
    pub xsection_err_sum: f64,

    /// Number of cross-section lines accumulated.
    pub nevents: u64,

    /// Names of the declared event weights, in declaration order.
    pub weight_names: Vec<String>,

    /// PDG ids of the two beam particles, from the PDF-info line.
    pub beam_pdg_id: (i64, i64),

    /// PDF set ids of the two beams.
    pub beam_pdf_id: (i32, i32),
}

/// Mean cross-section and error produced by [`SampleInfo::finalize`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleSummary {
    /// Mean cross-section over the accumulated events.
    pub xsection: f64,
    /// Mean cross-section error.
    pub xsection_error: f64,
    /// Number of events accumulated.
    pub nevents: u64,
}

impl SampleInfo {
    /// Finalize the running sums into means. Both means are 0 when no
    /// events were accumulated; the partial sums are not meaningful before
    /// this call.
    pub fn finalize(&self) -> SampleSummary {
        let (xsection, xsection_error) = if self.nevents == 0 {
            (0.0, 0.0)
        } else {
            let n = self.nevents as f64;
            (self.xsection_sum / n, self.xsection_err_sum / n)
        };
        SampleSummary {
            xsection,
            xsection_error,
            nevents: self.nevents,
        }
    }
}
