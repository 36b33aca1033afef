//! Streaming HepMC event reader.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{error, warn};

use crate::event::{Event, Particle, SampleInfo, SampleSummary, Vertex};

/// Terminator token closing an event listing.
const END_OF_LISTING: &str = "HepMC::IO_GenEvent-END_EVENT_LISTING";

/// Errors that can occur while reading a HepMC stream.
#[derive(Debug, thiserror::Error)]
pub enum HepmcError {
    /// Underlying stream failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// End of stream reached with no event in progress. When returned by
    /// `read_header` the stream contained no event at all; when returned by
    /// `read_event` the previous event was the last one.
    #[error("no event available in stream")]
    NoEvent,

    /// A weight-name declaration with a negative count. Unrecoverable for
    /// this source.
    #[error("invalid declared weight count: {0}")]
    WeightCount(i64),
}

/// Outcome of a successful [`HepmcReader::read_event`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// The next event's boundary line was seen and buffered; more events
    /// follow.
    More,
    /// The stream is exhausted (or the listing was terminated); this event
    /// was the last one.
    Done,
}

/// Per-stream parse state: warn-once flags and tallies of the non-fatal
/// conditions encountered. Reset whenever a new source begins
/// (`read_header`).
#[derive(Debug, Clone, Default)]
pub struct ParseSession {
    mother_warned: bool,
    heavy_ion_warned: bool,

    /// Non-fatal parse errors (unrecognized unit tokens, malformed fields
    /// diagnosed explicitly).
    pub soft_errors: u64,

    /// Warnings emitted (unknown line codes, multi-weight declarations,
    /// truncated ancestry, heavy-ion blocks).
    pub warnings: u64,
}

impl ParseSession {
    fn reset(&mut self) {
        *self = ParseSession::default();
    }

    fn soft_error(&mut self, message: std::fmt::Arguments<'_>) {
        error!("{}", message);
        self.soft_errors += 1;
    }
}

/// Whitespace-separated field cursor over one line.
///
/// Missing or malformed fields yield the type's default, mirroring the
/// format's forward-progress philosophy: a bad token never aborts the
/// line.
struct Fields<'a> {
    tokens: std::str::SplitWhitespace<'a>,
}

impl<'a> Fields<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            tokens: line.split_whitespace(),
        }
    }

    fn next_str(&mut self) -> &'a str {
        self.tokens.next().unwrap_or("")
    }

    // Count fields are untrusted: both loops stop at end of line, so an
    // absurd declared count cannot spin or allocate past the tokens that
    // actually exist.
    fn skip(&mut self, n: usize) {
        for _ in 0..n {
            if self.tokens.next().is_none() {
                break;
            }
        }
    }

    fn take(&mut self, n: usize) -> Vec<String> {
        self.tokens.by_ref().take(n).map(str::to_owned).collect()
    }

    fn next_f64(&mut self) -> f64 {
        self.tokens.next().and_then(|t| t.parse().ok()).unwrap_or(0.0)
    }

    fn next_i64(&mut self) -> i64 {
        self.tokens.next().and_then(|t| t.parse().ok()).unwrap_or(0)
    }

    fn next_i32(&mut self) -> i32 {
        self.tokens.next().and_then(|t| t.parse().ok()).unwrap_or(0)
    }
}

/// Whether a fill function consumed the line or hit the listing
/// terminator.
enum LineOutcome {
    Consumed,
    EndOfListing,
}

/// Streaming reader over one HepMC ASCII source.
///
/// Call [`read_header`](Self::read_header) once, then
/// [`read_event`](Self::read_event) until it reports
/// [`ReadStatus::Done`] (or use [`events`](Self::events)). Sample-level
/// accumulators persist across events and are finalized with
/// [`finalize`](Self::finalize).
pub struct HepmcReader<R: BufRead> {
    reader: R,
    saved_line: Option<String>,
    energy_unit: f64,
    length_unit: f64,
    current_vertex: Vertex,
    session: ParseSession,
    sample: SampleInfo,
}

impl HepmcReader<BufReader<File>> {
    /// Open a HepMC file and prime the header (everything before the first
    /// event boundary is discarded).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, HepmcError> {
        let file = File::open(path.as_ref())?;
        let reader = BufReader::with_capacity(64 * 1024, file);
        let mut hepmc = Self::new(reader);
        hepmc.read_header()?;
        Ok(hepmc)
    }
}

impl<R: BufRead> HepmcReader<R> {
    /// Wrap an arbitrary buffered reader. `read_header` must be called
    /// before the first `read_event`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            saved_line: None,
            energy_unit: 1.0,
            length_unit: 1.0,
            current_vertex: Vertex::default(),
            session: ParseSession::default(),
            sample: SampleInfo::default(),
        }
    }

    /// Sample-level accumulators and header metadata gathered so far.
    pub fn sample(&self) -> &SampleInfo {
        &self.sample
    }

    /// Parse-session tallies for the current source.
    pub fn session(&self) -> &ParseSession {
        &self.session
    }

    /// Mean cross-section and error over the accumulated events.
    pub fn finalize(&self) -> SampleSummary {
        self.sample.finalize()
    }

    /// Skip lines until the first event boundary and stash it as
    /// lookahead. Resets the lookahead buffer, the per-stream session
    /// state and the sample accumulators, so a reader may be pointed at a
    /// second listing concatenated onto the same stream.
    pub fn read_header(&mut self) -> Result<(), HepmcError> {
        self.saved_line = None;
        self.session.reset();
        self.sample = SampleInfo::default();
        self.energy_unit = 1.0;
        self.length_unit = 1.0;
        self.current_vertex = Vertex::default();

        loop {
            let line = self.read_line()?.ok_or(HepmcError::NoEvent)?;
            if line.split_whitespace().next() == Some("E") {
                self.saved_line = Some(line);
                return Ok(());
            }
        }
    }

    /// Read the next event.
    ///
    /// Returns the event together with a [`ReadStatus`] telling whether
    /// more events follow. End of stream with no event in progress is
    /// [`HepmcError::NoEvent`].
    pub fn read_event(&mut self) -> Result<(Event, ReadStatus), HepmcError> {
        let mut event = Event::default();
        let mut ongoing = false;

        // Replay the buffered boundary line, if any.
        if let Some(line) = self.saved_line.take() {
            self.fill_event(&line, &mut event)?;
            ongoing = true;
        }

        loop {
            let line = match self.read_line()? {
                Some(line) => line,
                None => {
                    return if ongoing {
                        Ok((event, ReadStatus::Done))
                    } else {
                        Err(HepmcError::NoEvent)
                    };
                }
            };

            // A new boundary while an event is in progress ends the
            // current event; the line is kept for the next call.
            if ongoing && line.split_whitespace().next() == Some("E") {
                self.saved_line = Some(line);
                return Ok((event, ReadStatus::More));
            }

            match self.fill_event(&line, &mut event)? {
                LineOutcome::Consumed => ongoing = true,
                LineOutcome::EndOfListing => {
                    return if ongoing {
                        Ok((event, ReadStatus::Done))
                    } else {
                        Err(HepmcError::NoEvent)
                    };
                }
            }
        }
    }

    /// Iterator over the remaining events of this source.
    pub fn events(&mut self) -> Events<'_, R> {
        Events {
            reader: self,
            done: false,
        }
    }

    /// Next non-empty line, or `None` at end of stream.
    fn read_line(&mut self) -> Result<Option<String>, HepmcError> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            if !line.trim().is_empty() {
                line.truncate(line.trim_end().len());
                return Ok(Some(std::mem::take(&mut line)));
            }
        }
    }

    /// Dispatch one line on its leading type code.
    fn fill_event(&mut self, line: &str, event: &mut Event) -> Result<LineOutcome, HepmcError> {
        let code = line.split_whitespace().next().unwrap_or("");
        match code {
            "E" => self.fill_event_info(line, event),
            "N" => self.fill_weight_names(line)?,
            "U" => self.fill_units(line),
            "C" => self.fill_xsection(line),
            "H" => self.fill_heavy_ions(),
            "F" => self.fill_pdf_info(line, event),
            "V" => self.fill_vertex(line),
            "P" => self.fill_particle(line, event),
            END_OF_LISTING => return Ok(LineOutcome::EndOfListing),
            other => {
                warn!("unknown HepMC line code {:?}, line skipped", other);
                self.session.warnings += 1;
            }
        }
        Ok(LineOutcome::Consumed)
    }

    /// `E` line: event-level scalars. Only the first value of the weight
    /// list is retained.
    fn fill_event_info(&mut self, line: &str, event: &mut Event) {
        let mut fields = Fields::new(line);
        fields.skip(1); // line code
        event.number = fields.next_i64();
        fields.skip(1); // number of multi-parton interactions
        event.scale = fields.next_f64();
        event.alpha_qcd = fields.next_f64();
        event.alpha_qed = fields.next_f64();
        event.process_id = fields.next_i32();
        // Signal-vertex barcode, vertex count, beam barcodes.
        fields.skip(4);

        let n_random = fields.next_i64().max(0);
        fields.skip(n_random as usize);

        let n_weights = fields.next_i64();
        if n_weights > 0 {
            event.weight = fields.next_f64();
            fields.skip(n_weights as usize - 1);
        }
    }

    /// `N` line: declared weight names. A negative count is unrecoverable;
    /// two or more weights are accepted with a warning.
    fn fill_weight_names(&mut self, line: &str) -> Result<(), HepmcError> {
        let mut fields = Fields::new(line);
        fields.skip(1);
        let count = fields.next_i64();
        if count < 0 {
            error!("invalid declared weight count: {}", count);
            return Err(HepmcError::WeightCount(count));
        }
        if count >= 2 {
            warn!(
                "{} event weights declared, only the first will be used",
                count
            );
            self.session.warnings += 1;
        }

        self.sample.weight_names = fields.take(count as usize);
        Ok(())
    }

    /// `U` line: active unit conversion factors. Unknown tokens are
    /// recorded and otherwise ignored.
    fn fill_units(&mut self, line: &str) {
        let mut fields = Fields::new(line);
        fields.skip(1);

        match fields.next_str() {
            "GEV" => self.energy_unit = 1.0,
            "MEV" => self.energy_unit = 1e-3,
            "KEV" => self.energy_unit = 1e-6,
            other => self
                .session
                .soft_error(format_args!("unknown energy unit {:?}", other)),
        }

        match fields.next_str() {
            "MM" => self.length_unit = 1.0,
            "CM" => self.length_unit = 0.1,
            other => self
                .session
                .soft_error(format_args!("unknown length unit {:?}", other)),
        }
    }

    /// `C` line: accumulate cross-section and error into the sample sums.
    fn fill_xsection(&mut self, line: &str) {
        let mut fields = Fields::new(line);
        fields.skip(1);
        self.sample.nevents += 1;
        self.sample.xsection_sum += fields.next_f64();
        self.sample.xsection_err_sum += fields.next_f64();
    }

    /// `H` line: heavy-ion blocks are not supported; warn once per stream.
    fn fill_heavy_ions(&mut self) {
        if !self.session.heavy_ion_warned {
            warn!("heavy-ion block is not supported and will be ignored");
            self.session.heavy_ion_warned = true;
            self.session.warnings += 1;
        }
    }

    /// `F` line: beam/PDF identifiers into the sample, kinematic PDF info
    /// into the event.
    fn fill_pdf_info(&mut self, line: &str, event: &mut Event) {
        let mut fields = Fields::new(line);
        fields.skip(1);
        self.sample.beam_pdg_id = (fields.next_i64(), fields.next_i64());
        self.sample.beam_pdf_id = (fields.next_i32(), fields.next_i32());
        event.x = (fields.next_f64(), fields.next_f64());
        event.pdf_scale = fields.next_f64();
        event.xpdf = (fields.next_f64(), fields.next_f64());
    }

    /// `V` line: barcode and ctau become the current-vertex context for
    /// the particle lines that follow.
    fn fill_vertex(&mut self, line: &str) {
        let mut fields = Fields::new(line);
        fields.skip(1);
        self.current_vertex.barcode = fields.next_i32();
        fields.skip(4); // id, x, y, z
        self.current_vertex.ctau = fields.next_f64();
    }

    /// `P` line: allocate a particle, normalize its momentum with the
    /// active energy unit and resolve its ancestry against all prior
    /// particles of the event.
    fn fill_particle(&mut self, line: &str, event: &mut Event) {
        let mut fields = Fields::new(line);
        fields.skip(1);

        let mut particle = Particle {
            barcode: fields.next_i32(),
            pdg_id: fields.next_i64(),
            ..Default::default()
        };
        particle.momentum.px = fields.next_f64() * self.energy_unit;
        particle.momentum.py = fields.next_f64() * self.energy_unit;
        particle.momentum.pz = fields.next_f64() * self.energy_unit;
        particle.momentum.e = fields.next_f64() * self.energy_unit;
        fields.skip(1); // generated mass
        particle.status = fields.next_i32();
        fields.skip(2); // polarization theta, phi
        particle.end_vertex = fields.next_i32();

        self.set_mothers(&mut particle, event);
        event.particles.push(particle);
    }

    /// Scan all prior particles of the event for those decaying at the
    /// current vertex. The first two matches become mother1/mother2; any
    /// further match warns once per stream and is dropped.
    fn set_mothers(&mut self, particle: &mut Particle, event: &Event) {
        let mut n_mothers = 0usize;
        for (i, prior) in event.particles.iter().enumerate() {
            if prior.end_vertex != self.current_vertex.barcode {
                continue;
            }
            n_mothers += 1;
            match n_mothers {
                1 => particle.mother1 = Some(i),
                2 => particle.mother2 = Some(i),
                _ => {
                    if !self.session.mother_warned {
                        warn!(
                            "particle has more than 2 mothers ({}), ancestry truncated",
                            n_mothers
                        );
                        self.session.mother_warned = true;
                        self.session.warnings += 1;
                    }
                }
            }
        }
    }
}

/// Iterator over the events of a source. Yields `Err` once on a hard
/// parse error, then stops.
pub struct Events<'a, R: BufRead> {
    reader: &'a mut HepmcReader<R>,
    done: bool,
}

impl<R: BufRead> Iterator for Events<'_, R> {
    type Item = Result<Event, HepmcError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_event() {
            Ok((event, ReadStatus::More)) => Some(Ok(event)),
            Ok((event, ReadStatus::Done)) => {
                self.done = true;
                Some(Ok(event))
            }
            Err(HepmcError::NoEvent) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
