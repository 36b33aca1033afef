//! Streaming parser for the HepMC2 `IO_GenEvent` ASCII format.
//!
//! The reader consumes a line-oriented text stream, dispatching each line
//! on its leading type code, and emits fully populated [`Event`]s together
//! with running sample-level statistics. A single line of lookahead is the
//! only state carried between events: event boundaries are detected by
//! reading the next event's `E` line and stashing it.
//!
//! [`Event`]: crate::event::Event

mod reader;

pub use reader::{Events, HepmcError, HepmcReader, ParseSession, ReadStatus};
