//! Event bus, sequencer, and polyphonic wavetable synth for an embedded
//! music workstation.
//!
//! Four pieces compose into a playable instrument:
//! - [`bus`] — typed pub/sub over bounded per-worker queues.
//! - [`error`] — recoverable conditions that get logged rather than
//!   propagated (queue overflow, missing sample, polyphony ceiling).
//! - [`task`] — the worker harness every long-running component runs on.
//! - [`keystate`] — debounces raw key scan codes into down/repeat/up events.
//! - [`sequencing`] — melody/pattern/sequence types that render down to a
//!   flat, sorted array of [`sequencing::Note`]s.
//! - [`sequencer`] — turns a [`sequencer::Clip`] of notes into timed
//!   `NoteOn`/`NoteOff`/`ProgramChange` bus events.
//! - [`synth`] — mixes the notes the sequencer plays into 16-bit stereo PCM.
//! - [`runtime`] — the composition root wiring all of the above together.

pub mod bus;
pub mod error;
pub mod keystate;
pub mod runtime;
pub mod sequencer;
pub mod sequencing;
pub mod synth;
pub mod task;

pub use bus::{Bus, Event, Origin, PlayMode};
pub use error::EngineError;
pub use sequencer::{Clip, Sequencer};
pub use sequencing::Note;
pub use synth::{SampleProvider, WavetableSynth};

/// Tuning knobs for a running workstation instance. Most of the crate's
/// actual limits (`MAX_POLYPHONY`, `MAX_VOICES`, `SAMPLE_RATE`,
/// `TICKS_PER_QUARTER`) are compile-time constants in [`sequencing`] rather
/// than fields here, since nothing in this crate varies them per instance;
/// this struct exists for the knobs a composition root plausibly does want
/// to vary (queue depth, default playback speed).
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub queue_size: usize,
    pub default_speed_percent: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            queue_size: bus::DEFAULT_QUEUE_SIZE,
            default_speed_percent: 100,
        }
    }
}
