//! Recoverable, in-crate conditions that §7 of the design spec says to "log
//! a warning and continue" rather than propagate. Every site that used to
//! hand-format a `log::warn!` string now constructs one of these and logs
//! its `Display` impl instead, so the condition has one name wherever it's
//! raised and wherever a test wants to assert on it.
//!
//! None of these ever leave the crate as an `Err`: they're built, logged,
//! and the caller moves on. Only startup errors (failing to spawn a worker
//! thread, open an audio device) are fatal and propagate as
//! `color_eyre::eyre::Result` out of the demo binary's `main`.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("bus: queue {queue_id} overflowed delivering an event from {origin:?}")]
    QueueOverflow { origin: crate::bus::Origin, queue_id: u64 },

    #[error("sequencer: polyphony limit ({limit}) reached, dropping note (channel {channel}, note {midi_note})")]
    PolyphonyExceeded { limit: usize, channel: u8, midi_note: u8 },

    #[error("synth: no sample for program {program} note {midi_note}, skipping note-on")]
    MissingSample { program: u8, midi_note: u8 },
}
