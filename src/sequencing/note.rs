/// Timing resolution used throughout the sequencer and its rendering
/// helpers: how many ticks make up one quarter note.
pub const TICKS_PER_QUARTER: u32 = 100;

/// The MIDI channel reserved for status/control purposes rather than
/// sounding notes, matching `YSW_MIDI_STATUS_CHANNEL`.
pub const STATUS_CHANNEL: u8 = 15;

/// Maximum number of distinct (channel, midi_note) pairs the sequencer
/// tracks as simultaneously active before it starts dropping the newest
/// arrivals (§3, bounded polyphony at the sequencer layer).
pub const MAX_POLYPHONY: usize = 64;

/// Maximum number of voices the wavetable synth can sound at once.
pub const MAX_VOICES: usize = 32;

/// Output sample rate produced by the synth's mixer.
pub const SAMPLE_RATE: u32 = 44_100;

/// A single rendered note: when it starts, how long it lasts, and which
/// channel/pitch/program/velocity it carries. This is the unit the
/// sequencer consumes and the unit rendering helpers (`Sequence`,
/// `Pattern`) produce.
///
/// `start` and `duration` are both in ticks at [`TICKS_PER_QUARTER`]
/// resolution, independent of tempo; the sequencer converts ticks to
/// milliseconds against the clip's current bpm as it plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    pub start: u32,
    pub duration: u32,
    pub channel: u8,
    pub midi_note: u8,
    pub velocity: u8,
    pub program: u8,
}

impl Note {
    /// Builds a note. Channel/note/velocity/program ranges are a
    /// programmer-error boundary, not a recoverable condition (§7): a note
    /// naming a channel ≥ 16 or a MIDI note/velocity/program ≥ 128 asserts
    /// rather than silently clamping, since a valid renderer never produces
    /// one.
    pub fn new(start: u32, duration: u32, channel: u8, midi_note: u8, velocity: u8, program: u8) -> Self {
        debug_assert!(channel < 16, "note channel {channel} out of range 0..16");
        debug_assert!(midi_note < 128, "midi_note {midi_note} out of range 0..128");
        debug_assert!(velocity < 128, "velocity {velocity} out of range 0..128");
        debug_assert!(program < 128, "program {program} out of range 0..128");
        Self {
            start,
            duration,
            channel,
            midi_note,
            velocity,
            program,
        }
    }
}
