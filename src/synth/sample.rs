use std::sync::Arc;

/// Stereo placement for a sample. Matches the three-way panning the
/// original Amiga/MOD tradition supports — no continuous pan law.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pan {
    Left,
    Center,
    Right,
}

/// How a sample loops once playback reaches `loop_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopType {
    /// Play once and go silent.
    None,
    /// Loop `[loop_start, loop_end)` forever.
    Continuous,
    /// Play the whole sample once, then loop `[loop_start, loop_end)`.
    Through,
}

/// A single-cycle or multi-cycle PCM sample. `data` is reference-counted
/// rather than borrowed so a voice can hold its own handle to it for the
/// life of the note without threading a lifetime through the voice bank's
/// mutex; the provider still owns the underlying bytes and the synth never
/// mutates or copies them, only clones the `Arc`.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Mono, signed 8-bit PCM frames.
    pub data: Arc<[i8]>,
    pub loop_start: u32,
    pub loop_end: u32,
    pub loop_type: LoopType,
    /// Scaled 0..63, matching the original format's volume byte.
    pub volume: u8,
    pub pan: Pan,
    /// MIDI note the sample plays back at its original (unpitched) rate.
    pub root_key: i16,
    pub fine_tune: i16,
    pub attenuation: i16,
}

impl Sample {
    pub fn length(&self) -> u32 {
        self.data.len() as u32
    }
}

/// Resolves a `(program, midi_note)` pair to the sample that should sound.
///
/// Implementations own their sample memory and must keep every sample
/// they've returned alive for the lifetime of the synth, though in practice
/// the `Arc` handle each returned [`Sample`] carries makes that automatic.
pub trait SampleProvider: Send + Sync {
    fn get_sample(&self, program: u8, midi_note: u8) -> Option<Sample>;
}
