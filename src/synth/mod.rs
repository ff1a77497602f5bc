//! Polyphonic wavetable synth: turns `NoteOn`/`NoteOff`/`ProgramChange`
//! events into a mixed stereo 16-bit PCM stream, in the Amiga/MOD tradition
//! the original firmware's `ysw_mod_synth` descended from.
//!
//! Voice state lives behind one [`std::sync::Mutex`]: the event-handling
//! side takes it only for the short critical section that allocates or
//! frees a voice, and the audio callback takes it for the duration of a
//! buffer fill. This mirrors §5's "thread per component, one lock per
//! shared block" model rather than reaching for a lock-free structure —
//! voice allocation and mixing both need a consistent view of the
//! `(channel, midi_note) -> slot` table.

pub mod sample;
pub mod voice;

pub use sample::{LoopType, Pan, Sample, SampleProvider};
pub use voice::Voice;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use crate::bus::Event;
use crate::sequencing::MAX_VOICES;

const NO_SLOT: u8 = u8::MAX;

struct VoiceBank {
    voices: Vec<Voice>,
    active_count: usize,
    /// `lookup[channel][midi_note] = slot index`, or `NO_SLOT` if none.
    lookup: [[u8; 128]; 16],
    programs: [u8; 16],
    last_left: i32,
    last_right: i32,
}

impl VoiceBank {
    fn new() -> Self {
        Self {
            voices: (0..MAX_VOICES).map(|_| Voice::silent()).collect(),
            active_count: 0,
            lookup: [[NO_SLOT; 128]; 16],
            programs: [0; 16],
            last_left: 0,
            last_right: 0,
        }
    }

    fn note_on(&mut self, channel: u8, midi_note: u8, velocity: u8, sample: Sample, time: u32) {
        let slot = if self.active_count < MAX_VOICES {
            let slot = self.active_count;
            self.active_count += 1;
            slot
        } else {
            // Steal the oldest voice (smallest `time`). The original firmware
            // had a self-assignment bug here that degenerated to "steal the
            // last voice"; this corrects it to the contract its own prose
            // and test properties actually describe.
            self.voices
                .iter()
                .enumerate()
                .min_by_key(|(_, v)| v.time)
                .map(|(i, _)| i)
                .unwrap_or(0)
        };

        let stolen = &self.voices[slot];
        if !stolen.is_free() {
            self.lookup[stolen.channel as usize][stolen.midi_note as usize] = NO_SLOT;
        }

        let length = sample.length();
        self.voices[slot] = Voice {
            data: sample.data,
            length,
            loop_start: sample.loop_start,
            loop_end: sample.loop_end,
            loop_type: sample.loop_type,
            sample_pos: 0,
            sample_inc: voice::sample_inc_for(midi_note),
            period: voice::period_for(midi_note).max(1),
            time,
            volume: velocity / 2,
            pan: sample.pan,
            channel,
            midi_note,
        };
        self.lookup[channel as usize][midi_note as usize] = slot as u8;
    }

    fn note_off(&mut self, channel: u8, midi_note: u8) {
        let slot = self.lookup[channel as usize][midi_note as usize];
        if slot == NO_SLOT {
            return;
        }
        let slot = slot as usize;
        // Stealing can have invalidated this binding already; only release
        // if the slot still actually holds this (channel, midi_note).
        let voice = &self.voices[slot];
        if voice.channel != channel || voice.midi_note != midi_note {
            return;
        }

        self.lookup[channel as usize][midi_note as usize] = NO_SLOT;
        let last = self.active_count - 1;
        if slot != last {
            self.voices.swap(slot, last);
            let moved = &self.voices[slot];
            self.lookup[moved.channel as usize][moved.midi_note as usize] = slot as u8;
        }
        self.voices[last] = Voice::silent();
        self.active_count -= 1;
    }

    fn program_change(&mut self, channel: u8, program: u8) {
        self.programs[channel as usize] = program;
    }

    fn stop_all(&mut self) {
        self.voices = (0..MAX_VOICES).map(|_| Voice::silent()).collect();
        self.active_count = 0;
        self.lookup = [[NO_SLOT; 128]; 16];
        self.last_left = 0;
        self.last_right = 0;
    }

    /// Mix one stereo output frame, advancing every active voice.
    fn mix_frame(&mut self, filter_enabled: bool, stereo_separation: bool) -> (i16, i16) {
        let mut left: i32 = 0;
        let mut right: i32 = 0;

        let mut i = 0;
        while i < self.active_count {
            if self.voices[i].period == 0 {
                i += 1;
                continue;
            }

            let silence = {
                let voice = &mut self.voices[i];
                voice.sample_pos = voice.sample_pos.wrapping_add(voice.sample_inc);

                if voice.loop_type == LoopType::None {
                    if (voice.sample_pos >> 11) >= voice.length {
                        voice.period = 0;
                        voice.sample_pos = 0;
                        voice.length = 0;
                        true
                    } else {
                        false
                    }
                } else {
                    let span = (voice.loop_end - voice.loop_start).max(1);
                    if (voice.sample_pos >> 11) >= voice.loop_end {
                        let loop_start_q11 = voice.loop_start << 11;
                        let span_q11 = span << 11;
                        voice.sample_pos = loop_start_q11 + (voice.sample_pos - loop_start_q11) % span_q11;
                    }
                    false
                }
            };

            if silence {
                i += 1;
                continue;
            }

            // Data is read with `>> 10`, not `>> 11` — an intentional
            // discrepancy carried over verbatim from the original; see the
            // bit-exactness design note. It effectively doubles the read
            // rate relative to the loop bookkeeping above.
            let voice = &self.voices[i];
            let frame_index = ((voice.sample_pos >> 10) as usize).min(voice.data.len().saturating_sub(1));
            let raw = voice.data.get(frame_index).copied().unwrap_or(0);
            let s = i32::from(raw) * i32::from(voice.volume);

            match voice.pan {
                Pan::Left => left += s,
                Pan::Right => right += s,
                Pan::Center => {
                    left += s;
                    right += s;
                }
            }

            i += 1;
        }

        let tmp_left = left;
        let tmp_right = right;

        if filter_enabled {
            left = (left + self.last_left) / 2;
            right = (right + self.last_right) / 2;
        }
        if stereo_separation {
            // Asymmetric on purpose: `right` is computed from the
            // already-updated `left`, not the pre-crosstalk value. Preserve
            // bit-for-bit; see the stereo-separation design note.
            left += right / 2;
            right += left / 2;
        }

        self.last_left = tmp_left;
        self.last_right = tmp_right;

        (left.clamp(i16::MIN as i32, i16::MAX as i32) as i16, right.clamp(i16::MIN as i32, i16::MAX as i32) as i16)
    }
}

/// Shared, lock-guarded voice state plus the monotonic allocation clock the
/// stealing policy orders on.
pub struct WavetableSynth<P: SampleProvider> {
    bank: Mutex<VoiceBank>,
    provider: Arc<P>,
    alloc_clock: AtomicU32,
    pub filter_enabled: bool,
    pub stereo_separation: bool,
}

impl<P: SampleProvider> WavetableSynth<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            bank: Mutex::new(VoiceBank::new()),
            provider,
            alloc_clock: AtomicU32::new(0),
            filter_enabled: true,
            stereo_separation: true,
        }
    }

    /// Apply one bus event. Only the variants the synth cares about have an
    /// effect; everything else (sequencer lifecycle events, key events) is
    /// ignored.
    pub fn process_event(&self, event: &Event) {
        let mut bank = self.bank.lock().expect("synth lock poisoned");
        match *event {
            Event::NoteOn { channel, midi_note, velocity } => {
                let program = bank.programs[channel as usize];
                match self.provider.get_sample(program, midi_note) {
                    Some(sample) => {
                        let time = self.alloc_clock.fetch_add(1, Ordering::Relaxed);
                        bank.note_on(channel, midi_note, velocity, sample, time);
                    }
                    None => {
                        let err = crate::error::EngineError::MissingSample { program, midi_note };
                        log::warn!("{err}");
                    }
                }
            }
            Event::NoteOff { channel, midi_note } => bank.note_off(channel, midi_note),
            Event::ProgramChange { channel, program } => bank.program_change(channel, program),
            Event::Stop => bank.stop_all(),
            _ => {}
        }
    }

    /// Mix `frames` stereo frames into `out` as interleaved `[l, r, l, r, ...]`
    /// 16-bit samples, returning the number of frames written. Matches
    /// `spec.md` §6's `AudioSink.fill(buffer, frames, sample_type)` contract
    /// for the signed-16 case; always writes every requested frame.
    pub fn fill(&self, out: &mut [i16], frames: usize) -> usize {
        debug_assert!(out.len() >= frames * 2);
        let mut bank = self.bank.lock().expect("synth lock poisoned");
        for frame in 0..frames {
            let (l, r) = bank.mix_frame(self.filter_enabled, self.stereo_separation);
            out[frame * 2] = l;
            out[frame * 2 + 1] = r;
        }
        frames
    }

    pub fn active_voice_count(&self) -> usize {
        self.bank.lock().expect("synth lock poisoned").active_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::sample::{LoopType, Pan};

    struct OneSample(Arc<[i8]>);
    impl SampleProvider for OneSample {
        fn get_sample(&self, _program: u8, _midi_note: u8) -> Option<Sample> {
            Some(Sample {
                data: self.0.clone(),
                loop_start: 0,
                loop_end: self.0.len() as u32,
                loop_type: LoopType::Continuous,
                volume: 63,
                pan: Pan::Center,
                root_key: 60,
                fine_tune: 0,
                attenuation: 0,
            })
        }
    }

    fn one_sample() -> Arc<OneSample> {
        Arc::new(OneSample(Arc::from(vec![1i8; 4096])))
    }

    #[test]
    fn note_on_allocates_a_voice_and_note_off_frees_it() {
        let synth = WavetableSynth::new(one_sample());
        synth.process_event(&Event::NoteOn { channel: 0, midi_note: 60, velocity: 100 });
        assert_eq!(synth.active_voice_count(), 1);
        synth.process_event(&Event::NoteOff { channel: 0, midi_note: 60 });
        assert_eq!(synth.active_voice_count(), 0);
    }

    #[test]
    fn stealing_picks_the_oldest_voice_not_the_last() {
        let synth = WavetableSynth::new(one_sample());
        for note in 0..MAX_VOICES as u8 {
            synth.process_event(&Event::NoteOn { channel: 0, midi_note: note, velocity: 100 });
        }
        assert_eq!(synth.active_voice_count(), MAX_VOICES);

        // One more note-on must steal slot 0 (the oldest `time`), not the
        // most-recently allocated slot.
        synth.process_event(&Event::NoteOn { channel: 1, midi_note: 0, velocity: 100 });
        assert_eq!(synth.active_voice_count(), MAX_VOICES);
        let bank = synth.bank.lock().unwrap();
        assert!(bank.lookup[0][0] == NO_SLOT, "original note 0 on channel 0 should have been stolen");
    }

    #[test]
    fn stop_clears_every_voice_and_the_filter_history() {
        let synth = WavetableSynth::new(one_sample());
        synth.process_event(&Event::NoteOn { channel: 0, midi_note: 60, velocity: 100 });
        synth.process_event(&Event::Stop);
        assert_eq!(synth.active_voice_count(), 0);
        let bank = synth.bank.lock().unwrap();
        assert_eq!(bank.last_left, 0);
        assert_eq!(bank.last_right, 0);
    }

    #[test]
    fn missing_sample_does_not_allocate_a_voice() {
        struct NoSamples;
        impl SampleProvider for NoSamples {
            fn get_sample(&self, _program: u8, _midi_note: u8) -> Option<Sample> {
                None
            }
        }
        let synth = WavetableSynth::new(Arc::new(NoSamples));
        synth.process_event(&Event::NoteOn { channel: 0, midi_note: 60, velocity: 100 });
        assert_eq!(synth.active_voice_count(), 0);
    }

    #[test]
    fn filling_a_buffer_produces_nonzero_output_for_a_sounding_voice() {
        let synth = WavetableSynth::new(one_sample());
        synth.process_event(&Event::NoteOn { channel: 0, midi_note: 60, velocity: 100 });
        let mut buf = vec![0i16; 256 * 2];
        let written = synth.fill(&mut buf, 256);
        assert_eq!(written, 256);
        assert!(buf.iter().any(|&s| s != 0));
    }

    /// A non-looping one-shot must go silent at end-of-sample and stay
    /// silent: it must not resurrect and replay from the start on a later
    /// `fill`, which every other test in this module (all `LoopType::
    /// Continuous`) can't exercise.
    #[test]
    fn one_shot_voice_goes_silent_at_end_of_sample_and_stays_silent() {
        struct OneShot(Arc<[i8]>);
        impl SampleProvider for OneShot {
            fn get_sample(&self, _program: u8, _midi_note: u8) -> Option<Sample> {
                Some(Sample {
                    data: self.0.clone(),
                    loop_start: 0,
                    loop_end: self.0.len() as u32,
                    loop_type: LoopType::None,
                    volume: 63,
                    pan: Pan::Center,
                    root_key: 60,
                    fine_tune: 0,
                    attenuation: 0,
                })
            }
        }
        let provider = Arc::new(OneShot(Arc::from(vec![100i8; 8])));
        let synth = WavetableSynth::new(provider);
        synth.process_event(&Event::NoteOn { channel: 0, midi_note: 60, velocity: 100 });

        let mut first = vec![0i16; 100 * 2];
        synth.fill(&mut first, 100);
        assert!(first.iter().any(|&s| s != 0), "voice should sound while the sample is still playing");

        let mut second = vec![1i16; 200 * 2];
        synth.fill(&mut second, 200);
        assert!(second.iter().all(|&s| s == 0), "a finished one-shot voice must stay silent, not replay from the start");
    }
}
