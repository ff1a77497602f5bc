//! A procedural [`SampleProvider`] so the demo binary needs no bundled PCM
//! assets: every program renders a short decaying square-ish wave at the
//! sample's own root key, which the synth then re-pitches per note the
//! usual wavetable way.

use std::sync::{Arc, Mutex as StdMutex};

use embertone::synth::{LoopType, Pan, Sample, SampleProvider};

const ROOT_KEY: i16 = 60;
const WAVE_FRAMES: usize = 512;

/// One waveform per program, generated lazily and cached so repeated
/// note-ons don't re-synthesize it.
pub struct ProceduralSamples {
    cache: StdMutex<Vec<Option<Arc<[i8]>>>>,
}

impl ProceduralSamples {
    pub fn new() -> Self {
        Self {
            cache: StdMutex::new(vec![None; 128]),
        }
    }

    fn waveform_for(&self, program: u8) -> Arc<[i8]> {
        let mut cache = self.cache.lock().expect("sample cache poisoned");
        let slot = &mut cache[program as usize];
        if let Some(data) = slot {
            return data.clone();
        }

        // Each program gets a different duty cycle, giving a handful of
        // audibly distinct timbres without any bundled assets.
        let duty = 0.15 + 0.6 * (f64::from(program) / 127.0);
        let data: Arc<[i8]> = (0..WAVE_FRAMES)
            .map(|i| {
                let phase = i as f64 / WAVE_FRAMES as f64;
                if phase < duty {
                    100
                } else {
                    -100
                }
            })
            .collect::<Vec<i8>>()
            .into();

        *slot = Some(data.clone());
        data
    }
}

impl Default for ProceduralSamples {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleProvider for ProceduralSamples {
    fn get_sample(&self, program: u8, _midi_note: u8) -> Option<Sample> {
        let data = self.waveform_for(program);
        Some(Sample {
            loop_start: 0,
            loop_end: data.len() as u32,
            data,
            loop_type: LoopType::Continuous,
            volume: 50,
            pan: Pan::Center,
            root_key: ROOT_KEY,
            fine_tune: 0,
            attenuation: 0,
        })
    }
}
