//! Benchmarks for the mixer's per-frame cost and the sequencer's tick loop.
//!
//! Run with: cargo bench
//!
//! Reference timing at 44.1kHz:
//!   - 128 frames = 2.90ms deadline
//!   - 256 frames = 5.80ms deadline
//!   - 512 frames = 11.61ms deadline

use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use embertone::bus::{Bus, Event, PlayMode};
use embertone::keystate::Clock;
use embertone::sequencing::{Note, MAX_VOICES};
use embertone::synth::{LoopType, Pan, Sample, SampleProvider, WavetableSynth};
use embertone::{Clip, Sequencer};

const BLOCK_SIZES: &[usize] = &[128, 256, 512];

#[derive(Clone)]
struct SharedClock(Rc<Cell<u32>>);
impl Clock for SharedClock {
    fn now_ms(&self) -> u32 {
        self.0.get()
    }
}

struct SquareWave(Arc<[i8]>);
impl SquareWave {
    fn new() -> Self {
        let data: Arc<[i8]> = (0..256).map(|i| if i < 128 { 100 } else { -100 }).collect::<Vec<i8>>().into();
        Self(data)
    }
}
impl SampleProvider for SquareWave {
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

fn bench_mixer_full_polyphony(c: &mut Criterion) {
    let synth = WavetableSynth::new(Arc::new(SquareWave::new()));
    for note in 0..MAX_VOICES as u8 {
        synth.process_event(&Event::NoteOn { channel: 0, midi_note: note, velocity: 100 });
    }

    let mut group = c.benchmark_group("mixer/full_polyphony");
    for &frames in BLOCK_SIZES {
        group.bench_with_input(BenchmarkId::from_parameter(frames), &frames, |b, &frames| {
            let mut buf = vec![0i16; frames * 2];
            b.iter(|| synth.fill(&mut buf, frames));
        });
    }
    group.finish();
}

fn bench_sequencer_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("sequencer/tick");
    group.bench_function("dense_clip", |b| {
        b.iter_batched(
            || {
                let bus = Arc::new(Bus::new());
                let clock = SharedClock(Rc::new(Cell::new(0)));
                let mut sequencer = Sequencer::with_clock(bus, clock.clone());
                let notes: Vec<Note> = (0..MAX_VOICES as u32)
                    .map(|i| Note::new(i * 10, 100, 0, 60 + (i % 24) as u8, 100, 0))
                    .collect();
                sequencer.handle_event(Some(Event::play(Clip::new(notes, 120), PlayMode::Now)));
                (sequencer, clock)
            },
            |(mut sequencer, clock)| {
                for ms in (0..2000).step_by(50) {
                    clock.0.set(ms);
                    sequencer.handle_event(None);
                }
            },
            criterion::BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_mixer_full_polyphony, bench_sequencer_tick);
criterion_main!(benches);
