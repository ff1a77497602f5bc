//! End-to-end regression test: a `Sequencer` driving a `WavetableSynth`
//! through a real `Bus`, the same composition the demo binary wires up,
//! minus the audio device.

use std::cell::Cell;
use std::sync::Arc;
use std::time::Duration;

use embertone::bus::{channel, Bus, Event, Origin, PlayMode};
use embertone::keystate::Clock;
use embertone::sequencing::Note;
use embertone::synth::{LoopType, Pan, Sample, SampleProvider, WavetableSynth};
use embertone::{Clip, Sequencer};

struct FakeClock(Cell<u32>);
impl Clock for &FakeClock {
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

#[test]
fn sequencer_note_on_reaches_the_synth_as_a_sounding_voice() {
    let bus = Arc::new(Bus::new());
    let synth = WavetableSynth::new(Arc::new(SquareWave::new()));

    let (synth_queue, synth_rx) = channel(32);
    bus.subscribe(Origin::Sequencer, synth_queue);

    let clock = FakeClock(Cell::new(0));
    let mut sequencer = Sequencer::with_clock(bus.clone(), &clock);

    let clip = Clip::new(vec![Note::new(0, 200, 0, 60, 100, 0)], 60);
    sequencer.handle_event(Some(Event::play(clip, PlayMode::Now)));

    // Drain the bus and feed everything to the synth, as the event thread
    // in `Workstation::start_audio` would.
    while let Ok(event) = synth_rx.recv_timeout(Duration::from_millis(5)) {
        synth.process_event(&event);
    }
    assert_eq!(synth.active_voice_count(), 1);

    let mut buf = vec![0i16; 64 * 2];
    let written = synth.fill(&mut buf, 64);
    assert_eq!(written, 64);
    assert!(buf.iter().any(|&s| s != 0), "synth should have produced audible signal");

    clock.0.set(2000); // well past the note's 2000ms duration at bpm60
    sequencer.handle_event(None);
    while let Ok(event) = synth_rx.recv_timeout(Duration::from_millis(5)) {
        synth.process_event(&event);
    }
    assert_eq!(synth.active_voice_count(), 0);
}

#[test]
fn stop_event_silences_every_voice_through_the_bus() {
    let bus = Arc::new(Bus::new());
    let synth = WavetableSynth::new(Arc::new(SquareWave::new()));
    let (synth_queue, synth_rx) = channel(32);
    bus.subscribe(Origin::Sequencer, synth_queue);

    let clock = FakeClock(Cell::new(0));
    let mut sequencer = Sequencer::with_clock(bus.clone(), &clock);
    let clip = Clip::new(vec![Note::new(0, 10_000, 0, 60, 100, 0)], 60);
    sequencer.handle_event(Some(Event::play(clip, PlayMode::Now)));
    while let Ok(event) = synth_rx.recv_timeout(Duration::from_millis(5)) {
        synth.process_event(&event);
    }
    assert_eq!(synth.active_voice_count(), 1);

    sequencer.handle_event(Some(Event::Stop));
    while let Ok(event) = synth_rx.recv_timeout(Duration::from_millis(5)) {
        synth.process_event(&event);
    }
    assert_eq!(synth.active_voice_count(), 0);
}
