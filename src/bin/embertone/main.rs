//! embertone - terminal demo of the bus/sequencer/synth stack.
//!
//! Run with: cargo run --bin embertone

mod sample_provider;
mod ui;

use std::sync::Arc;
use std::time::Duration;

use embertone::sequencing::Pattern;
use embertone::{pattern, Clip, PlayMode};

use sample_provider::ProceduralSamples;
use ui::{Transport, UiApp};

const PPQ: u32 = 480;
const CHANNEL: u8 = 0;
const BPM: u8 = 120;

fn demo_clip(program: u8) -> Clip {
    let arpeggio: Pattern = pattern!(4/4 => [C4, E4, G4, C5]);
    let notes = arpeggio.repeat(4).to_notes(PPQ, CHANNEL, program);
    Clip::new(notes, BPM)
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let workstation = embertone::runtime::Workstation::new();
    let provider = Arc::new(ProceduralSamples::new());
    let _stream = workstation.start_audio(provider)?;

    workstation.play(demo_clip(0), PlayMode::Now);
    workstation.set_loop(true);

    let mut terminal = ratatui::init();
    let mut app = UiApp::new(Transport { bpm: BPM, speed_percent: 100, looping: true, playing: true });
    let result = app.run(&mut terminal, &workstation);
    ratatui::restore();

    workstation.stop();
    std::thread::sleep(Duration::from_millis(20));

    result
}
