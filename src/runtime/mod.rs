//! Composition root: wires the [`crate::bus::Bus`], the sequencer worker
//! thread, the keystate tracker, and the wavetable synth into one runnable
//! `Workstation`, the same way the original firmware's `main.c` owned the
//! bus, spun up the sequencer and synth tasks, and subscribed the synth to
//! the bus as the one `ysw_mod_synth` singleton.
//!
//! The audio-producing half (`start_audio`) hands back a `cpal::Stream`;
//! dropping it stops output. Everything else — `play`, `pause`, `resume`,
//! `stop`, key events — is just `Bus::publish` with the right [`Event`].

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream};

use crate::bus::{Bus, Event, Origin, PlayMode};
use crate::keystate::KeyStateTracker;
use crate::sequencer::{Clip, Sequencer};
use crate::synth::{SampleProvider, WavetableSynth};
use crate::task::{self, WorkerConfig};

/// A running sequencer worker plus the bus it listens on. Dropping this
/// does not stop the worker thread (see [`crate::task::Worker`]); publish
/// [`Event::Stop`] and let the process exit, or hold the `Workstation` for
/// the program's lifetime.
pub struct Workstation {
    pub bus: Arc<Bus>,
    sequencer_worker: task::Worker,
}

impl Workstation {
    /// Build the bus and spawn the sequencer worker, subscribed to
    /// `Origin::Sequencer`.
    pub fn new() -> Self {
        let bus = Arc::new(Bus::new());
        let mut sequencer = Sequencer::new(bus.clone());
        let sequencer_worker = task::spawn(WorkerConfig::new("sequencer", move |event| {
            sequencer.handle_event(event)
        }));
        task::subscribe(&bus, &sequencer_worker, Origin::Sequencer);

        Self { bus, sequencer_worker }
    }

    /// A fresh keystate tracker; callers forward `press`/`release` calls to
    /// it and it publishes `KeyDown`/`KeyPressed`/`KeyUp` on `bus`.
    pub fn keystate_tracker(&self, scan_code_count: usize) -> KeyStateTracker {
        KeyStateTracker::new(scan_code_count)
    }

    pub fn play(&self, clip: Clip, mode: PlayMode) {
        self.bus.publish(Origin::Sequencer, Event::play(clip, mode));
    }

    pub fn pause(&self) {
        self.bus.publish(Origin::Sequencer, Event::Pause);
    }

    pub fn resume(&self) {
        self.bus.publish(Origin::Sequencer, Event::Resume);
    }

    pub fn stop(&self) {
        self.bus.publish(Origin::Sequencer, Event::Stop);
    }

    pub fn set_loop(&self, on: bool) {
        self.bus.publish(Origin::Sequencer, Event::Loop { on });
    }

    pub fn set_speed(&self, percent: u8) {
        self.bus.publish(Origin::Sequencer, Event::Speed { percent });
    }

    pub fn set_tempo(&self, bpm: u8) {
        self.bus.publish(Origin::Sequencer, Event::Tempo { bpm });
    }

    /// Build a synth subscribed to `Origin::Sequencer` (it only cares about
    /// `NoteOn`/`NoteOff`/`ProgramChange`/`Stop`) and start a `cpal` output
    /// stream that pulls mixed audio from it. The returned `Stream` must be
    /// kept alive for audio to keep playing.
    pub fn start_audio<P: SampleProvider + 'static>(&self, provider: Arc<P>) -> color_eyre::Result<Stream> {
        use color_eyre::eyre::{eyre, WrapErr};

        let synth = Arc::new(WavetableSynth::new(provider));
        let (queue, receiver) = crate::bus::channel(crate::bus::DEFAULT_QUEUE_SIZE);
        self.bus.subscribe(Origin::Sequencer, queue);

        let synth_for_worker = synth.clone();
        std::thread::Builder::new()
            .name("synth-events".into())
            .spawn(move || {
                while let Ok(event) = receiver.recv() {
                    synth_for_worker.process_event(&event);
                }
            })
            .wrap_err("failed to spawn synth event thread")?;

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;
        let channels = config.channels() as usize;
        let sample_format = config.sample_format();

        let mut mix_buf: Vec<i16> = Vec::new();
        let stream = match sample_format {
            SampleFormat::I16 => device.build_output_stream(
                &config.into(),
                move |data: &mut [i16], _| {
                    let frames = data.len() / channels;
                    mix_buf.resize(frames * 2, 0);
                    synth.fill(&mut mix_buf, frames);
                    for frame in 0..frames {
                        let (l, r) = (mix_buf[frame * 2], mix_buf[frame * 2 + 1]);
                        for ch in 0..channels {
                            data[frame * channels + ch] = if ch % 2 == 0 { l } else { r };
                        }
                    }
                },
                |err| log::error!("audio stream error: {err}"),
                None,
            ),
            other => return Err(eyre!("unsupported sample format: {other:?}")),
        }
        .wrap_err("failed to build output stream")?;

        stream.play().wrap_err("failed to start output stream")?;
        Ok(stream)
    }
}

impl Default for Workstation {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Workstation {
    fn drop(&mut self) {
        self.bus.delete_queue(&self.sequencer_worker.queue);
    }
}
