//! Turns a [`Clip`] of pre-rendered [`Note`]s into timed `NoteOn`/`NoteOff`/
//! `ProgramChange` events on the [`Bus`], honoring tempo, loop, playback
//! speed, and a play-list of staged/queued clips.
//!
//! [`Sequencer::handle_event`] is the handler passed to
//! [`crate::task::spawn`]: the task harness calls it once per loop
//! iteration with either an incoming [`Event`] or `None` on timeout, and
//! the returned wait tells the harness when the next note boundary needs
//! attention.
//!
//! Playback runs on a virtual clock derived from one wall-clock reference
//! point, `start_ms`: `playback_ms(now) = (now - start_ms) * speed_percent
//! / 100`. Pause freezes it (by remembering the instant it froze at and
//! shifting `start_ms` by the same amount on resume); a speed change
//! re-anchors `start_ms` so the virtual instant doesn't jump. Either way,
//! active notes' scheduled end times never need to be touched individually
//! — only the one offset does.

mod clip;

pub use clip::Clip;

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use crate::bus::{Bus, Event, Origin, PlayMode};
use crate::keystate::{Clock, MonotonicClock};
use crate::sequencing::{Note, MAX_POLYPHONY, STATUS_CHANNEL, TICKS_PER_QUARTER};
use crate::task::NextWait;

const DEFAULT_SPEED_PERCENT: u8 = 100;
const MIN_SPEED_PERCENT: u8 = 1;
const MAX_SPEED_PERCENT: u8 = 200;

#[derive(Debug, Clone, Copy)]
struct ActiveNote {
    note: Note,
    /// Virtual playback-ms at which this note should turn off.
    end_time_ms: u32,
}

/// Ticks-to-virtual-milliseconds conversion:
/// `ms = (ticks * 60000) / (bpm * TICKS_PER_QUARTER)`. Speed scaling is
/// applied separately, at the virtual/wall-clock boundary.
fn ticks_to_ms(ticks: u32, bpm: u8) -> u32 {
    let bpm = bpm.max(1) as u64;
    ((ticks as u64) * 60_000 / (bpm * TICKS_PER_QUARTER as u64)) as u32
}

/// The sequencer's playback state machine.
pub struct Sequencer<C: Clock = MonotonicClock> {
    bus: Arc<Bus>,
    clock: C,

    clip: Option<Clip>,
    next_note: usize,
    /// Wall-clock reference point for the virtual playback clock.
    start_ms: i64,
    /// `Some(instant)` while paused; playback is frozen at whatever virtual
    /// time it reached just before that instant.
    paused_at_ms: Option<u32>,

    active_notes: Vec<ActiveNote>,
    programs: [u8; 16],

    play_list: VecDeque<Clip>,
    looping: bool,
    speed_percent: u8,
}

impl Sequencer<MonotonicClock> {
    pub fn new(bus: Arc<Bus>) -> Self {
        Self::with_clock(bus, MonotonicClock::new())
    }
}

impl<C: Clock> Sequencer<C> {
    pub fn with_clock(bus: Arc<Bus>, clock: C) -> Self {
        Self {
            bus,
            clock,
            clip: None,
            next_note: 0,
            start_ms: 0,
            paused_at_ms: None,
            active_notes: Vec::with_capacity(MAX_POLYPHONY),
            programs: [u8::MAX; 16],
            play_list: VecDeque::new(),
            looping: false,
            speed_percent: DEFAULT_SPEED_PERCENT,
        }
    }

    /// The handler to hand to [`crate::task::spawn`].
    pub fn handle_event(&mut self, event: Option<Event>) -> NextWait {
        let now = self.clock.now_ms();
        if let Some(event) = event {
            self.process_event(event, now);
        }
        self.process_notes(now)
    }

    fn process_event(&mut self, event: Event, now: u32) {
        match event {
            Event::Play { notes, bpm, mode } => self.on_play(Clip::new(notes, bpm), mode, now),
            Event::Pause => self.pause_clip(now),
            Event::Resume => self.resume_clip(now),
            Event::Stop => self.stop_clip(),
            Event::Tempo { bpm } => {
                if let Some(clip) = &mut self.clip {
                    clip.bpm = bpm;
                }
            }
            Event::Loop { on } => self.looping = on,
            Event::Speed { percent } => self.set_speed(percent, now),
            _ => {}
        }
    }

    fn on_play(&mut self, clip: Clip, mode: PlayMode, now: u32) {
        match mode {
            PlayMode::Now => self.install_clip(clip, now),
            PlayMode::Stage => {
                self.play_list.clear();
                if self.clip.is_none() {
                    self.install_clip(clip, now);
                } else {
                    self.play_list.push_back(clip);
                }
            }
            PlayMode::Queue => {
                if self.clip.is_none() {
                    self.install_clip(clip, now);
                } else {
                    self.play_list.push_back(clip);
                }
            }
        }
    }

    /// Start a clip from tick 0: releases whatever was sounding and resets
    /// every piece of playback state to a fresh virtual clock.
    fn install_clip(&mut self, clip: Clip, now: u32) {
        self.release_active_notes();
        self.next_note = 0;
        self.start_ms = now as i64;
        self.paused_at_ms = None;
        self.clip = Some(clip);
    }

    fn playback_ms(&self, now: u32) -> Option<u32> {
        if self.paused_at_ms.is_some() {
            return None;
        }
        let elapsed = now as i64 - self.start_ms;
        Some(((elapsed.max(0) * self.speed_percent.max(1) as i64) / 100) as u32)
    }

    /// Wall-clock instant at which virtual playback reaches `virtual_ms`.
    fn wall_deadline(&self, virtual_ms: u32) -> i64 {
        self.start_ms + (virtual_ms as i64 * 100) / (self.speed_percent.max(1) as i64)
    }

    fn set_speed(&mut self, percent: u8, now: u32) {
        let new_speed = percent.clamp(MIN_SPEED_PERCENT, MAX_SPEED_PERCENT);
        if self.clip.is_some() && self.paused_at_ms.is_none() {
            // Re-anchor start_ms so playback_ms(now) is unchanged by the
            // speed swap — only the *rate* going forward changes.
            if let Some(playback_before) = self.playback_ms(now) {
                self.speed_percent = new_speed;
                self.start_ms = now as i64 - (playback_before as i64 * 100) / (new_speed as i64);
                return;
            }
        }
        self.speed_percent = new_speed;
    }

    fn pause_clip(&mut self, now: u32) {
        if self.clip.is_none() {
            return;
        }
        if self.paused_at_ms.is_none() {
            // Silence without forgetting: active notes keep their deadlines
            // so resume can bring them back exactly where they left off.
            for active in &self.active_notes {
                self.bus.publish(
                    Origin::Sequencer,
                    Event::NoteOff {
                        channel: active.note.channel,
                        midi_note: active.note.midi_note,
                    },
                );
            }
            self.paused_at_ms = Some(now);
        } else {
            // Already paused: a second PAUSE rewinds to the start.
            self.next_note = 0;
            self.active_notes.clear();
            self.start_ms = now as i64;
        }
    }

    fn resume_clip(&mut self, now: u32) {
        let Some(paused_at) = self.paused_at_ms.take() else {
            return;
        };
        if self.clip.is_none() {
            return;
        }
        self.start_ms += now.saturating_sub(paused_at) as i64;
        for active in &self.active_notes {
            self.bus.publish(
                Origin::Sequencer,
                Event::NoteOn {
                    channel: active.note.channel,
                    midi_note: active.note.midi_note,
                    velocity: active.note.velocity,
                },
            );
            self.bus.publish(Origin::Sequencer, Event::NoteStatus { note: active.note });
        }
    }

    fn stop_clip(&mut self) {
        self.release_active_notes();
        self.clip = None;
        self.next_note = 0;
        self.play_list.clear();
        self.paused_at_ms = None;
        self.bus.publish(Origin::Sequencer, Event::Idle);
    }

    fn release_active_notes(&mut self) {
        for active in self.active_notes.drain(..) {
            self.bus.publish(
                Origin::Sequencer,
                Event::NoteOff {
                    channel: active.note.channel,
                    midi_note: active.note.midi_note,
                },
            );
        }
    }

    /// Advance playback to `now`: expire notes past their deadline, start
    /// any notes whose scheduled time has arrived, and report when the
    /// next boundary needs attention.
    fn process_notes(&mut self, now: u32) -> NextWait {
        let Some(playback_ms) = self.playback_ms(now) else {
            return None;
        };
        let Some(clip) = self.clip.clone() else {
            return None;
        };

        let mut i = 0;
        while i < self.active_notes.len() {
            if self.active_notes[i].end_time_ms <= playback_ms {
                let expired = self.active_notes.swap_remove(i);
                self.bus.publish(
                    Origin::Sequencer,
                    Event::NoteOff {
                        channel: expired.note.channel,
                        midi_note: expired.note.midi_note,
                    },
                );
            } else {
                i += 1;
            }
        }

        while self.next_note < clip.notes.len() {
            let note = clip.notes[self.next_note];
            if ticks_to_ms(note.start, clip.bpm) > playback_ms {
                break;
            }

            // The status channel carries notes the UI should follow but
            // that never actually sound: surface NoteStatus only, and
            // don't touch programs, polyphony, or NoteOn/NoteOff at all.
            if note.channel == STATUS_CHANNEL {
                self.bus.publish(Origin::Sequencer, Event::NoteStatus { note });
                self.next_note += 1;
                continue;
            }

            let reuse_pos = self
                .active_notes
                .iter()
                .position(|a| a.note.channel == note.channel && a.note.midi_note == note.midi_note);

            if reuse_pos.is_none() && self.active_notes.len() >= MAX_POLYPHONY {
                let err = crate::error::EngineError::PolyphonyExceeded {
                    limit: MAX_POLYPHONY,
                    channel: note.channel,
                    midi_note: note.midi_note,
                };
                log::warn!("{err}");
                self.next_note += 1;
                continue;
            }

            // Step 5's documented order: PROGRAM_CHANGE, then the
            // reuse-slot NOTE_OFF (if retriggering), then NOTE_ON.
            let channel = note.channel as usize;
            if channel < self.programs.len() && self.programs[channel] != note.program {
                self.programs[channel] = note.program;
                self.bus.publish(
                    Origin::Sequencer,
                    Event::ProgramChange {
                        channel: note.channel,
                        program: note.program,
                    },
                );
            }

            if let Some(pos) = reuse_pos {
                let reused = self.active_notes.swap_remove(pos);
                self.bus.publish(
                    Origin::Sequencer,
                    Event::NoteOff {
                        channel: reused.note.channel,
                        midi_note: reused.note.midi_note,
                    },
                );
            }

            self.bus.publish(
                Origin::Sequencer,
                Event::NoteOn {
                    channel: note.channel,
                    midi_note: note.midi_note,
                    velocity: note.velocity,
                },
            );
            self.bus.publish(Origin::Sequencer, Event::NoteStatus { note });

            let end_time_ms = ticks_to_ms(note.start, clip.bpm) + ticks_to_ms(note.duration, clip.bpm);
            self.active_notes.push(ActiveNote { note, end_time_ms });
            self.next_note += 1;
        }

        if self.next_note >= clip.notes.len() && self.active_notes.is_empty() {
            return self.finish_clip(now);
        }

        self.next_wake(&clip, now)
    }

    fn finish_clip(&mut self, now: u32) -> NextWait {
        if self.looping {
            self.bus.publish(Origin::Sequencer, Event::LoopDone);
            let clip = self.clip.clone().expect("finish_clip called with a clip installed");
            self.install_clip(clip, now);
            return Some(Duration::from_millis(0));
        }
        if let Some(next) = self.play_list.pop_front() {
            self.install_clip(next, now);
            return Some(Duration::from_millis(0));
        }
        self.bus.publish(Origin::Sequencer, Event::PlayDone);
        self.clip = None;
        self.bus.publish(Origin::Sequencer, Event::Idle);
        None
    }

    fn next_wake(&self, clip: &Clip, now: u32) -> NextWait {
        let next_note_at = clip.notes.get(self.next_note).map(|note| ticks_to_ms(note.start, clip.bpm));
        let earliest_off = self.active_notes.iter().map(|a| a.end_time_ms).min();

        let target = match (next_note_at, earliest_off) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }?;

        let deadline = self.wall_deadline(target);
        Some(Duration::from_millis(deadline.saturating_sub(now as i64).max(0) as u64))
    }
}
