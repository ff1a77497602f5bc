/*
Pattern API
===========

A higher-level API for creating musical sequences. Patterns represent a single
cycle (usually one bar) of music where timing is implicit based on position.

The key insight: in most music, notes divide time equally. A 4/4 bar with 4 notes
means each note is a quarter note. Subdivisions (brackets in the macro syntax)
create faster notes within a slot.

Example mental model:
    [C4, E4, G4, C5]     = 4 quarter notes
    [C4, [E4, G4], _, _] = quarter, 2 eighths, 2 quarter rests
    [[C4, E4, G4], ...]  = triplet (3 notes in 1 beat)

This module provides:
- `PatternSlot` - A single slot that can be a note, rest, or subdivision
- `Pattern` - A collection of slots with a time signature
- Conversion to the low-level `Sequence` type for playback
*/

use super::time_signature::TimeSignature;
use super::{Note, Sequence, SequenceEvent};

/// A slot in a pattern - can be a note, rest, or subdivision
#[derive(Debug, Clone, PartialEq)]
pub enum PatternSlot {
    /// A single note (MIDI note number)
    Note(NoteSlot),
    /// Silence for this slot
    Rest,
    /// Subdivide this slot into smaller parts
    Subdivision(Vec<PatternSlot>),
}

/// A note with optional weight for swing/uneven subdivisions
#[derive(Debug, Clone, PartialEq)]
pub struct NoteSlot {
    /// MIDI note number
    pub note: u8,
    /// Velocity (0-127), defaults to 100
    pub velocity: u8,
    /// Weight for uneven subdivisions (default 1)
    /// In a subdivision like [C4@2, E4], C4 gets 2/3 of the time
    pub weight: u8,
}

impl NoteSlot {
    pub fn new(note: u8) -> Self {
        Self {
            note,
            velocity: 100,
            weight: 1,
        }
    }

    pub fn with_velocity(mut self, velocity: u8) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_weight(mut self, weight: u8) -> Self {
        self.weight = weight;
        self
    }
}

/// Convenient conversion from u8 (MIDI note) to PatternSlot
impl From<u8> for PatternSlot {
    fn from(note: u8) -> Self {
        PatternSlot::Note(NoteSlot::new(note))
    }
}

/// A pattern is one cycle of music with a time signature
#[derive(Debug, Clone)]
pub struct Pattern {
    /// Time signature for this pattern
    pub time_signature: TimeSignature,
    /// The slots in this pattern (one per beat in simple meter)
    pub slots: Vec<PatternSlot>,
}

impl Pattern {
    /// Create a new pattern with a time signature and slots
    pub fn new(time_signature: TimeSignature, slots: Vec<PatternSlot>) -> Self {
        Self {
            time_signature,
            slots,
        }
    }

    /// Create a 4/4 pattern (most common)
    pub fn four_four(slots: Vec<PatternSlot>) -> Self {
        Self::new(TimeSignature::FOUR_FOUR, slots)
    }

    /// Create a 3/4 pattern
    pub fn three_four(slots: Vec<PatternSlot>) -> Self {
        Self::new(TimeSignature::THREE_FOUR, slots)
    }

    /// Create a 6/8 pattern
    pub fn six_eight(slots: Vec<PatternSlot>) -> Self {
        Self::new(TimeSignature::SIX_EIGHT, slots)
    }

    /// Chain this pattern with another (play one after the other)
    pub fn then(self, other: Pattern) -> PatternChain {
        PatternChain {
            patterns: vec![self, other],
        }
    }

    /// Repeat this pattern n times
    pub fn repeat(self, n: usize) -> PatternChain {
        PatternChain {
            patterns: vec![self; n],
        }
    }

    /// Convert to a low-level Sequence for playback
    pub fn to_sequence(&self, ppq: u32) -> Sequence {
        let bar_ticks = self.time_signature.bar_ticks(ppq);
        let slot_count = self.slots.len() as u32;

        // Handle empty pattern - return empty sequence
        if slot_count == 0 {
            return Sequence {
                time_signature: self.time_signature.clone(),
                ppq,
                events: Vec::new(),
                total_ticks: bar_ticks,
            };
        }

        // Each top-level slot gets an equal portion of the bar
        let ticks_per_slot = bar_ticks / slot_count;

        let mut events = Vec::new();
        let mut cursor = 0u32;

        for slot in &self.slots {
            Self::expand_slot(slot, cursor, ticks_per_slot, &mut events);
            cursor += ticks_per_slot;
        }

        Sequence {
            time_signature: self.time_signature.clone(),
            ppq,
            events,
            total_ticks: bar_ticks,
        }
    }

    /// Render directly to the [`Note`] records a clip is built from.
    pub fn to_notes(&self, ppq: u32, channel: u8, program: u8) -> Vec<Note> {
        self.to_sequence(ppq).to_notes(channel, program)
    }

    /// Recursively expand a slot into sequence events
    fn expand_slot(slot: &PatternSlot, start_tick: u32, duration: u32, events: &mut Vec<SequenceEvent>) {
        match slot {
            PatternSlot::Note(note_slot) => {
                events.push(SequenceEvent {
                    tick_offset: start_tick,
                    duration_ticks: duration,
                    note: Some(note_slot.note),
                    velocity: note_slot.velocity,
                    offset_ticks: 0,
                });
            }
            PatternSlot::Rest => {
                // Rests don't create events, just consume time
            }
            PatternSlot::Subdivision(sub_slots) => {
                assert!(
                    !sub_slots.is_empty(),
                    "Empty subdivision is not allowed - use PatternSlot::Rest for silence"
                );

                // Calculate total weight
                let total_weight: u32 = sub_slots
                    .iter()
                    .map(|s| match s {
                        PatternSlot::Note(n) => n.weight as u32,
                        _ => 1,
                    })
                    .sum();

                // Distribute time according to weights
                let mut sub_cursor = start_tick;
                for sub_slot in sub_slots {
                    let weight = match sub_slot {
                        PatternSlot::Note(n) => n.weight as u32,
                        _ => 1,
                    };
                    let sub_duration = (duration * weight) / total_weight;
                    Self::expand_slot(sub_slot, sub_cursor, sub_duration, events);
                    sub_cursor += sub_duration;
                }
            }
        }
    }
}

/// A chain of patterns to be played in sequence
#[derive(Debug, Clone)]
pub struct PatternChain {
    patterns: Vec<Pattern>,
}

impl PatternChain {
    /// Add another pattern to the chain
    pub fn then(mut self, pattern: Pattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    /// Concatenate another chain onto this one
    ///
    /// This is useful when you have two chains you want to play in sequence,
    /// for example an intro followed by a main section.
    ///
    /// # Example
    /// ```ignore
    /// let intro = pattern!(4/4 => [C4, _, _, _]).repeat(4);
    /// let main = pattern!(4/4 => [C4, E4, G4, C5]).repeat(8);
    /// let full = intro.concat(main);
    /// ```
    pub fn concat(mut self, other: PatternChain) -> Self {
        self.patterns.extend(other.patterns);
        self
    }

    /// Repeat the entire chain n times
    pub fn repeat(mut self, n: usize) -> Self {
        let original = self.patterns.clone();
        for _ in 1..n {
            self.patterns.extend(original.clone());
        }
        self
    }

    /// Convert to a low-level Sequence for playback
    pub fn to_sequence(&self, ppq: u32) -> Sequence {
        let mut all_events = Vec::new();
        let mut cursor = 0u32;

        // Use the first pattern's time signature (could be smarter about this)
        let time_signature = self
            .patterns
            .first()
            .map(|p| p.time_signature.clone())
            .unwrap_or(TimeSignature::FOUR_FOUR);

        for pattern in &self.patterns {
            let bar_ticks = pattern.time_signature.bar_ticks(ppq);
            let seq = pattern.to_sequence(ppq);

            // Offset all events by the current cursor position
            for mut event in seq.events {
                event.tick_offset += cursor;
                all_events.push(event);
            }

            cursor += bar_ticks;
        }

        Sequence {
            time_signature,
            ppq,
            events: all_events,
            total_ticks: cursor,
        }
    }

    /// Render directly to the [`Note`] records a clip is built from.
    pub fn to_notes(&self, ppq: u32, channel: u8, program: u8) -> Vec<Note> {
        self.to_sequence(ppq).to_notes(channel, program)
    }
}

/// Macro for creating patterns with a concise syntax
///
/// # Examples
///
/// ```
/// use embertone::pattern;
/// use embertone::sequencing::*;
///
/// // Simple 4/4 pattern with four quarter notes
/// let arp = pattern!(4/4 => [C4, E4, G4, C5]);
///
/// // Pattern with rests (use _)
/// let sparse = pattern!(4/4 => [C4, _, G4, _]);
///
/// // Subdivisions with brackets
/// let eighths = pattern!(4/4 => [C4, [E4, G4], C5, _]);
///
/// // Triplets (3 notes in one beat)
/// let triplet = pattern!(4/4 => [[C4, E4, G4], _, _, _]);
///
/// // 6/8 compound meter
/// let waltz = pattern!(6/8 => [C4, G4]);
/// ```
#[macro_export]
macro_rules! pattern {
    // 4/4 time signature
    (4/4 => [$($slot:tt),* $(,)?]) => {
        $crate::sequencing::Pattern::new(
            $crate::sequencing::TimeSignature::FOUR_FOUR,
            vec![$($crate::pattern!(@slot $slot)),*]
        )
    };

    // 3/4 time signature
    (3/4 => [$($slot:tt),* $(,)?]) => {
        $crate::sequencing::Pattern::new(
            $crate::sequencing::TimeSignature::THREE_FOUR,
            vec![$($crate::pattern!(@slot $slot)),*]
        )
    };

    // 6/8 time signature
    (6/8 => [$($slot:tt),* $(,)?]) => {
        $crate::sequencing::Pattern::new(
            $crate::sequencing::TimeSignature::SIX_EIGHT,
            vec![$($crate::pattern!(@slot $slot)),*]
        )
    };

    // 2/4 time signature
    (2/4 => [$($slot:tt),* $(,)?]) => {
        $crate::sequencing::Pattern::new(
            $crate::sequencing::TimeSignature::TWO_FOUR,
            vec![$($crate::pattern!(@slot $slot)),*]
        )
    };

    // Rest slot
    (@slot _) => {
        $crate::sequencing::PatternSlot::Rest
    };

    // Subdivision slot (brackets)
    (@slot [$($inner:tt),* $(,)?]) => {
        $crate::sequencing::PatternSlot::Subdivision(
            vec![$($crate::pattern!(@slot $inner)),*]
        )
    };

    // Note slot (any other identifier/expression)
    (@slot $note:expr) => {
        $crate::sequencing::PatternSlot::from($note)
    };
}

// Re-export the macro at the crate level
pub use pattern;

/// Helper functions for building pattern slots
pub mod slot {
    use super::*;

    /// Create a note slot
    pub fn note(midi_note: u8) -> PatternSlot {
        PatternSlot::Note(NoteSlot::new(midi_note))
    }

    /// Create a note slot with velocity
    pub fn note_vel(midi_note: u8, velocity: u8) -> PatternSlot {
        PatternSlot::Note(NoteSlot::new(midi_note).with_velocity(velocity))
    }

    /// Create a note slot with weight (for swing)
    pub fn note_weight(midi_note: u8, weight: u8) -> PatternSlot {
        PatternSlot::Note(NoteSlot::new(midi_note).with_weight(weight))
    }

    /// Create a rest slot
    pub fn rest() -> PatternSlot {
        PatternSlot::Rest
    }

    /// Create a subdivision
    pub fn sub(slots: Vec<PatternSlot>) -> PatternSlot {
        PatternSlot::Subdivision(slots)
    }
}
