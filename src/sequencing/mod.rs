pub mod duration;
pub mod note;
pub mod notes;
pub mod pattern;
pub mod sequence;
pub mod time_signature;

pub use duration::Duration;
pub use note::{Note, MAX_POLYPHONY, MAX_VOICES, SAMPLE_RATE, STATUS_CHANNEL, TICKS_PER_QUARTER};
pub use notes::*;
pub use pattern::{NoteSlot, Pattern, PatternChain, PatternSlot};
pub use sequence::{Sequence, SequenceBuilder, SequenceError, SequenceEvent};
pub use time_signature::TimeSignature;
