/// Where an event came from.
///
/// Closed set, mirroring the producers in the original event fabric: the
/// editor/UI layers publish on `Editor`/`Keyboard`/`Chooser`/`Softkey`, the
/// sequencer and synth publish on their own origins so a subscriber can
/// distinguish "the sequencer told me to turn a note off" from "the UI told
/// me to." Only `Sequencer`, `Note`, and `Command` are ever produced by this
/// crate's own components; the rest exist so external collaborators (out of
/// scope here) can publish through the same bus.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    Command,
    Keyboard,
    Editor,
    Sequencer,
    Note,
    Sampler,
    Chooser,
    Softkey,
    Sink,
}

impl Origin {
    pub const ALL: [Origin; 9] = [
        Origin::Command,
        Origin::Keyboard,
        Origin::Editor,
        Origin::Sequencer,
        Origin::Note,
        Origin::Sampler,
        Origin::Chooser,
        Origin::Softkey,
        Origin::Sink,
    ];

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}
