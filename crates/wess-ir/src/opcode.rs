//! Sequencer opcodes.

/// Every command the track byte-code can contain.
///
/// `DriverInit..=DriverEntry3` and `TrkOff`/`TrkMute` are driver entry
/// points rather than stream commands; the engine treats them as invalid
/// when they show up in a track.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    DriverInit = 0,
    DriverExit = 1,
    DriverEntry1 = 2,
    DriverEntry2 = 3,
    DriverEntry3 = 4,
    TrkOff = 5,
    TrkMute = 6,
    PatchChg = 7,
    PatchMod = 8,
    PitchMod = 9,
    ZeroMod = 10,
    ModuMod = 11,
    VolumeMod = 12,
    PanMod = 13,
    PedalMod = 14,
    ReverbMod = 15,
    ChorusMod = 16,
    NoteOn = 17,
    NoteOff = 18,
    StatusMark = 19,
    GateJump = 20,
    IterJump = 21,
    ResetGates = 22,
    ResetIters = 23,
    WriteIterBox = 24,
    SeqTempo = 25,
    SeqGosub = 26,
    SeqJump = 27,
    SeqRet = 28,
    SeqEnd = 29,
    TrkTempo = 30,
    TrkGosub = 31,
    TrkJump = 32,
    TrkRet = 33,
    TrkEnd = 34,
    NullEvent = 35,
}

/// Encoded length in bytes (opcode included) of each command, by opcode.
pub const CMD_LENGTH: [u8; 36] = [
    0, 0, 0, 0, 0, 0, 0, // driver entry points
    3, 2, 3, 2, 2, 2, 2, 2, 2, 2, 3, 2, // driver commands
    4, 5, 5, 2, 2, 3, 3, 3, 3, 1, 1, 3, 3, 3, 1, 1, 1, // engine commands
];

const ALL: [Opcode; 36] = [
    Opcode::DriverInit,
    Opcode::DriverExit,
    Opcode::DriverEntry1,
    Opcode::DriverEntry2,
    Opcode::DriverEntry3,
    Opcode::TrkOff,
    Opcode::TrkMute,
    Opcode::PatchChg,
    Opcode::PatchMod,
    Opcode::PitchMod,
    Opcode::ZeroMod,
    Opcode::ModuMod,
    Opcode::VolumeMod,
    Opcode::PanMod,
    Opcode::PedalMod,
    Opcode::ReverbMod,
    Opcode::ChorusMod,
    Opcode::NoteOn,
    Opcode::NoteOff,
    Opcode::StatusMark,
    Opcode::GateJump,
    Opcode::IterJump,
    Opcode::ResetGates,
    Opcode::ResetIters,
    Opcode::WriteIterBox,
    Opcode::SeqTempo,
    Opcode::SeqGosub,
    Opcode::SeqJump,
    Opcode::SeqRet,
    Opcode::SeqEnd,
    Opcode::TrkTempo,
    Opcode::TrkGosub,
    Opcode::TrkJump,
    Opcode::TrkRet,
    Opcode::TrkEnd,
    Opcode::NullEvent,
];

impl Opcode {
    /// Look up an opcode from its byte value.
    pub fn from_u8(byte: u8) -> Option<Self> {
        ALL.get(byte as usize).copied()
    }

    /// Encoded command length, opcode byte included.
    pub const fn byte_len(self) -> usize {
        CMD_LENGTH[self as usize] as usize
    }

    /// Commands handled by the sound driver bound to the track.
    pub const fn is_driver_cmd(self) -> bool {
        let b = self as u8;
        b >= Opcode::PatchChg as u8 && b <= Opcode::NoteOff as u8
    }

    /// Control-flow commands handled by the sequencer itself.
    pub const fn is_engine_cmd(self) -> bool {
        let b = self as u8;
        b >= Opcode::StatusMark as u8 && b <= Opcode::NullEvent as u8
    }
}
