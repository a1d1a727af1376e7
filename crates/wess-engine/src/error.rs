use thiserror::Error;

use crate::track::LOC_STACK_CAP;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("module limit {0} must be non-zero")]
    ZeroLimit(&'static str),
    #[error("voice limit {0} exceeds the 24 hardware voices")]
    VoiceLimit(u8),
    #[error("sequence {seq} track {track}: label {label} points outside the stream")]
    BadLabel { seq: usize, track: usize, label: usize },
    #[error("sequence {seq} track {track}: return stack deeper than {}", LOC_STACK_CAP)]
    StackTooDeep { seq: usize, track: usize },
    #[error("sequence {seq} has {tracks} tracks, more than the engine can hold")]
    TooManyTracks { seq: usize, tracks: usize },
    #[error("patch {0} refers to voices past the end of the table")]
    BadPatch(usize),
    #[error("patch voice {voice} refers to missing sample {sample}")]
    BadSample { voice: usize, sample: u16 },
    #[error("drum key {key} refers to missing patch {patch}")]
    BadDrum { key: usize, patch: u16 },

    #[error("sequence {0} does not exist")]
    InvalidSequence(usize),
    #[error("sequence {0} has no tracks")]
    EmptySequence(usize),
    #[error("no free sequence slot")]
    NoFreeSequence,
    #[error("no free track slot")]
    NoFreeTrack,

    #[error("all {0} callback slots are in use")]
    CallbacksFull(usize),
}
