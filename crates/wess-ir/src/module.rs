//! Static module tables: sequences, tracks and their headers.
//!
//! A module is everything the engine reads but never writes during
//! playback. Loading it from a binary file is someone else's job; tests
//! and demos assemble one in memory.

use alloc::vec::Vec;

use crate::patch::PatchBank;

/// Which sound driver executes a track's driver commands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DriverId {
    /// Commands only update track state; no voices are played.
    NoSound,
    /// The hardware voice driver.
    #[default]
    Psx,
}

/// Broad category of a track, used for master volume and drum mapping.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SoundClass {
    SndFx = 0,
    #[default]
    Music = 1,
    Drums = 2,
    SfxDrums = 3,
}

impl SoundClass {
    /// Classes whose loudness follows the sound-effects master volume.
    pub fn is_sfx(self) -> bool {
        self == SoundClass::SndFx
    }

    /// Classes whose NoteOn key indexes the drum map.
    pub fn is_drums(self) -> bool {
        self == SoundClass::Drums
    }
}

/// Initial state of a track.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackHeader {
    pub driver: DriverId,
    pub sound_class: SoundClass,
    /// Voice-steal priority. Larger values may steal from smaller ones.
    pub priority: u8,
    /// Most voices the track may hold at once.
    pub max_voices: u8,
    /// Depth of the return-address stack.
    pub loc_stack_size: u8,
    /// Mute groups the track belongs to, one bit per group.
    pub mutegroups_mask: u32,
    pub init_patch: u16,
    pub init_pitch: i16,
    pub init_volume: u8,
    pub init_pan: u8,
    pub init_reverb: u8,
    /// Parts per quarter note.
    pub init_ppq: u16,
    /// Quarter notes per minute.
    pub init_qpm: u16,
}

impl Default for TrackHeader {
    fn default() -> Self {
        Self {
            driver: DriverId::Psx,
            sound_class: SoundClass::Music,
            priority: 0x80,
            max_voices: 8,
            loc_stack_size: 4,
            mutegroups_mask: 0,
            init_patch: 0,
            init_pitch: 0,
            init_volume: 127,
            init_pan: 64,
            init_reverb: 0,
            init_ppq: 120,
            init_qpm: 120,
        }
    }
}

/// One track's header, label table and command stream.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackData {
    pub header: TrackHeader,
    /// Byte offsets into `cmds` that jump commands may target.
    pub labels: Vec<u32>,
    /// Delta-time / command byte-code. Starts with a delta time.
    pub cmds: Vec<u8>,
}

impl TrackData {
    /// Byte offset of label `idx`, if it exists and lies inside the stream.
    pub fn label(&self, idx: i32) -> Option<usize> {
        let idx = usize::try_from(idx).ok()?;
        let off = *self.labels.get(idx)? as usize;
        (off < self.cmds.len()).then_some(off)
    }
}

/// A playable cue made of tracks that start together.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SequenceData {
    pub tracks: Vec<TrackData>,
}

/// Pool sizes the engine allocates up front.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModuleLimits {
    pub max_active_sequences: u8,
    pub max_active_tracks: u8,
    pub max_gates_per_seq: u8,
    pub max_iters_per_seq: u8,
    pub max_callbacks: u8,
    /// Hardware voices the driver may use.
    pub voice_limit: u8,
}

impl Default for ModuleLimits {
    fn default() -> Self {
        Self {
            max_active_sequences: 8,
            max_active_tracks: 32,
            max_gates_per_seq: 16,
            max_iters_per_seq: 16,
            max_callbacks: 4,
            voice_limit: 24,
        }
    }
}

/// A loaded sound module.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Module {
    pub limits: ModuleLimits,
    pub sequences: Vec<SequenceData>,
    pub patches: PatchBank,
}

impl Module {
    pub fn sequence(&self, idx: usize) -> Option<&SequenceData> {
        self.sequences.get(idx)
    }

    /// Track count of the widest sequence.
    pub fn max_tracks_per_seq(&self) -> usize {
        self.sequences.iter().map(|s| s.tracks.len()).max().unwrap_or(0)
    }
}
