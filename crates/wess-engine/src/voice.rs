//! Per-hardware-voice bookkeeping.

use wess_ir::SoundClass;

use crate::track::TrackId;

/// What the driver knows about one hardware voice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VoiceStatus {
    pub active: bool,
    /// Keyed off and fading out.
    pub release: bool,
    /// Owning track.
    pub track: TrackId,
    pub note: u8,
    /// Velocity the note was struck with.
    pub volume: u8,
    pub class: SoundClass,
    /// Priority inherited from the owning track.
    pub priority: u8,
    /// Index into the module's patch voices.
    pub patch_voice: u16,
    /// Index into the module's samples.
    pub sample: u16,
    /// Key-on time while playing, scheduled end of release once released
    /// (ms clock).
    pub onoff: u32,
    /// How long a release lasts, in ms.
    pub release_time: u32,
}

impl VoiceStatus {
    /// Active and owned by `track`.
    pub fn is_owned_by(&self, track: TrackId) -> bool {
        self.active && self.track == track
    }
}
