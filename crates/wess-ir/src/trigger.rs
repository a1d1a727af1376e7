//! Play attributes that override track headers when a sequence starts.

use bitflags::bitflags;

bitflags! {
    /// Which fields of a [`TriggerPlayAttr`] are in effect.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TriggerAttrs: u32 {
        const VOLUME   = 0x0001;
        const PAN      = 0x0002;
        const PATCH    = 0x0004;
        const PITCH    = 0x0008;
        const MUTEMODE = 0x0010;
        const TEMPO    = 0x0020;
        const TIMED    = 0x0040;
        const LOOPED   = 0x0080;
        const REVERB   = 0x0100;
    }
}

/// Header overrides applied to every track of a triggered sequence.
///
/// Only fields whose bit is set in `mask` are used. The `with_*` setters
/// fill a field and set its bit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TriggerPlayAttr {
    pub mask: TriggerAttrs,
    pub volume: u8,
    pub pan: u8,
    pub patch: u16,
    pub pitch: i16,
    /// Mute group to silence; tracks whose mute-group mask has this bit
    /// set start muted.
    pub mutegroup: u8,
    /// Quarter notes per minute.
    pub tempo: u16,
    /// Parts after which a timed track turns itself off.
    pub playtime: u32,
    pub reverb: u8,
}

impl TriggerPlayAttr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_volume(mut self, volume: u8) -> Self {
        self.volume = volume;
        self.mask |= TriggerAttrs::VOLUME;
        self
    }

    pub fn with_pan(mut self, pan: u8) -> Self {
        self.pan = pan;
        self.mask |= TriggerAttrs::PAN;
        self
    }

    pub fn with_patch(mut self, patch: u16) -> Self {
        self.patch = patch;
        self.mask |= TriggerAttrs::PATCH;
        self
    }

    pub fn with_pitch(mut self, pitch: i16) -> Self {
        self.pitch = pitch;
        self.mask |= TriggerAttrs::PITCH;
        self
    }

    pub fn with_mutegroup(mut self, mutegroup: u8) -> Self {
        self.mutegroup = mutegroup;
        self.mask |= TriggerAttrs::MUTEMODE;
        self
    }

    pub fn with_tempo(mut self, qpm: u16) -> Self {
        self.tempo = qpm;
        self.mask |= TriggerAttrs::TEMPO;
        self
    }

    pub fn with_playtime(mut self, parts: u32) -> Self {
        self.playtime = parts;
        self.mask |= TriggerAttrs::TIMED;
        self
    }

    pub fn looped(mut self) -> Self {
        self.mask |= TriggerAttrs::LOOPED;
        self
    }

    pub fn with_reverb(mut self, reverb: u8) -> Self {
        self.reverb = reverb;
        self.mask |= TriggerAttrs::REVERB;
        self
    }

    /// Whether a track with `mutegroups_mask` starts muted.
    pub fn mutes(&self, mutegroups_mask: u32) -> bool {
        self.mask.contains(TriggerAttrs::MUTEMODE)
            && mutegroups_mask.checked_shr(self.mutegroup as u32).unwrap_or(0) & 1 != 0
    }
}
