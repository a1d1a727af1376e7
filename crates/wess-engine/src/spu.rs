//! Sound hardware collaborator.
//!
//! The engine never touches voice registers itself. Everything it needs
//! from the sound processor goes through [`Spu`], which a platform layer
//! (or [`crate::SoftSpu`] in tests) implements.

use bitflags::bitflags;

/// Hardware voices on the sound processor.
pub const SPU_NUM_VOICES: usize = 24;

/// One bit per hardware voice.
pub type VoiceBits = u32;

/// Bit for voice `idx`.
pub const fn voice_bit(idx: usize) -> VoiceBits {
    1 << (idx % 32)
}

bitflags! {
    /// Which fields of a [`VoiceAttrs`] to apply.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct AttrMask: u32 {
        const VOL_L        = 0x0001;
        const VOL_R        = 0x0002;
        const NOTE         = 0x0004;
        const SAMPLE_NOTE  = 0x0008;
        const ADDR         = 0x0010;
        const ADSR1        = 0x0020;
        const ADSR2        = 0x0040;
        const RELEASE_MODE = 0x0080;
        const RELEASE_RATE = 0x0100;

        const VOLUME = Self::VOL_L.bits() | Self::VOL_R.bits();
        /// Everything a key-on needs.
        const TRIGGER = Self::VOLUME.bits()
            | Self::NOTE.bits()
            | Self::SAMPLE_NOTE.bits()
            | Self::ADDR.bits()
            | Self::ADSR1.bits()
            | Self::ADSR2.bits();
    }
}

/// Envelope release curve.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReleaseMode {
    #[default]
    Linear,
    Exponential,
}

/// Register values for one or more voices.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VoiceAttrs {
    pub mask: AttrMask,
    pub vol_l: i16,
    pub vol_r: i16,
    /// Note to play, semitone in the high byte and fine tune in the low.
    pub note: u16,
    /// Note the sample was recorded at, same layout as `note`.
    pub sample_note: u16,
    /// Sound RAM address of the sample.
    pub addr: u32,
    pub adsr1: u16,
    pub adsr2: u16,
    pub release_mode: ReleaseMode,
    pub release_rate: u8,
}

/// Key state of a voice as reported by the hardware.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyStatus {
    /// Silent.
    #[default]
    Off,
    On,
    /// Keyed off, envelope still releasing.
    OffEnvOn,
    /// Keyed on, envelope finished.
    OnEnvOff,
}

/// Operations the engine needs from the sound processor.
///
/// All calls are synchronous and infallible from the engine's point of
/// view.
pub trait Spu {
    /// Apply the masked fields of `attrs` to every voice in `voices`.
    fn set_voice_attrs(&mut self, voices: VoiceBits, attrs: &VoiceAttrs);

    /// Key voices on or off.
    fn set_key(&mut self, on: bool, voices: VoiceBits);

    /// Set attributes then key on.
    fn key_on_with_attrs(&mut self, voices: VoiceBits, attrs: &VoiceAttrs) {
        self.set_voice_attrs(voices, attrs);
        self.set_key(true, voices);
    }

    /// Fill `out` with the key state of every voice.
    fn key_statuses(&mut self, out: &mut [KeyStatus; SPU_NUM_VOICES]);

    /// Route voices to (or away from) the reverb unit.
    fn set_reverb_voices(&mut self, on: bool, voices: VoiceBits);

    fn set_master_volume(&mut self, volume: i16);

    fn set_cd_volume(&mut self, volume: i16);

    /// Begin a transfer into sound RAM at `addr`.
    fn start_transfer(&mut self, addr: u32);

    /// Queue bytes for the current transfer; returns how many were taken.
    fn write_transfer(&mut self, data: &[u8]) -> usize;

    /// Whether the transfer has finished. With `wait` set, block until it
    /// has.
    fn is_transfer_complete(&mut self, wait: bool) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_mask_covers_key_on_fields() {
        assert!(AttrMask::TRIGGER.contains(AttrMask::VOLUME));
        assert!(AttrMask::TRIGGER.contains(AttrMask::ADDR | AttrMask::ADSR2));
        assert!(!AttrMask::TRIGGER.contains(AttrMask::RELEASE_RATE));
    }

    #[test]
    fn voice_bit_matches_index() {
        assert_eq!(voice_bit(0), 1);
        assert_eq!(voice_bit(23), 1 << 23);
    }
}
