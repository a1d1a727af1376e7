//! Software stand-in for the sound processor.
//!
//! Keeps the register state the engine writes so tests, benchmarks and the
//! CLI can observe it. No audio is produced.

use alloc::vec;
use alloc::vec::Vec;

use crate::spu::{AttrMask, KeyStatus, Spu, VoiceAttrs, VoiceBits, SPU_NUM_VOICES};

/// Sound RAM size.
pub const SPU_RAM_SIZE: usize = 512 * 1024;

#[derive(Clone, Copy, Debug, Default)]
struct SoftVoice {
    attrs: VoiceAttrs,
    status: KeyStatus,
    reverb: bool,
}

/// Recording implementation of [`Spu`].
#[derive(Clone, Debug)]
pub struct SoftSpu {
    voices: [SoftVoice; SPU_NUM_VOICES],
    /// When set, key-off silences a voice at once. Otherwise the voice
    /// reports [`KeyStatus::OffEnvOn`] until [`SoftSpu::finish_release`].
    pub instant_release: bool,
    key_ons: u32,
    key_offs: u32,
    master_volume: i16,
    cd_volume: i16,
    ram: Vec<u8>,
    transfer_addr: usize,
}

impl Default for SoftSpu {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftSpu {
    pub fn new() -> Self {
        Self {
            voices: [SoftVoice::default(); SPU_NUM_VOICES],
            instant_release: true,
            key_ons: 0,
            key_offs: 0,
            master_volume: 0,
            cd_volume: 0,
            ram: vec![0; SPU_RAM_SIZE],
            transfer_addr: 0,
        }
    }

    /// Voices stay audible after key-off until released by hand.
    pub fn with_held_release(mut self) -> Self {
        self.instant_release = false;
        self
    }

    /// End the release phase of voice `v`.
    pub fn finish_release(&mut self, v: usize) {
        if let Some(voice) = self.voices.get_mut(v) {
            voice.status = KeyStatus::Off;
        }
    }

    /// Silence every releasing voice.
    pub fn finish_all_releases(&mut self) {
        for voice in &mut self.voices {
            if voice.status == KeyStatus::OffEnvOn {
                voice.status = KeyStatus::Off;
            }
        }
    }

    pub fn voice_attrs(&self, v: usize) -> Option<&VoiceAttrs> {
        self.voices.get(v).map(|voice| &voice.attrs)
    }

    pub fn key_status(&self, v: usize) -> KeyStatus {
        self.voices.get(v).map(|voice| voice.status).unwrap_or_default()
    }

    pub fn is_reverb(&self, v: usize) -> bool {
        self.voices.get(v).is_some_and(|voice| voice.reverb)
    }

    /// Voices currently keyed on.
    pub fn keyed_on(&self) -> usize {
        self.voices.iter().filter(|v| v.status == KeyStatus::On).count()
    }

    pub fn key_on_count(&self) -> u32 {
        self.key_ons
    }

    pub fn key_off_count(&self) -> u32 {
        self.key_offs
    }

    pub fn master_volume(&self) -> i16 {
        self.master_volume
    }

    pub fn cd_volume(&self) -> i16 {
        self.cd_volume
    }

    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    fn each_voice(&mut self, voices: VoiceBits, mut f: impl FnMut(&mut SoftVoice)) {
        for (i, voice) in self.voices.iter_mut().enumerate() {
            if voices & (1 << i) != 0 {
                f(voice);
            }
        }
    }
}

impl Spu for SoftSpu {
    fn set_voice_attrs(&mut self, voices: VoiceBits, attrs: &VoiceAttrs) {
        let m = attrs.mask;
        self.each_voice(voices, |voice| {
            let a = &mut voice.attrs;
            if m.contains(AttrMask::VOL_L) {
                a.vol_l = attrs.vol_l;
            }
            if m.contains(AttrMask::VOL_R) {
                a.vol_r = attrs.vol_r;
            }
            if m.contains(AttrMask::NOTE) {
                a.note = attrs.note;
            }
            if m.contains(AttrMask::SAMPLE_NOTE) {
                a.sample_note = attrs.sample_note;
            }
            if m.contains(AttrMask::ADDR) {
                a.addr = attrs.addr;
            }
            if m.contains(AttrMask::ADSR1) {
                a.adsr1 = attrs.adsr1;
            }
            if m.contains(AttrMask::ADSR2) {
                a.adsr2 = attrs.adsr2;
            }
            if m.contains(AttrMask::RELEASE_MODE) {
                a.release_mode = attrs.release_mode;
            }
            if m.contains(AttrMask::RELEASE_RATE) {
                a.release_rate = attrs.release_rate;
            }
            a.mask |= m;
        });
    }

    fn set_key(&mut self, on: bool, voices: VoiceBits) {
        let off_status = if self.instant_release {
            KeyStatus::Off
        } else {
            KeyStatus::OffEnvOn
        };
        let mut count = 0;
        self.each_voice(voices, |voice| {
            voice.status = if on { KeyStatus::On } else { off_status };
            count += 1;
        });
        if on {
            self.key_ons += count;
        } else {
            self.key_offs += count;
        }
    }

    fn key_statuses(&mut self, out: &mut [KeyStatus; SPU_NUM_VOICES]) {
        for (slot, voice) in out.iter_mut().zip(self.voices.iter()) {
            *slot = voice.status;
        }
    }

    fn set_reverb_voices(&mut self, on: bool, voices: VoiceBits) {
        self.each_voice(voices, |voice| voice.reverb = on);
    }

    fn set_master_volume(&mut self, volume: i16) {
        self.master_volume = volume;
    }

    fn set_cd_volume(&mut self, volume: i16) {
        self.cd_volume = volume;
    }

    fn start_transfer(&mut self, addr: u32) {
        self.transfer_addr = addr as usize;
    }

    fn write_transfer(&mut self, data: &[u8]) -> usize {
        let start = self.transfer_addr.min(self.ram.len());
        let n = data.len().min(self.ram.len() - start);
        self.ram[start..start + n].copy_from_slice(&data[..n]);
        self.transfer_addr = start + n;
        n
    }

    fn is_transfer_complete(&mut self, _wait: bool) -> bool {
        true
    }
}
