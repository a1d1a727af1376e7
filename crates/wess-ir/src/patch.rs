//! Instrument tables: patches, their per-range voices and sample records.

use alloc::vec::Vec;

/// An instrument: a contiguous run of entries in [`PatchBank::voices`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Patch {
    pub first_voice: u16,
    pub num_voices: u16,
}

/// Per-range instrument parameters (a "patchmap").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PatchVoice {
    pub priority: u8,
    pub reverb: u8,
    pub volume: u8,
    pub pan: u8,
    /// Root note the sample was recorded at.
    pub base_note: u8,
    /// Fine tuning of the root note, in 1/128 semitones.
    pub base_note_frac: u8,
    /// Lowest note this entry answers to.
    pub note_min: u8,
    /// Highest note this entry answers to.
    pub note_max: u8,
    /// Pitch-bend range upwards, in 1/8192 semitone units per bend step.
    pub pitchstep_up: u8,
    /// Pitch-bend range downwards.
    pub pitchstep_down: u8,
    pub sample_idx: u16,
    pub adsr1: u16,
    pub adsr2: u16,
}

impl Default for PatchVoice {
    fn default() -> Self {
        Self {
            priority: 0,
            reverb: 0,
            volume: 127,
            pan: 64,
            base_note: 60,
            base_note_frac: 0,
            note_min: 0,
            note_max: 127,
            pitchstep_up: 0,
            pitchstep_down: 0,
            sample_idx: 0,
            adsr1: 0,
            adsr2: 0,
        }
    }
}

/// A sample already resident in sound RAM.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PatchSample {
    /// Sound RAM address. Zero means the sample was never loaded.
    pub spu_addr: u32,
    pub size: u32,
}

/// Drum-map entry: which patch and note a drum-track key plays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrumPatch {
    pub patch: u16,
    pub note: u8,
}

/// Every instrument table of a module.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PatchBank {
    pub patches: Vec<Patch>,
    pub voices: Vec<PatchVoice>,
    pub samples: Vec<PatchSample>,
    pub drums: Vec<DrumPatch>,
}

impl PatchBank {
    pub fn patch(&self, idx: u16) -> Option<&Patch> {
        self.patches.get(idx as usize)
    }

    pub fn sample(&self, idx: u16) -> Option<&PatchSample> {
        self.samples.get(idx as usize)
    }

    pub fn drum(&self, key: u8) -> Option<&DrumPatch> {
        self.drums.get(key as usize)
    }

    /// Indices into `voices` covered by patch `idx`; empty if the patch
    /// is missing or its range runs past the table.
    pub fn voice_range(&self, idx: u16) -> core::ops::Range<usize> {
        match self.patch(idx) {
            Some(p) => {
                let start = p.first_voice as usize;
                let end = start + p.num_voices as usize;
                if end <= self.voices.len() {
                    start..end
                } else {
                    0..0
                }
            }
            None => 0..0,
        }
    }

    /// Add a sample record, returning its index.
    pub fn add_sample(&mut self, sample: PatchSample) -> u16 {
        self.samples.push(sample);
        (self.samples.len() - 1) as u16
    }

    /// Add a patch made of `voices`, returning its index.
    pub fn add_patch(&mut self, voices: &[PatchVoice]) -> u16 {
        let first_voice = self.voices.len() as u16;
        self.voices.extend_from_slice(voices);
        self.patches.push(Patch {
            first_voice,
            num_voices: voices.len() as u16,
        });
        (self.patches.len() - 1) as u16
    }
}
