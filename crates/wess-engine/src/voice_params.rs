//! Hardware voice parameters derived from track and patch state.
//!
//! The integer formulas are kept bit-exact, quirks included: the fine-tune
//! byte of a pitch-bent note keeps only 7 bits, and a downward bend that
//! lands exactly on a semitone boundary reports a fine value of zero one
//! semitone too low.

use wess_ir::{PanMode, PatchVoice, PAN_CENTER, PAN_LEFT, PAN_RIGHT};

/// Longest release the envelope can produce, in ms.
pub const MAX_RELEASE_TIME_MS: u32 = 0x1000_0000;
/// Release ceiling for linear-release envelopes, in ms.
pub const MAX_FAST_RELEASE_TIME_MS: u32 = 0x05DC_0000;

/// Effective pan of a voice.
pub fn voice_pan(track_pan: u8, patch_pan: u8, mode: PanMode) -> i16 {
    if mode == PanMode::Off {
        return PAN_CENTER as i16;
    }
    (track_pan as i16 + patch_pan as i16 - PAN_CENTER as i16)
        .clamp(PAN_LEFT as i16, PAN_RIGHT as i16)
}

/// Voice loudness before panning: the product of four 7-bit levels scaled
/// back down to a 0..=127 range.
pub fn voice_volume(velocity: u8, patch_volume: u8, track_volume: u8, master: u8) -> u32 {
    (velocity as u32 * patch_volume as u32 * track_volume as u32 * master as u32) >> 21
}

/// Left and right hardware volume for a voice.
pub fn stereo_levels(volume: u32, pan: i16, mode: PanMode) -> (i16, i16) {
    match mode {
        PanMode::Off => {
            let v = (volume as i16).wrapping_mul(64);
            (v, v)
        }
        PanMode::On | PanMode::OnReversed => {
            let vol = volume as i32;
            let pan = pan as i32;
            let left = (vol * 128 * (128 - pan) / 128) as i16;
            let right = (vol * 128 * (pan + 1) / 128) as i16;
            if mode == PanMode::On {
                (left, right)
            } else {
                (right, left)
            }
        }
    }
}

/// Note register value for `note` under pitch bend `pitch`.
///
/// High byte is the semitone, low byte the fine tune in 1/128 steps.
pub fn voice_note(note: u8, pitch: i16, patch: &PatchVoice) -> u16 {
    let note = note as u32;
    if pitch == 0 {
        return (note << 8) as u16;
    }
    if pitch > 0 {
        let frac = 32u32.wrapping_add((pitch as u32).wrapping_mul(patch.pitchstep_up as u32));
        let semis = frac >> 13;
        let fine = (frac & 0x1FFF) >> 6;
        (((note.wrapping_add(semis)) << 8) | (fine & 0x7F)) as u16
    } else {
        let bend = (pitch as i32 * patch.pitchstep_down as i32) as u32;
        let frac = 32u32.wrapping_sub(bend);
        let semis = (frac >> 13) + 1;
        let fine = 128u32.wrapping_sub((frac & 0x1FFF) >> 6);
        (((note.wrapping_sub(semis)) << 8) | (fine & 0x7F)) as u16
    }
}

/// Root note register value of a patch voice.
pub fn sample_note(patch: &PatchVoice) -> u16 {
    ((patch.base_note as u16) << 8) | patch.base_note_frac as u16
}

/// Release duration implied by a patch voice's second ADSR word.
///
/// Bit 5 selects exponential release; the low 5 bits are the rate.
pub fn release_time(adsr2: u16) -> u32 {
    let ceiling = if adsr2 & 0x20 != 0 {
        MAX_RELEASE_TIME_MS
    } else {
        MAX_FAST_RELEASE_TIME_MS
    };
    ceiling >> (31 - (adsr2 as u32 % 32))
}

/// Release duration of a mute at release rate `rate`.
pub fn mute_release_time(rate: u8) -> u32 {
    MAX_RELEASE_TIME_MS >> (31 - (rate as u32 % 32))
}

/// Largest mute release rate whose duration does not exceed `ms`.
pub fn mute_release_rate(ms: u32) -> u8 {
    let mut approx = MAX_RELEASE_TIME_MS;
    let mut rate: u8 = 31;
    while approx > ms && rate != 0 {
        approx >>= 1;
        rate -= 1;
    }
    rate
}
