//! Built-in demo module: a looping three-track song and a one-shot effect.

use wess_engine::{Engine, Spu};
use wess_ir::{
    DrumPatch, Module, PatchSample, PatchVoice, SequenceData, SoundClass, TrackBuilder,
    TrackHeader,
};

/// Looping bass, lead and drum song.
pub const DEMO_MUSIC: usize = 0;
/// Short rising effect.
pub const DEMO_SFX: usize = 1;
/// Status-mark kind the lead fires at the top of every loop.
pub const DEMO_MARK: u8 = 1;

const KICK: u8 = 36;
const SNARE: u8 = 38;

// (sound RAM address, length) per sample
const SAMPLES: [(u32, u32); 4] = [
    (0x1010, 0x400),
    (0x1410, 0x400),
    (0x1810, 0x200),
    (0x1a10, 0x200),
];

const BEAT: u32 = 120;

pub fn demo_module() -> Module {
    let mut module = Module::default();
    let bank = &mut module.patches;
    for (spu_addr, size) in SAMPLES {
        bank.add_sample(PatchSample { spu_addr, size });
    }

    let bass = bank.add_patch(&[PatchVoice {
        sample_idx: 0,
        base_note: 36,
        pitchstep_up: 2,
        pitchstep_down: 2,
        adsr2: 0x20 | 14,
        ..PatchVoice::default()
    }]);
    // low and high halves of the keyboard use different samples
    let lead = bank.add_patch(&[
        PatchVoice {
            sample_idx: 1,
            note_max: 71,
            volume: 110,
            adsr2: 0x20 | 10,
            ..PatchVoice::default()
        },
        PatchVoice {
            sample_idx: 1,
            note_min: 72,
            base_note: 72,
            volume: 100,
            reverb: 40,
            adsr2: 0x20 | 10,
            ..PatchVoice::default()
        },
    ]);
    let kick = bank.add_patch(&[PatchVoice {
        sample_idx: 2,
        base_note: KICK,
        priority: 0x90,
        ..PatchVoice::default()
    }]);
    let snare = bank.add_patch(&[PatchVoice {
        sample_idx: 3,
        base_note: SNARE,
        pan: 70,
        ..PatchVoice::default()
    }]);
    bank.drums = vec![DrumPatch::default(); SNARE as usize + 1];
    // drum notes keep their key so NoteOff finds the voice
    bank.drums[KICK as usize] = DrumPatch { patch: kick, note: KICK };
    bank.drums[SNARE as usize] = DrumPatch { patch: snare, note: SNARE };

    module.sequences.push(SequenceData {
        tracks: vec![bass_track(bass), lead_track(lead), drum_track()],
    });
    module.sequences.push(SequenceData {
        tracks: vec![sfx_track(lead)],
    });
    module
}

fn bass_track(patch: u16) -> wess_ir::TrackData {
    let mut b = TrackBuilder::new(TrackHeader {
        init_patch: patch,
        init_volume: 100,
        init_pan: 56,
        max_voices: 2,
        ..TrackHeader::default()
    });
    let top = b.label();
    for root in [36u8, 36, 41, 43] {
        b.note_on(0, root, 110)
            .note_off(BEAT * 2 - 10, root)
            .pitch_mod(0, 0);
    }
    b.pitch_mod(0, 512).trk_jump(10, top);
    b.build()
}

fn lead_track(patch: u16) -> wess_ir::TrackData {
    let mut b = TrackBuilder::new(TrackHeader {
        init_patch: patch,
        init_pan: 72,
        max_voices: 3,
        priority: 0xa0,
        ..TrackHeader::default()
    });
    let top = b.label();
    b.status_mark(0, DEMO_MARK, 0);
    let phrase = b.label();
    for note in [67u8, 72, 76] {
        b.note_on(0, note, 96).note_off(BEAT - 20, note);
    }
    // phrase plays three times, then the counter is cleared for the next loop
    b.iter_jump(20, 0, 1, phrase)
        .reset_iters(0, 0)
        .reverb_mod(0, 30)
        .trk_jump(0, top);
    b.build()
}

fn drum_track() -> wess_ir::TrackData {
    let mut b = TrackBuilder::new(TrackHeader {
        sound_class: SoundClass::Drums,
        max_voices: 4,
        ..TrackHeader::default()
    });
    let top = b.label();
    for key in [KICK, SNARE, KICK, SNARE] {
        b.note_on(0, key, 120).note_off(BEAT, key);
    }
    b.trk_jump(0, top);
    b.build()
}

fn sfx_track(patch: u16) -> wess_ir::TrackData {
    let mut b = TrackBuilder::new(TrackHeader {
        sound_class: SoundClass::SndFx,
        init_patch: patch,
        priority: 0xc0,
        max_voices: 1,
        ..TrackHeader::default()
    });
    b.note_on(0, 72, 127);
    for step in 1..=8i16 {
        b.pitch_mod(6, step * 1024);
    }
    b.note_off(6, 72).trk_end(0);
    b.build()
}

/// Fill every demo sample's sound RAM with a square wave.
pub fn upload_demo_samples<S: Spu>(engine: &mut Engine<S>) {
    let mut data = Vec::new();
    for (i, (addr, size)) in SAMPLES.into_iter().enumerate() {
        let period = 16 << i;
        data.clear();
        data.extend((0..size as usize).map(|n| if (n / period) % 2 == 0 { 0x40 } else { 0xc0 }));
        engine.upload_sample(addr, &data);
    }
    log::debug!(target: "wess::demo", "uploaded {} samples", SAMPLES.len());
}
