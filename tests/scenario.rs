//! End-to-end playback of a two-track sequence: one track parks inside a
//! subroutine while the other plays and releases a note.

use wess_engine::{Engine, SoftSpu};
use wess_ir::{
    calc_parts_per_int, Module, PatchSample, PatchVoice, SequenceData, TrackBuilder, TrackHeader,
};

const GOSUB_DELTA: u32 = 5;
const NOTE_ON_DELTA: u32 = 2;
const NOTE_OFF_DELTA: u32 = 4;

/// Ticks until a track at the default tempo has played `parts`.
fn ticks_for(parts: u32) -> u64 {
    let ppi = calc_parts_per_int(120, 120, 120) as u64;
    (1..).find(|n| n * ppi >> 16 >= parts as u64).unwrap_or(0)
}

struct Scenario {
    engine: Engine<SoftSpu>,
    sub_label: usize,
}

fn scenario() -> Scenario {
    let mut module = Module::default();
    let sample = module.patches.add_sample(PatchSample {
        spu_addr: 0x1000,
        size: 0x200,
    });
    module.patches.add_patch(&[PatchVoice {
        sample_idx: sample,
        ..PatchVoice::default()
    }]);

    let mut a = TrackBuilder::new(TrackHeader::default());
    let labels: Vec<u16> = (0..4).map(|_| a.reserve_label()).collect();
    a.place_label(labels[0])
        .trk_gosub(GOSUB_DELTA, labels[3])
        .place_label(labels[1])
        .trk_end(0)
        .place_label(labels[2])
        .pan_mod(0, 40)
        .place_label(labels[3])
        .volume_mod(0, 90)
        .trk_ret(0);

    let mut b = TrackBuilder::new(TrackHeader::default());
    b.note_on(NOTE_ON_DELTA, 60, 100)
        .note_off(NOTE_OFF_DELTA, 60)
        .trk_end(200);

    let a = a.build();
    let sub_label = a.labels[3] as usize;
    module.sequences.push(SequenceData {
        tracks: vec![a, b.build()],
    });
    Scenario {
        engine: Engine::new(module, SoftSpu::new()).unwrap(),
        sub_label,
    }
}

#[test]
fn subroutine_track_waits_while_note_track_releases() {
    let Scenario { mut engine, sub_label } = scenario();
    let baseline = engine.active_voices();
    engine.trigger(0).unwrap();

    let note_on_at = ticks_for(NOTE_ON_DELTA);
    let note_off_at = ticks_for(NOTE_ON_DELTA + NOTE_OFF_DELTA);
    assert!(note_on_at < note_off_at);

    for _ in 0..note_on_at {
        engine.tick();
    }
    assert_eq!(engine.active_voices(), baseline + 1);

    for _ in note_on_at..note_off_at {
        engine.tick();
    }
    assert_eq!(engine.active_voices(), baseline);

    let a = engine.track(0).unwrap();
    assert!(a.is_active());
    assert_eq!(a.pc, sub_label);
    assert_eq!(a.loc_stack.len(), 1);
    assert_eq!(a.volume, 127, "subroutine body has not run yet");
}

#[test]
fn subroutine_returns_and_both_tracks_finish() {
    let Scenario { mut engine, .. } = scenario();
    engine.trigger(0).unwrap();

    for _ in 0..ticks_for(GOSUB_DELTA * 2) {
        engine.tick();
    }
    assert!(!engine.track(0).unwrap().is_active(), "returned into TrkEnd");
    assert_eq!(engine.active_tracks(), 1);

    for _ in 0..ticks_for(NOTE_ON_DELTA + NOTE_OFF_DELTA + 200) {
        engine.tick();
    }
    assert_eq!(engine.active_tracks(), 0);
    assert_eq!(engine.active_sequences(), 0);
    assert_eq!(engine.spu().key_on_count(), 1);
    assert_eq!(engine.spu().key_off_count(), 1);
}
