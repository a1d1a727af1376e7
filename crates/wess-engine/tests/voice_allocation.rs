//! Voice allocation through the public engine API: priority stealing and
//! the hardware voice limit.

use wess_engine::{Engine, SoftSpu};
use wess_ir::{
    Module, ModuleLimits, PatchSample, PatchVoice, SequenceData, TrackBuilder, TrackHeader,
};

/// One single-track sequence per priority, each holding one note forever.
fn held_notes(priorities: &[u8], voice_limit: u8) -> Module {
    let mut module = Module {
        limits: ModuleLimits {
            voice_limit,
            ..ModuleLimits::default()
        },
        ..Module::default()
    };
    let sample = module.patches.add_sample(PatchSample {
        spu_addr: 0x1000,
        size: 0x100,
    });
    module.patches.add_patch(&[PatchVoice {
        sample_idx: sample,
        ..PatchVoice::default()
    }]);
    for (i, &priority) in priorities.iter().enumerate() {
        let mut b = TrackBuilder::new(TrackHeader {
            priority,
            ..TrackHeader::default()
        });
        b.note_on(0, 40 + i as u8, 100).trk_end(1_000_000);
        module.sequences.push(SequenceData {
            tracks: vec![b.build()],
        });
    }
    module
}

fn engine(priorities: &[u8], voice_limit: u8) -> Engine<SoftSpu> {
    Engine::new(held_notes(priorities, voice_limit), SoftSpu::new()).unwrap()
}

/// Fill all four voices with priorities 5, 3, 7 and 1.
fn full_engine(extra: u8) -> Engine<SoftSpu> {
    let mut e = engine(&[5, 3, 7, 1, extra], 4);
    for seq in 0..4 {
        e.trigger(seq).unwrap();
    }
    e.tick();
    assert_eq!(e.active_voices(), 4);
    e
}

fn owners(e: &Engine<SoftSpu>) -> Vec<usize> {
    (0..4).map(|v| e.voice(v).unwrap().track).collect()
}

// === Stealing ===

#[test]
fn low_priority_request_steals_lowest_voice() {
    let mut e = full_engine(2);
    e.trigger(4).unwrap();
    e.tick();
    assert_eq!(owners(&e), vec![0, 1, 2, 4]);
    assert_eq!(e.voice(3).unwrap().note, 44);
    assert_eq!(e.track(3).unwrap().voices_active, 0);
    assert_eq!(e.active_voices(), 4);
}

#[test]
fn request_below_every_voice_is_dropped() {
    let mut e = full_engine(0);
    e.trigger(4).unwrap();
    e.tick();
    assert_eq!(owners(&e), vec![0, 1, 2, 3]);
    assert_eq!(e.track(4).unwrap().voices_active, 0);
}

#[test]
fn high_priority_request_still_takes_lowest_voice() {
    let mut e = full_engine(8);
    e.trigger(4).unwrap();
    e.tick();
    assert_eq!(owners(&e), vec![0, 1, 2, 4]);
}

#[test]
fn equal_priority_prefers_oldest_voice() {
    let mut e = engine(&[4, 4, 4], 2);
    e.trigger(0).unwrap();
    e.tick();
    e.trigger(1).unwrap();
    e.tick();
    e.trigger(2).unwrap();
    e.tick();
    assert_eq!(e.voice(0).unwrap().track, 2);
    assert_eq!(e.voice(1).unwrap().track, 1);
}

// === Voice limit ===

#[test]
fn active_voices_never_exceed_limit() {
    let mut module = held_notes(&[], 6);
    module.limits.max_active_sequences = 10;
    for n in 0..10u8 {
        let mut b = TrackBuilder::new(TrackHeader {
            priority: n * 20,
            max_voices: 3,
            ..TrackHeader::default()
        });
        let top = b.label();
        b.note_on(0, 50 + n, 90)
            .note_on(3, 55 + n, 90)
            .note_off(5 + n as u32, 50 + n)
            .note_off(2, 55 + n)
            .trk_jump(7, top);
        module.sequences.push(SequenceData {
            tracks: vec![b.build()],
        });
    }

    let mut e = Engine::new(module, SoftSpu::new()).unwrap();
    for seq in 0..10 {
        e.trigger(seq).unwrap();
    }
    for _ in 0..2000 {
        e.tick();
        assert!(e.active_voices() <= 6);
        for tid in 0..10 {
            assert!(e.track(tid).unwrap().voices_active <= 3);
        }
    }
}
