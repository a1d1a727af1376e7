//! Run-time state of a triggered sequence.

use alloc::vec;
use alloc::vec::Vec;

use crate::track::TrackId;

/// Gate and iteration slots hold this until first written.
pub const UNSET: u8 = 0xFF;

/// Index argument that addresses every gate or iteration slot.
pub const ALL_SLOTS: u8 = 0xFF;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlayMode {
    #[default]
    Stopped,
    Playing,
}

/// One slot of the engine's sequence pool.
///
/// The vectors are sized once at engine construction and never grow.
#[derive(Clone, Debug, Default)]
pub struct SequenceSlot {
    pub active: bool,
    /// Allocated by a handled trigger; tracks stay in the pool after
    /// turning off.
    pub handled: bool,
    /// Module sequence playing in this slot.
    pub seq_idx: usize,
    /// Caller-chosen tag from a typed trigger, 0 otherwise.
    pub type_tag: u32,
    pub playmode: PlayMode,
    pub tracks_active: usize,
    pub tracks_playing: usize,
    /// Sequence-wide volume and pan, reset on every trigger. Informational:
    /// track and master levels decide what voices play at.
    pub volume: u8,
    pub pan: u8,
    pub gates: Vec<u8>,
    pub iters: Vec<u8>,
    /// Track pool entries, in the sequence's track order.
    pub tracks: Vec<Option<TrackId>>,
}

impl SequenceSlot {
    pub fn new(gates: usize, iters: usize, tracks: usize) -> Self {
        Self {
            gates: vec![UNSET; gates],
            iters: vec![UNSET; iters],
            tracks: vec![None; tracks],
            ..Self::default()
        }
    }

    /// Live track ids of this slot.
    pub fn track_ids(&self) -> impl Iterator<Item = TrackId> + '_ {
        self.tracks.iter().flatten().copied()
    }

    /// Copy of the live track ids, so callers can mutate the engine while
    /// walking them.
    pub fn track_list(&self) -> TrackList {
        let mut list = TrackList::new();
        for tid in self.track_ids() {
            if list.try_push(tid).is_err() {
                break;
            }
        }
        list
    }

    /// Reset gate `idx`, or every gate for [`ALL_SLOTS`].
    pub fn reset_gates(&mut self, idx: u8) {
        reset(&mut self.gates, idx);
    }

    /// Reset iteration counter `idx`, or all of them for [`ALL_SLOTS`].
    pub fn reset_iters(&mut self, idx: u8) {
        reset(&mut self.iters, idx);
    }

    pub fn remove_track(&mut self, tid: TrackId) {
        for slot in self.tracks.iter_mut() {
            if *slot == Some(tid) {
                *slot = None;
            }
        }
    }

    /// Count one more playing track.
    pub fn track_started(&mut self) {
        self.tracks_playing += 1;
        self.playmode = PlayMode::Playing;
    }

    /// Count one fewer playing track.
    pub fn track_stopped(&mut self) {
        self.tracks_playing = self.tracks_playing.saturating_sub(1);
        if self.tracks_playing == 0 {
            self.playmode = PlayMode::Stopped;
        }
    }
}

fn reset(slots: &mut [u8], idx: u8) {
    if idx == ALL_SLOTS {
        slots.fill(UNSET);
    } else if let Some(slot) = slots.get_mut(idx as usize) {
        *slot = UNSET;
    }
}

/// Most tracks one sequence can hold.
pub const MAX_TRACKS_PER_SEQ: usize = 256;

/// Fixed-capacity snapshot of a sequence's track ids.
pub type TrackList = arrayvec::ArrayVec<TrackId, MAX_TRACKS_PER_SEQ>;
