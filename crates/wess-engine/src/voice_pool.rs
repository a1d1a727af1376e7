//! VoicePool: hardware voice slots and the allocation policy over them.

use crate::spu::SPU_NUM_VOICES;
use crate::track::TrackId;
use crate::voice::VoiceStatus;

/// Identifier for a hardware voice slot.
pub type VoiceId = usize;

/// Where a new note should go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    /// An idle voice.
    Free(VoiceId),
    /// A sounding voice to cut off and reuse.
    Steal(VoiceId),
}

/// Fixed set of hardware voices.
#[derive(Clone, Debug)]
pub struct VoicePool {
    slots: [VoiceStatus; SPU_NUM_VOICES],
    /// Voices the driver may use, at most [`SPU_NUM_VOICES`].
    limit: usize,
    active: usize,
}

impl VoicePool {
    pub fn new(limit: usize) -> Self {
        Self {
            slots: [VoiceStatus::default(); SPU_NUM_VOICES],
            limit: limit.min(SPU_NUM_VOICES),
            active: 0,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn get(&self, id: VoiceId) -> Option<&VoiceStatus> {
        self.slots[..self.limit].get(id)
    }

    pub fn get_mut(&mut self, id: VoiceId) -> Option<&mut VoiceStatus> {
        self.slots[..self.limit].get_mut(id)
    }

    /// Count of active voices.
    pub fn active_count(&self) -> usize {
        self.active
    }

    /// Active voices owned by `track`.
    pub fn owned_by(&self, track: TrackId) -> impl Iterator<Item = VoiceId> + '_ {
        self.slots[..self.limit]
            .iter()
            .enumerate()
            .filter(move |(_, v)| v.is_owned_by(track))
            .map(|(i, _)| i)
    }

    /// Decide which voice a note from a track of `priority` gets.
    ///
    /// The first idle voice wins outright. Otherwise only voices whose
    /// priority does not exceed the requester's are candidates, and among
    /// those the scan prefers a lower priority, then a releasing voice, then
    /// the oldest on/off time. `None` means the note is dropped.
    pub fn pick_slot(&self, priority: u8) -> Option<Slot> {
        let voices = &self.slots[..self.limit];
        if let Some(id) = voices.iter().position(|v| !v.active) {
            return Some(Slot::Free(id));
        }

        let mut stolen: Option<VoiceId> = None;
        let mut stolen_priority: u32 = 256;
        let mut stolen_onoff: u32 = u32::MAX;

        for (id, v) in voices.iter().enumerate() {
            if v.priority > priority {
                continue;
            }

            let steal = match stolen {
                None => true,
                Some(c) => {
                    let candidate_release = voices[c].release;
                    if stolen_priority > v.priority as u32 {
                        true
                    } else if v.release {
                        v.onoff < stolen_onoff || !candidate_release
                    } else {
                        v.onoff < stolen_onoff && !candidate_release
                    }
                }
            };

            if steal {
                stolen = Some(id);
                stolen_priority = v.priority as u32;
                stolen_onoff = v.onoff;
            }
        }

        stolen.map(Slot::Steal)
    }

    /// Put `status` into slot `id` and mark it active.
    pub(crate) fn occupy(&mut self, id: VoiceId, status: VoiceStatus) {
        if let Some(slot) = self.slots[..self.limit].get_mut(id) {
            if !slot.active {
                self.active += 1;
            }
            *slot = VoiceStatus {
                active: true,
                release: false,
                ..status
            };
        }
    }

    /// Free slot `id`, returning what it held if it was active.
    pub(crate) fn vacate(&mut self, id: VoiceId) -> Option<VoiceStatus> {
        let slot = self.slots[..self.limit].get_mut(id)?;
        if !slot.active {
            return None;
        }
        let old = *slot;
        slot.active = false;
        slot.release = false;
        self.active -= 1;
        Some(old)
    }
}
