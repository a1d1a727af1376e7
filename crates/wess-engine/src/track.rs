//! Run-time state of a playing track.

use bitflags::bitflags;
use heapless::Vec as StackVec;
use wess_ir::{
    calc_parts_per_int, DriverId, SoundClass, TrackHeader, TriggerAttrs, TriggerPlayAttr,
    INTS_PER_SEC,
};

/// Index into the engine's track pool.
pub type TrackId = usize;

/// Deepest return-address stack a track may declare.
pub const LOC_STACK_CAP: usize = 16;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct TrackFlags: u16 {
        /// Allocated to a sequence.
        const ACTIVE  = 0x01;
        /// Paused: time does not advance.
        const STOPPED = 0x02;
        /// Set by a matching mute group. State only; the driver never reads it.
        const MUTE    = 0x04;
        /// TrkEnd rewinds instead of ending.
        const LOOPED  = 0x08;
        /// Turns itself off once `total` reaches `end`.
        const TIMED   = 0x10;
        /// Turned off, waiting for its last voices to finish.
        const OFF     = 0x20;
        /// Kept in the pool after turning off, until the handle is released.
        const HANDLED = 0x40;
    }
}

/// One slot of the engine's track pool.
#[derive(Clone, Debug, Default)]
pub struct TrackStatus {
    pub flags: TrackFlags,
    /// Owning sequence slot.
    pub seq_slot: usize,
    /// Module sequence the track data comes from.
    pub seq_idx: usize,
    /// Track within that sequence.
    pub trk_idx: usize,
    pub driver: DriverId,
    pub class: SoundClass,
    pub priority: u8,
    pub max_voices: u8,
    pub voices_active: u8,
    pub mutegroups_mask: u32,
    pub patch: u16,
    pub pitch: i16,
    pub volume: u8,
    pub pan: u8,
    pub reverb: u8,
    pub ppq: u16,
    pub qpm: u16,
    /// Parts per interrupt, 16.16.
    pub ppi: u32,
    /// Fractional part of elapsed time, 16.16.
    pub frac: u32,
    /// Whole parts elapsed since the track started.
    pub total: u32,
    /// Whole parts elapsed since the last command ran.
    pub acc: u32,
    /// `total` at which a timed track ends.
    pub end: u32,
    /// Parts to wait before the command at `pc`.
    pub delta: u32,
    /// Byte offset of the next command.
    pub pc: usize,
    pub loc_stack: StackVec<usize, LOC_STACK_CAP>,
    pub loc_stack_size: usize,
}

impl TrackStatus {
    pub fn is_active(&self) -> bool {
        self.flags.contains(TrackFlags::ACTIVE)
    }

    pub fn is_stopped(&self) -> bool {
        self.flags.contains(TrackFlags::STOPPED)
    }

    pub fn is_handled(&self) -> bool {
        self.flags.contains(TrackFlags::HANDLED)
    }

    /// Active and not paused.
    pub fn is_running(&self) -> bool {
        self.is_active() && !self.is_stopped()
    }

    /// Initialise from a track header, with `attrs` overriding it.
    ///
    /// Leaves `pc`, `delta` and the sequence links to the caller.
    pub fn fill(&mut self, header: &TrackHeader, attrs: Option<&TriggerPlayAttr>) {
        let none = TriggerPlayAttr::default();
        let attrs = attrs.unwrap_or(&none);
        let mask = attrs.mask;

        self.flags = TrackFlags::ACTIVE;
        self.driver = header.driver;
        self.priority = header.priority;
        self.class = header.sound_class;
        self.voices_active = 0;
        self.max_voices = header.max_voices;
        self.ppq = header.init_ppq;
        self.frac = 0;
        self.acc = 0;
        self.total = 0;
        self.end = 0;
        self.loc_stack.clear();
        self.loc_stack_size = (header.loc_stack_size as usize).min(LOC_STACK_CAP);
        self.mutegroups_mask = header.mutegroups_mask;

        self.volume = pick(mask, TriggerAttrs::VOLUME, attrs.volume, header.init_volume);
        self.pan = pick(mask, TriggerAttrs::PAN, attrs.pan, header.init_pan);
        self.patch = pick(mask, TriggerAttrs::PATCH, attrs.patch, header.init_patch);
        self.pitch = pick(mask, TriggerAttrs::PITCH, attrs.pitch, header.init_pitch);
        self.qpm = pick(mask, TriggerAttrs::TEMPO, attrs.tempo, header.init_qpm);
        self.reverb = pick(mask, TriggerAttrs::REVERB, attrs.reverb, header.init_reverb);
        self.flags.set(TrackFlags::MUTE, attrs.mutes(self.mutegroups_mask));
        self.recompute_ppi();

        if mask.contains(TriggerAttrs::TIMED) {
            self.flags |= TrackFlags::TIMED;
            self.end = self.total.wrapping_add(attrs.playtime);
        }
        self.flags.set(TrackFlags::LOOPED, mask.contains(TriggerAttrs::LOOPED));
    }

    pub fn set_tempo(&mut self, qpm: u16) {
        self.qpm = qpm;
        self.recompute_ppi();
    }

    pub fn recompute_ppi(&mut self) {
        self.ppi = calc_parts_per_int(INTS_PER_SEC, self.ppq, self.qpm);
    }

    /// Push a return address. Fails when the declared stack depth is used.
    pub fn push_return(&mut self, addr: usize) -> bool {
        self.loc_stack.len() < self.loc_stack_size && self.loc_stack.push(addr).is_ok()
    }

    pub fn pop_return(&mut self) -> Option<usize> {
        self.loc_stack.pop()
    }
}

fn pick<T>(mask: TriggerAttrs, bit: TriggerAttrs, attr: T, default: T) -> T {
    if mask.contains(bit) {
        attr
    } else {
        default
    }
}
