//! Public sequence control: trigger, stop, pause and master settings.
//!
//! Calls naming a sequence that is not playing are silently ignored.
//! Only triggering can fail.

use wess_ir::{vlq, Command, PanMode, SequenceStatus, SoundClass, TriggerAttrs, TriggerPlayAttr};

use crate::driver::SavedVoiceList;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::sequence::{PlayMode, SequenceSlot, ALL_SLOTS};
use crate::spu::Spu;
use crate::track::{TrackFlags, TrackId};
use crate::voice_params::mute_release_rate;

/// Which master volume a call addresses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VolumeKind {
    Sfx,
    Music,
}

/// Neutral sequence volume given to every new slot.
const SEQ_VOLUME: u8 = 128;
const SEQ_PAN: u8 = 64;

impl<S: Spu> Engine<S> {
    // === Triggers ===

    /// Start sequence `seq_idx`. Returns the sequence slot it plays in.
    pub fn trigger(&mut self, seq_idx: usize) -> Result<usize, EngineError> {
        self.start_sequence(seq_idx, 0, None, false)
    }

    /// Start a sequence with play attribute overrides.
    pub fn trigger_special(
        &mut self,
        seq_idx: usize,
        attrs: &TriggerPlayAttr,
    ) -> Result<usize, EngineError> {
        self.start_sequence(seq_idx, 0, Some(attrs), false)
    }

    /// Start a sequence tagged with `type_tag`, for later
    /// [`update_type_special`](Self::update_type_special) and
    /// [`stop_type`](Self::stop_type) calls.
    pub fn trigger_type(&mut self, seq_idx: usize, type_tag: u32) -> Result<usize, EngineError> {
        self.start_sequence(seq_idx, type_tag, None, false)
    }

    pub fn trigger_type_special(
        &mut self,
        seq_idx: usize,
        type_tag: u32,
        attrs: &TriggerPlayAttr,
    ) -> Result<usize, EngineError> {
        self.start_sequence(seq_idx, type_tag, Some(attrs), false)
    }

    /// Allocate a sequence whose tracks wait, paused, for [`restart`].
    ///
    /// Handled tracks stay allocated after they turn off until
    /// [`release_handle`](Self::release_handle) is called on the slot.
    ///
    /// [`restart`]: Self::restart
    pub fn trigger_handled(
        &mut self,
        seq_idx: usize,
        attrs: Option<&TriggerPlayAttr>,
    ) -> Result<usize, EngineError> {
        self.start_sequence(seq_idx, 0, attrs, true)
    }

    fn start_sequence(
        &mut self,
        seq_idx: usize,
        type_tag: u32,
        attrs: Option<&TriggerPlayAttr>,
        handled: bool,
    ) -> Result<usize, EngineError> {
        let wanted = self
            .module
            .sequence(seq_idx)
            .ok_or(EngineError::InvalidSequence(seq_idx))?
            .tracks
            .len();
        if wanted == 0 {
            return Err(EngineError::EmptySequence(seq_idx));
        }
        let Some(slot) = self.seqs.iter().position(|s| !s.active) else {
            log::debug!(target: "wess::api", "sequence {seq_idx}: no free sequence slot");
            return Err(EngineError::NoFreeSequence);
        };

        let seq = &mut self.seqs[slot];
        seq.tracks.fill(None);
        seq.tracks_active = 0;
        seq.tracks_playing = 0;
        seq.reset_gates(ALL_SLOTS);
        seq.reset_iters(ALL_SLOTS);

        let mut started = 0;
        for tid in 0..self.tracks.len() {
            if started == wanted {
                break;
            }
            if self.tracks[tid].is_active() {
                continue;
            }

            let data = &self.module.sequences[seq_idx].tracks[started];
            let t = &mut self.tracks[tid];
            t.fill(&data.header, attrs);
            t.seq_slot = slot;
            t.seq_idx = seq_idx;
            t.trk_idx = started;
            (t.delta, t.pc) = vlq::decode(&data.cmds, 0).unwrap_or((0, 0));

            let seq = &mut self.seqs[slot];
            if handled {
                t.flags |= TrackFlags::HANDLED | TrackFlags::STOPPED;
            } else {
                seq.tracks_playing += 1;
            }
            seq.tracks[started] = Some(tid);
            seq.tracks_active += 1;
            self.tracks_active += 1;
            started += 1;
        }

        if started == 0 {
            log::debug!(target: "wess::api", "sequence {seq_idx}: no free track");
            return Err(EngineError::NoFreeTrack);
        }
        if started < wanted {
            log::warn!(
                target: "wess::api",
                "sequence {seq_idx}: only {started} of {wanted} tracks allocated"
            );
        }

        let seq = &mut self.seqs[slot];
        seq.seq_idx = seq_idx;
        seq.type_tag = type_tag;
        seq.handled = handled;
        seq.playmode = if handled {
            PlayMode::Stopped
        } else {
            PlayMode::Playing
        };
        seq.volume = SEQ_VOLUME;
        seq.pan = SEQ_PAN;
        seq.active = true;
        self.seqs_active += 1;

        log::debug!(
            target: "wess::api",
            "sequence {seq_idx} started in slot {slot} with {started} tracks"
        );
        Ok(slot)
    }

    /// Let a handled slot's tracks return to the pool, turning them off.
    pub fn release_handle(&mut self, slot: usize) {
        let Some(seq) = self.seqs.get_mut(slot) else {
            return;
        };
        if !seq.active || !seq.handled {
            return;
        }
        seq.handled = false;
        for tid in seq.track_list() {
            self.tracks[tid].flags.remove(TrackFlags::HANDLED);
            self.driver_trk_off(tid);
        }
    }

    // === Stopping ===

    /// Turn off every instance of sequence `seq_idx`. Voices release
    /// normally.
    pub fn stop(&mut self, seq_idx: usize) {
        self.turn_off_where(|s| s.seq_idx == seq_idx);
    }

    pub fn stop_all(&mut self) {
        self.turn_off_where(|_| true);
    }

    /// Turn off every sequence triggered with `type_tag`.
    pub fn stop_type(&mut self, type_tag: u32) {
        self.turn_off_where(|s| s.type_tag == type_tag);
    }

    fn turn_off_where(&mut self, matches: impl Fn(&SequenceSlot) -> bool) {
        for slot in 0..self.seqs.len() {
            let seq = &self.seqs[slot];
            if !seq.active || !matches(seq) {
                continue;
            }
            for tid in seq.track_list() {
                self.driver_trk_off(tid);
            }
        }
    }

    // === Pausing ===

    /// Pause every instance of `seq_idx`. With `mute`, its voices are cut
    /// with the mute release; otherwise they keep sounding.
    pub fn pause(&mut self, seq_idx: usize, mute: bool) {
        for slot in 0..self.seqs.len() {
            let seq = &self.seqs[slot];
            if !seq.active || seq.seq_idx != seq_idx {
                continue;
            }
            for tid in seq.track_list() {
                self.track_stop(tid);
                if mute {
                    self.driver_trk_mute(tid, None);
                }
            }
        }
    }

    /// Resume every instance of `seq_idx`.
    pub fn restart(&mut self, seq_idx: usize) {
        for slot in 0..self.seqs.len() {
            let seq = &self.seqs[slot];
            if !seq.active || seq.seq_idx != seq_idx {
                continue;
            }
            for tid in seq.track_list() {
                self.track_start(tid);
            }
        }
    }

    /// Pause everything. When muting, music voices that were still held
    /// are recorded into `saved` so [`restart_all`](Self::restart_all) can
    /// strike them again.
    pub fn pause_all(&mut self, mute: bool, mut saved: Option<&mut SavedVoiceList>) {
        for slot in 0..self.seqs.len() {
            let seq = &self.seqs[slot];
            if !seq.active {
                continue;
            }
            for tid in seq.track_list() {
                if mute {
                    self.driver_trk_mute(tid, saved.as_deref_mut());
                }
                self.track_stop(tid);
            }
        }
    }

    /// Resume everything, replaying and then clearing any saved voices.
    pub fn restart_all(&mut self, mut saved: Option<&mut SavedVoiceList>) {
        for slot in 0..self.seqs.len() {
            let seq = &self.seqs[slot];
            if !seq.active {
                continue;
            }
            let seq_idx = seq.seq_idx;
            for tid in seq.track_list() {
                self.track_start(tid);
                let Some(list) = saved.as_deref() else {
                    continue;
                };
                for v in list.iter() {
                    if v.track == tid && v.seq_idx == seq_idx {
                        self.voice_note(tid, v.patch_voice, v.note, v.volume);
                    }
                }
            }
        }
        if let Some(list) = saved.as_deref_mut() {
            list.clear();
        }
    }

    fn track_start(&mut self, tid: TrackId) {
        let t = &mut self.tracks[tid];
        if t.is_stopped() {
            t.flags.remove(TrackFlags::STOPPED);
            self.seqs[t.seq_slot].track_started();
        }
    }

    fn track_stop(&mut self, tid: TrackId) {
        let t = &mut self.tracks[tid];
        if !t.is_stopped() {
            t.flags |= TrackFlags::STOPPED;
            self.seqs[t.seq_slot].track_stopped();
        }
    }

    // === Queries ===

    pub fn status(&self, seq_idx: usize) -> SequenceStatus {
        if self.module.sequence(seq_idx).is_none() {
            return SequenceStatus::Invalid;
        }
        match self.seqs.iter().find(|s| s.active && s.seq_idx == seq_idx) {
            Some(s) if s.playmode == PlayMode::Playing => SequenceStatus::Playing,
            Some(_) => SequenceStatus::Stopped,
            None => SequenceStatus::Inactive,
        }
    }

    // === Master settings ===

    pub fn master_volume(&self, kind: VolumeKind) -> u8 {
        match kind {
            VolumeKind::Sfx => self.sfx_volume,
            VolumeKind::Music => self.music_volume,
        }
    }

    /// Set a master volume. Music changes reach sounding voices at once;
    /// effects pick theirs up from the next note.
    pub fn set_master_volume(&mut self, kind: VolumeKind, volume: u8) {
        match kind {
            VolumeKind::Sfx => self.sfx_volume = volume,
            VolumeKind::Music => {
                self.music_volume = volume;
                for tid in 0..self.tracks.len() {
                    let t = &self.tracks[tid];
                    if t.is_active() && t.class == SoundClass::Music {
                        let cmd = Command::volume_mod(t.volume);
                        self.driver_cmd(tid, &cmd);
                    }
                }
            }
        }
    }

    pub fn pan_mode(&self) -> PanMode {
        self.pan_mode
    }

    pub fn set_pan_mode(&mut self, mode: PanMode) {
        self.pan_mode = mode;
    }

    /// Use the fastest mute release that takes no longer than `ms`.
    pub fn set_mute_release(&mut self, ms: u32) {
        self.mute_release_rate = mute_release_rate(ms);
        log::debug!(target: "wess::api", "mute release {ms} ms, rate {}", self.mute_release_rate);
    }

    /// Re-apply play attributes to every sequence triggered with
    /// `type_tag`. Only attributes named in the mask change.
    pub fn update_type_special(&mut self, type_tag: u32, attrs: &TriggerPlayAttr) {
        if attrs.mask.is_empty() {
            return;
        }
        for slot in 0..self.seqs.len() {
            let seq = &self.seqs[slot];
            if !seq.active || seq.type_tag != type_tag {
                continue;
            }
            for tid in seq.track_list() {
                self.update_track(tid, attrs);
            }
        }
    }

    fn update_track(&mut self, tid: TrackId, attrs: &TriggerPlayAttr) {
        let mask = attrs.mask;

        if mask.contains(TriggerAttrs::PAN) {
            self.tracks[tid].pan = attrs.pan;
        }
        if mask.contains(TriggerAttrs::VOLUME) {
            self.driver_cmd(tid, &Command::volume_mod(attrs.volume));
        } else if mask.contains(TriggerAttrs::PAN) {
            self.driver_cmd(tid, &Command::pan_mod(attrs.pan));
        }
        if mask.contains(TriggerAttrs::PITCH) {
            self.driver_cmd(tid, &Command::pitch_mod(attrs.pitch));
        }

        let t = &mut self.tracks[tid];
        if mask.contains(TriggerAttrs::PATCH) {
            t.patch = attrs.patch;
        }
        if mask.contains(TriggerAttrs::MUTEMODE) {
            t.flags.set(TrackFlags::MUTE, attrs.mutes(t.mutegroups_mask));
        }
        if mask.contains(TriggerAttrs::TEMPO) {
            t.set_tempo(attrs.tempo);
        }
        if mask.contains(TriggerAttrs::TIMED) {
            t.end = t.total.wrapping_add(attrs.playtime);
            t.flags |= TrackFlags::TIMED;
        }
        if mask.contains(TriggerAttrs::LOOPED) {
            t.flags |= TrackFlags::LOOPED;
        }
        if mask.contains(TriggerAttrs::REVERB) {
            t.reverb = attrs.reverb;
        }
    }
}
