//! Byte-code interpreter.
//!
//! Each tick every running track advances by its parts-per-interrupt and
//! executes commands while the accumulated time covers the pending delta.
//! Driver commands go to the track's sound driver; the rest are control
//! flow handled here.

use wess_ir::{vlq, Command, Opcode, TrackData};

use crate::engine::Engine;
use crate::sequence::UNSET;
use crate::spu::Spu;
use crate::track::{TrackFlags, TrackId};

/// Commands one track may run in a single tick before it is forced off.
pub const MAX_CMDS_PER_TICK: usize = 4096;

/// Total parts a looped track must have played before TrkEnd rewinds it.
const MIN_LOOP_PARTS: u32 = 16;

/// What the interpreter does after an engine command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Flow {
    /// Step past the command and read the next delta time.
    Advance,
    /// The command placed the track itself, or the track must stay put.
    Hold,
}

impl<S: Spu> Engine<S> {
    pub(crate) fn run_sequencer(&mut self) {
        for tid in 0..self.tracks.len() {
            if self.tracks[tid].is_running() {
                self.run_track(tid);
            }
        }
    }

    fn run_track(&mut self, tid: TrackId) {
        let t = &mut self.tracks[tid];
        t.frac = t.frac.wrapping_add(t.ppi);
        let whole = t.frac >> 16;
        t.total = t.total.wrapping_add(whole);
        t.acc = t.acc.wrapping_add(whole);
        t.frac &= 0xFFFF;

        if t.flags.contains(TrackFlags::TIMED) && t.total >= t.end {
            log::trace!(target: "wess::seq", "track {tid} reached its play time");
            self.driver_trk_off(tid);
            return;
        }

        let mut budget = MAX_CMDS_PER_TICK;
        loop {
            let t = &mut self.tracks[tid];
            if !t.is_running() || t.acc < t.delta {
                break;
            }
            if budget == 0 {
                log::warn!(
                    target: "wess::seq",
                    "track {tid} ran {MAX_CMDS_PER_TICK} commands in one tick, turning it off"
                );
                self.driver_trk_off(tid);
                break;
            }
            budget -= 1;
            t.acc -= t.delta;
            self.step(tid);
        }
    }

    pub(crate) fn track_data(&self, tid: TrackId) -> Option<&TrackData> {
        let t = self.tracks.get(tid)?;
        self.module.sequences.get(t.seq_idx)?.tracks.get(t.trk_idx)
    }

    /// Execute the command at the track's position.
    fn step(&mut self, tid: TrackId) {
        let pc = self.tracks[tid].pc;
        let Some(cmd) = self.track_data(tid).and_then(|d| Command::decode(&d.cmds, pc)) else {
            log::warn!(target: "wess::seq", "track {tid}: unreadable command at {pc}, ending sequence");
            self.seq_end(tid);
            return;
        };

        let op = cmd.op();
        if op.is_driver_cmd() {
            self.driver_cmd(tid, &cmd);
            self.next_event(tid, pc + cmd.len());
        } else if op.is_engine_cmd() {
            let flow = self.engine_cmd(tid, &cmd);
            if flow == Flow::Advance && self.tracks[tid].is_active() {
                self.next_event(tid, pc + cmd.len());
            }
        } else {
            log::warn!(target: "wess::seq", "track {tid}: {op:?} is not a stream command, ending sequence");
            self.seq_end(tid);
        }
    }

    /// Read the delta time at `at` and make the command after it current.
    fn next_event(&mut self, tid: TrackId, at: usize) {
        if !self.read_delta(tid, at) && self.tracks[tid].is_running() {
            log::warn!(target: "wess::seq", "track {tid}: stream ends at {at}, ending sequence");
            self.seq_end(tid);
        }
    }

    /// Position track `tid` after the delta time at `at`.
    fn read_delta(&mut self, tid: TrackId, at: usize) -> bool {
        let Some((delta, len)) = self.track_data(tid).and_then(|d| vlq::decode(&d.cmds, at)) else {
            return false;
        };
        let t = &mut self.tracks[tid];
        t.pc = at + len;
        t.delta = delta;
        true
    }

    fn label(&self, tid: TrackId, label: i16) -> Option<usize> {
        self.track_data(tid)?.label(label as i32)
    }

    // === Engine commands ===

    pub(crate) fn engine_cmd(&mut self, tid: TrackId, cmd: &Command) -> Flow {
        let slot = self.tracks[tid].seq_slot;
        match cmd.op() {
            Opcode::StatusMark => {
                self.status_mark(cmd.byte(1), cmd.i16_at(2));
                Flow::Advance
            }
            Opcode::GateJump => {
                let Some(gate) = self.seqs[slot].gates.get_mut(cmd.byte(1) as usize) else {
                    return Flow::Advance;
                };
                if *gate == 0 {
                    return Flow::Advance;
                }
                if *gate == UNSET {
                    *gate = cmd.byte(2);
                }
                self.jump(tid, cmd.i16_at(3))
            }
            Opcode::IterJump => {
                let Some(iter) = self.seqs[slot].iters.get_mut(cmd.byte(1) as usize) else {
                    return Flow::Advance;
                };
                if *iter == 0 {
                    return Flow::Advance;
                }
                *iter = if *iter == UNSET { cmd.byte(2) } else { *iter - 1 };
                self.jump(tid, cmd.i16_at(3))
            }
            Opcode::ResetGates => {
                self.seqs[slot].reset_gates(cmd.byte(1));
                Flow::Advance
            }
            Opcode::ResetIters => {
                self.seqs[slot].reset_iters(cmd.byte(1));
                Flow::Advance
            }
            Opcode::WriteIterBox => {
                if let Some(iter) = self.seqs[slot].iters.get_mut(cmd.byte(1) as usize) {
                    *iter = cmd.byte(2);
                }
                Flow::Advance
            }
            Opcode::SeqTempo => {
                let qpm = cmd.u16_at(1);
                for other in self.seqs[slot].track_list() {
                    self.tracks[other].set_tempo(qpm);
                }
                Flow::Advance
            }
            Opcode::SeqGosub => self.seq_gosub(tid, cmd.i16_at(1)),
            Opcode::SeqJump => self.seq_jump(tid, cmd.i16_at(1)),
            Opcode::SeqRet => self.seq_ret(tid),
            Opcode::SeqEnd => {
                self.seq_end(tid);
                self.hold_if_handled(tid)
            }
            Opcode::TrkTempo => {
                self.tracks[tid].set_tempo(cmd.u16_at(1));
                Flow::Advance
            }
            Opcode::TrkGosub => self.gosub(tid, cmd.i16_at(1)),
            Opcode::TrkJump => match self.jump(tid, cmd.i16_at(1)) {
                Flow::Hold => {
                    self.tracks[tid].delta = 0;
                    Flow::Hold
                }
                Flow::Advance => Flow::Advance,
            },
            Opcode::TrkRet => self.ret(tid),
            Opcode::TrkEnd => {
                let t = &self.tracks[tid];
                if t.flags.contains(TrackFlags::LOOPED)
                    && t.total >= MIN_LOOP_PARTS
                    && self.read_delta(tid, 0)
                {
                    return Flow::Hold;
                }
                self.driver_trk_off(tid);
                self.hold_if_handled(tid)
            }
            _ => Flow::Advance,
        }
    }

    fn hold_if_handled(&self, tid: TrackId) -> Flow {
        if self.tracks[tid].is_handled() {
            Flow::Hold
        } else {
            Flow::Advance
        }
    }

    /// Move `tid` to a label, keeping its pending delta.
    fn jump(&mut self, tid: TrackId, label: i16) -> Flow {
        match self.label(tid, label) {
            Some(at) => {
                self.tracks[tid].pc = at;
                Flow::Hold
            }
            None => Flow::Advance,
        }
    }

    /// Push the address past this command and jump.
    fn gosub(&mut self, tid: TrackId, label: i16) -> Flow {
        let Some(at) = self.label(tid, label) else {
            return Flow::Advance;
        };
        let t = &mut self.tracks[tid];
        let ret = t.pc + Opcode::TrkGosub.byte_len();
        if !t.push_return(ret) {
            log::debug!(target: "wess::seq", "track {tid}: return stack full, gosub ignored");
            return Flow::Advance;
        }
        t.pc = at;
        Flow::Hold
    }

    /// Pop a return address and resume at the delta time stored there.
    fn ret(&mut self, tid: TrackId) -> Flow {
        match self.tracks[tid].pop_return() {
            Some(at) if self.read_delta(tid, at) => Flow::Hold,
            _ => Flow::Advance,
        }
    }

    /// Apply `op` to every track of the issuer's sequence. The issuer's
    /// flow follows what happened to the issuer itself.
    fn for_sequence(&mut self, tid: TrackId, mut op: impl FnMut(&mut Self, TrackId) -> Flow) -> Flow {
        let slot = self.tracks[tid].seq_slot;
        let mut flow = Flow::Advance;
        for other in self.seqs[slot].track_list() {
            let f = op(self, other);
            if other == tid {
                flow = f;
            }
        }
        flow
    }

    fn seq_gosub(&mut self, tid: TrackId, label: i16) -> Flow {
        if self.label(tid, label).is_none() {
            return Flow::Advance;
        }
        self.for_sequence(tid, |e, other| e.gosub(other, label))
    }

    fn seq_jump(&mut self, tid: TrackId, label: i16) -> Flow {
        if self.label(tid, label).is_none() {
            return Flow::Advance;
        }
        self.for_sequence(tid, |e, other| e.jump(other, label))
    }

    fn seq_ret(&mut self, tid: TrackId) -> Flow {
        self.for_sequence(tid, |e, other| e.ret(other))
    }

    /// Turn off every track of the issuer's sequence.
    pub(crate) fn seq_end(&mut self, tid: TrackId) {
        let slot = self.tracks[tid].seq_slot;
        for other in self.seqs[slot].track_list() {
            self.driver_trk_off(other);
        }
    }

    // === Track teardown ===

    /// Stop a track and, unless handled, return it to the pool.
    pub(crate) fn eng_trk_off(&mut self, tid: TrackId) {
        let t = &mut self.tracks[tid];
        let slot = t.seq_slot;
        if !t.is_stopped() {
            t.flags |= TrackFlags::STOPPED;
            self.seqs[slot].track_stopped();
        }

        if !t.is_handled() {
            t.flags.remove(TrackFlags::ACTIVE);
            self.tracks_active = self.tracks_active.saturating_sub(1);

            let seq = &mut self.seqs[slot];
            seq.remove_track(tid);
            seq.tracks_active = seq.tracks_active.saturating_sub(1);
            if seq.tracks_active == 0 && seq.active {
                seq.active = false;
                self.seqs_active = self.seqs_active.saturating_sub(1);
                log::trace!(target: "wess::seq", "sequence slot {slot} finished");
            }
        }

        t.flags.remove(TrackFlags::TIMED);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::soft_spu::SoftSpu;
    use alloc::vec;
    use alloc::vec::Vec;
    use std::sync::{Arc, Mutex};
    use wess_ir::{Module, SequenceData, TrackBuilder, TrackHeader, TriggerPlayAttr};

    fn silent() -> TrackHeader {
        TrackHeader {
            driver: wess_ir::DriverId::NoSound,
            ..TrackHeader::default()
        }
    }

    fn module(tracks: Vec<TrackBuilder>) -> Module {
        Module {
            sequences: vec![SequenceData {
                tracks: tracks.iter().map(TrackBuilder::build).collect(),
            }],
            ..Module::default()
        }
    }

    fn engine(tracks: Vec<TrackBuilder>) -> Engine<SoftSpu> {
        Engine::new(module(tracks), SoftSpu::new()).unwrap()
    }

    fn ticks(e: &mut Engine<SoftSpu>, n: usize) {
        for _ in 0..n {
            e.tick();
        }
    }

    // === Timing ===

    #[test]
    fn track_time_advances_by_ppi() {
        let mut b = TrackBuilder::new(silent());
        b.trk_end(10_000);
        let mut e = engine(vec![b]);
        e.trigger(0).unwrap();
        ticks(&mut e, 120);
        let t = e.track(0).unwrap();
        assert_eq!(t.total, (131_040u32 * 120) >> 16);
        assert_eq!(t.acc, t.total);
    }

    #[test]
    fn zero_delta_commands_run_in_one_tick() {
        let mut b = TrackBuilder::new(silent());
        b.volume_mod(0, 1).volume_mod(0, 2).volume_mod(0, 3).trk_end(1000);
        let mut e = engine(vec![b]);
        e.trigger(0).unwrap();
        e.tick();
        assert_eq!(e.track(0).unwrap().volume, 3);
    }

    #[test]
    fn timed_track_turns_off_at_end() {
        let mut b = TrackBuilder::new(silent());
        b.trk_end(100_000);
        let mut e = engine(vec![b]);
        e.trigger_special(0, &TriggerPlayAttr::new().with_playtime(10)).unwrap();
        ticks(&mut e, 5);
        assert!(e.track(0).unwrap().is_active());
        e.tick();
        assert!(!e.track(0).unwrap().is_active());
    }

    #[test]
    fn tempo_commands_rescale_ppi() {
        let mut a = TrackBuilder::new(silent());
        a.seq_tempo(0, 240).trk_tempo(0, 60).trk_end(1000);
        let mut b = TrackBuilder::new(silent());
        b.trk_end(1000);
        let mut e = engine(vec![a, b]);
        e.trigger(0).unwrap();
        e.tick();
        assert_eq!(e.track(0).unwrap().qpm, 60);
        assert_eq!(e.track(1).unwrap().qpm, 240);
        assert_eq!(e.track(1).unwrap().ppi, wess_ir::calc_parts_per_int(120, 120, 240));
    }

    // === Jumps ===

    #[test]
    fn trk_jump_loops_back() {
        let mut b = TrackBuilder::new(silent());
        let top = b.label();
        b.status_mark(0, 1, 0).trk_jump(2, top);
        let hits = Arc::new(Mutex::new(0));
        let seen = hits.clone();
        let mut e = engine(vec![b]);
        e.register_callback(1, move |_, _| *seen.lock().unwrap() += 1)
            .unwrap();
        e.trigger(0).unwrap();
        ticks(&mut e, 50);
        assert!(e.track(0).unwrap().is_active());
        // one pass every two parts, and the jump clears the pending delta
        assert_eq!(*hits.lock().unwrap(), 1 + e.track(0).unwrap().total as usize / 2);
    }

    #[test]
    fn invalid_label_falls_through() {
        let mut b = TrackBuilder::new(silent());
        b.trk_jump(0, 7).volume_mod(0, 55).trk_end(1000);
        let mut e = engine(vec![b]);
        e.trigger(0).unwrap();
        e.tick();
        assert_eq!(e.track(0).unwrap().volume, 55);
    }

    #[test]
    fn gosub_and_return() {
        let mut b = TrackBuilder::new(silent());
        let sub = b.reserve_label();
        b.trk_gosub(0, sub).volume_mod(0, 2).trk_end(1000);
        b.place_label(sub);
        b.volume_mod(0, 1).pan_mod(0, 9).trk_ret(0);
        let mut e = engine(vec![b]);
        e.trigger(0).unwrap();
        e.tick();
        let t = e.track(0).unwrap();
        assert_eq!((t.volume, t.pan), (2, 9));
        assert!(t.loc_stack.is_empty());
    }

    #[test]
    fn gosub_with_full_stack_falls_through() {
        let header = TrackHeader {
            loc_stack_size: 0,
            ..silent()
        };
        let mut b = TrackBuilder::new(header);
        let sub = b.reserve_label();
        b.trk_gosub(0, sub).volume_mod(0, 2).trk_end(1000);
        b.place_label(sub);
        b.volume_mod(0, 1).trk_ret(0);
        let mut e = engine(vec![b]);
        e.trigger(0).unwrap();
        e.tick();
        assert_eq!(e.track(0).unwrap().volume, 2);
    }

    #[test]
    fn ret_on_empty_stack_falls_through() {
        let mut b = TrackBuilder::new(silent());
        b.trk_ret(0).volume_mod(0, 4).trk_end(1000);
        let mut e = engine(vec![b]);
        e.trigger(0).unwrap();
        e.tick();
        assert_eq!(e.track(0).unwrap().volume, 4);
    }

    #[test]
    fn seq_jump_moves_every_track() {
        let mut a = TrackBuilder::new(silent());
        let la = a.reserve_label();
        a.seq_jump(1, la).volume_mod(0, 1).trk_end(1000);
        a.place_label(la);
        a.volume_mod(1000, 2).trk_end(0);

        let mut b = TrackBuilder::new(silent());
        let lb = b.reserve_label();
        b.volume_mod(1000, 1).trk_end(1000);
        b.place_label(lb);
        b.pan_mod(0, 3).trk_end(1000);
        assert_eq!(la, lb);

        let mut e = engine(vec![a, b]);
        e.trigger(0).unwrap();
        e.tick();
        let target_a = e.track_data(0).unwrap().labels[la as usize] as usize;
        let target_b = e.track_data(1).unwrap().labels[lb as usize] as usize;
        assert_eq!(e.track(0).unwrap().pc, target_a);
        assert_eq!(e.track(1).unwrap().pc, target_b);
        assert_eq!(e.track(0).unwrap().volume, 127, "skipped command never ran");
    }

    #[test]
    fn seq_gosub_and_ret_round_trip_all_tracks() {
        let mut a = TrackBuilder::new(silent());
        let sub = a.reserve_label();
        a.seq_gosub(0, sub).volume_mod(0, 5).trk_end(1000);
        a.place_label(sub);
        a.pan_mod(0, 1).seq_ret(0);

        let mut e = engine(vec![a]);
        e.trigger(0).unwrap();
        e.tick();
        let t = e.track(0).unwrap();
        assert_eq!((t.pan, t.volume), (1, 5));
    }

    // === Gates and iterations ===

    #[test]
    fn gate_jump_initialises_unset_gate_and_jumps() {
        let mut b = TrackBuilder::new(silent());
        let skip = b.reserve_label();
        b.gate_jump(0, 2, 0, skip).volume_mod(0, 1);
        b.place_label(skip);
        b.trk_end(1000);
        let mut e = engine(vec![b]);
        e.trigger(0).unwrap();
        e.tick();
        assert_eq!(e.track(0).unwrap().volume, 127);
        assert_eq!(e.sequence_slot(0).unwrap().gates[2], 0);
    }

    #[test]
    fn closed_gate_never_jumps_or_changes() {
        let mut b = TrackBuilder::new(silent());
        let next = b.reserve_label();
        let skip = b.reserve_label();
        b.gate_jump(0, 1, 0, next);
        b.place_label(next);
        b.gate_jump(0, 1, 5, skip).volume_mod(0, 1);
        b.place_label(skip);
        b.trk_end(1000);
        let mut e = engine(vec![b]);
        e.trigger(0).unwrap();
        e.tick();
        assert_eq!(e.track(0).unwrap().volume, 1);
        assert_eq!(e.sequence_slot(0).unwrap().gates[1], 0);
    }

    #[test]
    fn iter_jump_repeats_block() {
        let mut b = TrackBuilder::new(silent());
        let top = b.label();
        b.status_mark(0, 1, 0).iter_jump(1, 0, 3, top).trk_end(1000);
        let hits = Arc::new(Mutex::new(0));
        let seen = hits.clone();
        let mut e = engine(vec![b]);
        e.register_callback(1, move |_, _| *seen.lock().unwrap() += 1)
            .unwrap();
        e.trigger(0).unwrap();
        ticks(&mut e, 30);
        // plain pass, initialising jump, then three counted repeats
        assert_eq!(*hits.lock().unwrap(), 5);
        assert_eq!(e.sequence_slot(0).unwrap().iters[0], 0);
    }

    #[test]
    fn reset_commands_restore_sentinel() {
        let mut b = TrackBuilder::new(silent());
        b.write_iter_box(0, 3, 9)
            .write_iter_box(0, 4, 9)
            .reset_iters(0, 3)
            .trk_end(1000);
        let mut e = engine(vec![b]);
        e.trigger(0).unwrap();
        e.tick();
        let s = e.sequence_slot(0).unwrap();
        assert_eq!((s.iters[3], s.iters[4]), (UNSET, 9));
    }

    #[test]
    fn out_of_range_jumps_fall_through() {
        let mut b = TrackBuilder::new(silent());
        let skip = b.reserve_label();
        b.gate_jump(0, 40, 1, skip)
            .iter_jump(0, 40, 1, skip)
            .volume_mod(0, 9);
        b.place_label(skip);
        b.trk_end(1000);
        let mut e = engine(vec![b]);
        e.trigger(0).unwrap();
        e.tick();
        assert_eq!(e.track(0).unwrap().volume, 9);
        let s = e.sequence_slot(0).unwrap();
        assert!(s.gates.iter().chain(s.iters.iter()).all(|&v| v == UNSET));
    }

    #[test]
    fn out_of_range_iter_box_is_ignored() {
        let mut b = TrackBuilder::new(silent());
        b.write_iter_box(0, 16, 3).trk_end(1000);
        let mut e = engine(vec![b]);
        e.trigger(0).unwrap();
        e.tick();
        assert!(e.sequence_slot(0).unwrap().iters.iter().all(|&v| v == UNSET));
    }

    #[test]
    fn out_of_range_resets_leave_slots_alone() {
        let mut b = TrackBuilder::new(silent());
        let next = b.reserve_label();
        b.write_iter_box(0, 2, 7).gate_jump(0, 3, 4, next);
        b.place_label(next);
        b.reset_gates(0, 16).reset_iters(0, 200).trk_end(1000);
        let mut e = engine(vec![b]);
        e.trigger(0).unwrap();
        e.tick();
        let s = e.sequence_slot(0).unwrap();
        assert_eq!((s.gates[3], s.iters[2]), (4, 7));
    }

    // === Status marks ===

    #[test]
    fn status_mark_calls_matching_callback_once() {
        let mut b = TrackBuilder::new(silent());
        b.status_mark(0, 7, -12).status_mark(0, 8, 3).trk_end(1000);
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = log.clone();
        let mut e = engine(vec![b]);
        e.register_callback(7, move |kind, value| sink.lock().unwrap().push((kind, value)))
            .unwrap();
        e.trigger(0).unwrap();
        e.tick();
        assert_eq!(*log.lock().unwrap(), vec![(7, -12)]);
        assert_eq!(e.callback_value(7), Some(-12));
    }

    // === Ending ===

    #[test]
    fn trk_end_frees_track_and_sequence() {
        let mut b = TrackBuilder::new(silent());
        b.trk_end(4);
        let mut e = engine(vec![b]);
        e.trigger(0).unwrap();
        ticks(&mut e, 3);
        assert_eq!(e.active_tracks(), 0);
        assert_eq!(e.active_sequences(), 0);
        assert_eq!(e.status(0), wess_ir::SequenceStatus::Inactive);
    }

    #[test]
    fn looped_track_rewinds_after_sixteen_parts() {
        let mut b = TrackBuilder::new(silent());
        b.volume_mod(0, 1).trk_end(20);
        let mut e = engine(vec![b]);
        e.trigger_special(0, &TriggerPlayAttr::new().looped()).unwrap();
        ticks(&mut e, 200);
        assert!(e.track(0).unwrap().is_active());
    }

    #[test]
    fn looped_track_too_short_still_ends() {
        let mut b = TrackBuilder::new(silent());
        b.trk_end(2);
        let mut e = engine(vec![b]);
        e.trigger_special(0, &TriggerPlayAttr::new().looped()).unwrap();
        ticks(&mut e, 3);
        assert!(!e.track(0).unwrap().is_active());
    }

    #[test]
    fn seq_end_stops_sibling_tracks() {
        let mut a = TrackBuilder::new(silent());
        a.seq_end(2);
        let mut b = TrackBuilder::new(silent());
        b.trk_end(10_000);
        let mut e = engine(vec![a, b]);
        e.trigger(0).unwrap();
        ticks(&mut e, 2);
        assert_eq!(e.active_tracks(), 0);
    }

    #[test]
    fn unknown_opcode_ends_sequence() {
        let mut a = TrackBuilder::new(silent());
        a.raw(&[0x00, 0x63]);
        let mut b = TrackBuilder::new(silent());
        b.trk_end(10_000);
        let mut e = engine(vec![a, b]);
        e.trigger(0).unwrap();
        e.tick();
        assert_eq!(e.active_sequences(), 0);
    }

    #[test]
    fn truncated_stream_ends_sequence() {
        let mut a = TrackBuilder::new(silent());
        a.volume_mod(0, 3);
        let mut e = engine(vec![a]);
        e.trigger(0).unwrap();
        e.tick();
        assert_eq!(e.active_tracks(), 0);
    }

    #[test]
    fn runaway_loop_is_cut_off() {
        let mut b = TrackBuilder::new(silent());
        let top = b.label();
        b.null_event(0).trk_jump(0, top);
        let mut e = engine(vec![b]);
        e.trigger(0).unwrap();
        e.tick();
        assert!(!e.track(0).unwrap().is_active());
    }
}
