//! Assembler for track byte-code.
//!
//! A track stream is a list of events, each a delta time (VLQ) followed by
//! one command. Labels record the byte offset of a command, past its delta
//! time: a jump lands on the command itself and keeps whatever wait the
//! track already had pending.

use alloc::vec::Vec;

use crate::command::Command;
use crate::module::{TrackData, TrackHeader};
use crate::opcode::Opcode;
use crate::vlq;

/// Builds a [`TrackData`] one event at a time.
///
/// ```
/// use wess_ir::{TrackBuilder, TrackHeader};
///
/// let mut b = TrackBuilder::new(TrackHeader::default());
/// let top = b.label();
/// b.note_on(0, 60, 100).note_off(120, 60).trk_jump(0, top);
/// let track = b.build();
/// assert_eq!(track.labels, vec![1]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct TrackBuilder {
    header: TrackHeader,
    labels: Vec<u32>,
    /// Labels waiting for the next command to be written.
    pending: Vec<u16>,
    cmds: Vec<u8>,
}

impl TrackBuilder {
    pub fn new(header: TrackHeader) -> Self {
        Self {
            header,
            labels: Vec::new(),
            pending: Vec::new(),
            cmds: Vec::new(),
        }
    }

    /// Byte offset the next event will be written at.
    pub fn offset(&self) -> usize {
        self.cmds.len()
    }

    /// Reserve a label to be placed later, for forward jumps.
    pub fn reserve_label(&mut self) -> u16 {
        self.labels.push(u32::MAX);
        (self.labels.len() - 1) as u16
    }

    /// Point a reserved label at the next command.
    pub fn place_label(&mut self, label: u16) -> &mut Self {
        if (label as usize) < self.labels.len() {
            self.pending.push(label);
        }
        self
    }

    /// New label at the next command.
    pub fn label(&mut self) -> u16 {
        let label = self.reserve_label();
        self.place_label(label);
        label
    }

    /// Append an event.
    pub fn cmd(&mut self, delta: u32, cmd: Command) -> &mut Self {
        vlq::write(delta, &mut self.cmds);
        let at = self.cmds.len() as u32;
        for label in self.pending.drain(..) {
            self.labels[label as usize] = at;
        }
        self.cmds.extend_from_slice(cmd.as_bytes());
        self
    }

    /// Append raw bytes, for streams the typed helpers cannot express.
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.cmds.extend_from_slice(bytes);
        self
    }

    fn op(&mut self, delta: u32, op: Opcode, args: &[u8]) -> &mut Self {
        self.cmd(delta, Command::new(op, args))
    }

    fn jump(&mut self, delta: u32, op: Opcode, label: u16) -> &mut Self {
        self.op(delta, op, &label.to_le_bytes())
    }

    // === Driver commands ===

    pub fn patch_chg(&mut self, delta: u32, patch: u16) -> &mut Self {
        self.op(delta, Opcode::PatchChg, &patch.to_le_bytes())
    }

    pub fn pitch_mod(&mut self, delta: u32, pitch: i16) -> &mut Self {
        self.op(delta, Opcode::PitchMod, &pitch.to_le_bytes())
    }

    pub fn volume_mod(&mut self, delta: u32, volume: u8) -> &mut Self {
        self.op(delta, Opcode::VolumeMod, &[volume])
    }

    pub fn pan_mod(&mut self, delta: u32, pan: u8) -> &mut Self {
        self.op(delta, Opcode::PanMod, &[pan])
    }

    pub fn reverb_mod(&mut self, delta: u32, depth: u8) -> &mut Self {
        self.op(delta, Opcode::ReverbMod, &[depth])
    }

    pub fn note_on(&mut self, delta: u32, note: u8, velocity: u8) -> &mut Self {
        self.op(delta, Opcode::NoteOn, &[note, velocity])
    }

    pub fn note_off(&mut self, delta: u32, note: u8) -> &mut Self {
        self.op(delta, Opcode::NoteOff, &[note])
    }

    // === Engine commands ===

    pub fn status_mark(&mut self, delta: u32, kind: u8, value: i16) -> &mut Self {
        let [lo, hi] = value.to_le_bytes();
        self.op(delta, Opcode::StatusMark, &[kind, lo, hi])
    }

    pub fn gate_jump(&mut self, delta: u32, gate: u8, init: u8, label: u16) -> &mut Self {
        let [lo, hi] = label.to_le_bytes();
        self.op(delta, Opcode::GateJump, &[gate, init, lo, hi])
    }

    pub fn iter_jump(&mut self, delta: u32, iter: u8, init: u8, label: u16) -> &mut Self {
        let [lo, hi] = label.to_le_bytes();
        self.op(delta, Opcode::IterJump, &[iter, init, lo, hi])
    }

    pub fn reset_gates(&mut self, delta: u32, gate: u8) -> &mut Self {
        self.op(delta, Opcode::ResetGates, &[gate])
    }

    pub fn reset_iters(&mut self, delta: u32, iter: u8) -> &mut Self {
        self.op(delta, Opcode::ResetIters, &[iter])
    }

    pub fn write_iter_box(&mut self, delta: u32, iter: u8, value: u8) -> &mut Self {
        self.op(delta, Opcode::WriteIterBox, &[iter, value])
    }

    pub fn seq_tempo(&mut self, delta: u32, qpm: u16) -> &mut Self {
        self.op(delta, Opcode::SeqTempo, &qpm.to_le_bytes())
    }

    pub fn seq_gosub(&mut self, delta: u32, label: u16) -> &mut Self {
        self.jump(delta, Opcode::SeqGosub, label)
    }

    pub fn seq_jump(&mut self, delta: u32, label: u16) -> &mut Self {
        self.jump(delta, Opcode::SeqJump, label)
    }

    pub fn seq_ret(&mut self, delta: u32) -> &mut Self {
        self.op(delta, Opcode::SeqRet, &[])
    }

    pub fn seq_end(&mut self, delta: u32) -> &mut Self {
        self.op(delta, Opcode::SeqEnd, &[])
    }

    pub fn trk_tempo(&mut self, delta: u32, qpm: u16) -> &mut Self {
        self.op(delta, Opcode::TrkTempo, &qpm.to_le_bytes())
    }

    pub fn trk_gosub(&mut self, delta: u32, label: u16) -> &mut Self {
        self.jump(delta, Opcode::TrkGosub, label)
    }

    pub fn trk_jump(&mut self, delta: u32, label: u16) -> &mut Self {
        self.jump(delta, Opcode::TrkJump, label)
    }

    pub fn trk_ret(&mut self, delta: u32) -> &mut Self {
        self.op(delta, Opcode::TrkRet, &[])
    }

    pub fn trk_end(&mut self, delta: u32) -> &mut Self {
        self.op(delta, Opcode::TrkEnd, &[])
    }

    pub fn null_event(&mut self, delta: u32) -> &mut Self {
        self.op(delta, Opcode::NullEvent, &[])
    }

    /// Finish the track.
    ///
    /// Labels with no command after them point past the end of the stream,
    /// which module validation rejects.
    pub fn build(&self) -> TrackData {
        let end = self.cmds.len() as u32;
        TrackData {
            header: self.header,
            labels: self.labels.iter().map(|&l| l.min(end)).collect(),
            cmds: self.cmds.clone(),
        }
    }
}
