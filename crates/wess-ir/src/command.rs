//! Decoded view of one track command.

use crate::opcode::Opcode;

/// Longest command in the instruction set (`GateJump`/`IterJump`).
const MAX_CMD_LEN: usize = 5;

/// A single command copied out of a track stream.
///
/// Argument accessors index the encoded bytes, so `byte(0)` is the opcode
/// and `byte(1)` the first argument. Reads past the command's declared
/// length return zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Command {
    op: Opcode,
    bytes: [u8; MAX_CMD_LEN],
}

impl Command {
    /// Build a command from an opcode and its argument bytes.
    ///
    /// Extra arguments beyond the opcode's length are ignored.
    pub fn new(op: Opcode, args: &[u8]) -> Self {
        let mut bytes = [0u8; MAX_CMD_LEN];
        bytes[0] = op as u8;
        let n = args.len().min(op.byte_len().saturating_sub(1));
        bytes[1..1 + n].copy_from_slice(&args[..n]);
        Self { op, bytes }
    }

    /// Decode the command at `pos`.
    ///
    /// Returns `None` for unknown opcodes and for commands cut short by the
    /// end of the stream.
    pub fn decode(stream: &[u8], pos: usize) -> Option<Self> {
        let op = Opcode::from_u8(*stream.get(pos)?)?;
        let len = op.byte_len().max(1);
        let raw = stream.get(pos..pos + len)?;
        let mut bytes = [0u8; MAX_CMD_LEN];
        bytes[..len].copy_from_slice(raw);
        Some(Self { op, bytes })
    }

    pub fn volume_mod(volume: u8) -> Self {
        Self::new(Opcode::VolumeMod, &[volume])
    }

    pub fn pan_mod(pan: u8) -> Self {
        Self::new(Opcode::PanMod, &[pan])
    }

    pub fn pitch_mod(pitch: i16) -> Self {
        Self::new(Opcode::PitchMod, &pitch.to_le_bytes())
    }

    pub fn op(&self) -> Opcode {
        self.op
    }

    /// Encoded length in bytes.
    pub fn len(&self) -> usize {
        self.op.byte_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Encoded bytes, opcode first.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len().max(1)]
    }

    /// Byte at position `i` of the encoded command.
    pub fn byte(&self, i: usize) -> u8 {
        if i < self.len() {
            self.bytes[i]
        } else {
            0
        }
    }

    /// Little-endian `u16` at positions `i` and `i + 1`.
    pub fn u16_at(&self, i: usize) -> u16 {
        u16::from_le_bytes([self.byte(i), self.byte(i + 1)])
    }

    /// Little-endian `i16` at positions `i` and `i + 1`.
    pub fn i16_at(&self, i: usize) -> i16 {
        self.u16_at(i) as i16
    }
}
