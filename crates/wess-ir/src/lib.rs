//! Core data types for the WESS sequencer.
//!
//! This crate defines the static module tables (sequences, tracks,
//! patches) and the byte-code vocabulary that the engine interprets:
//! opcodes, delta-time VLQs and the fixed-point tempo math.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod builder;
mod command;
mod module;
mod opcode;
mod patch;
mod status;
pub mod timing;
mod trigger;
pub mod vlq;

pub use builder::TrackBuilder;
pub use command::Command;
pub use module::{DriverId, Module, ModuleLimits, SequenceData, SoundClass, TrackData, TrackHeader};
pub use opcode::{Opcode, CMD_LENGTH};
pub use patch::{DrumPatch, Patch, PatchBank, PatchSample, PatchVoice};
pub use status::{
    PanMode, SequenceStatus, MAX_MASTER_VOL, MAX_REVERB_DEPTH, PAN_CENTER, PAN_LEFT, PAN_RIGHT,
};
pub use timing::{calc_parts_per_int, MsClock, INTS_PER_SEC};
pub use trigger::{TriggerAttrs, TriggerPlayAttr};
