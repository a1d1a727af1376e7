//! Sequencer engine and PSX sound driver for WESS modules.
//!
//! [`Engine`] owns the track, sequence and voice pools for one module and
//! advances them one 1/120 s interrupt per [`Engine::tick`]. Sound output
//! goes through the [`Spu`] trait; [`SoftSpu`] records it instead.

#![cfg_attr(not(any(feature = "std", test)), no_std)]

extern crate alloc;

mod api;
mod driver;
mod engine;
mod error;
mod fade;
mod sequence;
mod sequencer;
pub mod soft_spu;
pub mod spu;
mod track;
mod voice;
pub mod voice_params;
mod voice_pool;

pub use api::VolumeKind;
pub use driver::{SavedVoice, SavedVoiceList};
pub use engine::{Engine, DEFAULT_MUTE_RELEASE_MS, MAX_CD_VOLUME, MAX_SPU_MASTER_VOLUME};
pub use error::EngineError;
pub use fade::Fade;
pub use sequence::{PlayMode, SequenceSlot, ALL_SLOTS, MAX_TRACKS_PER_SEQ, UNSET};
pub use sequencer::MAX_CMDS_PER_TICK;
pub use soft_spu::SoftSpu;
pub use spu::{AttrMask, KeyStatus, ReleaseMode, Spu, VoiceAttrs, VoiceBits, SPU_NUM_VOICES};
pub use track::{TrackFlags, TrackId, TrackStatus, LOC_STACK_CAP};
pub use voice::VoiceStatus;
pub use voice_pool::{Slot, VoiceId, VoicePool};
