//! Engine context: pools, master state and the tick.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use wess_ir::{MsClock, Module, PanMode, MAX_MASTER_VOL};

use crate::driver::PsxState;
use crate::error::EngineError;
use crate::fade::Fade;
use crate::sequence::{SequenceSlot, MAX_TRACKS_PER_SEQ};
use crate::spu::{Spu, SPU_NUM_VOICES};
use crate::track::{TrackId, TrackStatus, LOC_STACK_CAP};
use crate::voice::VoiceStatus;
use crate::voice_params::mute_release_rate;
use crate::voice_pool::{VoiceId, VoicePool};

/// Full-scale SPU master volume.
pub const MAX_SPU_MASTER_VOLUME: i16 = 0x3FFF;
/// Full-scale CD audio volume.
pub const MAX_CD_VOLUME: i16 = 0x3CFF;
/// Mute release applied until [`Engine::set_mute_release`] is called.
pub const DEFAULT_MUTE_RELEASE_MS: u32 = 250;

type CallbackFn = Box<dyn FnMut(u8, i16) + Send>;

/// A status-mark listener.
pub(crate) struct Callback {
    pub kind: u8,
    pub func: CallbackFn,
    /// Last value delivered.
    pub value: i16,
}

/// The sequencer and PSX driver state for one loaded module.
///
/// All pools are sized from the module limits at construction; nothing
/// grows afterwards, so [`Engine::tick`] does not allocate.
pub struct Engine<S: Spu> {
    pub(crate) module: Module,
    pub(crate) spu: S,
    pub(crate) tracks: Vec<TrackStatus>,
    pub(crate) seqs: Vec<SequenceSlot>,
    pub(crate) voices: VoicePool,
    pub(crate) psx: PsxState,
    pub(crate) callbacks: Vec<Option<Callback>>,
    pub(crate) clock: MsClock,
    pub(crate) sfx_volume: u8,
    pub(crate) music_volume: u8,
    pub(crate) pan_mode: PanMode,
    pub(crate) mute_release_rate: u8,
    pub(crate) master_spu_volume: i16,
    pub(crate) cd_volume: i16,
    pub(crate) master_fade: Fade,
    pub(crate) cd_fade: Fade,
    pub(crate) seqs_active: usize,
    pub(crate) tracks_active: usize,
    ticks: u64,
}

impl<S: Spu> Engine<S> {
    /// Validate `module` and build an engine around it.
    pub fn new(module: Module, mut spu: S) -> Result<Self, EngineError> {
        validate(&module)?;

        let limits = module.limits;
        let tracks_per_seq = module.max_tracks_per_seq();
        let seqs = (0..limits.max_active_sequences)
            .map(|_| {
                SequenceSlot::new(
                    limits.max_gates_per_seq as usize,
                    limits.max_iters_per_seq as usize,
                    tracks_per_seq,
                )
            })
            .collect();
        let callbacks = (0..limits.max_callbacks).map(|_| None).collect();

        spu.set_master_volume(MAX_SPU_MASTER_VOLUME);
        spu.set_cd_volume(MAX_CD_VOLUME);

        log::debug!(
            target: "wess::engine",
            "engine up: {} sequences, {} seq slots, {} tracks, {} voices",
            module.sequences.len(),
            limits.max_active_sequences,
            limits.max_active_tracks,
            limits.voice_limit
        );

        Ok(Self {
            tracks: vec![TrackStatus::default(); limits.max_active_tracks as usize],
            seqs,
            voices: VoicePool::new(limits.voice_limit as usize),
            psx: PsxState::default(),
            callbacks,
            clock: MsClock::new(),
            sfx_volume: MAX_MASTER_VOL,
            music_volume: MAX_MASTER_VOL,
            pan_mode: PanMode::On,
            mute_release_rate: mute_release_rate(DEFAULT_MUTE_RELEASE_MS),
            master_spu_volume: MAX_SPU_MASTER_VOLUME,
            cd_volume: MAX_CD_VOLUME,
            master_fade: Fade::default(),
            cd_fade: Fade::default(),
            seqs_active: 0,
            tracks_active: 0,
            ticks: 0,
            module,
            spu,
        })
    }

    /// Run one 1/120 s interrupt: fades, then the sequencer, then voice
    /// maintenance.
    pub fn tick(&mut self) {
        #[cfg(feature = "alloc_check")]
        assert_no_alloc::assert_no_alloc(|| self.run_tick());
        #[cfg(not(feature = "alloc_check"))]
        self.run_tick();
    }

    fn run_tick(&mut self) {
        self.ticks = self.ticks.wrapping_add(1);

        if let Some(v) = self.master_fade.step() {
            self.master_spu_volume = v;
            self.spu.set_master_volume(v);
        }
        if let Some(v) = self.cd_fade.step() {
            self.cd_volume = v;
            self.spu.set_cd_volume(v);
        }

        self.clock.advance();
        if self.tracks_active > 0 {
            self.run_sequencer();
        }
        self.psx_update();
    }

    // === Accessors ===

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn spu(&self) -> &S {
        &self.spu
    }

    pub fn spu_mut(&mut self) -> &mut S {
        &mut self.spu
    }

    pub fn track(&self, tid: TrackId) -> Option<&TrackStatus> {
        self.tracks.get(tid)
    }

    pub fn sequence_slot(&self, slot: usize) -> Option<&SequenceSlot> {
        self.seqs.get(slot)
    }

    pub fn voice(&self, v: VoiceId) -> Option<&VoiceStatus> {
        self.voices.get(v)
    }

    pub fn active_voices(&self) -> usize {
        self.voices.active_count()
    }

    pub fn active_tracks(&self) -> usize {
        self.tracks_active
    }

    pub fn active_sequences(&self) -> usize {
        self.seqs_active
    }

    /// Engine clock in milliseconds.
    pub fn now_ms(&self) -> u32 {
        self.clock.now()
    }

    /// Ticks run since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    // === Fades ===

    pub fn master_spu_volume(&self) -> i16 {
        self.master_spu_volume
    }

    /// Set the SPU master volume, cancelling any fade.
    pub fn set_master_spu_volume(&mut self, volume: i16) {
        self.master_fade.cancel();
        self.master_spu_volume = volume;
        self.spu.set_master_volume(volume);
    }

    pub fn start_master_fade(&mut self, ms: u32, dest: i16) {
        self.master_fade.start(self.master_spu_volume, ms, dest);
    }

    pub fn master_fade_active(&self) -> bool {
        self.master_fade.is_active()
    }

    pub fn cd_volume(&self) -> i16 {
        self.cd_volume
    }

    /// Set the CD audio volume, cancelling any fade.
    pub fn set_cd_volume(&mut self, volume: i16) {
        self.cd_fade.cancel();
        self.cd_volume = volume;
        self.spu.set_cd_volume(volume);
    }

    pub fn start_cd_fade(&mut self, ms: u32, dest: i16) {
        self.cd_fade.start(self.cd_volume, ms, dest);
    }

    pub fn cd_fade_active(&self) -> bool {
        self.cd_fade.is_active()
    }

    // === Status-mark callbacks ===

    /// Call `func` with `(kind, value)` whenever a track hits a status mark
    /// of this kind.
    pub fn register_callback(
        &mut self,
        kind: u8,
        func: impl FnMut(u8, i16) + Send + 'static,
    ) -> Result<(), EngineError> {
        let limit = self.callbacks.len();
        let slot = self
            .callbacks
            .iter_mut()
            .find(|c| c.is_none())
            .ok_or(EngineError::CallbacksFull(limit))?;
        *slot = Some(Callback {
            kind,
            func: Box::new(func),
            value: 0,
        });
        Ok(())
    }

    /// Drop every callback registered for `kind`.
    pub fn unregister_callback(&mut self, kind: u8) {
        for slot in self.callbacks.iter_mut() {
            if slot.as_ref().is_some_and(|c| c.kind == kind) {
                *slot = None;
            }
        }
    }

    /// Last value delivered to the callback for `kind`.
    pub fn callback_value(&self, kind: u8) -> Option<i16> {
        self.callbacks
            .iter()
            .flatten()
            .find(|c| c.kind == kind)
            .map(|c| c.value)
    }

    pub(crate) fn status_mark(&mut self, kind: u8, value: i16) {
        if let Some(cb) = self.callbacks.iter_mut().flatten().find(|c| c.kind == kind) {
            (cb.func)(kind, value);
            cb.value = value;
        }
    }

    // === Sample RAM ===

    /// Copy `data` into sound RAM at `spu_addr`, waiting for the transfer.
    /// Returns the number of bytes written.
    pub fn upload_sample(&mut self, spu_addr: u32, data: &[u8]) -> usize {
        self.spu.start_transfer(spu_addr);
        let written = self.spu.write_transfer(data);
        self.spu.is_transfer_complete(true);
        if written < data.len() {
            log::warn!(
                target: "wess::engine",
                "sample upload at {spu_addr:#x} truncated to {written} of {} bytes",
                data.len()
            );
        }
        written
    }
}

fn validate(module: &Module) -> Result<(), EngineError> {
    let limits = &module.limits;
    if limits.max_active_sequences == 0 {
        return Err(EngineError::ZeroLimit("max_active_sequences"));
    }
    if limits.max_active_tracks == 0 {
        return Err(EngineError::ZeroLimit("max_active_tracks"));
    }
    if limits.voice_limit == 0 {
        return Err(EngineError::ZeroLimit("voice_limit"));
    }
    if limits.voice_limit as usize > SPU_NUM_VOICES {
        return Err(EngineError::VoiceLimit(limits.voice_limit));
    }

    for (seq, data) in module.sequences.iter().enumerate() {
        if data.tracks.len() > MAX_TRACKS_PER_SEQ {
            return Err(EngineError::TooManyTracks {
                seq,
                tracks: data.tracks.len(),
            });
        }
        for (track, t) in data.tracks.iter().enumerate() {
            if t.header.loc_stack_size as usize > LOC_STACK_CAP {
                return Err(EngineError::StackTooDeep { seq, track });
            }
            if let Some(label) = t.labels.iter().position(|&l| l as usize >= t.cmds.len()) {
                return Err(EngineError::BadLabel { seq, track, label });
            }
        }
    }

    let bank = &module.patches;
    for (idx, patch) in bank.patches.iter().enumerate() {
        if patch.first_voice as usize + patch.num_voices as usize > bank.voices.len() {
            return Err(EngineError::BadPatch(idx));
        }
    }
    for (voice, pv) in bank.voices.iter().enumerate() {
        if bank.sample(pv.sample_idx).is_none() {
            return Err(EngineError::BadSample {
                voice,
                sample: pv.sample_idx,
            });
        }
    }
    for (key, drum) in bank.drums.iter().enumerate() {
        if bank.patch(drum.patch).is_none() {
            return Err(EngineError::BadDrum {
                key,
                patch: drum.patch,
            });
        }
    }
    Ok(())
}
