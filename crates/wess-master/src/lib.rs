//! Headless host for the WESS sequencer.
//!
//! [`Sequencer`] owns an [`Engine`] behind a lock and can drive it from a
//! background timer thread, the way the console's 120 Hz interrupt did.
//! The CLI and integration tests share it.

mod config;
pub mod demo;
mod error;

use parking_lot::{Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

// Re-export common types so callers don't need wess-ir/wess-engine directly.
pub use config::EngineConfig;
pub use error::MasterError;
pub use wess_engine::{Engine, EngineError, SavedVoiceList, SoftSpu, Spu, VolumeKind};
pub use wess_ir::{Module, PanMode, SequenceStatus, TriggerPlayAttr};

/// A locked engine plus an optional timer thread ticking it.
pub struct Sequencer<S: Spu + Send + 'static> {
    engine: Arc<Mutex<Engine<S>>>,
    tick_hz: u32,
    timer: Option<TimerHandle>,
}

struct TimerHandle {
    stop_signal: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl<S: Spu + Send + 'static> Sequencer<S> {
    pub fn new(module: Module, spu: S) -> Result<Self, MasterError> {
        Self::with_config(module, spu, &EngineConfig::default())
    }

    pub fn with_config(module: Module, spu: S, config: &EngineConfig) -> Result<Self, MasterError> {
        let mut engine = Engine::new(module, spu)?;
        config.apply(&mut engine);
        Ok(Self {
            engine: Arc::new(Mutex::new(engine)),
            tick_hz: config.tick_hz,
            timer: None,
        })
    }

    /// Hold the engine lock for several calls in a row. The timer thread
    /// cannot tick while the guard lives.
    pub fn lock(&self) -> MutexGuard<'_, Engine<S>> {
        self.engine.lock()
    }

    // --- Timer ---

    /// Start ticking at the configured rate on a background thread.
    pub fn start(&mut self) {
        self.stop_timer();

        let stop_signal = Arc::new(AtomicBool::new(false));
        let stop = stop_signal.clone();
        let engine = self.engine.clone();
        let period = Duration::from_secs(1) / self.tick_hz.max(1);

        let thread = std::thread::spawn(move || timer_thread(engine, period, stop));
        log::debug!(target: "wess::master", "timer started at {} Hz", self.tick_hz);

        self.timer = Some(TimerHandle {
            stop_signal,
            thread: Some(thread),
        });
    }

    pub fn stop_timer(&mut self) {
        if let Some(mut timer) = self.timer.take() {
            timer.stop_signal.store(true, Ordering::Relaxed);
            if let Some(handle) = timer.thread.take() {
                let _ = handle.join();
            }
            log::debug!(target: "wess::master", "timer stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    pub fn tick_hz(&self) -> u32 {
        self.tick_hz
    }

    /// Advance one interrupt by hand.
    pub fn tick(&self) {
        self.engine.lock().tick();
    }

    // --- Engine calls ---

    pub fn trigger(&self, seq_idx: usize) -> Result<usize, MasterError> {
        Ok(self.engine.lock().trigger(seq_idx)?)
    }

    pub fn trigger_special(
        &self,
        seq_idx: usize,
        attrs: &TriggerPlayAttr,
    ) -> Result<usize, MasterError> {
        Ok(self.engine.lock().trigger_special(seq_idx, attrs)?)
    }

    pub fn trigger_type(&self, seq_idx: usize, type_tag: u32) -> Result<usize, MasterError> {
        Ok(self.engine.lock().trigger_type(seq_idx, type_tag)?)
    }

    /// Allocate a sequence that waits, paused, for [`restart`](Self::restart).
    pub fn trigger_handled(
        &self,
        seq_idx: usize,
        attrs: Option<&TriggerPlayAttr>,
    ) -> Result<usize, MasterError> {
        Ok(self.engine.lock().trigger_handled(seq_idx, attrs)?)
    }

    pub fn release_handle(&self, slot: usize) {
        self.engine.lock().release_handle(slot);
    }

    pub fn update_type_special(&self, type_tag: u32, attrs: &TriggerPlayAttr) {
        self.engine.lock().update_type_special(type_tag, attrs);
    }

    pub fn stop(&self, seq_idx: usize) {
        self.engine.lock().stop(seq_idx);
    }

    pub fn stop_all(&self) {
        self.engine.lock().stop_all();
    }

    pub fn stop_type(&self, type_tag: u32) {
        self.engine.lock().stop_type(type_tag);
    }

    pub fn pause(&self, seq_idx: usize, mute: bool) {
        self.engine.lock().pause(seq_idx, mute);
    }

    pub fn restart(&self, seq_idx: usize) {
        self.engine.lock().restart(seq_idx);
    }

    pub fn pause_all(&self, mute: bool, saved: Option<&mut SavedVoiceList>) {
        self.engine.lock().pause_all(mute, saved);
    }

    pub fn restart_all(&self, saved: Option<&mut SavedVoiceList>) {
        self.engine.lock().restart_all(saved);
    }

    pub fn status(&self, seq_idx: usize) -> SequenceStatus {
        self.engine.lock().status(seq_idx)
    }

    pub fn set_master_volume(&self, kind: VolumeKind, volume: u8) {
        self.engine.lock().set_master_volume(kind, volume);
    }

    pub fn master_volume(&self, kind: VolumeKind) -> u8 {
        self.engine.lock().master_volume(kind)
    }

    pub fn pan_mode(&self) -> PanMode {
        self.engine.lock().pan_mode()
    }

    pub fn set_pan_mode(&self, mode: PanMode) {
        self.engine.lock().set_pan_mode(mode);
    }

    pub fn active_voices(&self) -> usize {
        self.engine.lock().active_voices()
    }

    pub fn active_tracks(&self) -> usize {
        self.engine.lock().active_tracks()
    }

    pub fn ticks(&self) -> u64 {
        self.engine.lock().ticks()
    }
}

impl<S: Spu + Send + 'static> Drop for Sequencer<S> {
    fn drop(&mut self) {
        self.stop_timer();
    }
}

fn timer_thread<S: Spu>(engine: Arc<Mutex<Engine<S>>>, period: Duration, stop: Arc<AtomicBool>) {
    let mut deadline = Instant::now() + period;
    while !stop.load(Ordering::Relaxed) {
        engine.lock().tick();

        let now = Instant::now();
        if deadline > now {
            std::thread::sleep(deadline - now);
            deadline += period;
        } else {
            // fell behind; drop the missed interrupts
            deadline = now + period;
        }
    }
}
