//! Fixed-point timing shared by the sequencer and its fade engine.
//!
//! Track time is measured in quarter-note "parts". Each timer interrupt a
//! track advances by its parts-per-interrupt value, a 16.16 fixed-point
//! number derived from the tempo and the track's parts-per-quarter.

/// Timer interrupts per second the tempo math is calibrated for.
pub const INTS_PER_SEC: u16 = 120;

/// Milliseconds per interrupt in 16.16 fixed point (about 8.33 ms).
pub const MS_FRAC_STEP: u32 = 0x0008_5555;

/// Parts per interrupt, 16.16 fixed point.
///
/// `((qpm << 16) + rounding) / (ips * 60) * ppq`, where the rounding term
/// is half an interrupt-minute so the division rounds half up.
pub fn calc_parts_per_int(ints_per_sec: u16, parts_per_quarter: u16, qpm: u16) -> u32 {
    let ips = ints_per_sec as u32;
    if ips == 0 {
        return 0;
    }
    let ints_per_min = ips * 60;
    let qpm_fixed = (qpm as u32) << 16;
    let rounding = ips * 30 + 30;
    ((qpm_fixed + rounding) / ints_per_min).wrapping_mul(parts_per_quarter as u32)
}

/// Number of ticks a fade of `ms` milliseconds lasts. Always at least 1.
pub fn fade_ticks(ms: u32) -> u32 {
    ((ms as u64 * INTS_PER_SEC as u64) / 1000) as u32 + 1
}

/// Millisecond clock advanced once per interrupt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MsClock {
    ms: u32,
    frac: u32,
}

impl MsClock {
    pub const fn new() -> Self {
        Self { ms: 0, frac: 0 }
    }

    /// Advance by one interrupt.
    pub fn advance(&mut self) {
        self.frac += MS_FRAC_STEP;
        self.ms = self.ms.wrapping_add(self.frac >> 16);
        self.frac &= 0xFFFF;
    }

    /// Whole milliseconds elapsed.
    pub fn now(&self) -> u32 {
        self.ms
    }
}
