//! Linear volume fades stepped once per tick.

use wess_ir::timing::fade_ticks;

/// A volume moving toward a target in 16.16 fixed point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Fade {
    value: i32,
    target: i32,
    step: i32,
    ticks: u32,
}

impl Fade {
    /// Fade from `current` to `dest` over `ms` milliseconds.
    pub fn start(&mut self, current: i16, ms: u32, dest: i16) {
        let ticks = fade_ticks(ms);
        self.value = (current as i32) << 16;
        self.target = (dest as i32) << 16;
        self.step = (self.target - self.value) / ticks as i32;
        self.ticks = ticks;
    }

    pub fn cancel(&mut self) {
        self.ticks = 0;
    }

    /// More than one step remains.
    pub fn is_active(&self) -> bool {
        self.ticks > 1
    }

    /// Advance one tick. Returns the volume to apply, if fading.
    pub fn step(&mut self) -> Option<i16> {
        if self.ticks == 0 {
            return None;
        }
        self.ticks -= 1;
        if self.ticks == 0 {
            self.value = self.target;
        } else {
            self.value += self.step;
        }
        Some((self.value >> 16) as i16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_fade_does_nothing() {
        let mut f = Fade::default();
        assert!(!f.is_active());
        assert_eq!(f.step(), None);
    }

    #[test]
    fn fade_reaches_exact_target() {
        let mut f = Fade::default();
        // 100 ms is 13 ticks
        f.start(0, 100, 0x3FFF);
        let mut last = 0;
        let mut steps = 0;
        while let Some(v) = f.step() {
            assert!(v >= last);
            last = v;
            steps += 1;
        }
        assert_eq!(steps, 13);
        assert_eq!(last, 0x3FFF);
    }

    #[test]
    fn fade_down_and_cancel() {
        let mut f = Fade::default();
        f.start(1000, 1000, 0);
        assert!(f.is_active());
        let first = f.step().unwrap();
        assert!(first < 1000);
        f.cancel();
        assert!(!f.is_active());
        assert_eq!(f.step(), None);
    }

    #[test]
    fn zero_length_fade_snaps_next_tick() {
        let mut f = Fade::default();
        f.start(10, 0, 20);
        assert!(!f.is_active());
        assert_eq!(f.step(), Some(20));
        assert_eq!(f.step(), None);
    }
}
