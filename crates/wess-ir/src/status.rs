//! Public status enums and value ranges.

/// Hardest-left pan value.
pub const PAN_LEFT: u8 = 0;
/// Centre pan value.
pub const PAN_CENTER: u8 = 64;
/// Hardest-right pan value.
pub const PAN_RIGHT: u8 = 127;
/// Largest master volume.
pub const MAX_MASTER_VOL: u8 = 127;
/// Largest reverb depth.
pub const MAX_REVERB_DEPTH: u8 = 127;

/// State of a sequence as seen through the public API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SequenceStatus {
    /// Index is out of range for the loaded module.
    Invalid,
    /// Valid but not currently allocated.
    Inactive,
    /// Allocated with every track paused.
    Stopped,
    /// Allocated and running.
    Playing,
}

/// How track and patch pan combine into left/right levels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PanMode {
    /// Mono: both channels get the same level.
    Off,
    #[default]
    On,
    /// Stereo with left and right swapped.
    OnReversed,
}
