use crate::foundation::error::{DeltaError, DeltaResult};

/// Digits used for fixed-width ("lexicon") artifact names.
pub const LEXICON_WIDTH: usize = 6;

/// Zero-based frame index shared conceptually by every stage.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

impl FrameIndex {
    /// The following index.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Fixed-width, zero-padded rendering of this index.
    pub fn lexicon(self) -> String {
        lexicon(self.0, LEXICON_WIDTH)
    }
}

/// Zero-pad `value` to `width` digits so lexicographic and numeric order agree.
pub fn lexicon(value: u64, width: usize) -> String {
    format!("{value:0width$}")
}

/// Output frame rate as a rational number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator.
    pub num: u32,
    /// Denominator, must be > 0.
    pub den: u32,
}

impl Fps {
    /// Build a validated frame rate.
    pub fn new(num: u32, den: u32) -> DeltaResult<Self> {
        if den == 0 {
            return Err(DeltaError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(DeltaError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Frames per second as a float.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self { num: 30, den: 1 }
    }
}
