use std::borrow::Cow;

/// One relayed progress report: an outer 0–100 percentage and a phase label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub percentage: u8,
    pub label: String,
}

impl ProgressEvent {
    pub fn new(percentage: u8, label: impl Into<String>) -> Self {
        Self {
            percentage: percentage.min(100),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("range bound {0} exceeds 100")]
    OutOfScale(u8),
    #[error("lower bound {lower} is above upper bound {upper}")]
    Inverted { lower: u8, upper: u8 },
}

/// A sub-range `[lower, upper]` of the outer 0–100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeMapping {
    lower: u8,
    upper: u8,
}

impl RangeMapping {
    pub const FULL: RangeMapping = RangeMapping::spanning(0, 100);

    pub fn new(lower: u8, upper: u8) -> Result<Self, RangeError> {
        if upper > 100 {
            return Err(RangeError::OutOfScale(upper));
        }
        if lower > upper {
            return Err(RangeError::Inverted { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    /// Const constructor for fixed phase tables. Invalid bounds fail at
    /// compile time when used in a `const`.
    pub const fn spanning(lower: u8, upper: u8) -> Self {
        assert!(upper <= 100, "range upper bound exceeds 100");
        assert!(lower <= upper, "range lower bound above upper bound");
        Self { lower, upper }
    }

    pub fn lower(&self) -> u8 {
        self.lower
    }

    pub fn upper(&self) -> u8 {
        self.upper
    }

    /// Map an inner percentage onto this range, rounding to the nearest
    /// integer. Out-of-scale and NaN inputs are clamped.
    pub fn remap(&self, inner: f32) -> u8 {
        let inner = if inner.is_nan() {
            0.0
        } else {
            inner.clamp(0.0, 100.0)
        };
        let span = f32::from(self.upper - self.lower);
        let outer = f32::from(self.lower) + inner * span / 100.0;
        (outer.round() as u8).clamp(self.lower, self.upper)
    }
}

/// Remaps a sub-task's self-reported progress into its slot of the outer
/// scale and tags it with a phase label.
///
/// One mapper per phase; build a fresh one when the next phase starts.
#[derive(Debug, Clone)]
pub struct ProgressRangeMapper {
    range: RangeMapping,
    phase: Cow<'static, str>,
}

impl ProgressRangeMapper {
    pub fn new(range: RangeMapping, phase: impl Into<Cow<'static, str>>) -> Self {
        Self {
            range,
            phase: phase.into(),
        }
    }

    pub fn phase(&self) -> &str {
        &self.phase
    }

    /// The collaborator's section text wins over the phase name when present.
    pub fn remap(&self, inner: f32, label: &str) -> ProgressEvent {
        let label = label.trim();
        let label = if label.is_empty() {
            self.phase.as_ref()
        } else {
            label
        };
        ProgressEvent::new(self.range.remap(inner), label)
    }
}
