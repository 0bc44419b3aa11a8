//! Piecewise-linear curves sampled by elapsed run time

use serde::{Deserialize, Serialize};

/// A single control point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Elapsed run time (seconds)
    pub time: f32,
    pub value: f32,
}

/// Why a set of keyframes cannot form a curve
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurveError {
    Empty,
    /// Keyframe at `index` does not come strictly after its predecessor
    NotIncreasing { index: usize },
}

/// Ordered control points with strictly increasing time.
///
/// Evaluation interpolates linearly between neighbours and clamps to the
/// first/last value outside the defined range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Keyframe>", into = "Vec<Keyframe>")]
pub struct Curve {
    keys: Vec<Keyframe>,
}

impl Curve {
    pub fn new(keys: Vec<Keyframe>) -> Result<Self, CurveError> {
        if keys.is_empty() {
            return Err(CurveError::Empty);
        }
        for i in 1..keys.len() {
            // Written negated so NaN times are rejected too
            if !(keys[i].time > keys[i - 1].time) {
                return Err(CurveError::NotIncreasing { index: i });
            }
        }
        Ok(Self { keys })
    }

    /// Two-point straight line from `(t0, v0)` to `(t1, v1)`
    pub fn linear(t0: f32, v0: f32, t1: f32, v1: f32) -> Result<Self, CurveError> {
        Self::new(vec![
            Keyframe { time: t0, value: v0 },
            Keyframe { time: t1, value: v1 },
        ])
    }

    /// Constant value at every time
    pub fn constant(value: f32) -> Self {
        Self {
            keys: vec![Keyframe { time: 0.0, value }],
        }
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    pub fn evaluate(&self, time: f32) -> f32 {
        let first = self.keys[0];
        let last = self.keys[self.keys.len() - 1];
        if time.is_nan() || time <= first.time {
            return first.value;
        }
        if time >= last.time {
            return last.value;
        }

        // First key strictly after `time`; guaranteed in 1..len by the clamps above
        let hi = self.keys.partition_point(|k| k.time <= time);
        let a = self.keys[hi - 1];
        let b = self.keys[hi];
        let t = (time - a.time) / (b.time - a.time);
        a.value + (b.value - a.value) * t
    }
}

impl TryFrom<Vec<Keyframe>> for Curve {
    type Error = CurveError;

    fn try_from(keys: Vec<Keyframe>) -> Result<Self, Self::Error> {
        Self::new(keys)
    }
}

impl From<Curve> for Vec<Keyframe> {
    fn from(curve: Curve) -> Self {
        curve.keys
    }
}

impl std::fmt::Display for CurveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CurveError::Empty => write!(f, "curve has no keyframes"),
            CurveError::NotIncreasing { index } => {
                write!(f, "keyframe {index} is not strictly after keyframe {}", index - 1)
            }
        }
    }
}

impl std::error::Error for CurveError {}
