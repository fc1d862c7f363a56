//! Curve Buffers
//!
//! A calibration curve is at most [`MAX_CURVE_POINTS`] (unit, temperature)
//! pairs. The first pair whose values are both exactly `0.0` terminates the
//! curve; anything at or after it is unused space.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

use crate::error::{CurveError, Result};

/// Capacity of one instrument curve
pub const MAX_CURVE_POINTS: usize = 200;

/// Curves that may be read (factory and user curves)
pub const READABLE_CURVES: RangeInclusive<u32> = 1..=60;

/// Curves that may be written (user curves only)
pub const WRITABLE_CURVES: RangeInclusive<u32> = 21..=60;

/// One curve point
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Sensor units value (volts, ohms, ...)
    pub unit: f64,
    /// Temperature in kelvin
    pub temperature: f64,
}

impl CurvePoint {
    /// The end-of-curve marker
    pub const TERMINATOR: CurvePoint = CurvePoint {
        unit: 0.0,
        temperature: 0.0,
    };

    pub const fn new(unit: f64, temperature: f64) -> Self {
        Self { unit, temperature }
    }

    /// Both values exactly zero
    pub fn is_terminator(&self) -> bool {
        self.unit == 0.0 && self.temperature == 0.0
    }
}

impl From<(f64, f64)> for CurvePoint {
    fn from((unit, temperature): (f64, f64)) -> Self {
        Self { unit, temperature }
    }
}

impl From<CurvePoint> for (f64, f64) {
    fn from(point: CurvePoint) -> Self {
        (point.unit, point.temperature)
    }
}

/// Index of the first terminator pair in parallel unit/temperature arrays
///
/// Stops at the first match; later zero pairs are never looked at.
pub fn find_terminator(units: &[f64], temperatures: &[f64]) -> Option<usize> {
    units
        .iter()
        .zip(temperatures)
        .position(|(&unit, &temperature)| CurvePoint::new(unit, temperature).is_terminator())
}

pub(crate) fn check_readable(operation: &'static str, curve_num: u32) -> Result<()> {
    check_range(operation, curve_num, READABLE_CURVES)
}

pub(crate) fn check_writable(operation: &'static str, curve_num: u32) -> Result<()> {
    check_range(operation, curve_num, WRITABLE_CURVES)
}

fn check_range(operation: &'static str, curve_num: u32, range: RangeInclusive<u32>) -> Result<()> {
    if range.contains(&curve_num) {
        Ok(())
    } else {
        Err(CurveError::InvalidCurveNumber {
            operation,
            curve_num,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

pub(crate) fn check_lengths(operation: &'static str, units: &[f64], temperatures: &[f64]) -> Result<()> {
    if units.len() == temperatures.len() {
        Ok(())
    } else {
        Err(CurveError::LengthMismatch {
            operation,
            units: units.len(),
            temperatures: temperatures.len(),
        })
    }
}

// ============================================================================
// Resize
// ============================================================================

/// Output of [`resize`]
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ResizedCurve {
    pub units: Vec<f64>,
    pub temperatures: Vec<f64>,
    /// Always equal to the requested size
    pub len: usize,
}

/// Truncate or zero-pad a pair of parallel curve arrays to `new_size`
///
/// The first `min(input_len, new_size)` pairs are copied unchanged and the
/// rest is filled with `0.0`. Zero pairs already present in the input are
/// kept as ordinary data.
pub fn resize(units: &[f64], temperatures: &[f64], new_size: usize) -> Result<ResizedCurve> {
    const OPERATION: &str = "curve resize";

    if !(1..=MAX_CURVE_POINTS).contains(&new_size) {
        return Err(CurveError::InvalidSize {
            operation: OPERATION,
            size: new_size,
            min: 1,
            max: MAX_CURVE_POINTS,
        });
    }
    check_lengths(OPERATION, units, temperatures)?;

    let copied = units.len().min(new_size);
    let fill = |input: &[f64]| -> Vec<f64> {
        (0..new_size)
            .map(|i| if i < copied { input[i] } else { 0.0 })
            .collect()
    };

    Ok(ResizedCurve {
        units: fill(units),
        temperatures: fill(temperatures),
        len: new_size,
    })
}

// ============================================================================
// Curve Buffer
// ============================================================================

/// Ordered, capacity-bounded sequence of curve points
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurveBuffer {
    points: Vec<CurvePoint>,
}

impl CurveBuffer {
    /// Build from points, rejecting more than [`MAX_CURVE_POINTS`]
    pub fn from_points(points: Vec<CurvePoint>) -> Result<Self> {
        if points.len() > MAX_CURVE_POINTS {
            return Err(CurveError::InvalidSize {
                operation: "curve buffer",
                size: points.len(),
                min: 0,
                max: MAX_CURVE_POINTS,
            });
        }
        Ok(Self { points })
    }

    /// Build from parallel unit/temperature arrays
    pub fn from_parallel(units: &[f64], temperatures: &[f64]) -> Result<Self> {
        check_lengths("curve buffer", units, temperatures)?;
        Self::from_points(
            units
                .iter()
                .zip(temperatures)
                .map(|(&unit, &temperature)| CurvePoint::new(unit, temperature))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn into_points(self) -> Vec<CurvePoint> {
        self.points
    }

    pub fn units(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.unit).collect()
    }

    pub fn temperatures(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.temperature).collect()
    }

    /// Index of the first terminator, if any
    pub fn terminator_index(&self) -> Option<usize> {
        self.points.iter().position(CurvePoint::is_terminator)
    }

    /// Points before the first terminator
    pub fn data(&self) -> &[CurvePoint] {
        let end = self.terminator_index().unwrap_or(self.points.len());
        &self.points[..end]
    }

    /// Same semantics as [`resize`], applied to this buffer
    pub fn resize(&self, new_size: usize) -> Result<CurveBuffer> {
        let resized = resize(&self.units(), &self.temperatures(), new_size)?;
        CurveBuffer::from_parallel(&resized.units, &resized.temperatures)
    }
}

impl TryFrom<Vec<CurvePoint>> for CurveBuffer {
    type Error = CurveError;

    fn try_from(points: Vec<CurvePoint>) -> Result<Self> {
        Self::from_points(points)
    }
}
