//! LakeShore 346 Curve Protocol
//!
//! Curve transfer, curve buffer handling and temperature fan-out for the
//! LakeShore 346 cryogenic temperature controller.
//!
//! # Architecture
//!
//! - **codec**: `CRVPT` command builders and the permissive reply decoder
//! - **transfer**: batched curve read/write over an `InstrumentChannel`
//! - **curve**: curve points, the zero-pair terminator convention, resize
//! - **demux**: splits one flat temperature vector across input cards A–H
//!
//! `codec`, `curve` and `demux` are pure and synchronous; only `transfer`
//! talks to the instrument.

pub mod codec;
pub mod curve;
pub mod demux;
pub mod error;
pub mod transfer;

pub use curve::{
    find_terminator, resize, CurveBuffer, CurvePoint, ResizedCurve, MAX_CURVE_POINTS,
    READABLE_CURVES, WRITABLE_CURVES,
};
pub use demux::{demux, CardReadings, CardSlot, MAX_CARDS, MAX_INPUTS_PER_CARD};
pub use error::{CurveError, Result};
pub use transfer::{read_curve, write_curve, WriteOutcome};

// Re-export the link abstractions the transfer functions are written against
pub use ls346_link::{InstrumentChannel, ProgressSink};
