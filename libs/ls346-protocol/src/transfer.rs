//! Batched Curve Transfer
//!
//! Moves whole curves over an [`InstrumentChannel`] one chunk at a time. Each
//! chunk is a single command line and a single response; the next chunk is
//! only built once the previous reply has been handled.
//!
//! Progress goes to a [`ProgressSink`]: `0` once before the first chunk, then
//! one value per completed chunk computed from the points issued before that
//! chunk. The first chunk therefore repeats `0`, and a transfer never reports
//! `100`. For 10 points in chunks of 4 the values are `0, 0, 40, 80`.

use ls346_link::{InstrumentChannel, ProgressSink};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::codec::{decode_read_response, decode_write_ack, encode_read_chunk, encode_write_chunk};
use crate::curve::{
    check_lengths, check_readable, check_writable, find_terminator, CurvePoint, MAX_CURVE_POINTS,
};
use crate::error::{CurveError, Result};

const READ_OPERATION: &str = "curve read";
const WRITE_OPERATION: &str = "curve write";

/// Summary of a successful [`write_curve`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WriteOutcome {
    /// Points sent in data chunks, including an explicit terminator
    pub effective_len: usize,
    /// Whether a `(0, 0)` point was written after the data
    pub terminator_appended: bool,
    /// Command/response round trips performed
    pub round_trips: usize,
}

/// 1-based `(start_index, count)` pairs covering `1..=total`
fn chunk_bounds(total: usize, batch_size: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..total)
        .step_by(batch_size)
        .map(move |issued| (issued + 1, batch_size.min(total - issued)))
}

fn percent(issued: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * issued as f64 / total as f64
    }
}

fn check_batch_size(operation: &'static str, batch_size: usize) -> Result<()> {
    if batch_size == 0 {
        return Err(CurveError::InvalidBatchSize { operation });
    }
    Ok(())
}

fn check_capacity(operation: &'static str, size: usize) -> Result<()> {
    if size > MAX_CURVE_POINTS {
        return Err(CurveError::InvalidSize {
            operation,
            size,
            min: 0,
            max: MAX_CURVE_POINTS,
        });
    }
    Ok(())
}

/// Read `total_points` points of curve `curve_num`
///
/// The result holds the pairs decoded from the replies, in order, up to
/// `total_points` of them. Pairs beyond that are dropped. An instrument that
/// answers with fewer pairs than asked for yields a shorter curve; that is not
/// an error.
pub async fn read_curve<C, P>(
    channel: &mut C,
    curve_num: u32,
    total_points: usize,
    batch_size: usize,
    progress: &mut P,
) -> Result<Vec<CurvePoint>>
where
    C: InstrumentChannel + ?Sized,
    P: ProgressSink + ?Sized,
{
    check_readable(READ_OPERATION, curve_num)?;
    check_capacity(READ_OPERATION, total_points)?;
    check_batch_size(READ_OPERATION, batch_size)?;

    info!(
        channel = channel.name(),
        curve_num, total_points, batch_size, "Reading curve"
    );
    progress.report(0.0);

    let mut points = Vec::with_capacity(total_points);
    for (start, count) in chunk_bounds(total_points, batch_size) {
        let command = encode_read_chunk(curve_num, start, count);
        let response = channel.query(&command).await.map_err(|e| {
            warn!(curve_num, start, count, "Curve read chunk failed: {}", e);
            CurveError::rejected(READ_OPERATION, curve_num, format!("link failure: {e}"))
        })?;

        let decoded = decode_read_response(&response);
        if decoded.len() != count {
            debug!(
                curve_num,
                start,
                requested = count,
                decoded = decoded.len(),
                "Chunk decoded to a different number of points"
            );
        }
        let room = total_points - points.len();
        points.extend(decoded.into_iter().take(room));

        progress.report(percent(start - 1, total_points));
    }

    info!(curve_num, points = points.len(), "Curve read complete");
    Ok(points)
}

/// Write parallel `units`/`temperatures` arrays to curve `curve_num`
///
/// Data stops at the first `(0, 0)` pair, which is itself written as the
/// curve terminator, whatever follows it in the arrays. When there is no such
/// pair, a terminator is appended at `effective_len + 1`. Only the points up
/// to the terminator count against the curve capacity. A chunk that is not
/// acknowledged ends the call; chunks already accepted stay on the
/// instrument.
pub async fn write_curve<C, P>(
    channel: &mut C,
    curve_num: u32,
    units: &[f64],
    temperatures: &[f64],
    batch_size: usize,
    progress: &mut P,
) -> Result<WriteOutcome>
where
    C: InstrumentChannel + ?Sized,
    P: ProgressSink + ?Sized,
{
    check_writable(WRITE_OPERATION, curve_num)?;
    check_lengths(WRITE_OPERATION, units, temperatures)?;
    check_batch_size(WRITE_OPERATION, batch_size)?;

    let terminator = find_terminator(units, temperatures);
    let effective_len = terminator.map_or(units.len(), |i| i + 1);
    check_capacity(WRITE_OPERATION, effective_len)?;
    let points: Vec<CurvePoint> = units[..effective_len]
        .iter()
        .zip(temperatures)
        .map(|(&unit, &temperature)| CurvePoint::new(unit, temperature))
        .collect();

    info!(
        channel = channel.name(),
        curve_num,
        effective_len,
        explicit_terminator = terminator.is_some(),
        batch_size,
        "Writing curve"
    );
    progress.report(0.0);

    let mut round_trips = 0;
    for (start, count) in chunk_bounds(effective_len, batch_size) {
        let chunk = &points[start - 1..start - 1 + count];
        let command = encode_write_chunk(curve_num, start, chunk, true);
        send_acknowledged(channel, curve_num, &command, "Failed to upload curve points").await?;
        round_trips += 1;
        debug!(curve_num, start, count, "Chunk acknowledged");

        progress.report(percent(start - 1, effective_len));
    }

    let terminator_appended = terminator.is_none();
    if terminator_appended {
        let command =
            encode_write_chunk(curve_num, effective_len + 1, &[CurvePoint::TERMINATOR], true);
        send_acknowledged(channel, curve_num, &command, "Failed to upload final curve point")
            .await?;
        round_trips += 1;
    }

    info!(curve_num, effective_len, terminator_appended, "Curve write complete");
    Ok(WriteOutcome {
        effective_len,
        terminator_appended,
        round_trips,
    })
}

async fn send_acknowledged<C>(
    channel: &mut C,
    curve_num: u32,
    command: &str,
    failure: &str,
) -> Result<()>
where
    C: InstrumentChannel + ?Sized,
{
    match channel.query(command).await {
        Ok(reply) if decode_write_ack(&reply) => Ok(()),
        Ok(reply) => {
            warn!(curve_num, reply = %reply, "{}", failure);
            Err(CurveError::rejected(
                WRITE_OPERATION,
                curve_num,
                format!("{failure}: unexpected reply '{}'", reply.trim()),
            ))
        },
        Err(e) => {
            warn!(curve_num, "{}: {}", failure, e);
            Err(CurveError::rejected(
                WRITE_OPERATION,
                curve_num,
                format!("{failure}: link failure: {e}"),
            ))
        },
    }
}
