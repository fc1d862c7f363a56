//! Curve Point Codec
//!
//! Builds `CRVPT` command strings and decodes the instrument's replies.
//!
//! Command grammar (fragments concatenated, each starting with `;`):
//!
//! ```text
//! ;CRVPT? <curve>,<index>                      query one point
//! ;CRVPT <curve>,<index>,<unit>,<temperature>  set one point
//! ;*OPC?                                       operation-complete query
//! ```
//!
//! Point indices on the wire are 1-based.

use regex::Regex;
use std::fmt::Write;
use std::sync::OnceLock;

use crate::curve::CurvePoint;

/// Operation-complete query appended to write chunks
pub const ACK_QUERY: &str = ";*OPC?";

/// Reply to [`ACK_QUERY`] once the instrument has applied the chunk
pub const ACK_RESPONSE: &str = "1";

/// A run of comma-joined decimal numbers, optionally signed, optionally
/// with an exponent
const NUMBER_RUN_PATTERN: &str = r"[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?(?:,[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)+";

static NUMBER_RUN: OnceLock<Regex> = OnceLock::new();

// Literal pattern
#[allow(clippy::disallowed_methods, clippy::unwrap_used)]
fn number_run() -> &'static Regex {
    NUMBER_RUN.get_or_init(|| Regex::new(NUMBER_RUN_PATTERN).unwrap())
}

/// Render a value the way it is sent to the instrument
pub fn format_value(value: f64) -> String {
    format!("{value:.6}")
}

/// Query fragments for points `start_index .. start_index + count`
pub fn encode_read_chunk(curve_num: u32, start_index: usize, count: usize) -> String {
    let mut command = String::with_capacity(count * 14);
    for index in start_index..start_index + count {
        let _ = write!(command, ";CRVPT? {curve_num},{index}");
    }
    command
}

/// Set fragments for `points`, the first of which lands at `start_index`
///
/// With `terminate_with_ack` a single [`ACK_QUERY`] follows the last
/// fragment, so the instrument answers once for the whole chunk.
pub fn encode_write_chunk(
    curve_num: u32,
    start_index: usize,
    points: &[CurvePoint],
    terminate_with_ack: bool,
) -> String {
    let mut command = String::with_capacity(points.len() * 32 + ACK_QUERY.len());
    for (offset, point) in points.iter().enumerate() {
        let _ = write!(
            command,
            ";CRVPT {curve_num},{},{},{}",
            start_index + offset,
            format_value(point.unit),
            format_value(point.temperature)
        );
    }
    if terminate_with_ack {
        command.push_str(ACK_QUERY);
    }
    command
}

/// Extract curve points from a read reply
///
/// The scan is not anchored to any line or field structure: every run of
/// comma-joined numbers anywhere in `text` contributes points, in order of
/// appearance. A run with an even count is split into consecutive pairs; a run
/// with an odd count first drops its leading number, which is how an echoed
/// point index (`1,3.5,77.2`) shows up. This tolerates verbose or echoing
/// instruments, and means that any unrelated comma-joined numbers in the reply
/// are also taken as points.
pub fn decode_read_response(text: &str) -> Vec<CurvePoint> {
    let mut points = Vec::new();

    for run in number_run().find_iter(text) {
        let values: Option<Vec<f64>> = run
            .as_str()
            .split(',')
            .map(|field| field.parse::<f64>().ok())
            .collect();
        let Some(values) = values else {
            continue;
        };

        let skip = values.len() % 2;
        points.extend(
            values[skip..]
                .chunks_exact(2)
                .map(|pair| CurvePoint::new(pair[0], pair[1])),
        );
    }

    points
}

/// True when a write reply is the operation-complete acknowledgment
pub fn decode_write_ack(text: &str) -> bool {
    text.trim_matches(|c: char| c.is_whitespace() || c == '\0') == ACK_RESPONSE
}
