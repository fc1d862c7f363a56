//! Temperature fan-out command (offline)

use anyhow::{Context, Result};
use ls346_protocol::{demux, CardReadings};
use serde_json::{Map, Value};

use crate::utils::{card_counts, print_json};

/// Per-card readings keyed by card letter
fn to_json(readings: &CardReadings) -> Value {
    let cards: Map<String, Value> = readings
        .iter()
        .map(|(slot, values)| (slot.to_string(), Value::from(values.to_vec())))
        .collect();
    Value::Object(cards)
}

pub fn handle_command(counts: &[u8], readings: &[f64]) -> Result<()> {
    let counts = card_counts(counts)?;
    let cards = demux(readings, &counts).context("Failed to split readings across cards")?;
    print_json(&to_json(&cards))
}
