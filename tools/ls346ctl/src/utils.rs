//! Argument parsing and output helpers for ls346ctl

use anyhow::{bail, Context, Result};
use ls346_protocol::{CurvePoint, MAX_CARDS, MAX_INPUTS_PER_CARD};
use serde::Serialize;
use std::path::Path;

/// Parse a `UNIT,TEMPERATURE` pair (clap value parser)
pub fn parse_point(value: &str) -> std::result::Result<CurvePoint, String> {
    let (unit, temperature) = value
        .split_once(',')
        .ok_or_else(|| format!("expected UNIT,TEMPERATURE, got '{value}'"))?;

    let unit: f64 = unit
        .trim()
        .parse()
        .map_err(|e| format!("invalid unit value '{unit}': {e}"))?;
    let temperature: f64 = temperature
        .trim()
        .parse()
        .map_err(|e| format!("invalid temperature '{temperature}': {e}"))?;

    Ok(CurvePoint::new(unit, temperature))
}

/// Expand per-card input counts to all card slots
///
/// Missing trailing cards have no inputs.
pub fn card_counts(counts: &[u8]) -> Result<[u8; MAX_CARDS]> {
    if counts.len() > MAX_CARDS {
        bail!(
            "at most {MAX_CARDS} card counts may be given, got {}",
            counts.len()
        );
    }

    let mut out = [0u8; MAX_CARDS];
    for (slot, &count) in counts.iter().enumerate() {
        if usize::from(count) > MAX_INPUTS_PER_CARD {
            bail!(
                "card {} has {count} inputs, a card carries at most {MAX_INPUTS_PER_CARD}",
                (b'A' + slot as u8) as char
            );
        }
        out[slot] = count;
    }
    Ok(out)
}

/// Read curve points from a JSON file (`[{"unit": .., "temperature": ..}, ..]`)
pub fn read_points_file(path: &Path) -> Result<Vec<CurvePoint>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse curve points from {}", path.display()))
}

/// Split points into parallel unit/temperature arrays
pub fn split_points(points: &[CurvePoint]) -> (Vec<f64>, Vec<f64>) {
    points.iter().map(|p| (p.unit, p.temperature)).unzip()
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_parse_point() {
        assert_eq!(parse_point("1.5,300").unwrap(), CurvePoint::new(1.5, 300.0));
        assert_eq!(
            parse_point(" -0.25 , 4.2e1 ").unwrap(),
            CurvePoint::new(-0.25, 42.0)
        );
        assert!(parse_point("1.5").is_err());
        assert!(parse_point("a,1").unwrap_err().contains("unit"));
        assert!(parse_point("1,b").unwrap_err().contains("temperature"));
    }

    #[test]
    fn test_card_counts() {
        assert_eq!(card_counts(&[2, 4]).unwrap(), [2, 4, 0, 0, 0, 0, 0, 0]);
        assert_eq!(card_counts(&[]).unwrap(), [0; MAX_CARDS]);
        assert!(card_counts(&[1; 9]).is_err());
        let err = card_counts(&[0, 5]).unwrap_err();
        assert!(err.to_string().contains("card B"));
    }

    #[test]
    fn test_read_points_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("curve.json");
        std::fs::write(
            &path,
            r#"[{"unit": 0.1, "temperature": 300.0}, {"unit": 0.2, "temperature": 250.0}]"#,
        )
        .unwrap();

        let points = read_points_file(&path).unwrap();
        assert_eq!(points.len(), 2);

        let (units, temps) = split_points(&points);
        assert_eq!(units, vec![0.1, 0.2]);
        assert_eq!(temps, vec![300.0, 250.0]);

        assert!(read_points_file(&dir.path().join("missing.json")).is_err());
    }
}
