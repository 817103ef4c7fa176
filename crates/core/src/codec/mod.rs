//! Codec for the `PT[#M]#.######S` duration strings used by the persisted
//! sequence format.
//!
//! The scheduler itself only deals in floating-point seconds; callers decode
//! interval records with [`parse_duration`] on the way in and re-encode new
//! effects with [`format_duration`] on the way out.

use crate::{BeatfillError, Result};

/// Parses an ISO-8601-like duration string into seconds.
///
/// Accepted shapes are `PT<seconds>S` and `PT<minutes>M<seconds>S` where the
/// seconds part may carry a fractional tail. Anything else is rejected as
/// [`BeatfillError::MalformedDuration`].
pub fn parse_duration(text: &str) -> Result<f64> {
    let malformed = || BeatfillError::MalformedDuration(text.to_string());

    let body = text
        .strip_prefix("PT")
        .and_then(|rest| rest.strip_suffix('S'))
        .ok_or_else(malformed)?;

    let (minutes, seconds) = match body.split_once('M') {
        Some((minutes, seconds)) => {
            let minutes: u64 = minutes.parse().map_err(|_| malformed())?;
            (minutes, seconds)
        }
        None => (0, body),
    };

    if seconds.is_empty() || !seconds.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return Err(malformed());
    }
    let seconds: f64 = seconds.parse().map_err(|_| malformed())?;
    if !seconds.is_finite() {
        return Err(malformed());
    }

    Ok(minutes as f64 * 60.0 + seconds)
}

/// Formats seconds into the shape the sequence format stores.
///
/// Values below a minute stay plain (`PT2.5000000S`); longer spans carry a
/// whole-minute part (`PT5M2.1400000S`).
pub fn format_duration(seconds: f64) -> String {
    if seconds < 60.0 {
        format!("PT{seconds:.7}S")
    } else {
        let minutes = (seconds / 60.0).floor() as u64;
        let remainder = seconds - minutes as f64 * 60.0;
        format!("PT{minutes}M{remainder:.7}S")
    }
}
