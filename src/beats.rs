//! Beat-timeline helpers for comedy-structure analysis.
//!
//! The segmentation service consumes a transcript plus per-word timings and
//! answers with a JSON payload of labeled beats. The service output is not
//! trusted: anything other than valid JSON carrying exactly one setup and
//! one punchline degrades to an empty timeline rather than an error, and the
//! word-timing arithmetic used to anchor beats back onto the recording lives
//! here so it can be tested without the service.

use serde::Deserialize;
use tracing::warn;

/// One word of the transcript with its spoken interval, in seconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WordTiming {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

/// Role of a beat within a joke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeatKind {
    Setup,
    Punchline,
}

/// A labeled portion of the transcript.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Beat {
    #[serde(rename = "type")]
    pub kind: BeatKind,
    pub description: String,
    pub script: String,
    #[serde(rename = "durationSeconds")]
    pub duration_seconds: f64,
}

#[derive(Deserialize)]
struct BeatsPayload {
    beats: Vec<Beat>,
}

/// A half-open interval of the recording, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

/// Parse the segmentation service's response payload.
///
/// Returns the beats only when the payload is valid JSON with exactly two
/// beats (one setup, one punchline by schema); anything else yields an
/// empty timeline.
pub fn parse_beats(raw: &str) -> Vec<Beat> {
    let payload: BeatsPayload = match serde_json::from_str(raw) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "malformed segmentation response, dropping beats");
            return Vec::new();
        }
    };

    if payload.beats.len() != 2 {
        warn!(
            beats = payload.beats.len(),
            "segmentation response did not contain exactly 2 beats, dropping"
        );
        return Vec::new();
    }

    payload.beats
}

/// The words spoken between `start` and `end`, joined in transcript order.
///
/// A word is included if its interval overlaps the range at all.
pub fn words_between(timings: &[WordTiming], start: f64, end: f64) -> String {
    timings
        .iter()
        .filter(|w| w.start <= end && w.end >= start)
        .map(|w| w.word.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Find the spoken interval of a script: start of its first word, end of
/// its last, matched case-insensitively against the transcript timings.
///
/// Falls back to the full transcript span when either endpoint has no
/// match. Returns `None` only for an empty transcript.
pub fn word_boundaries(timings: &[WordTiming], words: &[&str]) -> Option<TimeRange> {
    let (first_timing, last_timing) = (timings.first()?, timings.last()?);

    let first_word = words.first().map(|w| w.to_lowercase());
    let last_word = words.last().map(|w| w.to_lowercase());

    let mut start = None;
    let mut end = None;

    for timing in timings {
        let word = timing.word.to_lowercase();
        if start.is_none() && first_word.as_deref() == Some(word.as_str()) {
            start = Some(timing.start);
        }
        if last_word.as_deref() == Some(word.as_str()) {
            end = Some(timing.end);
        }
    }

    match (start, end) {
        (Some(start), Some(end)) => Some(TimeRange { start, end }),
        _ => Some(TimeRange {
            start: first_timing.start,
            end: last_timing.end,
        }),
    }
}
