//! # Note Names Module
//!
//! Note name lookups used to validate prediction requests and to label
//! plots. Notes follow equal temperament with A4 = 440 Hz over the standard
//! 88-key range (A0 to C8).

use once_cell::sync::Lazy;
use std::collections::BTreeMap;

use crate::error::{LabError, Result};

/// A single musical note with its name and frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// Note name (e.g., "A4", "C#3")
    pub name: String,
    /// Frequency in Hz
    pub frequency: f64,
}

/// Statically computed notes A0 to C8.
static NOTES: Lazy<Vec<Note>> = Lazy::new(|| {
    const NOTE_NAMES: [&str; 12] = [
        "A", "A#", "B", "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#",
    ];

    (0..88)
        .map(|i| {
            // A4 is index 48; f = 440 * 2^(n/12).
            let frequency = 440.0 * 2.0_f64.powf((i as f64 - 48.0) / 12.0);
            // The octave number changes at C.
            let octave = (i + 9) / 12;
            Note {
                name: format!("{}{}", NOTE_NAMES[i % 12], octave),
                frequency,
            }
        })
        .collect()
});

/// Name to index lookup. Flat spellings are folded into sharps before lookup.
static NOTE_MAP: Lazy<BTreeMap<String, usize>> = Lazy::new(|| {
    NOTES
        .iter()
        .enumerate()
        .map(|(i, note)| (note.name.clone(), i))
        .collect()
});

/// Rewrites "Bb2" as "A#2" and normalizes the letter case.
fn canonical_name(name: &str) -> Option<String> {
    let name = name.trim();
    let mut chars = name.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let rest: String = chars.collect();

    if let Some(octave) = rest.strip_prefix('b') {
        if octave.is_empty() {
            return None;
        }
        let sharp_of = match letter {
            'A' => ("G#", 0),
            'B' => ("A#", 0),
            'D' => ("C#", 0),
            'E' => ("D#", 0),
            'G' => ("F#", 0),
            // Cb and Fb sit on natural keys; Cb also drops an octave.
            'C' => ("B", -1),
            'F' => ("E", 0),
            _ => return None,
        };
        let octave: i32 = octave.parse().ok()?;
        return Some(format!("{}{}", sharp_of.0, octave + sharp_of.1));
    }
    Some(format!("{letter}{rest}"))
}

/// Finds a note by name, accepting sharps or flats.
pub fn find_note(name: &str) -> Option<&'static Note> {
    let canonical = canonical_name(name)?;
    NOTE_MAP.get(&canonical).map(|&i| &NOTES[i])
}

/// Like [`find_note`] but reports unknown names as errors.
pub fn require_note(name: &str) -> Result<&'static Note> {
    find_note(name).ok_or_else(|| LabError::UnknownNote(name.to_string()))
}

/// Deviation of `freq` from `target_freq` in cents (positive = sharp).
pub fn calculate_cents_deviation(freq: f64, target_freq: f64) -> f64 {
    1200.0 * (freq / target_freq).log2()
}

/// Converts an error measured in Hz around `target_freq` into cents.
pub fn cents_from_hz_offset(target_freq: f64, hz_offset: f64) -> f64 {
    calculate_cents_deviation(target_freq + hz_offset, target_freq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a4_is_concert_pitch() {
        let note = find_note("A4").unwrap();
        assert!((note.frequency - 440.0).abs() < 1e-9);
    }

    #[test]
    fn range_covers_a0_to_c8() {
        assert!(find_note("A0").is_some());
        assert!(find_note("C8").is_some());
        assert!(find_note("C#8").is_none());
        assert!(find_note("G#0").is_none());
    }

    #[test]
    fn flats_and_lowercase_resolve() {
        assert_eq!(find_note("Bb2").unwrap().name, "A#2");
        assert_eq!(find_note("c3").unwrap().name, "C3");
        assert_eq!(find_note("Cb4").unwrap().name, "B3");
        assert!(find_note("H4").is_none());
        assert!(find_note("").is_none());
        assert!(require_note("X9").is_err());
    }

    #[test]
    fn octave_up_is_1200_cents() {
        let cents = calculate_cents_deviation(880.0, 440.0);
        assert!((cents - 1200.0).abs() < 1e-9);
        let cents = cents_from_hz_offset(440.0, 0.0);
        assert!(cents.abs() < 1e-12);
        assert!(cents_from_hz_offset(440.0, 1.0) > 3.9);
    }
}
