//! Section-number key handling.
//!
//! Section numbers are structured keys like "14", "14A", "41ZA": a numeric
//! base plus optional amendment-insertion suffixes (letter suffix inserts
//! after, Z-prefixed letter inserts before the plain letters). Exact lookups
//! compare canonicalised keys; multi-row exact results are ordered by a
//! lexicographically-sortable key so inserted sections land in document order.

/// Canonical form of a section number for equality matching: trimmed,
/// ASCII-uppercased. "14a" and " 14A " both canonicalise to "14A".
pub fn canonicalize(s: &str) -> String {
    s.trim().to_ascii_uppercase()
}

/// Lexicographically-sortable key for a section number.
///
/// "3" → "003.000.000", "3ZA" → "003.001.000", "3A" → "003.010.000",
/// "19DZA" → "019.040.001". Plain letters map to multiples of 10 so
/// Z-prefixed insertions (1..=26) sort between the surrounding letters.
pub fn sort_key(s: &str) -> String {
    let canonical = canonicalize(s);
    if canonical.is_empty() {
        return "000.000.000".to_string();
    }
    let bytes = canonical.as_bytes();

    let digit_end = bytes
        .iter()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(bytes.len());
    let base: u32 = if digit_end > 0 {
        canonical[..digit_end].parse().unwrap_or(0)
    } else {
        0
    };

    let suffix = &bytes[digit_end..];
    let mut segments: Vec<u32> = vec![base];
    let mut i = 0;

    while i < suffix.len() && segments.len() < 3 {
        if suffix[i] == b'Z' && i + 1 < suffix.len() && suffix[i + 1].is_ascii_uppercase() {
            // Z-prefix insertion: ZA=001 .. ZZ=026, sorts before plain letters.
            segments.push((suffix[i + 1] - b'A') as u32 + 1);
            i += 2;
        } else if suffix[i].is_ascii_uppercase() {
            // Plain letter: A=010 .. Z=260, gaps left for future insertions.
            segments.push(((suffix[i] - b'A') as u32 + 1) * 10);
            i += 1;
        } else {
            break;
        }
    }

    while segments.len() < 3 {
        segments.push(0);
    }

    format!("{:03}.{:03}.{:03}", segments[0], segments[1], segments[2])
}
