//! Size-string parsing and display rounding.

/// Binary unit suffixes, indexed by their power of 1024.
const SUFFIXES: [char; 5] = ['K', 'M', 'G', 'T', 'P'];

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Parses ini-style size notation (`"256M"`, `"2g"`, `"4096"`) into bytes.
///
/// The magnitude is scaled by `1024^rank` of the trailing suffix
/// (K=1 … P=5). A missing or unrecognised suffix leaves the numeric prefix
/// unscaled. Empty or non-numeric input yields 0; this never fails.
pub fn parse_size(input: &str) -> u64 {
    let s = input.trim();
    let Some(last) = s.chars().last() else {
        return 0;
    };

    let upper = last.to_ascii_uppercase();
    let (digits, rank) = match SUFFIXES.iter().position(|&c| c == upper) {
        Some(i) => (&s[..s.len() - last.len_utf8()], i as u32 + 1),
        None => (s.trim_end_matches(|c: char| c.is_ascii_alphabetic()), 0),
    };

    let magnitude = numeric_prefix(digits.trim_end());
    let scaled = magnitude * 1024f64.powi(rank as i32);
    if scaled.is_finite() && scaled > 0.0 {
        scaled as u64
    } else {
        0
    }
}

/// Longest leading `digits[.digits]` run, parsed as a float (0 if none).
fn numeric_prefix(s: &str) -> f64 {
    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        match c {
            '0'..='9' => end = i + 1,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
    }
    s[..end].parse().unwrap_or(0.0)
}

/// Bytes to megabytes, rounded to 2 decimals for display.
pub fn bytes_to_mb(bytes: u64) -> f64 {
    round_to(bytes as f64 / BYTES_PER_MB, 2)
}

/// Rounds half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_by_suffix_rank() {
        assert_eq!(parse_size("0"), 0);
        assert_eq!(parse_size("4K"), 4096);
        assert_eq!(parse_size("2M"), 2_097_152);
        assert_eq!(parse_size("1G"), 1_073_741_824);
        assert_eq!(parse_size("1T"), 1024u64.pow(4));
        assert_eq!(parse_size("3P"), 3 * 1024u64.pow(5));
    }

    #[test]
    fn suffix_is_case_insensitive() {
        assert_eq!(parse_size("2m"), parse_size("2M"));
        assert_eq!(parse_size("40k"), 40 * 1024);
    }

    #[test]
    fn plain_and_unknown_suffix_stay_unscaled() {
        assert_eq!(parse_size("4096"), 4096);
        assert_eq!(parse_size("12X"), 12);
        assert_eq!(parse_size(" 64M "), 64 * 1024 * 1024);
    }

    #[test]
    fn malformed_input_is_zero() {
        assert_eq!(parse_size(""), 0);
        assert_eq!(parse_size("   "), 0);
        assert_eq!(parse_size("M"), 0);
        assert_eq!(parse_size("abc"), 0);
        assert_eq!(parse_size("-1M"), 0);
    }

    #[test]
    fn fractional_magnitude() {
        assert_eq!(parse_size("1.5K"), 1536);
    }

    #[test]
    fn megabyte_rounding() {
        assert_eq!(bytes_to_mb(256 * 1024 * 1024), 256.0);
        assert_eq!(bytes_to_mb(1_572_864), 1.5);
        assert_eq!(bytes_to_mb(1_000_000), 0.95);
        assert_eq!(round_to(2.54321, 4), 2.5432);
    }
}
