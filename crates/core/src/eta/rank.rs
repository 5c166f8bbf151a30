//! Sortable rank of a free-form arrival label.

/// Rank given to labels with no usable number, so they sort last.
pub const UNPARSABLE_RANK: i64 = 999;

/// Substrings meaning the vehicle is at or about to reach the stop
/// ("Arriving", "Due", "Less than 1 min").
const IMMINENT_MARKERS: [&str; 3] = ["arriv", "due", "less"];

const UNIT_TOKEN: &str = "min";

/// Rank of a label: 0 for imminent arrivals, otherwise its leading integer.
pub fn rank_label(label: &str) -> i64 {
    let text = label.to_lowercase().replacen(UNIT_TOKEN, "", 1);
    let text = text.trim();

    if IMMINENT_MARKERS.iter().any(|marker| text.contains(marker)) {
        return 0;
    }

    leading_integer(text).unwrap_or(UNPARSABLE_RANK)
}

fn leading_integer(text: &str) -> Option<i64> {
    let (sign, rest) = match text.as_bytes().first()? {
        b'-' => (-1, &text[1..]),
        b'+' => (1, &text[1..]),
        _ => (1, text),
    };

    let digits = rest
        .find(|c: char| !c.is_ascii_digit())
        .map_or(rest, |end| &rest[..end]);

    digits.parse::<i64>().ok().map(|n| sign * n)
}
