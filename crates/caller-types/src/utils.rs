//! Display formatting utilities.

/// Number of nanocoin units per coin.
const NANO_PER_COIN: u64 = 1_000_000_000;

/// Truncates an identifier for display purposes.
///
/// Shows only the first 8 characters followed by ".." for longer strings.
pub fn truncate_id(id: &str) -> String {
	if id.len() <= 8 {
		id.to_string()
	} else {
		format!("{}..", &id[..8])
	}
}

/// Formats a nanocoin amount as a decimal coin string.
///
/// Trailing zeros of the fractional part are dropped; whole amounts render
/// without a fractional part.
pub fn format_mas(nano: u64) -> String {
	let whole = nano / NANO_PER_COIN;
	let frac = nano % NANO_PER_COIN;
	if frac == 0 {
		return whole.to_string();
	}
	let frac = format!("{:09}", frac);
	format!("{}.{}", whole, frac.trim_end_matches('0'))
}
