//! Hex string helpers.

/// Removes "0x" or "0X" prefix from a hex string if present.
fn without_0x_prefix(hex_str: &str) -> &str {
	hex_str
		.strip_prefix("0x")
		.or_else(|| hex_str.strip_prefix("0X"))
		.unwrap_or(hex_str)
}

/// Decodes a hex string with or without the "0x" prefix.
pub fn decode_hex(hex_str: &str) -> Result<Vec<u8>, hex::FromHexError> {
	hex::decode(without_0x_prefix(hex_str))
}
