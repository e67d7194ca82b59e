//! Parses the numeric reply lines sent back by the PSU for `VOUT`/`IOUT` queries.

/// Value reported when the PSU gave no usable reply.
pub const NO_REPLY: f32 = -999.9;

/// Decode a reply line into a value.
///
/// Lines of one byte or less are treated as no reply. Only the leading number is used, anything
/// after it (units, stray characters) is ignored. Returns `None` when no number could be found.
pub fn decode(line: &[u8]) -> Option<f32> {
    if line.len() <= 1 {
        return None;
    }
    parse_leading_float(line)
}

/// Same as [`decode`], but reports [`NO_REPLY`] instead of `None`.
pub fn decode_or_sentinel(line: &[u8]) -> f32 {
    decode(line).unwrap_or(NO_REPLY)
}

/// Parse the longest floating point prefix of `text`, after skipping leading whitespace.
///
/// Accepts an optional sign, digits with an optional decimal point and an optional exponent.
pub fn parse_leading_float(text: &[u8]) -> Option<f32> {
    let text = text.trim_ascii_start();
    let len = numeric_prefix_len(text);
    if len == 0 {
        return None;
    }
    core::str::from_utf8(&text[..len]).ok()?.parse().ok()
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

fn numeric_prefix_len(bytes: &[u8]) -> usize {
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return 0;
    }

    // An exponent only counts when it carries at least one digit.
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }
    end
}
