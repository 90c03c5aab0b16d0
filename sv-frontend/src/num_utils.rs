//! Checked conversions of numeric text. `None` means the text is not a
//! number of the requested radix or does not fit in 64 bits.

fn digits(text: &str) -> Option<String> {
    let cleaned: String = text.trim().chars().filter(|c| *c != '_').collect();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

pub fn parse_binary(text: &str) -> Option<u64> {
    u64::from_str_radix(&digits(text)?, 2).ok()
}

pub fn parse_octal(text: &str) -> Option<u64> {
    u64::from_str_radix(&digits(text)?, 8).ok()
}

pub fn parse_hex(text: &str) -> Option<u64> {
    u64::from_str_radix(&digits(text)?, 16).ok()
}

pub fn parse_int64(text: &str) -> Option<i64> {
    digits(text)?.parse::<i64>().ok()
}

/// Unsigned decimal; negative values in the signed range wrap to their two's
/// complement.
pub fn parse_uint64(text: &str) -> Option<u64> {
    let cleaned = digits(text)?;
    if cleaned.starts_with('-') {
        cleaned.parse::<i64>().ok().map(|v| v as u64)
    } else {
        cleaned.parse::<u64>().ok()
    }
}

pub fn parse_int32(text: &str) -> Option<i32> {
    digits(text)?.parse::<i32>().ok()
}

pub fn parse_uint32(text: &str) -> Option<u32> {
    digits(text)?.parse::<u32>().ok()
}

/// Value of a SystemVerilog integral literal (`42`, `8'hFF`, `'b101`,
/// `4'sd3`). Literals holding x/z digits have no value.
pub fn parse_integral_literal(text: &str) -> Option<u64> {
    let Some(tick) = text.find('\'') else {
        return parse_uint64(text);
    };
    let mut rest = text[tick + 1..].chars().peekable();
    if matches!(rest.peek(), Some('s') | Some('S')) {
        rest.next();
    }
    let base = rest.next()?;
    let value: String = rest.collect();
    match base.to_ascii_lowercase() {
        'b' => parse_binary(&value),
        'o' => parse_octal(&value),
        'd' => parse_uint64(&value),
        'h' => parse_hex(&value),
        '0' if value.is_empty() => Some(0),
        '1' if value.is_empty() => Some(u64::MAX),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_bounds() {
        assert_eq!(parse_binary(&"1".repeat(64)), Some(u64::MAX));
        assert_eq!(parse_binary(&"1".repeat(65)), None);
        assert_eq!(parse_binary("1010"), Some(10));
        assert_eq!(parse_binary("12"), None);
    }

    #[test]
    fn decimal_bounds() {
        assert_eq!(parse_int64("9223372036854775807"), Some(i64::MAX));
        assert_eq!(parse_int64("-9223372036854775808"), Some(i64::MIN));
        assert_eq!(parse_int64("9223372036854775808"), None);
        assert_eq!(parse_uint64("18446744073709551615"), Some(u64::MAX));
        assert_eq!(parse_uint64("18446744073709551616"), None);
        assert_eq!(parse_uint64("-1"), Some(u64::MAX));
    }

    #[test]
    fn octal_and_hex_bounds() {
        assert_eq!(parse_octal("1777777777777777777777"), Some(u64::MAX));
        assert_eq!(parse_octal("3777777777777777777777"), None);
        assert_eq!(parse_hex("FFFFFFFFFFFFFFFF"), Some(u64::MAX));
        assert_eq!(parse_hex("1FFFFFFFFFFFFFFFF"), None);
    }

    #[test]
    fn integral_literals() {
        assert_eq!(parse_integral_literal("8'hFF"), Some(255));
        assert_eq!(parse_integral_literal("'b101"), Some(5));
        assert_eq!(parse_integral_literal("4'sd3"), Some(3));
        assert_eq!(parse_integral_literal("1_000"), Some(1000));
        assert_eq!(parse_integral_literal("4'bx01z"), None);
    }
}
