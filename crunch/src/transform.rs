//! Parsing of result lines and zero-byte statistics.

use std::str::FromStr;

use bigdecimal::BigDecimal;

use crate::bail;
use crate::error::{ErrorKind, SyncResult};
use crate::types::{CrunchRecord, LineNumber};

/// Token separating the fields of a result line.
pub const FIELD_SEPARATOR: &str = " => ";

/// Number of characters of the address prefix, e.g. `0x`.
const ADDRESS_PREFIX_LEN: usize = 2;

/// Hex encoding of a zero byte.
const ZERO_BYTE: &str = "00";

/// Zero-byte statistics of an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZeroCounts {
    pub total: u32,
    pub leading: u32,
}

/// Parses a raw line into a [`CrunchRecord`].
///
/// Returns `Ok(None)` when the trimmed line does not split into exactly three fields, such lines
/// (including a truncated final line) are dropped silently. A reward that is not an integer is an
/// error and stops the run.
pub fn parse_line(line: &str, line_number: LineNumber) -> SyncResult<Option<CrunchRecord>> {
    let fields: Vec<&str> = line.trim().split(FIELD_SEPARATOR).collect();
    let [salt, address, reward] = fields.as_slice() else {
        return Ok(None);
    };

    let reward = parse_reward(reward, line_number)?;
    let ZeroCounts { total, leading } = count_zeroes(address);

    Ok(Some(CrunchRecord {
        salt: (*salt).to_string(),
        address: (*address).to_string(),
        reward,
        total_zeroes: total,
        leading_zeroes: leading,
        line_number,
    }))
}

/// Parses a base-10 integer of arbitrary size.
///
/// Surrounding whitespace and a sign are allowed, and single underscores may group digits
/// (`1_000`).
fn parse_reward(reward: &str, line_number: LineNumber) -> SyncResult<BigDecimal> {
    let trimmed = reward.trim();
    let digits = trimmed.strip_prefix(&['+', '-'][..]).unwrap_or(trimmed);
    if !is_grouped_integer(digits) {
        bail!(
            ErrorKind::ConversionError,
            "Reward is not an integer",
            format!("line {line_number}: `{reward}`")
        );
    }

    Ok(BigDecimal::from_str(&trimmed.replace('_', ""))?)
}

/// Whether `digits` is ASCII digits with each underscore between two digits.
fn is_grouped_integer(digits: &str) -> bool {
    !digits.is_empty()
        && digits
            .split('_')
            .all(|group| !group.is_empty() && group.bytes().all(|b| b.is_ascii_digit()))
}

/// Counts zero bytes in an address after dropping its two character prefix.
///
/// `leading` counts consecutive `00` pairs from the start. `total` counts non-overlapping
/// occurrences of `00` scanning left to right, which are not necessarily byte aligned: in
/// `000` one pair is counted, in `a00b` the pair straddles two bytes and is still counted.
pub fn count_zeroes(address: &str) -> ZeroCounts {
    let hex = address
        .char_indices()
        .nth(ADDRESS_PREFIX_LEN)
        .map(|(index, _)| &address[index..])
        .unwrap_or("");

    let leading = hex
        .as_bytes()
        .chunks_exact(ZERO_BYTE.len())
        .take_while(|pair| *pair == ZERO_BYTE.as_bytes())
        .count();
    let total = hex.matches(ZERO_BYTE).count();

    ZeroCounts {
        total: total as u32,
        leading: leading as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_leading_and_interior_zero_bytes() {
        assert_eq!(
            count_zeroes("0x00000000ab00cd"),
            ZeroCounts {
                total: 5,
                leading: 4
            }
        );
    }

    #[test]
    fn all_zero_address_counts_every_pair() {
        let address = format!("0x{}", "00".repeat(20));

        assert_eq!(
            count_zeroes(&address),
            ZeroCounts {
                total: 20,
                leading: 20
            }
        );
    }

    #[test]
    fn total_uses_substring_scan() {
        // "a00b" straddles two bytes and "000" holds a single non-overlapping match.
        assert_eq!(count_zeroes("0xa00b"), ZeroCounts { total: 1, leading: 0 });
        assert_eq!(count_zeroes("0x000a"), ZeroCounts { total: 1, leading: 1 });
        assert_eq!(count_zeroes("0x0000f"), ZeroCounts { total: 2, leading: 2 });
    }

    #[test]
    fn leading_never_exceeds_total() {
        for address in [
            "0x",
            "0x0",
            "0x00",
            "0x0a00",
            "0x00a000",
            "0x000000000000dead00beef",
            "0x1000000000000000000000000000000000000000",
        ] {
            let counts = count_zeroes(address);
            assert!(counts.leading <= counts.total, "{address}: {counts:?}");
        }
    }

    #[test]
    fn short_addresses_have_no_zeroes() {
        assert_eq!(count_zeroes(""), ZeroCounts { total: 0, leading: 0 });
        assert_eq!(count_zeroes("0"), ZeroCounts { total: 0, leading: 0 });
        assert_eq!(count_zeroes("0x"), ZeroCounts { total: 0, leading: 0 });
    }

    #[test]
    fn parses_well_formed_line() {
        let record = parse_line("0xsalt => 0x0000ab00 => 1234\n", 7)
            .unwrap()
            .unwrap();

        assert_eq!(record.salt, "0xsalt");
        assert_eq!(record.address, "0x0000ab00");
        assert_eq!(record.reward, BigDecimal::from(1234));
        assert_eq!(record.total_zeroes, 3);
        assert_eq!(record.leading_zeroes, 2);
        assert_eq!(record.line_number, 7);
    }

    #[test]
    fn rewards_beyond_64_bits_are_exact() {
        let record = parse_line("s => 0x00 => 340282366920938463463374607431768211456", 1)
            .unwrap()
            .unwrap();

        assert_eq!(
            record.reward,
            BigDecimal::from_str("340282366920938463463374607431768211456").unwrap()
        );
    }

    #[test]
    fn wrong_field_count_is_dropped() {
        assert_eq!(parse_line("a => b", 1).unwrap(), None);
        assert_eq!(parse_line("a => b => 1 => 2", 1).unwrap(), None);
        assert_eq!(parse_line("", 1).unwrap(), None);
        assert_eq!(parse_line("0xsalt => 0x00ab", 1).unwrap(), None);
    }

    #[test]
    fn non_integer_reward_fails() {
        for reward in ["12.5", "abc", "1e3", "-", "0x10"] {
            let err = parse_line(&format!("s => 0x00 => {reward}"), 3).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ConversionError, "{reward}");
        }
    }

    #[test]
    fn signed_rewards_are_accepted() {
        let record = parse_line("s => 0x00 => -42", 1).unwrap().unwrap();

        assert_eq!(record.reward, BigDecimal::from(-42));
    }

    #[test]
    fn padded_reward_is_trimmed() {
        let record = parse_line("s => 0x00 =>  12", 1).unwrap().unwrap();
        assert_eq!(record.reward, BigDecimal::from(12));

        assert_eq!(parse_reward(" 12\t", 1).unwrap(), BigDecimal::from(12));
        assert_eq!(parse_reward(" -7 ", 1).unwrap(), BigDecimal::from(-7));
    }

    #[test]
    fn underscores_group_digits() {
        assert_eq!(parse_reward("1_000", 1).unwrap(), BigDecimal::from(1000));
        assert_eq!(parse_reward("+1_2_3", 1).unwrap(), BigDecimal::from(123));
    }

    #[test]
    fn misplaced_underscores_fail() {
        for reward in ["1__0", "_1", "1_", "-_1", "_"] {
            let err = parse_reward(reward, 4).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ConversionError, "{reward}");
        }
    }
}
