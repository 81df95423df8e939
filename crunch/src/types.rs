use bigdecimal::BigDecimal;

/// 1-based position of a line in the source file.
pub type LineNumber = u64;

/// A parsed result line with its derived zero-byte statistics.
///
/// Records only live inside the batch currently being filled, they are dropped once the batch is
/// committed or abandoned.
#[derive(Debug, Clone, PartialEq)]
pub struct CrunchRecord {
    /// Salt token that produced the address.
    pub salt: String,
    /// Hex encoded address including its two character prefix.
    pub address: String,
    /// Reward of the address, kept exact since it may exceed 64 bits.
    pub reward: BigDecimal,
    /// Occurrences of `00` anywhere in the address after the prefix.
    pub total_zeroes: u32,
    /// Consecutive `00` pairs at the start of the address after the prefix.
    pub leading_zeroes: u32,
    /// Line of the source file this record was read from.
    pub line_number: LineNumber,
}
