//! Typed, borrowed query parameters.

use chrono::{DateTime, FixedOffset, Utc};

/// A single typed query parameter, borrowed from the caller for the duration of `execute`.
///
/// Mirrors the original `Param` variant set (`NvQLVType`), which holds `reference_wrapper`s
/// rather than owned copies — the Rust translation is a borrow of matching lifetime instead.
#[derive(Debug, Clone, Copy)]
pub enum ParameterValue<'a> {
    SmallInt(&'a i16),
    Int(&'a i32),
    BigInt(&'a i64),
    Real(&'a f32),
    Double(&'a f64),
    Boolean(&'a bool),
    String(&'a str),
    Timestamp(&'a DateTime<Utc>),
    TimestampWithZone(&'a DateTime<FixedOffset>),
    /// Supplemental: raw binary payload, recovered from the original `NvQLVType`'s
    /// `vector<unsigned char>` arm.
    Binary(&'a [u8]),
    /// Supplemental: raw 16-byte UUID, recovered from the original `NvQLVType`'s
    /// `array<unsigned char, 16>` arm.
    Uuid(&'a [u8; 16]),
}

impl<'a> ParameterValue<'a> {
    pub fn data_type(&self) -> ParameterType {
        match self {
            ParameterValue::SmallInt(_) => ParameterType::SmallInt,
            ParameterValue::Int(_) => ParameterType::Int,
            ParameterValue::BigInt(_) => ParameterType::BigInt,
            ParameterValue::Real(_) => ParameterType::Real,
            ParameterValue::Double(_) => ParameterType::Double,
            ParameterValue::Boolean(_) => ParameterType::Boolean,
            ParameterValue::String(_) => ParameterType::String,
            ParameterValue::Timestamp(_) => ParameterType::Timestamp,
            ParameterValue::TimestampWithZone(_) => ParameterType::TimestampWithZone,
            ParameterValue::Binary(_) => ParameterType::Binary,
            ParameterValue::Uuid(_) => ParameterType::Uuid,
        }
    }
}

/// The tag half of [`ParameterValue`], useful for logging/diagnostics without borrowing data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    SmallInt,
    Int,
    BigInt,
    Real,
    Double,
    Boolean,
    String,
    Timestamp,
    TimestampWithZone,
    Binary,
    Uuid,
}

/// An ordered list of parameters for one `execute` call.
pub type ParameterArgs<'a> = Vec<ParameterValue<'a>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_type_matches_variant() {
        let n: i32 = 42;
        let p = ParameterValue::Int(&n);
        assert_eq!(p.data_type(), ParameterType::Int);
    }
}
