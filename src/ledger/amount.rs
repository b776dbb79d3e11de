// Amount - monetary values in the ledger's base unit
//
// Values are whole base units (u128). Human-facing strings use 18 decimals,
// so "1.0" is 10^18 base units and "0.000000000000000001" is one base unit.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Number of decimal places in the display unit
pub const DISPLAY_DECIMALS: u32 = 18;

const UNIT: u128 = 10u128.pow(DISPLAY_DECIMALS);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount string is empty")]
    Empty,

    #[error("Invalid character '{0}' in amount")]
    InvalidCharacter(char),

    #[error("Too many decimal places: max {max}, got {got}")]
    TooManyDecimals { max: u32, got: usize },

    #[error("Amount overflows the base unit range")]
    Overflow,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Amount(u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    /// One display unit (10^18 base units)
    pub const ONE: Amount = Amount(UNIT);

    pub const fn from_base_units(units: u128) -> Self {
        Self(units)
    }

    pub const fn base_units(&self) -> u128 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    pub fn saturating_sub(self, other: Amount) -> Amount {
        Amount(self.0.saturating_sub(other.0))
    }

    /// Parse a decimal string in display units ("1", "1.0", "0.5", ".25")
    pub fn parse_decimal(s: &str) -> Result<Self, AmountError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(AmountError::Empty);
        }

        let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(AmountError::Empty);
        }

        if let Some(c) = whole.chars().chain(frac.chars()).find(|c| !c.is_ascii_digit()) {
            return Err(AmountError::InvalidCharacter(c));
        }

        if frac.len() > DISPLAY_DECIMALS as usize {
            return Err(AmountError::TooManyDecimals {
                max: DISPLAY_DECIMALS,
                got: frac.len(),
            });
        }

        // Only digits remain, so a parse failure can only be overflow.
        let whole_units: u128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| AmountError::Overflow)?
        };

        let frac_units: u128 = if frac.is_empty() {
            0
        } else {
            let digits: u128 = frac.parse().map_err(|_| AmountError::Overflow)?;
            digits * 10u128.pow(DISPLAY_DECIMALS - frac.len() as u32)
        };

        whole_units
            .checked_mul(UNIT)
            .and_then(|v| v.checked_add(frac_units))
            .map(Amount)
            .ok_or(AmountError::Overflow)
    }

    /// Format in display units, always with at least one fractional digit
    pub fn to_decimal_string(&self) -> String {
        let whole = self.0 / UNIT;
        let frac = self.0 % UNIT;
        if frac == 0 {
            return format!("{}.0", whole);
        }
        let padded = format!("{:0width$}", frac, width = DISPLAY_DECIMALS as usize);
        format!("{}.{}", whole, padded.trim_end_matches('0'))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal_string())
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_decimal(s)
    }
}
