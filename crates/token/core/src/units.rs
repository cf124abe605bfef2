//! Conversion between human-readable decimal amounts and integer base units.
//!
//! Balances travel as `u128` base units end to end; floating point never
//! touches an amount. Parsing truncates digits beyond the asset's scale, so a
//! conversion can lose a fraction of one base unit but never gains one.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest supported scale: `10^38` is the biggest power of ten below `u128::MAX`.
pub const MAX_DECIMALS: u8 = 38;

/// Errors raised while parsing a human-readable amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnitError {
    #[error("amount is empty")]
    Empty,

    #[error("negative amount {0:?} cannot be expressed in base units")]
    Negative(String),

    #[error("invalid character {found:?} in amount {input:?}")]
    InvalidCharacter { input: String, found: char },

    #[error("amount {0:?} overflows 128-bit base units")]
    Overflow(String),

    #[error("scale of {0} decimals exceeds the supported maximum of 38")]
    ScaleTooLarge(u8),
}

/// Returns `10^decimals`.
pub fn scale_factor(decimals: u8) -> Result<u128, UnitError> {
    if decimals > MAX_DECIMALS {
        return Err(UnitError::ScaleTooLarge(decimals));
    }
    Ok(10u128.pow(u32::from(decimals)))
}

/// Parses a human amount (`"0.01"`, `"1,000"`, `"1_000.5"`) into base units.
///
/// Group separators (`,` and `_`) are accepted in the integer part. Fraction
/// digits past `decimals` are validated and then dropped.
pub fn to_base_units(human: &str, decimals: u8) -> Result<u128, UnitError> {
    let scale = scale_factor(decimals)?;
    let input = human.trim();
    if input.is_empty() {
        return Err(UnitError::Empty);
    }
    if input.starts_with('-') {
        return Err(UnitError::Negative(input.to_string()));
    }

    let unsigned = input.strip_prefix('+').unwrap_or(input);
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(UnitError::Empty);
    }

    let overflow = || UnitError::Overflow(input.to_string());

    let mut whole_value: u128 = 0;
    for ch in whole.chars() {
        if ch == ',' || ch == '_' {
            continue;
        }
        let digit = digit_of(ch, input)?;
        whole_value = whole_value
            .checked_mul(10)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(overflow)?;
    }

    let mut fraction_value: u128 = 0;
    let mut kept: u8 = 0;
    for ch in fraction.chars() {
        let digit = digit_of(ch, input)?;
        if kept < decimals {
            fraction_value = fraction_value * 10 + digit;
            kept += 1;
        }
    }
    let fraction_value = fraction_value * 10u128.pow(u32::from(decimals - kept));

    whole_value
        .checked_mul(scale)
        .and_then(|v| v.checked_add(fraction_value))
        .ok_or_else(overflow)
}

/// Formats base units as an exact decimal with en-US thousands grouping.
///
/// Trailing fractional zeros are dropped; no digit of the integer value is lost.
pub fn to_human(base: u128, decimals: u8) -> String {
    let (whole, fraction) = split_digits(base, decimals);
    let mut out = group_thousands(&whole);
    let fraction = fraction.trim_end_matches('0');
    if !fraction.is_empty() {
        out.push('.');
        out.push_str(fraction);
    }
    out
}

/// Same as [`to_human`] without grouping, suitable for re-parsing or RPC arguments.
pub fn to_plain(base: u128, decimals: u8) -> String {
    let (whole, fraction) = split_digits(base, decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole
    } else {
        format!("{whole}.{fraction}")
    }
}

/// Formats with exactly `places` fraction digits, truncating the rest.
///
/// Display-only: the shown value may be below the true amount, never above it.
pub fn format_fixed(base: u128, decimals: u8, places: u8) -> String {
    let (whole, fraction) = split_digits(base, decimals);
    let places = usize::from(places);
    let mut shown: String = fraction.chars().take(places).collect();
    while shown.len() < places {
        shown.push('0');
    }

    let mut out = group_thousands(&whole);
    if !shown.is_empty() {
        out.push('.');
        out.push_str(&shown);
    }
    out
}

fn digit_of(ch: char, input: &str) -> Result<u128, UnitError> {
    ch.to_digit(10)
        .map(u128::from)
        .ok_or_else(|| UnitError::InvalidCharacter {
            input: input.to_string(),
            found: ch,
        })
}

fn split_digits(base: u128, decimals: u8) -> (String, String) {
    let decimals = usize::from(decimals);
    let mut digits = base.to_string();
    if digits.len() <= decimals {
        let padding = "0".repeat(decimals + 1 - digits.len());
        digits.insert_str(0, &padding);
    }
    let fraction = digits.split_off(digits.len() - decimals);
    (digits, fraction)
}

fn group_thousands(whole: &str) -> String {
    let mut out = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// An amount of some asset, held as integer base units plus its scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Amount {
    base: u128,
    decimals: u8,
}

impl Amount {
    pub const fn zero(decimals: u8) -> Self {
        Self { base: 0, decimals }
    }

    pub const fn from_base(base: u128, decimals: u8) -> Self {
        Self { base, decimals }
    }

    /// Parse a human-readable amount, truncating below one base unit.
    pub fn parse(human: &str, decimals: u8) -> Result<Self, UnitError> {
        Ok(Self {
            base: to_base_units(human, decimals)?,
            decimals,
        })
    }

    pub const fn base(&self) -> u128 {
        self.base
    }

    pub const fn decimals(&self) -> u8 {
        self.decimals
    }

    pub const fn is_zero(&self) -> bool {
        self.base == 0
    }

    /// Adds two amounts of the same scale; `None` on scale mismatch or overflow.
    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        if self.decimals != other.decimals {
            return None;
        }
        self.base.checked_add(other.base).map(|base| Self {
            base,
            decimals: self.decimals,
        })
    }

    pub fn to_human(&self) -> String {
        to_human(self.base, self.decimals)
    }

    pub fn to_plain(&self) -> String {
        to_plain(self.base, self.decimals)
    }

    pub fn format_fixed(&self, places: u8) -> String {
        format_fixed(self.base, self.decimals, places)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_human())
    }
}
