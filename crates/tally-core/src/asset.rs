// crates/tally-core/src/asset.rs
//
// Fixed-point asset type: a signed 64-bit amount tagged with a currency symbol.
//
// All amounts are counted in atomic units (10^-9 of a whole coin). Every
// arithmetic operation between two assets checks the symbols first; scaling
// by integer ratios goes through a 128-bit intermediate and truncates toward
// zero so every node derives bit-identical results.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, TallyError};
use crate::protocol::{ASSET_PRECISION, UNITS_PER_COIN};

/// The two currency denominations tracked by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Symbol {
    /// Liquid currency (primary symbol).
    #[serde(rename = "SCR")]
    Scr,
    /// Scorumpower, the staked denomination (secondary symbol).
    #[serde(rename = "SP")]
    Sp,
}

impl Symbol {
    /// Ticker string for this symbol.
    pub fn name(&self) -> &'static str {
        match self {
            Symbol::Scr => "SCR",
            Symbol::Sp => "SP",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Symbol {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SCR" => Ok(Symbol::Scr),
            "SP" => Ok(Symbol::Sp),
            other => Err(TallyError::InvalidState(format!(
                "Unknown asset symbol '{}'",
                other
            ))),
        }
    }
}

/// A currency amount in atomic units together with its symbol.
///
/// `amount` may be negative only transiently while computing; services reject
/// any write that would persist a negative balance. Serialized in its display
/// form (`"1.000000000 SCR"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Asset {
    /// Amount in atomic units.
    pub amount: i64,
    /// Currency symbol.
    pub symbol: Symbol,
}

impl Asset {
    pub const fn new(amount: i64, symbol: Symbol) -> Self {
        Self { amount, symbol }
    }

    /// Zero of the given symbol.
    pub const fn zero(symbol: Symbol) -> Self {
        Self { amount: 0, symbol }
    }

    /// Shorthand for a liquid (SCR) amount.
    pub const fn scr(amount: i64) -> Self {
        Self::new(amount, Symbol::Scr)
    }

    /// Shorthand for a scorumpower (SP) amount.
    pub const fn sp(amount: i64) -> Self {
        Self::new(amount, Symbol::Sp)
    }

    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }

    pub fn is_negative(&self) -> bool {
        self.amount < 0
    }

    fn ensure_same_symbol(&self, other: &Asset) -> Result<()> {
        if self.symbol != other.symbol {
            return Err(TallyError::SymbolMismatch {
                left: self.symbol,
                right: other.symbol,
            });
        }
        Ok(())
    }

    /// Add two assets of the same symbol.
    ///
    /// # Errors
    /// `SymbolMismatch` if the symbols differ, `ArithmeticOverflow` if the sum
    /// does not fit in 64 bits.
    pub fn checked_add(self, other: Asset) -> Result<Asset> {
        self.ensure_same_symbol(&other)?;
        let amount = self.amount.checked_add(other.amount).ok_or_else(|| {
            TallyError::ArithmeticOverflow(format!("{} + {}", self, other))
        })?;
        Ok(Asset::new(amount, self.symbol))
    }

    /// Subtract an asset of the same symbol. The result may be negative.
    ///
    /// # Errors
    /// `SymbolMismatch` if the symbols differ, `ArithmeticOverflow` on overflow.
    pub fn checked_sub(self, other: Asset) -> Result<Asset> {
        self.ensure_same_symbol(&other)?;
        let amount = self.amount.checked_sub(other.amount).ok_or_else(|| {
            TallyError::ArithmeticOverflow(format!("{} - {}", self, other))
        })?;
        Ok(Asset::new(amount, self.symbol))
    }

    /// Multiply by a plain integer factor.
    pub fn checked_mul(self, factor: i64) -> Result<Asset> {
        let amount = self.amount.checked_mul(factor).ok_or_else(|| {
            TallyError::ArithmeticOverflow(format!("{} * {}", self, factor))
        })?;
        Ok(Asset::new(amount, self.symbol))
    }

    /// Compute `amount * numerator / denominator` with a 128-bit intermediate,
    /// truncating toward zero.
    ///
    /// This is the only sanctioned way to take a percentage of an asset.
    ///
    /// # Errors
    /// `ArithmeticOverflow` if `denominator` is zero or the quotient does not
    /// fit back into 64 bits.
    pub fn mul_div(self, numerator: i64, denominator: i64) -> Result<Asset> {
        if denominator == 0 {
            return Err(TallyError::ArithmeticOverflow(format!(
                "{} * {} / 0",
                self, numerator
            )));
        }
        let wide = i128::from(self.amount) * i128::from(numerator) / i128::from(denominator);
        let amount = i64::try_from(wide).map_err(|_| {
            TallyError::ArithmeticOverflow(format!("{} * {} / {}", self, numerator, denominator))
        })?;
        Ok(Asset::new(amount, self.symbol))
    }

    /// Compare two assets, failing on mismatched symbols.
    pub fn try_cmp(&self, other: &Asset) -> Result<Ordering> {
        self.ensure_same_symbol(other)?;
        Ok(self.amount.cmp(&other.amount))
    }

    /// The larger of two assets of the same symbol.
    pub fn try_max(self, other: Asset) -> Result<Asset> {
        Ok(match self.try_cmp(&other)? {
            Ordering::Less => other,
            _ => self,
        })
    }

    /// The smaller of two assets of the same symbol.
    pub fn try_min(self, other: Asset) -> Result<Asset> {
        Ok(match self.try_cmp(&other)? {
            Ordering::Greater => other,
            _ => self,
        })
    }

    /// Re-denominate 1:1 into another symbol.
    ///
    /// Used where liquid supply is credited as scorumpower (registration
    /// bonuses) and where SP credits are counted into SCR capital totals.
    pub fn convert_to(self, symbol: Symbol) -> Asset {
        Asset::new(self.amount, symbol)
    }
}

impl PartialOrd for Asset {
    /// Ordering is only defined between assets of the same symbol.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.symbol != other.symbol {
            return None;
        }
        Some(self.amount.cmp(&other.amount))
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.amount < 0 { "-" } else { "" };
        let abs = self.amount.unsigned_abs();
        let units = UNITS_PER_COIN as u64;
        write!(
            f,
            "{}{}.{:0width$} {}",
            sign,
            abs / units,
            abs % units,
            self.symbol,
            width = ASSET_PRECISION as usize
        )
    }
}

impl FromStr for Asset {
    type Err = TallyError;

    /// Parse the `Display` format: `"12.500000000 SCR"`.
    fn from_str(s: &str) -> Result<Self> {
        let malformed = || TallyError::InvalidState(format!("Malformed asset '{}'", s));

        let (number, symbol) = s.trim().split_once(' ').ok_or_else(malformed)?;
        let symbol: Symbol = symbol.trim().parse()?;

        let (negative, digits) = match number.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, number),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() || frac.len() > ASSET_PRECISION as usize {
            return Err(malformed());
        }
        // Signs and separators are only valid before the whole part.
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(whole) || !all_digits(frac) {
            return Err(malformed());
        }

        let whole: i64 = whole.parse().map_err(|_| malformed())?;
        let frac_units: i64 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", frac, width = ASSET_PRECISION as usize);
            padded.parse().map_err(|_| malformed())?
        };

        let amount = whole
            .checked_mul(UNITS_PER_COIN)
            .and_then(|a| a.checked_add(frac_units))
            .ok_or_else(|| TallyError::ArithmeticOverflow(s.to_string()))?;

        Ok(Asset::new(if negative { -amount } else { amount }, symbol))
    }
}

impl Serialize for Asset {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Asset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_add_same_symbol() {
        let sum = Asset::scr(10).checked_add(Asset::scr(5)).unwrap();
        assert_eq!(sum, Asset::scr(15));
    }

    #[test]
    fn test_add_symbol_mismatch() {
        let err = Asset::scr(10).checked_add(Asset::sp(5)).unwrap_err();
        assert_eq!(
            err,
            TallyError::SymbolMismatch {
                left: Symbol::Scr,
                right: Symbol::Sp
            }
        );
    }

    #[test]
    fn test_sub_may_go_negative() {
        let diff = Asset::sp(3).checked_sub(Asset::sp(5)).unwrap();
        assert_eq!(diff.amount, -2);
        assert!(diff.is_negative());
    }

    #[test]
    fn test_add_overflow() {
        let err = Asset::scr(i64::MAX).checked_add(Asset::scr(1)).unwrap_err();
        assert!(matches!(err, TallyError::ArithmeticOverflow(_)));
    }

    #[test]
    fn test_mul_div_uses_wide_intermediate() {
        // amount * numerator overflows i64 but the quotient fits.
        let big = Asset::scr(i64::MAX / 2);
        let scaled = big.mul_div(10_000, 10_000).unwrap();
        assert_eq!(scaled, big);
    }

    #[test]
    fn test_mul_div_truncates_toward_zero() {
        assert_eq!(Asset::scr(19).mul_div(5, 100).unwrap(), Asset::scr(0));
        assert_eq!(Asset::scr(999).mul_div(1, 10).unwrap(), Asset::scr(99));
        assert_eq!(Asset::scr(-999).mul_div(1, 10).unwrap(), Asset::scr(-99));
    }

    #[test]
    fn test_mul_div_zero_denominator() {
        assert!(matches!(
            Asset::scr(1).mul_div(1, 0),
            Err(TallyError::ArithmeticOverflow(_))
        ));
    }

    #[test]
    fn test_partial_cmp_mismatched_symbols() {
        assert_eq!(Asset::scr(1).partial_cmp(&Asset::sp(1)), None);
        assert!(Asset::scr(1) < Asset::scr(2));
        assert!(Asset::scr(1).try_cmp(&Asset::sp(2)).is_err());
    }

    #[test]
    fn test_try_max_min() {
        assert_eq!(Asset::scr(1).try_max(Asset::scr(7)).unwrap(), Asset::scr(7));
        assert_eq!(Asset::scr(1).try_min(Asset::scr(7)).unwrap(), Asset::scr(1));
    }

    #[test]
    fn test_display() {
        assert_eq!(Asset::scr(1_500_000_000).to_string(), "1.500000000 SCR");
        assert_eq!(Asset::sp(7).to_string(), "0.000000007 SP");
        assert_eq!(Asset::scr(-1).to_string(), "-0.000000001 SCR");
    }

    #[test]
    fn test_serde_uses_display_form() {
        let json = serde_json::to_string(&Asset::sp(2_000_000_001)).unwrap();
        assert_eq!(json, "\"2.000000001 SP\"");
        assert_eq!(serde_json::from_str::<Asset>(&json).unwrap(), Asset::sp(2_000_000_001));
    }

    #[test]
    fn test_parse() {
        assert_eq!("1.5 SCR".parse::<Asset>().unwrap(), Asset::scr(1_500_000_000));
        assert_eq!("20 SP".parse::<Asset>().unwrap(), Asset::sp(20 * UNITS_PER_COIN));
        assert!("1.5".parse::<Asset>().is_err());
        assert!("1.5 XYZ".parse::<Asset>().is_err());
    }

    #[test]
    fn test_parse_rejects_signed_parts() {
        for input in ["1.-5 SCR", "1.+5 SCR", "+1.5 SCR", "-+1 SP", "1.5e3 SCR", "--1 SCR"] {
            assert!(
                matches!(input.parse::<Asset>(), Err(TallyError::InvalidState(_))),
                "{} should be rejected",
                input
            );
        }
        assert_eq!("-0.5 SP".parse::<Asset>().unwrap(), Asset::sp(-500_000_000));
    }

    proptest! {
        #[test]
        fn prop_mismatched_symbols_always_fail(a in any::<i64>(), b in any::<i64>()) {
            let left = Asset::scr(a);
            let right = Asset::sp(b);
            let add_mismatch = matches!(left.checked_add(right), Err(TallyError::SymbolMismatch { .. }));
            let sub_mismatch = matches!(left.checked_sub(right), Err(TallyError::SymbolMismatch { .. }));
            prop_assert!(add_mismatch);
            prop_assert!(sub_mismatch);
        }

        #[test]
        fn prop_sequential_split_is_exact(
            emission in 0i64..=1_000_000_000_000_000,
            percent in 0i64..=10_000,
        ) {
            let total = Asset::scr(emission);
            let part = total.mul_div(percent, 10_000).unwrap();
            let rest = total.checked_sub(part).unwrap();
            prop_assert!(part.amount >= 0);
            prop_assert!(rest.amount >= 0);
            prop_assert_eq!(part.checked_add(rest).unwrap(), total);
        }
    }
}
