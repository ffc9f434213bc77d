use std::{fmt::Display, iter::Sum, ops::Add, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

//--------------------------------------      Rupiah        -----------------------------------------------------------
/// A monetary amount in whole Indonesian rupiah.
///
/// All prices, balances and discounts in the system are denominated in whole rupiah. The inner value is signed so that
/// differences can be computed safely, but persisted amounts (balances, transaction amounts) are never negative.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Rupiah(i64);

op!(binary Rupiah, Add, add);
op!(binary Rupiah, Sub, sub);
op!(inplace Rupiah, AddAssign, add_assign);
op!(inplace Rupiah, SubAssign, sub_assign);
op!(unary Rupiah, Neg, neg);

impl Sum for Rupiah {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in rupiah: {0}")]
pub struct RupiahConversionError(String);

impl From<i64> for Rupiah {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Rupiah {
    type Error = RupiahConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(RupiahConversionError(format!("Value {value} is too large to convert to Rupiah")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl FromStr for Rupiah {
    type Err = RupiahConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self).map_err(|e| RupiahConversionError(format!("{s}: {e}")))
    }
}

impl PartialEq for Rupiah {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Rupiah {}

impl Display for Rupiah {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Rp{}", self.0)
    }
}

impl Rupiah {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Subtraction that stops at zero. Used for discount application, where a discount may never push a price below
    /// zero.
    pub fn saturating_sub_floor_zero(self, rhs: Self) -> Self {
        Self((self.0 - rhs.0).max(0))
    }
}

#[cfg(test)]
mod test {
    use super::Rupiah;

    #[test]
    fn arithmetic() {
        let a = Rupiah::from(100_000);
        let b = Rupiah::from(5_000);
        assert_eq!(a - b, Rupiah::from(95_000));
        assert_eq!(a + b, Rupiah::from(105_000));
        assert_eq!(-b, Rupiah::from(-5_000));
    }

    #[test]
    fn floor_at_zero() {
        let price = Rupiah::from(15_000);
        let discount = Rupiah::from(20_000);
        assert_eq!(price.saturating_sub_floor_zero(discount), Rupiah::from(0));
    }

    #[test]
    fn display() {
        assert_eq!(Rupiah::from(95_000).to_string(), "Rp95000");
    }
}
