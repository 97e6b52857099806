use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const KES_CURRENCY_CODE: &str = "KES";
pub const USD_CURRENCY_CODE: &str = "USD";

//--------------------------------------      Money        -----------------------------------------------------------
/// A monetary amount in minor units (cents). All prices and charges in the system are stored and compared in minor
/// units so that no floating point arithmetic ever touches a balance.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in cents: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Money {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Money {}

impl TryFrom<u64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MoneyConversionError(format!("Value {} is too large to convert to Money", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let units = self.0 as f64 / 100.0;
        write!(f, "{units:0.2}")
    }
}

impl Money {
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Construct an amount from whole currency units.
    pub fn from_units(units: i64) -> Self {
        Self(units * 100)
    }

    /// The amount in whole currency units, rounded towards zero. Mobile money providers only accept whole units.
    pub fn whole_units(&self) -> i64 {
        self.0 / 100
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arithmetic_and_display() {
        let a = Money::from_units(500);
        let b = Money::from(250);
        assert_eq!((a + b).value(), 50_250);
        assert_eq!((a - b).value(), 49_750);
        assert_eq!(format!("{}", a + b), "502.50");
        assert_eq!((-b).value(), -250);
    }

    #[test]
    fn whole_units_truncate() {
        assert_eq!(Money::from(199).whole_units(), 1);
        assert_eq!(Money::from_units(500).whole_units(), 500);
    }

    #[test]
    fn sum_of_amounts() {
        let total: Money = vec![Money::from(100), Money::from(250)].into_iter().sum();
        assert_eq!(total, Money::from(350));
    }
}
