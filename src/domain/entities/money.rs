//! Money and currency value objects.

use std::fmt;

use serde::{Deserialize, Serialize};

/// ISO-4217 alphabetic currency code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Currencies charged without a fractional minor unit.
    const ZERO_DECIMAL: [&'static str; 16] = [
        "BIF", "CLP", "DJF", "GNF", "JPY", "KMF", "KRW", "MGA", "PYG", "RWF", "UGX", "VND", "VUV",
        "XAF", "XOF", "XPF",
    ];

    /// Creates currency from a three-letter code, normalising to uppercase.
    #[must_use]
    pub fn new(code: &str) -> Option<Self> {
        let code = code.trim();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return None;
        }
        Some(Self(code.to_ascii_uppercase()))
    }

    /// Japanese yen.
    #[must_use]
    pub fn jpy() -> Self {
        Self("JPY".to_string())
    }

    /// Returns the code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Number of decimal digits in one major unit.
    #[must_use]
    pub fn exponent(&self) -> u32 {
        if Self::ZERO_DECIMAL.contains(&self.0.as_str()) {
            0
        } else {
            2
        }
    }
}

impl TryFrom<String> for Currency {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value).ok_or_else(|| format!("invalid currency code: {value:?}"))
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Positive amount in the currency's minor unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawMoney", into = "RawMoney")]
pub struct Money {
    amount: u64,
    currency: Currency,
}

#[derive(Serialize, Deserialize)]
struct RawMoney {
    amount: u64,
    currency: Currency,
}

impl TryFrom<RawMoney> for Money {
    type Error = String;

    fn try_from(raw: RawMoney) -> Result<Self, Self::Error> {
        Self::new(raw.amount, raw.currency).ok_or_else(|| "amount must be positive".to_string())
    }
}

impl From<Money> for RawMoney {
    fn from(money: Money) -> Self {
        Self {
            amount: money.amount,
            currency: money.currency,
        }
    }
}

impl Money {
    /// Creates money, rejecting zero amounts.
    #[must_use]
    pub fn new(amount: u64, currency: Currency) -> Option<Self> {
        (amount > 0).then_some(Self { amount, currency })
    }

    /// Minor-unit amount.
    #[must_use]
    pub const fn amount(&self) -> u64 {
        self.amount
    }

    /// Currency.
    #[must_use]
    pub const fn currency(&self) -> &Currency {
        &self.currency
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let exponent = self.currency.exponent();
        let divisor = 10u64.pow(exponent);
        let major = group_thousands(self.amount / divisor);

        if exponent == 0 {
            write!(f, "{} {major}", self.currency)
        } else {
            let minor = self.amount % divisor;
            write!(
                f,
                "{} {major}.{minor:0width$}",
                self.currency,
                width = exponent as usize
            )
        }
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
