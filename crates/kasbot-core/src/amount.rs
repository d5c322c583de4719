//! Currency amounts read from the spreadsheet.
//!
//! Cells are formatted the Indonesian way: `Rp1.234.567` or `-Rp500`, with `.`
//! as the thousands separator and an optional `,` decimal part.

use crate::error::KasbotError;
use serde::Serialize;

/// Currency prefix stripped before parsing.
pub const CURRENCY_PREFIX: &str = "Rp";

/// Thousands separator stripped before parsing.
pub const THOUSANDS_SEPARATOR: char = '.';

/// Decimal separator (converted to `.` before parsing).
pub const DECIMAL_SEPARATOR: char = ',';

/// A parsed, signed amount plus the string it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExternalAmount {
    pub value: f64,
    /// The cell text exactly as displayed (trimmed).
    pub display: String,
}

/// Sign-based classification driving the label marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Balance {
    Deficit,
    Surplus,
}

impl Balance {
    /// Emoji shown in front of the group label.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Deficit => "🔴",
            Self::Surplus => "🟢",
        }
    }
}

impl ExternalAmount {
    /// Negative amounts are a deficit; zero counts as surplus.
    pub fn balance(&self) -> Balance {
        if self.value < 0.0 {
            Balance::Deficit
        } else {
            Balance::Surplus
        }
    }
}

/// Split a leading `-` or surrounding parentheses off `s`.
fn strip_sign(s: &str) -> (bool, &str) {
    if let Some(rest) = s.strip_prefix('-') {
        return (true, rest.trim_start());
    }
    if let Some(inner) = s.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        return (true, inner.trim());
    }
    (false, s)
}

/// Parse a currency-formatted cell into an [`ExternalAmount`].
///
/// Accepts the sign before or after the prefix (`-Rp500`, `Rp-500`, `(Rp500)`).
pub fn parse_amount(raw: &str) -> Result<ExternalAmount, KasbotError> {
    let display = raw.trim();
    if display.is_empty() {
        return Err(KasbotError::Fetch("cell is empty".into()));
    }

    let (outer_negative, rest) = strip_sign(display);
    let rest = rest.strip_prefix(CURRENCY_PREFIX).unwrap_or(rest).trim_start();
    let (inner_negative, rest) = strip_sign(rest);

    let digits: String = rest
        .chars()
        .filter(|c| *c != THOUSANDS_SEPARATOR && !c.is_whitespace())
        .map(|c| if c == DECIMAL_SEPARATOR { '.' } else { c })
        .collect();

    // A second sign after stripping means the input was malformed ("--5", "Rp+5").
    if digits.is_empty() || !digits.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(KasbotError::Fetch(format!("not a number: '{display}'")));
    }

    let magnitude: f64 = digits
        .parse()
        .map_err(|_| KasbotError::Fetch(format!("not a number: '{display}'")))?;
    if !magnitude.is_finite() {
        return Err(KasbotError::Fetch(format!("not a number: '{display}'")));
    }

    let value = if outer_negative != inner_negative {
        -magnitude
    } else {
        magnitude
    };

    Ok(ExternalAmount {
        value,
        display: display.to_string(),
    })
}
