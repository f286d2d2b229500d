//! Heuristic amount extraction from payment-notification payloads.
//!
//! Senders forward whatever their app produced: clean numeric fields,
//! locale-formatted strings such as `"Rp 25.000,00"`, or a sentence with the
//! amount somewhere inside. Extraction runs an ordered list of strategies and
//! the first one that yields a value wins. A miss is `None`, never an error.

use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::sync::LazyLock;

/// Body fields checked for a direct amount, in priority order.
pub const DIRECT_FIELDS: [&str; 5] = ["amount", "total", "nominal", "value", "price"];

/// Values a bare number must fall in to be preferred as a payment amount.
pub const PLAUSIBLE_RANGE: RangeInclusive<u64> = 100..=1_000_000_000_000;

static CURRENCY_TAGGED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\brp\.?|\bidr)\s*[:\-]?\s*([0-9][0-9.,]*)").expect("valid regex")
});

static NUMBER_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9][0-9.,]+").expect("valid regex"));

/// Normalizes a locale-formatted number into whole currency units.
///
/// Only digits, `.` and `,` are kept. The last separator is a decimal point
/// only when it is followed by one or two digits, and a lone `.` style is
/// always read as thousands grouping (`"25.000"` is twenty-five thousand).
/// Fractions are rounded half away from zero.
pub fn normalize_amount(fragment: &str) -> Option<u64> {
    let cleaned: String = fragment
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    if !cleaned.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }

    let decimal_at = decimal_separator(&cleaned);
    let mut number = String::with_capacity(cleaned.len() + 1);
    for (idx, c) in cleaned.char_indices() {
        if c.is_ascii_digit() {
            number.push(c);
        } else if Some(idx) == decimal_at {
            if number.is_empty() {
                number.push('0');
            }
            number.push('.');
        }
    }

    Decimal::from_str(&number)
        .ok()?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
}

/// Byte index of the separator acting as decimal point, if any.
fn decimal_separator(cleaned: &str) -> Option<usize> {
    let candidate = match (cleaned.rfind('.'), cleaned.rfind(',')) {
        (Some(dot), Some(comma)) => dot.max(comma),
        (None, Some(comma)) => comma,
        // a dot on its own is always grouping
        _ => return None,
    };
    let fraction = &cleaned[candidate + 1..];
    let is_fraction =
        matches!(fraction.len(), 1 | 2) && fraction.bytes().all(|b| b.is_ascii_digit());
    is_fraction.then_some(candidate)
}

/// The material a strategy inspects: the decoded body plus all of its text.
pub struct ExtractionInput<'a> {
    body: &'a Value,
    text: String,
}

impl<'a> ExtractionInput<'a> {
    pub fn new(body: &'a Value, raw: &str) -> Self {
        let mut parts = Vec::new();
        collect_strings(body, &mut parts);
        if !raw.is_empty() {
            parts.push(raw);
        }
        Self {
            body,
            text: parts.join(" "),
        }
    }

    pub fn body(&self) -> &Value {
        self.body
    }

    /// Every string in the body, in document order, followed by the raw text.
    pub fn text(&self) -> &str {
        &self.text
    }
}

fn collect_strings<'v>(value: &'v Value, out: &mut Vec<&'v str>) {
    match value {
        Value::String(s) if !s.is_empty() => out.push(s),
        Value::Array(items) => items.iter().for_each(|item| collect_strings(item, out)),
        Value::Object(map) => map.values().for_each(|item| collect_strings(item, out)),
        _ => {}
    }
}

/// A single way of finding an amount.
pub trait AmountStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, input: &ExtractionInput<'_>) -> Option<u64>;
}

/// Well-known top-level fields such as `amount` or `total`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectFields;

impl AmountStrategy for DirectFields {
    fn name(&self) -> &'static str {
        "direct-fields"
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> Option<u64> {
        DIRECT_FIELDS
            .iter()
            .filter_map(|field| input.body().get(field))
            .find_map(|value| match value {
                Value::Number(n) => number_units(n),
                Value::String(s) => normalize_amount(s),
                _ => None,
            })
    }
}

fn number_units(n: &serde_json::Number) -> Option<u64> {
    if let Some(units) = n.as_u64() {
        return Some(units);
    }
    let f = n.as_f64()?;
    let rounded = f.round();
    (rounded.is_finite() && rounded >= 0.0 && rounded < u64::MAX as f64).then_some(rounded as u64)
}

/// A number right after a currency marker, e.g. `Rp 10.000` or `IDR: 5,000`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CurrencyTagged;

impl AmountStrategy for CurrencyTagged {
    fn name(&self) -> &'static str {
        "currency-tagged"
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> Option<u64> {
        CURRENCY_TAGGED
            .captures_iter(input.text())
            .filter_map(|caps| caps.get(1))
            .find_map(|m| normalize_amount(m.as_str()))
    }
}

/// Last resort: the largest plausible number anywhere in the text.
#[derive(Debug, Default, Clone, Copy)]
pub struct BareNumeric;

impl AmountStrategy for BareNumeric {
    fn name(&self) -> &'static str {
        "bare-numeric"
    }

    fn extract(&self, input: &ExtractionInput<'_>) -> Option<u64> {
        let values: Vec<u64> = NUMBER_LIKE
            .find_iter(input.text())
            .filter_map(|m| normalize_amount(m.as_str()))
            .collect();

        values
            .iter()
            .copied()
            .filter(|v| PLAUSIBLE_RANGE.contains(v))
            .max()
            .or_else(|| values.iter().copied().max())
    }
}

/// Runs strategies in order until one of them finds an amount.
pub struct AmountExtractor {
    strategies: Vec<Box<dyn AmountStrategy>>,
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new(vec![
            Box::new(DirectFields),
            Box::new(CurrencyTagged),
            Box::new(BareNumeric),
        ])
    }
}

impl AmountExtractor {
    pub fn new(strategies: Vec<Box<dyn AmountStrategy>>) -> Self {
        Self { strategies }
    }

    /// Adds a strategy at `position`, clamped to the end of the list.
    pub fn insert(&mut self, position: usize, strategy: Box<dyn AmountStrategy>) {
        let position = position.min(self.strategies.len());
        self.strategies.insert(position, strategy);
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn extract(&self, body: &Value, raw: &str) -> Option<u64> {
        let input = ExtractionInput::new(body, raw);
        for strategy in &self.strategies {
            if let Some(amount) = strategy.extract(&input) {
                tracing::debug!(strategy = strategy.name(), amount, "amount extracted");
                return Some(amount);
            }
        }
        tracing::debug!("no amount found in payload");
        None
    }
}

/// Extracts an amount with the default strategy order.
pub fn parse_amount(body: &Value, raw: &str) -> Option<u64> {
    AmountExtractor::default().extract(body, raw)
}
