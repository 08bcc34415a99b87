//! Exchange record types and numeric coercion

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;
use thiserror::Error;

/// Positional layout of a historic-rates row as the exchange returns it
pub const CANDLE_FIELDS: [&str; 6] = ["time", "low", "high", "open", "close", "volume"];

/// One historic-rates row before it is mapped onto [`Candle`]
pub type RawCandle = Vec<Value>;

/// Errors raised while coercing exchange payloads into typed records
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoercionError {
    /// Field holds something that is not a number or numeric string
    #[error("Field {field} is not numeric: {value}")]
    NotNumeric { field: &'static str, value: String },
    /// Candle row does not have one value per candle field
    #[error("Candle row has {actual} values, expected {expected}")]
    Arity { expected: usize, actual: usize },
    /// Candle time is not a representable unix timestamp
    #[error("Invalid candle timestamp: {0}")]
    Timestamp(String),
}

/// A trade as the exchange returns it, numeric fields still untyped
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTrade {
    pub trade_id: i64,
    pub price: Value,
    pub size: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,
    /// Exchange-supplied fields this crate does not interpret, `time` included
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawTrade {
    /// Coerce `price` and `size` to decimals and tag the trade with its product.
    ///
    /// Every other field is carried over untouched, except an exchange-sent
    /// `prod_id`, which the requested product replaces.
    pub fn coerce(self, product_id: &str) -> Result<Trade, CoercionError> {
        let mut extra = self.extra;
        extra.remove("prod_id");

        Ok(Trade {
            trade_id: self.trade_id,
            price: coerce_decimal("price", &self.price)?,
            size: coerce_decimal("size", &self.size)?,
            side: self.side,
            prod_id: product_id.to_string(),
            extra,
        })
    }
}

/// A trade delivered to feed consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: i64,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub size: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,
    /// Product the trade was fetched for
    pub prod_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One fixed-granularity OHLCV bar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    pub time: DateTime<Utc>,
    pub low: Decimal,
    pub high: Decimal,
    pub open: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Candle {
    /// Map a positional exchange row onto named fields following [`CANDLE_FIELDS`]
    pub fn from_row(row: &[Value]) -> Result<Self, CoercionError> {
        if row.len() != CANDLE_FIELDS.len() {
            return Err(CoercionError::Arity {
                expected: CANDLE_FIELDS.len(),
                actual: row.len(),
            });
        }

        let value = |idx: usize| coerce_decimal(CANDLE_FIELDS[idx], &row[idx]);

        Ok(Self {
            time: coerce_timestamp(&row[0])?,
            low: value(1)?,
            high: value(2)?,
            open: value(3)?,
            close: value(4)?,
            volume: value(5)?,
        })
    }

    /// Numeric fields keyed by name, in [`CANDLE_FIELDS`] order
    pub fn fields(&self) -> [(&'static str, Decimal); 5] {
        [
            (CANDLE_FIELDS[1], self.low),
            (CANDLE_FIELDS[2], self.high),
            (CANDLE_FIELDS[3], self.open),
            (CANDLE_FIELDS[4], self.close),
            (CANDLE_FIELDS[5], self.volume),
        ]
    }
}

/// Coerce a JSON number or numeric string into a decimal
pub fn coerce_decimal(field: &'static str, value: &Value) -> Result<Decimal, CoercionError> {
    let not_numeric = || CoercionError::NotNumeric {
        field,
        value: value.to_string(),
    };

    match value {
        Value::String(s) => parse_decimal(s.trim()).ok_or_else(not_numeric),
        Value::Number(n) => parse_decimal(&n.to_string()).ok_or_else(not_numeric),
        _ => Err(not_numeric()),
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn coerce_timestamp(value: &Value) -> Result<DateTime<Utc>, CoercionError> {
    let secs = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    secs.and_then(|s| Utc.timestamp_opt(s, 0).single())
        .ok_or_else(|| CoercionError::Timestamp(value.to_string()))
}
