//! Record types flowing through the blueprint pipelines
//!
//! The assigner only needs to read an event-time string, so records expose it
//! through the narrow `EventTime` trait instead of a shared base type.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Access to a record's zone-less event-time string
pub trait EventTime {
    /// The raw event time, or `None` if the record has none
    fn event_time(&self) -> Option<&str>;
}

impl EventTime for str {
    fn event_time(&self) -> Option<&str> {
        Some(self)
    }
}

impl EventTime for String {
    fn event_time(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl<T: EventTime + ?Sized> EventTime for &T {
    fn event_time(&self) -> Option<&str> {
        (**self).event_time()
    }
}

/// Records carrying a price the pipeline filter can inspect
pub trait Priced {
    fn price(&self) -> f64;
}

/// Stock ticker record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stock {
    pub event_time: String,
    pub ticker: String,
    pub price: f64,
}

impl EventTime for Stock {
    fn event_time(&self) -> Option<&str> {
        Some(&self.event_time)
    }
}

impl Priced for Stock {
    fn price(&self) -> f64 {
        self.price
    }
}

/// Order record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub product_id: i64,
    pub order_number: i64,
    pub quantity: i32,
    pub price: f64,
    pub buyer: String,
    pub order_time: String,
}

impl EventTime for Order {
    fn event_time(&self) -> Option<&str> {
        Some(&self.order_time)
    }
}

impl Priced for Order {
    fn price(&self) -> f64 {
        self.price
    }
}

/// Record shapes understood by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    #[default]
    Stock,
    Order,
}

impl RecordKind {
    /// Name of the event-time field for this record shape
    pub fn event_time_field(&self) -> &'static str {
        match self {
            RecordKind::Stock => "event_time",
            RecordKind::Order => "order_time",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Stock => write!(f, "stock"),
            RecordKind::Order => write!(f, "order"),
        }
    }
}

impl std::str::FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stock" => Ok(RecordKind::Stock),
            "order" => Ok(RecordKind::Order),
            _ => Err(format!(
                "Unsupported record kind: {}. Supported: stock, order",
                s
            )),
        }
    }
}

/// Borrowed view over an arbitrary JSON object with a named event-time field
#[derive(Debug, Clone, Copy)]
pub struct JsonRecord<'a> {
    value: &'a Value,
    field: &'a str,
}

impl<'a> JsonRecord<'a> {
    pub fn new(value: &'a Value, field: &'a str) -> Self {
        Self { value, field }
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }
}

impl EventTime for JsonRecord<'_> {
    fn event_time(&self) -> Option<&str> {
        self.value.get(self.field).and_then(Value::as_str)
    }
}

impl Priced for JsonRecord<'_> {
    fn price(&self) -> f64 {
        self.value
            .get("price")
            .and_then(Value::as_f64)
            .unwrap_or(f64::NAN)
    }
}

/// Keeps records priced at or above a threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceFilter {
    min_price: f64,
}

impl PriceFilter {
    pub fn new(min_price: f64) -> Self {
        Self { min_price }
    }

    /// Whether the record passes; a missing (NaN) price never passes
    pub fn accepts<R: Priced + ?Sized>(&self, record: &R) -> bool {
        record.price() >= self.min_price
    }
}

impl Default for PriceFilter {
    fn default() -> Self {
        Self::new(1.0)
    }
}
