// Synthetic record generation for local testing
//
// Produces the same payloads the blueprint producers put on the stream:
// stock ticks with a random ticker and price, or orders with random ids.
// Event times use the zone-less `yyyy-MM-dd HH:mm:ss` form.

use anyhow::Result;
use chrono::NaiveDateTime;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::io::Write;
use stream2buckets_core::{Order, RecordKind, Stock};

pub const TICKERS: [&str; 5] = ["AAPL", "AMZN", "MSFT", "INTC", "TBV"];

const BUYERS: [&str; 5] = ["alice", "bob", "carol", "dave", "erin"];

const EVENT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct DataGenerator {
    rng: StdRng,
    kind: RecordKind,
}

impl DataGenerator {
    /// Create a generator; a seed makes everything but the event time reproducible
    pub fn new(kind: RecordKind, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, kind }
    }

    pub fn stock_at(&mut self, event_time: NaiveDateTime) -> Stock {
        let ticker = TICKERS.choose(&mut self.rng).copied().unwrap_or(TICKERS[0]);
        Stock {
            event_time: event_time.format(EVENT_TIME_FORMAT).to_string(),
            ticker: ticker.to_string(),
            price: self.price(),
        }
    }

    pub fn order_at(&mut self, event_time: NaiveDateTime) -> Order {
        let buyer = BUYERS.choose(&mut self.rng).copied().unwrap_or(BUYERS[0]);
        Order {
            product_id: self.rng.gen_range(1..=1_000),
            order_number: self.rng.gen_range(1..=i64::from(u32::MAX)),
            quantity: self.rng.gen_range(1..=10),
            price: self.price(),
            buyer: buyer.to_string(),
            order_time: event_time.format(EVENT_TIME_FORMAT).to_string(),
        }
    }

    /// Write `count` JSON lines stamped with `event_time`
    pub fn write_records<W: Write>(
        &mut self,
        count: usize,
        event_time: NaiveDateTime,
        mut out: W,
    ) -> Result<usize> {
        for _ in 0..count {
            match self.kind {
                RecordKind::Stock => {
                    let stock = self.stock_at(event_time);
                    serde_json::to_writer(&mut out, &stock)?;
                }
                RecordKind::Order => {
                    let order = self.order_at(event_time);
                    serde_json::to_writer(&mut out, &order)?;
                }
            }
            out.write_all(b"\n")?;
        }
        out.flush()?;
        Ok(count)
    }

    // Two decimal places in [0, 100)
    fn price(&mut self) -> f64 {
        (self.rng.gen::<f64>() * 10_000.0).floor() / 100.0
    }
}
