//! Letter-based date/time patterns (`yyyy-MM-dd-HH`) compiled to chrono items
//!
//! Partition formats are configured with the conventional letter-token syntax
//! used by stream-processing job properties. The pattern is compiled once into
//! an immutable list of segments, mostly [`chrono::format::Item`]s, which can
//! be rendered from any number of threads at the same time.
//!
//! Supported letters:
//!
//! | Letter | Widths | Field |
//! |---|---|---|
//! | `y`, `u` | 1, 2, 4 | year (2 = two-digit year) |
//! | `M`, `L` | 1-4 | month (3 = short name, 4 = full name) |
//! | `Q`, `q` | 1-4 | quarter (3 = `Q1`, 4 = `1st quarter`) |
//! | `d` | 1, 2 | day of month |
//! | `D` | 1, 3 | day of year |
//! | `E` | 1-4 | weekday (1-3 short, 4 full) |
//! | `G` | 1-4 | era (1-3 = `AD`, 4 = `Anno Domini`) |
//! | `a` | 1 | AM/PM |
//! | `H` / `k` | 1, 2 | hour 0-23 / 1-24 |
//! | `h` / `K` | 1, 2 | hour 1-12 / 0-11 |
//! | `m`, `s` | 1, 2 | minute, second |
//! | `S` | 1-9 | fraction of second, truncated to the width |
//! | `n` | 1 | nano-of-second, unpadded |
//!
//! Text in single quotes is literal, `''` is a single quote, and every
//! non-letter character is copied through as-is.
//!
//! Week-based and locale-dependent fields (`Y`, `w`, `W`, `e`, `c`, `F`, `B`)
//! are rejected, as are zone letters: event times carry no zone.

use crate::error::{PartitionError, Result};
use chrono::format::{Fixed, Item, Numeric, Pad};
use chrono::{Datelike, NaiveDateTime, Timelike};
use std::fmt::Write;

/// Zone and offset letters; event times are zone-less so these can never render.
const ZONE_LETTERS: &[char] = &['V', 'v', 'z', 'O', 'X', 'x', 'Z'];

/// Letters recognised by this compiler (used to tell "bad width" from "bad letter").
const KNOWN_LETTERS: &[char] = &[
    'y', 'u', 'M', 'L', 'Q', 'q', 'd', 'D', 'E', 'G', 'a', 'H', 'k', 'h', 'K', 'm', 's', 'S',
    'n',
];

/// One compiled piece of a pattern
#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Item(Item<'static>),
    Derived(Derived, usize),
}

/// Fields chrono has no formatting item for, with their pattern width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Derived {
    Fraction,
    ClockHourOfDay,
    HourOfAmPm,
    Quarter,
    Era,
}

impl Derived {
    fn render(self, width: usize, dt: &NaiveDateTime, out: &mut String) -> std::fmt::Result {
        match self {
            Derived::Fraction => {
                let digits = format!("{:09}", dt.nanosecond() % 1_000_000_000);
                out.push_str(&digits[..width]);
                Ok(())
            }
            Derived::ClockHourOfDay => {
                let hour = match dt.hour() {
                    0 => 24,
                    h => h,
                };
                write!(out, "{:0width$}", hour, width = width)
            }
            Derived::HourOfAmPm => write!(out, "{:0width$}", dt.hour() % 12, width = width),
            Derived::Quarter => {
                let quarter = dt.month0() / 3 + 1;
                match width {
                    1 | 2 => write!(out, "{:0width$}", quarter, width = width),
                    3 => write!(out, "Q{}", quarter),
                    _ => {
                        let suffix = match quarter {
                            1 => "st",
                            2 => "nd",
                            3 => "rd",
                            _ => "th",
                        };
                        write!(out, "{}{} quarter", quarter, suffix)
                    }
                }
            }
            Derived::Era => {
                let common_era = dt.year() > 0;
                let name = match (width, common_era) {
                    (4, true) => "Anno Domini",
                    (4, false) => "Before Christ",
                    (_, true) => "AD",
                    (_, false) => "BC",
                };
                out.push_str(name);
                Ok(())
            }
        }
    }
}

/// A compiled partition format
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionPattern {
    source: String,
    segments: Vec<Segment>,
}

impl PartitionPattern {
    /// Compile a letter-based pattern, rejecting anything that cannot render
    /// a timezone-naive date-time.
    pub fn compile(pattern: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            if c.is_ascii_alphabetic() {
                let mut width = 1;
                while chars.peek() == Some(&c) {
                    chars.next();
                    width += 1;
                }
                flush_literal(&mut segments, &mut literal);
                segments.push(letter_segment(pattern, c, width)?);
            } else if c == '\'' {
                // '' outside a quoted section is an escaped quote
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    literal.push('\'');
                    continue;
                }

                let mut closed = false;
                while let Some(q) = chars.next() {
                    if q != '\'' {
                        literal.push(q);
                    } else if chars.peek() == Some(&'\'') {
                        chars.next();
                        literal.push('\'');
                    } else {
                        closed = true;
                        break;
                    }
                }
                if !closed {
                    return Err(PartitionError::invalid_pattern(
                        pattern,
                        "unterminated quoted literal",
                    ));
                }
            } else if c == '[' || c == ']' {
                return Err(PartitionError::invalid_pattern(
                    pattern,
                    "optional sections are not supported in partition formats",
                ));
            } else if matches!(c, '{' | '}' | '#') {
                return Err(PartitionError::invalid_pattern(
                    pattern,
                    format!("'{}' is reserved", c),
                ));
            } else {
                literal.push(c);
            }
        }
        flush_literal(&mut segments, &mut literal);

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    /// The pattern as it was configured
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Render a local date-time with this pattern
    pub fn render(&self, dt: &NaiveDateTime) -> Result<String> {
        let mut out = String::with_capacity(self.source.len() + 8);
        for segment in &self.segments {
            let written = match segment {
                Segment::Item(item) => write!(
                    out,
                    "{}",
                    dt.format_with_items(std::slice::from_ref(item).iter())
                ),
                Segment::Derived(field, width) => field.render(*width, dt, &mut out),
            };
            written.map_err(|_| {
                PartitionError::invalid_pattern(
                    self.source.as_str(),
                    format!("cannot render {}", dt),
                )
            })?;
        }
        Ok(out)
    }
}

impl std::fmt::Display for PartitionPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

fn flush_literal(segments: &mut Vec<Segment>, literal: &mut String) {
    if !literal.is_empty() {
        let text = std::mem::take(literal).into_boxed_str();
        segments.push(Segment::Item(Item::OwnedLiteral(text)));
    }
}

fn letter_segment(pattern: &str, letter: char, width: usize) -> Result<Segment> {
    let item = match (letter, width) {
        ('y' | 'u', 1) => Item::Numeric(Numeric::Year, Pad::None),
        ('y' | 'u', 2) => Item::Numeric(Numeric::YearMod100, Pad::Zero),
        ('y' | 'u', 4) => Item::Numeric(Numeric::Year, Pad::Zero),
        ('M' | 'L', 1) => Item::Numeric(Numeric::Month, Pad::None),
        ('M' | 'L', 2) => Item::Numeric(Numeric::Month, Pad::Zero),
        ('M' | 'L', 3) => Item::Fixed(Fixed::ShortMonthName),
        ('M' | 'L', 4) => Item::Fixed(Fixed::LongMonthName),
        ('Q' | 'q', 1..=4) => return Ok(Segment::Derived(Derived::Quarter, width)),
        ('d', 1) => Item::Numeric(Numeric::Day, Pad::None),
        ('d', 2) => Item::Numeric(Numeric::Day, Pad::Zero),
        ('D', 1) => Item::Numeric(Numeric::Ordinal, Pad::None),
        ('D', 3) => Item::Numeric(Numeric::Ordinal, Pad::Zero),
        ('E', 1..=3) => Item::Fixed(Fixed::ShortWeekdayName),
        ('E', 4) => Item::Fixed(Fixed::LongWeekdayName),
        ('G', 1..=4) => return Ok(Segment::Derived(Derived::Era, width)),
        ('a', 1) => Item::Fixed(Fixed::UpperAmPm),
        ('H', 1) => Item::Numeric(Numeric::Hour, Pad::None),
        ('H', 2) => Item::Numeric(Numeric::Hour, Pad::Zero),
        ('k', 1..=2) => return Ok(Segment::Derived(Derived::ClockHourOfDay, width)),
        ('h', 1) => Item::Numeric(Numeric::Hour12, Pad::None),
        ('h', 2) => Item::Numeric(Numeric::Hour12, Pad::Zero),
        ('K', 1..=2) => return Ok(Segment::Derived(Derived::HourOfAmPm, width)),
        ('m', 1) => Item::Numeric(Numeric::Minute, Pad::None),
        ('m', 2) => Item::Numeric(Numeric::Minute, Pad::Zero),
        ('s', 1) => Item::Numeric(Numeric::Second, Pad::None),
        ('s', 2) => Item::Numeric(Numeric::Second, Pad::Zero),
        ('S', 9) => Item::Numeric(Numeric::Nanosecond, Pad::Zero),
        ('S', 1..=8) => return Ok(Segment::Derived(Derived::Fraction, width)),
        ('n', 1) => Item::Numeric(Numeric::Nanosecond, Pad::None),
        (c, _) if ZONE_LETTERS.contains(&c) => {
            return Err(PartitionError::invalid_pattern(
                pattern,
                format!("zone field '{}' cannot be rendered from a zone-less event time", c),
            ));
        }
        (c, w) if KNOWN_LETTERS.contains(&c) => {
            return Err(PartitionError::invalid_pattern(
                pattern,
                format!("unsupported width {} for field '{}'", w, c),
            ));
        }
        (c, _) => {
            return Err(PartitionError::invalid_pattern(
                pattern,
                format!("unknown pattern letter '{}'", c),
            ));
        }
    };
    Ok(Segment::Item(item))
}
