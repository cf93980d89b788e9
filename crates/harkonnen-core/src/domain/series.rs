use serde::{Deserialize, Serialize};

use crate::{Interval, Symbol, UtcDateTime, ValidationError};

/// Close price observed at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceSample {
    pub timestamp: UtcDateTime,
    pub close_price: f64,
}

impl PriceSample {
    pub fn new(timestamp: UtcDateTime, close_price: f64) -> Result<Self, ValidationError> {
        if !close_price.is_finite() {
            return Err(ValidationError::NonFiniteValue {
                field: "close_price",
            });
        }
        Ok(Self {
            timestamp,
            close_price,
        })
    }
}

/// Time-ordered close prices for one ticker over one fetch window.
///
/// Samples are sorted on construction; providers occasionally deliver
/// out-of-order rows around session boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPriceSeries")]
pub struct PriceSeries {
    symbol: Symbol,
    interval: Interval,
    samples: Vec<PriceSample>,
}

impl PriceSeries {
    pub fn new(symbol: Symbol, interval: Interval, mut samples: Vec<PriceSample>) -> Self {
        samples.sort_by_key(|sample| sample.timestamp);
        Self {
            symbol,
            interval,
            samples,
        }
    }

    pub fn empty(symbol: Symbol, interval: Interval) -> Self {
        Self::new(symbol, interval, Vec::new())
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub const fn interval(&self) -> Interval {
        self.interval
    }

    /// Samples in ascending timestamp order.
    pub fn samples(&self) -> &[PriceSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&PriceSample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&PriceSample> {
        self.samples.last()
    }

    /// Samples with `start <= timestamp < end`.
    pub fn window(&self, start: UtcDateTime, end: UtcDateTime) -> &[PriceSample] {
        let lower = self.samples.partition_point(|sample| sample.timestamp < start);
        let upper = self.samples.partition_point(|sample| sample.timestamp < end);
        &self.samples[lower..upper.max(lower)]
    }
}

#[derive(Debug, Deserialize)]
struct RawPriceSeries {
    symbol: Symbol,
    interval: Interval,
    #[serde(default)]
    samples: Vec<PriceSample>,
}

impl TryFrom<RawPriceSeries> for PriceSeries {
    type Error = ValidationError;

    fn try_from(raw: RawPriceSeries) -> Result<Self, Self::Error> {
        let samples = raw
            .samples
            .into_iter()
            .map(|sample| PriceSample::new(sample.timestamp, sample.close_price))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(raw.symbol, raw.interval, samples))
    }
}
