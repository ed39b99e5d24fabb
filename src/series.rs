//! Ordered price series and table assembly

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io;

use crate::types::{Bar, PriceBar, VolumePoint};

/// Rows of one symbol/interval/venue, in table order
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries<B> {
    bars: Vec<B>,
}

impl<B> Default for PriceSeries<B> {
    fn default() -> Self {
        PriceSeries { bars: Vec::new() }
    }
}

impl<B: Bar> PriceSeries<B> {
    /// Keep rows in the order given
    pub fn new(bars: Vec<B>) -> Self {
        PriceSeries { bars }
    }

    /// Rows sorted ascending by timestamp
    pub fn sorted(bars: Vec<B>) -> Self {
        let mut series = Self::new(bars);
        series.sort_by_timestamp();
        series
    }

    /// Stable sort, rows sharing a timestamp keep their relative order
    pub fn sort_by_timestamp(&mut self) {
        self.bars.sort_by_key(|b| b.timestamp());
    }

    pub fn is_sorted(&self) -> bool {
        self.bars
            .windows(2)
            .all(|w| w[0].timestamp() <= w[1].timestamp())
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[B] {
        &self.bars
    }

    pub fn iter(&self) -> std::slice::Iter<'_, B> {
        self.bars.iter()
    }

    pub fn first(&self) -> Option<&B> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&B> {
        self.bars.last()
    }

    pub fn into_bars(self) -> Vec<B> {
        self.bars
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.bars.iter().map(|b| b.timestamp()).collect()
    }

    /// Uniform OHLC(V) view of the series
    pub fn to_price_bars(&self) -> PriceSeries<PriceBar> {
        PriceSeries::new(self.bars.iter().map(|b| b.to_price_bar()).collect())
    }

    /// Write the table as CSV with a header row
    pub fn write_csv<W: io::Write>(&self, writer: W) -> csv::Result<()>
    where
        B: Serialize,
    {
        let mut writer = csv::Writer::from_writer(writer);
        for bar in &self.bars {
            writer.serialize(bar)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl PriceSeries<PriceBar> {
    /// Attach volumes with backward asof semantics.
    ///
    /// Each row takes the volume of the latest point at or before its
    /// timestamp; rows older than every point get `None`. Rows are sorted
    /// first and are never dropped, duplicated or reordered by the join.
    pub fn join_volume_asof(&mut self, volumes: &[VolumePoint]) {
        self.sort_by_timestamp();

        let mut volumes = volumes.to_vec();
        volumes.sort_by_key(|v| v.timestamp);

        let mut next = 0;
        for bar in &mut self.bars {
            while next < volumes.len() && volumes[next].timestamp <= bar.timestamp {
                next += 1;
            }
            bar.volume = next.checked_sub(1).map(|i| volumes[i].volume);
        }
    }
}

impl<B> IntoIterator for PriceSeries<B> {
    type Item = B;
    type IntoIter = std::vec::IntoIter<B>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.into_iter()
    }
}

impl<'a, B> IntoIterator for &'a PriceSeries<B> {
    type Item = &'a B;
    type IntoIter = std::slice::Iter<'a, B>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.iter()
    }
}
