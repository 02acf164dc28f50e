//! Presentation order for the two ticker lanes.

use crate::aggregator::Aggregator;
use crate::models::{CastItem, Lane};
use chrono::Local;

/// Most recent latest-news casts shown per pass.
pub const LATEST_LIMIT: usize = 50;

/// One entry of a ticker pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerSlot {
    pub lane: Lane,
    /// 1-based position within its lane.
    pub position: usize,
    pub total: usize,
    pub cast: CastItem,
}

/// One pass over the latest lane, with the breaking lane interleaved.
///
/// The latest lane is capped to [`LATEST_LIMIT`] when the pass starts. The
/// breaking lane is read fresh before the 1st, 3rd, 5th... latest slot, so a
/// wave merged mid-pass shows at the next odd position.
#[derive(Debug, Clone)]
pub struct TickerPass {
    latest: Vec<CastItem>,
    next: usize,
}

impl TickerPass {
    pub fn new(latest: &[CastItem]) -> Self {
        Self {
            latest: latest[..latest.len().min(LATEST_LIMIT)].to_vec(),
            next: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }

    /// Whether the breaking lane plays before the next latest slot.
    pub fn breaking_due(&self) -> bool {
        self.next < self.latest.len() && self.next % 2 == 0
    }

    /// The next batch: `breaking` when due, then one latest slot.
    pub fn advance(&mut self, breaking: &[CastItem]) -> Option<Vec<TickerSlot>> {
        let cast = self.latest.get(self.next)?.clone();
        let mut slots = Vec::new();
        if self.breaking_due() {
            slots.extend(lane_slots(breaking, Lane::Breaking));
        }
        slots.push(TickerSlot {
            lane: Lane::Latest,
            position: self.next + 1,
            total: self.latest.len(),
            cast,
        });
        self.next += 1;
        Some(slots)
    }

    /// [`advance`](Self::advance), reading the breaking lane from `aggregator` when due.
    pub async fn next_from(&mut self, aggregator: &Aggregator, on_demand: bool) -> Option<Vec<TickerSlot>> {
        let breaking = if self.breaking_due() {
            aggregator.cast_breaking(on_demand, Local::now()).await
        } else {
            Vec::new()
        };
        self.advance(&breaking)
    }
}

fn lane_slots(casts: &[CastItem], lane: Lane) -> impl Iterator<Item = TickerSlot> + '_ {
    casts.iter().enumerate().map(move |(idx, cast)| TickerSlot {
        lane,
        position: idx + 1,
        total: casts.len(),
        cast: cast.clone(),
    })
}

/// Plain-text banner for one slot.
pub fn banner(slot: &TickerSlot) -> String {
    let mut out = String::new();
    if slot.lane == Lane::Breaking {
        out.push_str("* BREAKING NEWS *\n");
    }
    out.push_str(&slot.cast.report);
    out.push_str(&format!(" ({} of {})", slot.position, slot.total));
    if !slot.cast.source_url.is_empty() {
        out.push_str(&format!("\nmore on {}", slot.cast.source_url));
    }
    out
}
