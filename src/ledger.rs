//! The in-memory record table owned by a session.

use uuid::Uuid;

use crate::calc::round2;
use crate::error::{Error, Result};
use crate::models::{HarvestRecord, LossSummary};

/// Insertion-ordered harvest records.
///
/// Ids are not checked for uniqueness on append: they are v4 UUIDs generated at
/// registration, and documents loaded from disk are trusted as written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    records: Vec<HarvestRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<HarvestRecord>) -> Self {
        Self { records }
    }

    pub fn append(&mut self, record: HarvestRecord) {
        self.records.push(record);
    }

    /// Remove the record at a 1-based position.
    pub fn remove_at(&mut self, position: usize) -> Result<HarvestRecord> {
        if position == 0 || position > self.records.len() {
            return Err(Error::IndexOutOfRange {
                position,
                len: self.records.len(),
            });
        }
        Ok(self.records.remove(position - 1))
    }

    /// Swap in a whole new set of records, returning the old ones.
    pub fn replace_all(&mut self, records: Vec<HarvestRecord>) -> Vec<HarvestRecord> {
        std::mem::replace(&mut self.records, records)
    }

    pub fn summary(&self) -> LossSummary {
        let totals = self
            .records
            .iter()
            .fold(LossSummary::default(), |acc, r| LossSummary {
                total_tons: acc.total_tons + r.total_tons(),
                loss_tons: acc.loss_tons + r.loss_tons(),
                loss_cost: acc.loss_cost + r.loss_cost(),
            });

        LossSummary {
            total_tons: round2(totals.total_tons),
            loss_tons: round2(totals.loss_tons),
            loss_cost: round2(totals.loss_cost),
        }
    }

    pub fn find(&self, id: Uuid) -> Option<&HarvestRecord> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub fn records(&self) -> &[HarvestRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HarvestRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a HarvestRecord;
    type IntoIter = std::slice::Iter<'a, HarvestRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
