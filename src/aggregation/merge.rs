//! Joining per-site query results into one record per site.
//!
//! Two strategies are offered on [`Roster`]: [`Roster::upsert`] creates a
//! record the first time a name is seen, [`Roster::get_mut`] only touches
//! records that already exist.

use crate::aggregation::models::SiteRecord;
use crate::prometheus::EntitySample;
use std::collections::HashMap;

/// Records keyed by site name, kept in first-seen order.
#[derive(Debug, Clone)]
pub struct Roster<R> {
    index: HashMap<String, usize>,
    records: Vec<R>,
}

impl<R> Default for Roster<R> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            records: Vec::new(),
        }
    }
}

impl<R> Roster<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create-or-update: return the record for `name`, inserting `make()` at
    /// the end if the name is new.
    pub fn upsert(&mut self, name: &str, make: impl FnOnce() -> R) -> &mut R {
        let idx = match self.index.get(name) {
            Some(&idx) => idx,
            None => {
                let idx = self.records.len();
                self.records.push(make());
                self.index.insert(name.to_string(), idx);
                idx
            }
        };
        &mut self.records[idx]
    }

    /// Update-only: the record for `name` if it was already created.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut R> {
        let idx = *self.index.get(name)?;
        self.records.get_mut(idx)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.records.iter()
    }

    /// Materialize the records in insertion order.
    pub fn into_vec(self) -> Vec<R> {
        self.records
    }
}

/// The per-site figure a query populates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteField {
    Snapshot,
    Today,
    Week,
    Year,
    Max,
}

impl SiteField {
    pub fn get(self, record: &SiteRecord) -> f64 {
        match self {
            SiteField::Snapshot => record.snapshot,
            SiteField::Today => record.today,
            SiteField::Week => record.week,
            SiteField::Year => record.year,
            SiteField::Max => record.max,
        }
    }

    pub fn slot(self, record: &mut SiteRecord) -> &mut f64 {
        match self {
            SiteField::Snapshot => &mut record.snapshot,
            SiteField::Today => &mut record.today,
            SiteField::Week => &mut record.week,
            SiteField::Year => &mut record.year,
            SiteField::Max => &mut record.max,
        }
    }
}

/// Fold one query's `(name, value)` pairs into `roster`, creating sites on
/// first sight. Returns the change in the sum of `field` across the roster,
/// which callers add to the matching fleet total.
pub fn merge_field(
    roster: &mut Roster<SiteRecord>,
    samples: &[EntitySample],
    field: SiteField,
) -> f64 {
    let mut contribution = 0.0;
    for sample in samples {
        let record = roster.upsert(&sample.name, || SiteRecord::named(&sample.name));
        let slot = field.slot(record);
        contribution += sample.value - *slot;
        *slot = sample.value;
    }
    contribution
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn samples(pairs: &[(&str, f64)]) -> Vec<EntitySample> {
        pairs
            .iter()
            .map(|(name, value)| EntitySample::new(*name, *value))
            .collect()
    }

    fn names(roster: &Roster<SiteRecord>) -> Vec<String> {
        roster.iter().map(|r| r.name.clone()).collect()
    }

    #[test]
    fn test_first_query_initializes_empty_roster() {
        let mut roster = Roster::new();
        let total = merge_field(
            &mut roster,
            &samples(&[("A", 1.0), ("B", 2.0)]),
            SiteField::Year,
        );

        assert_eq!(total, 3.0);
        assert_eq!(names(&roster), vec!["A", "B"]);
        assert_eq!(roster.iter().map(|r| r.year).collect::<Vec<_>>(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_later_queries_update_and_extend() {
        let mut roster = Roster::new();
        merge_field(&mut roster, &samples(&[("A", 1.0), ("B", 2.0)]), SiteField::Year);
        // B matches the second record, not only the first; C is new.
        let week = merge_field(
            &mut roster,
            &samples(&[("B", 5.0), ("C", 7.0)]),
            SiteField::Week,
        );

        assert_eq!(week, 12.0);
        assert_eq!(names(&roster), vec!["A", "B", "C"]);

        let records = roster.into_vec();
        assert_eq!(records[0].week, 0.0);
        assert_eq!(records[1].year, 2.0);
        assert_eq!(records[1].week, 5.0);
        assert_eq!(records[2].year, 0.0);
        assert_eq!(records[2].week, 7.0);
    }

    #[test]
    fn test_record_count_equals_distinct_names() {
        let queries = [
            samples(&[("A", 1.0), ("B", 1.0)]),
            samples(&[("C", 1.0), ("A", 1.0)]),
            samples(&[]),
            samples(&[("D", 1.0), ("B", 1.0), ("C", 1.0)]),
        ];
        let fields = [SiteField::Year, SiteField::Week, SiteField::Today, SiteField::Max];

        let mut roster = Roster::new();
        for (query, field) in queries.iter().zip(fields) {
            merge_field(&mut roster, query, field);
        }

        assert_eq!(roster.len(), 4);
        assert_eq!(names(&roster), vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_repeated_name_in_one_query_keeps_total_consistent() {
        let mut roster = Roster::new();
        let total = merge_field(
            &mut roster,
            &samples(&[("A", 4.0), ("A", 6.0)]),
            SiteField::Snapshot,
        );

        assert_eq!(roster.len(), 1);
        assert_eq!(roster.iter().next().unwrap().snapshot, 6.0);
        assert_eq!(total, 6.0);
    }

    #[test]
    fn test_update_only_strategy_never_creates() {
        let mut roster: Roster<SiteRecord> = Roster::new();
        roster.upsert("A", || SiteRecord::named("A"));

        assert!(roster.get_mut("A").is_some());
        assert!(roster.get_mut("Z").is_none());
        assert!(!roster.contains("Z"));
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_names_are_exact_match() {
        let mut roster = Roster::new();
        merge_field(
            &mut roster,
            &samples(&[("Barn", 1.0), ("barn", 2.0), ("Barn ", 3.0)]),
            SiteField::Max,
        );
        assert_eq!(roster.len(), 3);
    }
}
