//! Diary view state.
//!
//! [`Diary`] is what the diary screen binds to: the selected day, the
//! records shown for it and the records the user has selected for
//! deletion. Every mutation goes to the log first; the in-memory view only
//! changes once the log has confirmed the write, so the screen never shows
//! a record that was not saved or hides one that was not deleted.

use crate::store::{ExerciseLog, LogBackend};
use crate::types::{ExerciseRecord, RecordKey, SavedRecord};
use crate::{Error, Result};
use chrono::NaiveDate;
use std::collections::HashSet;

pub struct Diary<'a, B> {
    log: &'a ExerciseLog<B>,
    date: NaiveDate,
    /// Everything stored for `date`, duplicates included, in save order
    records: Vec<SavedRecord>,
    selected: HashSet<RecordKey>,
}

impl<'a, B: LogBackend> Diary<'a, B> {
    /// Open the diary on `date` and load its records
    pub async fn open(log: &'a ExerciseLog<B>, date: NaiveDate) -> Result<Diary<'a, B>> {
        let mut diary = Self {
            log,
            date,
            records: Vec::new(),
            selected: HashSet::new(),
        };
        diary.refresh().await?;
        Ok(diary)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Records to display, one per exercise name
    pub fn entries(&self) -> Vec<&SavedRecord> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter(|r| seen.insert(r.record.name.as_str()))
            .collect()
    }

    pub fn is_today(&self, today: NaiveDate) -> bool {
        self.date == today
    }

    /// Reload the selected day from the log
    ///
    /// On failure the previous contents stay on screen.
    pub async fn refresh(&mut self) -> Result<()> {
        let records = self.load_raw(self.date).await?;
        self.records = records;
        self.selected.clear();
        Ok(())
    }

    async fn load_raw(&self, date: NaiveDate) -> Result<Vec<SavedRecord>> {
        // Keep duplicates around so deleting the visible record reveals
        // the next one, the same as a fresh list would.
        self.log.list_day_with_duplicates(date).await
    }

    /// Switch to another day
    ///
    /// The selected day only changes if the new day could be loaded.
    pub async fn go_to(&mut self, date: NaiveDate) -> Result<()> {
        let records = self.load_raw(date).await?;
        self.date = date;
        self.records = records;
        self.selected.clear();
        tracing::debug!("Diary moved to {}", date);
        Ok(())
    }

    /// Move one day forward; stays put at the end of the calendar
    pub async fn next_day(&mut self) -> Result<()> {
        match self.date.succ_opt() {
            Some(date) => self.go_to(date).await,
            None => Ok(()),
        }
    }

    /// Move one day back; stays put at the start of the calendar
    pub async fn previous_day(&mut self) -> Result<()> {
        match self.date.pred_opt() {
            Some(date) => self.go_to(date).await,
            None => Ok(()),
        }
    }

    /// Save `record` and show it if it belongs to the selected day
    pub async fn add(&mut self, record: ExerciseRecord) -> Result<SavedRecord> {
        let saved = self.log.save(record).await?;
        if saved.day() == self.date {
            self.records.push(saved.clone());
        }
        Ok(saved)
    }

    /// Select or unselect a record; returns whether it is now selected
    pub fn toggle_selection(&mut self, key: RecordKey) -> bool {
        if !self.records.iter().any(|r| r.key == key) {
            return false;
        }
        if self.selected.remove(&key) {
            false
        } else {
            self.selected.insert(key);
            true
        }
    }

    pub fn is_selected(&self, key: RecordKey) -> bool {
        self.selected.contains(&key)
    }

    pub fn selection(&self) -> &HashSet<RecordKey> {
        &self.selected
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Delete every selected record
    ///
    /// On a partial failure the removed and already absent records leave
    /// the view and the ones that failed stay selected, then the error is
    /// returned.
    pub async fn delete_selected(&mut self) -> Result<usize> {
        if self.selected.is_empty() {
            return Ok(0);
        }
        let keys: Vec<RecordKey> = self.selected.iter().copied().collect();

        match self.log.delete(keys).await {
            Ok(outcome) => {
                let gone: HashSet<RecordKey> = outcome
                    .removed
                    .iter()
                    .chain(outcome.absent.iter())
                    .copied()
                    .collect();
                self.records.retain(|r| !gone.contains(&r.key));
                self.selected.clear();
                Ok(outcome.removed.len())
            }
            Err(Error::PartialDelete {
                removed,
                absent,
                failed,
                reason,
            }) => {
                let gone: HashSet<RecordKey> =
                    removed.iter().chain(absent.iter()).copied().collect();
                self.records.retain(|r| !gone.contains(&r.key));
                self.selected.retain(|k| failed.contains(k));
                Err(Error::PartialDelete {
                    removed,
                    absent,
                    failed,
                    reason,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Same-day duplicates hidden from [`entries`](Self::entries)
    pub fn hidden_duplicates(&self) -> usize {
        self.records.len() - self.entries().len()
    }
}
