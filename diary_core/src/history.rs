//! Cross-day queries over the exercise log.

use crate::store::{ExerciseLog, LogBackend};
use crate::types::SavedRecord;
use crate::Result;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashSet};

/// Days with at least one logged record, oldest first
pub async fn logged_days<B: LogBackend>(log: &ExerciseLog<B>) -> Result<Vec<NaiveDate>> {
    let days: BTreeSet<NaiveDate> = log.list_all().await?.iter().map(|r| r.day()).collect();
    Ok(days.into_iter().collect())
}

/// Every exercise name that appears anywhere in the log
pub async fn previous_exercise_names<B: LogBackend>(log: &ExerciseLog<B>) -> Result<HashSet<String>> {
    let names: HashSet<String> = log
        .list_all()
        .await?
        .into_iter()
        .map(|r| r.record.name)
        .collect();
    tracing::debug!("Found {} distinct exercises in history", names.len());
    Ok(names)
}

/// Records between `from` and `to` inclusive, one per exercise per day,
/// sorted by day
pub async fn records_between<B: LogBackend>(
    log: &ExerciseLog<B>,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<SavedRecord>> {
    let mut seen = HashSet::new();
    let mut records: Vec<SavedRecord> = log
        .list_all()
        .await?
        .into_iter()
        .filter(|r| (from..=to).contains(&r.day()))
        .filter(|r| seen.insert((r.day(), r.record.name.clone())))
        .collect();
    // Stable sort keeps save order within a day
    records.sort_by_key(|r| r.day());
    Ok(records)
}

/// Most recent record of `name`, e.g. to pre-fill the detail editor
pub async fn last_record_of<B: LogBackend>(
    log: &ExerciseLog<B>,
    name: &str,
) -> Result<Option<SavedRecord>> {
    Ok(log
        .list_all()
        .await?
        .into_iter()
        .filter(|r| r.record.name == name)
        .max_by_key(|r| r.record.date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryBackend;
    use crate::types::{ExerciseRecord, SetRecord};
    use chrono::DateTime;

    fn record(name: &str, date: &str, reps: u32) -> ExerciseRecord {
        ExerciseRecord {
            name: name.into(),
            force: None,
            primary_muscles: vec![],
            secondary_muscles: vec![],
            rest_time_seconds: 60,
            sets: vec![SetRecord::new(reps, 100.0)],
            date: DateTime::parse_from_rfc3339(date).unwrap(),
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    async fn seeded_log() -> ExerciseLog<MemoryBackend> {
        let log = ExerciseLog::open(MemoryBackend::new()).await.unwrap();
        log.save(record("Squat", "2024-01-03T10:00:00Z", 5)).await.unwrap();
        log.save(record("Squat", "2024-01-01T10:00:00Z", 3)).await.unwrap();
        log.save(record("Squat", "2024-01-01T11:00:00Z", 8)).await.unwrap();
        log.save(record("Bench Press", "2024-01-02T10:00:00Z", 10)).await.unwrap();
        log
    }

    #[tokio::test]
    async fn test_logged_days_sorted_and_unique() {
        let log = seeded_log().await;
        assert_eq!(
            logged_days(&log).await.unwrap(),
            vec![day("2024-01-01"), day("2024-01-02"), day("2024-01-03")]
        );
    }

    #[tokio::test]
    async fn test_previous_exercise_names() {
        let log = seeded_log().await;
        let names = previous_exercise_names(&log).await.unwrap();
        assert_eq!(names.len(), 2);
        assert!(names.contains("Squat"));
        assert!(names.contains("Bench Press"));
    }

    #[tokio::test]
    async fn test_records_between_dedups_per_day() {
        let log = seeded_log().await;
        let records = records_between(&log, day("2024-01-01"), day("2024-01-02"))
            .await
            .unwrap();
        let summary: Vec<_> = records
            .iter()
            .map(|r| (r.day(), r.record.sets[0].reps))
            .collect();
        assert_eq!(
            summary,
            vec![(day("2024-01-01"), 3), (day("2024-01-02"), 10)]
        );
    }

    #[tokio::test]
    async fn test_last_record_of() {
        let log = seeded_log().await;
        let last = last_record_of(&log, "Squat").await.unwrap().unwrap();
        assert_eq!(last.record.sets[0].reps, 5);
        assert!(last_record_of(&log, "Deadlift").await.unwrap().is_none());
    }
}
