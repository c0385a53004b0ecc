//! Local JSON store for workout records, the weekly menu, and recent sets.
//!
//! The record and menu views consume plain data: an array of records, an
//! object mapping weekday names to planned sets, and a capped
//! most-recent-first list of recently logged sets. Each key is one pretty
//! printed JSON file under the app's data directory.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::app;
use crate::error::StoreError;

const RECORDS_FILE: &str = "records.json";
const WEEKLY_FILE: &str = "weekly_menu.json";
const RECENT_FILE: &str = "recent_sets.json";

/// How many recent sets are retained.
pub const RECENT_CAP: usize = 20;
/// Page size handed to the recent-sets view by default.
pub const RECENT_DEFAULT_LIMIT: usize = 12;

/// One logged set, strength or cardio.
///
/// Field contents mirror the record forms: free-form strings, absent when
/// the form left them blank. Strength entries carry weight and reps, cardio
/// entries distance and time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutSet {
    #[serde(rename = "type")]
    pub kind: String,
    pub exercise: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reps: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sets: Option<String>,
}

impl WorkoutSet {
    /// Content signature for recent-set dedup.
    fn signature(&self) -> String {
        let blank = String::new();
        [
            &self.kind,
            &self.exercise,
            self.weight.as_ref().unwrap_or(&blank),
            self.reps.as_ref().unwrap_or(&blank),
            self.distance.as_ref().unwrap_or(&blank),
            self.time.as_ref().unwrap_or(&blank),
            self.sets.as_ref().unwrap_or(&blank),
        ]
        .map(String::as_str)
        .join("|")
    }
}

/// A stored record: one set plus identity and date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkoutRecord {
    pub id: String,
    #[serde(flatten)]
    pub set: WorkoutSet,
    pub date: String,
}

/// Weekday name to the sets planned for that day.
pub type WeeklyMenu = BTreeMap<String, Vec<WorkoutSet>>;

/// A recent set with its hidden recency stamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RecentSet {
    #[serde(flatten)]
    set: WorkoutSet,
    #[serde(rename = "_at")]
    at: i64,
}

/// Handle to the on-disk store.
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    /// Opens the store in the app's data directory.
    pub fn open_default() -> Result<Self, StoreError> {
        Ok(Self {
            dir: app::data_dir()?,
        })
    }

    /// Opens the store rooted at an explicit directory.
    pub fn open_at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    fn read_json<T>(&self, file: &str) -> Result<T, StoreError>
    where
        T: DeserializeOwned + Default,
    {
        let path = self.path(file);
        if !path.try_exists()? {
            return Ok(T::default());
        }
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_json<T: Serialize>(&self, file: &str, value: &T) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let raw = serde_json::to_string_pretty(value)?;
        fs::write(self.path(file), raw)?;
        Ok(())
    }

    /// All records, optionally filtered by a case-insensitive exercise
    /// search.
    pub fn records(&self, search: Option<&str>) -> Result<Vec<WorkoutRecord>, StoreError> {
        let all: Vec<WorkoutRecord> = self.read_json(RECORDS_FILE)?;
        match search.map(str::trim).filter(|query| !query.is_empty()) {
            Some(query) => {
                let query = query.to_lowercase();
                Ok(all
                    .into_iter()
                    .filter(|record| record.set.exercise.to_lowercase().contains(&query))
                    .collect())
            }
            None => Ok(all),
        }
    }

    /// Appends a record, assigning an id when the caller left it empty.
    /// Returns the record as stored.
    pub fn save_record(&self, mut record: WorkoutRecord) -> Result<WorkoutRecord, StoreError> {
        if record.id.is_empty() {
            record.id = new_record_id();
        }
        let mut all = self.records(None)?;
        all.push(record.clone());
        self.write_json(RECORDS_FILE, &all)?;
        Ok(record)
    }

    /// Replaces the content of the record with the given id, keeping the id.
    /// Unknown ids are ignored.
    pub fn update_record_by_id(
        &self,
        id: &str,
        set: WorkoutSet,
        date: String,
    ) -> Result<(), StoreError> {
        let mut all = self.records(None)?;
        let Some(record) = all.iter_mut().find(|record| record.id == id) else {
            return Ok(());
        };
        record.set = set;
        record.date = date;
        self.write_json(RECORDS_FILE, &all)
    }

    pub fn delete_record_by_id(&self, id: &str) -> Result<(), StoreError> {
        let mut all = self.records(None)?;
        all.retain(|record| record.id != id);
        self.write_json(RECORDS_FILE, &all)
    }

    pub fn weekly_menu(&self) -> Result<WeeklyMenu, StoreError> {
        self.read_json(WEEKLY_FILE)
    }

    pub fn save_weekly_menu(&self, menu: &WeeklyMenu) -> Result<(), StoreError> {
        self.write_json(WEEKLY_FILE, menu)
    }

    /// Front-inserts a set into the recent list, dropping any entry with the
    /// same content and anything past the cap. The recent list is
    /// convenience history, so failures are logged and swallowed.
    pub fn add_recent_set(&self, set: WorkoutSet) {
        if let Err(err) = self.try_add_recent_set(set) {
            warn!("failed to remember recent set: {err}");
        }
    }

    fn try_add_recent_set(&self, set: WorkoutSet) -> Result<(), StoreError> {
        let mut list: Vec<RecentSet> = self.read_json(RECENT_FILE)?;
        let entry = RecentSet {
            set,
            at: Utc::now().timestamp_millis(),
        };
        let signature = entry.set.signature();
        list.retain(|recent| recent.set.signature() != signature);
        list.insert(0, entry);
        list.truncate(RECENT_CAP);
        self.write_json(RECENT_FILE, &list)
    }

    /// The most recent sets, newest first, at most `limit`, recency stamps
    /// stripped.
    pub fn recent_sets(&self, limit: usize) -> Vec<WorkoutSet> {
        match self.read_json::<Vec<RecentSet>>(RECENT_FILE) {
            Ok(mut list) => {
                list.sort_by_key(|recent| Reverse(recent.at));
                list.into_iter().take(limit).map(|recent| recent.set).collect()
            }
            Err(err) => {
                warn!("failed to load recent sets: {err}");
                Vec::new()
            }
        }
    }

    /// Removes every recent entry matching the set's content.
    pub fn remove_recent_set(&self, set: &WorkoutSet) {
        let result = self
            .read_json::<Vec<RecentSet>>(RECENT_FILE)
            .and_then(|mut list| {
                let signature = set.signature();
                list.retain(|recent| recent.set.signature() != signature);
                self.write_json(RECENT_FILE, &list)
            });
        if let Err(err) = result {
            warn!("failed to forget recent set: {err}");
        }
    }
}

fn new_record_id() -> String {
    format!("rec_{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::path::Path;
    use std::{process, thread};

    struct StoreGuard {
        store: Store,
    }

    impl StoreGuard {
        fn new() -> Self {
            let thread_id = format!("{:?}", thread::current().id());
            let dir = env::temp_dir()
                .join(format!("{}_test_store", app::name()))
                .join(format!(
                    "{}-{}",
                    process::id(),
                    thread_id.replace([':', '(', ')'], "-")
                ));
            fs::create_dir_all(&dir).expect("setup: failed to create store dir");
            Self {
                store: Store::open_at(dir),
            }
        }
    }

    impl Drop for StoreGuard {
        fn drop(&mut self) {
            cleanup_test_dir(&self.store.dir);
        }
    }

    // helper
    fn cleanup_test_dir(dir: &Path) {
        if let Some(parent) = dir.parent() {
            let _ = fs::remove_dir_all(parent);
        }
    }

    fn bench_press() -> WorkoutSet {
        WorkoutSet {
            kind: "strength".to_string(),
            exercise: "Bench Press".to_string(),
            weight: Some("60".to_string()),
            reps: Some("10".to_string()),
            sets: Some("3".to_string()),
            ..WorkoutSet::default()
        }
    }

    fn easy_run() -> WorkoutSet {
        WorkoutSet {
            kind: "cardio".to_string(),
            exercise: "Easy Run".to_string(),
            distance: Some("5".to_string()),
            time: Some("28".to_string()),
            ..WorkoutSet::default()
        }
    }

    fn record(set: WorkoutSet) -> WorkoutRecord {
        WorkoutRecord {
            id: String::new(),
            set,
            date: "2024-03-27".to_string(),
        }
    }

    #[test]
    fn save_assigns_an_id_and_round_trips() {
        let guard = StoreGuard::new();

        let stored = guard.store.save_record(record(bench_press())).unwrap();
        assert!(stored.id.starts_with("rec_"));

        let all = guard.store.records(None).unwrap();
        assert_eq!(all, vec![stored]);
    }

    #[test]
    fn search_filters_by_exercise_case_insensitively() {
        let guard = StoreGuard::new();
        guard.store.save_record(record(bench_press())).unwrap();
        guard.store.save_record(record(easy_run())).unwrap();

        let hits = guard.store.records(Some("bench")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].set.exercise, "Bench Press");

        // Blank search means everything.
        assert_eq!(guard.store.records(Some("  ")).unwrap().len(), 2);
    }

    #[test]
    fn update_keeps_the_id_and_ignores_unknown_ids() {
        let guard = StoreGuard::new();
        let stored = guard.store.save_record(record(bench_press())).unwrap();

        let mut heavier = bench_press();
        heavier.weight = Some("65".to_string());
        guard
            .store
            .update_record_by_id(&stored.id, heavier.clone(), "2024-03-28".to_string())
            .unwrap();

        let all = guard.store.records(None).unwrap();
        assert_eq!(all[0].id, stored.id);
        assert_eq!(all[0].set, heavier);
        assert_eq!(all[0].date, "2024-03-28");

        guard
            .store
            .update_record_by_id("rec_missing", easy_run(), "2024-03-29".to_string())
            .unwrap();
        assert_eq!(guard.store.records(None).unwrap().len(), 1);
    }

    #[test]
    fn delete_removes_only_the_matching_record() {
        let guard = StoreGuard::new();
        let first = guard.store.save_record(record(bench_press())).unwrap();
        guard.store.save_record(record(easy_run())).unwrap();

        guard.store.delete_record_by_id(&first.id).unwrap();

        let all = guard.store.records(None).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].set.exercise, "Easy Run");
    }

    #[test]
    fn weekly_menu_round_trips() {
        let guard = StoreGuard::new();
        assert!(guard.store.weekly_menu().unwrap().is_empty());

        let mut menu = WeeklyMenu::new();
        menu.insert("Monday".to_string(), vec![bench_press()]);
        menu.insert("Thursday".to_string(), vec![easy_run()]);
        guard.store.save_weekly_menu(&menu).unwrap();

        assert_eq!(guard.store.weekly_menu().unwrap(), menu);
    }

    #[test]
    fn recent_sets_dedupe_by_content_and_stay_newest_first() {
        let guard = StoreGuard::new();

        guard.store.add_recent_set(bench_press());
        guard.store.add_recent_set(easy_run());
        guard.store.add_recent_set(bench_press());

        let recents = guard.store.recent_sets(RECENT_DEFAULT_LIMIT);
        assert_eq!(recents.len(), 2);
        assert_eq!(recents[0], bench_press());
        assert_eq!(recents[1], easy_run());
    }

    #[test]
    fn recent_sets_cap_and_limit() {
        let guard = StoreGuard::new();

        for n in 0..(RECENT_CAP + 5) {
            let mut set = bench_press();
            set.exercise = format!("Exercise {n}");
            guard.store.add_recent_set(set);
        }

        assert_eq!(guard.store.recent_sets(usize::MAX).len(), RECENT_CAP);

        let page = guard.store.recent_sets(3);
        assert_eq!(page.len(), 3);
        assert_eq!(page[0].exercise, format!("Exercise {}", RECENT_CAP + 4));
    }

    #[test]
    fn remove_recent_set_matches_by_content() {
        let guard = StoreGuard::new();
        guard.store.add_recent_set(bench_press());
        guard.store.add_recent_set(easy_run());

        guard.store.remove_recent_set(&bench_press());

        let recents = guard.store.recent_sets(RECENT_DEFAULT_LIMIT);
        assert_eq!(recents, vec![easy_run()]);
    }

    #[test]
    fn record_json_matches_the_shared_contract() {
        let stored = WorkoutRecord {
            id: "rec_test".to_string(),
            set: bench_press(),
            date: "2024-03-27".to_string(),
        };

        let json = serde_json::to_value(&stored).unwrap();
        assert_eq!(json["id"], "rec_test");
        assert_eq!(json["type"], "strength");
        assert_eq!(json["exercise"], "Bench Press");
        assert_eq!(json["weight"], "60");
        assert_eq!(json["date"], "2024-03-27");
        // Cardio-only fields stay absent instead of null.
        assert!(json.get("distance").is_none());
    }
}
