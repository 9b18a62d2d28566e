//! # Persistence
//!
//! Snapshots of the document and the user's preferences, stored under fixed
//! keys in a [`KeyValueStore`]:
//!
//! ```text
//! saved-content          last manual save
//! auto-save-backup       most recent snapshot (manual or automatic)
//! preferred-font-size    "small" | "medium" | "large"
//! preferred-theme        "dark" | "light"
//! last-error             diagnostic record of the last unexpected failure
//! ```
//!
//! A manual save writes both snapshot keys, so right after a save there is
//! nothing to recover. An auto-save only touches the backup. On startup the
//! backup is offered for recovery when it is newer than the manual save and
//! younger than the recovery window.
//!
//! Timestamps are passed in by the caller, which keeps every rule here
//! testable without a clock.

use crate::config::EditorConfig;
use crate::error::Result;
use crate::model::{parse_tags, Block, Document, FontSize, Theme};
use crate::store::KeyValueStore;
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const SAVED_CONTENT_KEY: &str = "saved-content";
pub const AUTO_SAVE_KEY: &str = "auto-save-backup";
pub const FONT_SIZE_KEY: &str = "preferred-font-size";
pub const THEME_KEY: &str = "preferred-theme";
pub const LAST_ERROR_KEY: &str = "last-error";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSnapshot {
    pub title: String,
    pub author: String,
    /// Comma-separated tag line, as typed.
    pub tags: String,
    pub body: Vec<Block>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_count: Option<usize>,
    #[serde(default)]
    pub is_auto_save: bool,
}

impl StoredSnapshot {
    pub fn capture(document: &Document, now: DateTime<Utc>) -> Self {
        Self {
            title: document.title.clone(),
            author: document.author.clone(),
            tags: document.tags_line(),
            body: document.blocks.clone(),
            timestamp: now,
            version: None,
            item_count: None,
            is_auto_save: false,
        }
    }

    pub fn to_document(&self) -> Document {
        Document {
            title: self.title.clone(),
            author: self.author.clone(),
            tags: parse_tags(&self.tags),
            blocks: self.body.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub message: String,
    pub context: String,
    pub timestamp: DateTime<Utc>,
}

pub struct PersistenceGateway<S> {
    store: S,
    placeholder_title: String,
    recovery_window: Duration,
    version: String,
}

impl<S: KeyValueStore> PersistenceGateway<S> {
    pub fn new(store: S, config: &EditorConfig) -> Self {
        Self {
            store,
            placeholder_title: config.placeholder_title.clone(),
            recovery_window: config.recovery_window(),
            version: config.export_version.clone(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn placeholder_title(&self) -> &str {
        &self.placeholder_title
    }

    fn write_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.store.set(key, &json)
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.store.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Reads a snapshot, treating an unreadable one as absent.
    fn read_snapshot_lenient(&self, key: &str) -> Option<StoredSnapshot> {
        match self.read_json::<StoredSnapshot>(key) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(key, error = %e, "ignoring unreadable snapshot");
                None
            }
        }
    }

    /// Manual save. Fails without touching storage when the document has no
    /// real title or no blocks.
    pub fn save(&self, document: &Document, now: DateTime<Utc>) -> Result<StoredSnapshot> {
        document.ensure_complete(&self.placeholder_title, "saving")?;

        let mut snapshot = StoredSnapshot::capture(document, now);
        snapshot.version = Some(self.version.clone());
        snapshot.item_count = Some(document.blocks.len());

        self.write_json(SAVED_CONTENT_KEY, &snapshot)?;
        self.write_json(AUTO_SAVE_KEY, &snapshot)?;
        debug!(items = document.blocks.len(), "saved content");
        Ok(snapshot)
    }

    /// Background snapshot. No validation: drafts are worth keeping too.
    pub fn auto_save(&self, document: &Document, now: DateTime<Utc>) -> Result<()> {
        let mut snapshot = StoredSnapshot::capture(document, now);
        snapshot.is_auto_save = true;
        self.write_json(AUTO_SAVE_KEY, &snapshot)?;
        debug!(items = document.blocks.len(), "auto-saved backup");
        Ok(())
    }

    pub fn load_saved(&self) -> Result<Option<StoredSnapshot>> {
        self.read_json(SAVED_CONTENT_KEY)
    }

    pub fn load_backup(&self) -> Result<Option<StoredSnapshot>> {
        self.read_json(AUTO_SAVE_KEY)
    }

    /// A backup holding changes the last manual save does not have.
    fn unsaved_backup(&self) -> Option<StoredSnapshot> {
        let backup = self.read_snapshot_lenient(AUTO_SAVE_KEY)?;
        match self.read_snapshot_lenient(SAVED_CONTENT_KEY) {
            Some(saved) if backup.timestamp <= saved.timestamp => None,
            _ => Some(backup),
        }
    }

    fn within_window(&self, snapshot: &StoredSnapshot, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(snapshot.timestamp) < self.recovery_window
    }

    /// The backup, if it is worth offering for recovery.
    pub fn load_backup_if_newer(&self, now: DateTime<Utc>) -> Option<StoredSnapshot> {
        let backup = self.unsaved_backup()?;
        if !self.within_window(&backup, now) {
            debug!(timestamp = %backup.timestamp, "backup is outside the recovery window");
            return None;
        }
        Some(backup)
    }

    /// An unsaved backup too old to be offered. Writing a new backup would
    /// destroy it.
    pub fn stale_backup(&self, now: DateTime<Utc>) -> Option<StoredSnapshot> {
        self.unsaved_backup()
            .filter(|backup| !self.within_window(backup, now))
    }

    pub fn discard_backup(&self) -> Result<()> {
        self.store.remove(AUTO_SAVE_KEY)
    }

    pub fn font_size(&self) -> FontSize {
        self.read_preference(FONT_SIZE_KEY)
    }

    pub fn set_font_size(&self, size: FontSize) -> Result<()> {
        self.write_json(FONT_SIZE_KEY, &size)
    }

    pub fn theme(&self) -> Theme {
        self.read_preference(THEME_KEY)
    }

    pub fn set_theme(&self, theme: Theme) -> Result<()> {
        self.write_json(THEME_KEY, &theme)
    }

    fn read_preference<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.read_json::<T>(key) {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                debug!(key, error = %e, "unreadable preference, using default");
                T::default()
            }
        }
    }

    pub fn record_error(&self, message: &str, context: &str, now: DateTime<Utc>) -> Result<()> {
        self.write_json(
            LAST_ERROR_KEY,
            &ErrorRecord {
                message: message.to_string(),
                context: context.to_string(),
                timestamp: now,
            },
        )
    }

    pub fn last_error(&self) -> Result<Option<ErrorRecord>> {
        self.read_json(LAST_ERROR_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EditorError;
    use crate::model::{BlockAttributes, TextAlign, TextStyle};
    use crate::store::memory::MemoryStore;
    use chrono::TimeZone;

    fn gateway() -> PersistenceGateway<MemoryStore> {
        PersistenceGateway::new(MemoryStore::new(), &EditorConfig::default())
    }

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, min, 0).unwrap()
    }

    fn document(title: &str, blocks: usize) -> Document {
        let mut doc = Document::new(title);
        doc.author = "Surdas".into();
        doc.set_tags_line("bhakti, braj");
        for i in 0..blocks {
            doc.blocks.push(
                Block::new(BlockAttributes::Text {
                    content: format!("para {}", i),
                    align: TextAlign::Left,
                    style: TextStyle::Standard,
                    lyrics: false,
                })
                .unwrap(),
            );
        }
        doc
    }

    #[test]
    fn test_save_writes_both_keys() {
        let gw = gateway();
        let snapshot = gw.save(&document("Sur Sagar", 2), at(10, 0)).unwrap();
        assert_eq!(snapshot.version.as_deref(), Some("1.0"));
        assert_eq!(snapshot.item_count, Some(2));
        assert!(!snapshot.is_auto_save);

        let saved = gw.load_saved().unwrap().unwrap();
        let backup = gw.load_backup().unwrap().unwrap();
        assert_eq!(saved, backup);
        assert_eq!(saved.tags, "bhakti, braj");

        let restored = saved.to_document();
        assert_eq!(restored.title, "Sur Sagar");
        assert_eq!(restored.tags, vec!["bhakti", "braj"]);
        assert_eq!(restored.blocks.len(), 2);
    }

    #[test]
    fn test_save_precondition_leaves_storage_untouched() {
        let gw = gateway();
        for doc in [document("Untitled", 3), document("  ", 3), document("Title", 0)] {
            assert!(matches!(
                gw.save(&doc, at(10, 0)),
                Err(EditorError::IncompleteDocument(_))
            ));
        }
        assert_eq!(gw.store().write_count(), 0);
    }

    #[test]
    fn test_snapshot_json_uses_camel_case() {
        let gw = gateway();
        gw.save(&document("T", 1), at(10, 0)).unwrap();
        let raw = gw.store().get(SAVED_CONTENT_KEY).unwrap().unwrap();
        assert!(raw.contains("\"itemCount\":1"));
        assert!(raw.contains("\"isAutoSave\":false"));
        assert!(!raw.contains("markup"));
    }

    #[test]
    fn test_auto_save_skips_validation() {
        let gw = gateway();
        gw.auto_save(&document("Untitled", 0), at(10, 0)).unwrap();
        let backup = gw.load_backup().unwrap().unwrap();
        assert!(backup.is_auto_save);
        assert_eq!(gw.load_saved().unwrap(), None);
    }

    #[test]
    fn test_recovery_offer_rules() {
        let gw = gateway();
        assert!(gw.load_backup_if_newer(at(10, 0)).is_none());

        // Backup alone, fresh: offered.
        gw.auto_save(&document("Draft", 1), at(10, 0)).unwrap();
        assert!(gw.load_backup_if_newer(at(10, 5)).is_some());

        // A manual save mirrors the backup: nothing newer to offer.
        gw.save(&document("Draft", 1), at(10, 10)).unwrap();
        assert!(gw.load_backup_if_newer(at(10, 15)).is_none());

        // Later auto-save: offered again.
        gw.auto_save(&document("Draft", 2), at(10, 20)).unwrap();
        let offer = gw.load_backup_if_newer(at(10, 25)).unwrap();
        assert_eq!(offer.body.len(), 2);

        // Outside the 24h window: not offered.
        let next_day = at(10, 20) + Duration::hours(24);
        assert!(gw.load_backup_if_newer(next_day).is_none());
    }

    #[test]
    fn test_stale_backup_outside_window() {
        let gw = gateway();
        gw.auto_save(&document("Draft", 1), at(10, 0)).unwrap();
        assert!(gw.stale_backup(at(10, 5)).is_none());

        let next_day = at(10, 0) + Duration::hours(25);
        assert!(gw.load_backup_if_newer(next_day).is_none());
        assert_eq!(gw.stale_backup(next_day).unwrap().body.len(), 1);

        // Once saved, the old backup holds nothing the save lacks.
        gw.save(&document("Draft", 2), at(11, 0)).unwrap();
        assert!(gw.stale_backup(at(11, 0) + Duration::hours(48)).is_none());
    }

    #[test]
    fn test_corrupt_backup_is_ignored() {
        let gw = gateway();
        gw.store().set(AUTO_SAVE_KEY, "{not json").unwrap();
        assert!(gw.load_backup_if_newer(at(10, 0)).is_none());
        assert!(gw.load_backup().is_err());
    }

    #[test]
    fn test_preferences_default_when_absent_or_corrupt() {
        let gw = gateway();
        assert_eq!(gw.font_size(), FontSize::Medium);
        assert_eq!(gw.theme(), Theme::Dark);

        gw.set_font_size(FontSize::Large).unwrap();
        gw.set_theme(Theme::Light).unwrap();
        assert_eq!(gw.font_size(), FontSize::Large);
        assert_eq!(gw.theme(), Theme::Light);

        gw.store().set(THEME_KEY, "\"sepia\"").unwrap();
        assert_eq!(gw.theme(), Theme::Dark);
    }

    #[test]
    fn test_error_record() {
        let gw = gateway();
        gw.record_error("disk full", "save", at(9, 0)).unwrap();
        let record = gw.last_error().unwrap().unwrap();
        assert_eq!(record.message, "disk full");
        assert_eq!(record.context, "save");
        assert_eq!(record.timestamp, at(9, 0));
    }
}
