//! # Editor Controller
//!
//! [`ContentEditor`] holds all editor state explicitly: the document model,
//! the selection, persistence, preferences, edit mode and the auto-save
//! schedule. A UI (the CLI here) calls its operations and renders whatever
//! the [`Notifier`] receives.
//!
//! Each user-facing operation sends exactly one notification describing its
//! outcome and also returns the `Result`, so callers can branch on it.
//! Failures are logged at `warn`; environment failures (storage, I/O,
//! serialization) are additionally kept under the `last-error` key.
//!
//! Time is passed in, except for error-record stamps.
//! [`ContentEditor::tick`] is the auto-save hook and runs between operations
//! on the caller's thread.

use crate::autosave::AutoSaveSchedule;
use crate::config::EditorConfig;
use crate::document::{BlockSummary, DocumentModel, MoveDirection};
use crate::error::{EditorError, Result};
use crate::export::{self, Artifact, ExportEngine, ExportFormat};
use crate::model::{BlockKind, Document, EditMode, FontSize, Theme};
use crate::notify::{MessageLevel, Notifier};
use crate::persist::{ErrorRecord, PersistenceGateway, StoredSnapshot};
use crate::render::{self, FormFields};
use crate::selection::Selection;
use crate::store::KeyValueStore;
use crate::upload::{UploadOutcome, UploadedFile};
use chrono::{DateTime, Utc};
use std::str::FromStr;
use std::sync::mpsc::Receiver;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Delete,
    Escape,
}

/// A key press with its modifiers. `Cmd` and `Ctrl` are interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyChord {
    pub key: Key,
    pub ctrl: bool,
}

impl KeyChord {
    pub fn plain(key: Key) -> Self {
        Self { key, ctrl: false }
    }

    pub fn ctrl(c: char) -> Self {
        Self {
            key: Key::Char(c),
            ctrl: true,
        }
    }
}

impl FromStr for KeyChord {
    type Err = EditorError;

    /// Parses `ctrl+s`, `cmd+d`, `delete`, `escape`.
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        let (ctrl, key) = match lower.split_once('+') {
            Some(("ctrl" | "cmd" | "meta", key)) => (true, key),
            Some(_) => {
                return Err(EditorError::Validation(format!("Unknown modifier in '{}'", s)))
            }
            None => (false, lower.as_str()),
        };
        let key = match key {
            "delete" | "del" => Key::Delete,
            "escape" | "esc" => Key::Escape,
            k if k.chars().count() == 1 => Key::Char(k.chars().next().unwrap_or_default()),
            other => return Err(EditorError::Validation(format!("Unknown key: {}", other))),
        };
        Ok(Self { key, ctrl })
    }
}

/// What a keyboard shortcut did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortcutOutcome {
    Saved,
    Previewed(Artifact),
    SelectedAll,
    Duplicated(usize),
    Deleted(usize),
    Failed,
}

fn capitalized(kind: BlockKind) -> String {
    let name = kind.as_str();
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        "item"
    } else {
        "items"
    }
}

pub struct ContentEditor<S: KeyValueStore, N: Notifier> {
    model: DocumentModel,
    selection: Selection,
    persistence: PersistenceGateway<S>,
    exporter: ExportEngine,
    notifier: N,
    config: EditorConfig,
    mode: EditMode,
    font_size: FontSize,
    theme: Theme,
    autosave: AutoSaveSchedule,
}

impl<S: KeyValueStore, N: Notifier> ContentEditor<S, N> {
    /// Opens the last manually saved document, or a blank one.
    pub fn open(store: S, notifier: N, config: EditorConfig) -> Self {
        let persistence = PersistenceGateway::new(store, &config);
        let document = match persistence.load_saved() {
            Ok(Some(snapshot)) => snapshot.to_document(),
            Ok(None) => Document::new(config.placeholder_title.clone()),
            Err(e) => {
                warn!(error = %e, "saved content is unreadable, starting blank");
                Document::new(config.placeholder_title.clone())
            }
        };
        Self::assemble(persistence, notifier, config, document)
    }

    pub fn with_document(store: S, notifier: N, config: EditorConfig, document: Document) -> Self {
        let persistence = PersistenceGateway::new(store, &config);
        Self::assemble(persistence, notifier, config, document)
    }

    fn assemble(
        persistence: PersistenceGateway<S>,
        notifier: N,
        config: EditorConfig,
        document: Document,
    ) -> Self {
        let font_size = persistence.font_size();
        let theme = persistence.theme();
        debug!(blocks = document.blocks.len(), "editor opened");
        Self {
            model: DocumentModel::new(document),
            selection: Selection::new(),
            exporter: ExportEngine::new(&config),
            autosave: AutoSaveSchedule::new(config.autosave_interval()),
            persistence,
            notifier,
            config,
            mode: EditMode::default(),
            font_size,
            theme,
        }
    }

    pub fn document(&self) -> &Document {
        self.model.document()
    }

    pub fn model(&self) -> &DocumentModel {
        &self.model
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn persistence(&self) -> &PersistenceGateway<S> {
        &self.persistence
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn font_size(&self) -> FontSize {
        self.font_size
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn autosave_schedule(&self) -> &AutoSaveSchedule {
        &self.autosave
    }

    pub fn summaries(&self) -> Vec<BlockSummary> {
        self.model.summaries()
    }

    pub fn editor_markup(&self) -> String {
        self.model.editor_markup()
    }

    pub fn last_error(&self) -> Option<ErrorRecord> {
        self.persistence.last_error().ok().flatten()
    }

    fn notify(&mut self, message: &str, level: MessageLevel) {
        self.notifier.notify(message, level);
    }

    /// Converts an outcome into its single notification.
    fn report<T>(
        &mut self,
        context: &str,
        result: Result<T>,
        on_success: impl FnOnce(&T) -> (String, MessageLevel),
    ) -> Result<T> {
        match &result {
            Ok(value) => {
                let (message, level) = on_success(value);
                self.notify(&message, level);
            }
            Err(e) => {
                warn!(operation = context, error = %e, "operation failed");
                if e.is_unexpected() {
                    if let Err(record_err) =
                        self.persistence
                            .record_error(&e.to_string(), context, Utc::now())
                    {
                        debug!(error = %record_err, "could not record error");
                    }
                }
                let message = match context {
                    "save" => format!("Save failed: {}", e),
                    "export" => format!("Export failed: {}", e),
                    "preview" => format!("Preview failed: {}", e),
                    "recover" => format!("Failed to recover content: {}", e),
                    _ => e.to_string(),
                };
                self.notify(&message, MessageLevel::Error);
            }
        }
        result
    }

    fn success(message: impl Into<String>) -> (String, MessageLevel) {
        (message.into(), MessageLevel::Success)
    }

    fn info(message: impl Into<String>) -> (String, MessageLevel) {
        (message.into(), MessageLevel::Info)
    }

    fn after_structure_change(&mut self) {
        self.selection.retain_within(self.model.len());
    }

    pub fn set_title(&mut self, title: &str) -> Result<()> {
        let result = if title.trim().is_empty() {
            Err(EditorError::Validation("Title cannot be empty".to_string()))
        } else {
            self.model.set_title(title.trim());
            Ok(())
        };
        self.report("set_title", result, |_| Self::success("Title updated"))
    }

    /// Replaces the open document with an empty one. Unlike recovery or
    /// import, this also clears the reset target.
    pub fn new_document(&mut self, title: &str) -> Result<()> {
        let result = if title.trim().is_empty() {
            Err(EditorError::Validation("Title cannot be empty".to_string()))
        } else {
            self.model = DocumentModel::new(Document::new(title.trim()));
            self.selection.clear();
            Ok(())
        };
        self.report("new_document", result, |_| {
            Self::success("Started a new document")
        })
    }

    pub fn set_author(&mut self, author: &str) -> Result<()> {
        self.model.set_author(author.trim());
        self.report("set_author", Ok(()), |_| Self::success("Author updated"))
    }

    /// Returns the number of tags kept after splitting the line.
    pub fn set_tags(&mut self, line: &str) -> Result<usize> {
        self.model.set_tags_line(line);
        let count = self.model.document().tags.len();
        self.report("set_tags", Ok(count), |n| {
            Self::success(format!("Tags updated ({})", n))
        })
    }

    pub fn add_block(&mut self, kind: BlockKind, fields: &FormFields) -> Result<usize> {
        let result = render::build_block(kind, fields).map(|block| self.model.append(block));
        self.report("add_block", result, |_| {
            Self::success(format!("{} added successfully", capitalized(kind)))
        })
    }

    /// The image form's upload path: the image goes in as its own block.
    pub fn add_uploaded_image(&mut self, file: &UploadedFile) -> Result<usize> {
        let result = render::image_from_upload(file).map(|block| self.model.append(block));
        self.report("add_uploaded_image", result, |_| {
            Self::success("Image added successfully")
        })
    }

    /// Appends one block per successfully read file, notifying per file.
    /// Returns the number of blocks added.
    pub fn ingest_uploads(&mut self, outcomes: Receiver<UploadOutcome>) -> usize {
        let mut seen = 0;
        let mut added = 0;
        for outcome in outcomes {
            seen += 1;
            let name = outcome.name;
            let result = outcome
                .result
                .and_then(|file| render::block_from_upload(&file))
                .map(|block| self.model.append(block));
            match result {
                Ok(_) => {
                    added += 1;
                    self.notify(
                        &format!("{} uploaded successfully", name),
                        MessageLevel::Success,
                    );
                }
                Err(e) => {
                    warn!(file = %name, error = %e, "upload failed");
                    self.notify(
                        &format!("Error processing {}: {}", name, e),
                        MessageLevel::Error,
                    );
                }
            }
        }
        if seen == 0 {
            self.notify("No files selected", MessageLevel::Error);
        }
        info!(seen, added, "processed uploads");
        added
    }

    pub fn toggle_selection(&mut self, index: usize) -> Result<bool> {
        let result = self.selection.toggle(index, self.model.len());
        let count = self.selection.len();
        self.report("toggle_selection", result, |selected| {
            let verb = if *selected { "Selected" } else { "Deselected" };
            Self::info(format!(
                "{} item {} ({} selected)",
                verb,
                index + 1,
                count
            ))
        })
    }

    pub fn select_all(&mut self) -> usize {
        self.selection.select_all(self.model.len());
        let n = self.selection.len();
        self.notify(&format!("Selected {} {}", n, plural(n)), MessageLevel::Info);
        n
    }

    pub fn deselect_all(&mut self) {
        self.selection.clear();
        self.notify("Deselected all items", MessageLevel::Info);
    }

    pub fn duplicate_selected(&mut self) -> Result<usize> {
        let result = self.selection.duplicate_selected(&mut self.model);
        self.report("duplicate_selected", result, |n| {
            Self::success(format!("Duplicated {} {}", n, plural(*n)))
        })
    }

    pub fn delete_selected(&mut self) -> Result<usize> {
        let result = self
            .selection
            .delete_selected(&mut self.model)
            .map(|removed| removed.len());
        self.report("delete_selected", result, |n| {
            Self::success(format!("Deleted {} {}", n, plural(*n)))
        })
    }

    pub fn move_selected(&mut self, direction: MoveDirection) -> Result<usize> {
        let result = self.selection.move_selected(&mut self.model, direction);
        self.report("move_selected", result, |_| {
            Self::success(format!("Moved items {}", direction))
        })
    }

    pub fn delete_at(&mut self, index: usize) -> Result<()> {
        let result = self.model.remove_at(index).map(|block| block.kind());
        self.after_structure_change();
        self.report("delete_at", result, |kind| {
            Self::success(format!("{} deleted", kind.label()))
        })
        .map(|_| ())
    }

    pub fn edit_item(&mut self, index: usize, text: &str) -> Result<()> {
        let result = self.model.edit_text(index, text);
        self.report("edit_item", result, |_| Self::success("Content updated"))
    }

    pub fn reset_order(&mut self) -> Result<()> {
        let result = self.model.reset_to_original();
        self.after_structure_change();
        self.report("reset_order", result, |_| {
            Self::success("Order reset to original")
        })
    }

    pub fn save(&mut self, now: DateTime<Utc>) -> Result<StoredSnapshot> {
        let result = self.persistence.save(self.model.document(), now);
        self.report("save", result, |snapshot| {
            Self::success(format!(
                "Content saved successfully ({} {})",
                snapshot.body.len(),
                plural(snapshot.body.len())
            ))
        })
    }

    pub fn auto_save(&mut self, now: DateTime<Utc>) -> Result<()> {
        let result = self.persistence.auto_save(self.model.document(), now);
        self.report("auto_save", result, |_| Self::info("Auto-saved"))
    }

    /// Auto-saves when the interval has elapsed, in edit mode only.
    /// Returns whether a snapshot was written.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        if self.mode != EditMode::Edit || !self.autosave.due(now) {
            return false;
        }
        self.auto_save(now).is_ok()
    }

    /// A backup worth offering, if any. Only notifies when there is one.
    pub fn recovery_offer(&mut self, now: DateTime<Utc>) -> Option<StoredSnapshot> {
        let offer = self.persistence.load_backup_if_newer(now)?;
        let age = (now - offer.timestamp).to_std().unwrap_or_default();
        let message = format!(
            "Unsaved changes from {} can be recovered",
            timeago::Formatter::new().convert(age)
        );
        self.notify(&message, MessageLevel::Info);
        Some(offer)
    }

    pub fn recover(&mut self, snapshot: &StoredSnapshot) -> Result<()> {
        let document = snapshot.to_document();
        self.model.replace_all(document);
        self.selection.clear();
        self.report("recover", Ok(()), |_| {
            Self::success("Content recovered successfully")
        })
    }

    /// Drops the pending backup.
    pub fn decline_recovery(&mut self) -> Result<()> {
        let result = self.persistence.discard_backup();
        self.report("decline_recovery", result, |_| {
            Self::info("Auto-saved backup discarded")
        })
    }

    pub fn export(&mut self, format: ExportFormat, now: DateTime<Utc>) -> Result<Artifact> {
        let result = self.exporter.export(self.model.document(), format, now);
        self.report("export", result, |_| match format {
            ExportFormat::Pdf => Self::info("Use the print dialog to save as PDF"),
            other => Self::success(format!("{} exported successfully", other.label())),
        })
    }

    pub fn preview(&mut self) -> Result<Artifact> {
        let document = self.model.document();
        let artifact = Artifact {
            filename: format!("{}.preview.html", export::sanitize_filename(&document.title)),
            mime: "text/html".to_string(),
            content: export::preview_html(document),
        };
        self.report("preview", Ok(artifact), |_| Self::success("Preview ready"))
    }

    pub fn import_json(&mut self, text: &str) -> Result<usize> {
        let result = export::from_json(text).map(|document| {
            let n = document.blocks.len();
            self.model.replace_all(document);
            self.selection.clear();
            n
        });
        self.report("import_json", result, |n| {
            Self::success(format!("Imported {} {}", n, plural(*n)))
        })
    }

    /// Edit mode starts the auto-save schedule; view mode stops it and drops
    /// the selection.
    pub fn toggle_edit_mode(&mut self, now: DateTime<Utc>) -> EditMode {
        self.set_edit_mode(
            match self.mode {
                EditMode::Edit => EditMode::View,
                EditMode::View => EditMode::Edit,
            },
            now,
        );
        self.mode
    }

    pub fn set_edit_mode(&mut self, mode: EditMode, now: DateTime<Utc>) {
        self.mode = mode;
        match mode {
            EditMode::Edit => {
                self.autosave.start(now);
                self.notify("Edit mode enabled", MessageLevel::Info);
            }
            EditMode::View => {
                self.autosave.stop();
                self.selection.clear();
                self.notify("View mode enabled", MessageLevel::Info);
            }
        }
    }

    pub fn cycle_font_size(&mut self) -> Result<FontSize> {
        self.font_size = self.font_size.next();
        let size = self.font_size;
        let result = self.persistence.set_font_size(size).map(|_| size);
        self.report("cycle_font_size", result, |size| {
            Self::info(format!("Font size: {}", size.as_str()))
        })
    }

    pub fn toggle_theme(&mut self) -> Result<Theme> {
        self.theme = self.theme.toggled();
        let theme = self.theme;
        let result = self.persistence.set_theme(theme).map(|_| theme);
        self.report("toggle_theme", result, |theme| {
            Self::info(format!("Theme: {}", theme.as_str()))
        })
    }

    /// Keyboard shortcuts, active in edit mode only. Returns `None` when the
    /// chord is not a shortcut here.
    pub fn handle_key(&mut self, chord: KeyChord, now: DateTime<Utc>) -> Option<ShortcutOutcome> {
        if self.mode != EditMode::Edit {
            return None;
        }
        let outcome = match (chord.ctrl, chord.key) {
            (true, Key::Char('s')) => match self.save(now) {
                Ok(_) => ShortcutOutcome::Saved,
                Err(_) => ShortcutOutcome::Failed,
            },
            (true, Key::Char('p')) => match self.preview() {
                Ok(artifact) => ShortcutOutcome::Previewed(artifact),
                Err(_) => ShortcutOutcome::Failed,
            },
            (true, Key::Char('a')) => {
                self.select_all();
                ShortcutOutcome::SelectedAll
            }
            (true, Key::Char('d')) => match self.duplicate_selected() {
                Ok(n) => ShortcutOutcome::Duplicated(n),
                Err(_) => ShortcutOutcome::Failed,
            },
            (false, Key::Delete) if !self.selection.is_empty() => {
                match self.delete_selected() {
                    Ok(n) => ShortcutOutcome::Deleted(n),
                    Err(_) => ShortcutOutcome::Failed,
                }
            }
            _ => return None,
        };
        Some(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MessageLog;
    use crate::store::memory::MemoryStore;
    use chrono::{Duration, TimeZone};

    type TestEditor = ContentEditor<MemoryStore, MessageLog>;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn editor() -> TestEditor {
        ContentEditor::open(MemoryStore::new(), MessageLog::new(), EditorConfig::default())
    }

    fn fields(pairs: &[(&str, &str)]) -> FormFields {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    fn add_text(ed: &mut TestEditor, s: &str) {
        ed.add_block(BlockKind::Text, &fields(&[("text-content", s)]))
            .unwrap();
    }

    fn last(ed: &TestEditor) -> (MessageLevel, String) {
        let m = ed.notifier().last().unwrap();
        (m.level, m.content.clone())
    }

    #[test]
    fn test_opens_blank_with_placeholder_title() {
        let ed = editor();
        assert_eq!(ed.document().title, "Untitled");
        assert_eq!(ed.mode(), EditMode::View);
        assert!(ed.notifier().is_empty());
    }

    #[test]
    fn test_each_operation_notifies_once() {
        let mut ed = editor();
        add_text(&mut ed, "a");
        assert_eq!(ed.notifier().len(), 1);
        assert!(ed
            .add_block(BlockKind::Heading, &fields(&[("heading-text", " ")]))
            .is_err());
        assert_eq!(ed.notifier().len(), 2);
        assert_eq!(
            last(&ed),
            (MessageLevel::Error, "Please enter heading text".to_string())
        );
        ed.delete_at(0).unwrap();
        assert_eq!(ed.notifier().len(), 3);
        assert_eq!(last(&ed), (MessageLevel::Success, "Text deleted".to_string()));
    }

    #[test]
    fn test_set_tags_counts_kept_tags() {
        let mut ed = editor();
        assert_eq!(ed.set_tags(" bhakti, , braj ").unwrap(), 2);
        assert_eq!(ed.document().tags, vec!["bhakti", "braj"]);
        assert_eq!(
            last(&ed),
            (MessageLevel::Success, "Tags updated (2)".to_string())
        );
    }

    #[test]
    fn test_batch_ops_report_nothing_selected() {
        let mut ed = editor();
        add_text(&mut ed, "a");
        assert!(matches!(
            ed.delete_selected(),
            Err(EditorError::NothingSelected)
        ));
        assert_eq!(
            last(&ed),
            (MessageLevel::Error, "No items selected".to_string())
        );
        assert_eq!(ed.model().len(), 1);
    }

    #[test]
    fn test_save_requires_real_title() {
        let mut ed = editor();
        add_text(&mut ed, "body");
        assert!(ed.save(t(0)).is_err());
        let (level, message) = last(&ed);
        assert_eq!(level, MessageLevel::Error);
        assert!(message.starts_with("Save failed: Please set a title"));
        assert_eq!(ed.persistence().store().write_count(), 0);

        ed.set_title("Padavali").unwrap();
        ed.save(t(0)).unwrap();
        assert_eq!(
            last(&ed),
            (
                MessageLevel::Success,
                "Content saved successfully (1 item)".to_string()
            )
        );
    }

    #[test]
    fn test_tick_only_writes_in_edit_mode() {
        let mut ed = editor();
        add_text(&mut ed, "draft");
        for s in (0..=120).step_by(10) {
            assert!(!ed.tick(t(s)));
        }
        assert_eq!(ed.persistence().store().write_count(), 0);

        ed.set_edit_mode(EditMode::Edit, t(200));
        assert!(!ed.tick(t(210)));
        assert!(ed.tick(t(230)));
        assert!(!ed.tick(t(240)));
        assert!(ed.tick(t(260)));
        assert_eq!(ed.persistence().store().write_count(), 2);

        ed.toggle_edit_mode(t(270));
        assert!(!ed.tick(t(400)));
        assert_eq!(ed.persistence().store().write_count(), 2);
    }

    #[test]
    fn test_recovery_round_trip() {
        let store = MemoryStore::new();
        let mut ed = ContentEditor::open(store, MessageLog::new(), EditorConfig::default());
        ed.set_title("Draft").unwrap();
        add_text(&mut ed, "unsaved");
        ed.auto_save(t(0)).unwrap();

        let offer = ed.recovery_offer(t(60)).unwrap();
        assert!(last(&ed).1.contains("can be recovered"));

        let mut fresh = editor();
        fresh.recover(&offer).unwrap();
        assert_eq!(fresh.document().title, "Draft");
        assert_eq!(fresh.model().len(), 1);
    }

    #[test]
    fn test_preferences_persist() {
        let mut ed = editor();
        assert_eq!(ed.cycle_font_size().unwrap(), FontSize::Large);
        assert_eq!(ed.toggle_theme().unwrap(), Theme::Light);
        assert_eq!(ed.persistence().font_size(), FontSize::Large);
        assert_eq!(ed.persistence().theme(), Theme::Light);
        assert_eq!(last(&ed), (MessageLevel::Info, "Theme: light".to_string()));
    }

    /// Refuses writes to a single key.
    struct ReadOnlyKey {
        inner: MemoryStore,
        key: &'static str,
    }

    impl KeyValueStore for ReadOnlyKey {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            if key == self.key {
                return Err(EditorError::StorageUnavailable("read-only".to_string()));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_unexpected_errors_are_recorded() {
        let mut ed = editor();
        ed.set_title("T").unwrap();
        add_text(&mut ed, "x");
        ed.persistence().store().set_simulate_write_error(true);
        assert!(ed.save(t(0)).is_err());
        ed.persistence().store().set_simulate_write_error(false);
        // The record itself could not be written while writes were failing.
        assert!(ed.last_error().is_none());

        let store = ReadOnlyKey {
            inner: MemoryStore::new(),
            key: crate::persist::SAVED_CONTENT_KEY,
        };
        let mut ed = ContentEditor::open(store, MessageLog::new(), EditorConfig::default());
        ed.set_title("T").unwrap();
        ed.add_block(BlockKind::Text, &fields(&[("text-content", "x")]))
            .unwrap();
        assert!(ed.save(t(0)).is_err());
        let record = ed.last_error().unwrap();
        assert_eq!(record.context, "save");
        assert!(record.message.contains("read-only"));
    }

    #[test]
    fn test_malformed_import_is_not_an_environment_fault() {
        let mut ed = editor();
        add_text(&mut ed, "kept");
        assert!(matches!(
            ed.import_json("{not json"),
            Err(EditorError::Validation(_))
        ));
        assert!(ed.last_error().is_none());
        assert_eq!(ed.model().len(), 1);
        assert_eq!(last(&ed).0, MessageLevel::Error);
    }

    #[test]
    fn test_oversized_durations_do_not_break_the_session() {
        let config = EditorConfig {
            autosave_interval_secs: 1_000_000_000_000_000,
            recovery_window_hours: 9_999_999_999_999,
            ..EditorConfig::default()
        };
        let mut ed = ContentEditor::open(MemoryStore::new(), MessageLog::new(), config);
        ed.set_edit_mode(EditMode::Edit, t(0));
        add_text(&mut ed, "draft");
        assert!(!ed.tick(t(60)));
        ed.auto_save(t(0)).unwrap();
        assert!(ed.recovery_offer(t(60)).is_some());
    }

    #[test]
    fn test_shortcuts_need_edit_mode() {
        let mut ed = editor();
        add_text(&mut ed, "a");
        add_text(&mut ed, "b");
        assert_eq!(ed.handle_key(KeyChord::ctrl('a'), t(0)), None);

        ed.set_edit_mode(EditMode::Edit, t(0));
        assert_eq!(
            ed.handle_key("ctrl+a".parse().unwrap(), t(0)),
            Some(ShortcutOutcome::SelectedAll)
        );
        assert_eq!(
            ed.handle_key("cmd+d".parse().unwrap(), t(0)),
            Some(ShortcutOutcome::Duplicated(2))
        );
        assert_eq!(ed.model().len(), 4);

        assert_eq!(ed.handle_key(KeyChord::plain(Key::Delete), t(0)), None);
        ed.toggle_selection(0).unwrap();
        assert_eq!(
            ed.handle_key(KeyChord::plain(Key::Delete), t(0)),
            Some(ShortcutOutcome::Deleted(1))
        );
        assert_eq!(
            ed.handle_key(KeyChord::ctrl('s'), t(0)),
            Some(ShortcutOutcome::Failed)
        );
        assert!(matches!(
            ed.handle_key(KeyChord::ctrl('p'), t(0)),
            Some(ShortcutOutcome::Previewed(_))
        ));
        assert_eq!(ed.handle_key(KeyChord::plain(Key::Escape), t(0)), None);
    }

    #[test]
    fn test_key_chord_parsing() {
        assert_eq!("Ctrl+S".parse::<KeyChord>().unwrap(), KeyChord::ctrl('s'));
        assert_eq!(
            "delete".parse::<KeyChord>().unwrap(),
            KeyChord::plain(Key::Delete)
        );
        assert!("alt+s".parse::<KeyChord>().is_err());
        assert!("ctrl+space".parse::<KeyChord>().is_err());
    }

    #[test]
    fn test_new_document_drops_reset_target() {
        let mut ed = editor();
        add_text(&mut ed, "old");
        let snapshot = StoredSnapshot::capture(ed.document(), t(0));
        let mut reopened = ContentEditor::with_document(
            MemoryStore::new(),
            MessageLog::new(),
            EditorConfig::default(),
            snapshot.to_document(),
        );
        reopened.new_document("Fresh").unwrap();
        assert_eq!(reopened.document().title, "Fresh");
        assert!(reopened.model().is_empty());
        assert!(matches!(
            reopened.reset_order(),
            Err(EditorError::NothingToRestore)
        ));
        assert!(reopened.new_document("  ").is_err());
    }

    #[test]
    fn test_export_notifies() {
        let mut ed = editor();
        ed.set_title("Songs").unwrap();
        add_text(&mut ed, "x");
        let artifact = ed.export(ExportFormat::Json, t(0)).unwrap();
        assert_eq!(artifact.filename, "songs.json");
        assert_eq!(
            last(&ed),
            (MessageLevel::Success, "JSON exported successfully".to_string())
        );
        ed.export(ExportFormat::Pdf, t(0)).unwrap();
        assert_eq!(last(&ed).0, MessageLevel::Info);
    }
}
