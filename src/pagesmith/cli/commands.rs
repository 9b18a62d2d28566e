use super::print::{format_time_ago, print_messages, print_pairs, print_summaries};
use super::setup::{AddBlock, Cli, Commands};
use chrono::{DateTime, Utc};
use clap::Parser;
use directories::ProjectDirs;
use pagesmith::config::{ConfigAction, EditorConfig};
use pagesmith::document::MoveDirection;
use pagesmith::editor::ContentEditor;
use pagesmith::error::{EditorError, Result};
use pagesmith::export::{Artifact, ExportFormat};
use pagesmith::model::{BlockKind, EditMode};
use pagesmith::notify::{MessageLevel, MessageLog, Notifier};
use pagesmith::persist::StoredSnapshot;
use pagesmith::render::FormFields;
use pagesmith::store::fallback::FallbackStore;
use pagesmith::store::fs::FsStore;
use pagesmith::upload::{read_upload, spawn_reads};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const HOME_ENV: &str = "PAGESMITH_HOME";
const LOG_ENV: &str = "PAGESMITH_LOG";

type Editor = ContentEditor<FallbackStore<FsStore>, MessageLog>;

struct AppContext {
    editor: Editor,
    now: DateTime<Utc>,
    /// Unsaved work too old to be restored automatically. While it is
    /// pending, nothing may overwrite the backup.
    stale_backup: Option<StoredSnapshot>,
}

/// Runs one invocation. `Ok(false)` means an editor operation failed and has
/// already been reported.
pub fn run() -> Result<bool> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let workspace = resolve_workspace(cli.dir.as_deref())?;
    debug!(workspace = %workspace.display(), "resolved workspace");

    // Config edits must work even when the stored config is unreadable.
    if let Some(Commands::Config { key, value }) = &cli.command {
        return handle_config(&workspace, key.clone(), value.clone());
    }

    let mut ctx = init_context(&cli, &workspace)?;

    if ctx.stale_backup.is_some() && writes_working_copy(cli.command.as_ref()) {
        let ok = fail(
            &mut ctx,
            EditorError::Validation(
                "Refusing to overwrite unsaved changes: run `pagesmith recover` first, or pass --no-recover to discard them"
                    .to_string(),
            ),
        );
        print_messages(&ctx.editor.notifier_mut().drain());
        return Ok(ok);
    }

    let ok = match cli.command {
        Some(Commands::New {
            title,
            author,
            tags,
        }) => handle_new(&mut ctx, &title, author, tags),
        Some(Commands::Meta {
            title,
            author,
            tags,
        }) => handle_meta(&mut ctx, title, author, tags),
        Some(Commands::Add { block }) => handle_add(&mut ctx, block),
        Some(Commands::Upload { files }) => handle_upload(&mut ctx, files),
        Some(Commands::List) | None => handle_list(&ctx),
        Some(Commands::Dup { indexes }) => handle_dup(&mut ctx, &indexes),
        Some(Commands::Rm { indexes }) => handle_rm(&mut ctx, &indexes),
        Some(Commands::Mv { direction, indexes }) => handle_mv(&mut ctx, &direction, &indexes),
        Some(Commands::Edit { index, text }) => handle_edit(&mut ctx, index, &text),
        Some(Commands::Reset) => handle_reset(&mut ctx),
        Some(Commands::Recover) => handle_recover(&mut ctx),
        Some(Commands::Save) => handle_save(&mut ctx),
        Some(Commands::Status) => handle_status(&ctx),
        Some(Commands::Export { format, out }) => handle_export(&mut ctx, &format, out),
        Some(Commands::Preview { out }) => handle_preview(&mut ctx, out),
        Some(Commands::Import { file }) => handle_import(&mut ctx, &file),
        Some(Commands::Font) => ctx.editor.cycle_font_size().is_ok(),
        Some(Commands::Theme) => ctx.editor.toggle_theme().is_ok(),
        Some(Commands::Config { .. }) => true,
    };

    print_messages(&ctx.editor.notifier_mut().drain());
    Ok(ok)
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

fn resolve_workspace(flag: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = flag {
        return Ok(dir.to_path_buf());
    }
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    ProjectDirs::from("com", "pagesmith", "pagesmith")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| {
            EditorError::StorageUnavailable(format!(
                "could not determine a data directory; pass --dir or set {}",
                HOME_ENV
            ))
        })
}

fn init_context(cli: &Cli, workspace: &Path) -> Result<AppContext> {
    let config = EditorConfig::load(workspace)?;
    let store = FallbackStore::new(FsStore::new(workspace));
    let now = Utc::now();

    let mut editor = ContentEditor::open(store, MessageLog::new(), config);
    editor.set_edit_mode(EditMode::Edit, now);

    let mut stale_backup = None;
    if !cli.no_recover {
        if let Some(snapshot) = editor.recovery_offer(now) {
            let _ = editor.recover(&snapshot);
        } else if let Some(snapshot) = editor.persistence().stale_backup(now) {
            if !matches!(cli.command, Some(Commands::Recover)) {
                let message = format!(
                    "Unsaved changes from {} are older than the recovery window. Run `pagesmith recover` to restore them, or pass --no-recover to discard them",
                    format_time_ago(snapshot.timestamp, now)
                );
                editor.notifier_mut().notify(&message, MessageLevel::Error);
            }
            stale_backup = Some(snapshot);
        }
    }

    let startup = editor.notifier_mut().drain();
    let shown: Vec<_> = startup
        .into_iter()
        .filter(|m| cli.verbose || m.level == MessageLevel::Error)
        .collect();
    print_messages(&shown);

    Ok(AppContext {
        editor,
        now,
        stale_backup,
    })
}

/// Commands that replace the auto-saved backup (or, for `save`, make it
/// unrecoverable).
fn writes_working_copy(command: Option<&Commands>) -> bool {
    matches!(
        command,
        Some(
            Commands::New { .. }
                | Commands::Meta { .. }
                | Commands::Add { .. }
                | Commands::Upload { .. }
                | Commands::Dup { .. }
                | Commands::Rm { .. }
                | Commands::Mv { .. }
                | Commands::Edit { .. }
                | Commands::Reset
                | Commands::Save
                | Commands::Import { .. }
        )
    )
}

/// Keeps the working copy for the next invocation.
fn persist_working_copy(ctx: &mut AppContext, changed: bool) -> bool {
    if !changed {
        return false;
    }
    ctx.editor.auto_save(ctx.now).is_ok()
}

fn fail(ctx: &mut AppContext, err: EditorError) -> bool {
    ctx.editor
        .notifier_mut()
        .notify(&err.to_string(), MessageLevel::Error);
    false
}

/// Selects the given 1-based positions. Nothing is selected unless all of
/// them exist.
fn select(ctx: &mut AppContext, indexes: &[usize]) -> bool {
    let mut positions = BTreeSet::new();
    for &index in indexes {
        match to_position(ctx, index) {
            Some(position) => {
                positions.insert(position);
            }
            None => return false,
        }
    }

    let len = ctx.editor.model().len();
    if let Some(&position) = positions.iter().find(|&&p| p >= len) {
        return fail(
            ctx,
            EditorError::IndexOutOfRange {
                index: position + 1,
                len,
            },
        );
    }

    for position in positions {
        let _ = ctx.editor.toggle_selection(position);
    }
    // The batch operation reports the outcome; per-item notices are noise here.
    ctx.editor.notifier_mut().drain();
    true
}

fn to_position(ctx: &mut AppContext, index: usize) -> Option<usize> {
    match index.checked_sub(1) {
        Some(position) => Some(position),
        None => {
            fail(
                ctx,
                EditorError::Validation("Invalid index: 0 (indexes start at 1)".to_string()),
            );
            None
        }
    }
}

fn handle_new(
    ctx: &mut AppContext,
    title: &str,
    author: Option<String>,
    tags: Option<String>,
) -> bool {
    if ctx.editor.new_document(title).is_err() {
        return false;
    }
    if let Some(author) = author {
        let _ = ctx.editor.set_author(&author);
    }
    if let Some(tags) = tags {
        let _ = ctx.editor.set_tags(&tags);
    }
    persist_working_copy(ctx, true)
}

fn handle_meta(
    ctx: &mut AppContext,
    title: Option<String>,
    author: Option<String>,
    tags: Option<String>,
) -> bool {
    if title.is_none() && author.is_none() && tags.is_none() {
        return fail(
            ctx,
            EditorError::Validation("Nothing to change: use --title, --author or --tags".into()),
        );
    }

    let mut ok = true;
    if let Some(title) = title {
        ok &= ctx.editor.set_title(&title).is_ok();
    }
    if let Some(author) = author {
        ok &= ctx.editor.set_author(&author).is_ok();
    }
    if let Some(tags) = tags {
        ok &= ctx.editor.set_tags(&tags).is_ok();
    }
    persist_working_copy(ctx, true) && ok
}

fn handle_add(ctx: &mut AppContext, block: AddBlock) -> bool {
    let mut fields = FormFields::new();
    let kind = match block {
        AddBlock::Text {
            content,
            align,
            style,
            lyrics,
        } => {
            fields.insert("text-content", content);
            if let Some(align) = align {
                fields.insert("text-align", align);
            }
            if let Some(style) = style {
                fields.insert("text-style", style);
            }
            if lyrics {
                fields.insert("is-lyrics", "true");
            }
            BlockKind::Text
        }
        AddBlock::Heading { text, level } => {
            fields.insert("heading-text", text);
            if let Some(level) = level {
                fields.insert("heading-level", level);
            }
            BlockKind::Heading
        }
        AddBlock::Image {
            url,
            file,
            alt,
            caption,
        } => {
            if let Some(path) = file {
                return add_image_file(ctx, &path, alt, caption);
            }
            fields.insert("image-url", url.unwrap_or_default());
            if let Some(alt) = alt {
                fields.insert("image-alt", alt);
            }
            if let Some(caption) = caption {
                fields.insert("image-caption", caption);
            }
            BlockKind::Image
        }
        AddBlock::Video { url, caption } => {
            fields.insert("video-url", url);
            if let Some(caption) = caption {
                fields.insert("video-caption", caption);
            }
            BlockKind::Video
        }
        AddBlock::Audio { url, title } => {
            fields.insert("audio-url", url);
            if let Some(title) = title {
                fields.insert("audio-title", title);
            }
            BlockKind::Audio
        }
        AddBlock::Quote { text, author } => {
            fields.insert("quote-text", text);
            if let Some(author) = author {
                fields.insert("quote-author", author);
            }
            BlockKind::Quote
        }
    };

    let added = ctx.editor.add_block(kind, &fields).is_ok();
    persist_working_copy(ctx, added)
}

fn add_image_file(
    ctx: &mut AppContext,
    path: &Path,
    alt: Option<String>,
    caption: Option<String>,
) -> bool {
    let max_bytes = ctx.editor.config().max_upload_bytes;
    let file = match read_upload(path, max_bytes) {
        Ok(file) => file,
        Err(e) => return fail(ctx, e),
    };
    if !file.mime.starts_with("image/") {
        return fail(
            ctx,
            EditorError::UnsupportedFileType {
                name: file.name,
                mime: file.mime,
            },
        );
    }

    let added = if alt.is_none() && caption.is_none() {
        ctx.editor.add_uploaded_image(&file).is_ok()
    } else {
        let mut fields = FormFields::new()
            .with("image-url", file.data_url)
            .with("image-alt", alt.unwrap_or(file.name));
        if let Some(caption) = caption {
            fields.insert("image-caption", caption);
        }
        ctx.editor.add_block(BlockKind::Image, &fields).is_ok()
    };
    persist_working_copy(ctx, added)
}

fn handle_upload(ctx: &mut AppContext, files: Vec<PathBuf>) -> bool {
    let requested = files.len();
    let max_bytes = ctx.editor.config().max_upload_bytes;
    let added = ctx.editor.ingest_uploads(spawn_reads(files, max_bytes));
    persist_working_copy(ctx, added > 0);
    added == requested
}

fn handle_list(ctx: &AppContext) -> bool {
    print_summaries(&ctx.editor.document().title, &ctx.editor.summaries());
    true
}

fn handle_dup(ctx: &mut AppContext, indexes: &[usize]) -> bool {
    if !select(ctx, indexes) {
        return false;
    }
    let ok = ctx.editor.duplicate_selected().is_ok();
    persist_working_copy(ctx, ok)
}

fn handle_rm(ctx: &mut AppContext, indexes: &[usize]) -> bool {
    if !select(ctx, indexes) {
        return false;
    }
    let ok = ctx.editor.delete_selected().is_ok();
    persist_working_copy(ctx, ok)
}

fn handle_mv(ctx: &mut AppContext, direction: &str, indexes: &[usize]) -> bool {
    let direction = match direction.parse::<MoveDirection>() {
        Ok(direction) => direction,
        Err(e) => return fail(ctx, e),
    };
    if !select(ctx, indexes) {
        return false;
    }
    let ok = ctx.editor.move_selected(direction).is_ok();
    persist_working_copy(ctx, ok)
}

fn handle_edit(ctx: &mut AppContext, index: usize, text: &str) -> bool {
    let Some(position) = to_position(ctx, index) else {
        return false;
    };
    let ok = ctx.editor.edit_item(position, text).is_ok();
    persist_working_copy(ctx, ok)
}

fn handle_reset(ctx: &mut AppContext) -> bool {
    let ok = ctx.editor.reset_order().is_ok();
    persist_working_copy(ctx, ok)
}

fn handle_recover(ctx: &mut AppContext) -> bool {
    let snapshot = match ctx.stale_backup.take() {
        Some(snapshot) => snapshot,
        None => match ctx.editor.persistence().load_backup() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                return fail(
                    ctx,
                    EditorError::Validation("No auto-saved backup to recover".to_string()),
                )
            }
            Err(e) => return fail(ctx, e),
        },
    };
    let ok = ctx.editor.recover(&snapshot).is_ok();
    persist_working_copy(ctx, ok)
}

fn handle_save(ctx: &mut AppContext) -> bool {
    ctx.editor.save(ctx.now).is_ok()
}

fn handle_status(ctx: &AppContext) -> bool {
    let editor = &ctx.editor;
    let document = editor.document();
    let persistence = editor.persistence();

    let mut pairs: Vec<(&str, String)> = vec![
        ("title", document.title.clone()),
        ("author", document.author.clone()),
        ("tags", document.tags_line()),
        ("items", editor.model().len().to_string()),
        ("font size", editor.font_size().as_str().to_string()),
        ("theme", editor.theme().as_str().to_string()),
    ];

    let saved = match persistence.load_saved() {
        Ok(Some(snapshot)) => format_time_ago(snapshot.timestamp, ctx.now),
        Ok(None) => "never".to_string(),
        Err(e) => format!("unreadable ({})", e),
    };
    pairs.push(("last save", saved));

    if let Ok(Some(backup)) = persistence.load_backup() {
        pairs.push(("auto-saved", format_time_ago(backup.timestamp, ctx.now)));
    }
    if let Some(record) = editor.last_error() {
        pairs.push((
            "last error",
            format!(
                "{} ({}, {})",
                record.message,
                record.context,
                format_time_ago(record.timestamp, ctx.now)
            ),
        ));
    }
    if persistence.store().is_degraded() {
        pairs.push(("storage", "unavailable, changes kept in memory".to_string()));
    }

    print_pairs(&pairs);
    true
}

fn handle_export(ctx: &mut AppContext, format: &str, out: Option<PathBuf>) -> bool {
    let format = match format.parse::<ExportFormat>() {
        Ok(format) => format,
        Err(e) => return fail(ctx, e),
    };
    let artifact = match ctx.editor.export(format, ctx.now) {
        Ok(artifact) => artifact,
        Err(_) => return false,
    };
    write_artifact(ctx, &artifact, out)
}

fn handle_preview(ctx: &mut AppContext, out: Option<PathBuf>) -> bool {
    match ctx.editor.preview() {
        Ok(artifact) => write_artifact(ctx, &artifact, out),
        Err(_) => false,
    }
}

fn write_artifact(
    ctx: &mut AppContext,
    artifact: &Artifact,
    out: Option<PathBuf>,
) -> bool {
    let dir = out.unwrap_or_else(|| PathBuf::from("."));
    match artifact.write_to(&dir) {
        Ok(path) => {
            println!("{}", path.display());
            true
        }
        Err(e) => fail(ctx, e),
    }
}

fn handle_import(ctx: &mut AppContext, file: &Path) -> bool {
    let text = match std::fs::read_to_string(file) {
        Ok(text) => text,
        Err(e) => return fail(ctx, e.into()),
    };
    let ok = ctx.editor.import_json(&text).is_ok();
    persist_working_copy(ctx, ok)
}

fn handle_config(workspace: &Path, key: Option<String>, value: Option<String>) -> Result<bool> {
    let action = match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(k), None) => ConfigAction::ShowKey(k),
        (Some(k), Some(v)) => ConfigAction::Set(k, v),
    };

    let mut config = EditorConfig::load(workspace).unwrap_or_default();
    let mut log = MessageLog::new();
    let ok = match action {
        ConfigAction::ShowAll => {
            print_pairs(&config.list_all());
            true
        }
        ConfigAction::ShowKey(key) => match config.get(&key) {
            Some(value) => {
                println!("{}", value);
                true
            }
            None => {
                log.notify(&format!("Unknown config key: {}", key), MessageLevel::Error);
                false
            }
        },
        ConfigAction::Set(key, value) => {
            match config.set(&key, &value).and_then(|_| config.save(workspace)) {
                Ok(()) => {
                    log.notify(&format!("{} = {}", key, value), MessageLevel::Success);
                    true
                }
                Err(e) => {
                    log.notify(&e.to_string(), MessageLevel::Error);
                    false
                }
            }
        }
    };
    print_messages(&log.drain());
    Ok(ok)
}
