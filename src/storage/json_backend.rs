use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use std::{
    cmp::Reverse,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::{
    core::{
        errors::{Result, SavingsError},
        utils::{canonical_name, ensure_dir, PathResolver},
    },
    ledger::{Amount, Ledger, CURRENT_SCHEMA_VERSION},
};

use super::{BackupInfo, LedgerStore};

const LEDGER_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S%3f";
const TMP_SUFFIX: &str = "tmp";
pub const DEFAULT_RETENTION: usize = 5;

/// Filesystem-backed JSON persistence for a single named ledger.
///
/// Each commit rotates the previous file into a bounded backup set, then writes the
/// new state to a temp file and renames it into place.
pub struct JsonLedgerStore {
    slug: String,
    ledger_path: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
    current: Ledger,
}

impl JsonLedgerStore {
    /// Opens `<base>/ledgers/<name>.json`, creating it with `default_target` when absent.
    pub fn open(
        base: &Path,
        name: &str,
        default_target: Amount,
        retention: Option<usize>,
    ) -> Result<Self> {
        let slug = canonical_name(name);
        let ledgers_dir = PathResolver::ledger_dir_in(base);
        let backups_dir = PathResolver::backup_dir_in(base).join(&slug);
        ensure_dir(&ledgers_dir)?;
        let ledger_path = ledgers_dir.join(format!("{}.{}", slug, LEDGER_EXTENSION));

        let existing = ledger_path.exists();
        let current = if existing {
            load_ledger_from_path(&ledger_path)?
        } else {
            Ledger::new(default_target)?
        };

        let store = Self {
            slug,
            ledger_path,
            backups_dir,
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
            current,
        };

        if existing {
            tracing::info!(
                path = %store.ledger_path.display(),
                entries = store.current.entry_count(),
                "opened savings ledger"
            );
        } else {
            save_ledger_to_path(&store.current, &store.ledger_path)?;
            tracing::info!(
                path = %store.ledger_path.display(),
                target = default_target,
                "created savings ledger"
            );
        }
        Ok(store)
    }

    pub fn ledger_path(&self) -> &Path {
        &self.ledger_path
    }

    /// Replaces the ledger with the contents of a backup. The file being replaced is
    /// itself rotated into the backup set first.
    pub fn restore_backup(&mut self, backup: &BackupInfo) -> Result<()> {
        if !backup.path.exists() {
            return Err(SavingsError::Persistence(format!(
                "backup `{}` not found",
                backup.id
            )));
        }
        let restored = load_ledger_from_path(&backup.path)?;
        self.commit(restored)
    }

    fn backup_existing_file(&self) -> Result<Option<PathBuf>> {
        if !self.ledger_path.exists() {
            return Ok(None);
        }
        ensure_dir(&self.backups_dir)?;
        let backup_path = self.next_backup_path(Utc::now());
        fs::copy(&self.ledger_path, &backup_path)?;
        self.prune_backups()?;
        Ok(Some(backup_path))
    }

    /// Backup path stamped with `at`, stepped forward a millisecond at a time until
    /// no existing backup carries the same name.
    fn next_backup_path(&self, mut at: DateTime<Utc>) -> PathBuf {
        loop {
            let file_name = format!(
                "{}_{}.{}",
                self.slug,
                at.format(BACKUP_TIMESTAMP_FORMAT),
                LEDGER_EXTENSION
            );
            let path = self.backups_dir.join(file_name);
            if !path.exists() {
                return path;
            }
            at += Duration::milliseconds(1);
        }
    }

    fn prune_backups(&self) -> Result<()> {
        let entries = self.list_backups()?;
        for entry in entries.into_iter().skip(self.retention) {
            if let Err(err) = fs::remove_file(&entry.path) {
                tracing::warn!(path = %entry.path.display(), error = %err, "failed to prune backup");
            }
        }
        Ok(())
    }
}

impl LedgerStore for JsonLedgerStore {
    fn snapshot(&self) -> &Ledger {
        &self.current
    }

    fn commit(&mut self, next: Ledger) -> Result<()> {
        let backup = self.backup_existing_file()?;
        save_ledger_to_path(&next, &self.ledger_path)?;
        self.current = next;
        tracing::debug!(
            path = %self.ledger_path.display(),
            backup = ?backup,
            "ledger committed"
        );
        Ok(())
    }

    fn describe(&self) -> String {
        self.ledger_path.display().to_string()
    }

    fn list_backups(&self) -> Result<Vec<BackupInfo>> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(LEDGER_EXTENSION) {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            entries.push(BackupInfo {
                id: file_name.to_string(),
                created_at: parse_backup_timestamp(file_name),
                path: path.clone(),
            });
        }
        entries.sort_by_key(|info| Reverse(info.created_at));
        Ok(entries)
    }
}

/// Saves a ledger to an arbitrary path, staging through `<path>.tmp`.
pub fn save_ledger_to_path(ledger: &Ledger, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let json = serde_json::to_string_pretty(ledger)?;
    let tmp = tmp_path(path);
    write_atomic(&tmp, &json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Loads a ledger from the provided filesystem path.
pub fn load_ledger_from_path(path: &Path) -> Result<Ledger> {
    let data = fs::read_to_string(path)?;
    let ledger: Ledger = serde_json::from_str(&data)?;
    if ledger.schema_version > CURRENT_SCHEMA_VERSION {
        return Err(SavingsError::Persistence(format!(
            "ledger `{}` uses schema version {}, newer than supported {}",
            path.display(),
            ledger.schema_version,
            CURRENT_SCHEMA_VERSION
        )));
    }
    Ok(ledger)
}

fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let trimmed = name.strip_suffix(&format!(".{}", LEDGER_EXTENSION))?;
    let mut segments = trimmed.rsplitn(3, '_');
    let time = segments.next()?;
    let date = segments.next()?;
    // Older backups carry whole seconds only.
    let (clock, millis) = match time.len() {
        6 => (time, "0"),
        9 => time.split_at(6),
        _ => return None,
    };
    if !is_digits(date, 8) || !is_digits(clock, 6) || !is_digits(millis, millis.len()) {
        return None;
    }
    let millis: i64 = millis.parse().ok()?;
    let raw = format!("{}{}", date, clock);
    NaiveDateTime::parse_from_str(&raw, "%Y%m%d%H%M%S")
        .ok()
        .map(|naive| {
            DateTime::from_naive_utc_and_offset(naive, Utc) + Duration::milliseconds(millis)
        })
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()?;
    Ok(())
}
