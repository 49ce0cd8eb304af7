//! Snapshot persistence.
//!
//! Loading never fails: a missing file yields an empty snapshot, and a
//! corrupt or partial file is recovered field by field, each unusable field
//! taking its default. Saving writes a temporary file and renames it over
//! the target so readers never see a torn write.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use sf_common::{schema, Error, Result, Symbol, SCHEMA_VERSION, SYMBOL_COUNT};
use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use crate::stats::{StatisticsSnapshot, TransitionMatrix};

/// Durable home of the statistics snapshot.
pub trait SnapshotStore: Send {
    /// Load the persisted snapshot, recovering defaults for anything unusable.
    fn load(&self) -> StatisticsSnapshot;

    /// Overwrite the persisted snapshot.
    fn save(&self, snapshot: &StatisticsSnapshot) -> Result<()>;

    /// Short description for logs.
    fn describe(&self) -> String;
}

/// On-disk envelope: the snapshot fields plus a schema version.
#[derive(Serialize)]
struct PersistedSnapshot<'a> {
    #[serde(rename = "schemaVersion")]
    schema_version: u32,
    #[serde(flatten)]
    snapshot: &'a StatisticsSnapshot,
}

/// Serialize a snapshot to the persisted JSON layout.
pub fn encode_snapshot(snapshot: &StatisticsSnapshot) -> Result<Vec<u8>> {
    let envelope = PersistedSnapshot {
        schema_version: SCHEMA_VERSION,
        snapshot,
    };
    Ok(serde_json::to_vec_pretty(&envelope)?)
}

// ── Field-level recovery ────────────────────────────────────────────────

/// Why a persisted field was replaced by its default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: &'static str,
    pub reason: String,
}

impl FieldIssue {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Snapshot recovered from JSON plus every substitution made on the way.
#[derive(Debug, Clone)]
pub struct DecodedSnapshot {
    pub snapshot: StatisticsSnapshot,
    pub issues: Vec<FieldIssue>,
}

fn decode_count_array(value: &Value) -> Option<[u64; SYMBOL_COUNT]> {
    let items = value.as_array()?;
    if items.len() != SYMBOL_COUNT {
        return None;
    }
    let mut out = [0u64; SYMBOL_COUNT];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = item.as_u64()?;
    }
    Some(out)
}

fn decode_matrix(value: &Value) -> Option<TransitionMatrix> {
    let rows = value.as_array()?;
    if rows.len() != SYMBOL_COUNT {
        return None;
    }
    let mut out = [[0u64; SYMBOL_COUNT]; SYMBOL_COUNT];
    for (slot, row) in out.iter_mut().zip(rows) {
        *slot = decode_count_array(row)?;
    }
    Some(out)
}

/// Decode the window, dropping individual entries outside the symbol range.
fn decode_window(value: &Value, issues: &mut Vec<FieldIssue>) -> Option<VecDeque<Symbol>> {
    let items = value.as_array()?;
    let window: VecDeque<Symbol> = items
        .iter()
        .filter_map(|item| item.as_i64().and_then(Symbol::new))
        .collect();
    let dropped = items.len() - window.len();
    if dropped > 0 {
        issues.push(FieldIssue::new(
            "recent",
            format!("dropped {dropped} invalid entries"),
        ));
    }
    Some(window)
}

/// Pull one field out of `obj`, recording an issue if it is missing or invalid.
fn field<T>(
    obj: &Map<String, Value>,
    key: &'static str,
    decode: impl FnOnce(&Value) -> Option<T>,
    issues: &mut Vec<FieldIssue>,
) -> Option<T> {
    match obj.get(key) {
        None => {
            issues.push(FieldIssue::new(key, "missing"));
            None
        }
        Some(raw) => {
            let decoded = decode(raw);
            if decoded.is_none() {
                issues.push(FieldIssue::new(key, format!("invalid value {raw}")));
            }
            decoded
        }
    }
}

/// Recover a snapshot from parsed JSON, defaulting each bad field on its own.
///
/// After field recovery the counters are reconciled so the invariants hold:
/// `totalAll` is recomputed from `allCounts` and `correctPredictions` is
/// capped at `totalPredictions`.
pub fn decode_snapshot(value: &Value) -> DecodedSnapshot {
    let mut issues = Vec::new();
    let mut snapshot = StatisticsSnapshot::default();

    let Some(obj) = value.as_object() else {
        issues.push(FieldIssue::new("<root>", "not a JSON object"));
        return DecodedSnapshot { snapshot, issues };
    };

    let version = obj
        .get("schemaVersion")
        .and_then(Value::as_u64)
        .map(|v| u32::try_from(v).unwrap_or(u32::MAX));
    if !schema::is_compatible(version) {
        issues.push(FieldIssue::new(
            "schemaVersion",
            format!("unsupported version {version:?}, reading known fields only"),
        ));
    }

    if let Some(counts) = field(obj, "allCounts", decode_count_array, &mut issues) {
        snapshot.global_counts = counts;
    }
    let mut window_issues = Vec::new();
    if let Some(window) = field(
        obj,
        "recent",
        |raw| decode_window(raw, &mut window_issues),
        &mut issues,
    ) {
        snapshot.recent_window = window;
    }
    issues.append(&mut window_issues);
    let total_all = field(obj, "totalAll", Value::as_u64, &mut issues);
    if let Some(correct) = field(obj, "correctPredictions", Value::as_u64, &mut issues) {
        snapshot.correct_predictions = correct;
    }
    if let Some(total) = field(obj, "totalPredictions", Value::as_u64, &mut issues) {
        snapshot.total_predictions = total;
    }

    // Snapshots written before the Markov model have no matrix.
    match obj.get("transitionCounts") {
        None => debug!("snapshot predates transition counts, starting matrix at zero"),
        Some(raw) => match decode_matrix(raw) {
            Some(matrix) => snapshot.transition_counts = matrix,
            None => issues.push(FieldIssue::new("transitionCounts", "invalid matrix")),
        },
    }

    snapshot.updated_at = obj
        .get("updatedAt")
        .and_then(|raw| serde_json::from_value::<DateTime<Utc>>(raw.clone()).ok());

    let counted = match snapshot
        .global_counts
        .iter()
        .try_fold(0u64, |acc, &c| acc.checked_add(c))
    {
        Some(sum) => sum,
        None => {
            issues.push(FieldIssue::new("allCounts", "counts overflow when summed"));
            snapshot.global_counts = [0; SYMBOL_COUNT];
            0
        }
    };
    snapshot.total_observed = counted;
    if let Some(total) = total_all {
        if total != counted {
            issues.push(FieldIssue::new(
                "totalAll",
                format!("{total} disagrees with sum of allCounts {counted}, using {counted}"),
            ));
        }
    }

    if snapshot.correct_predictions > snapshot.total_predictions {
        issues.push(FieldIssue::new(
            "correctPredictions",
            format!(
                "{} exceeds totalPredictions {}, capping",
                snapshot.correct_predictions, snapshot.total_predictions
            ),
        ));
        snapshot.correct_predictions = snapshot.total_predictions;
    }

    DecodedSnapshot { snapshot, issues }
}

/// Recover a snapshot from raw bytes. Unparseable input yields defaults.
pub fn decode_snapshot_bytes(bytes: &[u8]) -> DecodedSnapshot {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => decode_snapshot(&value),
        Err(e) => DecodedSnapshot {
            snapshot: StatisticsSnapshot::default(),
            issues: vec![FieldIssue::new("<root>", format!("unparseable JSON: {e}"))],
        },
    }
}

// ── JSON file store ─────────────────────────────────────────────────────

/// Snapshot stored as a pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }

    fn read(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::PersistenceRead(format!(
                "{}: {e}",
                self.path.display()
            ))),
        }
    }

    fn write_atomic(&self, bytes: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.tmp_path();
        {
            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)?;
            file.write_all(bytes)?;
            file.sync_all()?;
        }

        fs::rename(tmp_path, &self.path)
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self) -> StatisticsSnapshot {
        let bytes = match self.read() {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                info!(path = %self.path.display(), "no snapshot found, starting fresh");
                return StatisticsSnapshot::default();
            }
            Err(e) => {
                warn!(error = %e, "snapshot unreadable, starting fresh");
                return StatisticsSnapshot::default();
            }
        };

        let decoded = decode_snapshot_bytes(&bytes);
        for issue in &decoded.issues {
            warn!(
                path = %self.path.display(),
                field = issue.field,
                reason = %issue.reason,
                "recovered snapshot field with default"
            );
        }
        debug!(
            path = %self.path.display(),
            total_observed = decoded.snapshot.total_observed(),
            "snapshot loaded"
        );
        decoded.snapshot
    }

    fn save(&self, snapshot: &StatisticsSnapshot) -> Result<()> {
        let bytes = encode_snapshot(snapshot)?;
        self.write_atomic(&bytes).map_err(|e| {
            Error::PersistenceWrite(format!("{}: {e}", self.path.display()))
        })?;
        debug!(path = %self.path.display(), "snapshot saved");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }
}

// ── In-memory store ─────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct MemoryInner {
    snapshot: Mutex<Option<StatisticsSnapshot>>,
    saves: AtomicUsize,
    fail_writes: AtomicBool,
}

/// Process-local store for tests and ephemeral sessions.
///
/// Clones share state, so a test can keep a handle after moving one into
/// the engine.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a snapshot.
    pub fn with_snapshot(snapshot: StatisticsSnapshot) -> Self {
        let store = Self::new();
        *store.slot() = Some(snapshot);
        store
    }

    /// The stored snapshot. A panic while the lock was held cannot leave a
    /// half-written value, so poisoning is ignored.
    fn slot(&self) -> MutexGuard<'_, Option<StatisticsSnapshot>> {
        self.inner
            .snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.inner.saves.load(Ordering::SeqCst)
    }

    /// Last saved snapshot.
    pub fn saved(&self) -> Option<StatisticsSnapshot> {
        self.slot().clone()
    }

    /// Make subsequent saves fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> StatisticsSnapshot {
        self.saved().unwrap_or_default()
    }

    fn save(&self, snapshot: &StatisticsSnapshot) -> Result<()> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::PersistenceWrite("memory store rejecting writes".into()));
        }
        *self.slot() = Some(snapshot.clone());
        self.inner.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
