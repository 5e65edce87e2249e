use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::model::{HistoryEntry, RequestKind};

/// Durable, append-only record of decided requests for one kind.
///
/// Mirrors the per-kind browser-storage record of the old screens: the full
/// list is written through on every change, and `reconcile` replaces it
/// wholesale with the server union whenever the approver view loads (the
/// server is the source of truth whenever reachable; last writer wins).
pub struct HistoryCache {
    kind: RequestKind,
    path: PathBuf,
    entries: Mutex<Vec<HistoryEntry>>,
}

impl HistoryCache {
    pub fn new(kind: RequestKind, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        HistoryCache {
            kind,
            path: dir.join(format!("history-{}.json", kind.slug())),
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    /// Restores the previous session's cache. Missing file means a fresh
    /// session; a corrupt file is logged and treated as empty.
    pub fn load_from_disk(&self) {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return,
        };
        match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
            Ok(list) => {
                *self.entries.lock().unwrap() = list;
            }
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "Discarding unreadable history cache");
            }
        }
    }

    /// Appends a just-decided entry at the front and writes through.
    ///
    /// One request produces at most one entry; a duplicate id is dropped so a
    /// replayed decision cannot double-log.
    pub fn append(&self, entry: HistoryEntry) {
        {
            let mut entries = self.entries.lock().unwrap();
            if entries.iter().any(|e| e.request.id == entry.request.id) {
                tracing::warn!(
                    request_id = entry.request.id,
                    kind = %self.kind,
                    "History entry already present, skipping duplicate"
                );
                return;
            }
            entries.insert(0, entry);
        }
        self.persist();
    }

    /// Replaces the cache with the server's authoritative union of approved
    /// and rejected entries, most recently decided first.
    pub fn reconcile(&self, approved: Vec<HistoryEntry>, rejected: Vec<HistoryEntry>) {
        {
            let mut merged: Vec<HistoryEntry> = approved.into_iter().chain(rejected).collect();
            merged.sort_by(|a, b| {
                b.request
                    .decided_at
                    .cmp(&a.request.decided_at)
                    .then_with(|| b.request.id.cmp(&a.request.id))
            });
            *self.entries.lock().unwrap() = merged;
        }
        self.persist();
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn find(&self, request_id: u64) -> Option<HistoryEntry> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.request.id == request_id)
            .cloned()
    }

    /// Flattens the cache into export rows in the kind's fixed column order.
    /// Data rows only, so callers can append to an existing sheet;
    /// `write_csv` prepends the header.
    pub fn export(&self) -> Vec<Vec<String>> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(HistoryEntry::to_row)
            .collect()
    }

    /// Serializes the header plus export rows as CSV. Quoting and escaping
    /// of embedded delimiters/quotes is handled by the writer.
    pub fn write_csv<W: Write>(&self, out: W) -> csv::Result<()> {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(HistoryEntry::columns(self.kind))?;
        for row in self.export() {
            writer.write_record(&row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write-through. Storage failures (quota, permissions) must not break
    /// the decide flow; the in-memory list stays authoritative this session.
    fn persist(&self) {
        let snapshot = self.entries.lock().unwrap().clone();
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::error!(error = %e, path = %self.path.display(), "Failed to create history dir");
                return;
            }
        }
        let json = match serde_json::to_string(&snapshot) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, kind = %self.kind, "Failed to serialize history cache");
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, json) {
            tracing::error!(error = %e, path = %self.path.display(), "Failed to persist history cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Request, RequestPayload, RequestStatus};
    use chrono::{TimeZone, Utc};

    fn entry(id: u64, decided_minute: u32) -> HistoryEntry {
        let submitted = Utc.with_ymd_and_hms(2025, 1, 5, 9, 0, 0).unwrap();
        HistoryEntry {
            request: Request {
                id,
                subject_id: 7,
                payload: RequestPayload::Leave {
                    leave_type: "annual".into(),
                    start_date: "2025-01-10".parse().unwrap(),
                    end_date: "2025-01-12".parse().unwrap(),
                    reason: "trip, extended".into(),
                },
                status: RequestStatus::Approved,
                admin_notes: Some(r#"ok "fine""#.into()),
                approved_by: Some(2),
                submitted_at: submitted,
                decided_at: Some(Utc.with_ymd_and_hms(2025, 1, 6, 10, decided_minute, 0).unwrap()),
                created_at: submitted,
                updated_at: None,
            },
            subject_name: "John Doe".into(),
        }
    }

    #[test]
    fn append_is_front_insert_and_deduplicates() {
        let dir = tempfile::tempdir().unwrap();
        let cache = HistoryCache::new(RequestKind::LeaveRequest, dir.path());
        cache.append(entry(1, 0));
        cache.append(entry(2, 1));
        cache.append(entry(1, 5)); // duplicate id, dropped
        let ids: Vec<u64> = cache.entries().iter().map(|e| e.request.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn reconcile_replaces_wholesale_most_recent_first() {
        let dir = tempfile::tempdir().unwrap();
        let cache = HistoryCache::new(RequestKind::LeaveRequest, dir.path());
        cache.append(entry(99, 0)); // stale local state
        cache.reconcile(vec![entry(1, 1), entry(3, 9)], vec![entry(2, 4)]);
        let ids: Vec<u64> = cache.entries().iter().map(|e| e.request.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn cache_survives_a_new_instance() {
        let dir = tempfile::tempdir().unwrap();
        let cache = HistoryCache::new(RequestKind::LeaveRequest, dir.path());
        cache.append(entry(1, 0));

        let restored = HistoryCache::new(RequestKind::LeaveRequest, dir.path());
        restored.load_from_disk();
        assert_eq!(restored.entries(), cache.entries());
    }

    #[test]
    fn kinds_do_not_share_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let leave = HistoryCache::new(RequestKind::LeaveRequest, dir.path());
        let reimb = HistoryCache::new(RequestKind::Reimbursement, dir.path());
        leave.append(entry(1, 0));
        reimb.load_from_disk();
        assert!(reimb.entries().is_empty());
    }

    #[test]
    fn persistence_failure_keeps_in_memory_list() {
        // A file where the directory should be makes every write fail.
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("not-a-dir");
        fs::write(&bogus, b"x").unwrap();
        let cache = HistoryCache::new(RequestKind::LeaveRequest, bogus.join("sub"));
        cache.append(entry(1, 0));
        assert_eq!(cache.entries().len(), 1);
    }

    #[test]
    fn export_returns_data_rows_without_a_header() {
        let dir = tempfile::tempdir().unwrap();
        let cache = HistoryCache::new(RequestKind::LeaveRequest, dir.path());
        cache.append(entry(1, 0));
        cache.append(entry(2, 1));
        let rows = cache.export();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], "2"); // newest first, straight to data
        assert_eq!(rows[1][0], "1");
    }

    #[test]
    fn csv_export_quotes_embedded_delimiters_and_quotes() {
        let dir = tempfile::tempdir().unwrap();
        let cache = HistoryCache::new(RequestKind::LeaveRequest, dir.path());
        cache.append(entry(1, 0));
        let mut buf = Vec::new();
        cache.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("id,employee_id,type,start,end,reason,"));
        // comma in the reason, quotes in the notes
        assert!(text.contains(r#""trip, extended""#));
        assert!(text.contains(r#""ok ""fine""""#));
    }
}
