//! Data export and import.
//!
//! JSON export bundles every stored key into one document that `import_json`
//! can restore. CSV export writes flat tables for spreadsheets.

use crate::dates::format_date;
use crate::ledger::Ledger;
use crate::store::{self, KeyValueStore};
use crate::{categories, CycleHistory, Error, Result, Transaction};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs::File;
use std::path::Path;

/// Build a JSON document holding every stored section
pub fn export_json(store: &dyn KeyValueStore) -> Result<String> {
    let mut doc = Map::new();
    for key in store::ALL_KEYS {
        let value = store.get(key)?.unwrap_or(Value::Null);
        doc.insert(key.to_string(), value);
    }
    doc.insert("exportTime".into(), Value::String(Utc::now().to_rfc3339()));

    tracing::info!("Exported {} sections", store::ALL_KEYS.len());
    Ok(serde_json::to_string_pretty(&Value::Object(doc))?)
}

/// Restore sections from an `export_json` document
///
/// Only known, non-null sections are written. Returns the number written.
/// Every section is checked before the first write: nothing is written if
/// the text is not a JSON object or if `periodData`/`transactions` do not
/// have their stored shape. If a write fails, sections already written are
/// put back the way they were.
pub fn import_json(store: &mut dyn KeyValueStore, text: &str) -> Result<usize> {
    let doc: Value = serde_json::from_str(text)?;
    let Value::Object(sections) = doc else {
        return Err(Error::Other("import document must be a JSON object".into()));
    };

    let mut staged = Vec::new();
    for key in store::ALL_KEYS {
        match sections.get(key) {
            Some(Value::Null) | None => {}
            Some(value) => {
                check_shape(key, value)?;
                staged.push((key, value));
            }
        }
    }

    let previous = staged
        .iter()
        .map(|(key, _)| Ok((*key, store.get(key)?)))
        .collect::<Result<Vec<_>>>()?;

    for (written, (key, value)) in staged.iter().enumerate() {
        if let Err(e) = store.set(key, (*value).clone()) {
            tracing::warn!("Import failed writing {}: {}. Restoring previous data.", key, e);
            restore(store, &previous[..written]);
            return Err(e);
        }
    }

    tracing::info!("Imported {} sections", staged.len());
    Ok(staged.len())
}

/// Reject typed sections that would be ignored on load
fn check_shape(key: &str, value: &Value) -> Result<()> {
    let checked = match key {
        store::PERIOD_DATA => CycleHistory::deserialize(value).map(drop),
        store::TRANSACTIONS => Ledger::deserialize(value).map(drop),
        _ => Ok(()),
    };
    checked.map_err(|e| {
        tracing::warn!("Import section {} has an unexpected shape: {}", key, e);
        Error::Json(e)
    })
}

fn restore(store: &mut dyn KeyValueStore, previous: &[(&str, Option<Value>)]) {
    for (key, value) in previous {
        let result = match value {
            Some(v) => store.set(key, v.clone()),
            None => store.remove(key),
        };
        if let Err(e) = result {
            tracing::warn!("Could not restore {}: {}", key, e);
        }
    }
}

/// A row in the transactions CSV
#[derive(Debug, serde::Serialize)]
struct TransactionRow<'a> {
    id: String,
    date: String,
    kind: &'static str,
    category: &'a str,
    category_name: &'static str,
    amount_cents: i64,
    note: &'a str,
}

impl<'a> From<&'a Transaction> for TransactionRow<'a> {
    fn from(t: &'a Transaction) -> Self {
        TransactionRow {
            id: t.id.to_string(),
            date: format_date(t.date),
            kind: match t.kind {
                crate::TransactionKind::Income => "income",
                crate::TransactionKind::Expense => "expense",
            },
            category: &t.category,
            category_name: categories::display_name(&t.category),
            amount_cents: t.amount_cents,
            note: &t.note,
        }
    }
}

/// A row in the cycles CSV
#[derive(Debug, serde::Serialize)]
struct CycleRow<'a> {
    id: String,
    start_date: String,
    end_date: String,
    flow_length: i64,
    flow: crate::FlowIntensity,
    note: &'a str,
}

/// Write transactions to a headered CSV file, replacing it
pub fn export_transactions_csv(path: &Path, transactions: &[Transaction]) -> Result<usize> {
    let rows = transactions.iter().map(TransactionRow::from);
    write_csv(path, rows)
}

/// Write cycle records to a headered CSV file, replacing it
pub fn export_cycles_csv(path: &Path, history: &CycleHistory) -> Result<usize> {
    let rows = history.records.iter().map(|r| CycleRow {
        id: r.id.to_string(),
        start_date: format_date(r.start_date),
        end_date: format_date(r.end_date),
        flow_length: r.flow_length(),
        flow: r.flow,
        note: &r.note,
    });
    write_csv(path, rows)
}

fn write_csv<R, I>(path: &Path, rows: I) -> Result<usize>
where
    R: serde::Serialize,
    I: IntoIterator<Item = R>,
{
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let mut writer = csv::WriterBuilder::new().has_headers(true).from_writer(file);

    let mut count = 0;
    for row in rows {
        writer.serialize(row)?;
        count += 1;
    }

    // Flush and sync to disk
    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    file.sync_all()?;

    tracing::info!("Wrote {} rows to {:?}", count, path);
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_date;
    use crate::store::{MemoryStore, PERIOD_DATA, SETTINGS, TRANSACTIONS, USER_INFO};
    use crate::{CycleRecord, FlowIntensity, TransactionKind};
    use serde_json::json;

    fn sample_history() -> CycleHistory {
        let mut history = CycleHistory::default();
        history
            .commit_record(
                CycleRecord::new(
                    parse_date("2024-01-01").unwrap(),
                    parse_date("2024-01-05").unwrap(),
                    FlowIntensity::Light,
                )
                .with_note("first, with comma"),
            )
            .unwrap();
        history
    }

    #[test]
    fn test_export_import_roundtrip() {
        let mut source = MemoryStore::new();
        store::save_history(&mut source, &sample_history()).unwrap();
        source.set(SETTINGS, json!({"theme": "dark"})).unwrap();

        let text = export_json(&source).unwrap();
        let doc: Value = serde_json::from_str(&text).unwrap();
        assert!(doc.get("exportTime").is_some());
        assert_eq!(doc.get(TRANSACTIONS), Some(&Value::Null));

        let mut target = MemoryStore::new();
        let written = import_json(&mut target, &text).unwrap();
        assert_eq!(written, 2);
        assert_eq!(target.get(PERIOD_DATA).unwrap(), source.get(PERIOD_DATA).unwrap());
        assert_eq!(target.get(TRANSACTIONS).unwrap(), None);
    }

    #[test]
    fn test_import_rejects_garbage() {
        let mut target = MemoryStore::new();
        assert!(matches!(import_json(&mut target, "not json"), Err(Error::Json(_))));
        assert!(import_json(&mut target, "[1, 2]").is_err());
        assert!(target.keys().unwrap().is_empty());
    }

    /// Store that fails every write to one key
    struct FailingStore {
        inner: MemoryStore,
        fail_on: &'static str,
    }

    impl KeyValueStore for FailingStore {
        fn get(&self, key: &str) -> Result<Option<Value>> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: Value) -> Result<()> {
            if key == self.fail_on {
                return Err(Error::Store(format!("write to {} refused", key)));
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<()> {
            self.inner.remove(key)
        }

        fn keys(&self) -> Result<Vec<String>> {
            self.inner.keys()
        }
    }

    #[test]
    fn test_import_rejects_foreign_history_shape() {
        let mut target = MemoryStore::new();
        store::save_history(&mut target, &sample_history()).unwrap();
        let before = target.get(PERIOD_DATA).unwrap();

        // Valid JSON object, but not a stored history
        let text = json!({
            "periodData": {"periods": [], "lastPeriod": "2024-01-01", "cycleLength": 28},
            "transactions": [],
        })
        .to_string();

        assert!(matches!(import_json(&mut target, &text), Err(Error::Json(_))));
        assert_eq!(target.get(PERIOD_DATA).unwrap(), before);
        assert_eq!(target.get(TRANSACTIONS).unwrap(), None);
    }

    #[test]
    fn test_import_rejects_foreign_transactions_shape() {
        let mut target = MemoryStore::new();
        let text = json!({
            "userInfo": {"name": "a"},
            "transactions": [{"amount": 12, "type": "expense"}],
        })
        .to_string();

        assert!(matches!(import_json(&mut target, &text), Err(Error::Json(_))));
        assert!(target.keys().unwrap().is_empty());
    }

    #[test]
    fn test_failed_write_restores_previous_sections() {
        let mut inner = MemoryStore::new();
        inner.set(USER_INFO, json!({"name": "before"})).unwrap();
        let mut target = FailingStore {
            inner,
            fail_on: SETTINGS,
        };

        let mut source = MemoryStore::new();
        store::save_history(&mut source, &sample_history()).unwrap();
        source.set(USER_INFO, json!({"name": "after"})).unwrap();
        source.set(SETTINGS, json!({"theme": "dark"})).unwrap();
        let text = export_json(&source).unwrap();

        assert!(matches!(import_json(&mut target, &text), Err(Error::Store(_))));
        assert_eq!(target.get(USER_INFO).unwrap(), Some(json!({"name": "before"})));
        assert_eq!(target.get(PERIOD_DATA).unwrap(), None);
        assert_eq!(target.get(SETTINGS).unwrap(), None);
    }

    #[test]
    fn test_transactions_csv() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("out").join("transactions.csv");

        let mut ledger = Ledger::default();
        for (cents, category) in [(3_800, "food"), (600, "transport")] {
            ledger.add(
                Transaction::new(
                    TransactionKind::Expense,
                    cents,
                    category,
                    parse_date("2024-02-10").unwrap(),
                )
                .unwrap(),
            );
        }

        let count = export_transactions_csv(&path, ledger.transactions()).unwrap();
        assert_eq!(count, 2);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "id");
        assert_eq!(&headers[5], "amount_cents");
        assert_eq!(reader.records().count(), 2);
    }

    #[test]
    fn test_cycles_csv() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("cycles.csv");

        let count = export_cycles_csv(&path, &sample_history()).unwrap();
        assert_eq!(count, 1);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[1], "2024-01-01");
        assert_eq!(&row[3], "5");
        assert_eq!(&row[4], "light");
        assert_eq!(&row[5], "first, with comma");
    }
}
