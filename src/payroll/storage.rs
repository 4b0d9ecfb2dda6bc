use std::fs;
use std::io::Write;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{PayrollError, PayrollResult};

/// File sink for rendered payslips. `save` is durable (flushed and
/// fsynced) before the caller records the returned reference in the
/// ledger, so a ledger row never points at a half-written artifact.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    base_dir: PathBuf,
}

impl DocumentStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        DocumentStore {
            base_dir: base_dir.into(),
        }
    }

    pub fn save(&self, filename: &str, bytes: &[u8]) -> PayrollResult<String> {
        fs::create_dir_all(&self.base_dir)?;
        let path = self.base_dir.join(filename);

        let mut file = fs::File::create(&path)?;
        file.write_all(bytes)?;
        file.sync_all()?;

        debug!(path = %path.display(), size = bytes.len(), "stored payslip document");
        Ok(filename.to_string())
    }

    pub fn load(&self, reference: &str) -> PayrollResult<Vec<u8>> {
        let path = self.base_dir.join(reference);
        fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PayrollError::NotFound {
                    entity: "payslip document",
                }
            } else {
                PayrollError::Io(e)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());

        let reference = store.save("payroll_1_2025_5.pdf", b"%PDF-stub").unwrap();
        assert_eq!(reference, "payroll_1_2025_5.pdf");

        let bytes = store.load(&reference).unwrap();
        assert_eq!(bytes, b"%PDF-stub");
    }

    #[test]
    fn save_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path().join("uploads").join("payroll"));

        store.save("slip.pdf", b"bytes").unwrap();
        assert_eq!(store.load("slip.pdf").unwrap(), b"bytes");
    }

    #[test]
    fn missing_document_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());

        let err = store.load("nope.pdf").unwrap_err();
        assert!(matches!(err, PayrollError::NotFound { .. }));
    }
}
