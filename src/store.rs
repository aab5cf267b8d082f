//! Ordered file queue with capacity and single/multiple selection rules

use log::debug;
use serde::Serialize;

use crate::error::Warning;
use crate::file::{CandidateFile, FileSummary};
use crate::transfer::{RecordId, TransferState, TransferStatus};
use crate::validate::Validator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Acceptance {
    Pending,
    Accepted,
    Rejected,
}

/// One tracked file with its validation and transfer status.
#[derive(Debug)]
pub struct FileRecord {
    id: RecordId,
    file: CandidateFile,
    acceptance: Acceptance,
    pub(crate) warning: Option<Warning>,
    pub(crate) transfer: TransferState,
}

impl FileRecord {
    fn new(id: RecordId, file: CandidateFile) -> Self {
        Self {
            id,
            file,
            acceptance: Acceptance::Pending,
            warning: None,
            transfer: TransferState::NotStarted,
        }
    }

    /// Acceptance is decided once and never revisited.
    fn settle(&mut self, verdict: Result<(), Warning>) {
        if self.acceptance != Acceptance::Pending {
            return;
        }
        match verdict {
            Ok(()) => self.acceptance = Acceptance::Accepted,
            Err(warning) => {
                self.acceptance = Acceptance::Rejected;
                self.warning = Some(warning);
            }
        }
    }

    pub fn id(&self) -> RecordId {
        self.id
    }

    pub fn file(&self) -> &CandidateFile {
        &self.file
    }

    pub fn acceptance(&self) -> Acceptance {
        self.acceptance
    }

    pub fn warning(&self) -> Option<&Warning> {
        self.warning.as_ref()
    }

    pub fn transfer(&self) -> &TransferState {
        &self.transfer
    }

    pub fn status(&self) -> TransferStatus {
        self.transfer.status()
    }

    pub fn progress(&self) -> Option<f64> {
        self.transfer.progress()
    }

    pub fn view(&self) -> RecordView {
        RecordView {
            id: self.id,
            file: self.file.summary(),
            acceptance: self.acceptance,
            warning: self.warning.clone(),
            status: self.transfer.status(),
            progress: self.transfer.progress(),
            response: self.transfer.response().map(str::to_string),
        }
    }
}

/// Read-only copy of a record for renderers and event payloads.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordView {
    pub id: RecordId,
    pub file: FileSummary,
    pub acceptance: Acceptance,
    pub warning: Option<Warning>,
    pub status: TransferStatus,
    pub progress: Option<f64>,
    pub response: Option<String>,
}

#[derive(Debug)]
pub enum AddOutcome {
    Appended { index: usize, id: RecordId },
    /// Single selection: the previous record was discarded. Its transfer, if
    /// any, is not touched here.
    Replaced {
        id: RecordId,
        previous: Option<FileRecord>,
    },
    CapacityExceeded,
}

#[derive(Debug)]
pub struct FileRecordStore {
    capacity: usize,
    validator: Validator,
    records: Vec<FileRecord>,
    next_id: u64,
}

impl FileRecordStore {
    /// A capacity of 0 is treated as 1.
    pub fn new(capacity: usize, validator: Validator) -> Self {
        Self {
            capacity: capacity.max(1),
            validator,
            records: Vec::new(),
            next_id: 1,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_multiple(&self) -> bool {
        self.capacity > 1
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn add(&mut self, file: CandidateFile) -> AddOutcome {
        if self.is_multiple() && self.records.len() >= self.capacity {
            debug!(
                "store_add_refused: {} capacity={}",
                file.name(),
                self.capacity
            );
            return AddOutcome::CapacityExceeded;
        }

        let id = RecordId(self.next_id);
        self.next_id += 1;

        let verdict = self.validator.check(&file);
        let mut record = FileRecord::new(id, file);
        record.settle(verdict);
        debug!(
            "store_add: {} {} acceptance={:?}",
            id,
            record.file.name(),
            record.acceptance
        );

        if self.is_multiple() {
            self.records.push(record);
            AddOutcome::Appended {
                index: self.records.len() - 1,
                id,
            }
        } else {
            let previous = self.records.pop();
            self.records.push(record);
            AddOutcome::Replaced { id, previous }
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<FileRecord> {
        if index >= self.records.len() {
            return None;
        }
        Some(self.records.remove(index))
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn snapshot(&self) -> Vec<RecordView> {
        self.records.iter().map(FileRecord::view).collect()
    }

    pub fn position(&self, id: RecordId) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    pub fn get(&self, id: RecordId) -> Option<&FileRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn get_mut(&mut self, id: RecordId) -> Option<&mut FileRecord> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    pub(crate) fn get_mut_at(&mut self, index: usize) -> Option<&mut FileRecord> {
        self.records.get_mut(index)
    }

    pub(crate) fn records_mut(&mut self) -> impl Iterator<Item = &mut FileRecord> {
        self.records.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records with a transfer in flight.
    pub fn in_flight(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.transfer.is_in_progress())
            .count()
    }
}
