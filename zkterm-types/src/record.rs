//! Attendance and operation log records

use chrono::NaiveDateTime;

use crate::error::{Error, Result, ascii_field, ensure_len};
use crate::time::decode_time;
use crate::user::{DATASET_HEADER_SIZE, dataset_body};

pub const ATTENDANCE_RECORD_SIZE: usize = 40;
pub const OPERATION_RECORD_SIZE: usize = 16;

/// One attendance log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceRecord {
    pub user_sn: u16,
    pub user_id: String,
    /// 0 = password, 1 = fingerprint, 2 = card
    pub verify_type: u8,
    pub time: NaiveDateTime,
    pub verify_state: u8,
}

impl AttendanceRecord {
    pub fn parse(entry: &[u8]) -> Result<Self> {
        ensure_len("attendance record", entry, ATTENDANCE_RECORD_SIZE)?;

        Ok(Self {
            user_sn: u16::from_le_bytes([entry[0], entry[1]]),
            user_id: ascii_field(&entry[2..11]),
            verify_type: entry[26],
            time: decode_time(u32::from_le_bytes([entry[27], entry[28], entry[29], entry[30]]))?,
            verify_state: entry[31],
        })
    }
}

/// One operation log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRecord {
    pub operation: u8,
    pub time: NaiveDateTime,
    pub params: [u16; 4],
}

impl OperationRecord {
    pub fn parse(entry: &[u8]) -> Result<Self> {
        ensure_len("operation record", entry, OPERATION_RECORD_SIZE)?;

        let mut params = [0u16; 4];
        for (n, param) in params.iter_mut().enumerate() {
            *param = u16::from_le_bytes([entry[8 + 2 * n], entry[9 + 2 * n]]);
        }

        Ok(Self {
            operation: entry[2],
            time: decode_time(u32::from_le_bytes([entry[4], entry[5], entry[6], entry[7]]))?,
            params,
        })
    }
}

/// Entries of a log dataset, bounded by the size in its header
fn log_entries<'a>(what: &'static str, dataset: &'a [u8], record: usize) -> Result<std::slice::ChunksExact<'a, u8>> {
    let body = dataset_body(what, dataset)?;
    let declared = if dataset.len() >= DATASET_HEADER_SIZE {
        u32::from_le_bytes([dataset[0], dataset[1], dataset[2], dataset[3]]) as usize
    } else {
        0
    };

    if declared > body.len() {
        return Err(Error::Truncated {
            what,
            expected: declared,
            actual: body.len(),
        });
    }
    if declared % record != 0 {
        return Err(Error::Parse(format!(
            "{} of {} bytes is not a whole number of {}-byte records",
            what, declared, record
        )));
    }

    Ok(body[..declared].chunks_exact(record))
}

/// Decode the attendance log dataset
pub fn parse_attendance_log(dataset: &[u8]) -> Result<Vec<AttendanceRecord>> {
    log_entries("attendance log", dataset, ATTENDANCE_RECORD_SIZE)?
        .map(AttendanceRecord::parse)
        .collect()
}

/// Decode the operation log dataset
pub fn parse_operation_log(dataset: &[u8]) -> Result<Vec<OperationRecord>> {
    log_entries("operation log", dataset, OPERATION_RECORD_SIZE)?
        .map(OperationRecord::parse)
        .collect()
}
