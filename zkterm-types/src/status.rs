//! Device status (`CMD_GET_FREE_SIZES` reply)
//!
//! The reply is a flat array of little-endian `u32` counters. Field
//! positions are fixed by firmware and listed in [`StatusField::offset`].

use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;

/// Counters carried by the status structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatusField {
    UserCount,
    FingerprintCount,
    AttendanceLogCount,
    OperationLogCount,
    AdminCount,
    PasswordCount,
    FingerprintCapacity,
    UserCapacity,
    AttendanceLogCapacity,
    RemainingFingerprints,
    RemainingUsers,
    RemainingAttendanceLogs,
    FaceCount,
    FaceCapacity,
}

impl StatusField {
    /// Every field, in structure order
    pub const ALL: [StatusField; 14] = [
        Self::UserCount,
        Self::FingerprintCount,
        Self::AttendanceLogCount,
        Self::OperationLogCount,
        Self::AdminCount,
        Self::PasswordCount,
        Self::FingerprintCapacity,
        Self::UserCapacity,
        Self::AttendanceLogCapacity,
        Self::RemainingFingerprints,
        Self::RemainingUsers,
        Self::RemainingAttendanceLogs,
        Self::FaceCount,
        Self::FaceCapacity,
    ];

    /// Byte offset of the counter in the status payload
    pub const fn offset(self) -> usize {
        match self {
            Self::UserCount => 16,
            Self::FingerprintCount => 24,
            Self::AttendanceLogCount => 32,
            Self::OperationLogCount => 40,
            Self::AdminCount => 48,
            Self::PasswordCount => 52,
            Self::FingerprintCapacity => 56,
            Self::UserCapacity => 60,
            Self::AttendanceLogCapacity => 64,
            Self::RemainingFingerprints => 68,
            Self::RemainingUsers => 72,
            Self::RemainingAttendanceLogs => 76,
            Self::FaceCount => 80,
            Self::FaceCapacity => 88,
        }
    }

    /// Snake-case name, for logs and tables
    pub const fn name(self) -> &'static str {
        match self {
            Self::UserCount => "user_count",
            Self::FingerprintCount => "fp_count",
            Self::AttendanceLogCount => "attlog_count",
            Self::OperationLogCount => "oplog_count",
            Self::AdminCount => "admin_count",
            Self::PasswordCount => "pwd_count",
            Self::FingerprintCapacity => "fp_capacity",
            Self::UserCapacity => "user_capacity",
            Self::AttendanceLogCapacity => "attlog_capacity",
            Self::RemainingFingerprints => "remaining_fp",
            Self::RemainingUsers => "remaining_user",
            Self::RemainingAttendanceLogs => "remaining_attlog",
            Self::FaceCount => "face_count",
            Self::FaceCapacity => "face_capacity",
        }
    }
}

impl fmt::Display for StatusField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw status structure with typed accessors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceStatus {
    raw: Bytes,
}

impl DeviceStatus {
    pub fn new(raw: impl Into<Bytes>) -> Self {
        Self { raw: raw.into() }
    }

    /// Read one counter; `None` if the terminal sent a shorter structure
    ///
    /// Older firmware stops before the face counters.
    pub fn get(&self, field: StatusField) -> Option<u32> {
        let at = field.offset();
        let bytes = self.raw.get(at..at + 4)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Every counter present in the structure
    pub fn fields(&self) -> BTreeMap<StatusField, u32> {
        StatusField::ALL
            .iter()
            .filter_map(|&field| self.get(field).map(|value| (field, value)))
            .collect()
    }

    pub fn user_count(&self) -> Option<u32> {
        self.get(StatusField::UserCount)
    }

    pub fn attendance_log_count(&self) -> Option<u32> {
        self.get(StatusField::AttendanceLogCount)
    }

    /// Raw payload
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }
}
