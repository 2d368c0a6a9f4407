//! Protocol constants

use bitflags::bitflags;

/// Magic tag opening every packet on the stream
pub const START_TAG: [u8; 4] = [0x50, 0x50, 0x82, 0x7D];

/// Stream prefix: tag (4) + size (2) + reserved (2)
pub const PREFIX_SIZE: usize = 8;

/// Inner header: code (2) + checksum (2) + session id (2) + reply counter (2)
pub const INNER_HEADER_SIZE: usize = 8;

/// Full header ahead of the payload
pub const HEADER_SIZE: usize = PREFIX_SIZE + INNER_HEADER_SIZE;

/// Default terminal port
pub const DEFAULT_PORT: u16 = 4370;

/// Default read size for single replies
pub const DEFAULT_REPLY_READ: usize = 1024;

/// Default read size for long datasets
pub const DEFAULT_DATASET_READ: usize = 4096;

/// Offset of the 32-bit dataset size in a streamed-transfer announcement
pub const TRANSFER_SIZE_OFFSET: usize = 1;

bitflags! {
    /// Realtime event flags
    ///
    /// A received event carries exactly one of these in its session slot;
    /// registration (`CMD_REG_EVENT`) takes a mask of them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EventFlags: u16 {
        /// Attendance log event
        const ATTLOG = 1;
        /// Fingerprint pressed
        const FINGER = 1 << 1;
        /// User enrolled
        const ENROLL_USER = 1 << 2;
        /// Fingerprint enrolled
        const ENROLL_FINGER = 1 << 3;
        /// Button pressed
        const BUTTON = 1 << 4;
        /// Door unlocked
        const UNLOCK = 1 << 5;
        /// Verification event
        const VERIFY = 1 << 7;
        /// Fingerprint sample scored
        const FPFTR = 1 << 8;
        /// Alarm signal
        const ALARM = 1 << 9;
    }
}

/// Dataset selectors (`fct` field of a `CMD_DATA_WRRQ` request)
pub mod data_types {
    /// Attendance log
    pub const FCT_ATTLOG: u8 = 1;

    /// Fingerprint template
    pub const FCT_FINGERTMP: u8 = 2;

    /// Operation log
    pub const FCT_OPLOG: u8 = 4;

    /// User record
    pub const FCT_USER: u8 = 5;

    /// SMS
    pub const FCT_SMS: u8 = 6;

    /// User data
    pub const FCT_UDATA: u8 = 7;

    /// Work code
    pub const FCT_WORKCODE: u8 = 8;
}

/// Verification styles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum VerifyStyle {
    Group = 0x00,
    FpOrPwOrRf = 0x80,
    Fp = 0x81,
    Pin = 0x82,
    Pw = 0x83,
    Rf = 0x84,
    FpOrPw = 0x85,
    FpOrRf = 0x86,
    PwOrRf = 0x87,
    PinAndFp = 0x88,
    FpAndPw = 0x89,
    FpAndRf = 0x8A,
    PwAndRf = 0x8B,
    FpAndPwAndRf = 0x8C,
    PinAndFpAndPw = 0x8D,
    FpAndRfOrPin = 0x8E,
}

impl TryFrom<u8> for VerifyStyle {
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, u8> {
        Ok(match value {
            0x00 => Self::Group,
            0x80 => Self::FpOrPwOrRf,
            0x81 => Self::Fp,
            0x82 => Self::Pin,
            0x83 => Self::Pw,
            0x84 => Self::Rf,
            0x85 => Self::FpOrPw,
            0x86 => Self::FpOrRf,
            0x87 => Self::PwOrRf,
            0x88 => Self::PinAndFp,
            0x89 => Self::FpAndPw,
            0x8A => Self::FpAndRf,
            0x8B => Self::PwAndRf,
            0x8C => Self::FpAndPwAndRf,
            0x8D => Self::PinAndFpAndPw,
            0x8E => Self::FpAndRfOrPin,
            other => return Err(other),
        })
    }
}
