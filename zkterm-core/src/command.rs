//! Command and reply codes
//!
//! The code slot of a packet carries a command on the way to the terminal
//! and a reply code on the way back. Realtime events reuse the
//! `RegEvent` code and carry their type in the session slot instead.

use std::fmt;

use crate::error::{Error, Result};

macro_rules! commands {
    ($($variant:ident = $code:literal => $name:literal),* $(,)?) => {
        /// Protocol command and reply codes
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
        #[repr(u16)]
        pub enum Command {
            $($variant = $code,)*
        }

        impl Command {
            /// Vendor name of the code, for logs
            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                }
            }
        }

        impl TryFrom<u16> for Command {
            type Error = Error;

            fn try_from(value: u16) -> Result<Self> {
                match value {
                    $($code => Ok(Self::$variant),)*
                    _ => Err(Error::UnknownCommand(value)),
                }
            }
        }
    };
}

commands! {
    // Session
    Connect = 1000 => "CMD_CONNECT",
    Exit = 1001 => "CMD_EXIT",
    EnableDevice = 1002 => "CMD_ENABLEDEVICE",
    DisableDevice = 1003 => "CMD_DISABLEDEVICE",
    Restart = 1004 => "CMD_RESTART",
    PowerOff = 1005 => "CMD_POWEROFF",
    Sleep = 1006 => "CMD_SLEEP",
    Resume = 1007 => "CMD_RESUME",

    // Device interaction
    CaptureFinger = 1009 => "CMD_CAPTUREFINGER",
    TestTemp = 1011 => "CMD_TEST_TEMP",
    CaptureImage = 1012 => "CMD_CAPTUREIMAGE",
    RefreshData = 1013 => "CMD_REFRESHDATA",
    RefreshOption = 1014 => "CMD_REFRESHOPTION",
    TestVoice = 1017 => "CMD_TESTVOICE",

    // Device information
    GetVersion = 1100 => "CMD_GET_VERSION",
    ChangeSpeed = 1101 => "CMD_CHANGE_SPEED",
    Auth = 1102 => "CMD_AUTH",

    // Bulk data transfer
    PrepareData = 1500 => "CMD_PREPARE_DATA",
    Data = 1501 => "CMD_DATA",
    FreeData = 1502 => "CMD_FREE_DATA",
    DataWrrq = 1503 => "CMD_DATA_WRRQ",
    DataReady = 1504 => "CMD_DATA_RDY",

    // Database operations
    DbRrq = 7 => "CMD_DB_RRQ",
    UserWrq = 8 => "CMD_USER_WRQ",
    UserTempRrq = 9 => "CMD_USERTEMP_RRQ",
    UserTempWrq = 10 => "CMD_USERTEMP_WRQ",
    OptionsRrq = 11 => "CMD_OPTIONS_RRQ",
    OptionsWrq = 12 => "CMD_OPTIONS_WRQ",
    AttLogRrq = 13 => "CMD_ATTLOG_RRQ",
    ClearData = 14 => "CMD_CLEAR_DATA",
    ClearAttLog = 15 => "CMD_CLEAR_ATTLOG",
    DeleteUser = 18 => "CMD_DELETE_USER",
    DeleteUserTemp = 19 => "CMD_DELETE_USERTEMP",
    ClearAdmin = 20 => "CMD_CLEAR_ADMIN",

    // Group & timezone management
    UserGrpRrq = 21 => "CMD_USERGRP_RRQ",
    UserGrpWrq = 22 => "CMD_USERGRP_WRQ",
    UserTzRrq = 23 => "CMD_USERTZ_RRQ",
    UserTzWrq = 24 => "CMD_USERTZ_WRQ",
    GrpTzRrq = 25 => "CMD_GRPTZ_RRQ",
    GrpTzWrq = 26 => "CMD_GRPTZ_WRQ",
    TzRrq = 27 => "CMD_TZ_RRQ",
    TzWrq = 28 => "CMD_TZ_WRQ",
    UlgRrq = 29 => "CMD_ULG_RRQ",
    UlgWrq = 30 => "CMD_ULG_WRQ",
    Unlock = 31 => "CMD_UNLOCK",
    ClearAcc = 32 => "CMD_CLEAR_ACC",
    ClearOpLog = 33 => "CMD_CLEAR_OPLOG",
    OpLogRrq = 34 => "CMD_OPLOG_RRQ",

    // Device status
    GetFreeSizes = 50 => "CMD_GET_FREE_SIZES",
    EnableClock = 57 => "CMD_ENABLE_CLOCK",
    StartVerify = 60 => "CMD_STARTVERIFY",
    StartEnroll = 61 => "CMD_STARTENROLL",
    CancelCapture = 62 => "CMD_CANCELCAPTURE",
    StateRrq = 64 => "CMD_STATE_RRQ",
    WriteLcd = 66 => "CMD_WRITE_LCD",
    ClearLcd = 67 => "CMD_CLEAR_LCD",
    GetPinWidth = 69 => "CMD_GET_PINWIDTH",

    // SMS and user data
    SmsWrq = 70 => "CMD_SMS_WRQ",
    SmsRrq = 71 => "CMD_SMS_RRQ",
    DeleteSms = 72 => "CMD_DELETE_SMS",
    UDataWrq = 73 => "CMD_UDATA_WRQ",
    DeleteUData = 74 => "CMD_DELETE_UDATA",

    // Access control
    DoorStateRrq = 75 => "CMD_DOORSTATE_RRQ",
    WriteMifare = 76 => "CMD_WRITE_MIFARE",
    EmptyMifare = 78 => "CMD_EMPTY_MIFARE",
    VerifyWrq = 79 => "CMD_VERIFY_WRQ",
    VerifyRrq = 80 => "CMD_VERIFY_RRQ",

    // Fingerprint templates
    TmpWrite = 87 => "CMD_TMP_WRITE",
    ChecksumBuffer = 119 => "CMD_CHECKSUM_BUFFER",
    DelFpTmp = 134 => "CMD_DEL_FPTMP",

    // Time
    GetTime = 201 => "CMD_GET_TIME",
    SetTime = 202 => "CMD_SET_TIME",

    // Realtime events
    RegEvent = 500 => "CMD_REG_EVENT",

    // Replies
    AckOk = 2000 => "CMD_ACK_OK",
    AckError = 2001 => "CMD_ACK_ERROR",
    AckData = 2002 => "CMD_ACK_DATA",
    AckRetry = 2003 => "CMD_ACK_RETRY",
    AckRepeat = 2004 => "CMD_ACK_REPEAT",
    AckUnauth = 2005 => "CMD_ACK_UNAUTH",
    AckUnknown = 0xFFFF => "CMD_ACK_UNKNOWN",
    AckErrorCmd = 0xFFFD => "CMD_ACK_ERROR_CMD",
    AckErrorInit = 0xFFFC => "CMD_ACK_ERROR_INIT",
    AckErrorData = 0xFFFB => "CMD_ACK_ERROR_DATA",
}

impl Command {
    /// Raw 16-bit code
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Check if this is a request command (from client to terminal)
    pub fn is_request(self) -> bool {
        !self.is_response()
    }

    /// Check if this is a reply code (from terminal to client)
    pub fn is_response(self) -> bool {
        matches!(
            self,
            Self::AckOk
                | Self::AckError
                | Self::AckData
                | Self::AckRetry
                | Self::AckRepeat
                | Self::AckUnauth
                | Self::AckUnknown
                | Self::AckErrorCmd
                | Self::AckErrorInit
                | Self::AckErrorData
        )
    }

    /// Check if this is a success reply
    pub fn is_success(self) -> bool {
        matches!(self, Self::AckOk | Self::AckData)
    }

    /// Check if this is an error reply
    pub fn is_error(self) -> bool {
        matches!(
            self,
            Self::AckError | Self::AckErrorCmd | Self::AckErrorInit | Self::AckErrorData
        )
    }
}

impl From<Command> for u16 {
    fn from(cmd: Command) -> u16 {
        cmd as u16
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), *self as u16)
    }
}

/// Render a raw code for logs, naming it when it is a known command
pub fn describe(code: u16) -> String {
    match Command::try_from(code) {
        Ok(cmd) => cmd.to_string(),
        Err(_) => format!("UNKNOWN({})", code),
    }
}
