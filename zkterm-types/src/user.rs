//! User records and fingerprint templates

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::access::MAX_TIME_ZONES;
use crate::error::{Error, Result, ascii_field, ensure_len, put_ascii_field};

/// Size of one user entry, in the users dataset and in `CMD_USER_WRQ`
pub const USER_RECORD_SIZE: usize = 72;

/// Bytes preceding the entries of a dataset (total size + padding)
pub const DATASET_HEADER_SIZE: usize = 4;

/// Header preceding each template in the templates dataset
const TEMPLATE_HEADER_SIZE: usize = 6;

const PASSWORD_FIELD: std::ops::Range<usize> = 3..11;
const NAME_FIELD: std::ops::Range<usize> = 11..35;
const USER_ID_FIELD: std::ops::Range<usize> = 48..57;

/// Privilege level stored in the upper bits of the permission byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Privilege {
    #[default]
    User,
    Enroller,
    Admin,
    SuperAdmin,
    Other(u8),
}

impl From<u8> for Privilege {
    fn from(level: u8) -> Self {
        match level {
            0 => Self::User,
            1 => Self::Enroller,
            3 => Self::Admin,
            7 => Self::SuperAdmin,
            n => Self::Other(n),
        }
    }
}

impl From<Privilege> for u8 {
    fn from(privilege: Privilege) -> Self {
        match privilege {
            Privilege::User => 0,
            Privilege::Enroller => 1,
            Privilege::Admin => 3,
            Privilege::SuperAdmin => 7,
            Privilege::Other(n) => n,
        }
    }
}

/// One user entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Internal index the terminal addresses the user by
    pub user_sn: u16,

    /// Visible user id, up to 9 ASCII characters
    pub user_id: String,

    pub name: String,

    /// Up to 8 characters; empty when unset
    pub password: String,

    pub card_number: u32,

    pub privilege: Privilege,

    pub enabled: bool,

    pub group: u8,

    /// Personal time zones; empty to follow the group
    pub time_zones: Vec<u16>,
}

impl User {
    pub fn new(user_sn: u16, user_id: impl Into<String>) -> Self {
        Self {
            user_sn,
            user_id: user_id.into(),
            name: String::new(),
            password: String::new(),
            card_number: 0,
            privilege: Privilege::User,
            enabled: true,
            group: 1,
            time_zones: Vec::new(),
        }
    }

    /// Decode a single 72-byte entry
    pub fn parse(entry: &[u8]) -> Result<Self> {
        ensure_len("user record", entry, USER_RECORD_SIZE)?;

        let permission = entry[2];
        let password = if entry[PASSWORD_FIELD.start] != 0 {
            ascii_field(&entry[PASSWORD_FIELD])
        } else {
            String::new()
        };

        let time_zones = if u16::from_le_bytes([entry[40], entry[41]]) == 1 {
            (0..MAX_TIME_ZONES)
                .map(|n| u16::from_le_bytes([entry[42 + 2 * n], entry[43 + 2 * n]]))
                .collect()
        } else {
            Vec::new()
        };

        Ok(Self {
            user_sn: u16::from_le_bytes([entry[0], entry[1]]),
            user_id: ascii_field(&entry[USER_ID_FIELD]),
            name: ascii_field(&entry[NAME_FIELD]),
            password,
            card_number: u32::from_le_bytes([entry[35], entry[36], entry[37], entry[38]]),
            privilege: Privilege::from(permission >> 1),
            enabled: permission & 1 == 0,
            group: entry[39],
            time_zones,
        })
    }

    /// Encode as a 72-byte entry for `CMD_USER_WRQ`
    pub fn encode(&self) -> Result<Bytes> {
        if self.time_zones.len() > MAX_TIME_ZONES {
            return Err(Error::Validation(format!(
                "user {} has {} time zones, at most {} allowed",
                self.user_id,
                self.time_zones.len(),
                MAX_TIME_ZONES
            )));
        }

        let mut entry = [0u8; USER_RECORD_SIZE];
        entry[0..2].copy_from_slice(&self.user_sn.to_le_bytes());
        entry[2] = (u8::from(self.privilege) << 1) | u8::from(!self.enabled);
        put_ascii_field(&mut entry[PASSWORD_FIELD], "password", &self.password)?;
        put_ascii_field(&mut entry[NAME_FIELD], "name", &self.name)?;
        entry[35..39].copy_from_slice(&self.card_number.to_le_bytes());
        entry[39] = self.group;

        if !self.time_zones.is_empty() {
            entry[40] = 1;
            for (n, tz) in self.time_zones.iter().enumerate() {
                entry[42 + 2 * n..44 + 2 * n].copy_from_slice(&tz.to_le_bytes());
            }
        }

        put_ascii_field(&mut entry[USER_ID_FIELD], "user id", &self.user_id)?;

        Ok(Bytes::copy_from_slice(&entry))
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "User[#{} id={} name={:?}]", self.user_sn, self.user_id, self.name)
    }
}

/// Strip the dataset header; an empty dataset has none
pub(crate) fn dataset_body<'a>(what: &'static str, dataset: &'a [u8]) -> Result<&'a [u8]> {
    if dataset.is_empty() {
        return Ok(dataset);
    }
    ensure_len(what, dataset, DATASET_HEADER_SIZE)?;
    Ok(&dataset[DATASET_HEADER_SIZE..])
}

/// Decode the users dataset
pub fn parse_users(dataset: &[u8]) -> Result<Vec<User>> {
    let body = dataset_body("users dataset", dataset)?;
    if body.len() % USER_RECORD_SIZE != 0 {
        return Err(Error::Parse(format!(
            "users dataset body of {} bytes is not a whole number of {}-byte records",
            body.len(),
            USER_RECORD_SIZE
        )));
    }

    body.chunks_exact(USER_RECORD_SIZE).map(User::parse).collect()
}

/// Fingerprint template stored for a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerprintTemplate {
    pub user_sn: u16,

    /// Finger index, 0..=9
    pub finger_index: u8,

    /// 1 = valid, 3 = duress
    pub flag: u8,

    pub template: Bytes,
}

impl FingerprintTemplate {
    /// `CMD_TMP_WRITE` request payload
    pub fn write_request(&self) -> Result<Bytes> {
        let size = u16::try_from(self.template.len()).map_err(|_| {
            Error::Validation(format!(
                "template of {} bytes exceeds the 16-bit size field",
                self.template.len()
            ))
        })?;

        let mut buf = BytesMut::with_capacity(6);
        buf.put_u16_le(self.user_sn);
        buf.put_u8(self.finger_index);
        buf.put_u8(self.flag);
        buf.put_u16_le(size);
        Ok(buf.freeze())
    }
}

/// Decode the fingerprint templates dataset
///
/// Each entry is `size u16 | user_sn u16 | finger u8 | flag u8 | template`,
/// where `size` counts the 6-byte header.
pub fn parse_templates(dataset: &[u8]) -> Result<Vec<FingerprintTemplate>> {
    let mut body = dataset_body("templates dataset", dataset)?;
    let mut templates = Vec::new();

    while !body.is_empty() {
        ensure_len("template header", body, TEMPLATE_HEADER_SIZE)?;
        let size = u16::from_le_bytes([body[0], body[1]]) as usize;
        if size < TEMPLATE_HEADER_SIZE {
            return Err(Error::Parse(format!("template entry claims {} bytes", size)));
        }
        ensure_len("template", body, size)?;

        templates.push(FingerprintTemplate {
            user_sn: u16::from_le_bytes([body[2], body[3]]),
            finger_index: body[4],
            flag: body[5],
            template: Bytes::copy_from_slice(&body[TEMPLATE_HEADER_SIZE..size]),
        });
        body = &body[size..];
    }

    Ok(templates)
}
