//! Access-control records
//!
//! Weekly time zones, groups, unlock combinations and per-user time zone
//! overrides. Each type knows its own request/reply layout; the command
//! group in the client crate only moves the bytes.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Error, Result, ensure_len};

/// Time zones a group or user can reference
pub const MAX_TIME_ZONES: usize = 3;

/// Groups an unlock combination can hold
pub const MAX_COMBINATION_GROUPS: usize = 5;

const DAYS_PER_WEEK: usize = 7;

/// Offset of the first day window in a time zone reply
const TZ_REPLY_OFFSET: usize = 2;

const HOLIDAY_FLAG: u8 = 0x80;
const STYLE_MASK: u8 = 0x0F;

/// Open window for a single day, `HH:MM` to `HH:MM`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayWindow {
    pub start_hour: u8,
    pub start_minute: u8,
    pub end_hour: u8,
    pub end_minute: u8,
}

impl DayWindow {
    pub const fn new(start_hour: u8, start_minute: u8, end_hour: u8, end_minute: u8) -> Self {
        Self {
            start_hour,
            start_minute,
            end_hour,
            end_minute,
        }
    }

    /// Whole day, `00:00` to `23:59`
    pub const fn all_day() -> Self {
        Self::new(0, 0, 23, 59)
    }

    fn to_bytes(self) -> [u8; 4] {
        [
            self.start_hour,
            self.start_minute,
            self.end_hour,
            self.end_minute,
        ]
    }
}

/// Weekly time zone, Sunday first
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeZone {
    pub days: [DayWindow; DAYS_PER_WEEK],
}

impl TimeZone {
    pub fn new(days: [DayWindow; DAYS_PER_WEEK]) -> Self {
        Self { days }
    }

    /// Parse a `CMD_TZ_RRQ` reply payload
    pub fn parse(payload: &[u8]) -> Result<Self> {
        ensure_len(
            "time zone",
            payload,
            TZ_REPLY_OFFSET + DAYS_PER_WEEK * 4,
        )?;

        let mut days = [DayWindow::default(); DAYS_PER_WEEK];
        for (day, window) in payload[TZ_REPLY_OFFSET..]
            .chunks_exact(4)
            .zip(days.iter_mut())
        {
            *window = DayWindow::new(day[0], day[1], day[2], day[3]);
        }

        Ok(Self { days })
    }

    /// `CMD_TZ_RRQ` request payload
    pub fn read_request(tz_no: u32) -> Bytes {
        Bytes::copy_from_slice(&tz_no.to_le_bytes())
    }

    /// `CMD_TZ_WRQ` request payload
    pub fn write_request(&self, tz_no: u32) -> Bytes {
        let mut buf = BytesMut::with_capacity(4 + DAYS_PER_WEEK * 4);
        buf.put_u32_le(tz_no);
        for day in &self.days {
            buf.put_slice(&day.to_bytes());
        }
        buf.freeze()
    }
}

/// Group parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupInfo {
    pub group: u8,

    /// Referenced time zones, at most three, zero slots omitted
    pub time_zones: Vec<u16>,

    /// Verification style, low nibble
    pub verify_style: u8,

    /// Group stays valid on holidays
    pub holidays: bool,
}

impl GroupInfo {
    /// `CMD_GRPTZ_RRQ` request payload
    pub fn read_request(group: u8) -> Bytes {
        let mut req = [0u8; 8];
        req[0] = group;
        Bytes::copy_from_slice(&req)
    }

    /// Parse a `CMD_GRPTZ_RRQ` reply payload
    pub fn parse(group: u8, payload: &[u8]) -> Result<Self> {
        ensure_len("group info", payload, 8)?;

        let time_zones = (0..MAX_TIME_ZONES)
            .map(|n| u16::from_le_bytes([payload[1 + 2 * n], payload[2 + 2 * n]]))
            .filter(|&tz| tz != 0)
            .collect();

        Ok(Self {
            group,
            time_zones,
            verify_style: payload[7] & STYLE_MASK,
            holidays: payload[7] & HOLIDAY_FLAG != 0,
        })
    }

    /// `CMD_GRPTZ_WRQ` request payload
    pub fn write_request(&self) -> Result<Bytes> {
        if self.time_zones.len() > MAX_TIME_ZONES {
            return Err(Error::Validation(format!(
                "group {} references {} time zones, at most {} allowed",
                self.group,
                self.time_zones.len(),
                MAX_TIME_ZONES
            )));
        }
        if self.verify_style > STYLE_MASK {
            return Err(Error::Validation(format!(
                "verify style {} does not fit in four bits",
                self.verify_style
            )));
        }

        let mut req = [0u8; 8];
        req[0] = self.group;
        for (n, tz) in self.time_zones.iter().enumerate() {
            req[1 + 2 * n..3 + 2 * n].copy_from_slice(&tz.to_le_bytes());
        }
        req[7] = self.verify_style | if self.holidays { HOLIDAY_FLAG } else { 0 };

        Ok(Bytes::copy_from_slice(&req))
    }
}

/// Groups that must verify together to unlock
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnlockCombination {
    pub number: u8,
    pub groups: Vec<u8>,
}

impl UnlockCombination {
    /// `CMD_ULG_RRQ` request payload
    pub fn read_request(number: u8) -> Bytes {
        let mut req = [0u8; 9];
        req[0] = number;
        Bytes::copy_from_slice(&req)
    }

    /// Parse a `CMD_ULG_RRQ` reply payload
    pub fn parse(number: u8, payload: &[u8]) -> Result<Self> {
        ensure_len("unlock combination", payload, 8)?;

        let count = u16::from_le_bytes([payload[6], payload[7]]) as usize;
        if count > MAX_COMBINATION_GROUPS {
            return Err(Error::Parse(format!(
                "unlock combination {} claims {} groups",
                number, count
            )));
        }

        Ok(Self {
            number,
            groups: payload[1..1 + count].to_vec(),
        })
    }

    /// `CMD_ULG_WRQ` request payload
    pub fn write_request(&self) -> Result<Bytes> {
        if self.groups.len() > MAX_COMBINATION_GROUPS {
            return Err(Error::Validation(format!(
                "unlock combination {} lists {} groups, at most {} allowed",
                self.number,
                self.groups.len(),
                MAX_COMBINATION_GROUPS
            )));
        }

        let mut req = [0u8; 8];
        req[0] = self.number;
        req[1..1 + self.groups.len()].copy_from_slice(&self.groups);
        req[6..8].copy_from_slice(&(self.groups.len() as u16).to_le_bytes());

        Ok(Bytes::copy_from_slice(&req))
    }
}

/// Per-user time zone override
///
/// An empty list means the user follows its group's time zones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserTimeZones {
    pub time_zones: Vec<u16>,
}

impl UserTimeZones {
    pub fn uses_group(&self) -> bool {
        self.time_zones.is_empty()
    }

    /// `CMD_USERTZ_RRQ` request payload
    pub fn read_request(user_sn: u32) -> Bytes {
        Bytes::copy_from_slice(&user_sn.to_le_bytes())
    }

    /// Parse a `CMD_USERTZ_RRQ` reply payload
    pub fn parse(payload: &[u8]) -> Result<Self> {
        ensure_len("user time zones", payload, 1)?;
        if payload[0] == 0 {
            return Ok(Self::default());
        }

        ensure_len("user time zones", payload, 2 + 2 * MAX_TIME_ZONES)?;
        let time_zones = (0..MAX_TIME_ZONES)
            .map(|n| u16::from_le_bytes([payload[2 + 2 * n], payload[3 + 2 * n]]))
            .filter(|&tz| tz != 0)
            .collect();

        Ok(Self { time_zones })
    }

    /// `CMD_USERTZ_WRQ` request payload
    pub fn write_request(&self, user_sn: u32) -> Result<Bytes> {
        if self.time_zones.len() > MAX_TIME_ZONES {
            return Err(Error::Validation(format!(
                "{} user time zones, at most {} allowed",
                self.time_zones.len(),
                MAX_TIME_ZONES
            )));
        }

        let mut buf = BytesMut::with_capacity(20);
        buf.put_u32_le(user_sn);
        buf.put_u32_le(u32::from(!self.uses_group()));
        for n in 0..MAX_TIME_ZONES {
            buf.put_u32_le(self.time_zones.get(n).copied().map(u32::from).unwrap_or(0));
        }

        Ok(buf.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_time_zone_parse() {
        let mut payload = vec![0xAA, 0xBB];
        for day in 0..7u8 {
            payload.extend_from_slice(&[8, day, 17, 30]);
        }

        let tz = TimeZone::parse(&payload).unwrap();
        assert_eq!(tz.days[0], DayWindow::new(8, 0, 17, 30));
        assert_eq!(tz.days[6], DayWindow::new(8, 6, 17, 30));

        assert!(TimeZone::parse(&payload[..20]).is_err());
    }

    #[test]
    fn test_time_zone_write_request() {
        let tz = TimeZone::new([DayWindow::all_day(); 7]);
        let req = tz.write_request(3);

        assert_eq!(req.len(), 32);
        assert_eq!(&req[..4], &[3, 0, 0, 0]);
        assert_eq!(&req[4..8], &[0, 0, 23, 59]);
        assert_eq!(&req[28..32], &[0, 0, 23, 59]);
    }

    #[test]
    fn test_group_parse() {
        let payload = [2, 1, 0, 0, 0, 7, 0, 0x80 | 0x03];
        let info = GroupInfo::parse(2, &payload).unwrap();

        assert_eq!(
            info,
            GroupInfo {
                group: 2,
                time_zones: vec![1, 7],
                verify_style: 3,
                holidays: true,
            }
        );
    }

    #[test]
    fn test_group_write_request() {
        let info = GroupInfo {
            group: 4,
            time_zones: vec![1, 2],
            verify_style: 1,
            holidays: false,
        };
        assert_eq!(
            info.write_request().unwrap().as_ref(),
            &[4, 1, 0, 2, 0, 0, 0, 1]
        );

        let too_many = GroupInfo {
            time_zones: vec![1, 2, 3, 4],
            ..info
        };
        assert!(too_many.write_request().is_err());
    }

    #[test]
    fn test_unlock_combination() {
        let comb = UnlockCombination {
            number: 1,
            groups: vec![2, 5],
        };
        let req = comb.write_request().unwrap();
        assert_eq!(req.as_ref(), &[1, 2, 5, 0, 0, 0, 2, 0]);

        assert_eq!(UnlockCombination::parse(1, &req).unwrap(), comb);
        assert_eq!(UnlockCombination::read_request(1).len(), 9);
    }

    #[test]
    fn test_unlock_combination_bad_count() {
        let reply = [1, 2, 5, 0, 0, 0, 9, 0];
        assert!(UnlockCombination::parse(1, &reply).is_err());
    }

    #[test]
    fn test_user_time_zones() {
        assert!(UserTimeZones::parse(&[0, 0, 1, 0]).unwrap().uses_group());

        let parsed = UserTimeZones::parse(&[1, 0, 3, 0, 0, 0, 9, 0]).unwrap();
        assert_eq!(parsed.time_zones, vec![3, 9]);

        let req = parsed.write_request(42).unwrap();
        assert_eq!(req.len(), 20);
        assert_eq!(&req[..4], &[42, 0, 0, 0]);
        assert_eq!(&req[4..8], &[1, 0, 0, 0]);
        assert_eq!(&req[8..12], &[3, 0, 0, 0]);
        assert_eq!(&req[12..16], &[9, 0, 0, 0]);
        assert_eq!(&req[16..20], &[0, 0, 0, 0]);

        let group = UserTimeZones::default().write_request(42).unwrap();
        assert_eq!(&group[4..8], &[0, 0, 0, 0]);
    }
}
