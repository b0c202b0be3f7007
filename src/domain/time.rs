use std::{fmt::Display, str::FromStr};

use chrono::{
    FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc,
};
use derive_more::{Deref, Display, Error, From};

/// ISO-8601 形式で入出力するローカル日時
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, From, Deref)]
pub struct IsoDateTime(NaiveDateTime);

impl IsoDateTime {
    pub fn now() -> Self {
        Self(Local::now().naive_local())
    }

    pub fn into_inner(self) -> NaiveDateTime {
        self.0
    }
}

/// 日時の書式エラー
#[derive(Error, Display, Debug, PartialEq, Eq)]
#[display(fmt = "Invalid ISO-8601 date-time: {}", _0)]
pub struct IsoDateTimeError(#[error(not(source))] String);

impl FromStr for IsoDateTime {
    type Err = IsoDateTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || IsoDateTimeError(s.to_owned());
        let date = s.get(..10).ok_or_else(err)?;
        let rest = s.get(10..).ok_or_else(err)?;
        let date = parse_date(date).ok_or_else(err)?;
        if rest.is_empty() {
            return date.and_hms_opt(0, 0, 0).map(Self).ok_or_else(err);
        }
        let rest = rest
            .strip_prefix('T')
            .or_else(|| rest.strip_prefix(' '))
            .ok_or_else(err)?;
        let (time, offset) = match rest.find(['Z', '+', '-']) {
            Some(at) => (&rest[..at], Some(&rest[at..])),
            None => (rest, None),
        };
        let naive = date.and_time(parse_time(time).ok_or_else(err)?);
        match offset {
            None => Ok(Self(naive)),
            Some(offset) => {
                let offset = parse_offset(offset).ok_or_else(err)?;
                let utc = naive - offset;
                Ok(Self(
                    Utc.from_utc_datetime(&utc)
                        .with_timezone(&Local)
                        .naive_local(),
                ))
            }
        }
    }
}

impl Display for IsoDateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let micros = self.0.nanosecond() / 1_000;
        if micros == 0 {
            write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%S"))
        } else {
            write!(f, "{}.{:06}", self.0.format("%Y-%m-%dT%H:%M:%S"), micros)
        }
    }
}

fn digits(s: &str, len: usize) -> Option<u32> {
    if s.len() == len && s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let mut parts = s.split('-');
    let year = digits(parts.next()?, 4)?;
    let month = digits(parts.next()?, 2)?;
    let day = digits(parts.next()?, 2)?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year as i32, month, day)
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    let mut parts = s.split(':');
    let hour = digits(parts.next()?, 2)?;
    let minute = parts.next().map(|m| digits(m, 2)).unwrap_or(Some(0))?;
    let (second, micro) = match parts.next() {
        None => (0, 0),
        Some(sec) => match sec.split_once('.') {
            None => (digits(sec, 2)?, 0),
            Some((sec, frac)) => (digits(sec, 2)?, parse_fraction(frac)?),
        },
    };
    if parts.next().is_some() {
        return None;
    }
    NaiveTime::from_hms_micro_opt(hour, minute, second, micro)
}

/// 小数秒をマイクロ秒に丸める (それ以下は切り捨て)
fn parse_fraction(s: &str) -> Option<u32> {
    if s.is_empty() || s.len() > 9 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let padded = format!("{:0<6}", &s[..s.len().min(6)]);
    padded.parse().ok()
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    if s == "Z" {
        return FixedOffset::east_opt(0);
    }
    let sign = match s.get(..1)? {
        "+" => 1,
        "-" => -1,
        _ => return None,
    };
    let (hours, minutes) = s.get(1..)?.split_once(':')?;
    let seconds = digits(hours, 2)? as i32 * 3600 + digits(minutes, 2)? as i32 * 60;
    FixedOffset::east_opt(sign * seconds)
}
