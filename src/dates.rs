use chrono::{DateTime, Days, FixedOffset, NaiveDate, Offset, Utc};

/// Source of "now". Injected so history classification can be pinned in tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Offset of the operator's calendar.
    fn offset(&self) -> FixedOffset {
        Utc.fix()
    }

    /// Calendar date in the operator's offset.
    fn today(&self) -> NaiveDate {
        self.now().with_timezone(&self.offset()).date_naive()
    }
}

pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}

/// Parses `+05:30`, `-08:00` or `+7`.
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    let (sign, rest) = if let Some(rest) = raw.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = raw.strip_prefix('-') {
        (-1, rest)
    } else {
        return None;
    };
    let (hours, minutes) = rest.split_once(':').unwrap_or((rest, "0"));
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if !(0..60).contains(&minutes) || !(0..=14).contains(&hours) {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn on(date: NaiveDate) -> Self {
        Self(date.and_hms_opt(12, 0, 0).unwrap_or_default().and_utc())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Accepts `YYYY-MM-DD` or an RFC3339 timestamp (the portal sends both).
pub fn parse_wire_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).date_naive())
    })
}

/// Last day of a stay that starts on `start` and lasts `weeks` weeks.
/// `None` for a zero-length period.
pub fn end_date_for(start: NaiveDate, weeks: u32) -> Option<NaiveDate> {
    if weeks == 0 {
        return None;
    }
    start.checked_add_days(Days::new(u64::from(weeks) * 7 - 1))
}

pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// "2 weeks and 3 days", zero parts omitted.
pub fn format_duration(start: NaiveDate, end: NaiveDate) -> String {
    let total = inclusive_days(start, end);
    if total <= 0 {
        return "0 days".to_string();
    }

    let weeks = total / 7;
    let days = total % 7;

    let mut parts = Vec::new();
    if weeks > 0 {
        parts.push(plural(weeks, "week"));
    }
    if days > 0 {
        parts.push(plural(days, "day"));
    }
    parts.join(" and ")
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{} {}", n, unit)
    } else {
        format!("{} {}s", n, unit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFormat {
    /// `M/D/YYYY`
    #[default]
    Locale,
    /// `dd/mm/yyyy`
    DayMonthYear,
}

pub fn format_date(value: Option<NaiveDate>, mode: DateFormat) -> String {
    match value {
        None => "N/A".to_string(),
        Some(date) => match mode {
            DateFormat::Locale => date.format("%-m/%-d/%Y").to_string(),
            DateFormat::DayMonthYear => date.format("%d/%m/%Y").to_string(),
        },
    }
}

/// Serde adapter for portal dates: lenient on input, `YYYY-MM-DD` on output.
pub mod wire_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&date.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => super::parse_wire_date(&s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", s))),
        }
    }
}

/// Portal records: an unparsable date decodes to `None` with a warning so one
/// bad record cannot fail a whole list.
pub mod lenient_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;
    use tracing::warn;

    pub use super::wire_date::serialize;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Value>::deserialize(deserializer)?;
        Ok(match raw {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => {
                let parsed = super::parse_wire_date(&s);
                if parsed.is_none() {
                    warn!("Ignoring unparsable portal date: {}", s);
                }
                parsed
            }
            Some(other) => {
                warn!("Ignoring non-string portal date: {}", other);
                None
            }
        })
    }
}
