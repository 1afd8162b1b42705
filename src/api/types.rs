//! Domain records: timers, groups and consolidations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::{ApiError, Result};

/// Fields a client may never set on a timer.
const TIMER_READONLY: [&str; 4] = ["id", "group", "start", "end"];

/// A tracked span of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timer {
    pub id: String,
    pub group: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub hourly_price: f64,
    /// Anything else the client attached.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Timer {
    /// Build a fresh, running timer from client supplied fields.
    pub fn new(group: &str, fields: Map<String, Value>, now: DateTime<Utc>) -> Result<Self> {
        let mut timer = Timer {
            id: generate_id(now),
            group: group.to_string(),
            title: String::new(),
            start: now,
            end: None,
            hourly_price: 0.0,
            extra: Map::new(),
        };
        let has_title = fields.get("title").is_some_and(|v| !v.is_null());
        if !has_title {
            return Err(ApiError::MissingTitle);
        }
        timer.apply(fields)?;
        Ok(timer)
    }

    /// Merge client supplied fields into this timer. Read-only fields are ignored.
    pub fn apply(&mut self, fields: Map<String, Value>) -> Result<()> {
        for (key, value) in fields {
            if TIMER_READONLY.contains(&key.as_str()) {
                continue;
            }
            match key.as_str() {
                "title" => self.title = sanitize_title(value)?,
                "hourlyPrice" => self.hourly_price = parse_price(&value),
                _ => {
                    self.extra.insert(key, value);
                }
            }
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.end.is_none()
    }

    /// Elapsed milliseconds for a stopped timer.
    pub fn duration_ms(&self) -> Option<i64> {
        self.end.map(|end| (end - self.start).num_milliseconds())
    }
}

/// `<unix millis>:<uuid v4>`; lexical order follows creation time.
pub fn generate_id(now: DateTime<Utc>) -> String {
    format!("{}:{}", now.timestamp_millis(), uuid::Uuid::new_v4())
}

fn sanitize_title(value: Value) -> Result<String> {
    let title = match value {
        Value::String(s) => s,
        Value::Null => return Err(ApiError::MissingTitle),
        other => other.to_string(),
    };
    if title.is_empty() {
        return Err(ApiError::MissingTitle);
    }
    Ok(title)
}

/// Lenient number parsing: numbers pass, strings yield their leading float,
/// everything else is 0.
pub fn parse_price(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => leading_float(s.trim_start()),
        _ => None,
    };
    parsed.filter(|p| p.is_finite()).unwrap_or(0.0)
}

fn leading_float(s: &str) -> Option<f64> {
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;
    for (i, c) in s.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }
    if !seen_digit {
        return None;
    }
    let mantissa = s[..end].trim_end_matches('.');
    match exponent(&s[end..]) {
        Some(exp) => format!("{}e{}", mantissa, exp).parse().ok(),
        None => mantissa.parse().ok(),
    }
}

/// A leading `e`/`E` exponent with at least one digit, without the marker.
fn exponent(s: &str) -> Option<&str> {
    let rest = s.strip_prefix(['e', 'E'])?;
    let sign = usize::from(rest.starts_with(['+', '-']));
    let digits = rest[sign..].bytes().take_while(u8::is_ascii_digit).count();
    (digits > 0).then(|| &rest[..sign + digits])
}

/// A named collection of timers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Group {
    pub fn new(name: &str, fields: Map<String, Value>) -> Self {
        let mut group = Group {
            name: name.to_string(),
            extra: Map::new(),
        };
        group.apply(fields);
        group
    }

    /// Merge fields into the group; `name` is immutable.
    pub fn apply(&mut self, fields: Map<String, Value>) {
        for (key, value) in fields {
            if key != "name" {
                self.extra.insert(key, value);
            }
        }
    }
}

/// Aggregate over stopped timers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consolidation {
    /// Sum of durations in milliseconds.
    pub duration: i64,
    pub price: f64,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub count_timers: usize,
}

const MS_PER_HOUR: f64 = 1000.0 * 60.0 * 60.0;

impl Consolidation {
    /// Fold one timer into the aggregate. Running timers are skipped.
    pub fn add(&mut self, timer: &Timer) {
        let (Some(end), Some(duration)) = (timer.end, timer.duration_ms()) else {
            return;
        };
        self.duration += duration;
        self.price += timer.hourly_price * duration as f64 / MS_PER_HOUR;
        if self.start.map_or(true, |s| timer.start < s) {
            self.start = Some(timer.start);
        }
        if self.end.map_or(true, |e| end > e) {
            self.end = Some(end);
        }
        self.count_timers += 1;
    }
}

impl<'a> FromIterator<&'a Timer> for Consolidation {
    fn from_iter<I: IntoIterator<Item = &'a Timer>>(iter: I) -> Self {
        let mut consolidation = Consolidation::default();
        for timer in iter {
            consolidation.add(timer);
        }
        consolidation
    }
}
