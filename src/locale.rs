//! Thai calendar dates and document-type labels.
//!
//! All dates on the form are printed in the Buddhist era with Thai month
//! names. Document types arrive as free text typed by students, so the label
//! is normalized before it selects a form variant.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};

use crate::model::DocumentVariant;

/// Offset between the Gregorian and the Buddhist-era year.
pub const BUDDHIST_ERA_OFFSET: i32 = 543;

const THAI_MONTHS: [&str; 12] = [
    "มกราคม",
    "กุมภาพันธ์",
    "มีนาคม",
    "เมษายน",
    "พฤษภาคม",
    "มิถุนายน",
    "กรกฎาคม",
    "สิงหาคม",
    "กันยายน",
    "ตุลาคม",
    "พฤศจิกายน",
    "ธันวาคม",
];

/// Thailand does not observe daylight saving; UTC+7 all year.
const THAI_UTC_OFFSET_SECS: i32 = 7 * 3600;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalDate {
    pub day: u32,
    pub month_name: &'static str,
    pub year: i32,
}

impl LocalDate {
    /// What an unparseable date turns into: every sub-field prints blank.
    pub const BLANK: LocalDate = LocalDate {
        day: 0,
        month_name: "",
        year: 0,
    };

    pub fn from_naive(date: NaiveDate) -> Self {
        format_local_date(date.year(), date.month(), date.day())
    }

    pub fn is_blank(&self) -> bool {
        *self == Self::BLANK
    }

    pub fn day_text(&self) -> String {
        if self.day == 0 {
            String::new()
        } else {
            self.day.to_string()
        }
    }

    pub fn year_text(&self) -> String {
        if self.year == 0 {
            String::new()
        } else {
            self.year.to_string()
        }
    }
}

/// Convert a Gregorian day/month/year into its Thai representation.
///
/// `month` is 1-based. A month outside 1..=12 produces an empty month name.
/// Years near `i32::MAX` saturate instead of overflowing.
pub fn format_local_date(year: i32, month: u32, day: u32) -> LocalDate {
    let month_name = month
        .checked_sub(1)
        .and_then(|i| THAI_MONTHS.get(i as usize))
        .copied()
        .unwrap_or("");
    LocalDate {
        day,
        month_name,
        year: year.saturating_add(BUDDHIST_ERA_OFFSET),
    }
}

/// Parse an ISO `YYYY-MM-DD` birth date. Anything else is `LocalDate::BLANK`.
pub fn parse_birth_date(value: &str) -> LocalDate {
    match NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
        Ok(date) => LocalDate::from_naive(date),
        Err(e) => {
            log::debug!("birth date {value:?} not parseable ({e}), leaving blank");
            LocalDate::BLANK
        }
    }
}

/// The dated line under the address block, in Thailand's local time.
pub fn request_date_line(created_at: &DateTime<Utc>) -> String {
    let local = FixedOffset::east_opt(THAI_UTC_OFFSET_SECS)
        .map(|tz| created_at.with_timezone(&tz).date_naive())
        .unwrap_or_else(|| created_at.date_naive());
    let date = LocalDate::from_naive(local);
    format!(
        "วันที่ {}  เดือน {}  พ.ศ. {}",
        date.day, date.month_name, date.year
    )
}

fn thai_digit(ch: char) -> Option<char> {
    match ch {
        '๐'..='๙' => char::from_digit(ch as u32 - '๐' as u32, 10),
        _ => None,
    }
}

/// Strip period variants and whitespace and fold Thai digits to ASCII.
///
/// Idempotent: the output contains none of the characters it removes or maps.
pub fn normalize_label(label: &str) -> String {
    label
        .chars()
        .filter(|ch| !matches!(ch, '.' | '．' | '。' | 'ฯ') && !ch.is_whitespace())
        .map(|ch| thai_digit(ch).unwrap_or(ch))
        .collect()
}

/// Any label that mentions ปพ.7 (in whatever spelling) asks for the
/// certificate; everything else, including an empty label, is a transcript.
pub fn normalize_document_type(label: &str) -> DocumentVariant {
    if normalize_label(label).contains("ปพ7") {
        DocumentVariant::CertificateRequest
    } else {
        DocumentVariant::StandardTranscriptRequest
    }
}
