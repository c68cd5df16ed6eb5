use chrono::NaiveDate;
use serde::Serialize;

use crate::dto::ExamMeta;

/// Wire format of `/api/examens/{id}/` dates (`strftime("%d-%m-%y")`).
pub const EXAM_DATE_FORMAT: &str = "%d-%m-%y";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DateParseError {
    #[error("missing {field}")]
    Missing { field: &'static str },
    #[error("{field} '{value}' is not a DD-MM-YY date")]
    Malformed { field: &'static str, value: String },
}

/// Strict `DD-MM-YY` parse. Anything else (ISO dates, four digit years,
/// out of range days) is an error rather than a best-effort guess.
pub fn parse_exam_date(field: &'static str, raw: Option<&str>) -> Result<NaiveDate, DateParseError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Err(DateParseError::Missing { field });
    };
    let malformed = || DateParseError::Malformed {
        field,
        value: raw.to_string(),
    };
    // chrono accepts single digit fields for %d/%m/%y; the wire always pads.
    let shape_ok = raw.len() == 8
        && raw
            .char_indices()
            .all(|(i, c)| if i == 2 || i == 5 { c == '-' } else { c.is_ascii_digit() });
    if !shape_ok {
        return Err(malformed());
    }
    NaiveDate::parse_from_str(raw, EXAM_DATE_FORMAT).map_err(|_| malformed())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExamWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub period_active: bool,
    pub period_closed: bool,
}

impl ExamWindow {
    pub fn from_meta(meta: &ExamMeta) -> Result<Self, DateParseError> {
        Ok(Self {
            start: parse_exam_date("date", meta.date.as_deref())?,
            end: parse_exam_date("date_fin", meta.date_fin.as_deref())?,
            period_active: meta.periode_active,
            period_closed: meta.periode_cloture,
        })
    }
}

pub fn is_entry_allowed(exam: &ExamWindow, today: NaiveDate) -> bool {
    exam.period_active && !exam.period_closed && exam.start <= today && today <= exam.end
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum BlockReason {
    NoExam,
    ExamUnavailable { detail: String },
    InvalidDate { detail: String },
    PeriodInactive,
    PeriodClosed,
    NotStarted { start: NaiveDate },
    Ended { end: NaiveDate },
}

impl BlockReason {
    pub fn message(&self) -> String {
        match self {
            BlockReason::NoExam => "Veuillez sélectionner un examen.".to_string(),
            BlockReason::ExamUnavailable { .. } => {
                "Impossible de vérifier l'examen, la saisie est bloquée.".to_string()
            }
            BlockReason::InvalidDate { detail } => {
                format!("Dates de l'examen invalides ({detail}), la saisie est bloquée.")
            }
            BlockReason::PeriodInactive => "La période de l'examen n'est pas active.".to_string(),
            BlockReason::PeriodClosed => {
                "La période est clôturée, la saisie des notes est impossible.".to_string()
            }
            BlockReason::NotStarted { start } => format!(
                "Hors de la période de l'examen : la saisie ouvre le {}.",
                start.format("%d/%m/%Y")
            ),
            BlockReason::Ended { end } => format!(
                "Hors de la période de l'examen : la saisie a fermé le {}.",
                end.format("%d/%m/%Y")
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validity {
    pub allowed: bool,
    pub reason: Option<BlockReason>,
    pub status: Option<String>,
}

impl Validity {
    pub fn blocked(reason: BlockReason) -> Self {
        Self {
            allowed: false,
            reason: Some(reason),
            status: None,
        }
    }

    pub fn message(&self) -> Option<String> {
        self.reason.as_ref().map(BlockReason::message)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "allowed": self.allowed,
            "reason": self.reason,
            "message": self.message(),
            "status": self.status,
        })
    }
}

impl Default for Validity {
    fn default() -> Self {
        Self::blocked(BlockReason::NoExam)
    }
}

/// Full evaluation including the reason entry is blocked. Agrees with
/// [`is_entry_allowed`] on the boolean outcome for every parseable exam.
pub fn evaluate(meta: Option<&ExamMeta>, today: NaiveDate) -> Validity {
    let Some(meta) = meta else {
        return Validity::blocked(BlockReason::NoExam);
    };
    let status = meta.validite.clone();
    let window = match ExamWindow::from_meta(meta) {
        Ok(w) => w,
        Err(e) => {
            return Validity {
                status,
                ..Validity::blocked(BlockReason::InvalidDate {
                    detail: e.to_string(),
                })
            }
        }
    };

    let reason = if window.period_closed {
        Some(BlockReason::PeriodClosed)
    } else if !window.period_active {
        Some(BlockReason::PeriodInactive)
    } else if today < window.start {
        Some(BlockReason::NotStarted {
            start: window.start,
        })
    } else if today > window.end {
        Some(BlockReason::Ended { end: window.end })
    } else {
        None
    };
    debug_assert_eq!(reason.is_none(), is_entry_allowed(&window, today));

    Validity {
        allowed: reason.is_none(),
        reason,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).expect("valid date")
    }

    fn meta(start: &str, end: &str, active: bool, closed: bool) -> ExamMeta {
        ExamMeta {
            date: Some(start.to_string()),
            date_fin: Some(end.to_string()),
            periode_active: active,
            periode_cloture: closed,
            validite: Some("EN_COURS".to_string()),
        }
    }

    #[test]
    fn parses_two_digit_year_wire_dates() {
        assert_eq!(parse_exam_date("date", Some("10-05-25")), Ok(d(2025, 5, 10)));
        assert_eq!(parse_exam_date("date", Some("31-12-99")), Ok(d(1999, 12, 31)));
    }

    #[test]
    fn rejects_other_date_shapes() {
        for raw in ["2025-05-10", "10/05/25", "1-5-25", "32-01-25", "29-02-25", "10-05-2025"] {
            assert!(
                matches!(
                    parse_exam_date("date", Some(raw)),
                    Err(DateParseError::Malformed { .. })
                ),
                "{raw} should be rejected"
            );
        }
        assert_eq!(
            parse_exam_date("date_fin", Some("  ")),
            Err(DateParseError::Missing { field: "date_fin" })
        );
    }

    #[test]
    fn inside_window_is_allowed() {
        let v = evaluate(Some(&meta("10-05-25", "15-05-25", true, false)), d(2025, 5, 11));
        assert!(v.allowed);
        assert_eq!(v.reason, None);
        assert_eq!(v.status.as_deref(), Some("EN_COURS"));
    }

    #[test]
    fn boundaries_are_inclusive() {
        let m = meta("10-05-25", "15-05-25", true, false);
        assert!(evaluate(Some(&m), d(2025, 5, 10)).allowed);
        assert!(evaluate(Some(&m), d(2025, 5, 15)).allowed);
    }

    #[test]
    fn day_after_end_is_out_of_window() {
        let v = evaluate(Some(&meta("10-05-25", "15-05-25", true, false)), d(2025, 5, 16));
        assert!(!v.allowed);
        assert_eq!(v.reason, Some(BlockReason::Ended { end: d(2025, 5, 15) }));
        assert!(v.message().expect("message").contains("Hors de la période"));

        let before = evaluate(Some(&meta("10-05-25", "15-05-25", true, false)), d(2025, 5, 9));
        assert!(matches!(before.reason, Some(BlockReason::NotStarted { .. })));
    }

    #[test]
    fn period_flags_block_regardless_of_dates() {
        let today = d(2025, 5, 12);
        for (active, closed) in [(false, false), (true, true), (false, true)] {
            let m = meta("10-05-25", "15-05-25", active, closed);
            let v = evaluate(Some(&m), today);
            assert!(!v.allowed, "active={active} closed={closed}");
            let w = ExamWindow::from_meta(&m).expect("window");
            assert!(!is_entry_allowed(&w, today));
        }
        let closed = evaluate(Some(&meta("10-05-25", "15-05-25", true, true)), today);
        assert_eq!(closed.reason, Some(BlockReason::PeriodClosed));
    }

    #[test]
    fn malformed_or_missing_dates_fail_closed() {
        let v = evaluate(Some(&meta("2025-05-10", "15-05-25", true, false)), d(2025, 5, 12));
        assert!(!v.allowed);
        assert!(matches!(v.reason, Some(BlockReason::InvalidDate { .. })));

        let mut missing = meta("10-05-25", "15-05-25", true, false);
        missing.date_fin = None;
        assert!(!evaluate(Some(&missing), d(2025, 5, 12)).allowed);
    }

    #[test]
    fn no_exam_is_blocked() {
        let v = evaluate(None, d(2025, 5, 12));
        assert_eq!(v, Validity::default());
        let json = v.to_json();
        assert_eq!(json["reason"]["code"], "no_exam");
        assert_eq!(json["allowed"], false);
    }
}
