use serde::Serialize;

use crate::dto::SubjectGrade;

/// Shown in place of any grade the server did not send.
pub const PLACEHOLDER: &str = "--";

pub const GRADE_MIN: f64 = 0.0;
pub const GRADE_MAX: f64 = 20.0;

/// Weight of the exam grade against the class grade in a subject average.
pub const EXAM_WEIGHT: f64 = 2.0;

/// Averages the server and a local recomputation may disagree by before it
/// is worth a warning.
pub const AVERAGE_TOLERANCE: f64 = 0.01;

pub fn round_to(x: f64, places: i32) -> f64 {
    let f = 10f64.powi(places);
    (x * f).round() / f
}

pub fn format_grade(v: Option<f64>) -> String {
    match v {
        Some(v) if v.is_finite() => format!("{v:.2}"),
        _ => PLACEHOLDER.to_string(),
    }
}

/// `((classe + 2 * examen) / 3) * coefficient`, missing grades counting as 0.
pub fn subject_weighted_average(class_grade: Option<f64>, exam_grade: Option<f64>, coefficient: f64) -> f64 {
    let class_grade = class_grade.unwrap_or(0.0);
    let exam_grade = exam_grade.unwrap_or(0.0);
    let avg = ((class_grade + exam_grade * EXAM_WEIGHT) / (1.0 + EXAM_WEIGHT)) * coefficient;
    round_to(avg, 3)
}

pub fn general_average(notes: &[SubjectGrade]) -> f64 {
    let total_points: f64 = notes
        .iter()
        .map(|n| subject_weighted_average(n.classe_note, n.examen_note, n.coefficient))
        .sum();
    let total_coefficients: f64 = notes.iter().map(|n| n.coefficient).sum();
    if total_coefficients > 0.0 {
        round_to(total_points / total_coefficients, 3)
    } else {
        0.0
    }
}

pub fn is_valid_grade(v: f64) -> bool {
    v.is_finite() && (GRADE_MIN..=GRADE_MAX).contains(&v)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Appreciation {
    Excellent,
    VeryGood,
    Good,
    Passable,
    Insufficient,
}

impl Appreciation {
    pub fn for_average(avg: f64) -> Self {
        if avg >= 16.0 {
            Appreciation::Excellent
        } else if avg >= 14.0 {
            Appreciation::VeryGood
        } else if avg >= 12.0 {
            Appreciation::Good
        } else if avg >= 10.0 {
            Appreciation::Passable
        } else {
            Appreciation::Insufficient
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            Appreciation::Excellent => "Excellent travail, continuez ainsi.",
            Appreciation::VeryGood => "Très bon travail, vous êtes sur la bonne voie.",
            Appreciation::Good => "Bon travail, mais il y a encore des points à améliorer.",
            Appreciation::Passable => {
                "Travail passable, des efforts supplémentaires sont nécessaires."
            }
            Appreciation::Insufficient => "Insuffisant, il faut travailler beaucoup plus.",
        }
    }
}
