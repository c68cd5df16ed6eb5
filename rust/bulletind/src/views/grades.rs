use serde::Serialize;
use std::collections::BTreeSet;

use crate::calc::{format_grade, is_valid_grade, GRADE_MAX, GRADE_MIN};
use crate::dto::GradeEntryStudent;
use crate::exam::Validity;

pub const INPUT_CLASS: &str = "note-input border rounded p-1 w-20";
pub const INPUT_DISABLED_CLASS: &str = "note-input border rounded p-1 w-20 bg-gray-100 cursor-not-allowed";
pub const INPUT_INVALID_CLASS: &str = "note-input border rounded p-1 w-20 border-red-500";

pub const LOAD_FAILED_MESSAGE: &str =
    "Erreur de chargement des élèves. Vérifiez la connexion puis réessayez.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GradeKind {
    Class,
    Exam,
}

impl GradeKind {
    fn prefix(self) -> &'static str {
        match self {
            GradeKind::Class => "note_classe_",
            GradeKind::Exam => "note_examen_",
        }
    }

    pub fn field_name(self, student_id: &str) -> String {
        format!("{}{}", self.prefix(), student_id)
    }

    pub fn parse_field(name: &str) -> Option<(GradeKind, &str)> {
        [GradeKind::Class, GradeKind::Exam].into_iter().find_map(|k| {
            name.strip_prefix(k.prefix())
                .filter(|id| !id.is_empty())
                .map(|id| (k, id))
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeInput {
    pub name: String,
    pub value: String,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub disabled: bool,
    pub invalid: bool,
    pub class_name: &'static str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeRowView {
    pub student_id: String,
    pub name: String,
    pub class_grade: GradeInput,
    pub exam_grade: GradeInput,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeEntryView {
    pub class_id: Option<String>,
    pub subject_id: Option<String>,
    pub exam_id: Option<String>,
    pub loaded: bool,
    pub rows: Vec<GradeRowView>,
    pub validity: serde_json::Value,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub class_id: Option<String>,
    pub subject_id: Option<String>,
    pub exam_id: Option<String>,
}

impl Selection {
    /// All three ids, or `None` when the table cannot be loaded yet.
    pub fn complete(&self) -> Option<(&str, &str, &str)> {
        Some((
            self.class_id.as_deref()?,
            self.subject_id.as_deref()?,
            self.exam_id.as_deref()?,
        ))
    }
}

#[derive(Debug, Default)]
pub struct GradeEntryState {
    pub selection: Selection,
    rows: Vec<GradeEntryStudent>,
    loaded: bool,
    validity: Validity,
    load_error: Option<String>,
    invalid: BTreeSet<String>,
}

impl GradeEntryState {
    pub fn replace_rows(&mut self, rows: Vec<GradeEntryStudent>) {
        self.rows = rows;
        self.loaded = true;
        self.load_error = None;
        self.invalid.clear();
    }

    pub fn clear_rows(&mut self) {
        self.rows.clear();
        self.loaded = false;
        self.load_error = None;
        self.invalid.clear();
    }

    /// Keeps the current rows on screen but locks them.
    pub fn load_failed(&mut self, message: &str) {
        self.load_error = Some(message.to_string());
        self.invalid.clear();
    }

    pub fn set_validity(&mut self, validity: Validity) {
        self.validity = validity;
    }

    pub fn validity(&self) -> &Validity {
        &self.validity
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn set_invalid(&mut self, names: impl IntoIterator<Item = String>) {
        self.invalid = names.into_iter().collect();
    }

    fn inputs_locked(&self) -> bool {
        !self.validity.allowed || self.load_error.is_some()
    }

    fn input(&self, kind: GradeKind, row: &GradeEntryStudent, value: Option<f64>) -> GradeInput {
        let name = kind.field_name(&row.id);
        let disabled = self.inputs_locked() || row.disabled;
        let invalid = self.invalid.contains(&name);
        let class_name = if invalid {
            INPUT_INVALID_CLASS
        } else if disabled {
            INPUT_DISABLED_CLASS
        } else {
            INPUT_CLASS
        };
        GradeInput {
            name,
            value: format_grade(Some(value.unwrap_or(0.0))),
            min: GRADE_MIN,
            max: GRADE_MAX,
            step: 0.01,
            disabled,
            invalid,
            class_name,
        }
    }

    pub fn view(&self) -> GradeEntryView {
        let rows = self
            .rows
            .iter()
            .map(|r| GradeRowView {
                student_id: r.id.clone(),
                name: r.nom_complet.clone(),
                class_grade: self.input(GradeKind::Class, r, r.note_classe),
                exam_grade: self.input(GradeKind::Exam, r, r.note_examen),
            })
            .collect();
        GradeEntryView {
            class_id: self.selection.class_id.clone(),
            subject_id: self.selection.subject_id.clone(),
            exam_id: self.selection.exam_id.clone(),
            loaded: self.loaded,
            rows,
            validity: self.validity.to_json(),
            error: self.load_error.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionCheck {
    pub ok: bool,
    pub invalid_fields: Vec<String>,
    pub message: Option<String>,
}

/// Client-side check run before the grade form is submitted. The server
/// repeats every check.
pub fn check_submission(
    exam_id: Option<&str>,
    validity: &Validity,
    load_error: Option<&str>,
    values: &[(String, String)],
) -> SubmissionCheck {
    if exam_id.map(str::trim).filter(|s| !s.is_empty()).is_none() {
        return SubmissionCheck {
            ok: false,
            invalid_fields: Vec::new(),
            message: Some("Veuillez sélectionner un examen avant d'enregistrer.".to_string()),
        };
    }
    if let Some(message) = load_error {
        return SubmissionCheck {
            ok: false,
            invalid_fields: Vec::new(),
            message: Some(message.to_string()),
        };
    }
    if !validity.allowed {
        return SubmissionCheck {
            ok: false,
            invalid_fields: Vec::new(),
            message: validity.message(),
        };
    }

    let invalid_fields: Vec<String> = values
        .iter()
        .filter(|(_, raw)| {
            !raw.trim()
                .replace(',', ".")
                .parse::<f64>()
                .map(is_valid_grade)
                .unwrap_or(false)
        })
        .map(|(name, _)| name.clone())
        .collect();

    if invalid_fields.is_empty() {
        SubmissionCheck {
            ok: true,
            invalid_fields,
            message: None,
        }
    } else {
        SubmissionCheck {
            ok: false,
            message: Some(format!(
                "{} note(s) invalide(s) : chaque note doit être comprise entre 0 et 20.",
                invalid_fields.len()
            )),
            invalid_fields,
        }
    }
}
