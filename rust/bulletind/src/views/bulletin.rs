use serde::Serialize;

use crate::calc::{self, format_grade, Appreciation, AVERAGE_TOLERANCE, EXAM_WEIGHT};
use crate::dto::StudentDetailResponse;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BulletinError {
    #[error("no student in response")]
    NoStudent,
    #[error("student has no grades")]
    NoGrades,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectRow {
    pub subject_id: String,
    pub subject_name: String,
    pub coefficient: f64,
    pub class_grade: String,
    /// Exam grades are stored out of 20 and shown out of 40.
    pub exam_grade: String,
    pub weighted_average: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub period: String,
    pub class_name: String,
    pub student_name: String,
    pub contact: String,
    pub residence: String,
    pub exam_status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulletinPanel {
    pub visible: bool,
    pub student_id: Option<String>,
    pub identity: Identity,
    pub subjects: Vec<SubjectRow>,
    pub general_average: String,
    pub appreciation: String,
    pub appreciation_level: Option<Appreciation>,
}

impl BulletinPanel {
    /// Replaces the displayed average and recomputes the appreciation from it.
    pub fn set_general_average(&mut self, avg: Option<f64>) {
        self.general_average = format_grade(avg);
        let level = avg.filter(|v| v.is_finite()).map(Appreciation::for_average);
        self.appreciation = level.map(|a| a.text().to_string()).unwrap_or_default();
        self.appreciation_level = level;
    }

    /// Fills the panel from a `get_eleves_classe` response. On error the
    /// panel is left exactly as it was.
    pub fn populate(
        &mut self,
        student_id: &str,
        resp: &StudentDetailResponse,
    ) -> Result<(), BulletinError> {
        let student = resp.eleves.first().ok_or(BulletinError::NoStudent)?;
        if student.notes.is_empty() {
            return Err(BulletinError::NoGrades);
        }

        self.student_id = Some(student_id.to_string());
        self.identity = Identity {
            period: resp.periode.clone().unwrap_or_default(),
            class_name: resp.classe.clone().unwrap_or_default(),
            student_name: format!("{} {}", student.nom, student.prenom).trim().to_string(),
            contact: student.telephone.clone().unwrap_or_default(),
            residence: student.residence.clone().unwrap_or_default(),
            exam_status: resp.statut_examen.clone(),
        };
        self.subjects = student
            .notes
            .iter()
            .map(|n| SubjectRow {
                subject_id: n.matiere_id.clone(),
                subject_name: n.matiere_nom.clone(),
                coefficient: n.coefficient,
                class_grade: format_grade(n.classe_note),
                exam_grade: format_grade(n.examen_note.map(|v| v * EXAM_WEIGHT)),
                weighted_average: format_grade(n.moyenne_coefficient),
            })
            .collect();
        self.set_general_average(student.moyenne_generale);

        if let Some(server) = student.moyenne_generale {
            let local = calc::general_average(&student.notes);
            if (server - local).abs() > AVERAGE_TOLERANCE {
                tracing::warn!(
                    student_id,
                    server,
                    local,
                    "server general average differs from recomputed value"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(average: serde_json::Value, notes: serde_json::Value) -> StudentDetailResponse {
        serde_json::from_value(json!({
            "periode": "Trimestre 1",
            "classe": "6e A",
            "eleves": [{
                "nom": "Diallo",
                "prenom": "Awa",
                "telephone": "+223 70 00 00 00",
                "residence": "Bamako",
                "moyenne_generale": average,
                "notes": notes
            }]
        }))
        .expect("response")
    }

    fn two_subjects() -> serde_json::Value {
        json!([
            { "matiere_id": 1, "matiere_nom": "Maths", "coefficient": 3,
              "classe_note": 12.0, "examen_note": 15.0, "moyenne_coefficient": 42.0 },
            { "matiere_id": 2, "matiere_nom": "Français", "coefficient": 1,
              "classe_note": null, "examen_note": null, "moyenne_coefficient": null }
        ])
    }

    #[test]
    fn populates_identity_rows_and_appreciation() {
        let mut panel = BulletinPanel::default();
        panel
            .populate("12", &response(json!(14.256), two_subjects()))
            .expect("populate");

        assert_eq!(panel.identity.student_name, "Diallo Awa");
        assert_eq!(panel.identity.period, "Trimestre 1");
        assert_eq!(panel.identity.class_name, "6e A");
        assert_eq!(panel.subjects.len(), 2);
        assert_eq!(panel.subjects[0].exam_grade, "30.00");
        assert_eq!(panel.subjects[0].weighted_average, "42.00");
        assert_eq!(panel.subjects[1].class_grade, "--");
        assert_eq!(panel.general_average, "14.26");
        assert_eq!(panel.appreciation_level, Some(Appreciation::VeryGood));
        assert_eq!(panel.appreciation, Appreciation::VeryGood.text());
    }

    #[test]
    fn repopulating_replaces_rows() {
        let mut panel = BulletinPanel::default();
        panel
            .populate("12", &response(json!(14.0), two_subjects()))
            .expect("first");
        let single = json!([{ "matiere_id": 5, "matiere_nom": "SVT", "coefficient": 2,
            "classe_note": 8.0, "examen_note": 9.0, "moyenne_coefficient": 17.333 }]);
        panel
            .populate("13", &response(json!(null), single))
            .expect("second");
        assert_eq!(panel.subjects.len(), 1);
        assert_eq!(panel.subjects[0].subject_name, "SVT");
        assert_eq!(panel.general_average, "--");
        assert_eq!(panel.appreciation, "");
        assert_eq!(panel.appreciation_level, None);
    }

    #[test]
    fn empty_grade_list_leaves_panel_untouched() {
        let mut panel = BulletinPanel::default();
        panel
            .populate("12", &response(json!(11.0), two_subjects()))
            .expect("populate");
        let before = panel.clone();

        assert_eq!(
            panel.populate("13", &response(json!(18.0), json!([]))),
            Err(BulletinError::NoGrades)
        );
        assert_eq!(
            panel.populate("13", &StudentDetailResponse::default()),
            Err(BulletinError::NoStudent)
        );
        assert_eq!(panel, before);
    }

    #[test]
    fn appreciation_follows_every_average_change() {
        let mut panel = BulletinPanel::default();
        panel.set_general_average(Some(16.0));
        assert_eq!(panel.appreciation, "Excellent travail, continuez ainsi.");
        panel.set_general_average(Some(9.5));
        assert_eq!(panel.appreciation_level, Some(Appreciation::Insufficient));
        panel.set_general_average(None);
        assert_eq!(panel.general_average, "--");
        assert!(panel.appreciation.is_empty());
    }
}
