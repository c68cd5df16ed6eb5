use serde::Serialize;
use std::collections::BTreeSet;

use crate::dto::RosterStudent;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterRow {
    pub id: String,
    pub label: String,
    pub identifier: String,
    pub checked: bool,
    pub visible: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterView {
    pub class_id: Option<String>,
    pub filter: String,
    pub rows: Vec<RosterRow>,
    pub selected_count: usize,
    pub visible_count: usize,
    pub generate_enabled: bool,
}

/// Students of the current class plus the user's selection.
#[derive(Debug, Default)]
pub struct RosterState {
    class_id: Option<String>,
    students: Vec<RosterStudent>,
    selected: BTreeSet<String>,
    filter: String,
    generating: bool,
}

impl RosterState {
    pub fn class_id(&self) -> Option<&str> {
        self.class_id.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    /// Switches to another class. The selection and the filter never carry
    /// over from one class to the next. Repeated ids keep their first row.
    pub fn replace(&mut self, class_id: &str, mut students: Vec<RosterStudent>) {
        let received = students.len();
        let mut seen = BTreeSet::new();
        students.retain(|s| seen.insert(s.id.clone()));
        if students.len() != received {
            tracing::warn!(
                class_id,
                dropped = received - students.len(),
                "duplicate student ids in roster"
            );
        }
        self.class_id = Some(class_id.to_string());
        self.students = students;
        self.selected.clear();
        self.filter.clear();
    }

    pub fn contains(&self, student_id: &str) -> bool {
        self.students.iter().any(|s| s.id == student_id)
    }

    /// Returns the new checked state, or `None` for an unknown student.
    pub fn toggle(&mut self, student_id: &str, checked: Option<bool>) -> Option<bool> {
        if !self.contains(student_id) {
            return None;
        }
        let now = checked.unwrap_or(!self.selected.contains(student_id));
        if now {
            self.selected.insert(student_id.to_string());
        } else {
            self.selected.remove(student_id);
        }
        Some(now)
    }

    pub fn select_all(&mut self) {
        self.selected = self.students.iter().map(|s| s.id.clone()).collect();
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn set_filter(&mut self, text: &str) {
        self.filter = text.trim().to_lowercase();
    }

    pub fn set_generating(&mut self, generating: bool) {
        self.generating = generating;
    }

    /// Selected ids in roster order.
    pub fn selected_ids(&self) -> Vec<String> {
        self.students
            .iter()
            .filter(|s| self.selected.contains(&s.id))
            .map(|s| s.id.clone())
            .collect()
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    fn matches(&self, s: &RosterStudent) -> bool {
        if self.filter.is_empty() {
            return true;
        }
        let text = format!("{} {}", s.full_name(), s.identifiant.as_deref().unwrap_or(""));
        text.to_lowercase().contains(&self.filter)
    }

    pub fn view(&self) -> RosterView {
        let rows: Vec<RosterRow> = self
            .students
            .iter()
            .map(|s| RosterRow {
                id: s.id.clone(),
                label: s.full_name(),
                identifier: s.identifiant.clone().unwrap_or_default(),
                checked: self.selected.contains(&s.id),
                visible: self.matches(s),
            })
            .collect();
        let visible_count = rows.iter().filter(|r| r.visible).count();
        RosterView {
            class_id: self.class_id.clone(),
            filter: self.filter.clone(),
            selected_count: self.selected.len(),
            visible_count,
            generate_enabled: !self.generating && !self.selected.is_empty(),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: &str, nom: &str, prenom: &str, ident: Option<&str>) -> RosterStudent {
        RosterStudent {
            id: id.to_string(),
            nom: nom.to_string(),
            prenom: prenom.to_string(),
            identifiant: ident.map(str::to_string),
        }
    }

    fn roster() -> RosterState {
        let mut r = RosterState::default();
        r.replace(
            "6A",
            vec![
                student("1", "Diallo", "Awa", Some("E-001")),
                student("2", "Traoré", "Moussa", None),
                student("3", "Keïta", "Aminata", Some("E-003")),
            ],
        );
        r
    }

    fn checked_rows(r: &RosterState) -> usize {
        r.view().rows.iter().filter(|row| row.checked).count()
    }

    #[test]
    fn selection_count_tracks_checked_rows() {
        let mut r = roster();
        assert_eq!(r.toggle("1", None), Some(true));
        assert_eq!(r.toggle("2", Some(true)), Some(true));
        assert_eq!(r.toggle("1", None), Some(false));
        assert_eq!(r.selected_count(), checked_rows(&r));
        assert_eq!(r.selected_count(), 1);

        r.select_all();
        assert_eq!(r.selected_count(), 3);
        assert_eq!(r.selected_count(), checked_rows(&r));

        r.toggle("3", Some(false));
        r.clear_selection();
        assert_eq!(r.selected_count(), 0);
        assert_eq!(checked_rows(&r), 0);

        r.select_all();
        r.replace("6B", vec![student("9", "Sow", "Ibrahima", None)]);
        assert_eq!(r.selected_count(), 0);
        assert_eq!(checked_rows(&r), 0);
        assert_eq!(r.class_id(), Some("6B"));
    }

    #[test]
    fn duplicate_ids_keep_selection_and_checked_rows_aligned() {
        let mut r = RosterState::default();
        r.replace(
            "6A",
            vec![
                student("1", "Diallo", "Awa", Some("E-001")),
                student("1", "Diallo", "Awa", Some("E-001")),
                student("2", "Traoré", "Moussa", None),
            ],
        );
        assert_eq!(r.view().rows.len(), 2);
        r.select_all();
        assert_eq!(r.selected_count(), checked_rows(&r));
        r.toggle("1", Some(false));
        assert_eq!(r.selected_count(), checked_rows(&r));
        assert_eq!(r.selected_ids(), vec!["2"]);
    }

    #[test]
    fn unknown_student_is_not_selected() {
        let mut r = roster();
        assert_eq!(r.toggle("42", Some(true)), None);
        assert_eq!(r.selected_count(), 0);
    }

    #[test]
    fn filter_hides_rows_without_touching_selection() {
        let mut r = roster();
        r.toggle("2", Some(true));
        r.set_filter("  DIALLO ");
        let v = r.view();
        assert_eq!(v.visible_count, 1);
        assert!(v.rows[0].visible);
        assert!(!v.rows[1].visible);
        assert!(v.rows[1].checked);
        assert_eq!(v.selected_count, 1);

        r.set_filter("");
        let v = r.view();
        assert_eq!(v.visible_count, 3);
        assert!(v.rows[1].checked);
    }

    #[test]
    fn filter_matches_identifier_and_select_all_includes_hidden_rows() {
        let mut r = roster();
        r.set_filter("e-003");
        assert_eq!(r.view().visible_count, 1);
        r.select_all();
        assert_eq!(r.selected_ids(), vec!["1", "2", "3"]);
    }

    #[test]
    fn generate_button_follows_selection_and_progress() {
        let mut r = roster();
        assert!(!r.view().generate_enabled);
        r.toggle("1", Some(true));
        assert!(r.view().generate_enabled);
        r.set_generating(true);
        assert!(!r.view().generate_enabled);
    }
}
