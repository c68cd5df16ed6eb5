//! Wire shapes of the school application's JSON endpoints.
//!
//! Field names follow the server exactly. Ids are serialized by the server as
//! numbers but posted back as strings by the web page, so both are accepted
//! and kept as strings.

use serde::{Deserialize, Deserializer, Serialize};

fn de_id<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Str(String),
    }
    Ok(match RawId::deserialize(de)? {
        RawId::Int(v) => v.to_string(),
        RawId::Str(v) => v,
    })
}

/// Missing keys and explicit `null`s both fall back to the type's default.
fn de_or_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
}

/// `GET /get_eleves_par_classe/?classe_id=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassRoster {
    #[serde(default)]
    pub eleves: Vec<RosterStudent>,
    #[serde(default)]
    pub count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RosterStudent {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de_or_default")]
    pub nom: String,
    #[serde(default, deserialize_with = "de_or_default")]
    pub prenom: String,
    #[serde(default)]
    pub identifiant: Option<String>,
}

impl RosterStudent {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.nom, self.prenom).trim().to_string()
    }
}

/// `GET /get_eleves_classe/?eleve_id=&classe_id=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentDetailResponse {
    #[serde(default)]
    pub periode: Option<String>,
    #[serde(default)]
    pub classe: Option<String>,
    #[serde(default)]
    pub eleves: Vec<StudentDetail>,
    #[serde(default)]
    pub statut_examen: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudentDetail {
    #[serde(default, deserialize_with = "de_or_default")]
    pub nom: String,
    #[serde(default, deserialize_with = "de_or_default")]
    pub prenom: String,
    #[serde(default)]
    pub telephone: Option<String>,
    #[serde(default)]
    pub residence: Option<String>,
    #[serde(default)]
    pub moyenne_generale: Option<f64>,
    #[serde(default)]
    pub notes: Vec<SubjectGrade>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubjectGrade {
    #[serde(deserialize_with = "de_id")]
    pub matiere_id: String,
    #[serde(default, deserialize_with = "de_or_default")]
    pub matiere_nom: String,
    #[serde(default, deserialize_with = "de_or_default")]
    pub coefficient: f64,
    #[serde(default)]
    pub classe_note: Option<f64>,
    #[serde(default)]
    pub examen_note: Option<f64>,
    #[serde(default)]
    pub moyenne_coefficient: Option<f64>,
}

/// `POST /generate_bulletins/` body.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest<'a> {
    pub eleve_ids: &'a [String],
    pub classe_id: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default, deserialize_with = "de_or_default")]
    pub success: bool,
    #[serde(default)]
    pub generated: Option<u64>,
    #[serde(default)]
    pub updated: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

impl GenerateResponse {
    /// The server reports either `generated` or `updated` depending on
    /// whether bulletins already existed; a zero `generated` falls through.
    pub fn count(&self) -> u64 {
        self.generated
            .filter(|n| *n > 0)
            .or(self.updated)
            .or(self.generated)
            .unwrap_or(0)
    }
}

/// One element of `GET /api/eleves/?classe=&matiere=&examen=`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GradeEntryStudent {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default, deserialize_with = "de_or_default")]
    pub nom_complet: String,
    #[serde(default)]
    pub note_classe: Option<f64>,
    #[serde(default)]
    pub note_examen: Option<f64>,
    #[serde(default, deserialize_with = "de_or_default")]
    pub disabled: bool,
}

/// `GET /api/examens/{id}/`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExamMeta {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub date_fin: Option<String>,
    #[serde(default, deserialize_with = "de_or_default")]
    pub periode_active: bool,
    #[serde(default, deserialize_with = "de_or_default")]
    pub periode_cloture: bool,
    #[serde(default)]
    pub validite: Option<String>,
}

/// `{ "error": "..." }` bodies returned alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ServerError {
    pub error: String,
}
