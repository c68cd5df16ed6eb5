//! Access to the school application's REST endpoints.

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::COOKIE;
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::dto::{
    ClassRoster, ExamMeta, GenerateRequest, GenerateResponse, GradeEntryStudent, ServerError,
    StudentDetailResponse,
};

pub const CSRF_HEADER: &str = "X-CSRFToken";

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("no server configured, call session.configure first")]
    NotConfigured,
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("réponse du serveur illisible: {0}")]
    Decode(String),
    #[error("{0}")]
    Rejected(String),
}

impl GatewayError {
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::NotConfigured => "not_configured",
            GatewayError::Transport(_) => "gateway_transport",
            GatewayError::Status { .. } => "gateway_http",
            GatewayError::Decode(_) => "gateway_decode",
            GatewayError::Rejected(_) => "gateway_rejected",
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            GatewayError::Status { status, .. } => Some(serde_json::json!({ "status": status })),
            _ => None,
        }
    }
}

pub trait Gateway {
    fn students_by_class(&self, class_id: &str) -> Result<ClassRoster, GatewayError>;

    fn student_detail(
        &self,
        student_id: &str,
        class_id: &str,
    ) -> Result<StudentDetailResponse, GatewayError>;

    /// Returns the number of bulletins generated or updated.
    fn generate_bulletins(&self, student_ids: &[String], class_id: &str) -> Result<u64, GatewayError>;

    fn grade_entry_students(
        &self,
        class_id: &str,
        subject_id: &str,
        exam_id: &str,
    ) -> Result<Vec<GradeEntryStudent>, GatewayError>;

    fn exam(&self, exam_id: &str) -> Result<ExamMeta, GatewayError>;

    fn is_configured(&self) -> bool {
        true
    }
}

/// Stand-in used until a base URL is known.
pub struct Unconfigured;

impl Gateway for Unconfigured {
    fn students_by_class(&self, _: &str) -> Result<ClassRoster, GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    fn student_detail(&self, _: &str, _: &str) -> Result<StudentDetailResponse, GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    fn generate_bulletins(&self, _: &[String], _: &str) -> Result<u64, GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    fn grade_entry_students(
        &self,
        _: &str,
        _: &str,
        _: &str,
    ) -> Result<Vec<GradeEntryStudent>, GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    fn exam(&self, _: &str) -> Result<ExamMeta, GatewayError> {
        Err(GatewayError::NotConfigured)
    }

    fn is_configured(&self) -> bool {
        false
    }
}

pub struct HttpGateway {
    client: Client,
    base_url: String,
    csrf_token: Option<String>,
    session_id: Option<String>,
}

impl HttpGateway {
    pub fn new(base_url: &str, cfg: &Config) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(cfg.timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            csrf_token: cfg.csrf_token.clone(),
            session_id: cfg.session_id.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn with_session(&self, rb: RequestBuilder) -> RequestBuilder {
        let mut cookies = Vec::new();
        if let Some(sid) = &self.session_id {
            cookies.push(format!("sessionid={sid}"));
        }
        if let Some(tok) = &self.csrf_token {
            cookies.push(format!("csrftoken={tok}"));
        }
        if cookies.is_empty() {
            rb
        } else {
            rb.header(COOKIE, cookies.join("; "))
        }
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, GatewayError> {
        tracing::debug!(path, ?query, "GET");
        let resp = self
            .with_session(self.client.get(self.url(path)).query(query))
            .send()?;
        decode(resp)
    }
}

fn server_error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ServerError>(body)
        .ok()
        .map(|e| e.error)
        .filter(|m| !m.trim().is_empty())
}

fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, GatewayError> {
    let status = resp.status();
    let body = resp.text()?;
    if !status.is_success() {
        return Err(GatewayError::Status {
            status: status.as_u16(),
            message: server_error_message(&body)
                .unwrap_or_else(|| format!("Erreur HTTP: {}", status.as_u16())),
        });
    }
    serde_json::from_str(&body).map_err(|e| GatewayError::Decode(e.to_string()))
}

impl Gateway for HttpGateway {
    fn students_by_class(&self, class_id: &str) -> Result<ClassRoster, GatewayError> {
        self.get_json("/get_eleves_par_classe/", &[("classe_id", class_id)])
    }

    fn student_detail(
        &self,
        student_id: &str,
        class_id: &str,
    ) -> Result<StudentDetailResponse, GatewayError> {
        self.get_json(
            "/get_eleves_classe/",
            &[("eleve_id", student_id), ("classe_id", class_id)],
        )
    }

    fn generate_bulletins(&self, student_ids: &[String], class_id: &str) -> Result<u64, GatewayError> {
        tracing::debug!(count = student_ids.len(), class_id, "POST /generate_bulletins/");
        let mut rb = self
            .client
            .post(self.url("/generate_bulletins/"))
            .json(&GenerateRequest {
                eleve_ids: student_ids,
                classe_id: class_id,
            });
        if let Some(tok) = &self.csrf_token {
            rb = rb.header(CSRF_HEADER, tok);
        }
        let resp = self.with_session(rb).send()?;

        // Failures come back as `{success: false, error}` with a 4xx/5xx
        // status, so the body is read before looking at the status.
        let status = resp.status();
        let body = resp.text()?;
        match serde_json::from_str::<GenerateResponse>(&body) {
            Ok(r) if r.success => Ok(r.count()),
            Ok(r) => Err(GatewayError::Rejected(
                r.error
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| "Erreur lors de la génération".to_string()),
            )),
            Err(_) if !status.is_success() => Err(GatewayError::Status {
                status: status.as_u16(),
                message: format!("Erreur HTTP: {}", status.as_u16()),
            }),
            Err(e) => Err(GatewayError::Decode(e.to_string())),
        }
    }

    fn grade_entry_students(
        &self,
        class_id: &str,
        subject_id: &str,
        exam_id: &str,
    ) -> Result<Vec<GradeEntryStudent>, GatewayError> {
        self.get_json(
            "/api/eleves/",
            &[("classe", class_id), ("matiere", subject_id), ("examen", exam_id)],
        )
    }

    fn exam(&self, exam_id: &str) -> Result<ExamMeta, GatewayError> {
        let exam_id = exam_id.trim();
        if exam_id.is_empty() || !exam_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(GatewayError::Rejected(format!("identifiant d'examen invalide: {exam_id}")));
        }
        self.get_json(&format!("/api/examens/{exam_id}/"), &[])
    }
}

/// Builds the gateway matching the current configuration.
pub fn from_config(cfg: &Config) -> Result<Box<dyn Gateway>, GatewayError> {
    match cfg.base_url.as_deref() {
        Some(url) => Ok(Box::new(HttpGateway::new(url, cfg)?)),
        None => Ok(Box::new(Unconfigured)),
    }
}
