//! In-memory stand-ins for the school server and the shell.

use chrono::NaiveDate;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::config::Config;
use crate::dto::{ClassRoster, ExamMeta, GradeEntryStudent, StudentDetailResponse};
use crate::gateway::{Gateway, GatewayError};
use crate::ipc::{handle_request, AppState, Request};
use crate::ui::{Event, EventSink};

#[derive(Default)]
pub struct FakeServer {
    pub rosters: HashMap<String, ClassRoster>,
    /// Keyed by (student id, class id).
    pub details: HashMap<(String, String), StudentDetailResponse>,
    pub grade_rows: Vec<GradeEntryStudent>,
    pub exams: HashMap<String, ExamMeta>,
    /// `Err` carries the server's `error` string.
    pub generate: Option<Result<u64, String>>,
    pub offline: bool,
    pub calls: Vec<String>,
}

impl FakeServer {
    fn hit(&mut self, call: String) -> Result<(), GatewayError> {
        self.calls.push(call);
        if self.offline {
            return Err(GatewayError::Status {
                status: 503,
                message: "Erreur HTTP: 503".to_string(),
            });
        }
        Ok(())
    }
}

fn not_found() -> GatewayError {
    GatewayError::Status {
        status: 404,
        message: "Erreur HTTP: 404".to_string(),
    }
}

#[derive(Clone, Default)]
pub struct FakeGateway(pub Rc<RefCell<FakeServer>>);

impl Gateway for FakeGateway {
    fn students_by_class(&self, class_id: &str) -> Result<ClassRoster, GatewayError> {
        let mut s = self.0.borrow_mut();
        s.hit(format!("students_by_class:{class_id}"))?;
        s.rosters.get(class_id).cloned().ok_or_else(not_found)
    }

    fn student_detail(
        &self,
        student_id: &str,
        class_id: &str,
    ) -> Result<StudentDetailResponse, GatewayError> {
        let mut s = self.0.borrow_mut();
        s.hit(format!("student_detail:{student_id}:{class_id}"))?;
        s.details
            .get(&(student_id.to_string(), class_id.to_string()))
            .cloned()
            .ok_or_else(not_found)
    }

    fn generate_bulletins(&self, student_ids: &[String], class_id: &str) -> Result<u64, GatewayError> {
        let mut s = self.0.borrow_mut();
        s.hit(format!("generate:{}:{class_id}", student_ids.join(",")))?;
        match s.generate.clone() {
            Some(Ok(n)) => Ok(n),
            Some(Err(msg)) => Err(GatewayError::Rejected(msg)),
            None => Ok(student_ids.len() as u64),
        }
    }

    fn grade_entry_students(
        &self,
        class_id: &str,
        subject_id: &str,
        exam_id: &str,
    ) -> Result<Vec<GradeEntryStudent>, GatewayError> {
        let mut s = self.0.borrow_mut();
        s.hit(format!("grade_entry:{class_id}:{subject_id}:{exam_id}"))?;
        Ok(s.grade_rows.clone())
    }

    fn exam(&self, exam_id: &str) -> Result<ExamMeta, GatewayError> {
        let mut s = self.0.borrow_mut();
        s.hit(format!("exam:{exam_id}"))?;
        s.exams.get(exam_id).cloned().ok_or_else(not_found)
    }
}

#[derive(Clone, Default)]
pub struct MemorySink(Rc<RefCell<Vec<Event>>>);

impl MemorySink {
    pub fn events(&self) -> Vec<Event> {
        self.0.borrow().clone()
    }

    pub fn toasts(&self) -> Vec<String> {
        self.0
            .borrow()
            .iter()
            .filter_map(|e| match e {
                Event::Toast { message, .. } => Some(message.clone()),
                Event::Loading { .. } => None,
            })
            .collect()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }
}

pub struct Harness {
    pub state: AppState,
    pub server: Rc<RefCell<FakeServer>>,
    pub sink: MemorySink,
    next_id: u64,
}

impl Harness {
    pub fn new(server: FakeServer, today: NaiveDate) -> Self {
        let gateway = FakeGateway(Rc::new(RefCell::new(server)));
        let sink = MemorySink::default();
        let config = Config {
            base_url: Some("http://school.test".to_string()),
            today: Some(today),
            ..Config::default()
        };
        Self {
            server: gateway.0.clone(),
            state: AppState::new(config, Box::new(gateway), Box::new(sink.clone())),
            sink,
            next_id: 0,
        }
    }

    pub fn call(&mut self, method: &str, params: serde_json::Value) -> serde_json::Value {
        self.next_id += 1;
        let req = Request {
            id: self.next_id.to_string(),
            method: method.to_string(),
            params,
        };
        handle_request(&mut self.state, req)
    }

    pub fn call_ok(&mut self, method: &str, params: serde_json::Value) -> serde_json::Value {
        let resp = self.call(method, params);
        assert_eq!(resp["ok"], true, "{method} failed: {resp}");
        resp["result"].clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.server.borrow().calls.clone()
    }
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}
