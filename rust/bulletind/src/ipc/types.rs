use serde::Deserialize;

use crate::config::Config;
use crate::gateway::Gateway;
use crate::ui::EventSink;
use crate::views::bulletin::BulletinPanel;
use crate::views::grades::GradeEntryState;
use crate::views::roster::RosterState;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: Config,
    pub gateway: Box<dyn Gateway>,
    pub events: Box<dyn EventSink>,
    pub roster: RosterState,
    pub grades: GradeEntryState,
    pub bulletin: BulletinPanel,
}

impl AppState {
    pub fn new(config: Config, gateway: Box<dyn Gateway>, events: Box<dyn EventSink>) -> Self {
        Self {
            config,
            gateway,
            events,
            roster: RosterState::default(),
            grades: GradeEntryState::default(),
            bulletin: BulletinPanel::default(),
        }
    }
}
