use std::sync::Mutex;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::services::draw_service::DrawService;
use crate::session::Session;

/// Application state shared across all handlers
pub struct AppState {
    pub config: AppConfig,
    pub session: Mutex<Session>,
    pub draw_service: Box<dyn DrawService>,
}

/// Range and count for the next draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawConfig {
    pub min: i64,
    pub max: i64,
    pub count: usize,
}

impl Default for DrawConfig {
    fn default() -> Self {
        DrawConfig { min: 1, max: 99, count: 1 }
    }
}

/// One completed draw, kept for the statistics panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryItem {
    pub id: String,
    pub min: i64,
    pub max: i64,
    pub count: usize,
    pub results: Vec<i64>,
    pub timestamp: DateTime<Utc>,
}

/// Parsed reply of the draw machine
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DrawResponse {
    pub results: Vec<i64>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Requesting,
    Rolling { ball: usize, value: Option<i64> },
    Revealed { ball: usize, value: i64 },
    Complete,
    Cancelled,
}

impl Phase {
    pub fn is_drawing(&self) -> bool {
        matches!(self, Phase::Requesting | Phase::Rolling { .. } | Phase::Revealed { .. })
    }
}

/// Snapshot of the session as rendered by the stage and the JSON API
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub config: DrawConfig,
    pub locked: Vec<i64>,
    pub batch: Vec<i64>,
    pub history: Vec<HistoryItem>,
    pub error: Option<String>,
    pub phase: Phase,
    pub drawing: bool,
    pub available: i64,
}

/// Histogram bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bin {
    pub name: String,
    pub start: i64,
    pub end: i64,
    pub count: usize,
}

#[derive(Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub confirm: bool,
}

/// Stage form fields arrive as strings; blanks and junk fall back to 0
#[derive(Deserialize)]
pub struct ConfigForm {
    pub min: String,
    pub max: String,
    pub count: String,
}

impl ConfigForm {
    pub fn into_config(self) -> DrawConfig {
        DrawConfig {
            min: self.min.trim().parse().unwrap_or(0),
            max: self.max.trim().parse().unwrap_or(0),
            count: self.count.trim().parse().unwrap_or(0),
        }
    }
}

#[derive(Deserialize)]
pub struct ResetForm {
    pub confirm: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_form_parses_like_number_inputs() {
        let form = ConfigForm { min: " 5 ".into(), max: "40".into(), count: "abc".into() };
        assert_eq!(form.into_config(), DrawConfig { min: 5, max: 40, count: 0 });

        let form = ConfigForm { min: "".into(), max: "-3".into(), count: "-2".into() };
        assert_eq!(form.into_config(), DrawConfig { min: 0, max: -3, count: 0 });
    }

    #[test]
    fn test_phase_drawing_flag() {
        assert!(!Phase::Idle.is_drawing());
        assert!(Phase::Requesting.is_drawing());
        assert!(Phase::Rolling { ball: 1, value: None }.is_drawing());
        assert!(Phase::Revealed { ball: 2, value: 9 }.is_drawing());
        assert!(!Phase::Complete.is_drawing());
        assert!(!Phase::Cancelled.is_drawing());
    }
}
