use chrono::Utc;
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use crate::error::{DrawError, DrawResult};
use crate::models::{DrawConfig, HistoryItem, Phase, SessionView};
use crate::utils::generate_id;

pub const HISTORY_LIMIT: usize = 20;

/// Everything the stage shows. Lives behind the `AppState` mutex and is only
/// changed through these methods.
#[derive(Debug, Default)]
pub struct Session {
    config: DrawConfig,
    locked: Vec<i64>,
    batch: Vec<i64>,
    history: Vec<HistoryItem>,
    error: Option<String>,
    phase: Phase,
    cancel: Option<CancellationToken>,
}

/// Numbers in `[min, max]` that are not locked yet. Negative for an inverted range.
fn pool_size(config: &DrawConfig, locked_count: usize) -> i128 {
    (config.max as i128 - config.min as i128 + 1) - locked_count as i128
}

/// [`pool_size`] saturated into `i64`; a full `i64` range reports `i64::MAX`.
pub fn available_pool(config: &DrawConfig, locked_count: usize) -> i64 {
    let pool = pool_size(config, locked_count);
    i64::try_from(pool).unwrap_or(if pool < 0 { i64::MIN } else { i64::MAX })
}

impl Session {
    pub fn config(&self) -> DrawConfig {
        self.config
    }

    pub fn locked(&self) -> &[i64] {
        &self.locked
    }

    pub fn batch(&self) -> &[i64] {
        &self.batch
    }

    pub fn history(&self) -> &[HistoryItem] {
        &self.history
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_drawing(&self) -> bool {
        self.phase.is_drawing()
    }

    pub fn available_pool(&self) -> i64 {
        available_pool(&self.config, self.locked.len())
    }

    pub fn set_config(&mut self, config: DrawConfig) -> DrawResult<DrawConfig> {
        if self.is_drawing() {
            return Err(DrawError::InProgress);
        }
        self.config = config;
        Ok(config)
    }

    /// Checks capacity and enters `Requesting`. A capacity failure becomes the
    /// displayed error; nothing else changes.
    pub fn begin_draw(&mut self) -> DrawResult<(DrawConfig, Vec<i64>, CancellationToken)> {
        if self.is_drawing() {
            return Err(DrawError::InProgress);
        }

        if self.config.count as i128 > pool_size(&self.config, self.locked.len()) {
            let err = DrawError::Capacity { requested: self.config.count, available: self.available_pool() };
            self.surface(&err);
            return Err(err);
        }

        let token = CancellationToken::new();
        self.error = None;
        self.batch.clear();
        self.phase = Phase::Requesting;
        self.cancel = Some(token.clone());
        Ok((self.config, self.locked.clone(), token))
    }

    pub fn start_rolling(&mut self, ball: usize) {
        self.phase = Phase::Rolling { ball, value: None };
    }

    pub fn set_rolling_value(&mut self, value: i64) {
        if let Phase::Rolling { ball, .. } = self.phase {
            self.phase = Phase::Rolling { ball, value: Some(value) };
        }
    }

    pub fn reveal(&mut self, ball: usize, value: i64) {
        self.batch.push(value);
        self.locked.push(value);
        self.phase = Phase::Revealed { ball, value };
    }

    /// Records the finished draw, newest first.
    pub fn complete(&mut self, config: DrawConfig, results: Vec<i64>) {
        let item = HistoryItem {
            id: generate_id(),
            min: config.min,
            max: config.max,
            count: config.count,
            results,
            timestamp: Utc::now(),
        };
        info!("Draw {} complete: {:?}", item.id, item.results);
        self.history.insert(0, item);
        self.history.truncate(HISTORY_LIMIT);
        self.phase = Phase::Complete;
        self.cancel = None;
    }

    pub fn fail(&mut self, err: &DrawError) {
        self.surface(err);
        self.phase = Phase::Idle;
        self.cancel = None;
    }

    pub fn cancel(&mut self) -> DrawResult<()> {
        match self.cancel.take() {
            Some(token) if self.is_drawing() => {
                token.cancel();
                self.phase = Phase::Cancelled;
                info!("Draw cancelled after {} revealed numbers", self.batch.len());
                Ok(())
            }
            _ => Err(DrawError::NotDrawing),
        }
    }

    /// Empties the drum. An in-flight draw is cancelled first.
    pub fn reset(&mut self, confirmed: bool) -> DrawResult<()> {
        if !confirmed {
            return Err(DrawError::ResetNotConfirmed);
        }
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        info!("Session reset, releasing {} locked numbers", self.locked.len());
        self.locked.clear();
        self.batch.clear();
        self.error = None;
        self.phase = Phase::Idle;
        Ok(())
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn clear_batch(&mut self) {
        self.batch.clear();
    }

    /// Form handlers report failures through the page instead of a status code.
    pub fn surface(&mut self, err: &DrawError) {
        warn!("Draw error: {}", err);
        self.error = Some(err.to_string());
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            config: self.config,
            locked: self.locked.clone(),
            batch: self.batch.clone(),
            history: self.history.clone(),
            error: self.error.clone(),
            phase: self.phase,
            drawing: self.is_drawing(),
            available: self.available_pool(),
        }
    }
}
