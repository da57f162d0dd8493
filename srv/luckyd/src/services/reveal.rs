//! Draw orchestration: one request to the draw machine, then a paced
//! ball-by-ball reveal driven by a single background task.
//!
//! The task walks `Requesting → Rolling(i) → Revealed(i) → … → Complete`.
//! Every session update happens under the session lock after checking the
//! cancellation token, so a cancel or reset always wins over a late step.

use std::time::Duration;
use actix_web::web;
use log::{debug, error, info};
use tokio_util::sync::CancellationToken;

use crate::config::RevealTiming;
use crate::error::{DrawError, DrawResult};
use crate::models::{AppState, DrawConfig, SessionView};
use crate::services::draw_service::validate_results;
use crate::session::Session;
use crate::utils::rolling_value;

pub const DRAW_CRASHED: &str = "The draw machine stopped unexpectedly. Please try again.";

/// Apply `update` unless the draw was cancelled. Returns false once cancelled.
fn step(state: &AppState, token: &CancellationToken, update: impl FnOnce(&mut Session)) -> bool {
    let mut session = lock_session(state);
    if token.is_cancelled() {
        return false;
    }
    update(&mut session);
    true
}

/// Wait for `duration`. Returns false if the draw was cancelled meanwhile.
async fn pause(duration: Duration, token: &CancellationToken) -> bool {
    tokio::select! {
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

/// Roll one ball: refresh the cosmetic value every tick until the roll time is up.
async fn roll(state: &AppState, config: &DrawConfig, timing: &RevealTiming, token: &CancellationToken) -> bool {
    if timing.tick.is_zero() {
        return pause(timing.roll, token).await;
    }

    let deadline = tokio::time::sleep(timing.roll);
    tokio::pin!(deadline);
    let mut ticker = tokio::time::interval(timing.tick);

    loop {
        tokio::select! {
            _ = token.cancelled() => return false,
            _ = &mut deadline => return true,
            _ = ticker.tick() => {
                let value = rolling_value(config.min, config.max);
                if !step(state, token, |s| s.set_rolling_value(value)) {
                    return false;
                }
            }
        }
    }
}

/// Run the draw to completion, or until cancelled.
pub async fn run_draw(state: web::Data<AppState>, config: DrawConfig, locked: Vec<i64>, token: CancellationToken) {
    let timing = state.config.timing;

    let response = tokio::select! {
        _ = token.cancelled() => {
            debug!("Draw cancelled while waiting for the draw machine");
            return;
        }
        response = state.draw_service.draw(&config, &locked) => response,
    };

    let results = match response
        .and_then(|r| r.into_results())
        .and_then(|results| validate_results(&config, &locked, &results).map(|_| results))
    {
        Ok(results) => results,
        Err(err) => {
            step(&state, &token, |s| s.fail(&err));
            return;
        }
    };

    info!("Revealing {} numbers", results.len());
    for (i, &value) in results.iter().enumerate() {
        let ball = i + 1;
        if !step(&state, &token, |s| s.start_rolling(ball)) {
            return;
        }
        if !roll(&state, &config, &timing, &token).await {
            return;
        }
        if !step(&state, &token, |s| s.reveal(ball, value)) {
            return;
        }
        debug!("Ball {} revealed: {}", ball, value);
        if !pause(timing.pause, &token).await {
            return;
        }
    }

    step(&state, &token, |s| s.complete(config, results));
}

/// Check capacity, enter `Requesting` and hand the draw to a background task.
pub fn start_draw(state: &web::Data<AppState>) -> DrawResult<SessionView> {
    let (view, config, locked, token) = {
        let mut session = lock_session(state);
        let (config, locked, token) = session.begin_draw()?;
        (session.view(), config, locked, token)
    };

    info!("Draw started: {} numbers in [{}, {}]", config.count, config.min, config.max);
    let handle = actix_web::rt::spawn(run_draw(state.clone(), config, locked, token.clone()));

    // A panicking draw task must not leave the session stuck in a drawing phase.
    let state = state.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = handle.await {
            error!("Draw task ended abnormally: {}", e);
            step(&state, &token, |s| s.fail(&DrawError::Service(DRAW_CRASHED.to_string())));
        }
    });
    Ok(view)
}

pub fn cancel_draw(state: &web::Data<AppState>) -> DrawResult<SessionView> {
    let mut session = lock_session(state);
    session.cancel()?;
    Ok(session.view())
}

/// A panic while holding the lock leaves plain data behind; keep serving it.
pub fn lock_session(state: &AppState) -> std::sync::MutexGuard<'_, Session> {
    match state.session.lock() {
        Ok(session) => session,
        Err(poisoned) => poisoned.into_inner(),
    }
}
