use actix_web::{get, post, web, HttpResponse, Responder};

use crate::error::DrawError;
use crate::models::{AppState, ResetRequest};
use crate::services::histogram::bin_history;
use crate::services::reveal::{cancel_draw, lock_session, start_draw};

#[get("/api/state")]
pub async fn get_state(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(lock_session(&data).view())
}

#[get("/api/histogram")]
pub async fn get_histogram(data: web::Data<AppState>) -> impl Responder {
    let bins = bin_history(lock_session(&data).history());
    HttpResponse::Ok().json(bins)
}

#[post("/api/draw")]
pub async fn draw(data: web::Data<AppState>) -> Result<HttpResponse, DrawError> {
    let view = start_draw(&data)?;
    Ok(HttpResponse::Accepted().json(view))
}

#[post("/api/draw/cancel")]
pub async fn cancel(data: web::Data<AppState>) -> Result<HttpResponse, DrawError> {
    let view = cancel_draw(&data)?;
    Ok(HttpResponse::Ok().json(view))
}

#[post("/api/reset")]
pub async fn reset(
    data: web::Data<AppState>,
    body: web::Json<ResetRequest>,
) -> Result<HttpResponse, DrawError> {
    let mut session = lock_session(&data);
    session.reset(body.confirm)?;
    Ok(HttpResponse::Ok().json(session.view()))
}

#[post("/api/error/dismiss")]
pub async fn dismiss_error(data: web::Data<AppState>) -> impl Responder {
    let mut session = lock_session(&data);
    session.dismiss_error();
    HttpResponse::Ok().json(session.view())
}

#[post("/api/batch/clear")]
pub async fn clear_batch(data: web::Data<AppState>) -> impl Responder {
    let mut session = lock_session(&data);
    session.clear_batch();
    HttpResponse::Ok().json(session.view())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_state)
        .service(get_histogram)
        .service(draw)
        .service(cancel)
        .service(reset)
        .service(dismiss_error)
        .service(clear_batch);
}
