use actix_web::{get, put, web, HttpResponse, Responder};
use log::info;

use crate::error::DrawError;
use crate::models::{AppState, DrawConfig};
use crate::services::reveal::lock_session;

#[get("/api/config")]
pub async fn get_config(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(lock_session(&data).config())
}

#[put("/api/config")]
pub async fn put_config(
    data: web::Data<AppState>,
    body: web::Json<DrawConfig>,
) -> Result<HttpResponse, DrawError> {
    let config = lock_session(&data).set_config(body.into_inner())?;
    info!("Draw config set to {} numbers in [{}, {}]", config.count, config.min, config.max);
    Ok(HttpResponse::Ok().json(config))
}
