//! Browser stage: one server-rendered page plus plain form posts that
//! redirect back to it. Failures land in the session's displayed error.

use actix_web::http::header;
use actix_web::{get, post, web, HttpResponse, Responder};

use crate::error::DrawError;
use crate::models::{AppState, Bin, ConfigForm, Phase, ResetForm, SessionView};
use crate::services::histogram::bin_history;
use crate::services::reveal::{cancel_draw, lock_session, start_draw};
use crate::utils::escape_html;

fn back_to_stage() -> HttpResponse {
    HttpResponse::SeeOther().insert_header((header::LOCATION, "/")).finish()
}

fn render_controls(out: &mut String, view: &SessionView) {
    let disabled = if view.drawing { " disabled" } else { "" };
    out.push_str(&format!(
        r#"<section class="controls">
<h2>Control panel</h2>
<form method="post" action="/config">
<label>Range start <input type="number" name="min" value="{min}"{disabled}></label>
<label>Range end <input type="number" name="max" value="{max}"{disabled}></label>
<label>Numbers to draw <input type="number" name="count" value="{count}"{disabled}></label>
<button type="submit"{disabled}>Save</button>
</form>
<form method="post" action="/draw"><button class="draw" type="submit"{disabled}>{label}</button></form>
"#,
        min = view.config.min,
        max = view.config.max,
        count = view.config.count,
        label = if view.drawing { "DRAWING..." } else { "DRAW" },
    ));
    if view.drawing {
        out.push_str(r#"<form method="post" action="/draw/cancel"><button type="submit">Stop draw</button></form>"#);
    }
    out.push_str(
        r#"<form method="post" action="/reset">
<label><input type="checkbox" name="confirm" required> Yes, empty the drum</label>
<button type="submit">Empty drum &amp; start over</button>
</form>
</section>
"#,
    );
}

fn render_histogram(out: &mut String, bins: &[Bin]) {
    out.push_str(r#"<section class="stats">"#);
    if bins.is_empty() {
        out.push_str("<p class=\"muted\">No statistics yet</p></section>\n");
        return;
    }
    out.push_str("<h2>Ball distribution</h2>\n<table>\n");
    let tallest = bins.iter().map(|b| b.count).max().unwrap_or(0).max(1);
    for bin in bins {
        out.push_str(&format!(
            "<tr><th>{}</th><td><div class=\"bar\" style=\"width:{}%\"></div></td><td>{}</td></tr>\n",
            bin.name,
            bin.count * 100 / tallest,
            bin.count
        ));
    }
    out.push_str("</table>\n</section>\n");
}

fn render_error(out: &mut String, error: &str) {
    out.push_str(&format!(
        r#"<div class="error"><h3>Draw error</h3><p>{}</p>
<form method="post" action="/error/dismiss"><button type="submit">Back</button></form></div>
"#,
        escape_html(error)
    ));
}

/// The error panel sits above the draw itself; a running draw stays visible.
fn render_stage_panel(out: &mut String, view: &SessionView) {
    out.push_str(r#"<section class="stage">"#);
    if let Some(error) = &view.error {
        render_error(out, error);
    }
    match view.phase {
        Phase::Requesting => out.push_str("<p class=\"rolling\">Spinning the drum...</p>"),
        Phase::Rolling { ball, value } => {
            let shown = value.map(|v| v.to_string()).unwrap_or_else(|| "?".to_string());
            out.push_str(&format!(
                r#"<p>Ball {}</p><div class="ball rolling">{}</div>"#,
                ball, shown
            ));
        }
        Phase::Revealed { ball, value } => {
            out.push_str(&format!(r#"<p>Ball {}</p><div class="ball">{}</div>"#, ball, value));
        }
        _ if !view.batch.is_empty() => {
            out.push_str("<h3>Draw results</h3>\n<div class=\"badges\">");
            for (i, n) in view.batch.iter().enumerate() {
                out.push_str(&format!(r#"<span class="badge" title="ball {}">{}</span>"#, i + 1, n));
            }
            out.push_str(
                r#"</div>
<form method="post" action="/batch/clear"><button type="submit">Next round</button></form>"#,
            );
        }
        _ if view.error.is_none() => out.push_str(
            "<h3>Ready to draw</h3><p class=\"muted\">Set the range and press DRAW to start.</p>",
        ),
        _ => {}
    }
    out.push_str("</section>\n");
}

fn render_locked(out: &mut String, view: &SessionView) {
    out.push_str(&format!(
        "<section class=\"locked\"><h2>Drawn numbers (locked)</h2><span>Total: {}</span>\n<div>",
        view.locked.len()
    ));
    if view.locked.is_empty() {
        out.push_str("<p class=\"muted\">No numbers locked yet.</p>");
    }
    for n in &view.locked {
        out.push_str(&format!("<span class=\"chip\">{}</span>", n));
    }
    out.push_str("</div></section>\n");
}

pub fn render_page(view: &SessionView, bins: &[Bin]) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>LuckyDraw</title>\n");
    if view.drawing {
        out.push_str("<meta http-equiv=\"refresh\" content=\"1\">\n");
    }
    out.push_str(
        r#"<style>
body{background:#020617;color:#e2e8f0;font-family:sans-serif;max-width:72rem;margin:auto;padding:2rem}
section{background:#0f172a;border:1px solid #1e293b;border-radius:1rem;padding:1.5rem;margin-bottom:1.5rem}
.ball{font-size:6rem;font-weight:900;text-align:center}
.badge,.chip{display:inline-block;margin:.25rem;padding:.5rem 1rem;border-radius:999px;background:#4f46e5}
.chip{background:#020617;border:1px solid #1e293b;border-radius:.5rem}
.bar{background:#4f46e5;height:.75rem}
.error{color:#f87171}
.muted{color:#64748b}
</style>
</head>
<body>
<h1>LUCKYDRAW</h1>
"#,
    );
    render_controls(&mut out, view);
    render_histogram(&mut out, bins);
    render_stage_panel(&mut out, view);
    render_locked(&mut out, view);
    out.push_str("</body>\n</html>\n");
    out
}

#[get("/")]
pub async fn stage(data: web::Data<AppState>) -> impl Responder {
    let (view, bins) = {
        let session = lock_session(&data);
        (session.view(), bin_history(session.history()))
    };
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(render_page(&view, &bins))
}

#[post("/config")]
pub async fn submit_config(data: web::Data<AppState>, form: web::Form<ConfigForm>) -> impl Responder {
    let mut session = lock_session(&data);
    if let Err(err) = session.set_config(form.into_inner().into_config()) {
        session.surface(&err);
    }
    back_to_stage()
}

#[post("/draw")]
pub async fn submit_draw(data: web::Data<AppState>) -> impl Responder {
    // capacity failures are already recorded by the session
    if let Err(err) = start_draw(&data) {
        if !matches!(err, DrawError::Capacity { .. }) {
            lock_session(&data).surface(&err);
        }
    }
    back_to_stage()
}

#[post("/draw/cancel")]
pub async fn submit_cancel(data: web::Data<AppState>) -> impl Responder {
    if let Err(err) = cancel_draw(&data) {
        lock_session(&data).surface(&err);
    }
    back_to_stage()
}

#[post("/reset")]
pub async fn submit_reset(data: web::Data<AppState>, form: web::Form<ResetForm>) -> impl Responder {
    let confirmed = form.confirm.is_some();
    let mut session = lock_session(&data);
    if let Err(err) = session.reset(confirmed) {
        session.surface(&err);
    }
    back_to_stage()
}

#[post("/error/dismiss")]
pub async fn submit_dismiss_error(data: web::Data<AppState>) -> impl Responder {
    lock_session(&data).dismiss_error();
    back_to_stage()
}

#[post("/batch/clear")]
pub async fn submit_clear_batch(data: web::Data<AppState>) -> impl Responder {
    lock_session(&data).clear_batch();
    back_to_stage()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(stage)
        .service(submit_config)
        .service(submit_draw)
        .service(submit_cancel)
        .service(submit_reset)
        .service(submit_dismiss_error)
        .service(submit_clear_batch);
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test as actix_test, App};
    use super::*;
    use crate::models::DrawConfig;
    use crate::services::draw_service::scripted::ScriptedDrawService;
    use crate::services::reveal::tests::{instant, settle, test_state};

    fn idle_view() -> SessionView {
        crate::session::Session::default().view()
    }

    #[test]
    fn test_idle_page() {
        let page = render_page(&idle_view(), &[]);
        assert!(page.contains("Ready to draw"));
        assert!(page.contains("No numbers locked yet."));
        assert!(page.contains("No statistics yet"));
        assert!(!page.contains("http-equiv=\"refresh\""));
    }

    #[test]
    fn test_rolling_page_refreshes_and_disables_inputs() {
        let mut view = idle_view();
        view.phase = Phase::Rolling { ball: 2, value: Some(41) };
        view.drawing = true;
        let page = render_page(&view, &[]);
        assert!(page.contains("http-equiv=\"refresh\""));
        assert!(page.contains("Ball 2"));
        assert!(page.contains(">41<"));
        assert!(page.contains("name=\"min\" value=\"1\" disabled"));
        assert!(page.contains("/draw/cancel"));
    }

    #[test]
    fn test_error_is_escaped() {
        let mut view = idle_view();
        view.error = Some("<script>alert(1)</script>".into());
        let page = render_page(&view, &[]);
        assert!(page.contains("&lt;script&gt;"));
        assert!(!page.contains("<script>"));
    }

    #[test]
    fn test_error_does_not_hide_running_draw() {
        let mut view = idle_view();
        view.phase = Phase::Rolling { ball: 3, value: Some(17) };
        view.drawing = true;
        view.error = Some("A draw is already in progress".into());
        let page = render_page(&view, &[]);
        assert!(page.contains("Draw error"));
        assert!(page.contains("A draw is already in progress"));
        assert!(page.contains("Ball 3"));
        assert!(page.contains(">17<"));
    }

    #[test]
    fn test_error_replaces_idle_placeholder() {
        let mut view = idle_view();
        view.error = Some("boom".into());
        let page = render_page(&view, &[]);
        assert!(page.contains("boom"));
        assert!(!page.contains("Ready to draw"));
    }

    #[test]
    fn test_histogram_rows() {
        let bins = vec![
            Bin { name: "1-5".into(), start: 1, end: 5, count: 2 },
            Bin { name: "6-10".into(), start: 6, end: 10, count: 4 },
        ];
        let page = render_page(&idle_view(), &bins);
        assert!(page.contains("<th>1-5</th>"));
        assert!(page.contains("width:50%"));
        assert!(page.contains("width:100%"));
    }

    #[actix_web::test]
    async fn test_form_flow() {
        let service = ScriptedDrawService::new(vec![ScriptedDrawService::numbers(vec![3, 1])]);
        let state = test_state(service, instant());
        let app = actix_test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let req = actix_test::TestRequest::post()
            .uri("/config")
            .set_form([("min", "1"), ("max", "3"), ("count", "2")])
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(lock_session(&state).config(), DrawConfig { min: 1, max: 3, count: 2 });

        let req = actix_test::TestRequest::post().uri("/draw").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        settle(&state).await;

        let req = actix_test::TestRequest::get().uri("/").to_request();
        let body = actix_test::call_and_read_body(&app, req).await;
        let page = String::from_utf8(body.to_vec()).unwrap();
        assert!(page.contains("Draw results"));
        assert!(page.contains("Total: 2"));

        // a second draw of two does not fit in the one remaining number
        let req = actix_test::TestRequest::post().uri("/draw").to_request();
        actix_test::call_service(&app, req).await;
        let page = String::from_utf8(
            actix_test::call_and_read_body(&app, actix_test::TestRequest::get().uri("/").to_request()).await.to_vec(),
        )
        .unwrap();
        assert!(page.contains("only 1 remain"));

        let req = actix_test::TestRequest::post().uri("/reset").set_form([("other", "x")]).to_request();
        actix_test::call_service(&app, req).await;
        assert_eq!(lock_session(&state).locked().len(), 2);

        let req = actix_test::TestRequest::post().uri("/reset").set_form([("confirm", "on")]).to_request();
        actix_test::call_service(&app, req).await;
        assert!(lock_session(&state).locked().is_empty());
        assert_eq!(lock_session(&state).error(), None);
    }
}
