use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use minijinja::context;

use crate::{error::AppError, router::AppState, services::links};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/admin", get(admin))
        .route("/{identifier}", get(rsvp_form))
}

async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let tmpl = state.templates.get_template("index.html")?;
    let html = tmpl.render(context! {
        event => state.config.event,
    })?;
    Ok(Html(html))
}

/// The invitation form. Unknown links get a 404 page rather than the form.
async fn rsvp_form(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Response, AppError> {
    let Some(link) = links::validate(&state.db, &identifier).await? else {
        let tmpl = state.templates.get_template("invalid_link.html")?;
        let html = tmpl.render(context! {
            event => state.config.event,
        })?;
        return Ok((StatusCode::NOT_FOUND, Html(html)).into_response());
    };

    let tmpl = state.templates.get_template("rsvp.html")?;
    let html = tmpl.render(context! {
        event => state.config.event,
        link => link,
        existing => link.existing_rsvp,
    })?;
    Ok(Html(html).into_response())
}

async fn admin(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let tmpl = state.templates.get_template("admin.html")?;
    let html = tmpl.render(context! {
        event => state.config.event,
    })?;
    Ok(Html(html))
}
