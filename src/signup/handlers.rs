use axum::{
    extract::{
        rejection::{FormRejection, QueryRejection},
        Query, State,
    },
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    mirror,
    signup::{
        dto::{DownloadQuery, SignupForm},
        errors::{RepoError, SignupError, ValidationError},
        repo_types::User,
        services,
    },
    state::AppState,
};

const SIGNUP_PAGE: &str = include_str!("../../templates/signup.html");
const THANK_YOU_PAGE: &str = include_str!("../../templates/thankyou.html");

pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/submit", post(submit))
        .route("/thankyou", get(thank_you))
}

pub fn export_routes() -> Router<AppState> {
    Router::new().route("/download_csv", get(download_csv))
}

pub async fn index() -> Html<&'static str> {
    Html(SIGNUP_PAGE)
}

pub async fn thank_you() -> Html<&'static str> {
    Html(THANK_YOU_PAGE)
}

#[instrument(skip(state, form))]
pub async fn submit(
    State(state): State<AppState>,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Result<Redirect, SignupError> {
    // An unreadable body carries no usable fields.
    let form = match form {
        Ok(Form(pairs)) => SignupForm::from_pairs(pairs),
        Err(rejection) => {
            warn!(reason = %rejection, "unreadable signup body");
            return Err(ValidationError::MissingFields.into());
        }
    };

    let new_user = services::validate(form).map_err(|e| {
        warn!(reason = %e, "signup rejected");
        e
    })?;

    let user = User::create(&state.db, &new_user).await.map_err(|e| {
        match &e {
            RepoError::DuplicateIdNumber => {
                warn!(idnumber = %new_user.idnumber, "idnumber already registered");
            }
            RepoError::Database(db) => error!(error = %db, "insert user failed"),
        }
        e
    })?;
    info!(user_id = user.id, idnumber = %user.idnumber, role = %user.role, "user signed up");

    // The row is committed at this point; a stale mirror is logged, not
    // surfaced. Rewrite mode repairs it on the next signup.
    if let Err(e) = mirror::sync_after_insert(&state, &user).await {
        error!(error = ?e, user_id = user.id, "csv mirror update failed");
    }

    Ok(Redirect::to("/thankyou"))
}

#[instrument(skip_all)]
pub async fn download_csv(
    State(state): State<AppState>,
    query: Result<Query<DownloadQuery>, QueryRejection>,
) -> Result<Response, StatusCode> {
    // A query that does not parse (e.g. a repeated token) is denied like a
    // wrong token.
    let authorized = query.ok().and_then(|Query(q)| q.token).is_some_and(|t| {
        t.as_bytes() == state.config.admin_token.as_bytes()
    });
    if !authorized {
        warn!("csv download denied");
        return Err(StatusCode::FORBIDDEN);
    }

    let path = &state.config.csv_path;
    let body = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "csv requested before first signup");
            return Err(StatusCode::NOT_FOUND);
        }
        Err(e) => {
            error!(error = %e, path = %path.display(), "read csv failed");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    info!(bytes = body.len(), "csv downloaded");
    let disposition = format!("attachment; filename=\"{}\"", state.config.csv_file_name());
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
