use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_sessions::Session;

use tonewiki_backend::{RenderedPage, UploadKind, Username, WikiError};

use crate::error::{ServerError, ServerResult};
use crate::session::{current_user, require_user, sign_in, sign_out};
use crate::state::AppState;

/// Multipart field carrying the uploaded file.
pub const UPLOAD_FIELD: &str = "upload";

/// First letter upper-cased, the rest lower-cased: `chord` logs as `Chord`.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// The case-folded key a username is stored under; sessions carry this form.
fn canonical_username(typed: &str) -> ServerResult<String> {
    Ok(Username::new(typed).map_err(WikiError::from)?.key())
}

fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        _ => "application/octet-stream",
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn home(State(state): State<AppState>, session: Session) -> ServerResult<Json<Value>> {
    let user = current_user(&session).await?;
    state.log_visit(user.clone(), "Home").await;
    Ok(Json(json!({
        "message": "Welcome to MinorBugs, the music theory wiki",
        "user": user,
    })))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Alphabetical,
    Popularity,
}

#[derive(Debug, Default, Deserialize)]
pub struct PagesQuery {
    #[serde(default)]
    pub sort_by: SortBy,
}

pub async fn list_pages(
    State(state): State<AppState>,
    Query(query): Query<PagesQuery>,
) -> ServerResult<Json<Value>> {
    let pages = match query.sort_by {
        SortBy::Alphabetical => state.run(|b| b.list_pages()).await?,
        SortBy::Popularity => {
            state
                .run(|b| {
                    b.ensure_all_pages_present()?;
                    b.sort_by_popularity()
                })
                .await?
        }
    };
    Ok(Json(json!({ "sort_by": query.sort_by, "pages": pages })))
}

pub async fn show_page(
    State(state): State<AppState>,
    session: Session,
    Path(name): Path<String>,
) -> ServerResult<Json<RenderedPage>> {
    let user = current_user(&session).await?;
    let page = {
        let name = name.clone();
        state.run(move |b| b.render_page(&name)).await?
    };
    state.log_visit(user, capitalize(&name)).await;
    Ok(Json(page))
}

pub async fn about(State(state): State<AppState>, session: Session) -> ServerResult<Json<Value>> {
    let user = current_user(&session).await?;
    let authors = state.run(|b| b.list_authors()).await?;
    state.log_visit(user, "About").await;
    Ok(Json(json!({ "authors": authors })))
}

pub async fn images(State(state): State<AppState>, session: Session) -> ServerResult<Json<Value>> {
    let user = current_user(&session).await?;
    let images = state.run(|b| b.list_images()).await?;
    state.log_visit(user, "Images").await;
    Ok(Json(json!({ "images": images })))
}

pub async fn raw_image(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> ServerResult<Response> {
    let content_type = content_type_for(&file_name);
    let bytes = state.run(move |b| b.read_image(&file_name)).await?;
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    pub name: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<SignupForm>,
) -> ServerResult<Response> {
    let username = canonical_username(&form.username)?;
    let name = state
        .run(move |b| b.sign_up(&form.name, &form.username, &form.password))
        .await?;
    sign_in(&session, &username).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "name": name, "username": username })),
    )
        .into_response())
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> ServerResult<Json<Value>> {
    let typed = form.username.clone();
    let name = state
        .run(move |b| b.sign_in(&form.username, &form.password))
        .await?;
    let username = canonical_username(&typed)?;
    sign_in(&session, &username).await?;
    tracing::info!(user = %username, "signed in");
    Ok(Json(json!({ "name": name, "username": username })))
}

pub async fn logout(State(state): State<AppState>, session: Session) -> ServerResult<Json<Value>> {
    let user = require_user(&session).await?;
    state.log_visit(Some(user.clone()), "Logged Out").await;
    sign_out(&session).await?;
    tracing::info!(user = %user, "signed out");
    Ok(Json(json!({ "signed_out": user })))
}

pub async fn upload(
    State(state): State<AppState>,
    session: Session,
    mut multipart: Multipart,
) -> ServerResult<Response> {
    let user = require_user(&session).await?;
    let bad_multipart = |e: axum::extract::multipart::MultipartError| {
        ServerError::BadRequest(format!("malformed upload: {e}"))
    };

    while let Some(field) = multipart.next_field().await.map_err(bad_multipart)? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ServerError::BadRequest("upload has no file name".into()))?;
        // Reject unsupported types before reading the body.
        UploadKind::from_file_name(&file_name)?;
        let data = field.bytes().await.map_err(bad_multipart)?;

        let outcome = state
            .run(move |b| b.upload(&file_name, &data))
            .await?;
        state.log_visit(Some(user), "Upload").await;
        return Ok((StatusCode::CREATED, Json(outcome)).into_response());
    }
    Err(ServerError::BadRequest(format!(
        "missing multipart field `{UPLOAD_FIELD}`"
    )))
}

pub async fn list_comments(
    State(state): State<AppState>,
    session: Session,
) -> ServerResult<Json<Value>> {
    let user = require_user(&session).await?;
    let comments = state.run(|b| b.list_comments()).await?;
    state.log_visit(Some(user), "Comments").await;
    Ok(Json(json!({ "comments": comments })))
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    pub comment: String,
}

pub async fn post_comment(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<CommentForm>,
) -> ServerResult<Response> {
    let user = require_user(&session).await?;
    let key = {
        let user = user.clone();
        state
            .run(move |b| b.upload_comment(&user, &form.comment))
            .await?
    };
    state.log_visit(Some(user), "Comments").await;
    Ok((StatusCode::CREATED, Json(json!({ "key": key.to_string() }))).into_response())
}

pub async fn history(State(state): State<AppState>, session: Session) -> ServerResult<Json<Value>> {
    let user = require_user(&session).await?;
    let mut history = {
        let user = user.clone();
        state.run(move |b| b.history(&user)).await?
    };
    history.reverse();
    Ok(Json(json!({ "username": user, "history": history })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capitalize_like_titles() {
        assert_eq!(capitalize("chord"), "Chord");
        assert_eq!(capitalize("HARMONY"), "Harmony");
        assert_eq!(capitalize("électro"), "Électro");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn usernames_are_case_folded() {
        assert_eq!(canonical_username("SANDY").unwrap(), "sandy");
        assert_eq!(canonical_username("Tim3Line").unwrap(), "tim3line");
        assert!(matches!(
            canonical_username("has:colon"),
            Err(ServerError::Wiki(WikiError::InvalidInput(_)))
        ));
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type_for("a.PNG"), "image/png");
        assert_eq!(content_type_for("Mozart.jpeg"), "image/jpeg");
        assert_eq!(content_type_for("blob"), "application/octet-stream");
    }
}
