use std::collections::HashMap;

use askama::Template;
use axum::{
    Extension, Form, Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::{debug, info};
use uuid::Uuid;

use cheatsheet_db::Database;
use cheatsheet_types::action::Action;
use cheatsheet_types::auth::Claims;
use cheatsheet_types::edit::SheetLocation;
use cheatsheet_types::models::Sheet;
use cheatsheet_types::sort::sort_groups;

use crate::auth::read_session;
use crate::convert::{sheet_from_rows, summary_from_row};
use crate::dispatch::{Outcome, dispatch};
use crate::error::AppError;
use crate::state::{AppState, with_db};
use crate::views::{
    AllSheetsTemplate, FormError, IndexTemplate, PageFeedback, SheetCard, SheetTemplate,
};

const RECENT_SHEETS: u32 = 10;
const TOP_SHEETS: u32 = 10;

/// Start page. Visitors only see the most popular sheets.
pub async fn index(State(state): State<AppState>, jar: CookieJar) -> Result<Response, AppError> {
    let claims = read_session(&jar, &state.session_secret);
    let owner = claims.as_ref().map(|c| c.sub.to_string());

    let (mine, top) = with_db(&state, move |db| {
        let mine = match owner {
            Some(owner) => db.recent_user_sheets(&owner, RECENT_SHEETS)?,
            None => Vec::new(),
        };
        let top = db.popular_sheets(TOP_SHEETS)?;
        Ok((mine, top))
    })
    .await?;

    let page = IndexTemplate {
        nav_user: claims.map(|c| c.username),
        user_sheets: cards(mine),
        top_sheets: cards(top),
    };
    Ok(Html(page.render()?).into_response())
}

pub async fn all_sheets(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Response, AppError> {
    let owner = claims.sub.to_string();
    let rows = with_db(&state, move |db| Ok(db.user_sheets(&owner)?)).await?;

    let page = AllSheetsTemplate {
        nav_user: Some(claims.username),
        sheets: cards(rows),
    };
    Ok(Html(page.render()?).into_response())
}

pub async fn create_sheet(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Redirect, AppError> {
    let sheet_id = Uuid::new_v4();
    let owner = claims.sub.to_string();
    let from = state.default_from.clone();
    let to = state.default_to.clone();

    with_db(&state, move |db| {
        db.create_sheet(&sheet_id.to_string(), &owner, &from, &to)?;
        Ok(())
    })
    .await?;

    info!("User {} created sheet {}", claims.username, sheet_id);
    Ok(Redirect::to(&format!("/sheets/{sheet_id}")))
}

pub async fn show_sheet(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(raw_id): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response, AppError> {
    let sheet_id = parse_sheet_id(&raw_id)?;
    render_sheet(
        &state,
        &claims,
        sheet_id,
        &SheetLocation::new(params),
        PageFeedback::default(),
        StatusCode::OK,
    )
    .await
}

/// Form endpoint for every sheet action. The query string is the page
/// location the form was submitted from.
pub async fn sheet_action(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(raw_id): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let json = wants_json(&headers);
    let location = SheetLocation::new(params);
    let lookup_word = fields
        .get("word")
        .map(|w| w.trim().to_string())
        .unwrap_or_default();

    let result = match parse_sheet_id(&raw_id) {
        Ok(sheet_id) => run_action(&state, &claims, sheet_id, &fields)
            .await
            .map(|(action, outcome)| (sheet_id, action, outcome)),
        Err(e) => Err(e),
    };

    match result {
        Ok((_, _, outcome)) if json => match outcome {
            Outcome::Done => Json(serde_json::json!({ "ok": true })).into_response(),
            Outcome::Suggestions(words) => {
                Json(serde_json::json!({ "words": words })).into_response()
            }
        },
        Ok((sheet_id, action, Outcome::Done)) => {
            let path = format!("/sheets/{sheet_id}");
            Redirect::to(&location.after(&action).href(&path)).into_response()
        }
        Ok((sheet_id, _, Outcome::Suggestions(suggestions))) => {
            let feedback = PageFeedback {
                lookup_word,
                suggestions,
                ..PageFeedback::default()
            };
            render_sheet(&state, &claims, sheet_id, &location, feedback, StatusCode::OK)
                .await
                .unwrap_or_else(IntoResponse::into_response)
        }
        Err(e) if json => e.into_json_response(),
        Err(e) => {
            let feedback = PageFeedback {
                lookup_word,
                submitted: fields,
                ..PageFeedback::default()
            };
            rerender_with_error(&state, &claims, &raw_id, &location, feedback, e).await
        }
    }
}

async fn run_action(
    state: &AppState,
    claims: &Claims,
    sheet_id: Uuid,
    fields: &HashMap<String, String>,
) -> Result<(Action, Outcome), AppError> {
    let action = Action::parse(fields)?;
    let submitted = action.clone();
    let user = claims.sub.to_string();

    let outcome = with_db(state, move |db| {
        let sheet = db
            .get_sheet(&sheet_id.to_string())?
            .ok_or_else(|| AppError::not_found("sheet", sheet_id))?;
        if action.is_mutation() && sheet.created_by != user {
            return Err(AppError::Forbidden);
        }
        dispatch(db, sheet_id, action)
    })
    .await?;

    Ok((submitted, outcome))
}

/// A rejected submit leaves the page where it was, edit flags and typed
/// values included, and shows the error above the word list.
async fn rerender_with_error(
    state: &AppState,
    claims: &Claims,
    raw_id: &str,
    location: &SheetLocation,
    feedback: PageFeedback,
    err: AppError,
) -> Response {
    let page_survives = !matches!(
        err,
        AppError::Internal(_) | AppError::NotFound { entity: "sheet", .. }
    );
    let sheet_id = match parse_sheet_id(raw_id) {
        Ok(id) if page_survives => id,
        _ => return err.into_response(),
    };

    err.log();
    let status = err.status();
    let feedback = PageFeedback {
        error: Some(FormError {
            field: err.field(),
            message: err.public_message(),
        }),
        ..feedback
    };
    render_sheet(state, claims, sheet_id, location, feedback, status)
        .await
        .unwrap_or_else(IntoResponse::into_response)
}

async fn render_sheet(
    state: &AppState,
    claims: &Claims,
    sheet_id: Uuid,
    location: &SheetLocation,
    feedback: PageFeedback,
    status: StatusCode,
) -> Result<Response, AppError> {
    let direction = location.sort();
    let (sheet, languages) = with_db(state, move |db| {
        let mut sheet = load_sheet(db, sheet_id)?;
        sort_groups(&mut sheet.translation_groups, &sheet.from_language, direction)
            .map_err(anyhow::Error::from)?;
        Ok((sheet, db.language_names()?))
    })
    .await?;

    debug!(sheet_id = %sheet_id, groups = sheet.translation_groups.len(), "Rendering sheet");
    let owner = sheet.is_owned_by(claims.sub);
    let page = SheetTemplate::build(
        &sheet,
        &languages,
        location,
        Some(claims.username.clone()),
        owner,
        feedback,
    );
    Ok((status, Html(page.render()?)).into_response())
}

/// Loads a sheet with its groups in insertion order.
pub fn load_sheet(db: &Database, sheet_id: Uuid) -> Result<Sheet, AppError> {
    let id = sheet_id.to_string();
    let row = db
        .get_sheet(&id)?
        .ok_or_else(|| AppError::not_found("sheet", &id))?;
    let group_ids = db.get_sheet_group_ids(&id)?;
    let words = db.get_sheet_words(&id)?;
    let tags = db.get_sheet_tags(&id)?;
    Ok(sheet_from_rows(row, group_ids, words, tags))
}

/// Malformed ids can never name a sheet, so they are reported as missing.
pub fn parse_sheet_id(raw: &str) -> Result<Uuid, AppError> {
    raw.parse().map_err(|_| AppError::not_found("sheet", raw))
}

fn wants_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("application/json"))
}

fn cards(rows: Vec<cheatsheet_db::models::SheetSummaryRow>) -> Vec<SheetCard> {
    rows.into_iter()
        .map(summary_from_row)
        .map(SheetCard::from)
        .collect()
}
