use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use askama::Template;
use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::info;
use uuid::Uuid;

use cheatsheet_types::auth::{Claims, CredentialsForm, FieldErrors};

use crate::error::AppError;
use crate::state::{AppState, with_db};
use crate::views::AuthTemplate;

pub const SESSION_COOKIE: &str = "cheatsheet_session";
const SESSION_DAYS: i64 = 30;

pub async fn register_page() -> Result<Response, AppError> {
    render_form(AuthTemplate::register(), StatusCode::OK)
}

pub async fn login_page() -> Result<Response, AppError> {
    render_form(AuthTemplate::login(), StatusCode::OK)
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    if let Err(errors) = form.validate_sign_up() {
        return render_form(
            AuthTemplate::register().with_errors(&form, errors, None),
            StatusCode::BAD_REQUEST,
        );
    }

    let username = form.username.clone();
    let password = form.password.clone();
    let created = with_db(&state, move |db| {
        if db.get_user_by_username(&username)?.is_some() {
            return Ok(None);
        }

        // Hash password with Argon2id
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?
            .to_string();

        let user_id = Uuid::new_v4();
        db.create_user(&user_id.to_string(), &username, &password_hash)?;
        Ok(Some(user_id))
    })
    .await?;

    let Some(user_id) = created else {
        let mut errors = FieldErrors::default();
        errors.set("username", format!("Username {} already taken", form.username));
        return render_form(
            AuthTemplate::register().with_errors(&form, errors, None),
            StatusCode::BAD_REQUEST,
        );
    };

    info!("Registered user {}", form.username);
    start_session(&state, jar, user_id, &form.username)
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<CredentialsForm>,
) -> Result<Response, AppError> {
    if let Err(errors) = form.validate_sign_in() {
        return render_form(
            AuthTemplate::login().with_errors(&form, errors, None),
            StatusCode::BAD_REQUEST,
        );
    }

    let username = form.username.clone();
    let password = form.password.clone();
    let user = with_db(&state, move |db| {
        let Some(user) = db.get_user_by_username(&username)? else {
            return Ok(None);
        };

        // Verify password
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|e| anyhow::anyhow!("stored password hash is invalid: {e}"))?;
        let verified = Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok();

        Ok(verified.then_some(user))
    })
    .await?;

    let Some(user) = user else {
        return render_form(
            AuthTemplate::login().with_errors(
                &form,
                FieldErrors::default(),
                Some("Username or password is incorrect".to_string()),
            ),
            StatusCode::BAD_REQUEST,
        );
    };

    let user_id: Uuid = user
        .id
        .parse()
        .map_err(|e| anyhow::anyhow!("corrupt user id '{}': {e}", user.id))?;
    start_session(&state, jar, user_id, &user.username)
}

pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/login"))
}

pub async fn logout_redirect() -> Redirect {
    Redirect::to("/")
}

pub fn create_token(secret: &str, user_id: Uuid, username: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(SESSION_DAYS)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

/// Claims of a valid session cookie, if the request carries one.
pub fn read_session(jar: &CookieJar, secret: &str) -> Option<Claims> {
    let token = jar.get(SESSION_COOKIE)?.value().to_string();
    decode::<Claims>(
        &token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

fn start_session(
    state: &AppState,
    jar: CookieJar,
    user_id: Uuid,
    username: &str,
) -> Result<Response, AppError> {
    let token = create_token(&state.session_secret, user_id, username)?;
    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.secure_cookies);

    Ok((jar.add(cookie), Redirect::to("/")).into_response())
}

fn render_form(page: AuthTemplate, status: StatusCode) -> Result<Response, AppError> {
    Ok((status, Html(page.render()?)).into_response())
}
