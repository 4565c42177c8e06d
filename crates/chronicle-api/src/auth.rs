use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Extension, Form,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::info;
use uuid::Uuid;

use chronicle_types::forms::{LoginForm, RegisterForm};

use crate::flash::{self, FlashLevel, IncomingFlashes};
use crate::identity::{CurrentUser, SESSION_USER_ID_KEY};
use crate::validate::FormCheck;
use crate::{AppState, views, with_db};

pub async fn register_form(
    Extension(current): Extension<CurrentUser>,
    Extension(flashes): Extension<IncomingFlashes>,
) -> Html<String> {
    views::register_page(&current, &flashes.0, &RegisterForm::default(), &[])
}

pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Extension(current): Extension<CurrentUser>,
    Extension(flashes): Extension<IncomingFlashes>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, StatusCode> {
    let taken = if form.username.trim().is_empty() {
        false
    } else {
        let username = form.username.clone();
        with_db(&state, move |db| db.get_user_by_username(&username))
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
            .is_some()
    };

    let errors = FormCheck::new()
        .required("name", &form.name, "Name is required")
        .required("email", &form.email, "Email is required")
        .email("email", &form.email, "Email is not valid")
        .required("username", &form.username, "Username is required")
        .custom("username", taken, &form.username, "Username is already taken")
        .required("password", &form.password, "Password is required")
        .equals(
            "password2",
            &form.password2,
            &form.password,
            "Passwords do not match",
        )
        .finish();

    if !errors.is_empty() {
        return Ok(views::register_page(&current, &flashes.0, &form, &errors).into_response());
    }

    // Hash password with Argon2id
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(form.password.as_bytes(), &salt)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .to_string();

    let user_id = Uuid::new_v4();
    let row = (
        user_id.to_string(),
        form.name.clone(),
        form.email.clone(),
        form.username.clone(),
        password_hash,
    );
    with_db(&state, move |db| {
        db.create_user(&row.0, &row.1, &row.2, &row.3, &row.4)
    })
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    info!("registered user {} ({})", form.username, user_id);

    flash::push(
        &session,
        FlashLevel::Success,
        "You are now registered and can log in",
    )
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Redirect::to("/users/login").into_response())
}

pub async fn login_form(
    Extension(current): Extension<CurrentUser>,
    Extension(flashes): Extension<IncomingFlashes>,
) -> Html<String> {
    views::login_page(&current, &flashes.0)
}

pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, StatusCode> {
    let username = form.username.clone();
    let user = with_db(&state, move |db| db.get_user_by_username(&username))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let verified = user.filter(|row| {
        PasswordHash::new(&row.password)
            .map(|hash| {
                Argon2::default()
                    .verify_password(form.password.as_bytes(), &hash)
                    .is_ok()
            })
            .unwrap_or(false)
    });

    let Some(row) = verified else {
        flash::push(&session, FlashLevel::Danger, "Invalid username or password")
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        return Ok(Redirect::to("/users/login").into_response());
    };
    let user_id: Uuid = row
        .id
        .parse()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    // Fresh session id on privilege change
    session
        .cycle_id()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    session
        .insert(SESSION_USER_ID_KEY, user_id)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    info!("user {} logged in", row.username);
    Ok(Redirect::to("/").into_response())
}

pub async fn logout(session: Session) -> Result<Response, StatusCode> {
    session
        .remove::<Uuid>(SESSION_USER_ID_KEY)
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    session
        .cycle_id()
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    flash::push(&session, FlashLevel::Success, "You are logged out")
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Redirect::to("/users/login").into_response())
}
