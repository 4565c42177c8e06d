use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use tower_sessions::Session;
use tracing::info;
use uuid::Uuid;

use chronicle_types::forms::ArticleForm;
use chronicle_types::models::{Article, User};

use crate::flash::{self, FlashLevel, IncomingFlashes};
use crate::identity::CurrentUser;
use crate::validate::FormCheck;
use crate::{AppState, views, with_db};

/// Resolve the logged-in user or produce the login redirect with a notice.
async fn require_login(session: &Session, current: &CurrentUser) -> Result<User, Response> {
    match &current.0 {
        Some(user) => Ok(user.clone()),
        None => {
            if flash::push(session, FlashLevel::Danger, "Please login")
                .await
                .is_err()
            {
                return Err(StatusCode::INTERNAL_SERVER_ERROR.into_response());
            }
            Err(Redirect::to("/users/login").into_response())
        }
    }
}

fn check_article(form: &ArticleForm) -> Vec<crate::validate::FieldError> {
    FormCheck::new()
        .required("title", &form.title, "Title is required")
        .required("body", &form.body, "Body is required")
        .finish()
}

pub async fn new_form(
    session: Session,
    Extension(current): Extension<CurrentUser>,
    Extension(flashes): Extension<IncomingFlashes>,
) -> Result<Response, StatusCode> {
    if let Err(redirect) = require_login(&session, &current).await {
        return Ok(redirect);
    }

    Ok(views::article_form(
        &current,
        &flashes.0,
        "Add Article",
        "/articles",
        &ArticleForm::default(),
        &[],
    )
    .into_response())
}

pub async fn create(
    State(state): State<AppState>,
    session: Session,
    Extension(current): Extension<CurrentUser>,
    Extension(flashes): Extension<IncomingFlashes>,
    Form(form): Form<ArticleForm>,
) -> Result<Response, StatusCode> {
    let author = match require_login(&session, &current).await {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };

    let errors = check_article(&form);
    if !errors.is_empty() {
        return Ok(views::article_form(
            &current,
            &flashes.0,
            "Add Article",
            "/articles",
            &form,
            &errors,
        )
        .into_response());
    }

    let article = Article {
        id: Uuid::new_v4(),
        title: form.title,
        author_id: author.id,
        body: form.body,
        created_at: Utc::now(),
    };

    let row = (
        article.id.to_string(),
        article.title,
        article.author_id.to_string(),
        article.body,
    );
    with_db(&state, move |db| {
        db.insert_article(&row.0, &row.1, &row.2, &row.3)
    })
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    info!("article {} added by {}", article.id, author.username);

    flash::push(&session, FlashLevel::Success, "Article added")
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Redirect::to("/").into_response())
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(current): Extension<CurrentUser>,
    Extension(flashes): Extension<IncomingFlashes>,
) -> Result<Response, StatusCode> {
    let lookup = id.clone();
    let article = with_db(&state, move |db| db.get_article(&lookup))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(match article {
        Some(article) => views::article_page(&current, &flashes.0, &article).into_response(),
        // unknown id falls through to the not-found view
        None => views::not_found_page(&current, &flashes.0).into_response(),
    })
}

pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
    session: Session,
    Extension(current): Extension<CurrentUser>,
    Extension(flashes): Extension<IncomingFlashes>,
) -> Result<Response, StatusCode> {
    let user = match require_login(&session, &current).await {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };

    let lookup = id.clone();
    let article = with_db(&state, move |db| db.get_article(&lookup))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let Some(article) = article else {
        return Ok(views::not_found_page(&current, &flashes.0).into_response());
    };

    if article.author_id != user.id.to_string() {
        flash::push(&session, FlashLevel::Danger, "Not authorized")
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        return Ok(Redirect::to("/").into_response());
    }

    let form = ArticleForm {
        title: article.title,
        body: article.body,
    };
    Ok(views::article_form(
        &current,
        &flashes.0,
        "Edit Article",
        &format!("/articles/{}", id),
        &form,
        &[],
    )
    .into_response())
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    session: Session,
    Extension(current): Extension<CurrentUser>,
    Extension(flashes): Extension<IncomingFlashes>,
    Form(form): Form<ArticleForm>,
) -> Result<Response, StatusCode> {
    let user = match require_login(&session, &current).await {
        Ok(user) => user,
        Err(redirect) => return Ok(redirect),
    };

    let lookup = id.clone();
    let article = with_db(&state, move |db| db.get_article(&lookup))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    let Some(article) = article else {
        return Ok(views::not_found_page(&current, &flashes.0).into_response());
    };

    if article.author_id != user.id.to_string() {
        flash::push(&session, FlashLevel::Danger, "Not authorized")
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        return Ok(Redirect::to("/").into_response());
    }

    let errors = check_article(&form);
    if !errors.is_empty() {
        return Ok(views::article_form(
            &current,
            &flashes.0,
            "Edit Article",
            &format!("/articles/{}", id),
            &form,
            &errors,
        )
        .into_response());
    }

    let row = (id.clone(), form.title, form.body);
    with_db(&state, move |db| db.update_article(&row.0, &row.1, &row.2))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    info!("article {} updated by {}", id, user.username);

    flash::push(&session, FlashLevel::Success, "Article updated")
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Redirect::to("/").into_response())
}

/// Author-only delete, driven by the browser helper in `public/js/main.js`,
/// which issues the request and then navigates home on the `Success` reply.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Response, StatusCode> {
    let Some(user) = current.0 else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    let lookup = id.clone();
    let article = with_db(&state, move |db| db.get_article(&lookup))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or(StatusCode::NOT_FOUND)?;

    if article.author_id != user.id.to_string() {
        return Err(StatusCode::FORBIDDEN);
    }

    let target = id.clone();
    with_db(&state, move |db| db.delete_article(&target))
        .await
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    info!("article {} deleted by {}", id, user.username);
    Ok("Success".into_response())
}
