//! Server-rendered HTML pages: a shared layout plus one render function per
//! page. All user-supplied text goes through [`escape`].

use axum::response::Html;

use chronicle_db::models::ArticleRow;
use chronicle_types::forms::{ArticleForm, RegisterForm};

use crate::flash::{FlashLevel, FlashMessage};
use crate::identity::CurrentUser;
use crate::validate::FieldError;

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(
    title: &str,
    current_user: &CurrentUser,
    flashes: &[FlashMessage],
    body: &str,
) -> Html<String> {
    let nav_user = match &current_user.0 {
        Some(user) => format!(
            r#"<a href="/articles/new">New Article</a> <span class="nav-user">{}</span> <a href="/users/logout">Logout</a>"#,
            escape(&user.username)
        ),
        None => {
            r#"<a href="/users/register">Register</a> <a href="/users/login">Login</a>"#.to_string()
        }
    };

    let mut flash_html = String::new();
    for flash in flashes {
        let class = match flash.level {
            FlashLevel::Success => "flash flash-success",
            FlashLevel::Danger => "flash flash-danger",
        };
        flash_html.push_str(&format!(
            r#"<div class="{}">{}</div>"#,
            class,
            escape(&flash.text)
        ));
    }

    Html(format!(
        r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<link rel="stylesheet" href="/public/css/style.css">
</head>
<body>
<nav><a href="/">Home</a> <a href="/chat">Chat</a> <span class="nav-right">{nav_user}</span></nav>
{flash_html}
<main>
{body}
</main>
<script src="/public/js/main.js"></script>
</body>
</html>"#,
        title = escape(title),
    ))
}

fn errors_for(errors: &[FieldError], param: &str) -> String {
    let mut out = String::new();
    for error in errors.iter().filter(|e| e.param == param) {
        out.push_str(&format!(
            r#"<p class="field-error">{}</p>"#,
            escape(&error.msg)
        ));
    }
    out
}

pub fn home_page(
    current_user: &CurrentUser,
    flashes: &[FlashMessage],
    articles: &[ArticleRow],
) -> Html<String> {
    let mut items = String::new();
    for article in articles {
        items.push_str(&format!(
            r#"<li><a href="/articles/{}">{}</a></li>"#,
            escape(&article.id),
            escape(&article.title)
        ));
    }

    let body = format!("<h1>Articles</h1>\n<ul class=\"articles\">{}</ul>", items);
    layout("Chronicle", current_user, flashes, &body)
}

pub fn chat_page(current_user: &CurrentUser, flashes: &[FlashMessage]) -> Html<String> {
    let body = r#"<h1>Chat</h1>
<div id="chat-window">
  <div id="output"></div>
  <div id="feedback"></div>
</div>
<input id="handle" type="text" placeholder="Handle">
<input id="message" type="text" placeholder="Message">
<button id="send">Send</button>
<script src="/public/js/chat.js"></script>"#;
    layout("Chronicle Chat", current_user, flashes, body)
}

pub fn article_page(
    current_user: &CurrentUser,
    flashes: &[FlashMessage],
    article: &ArticleRow,
) -> Html<String> {
    let is_author = current_user
        .0
        .as_ref()
        .is_some_and(|user| user.id.to_string() == article.author_id);

    let controls = if is_author {
        format!(
            r#"<a href="/articles/{id}/edit">Edit</a>
<button class="delete-article" data-id="{id}">Delete</button>"#,
            id = escape(&article.id)
        )
    } else {
        String::new()
    };

    let body = format!(
        r#"<h1>{title}</h1>
<p class="meta">Written by {author} on {date}</p>
<p>{text}</p>
{controls}"#,
        title = escape(&article.title),
        author = escape(&article.author_name),
        date = escape(&article.created_at),
        text = escape(&article.body),
    );
    layout(&article.title, current_user, flashes, &body)
}

pub fn article_form(
    current_user: &CurrentUser,
    flashes: &[FlashMessage],
    heading: &str,
    action: &str,
    form: &ArticleForm,
    errors: &[FieldError],
) -> Html<String> {
    let body = format!(
        r#"<h1>{heading}</h1>
<form method="post" action="{action}">
  <label>Title</label>
  <input type="text" name="title" value="{title}">
  {title_errors}
  <label>Body</label>
  <textarea name="body">{text}</textarea>
  {body_errors}
  <button type="submit">Submit</button>
</form>"#,
        heading = escape(heading),
        action = escape(action),
        title = escape(&form.title),
        title_errors = errors_for(errors, "title"),
        text = escape(&form.body),
        body_errors = errors_for(errors, "body"),
    );
    layout(heading, current_user, flashes, &body)
}

pub fn register_page(
    current_user: &CurrentUser,
    flashes: &[FlashMessage],
    form: &RegisterForm,
    errors: &[FieldError],
) -> Html<String> {
    let body = format!(
        r#"<h1>Register</h1>
<form method="post" action="/users/register">
  <label>Name</label>
  <input type="text" name="name" value="{name}">
  {name_errors}
  <label>Email</label>
  <input type="text" name="email" value="{email}">
  {email_errors}
  <label>Username</label>
  <input type="text" name="username" value="{username}">
  {username_errors}
  <label>Password</label>
  <input type="password" name="password">
  {password_errors}
  <label>Confirm Password</label>
  <input type="password" name="password2">
  {password2_errors}
  <button type="submit">Submit</button>
</form>"#,
        name = escape(&form.name),
        name_errors = errors_for(errors, "name"),
        email = escape(&form.email),
        email_errors = errors_for(errors, "email"),
        username = escape(&form.username),
        username_errors = errors_for(errors, "username"),
        password_errors = errors_for(errors, "password"),
        password2_errors = errors_for(errors, "password2"),
    );
    layout("Register", current_user, flashes, &body)
}

pub fn login_page(current_user: &CurrentUser, flashes: &[FlashMessage]) -> Html<String> {
    let body = r#"<h1>Login</h1>
<form method="post" action="/users/login">
  <label>Username</label>
  <input type="text" name="username">
  <label>Password</label>
  <input type="password" name="password">
  <button type="submit">Submit</button>
</form>"#;
    layout("Login", current_user, flashes, body)
}

pub fn not_found_page(current_user: &CurrentUser, flashes: &[FlashMessage]) -> Html<String> {
    layout(
        "Not Found",
        current_user,
        flashes,
        "<h1>Not Found</h1>\n<p>The page you requested does not exist.</p>",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use chronicle_types::models::User;
    use uuid::Uuid;

    fn anonymous() -> CurrentUser {
        CurrentUser(None)
    }

    fn logged_in(username: &str) -> CurrentUser {
        CurrentUser(Some(User {
            id: Uuid::new_v4(),
            name: "Test".into(),
            email: "t@example.com".into(),
            username: username.into(),
            password: "hash".into(),
            created_at: Utc::now(),
        }))
    }

    #[test]
    fn escape_handles_markup() {
        assert_eq!(
            escape(r#"<script>alert("x&y")</script>"#),
            "&lt;script&gt;alert(&quot;x&amp;y&quot;)&lt;/script&gt;"
        );
    }

    #[test]
    fn article_titles_are_escaped_in_listing() {
        let articles = vec![ArticleRow {
            id: "abc".into(),
            title: "<b>bold</b>".into(),
            author_id: "x".into(),
            author_name: "Author".into(),
            body: "text".into(),
            created_at: "2026-01-01 00:00:00".into(),
        }];
        let Html(page) = home_page(&anonymous(), &[], &articles);
        assert!(page.contains("&lt;b&gt;bold&lt;/b&gt;"));
        assert!(!page.contains("<b>bold</b>"));
    }

    #[test]
    fn nav_reflects_authentication_state() {
        let Html(anon) = home_page(&anonymous(), &[], &[]);
        assert!(anon.contains("/users/login"));
        assert!(anon.contains("/users/register"));

        let Html(known) = home_page(&logged_in("alice"), &[], &[]);
        assert!(known.contains("alice"));
        assert!(known.contains("/users/logout"));
        assert!(!known.contains("/users/login\">Login"));
    }

    #[test]
    fn flashes_render_with_level_class() {
        let flashes = vec![FlashMessage {
            level: FlashLevel::Success,
            text: "Article added".into(),
        }];
        let Html(page) = home_page(&anonymous(), &flashes, &[]);
        assert!(page.contains("flash-success"));
        assert!(page.contains("Article added"));
    }

    #[test]
    fn form_errors_render_next_to_their_field() {
        let errors = vec![FieldError {
            param: "title".into(),
            msg: "Title is required".into(),
            value: String::new(),
        }];
        let Html(page) = article_form(
            &logged_in("alice"),
            &[],
            "Add Article",
            "/articles",
            &ArticleForm::default(),
            &errors,
        );
        assert!(page.contains("Title is required"));
    }
}
