//! Built-in HTML views rendered with minijinja.
//!
//! Templates are compiled in; names end in `.html` so minijinja auto-escapes
//! every interpolated value.

use axum::response::Html;
use duet_core::Message;
use minijinja::{context, Environment, Value};

use crate::error::ServerError;

const LAYOUT: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="robots" content="noindex, nofollow, noarchive">
<title>{% block title %}duet{% endblock %}</title>
</head>
<body>
{% block body %}{% endblock %}
</body>
</html>
"#;

const LOGIN: &str = r#"{% extends "layout.html" %}
{% block title %}Sign in{% endblock %}
{% block body %}
<form method="post" action="/login">
  {% if error %}<p class="error">{{ error }}</p>{% endif %}
  <label>Username <input name="username" autocomplete="username"></label>
  <label>Password <input name="password" type="password" autocomplete="current-password"></label>
  <button type="submit">Sign in</button>
</form>
{% endblock %}
"#;

const SELECT: &str = r#"{% extends "layout.html" %}
{% block title %}Who are you?{% endblock %}
{% block body %}
<form method="post" action="{{ action }}">
  {% for role in roles %}
  <button type="submit" name="user" value="{{ role }}">{{ role }}</button>
  {% endfor %}
</form>
{% endblock %}
"#;

const SEND: &str = r#"{% extends "layout.html" %}
{% block title %}Send{% endblock %}
{% block body %}
<p>{% if user %}{{ user }} / {% endif %}{{ character }}</p>
<form method="post" action="{{ action }}">
  <textarea name="content" maxlength="{{ max_chars }}" required></textarea>
  <button type="submit">Send</button>
</form>
<nav><a href="{{ log_link }}">Log</a> <a href="/logout">Leave</a></nav>
{% endblock %}
"#;

const LOG: &str = r#"{% extends "layout.html" %}
{% block title %}Log{% endblock %}
{% block body %}
<ol class="log">
  {% for m in rows %}
  <li><span class="sender">{{ m.sender }}</span> <time>{{ m.created_at }}</time> <span class="content">{{ m.content }}</span></li>
  {% else %}
  <li class="empty">No messages yet.</li>
  {% endfor %}
</ol>
<nav><a href="{{ send_link }}">Send</a> <a href="/logout">Leave</a></nav>
{% endblock %}
"#;

const GALLERY: &str = r#"{% extends "layout.html" %}
{% block title %}Gallery{% endblock %}
{% block body %}
<p>Nothing to see here yet.</p>
<nav><a href="/send">Send</a> <a href="/log">Log</a></nav>
{% endblock %}
"#;

#[derive(Debug)]
pub struct Views {
    env: Environment<'static>,
}

impl Views {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("layout.html", LAYOUT)?;
        env.add_template("login.html", LOGIN)?;
        env.add_template("select.html", SELECT)?;
        env.add_template("send.html", SEND)?;
        env.add_template("log.html", LOG)?;
        env.add_template("gallery.html", GALLERY)?;
        Ok(Self { env })
    }

    fn render(&self, name: &str, ctx: Value) -> Result<Html<String>, ServerError> {
        Ok(Html(self.env.get_template(name)?.render(ctx)?))
    }

    pub fn login(&self, error: Option<&str>) -> Result<Html<String>, ServerError> {
        self.render("login.html", context! { error })
    }

    pub fn select(&self, action: &str, roles: &[&str]) -> Result<Html<String>, ServerError> {
        self.render("select.html", context! { action, roles })
    }

    pub fn send(
        &self,
        action: &str,
        log_link: &str,
        user: Option<&str>,
        character: &str,
        max_chars: usize,
    ) -> Result<Html<String>, ServerError> {
        self.render(
            "send.html",
            context! { action, log_link, user, character, max_chars },
        )
    }

    pub fn log(&self, rows: &[Message], send_link: &str) -> Result<Html<String>, ServerError> {
        self.render("log.html", context! { rows, send_link })
    }

    pub fn gallery(&self) -> Result<Html<String>, ServerError> {
        self.render("gallery.html", context! {})
    }
}
