//! Page layout and static assets shared by the HTML routes

use axum::{
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};

use crate::vocab::Stage;

const STYLE_CSS: &str = include_str!("../ui/style.css");

/// GET /static/style.css
pub async fn serve_style_css() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/css")],
        STYLE_CSS,
    )
        .into_response()
}

/// GET /about
pub async fn about_page() -> Html<String> {
    let body = format!(
        r#"<h1>About</h1>
<p>This site collects anonymous career histories and shows how people move
between kinds of work.</p>
<p>Each submission is a comma-separated list of stages, oldest first, each
optionally followed by the number of years spent there, for example
<code>undergrad 4, postgrad 3.5, postdoc 2 years, government</code>.
Every stage is matched to the closest entry of the fixed vocabulary below,
so small misspellings are fine.</p>
{vocab}
<p>Only aggregate counts are kept for the charts: how often each transition
happens, time spent per stage, where careers currently end and how long they
are overall.</p>"#,
        vocab = vocabulary_list(),
    );
    Html(layout("About", &body))
}

/// Wrap a page body in the shared document skeleton
pub fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} - Career Paths</title>
<link rel="stylesheet" href="/static/style.css">
</head>
<body>
<header><a href="/">Submit</a><a href="/plot">Charts</a><a href="/about">About</a></header>
<main>
{body}
</main>
</body>
</html>
"#,
        title = html_escape(title),
    )
}

/// The fixed stage vocabulary as inline code chips
pub fn vocabulary_list() -> String {
    let chips: Vec<String> = Stage::ALL
        .iter()
        .map(|stage| format!("<code>{}</code>", html_escape(stage.as_str())))
        .collect();
    format!(r#"<p class="vocab">{}</p>"#, chips.join(" "))
}

/// Escape text for HTML element content and quoted attribute values
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
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
