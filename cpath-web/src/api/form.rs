//! Submission form

use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    Form,
};
use serde::Deserialize;
use tracing::info;

use crate::api::ui::{html_escape, layout, vocabulary_list};
use crate::charts::format_value;
use crate::db::{store_path, StoreSummary};
use crate::parser::{get_info, CareerPath};
use crate::{submissions, ApiResult, AppState};

/// Form body of `POST /`
#[derive(Debug, Deserialize)]
pub struct SubmitForm {
    #[serde(default)]
    pub data: String,
}

enum Notice<'a> {
    Stored(&'a CareerPath, &'a StoreSummary),
    Rejected(&'a str),
}

/// GET /
pub async fn show_form() -> Html<String> {
    Html(form_page(None, ""))
}

/// POST /
///
/// Logs the raw text, parses it and adds it to the aggregates.
pub async fn submit_form(
    State(state): State<AppState>,
    Form(form): Form<SubmitForm>,
) -> ApiResult<(StatusCode, Html<String>)> {
    let data = form.data.trim();
    if data.is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Html(form_page(
                Some(Notice::Rejected("Please describe your career path before submitting.")),
                "",
            )),
        ));
    }

    submissions::store_entry(&state.config.submissions_log, data).await?;

    let path = get_info(data);
    if path.is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Html(form_page(
                Some(Notice::Rejected("No career stages were found in that text.")),
                data,
            )),
        ));
    }

    let summary = store_path(&state.db, &path, state.config.bucket_width_years).await?;
    info!(
        stages = summary.stages,
        transitions = summary.transitions,
        "Stored submission"
    );

    Ok((
        StatusCode::OK,
        Html(form_page(Some(Notice::Stored(&path, &summary)), "")),
    ))
}

fn form_page(notice: Option<Notice<'_>>, previous: &str) -> String {
    let notice = match notice {
        Some(Notice::Stored(path, summary)) => stored_notice(path, summary),
        Some(Notice::Rejected(message)) => {
            format!(r#"<div class="notice error">{}</div>"#, html_escape(message))
        }
        None => String::new(),
    };

    let body = format!(
        r#"<h1>Share your career path</h1>
{notice}
<p>List the stages of your career so far, oldest first, separated by commas.
Add the number of years after each stage if you like.</p>
<form method="post" action="/">
<textarea name="data" placeholder="undergrad 4, postgrad 3, postdoc 2, government 5">{previous}</textarea>
<p><button type="submit">Submit</button></p>
</form>
<h2>Stages</h2>
{vocab}
<p><a href="/plot">See the charts</a></p>"#,
        previous = html_escape(previous),
        vocab = vocabulary_list(),
    );
    layout("Submit", &body)
}

fn stored_notice(path: &CareerPath, summary: &StoreSummary) -> String {
    let steps: Vec<String> = path
        .steps()
        .iter()
        .map(|step| match step.years {
            Some(years) => format!("{} ({} yrs)", step.stage, format_value(years)),
            None => step.stage.to_string(),
        })
        .map(|step| html_escape(&step))
        .collect();

    let total = match summary.total_years {
        Some(years) => format!(" over {} years", format_value(years)),
        None => String::new(),
    };

    format!(
        r#"<div class="notice ok">Thanks! Recorded {} stage(s){}: {}</div>"#,
        summary.stages,
        total,
        steps.join(" &rarr; "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_notice_lists_steps() {
        let path = get_info("undergrad 4, postdoc");
        let summary = StoreSummary {
            stages: 2,
            transitions: 1,
            total_years: Some(4.0),
            last_stage: path.last_stage(),
            bucket: Some(0),
        };
        let html = stored_notice(&path, &summary);
        assert!(html.contains("Recorded 2 stage(s) over 4 years"));
        assert!(html.contains("undergrad (4 yrs) &rarr; postdoc"));
    }

    #[test]
    fn test_form_page_escapes_previous_text() {
        let html = form_page(Some(Notice::Rejected("nope")), "<script>");
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains(r#"class="notice error">nope"#));
    }
}
