//! Chart page

use axum::{
    extract::{Query, State},
    response::Html,
};
use tracing::debug;

use crate::api::ui::{html_escape, layout};
use crate::charts::{render_all, Chart, ChartOptions, PlotQuery, Scale};
use crate::db::load_snapshot;
use crate::{ApiResult, AppState};

/// GET /plot
///
/// Query parameters: `scale` (total|mean|share), `log`, `drop` (comma-separated
/// stage labels) and `seed` (network layout).
pub async fn plot_page(
    State(state): State<AppState>,
    Query(query): Query<PlotQuery>,
) -> ApiResult<Html<String>> {
    let options = ChartOptions::try_from(query)?;
    let snapshot = load_snapshot(&state.db).await?;
    let charts = render_all(&snapshot, &options, state.config.bucket_width_years)?;

    debug!(
        submissions = snapshot.submissions,
        charts = charts.len(),
        "Rendered plot page"
    );

    Ok(Html(render_page(&charts, &options, snapshot.submissions)))
}

fn render_page(charts: &[Chart], options: &ChartOptions, submissions: u64) -> String {
    let figures: Vec<String> = charts
        .iter()
        .map(|chart| {
            format!(
                r#"<figure><img src="{src}" alt="{title}"><figcaption>{title}</figcaption></figure>"#,
                src = chart.data_uri(),
                title = html_escape(&chart.title),
            )
        })
        .collect();

    let body = format!(
        r#"<h1>Career path charts</h1>
<p>Based on {submissions} submission(s).</p>
{options_form}
<p><a href="/plot?{permalink}">Link to this view</a></p>
{figures}"#,
        options_form = options_form(options),
        permalink = html_escape(&options.to_query_string()),
        figures = figures.join("\n"),
    );
    layout("Charts", &body)
}

fn options_form(options: &ChartOptions) -> String {
    let scale_options: Vec<String> = [Scale::Total, Scale::Mean, Scale::Share]
        .iter()
        .map(|scale| {
            let selected = if *scale == options.scale { " selected" } else { "" };
            format!(r#"<option value="{scale}"{selected}>{scale}</option>"#)
        })
        .collect();

    let drop: Vec<&str> = options.drop.iter().map(|stage| stage.as_str()).collect();

    format!(
        r#"<form class="options" method="get" action="/plot">
<label>Scale <select name="scale">{scales}</select></label>
<label><input type="checkbox" name="log" value="true"{log}> Log axis</label>
<label>Hide stages <input type="text" name="drop" value="{drop}" placeholder="retired,other"></label>
<input type="hidden" name="seed" value="{seed}">
<button type="submit">Update</button>
</form>"#,
        scales = scale_options.join(""),
        log = if options.log { " checked" } else { "" },
        drop = html_escape(&drop.join(",")),
        seed = options.seed,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::Stage;

    #[test]
    fn test_options_form_reflects_options() {
        let mut options = ChartOptions {
            scale: Scale::Share,
            log: true,
            ..Default::default()
        };
        options.drop.insert(Stage::Retired);

        let html = options_form(&options);
        assert!(html.contains(r#"<option value="share" selected>share</option>"#));
        assert!(html.contains(r#"value="true" checked"#));
        assert!(html.contains(r#"value="retired""#));
    }

    #[test]
    fn test_render_page_embeds_data_uris() {
        let charts = vec![Chart {
            title: "Years per stage".to_string(),
            svg: "<svg></svg>".to_string(),
        }];
        let html = render_page(&charts, &ChartOptions::default(), 3);
        assert!(html.contains("Based on 3 submission(s)."));
        assert!(html.contains(r#"src="data:image/svg+xml;base64,"#));
        assert!(html.contains("<figcaption>Years per stage</figcaption>"));
    }
}
