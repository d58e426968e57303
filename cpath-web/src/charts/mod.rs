//! Chart rendering
//!
//! Charts are drawn with plotters' SVG backend and handed to the HTML layer
//! as base64 data URIs, so pages embed them with a plain `<img>` tag.

pub mod bars;
pub mod network;

use base64::{engine::general_purpose, Engine as _};
use plotters::drawing::DrawingAreaErrorKind;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use crate::db::Snapshot;
use crate::vocab::Stage;

pub use bars::{render_career_length, render_last_stage, render_stage_years};
pub use network::{get_network, render_network, spring_layout, TransitionGraph};

/// Default chart size in pixels
pub const CHART_WIDTH: u32 = 800;
pub const CHART_HEIGHT: u32 = 500;

/// Default layout seed when the query string gives none
pub const DEFAULT_SEED: u64 = 42;

/// Chart rendering errors
#[derive(Debug, Error)]
pub enum ChartError {
    /// Query-string option could not be understood
    #[error("Invalid chart option: {0}")]
    InvalidOption(String),

    /// Drawing backend failure
    #[error("Chart rendering failed: {0}")]
    Render(String),
}

impl<E> From<DrawingAreaErrorKind<E>> for ChartError
where
    E: std::error::Error + Send + Sync,
{
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        ChartError::Render(err.to_string())
    }
}

/// How stage values are scaled before plotting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Scale {
    /// Raw sums / counts
    #[default]
    Total,
    /// Years per visit (stage-years chart only; counts elsewhere)
    Mean,
    /// Percentage of the plotted total
    Share,
}

impl FromStr for Scale {
    type Err = ChartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "total" => Ok(Scale::Total),
            "mean" => Ok(Scale::Mean),
            "share" => Ok(Scale::Share),
            other => Err(ChartError::InvalidOption(format!(
                "scale must be one of total, mean, share (got {:?})",
                other
            ))),
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Scale::Total => "total",
            Scale::Mean => "mean",
            Scale::Share => "share",
        })
    }
}

/// Raw query string for `/plot`
#[derive(Debug, Default, Deserialize)]
pub struct PlotQuery {
    pub scale: Option<String>,
    pub log: Option<String>,
    /// Comma-separated stage labels to leave out
    pub drop: Option<String>,
    pub seed: Option<u64>,
}

/// Validated rendering options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartOptions {
    pub scale: Scale,
    /// Logarithmic value axis
    pub log: bool,
    /// Stages excluded from every chart
    pub drop: BTreeSet<Stage>,
    /// Network layout seed
    pub seed: u64,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            scale: Scale::Total,
            log: false,
            drop: BTreeSet::new(),
            seed: DEFAULT_SEED,
        }
    }
}

impl TryFrom<PlotQuery> for ChartOptions {
    type Error = ChartError;

    fn try_from(query: PlotQuery) -> Result<Self, Self::Error> {
        let scale = match query.scale.as_deref() {
            Some(raw) => raw.parse()?,
            None => Scale::default(),
        };

        let log = query.log.as_deref().map(is_truthy).unwrap_or(false);

        let mut drop = BTreeSet::new();
        for label in query.drop.as_deref().unwrap_or("").split(',') {
            let label = label.trim();
            if label.is_empty() {
                continue;
            }
            match label.parse::<Stage>() {
                Ok(stage) => {
                    drop.insert(stage);
                }
                Err(_) => debug!(label, "Ignoring unknown stage in drop list"),
            }
        }

        Ok(Self {
            scale,
            log,
            drop,
            seed: query.seed.unwrap_or(DEFAULT_SEED),
        })
    }
}

impl ChartOptions {
    /// Query string reproducing these options (for links between views)
    pub fn to_query_string(&self) -> String {
        let mut parts = vec![format!("scale={}", self.scale)];
        if self.log {
            parts.push("log=true".to_string());
        }
        if !self.drop.is_empty() {
            // "e&p" would otherwise split the query string
            let labels: Vec<String> = self
                .drop
                .iter()
                .map(|s| s.as_str().replace('&', "%26"))
                .collect();
            parts.push(format!("drop={}", labels.join(",")));
        }
        if self.seed != DEFAULT_SEED {
            parts.push(format!("seed={}", self.seed));
        }
        parts.join("&")
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}

/// A rendered chart
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub title: String,
    pub svg: String,
}

impl Chart {
    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(self.svg.as_bytes())
    }

    /// `data:` URI suitable for an `<img src=...>`
    pub fn data_uri(&self) -> String {
        format!("data:image/svg+xml;base64,{}", self.to_base64())
    }
}

/// Render every chart shown on the plot page, in display order
pub fn render_all(
    snapshot: &Snapshot,
    options: &ChartOptions,
    bucket_width: u32,
) -> Result<Vec<Chart>, ChartError> {
    let graph = get_network(snapshot, &options.drop);
    Ok(vec![
        render_network(&graph, options)?,
        render_stage_years(snapshot, options)?,
        render_last_stage(snapshot, options)?,
        render_career_length(snapshot, options, bucket_width)?,
    ])
}

/// Short numeric label: integers without decimals, otherwise one decimal
pub(crate) fn format_value(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(scale: Option<&str>, log: Option<&str>, drop: Option<&str>) -> PlotQuery {
        PlotQuery {
            scale: scale.map(String::from),
            log: log.map(String::from),
            drop: drop.map(String::from),
            seed: None,
        }
    }

    #[test]
    fn test_default_options() {
        let options = ChartOptions::try_from(PlotQuery::default()).unwrap();
        assert_eq!(options, ChartOptions::default());
    }

    #[test]
    fn test_parse_options() {
        let options =
            ChartOptions::try_from(query(Some("Share"), Some("on"), Some("postdoc, other"))).unwrap();
        assert_eq!(options.scale, Scale::Share);
        assert!(options.log);
        assert_eq!(
            options.drop.into_iter().collect::<Vec<_>>(),
            vec![Stage::Postdoc, Stage::Other]
        );
    }

    #[test]
    fn test_log_flag_values() {
        for yes in ["1", "true", "TRUE", "on", "yes"] {
            assert!(ChartOptions::try_from(query(None, Some(yes), None)).unwrap().log);
        }
        for no in ["0", "false", "off", ""] {
            assert!(!ChartOptions::try_from(query(None, Some(no), None)).unwrap().log);
        }
    }

    #[test]
    fn test_unknown_drop_labels_ignored() {
        let options = ChartOptions::try_from(query(None, None, Some("astronaut,,mining"))).unwrap();
        assert_eq!(options.drop.into_iter().collect::<Vec<_>>(), vec![Stage::Mining]);
    }

    #[test]
    fn test_invalid_scale_rejected() {
        let result = ChartOptions::try_from(query(Some("cubic"), None, None));
        assert!(matches!(result, Err(ChartError::InvalidOption(_))));
    }

    #[test]
    fn test_query_string_round_trip() {
        let options = ChartOptions::try_from(PlotQuery {
            scale: Some("mean".to_string()),
            log: Some("1".to_string()),
            drop: Some("other,noc".to_string()),
            seed: Some(7),
        })
        .unwrap();

        assert_eq!(options.to_query_string(), "scale=mean&log=true&drop=noc,other&seed=7");
    }

    #[test]
    fn test_query_string_encodes_ampersand_labels() {
        let mut options = ChartOptions::default();
        options.drop.insert(Stage::Ep);
        options.drop.insert(Stage::Sales);

        assert_eq!(options.to_query_string(), "scale=total&drop=sales,e%26p");
    }

    #[test]
    fn test_data_uri() {
        let chart = Chart {
            title: "t".to_string(),
            svg: "<svg/>".to_string(),
        };
        assert_eq!(chart.to_base64(), "PHN2Zy8+");
        assert_eq!(chart.data_uri(), "data:image/svg+xml;base64,PHN2Zy8+");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(3.0), "3");
        assert_eq!(format_value(2.34), "2.3");
        assert_eq!(format_value(0.5), "0.5");
    }

    #[test]
    fn test_render_all_on_empty_snapshot() {
        let charts = render_all(&Snapshot::default(), &ChartOptions::default(), 5).unwrap();
        assert_eq!(charts.len(), 4);
        for chart in &charts {
            assert!(chart.svg.contains("<svg"), "{} should be SVG", chart.title);
            assert!(chart.svg.contains("No data yet"));
        }
    }
}
