//! Persistent aggregate counters
//!
//! Every aggregate lives in the `accumulator` table as `(namespace, key) -> value`.
//! Submissions only ever add to values; the only destructive operation is
//! [`clear`].

use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use cpath_common::Result;

use crate::parser::CareerPath;
use crate::vocab::Stage;

/// Key under [`Namespace::Meta`] counting stored submissions
const SUBMISSIONS_KEY: &str = "submissions";

/// Groups of counters in the accumulator table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// `from,to` -> transition count
    Edges,
    /// stage -> total years
    StageYears,
    /// stage -> occurrences in any path
    StageVisits,
    /// stage -> occurrences that carried a duration
    StageTimedVisits,
    /// stage -> paths ending there
    LastStage,
    /// bucket lower bound -> path count
    CareerLength,
    Meta,
}

impl Namespace {
    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Edges => "edges",
            Namespace::StageYears => "stage_years",
            Namespace::StageVisits => "stage_visits",
            Namespace::StageTimedVisits => "stage_timed_visits",
            Namespace::LastStage => "last_stage",
            Namespace::CareerLength => "career_length",
            Namespace::Meta => "meta",
        }
    }
}

/// What a single [`store_path`] call recorded
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreSummary {
    pub stages: usize,
    pub transitions: usize,
    pub total_years: Option<f64>,
    pub last_stage: Option<Stage>,
    /// Career-length bucket lower bound, when any duration was known
    pub bucket: Option<u32>,
}

/// Typed view of every namespace
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub edges: BTreeMap<(Stage, Stage), f64>,
    pub stage_years: BTreeMap<Stage, f64>,
    pub stage_visits: BTreeMap<Stage, f64>,
    /// Denominator for mean years per stint
    pub stage_timed_visits: BTreeMap<Stage, f64>,
    pub last_stage: BTreeMap<Stage, f64>,
    pub career_length: BTreeMap<u32, f64>,
    pub submissions: u64,
}

/// Edge key as stored: `"from,to"`
pub fn edge_key(from: Stage, to: Stage) -> String {
    format!("{},{}", from, to)
}

/// Lower bound of the bucket containing `total_years`
pub fn career_length_bucket(total_years: f64, bucket_width: u32) -> u32 {
    let width = bucket_width.max(1);
    let index = (total_years.max(0.0) / f64::from(width)).floor() as u32;
    index.saturating_mul(width)
}

/// Add `delta` to one counter, creating it if missing
pub async fn increment(pool: &SqlitePool, namespace: Namespace, key: &str, delta: f64) -> Result<()> {
    let mut conn = pool.acquire().await?;
    add(&mut conn, namespace, key, delta).await
}

async fn add(conn: &mut SqliteConnection, namespace: Namespace, key: &str, delta: f64) -> Result<()> {
    sqlx::query(
        "INSERT INTO accumulator (namespace, key, value) VALUES (?, ?, ?)
         ON CONFLICT(namespace, key) DO UPDATE
         SET value = value + excluded.value, updated_at = CURRENT_TIMESTAMP",
    )
    .bind(namespace.as_str())
    .bind(key)
    .bind(delta)
    .execute(conn)
    .await?;

    Ok(())
}

/// Record one parsed submission in every namespace
///
/// All increments for the submission commit together. An empty path
/// records nothing.
pub async fn store_path(pool: &SqlitePool, path: &CareerPath, bucket_width: u32) -> Result<StoreSummary> {
    if path.is_empty() {
        debug!("Empty path, nothing stored");
        return Ok(StoreSummary::default());
    }

    let mut tx = pool.begin().await?;
    let mut transitions = 0;

    for (from, to) in path.transitions() {
        add(&mut *tx, Namespace::Edges, &edge_key(from, to), 1.0).await?;
        transitions += 1;
    }

    for step in path.steps() {
        let label = step.stage.as_str();
        add(&mut *tx, Namespace::StageVisits, label, 1.0).await?;
        if let Some(years) = step.years {
            add(&mut *tx, Namespace::StageYears, label, years).await?;
            add(&mut *tx, Namespace::StageTimedVisits, label, 1.0).await?;
        }
    }

    let last_stage = path.last_stage();
    if let Some(stage) = last_stage {
        add(&mut *tx, Namespace::LastStage, stage.as_str(), 1.0).await?;
    }

    let total_years = path.total_years();
    let bucket = total_years.map(|total| career_length_bucket(total, bucket_width));
    if let Some(bucket) = bucket {
        add(&mut *tx, Namespace::CareerLength, &bucket.to_string(), 1.0).await?;
    }

    add(&mut *tx, Namespace::Meta, SUBMISSIONS_KEY, 1.0).await?;

    tx.commit().await?;

    let summary = StoreSummary {
        stages: path.len(),
        transitions,
        total_years,
        last_stage,
        bucket,
    };
    debug!(?summary, "Stored career path");
    Ok(summary)
}

/// Raw contents of one namespace
pub async fn load_namespace(pool: &SqlitePool, namespace: Namespace) -> Result<BTreeMap<String, f64>> {
    let rows: Vec<(String, f64)> =
        sqlx::query_as("SELECT key, value FROM accumulator WHERE namespace = ?")
            .bind(namespace.as_str())
            .fetch_all(pool)
            .await?;

    Ok(rows.into_iter().collect())
}

/// Load every namespace into typed maps
///
/// Keys that no longer parse are skipped with a warning.
pub async fn load_snapshot(pool: &SqlitePool) -> Result<Snapshot> {
    let mut snapshot = Snapshot::default();

    for (key, value) in load_namespace(pool, Namespace::Edges).await? {
        let parsed = key
            .split_once(',')
            .and_then(|(from, to)| Some((from.parse().ok()?, to.parse().ok()?)));
        match parsed {
            Some(edge) => {
                snapshot.edges.insert(edge, value);
            }
            None => warn!(key = %key, "Skipping unparseable edge key"),
        }
    }

    snapshot.stage_years = load_stage_map(pool, Namespace::StageYears).await?;
    snapshot.stage_visits = load_stage_map(pool, Namespace::StageVisits).await?;
    snapshot.stage_timed_visits = load_stage_map(pool, Namespace::StageTimedVisits).await?;
    snapshot.last_stage = load_stage_map(pool, Namespace::LastStage).await?;

    for (key, value) in load_namespace(pool, Namespace::CareerLength).await? {
        match key.parse::<u32>() {
            Ok(bucket) => {
                snapshot.career_length.insert(bucket, value);
            }
            Err(_) => warn!(key = %key, "Skipping unparseable career length bucket"),
        }
    }

    let meta = load_namespace(pool, Namespace::Meta).await?;
    snapshot.submissions = meta
        .get(SUBMISSIONS_KEY)
        .map(|v| v.max(0.0) as u64)
        .unwrap_or(0);

    Ok(snapshot)
}

async fn load_stage_map(pool: &SqlitePool, namespace: Namespace) -> Result<BTreeMap<Stage, f64>> {
    let mut map = BTreeMap::new();
    for (key, value) in load_namespace(pool, namespace).await? {
        match key.parse::<Stage>() {
            Ok(stage) => {
                map.insert(stage, value);
            }
            Err(_) => warn!(
                namespace = namespace.as_str(),
                key = %key,
                "Skipping unknown stage"
            ),
        }
    }
    Ok(map)
}

/// Remove every counter
pub async fn clear(pool: &SqlitePool) -> Result<u64> {
    let result = sqlx::query("DELETE FROM accumulator").execute(pool).await?;
    Ok(result.rows_affected())
}
