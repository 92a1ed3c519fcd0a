use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};
use rusqlite::{params, Row};

use crate::{
    db::{
        helpers::{parse_datetime, to_i64, to_index, to_u64},
        Database,
    },
    error::PersistenceError,
    models::{Run, SmoothedFix, TrackSegment},
    store::RunStore,
};

struct RunRow {
    id: String,
    started_at: String,
    duration_secs: i64,
    distance_km: f64,
    segment_count: i64,
}

fn row_to_run(row: &Row) -> rusqlite::Result<RunRow> {
    Ok(RunRow {
        id: row.get("id")?,
        started_at: row.get("started_at")?,
        duration_secs: row.get("duration_secs")?,
        distance_km: row.get("distance_km")?,
        segment_count: row.get("segment_count")?,
    })
}

impl Database {
    pub async fn insert_run(&self, run: Run) -> Result<String> {
        self.execute(move |conn| {
            let tx = conn.transaction()?;

            tx.execute(
                "INSERT INTO runs (id, started_at, duration_secs, distance_km, segment_count, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    run.id,
                    run.started_at.to_rfc3339(),
                    to_i64(run.total_duration_seconds)?,
                    run.total_distance_km,
                    to_i64(run.segments.len() as u64)?,
                    Utc::now().to_rfc3339(),
                ],
            )
            .with_context(|| format!("failed to insert run {}", run.id))?;

            {
                let mut stmt = tx.prepare(
                    "INSERT INTO track_points (run_id, segment_index, point_index, latitude, longitude)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )?;
                for (segment_index, segment) in run.segments.iter().enumerate() {
                    for (point_index, point) in segment.points().iter().enumerate() {
                        stmt.execute(params![
                            run.id,
                            segment_index as i64,
                            point_index as i64,
                            point.latitude,
                            point.longitude,
                        ])?;
                    }
                }
            }

            tx.commit().context("failed to commit run")?;
            debug!("stored run {} with {} points", run.id, run.point_count());
            Ok(run.id)
        })
        .await
    }

    /// Every stored run with its track, newest first.
    pub async fn list_runs(&self) -> Result<Vec<Run>> {
        self.execute(|conn| {
            let rows = {
                let mut stmt = conn.prepare(
                    "SELECT id, started_at, duration_secs, distance_km, segment_count
                     FROM runs
                     ORDER BY started_at DESC",
                )?;
                let rows = stmt
                    .query_map([], row_to_run)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            };

            let mut points: HashMap<String, Vec<Vec<SmoothedFix>>> = HashMap::new();
            {
                let mut stmt = conn.prepare(
                    "SELECT run_id, segment_index, latitude, longitude
                     FROM track_points
                     ORDER BY run_id, segment_index, point_index",
                )?;
                let mut cursor = stmt.query([])?;
                while let Some(row) = cursor.next()? {
                    let run_id: String = row.get(0)?;
                    let segment_index = to_index(row.get(1)?, "segment_index")?;
                    let point = SmoothedFix::new(row.get(2)?, row.get(3)?);

                    let segments = points.entry(run_id).or_default();
                    if segments.len() <= segment_index {
                        segments.resize_with(segment_index + 1, Vec::new);
                    }
                    segments[segment_index].push(point);
                }
            }

            rows.into_iter()
                .map(|row| -> Result<Run> {
                    let mut segments = points.remove(&row.id).unwrap_or_default();
                    // Segments without points leave no rows behind.
                    let segment_count = to_index(row.segment_count, "segment_count")?;
                    if segments.len() < segment_count {
                        segments.resize_with(segment_count, Vec::new);
                    }

                    Ok(Run {
                        started_at: parse_datetime(&row.started_at, "started_at")?,
                        total_duration_seconds: to_u64(row.duration_secs, "duration_secs")?,
                        total_distance_km: row.distance_km,
                        segments: segments.into_iter().map(TrackSegment::from).collect(),
                        id: row.id,
                    })
                })
                .collect()
        })
        .await
    }

    /// Removes a run and its track. Returns whether a run was deleted.
    pub async fn delete_run(&self, run_id: &str) -> Result<bool> {
        let run_id = run_id.to_string();
        self.execute(move |conn| {
            let deleted = conn
                .execute("DELETE FROM runs WHERE id = ?1", params![run_id])
                .with_context(|| format!("failed to delete run {run_id}"))?;
            Ok(deleted > 0)
        })
        .await
    }
}

#[async_trait]
impl RunStore for Database {
    async fn create(&self, run: Run) -> Result<String, PersistenceError> {
        Ok(self.insert_run(run).await?)
    }

    async fn list(&self) -> Result<Vec<Run>, PersistenceError> {
        Ok(self.list_runs().await?)
    }

    async fn delete(&self, id: &str) -> Result<(), PersistenceError> {
        if !self.delete_run(id).await? {
            warn!("run {id} was already gone");
        }
        Ok(())
    }
}
