//! Nightly absence back-fill.
//!
//! Every active student enrolled in a course is expected to have an
//! attendance record for the current day. Records come from manual marking,
//! the batch upsert or self-check-in; whatever is still missing when the
//! job fires gets a synthetic `Absent` row with no marker.
//!
//! The job only ever inserts. A row created between its read and its write
//! is rejected by the (student, course, date) unique key, counted as a
//! conflict and skipped; the rest of the batch still lands.

use std::collections::HashSet;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Utc};
use sqlx::MySqlPool;
use tracing::{error, info, warn};

use crate::model::attendance::AttendanceStatus;

/// Rows per INSERT statement.
const INSERT_CHUNK: usize = 500;

/// Outcome of one reconciliation cycle.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub staged: usize,
    pub inserted: u64,
    pub conflicts: u64,
}

pub struct AbsenteeJob {
    pool: MySqlPool,
    offset: FixedOffset,
    fire_time: NaiveTime,
}

impl AbsenteeJob {
    pub fn new(pool: MySqlPool, offset: FixedOffset, fire_time: NaiveTime) -> Self {
        Self {
            pool,
            offset,
            fire_time,
        }
    }

    /// Start the reconciliation loop. Returns a handle that can be used to
    /// abort the task at shutdown.
    pub fn start(self) -> actix_web::rt::task::JoinHandle<()> {
        actix_web::rt::spawn(async move {
            loop {
                let now = Utc::now().with_timezone(&self.offset).time();
                let wait = until_next_fire(now, self.fire_time);
                info!(seconds = wait.as_secs(), "Absentee reconciliation scheduled");
                actix_web::rt::time::sleep(wait).await;

                // Fire-and-forget: a failed cycle is logged and retried
                // naturally on the next tick.
                if let Err(e) = self.run_cycle().await {
                    error!(error = %e, "Absentee reconciliation failed");
                }
            }
        })
    }

    /// Run a single reconciliation cycle.
    pub async fn run_cycle(&self) -> Result<RunSummary> {
        let today = local_date(Utc::now(), &self.offset);
        info!(%today, "Absentee reconciliation: run started");

        let enrollments = self
            .load_active_enrollments()
            .await
            .context("loading active enrollments")?;

        if enrollments.is_empty() {
            info!("No active student enrollments found. Job complete.");
            return Ok(RunSummary::default());
        }

        let marked = self
            .load_marked_pairs(today)
            .await
            .context("loading existing attendance")?;

        let staged = stage_missing(&enrollments, &marked);

        if staged.is_empty() {
            info!("All enrolled students already have attendance records. No one marked absent.");
            return Ok(RunSummary::default());
        }

        let (inserted, conflicts) = self
            .insert_absent(today, &staged)
            .await
            .context("inserting absent records")?;

        if conflicts > 0 {
            // Lost the race against concurrent check-ins for these rows;
            // the unique key rejected them and the rest of the batch landed.
            warn!(conflicts, "Partial insert conflict during absentee batch");
        }

        info!(staged = staged.len(), inserted, "Marked students absent");

        Ok(RunSummary {
            staged: staged.len(),
            inserted,
            conflicts,
        })
    }

    /// Enrollment pairs whose owning account is an active student.
    /// Suspended and pending students never get marked absent.
    async fn load_active_enrollments(&self) -> sqlx::Result<Vec<(u64, u64)>> {
        sqlx::query_as::<_, (u64, u64)>(
            r#"
            SELECT sc.user_id, sc.course_id
            FROM student_courses sc
            INNER JOIN users u ON u.id = sc.user_id
            WHERE u.role = 'student' AND u.status = 'active'
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    /// All (student, course) pairs that already have a record for `day`.
    async fn load_marked_pairs(&self, day: NaiveDate) -> sqlx::Result<HashSet<(u64, u64)>> {
        let rows = sqlx::query_as::<_, (u64, u64)>(
            "SELECT student_id, course_id FROM attendance WHERE date = ?",
        )
        .bind(day)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().collect())
    }

    /// Batch-insert `Absent` rows for the staged pairs. `INSERT IGNORE`
    /// turns per-row duplicate-key rejections into a skipped row rather
    /// than a failed statement, so the count of conflicts is simply
    /// staged minus inserted.
    async fn insert_absent(
        &self,
        day: NaiveDate,
        staged: &[(u64, u64)],
    ) -> sqlx::Result<(u64, u64)> {
        let mut inserted = 0u64;

        for chunk in staged.chunks(INSERT_CHUNK) {
            let mut qb = sqlx::QueryBuilder::<sqlx::MySql>::new(
                "INSERT IGNORE INTO attendance (student_id, course_id, date, status, marked_by) ",
            );
            qb.push_values(chunk, |mut b, (student_id, course_id)| {
                b.push_bind(*student_id)
                    .push_bind(*course_id)
                    .push_bind(day)
                    .push_bind(AttendanceStatus::Absent.to_string())
                    .push_bind(None::<u64>); // no marker: system-generated
            });

            inserted += qb.build().execute(&self.pool).await?.rows_affected();
        }

        Ok((inserted, staged.len() as u64 - inserted))
    }
}

/// Every enrolled pair with no attendance record yet. The precomputed set
/// makes the existence check O(1) per pair instead of one query each.
fn stage_missing(enrolled: &[(u64, u64)], marked: &HashSet<(u64, u64)>) -> Vec<(u64, u64)> {
    enrolled
        .iter()
        .copied()
        .filter(|pair| !marked.contains(pair))
        .collect()
}

/// Calendar day at `instant`, seen from the configured offset. Keyed this
/// way, the job and same-day check-ins agree on the date regardless of the
/// host clock's zone.
fn local_date(instant: DateTime<Utc>, offset: &FixedOffset) -> NaiveDate {
    instant.with_timezone(offset).date_naive()
}

/// Time until the next `fire_time` wall clock, looking from `now`. A zero
/// delta means the job just fired, so the next run is a full day away.
fn until_next_fire(now: NaiveTime, fire_time: NaiveTime) -> Duration {
    const DAY_SECS: i64 = 86_400;
    let mut delta = (fire_time - now).num_seconds().rem_euclid(DAY_SECS);
    if delta == 0 {
        delta = DAY_SECS;
    }
    Duration::from_secs(delta as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn marks(pairs: &[(u64, u64)]) -> HashSet<(u64, u64)> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn stages_every_missing_pair_once() {
        // one active student enrolled in two courses, nothing marked yet
        let enrolled = vec![(1, 10), (1, 11)];
        let staged = stage_missing(&enrolled, &marks(&[]));
        assert_eq!(staged, vec![(1, 10), (1, 11)]);
    }

    #[test]
    fn concurrent_check_in_wins_for_its_course() {
        // a self-check-in for course 10 landed before the job read
        let enrolled = vec![(1, 10), (1, 11)];
        let staged = stage_missing(&enrolled, &marks(&[(1, 10)]));
        assert_eq!(staged, vec![(1, 11)]);
    }

    #[test]
    fn second_run_stages_nothing() {
        let enrolled = vec![(1, 10), (2, 10), (2, 11)];
        let first = stage_missing(&enrolled, &marks(&[]));
        assert_eq!(first.len(), 3);

        // after the first run every staged pair exists
        let after_first: HashSet<_> = first.into_iter().collect();
        let second = stage_missing(&enrolled, &after_first);
        assert!(second.is_empty());
    }

    #[test]
    fn records_outside_enrollment_change_nothing() {
        let enrolled = vec![(1, 10)];
        let staged = stage_missing(&enrolled, &marks(&[(9, 99), (1, 10)]));
        assert!(staged.is_empty());
    }

    #[test]
    fn no_enrollments_means_no_staging() {
        let staged = stage_missing(&[], &marks(&[(1, 10)]));
        assert!(staged.is_empty());
    }

    #[test]
    fn fire_later_today() {
        let now = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let fire = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        assert_eq!(until_next_fire(now, fire), Duration::from_secs(3 * 3600));
    }

    #[test]
    fn fire_wraps_to_tomorrow() {
        let now = NaiveTime::from_hms_opt(13, 0, 0).unwrap();
        let fire = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        assert_eq!(until_next_fire(now, fire), Duration::from_secs(23 * 3600));
    }

    #[test]
    fn firing_exactly_now_waits_a_full_day() {
        let at = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        assert_eq!(until_next_fire(at, at), Duration::from_secs(86_400));
    }

    #[test]
    fn day_truncation_follows_the_configured_offset() {
        // 2026-08-06 20:00 UTC is already the 7th in Kolkata, still the
        // 6th in New York
        let instant = Utc.with_ymd_and_hms(2026, 8, 6, 20, 0, 0).unwrap();

        let kolkata = FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap();
        assert_eq!(
            local_date(instant, &kolkata),
            NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
        );

        let new_york = FixedOffset::west_opt(5 * 3600).unwrap();
        assert_eq!(
            local_date(instant, &new_york),
            NaiveDate::from_ymd_opt(2026, 8, 6).unwrap()
        );
    }
}
