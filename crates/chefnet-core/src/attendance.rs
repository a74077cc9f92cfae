//! Course attendance with an offline queue.
//!
//! Attendance is recorded straight against the backend. When the backend
//! cannot be reached the submission is queued under `pending_attendance`
//! and replayed by [`AttendanceRecorder::sync_pending`]. Submissions the
//! backend rejects (unknown students or courses, duplicate attendance) are
//! reported to the caller and never queued.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::catalog::required_id;
use crate::context::Context;
use crate::error::Result;
use crate::models::AttendanceRecord;
use crate::remote::{ChefNetApi, RemoteError};
use crate::store::{keys, try_read_json, write_json_logged, KeyValueStore};

/// Result of [`AttendanceRecorder::record_attendance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttendanceOutcome {
    /// The backend confirmed; `message` is its reply
    Recorded { message: String },
    /// Stored on the device until the backend is reachable
    Queued,
}

impl fmt::Display for AttendanceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recorded { message } if message.is_empty() => f.write_str("Attendance recorded"),
            Self::Recorded { message } => f.write_str(message),
            Self::Queued => f.write_str("Attendance saved offline; it will sync when online"),
        }
    }
}

/// Counts from one replay pass over the queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub attempted: usize,
    pub synced: usize,
    /// Still queued after a connectivity failure
    pub failed: usize,
    /// Rejected by the backend and removed from the queue
    pub dropped: usize,
}

pub struct AttendanceRecorder<S, A> {
    ctx: Context<S, A>,
    queue_lock: Arc<Mutex<()>>,
}

impl<S, A> Clone for AttendanceRecorder<S, A> {
    fn clone(&self) -> Self {
        Self {
            ctx: self.ctx.clone(),
            queue_lock: Arc::clone(&self.queue_lock),
        }
    }
}

impl<S: KeyValueStore, A: ChefNetApi> AttendanceRecorder<S, A> {
    pub fn new(ctx: Context<S, A>) -> Self {
        Self {
            ctx,
            queue_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Record that `student_id` attended `course_id`.
    ///
    /// Blank ids and backend rejections (unknown ids, invalid input,
    /// business-rule conflicts) are errors. Connectivity and credential
    /// failures queue the submission and return [`AttendanceOutcome::Queued`].
    /// Fails with the store error when the queue cannot be read, since
    /// appending would overwrite it.
    pub async fn record_attendance(
        &self,
        student_id: &str,
        course_id: &str,
    ) -> Result<AttendanceOutcome> {
        let student_id = required_id(student_id, "student")?;
        let course_id = required_id(course_id, "course")?;

        let sent = if self.ctx.backend_enabled() {
            self.ctx
                .api
                .record_attendance(&student_id, &course_id)
                .await
        } else {
            Err(RemoteError::connectivity("backend is disabled"))
        };

        match sent {
            Ok(message) => {
                tracing::info!(%student_id, %course_id, "Attendance recorded");
                Ok(AttendanceOutcome::Recorded { message })
            }
            Err(error) if error.is_domain() => {
                tracing::warn!(%student_id, %course_id, %error, "Attendance rejected by backend");
                Err(error.into())
            }
            Err(error) => {
                let record = AttendanceRecord::new(
                    student_id,
                    course_id,
                    self.ctx.clock.now(),
                    Some(error.to_string()),
                );
                tracing::info!(
                    record_id = %record.id,
                    %error,
                    "Backend unavailable; queued attendance"
                );

                let _guard = self.queue_lock.lock().await;
                let mut queue = self.load_queue().await.inspect_err(|error| {
                    tracing::warn!(%error, "Could not read attendance queue; not queueing");
                })?;
                queue.push(record);
                self.save_queue(&queue).await;
                Ok(AttendanceOutcome::Queued)
            }
        }
    }

    /// Replay every queued submission once.
    ///
    /// Accepted records are pruned, records the backend rejects are dropped,
    /// and the rest stay queued with their attempt count bumped. Nothing is
    /// written when the queue cannot be read.
    pub async fn sync_pending(&self) -> SyncReport {
        let mut report = SyncReport::default();
        if !self.ctx.backend_enabled() {
            tracing::debug!("Backend disabled; skipping attendance sync");
            return report;
        }

        let loaded = {
            let _guard = self.queue_lock.lock().await;
            self.load_queue().await
        };
        let pending = match loaded {
            Ok(pending) => pending,
            Err(error) => {
                tracing::warn!(%error, "Could not read attendance queue; skipping sync");
                return report;
            }
        };

        // None: remove from the queue. Some: keep with updated fields.
        let mut updates: HashMap<Uuid, Option<AttendanceRecord>> = HashMap::new();
        for mut record in pending {
            if record.synced {
                updates.insert(record.id, None);
                continue;
            }
            report.attempted += 1;

            match self
                .ctx
                .api
                .record_attendance(&record.student_id, &record.course_id)
                .await
            {
                Ok(_) => {
                    report.synced += 1;
                    tracing::debug!(record_id = %record.id, "Queued attendance synced");
                    updates.insert(record.id, None);
                }
                Err(error) if error.is_domain() => {
                    report.dropped += 1;
                    tracing::warn!(
                        record_id = %record.id,
                        student_id = %record.student_id,
                        course_id = %record.course_id,
                        %error,
                        "Dropping queued attendance rejected by backend"
                    );
                    updates.insert(record.id, None);
                }
                Err(error) => {
                    report.failed += 1;
                    record.attempts = record.attempts.saturating_add(1);
                    record.last_error = Some(error.to_string());
                    updates.insert(record.id, Some(record));
                }
            }
        }

        if !updates.is_empty() {
            let _guard = self.queue_lock.lock().await;
            match self.load_queue().await {
                Ok(current) => {
                    // Records queued while the pass ran are kept as they are.
                    let queue: Vec<AttendanceRecord> = current
                        .into_iter()
                        .filter_map(|record| updates.remove(&record.id).unwrap_or(Some(record)))
                        .collect();
                    self.save_queue(&queue).await;
                }
                Err(error) => {
                    tracing::warn!(%error, "Could not re-read attendance queue; sync results not saved");
                }
            }
        }

        tracing::info!(
            attempted = report.attempted,
            synced = report.synced,
            failed = report.failed,
            dropped = report.dropped,
            "Attendance sync finished"
        );
        report
    }

    /// Submissions still waiting for the backend, oldest first.
    pub async fn queued(&self) -> Vec<AttendanceRecord> {
        self.load_queue().await.unwrap_or_else(|error| {
            tracing::warn!(%error, "Could not read attendance queue");
            Vec::new()
        })
    }

    /// Decode the queue record by record, skipping ones that cannot be read.
    async fn load_queue(&self) -> Result<Vec<AttendanceRecord>> {
        let raw: Vec<Value> = try_read_json(self.ctx.store.as_ref(), keys::PENDING_ATTENDANCE)
            .await?
            .unwrap_or_default();

        Ok(raw
            .into_iter()
            .filter_map(|value| match serde_json::from_value(value) {
                Ok(record) => Some(record),
                Err(error) => {
                    tracing::warn!(%error, "Skipping undecodable queued attendance");
                    None
                }
            })
            .collect())
    }

    async fn save_queue(&self, queue: &[AttendanceRecord]) {
        write_json_logged(self.ctx.store.as_ref(), keys::PENDING_ATTENDANCE, queue).await;
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::ClientConfig;
    use crate::error::Error;
    use crate::remote::RemoteErrorKind;
    use crate::store::MemoryStore;
    use crate::testing::StubApi;

    fn recorder(api: StubApi) -> AttendanceRecorder<MemoryStore, StubApi> {
        AttendanceRecorder::new(Context::new(
            ClientConfig::default(),
            MemoryStore::new(),
            api,
        ))
    }

    fn network_down() -> RemoteError {
        RemoteError::connectivity("connection refused")
    }

    #[tokio::test]
    async fn success_returns_backend_message() {
        let recorder = recorder(StubApi::new());
        let outcome = recorder.record_attendance("10", "3").await.unwrap();

        assert_eq!(
            outcome,
            AttendanceOutcome::Recorded {
                message: "Asistencia registrada".to_string()
            }
        );
        assert!(recorder.queued().await.is_empty());
    }

    #[tokio::test]
    async fn unknown_student_is_reported_and_not_queued() {
        let api = StubApi::new();
        api.fail_attendance_with(Some(RemoteError::from_response(
            500,
            "Alumno no encontrado",
        )));
        let recorder = recorder(api);

        let error = recorder.record_attendance("10", "3").await.unwrap_err();

        assert!(matches!(
            error,
            Error::Remote(ref remote) if remote.kind == RemoteErrorKind::NotFound
        ));
        assert!(recorder.queued().await.is_empty());
        assert!(recorder
            .ctx
            .store
            .peek(keys::PENDING_ATTENDANCE)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn network_failure_queues_exactly_one_record() {
        let api = StubApi::new();
        api.fail_attendance_with(Some(network_down()));
        let recorder = recorder(api);

        let outcome = recorder.record_attendance(" 10 ", "3").await.unwrap();

        assert_eq!(outcome, AttendanceOutcome::Queued);
        let queue = recorder.queued().await;
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].student_id, "10");
        assert_eq!(queue[0].course_id, "3");
        assert!(!queue[0].synced);
        assert_eq!(queue[0].attempts, 1);
        assert!(queue[0]
            .last_error
            .as_deref()
            .is_some_and(|error| error.contains("connection refused")));
    }

    #[tokio::test]
    async fn unauthorized_is_queued_for_retry() {
        let api = StubApi::new();
        api.fail_attendance_with(Some(RemoteError::from_response(401, "token expired")));
        let recorder = recorder(api);

        assert_eq!(
            recorder.record_attendance("10", "3").await.unwrap(),
            AttendanceOutcome::Queued
        );
    }

    #[tokio::test]
    async fn business_rule_rejection_is_reported_and_not_queued() {
        let api = StubApi::new();
        api.fail_attendance_with(Some(RemoteError::from_response(
            409,
            "Asistencia ya registrada para hoy",
        )));
        let recorder = recorder(api);

        let error = recorder.record_attendance("10", "3").await.unwrap_err();

        assert!(matches!(
            error,
            Error::Remote(ref remote) if remote.kind == RemoteErrorKind::Api
        ));
        assert!(recorder.queued().await.is_empty());
    }

    #[tokio::test]
    async fn undecodable_records_do_not_wipe_the_queue() {
        let api = StubApi::new();
        api.fail_attendance_with(Some(network_down()));
        let recorder = recorder(api);
        recorder.record_attendance("10", "3").await.unwrap();
        recorder.record_attendance("11", "3").await.unwrap();

        let store = recorder.ctx.store.as_ref();
        let mut raw: Vec<Value> =
            serde_json::from_str(&store.peek(keys::PENDING_ATTENDANCE).await.unwrap()).unwrap();
        raw.push(serde_json::json!({ "studentId": "12", "courseId": "3" }));
        store
            .set(keys::PENDING_ATTENDANCE, &serde_json::to_string(&raw).unwrap())
            .await
            .unwrap();

        recorder.record_attendance("13", "3").await.unwrap();

        let students: Vec<String> = recorder
            .queued()
            .await
            .into_iter()
            .map(|record| record.student_id)
            .collect();
        assert_eq!(students, vec!["10", "11", "13"]);
    }

    #[tokio::test]
    async fn unreadable_queue_is_never_overwritten() {
        let api = StubApi::new();
        api.fail_attendance_with(Some(network_down()));
        let recorder = recorder(api);
        recorder.record_attendance("10", "3").await.unwrap();
        let before = recorder.ctx.store.peek(keys::PENDING_ATTENDANCE).await;

        recorder.ctx.store.fail_reads(keys::PENDING_ATTENDANCE, 1);
        let error = recorder.record_attendance("11", "3").await.unwrap_err();
        assert!(matches!(error, Error::Store(_)));

        recorder.ctx.store.fail_reads(keys::PENDING_ATTENDANCE, 1);
        assert_eq!(recorder.sync_pending().await, SyncReport::default());

        assert_eq!(recorder.ctx.store.peek(keys::PENDING_ATTENDANCE).await, before);
    }

    #[tokio::test]
    async fn blank_ids_are_rejected_without_calling_backend() {
        let recorder = recorder(StubApi::new());

        assert!(matches!(
            recorder.record_attendance("", "3").await.unwrap_err(),
            Error::InvalidInput(_)
        ));
        assert!(matches!(
            recorder.record_attendance("10", "  ").await.unwrap_err(),
            Error::InvalidInput(_)
        ));
        assert!(recorder.ctx.api.calls().is_empty());
        assert!(recorder.queued().await.is_empty());
    }

    #[tokio::test]
    async fn disabled_backend_queues_without_calling() {
        let recorder = AttendanceRecorder::new(Context::new(
            ClientConfig::offline(),
            MemoryStore::new(),
            StubApi::new(),
        ));

        assert_eq!(
            recorder.record_attendance("10", "3").await.unwrap(),
            AttendanceOutcome::Queued
        );
        assert_eq!(recorder.sync_pending().await, SyncReport::default());
        assert!(recorder.ctx.api.calls().is_empty());
        assert_eq!(recorder.queued().await.len(), 1);
    }

    #[tokio::test]
    async fn sync_replays_queue_once_backend_returns() {
        let api = StubApi::new();
        api.fail_attendance_with(Some(network_down()));
        let recorder = recorder(api);
        recorder.record_attendance("10", "3").await.unwrap();
        recorder.record_attendance("11", "3").await.unwrap();

        let report = recorder.sync_pending().await;
        assert_eq!(
            report,
            SyncReport {
                attempted: 2,
                synced: 0,
                failed: 2,
                dropped: 0,
            }
        );
        let queue = recorder.queued().await;
        assert_eq!(queue.len(), 2);
        assert!(queue.iter().all(|record| record.attempts == 2));

        recorder.ctx.api.fail_attendance_with(None);
        let report = recorder.sync_pending().await;
        assert_eq!(report.synced, 2);
        assert!(recorder.queued().await.is_empty());
    }

    #[tokio::test]
    async fn sync_drops_records_the_backend_rejects() {
        let api = StubApi::new();
        api.fail_attendance_with(Some(network_down()));
        let recorder = recorder(api);
        recorder.record_attendance("10", "99").await.unwrap();

        recorder
            .ctx
            .api
            .fail_attendance_with(Some(RemoteError::from_response(404, "Curso no encontrado")));
        let report = recorder.sync_pending().await;

        assert_eq!(report.dropped, 1);
        assert_eq!(report.failed, 0);
        assert!(recorder.queued().await.is_empty());
    }

    #[tokio::test]
    async fn sync_drops_business_rule_conflicts() {
        let api = StubApi::new();
        api.fail_attendance_with(Some(network_down()));
        let recorder = recorder(api);
        recorder.record_attendance("10", "3").await.unwrap();

        recorder
            .ctx
            .api
            .fail_attendance_with(Some(RemoteError::from_response(409, "Asistencia duplicada")));
        let report = recorder.sync_pending().await;

        assert_eq!(report.dropped, 1);
        assert!(recorder.queued().await.is_empty());
        assert_eq!(recorder.sync_pending().await.attempted, 0);
    }

    #[tokio::test]
    async fn already_synced_records_are_pruned() {
        let recorder = recorder(StubApi::new());
        let mut record = AttendanceRecord::new("10", "3", chrono::Utc::now(), None);
        record.synced = true;
        recorder.save_queue(&[record]).await;

        let report = recorder.sync_pending().await;
        assert_eq!(report.attempted, 0);
        assert!(recorder.queued().await.is_empty());
    }

    #[test]
    fn outcome_display() {
        assert_eq!(
            AttendanceOutcome::Recorded {
                message: String::new()
            }
            .to_string(),
            "Attendance recorded"
        );
        assert!(AttendanceOutcome::Queued.to_string().contains("offline"));
    }
}
