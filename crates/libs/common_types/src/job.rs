use crate::ErrorInfo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Lifecycle of an ingestion job.
///
/// `Scheduled -> Started -> {Finished | Aborted | Cancelled}`. A scheduled job can also be
/// cancelled before it starts. Terminal states never change again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Scheduled,
    Started,
    Finished,
    Aborted,
    Cancelled,
}

impl JobState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Aborted | Self::Cancelled)
    }
}

/// Point-in-time view of one scheduled ingestion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub state: JobState,
    /// 0..=100, only 100 once finished.
    pub percent: u8,
    pub num_files: usize,
    pub num_processed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    #[must_use]
    pub fn scheduled(id: impl Into<String>, num_files: usize) -> Self {
        Self {
            id: id.into(),
            state: JobState::Scheduled,
            percent: 0,
            num_files,
            num_processed: 0,
            error: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn start(&mut self) {
        if self.state == JobState::Scheduled {
            self.state = JobState::Started;
        }
    }

    /// Counts one more processed item. Never reports 100%, that is left to [`Job::finish`].
    pub fn record_progress(&mut self) {
        if self.is_terminal() || self.num_processed >= self.num_files {
            return;
        }
        self.num_processed += 1;
        let percent = self.num_processed * 100 / self.num_files;
        self.percent = percent.min(99) as u8;
    }

    pub fn finish(&mut self) {
        if self.is_terminal() {
            return;
        }
        self.state = JobState::Finished;
        self.num_processed = self.num_files;
        self.percent = 100;
        self.finished_at = Some(Utc::now());
    }

    pub fn abort(&mut self, error: ErrorInfo) {
        if self.is_terminal() {
            return;
        }
        self.state = JobState::Aborted;
        self.error = Some(error);
        self.finished_at = Some(Utc::now());
    }

    pub fn cancel(&mut self) {
        if self.is_terminal() {
            return;
        }
        self.state = JobState::Cancelled;
        self.finished_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_monotonic_and_stops_short_of_100() {
        let mut job = Job::scheduled("job", 3);
        job.start();

        let mut seen = vec![job.percent];
        for _ in 0..3 {
            job.record_progress();
            seen.push(job.percent);
        }

        assert_eq!(seen, vec![0, 33, 66, 99]);
        assert_eq!(job.state, JobState::Started);
    }

    #[test]
    fn finish_forces_100_percent() {
        let mut job = Job::scheduled("job", 7);
        job.start();
        job.record_progress();

        job.finish();

        assert_eq!(job.state, JobState::Finished);
        assert_eq!(job.percent, 100);
        assert_eq!(job.num_processed, 7);
        assert!(job.finished_at.is_some());
    }

    #[test]
    fn zero_file_job_finishes_without_dividing() {
        let mut job = Job::scheduled("job", 0);
        job.start();
        job.record_progress();
        job.finish();

        assert_eq!(job.num_processed, 0);
        assert_eq!(job.percent, 100);
        assert_eq!(job.state, JobState::Finished);
    }

    #[test]
    fn terminal_states_are_final() {
        let mut job = Job::scheduled("job", 2);
        job.start();
        job.abort(ErrorInfo::new(502, "boom"));

        job.finish();
        job.cancel();
        job.record_progress();

        assert_eq!(job.state, JobState::Aborted);
        assert_eq!(job.num_processed, 0);
        assert_eq!(job.error, Some(ErrorInfo::new(502, "boom")));
    }

    #[test]
    fn serializes_with_camel_case_and_upper_state() -> Result<(), serde_json::Error> {
        let mut job = Job::scheduled("abc", 4);
        job.start();
        job.record_progress();

        let value = serde_json::to_value(&job)?;

        assert_eq!(value["id"], "abc");
        assert_eq!(value["state"], "STARTED");
        assert_eq!(value["percent"], 25);
        assert_eq!(value["numFiles"], 4);
        assert_eq!(value["numProcessed"], 1);
        assert!(value.get("error").is_none());
        Ok(())
    }
}
