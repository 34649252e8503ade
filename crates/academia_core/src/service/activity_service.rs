//! Activity assignment and submission use cases.
//!
//! Stored `vencida` is written only by [`ActivityProgressService::mark_overdue`],
//! which the caller invokes explicitly; nothing sweeps in the background.

use super::{ServiceError, ServiceResult};
use crate::model::enrollment::ActivityProgress;
use crate::model::state::{ActivityState, Lifecycle};
use crate::model::{ActivityId, EntityKey, StudentId};
use crate::repo::student_repo::StudentRepository;
use chrono::NaiveDate;
use log::info;

pub struct ActivityProgressService<R: StudentRepository> {
    repo: R,
}

impl<R: StudentRepository> ActivityProgressService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers the activity for the student as pending.
    pub fn assign(&self, student_id: StudentId, activity_id: ActivityId) -> ServiceResult<ActivityProgress> {
        let progress = ActivityProgress::new(student_id, activity_id);
        self.repo.assign_activity(&progress)?;
        Ok(progress)
    }

    pub fn start(&self, student_id: StudentId, activity_id: ActivityId) -> ServiceResult<ActivityProgress> {
        self.apply(student_id, activity_id, |progress| {
            progress.state = progress.state.transition_to(ActivityState::InProgress)?;
            Ok(())
        })
    }

    /// Marks the activity submitted on `submitted_on`; late submissions of
    /// overdue work are accepted.
    pub fn submit(
        &self,
        student_id: StudentId,
        activity_id: ActivityId,
        submitted_on: NaiveDate,
    ) -> ServiceResult<ActivityProgress> {
        self.apply(student_id, activity_id, |progress| {
            progress.state = progress.state.transition_to(ActivityState::Submitted)?;
            progress.submitted_on = Some(submitted_on);
            Ok(())
        })
    }

    /// Writes the overdue state for every open registration whose activity
    /// was due before `today` without a submission. Returns how many rows
    /// changed. The sweep is a single conditional write, so a submission
    /// committed by another connection is never overwritten.
    pub fn mark_overdue(&self, today: NaiveDate) -> ServiceResult<usize> {
        let swept = self.repo.mark_past_due_overdue(today)?;
        info!(
            "event=activities_mark_overdue module=service status=ok today={} rows={}",
            today, swept
        );
        Ok(swept)
    }

    fn apply(
        &self,
        student_id: StudentId,
        activity_id: ActivityId,
        change: impl FnOnce(&mut ActivityProgress) -> ServiceResult<()>,
    ) -> ServiceResult<ActivityProgress> {
        let mut progress = self
            .repo
            .activity_progress(student_id, activity_id)?
            .ok_or_else(|| ServiceError::NotRegistered {
                entity: "activity_progress",
                key: (student_id, activity_id).describe(),
            })?;
        change(&mut progress)?;
        self.repo.update_activity_progress(&progress)?;
        Ok(progress)
    }
}
