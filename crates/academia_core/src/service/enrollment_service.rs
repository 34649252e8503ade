//! Career enrollment and subject progress use cases.
//!
//! # Invariants
//! - The first career a student enrolls in becomes the principal one.
//! - A subject is started only when every direct prerequisite is passed.
//! - A final grade is recorded only while the subject is in progress, and
//!   decides passed/failed against the configured passing grade.

use super::{ServiceError, ServiceResult};
use crate::config::GradingConfig;
use crate::model::enrollment::{CareerEnrollment, SubjectProgress};
use crate::model::state::{CareerState, Lifecycle, SubjectState};
use crate::model::{CareerId, EntityKey, StudentId, SubjectId};
use crate::repo::student_repo::StudentRepository;
use chrono::NaiveDate;
use log::info;

pub struct EnrollmentService<R: StudentRepository> {
    repo: R,
    passing_grade: f64,
}

impl<R: StudentRepository> EnrollmentService<R> {
    pub fn new(repo: R, grading: &GradingConfig) -> Self {
        Self {
            repo,
            passing_grade: grading.passing_grade,
        }
    }

    pub fn passing_grade(&self) -> f64 {
        self.passing_grade
    }

    /// Registers the student in a career in the initial (active) state.
    pub fn enroll_in_career(
        &self,
        student_id: StudentId,
        career_id: CareerId,
        enrolled_on: Option<NaiveDate>,
    ) -> ServiceResult<CareerEnrollment> {
        let mut enrollment = CareerEnrollment::new(student_id, career_id);
        enrollment.enrolled_on = enrolled_on;
        enrollment.start_date = enrolled_on;
        enrollment.is_principal = self.repo.career_enrollments(student_id)?.is_empty();
        self.repo.enroll_career(&enrollment)?;
        info!(
            "event=career_enroll module=service status=ok student={} career={} principal={}",
            student_id, career_id, enrollment.is_principal
        );
        Ok(enrollment)
    }

    pub fn set_principal_career(&self, student_id: StudentId, career_id: CareerId) -> ServiceResult<()> {
        self.repo.set_principal_career(student_id, career_id)?;
        Ok(())
    }

    pub fn change_career_state(
        &self,
        student_id: StudentId,
        career_id: CareerId,
        next: CareerState,
    ) -> ServiceResult<CareerEnrollment> {
        let mut enrollment = self
            .repo
            .career_enrollment(student_id, career_id)?
            .ok_or_else(|| not_registered("career_enrollment", (student_id, career_id)))?;
        enrollment.state = enrollment.state.transition_to(next)?;
        self.repo.update_career_enrollment(&enrollment)?;
        Ok(enrollment)
    }

    /// Moves the subject to in-progress, registering it when needed.
    ///
    /// # Errors
    /// - [`ServiceError::PrerequisitesUnmet`] when a direct prerequisite is
    ///   not passed; nothing is written.
    /// - [`ServiceError::Transition`] when the subject is already passed or
    ///   failed; [`EnrollmentService::reset_subject`] first.
    pub fn start_subject(
        &self,
        student_id: StudentId,
        subject_id: SubjectId,
        period: Option<String>,
    ) -> ServiceResult<SubjectProgress> {
        let missing = self.repo.unmet_prerequisites(student_id, subject_id)?;
        if !missing.is_empty() {
            return Err(ServiceError::PrerequisitesUnmet {
                student_id,
                subject_id,
                missing,
            });
        }

        let progress = match self.repo.subject_progress(student_id, subject_id)? {
            Some(mut progress) => {
                progress.state = progress.state.transition_to(SubjectState::InProgress)?;
                progress.period = period.or(progress.period);
                self.repo.update_subject_progress(&progress)?;
                progress
            }
            None => {
                let mut progress = SubjectProgress::new(student_id, subject_id)
                    .with_state(SubjectState::InProgress);
                progress.period = period;
                self.repo.register_subject(&progress)?;
                progress
            }
        };
        info!(
            "event=subject_start module=service status=ok student={} subject={}",
            student_id, subject_id
        );
        Ok(progress)
    }

    /// Closes an in-progress subject with its final grade.
    pub fn record_final_grade(
        &self,
        student_id: StudentId,
        subject_id: SubjectId,
        grade: f64,
    ) -> ServiceResult<SubjectProgress> {
        let mut progress = self
            .repo
            .subject_progress(student_id, subject_id)?
            .ok_or_else(|| not_registered("subject_progress", (student_id, subject_id)))?;
        let outcome = SubjectState::from_grade(grade, self.passing_grade);
        progress.state = progress.state.transition_to(outcome)?;
        progress.final_grade = Some(grade);
        self.repo.update_subject_progress(&progress)?;
        info!(
            "event=subject_graded module=service status=ok student={} subject={} outcome={}",
            student_id,
            subject_id,
            outcome.as_str()
        );
        Ok(progress)
    }

    /// Returns the subject to not-taken and clears its grade.
    pub fn reset_subject(&self, student_id: StudentId, subject_id: SubjectId) -> ServiceResult<SubjectProgress> {
        let mut progress = self
            .repo
            .subject_progress(student_id, subject_id)?
            .ok_or_else(|| not_registered("subject_progress", (student_id, subject_id)))?;
        progress.state = progress.state.reset();
        progress.final_grade = None;
        self.repo.update_subject_progress(&progress)?;
        Ok(progress)
    }
}

fn not_registered(entity: &'static str, key: impl EntityKey) -> ServiceError {
    ServiceError::NotRegistered {
        entity,
        key: key.describe(),
    }
}
