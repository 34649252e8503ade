use academia_core::config::{CoreConfig, GradingConfig};
use academia_core::db::open_db_in_memory;
use academia_core::model::career::Career;
use academia_core::model::prerequisite::Prerequisite;
use academia_core::model::student::Student;
use academia_core::model::subject::Subject;
use academia_core::read_model::eligibility::is_eligible;
use academia_core::repo::catalog_repo::{CatalogRepository, SqliteCatalogRepository};
use academia_core::repo::prerequisite_repo::{PrerequisiteRepository, SqlitePrerequisiteRepository};
use academia_core::repo::student_repo::{SqliteStudentRepository, StudentRepository};
use academia_core::service::enrollment_service::EnrollmentService;
use academia_core::{CareerState, ServiceError, SubjectState};
use chrono::NaiveDate;
use rusqlite::Connection;

struct Setup {
    student: i64,
    civil: i64,
    law: i64,
    basics: i64,
    advanced: i64,
}

fn seed(conn: &Connection) -> Setup {
    let catalog = SqliteCatalogRepository::new(conn);
    let civil = catalog.create_career(&Career::new("Civil")).unwrap();
    let law = catalog.create_career(&Career::new("Derecho")).unwrap();
    let basics = catalog
        .create_subject(&Subject::new(civil, "MAT101", "Cálculo I", 6))
        .unwrap();
    let advanced = catalog
        .create_subject(&Subject::new(civil, "MAT201", "Cálculo II", 6))
        .unwrap();
    SqlitePrerequisiteRepository::new(conn)
        .add_prerequisite(&Prerequisite::new(advanced, basics))
        .unwrap();
    let student = SqliteStudentRepository::new(conn)
        .create_student(&Student::new("Ana", "ana@uni.cl"))
        .unwrap();
    Setup {
        student,
        civil,
        law,
        basics,
        advanced,
    }
}

fn service(conn: &Connection) -> EnrollmentService<SqliteStudentRepository<'_>> {
    EnrollmentService::new(SqliteStudentRepository::new(conn), &GradingConfig::default())
}

#[test]
fn first_career_becomes_principal() {
    let conn = open_db_in_memory().unwrap();
    let setup = seed(&conn);
    let service = service(&conn);
    let enrolled_on = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

    let first = service
        .enroll_in_career(setup.student, setup.civil, Some(enrolled_on))
        .unwrap();
    let second = service
        .enroll_in_career(setup.student, setup.law, None)
        .unwrap();
    assert!(first.is_principal);
    assert!(!second.is_principal);
    assert_eq!(first.state, CareerState::Active);
    assert_eq!(first.enrolled_on, Some(enrolled_on));

    service.set_principal_career(setup.student, setup.law).unwrap();
    let repo = SqliteStudentRepository::new(&conn);
    assert!(repo.career_enrollment(setup.student, setup.law).unwrap().unwrap().is_principal);
    assert!(!repo.career_enrollment(setup.student, setup.civil).unwrap().unwrap().is_principal);
}

#[test]
fn career_state_follows_its_lifecycle() {
    let conn = open_db_in_memory().unwrap();
    let setup = seed(&conn);
    let service = service(&conn);
    service
        .enroll_in_career(setup.student, setup.civil, None)
        .unwrap();

    let paused = service
        .change_career_state(setup.student, setup.civil, CareerState::Inactive)
        .unwrap();
    assert_eq!(paused.state, CareerState::Inactive);

    let err = service
        .change_career_state(setup.student, setup.civil, CareerState::Completed)
        .unwrap_err();
    assert!(matches!(err, ServiceError::Transition(_)));

    service
        .change_career_state(setup.student, setup.civil, CareerState::Active)
        .unwrap();
    service
        .change_career_state(setup.student, setup.civil, CareerState::Completed)
        .unwrap();

    let err = service
        .change_career_state(setup.student, setup.law, CareerState::Inactive)
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotRegistered { .. }));
}

#[test]
fn unmet_prerequisites_block_start_without_writing() {
    let conn = open_db_in_memory().unwrap();
    let setup = seed(&conn);
    let service = service(&conn);

    match service
        .start_subject(setup.student, setup.advanced, None)
        .unwrap_err()
    {
        ServiceError::PrerequisitesUnmet { missing, .. } => assert_eq!(missing, vec![setup.basics]),
        other => panic!("unexpected error: {other}"),
    }
    assert!(SqliteStudentRepository::new(&conn)
        .subject_progress(setup.student, setup.advanced)
        .unwrap()
        .is_none());
}

#[test]
fn passing_grade_decides_outcome_and_unblocks_dependents() {
    let conn = open_db_in_memory().unwrap();
    let setup = seed(&conn);
    let service = service(&conn);
    service
        .enroll_in_career(setup.student, setup.civil, None)
        .unwrap();

    let started = service
        .start_subject(setup.student, setup.basics, Some("2025-1".to_string()))
        .unwrap();
    assert_eq!(started.state, SubjectState::InProgress);
    assert_eq!(started.period.as_deref(), Some("2025-1"));

    // Threshold is inclusive.
    let graded = service
        .record_final_grade(setup.student, setup.basics, 4.0)
        .unwrap();
    assert_eq!(graded.state, SubjectState::Passed);
    assert_eq!(graded.final_grade, Some(4.0));
    assert!(is_eligible(&conn, setup.student, setup.advanced).unwrap());

    let next = service
        .start_subject(setup.student, setup.advanced, None)
        .unwrap();
    assert_eq!(next.state, SubjectState::InProgress);
}

#[test]
fn failed_subject_must_be_reset_before_retaking() {
    let conn = open_db_in_memory().unwrap();
    let setup = seed(&conn);
    let service = service(&conn);

    service
        .start_subject(setup.student, setup.basics, Some("2025-1".to_string()))
        .unwrap();
    let failed = service
        .record_final_grade(setup.student, setup.basics, 3.9)
        .unwrap();
    assert_eq!(failed.state, SubjectState::Failed);

    let err = service
        .start_subject(setup.student, setup.basics, Some("2025-2".to_string()))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Transition(_)));

    let reset = service.reset_subject(setup.student, setup.basics).unwrap();
    assert_eq!(reset.state, SubjectState::NotTaken);
    assert_eq!(reset.final_grade, None);

    let retake = service
        .start_subject(setup.student, setup.basics, Some("2025-2".to_string()))
        .unwrap();
    assert_eq!(retake.period.as_deref(), Some("2025-2"));
}

#[test]
fn grading_an_unregistered_subject_is_reported() {
    let conn = open_db_in_memory().unwrap();
    let setup = seed(&conn);

    let err = service(&conn)
        .record_final_grade(setup.student, setup.basics, 6.0)
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotRegistered { entity: "subject_progress", .. }));
}

#[test]
fn passing_grade_comes_from_configuration() {
    let conn = open_db_in_memory().unwrap();
    let setup = seed(&conn);
    let config = CoreConfig::from_toml_str("[grading]\npassing_grade = 55.0\n").unwrap();
    let service = EnrollmentService::new(SqliteStudentRepository::new(&conn), &config.grading);
    assert_eq!(service.passing_grade(), 55.0);

    service
        .start_subject(setup.student, setup.basics, None)
        .unwrap();
    let graded = service
        .record_final_grade(setup.student, setup.basics, 54.5)
        .unwrap();
    assert_eq!(graded.state, SubjectState::Failed);
}
