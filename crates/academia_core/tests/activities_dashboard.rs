use academia_core::db::{open_db, open_db_in_memory, DbOptions};
use academia_core::model::career::Career;
use academia_core::model::enrollment::ActivityProgress;
use academia_core::model::student::Student;
use academia_core::model::subject::{Subject, ThematicAxis};
use academia_core::model::work::{Activity, ActivityType, Priority};
use academia_core::read_model::activities::{by_subject, due_within, overdue, overdue_as_of, pending, this_week};
use academia_core::read_model::dashboard::{dashboard, dashboard_as_of};
use academia_core::repo::catalog_repo::{CatalogRepository, SqliteCatalogRepository};
use academia_core::repo::student_repo::{SqliteStudentRepository, StudentRepository};
use academia_core::service::activity_service::ActivityProgressService;
use academia_core::ActivityState;
use chrono::{Days, Local, NaiveDate};
use rusqlite::Connection;

fn day(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}

struct Course {
    student: i64,
    subject: i64,
    axis: i64,
    homework: i64,
    exam: i64,
}

fn seed_course(conn: &Connection) -> Course {
    let catalog = SqliteCatalogRepository::new(conn);
    let career = catalog.create_career(&Career::new("Civil")).unwrap();
    let subject = catalog
        .create_subject(&Subject::new(career, "MAT101", "Cálculo I", 6))
        .unwrap();
    let axis = catalog
        .create_axis(&ThematicAxis::new(subject, "Límites", 1))
        .unwrap();
    let homework = catalog
        .create_activity_type(&ActivityType::new("Tarea", "TAR", Priority::Low))
        .unwrap();
    let exam = catalog
        .create_activity_type(&ActivityType::new("Prueba", "PEP", Priority::High))
        .unwrap();
    let student = SqliteStudentRepository::new(conn)
        .create_student(&Student::new("Ana", "ana@uni.cl"))
        .unwrap();
    Course {
        student,
        subject,
        axis,
        homework,
        exam,
    }
}

/// Creates an activity due on `due` and assigns it to the course student.
fn assign_due(conn: &Connection, course: &Course, title: &str, kind: i64, due: NaiveDate) -> i64 {
    let mut activity = Activity::new(course.axis, kind, title);
    activity.due_date = Some(due);
    let id = SqliteCatalogRepository::new(conn)
        .create_activity(&activity)
        .unwrap();
    ActivityProgressService::new(SqliteStudentRepository::new(conn))
        .assign(course.student, id)
        .unwrap();
    id
}

#[test]
fn dashboard_keeps_read_time_and_stored_overdue_apart() {
    let conn = open_db_in_memory().unwrap();
    let course = seed_course(&conn);
    let service = ActivityProgressService::new(SqliteStudentRepository::new(&conn));

    assign_due(&conn, &course, "Guía 1", course.homework, day("2025-05-01"));
    let submitted = assign_due(&conn, &course, "Guía 2", course.homework, day("2025-05-10"));
    let running = assign_due(&conn, &course, "Proyecto", course.homework, day("2025-06-20"));
    assign_due(&conn, &course, "Prueba 1", course.exam, day("2025-05-15"));

    service
        .submit(course.student, submitted, day("2025-05-09"))
        .unwrap();
    service.start(course.student, running).unwrap();

    let today = day("2025-06-01");
    let board = dashboard_as_of(&conn, course.student, today).unwrap().unwrap();
    assert_eq!(board.total, 4);
    assert_eq!(board.submitted, 1);
    assert_eq!(board.pending, 3);
    assert_eq!(board.overdue, 2);
    assert_eq!(board.recorded_overdue, 0);

    // Sweeping at an earlier day stores only what was late back then.
    assert_eq!(service.mark_overdue(day("2025-05-12")).unwrap(), 1);
    let board = dashboard_as_of(&conn, course.student, today).unwrap().unwrap();
    assert_eq!(board.overdue, 2);
    assert_eq!(board.recorded_overdue, 1);
    assert_eq!(board.pending, 2);

    assert_eq!(service.mark_overdue(today).unwrap(), 1);
    assert_eq!(service.mark_overdue(today).unwrap(), 0);
    let board = dashboard_as_of(&conn, course.student, today).unwrap().unwrap();
    assert_eq!(board.recorded_overdue, 2);
    assert_eq!(board.pending, 1);
}

#[test]
fn late_submission_clears_read_time_overdue() {
    let conn = open_db_in_memory().unwrap();
    let course = seed_course(&conn);
    let service = ActivityProgressService::new(SqliteStudentRepository::new(&conn));
    let late = assign_due(&conn, &course, "Guía 1", course.homework, day("2025-05-01"));

    service.mark_overdue(day("2025-05-02")).unwrap();
    let progress = service
        .submit(course.student, late, day("2025-05-04"))
        .unwrap();
    assert_eq!(progress.state, ActivityState::Submitted);
    assert_eq!(progress.submitted_on, Some(day("2025-05-04")));

    let board = dashboard_as_of(&conn, course.student, day("2025-06-01"))
        .unwrap()
        .unwrap();
    assert_eq!(board.overdue, 0);
    assert_eq!(board.recorded_overdue, 0);
    assert_eq!(board.submitted, 1);
    assert!(overdue_as_of(&conn, course.student, day("2025-06-01"))
        .unwrap()
        .is_empty());
}

#[test]
fn sweep_keeps_a_submission_committed_by_another_connection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("academia.db");
    let sweeper = open_db(&path, &DbOptions::default()).unwrap();
    let submitter = open_db(&path, &DbOptions::default()).unwrap();
    let course = seed_course(&sweeper);
    let activity = assign_due(&sweeper, &course, "Guía 1", course.homework, day("2025-05-01"));
    let still_open = assign_due(&sweeper, &course, "Guía 2", course.homework, day("2025-05-02"));
    ActivityProgressService::new(SqliteStudentRepository::new(&sweeper))
        .start(course.student, still_open)
        .unwrap();

    // The sweeping side last saw the registration open.
    let seen = SqliteStudentRepository::new(&sweeper)
        .activity_progress(course.student, activity)
        .unwrap()
        .unwrap();
    assert_eq!(seen.state, ActivityState::Pending);

    ActivityProgressService::new(SqliteStudentRepository::new(&submitter))
        .submit(course.student, activity, day("2025-05-09"))
        .unwrap();

    let swept = ActivityProgressService::new(SqliteStudentRepository::new(&sweeper))
        .mark_overdue(day("2025-05-10"))
        .unwrap();
    assert_eq!(swept, 1);

    let students = SqliteStudentRepository::new(&sweeper);
    let submitted = students
        .activity_progress(course.student, activity)
        .unwrap()
        .unwrap();
    assert_eq!(submitted.state, ActivityState::Submitted);
    assert_eq!(submitted.submitted_on, Some(day("2025-05-09")));
    let late = students
        .activity_progress(course.student, still_open)
        .unwrap()
        .unwrap();
    assert_eq!(late.state, ActivityState::Overdue);
}

#[test]
fn submitted_activity_cannot_be_reopened() {
    let conn = open_db_in_memory().unwrap();
    let course = seed_course(&conn);
    let service = ActivityProgressService::new(SqliteStudentRepository::new(&conn));
    let activity = assign_due(&conn, &course, "Guía 1", course.homework, day("2025-05-01"));

    service
        .submit(course.student, activity, day("2025-04-30"))
        .unwrap();
    assert!(service.start(course.student, activity).is_err());

    let stored = SqliteStudentRepository::new(&conn)
        .activity_progress(course.student, activity)
        .unwrap()
        .unwrap();
    assert_eq!(stored.state, ActivityState::Submitted);
}

#[test]
fn submitted_row_without_date_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let course = seed_course(&conn);
    let activity = assign_due(&conn, &course, "Guía 1", course.homework, day("2025-05-01"));

    let mut progress = ActivityProgress::new(course.student, activity);
    progress.state = ActivityState::Submitted;
    let err = SqliteStudentRepository::new(&conn)
        .update_activity_progress(&progress)
        .unwrap_err();
    assert!(err.to_string().contains("submission"), "{err}");
}

#[test]
fn pending_lists_open_work_soonest_first() {
    let conn = open_db_in_memory().unwrap();
    let course = seed_course(&conn);
    let later = assign_due(&conn, &course, "Proyecto", course.homework, day("2025-06-20"));
    let sooner = assign_due(&conn, &course, "Prueba 1", course.exam, day("2025-06-05"));
    let done = assign_due(&conn, &course, "Guía 1", course.homework, day("2025-06-01"));
    ActivityProgressService::new(SqliteStudentRepository::new(&conn))
        .submit(course.student, done, day("2025-05-30"))
        .unwrap();

    let open = pending(&conn, course.student).unwrap();
    assert_eq!(
        open.iter().map(|row| row.activity_id).collect::<Vec<_>>(),
        vec![sooner, later]
    );
    assert_eq!(open[0].priority, Priority::High);
    assert_eq!(open[0].type_code, "PEP");
    assert_eq!(open[0].subject_id, course.subject);
    assert_eq!(open[0].subject_code, "MAT101");
}

#[test]
fn due_within_is_inclusive_on_both_ends() {
    let conn = open_db_in_memory().unwrap();
    let course = seed_course(&conn);
    let today = day("2025-06-01");
    let first = assign_due(&conn, &course, "Hoy", course.homework, today);
    let last = assign_due(&conn, &course, "Semana", course.homework, day("2025-06-08"));
    assign_due(&conn, &course, "Después", course.homework, day("2025-06-09"));
    assign_due(&conn, &course, "Antes", course.homework, day("2025-05-31"));

    let week = due_within(&conn, course.student, today, 7).unwrap();
    assert_eq!(
        week.iter().map(|row| row.activity_id).collect::<Vec<_>>(),
        vec![first, last]
    );
}

#[test]
fn clock_based_feeds_use_the_local_date() {
    let conn = open_db_in_memory().unwrap();
    let course = seed_course(&conn);
    let today = Local::now().date_naive();
    let past = assign_due(&conn, &course, "Antigua", course.homework, day("2000-01-10"));
    let soon = assign_due(
        &conn,
        &course,
        "Próxima",
        course.homework,
        today.checked_add_days(Days::new(2)).unwrap(),
    );

    let late = overdue(&conn, course.student).unwrap();
    assert_eq!(late.iter().map(|row| row.activity_id).collect::<Vec<_>>(), vec![past]);

    let week = this_week(&conn, course.student).unwrap();
    assert_eq!(week.iter().map(|row| row.activity_id).collect::<Vec<_>>(), vec![soon]);

    let board = dashboard(&conn, course.student).unwrap().unwrap();
    assert_eq!(board.total, 2);
    assert_eq!(board.overdue, 1);
}

#[test]
fn by_subject_counts_activities_and_date_span() {
    let conn = open_db_in_memory().unwrap();
    let course = seed_course(&conn);
    let catalog = SqliteCatalogRepository::new(&conn);
    catalog
        .create_activity(
            &Activity::new(course.axis, course.homework, "Guía").scheduled(day("2025-03-10"), day("2025-03-20")),
        )
        .unwrap();
    catalog
        .create_activity(
            &Activity::new(course.axis, course.exam, "Prueba").scheduled(day("2025-04-01"), day("2025-04-01")),
        )
        .unwrap();
    let career = catalog.get_subject(course.subject).unwrap().unwrap().career_id;
    catalog
        .create_subject(&Subject::new(career, "MAT102", "Álgebra", 5))
        .unwrap();

    let counts = by_subject(&conn).unwrap();
    assert_eq!(counts.len(), 2);
    assert_eq!(counts[0].code, "MAT101");
    assert_eq!(counts[0].total, 2);
    assert_eq!(counts[0].first_date, Some(day("2025-03-10")));
    assert_eq!(counts[0].last_date, Some(day("2025-04-01")));
    assert_eq!(counts[1].total, 0);
    assert_eq!(counts[1].first_date, None);
}

#[test]
fn dashboard_of_unknown_student_is_none_and_empty_student_is_zero() {
    let conn = open_db_in_memory().unwrap();
    let course = seed_course(&conn);

    assert!(dashboard_as_of(&conn, course.student + 1, day("2025-06-01"))
        .unwrap()
        .is_none());
    let board = dashboard_as_of(&conn, course.student, day("2025-06-01"))
        .unwrap()
        .unwrap();
    assert_eq!((board.total, board.submitted, board.pending, board.overdue), (0, 0, 0, 0));
}

#[test]
fn read_models_serialize_to_json() {
    let conn = open_db_in_memory().unwrap();
    let course = seed_course(&conn);
    assign_due(&conn, &course, "Guía 1", course.homework, day("2025-05-01"));

    let board = dashboard_as_of(&conn, course.student, day("2025-06-01"))
        .unwrap()
        .unwrap();
    let json = serde_json::to_value(&board).unwrap();
    assert_eq!(json["student"], "Ana");
    assert_eq!(json["overdue"], 1);

    let rows = serde_json::to_value(pending(&conn, course.student).unwrap()).unwrap();
    assert_eq!(rows[0]["title"], "Guía 1");
    assert_eq!(rows[0]["due_date"], "2025-05-01");
    assert_eq!(rows[0]["state"], "pending");
}
