use rusqlite::Connection;
use sprintboard_core::db::open_db_in_memory;
use sprintboard_core::policy::table_targets;
use sprintboard_core::{
    allowed_transitions, Board, BoardError, BoardService, BoardSnapshot, Field, FieldReason,
    GuardedAction, Role, Session, SqliteBoardStore, Task, TaskId, TaskPatch, TaskState, UserId,
    DEFAULT_ADMIN_ID, DEFAULT_TASK_ID,
};

fn default_service(conn: &Connection) -> BoardService<SqliteBoardStore<'_>> {
    let board = Board::from_snapshot(BoardSnapshot::default_board()).unwrap();
    BoardService::new(board, SqliteBoardStore::new(conn))
}

fn admin_session() -> Session {
    Session::new(UserId::new(DEFAULT_ADMIN_ID))
}

fn column_ids(service: &BoardService<SqliteBoardStore<'_>>, state: TaskState) -> Vec<TaskId> {
    service
        .board()
        .column(state)
        .iter()
        .map(|task| task.id.clone())
        .collect()
}

/// Places a fresh task assigned to `assignee` into `state` via the admin.
fn task_in_state(
    service: &mut BoardService<SqliteBoardStore<'_>>,
    assignee: Option<UserId>,
    state: TaskState,
) -> Task {
    let task = service.create_task("Work", "details", assignee).unwrap();
    if state != TaskState::New {
        service
            .move_task(&admin_session(), &task.id, state)
            .unwrap();
    }
    service.find_task(&task.id).unwrap().clone()
}

#[test]
fn create_task_forces_new_and_appends() {
    let conn = open_db_in_memory().unwrap();
    let mut service = default_service(&conn);

    let first = service.create_task(" First ", " one ", None).unwrap();
    let second = service.create_task("Second", "two", None).unwrap();

    assert_eq!(first.state, TaskState::New);
    assert_eq!(first.title, "First");
    assert_eq!(first.description, "one");
    assert!(first.id.as_str().starts_with("t-"));
    assert_eq!(
        column_ids(&service, TaskState::New),
        vec![TaskId::new(DEFAULT_TASK_ID), first.id, second.id]
    );
}

#[test]
fn blank_title_and_description_report_both_fields() {
    let conn = open_db_in_memory().unwrap();
    let mut service = default_service(&conn);

    let err = service.create_task(" ", "", None).unwrap_err();
    let errors = err.validation().unwrap();
    assert_eq!(errors.len(), 2);
    assert_eq!(errors.reason(Field::Title), Some(&FieldReason::Required));
    assert_eq!(
        errors.reason(Field::Description),
        Some(&FieldReason::Required)
    );
    assert_eq!(service.board().columns().len(), 1);
}

#[test]
fn unknown_assignee_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let mut service = default_service(&conn);

    let ghost = UserId::new("u-ghost");
    let err = service
        .create_task("Fix bug", "desc", Some(ghost.clone()))
        .unwrap_err();
    assert_eq!(
        err.validation().unwrap().reason(Field::Assignee),
        Some(&FieldReason::UnknownUser(ghost))
    );
}

#[test]
fn transitions_outside_table_are_rejected_without_moving() {
    let conn = open_db_in_memory().unwrap();
    let mut service = default_service(&conn);
    let bob = service.create_user("Bob", "bob@example.com").unwrap();
    let bob_session = Session::new(bob.id.clone());

    for from in TaskState::ALL {
        for to in TaskState::ALL {
            if to == from || table_targets(from).contains(&to) {
                continue;
            }
            let task = task_in_state(&mut service, Some(bob.id.clone()), from);

            let err = service
                .update_task(&bob_session, &task.id, TaskPatch::state(to))
                .unwrap_err();
            assert_eq!(
                err.validation().unwrap().reason(Field::State),
                Some(&FieldReason::TransitionNotAllowed { from, to }),
                "{from} -> {to}"
            );
            assert_eq!(service.board().locate_task(&task.id), Some((from, 0)));
        }
    }
}

#[test]
fn admin_overlay_does_not_widen_table_for_other_states() {
    let conn = open_db_in_memory().unwrap();
    let mut service = default_service(&conn);
    let task = task_in_state(&mut service, None, TaskState::Done);

    for to in [TaskState::Blocked, TaskState::Resolved] {
        let err = service
            .update_task(&admin_session(), &task.id, TaskPatch::state(to))
            .unwrap_err();
        assert!(err.validation().unwrap().has(Field::State));
    }
    assert_eq!(
        service.board().locate_task(&task.id),
        Some((TaskState::Done, 0))
    );
}

#[test]
fn valid_transitions_prepend_to_destination_and_leave_source() {
    let conn = open_db_in_memory().unwrap();
    let mut service = default_service(&conn);

    for from in TaskState::ALL {
        for to in allowed_transitions(from, Role::Admin) {
            let task = task_in_state(&mut service, None, from);
            // Ensure the destination already holds something to be in front of.
            task_in_state(&mut service, None, to);

            let moved = service
                .update_task(&admin_session(), &task.id, TaskPatch::state(to))
                .unwrap();

            assert_eq!(moved.state, to);
            assert_eq!(service.board().column(to)[0].id, task.id, "{from} -> {to}");
            assert!(!column_ids(&service, from).contains(&task.id));
        }
    }
}

#[test]
fn member_cannot_reopen_blocked_task_but_admin_can() {
    let conn = open_db_in_memory().unwrap();
    let mut service = default_service(&conn);
    let bob = service.create_user("Bob", "bob@example.com").unwrap();
    let bob_session = Session::new(bob.id.clone());

    let task = service.create_task("Fix bug", "desc", None).unwrap();
    service
        .update_task(&admin_session(), &task.id, TaskPatch::state(TaskState::Blocked))
        .unwrap();

    let err = service
        .update_task(&bob_session, &task.id, TaskPatch::state(TaskState::New))
        .unwrap_err();
    assert!(err.validation().unwrap().has(Field::State));
    assert_eq!(
        service.board().locate_task(&task.id),
        Some((TaskState::Blocked, 0))
    );

    service
        .update_task(&admin_session(), &task.id, TaskPatch::state(TaskState::New))
        .unwrap();
    assert_eq!(
        column_ids(&service, TaskState::New),
        vec![task.id.clone(), TaskId::new(DEFAULT_TASK_ID)]
    );
}

#[test]
fn field_only_patch_updates_in_place() {
    let conn = open_db_in_memory().unwrap();
    let mut service = default_service(&conn);
    let bob = service.create_user("Bob", "bob@example.com").unwrap();
    let task = service.create_task("Draft", "first", None).unwrap();
    service.create_task("Later", "second", None).unwrap();

    let patch = TaskPatch::default()
        .with_title("  Final ")
        .with_description("rewritten")
        .with_assignee(Some(bob.id.clone()))
        .with_state(TaskState::New);
    let updated = service
        .update_task(&admin_session(), &task.id, patch)
        .unwrap();

    assert_eq!(updated.title, "Final");
    assert_eq!(updated.description, "rewritten");
    assert_eq!(updated.assignee_id, Some(bob.id));
    assert_eq!(
        service.board().locate_task(&task.id),
        Some((TaskState::New, 1))
    );
}

#[test]
fn relocating_patch_applies_all_fields_together() {
    let conn = open_db_in_memory().unwrap();
    let mut service = default_service(&conn);
    let task = service.create_task("Draft", "first", None).unwrap();

    let patch = TaskPatch::state(TaskState::InProgress).with_title("Started");
    service
        .update_task(&admin_session(), &task.id, patch)
        .unwrap();

    let stored = &service.board().column(TaskState::InProgress)[0];
    assert_eq!(stored.id, task.id);
    assert_eq!(stored.title, "Started");
    assert_eq!(stored.state, TaskState::InProgress);
}

#[test]
fn clearing_assignee_unassigns_task() {
    let conn = open_db_in_memory().unwrap();
    let mut service = default_service(&conn);
    let bob = service.create_user("Bob", "bob@example.com").unwrap();
    let task = service
        .create_task("Owned", "desc", Some(bob.id.clone()))
        .unwrap();

    let updated = service
        .update_task(
            &Session::new(bob.id),
            &task.id,
            TaskPatch::default().with_assignee(None),
        )
        .unwrap();
    assert!(updated.is_unassigned());
}

#[test]
fn blank_patch_fields_are_rejected_together() {
    let conn = open_db_in_memory().unwrap();
    let mut service = default_service(&conn);

    let patch = TaskPatch::default()
        .with_title(" ")
        .with_description("");
    let err = service
        .update_task(&admin_session(), &TaskId::new(DEFAULT_TASK_ID), patch)
        .unwrap_err();
    let errors = err.validation().unwrap();
    assert!(errors.has(Field::Title));
    assert!(errors.has(Field::Description));
    assert_eq!(
        service.find_task(&TaskId::new(DEFAULT_TASK_ID)).unwrap().title,
        "Welcome to Sprint Board"
    );
}

#[test]
fn members_edit_only_their_own_tasks() {
    let conn = open_db_in_memory().unwrap();
    let mut service = default_service(&conn);
    let bob = service.create_user("Bob", "bob@example.com").unwrap();
    let carol = service.create_user("Carol", "carol@example.com").unwrap();
    let bob_session = Session::new(bob.id.clone());

    let own = service
        .create_task("Mine", "desc", Some(bob.id.clone()))
        .unwrap();
    let foreign = service
        .create_task("Theirs", "desc", Some(carol.id))
        .unwrap();

    service
        .move_task(&bob_session, &own.id, TaskState::InProgress)
        .unwrap();
    for target in [&foreign.id, &TaskId::new(DEFAULT_TASK_ID)] {
        let err = service
            .update_task(&bob_session, target, TaskPatch::default().with_title("x"))
            .unwrap_err();
        assert_eq!(
            err,
            BoardError::Permission {
                action: GuardedAction::EditTask
            }
        );
    }
}

#[test]
fn updating_unknown_task_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let mut service = default_service(&conn);

    let missing = TaskId::new("t-missing");
    let err = service
        .update_task(&admin_session(), &missing, TaskPatch::state(TaskState::Done))
        .unwrap_err();
    assert_eq!(err, BoardError::TaskNotFound(missing));
}

#[test]
fn move_task_follows_the_transition_table() {
    let conn = open_db_in_memory().unwrap();
    let mut service = default_service(&conn);
    let task = task_in_state(&mut service, None, TaskState::Done);

    let err = service
        .move_task(&admin_session(), &task.id, TaskState::Resolved)
        .unwrap_err();
    assert!(err.validation().unwrap().has(Field::State));

    service
        .move_task(&admin_session(), &task.id, TaskState::InProgress)
        .unwrap();
    assert_eq!(
        service.board().locate_task(&task.id),
        Some((TaskState::InProgress, 0))
    );

    // Dropping onto the current column is a no-op.
    service
        .move_task(&admin_session(), &task.id, TaskState::InProgress)
        .unwrap();
    assert_eq!(
        service.board().locate_task(&task.id),
        Some((TaskState::InProgress, 0))
    );
}

#[test]
fn only_admins_delete_tasks() {
    let conn = open_db_in_memory().unwrap();
    let mut service = default_service(&conn);
    let bob = service.create_user("Bob", "bob@example.com").unwrap();
    let own = service
        .create_task("Mine", "desc", Some(bob.id.clone()))
        .unwrap();

    let err = service
        .delete_task(&Session::new(bob.id), &own.id)
        .unwrap_err();
    assert_eq!(
        err,
        BoardError::Permission {
            action: GuardedAction::DeleteTask
        }
    );

    service.delete_task(&admin_session(), &own.id).unwrap();
    assert!(service.find_task(&own.id).is_none());

    let err = service.delete_task(&admin_session(), &own.id).unwrap_err();
    assert_eq!(err, BoardError::TaskNotFound(own.id));
}

#[test]
fn allowed_transitions_reflect_requester_role() {
    let conn = open_db_in_memory().unwrap();
    let mut service = default_service(&conn);
    let bob = service.create_user("Bob", "bob@example.com").unwrap();
    let task = task_in_state(&mut service, Some(bob.id.clone()), TaskState::Blocked);

    assert_eq!(
        service
            .allowed_transitions(&admin_session(), &task.id)
            .unwrap(),
        vec![
            TaskState::New,
            TaskState::InProgress,
            TaskState::Resolved,
            TaskState::Done
        ]
    );
    assert_eq!(
        service
            .allowed_transitions(&Session::new(bob.id), &task.id)
            .unwrap(),
        vec![TaskState::InProgress, TaskState::Resolved, TaskState::Done]
    );
}
