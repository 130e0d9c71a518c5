//! Integration tests for the task graph: creation, dependency-safe
//! deletion, finishing, and the read projections.
//!
//! Verification command: `cargo test --test task_graph`

use std::time::{SystemTime, UNIX_EPOCH};

use taskdeck_core::caller::{Caller, Capability};
use taskdeck_core::task::{Priority, TaskId, TaskInfo, TaskKind};
use taskdeck_server::engine::Engine;
use taskdeck_server::error::{EngineError, ErrorKind};
use taskdeck_server::tasks::DeleteOutcome;

/// Current time in milliseconds since epoch.
fn now_ms() -> u64 {
    u64::try_from(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis(),
    )
    .unwrap()
}

const HOUR: u64 = 1000 * 60 * 60;

fn info(title: &str) -> TaskInfo {
    TaskInfo {
        title: title.to_string(),
        kind: TaskKind::Homework,
        priority: Priority::Medium,
        cost: 30,
        deadline: now_ms() + 100 * HOUR,
    }
}

fn alice() -> Caller {
    Caller::with_capabilities("alice", [Capability::AssignTasks])
}

/// Adds `user` to the task's default roster group.
async fn join(engine: &Engine, publisher: &Caller, task: TaskId, user: &str) {
    let groups = engine.tasks.groups(task).await.unwrap();
    engine
        .add_group_member(publisher, task, groups[0].id, user)
        .await
        .unwrap();
}

#[tokio::test]
async fn delete_with_dependent_is_blocked_and_returns_the_full_set() {
    let engine = Engine::new();
    let caller = alice();

    let a = engine
        .create_task(&caller, info("a"), None, String::new())
        .await
        .unwrap();
    let b = engine
        .create_task(&caller, info("b"), Some(a), String::new())
        .await
        .unwrap();

    // A is blocked by B; nothing is deleted.
    let outcome = engine.delete_task(&caller, a).await.unwrap();
    let DeleteOutcome::Blocked(dependents) = outcome else {
        panic!("expected blocked delete");
    };
    assert_eq!(dependents.iter().map(|t| t.id).collect::<Vec<_>>(), vec![b]);
    assert!(engine.tasks.get(a).await.is_some());

    // Removing the dependent unblocks A.
    assert_eq!(
        engine.delete_task(&caller, b).await.unwrap(),
        DeleteOutcome::Deleted
    );
    assert_eq!(
        engine.delete_task(&caller, a).await.unwrap(),
        DeleteOutcome::Deleted
    );

    // Re-query fails with NotFound.
    let err = engine.task_detail(&caller, a).await.unwrap_err();
    assert_eq!(err, EngineError::TaskNotFound);
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn delete_reports_every_dependent() {
    let engine = Engine::new();
    let caller = alice();

    let root = engine
        .create_task(&caller, info("root"), None, String::new())
        .await
        .unwrap();
    let mut expected = vec![];
    for title in ["d1", "d2", "d3"] {
        expected.push(
            engine
                .create_task(&caller, info(title), Some(root), String::new())
                .await
                .unwrap(),
        );
    }

    let DeleteOutcome::Blocked(dependents) = engine.delete_task(&caller, root).await.unwrap()
    else {
        panic!("expected blocked delete");
    };
    let mut ids: Vec<TaskId> = dependents.iter().map(|t| t.id).collect();
    ids.sort();
    expected.sort();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn predecessor_must_be_an_existing_own_task() {
    let engine = Engine::new();
    let caller = alice();

    let err = engine
        .create_task(&caller, info("x"), Some(TaskId::new()), String::new())
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::PredecessorMissing);
    assert_eq!(err.kind(), ErrorKind::Validation);

    let bobs = engine
        .create_task(&Caller::new("bob"), info("bobs"), None, String::new())
        .await
        .unwrap();
    let err = engine
        .create_task(&caller, info("x"), Some(bobs), String::new())
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::PredecessorNotOwned);
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn update_is_publisher_or_manager_only_and_kind_is_immutable() {
    let engine = Engine::new();
    let caller = alice();
    let id = engine
        .create_task(&caller, info("t"), None, "desc".to_string())
        .await
        .unwrap();

    let err = engine
        .update_task(&Caller::new("bob"), id, info("t"), String::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Permission);

    let mut changed = info("t");
    changed.kind = TaskKind::Extra;
    assert_eq!(
        engine.update_task(&caller, id, changed, String::new()).await,
        Err(EngineError::KindImmutable)
    );

    let manager = Caller::with_capabilities("ops", [Capability::ManageAllTasks]);
    engine
        .update_task(&manager, id, info("renamed"), "desc2".to_string())
        .await
        .unwrap();
    let detail = engine.task_detail(&caller, id).await.unwrap();
    assert_eq!(detail.task.info.title, "renamed");
    assert_eq!(detail.description, "desc2");
}

#[tokio::test]
async fn finish_requires_participation() {
    let engine = Engine::new();
    let caller = alice();
    let id = engine
        .create_task(&caller, info("t"), None, String::new())
        .await
        .unwrap();

    let err = engine.finish_task(&caller, id).await.unwrap_err();
    assert_eq!(err, EngineError::NotJoined);
    assert_eq!(err.kind(), ErrorKind::State);
}

#[tokio::test]
async fn finish_twice_is_rejected() {
    let engine = Engine::new();
    let caller = alice();
    let id = engine
        .create_task(&caller, info("t"), None, String::new())
        .await
        .unwrap();
    join(&engine, &caller, id, "alice").await;

    engine.finish_task(&caller, id).await.unwrap();
    assert_eq!(
        engine.finish_task(&caller, id).await,
        Err(EngineError::AlreadyFinished)
    );
}

#[tokio::test]
async fn finish_after_deadline_is_rejected() {
    let engine = Engine::new();
    let caller = alice();
    let mut past = info("t");
    past.deadline = now_ms().saturating_sub(HOUR);
    let id = engine
        .create_task(&caller, past, None, String::new())
        .await
        .unwrap();
    join(&engine, &caller, id, "alice").await;

    let err = engine.finish_task(&caller, id).await.unwrap_err();
    assert_eq!(err, EngineError::TaskExpired);
    assert_eq!(err.kind(), ErrorKind::State);
}

#[tokio::test]
async fn finish_waits_for_the_predecessor() {
    let engine = Engine::new();
    let caller = alice();
    let first = engine
        .create_task(&caller, info("first"), None, String::new())
        .await
        .unwrap();
    let second = engine
        .create_task(&caller, info("second"), Some(first), String::new())
        .await
        .unwrap();
    join(&engine, &caller, first, "alice").await;
    join(&engine, &caller, second, "alice").await;

    assert_eq!(
        engine.finish_task(&caller, second).await,
        Err(EngineError::PredecessorUnfinished)
    );

    engine.finish_task(&caller, first).await.unwrap();
    engine.finish_task(&caller, second).await.unwrap();
}

#[tokio::test]
async fn participated_list_is_arranged_by_dependency_then_deadline() {
    let engine = Engine::new();
    let caller = alice();

    let mut early = info("early");
    early.deadline = now_ms() + 10 * HOUR;
    let mut late = info("late");
    late.deadline = now_ms() + 200 * HOUR;

    let first = engine
        .create_task(&caller, late.clone(), None, String::new())
        .await
        .unwrap();
    // The dependent has the earlier deadline but must come after.
    let mut dependent_info = early.clone();
    dependent_info.title = "dependent".to_string();
    let dependent = engine
        .create_task(&caller, dependent_info, Some(first), String::new())
        .await
        .unwrap();
    let solo = engine
        .create_task(&caller, early, None, String::new())
        .await
        .unwrap();

    join(&engine, &caller, first, "alice").await;
    join(&engine, &caller, dependent, "alice").await;
    join(&engine, &caller, solo, "alice").await;

    let list = engine.list_participated(&caller).await;
    let ids: Vec<TaskId> = list.iter().map(|p| p.task.id).collect();
    assert_eq!(ids, vec![solo, first, dependent]);
    assert!(list.iter().all(|p| !p.finished));
}

#[tokio::test]
async fn detail_includes_predecessor_and_live_status() {
    let engine = Engine::new();
    let caller = alice();

    let mut urgent = info("due soon");
    urgent.deadline = now_ms() + HOUR;
    urgent.priority = Priority::High;

    let first = engine
        .create_task(&caller, info("first"), None, String::new())
        .await
        .unwrap();
    let second = engine
        .create_task(&caller, urgent, Some(first), String::new())
        .await
        .unwrap();

    let detail = engine.task_detail(&caller, second).await.unwrap();
    assert_eq!(detail.predecessor.as_ref().map(|t| t.id), Some(first));
    assert_eq!(detail.status.tier, taskdeck_core::classify::Tier::Red);
    assert_eq!(
        detail.status.quadrant,
        Some(taskdeck_core::classify::Quadrant::ImportantAndUrgent)
    );
    // The publisher does not participate: no finished flag.
    assert_eq!(detail.finished, None);
}

#[tokio::test]
async fn created_list_is_scoped_unless_manager() {
    let engine = Engine::new();
    let caller = alice();
    let own = engine
        .create_task(&caller, info("own"), None, String::new())
        .await
        .unwrap();
    engine
        .create_task(&Caller::new("bob"), info("other"), None, String::new())
        .await
        .unwrap();

    let mine = engine.list_created(&caller).await;
    assert_eq!(mine.iter().map(|t| t.id).collect::<Vec<_>>(), vec![own]);

    let manager = Caller::with_capabilities("ops", [Capability::ManageAllTasks]);
    assert_eq!(engine.list_created(&manager).await.len(), 2);
}
