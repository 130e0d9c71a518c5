//! Integration tests for group assignment: sub-team rosters on group
//! tasks, cross-group uniqueness, the assign capability, and the coupling
//! between membership and the dependency graph.
//!
//! Verification command: `cargo test --test group_assignment`

use std::time::{SystemTime, UNIX_EPOCH};

use taskdeck_core::caller::{Caller, Capability};
use taskdeck_core::task::{GroupId, Priority, TaskId, TaskInfo, TaskKind};
use taskdeck_server::engine::Engine;
use taskdeck_server::error::{EngineError, ErrorKind};

fn now_ms() -> u64 {
    u64::try_from(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis(),
    )
    .unwrap()
}

fn info(title: &str, kind: TaskKind) -> TaskInfo {
    TaskInfo {
        title: title.to_string(),
        kind,
        priority: Priority::High,
        cost: 60,
        deadline: now_ms() + 1000 * 60 * 60 * 100,
    }
}

fn publisher() -> Caller {
    Caller::with_capabilities("alice", [Capability::AssignTasks])
}

async fn group_task(engine: &Engine) -> TaskId {
    engine
        .create_task(&publisher(), info("team work", TaskKind::Group), None, String::new())
        .await
        .unwrap()
}

#[tokio::test]
async fn groups_only_on_group_kind_tasks() {
    let engine = Engine::new();
    let caller = publisher();
    let homework = engine
        .create_task(&caller, info("solo", TaskKind::Homework), None, String::new())
        .await
        .unwrap();

    let err = engine.create_group(&caller, homework).await.unwrap_err();
    assert_eq!(err, EngineError::NotGroupTask);
    assert_eq!(err.kind(), ErrorKind::State);

    assert_eq!(
        engine.delete_group(&caller, homework, GroupId::new()).await,
        Err(EngineError::NotGroupTask)
    );
}

#[tokio::test]
async fn no_user_in_two_groups_of_one_task() {
    let engine = Engine::new();
    let caller = publisher();
    let task = group_task(&engine).await;
    let g1 = engine.create_group(&caller, task).await.unwrap();
    let g2 = engine.create_group(&caller, task).await.unwrap();

    engine.add_group_member(&caller, task, g1, "bob").await.unwrap();
    let err = engine
        .add_group_member(&caller, task, g2, "bob")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::AlreadyMember);
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn mutations_require_publisher_or_manager() {
    let engine = Engine::new();
    let task = group_task(&engine).await;
    let gid = engine.create_group(&publisher(), task).await.unwrap();

    let stranger = Caller::with_capabilities("mallory", [Capability::AssignTasks]);
    assert_eq!(
        engine.create_group(&stranger, task).await,
        Err(EngineError::NotTaskManager)
    );
    assert_eq!(
        engine.add_group_member(&stranger, task, gid, "bob").await,
        Err(EngineError::NotTaskManager)
    );

    let manager = Caller::with_capabilities(
        "ops",
        [Capability::ManageAllTasks, Capability::AssignTasks],
    );
    engine.add_group_member(&manager, task, gid, "bob").await.unwrap();
    engine
        .remove_group_member(&manager, task, gid, "bob")
        .await
        .unwrap();
    engine.delete_group(&manager, task, gid).await.unwrap();
}

#[tokio::test]
async fn assigning_others_needs_the_assign_capability() {
    let engine = Engine::new();
    let plain = Caller::new("alice");
    let task = engine
        .create_task(&plain, info("t", TaskKind::Group), None, String::new())
        .await
        .unwrap();
    let gid = engine.create_group(&plain, task).await.unwrap();

    let err = engine
        .add_group_member(&plain, task, gid, "bob")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::AssignRequired);
    assert_eq!(err.kind(), ErrorKind::Permission);

    // Self-assignment stays open to the publisher.
    engine.add_group_member(&plain, task, gid, "alice").await.unwrap();
    engine
        .remove_group_member(&plain, task, gid, "alice")
        .await
        .unwrap();
}

#[tokio::test]
async fn joining_a_dependent_requires_the_predecessor_first() {
    let engine = Engine::new();
    let caller = publisher();
    let first = group_task(&engine).await;
    let second = engine
        .create_task(&caller, info("phase 2", TaskKind::Group), Some(first), String::new())
        .await
        .unwrap();
    let g_first = engine.create_group(&caller, first).await.unwrap();
    let g_second = engine.create_group(&caller, second).await.unwrap();

    let err = engine
        .add_group_member(&caller, second, g_second, "bob")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::PredecessorNotJoined);
    assert_eq!(err.kind(), ErrorKind::State);

    engine.add_group_member(&caller, first, g_first, "bob").await.unwrap();
    engine
        .add_group_member(&caller, second, g_second, "bob")
        .await
        .unwrap();
}

#[tokio::test]
async fn leaving_is_blocked_while_a_dependent_membership_exists() {
    let engine = Engine::new();
    let caller = publisher();
    let first = group_task(&engine).await;
    let second = engine
        .create_task(&caller, info("phase 2", TaskKind::Group), Some(first), String::new())
        .await
        .unwrap();
    let g_first = engine.create_group(&caller, first).await.unwrap();
    let g_second = engine.create_group(&caller, second).await.unwrap();

    engine.add_group_member(&caller, first, g_first, "bob").await.unwrap();
    engine
        .add_group_member(&caller, second, g_second, "bob")
        .await
        .unwrap();

    let err = engine
        .remove_group_member(&caller, first, g_first, "bob")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::DependentParticipation);

    engine
        .remove_group_member(&caller, second, g_second, "bob")
        .await
        .unwrap();
    engine
        .remove_group_member(&caller, first, g_first, "bob")
        .await
        .unwrap();
}

#[tokio::test]
async fn per_member_completion_is_independent() {
    let engine = Engine::new();
    let caller = publisher();
    let task = group_task(&engine).await;
    let gid = engine.create_group(&caller, task).await.unwrap();
    engine.add_group_member(&caller, task, gid, "u1").await.unwrap();
    engine.add_group_member(&caller, task, gid, "u2").await.unwrap();

    engine.finish_task(&Caller::new("u1"), task).await.unwrap();

    let detail = engine.task_detail(&caller, task).await.unwrap();
    let groups = detail.all_groups.unwrap();
    let group = groups.iter().find(|g| g.id == gid).unwrap();
    let states: Vec<(&str, bool)> = group
        .members
        .iter()
        .map(|m| (m.user.as_str(), m.finished))
        .collect();
    assert_eq!(states, vec![("u1", true), ("u2", false)]);

    // The task itself does not auto-complete; u2 still sees it pending.
    let u2_view = engine.task_detail(&Caller::new("u2"), task).await.unwrap();
    assert_eq!(u2_view.finished, Some(false));
}

#[tokio::test]
async fn deleting_a_group_drops_memberships_but_not_the_task() {
    let engine = Engine::new();
    let caller = publisher();
    let task = group_task(&engine).await;
    let gid = engine.create_group(&caller, task).await.unwrap();
    engine.add_group_member(&caller, task, gid, "u1").await.unwrap();
    engine.add_group_member(&caller, task, gid, "u2").await.unwrap();

    engine.delete_group(&caller, task, gid).await.unwrap();

    assert!(engine.tasks.get(task).await.is_some());
    assert_eq!(engine.tasks.participation(task, "u1").await, None);
    assert_eq!(engine.tasks.participation(task, "u2").await, None);
    assert!(engine.list_participated(&Caller::new("u1")).await.is_empty());
}

#[tokio::test]
async fn stale_group_ids_never_resolve_after_deletion() {
    let engine = Engine::new();
    let caller = publisher();
    let task = group_task(&engine).await;
    let gid = engine.create_group(&caller, task).await.unwrap();
    engine.delete_group(&caller, task, gid).await.unwrap();

    // A fresh group never reuses the deleted id.
    let fresh = engine.create_group(&caller, task).await.unwrap();
    assert_ne!(fresh, gid);
    assert_eq!(
        engine.add_group_member(&caller, task, gid, "bob").await,
        Err(EngineError::GroupNotFound)
    );
}
