//! Integration tests for resources: attachment lifecycle, tags, comments,
//! and the tri-state reaction tracker with its aggregate counters.
//!
//! Verification command: `cargo test --test resource_reactions`

use std::time::{SystemTime, UNIX_EPOCH};

use taskdeck_core::caller::{Caller, Capability};
use taskdeck_core::resource::{Attitude, ResourceId, ResourceKind};
use taskdeck_core::task::{Priority, TaskId, TaskInfo, TaskKind};
use taskdeck_server::engine::Engine;
use taskdeck_server::error::{EngineError, ErrorKind};
use taskdeck_server::tasks::DeleteOutcome;

fn now_ms() -> u64 {
    u64::try_from(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis(),
    )
    .unwrap()
}

fn publisher() -> Caller {
    Caller::with_capabilities("alice", [Capability::AssignTasks])
}

/// Creates a task, joins the given users, and attaches one link resource.
async fn task_with_resource(engine: &Engine, users: &[&str]) -> (TaskId, ResourceId) {
    let caller = publisher();
    let task = engine
        .create_task(
            &caller,
            TaskInfo {
                title: "reading".to_string(),
                kind: TaskKind::Review,
                priority: Priority::Medium,
                cost: 45,
                deadline: now_ms() + 1000 * 60 * 60 * 100,
            },
            None,
            String::new(),
        )
        .await
        .unwrap();
    let groups = engine.tasks.groups(task).await.unwrap();
    for user in users {
        engine
            .add_group_member(&caller, task, groups[0].id, user)
            .await
            .unwrap();
    }
    let resource = engine
        .create_resource(
            &caller,
            task,
            ResourceKind::Link,
            "Notes".to_string(),
            "https://example.org/notes".to_string(),
            vec!["week1".to_string()],
        )
        .await
        .unwrap();
    (task, resource)
}

async fn counts(engine: &Engine, id: ResourceId) -> (u32, u32) {
    let summary = engine.resources.summary(id).await.unwrap();
    (summary.up, summary.down)
}

#[tokio::test]
async fn attitude_sequence_keeps_counters_consistent() {
    let engine = Engine::new();
    let (_, resource) = task_with_resource(&engine, &["u"]).await;
    let u = Caller::new("u");

    assert_eq!(counts(&engine, resource).await, (0, 0));

    engine.set_attitude(&u, resource, Attitude::Up).await.unwrap();
    assert_eq!(counts(&engine, resource).await, (1, 0));

    // Up -> down switches atomically, never leaving both set.
    engine.set_attitude(&u, resource, Attitude::Down).await.unwrap();
    assert_eq!(counts(&engine, resource).await, (0, 1));

    // Repeating the current state is a no-op.
    engine.set_attitude(&u, resource, Attitude::Down).await.unwrap();
    assert_eq!(counts(&engine, resource).await, (0, 1));

    engine.set_attitude(&u, resource, Attitude::None).await.unwrap();
    assert_eq!(counts(&engine, resource).await, (0, 0));
}

#[tokio::test]
async fn each_user_counts_once() {
    let engine = Engine::new();
    let (_, resource) = task_with_resource(&engine, &["u1", "u2", "u3"]).await;

    engine
        .set_attitude(&Caller::new("u1"), resource, Attitude::Up)
        .await
        .unwrap();
    engine
        .set_attitude(&Caller::new("u2"), resource, Attitude::Up)
        .await
        .unwrap();
    engine
        .set_attitude(&Caller::new("u3"), resource, Attitude::Down)
        .await
        .unwrap();
    assert_eq!(counts(&engine, resource).await, (2, 1));

    engine
        .set_attitude(&Caller::new("u2"), resource, Attitude::Down)
        .await
        .unwrap();
    assert_eq!(counts(&engine, resource).await, (1, 2));
}

#[tokio::test]
async fn reactions_are_for_participants_only() {
    let engine = Engine::new();
    let (_, resource) = task_with_resource(&engine, &["u"]).await;

    let err = engine
        .set_attitude(&Caller::new("outsider"), resource, Attitude::Up)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ReactionNotAllowed);
    assert_eq!(err.kind(), ErrorKind::Permission);
}

#[tokio::test]
async fn resource_detail_shows_own_attitude_and_comments() {
    let engine = Engine::new();
    let (task, resource) = task_with_resource(&engine, &["u"]).await;
    let u = Caller::new("u");

    engine.set_attitude(&u, resource, Attitude::Up).await.unwrap();
    engine
        .add_comment(&u, resource, "very helpful".to_string())
        .await
        .unwrap();

    let detail = engine.resource_detail(&u, resource).await.unwrap();
    assert_eq!(detail.attitude, Attitude::Up);
    assert_eq!(detail.task.id, task);
    assert_eq!(detail.resource.comment_count, 1);
    assert_eq!(detail.comments.len(), 1);
    assert_eq!(detail.comments[0].user, "u");

    // Another participant sees the counters but their own (absent) state.
    let groups = engine.tasks.groups(task).await.unwrap();
    engine
        .add_group_member(&publisher(), task, groups[0].id, "v")
        .await
        .unwrap();
    let other = engine.resource_detail(&Caller::new("v"), resource).await.unwrap();
    assert_eq!(other.attitude, Attitude::None);
    assert_eq!(other.resource.up, 1);

    // Outsiders see nothing.
    assert_eq!(
        engine.resource_detail(&Caller::new("w"), resource).await,
        Err(EngineError::TaskNotVisible)
    );
}

#[tokio::test]
async fn tags_conflict_and_missing() {
    let engine = Engine::new();
    let (_, resource) = task_with_resource(&engine, &[]).await;
    let caller = publisher();

    let err = engine
        .add_resource_tag(&caller, resource, "week1".to_string())
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::TagExists);
    assert_eq!(err.kind(), ErrorKind::Conflict);

    engine
        .add_resource_tag(&caller, resource, "Week1".to_string())
        .await
        .unwrap();

    assert_eq!(
        engine.remove_resource_tag(&caller, resource, "week2").await,
        Err(EngineError::TagNotFound)
    );
    engine
        .remove_resource_tag(&caller, resource, "week1")
        .await
        .unwrap();

    let summary = engine.resources.summary(resource).await.unwrap();
    assert_eq!(summary.tags, vec!["Week1".to_string()]);
}

#[tokio::test]
async fn resource_mutations_are_manager_only() {
    let engine = Engine::new();
    let (task, resource) = task_with_resource(&engine, &["u"]).await;
    let u = Caller::new("u");

    // Participants may look but not touch.
    assert_eq!(
        engine.rename_resource(&u, resource, "mine".to_string()).await,
        Err(EngineError::NotTaskManager)
    );
    assert_eq!(
        engine.delete_resource(&u, resource).await,
        Err(EngineError::NotTaskManager)
    );
    assert_eq!(
        engine
            .create_resource(
                &u,
                task,
                ResourceKind::Link,
                "n".to_string(),
                "c".to_string(),
                vec![],
            )
            .await,
        Err(EngineError::NotTaskManager)
    );

    engine
        .rename_resource(&publisher(), resource, "Renamed".to_string())
        .await
        .unwrap();
    assert_eq!(
        engine.resources.summary(resource).await.unwrap().name,
        "Renamed"
    );
}

#[tokio::test]
async fn comment_deletion_permission_matrix() {
    let engine = Engine::new();
    let (_, resource) = task_with_resource(&engine, &["author", "other"]).await;
    let author = Caller::new("author");

    // A stranger to the comment (fellow participant) may not delete it.
    let cid = engine
        .add_comment(&author, resource, "first".to_string())
        .await
        .unwrap();
    let err = engine
        .delete_comment(&Caller::new("other"), cid)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::CommentNotDeletable);
    assert_eq!(err.kind(), ErrorKind::Permission);

    // The author may.
    engine.delete_comment(&author, cid).await.unwrap();
    assert_eq!(
        engine.delete_comment(&author, cid).await,
        Err(EngineError::CommentNotFound)
    );

    // The task publisher may delete anyone's comment.
    let cid = engine
        .add_comment(&author, resource, "second".to_string())
        .await
        .unwrap();
    engine.delete_comment(&publisher(), cid).await.unwrap();

    // So may a manager.
    let cid = engine
        .add_comment(&author, resource, "third".to_string())
        .await
        .unwrap();
    let manager = Caller::with_capabilities("ops", [Capability::ManageAllTasks]);
    engine.delete_comment(&manager, cid).await.unwrap();
}

#[tokio::test]
async fn deleting_the_task_takes_resources_comments_and_reactions_with_it() {
    let engine = Engine::new();
    let (task, resource) = task_with_resource(&engine, &["u"]).await;
    let u = Caller::new("u");

    engine.set_attitude(&u, resource, Attitude::Up).await.unwrap();
    let cid = engine
        .add_comment(&u, resource, "gone soon".to_string())
        .await
        .unwrap();

    assert_eq!(
        engine.delete_task(&publisher(), task).await.unwrap(),
        DeleteOutcome::Deleted
    );
    assert_eq!(
        engine.resources.summary(resource).await,
        Err(EngineError::ResourceNotFound)
    );
    assert_eq!(
        engine.resources.comment(cid).await,
        Err(EngineError::CommentNotFound)
    );
}
