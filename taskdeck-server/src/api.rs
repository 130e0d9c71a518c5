//! Axum JSON API over the engine.
//!
//! Thin adapters only: each handler extracts the caller, forwards to the
//! corresponding [`Engine`] operation, and maps the error taxonomy onto
//! HTTP status codes. A delete blocked by dependents is a 200 carrying the
//! blocking set — an expected outcome, not an error.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};

use taskdeck_core::resource::{Attitude, CommentId, ResourceId, ResourceKind};
use taskdeck_core::task::{GroupId, Task, TaskId, TaskInfo};

use crate::auth::AuthedCaller;
use crate::engine::Engine;
use crate::error::{EngineError, ErrorKind};
use crate::tasks::DeleteOutcome;

/// Engine error wrapped for HTTP transport.
#[derive(Debug)]
pub struct ApiError(pub EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Permission => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::State => StatusCode::UNPROCESSABLE_ENTITY,
        };
        let body = Json(serde_json::json!({
            "error": self.0.to_string(),
            "kind": self.0.kind(),
        }));
        (status, body).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

// ---------------------------------------------------------------------------
// Request/response shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CreateTaskBody {
    info: TaskInfo,
    #[serde(default)]
    predecessor: Option<TaskId>,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct UpdateTaskBody {
    info: TaskInfo,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct CreateResourceBody {
    task_id: TaskId,
    kind: ResourceKind,
    name: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RenameResourceBody {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CommentBody {
    content: String,
}

#[derive(Debug, Deserialize)]
struct IdQuery {
    id: TaskId,
}

#[derive(Debug, Deserialize)]
struct GroupQuery {
    task_id: TaskId,
}

#[derive(Debug, Deserialize)]
struct GroupIdQuery {
    task_id: TaskId,
    group_id: GroupId,
}

#[derive(Debug, Deserialize)]
struct MemberQuery {
    task_id: TaskId,
    group_id: GroupId,
    uid: String,
}

#[derive(Debug, Deserialize)]
struct ResourceQuery {
    resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
struct TagQuery {
    resource_id: ResourceId,
    value: String,
}

#[derive(Debug, Deserialize)]
struct AttitudeQuery {
    resource_id: ResourceId,
    attitude: Attitude,
}

#[derive(Debug, Deserialize)]
struct CommentQuery {
    comment_id: CommentId,
}

/// Body of a delete response: either the task is gone or the complete set
/// of dependents that block it.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    /// Whether the task was actually removed.
    pub deleted: bool,
    /// Tasks still naming the target as predecessor; empty when deleted.
    pub dependents: Vec<Task>,
}

impl From<DeleteOutcome> for DeleteResponse {
    fn from(outcome: DeleteOutcome) -> Self {
        match outcome {
            DeleteOutcome::Deleted => Self {
                deleted: true,
                dependents: Vec::new(),
            },
            DeleteOutcome::Blocked(dependents) => Self {
                deleted: false,
                dependents,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Task handlers
// ---------------------------------------------------------------------------

async fn create_task(
    State(engine): State<Arc<Engine>>,
    AuthedCaller(caller): AuthedCaller,
    Json(body): Json<CreateTaskBody>,
) -> ApiResult<Json<TaskId>> {
    let id = engine
        .create_task(&caller, body.info, body.predecessor, body.description)
        .await?;
    Ok(Json(id))
}

async fn update_task(
    State(engine): State<Arc<Engine>>,
    AuthedCaller(caller): AuthedCaller,
    Query(query): Query<IdQuery>,
    Json(body): Json<UpdateTaskBody>,
) -> ApiResult<StatusCode> {
    engine
        .update_task(&caller, query.id, body.info, body.description)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_task(
    State(engine): State<Arc<Engine>>,
    AuthedCaller(caller): AuthedCaller,
    Query(query): Query<IdQuery>,
) -> ApiResult<Json<DeleteResponse>> {
    let outcome = engine.delete_task(&caller, query.id).await?;
    Ok(Json(outcome.into()))
}

async fn task_detail(
    State(engine): State<Arc<Engine>>,
    AuthedCaller(caller): AuthedCaller,
    Query(query): Query<IdQuery>,
) -> ApiResult<Json<crate::engine::TaskDetail>> {
    Ok(Json(engine.task_detail(&caller, query.id).await?))
}

async fn created_list(
    State(engine): State<Arc<Engine>>,
    AuthedCaller(caller): AuthedCaller,
) -> Json<Vec<Task>> {
    Json(engine.list_created(&caller).await)
}

async fn participated_list(
    State(engine): State<Arc<Engine>>,
    AuthedCaller(caller): AuthedCaller,
) -> Json<Vec<crate::engine::ParticipatedTask>> {
    Json(engine.list_participated(&caller).await)
}

async fn finish_task(
    State(engine): State<Arc<Engine>>,
    AuthedCaller(caller): AuthedCaller,
    Query(query): Query<IdQuery>,
) -> ApiResult<StatusCode> {
    engine.finish_task(&caller, query.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn quadrants(
    State(engine): State<Arc<Engine>>,
    AuthedCaller(caller): AuthedCaller,
) -> Json<crate::engine::QuadrantOverview> {
    Json(engine.quadrant_overview(&caller).await)
}

// ---------------------------------------------------------------------------
// Group handlers
// ---------------------------------------------------------------------------

async fn create_group(
    State(engine): State<Arc<Engine>>,
    AuthedCaller(caller): AuthedCaller,
    Query(query): Query<GroupQuery>,
) -> ApiResult<Json<GroupId>> {
    Ok(Json(engine.create_group(&caller, query.task_id).await?))
}

async fn delete_group(
    State(engine): State<Arc<Engine>>,
    AuthedCaller(caller): AuthedCaller,
    Query(query): Query<GroupIdQuery>,
) -> ApiResult<StatusCode> {
    engine
        .delete_group(&caller, query.task_id, query.group_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_group_member(
    State(engine): State<Arc<Engine>>,
    AuthedCaller(caller): AuthedCaller,
    Query(query): Query<MemberQuery>,
) -> ApiResult<StatusCode> {
    engine
        .add_group_member(&caller, query.task_id, query.group_id, &query.uid)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_group_member(
    State(engine): State<Arc<Engine>>,
    AuthedCaller(caller): AuthedCaller,
    Query(query): Query<MemberQuery>,
) -> ApiResult<StatusCode> {
    engine
        .remove_group_member(&caller, query.task_id, query.group_id, &query.uid)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Resource handlers
// ---------------------------------------------------------------------------

async fn create_resource(
    State(engine): State<Arc<Engine>>,
    AuthedCaller(caller): AuthedCaller,
    Json(body): Json<CreateResourceBody>,
) -> ApiResult<Json<ResourceId>> {
    let id = engine
        .create_resource(
            &caller,
            body.task_id,
            body.kind,
            body.name,
            body.content,
            body.tags,
        )
        .await?;
    Ok(Json(id))
}

async fn update_resource(
    State(engine): State<Arc<Engine>>,
    AuthedCaller(caller): AuthedCaller,
    Query(query): Query<ResourceQuery>,
    Json(body): Json<RenameResourceBody>,
) -> ApiResult<StatusCode> {
    engine
        .rename_resource(&caller, query.resource_id, body.name)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_resource(
    State(engine): State<Arc<Engine>>,
    AuthedCaller(caller): AuthedCaller,
    Query(query): Query<ResourceQuery>,
) -> ApiResult<StatusCode> {
    engine.delete_resource(&caller, query.resource_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn resource_detail(
    State(engine): State<Arc<Engine>>,
    AuthedCaller(caller): AuthedCaller,
    Query(query): Query<ResourceQuery>,
) -> ApiResult<Json<crate::engine::ResourceDetail>> {
    Ok(Json(engine.resource_detail(&caller, query.resource_id).await?))
}

async fn add_tag(
    State(engine): State<Arc<Engine>>,
    AuthedCaller(caller): AuthedCaller,
    Query(query): Query<TagQuery>,
) -> ApiResult<StatusCode> {
    engine
        .add_resource_tag(&caller, query.resource_id, query.value)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_tag(
    State(engine): State<Arc<Engine>>,
    AuthedCaller(caller): AuthedCaller,
    Query(query): Query<TagQuery>,
) -> ApiResult<StatusCode> {
    engine
        .remove_resource_tag(&caller, query.resource_id, &query.value)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_attitude(
    State(engine): State<Arc<Engine>>,
    AuthedCaller(caller): AuthedCaller,
    Query(query): Query<AttitudeQuery>,
) -> ApiResult<StatusCode> {
    engine
        .set_attitude(&caller, query.resource_id, query.attitude)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_comment(
    State(engine): State<Arc<Engine>>,
    AuthedCaller(caller): AuthedCaller,
    Query(query): Query<ResourceQuery>,
    Json(body): Json<CommentBody>,
) -> ApiResult<Json<CommentId>> {
    let id = engine
        .add_comment(&caller, query.resource_id, body.content)
        .await?;
    Ok(Json(id))
}

async fn delete_comment(
    State(engine): State<Arc<Engine>>,
    AuthedCaller(caller): AuthedCaller,
    Query(query): Query<CommentQuery>,
) -> ApiResult<StatusCode> {
    engine.delete_comment(&caller, query.comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Router and server
// ---------------------------------------------------------------------------

/// Builds the full route table over a shared engine.
#[must_use]
pub fn router(engine: Arc<Engine>) -> axum::Router {
    axum::Router::new()
        .route("/task/create", post(create_task))
        .route("/task/update", post(update_task))
        .route("/task/delete", get(delete_task))
        .route("/task/detail", get(task_detail))
        .route("/task/created_list", get(created_list))
        .route("/task/participated_list", get(participated_list))
        .route("/task/finish", get(finish_task))
        .route("/task/quadrants", get(quadrants))
        .route("/task/group/create", get(create_group))
        .route("/task/group/delete", get(delete_group))
        .route("/task/group/add_user", get(add_group_member))
        .route("/task/group/delete_user", get(remove_group_member))
        .route("/resource/create", post(create_resource))
        .route("/resource/update", post(update_resource))
        .route("/resource/delete", get(delete_resource))
        .route("/resource/detail", get(resource_detail))
        .route("/resource/tag/add", get(add_tag))
        .route("/resource/tag/delete", get(remove_tag))
        .route("/resource/attitude", get(set_attitude))
        .route("/resource/comment/add", post(add_comment))
        .route("/resource/comment/delete", get(delete_comment))
        .with_state(engine)
}

/// Starts the server with a fresh engine.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    start_server_with_state(addr, Arc::new(Engine::new())).await
}

/// Starts the server over a pre-populated [`Engine`].
///
/// Binds, spawns `axum::serve` on a background task, and returns the bound
/// address together with the task handle.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state(
    addr: &str,
    engine: Arc<Engine>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = router(engine);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "server error");
        }
    });

    Ok((bound_addr, handle))
}
