use crate::{
    auth::RequestContext,
    error::AppError,
    models::{NewTask, TaskId, TaskInput, TaskPatch},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};

/// Creates a new task for the authenticated user.
///
/// The owner is always the caller; a `user_id` in the body is ignored.
/// `description` defaults to an empty string and `completed` starts out `false`.
///
/// ## Request Body:
/// - `title`: required, non-empty.
/// - `description` (optional).
///
/// ## Responses:
/// - `200 OK`: JSON array holding the created row.
/// - `400 Bad Request`: missing/empty title, or the store refused the row.
/// - `401 Unauthorized`: missing or invalid bearer token.
#[post("")]
pub async fn create_task(
    ctx: RequestContext,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    let row = NewTask::from_input(task_data.into_inner(), ctx.identity.id)
        .ok_or_else(|| AppError::BadRequest("title is required".into()))?;

    let created = ctx.store.insert(&row).await?;

    Ok(HttpResponse::Ok().json(created))
}

/// Lists the caller's tasks, newest first. An empty array is a normal answer.
#[get("")]
pub async fn get_tasks(ctx: RequestContext) -> Result<impl Responder, AppError> {
    let tasks = ctx.store.list(&ctx.identity).await?;

    Ok(HttpResponse::Ok().json(tasks))
}

/// Partially updates one of the caller's tasks.
///
/// Only fields present in the body are changed. The row must match both the
/// path id and the caller; when nothing matches (unknown id, or a row owned by
/// someone else) the answer is still `200 OK` with an empty array, so the
/// existence of other users' rows is not revealed.
///
/// A request without a body is an empty patch. A non-empty body is read as
/// JSON whatever its content type.
///
/// ## Responses:
/// - `200 OK`: JSON array of the rows that were changed.
/// - `400 Bad Request`: malformed body, or the store refused the change or the id.
/// - `401 Unauthorized`: missing or invalid bearer token.
#[put("/{id}")]
pub async fn update_task(
    ctx: RequestContext,
    task_id: web::Path<String>,
    body: web::Bytes,
) -> Result<impl Responder, AppError> {
    let patch = TaskPatch::from_body(&body).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let id = TaskId::from(task_id.into_inner());

    let updated = ctx.store.update(&ctx.identity, &id, &patch).await?;

    Ok(HttpResponse::Ok().json(updated))
}

/// Deletes one of the caller's tasks.
///
/// Same matching rule as `update_task`: deleting an id the caller does not own
/// removes nothing and still answers `200 OK` with an empty array.
#[delete("/{id}")]
pub async fn delete_task(
    ctx: RequestContext,
    task_id: web::Path<String>,
) -> Result<impl Responder, AppError> {
    let id = TaskId::from(task_id.into_inner());

    let removed = ctx.store.delete(&ctx.identity, &id).await?;

    Ok(HttpResponse::Ok().json(removed))
}
