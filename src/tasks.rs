// src/tasks.rs

use actix_web::{web, HttpRequest, HttpResponse};
use log::{debug, info};

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::middleware::owner_scope;
use crate::models::{CompletionInput, TaskInput, TaskList};

/// GET /tasks
/// Pending tasks, earliest deadline first.
pub async fn list_tasks(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    list(&req, &data, TaskList::Pending).await
}

/// GET /tasks/completed
pub async fn list_completed(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    list(&req, &data, TaskList::Completed).await
}

async fn list(req: &HttpRequest, data: &AppState, list: TaskList) -> Result<HttpResponse, ApiError> {
    let owner = owner_scope(req, data)?;
    let context = match list {
        TaskList::Pending => "Failed to fetch tasks",
        TaskList::Completed => "Failed to fetch completed tasks",
    };
    let tasks = data
        .tasks
        .list(list, owner.as_deref())
        .await
        .map_err(ApiError::storage(context))?;
    debug!("Returning {} tasks from {}", tasks.len(), list.collection_name());
    Ok(HttpResponse::Ok().json(tasks))
}

/// POST /tasks
pub async fn create_task(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<TaskInput>,
) -> Result<HttpResponse, ApiError> {
    let owner = owner_scope(&req, &data)?;
    let new_task = payload.validate()?;
    let task = data
        .tasks
        .insert(TaskList::Pending, owner.as_deref(), new_task)
        .await
        .map_err(ApiError::storage("Failed to create task"))?;
    info!("Task created: {}", task.id);
    Ok(HttpResponse::Created().json(task))
}

/// POST /tasks/completed
/// With `_id`, moves that pending task; without it, records a completed
/// task straight from `Name` and `Deadline`.
pub async fn create_completed(
    req: HttpRequest,
    data: web::Data<AppState>,
    payload: web::Json<CompletionInput>,
) -> Result<HttpResponse, ApiError> {
    let payload = payload.into_inner();
    if let Some(id) = payload.id.as_deref() {
        return complete(&req, &data, id).await;
    }

    let owner = owner_scope(&req, &data)?;
    let new_task = payload.into_task_input().validate()?;
    let task = data
        .tasks
        .insert(TaskList::Completed, owner.as_deref(), new_task)
        .await
        .map_err(ApiError::storage("Failed to create completed task"))?;
    info!("Completed task created: {}", task.id);
    Ok(HttpResponse::Created().json(task))
}

/// POST /tasks/{id}/complete
pub async fn complete_task(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    complete(&req, &data, &path).await
}

async fn complete(req: &HttpRequest, data: &AppState, id: &str) -> Result<HttpResponse, ApiError> {
    let owner = owner_scope(req, data)?;
    let completed = data
        .tasks
        .complete(owner.as_deref(), id)
        .await
        .map_err(ApiError::storage("Failed to complete task"))?
        .ok_or(ApiError::NotFound(TaskList::Pending.label()))?;
    info!("Task {} completed as {}", id, completed.id);
    Ok(HttpResponse::Created().json(completed))
}

/// PUT /tasks/{id}
pub async fn update_task(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<TaskInput>,
) -> Result<HttpResponse, ApiError> {
    let owner = owner_scope(&req, &data)?;
    let new_task = payload.validate()?;
    let task = data
        .tasks
        .update(owner.as_deref(), &path, new_task)
        .await
        .map_err(ApiError::storage("Failed to update task"))?
        .ok_or(ApiError::NotFound(TaskList::Pending.label()))?;
    info!("Task updated: {}", task.id);
    Ok(HttpResponse::Ok().json(task))
}

/// DELETE /tasks/{id}
pub async fn delete_task(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    delete(&req, &data, TaskList::Pending, &path).await
}

/// DELETE /tasks/completed/{id}
pub async fn delete_completed(
    req: HttpRequest,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    delete(&req, &data, TaskList::Completed, &path).await
}

async fn delete(
    req: &HttpRequest,
    data: &AppState,
    list: TaskList,
    id: &str,
) -> Result<HttpResponse, ApiError> {
    let owner = owner_scope(req, data)?;
    let context = match list {
        TaskList::Pending => "Failed to delete task",
        TaskList::Completed => "Failed to delete completed task",
    };
    let deleted = data
        .tasks
        .delete(list, owner.as_deref(), id)
        .await
        .map_err(ApiError::storage(context))?;
    if !deleted {
        return Err(ApiError::NotFound(list.label()));
    }
    info!("Deleted {} from {}", id, list.collection_name());
    Ok(HttpResponse::NoContent().finish())
}
