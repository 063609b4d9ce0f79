//! Server-side rendering of the two task lists. The browser script swaps
//! these fragments into the page and wires the buttons by their
//! `data-action` / `data-id` attributes.

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::app_state::AppState;
use crate::error::ApiError;
use crate::middleware::owner_scope;
use crate::models::{Task, TaskList};

const EMPTY_PENDING: &str =
    "Start with your first <span>To-Do</span> with the button below!<br><br>";
const EMPTY_COMPLETED: &str = "Complete a <span>To-Do</span> with a check button above!<br><br>";

/// en-GB style, e.g. `01/01/2025, 10:00:00`.
pub fn format_deadline(deadline: Option<&DateTime<Utc>>) -> String {
    match deadline {
        Some(deadline) => deadline.format("%d/%m/%Y, %H:%M:%S").to_string(),
        None => "No deadline".to_string(),
    }
}

pub fn render_task(task: &Task, list: TaskList) -> String {
    let id = encode_double_quoted_attribute(&task.id);
    let pending = list == TaskList::Pending;

    let complete_btn = if pending {
        format!(
            r#"<button class="btn btn-complete" data-action="complete" data-id="{id}" title="Complete"><i class="fa-regular fa-circle-check"></i></button>"#
        )
    } else {
        // keeps names aligned with the pending list
        r#"<div class="btn-placeholder"></div>"#.to_string()
    };

    let edit_btn = if pending {
        format!(
            r#"<button class="btn btn-edit" data-action="edit" data-id="{id}" data-name="{name}" data-deadline="{deadline}" title="Edit"><i class="fa-solid fa-pen"></i></button>"#,
            name = encode_double_quoted_attribute(&task.name),
            deadline = task.deadline.format("%Y-%m-%dT%H:%M"),
        )
    } else {
        String::new()
    };

    let delete_action = if pending { "delete" } else { "delete-completed" };

    format!(
        r#"<li>
    {complete_btn}
    <div class="task-content">
        <span class="task_detail">{name}</span>
        <span class="task_detail">{deadline}</span>
    </div>
    <div class="task-actions">
        {edit_btn}
        <button class="btn btn-danger" data-action="{delete_action}" data-id="{id}" title="Delete"><i class="fa-solid fa-trash-can"></i></button>
    </div>
</li>"#,
        name = encode_text(&task.name),
        deadline = format_deadline(Some(&task.deadline)),
    )
}

pub fn render_list(tasks: &[Task], list: TaskList) -> String {
    if tasks.is_empty() {
        return match list {
            TaskList::Pending => EMPTY_PENDING,
            TaskList::Completed => EMPTY_COMPLETED,
        }
        .to_string();
    }
    tasks
        .iter()
        .map(|task| render_task(task, list))
        .collect::<Vec<_>>()
        .join("\n")
}

async fn fragment(req: &HttpRequest, data: &AppState, list: TaskList) -> Result<HttpResponse, ApiError> {
    let owner = owner_scope(req, data)?;
    let tasks = data
        .tasks
        .list(list, owner.as_deref())
        .await
        .map_err(ApiError::storage("Failed to render tasks"))?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(render_list(&tasks, list)))
}

/// GET /tasks/fragment
pub async fn pending_fragment(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    fragment(&req, &data, TaskList::Pending).await
}

/// GET /tasks/completed/fragment
pub async fn completed_fragment(
    req: HttpRequest,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    fragment(&req, &data, TaskList::Completed).await
}
