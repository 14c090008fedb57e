/// Task endpoint tests: CRUD, visibility scoping, status and checklist
/// lifecycle, optimistic concurrency.

mod common;

use axum::http::StatusCode;
use common::{checklist, TestContext};
use serde_json::json;
use taskboard_shared::models::task::{ChecklistItem, TaskStatus};

#[tokio::test]
async fn test_create_task_derives_state_and_populates_assignees() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .post(
            "/api/tasks",
            &ctx.admin,
            json!({
                "title": "Write release notes",
                "description": "For 2.0",
                "priority": "High",
                "dueDate": "2030-06-01T12:00:00Z",
                "assignedTo": [ctx.member.id, ctx.other.id],
                "todoChecklist": [
                    { "text": "Draft", "completed": true },
                    { "text": "Review" }
                ],
                "attachments": ["https://example.com/spec.pdf"]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["message"], "Task created successfully");

    let task = &body["task"];
    assert_eq!(task["status"], "In Progress");
    assert_eq!(task["progress"], 50.0);
    assert_eq!(task["completedTodoCount"], 1);
    assert_eq!(task["priority"], "High");
    assert_eq!(task["createdBy"], json!(ctx.admin.id));
    assert_eq!(task["version"], 1);
    assert_eq!(task["assignedTo"][0]["name"], "Member");
    assert_eq!(task["assignedTo"][1]["email"], "other@example.com");
    assert!(task["assignedTo"][0].get("role").is_none());
}

#[tokio::test]
async fn test_create_task_defaults() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .post(
            "/api/tasks",
            &ctx.member,
            json!({
                "title": "Minimal",
                "dueDate": "2030-06-01T12:00:00Z",
                "assignedTo": [ctx.member.id]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["task"]["status"], "Pending");
    assert_eq!(body["task"]["priority"], "Medium");
    assert_eq!(body["task"]["progress"], 0.0);
    assert_eq!(body["task"]["description"], "");
    assert_eq!(body["task"]["createdBy"], json!(ctx.member.id));
}

#[tokio::test]
async fn test_create_task_rejects_bad_assignees() {
    let ctx = TestContext::new().await;
    let base = |assigned_to: serde_json::Value| {
        json!({
            "title": "Bad",
            "dueDate": "2030-06-01T12:00:00Z",
            "assignedTo": assigned_to
        })
    };

    let (status, body) = ctx
        .post("/api/tasks", &ctx.admin, base(json!(ctx.member.id)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "assignedTo must be an array of user Ids");

    let (status, _) = ctx.post("/api/tasks", &ctx.admin, base(json!([]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .post("/api/tasks", &ctx.admin, base(json!(["not-a-uuid"])))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = ctx
        .post("/api/tasks", &ctx.admin, base(json!([uuid::Uuid::new_v4()])))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().starts_with("Unknown user"));

    let (status, body) = ctx
        .post(
            "/api/tasks",
            &ctx.admin,
            json!({ "title": "No assignees", "dueDate": "2030-06-01T12:00:00Z" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "assignedTo must be an array of user Ids");

    let (_, body) = ctx.get("/api/tasks", &ctx.admin).await;
    assert_eq!(body["tasks"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_create_task_rejects_blank_title_and_items() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .post(
            "/api/tasks",
            &ctx.admin,
            json!({
                "title": "  ",
                "dueDate": "2030-06-01T12:00:00Z",
                "assignedTo": [ctx.member.id]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "title");

    let (status, body) = ctx
        .post(
            "/api/tasks",
            &ctx.admin,
            json!({
                "title": "Ok",
                "dueDate": "2030-06-01T12:00:00Z",
                "assignedTo": [ctx.member.id],
                "todoChecklist": [{ "text": "fine" }, { "text": "" }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "todoChecklist[1].text");
}

#[tokio::test]
async fn test_list_is_scoped_by_role() {
    let ctx = TestContext::new().await;
    ctx.create_task("mine", &[ctx.member.id], checklist(0, 2)).await;
    ctx.create_task("shared", &[ctx.member.id, ctx.other.id], checklist(2, 2))
        .await;
    ctx.create_task("theirs", &[ctx.other.id], checklist(1, 2)).await;

    let (status, body) = ctx.get("/api/tasks", &ctx.admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tasks"].as_array().unwrap().len(), 3);
    assert_eq!(
        body["summary"],
        json!({ "all": 3, "pendingTasks": 1, "inProgressTasks": 1, "completedTasks": 1 })
    );

    let (_, body) = ctx.get("/api/tasks", &ctx.member).await;
    let titles: Vec<&str> = body["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["shared", "mine"]);
    assert_eq!(
        body["summary"],
        json!({ "all": 2, "pendingTasks": 1, "inProgressTasks": 0, "completedTasks": 1 })
    );
}

#[tokio::test]
async fn test_list_status_filter_keeps_full_summary() {
    let ctx = TestContext::new().await;
    ctx.create_task("a", &[ctx.member.id], checklist(0, 1)).await;
    ctx.create_task("b", &[ctx.member.id], checklist(1, 1)).await;
    ctx.create_task("c", &[ctx.other.id], checklist(1, 1)).await;

    let (status, body) = ctx.get("/api/tasks?status=Completed", &ctx.member).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tasks"].as_array().unwrap().len(), 1);
    assert_eq!(body["tasks"][0]["title"], "b");
    assert_eq!(body["summary"]["all"], 2);

    let (_, body) = ctx.get("/api/tasks?status=Completed", &ctx.admin).await;
    let tasks = body["tasks"].as_array().unwrap();
    assert_eq!(tasks.len(), 2);
    assert!(tasks.iter().all(|t| t["status"] == "Completed"));
    assert_eq!(body["summary"]["completedTasks"], json!(tasks.len()));
    assert_eq!(body["summary"]["all"], 3);

    let (_, body) = ctx.get("/api/tasks?status=In%20Progress", &ctx.admin).await;
    assert_eq!(body["tasks"].as_array().unwrap().len(), 0);
    assert_eq!(body["summary"]["inProgressTasks"], 0);

    let (_, body) = ctx.get("/api/tasks?status=", &ctx.admin).await;
    assert_eq!(body["tasks"].as_array().unwrap().len(), 3);

    let (status, body) = ctx.get("/api/tasks?status=Done", &ctx.admin).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "status");
}

#[tokio::test]
async fn test_get_task() {
    let ctx = TestContext::new().await;
    let task = ctx.create_task("t", &[ctx.other.id], checklist(1, 3)).await;

    let (status, body) = ctx.get(&format!("/api/tasks/{}", task.id), &ctx.member).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], json!(task.id));
    assert_eq!(body["completedTodoCount"], 1);
    assert_eq!(body["assignedTo"][0]["name"], "Other");

    let (status, body) = ctx
        .get(&format!("/api/tasks/{}", uuid::Uuid::new_v4()), &ctx.member)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Task not found");
}

#[tokio::test]
async fn test_set_status_authorization() {
    let ctx = TestContext::new().await;
    let task = ctx.create_task("t", &[ctx.member.id], checklist(0, 2)).await;
    let uri = format!("/api/tasks/{}/status", task.id);

    let (status, body) = ctx.put(&uri, &ctx.other, json!({ "status": "Completed" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
    assert_eq!(ctx.stored_task(task.id).await.status, TaskStatus::Pending);

    let (status, _) = ctx.put(&uri, &ctx.member, json!({ "status": "Completed" })).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx.put(&uri, &ctx.admin, json!({ "status": "Pending" })).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_set_status_rewrites_checklist_and_progress() {
    let ctx = TestContext::new().await;
    let task = ctx.create_task("t", &[ctx.member.id], checklist(1, 4)).await;
    let uri = format!("/api/tasks/{}/status", task.id);

    let (status, body) = ctx.put(&uri, &ctx.member, json!({ "status": "Completed" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task status updated successfully");
    assert_eq!(body["task"]["status"], "Completed");
    assert_eq!(body["task"]["progress"], 100.0);
    assert_eq!(body["task"]["completedTodoCount"], 4);

    let (_, body) = ctx.put(&uri, &ctx.member, json!({ "status": "In Progress" })).await;
    assert_eq!(body["task"]["status"], "In Progress");
    assert_eq!(body["task"]["progress"], 100.0);

    let (_, body) = ctx.put(&uri, &ctx.member, json!({ "status": "Pending" })).await;
    assert_eq!(body["task"]["status"], "Pending");
    assert_eq!(body["task"]["progress"], 0.0);
    assert_eq!(body["task"]["completedTodoCount"], 0);

    let (status, _) = ctx.put(&uri, &ctx.member, json!({ "status": "Done" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_replace_checklist_derives_status() {
    let ctx = TestContext::new().await;
    let task = ctx.create_task("t", &[ctx.member.id], vec![]).await;
    let uri = format!("/api/tasks/{}/todo", task.id);

    let (status, body) = ctx
        .put(&uri, &ctx.member, json!({ "todoChecklist": checklist(2, 3) }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task checklist updated successfully");
    assert_eq!(body["task"]["status"], "In Progress");
    let progress = body["task"]["progress"].as_f64().unwrap();
    assert!((progress - 200.0 / 3.0).abs() < 1e-9);
    assert_eq!(body["task"]["assignedTo"][0]["name"], "Member");

    let (_, body) = ctx
        .put(&uri, &ctx.member, json!({ "todoChecklist": checklist(3, 3) }))
        .await;
    assert_eq!(body["task"]["status"], "Completed");
    assert_eq!(body["task"]["progress"], 100.0);

    let (_, body) = ctx
        .put(&uri, &ctx.member, json!({ "todoChecklist": [] }))
        .await;
    assert_eq!(body["task"]["status"], "Pending");
    assert_eq!(body["task"]["progress"], 0.0);

    let (status, _) = ctx
        .put(&uri, &ctx.other, json!({ "todoChecklist": checklist(1, 1) }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_checklist_overrides_forced_completion() {
    let ctx = TestContext::new().await;
    let task = ctx.create_task("t", &[ctx.member.id], checklist(0, 2)).await;

    let (_, body) = ctx
        .put(
            &format!("/api/tasks/{}/status", task.id),
            &ctx.admin,
            json!({ "status": "Completed" }),
        )
        .await;
    assert_eq!(body["task"]["status"], "Completed");

    let items = vec![
        ChecklistItem::with_completed("step 1", true),
        ChecklistItem::new("step 2"),
    ];
    let (_, body) = ctx
        .put(
            &format!("/api/tasks/{}/todo", task.id),
            &ctx.admin,
            json!({ "todoChecklist": items }),
        )
        .await;
    assert_eq!(body["task"]["status"], "In Progress");
    assert_eq!(body["task"]["progress"], 50.0);
}

#[tokio::test]
async fn test_update_task_partial_fields() {
    let ctx = TestContext::new().await;
    let task = ctx.create_task("old", &[ctx.member.id], checklist(0, 2)).await;
    let uri = format!("/api/tasks/{}", task.id);

    let (status, body) = ctx
        .put(
            &uri,
            &ctx.admin,
            json!({
                "title": "new",
                "priority": "Low",
                "assignedTo": [ctx.other.id]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["message"], "Task updated successfully");
    assert_eq!(body["task"]["title"], "new");
    assert_eq!(body["task"]["priority"], "Low");
    assert_eq!(body["task"]["status"], "Pending");
    assert_eq!(body["task"]["assignedTo"][0]["name"], "Other");
    assert_eq!(body["task"]["createdBy"], json!(ctx.admin.id));
    assert_eq!(body["task"]["version"], 2);

    let (status, _) = ctx.put(&uri, &ctx.admin, json!({ "assignedTo": [] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx.put(&uri, &ctx.admin, json!({ "title": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(ctx.stored_task(task.id).await.title, "new");
}

#[tokio::test]
async fn test_update_task_checklist_goes_through_lifecycle() {
    let ctx = TestContext::new().await;
    let task = ctx.create_task("t", &[ctx.member.id], vec![]).await;
    let uri = format!("/api/tasks/{}", task.id);

    let (status, _) = ctx
        .put(&uri, &ctx.other, json!({ "todoChecklist": checklist(1, 1) }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = ctx
        .put(&uri, &ctx.member, json!({ "todoChecklist": checklist(1, 1) }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task"]["status"], "Completed");
    assert_eq!(body["task"]["progress"], 100.0);
}

#[tokio::test]
async fn test_update_task_cannot_self_assign_to_edit_checklist() {
    let ctx = TestContext::new().await;
    let task = ctx.create_task("t", &[ctx.member.id], checklist(0, 2)).await;

    let (status, body) = ctx
        .put(
            &format!("/api/tasks/{}", task.id),
            &ctx.other,
            json!({ "assignedTo": [ctx.other.id], "todoChecklist": checklist(2, 2) }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{}", body);

    let stored = ctx.stored_task(task.id).await;
    assert_eq!(stored.assigned_to, vec![ctx.member.id]);
    assert_eq!(stored.status, TaskStatus::Pending);
    assert_eq!(stored.progress, 0.0);
    assert_eq!(stored.version, 1);
}

#[tokio::test]
async fn test_stale_version_is_rejected() {
    let ctx = TestContext::new().await;
    let task = ctx.create_task("t", &[ctx.member.id], checklist(0, 2)).await;
    assert_eq!(task.version, 1);

    let (status, body) = ctx
        .put(
            &format!("/api/tasks/{}/todo", task.id),
            &ctx.member,
            json!({ "todoChecklist": checklist(1, 2), "version": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task"]["version"], 2);

    let (status, body) = ctx
        .put(
            &format!("/api/tasks/{}/status", task.id),
            &ctx.member,
            json!({ "status": "Completed", "version": 1 }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let stored = ctx.stored_task(task.id).await;
    assert_eq!(stored.status, TaskStatus::InProgress);
    assert_eq!(stored.version, 2);
}

#[tokio::test]
async fn test_delete_task_is_admin_only() {
    let ctx = TestContext::new().await;
    let task = ctx.create_task("t", &[ctx.member.id], vec![]).await;
    let uri = format!("/api/tasks/{}", task.id);

    let (status, body) = ctx.delete(&uri, &ctx.member).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Access denied, admin only");

    let (status, body) = ctx.delete(&uri, &ctx.admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Task deleted successfully");

    let (status, _) = ctx.delete(&uri, &ctx.admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .put(&format!("{}/status", uri), &ctx.member, json!({ "status": "Completed" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
