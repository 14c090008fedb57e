/// Dashboard and user directory tests

mod common;

use axum::http::StatusCode;
use chrono::Duration;
use common::{checklist, TestContext};
use serde_json::json;
use taskboard_shared::models::task::TaskPriority;

async fn seed(ctx: &TestContext) {
    let member = ctx.member.id;
    let other = ctx.other.id;

    // member: one overdue pending, one completed past due, one in progress
    ctx.create_task_with("late", &[member], checklist(0, 1), TaskPriority::High, Duration::days(-2))
        .await;
    ctx.create_task_with("done", &[member], checklist(1, 1), TaskPriority::Low, Duration::days(-2))
        .await;
    ctx.create_task_with("busy", &[member], checklist(1, 2), TaskPriority::Medium, Duration::days(3))
        .await;

    // other: one overdue pending
    ctx.create_task_with("theirs", &[other], vec![], TaskPriority::High, Duration::days(-1))
        .await;
}

#[tokio::test]
async fn test_admin_dashboard_covers_everything() {
    let ctx = TestContext::new().await;
    seed(&ctx).await;

    let (status, body) = ctx.get("/api/tasks/dashboard-data", &ctx.admin).await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    assert_eq!(
        body["statistics"],
        json!({
            "totalTasks": 4,
            "pendingTasks": 2,
            "inProgressTasks": 1,
            "completedTasks": 1,
            "overdueTasks": 2
        })
    );
    assert_eq!(
        body["charts"]["taskDistribution"],
        json!({ "Pending": 2, "InProgress": 1, "Completed": 1, "All": 4 })
    );
    assert_eq!(
        body["charts"]["taskPriorityLevels"],
        json!({ "Low": 1, "Medium": 1, "High": 2 })
    );

    let recent = body["recentTasks"].as_array().unwrap();
    assert_eq!(recent.len(), 4);
    assert_eq!(recent[0]["title"], "theirs");
    assert!(recent[0].get("todoChecklist").is_none());
}

#[tokio::test]
async fn test_admin_dashboard_forbidden_for_members() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.get("/api/tasks/dashboard-data", &ctx.member).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Access denied, admin only");
}

#[tokio::test]
async fn test_user_dashboard_is_caller_scoped() {
    let ctx = TestContext::new().await;
    seed(&ctx).await;

    let (status, body) = ctx.get("/api/tasks/user-dashboard-data", &ctx.member).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["statistics"]["totalTasks"], 3);
    assert_eq!(body["statistics"]["overdueTasks"], 1);
    assert_eq!(
        body["charts"]["taskPriorityLevels"],
        json!({ "Low": 1, "Medium": 1, "High": 1 })
    );
    let titles: Vec<&str> = body["recentTasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["busy", "done", "late"]);

    // Admins get their own assignments here, which is none
    let (_, body) = ctx.get("/api/tasks/user-dashboard-data", &ctx.admin).await;
    assert_eq!(body["statistics"]["totalTasks"], 0);
    assert_eq!(
        body["charts"]["taskDistribution"],
        json!({ "Pending": 0, "InProgress": 0, "Completed": 0, "All": 0 })
    );
    assert_eq!(body["recentTasks"], json!([]));
}

#[tokio::test]
async fn test_recent_tasks_limited_to_ten() {
    let ctx = TestContext::new().await;
    for i in 0..12 {
        ctx.create_task(&format!("task {}", i), &[ctx.member.id], vec![])
            .await;
    }

    let (_, body) = ctx.get("/api/tasks/user-dashboard-data", &ctx.member).await;
    let recent = body["recentTasks"].as_array().unwrap();
    assert_eq!(recent.len(), 10);
    assert_eq!(recent[0]["title"], "task 11");
    assert_eq!(body["statistics"]["totalTasks"], 12);
}

#[tokio::test]
async fn test_list_users_with_task_counts() {
    let ctx = TestContext::new().await;
    seed(&ctx).await;

    let (status, body) = ctx.get("/api/users", &ctx.admin).await;
    assert_eq!(status, StatusCode::OK);

    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 2, "admins are not listed");

    let member = users.iter().find(|u| u["name"] == "Member").unwrap();
    assert_eq!(member["pendingTasks"], 1);
    assert_eq!(member["inProgressTasks"], 1);
    assert_eq!(member["completedTasks"], 1);
    assert_eq!(member["email"], "member@example.com");
    assert!(member.get("passwordHash").is_none());

    let other = users.iter().find(|u| u["name"] == "Other").unwrap();
    assert_eq!(other["pendingTasks"], 1);
    assert_eq!(other["completedTasks"], 0);

    let (status, _) = ctx.get("/api/users", &ctx.member).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_get_user() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .get(&format!("/api/users/{}", ctx.other.id), &ctx.member)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Other");
    assert_eq!(body["role"], "member");

    let (status, body) = ctx
        .get(&format!("/api/users/{}", uuid::Uuid::new_v4()), &ctx.member)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}
