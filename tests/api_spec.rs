use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::NaiveDate;
use serde_json::{json, Value};
use taskmaster::api::{create_router, AppState};
use taskmaster::config::Rules;
use taskmaster::db::Database;
use taskmaster::extract::Extractor;
use taskmaster::models::*;
use taskmaster::scoring::RankedTask;

fn setup() -> TestServer {
    let db = Database::open_memory().expect("Failed to create database");
    db.migrate().expect("Failed to migrate");
    let state = AppState::new(db, Extractor::offline(Rules::default()));
    TestServer::new(create_router(state)).expect("Failed to create test server")
}

async fn create_test_task(server: &TestServer, body: Value) -> Task {
    server.post("/api/v1/tasks").json(&body).await.json::<Task>()
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_ok() {
        let server = setup();
        let response = server.get("/api/v1/health").await;

        response.assert_status_ok();
        response.assert_json(&json!({ "status": "ok" }));
    }
}

mod create_task {
    use super::*;

    #[tokio::test]
    async fn normalizes_manual_entry() {
        let server = setup();

        let response = server
            .post("/api/v1/tasks")
            .json(&json!({ "title": "  Book venue ", "priority": "High", "due_date": "2025-04-01" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let task: Task = response.json();
        assert_eq!(task.title, "Book venue");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.category, "general");
        assert_eq!(task.status, TaskStatus::Open);
        assert!(!task.created_by_ai);
    }

    #[tokio::test]
    async fn rejects_entry_without_title() {
        let server = setup();

        let response = server
            .post("/api/v1/tasks")
            .json(&json!({ "title": "   ", "priority": "low" }))
            .await;

        response.assert_status_bad_request();
        assert_eq!(response.text(), "Title is required");
    }
}

mod list_tasks {
    use super::*;

    #[tokio::test]
    async fn returns_empty_list_when_no_tasks_exist() {
        let server = setup();
        let tasks: Vec<Task> = server.get("/api/v1/tasks").await.json();
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn filters_by_status_and_archive_flag() {
        let server = setup();
        let done = create_test_task(&server, json!({ "title": "Done", "status": "completed" })).await;
        let open = create_test_task(&server, json!({ "title": "Open" })).await;
        server
            .post(&format!("/api/v1/tasks/{}/archive", open.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let only_done: Vec<Task> = server
            .get("/api/v1/tasks")
            .add_query_param("status", "done")
            .await
            .json();
        assert_eq!(only_done.len(), 1);
        assert_eq!(only_done[0].id, done.id);

        let visible: Vec<Task> = server.get("/api/v1/tasks").await.json();
        assert_eq!(visible.len(), 1);

        let all: Vec<Task> = server
            .get("/api/v1/tasks")
            .add_query_param("include_archived", "true")
            .await
            .json();
        assert_eq!(all.len(), 2);
    }
}

mod single_task {
    use super::*;

    #[tokio::test]
    async fn returns_404_for_unknown_task() {
        let server = setup();
        server.get("/api/v1/tasks/42").await.assert_status_not_found();
    }

    #[tokio::test]
    async fn updates_provided_fields() {
        let server = setup();
        let task = create_test_task(&server, json!({ "title": "Draft memo" })).await;

        let response = server
            .put(&format!("/api/v1/tasks/{}", task.id))
            .json(&json!({ "status": "in_progress", "priority": "critical" }))
            .await;

        response.assert_status_ok();
        let updated: Task = response.json();
        assert_eq!(updated.title, "Draft memo");
        assert_eq!(updated.status, TaskStatus::InProgress);
        assert_eq!(updated.priority, Priority::Critical);

        let fetched: Task = server.get(&format!("/api/v1/tasks/{}", task.id)).await.json();
        assert_eq!(fetched.status, TaskStatus::InProgress);
    }

    #[tokio::test]
    async fn null_due_date_clears_it() {
        let server = setup();
        let task = create_test_task(&server, json!({ "title": "Book room", "due_date": "2025-04-01" })).await;

        let kept: Task = server
            .put(&format!("/api/v1/tasks/{}", task.id))
            .json(&json!({ "title": "Book the big room" }))
            .await
            .json();
        assert_eq!(kept.due_date, NaiveDate::from_ymd_opt(2025, 4, 1));

        let cleared: Task = server
            .put(&format!("/api/v1/tasks/{}", task.id))
            .json(&json!({ "due_date": null }))
            .await
            .json();
        assert_eq!(cleared.title, "Book the big room");
        assert_eq!(cleared.due_date, None);
    }

    #[tokio::test]
    async fn update_of_unknown_task_is_404() {
        let server = setup();
        server
            .put("/api/v1/tasks/7")
            .json(&json!({ "title": "Nope" }))
            .await
            .assert_status_not_found();
    }
}

mod delegate_task {
    use super::*;

    #[tokio::test]
    async fn assigns_and_marks_delegated() {
        let server = setup();
        let task = create_test_task(&server, json!({ "title": "Update wiki" })).await;

        let response = server
            .post(&format!("/api/v1/tasks/{}/delegate", task.id))
            .json(&json!({ "assignee": "Ravi" }))
            .await;

        response.assert_status_ok();
        let delegated: Task = response.json();
        assert_eq!(delegated.assignee, Some("Ravi".to_string()));
        assert_eq!(delegated.status, TaskStatus::Delegated);
    }

    #[tokio::test]
    async fn rejects_blank_assignee() {
        let server = setup();
        let task = create_test_task(&server, json!({ "title": "Update wiki" })).await;

        server
            .post(&format!("/api/v1/tasks/{}/delegate", task.id))
            .json(&json!({ "assignee": " " }))
            .await
            .assert_status_bad_request();
    }
}

mod archive_task {
    use super::*;

    #[tokio::test]
    async fn returns_404_for_unknown_task() {
        let server = setup();
        server
            .post("/api/v1/tasks/99/archive")
            .await
            .assert_status_not_found();
    }
}

mod ranked_tasks {
    use super::*;

    #[tokio::test]
    async fn orders_most_urgent_first() {
        let server = setup();
        create_test_task(&server, json!({ "title": "Someday", "priority": "low" })).await;
        create_test_task(&server, json!({ "title": "Now", "priority": "critical", "due_date": "2000-01-01" })).await;

        let ranked: Vec<RankedTask> = server.get("/api/v1/tasks/ranked").await.json();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].task.title, "Now");
        assert!(ranked[0].urgency_score > ranked[1].urgency_score);
    }

    #[tokio::test]
    async fn leaves_out_done_tasks() {
        let server = setup();
        create_test_task(&server, json!({ "title": "Shipped", "priority": "critical", "due_date": "2000-01-01", "status": "done" })).await;
        create_test_task(&server, json!({ "title": "Pending", "priority": "low" })).await;

        let ranked: Vec<RankedTask> = server.get("/api/v1/tasks/ranked").await.json();
        let titles: Vec<&str> = ranked.iter().map(|r| r.task.title.as_str()).collect();
        assert_eq!(titles, vec!["Pending"]);
    }
}

mod extract {
    use super::*;

    const NOTES: &str = "Weekly sync\n- Alex will draft the migration plan\n- We need to rotate the staging credentials";

    #[tokio::test]
    async fn previews_without_saving() {
        let server = setup();

        let response = server
            .post("/api/v1/extract")
            .json(&json!({ "text": NOTES }))
            .await;

        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["method"], "heuristic");
        assert_eq!(body["tasks"].as_array().unwrap().len(), 2);
        assert!(body.get("created").is_none());

        let tasks: Vec<Task> = server.get("/api/v1/tasks").await.json();
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn saves_tasks_as_ai_generated() {
        let server = setup();

        let response = server
            .post("/api/v1/extract")
            .json(&json!({ "text": NOTES, "save": true }))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: Value = response.json();
        assert_eq!(body["created"].as_array().unwrap().len(), 2);

        let tasks: Vec<Task> = server.get("/api/v1/tasks").await.json();
        assert_eq!(tasks.len(), 2);
        assert!(tasks.iter().all(|t| t.created_by_ai));
    }

    #[tokio::test]
    async fn unstructured_text_becomes_one_task() {
        let server = setup();

        let body: Value = server
            .post("/api/v1/extract")
            .json(&json!({ "text": "Quarterly planning sync" }))
            .await
            .json();

        assert_eq!(body["tasks"].as_array().unwrap().len(), 1);
        assert_eq!(body["tasks"][0]["title"], "Quarterly planning sync");
    }
}

mod reporting {
    use super::*;

    #[tokio::test]
    async fn stats_count_tasks() {
        let server = setup();
        create_test_task(&server, json!({ "title": "A", "priority": "high" })).await;
        create_test_task(&server, json!({ "title": "B", "priority": "high" })).await;

        let stats: TaskStats = server.get("/api/v1/stats").await.json();
        assert_eq!(stats.total_tasks, 2);
        assert_eq!(stats.by_priority.get("high"), Some(&2));
    }

    #[tokio::test]
    async fn dashboard_summarizes_workload() {
        let server = setup();
        create_test_task(&server, json!({ "title": "Late", "due_date": "2000-01-01" })).await;
        create_test_task(&server, json!({ "title": "Finished", "status": "done" })).await;

        let response = server.get("/api/v1/dashboard").await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["total_tasks"], 2);
        assert_eq!(body["overdue_tasks"], 1);
        assert_eq!(body["completion_rate"], 50.0);
        assert_eq!(body["ranked"].as_array().unwrap().len(), 1);
        assert_eq!(body["timeline"].as_array().unwrap().len(), 1);
        assert!(!body["insights"].as_array().unwrap().is_empty());
    }
}
