use super::test_util::{app_for, call, prepare_db_and_test};
use axum::http::StatusCode;
use serde_json::{Value, json};

async fn register(app: &axum::Router, name: &str, role: &str) -> (i64, String) {
    let (status, body) = call(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({
            "name": name,
            "email": format!("{}@example.com", name.to_lowercase()),
            "password": "hunter22",
            "role": role,
        })),
    )
    .await;
    assert_eq!(StatusCode::CREATED, status, "registering {name} failed: {body}");

    let id = body["data"]["id"].as_i64().expect("registered user should have an id");
    let token = body["data"]["token"]
        .as_str()
        .expect("registration should issue a token")
        .to_owned();

    (id, token)
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn duplicate_registration_and_login() {
    prepare_db_and_test(|db| async move {
        let app = app_for(db);
        register(&app, "Morgan", "manager").await;

        let (status, body) = call(
            &app,
            "POST",
            "/api/auth/register",
            None,
            Some(json!({
                "name": "Someone Else",
                "email": "  MORGAN@Example.com ",
                "password": "hunter22",
            })),
        )
        .await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert_eq!("user_exists", body["errorCode"]);

        let (status, body) = call(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "Morgan@Example.com", "password": "hunter22"})),
        )
        .await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!("manager", body["data"]["role"]);

        let (status, body) = call(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "morgan@example.com", "password": "wrong-password"})),
        )
        .await;
        assert_eq!(StatusCode::UNAUTHORIZED, status);
        assert_eq!("invalid_credentials", body["errorCode"]);
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn task_assignment_round_trip() {
    prepare_db_and_test(|db| async move {
        let app = app_for(db);
        let (_, manager_token) = register(&app, "Morgan", "manager").await;
        let (employee_id, employee_token) = register(&app, "Avery", "employee").await;
        let (_, outsider_token) = register(&app, "Riley", "employee").await;

        let (status, body) = call(&app, "GET", "/api/users/employees", Some(&manager_token), None).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(2, body["count"]);
        assert_eq!("Avery", body["data"][0]["name"]);

        let (status, body) = call(
            &app,
            "POST",
            "/api/tasks",
            Some(&manager_token),
            Some(json!({
                "title": "Write the quarterly report",
                "priority": "High",
                "assignedTo": employee_id,
            })),
        )
        .await;
        assert_eq!(StatusCode::CREATED, status, "{body}");
        assert_eq!("To Do", body["data"]["status"]);
        let task_id = body["data"]["id"].as_i64().expect("task should have an id");

        // Employees see the task, outsiders don't
        let (_, body) = call(&app, "GET", "/api/tasks", Some(&employee_token), None).await;
        assert_eq!(1, body["count"]);
        let task_uri = format!("/api/tasks/{task_id}");
        let (status, _) = call(&app, "GET", &task_uri, Some(&outsider_token), None).await;
        assert_eq!(StatusCode::FORBIDDEN, status);

        let (status, body) = call(
            &app,
            "PUT",
            &task_uri,
            Some(&employee_token),
            Some(json!({"status": "In Progress"})),
        )
        .await;
        assert_eq!(StatusCode::OK, status, "{body}");
        assert_eq!("In Progress", body["data"]["status"]);

        let (status, _) = call(
            &app,
            "PUT",
            &task_uri,
            Some(&employee_token),
            Some(json!({"status": "Done", "title": "Renamed"})),
        )
        .await;
        assert_eq!(StatusCode::FORBIDDEN, status);

        let updates_uri = format!("/api/tasks/{task_id}/updates");
        let (status, body) = call(
            &app,
            "POST",
            &updates_uri,
            Some(&employee_token),
            Some(json!({
                "updateText": "Drafted the introduction",
                "percentageComplete": 40,
                "intensity": "Medium",
            })),
        )
        .await;
        assert_eq!(StatusCode::CREATED, status, "{body}");
        assert_eq!("", body["data"]["managerRemark"]);
        let update_id = body["data"]["id"].as_i64().expect("update should have an id");

        let (status, body) = call(
            &app,
            "PUT",
            &format!("/api/updates/{update_id}/remark"),
            Some(&manager_token),
            Some(json!({"remark": "Good start"})),
        )
        .await;
        assert_eq!(StatusCode::OK, status, "{body}");
        assert_eq!("Good start", body["data"]["managerRemark"]);
        assert_eq!(false, body["data"]["isAcknowledged"]);

        let acknowledge_uri = format!("/api/updates/{update_id}/acknowledge");
        let (status, _) = call(&app, "PUT", &acknowledge_uri, Some(&manager_token), None).await;
        assert_eq!(StatusCode::FORBIDDEN, status);
        let (status, body) = call(&app, "PUT", &acknowledge_uri, Some(&employee_token), None).await;
        assert_eq!(StatusCode::OK, status, "{body}");
        assert_eq!(true, body["data"]["isAcknowledged"]);

        let (_, body) = call(&app, "GET", &updates_uri, Some(&manager_token), None).await;
        assert_eq!(1, body["count"]);
        assert_eq!("Good start", body["data"][0]["managerRemark"]);
        assert_eq!(true, body["data"][0]["isAcknowledged"]);

        let (status, _) = call(
            &app,
            "PUT",
            &task_uri,
            Some(&employee_token),
            Some(json!({"status": "Done"})),
        )
        .await;
        assert_eq!(StatusCode::OK, status);

        let (status, body) = call(&app, "GET", "/api/analytics/summary", Some(&manager_token), None).await;
        assert_eq!(StatusCode::OK, status, "{body}");
        assert_eq!("100.0", body["data"]["completionPercentage"]);
        assert_eq!(1, body["data"]["tasksPerEmployee"][0]["taskCount"]);

        let (_, body) = call(
            &app,
            "GET",
            &format!("/api/analytics/task/{task_id}/progress"),
            Some(&employee_token),
            None,
        )
        .await;
        let points: &Vec<Value> = body["data"].as_array().expect("progress should be a list");
        assert_eq!(1, points.len());
        assert_eq!(40, points[0]["percentageComplete"]);

        let (status, body) = call(&app, "DELETE", &task_uri, Some(&manager_token), None).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(json!({}), body["data"]);
        let (status, _) = call(&app, "GET", &updates_uri, Some(&manager_token), None).await;
        assert_eq!(StatusCode::NOT_FOUND, status);
    });
}

#[test]
#[cfg_attr(not(feature = "integration_test"), ignore)]
fn null_fields_clear_a_task_for_its_manager_only() {
    prepare_db_and_test(|db| async move {
        let app = app_for(db);
        let (_, manager_token) = register(&app, "Morgan", "manager").await;
        let (employee_id, employee_token) = register(&app, "Avery", "employee").await;

        let (status, body) = call(
            &app,
            "POST",
            "/api/tasks",
            Some(&manager_token),
            Some(json!({
                "title": "Restock the supply closet",
                "description": "Paper and toner",
                "priority": "Low",
                "assignedTo": employee_id,
                "dueDate": "2030-01-15T09:00:00Z",
            })),
        )
        .await;
        assert_eq!(StatusCode::CREATED, status, "{body}");
        let task_uri = format!(
            "/api/tasks/{}",
            body["data"]["id"].as_i64().expect("task should have an id")
        );

        let (status, _) = call(
            &app,
            "PUT",
            &task_uri,
            Some(&employee_token),
            Some(json!({"status": "Done", "title": null, "assignedTo": null})),
        )
        .await;
        assert_eq!(StatusCode::FORBIDDEN, status);

        let (status, body) = call(
            &app,
            "PUT",
            &task_uri,
            Some(&manager_token),
            Some(json!({"assignedTo": null, "dueDate": null, "description": null})),
        )
        .await;
        assert_eq!(StatusCode::OK, status, "{body}");
        assert_eq!(Value::Null, body["data"]["assignedTo"]);
        assert_eq!(Value::Null, body["data"]["dueDate"]);
        assert_eq!(Value::Null, body["data"]["description"]);
        assert_eq!("Low", body["data"]["priority"]);
        assert_eq!("To Do", body["data"]["status"]);

        let (status, body) = call(
            &app,
            "PUT",
            &task_uri,
            Some(&manager_token),
            Some(json!({"title": null})),
        )
        .await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert_eq!("invalid_input", body["errorCode"]);
    });
}
