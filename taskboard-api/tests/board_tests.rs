/// HTTP tests for boards, sharing, columns, tasks, and labels
///
/// Everything runs against the in-memory store through the full router,
/// including the bearer middleware.

mod common;

use axum::http::StatusCode;
use common::{id_of, titles, TestApp};
use serde_json::{json, Value};

fn role_of(members: &[Value], user_id: &str) -> String {
    members
        .iter()
        .find(|m| m["user_id"] == user_id)
        .and_then(|m| m["role"].as_str())
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn test_board_crud_and_cap() {
    let t = TestApp::new();
    let ada = t.user("Ada").await;

    let (status, board) = t
        .post("/boards", &ada, json!({ "title": "  Roadmap  ", "description": "Q3" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(board["title"], "Roadmap");
    assert_eq!(board["owner_id"], ada.id.to_string());
    let board_id = id_of(&board);

    let (status, updated) = t
        .put(&format!("/boards/{}", board_id), &ada, json!({ "title": "Roadmap 2" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Roadmap 2");
    assert_eq!(updated["description"], "Q3");

    for i in 0..4 {
        t.board(&ada, &format!("Board {}", i)).await;
    }
    let (status, body) = t.post("/boards", &ada, json!({ "title": "One too many" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, boards) = t.get("/boards", &ada).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(boards.as_array().unwrap().len(), 5);

    let (status, _) = t.post("/boards", &ada, json!({ "title": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = t.delete(&format!("/boards/{}", board_id), &ada).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = t.get(&format!("/boards/{}", board_id), &ada).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_boards_are_hidden_from_strangers() {
    let t = TestApp::new();
    let ada = t.user("Ada").await;
    let eve = t.user("Eve").await;
    let board_id = t.board(&ada, "Private").await;
    let column_id = t.column(&ada, &board_id, "Todo").await;
    let task_id = t.task(&ada, &column_id, "Secret").await;

    for uri in [
        format!("/boards/{}", board_id),
        format!("/boards/{}/columns", board_id),
        format!("/boards/{}/share", board_id),
        format!("/columns/{}", column_id),
        format!("/columns/{}/tasks", column_id),
        format!("/tasks/{}", task_id),
    ] {
        let (status, _) = t.get(&uri, &eve).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "GET {}", uri);
    }

    let (status, _) = t.delete(&format!("/boards/{}", board_id), &eve).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = t
        .post(&format!("/tasks/{}/move", task_id), &eve, json!({ "column_id": column_id, "position": 0 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, boards) = t.get("/boards", &eve).await;
    assert_eq!(boards, json!([]));
}

#[tokio::test]
async fn test_sharing_roles() {
    let t = TestApp::new();
    let ada = t.user("Ada").await;
    let vic = t.user("Vic").await;
    let eddie = t.user("Eddie").await;
    let board_id = t.board(&ada, "Team").await;

    t.share(&ada, &board_id, &vic, "viewer").await;
    t.share(&ada, &board_id, &eddie, "editor").await;

    let (status, members) = t.get(&format!("/boards/{}/share", board_id), &vic).await;
    assert_eq!(status, StatusCode::OK);
    let members = members.as_array().unwrap().clone();
    assert_eq!(members.len(), 3);
    assert_eq!(members[0]["user_id"], ada.id.to_string());
    assert_eq!(members[0]["is_owner"], true);
    assert_eq!(members[0]["role"], "owner");
    assert_eq!(role_of(&members, &vic.id.to_string()), "viewer");
    assert_eq!(role_of(&members, &eddie.id.to_string()), "editor");

    let (status, _) = t.get(&format!("/boards/{}", board_id), &vic).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = t
        .put(&format!("/boards/{}", board_id), &vic, json!({ "title": "Mine now" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = t
        .put(&format!("/boards/{}", board_id), &eddie, json!({ "title": "Edited" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    // Only the owner manages shares and deletes the board
    let (status, _) = t
        .post(
            &format!("/boards/{}/share", board_id),
            &eddie,
            json!({ "email": vic.email, "role": "editor" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = t.delete(&format!("/boards/{}", board_id), &eddie).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, shared) = t.get("/shared-boards", &vic).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&shared), vec!["Edited"]);

    // Upsert changes the role in place
    t.share(&ada, &board_id, &vic, "editor").await;
    let (_, members) = t.get(&format!("/boards/{}/share", board_id), &ada).await;
    let members = members.as_array().unwrap().clone();
    assert_eq!(members.len(), 3);
    assert_eq!(role_of(&members, &vic.id.to_string()), "editor");

    let (status, _) = t.delete(&format!("/boards/{}/share/{}", board_id, vic.id), &ada).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = t.delete(&format!("/boards/{}/share/{}", board_id, vic.id), &ada).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = t.get(&format!("/boards/{}", board_id), &vic).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_share_target_checks() {
    let t = TestApp::new();
    let ada = t.user("Ada").await;
    let board_id = t.board(&ada, "Team").await;
    let uri = format!("/boards/{}/share", board_id);

    let (status, _) = t
        .post(&uri, &ada, json!({ "email": ada.email, "role": "editor" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t
        .post(&uri, &ada, json!({ "email": "ghost@example.com", "role": "viewer" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = t
        .post(&uri, &ada, json!({ "email": "ghost@example.com", "role": "admin" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_column_ordering() {
    let t = TestApp::new();
    let ada = t.user("Ada").await;
    let board_id = t.board(&ada, "Flow").await;
    let todo = t.column(&ada, &board_id, "Todo").await;
    let done = t.column(&ada, &board_id, "Done").await;

    let (status, doing) = t
        .post("/columns", &ada, json!({ "board_id": board_id, "title": "Doing", "position": 1 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(doing["position"], 1);
    let doing = id_of(&doing);

    let columns_uri = format!("/boards/{}/columns", board_id);
    let (_, columns) = t.get(&columns_uri, &ada).await;
    assert_eq!(titles(&columns), vec!["Todo", "Doing", "Done"]);

    let (status, _) = t
        .post("/columns", &ada, json!({ "board_id": board_id, "title": "Far", "position": 7 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, moved) = t
        .put(&format!("/columns/{}", done), &ada, json!({ "title": "Shipped", "position": 0 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["title"], "Shipped");
    assert_eq!(moved["position"], 0);
    let (_, columns) = t.get(&columns_uri, &ada).await;
    assert_eq!(titles(&columns), vec!["Shipped", "Todo", "Doing"]);

    let (status, _) = t
        .put(&format!("/columns/{}", done), &ada, json!({ "position": 3 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let reorder_uri = format!("/boards/{}/columns/reorder", board_id);
    let (status, reordered) = t
        .post(
            &reorder_uri,
            &ada,
            json!({ "columns": [
                { "id": todo, "position": 0 },
                { "id": doing, "position": 1 },
                { "id": done, "position": 2 },
            ] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&reordered), vec!["Todo", "Doing", "Shipped"]);

    // Not a permutation
    let (status, _) = t
        .post(
            &reorder_uri,
            &ada,
            json!({ "columns": [
                { "id": todo, "position": 0 },
                { "id": doing, "position": 0 },
                { "id": done, "position": 2 },
            ] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t.delete(&format!("/columns/{}", todo), &ada).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, columns) = t.get(&columns_uri, &ada).await;
    let positions: Vec<i64> = columns
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["position"].as_i64().unwrap())
        .collect();
    assert_eq!(titles(&columns), vec!["Doing", "Shipped"]);
    assert_eq!(positions, vec![0, 1]);
}

#[tokio::test]
async fn test_task_lifecycle() {
    let t = TestApp::new();
    let ada = t.user("Ada").await;
    let board_id = t.board(&ada, "Flow").await;
    let todo = t.column(&ada, &board_id, "Todo").await;
    let done = t.column(&ada, &board_id, "Done").await;

    let first = t.task(&ada, &todo, "First").await;
    let second = t.task(&ada, &todo, "Second").await;
    let (status, zeroth) = t
        .post(
            "/tasks",
            &ada,
            json!({
                "column_id": todo,
                "title": "Zeroth",
                "description": "goes first",
                "due_date": "2030-01-01T12:00:00Z",
                "position": 0,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(zeroth["created_by"], ada.id.to_string());
    assert_eq!(zeroth["due_date"], "2030-01-01T12:00:00Z");
    let zeroth = id_of(&zeroth);

    let todo_tasks = format!("/columns/{}/tasks", todo);
    let (_, tasks) = t.get(&todo_tasks, &ada).await;
    assert_eq!(titles(&tasks), vec!["Zeroth", "First", "Second"]);

    let (status, moved) = t
        .post(&format!("/tasks/{}/move", first), &ada, json!({ "column_id": done, "position": 0 }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["column_id"], done);
    assert_eq!(moved["position"], 0);

    let (status, _) = t
        .post(&format!("/tasks/{}/move", second), &ada, json!({ "column_id": todo, "position": 2 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Column change without a position appends
    let (status, updated) = t
        .put(
            &format!("/tasks/{}", zeroth),
            &ada,
            json!({ "column_id": done, "title": "Renamed", "due_date": null }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Renamed");
    assert_eq!(updated["description"], "goes first");
    assert_eq!(updated["position"], 1);
    assert!(updated["due_date"].is_null());

    let (_, tasks) = t.get(&format!("/columns/{}/tasks", done), &ada).await;
    assert_eq!(titles(&tasks), vec!["First", "Renamed"]);
    let (_, tasks) = t.get(&todo_tasks, &ada).await;
    assert_eq!(titles(&tasks), vec!["Second"]);
    assert_eq!(tasks[0]["position"], 0);

    let (status, dated) = t
        .post(
            &format!("/tasks/{}/due-date", second),
            &ada,
            json!({ "due_date": "2031-06-30T00:00:00Z" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dated["due_date"], "2031-06-30T00:00:00Z");
    let (_, cleared) = t
        .post(&format!("/tasks/{}/due-date", second), &ada, json!({ "due_date": null }))
        .await;
    assert!(cleared["due_date"].is_null());

    let (status, _) = t.delete(&format!("/tasks/{}", second), &ada).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = t.get(&format!("/tasks/{}", second), &ada).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cross_board_move_is_rejected() {
    let t = TestApp::new();
    let ada = t.user("Ada").await;
    let left_board = t.board(&ada, "Left").await;
    let right_board = t.board(&ada, "Right").await;
    let left = t.column(&ada, &left_board, "Todo").await;
    let right = t.column(&ada, &right_board, "Todo").await;
    let task = t.task(&ada, &left, "Stay").await;

    let (status, _) = t
        .post(&format!("/tasks/{}/move", task), &ada, json!({ "column_id": right, "position": 0 }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, tasks) = t.get(&format!("/columns/{}/tasks", left), &ada).await;
    assert_eq!(titles(&tasks), vec!["Stay"]);
}

#[tokio::test]
async fn test_task_permissions_and_assignment() {
    let t = TestApp::new();
    let ada = t.user("Ada").await;
    let eddie = t.user("Eddie").await;
    let vic = t.user("Vic").await;
    let eve = t.user("Eve").await;
    let board_id = t.board(&ada, "Team").await;
    let column = t.column(&ada, &board_id, "Todo").await;
    t.share(&ada, &board_id, &eddie, "editor").await;
    t.share(&ada, &board_id, &vic, "viewer").await;

    let (status, _) = t
        .post("/tasks", &vic, json!({ "column_id": column, "title": "Nope" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let eddies = t.task(&eddie, &column, "Eddie's").await;
    let adas = t.task(&ada, &column, "Ada's").await;

    let assign_uri = format!("/tasks/{}/assign", adas);
    let (status, assigned) = t.post(&assign_uri, &eddie, json!({ "user_id": vic.id })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assigned["assigned_to"], vic.id.to_string());

    let (status, _) = t.post(&assign_uri, &ada, json!({ "user_id": eve.id })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = t.post(&assign_uri, &vic, json!({ "user_id": vic.id })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, unassigned) = t.delete(&assign_uri, &ada).await;
    assert_eq!(status, StatusCode::OK);
    assert!(unassigned["assigned_to"].is_null());

    // Eddie keeps viewer access after the downgrade and may still delete
    // the task they created, but not someone else's
    t.share(&ada, &board_id, &eddie, "viewer").await;
    let (status, _) = t.delete(&format!("/tasks/{}", adas), &eddie).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = t.delete(&format!("/tasks/{}", eddies), &eddie).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, tasks) = t.get(&format!("/columns/{}/tasks", column), &vic).await;
    assert_eq!(titles(&tasks), vec!["Ada's"]);
    assert_eq!(tasks[0]["position"], 0);
}

#[tokio::test]
async fn test_labels() {
    let t = TestApp::new();
    let ada = t.user("Ada").await;
    let vic = t.user("Vic").await;
    let board_id = t.board(&ada, "Flow").await;
    let other_board = t.board(&ada, "Other").await;
    let column = t.column(&ada, &board_id, "Todo").await;
    let task = t.task(&ada, &column, "Ship").await;
    t.share(&ada, &board_id, &vic, "viewer").await;

    let (status, label) = t
        .post("/labels", &ada, json!({ "board_id": board_id, "name": "urgent", "color": "#FF0000" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let label_id = id_of(&label);

    let (status, _) = t
        .post("/labels", &ada, json!({ "board_id": board_id, "name": "bad", "color": "red" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = t
        .post("/labels", &ada, json!({ "board_id": board_id, "name": "x".repeat(51), "color": "#000000" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = t
        .post("/labels", &vic, json!({ "board_id": board_id, "name": "mine", "color": "#000000" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let link_uri = format!("/tasks/{}/labels/{}", task, label_id);
    for _ in 0..2 {
        let (status, _) = t.post(&link_uri, &ada, json!({})).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    let (status, labels) = t.get(&format!("/tasks/{}/labels", task), &vic).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(labels.as_array().unwrap().len(), 1);
    assert_eq!(labels[0]["name"], "urgent");

    let (_, view) = t.get(&format!("/tasks/{}", task), &vic).await;
    assert_eq!(view["title"], "Ship");
    assert_eq!(view["labels"][0]["id"], label_id);

    let (status, tagged) = t.get(&format!("/labels/{}/tasks", label_id), &vic).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&tagged), vec!["Ship"]);

    let (status, renamed) = t
        .put(&format!("/labels/{}", label_id), &ada, json!({ "color": "#00ff00" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(renamed["name"], "urgent");
    assert_eq!(renamed["color"], "#00ff00");

    // A label from another board cannot be attached
    let (_, foreign) = t
        .post("/labels", &ada, json!({ "board_id": other_board, "name": "elsewhere", "color": "#123456" }))
        .await;
    let (status, _) = t
        .post(&format!("/tasks/{}/labels/{}", task, id_of(&foreign)), &ada, json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, board_labels) = t.get(&format!("/boards/{}/labels", board_id), &vic).await;
    assert_eq!(board_labels.as_array().unwrap().len(), 1);

    let (status, _) = t.delete(&link_uri, &ada).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = t.delete(&link_uri, &ada).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    t.post(&link_uri, &ada, json!({})).await;
    let (status, _) = t.delete(&format!("/labels/{}", label_id), &ada).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, labels) = t.get(&format!("/tasks/{}/labels", task), &ada).await;
    assert_eq!(labels, json!([]));
    let (status, _) = t.get(&format!("/labels/{}", label_id), &ada).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deleting_a_board_removes_its_contents() {
    let t = TestApp::new();
    let ada = t.user("Ada").await;
    let board_id = t.board(&ada, "Doomed").await;
    let column = t.column(&ada, &board_id, "Todo").await;
    let task = t.task(&ada, &column, "Gone").await;
    let (_, label) = t
        .post("/labels", &ada, json!({ "board_id": board_id, "name": "tag", "color": "#abcdef" }))
        .await;
    let label_id = id_of(&label);
    t.post(&format!("/tasks/{}/labels/{}", task, label_id), &ada, json!({})).await;

    let (status, _) = t.delete(&format!("/boards/{}", board_id), &ada).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    for uri in [
        format!("/columns/{}", column),
        format!("/tasks/{}", task),
        format!("/labels/{}", label_id),
    ] {
        let (status, _) = t.get(&uri, &ada).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "GET {}", uri);
    }

    // The slot is free again
    for i in 0..5 {
        t.board(&ada, &format!("Board {}", i)).await;
    }
}
