// tests/api_tests.rs

mod common;

use arena::catalog::Catalog;
use common::{spawn_app, token_for, unique_user};
use serde_json::{Value, json};

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let app = spawn_app().await;

    // Act
    let response = app.get("/random_path_that_does_not_exist", None).await;

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn known_frontend_origins_pass_cors() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/api/leaderboard"))
        .header("Origin", "http://localhost:5173")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "http://localhost:5173"
    );

    let stranger = app
        .client
        .get(app.url("/api/leaderboard"))
        .header("Origin", "http://evil.example")
        .send()
        .await
        .unwrap();
    assert!(stranger.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = spawn_app().await;

    let missing = app.get("/api/me", None).await;
    assert_eq!(missing.status().as_u16(), 401);

    let forged = app.get("/api/me", Some("not-a-jwt")).await;
    assert_eq!(forged.status().as_u16(), 401);
}

#[tokio::test]
async fn first_sign_in_creates_a_zeroed_profile() {
    let app = spawn_app().await;
    let user = unique_user();
    let token = token_for(&user);

    // Not signed in yet: no record.
    assert_eq!(app.get("/api/me", Some(&token)).await.status().as_u16(), 404);

    let response = app
        .post("/api/auth/session", &token, json!({ "college": "IIT Delhi" }))
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let profile: Value = response.json().await.unwrap();
    assert_eq!(profile["id"], user.as_str());
    assert_eq!(profile["points"], 0);
    assert_eq!(profile["streak"], 0);
    assert_eq!(profile["badge_count"], 0);
    assert_eq!(profile["college"], "IIT Delhi");

    let me: Value = app.get("/api/me", Some(&token)).await.json().await.unwrap();
    assert!(me["rank"].is_null());
    assert_eq!(me["recent_awards"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn solving_a_problem_pays_out_once() {
    let app = spawn_app().await;
    let token = app.sign_in(&unique_user()).await;
    let solution = json!({
        "language": "python",
        "source": "a, b = map(int, input().split())\nprint(a + b)"
    });

    let first: Value = app
        .post("/api/problems/2/submit", &token, solution.clone())
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(first["verdict"]["all_passed"], true);
    assert_eq!(first["points_awarded"], 15);
    assert_eq!(first["already_solved"], false);
    assert_eq!(first["total_points"], 15);

    let second: Value = app
        .post("/api/problems/2/submit", &token, solution)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(second["points_awarded"], 0);
    assert_eq!(second["already_solved"], true);
    assert_eq!(second["total_points"], 15);

    assert_eq!(app.points_of(&token).await, 15);
}

#[tokio::test]
async fn failing_submission_awards_nothing() {
    let app = spawn_app().await;
    let token = app.sign_in(&unique_user()).await;

    let response: Value = app
        .post(
            "/api/problems/1/submit",
            &token,
            json!({ "language": "javascript", "source": "console.log('hi')" }),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(response["verdict"]["all_passed"], false);
    assert_eq!(response["points_awarded"], 0);
    assert!(response["total_points"].is_null());
    assert_eq!(app.points_of(&token).await, 0);

    let empty = app
        .post("/api/problems/1/submit", &token, json!({ "language": "c", "source": "  " }))
        .await;
    assert_eq!(empty.status().as_u16(), 400);

    let unknown = app
        .post("/api/problems/999/submit", &token, json!({ "language": "c", "source": "x" }))
        .await;
    assert_eq!(unknown.status().as_u16(), 404);
}

#[tokio::test]
async fn problem_detail_hides_judge_patterns() {
    let app = spawn_app().await;

    let list: Value = app.get("/api/problems", None).await.json().await.unwrap();
    assert_eq!(list.as_array().unwrap().len(), 5);

    let detail: Value = app.get("/api/problems/5", None).await.json().await.unwrap();
    assert_eq!(detail["points"], 50);
    assert!(detail.get("patterns").is_none());
    assert!(detail["starter_code"]["python"].is_string());
}

/// frontend stack, 10 points per question: 3 correct out of 5 earns 30.
#[tokio::test]
async fn completing_a_quiz_awards_correct_times_weight() {
    let app = spawn_app().await;
    let token = app.sign_in(&unique_user()).await;
    let catalog = Catalog::builtin().unwrap();
    let stack = catalog.stack("frontend").unwrap();

    let created = app
        .post("/api/quiz/sessions", &token, json!({ "stack_id": "frontend" }))
        .await;
    assert_eq!(created.status().as_u16(), 201);
    let session: Value = created.json().await.unwrap();
    assert_eq!(session["phase"], "not_started");
    let id = session["id"].as_str().unwrap().to_string();

    let started: Value = app
        .post(&format!("/api/quiz/sessions/{}/start", id), &token, json!({}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(started["phase"], "in_progress");
    assert_eq!(started["seconds_remaining"], 30);
    assert!(started["question"]["options"].is_array());

    let mut result = Value::Null;
    for (i, question) in stack.questions.iter().enumerate() {
        let option = if i < 3 {
            question.correct_answer
        } else {
            (question.correct_answer + 1) % question.options.len()
        };
        let revealed: Value = app
            .post(
                &format!("/api/quiz/sessions/{}/answer", id),
                &token,
                json!({ "option": option }),
            )
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(revealed["phase"], "answer_revealed");
        assert_eq!(revealed["revealed"]["correct"], i < 3);

        let next: Value = app
            .post(&format!("/api/quiz/sessions/{}/next", id), &token, json!({}))
            .await
            .json()
            .await
            .unwrap();
        if i + 1 < stack.questions.len() {
            assert_eq!(next["status"], "question");
            assert_eq!(next["session"]["question_index"], i + 1);
        } else {
            result = next;
        }
    }

    assert_eq!(result["status"], "completed");
    assert_eq!(result["result"]["score"], 3);
    assert_eq!(result["result"]["total_questions"], 5);
    assert_eq!(result["result"]["points_earned"], 30);
    assert_eq!(result["result"]["total_points"], 30);
    assert_eq!(app.points_of(&token).await, 30);

    // The finished session is gone; nothing can be awarded twice.
    let gone = app.get(&format!("/api/quiz/sessions/{}", id), Some(&token)).await;
    assert_eq!(gone.status().as_u16(), 404);
    assert_eq!(app.points_of(&token).await, 30);
}

#[tokio::test]
async fn quiz_sessions_belong_to_their_owner() {
    let app = spawn_app().await;
    let owner = app.sign_in(&unique_user()).await;
    let other = app.sign_in(&unique_user()).await;

    let session: Value = app
        .post("/api/quiz/sessions", &owner, json!({ "stack_id": "devops" }))
        .await
        .json()
        .await
        .unwrap();
    let id = session["id"].as_str().unwrap();

    let peek = app.get(&format!("/api/quiz/sessions/{}", id), Some(&other)).await;
    assert_eq!(peek.status().as_u16(), 404);

    let unknown_stack = app
        .post("/api/quiz/sessions", &owner, json!({ "stack_id": "cobol" }))
        .await;
    assert_eq!(unknown_stack.status().as_u16(), 404);
}

#[tokio::test]
async fn quiz_needs_a_signed_in_profile_to_start() {
    let app = spawn_app().await;
    let user = unique_user();
    let token = token_for(&user);

    // Without a ledger record the final award could not be paid.
    let refused = app
        .post("/api/quiz/sessions", &token, json!({ "stack_id": "frontend" }))
        .await;
    assert_eq!(refused.status().as_u16(), 404);

    app.sign_in(&user).await;
    let created = app
        .post("/api/quiz/sessions", &token, json!({ "stack_id": "frontend" }))
        .await;
    assert_eq!(created.status().as_u16(), 201);
}

#[tokio::test]
async fn signing_out_ends_live_quiz_sessions() {
    let app = spawn_app().await;
    let token = app.sign_in(&unique_user()).await;

    let session: Value = app
        .post("/api/quiz/sessions", &token, json!({ "stack_id": "backend" }))
        .await
        .json()
        .await
        .unwrap();
    let id = session["id"].as_str().unwrap().to_string();
    app.post(&format!("/api/quiz/sessions/{}/start", id), &token, json!({}))
        .await;

    let signed_out = app
        .client
        .delete(app.url("/api/auth/session"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(signed_out.status().as_u16(), 204);

    // The listener runs on its own task; give it a moment.
    let mut status = 200;
    for _ in 0..50 {
        status = app
            .get(&format!("/api/quiz/sessions/{}", id), Some(&token))
            .await
            .status()
            .as_u16();
        if status == 404 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert_eq!(status, 404);
}

#[tokio::test]
async fn leaderboard_ranks_by_points_then_registration() {
    let app = spawn_app().await;

    // A and B tie on 100, A registered first; C has 50; D has nothing.
    let a = app.sign_in("user-a").await;
    let b = app.sign_in("user-b").await;
    let c = app.sign_in("user-c").await;
    let d = app.sign_in("user-d").await;

    // 30 + 25 + 15 + 10 from the four non-prime problems.
    for token in [&a, &b] {
        for (problem, source) in [
            (4, "n = int(input())\nfor i in range(n): a, b = b, a + b"),
            (3, "a, b, c = map(int, input().split())\nprint(max(a, b, c))"),
            (2, "print(sum(map(int, input().split())) + 0)"),
            (1, "print('Hello World')"),
        ] {
            let r: Value = app
                .post(
                    &format!("/api/problems/{}/submit", problem),
                    token,
                    json!({ "language": "python", "source": source }),
                )
                .await
                .json()
                .await
                .unwrap();
            assert_eq!(r["verdict"]["all_passed"], true, "problem {}", problem);
        }
    }
    // 80 so far; top both up to 100 with two frontend questions each.
    for token in [&a, &b] {
        answer_quiz(&app, token, "frontend", 2).await;
    }
    // C: 50 from the prime problem.
    let r: Value = app
        .post(
            "/api/problems/5/submit",
            &c,
            json!({
                "language": "python",
                "source": "n = int(input())\nprint('YES' if n > 1 and all(n % i for i in range(2, n)) else 'NO')"
            }),
        )
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(r["points_awarded"], 50);

    let board: Value = app.get("/api/leaderboard", None).await.json().await.unwrap();
    let rows = board.as_array().unwrap();
    let ids: Vec<&str> = rows.iter().map(|r| r["user_id"].as_str().unwrap()).collect();
    assert_eq!(ids, ["user-a", "user-b", "user-c"]);
    assert_eq!(rows[0]["rank"], 1);
    assert_eq!(rows[0]["points"], 100);
    assert_eq!(rows[0]["title"], "The Ultimate Boss");
    assert_eq!(rows[2]["rank"], 3);

    let top_one: Value = app.get("/api/leaderboard?limit=1", None).await.json().await.unwrap();
    assert_eq!(top_one.as_array().unwrap().len(), 1);

    let mine: Value = app.get("/api/leaderboard/me", Some(&c)).await.json().await.unwrap();
    assert_eq!(mine["rank"], 3);
    let nobody: Value = app.get("/api/leaderboard/me", Some(&d)).await.json().await.unwrap();
    assert!(nobody.is_null());
}

/// Runs a full quiz on `stack_id`, answering the first `correct` questions right.
async fn answer_quiz(app: &common::TestApp, token: &str, stack_id: &str, correct: usize) {
    let catalog = Catalog::builtin().unwrap();
    let stack = catalog.stack(stack_id).unwrap();
    let session: Value = app
        .post("/api/quiz/sessions", token, json!({ "stack_id": stack_id }))
        .await
        .json()
        .await
        .unwrap();
    let id = session["id"].as_str().unwrap().to_string();
    app.post(&format!("/api/quiz/sessions/{}/start", id), token, json!({}))
        .await;

    for (i, q) in stack.questions.iter().enumerate() {
        let option = if i < correct {
            q.correct_answer
        } else {
            (q.correct_answer + 1) % q.options.len()
        };
        app.post(
            &format!("/api/quiz/sessions/{}/answer", id),
            token,
            json!({ "option": option }),
        )
        .await;
        app.post(&format!("/api/quiz/sessions/{}/next", id), token, json!({}))
            .await;
    }
}
