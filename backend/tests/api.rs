mod common;

use axum::{
    Json, Router,
    http::{Method, StatusCode},
    routing::post,
};
use backend::openai::APOLOGY;
use chrono::{Duration, Utc};
use common::{TestApp, dead_upstream, spawn_upstream};
use serde_json::{Value, json};

async fn replying_upstream(reply: &'static str) -> String {
    spawn_upstream(Router::new().route(
        "/v1/chat/completions",
        post(move || async move {
            Json(json!({"choices": [{"message": {"role": "assistant", "content": reply}}]}))
        }),
    ))
    .await
}

async fn chat(app: &TestApp, token: &str, character_id: &str, history: Value, content: &str) -> Value {
    let (status, body) = app
        .json(
            Method::POST,
            "/api/chat",
            Some(token),
            Some(json!({"character_id": character_id, "history": history, "content": content})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    body
}

#[tokio::test]
async fn health_is_public_and_api_is_not() {
    let app = TestApp::new(&dead_upstream().await).await;

    let (status, body) = app.request(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"OK");

    let (status, _) = app.request(Method::GET, "/api/catalog", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .request(Method::GET, "/api/catalog", Some("garbage"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sign_up_sign_in_and_sign_out() {
    let app = TestApp::new(&dead_upstream().await).await;
    let token = app.sign_up("aigerim@example.kz", "qwerty1").await;

    let (status, _) = app
        .json(
            Method::POST,
            "/api/auth/sign-up",
            None,
            Some(json!({"name": "Басқа", "email": "AIGERIM@example.kz", "password": "qwerty1"})),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .json(
            Method::POST,
            "/api/auth/sign-up",
            None,
            Some(json!({"name": "Ә", "email": "a@example.kz", "password": "qwerty1"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .json(
            Method::POST,
            "/api/auth/sign-in",
            None,
            Some(json!({"email": "aigerim@example.kz", "password": "wrong-one"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, session) = app
        .json(
            Method::POST,
            "/api/auth/sign-in",
            None,
            Some(json!({"email": "aigerim@example.kz", "password": "qwerty1"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["user"]["subscription_status"], "free");

    let (status, current) = app
        .json(Method::GET, "/api/auth/session", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(current["user"]["email"], "aigerim@example.kz");
    assert_eq!(current["access_token"], token.as_str());

    let (status, _) = app
        .request(Method::POST, "/api/auth/sign-out", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .request(Method::GET, "/api/auth/session", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // The other session is unaffected.
    let other = session["access_token"].as_str().unwrap();
    let (status, _) = app
        .request(Method::GET, "/api/auth/session", Some(other), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn password_reset_and_update() {
    let app = TestApp::new(&dead_upstream().await).await;
    let token = app.sign_up("aigerim@example.kz", "qwerty1").await;

    for email in ["nobody@example.kz", "aigerim@example.kz"] {
        let (status, _) = app
            .json(
                Method::POST,
                "/api/auth/password-reset",
                None,
                Some(json!({"email": email})),
            )
            .await;
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    let (_, current) = app
        .json(Method::GET, "/api/auth/session", Some(&token), None)
        .await;
    let user_id = current["user"]["id"].as_str().unwrap().parse().unwrap();
    app.state
        .db
        .create_password_reset("known-token", user_id, Utc::now() + Duration::hours(1))
        .await
        .unwrap();

    let confirm = json!({"token": "known-token", "new_password": "jana-kupia"});
    let (status, _) = app
        .json(
            Method::POST,
            "/api/auth/password-reset/confirm",
            None,
            Some(confirm.clone()),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .json(Method::POST, "/api/auth/password-reset/confirm", None, Some(confirm))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .json(
            Method::POST,
            "/api/auth/sign-in",
            None,
            Some(json!({"email": "aigerim@example.kz", "password": "jana-kupia"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .json(
            Method::PUT,
            "/api/auth/password",
            Some(&token),
            Some(json!({"new_password": "abcdef", "confirm_password": "abcdeg"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .json(
            Method::PUT,
            "/api/auth/password",
            Some(&token),
            Some(json!({"new_password": "abcdef", "confirm_password": "abcdef"})),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn profile_and_settings() {
    let app = TestApp::new(&dead_upstream().await).await;
    let token = app.sign_up("aigerim@example.kz", "qwerty1").await;

    let (status, view) = app.json(Method::GET, "/api/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["profile"]["language"], "kk");

    let (status, view) = app
        .json(
            Method::PUT,
            "/api/profile",
            Some(&token),
            Some(json!({"name": "Айгерім Серікқызы", "bio": "Студент"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["user"]["name"], "Айгерім Серікқызы");
    assert_eq!(view["profile"]["bio"], "Студент");

    let (status, settings) = app
        .json(
            Method::PUT,
            "/api/settings",
            Some(&token),
            Some(json!({"marketing_notifications": true})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settings["marketing_notifications"], true);
    assert_eq!(settings["email_notifications"], true);

    let (_, reread) = app.json(Method::GET, "/api/settings", Some(&token), None).await;
    assert_eq!(reread["marketing_notifications"], true);
}

#[tokio::test]
async fn catalog_selection_and_removal() {
    let app = TestApp::new(&dead_upstream().await).await;
    let token = app.sign_up("aigerim@example.kz", "qwerty1").await;

    let (_, view) = app.json(Method::GET, "/api/catalog", Some(&token), None).await;
    assert_eq!(view["characters"].as_array().unwrap().len(), 4);
    assert_eq!(view["active_id"], "abai");
    assert_eq!(view["characters"][2]["badge"]["label"], "celebrity");

    let (status, added) = app
        .json(
            Method::POST,
            "/api/catalog",
            Some(&token),
            Some(json!({"name": "Ер Төстік", "description": "Ертегі батыры"})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = added["id"].as_str().unwrap().to_string();

    let (status, greeting) = app
        .json(
            Method::PUT,
            "/api/catalog/active",
            Some(&token),
            Some(json!({"id": id})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        greeting["content"],
        "Сәлеметсіз бе! Мен Ер Төстік. Сізбен сөйлесуге қуаныштымын."
    );
    assert_eq!(greeting["sender"], "ai");

    let (status, _) = app
        .request(Method::DELETE, "/api/catalog/abai", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(Method::DELETE, &format!("/api/catalog/{}", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, view) = app.json(Method::GET, "/api/catalog", Some(&token), None).await;
    assert_eq!(view["characters"].as_array().unwrap().len(), 4);
    assert_eq!(view["active_id"], "abai");

    let (status, _) = app
        .request(Method::DELETE, &format!("/api/catalog/{}", id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn custom_characters_are_scoped_and_builtins_protected() {
    let app = TestApp::new(&dead_upstream().await).await;
    let token = app.sign_up("aigerim@example.kz", "qwerty1").await;
    let other = app.sign_up("dana@example.kz", "qwerty1").await;

    let (status, _) = app
        .request(Method::DELETE, "/api/characters/dimash", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .json(
            Method::POST,
            "/api/characters",
            Some(&token),
            Some(json!({
                "name": "Қожанасыр",
                "personality": "қысқа",
                "background": "Халық ертегілерінің кейіпкері, тапқыр әзілқой.",
                "communication_style": "humorous"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, created) = app
        .json(
            Method::POST,
            "/api/characters",
            Some(&token),
            Some(json!({
                "name": "Қожанасыр",
                "personality": "Тапқыр, әзілқой, аңқау көрінеді",
                "background": "Халық ертегілерінің кейіпкері, тапқыр әзілқой.",
                "communication_style": "humorous"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();

    let (_, mine) = app.json(Method::GET, "/api/characters", Some(&token), None).await;
    assert_eq!(mine.as_array().unwrap().len(), 5);
    let (_, theirs) = app.json(Method::GET, "/api/characters", Some(&other), None).await;
    assert_eq!(theirs.as_array().unwrap().len(), 4);

    let uri = format!("/api/characters/{}", id);
    let (status, _) = app.request(Method::DELETE, &uri, Some(&other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.request(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn chat_generates_then_records_history() {
    let app = TestApp::new(&replying_upstream("Сәлеметсіз бе!").await).await;
    let token = app.sign_up("aigerim@example.kz", "qwerty1").await;

    let first = chat(&app, &token, "abai", json!([]), "Сәлем").await;
    assert_eq!(first["message"]["content"], "Сәлем");
    assert_eq!(first["reply"]["content"], "Сәлеметсіз бе!");
    assert_eq!(first["reply"]["character_name"], "Абай Құнанбаев");
    let conversation_id = first["conversation_id"].as_str().unwrap().to_string();

    let history = json!([first["message"], first["reply"]]);
    let second = chat(&app, &token, "abai", history, "Өлең оқыңызшы").await;
    assert_eq!(second["conversation_id"], conversation_id.as_str());

    let (status, summaries) = app
        .json(Method::GET, "/api/conversations", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let summaries = summaries.as_array().unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0]["message_count"], 4);
    assert_eq!(summaries[0]["character_name"], "Абай Құнанбаев");
    assert_eq!(summaries[0]["last_message"], "Сәлеметсіз бе!");

    let (_, hits) = app
        .json(Method::GET, "/api/conversations?q=%D0%90%D0%B1%D0%B0%D0%B9", Some(&token), None)
        .await;
    assert_eq!(hits.as_array().unwrap().len(), 1);
    let (_, misses) = app
        .json(Method::GET, "/api/conversations?q=dimash", Some(&token), None)
        .await;
    assert!(misses.as_array().unwrap().is_empty());

    let uri = format!("/api/conversations/{}", conversation_id);
    let (status, detail) = app.json(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let senders: Vec<&str> = detail["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["sender"].as_str().unwrap())
        .collect();
    assert_eq!(senders, ["user", "ai", "user", "ai"]);

    let other = app.sign_up("dana@example.kz", "qwerty1").await;
    let (status, _) = app.request(Method::GET, &uri, Some(&other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.request(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.request(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn failed_generation_still_answers() {
    let app = TestApp::new(&dead_upstream().await).await;
    let token = app.sign_up("aigerim@example.kz", "qwerty1").await;

    let body = chat(&app, &token, "teacher", json!([]), "Қалайсыз?").await;
    assert_eq!(body["reply"]["content"], APOLOGY);
    assert!(body["conversation_id"].is_string());
}

#[tokio::test]
async fn chat_rejects_blank_and_unknown() {
    let app = TestApp::new(&dead_upstream().await).await;
    let token = app.sign_up("aigerim@example.kz", "qwerty1").await;

    let (status, _) = app
        .json(
            Method::POST,
            "/api/chat",
            Some(&token),
            Some(json!({"character_id": "abai", "content": "   "})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .json(
            Method::POST,
            "/api/chat",
            Some(&token),
            Some(json!({"character_id": "nobody", "content": "Сәлем"})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn transcript_and_local_saves() {
    let app = TestApp::new(&replying_upstream("Иә, бәрі жақсы.").await).await;
    let token = app.sign_up("aigerim@example.kz", "qwerty1").await;

    let body = chat(&app, &token, "dimash", json!([]), "Сәлем").await;
    let messages = json!([body["message"], body["reply"]]);

    let (status, text) = app
        .request(
            Method::POST,
            "/api/chat/transcript",
            Some(&token),
            Some(json!({"messages": messages})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        std::str::from_utf8(&text).unwrap(),
        "Мен: Сәлем\n\nДимаш Құдайберген: Иә, бәрі жақсы."
    );

    let (status, saved) = app
        .json(
            Method::POST,
            "/api/local/conversations",
            Some(&token),
            Some(json!({"character_id": "dimash", "messages": messages})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(saved["character_name"], "Димаш Құдайберген");

    let (_, all) = app
        .json(Method::GET, "/api/local/conversations", Some(&token), None)
        .await;
    assert_eq!(all.as_array().unwrap().len(), 1);
    assert_eq!(all[0]["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn speech_failure_is_bad_gateway() {
    let app = TestApp::new(&dead_upstream().await).await;
    let token = app.sign_up("aigerim@example.kz", "qwerty1").await;

    let (status, body) = app
        .request(
            Method::POST,
            "/api/speech",
            Some(&token),
            Some(json!({"text": "Сәлем"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.is_empty());
}

#[tokio::test]
async fn catalogs_and_saved_transcripts_are_per_user() {
    let app = TestApp::new(&dead_upstream().await).await;
    let alice = app.sign_up("alice@example.kz", "qwerty1").await;
    let bob = app.sign_up("bob@example.kz", "qwerty1").await;

    let (_, added) = app
        .json(
            Method::POST,
            "/api/catalog",
            Some(&alice),
            Some(json!({"name": "Алдар Көсе"})),
        )
        .await;
    let id = added["id"].as_str().unwrap().to_string();
    let (status, _) = app
        .json(
            Method::PUT,
            "/api/catalog/active",
            Some(&alice),
            Some(json!({"id": id})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let message = json!({
        "id": "7f0c1f54-1a0e-4a51-9a51-0b6f3c1d2e3f",
        "content": "құпия",
        "sender": "user",
        "timestamp": "2026-01-01T00:00:00Z"
    });
    let (status, _) = app
        .json(
            Method::POST,
            "/api/local/conversations",
            Some(&alice),
            Some(json!({"character_id": "abai", "messages": [message]})),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, theirs) = app
        .json(Method::GET, "/api/local/conversations", Some(&bob), None)
        .await;
    assert!(theirs.as_array().unwrap().is_empty());

    let (_, view) = app.json(Method::GET, "/api/catalog", Some(&bob), None).await;
    assert_eq!(view["active_id"], "abai");
    assert_eq!(view["characters"].as_array().unwrap().len(), 4);

    let uri = format!("/api/catalog/{}", id);
    let (status, _) = app.request(Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .json(
            Method::PUT,
            "/api/catalog/active",
            Some(&bob),
            Some(json!({"id": id})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, view) = app.json(Method::GET, "/api/catalog", Some(&alice), None).await;
    assert_eq!(view["active_id"], id.as_str());
    assert_eq!(view["characters"].as_array().unwrap().len(), 5);
    let (_, mine) = app
        .json(Method::GET, "/api/local/conversations", Some(&alice), None)
        .await;
    assert_eq!(mine.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn saved_transcripts_can_be_deleted_and_cleared() {
    let app = TestApp::new(&dead_upstream().await).await;
    let token = app.sign_up("aigerim@example.kz", "qwerty1").await;

    let message = json!({
        "id": "7f0c1f54-1a0e-4a51-9a51-0b6f3c1d2e3f",
        "content": "Сәлем",
        "sender": "user",
        "timestamp": "2026-01-01T00:00:00Z"
    });
    let mut ids = Vec::new();
    for _ in 0..2 {
        let (_, saved) = app
            .json(
                Method::POST,
                "/api/local/conversations",
                Some(&token),
                Some(json!({"character_id": "teacher", "messages": [message]})),
            )
            .await;
        ids.push(saved["id"].as_str().unwrap().to_string());
    }

    let uri = format!("/api/local/conversations/{}", ids[0]);
    let (status, _) = app.request(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.request(Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, left) = app
        .json(Method::GET, "/api/local/conversations", Some(&token), None)
        .await;
    assert_eq!(left.as_array().unwrap().len(), 1);
    assert_eq!(left[0]["id"], ids[1].as_str());

    let (status, _) = app
        .request(Method::DELETE, "/api/local/conversations", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, left) = app
        .json(Method::GET, "/api/local/conversations", Some(&token), None)
        .await;
    assert!(left.as_array().unwrap().is_empty());
}
