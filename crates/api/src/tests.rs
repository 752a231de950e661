use crate::App;
use async_trait::async_trait;
use db::{error, Memory, Store};
use http_body_util::{BodyExt, Full};
use hyper::{
    body::Bytes,
    header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE, HOST},
    Method, Request, StatusCode,
};
use model::{Id, NewQuestion, NewQuiz, Question, Quiz};
use serde_json::{json, Value};
use service::{Config, Consistency};

fn app() -> App {
    Consistency::new(Box::<Memory>::default(), Config::default()).into()
}

/// Memory store where another writer always gets in right before a guarded write.
#[derive(Default)]
struct Racing(Memory);

#[async_trait]
impl Store for Racing {
    async fn create_question(&self, question: &NewQuestion) -> error::Result<Question> {
        self.0.create_question(question).await
    }

    async fn create_questions(&self, batch: &[NewQuestion]) -> error::Result<Vec<Question>> {
        self.0.create_questions(batch).await
    }

    async fn get_question(&self, id: Id) -> error::Result<Question> {
        self.0.get_question(id).await
    }

    async fn get_questions(&self) -> error::Result<Vec<Question>> {
        self.0.get_questions().await
    }

    async fn find_questions(&self, ids: &[Id]) -> error::Result<Vec<Question>> {
        self.0.find_questions(ids).await
    }

    async fn set_question(&self, id: Id, version: i32, question: &NewQuestion) -> error::Result<Question> {
        let current = self.0.get_question(id).await?;
        self.0.set_question(id, current.version, &current.to_new()).await?;
        self.0.set_question(id, version, question).await
    }

    async fn delete_question(&self, id: Id) -> error::Result<()> {
        self.0.delete_question(id).await
    }

    async fn delete_questions(&self, ids: &[Id]) -> error::Result<u64> {
        self.0.delete_questions(ids).await
    }

    async fn pull_question(&self, id: Id) -> error::Result<u64> {
        self.0.pull_question(id).await
    }

    async fn create_quiz(&self, quiz: &NewQuiz) -> error::Result<Quiz> {
        self.0.create_quiz(quiz).await
    }

    async fn get_quiz(&self, id: Id) -> error::Result<Quiz> {
        self.0.get_quiz(id).await
    }

    async fn get_quizzes(&self) -> error::Result<Vec<Quiz>> {
        self.0.get_quizzes().await
    }

    async fn set_quiz(&self, id: Id, version: i32, quiz: &NewQuiz) -> error::Result<Quiz> {
        let current = self.0.get_quiz(id).await?;
        self.0.set_quiz(id, current.version, &current.to_new()).await?;
        self.0.set_quiz(id, version, quiz).await
    }

    async fn delete_quiz(&self, id: Id) -> error::Result<Quiz> {
        self.0.delete_quiz(id).await
    }

    async fn push_questions(&self, quiz: Id, ids: &[Id]) -> error::Result<Quiz> {
        self.0.push_questions(quiz, ids).await
    }

    async fn referenced_questions(&self, ids: &[Id]) -> error::Result<Vec<Id>> {
        self.0.referenced_questions(ids).await
    }
}

async fn call(app: &App, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let bytes = body.map(|value| serde_json::to_vec(&value).unwrap()).unwrap_or_default();
    let req = Request::builder().method(method).uri(uri).body(Full::new(Bytes::from(bytes))).unwrap();
    let res = app.try_respond(req).await;
    assert_eq!(res.headers()[CONTENT_TYPE], "application/json");
    assert_eq!(res.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

fn question(text: &str) -> Value {
    json!({ "text": text, "options": ["yes", "no"], "correctAnswerIndex": 0 })
}

#[tokio::test(flavor = "current_thread")]
async fn question_crud_uses_uniform_envelope() {
    let app = app();

    let (status, body) = call(&app, Method::POST, "/questions", Some(question("Is water wet?"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    let id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["correctAnswerIndex"], 0);
    assert_eq!(body["data"]["keywords"], json!([]));

    let (status, body) = call(&app, Method::GET, &format!("/questions/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["text"], "Is water wet?");

    let patch = json!({ "text": "Is fire hot?" });
    let (status, body) = call(&app, Method::PUT, &format!("/questions/{id}"), Some(patch)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["text"], "Is fire hot?");
    assert_eq!(body["data"]["options"], json!(["yes", "no"]));

    let (status, body) = call(&app, Method::GET, "/questions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = call(&app, Method::DELETE, &format!("/questions/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id);

    let (status, body) = call(&app, Method::GET, &format!("/questions/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Question not found.");
}

#[tokio::test(flavor = "current_thread")]
async fn bad_input_maps_to_client_errors() {
    let app = app();

    let (status, body) = call(&app, Method::GET, "/quizzes/not-an-id", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid quizId");

    let (status, body) = call(&app, Method::DELETE, "/questions/xyz", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Invalid questionId");

    let out_of_range = json!({ "text": "?", "options": ["a", "b"], "correctAnswerIndex": 5 });
    let (status, body) = call(&app, Method::POST, "/questions", Some(out_of_range)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "correctAnswerIndex must be a valid index in options array.");

    let (status, _) = call(&app, Method::POST, "/questions", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, Method::PUT, "/quizzes/1", Some(json!({ "questions": "nope" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, Method::GET, "/users", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, Method::PATCH, "/quizzes", None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test(flavor = "current_thread")]
async fn oversized_bodies_are_rejected() {
    let app = app();
    let huge = "x".repeat(super::MAX_BODY_SIZE + 1);
    let (status, body) = call(&app, Method::POST, "/questions", Some(question(&huge))).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["success"], false);
}

#[tokio::test(flavor = "current_thread")]
async fn attach_and_cascade_through_http() {
    let app = app();

    let (status, body) = call(&app, Method::POST, "/quizzes", Some(json!({ "title": "Geography" }))).await;
    assert_eq!(status, StatusCode::CREATED);
    let quiz = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["questions"], json!([]));

    let capital = question("What is the capital of France?");
    let (status, body) = call(&app, Method::POST, &format!("/quizzes/{quiz}/question"), Some(capital)).await;
    assert_eq!(status, StatusCode::CREATED);
    let first = body["data"]["question"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["quiz"]["questions"][0]["id"], first);

    let batch = json!([question("2+2?"), question("Largest ocean?")]);
    let (status, body) = call(&app, Method::POST, &format!("/quizzes/{quiz}/questions"), Some(batch)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["created"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["quiz"]["questions"].as_array().unwrap().len(), 3);

    let (status, body) = call(&app, Method::GET, &format!("/quizzes/{quiz}/populate"), None).await;
    assert_eq!(status, StatusCode::OK);
    let filtered = body["data"]["questions"].as_array().unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["id"], first);

    let (status, body) = call(&app, Method::GET, &format!("/quizzes/{quiz}/populate?term=ocean"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["questions"][0]["text"], "Largest ocean?");

    let (status, body) = call(&app, Method::DELETE, &format!("/quizzes/{quiz}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["removedQuestions"].as_array().unwrap().len(), 3);
    assert!(body["message"].is_string());

    let (status, body) = call(&app, Method::GET, "/questions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test(flavor = "current_thread")]
async fn failed_attach_reports_not_found_without_leftovers() {
    let app = app();

    let (status, body) = call(&app, Method::POST, "/quizzes/77/question", Some(question("Orphan?"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Quiz not found.");

    let batch = json!([question("A?"), question("B?")]);
    let (status, _) = call(&app, Method::POST, "/quizzes/77/questions", Some(batch)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(&app, Method::POST, "/quizzes/77/questions", Some(json!({ "text": "x" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Body must be a non-empty array.");

    let (status, _) = call(&app, Method::POST, "/quizzes/77/questions", Some(json!([]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = call(&app, Method::GET, "/questions", None).await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test(flavor = "current_thread")]
async fn service_endpoints_and_preflight() {
    let app = app();

    let (status, body) = call(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["service"], "SimpleQuiz API");

    let (status, body) = call(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "healthy");
    assert!(body["data"]["timestamp"].as_str().unwrap().ends_with('Z'));

    let (status, body) = call(&app, Method::OPTIONS, "/quizzes/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::Null);
}

#[tokio::test(flavor = "current_thread")]
async fn concurrent_modification_maps_to_conflict() {
    let app = App::from(Consistency::new(Box::<Racing>::default(), Config::default()));

    let (_, body) = call(&app, Method::POST, "/questions", Some(question("Old?"))).await;
    let id = body["data"]["id"].as_i64().unwrap();
    let (status, body) = call(&app, Method::PUT, &format!("/questions/{id}"), Some(json!({ "text": "New?" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Question was modified by another request. Please retry.");

    let (_, body) = call(&app, Method::POST, "/quizzes", Some(json!({ "title": "Old" }))).await;
    let id = body["data"]["id"].as_i64().unwrap();
    let (status, body) = call(&app, Method::PUT, &format!("/quizzes/{id}"), Some(json!({ "title": "New" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Quiz was modified by another request. Please retry.");
}

#[tokio::test(flavor = "current_thread")]
async fn null_description_clears_it() {
    let app = app();

    let (_, body) = call(&app, Method::POST, "/quizzes", Some(json!({ "title": "T", "description": "D" }))).await;
    let id = body["data"]["id"].as_i64().unwrap();
    assert_eq!(body["data"]["description"], "D");

    let (status, body) = call(&app, Method::PUT, &format!("/quizzes/{id}"), Some(json!({ "title": "U" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["description"], "D");

    let (status, body) = call(&app, Method::PUT, &format!("/quizzes/{id}"), Some(json!({ "description": null }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "U");
    assert!(body["data"].get("description").is_none());
}

#[tokio::test(flavor = "current_thread")]
async fn whole_float_answer_index_is_accepted() {
    let app = app();

    let payload = json!({ "text": "Pick", "options": ["a", "b"], "correctAnswerIndex": 1.0 });
    let (status, body) = call(&app, Method::POST, "/questions", Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["correctAnswerIndex"], 1);

    let payload = json!({ "text": "Pick", "options": ["a", "b"], "correctAnswerIndex": 0.5 });
    let (status, body) = call(&app, Method::POST, "/questions", Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "correctAnswerIndex must be a valid index in options array.");
}

#[tokio::test(flavor = "current_thread")]
async fn info_and_debug_endpoints() {
    let app = app();

    let req =
        Request::builder().uri("/api/info").header(HOST, "quiz.local:3000").body(Full::new(Bytes::new())).unwrap();
    let res = app.try_respond(req).await;
    assert_eq!(res.status(), StatusCode::OK);
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["data"]["baseUrl"], "http://quiz.local:3000");
    assert_eq!(body["data"]["endpoints"]["quizzes"]["addQuestions"], "POST /quizzes/:id/questions");
    assert_eq!(body["data"]["cors"]["origin"], "*");

    call(&app, Method::POST, "/questions", Some(question("One?"))).await;
    call(&app, Method::POST, "/questions", Some(question("Two?"))).await;
    let (status, body) = call(&app, Method::GET, "/debug/questions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 2);
    assert_eq!(body["data"]["questions"].as_array().unwrap().len(), 2);
    assert_eq!(body["message"], "Found 2 questions");
}
