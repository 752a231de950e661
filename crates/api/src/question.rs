use crate::{
    error::Result,
    reply::{self, Reply},
};
use hyper::StatusCode;
use model::{Id, QuestionPatch};
use serde::Serialize;
use serde_json::json;
use service::Consistency;

#[derive(Serialize)]
struct Deleted {
    id: Id,
}

pub async fn list(service: &Consistency) -> Result<Reply> {
    let questions = service.list_questions().await?;
    Ok(reply::success(StatusCode::OK, questions))
}

/// Lists every question along with a count, for frontend debugging.
pub async fn debug(service: &Consistency) -> Result<Reply> {
    let questions = service.list_questions().await?;
    let message = format!("Found {} questions", questions.len());
    let data = json!({ "count": questions.len(), "questions": questions });
    Ok(reply::success_with_message(StatusCode::OK, data, &message))
}

pub async fn create(service: &Consistency, payload: QuestionPatch) -> Result<Reply> {
    let question = service.create_question(payload).await?;
    Ok(reply::success(StatusCode::CREATED, question))
}

pub async fn get(service: &Consistency, id: Id) -> Result<Reply> {
    let question = service.get_question(id).await?;
    Ok(reply::success(StatusCode::OK, question))
}

pub async fn update(service: &Consistency, id: Id, patch: QuestionPatch) -> Result<Reply> {
    let question = service.update_question(id, patch).await?;
    Ok(reply::success(StatusCode::OK, question))
}

pub async fn delete(service: &Consistency, id: Id) -> Result<Reply> {
    service.delete_question(id).await?;
    Ok(reply::success(StatusCode::OK, Deleted { id }))
}
