use crate::{
    error::{Error, Result},
    reply::{self, Reply},
};
use hyper::StatusCode;
use model::{validate::Invalid, Id, PopulatedQuiz, Question, QuestionPatch, QuizPatch};
use serde::Serialize;
use serde_json::Value;
use service::{Consistency, Term};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Deleted {
    id: Id,
    removed_questions: Vec<Id>,
}

#[derive(Serialize)]
struct AttachedOne {
    question: Question,
    quiz: PopulatedQuiz,
}

#[derive(Serialize)]
struct AttachedMany {
    created: Vec<Question>,
    quiz: PopulatedQuiz,
}

pub async fn list(service: &Consistency) -> Result<Reply> {
    let quizzes = service.list_quizzes().await?;
    Ok(reply::success(StatusCode::OK, quizzes))
}

pub async fn create(service: &Consistency, payload: QuizPatch) -> Result<Reply> {
    let quiz = service.create_quiz(payload).await?;
    Ok(reply::success(StatusCode::CREATED, quiz))
}

pub async fn get(service: &Consistency, id: Id) -> Result<Reply> {
    let quiz = service.get_quiz(id).await?;
    Ok(reply::success(StatusCode::OK, quiz))
}

pub async fn update(service: &Consistency, id: Id, patch: QuizPatch) -> Result<Reply> {
    let quiz = service.update_quiz(id, patch).await?;
    Ok(reply::success(StatusCode::OK, quiz))
}

pub async fn delete(service: &Consistency, id: Id) -> Result<Reply> {
    let removed_questions = service.delete_quiz(id).await?;
    let message = if service.config().cascade_shared_questions {
        "Quiz and all its referenced questions have been deleted."
    } else {
        "Quiz and the questions no other quiz references have been deleted."
    };
    Ok(reply::success_with_message(StatusCode::OK, Deleted { id, removed_questions }, message))
}

pub async fn populate(service: &Consistency, id: Id, term: Option<&str>) -> Result<Reply> {
    let term = match term {
        Some(term) if !term.is_empty() => Term::new(term),
        _ => Term::default(),
    };
    let quiz = service.get_quiz_filtered(id, |question| term.matches(question)).await?;
    Ok(reply::success(StatusCode::OK, quiz))
}

pub async fn attach_one(service: &Consistency, id: Id, payload: QuestionPatch) -> Result<Reply> {
    let (question, quiz) = service.attach_question(id, payload).await?;
    Ok(reply::success(StatusCode::CREATED, AttachedOne { question, quiz }))
}

/// Anything other than a JSON array is rejected the same way as an empty one.
pub async fn attach_many(service: &Consistency, id: Id, body: Value) -> Result<Reply> {
    if !body.is_array() {
        return Err(Invalid::EmptyBatch.into());
    }
    let payloads: Vec<QuestionPatch> = serde_json::from_value(body).map_err(|_| Error::MalformedBody)?;
    let (created, quiz) = service.attach_questions(id, payloads).await?;
    Ok(reply::success(StatusCode::CREATED, AttachedMany { created, quiz }))
}
