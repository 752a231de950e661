//! In-process store used for local runs and tests. Each operation touches the
//! maps exactly once per record, so a failed call leaves nothing half-written.

use crate::{error, Store};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use model::{Id, NewQuestion, NewQuiz, Question, Quiz};
use std::{
    collections::HashSet,
    sync::atomic::{AtomicI64, Ordering},
};

#[derive(Default)]
pub struct Memory {
    questions: DashMap<Id, Question>,
    quizzes: DashMap<Id, Quiz>,
    last_question: AtomicI64,
    last_quiz: AtomicI64,
}

fn next_id(counter: &AtomicI64) -> error::Result<Id> {
    let raw = counter.fetch_add(1, Ordering::Relaxed) + 1;
    Id::new(raw).ok_or(error::Error::Fatal)
}

impl Memory {
    fn insert_question(&self, question: &NewQuestion) -> error::Result<Question> {
        let NewQuestion { text, options, correct_answer_index, keywords } = question.clone();
        let now = Utc::now();
        let question = Question {
            id: next_id(&self.last_question)?,
            text,
            options,
            correct_answer_index,
            keywords,
            created_at: now,
            updated_at: now,
            version: 1,
        };
        assert!(self.questions.insert(question.id, question.clone()).is_none());
        Ok(question)
    }
}

#[async_trait]
impl Store for Memory {
    async fn create_question(&self, question: &NewQuestion) -> error::Result<Question> {
        self.insert_question(question)
    }

    async fn create_questions(&self, batch: &[NewQuestion]) -> error::Result<Vec<Question>> {
        batch.iter().map(|question| self.insert_question(question)).collect()
    }

    async fn get_question(&self, id: Id) -> error::Result<Question> {
        self.questions.get(&id).map(|entry| entry.clone()).ok_or(error::Error::NotFound)
    }

    async fn get_questions(&self) -> error::Result<Vec<Question>> {
        let mut questions: Vec<_> = self.questions.iter().map(|entry| entry.clone()).collect();
        questions.sort_unstable_by_key(|question| question.id);
        Ok(questions)
    }

    async fn find_questions(&self, ids: &[Id]) -> error::Result<Vec<Question>> {
        let unique: HashSet<_> = ids.iter().copied().collect();
        Ok(unique.into_iter().filter_map(|id| self.questions.get(&id).map(|entry| entry.clone())).collect())
    }

    async fn set_question(&self, id: Id, version: i32, question: &NewQuestion) -> error::Result<Question> {
        let mut entry = self.questions.get_mut(&id).ok_or(error::Error::NotFound)?;
        if entry.version != version {
            return Err(error::Error::Conflict);
        }

        let NewQuestion { text, options, correct_answer_index, keywords } = question.clone();
        entry.text = text;
        entry.options = options;
        entry.correct_answer_index = correct_answer_index;
        entry.keywords = keywords;
        entry.updated_at = Utc::now();
        entry.version += 1;
        Ok(entry.clone())
    }

    async fn delete_question(&self, id: Id) -> error::Result<()> {
        self.questions.remove(&id).map(drop).ok_or(error::Error::NotFound)
    }

    async fn delete_questions(&self, ids: &[Id]) -> error::Result<u64> {
        let unique: HashSet<_> = ids.iter().copied().collect();
        Ok(unique.into_iter().filter(|id| self.questions.remove(id).is_some()).count() as u64)
    }

    async fn pull_question(&self, id: Id) -> error::Result<u64> {
        let mut touched = 0;
        for mut quiz in self.quizzes.iter_mut() {
            if !quiz.questions.contains(&id) {
                continue;
            }
            quiz.questions.retain(|&other| other != id);
            quiz.updated_at = Utc::now();
            quiz.version += 1;
            touched += 1;
        }
        Ok(touched)
    }

    async fn create_quiz(&self, quiz: &NewQuiz) -> error::Result<Quiz> {
        let NewQuiz { title, description, questions } = quiz.clone();
        let now = Utc::now();
        let quiz = Quiz {
            id: next_id(&self.last_quiz)?,
            title,
            description,
            questions,
            created_at: now,
            updated_at: now,
            version: 1,
        };
        assert!(self.quizzes.insert(quiz.id, quiz.clone()).is_none());
        Ok(quiz)
    }

    async fn get_quiz(&self, id: Id) -> error::Result<Quiz> {
        self.quizzes.get(&id).map(|entry| entry.clone()).ok_or(error::Error::NotFound)
    }

    async fn get_quizzes(&self) -> error::Result<Vec<Quiz>> {
        let mut quizzes: Vec<_> = self.quizzes.iter().map(|entry| entry.clone()).collect();
        quizzes.sort_unstable_by_key(|quiz| quiz.id);
        Ok(quizzes)
    }

    async fn set_quiz(&self, id: Id, version: i32, quiz: &NewQuiz) -> error::Result<Quiz> {
        let mut entry = self.quizzes.get_mut(&id).ok_or(error::Error::NotFound)?;
        if entry.version != version {
            return Err(error::Error::Conflict);
        }

        let NewQuiz { title, description, questions } = quiz.clone();
        entry.title = title;
        entry.description = description;
        entry.questions = questions;
        entry.updated_at = Utc::now();
        entry.version += 1;
        Ok(entry.clone())
    }

    async fn delete_quiz(&self, id: Id) -> error::Result<Quiz> {
        self.quizzes.remove(&id).map(|(_, quiz)| quiz).ok_or(error::Error::NotFound)
    }

    async fn push_questions(&self, quiz: Id, ids: &[Id]) -> error::Result<Quiz> {
        let mut entry = self.quizzes.get_mut(&quiz).ok_or(error::Error::NotFound)?;
        entry.questions.extend_from_slice(ids);
        entry.updated_at = Utc::now();
        entry.version += 1;
        Ok(entry.clone())
    }

    async fn referenced_questions(&self, ids: &[Id]) -> error::Result<Vec<Id>> {
        let wanted: HashSet<_> = ids.iter().copied().collect();
        let mut found = HashSet::new();
        for quiz in self.quizzes.iter() {
            found.extend(quiz.questions.iter().copied().filter(|id| wanted.contains(id)));
        }
        Ok(found.into_iter().collect())
    }
}
