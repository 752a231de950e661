use crate::{error::Resource, Consistency, Error, Result};
use db::Store;
use model::{validate, Id, PopulatedQuiz, Question, QuestionPatch, Quiz};

/// Questions that were persisted on behalf of a quiz which has not accepted
/// them yet. Ownership passes to the quiz only once the append succeeds.
struct Pending<'s> {
    store: &'s dyn Store,
    created: Vec<Id>,
}

impl Pending<'_> {
    /// Commits on success. On failure, deletes exactly the captured questions and
    /// reports the original error no matter how the rollback went.
    async fn settle(self, outcome: Result<Quiz>) -> Result<Quiz> {
        let err = match outcome {
            Ok(quiz) => return Ok(quiz),
            Err(err) => err,
        };

        match self.store.delete_questions(&self.created).await {
            Ok(count) => log::warn!("rolled back {count} question(s) after a failed attach: {err}"),
            Err(rollback) => {
                log::error!("failed to roll back questions {:?} ({rollback}) after: {err}", self.created)
            }
        }

        Err(err)
    }
}

impl Consistency {
    async fn commit(&self, quiz: Id, pending: Pending<'_>) -> Result<PopulatedQuiz> {
        let outcome = self.store.push_questions(quiz, &pending.created).await.map_err(Error::store(Resource::Quiz));
        let updated = pending.settle(outcome).await?;
        log::debug!("quiz {quiz} now references {} question(s)", updated.questions.len());
        self.populate(updated).await
    }

    /// Creates a question and appends it to the quiz. The question is removed
    /// again if the quiz turns out to be missing.
    pub async fn attach_question(&self, quiz: Id, payload: QuestionPatch) -> Result<(Question, PopulatedQuiz)> {
        let new = payload.into_new()?;
        let question = self.store.create_question(&new).await.map_err(Error::store(Resource::Question))?;
        log::debug!("persisted question {} for quiz {quiz}", question.id);

        let pending = Pending { store: &*self.store, created: vec![question.id] };
        let populated = self.commit(quiz, pending).await?;
        Ok((question, populated))
    }

    /// Creates all questions in one batch and appends them to the quiz. Either
    /// every question ends up attached or none of them survives.
    pub async fn attach_questions(
        &self,
        quiz: Id,
        payloads: Vec<QuestionPatch>,
    ) -> Result<(Vec<Question>, PopulatedQuiz)> {
        validate::batch(&payloads)?;
        let batch = payloads.into_iter().map(QuestionPatch::into_new).collect::<validate::Result<Vec<_>>>()?;
        let created = self.store.create_questions(&batch).await.map_err(Error::store(Resource::Question))?;
        log::debug!("persisted {} question(s) for quiz {quiz}", created.len());

        let pending = Pending { store: &*self.store, created: created.iter().map(|question| question.id).collect() };
        let populated = self.commit(quiz, pending).await?;
        Ok((created, populated))
    }
}
