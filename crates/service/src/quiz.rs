use crate::{error::Resource, Consistency, Error, Result};
use model::{Id, PopulatedQuiz, Question, QuizPatch};

impl Consistency {
    /// Creates a quiz as-is. Referenced questions are not checked for existence.
    pub async fn create_quiz(&self, payload: QuizPatch) -> Result<PopulatedQuiz> {
        let quiz = payload.into_new()?;
        let created = self.store.create_quiz(&quiz).await.map_err(Error::store(Resource::Quiz))?;
        self.populate(created).await
    }

    pub async fn get_quiz(&self, id: Id) -> Result<PopulatedQuiz> {
        let quiz = self.store.get_quiz(id).await.map_err(Error::store(Resource::Quiz))?;
        self.populate(quiz).await
    }

    /// Like [`Self::get_quiz`], but only resolves the questions accepted by
    /// `predicate`. A quiz without any match is still returned.
    pub async fn get_quiz_filtered<F>(&self, id: Id, predicate: F) -> Result<PopulatedQuiz>
    where
        F: Fn(&Question) -> bool,
    {
        let quiz = self.store.get_quiz(id).await.map_err(Error::store(Resource::Quiz))?;
        let lookup = self.lookup([&quiz], predicate).await?;
        Ok(quiz.populate_with(|id| lookup.get(&id).cloned()))
    }

    pub async fn list_quizzes(&self) -> Result<Vec<PopulatedQuiz>> {
        let quizzes = self.store.get_quizzes().await.map_err(Error::store(Resource::Quiz))?;
        let lookup = self.lookup(&quizzes, |_| true).await?;
        Ok(quizzes.into_iter().map(|quiz| quiz.populate_with(|id| lookup.get(&id).cloned())).collect())
    }

    /// Merges the provided fields into the stored quiz. A provided question list
    /// replaces the old one entirely.
    pub async fn update_quiz(&self, id: Id, patch: QuizPatch) -> Result<PopulatedQuiz> {
        let current = self.store.get_quiz(id).await.map_err(Error::store(Resource::Quiz))?;
        let merged = patch.merge_into(current.to_new())?;
        let updated = self.store.set_quiz(id, current.version, &merged).await.map_err(Error::store(Resource::Quiz))?;
        self.populate(updated).await
    }

    /// Deletes the quiz and then the questions it referenced. Returns the ids of
    /// the questions that were removed.
    ///
    /// Unless [`Config::cascade_shared_questions`](crate::Config) is disabled,
    /// questions shared with other quizzes are deleted as well.
    pub async fn delete_quiz(&self, id: Id) -> Result<Vec<Id>> {
        // The delete hands back the record, which captures the references.
        let removed = self.store.delete_quiz(id).await.map_err(Error::store(Resource::Quiz))?;

        let mut captured = Vec::with_capacity(removed.questions.len());
        for question in removed.questions {
            if !captured.contains(&question) {
                captured.push(question);
            }
        }

        if !self.config.cascade_shared_questions {
            let shared = self.store.referenced_questions(&captured).await.map_err(|err| {
                log::error!("quiz {id} was deleted but its questions could not be checked for sharing: {err}");
                Error::Internal
            })?;
            captured.retain(|question| !shared.contains(question));
        }

        if captured.is_empty() {
            log::info!("deleted quiz {id} without any questions to cascade");
            return Ok(captured);
        }

        let count = self.store.delete_questions(&captured).await.map_err(|err| {
            log::error!("quiz {id} was deleted but its questions {captured:?} were not: {err}");
            Error::Internal
        })?;
        log::info!("deleted quiz {id} along with {count} question(s)");
        Ok(captured)
    }
}
