use crate::{error::Resource, Consistency, Error, Result};
use model::{Id, Question, QuestionPatch};

impl Consistency {
    pub async fn create_question(&self, payload: QuestionPatch) -> Result<Question> {
        let question = payload.into_new()?;
        self.store.create_question(&question).await.map_err(Error::store(Resource::Question))
    }

    pub async fn get_question(&self, id: Id) -> Result<Question> {
        self.store.get_question(id).await.map_err(Error::store(Resource::Question))
    }

    pub async fn list_questions(&self) -> Result<Vec<Question>> {
        self.store.get_questions().await.map_err(Error::store(Resource::Question))
    }

    /// Merges the provided fields into the stored question. The answer index is
    /// re-validated against the merged options before anything is written.
    pub async fn update_question(&self, id: Id, patch: QuestionPatch) -> Result<Question> {
        let current = self.get_question(id).await?;
        let merged = patch.merge_into(current.to_new())?;
        self.store.set_question(id, current.version, &merged).await.map_err(Error::store(Resource::Question))
    }

    /// Deletes the question, then pulls it from every quiz in a single call.
    pub async fn delete_question(&self, id: Id) -> Result<()> {
        self.store.delete_question(id).await.map_err(Error::store(Resource::Question))?;
        let touched = self.store.pull_question(id).await.map_err(|err| {
            log::error!("question {id} was deleted but references to it remain: {err}");
            Error::Internal
        })?;
        log::info!("deleted question {id} and removed it from {touched} quiz(zes)");
        Ok(())
    }
}
