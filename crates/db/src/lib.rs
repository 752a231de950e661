pub mod error;
pub mod memory;
mod postgres;

use async_trait::async_trait;
use model::{Id, NewQuestion, NewQuiz, Question, Quiz};

pub use memory::Memory;
pub use postgres::Database;
pub use tokio_postgres::{tls::NoTls, Client, Config};

/// Persistence for the question and quiz collections. Every method maps onto a
/// single storage call so that no caller ever observes a half-applied write.
///
/// Implementations do not check cross-collection references. Keeping those
/// consistent is the job of the caller.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_question(&self, question: &NewQuestion) -> error::Result<Question>;

    /// Inserts the whole batch or nothing at all.
    async fn create_questions(&self, batch: &[NewQuestion]) -> error::Result<Vec<Question>>;

    async fn get_question(&self, id: Id) -> error::Result<Question>;

    async fn get_questions(&self) -> error::Result<Vec<Question>>;

    /// Fetches the questions among `ids` that still exist, in no particular order.
    async fn find_questions(&self, ids: &[Id]) -> error::Result<Vec<Question>>;

    /// Overwrites the user-supplied fields of a question if it is still at `version`.
    async fn set_question(&self, id: Id, version: i32, question: &NewQuestion) -> error::Result<Question>;

    async fn delete_question(&self, id: Id) -> error::Result<()>;

    /// Returns the number of questions actually removed.
    async fn delete_questions(&self, ids: &[Id]) -> error::Result<u64>;

    /// Removes every occurrence of `id` from every quiz. Returns the number of quizzes touched.
    async fn pull_question(&self, id: Id) -> error::Result<u64>;

    async fn create_quiz(&self, quiz: &NewQuiz) -> error::Result<Quiz>;

    async fn get_quiz(&self, id: Id) -> error::Result<Quiz>;

    async fn get_quizzes(&self) -> error::Result<Vec<Quiz>>;

    /// Overwrites a quiz if it is still at `version`.
    async fn set_quiz(&self, id: Id, version: i32, quiz: &NewQuiz) -> error::Result<Quiz>;

    /// Deletes a quiz and hands back the removed record along with its references.
    async fn delete_quiz(&self, id: Id) -> error::Result<Quiz>;

    /// Appends `ids` to the reference list of the quiz.
    async fn push_questions(&self, quiz: Id, ids: &[Id]) -> error::Result<Quiz>;

    /// Returns the subset of `ids` that is still referenced by at least one quiz.
    async fn referenced_questions(&self, ids: &[Id]) -> error::Result<Vec<Id>>;
}
