use crate::{error, Store};
use async_trait::async_trait;
use model::{Id, NewQuestion, NewQuiz, Question, Quiz};
use tokio_postgres::{Client, Row};

macro_rules! question_columns {
    () => {
        "id, text, options, correct_answer_index, keywords, created_at, updated_at, version"
    };
}

macro_rules! quiz_columns {
    () => {
        "id, title, description, questions, created_at, updated_at, version"
    };
}

const SCHEMA: &str = include_str!("schema.sql");

/// PostgreSQL-backed store. Quizzes keep their references in a `BIGINT[]`
/// column so that every consistency step is a single statement.
pub struct Database(Client);

impl From<Client> for Database {
    fn from(client: Client) -> Self {
        Self(client)
    }
}

fn to_id(raw: i64) -> error::Result<Id> {
    Id::new(raw).ok_or(error::Error::Fatal)
}

fn to_raw_ids(ids: &[Id]) -> Vec<i64> {
    ids.iter().copied().map(Id::get).collect()
}

fn to_raw_index(question: &NewQuestion) -> error::Result<i32> {
    i32::try_from(question.correct_answer_index).map_err(|_| error::Error::Fatal)
}

fn deserialize_question_from_row(row: &Row) -> error::Result<Question> {
    let index: i32 = row.try_get("correct_answer_index")?;
    Ok(Question {
        id: to_id(row.try_get("id")?)?,
        text: row.try_get("text")?,
        options: row.try_get("options")?,
        correct_answer_index: u32::try_from(index).map_err(|_| error::Error::Fatal)?,
        keywords: row.try_get("keywords")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        version: row.try_get("version")?,
    })
}

fn deserialize_quiz_from_row(row: &Row) -> error::Result<Quiz> {
    let questions: Vec<i64> = row.try_get("questions")?;
    Ok(Quiz {
        id: to_id(row.try_get("id")?)?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        questions: questions.into_iter().map(to_id).collect::<error::Result<_>>()?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        version: row.try_get("version")?,
    })
}

impl Database {
    /// Creates the tables and indices if they do not exist yet.
    pub async fn migrate(&self) -> error::Result<()> {
        self.0.batch_execute(SCHEMA).await?;
        Ok(())
    }

    /// Tells apart a missing record from a stale version after a guarded update matched nothing.
    async fn classify_miss(&self, table_probe: &str, id: Id) -> error::Result<error::Error> {
        let exists = self.0.query_opt(table_probe, &[&id.get()]).await?.is_some();
        Ok(if exists { error::Error::Conflict } else { error::Error::NotFound })
    }
}

#[async_trait]
impl Store for Database {
    async fn create_question(&self, question: &NewQuestion) -> error::Result<Question> {
        let index = to_raw_index(question)?;
        let row = self
            .0
            .query_one(
                concat!(
                    "INSERT INTO question (text, options, correct_answer_index, keywords) VALUES ($1, $2, $3, $4) RETURNING ",
                    question_columns!()
                ),
                &[&question.text, &question.options, &index, &question.keywords],
            )
            .await?;
        deserialize_question_from_row(&row)
    }

    async fn create_questions(&self, batch: &[NewQuestion]) -> error::Result<Vec<Question>> {
        // A single statement keeps the batch all-or-nothing without an explicit transaction.
        let payload = serde_json::to_value(batch).map_err(|_| error::Error::Fatal)?;
        let rows = self
            .0
            .query(
                concat!(
                    "INSERT INTO question (text, options, correct_answer_index, keywords) \
                     SELECT item->>'text', \
                            ARRAY(SELECT jsonb_array_elements_text(item->'options')), \
                            (item->>'correctAnswerIndex')::INT, \
                            ARRAY(SELECT jsonb_array_elements_text(item->'keywords')) \
                     FROM jsonb_array_elements($1::jsonb) WITH ORDINALITY AS batch(item, ord) \
                     ORDER BY ord \
                     RETURNING ",
                    question_columns!()
                ),
                &[&payload],
            )
            .await?;
        let mut created = rows.iter().map(deserialize_question_from_row).collect::<error::Result<Vec<_>>>()?;
        created.sort_unstable_by_key(|question| question.id);
        Ok(created)
    }

    async fn get_question(&self, id: Id) -> error::Result<Question> {
        let row = self
            .0
            .query_opt(concat!("SELECT ", question_columns!(), " FROM question WHERE id = $1"), &[&id.get()])
            .await?
            .ok_or(error::Error::NotFound)?;
        deserialize_question_from_row(&row)
    }

    async fn get_questions(&self) -> error::Result<Vec<Question>> {
        self.0
            .query(concat!("SELECT ", question_columns!(), " FROM question ORDER BY id"), &[])
            .await?
            .iter()
            .map(deserialize_question_from_row)
            .collect()
    }

    async fn find_questions(&self, ids: &[Id]) -> error::Result<Vec<Question>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw = to_raw_ids(ids);
        self.0
            .query(concat!("SELECT ", question_columns!(), " FROM question WHERE id = ANY($1)"), &[&raw])
            .await?
            .iter()
            .map(deserialize_question_from_row)
            .collect()
    }

    async fn set_question(&self, id: Id, version: i32, question: &NewQuestion) -> error::Result<Question> {
        let index = to_raw_index(question)?;
        let maybe_row = self
            .0
            .query_opt(
                concat!(
                    "UPDATE question SET text = $3, options = $4, correct_answer_index = $5, keywords = $6, \
                     updated_at = now(), version = version + 1 \
                     WHERE id = $1 AND version = $2 RETURNING ",
                    question_columns!()
                ),
                &[&id.get(), &version, &question.text, &question.options, &index, &question.keywords],
            )
            .await?;
        match maybe_row {
            Some(row) => deserialize_question_from_row(&row),
            None => Err(self.classify_miss("SELECT 1 FROM question WHERE id = $1", id).await?),
        }
    }

    async fn delete_question(&self, id: Id) -> error::Result<()> {
        match self.0.execute("DELETE FROM question WHERE id = $1", &[&id.get()]).await? {
            0 => Err(error::Error::NotFound),
            _ => Ok(()),
        }
    }

    async fn delete_questions(&self, ids: &[Id]) -> error::Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let raw = to_raw_ids(ids);
        Ok(self.0.execute("DELETE FROM question WHERE id = ANY($1)", &[&raw]).await?)
    }

    async fn pull_question(&self, id: Id) -> error::Result<u64> {
        Ok(self
            .0
            .execute(
                "UPDATE quiz SET questions = array_remove(questions, $1), updated_at = now(), version = version + 1 \
                 WHERE questions @> ARRAY[$1::BIGINT]",
                &[&id.get()],
            )
            .await?)
    }

    async fn create_quiz(&self, quiz: &NewQuiz) -> error::Result<Quiz> {
        let questions = to_raw_ids(&quiz.questions);
        let row = self
            .0
            .query_one(
                concat!("INSERT INTO quiz (title, description, questions) VALUES ($1, $2, $3) RETURNING ", quiz_columns!()),
                &[&quiz.title, &quiz.description, &questions],
            )
            .await?;
        deserialize_quiz_from_row(&row)
    }

    async fn get_quiz(&self, id: Id) -> error::Result<Quiz> {
        let row = self
            .0
            .query_opt(concat!("SELECT ", quiz_columns!(), " FROM quiz WHERE id = $1"), &[&id.get()])
            .await?
            .ok_or(error::Error::NotFound)?;
        deserialize_quiz_from_row(&row)
    }

    async fn get_quizzes(&self) -> error::Result<Vec<Quiz>> {
        self.0
            .query(concat!("SELECT ", quiz_columns!(), " FROM quiz ORDER BY id"), &[])
            .await?
            .iter()
            .map(deserialize_quiz_from_row)
            .collect()
    }

    async fn set_quiz(&self, id: Id, version: i32, quiz: &NewQuiz) -> error::Result<Quiz> {
        let questions = to_raw_ids(&quiz.questions);
        let maybe_row = self
            .0
            .query_opt(
                concat!(
                    "UPDATE quiz SET title = $3, description = $4, questions = $5, \
                     updated_at = now(), version = version + 1 \
                     WHERE id = $1 AND version = $2 RETURNING ",
                    quiz_columns!()
                ),
                &[&id.get(), &version, &quiz.title, &quiz.description, &questions],
            )
            .await?;
        match maybe_row {
            Some(row) => deserialize_quiz_from_row(&row),
            None => Err(self.classify_miss("SELECT 1 FROM quiz WHERE id = $1", id).await?),
        }
    }

    async fn delete_quiz(&self, id: Id) -> error::Result<Quiz> {
        let row = self
            .0
            .query_opt(concat!("DELETE FROM quiz WHERE id = $1 RETURNING ", quiz_columns!()), &[&id.get()])
            .await?
            .ok_or(error::Error::NotFound)?;
        deserialize_quiz_from_row(&row)
    }

    async fn push_questions(&self, quiz: Id, ids: &[Id]) -> error::Result<Quiz> {
        let raw = to_raw_ids(ids);
        let row = self
            .0
            .query_opt(
                concat!(
                    "UPDATE quiz SET questions = questions || $2::BIGINT[], updated_at = now(), version = version + 1 \
                     WHERE id = $1 RETURNING ",
                    quiz_columns!()
                ),
                &[&quiz.get(), &raw],
            )
            .await?
            .ok_or(error::Error::NotFound)?;
        deserialize_quiz_from_row(&row)
    }

    async fn referenced_questions(&self, ids: &[Id]) -> error::Result<Vec<Id>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw = to_raw_ids(ids);
        self.0
            .query(
                "SELECT DISTINCT referenced FROM quiz, unnest(quiz.questions) AS referenced WHERE referenced = ANY($1)",
                &[&raw],
            )
            .await?
            .iter()
            .map(|row| to_id(row.try_get("referenced")?))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Database, Store};
    use crate::{Config, NoTls};
    use model::{NewQuestion, NewQuiz};

    fn question(text: &str) -> NewQuestion {
        NewQuestion {
            text: text.into(),
            options: vec!["Yes".into(), "No".into()],
            correct_answer_index: 0,
            keywords: Vec::new(),
        }
    }

    #[tokio::test(flavor = "current_thread")]
    #[ignore = "requires a PostgreSQL instance configured through PG_* variables"]
    async fn database_test() {
        use std::env::var;
        let user = var("PG_USERNAME").unwrap();
        let pass = var("PG_PASSWORD").unwrap();
        let host = var("PG_HOSTNAME").unwrap();
        let data = var("PG_DATABASE").unwrap();

        let (client, conn) = Config::new()
            .user(&user)
            .password(&pass)
            .host(&host)
            .dbname(&data)
            .port(5432)
            .connect(NoTls)
            .await
            .expect("cannot connect to database");
        let handle = tokio::spawn(conn);
        let db = Database::from(client);
        db.migrate().await.unwrap();

        // Batch creation keeps the submitted order
        let batch = [question("First?"), question("Second?")];
        let created = db.create_questions(&batch).await.unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(created[0].text, "First?");
        assert_eq!(created[1].text, "Second?");
        let ids: Vec<_> = created.iter().map(|q| q.id).collect();

        // References are appended in one go
        let quiz = db
            .create_quiz(&NewQuiz { title: "Poll".into(), description: None, questions: vec![ids[0]] })
            .await
            .unwrap();
        let quiz = db.push_questions(quiz.id, &ids).await.unwrap();
        assert_eq!(quiz.questions, [ids[0], ids[0], ids[1]]);

        // Pull removes every occurrence
        assert_eq!(db.pull_question(ids[0]).await.unwrap(), 1);
        assert_eq!(db.get_quiz(quiz.id).await.unwrap().questions, [ids[1]]);

        // Stale versions are reported as conflicts
        let stale = db.set_quiz(quiz.id, quiz.version, &quiz.to_new()).await.unwrap_err();
        assert_eq!(stale, crate::error::Error::Conflict);

        let removed = db.delete_quiz(quiz.id).await.unwrap();
        assert_eq!(removed.questions, [ids[1]]);
        assert_eq!(db.delete_questions(&ids).await.unwrap(), 2);
        assert!(db.find_questions(&ids).await.unwrap().is_empty());

        drop(db);
        handle.await.unwrap().unwrap();
    }
}
