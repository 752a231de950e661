pub mod error;

mod question;
mod quiz;
mod reply;
mod route;

use error::{Error, Result};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use chrono::{SecondsFormat, Utc};
use hyper::{body::Body, header::HOST, http::request::Parts, Method, Request, StatusCode};
use route::Route;
use serde::de::DeserializeOwned;
use serde_json::json;
use service::Consistency;
use std::time::Instant;

pub use reply::Reply;

/// Upper bound on request bodies. Bulk attach payloads are the largest we expect.
const MAX_BODY_SIZE: usize = 1 << 20;

const SERVICE: &str = "SimpleQuiz API";

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Reads the whole body and parses it as JSON.
async fn read_json<B, T>(body: B) -> Result<T>
where
    B: Body,
    B::Error: Into<BoxError>,
    T: DeserializeOwned,
{
    let bytes = match Limited::new(body, MAX_BODY_SIZE).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => return Err(Error::TooLarge),
        Err(err) => {
            log::warn!("cannot read request body: {err}");
            return Err(Error::MalformedBody);
        }
    };
    serde_json::from_slice(&bytes).map_err(|_| Error::MalformedBody)
}

pub struct App {
    service: Consistency,
    started: Instant,
}

impl From<Consistency> for App {
    fn from(service: Consistency) -> Self {
        Self { service, started: Instant::now() }
    }
}

impl App {
    pub async fn try_respond<B>(&self, req: Request<B>) -> Reply
    where
        B: Body,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = req.into_parts();
        if parts.method == Method::OPTIONS {
            return reply::preflight();
        }

        let err = match self.dispatch(&parts, body).await {
            Ok(res) => return res,
            Err(err) => err,
        };

        let status = err.status();
        if status.is_server_error() {
            log::error!("{} {} failed: {err}", parts.method, parts.uri.path());
        } else {
            log::debug!("{} {} rejected with {status}: {err}", parts.method, parts.uri.path());
        }

        reply::failure(status, &err.to_string())
    }

    async fn dispatch<B>(&self, parts: &Parts, body: B) -> Result<Reply>
    where
        B: Body,
        B::Error: Into<BoxError>,
    {
        let service = &self.service;
        let uri = &parts.uri;
        match (Route::parse(uri.path())?, &parts.method) {
            (Route::Index, &Method::GET) => Ok(self.on_index()),
            (Route::Info, &Method::GET) => {
                let host = parts.headers.get(HOST).and_then(|host| host.to_str().ok());
                Ok(self.on_info(host))
            }
            (Route::Health, &Method::GET) => Ok(self.on_health()),
            (Route::DebugQuestions, &Method::GET) => question::debug(service).await,
            (Route::Questions, &Method::GET) => question::list(service).await,
            (Route::Questions, &Method::POST) => question::create(service, read_json(body).await?).await,
            (Route::Question(id), &Method::GET) => question::get(service, id).await,
            (Route::Question(id), &Method::PUT) => question::update(service, id, read_json(body).await?).await,
            (Route::Question(id), &Method::DELETE) => question::delete(service, id).await,
            (Route::Quizzes, &Method::GET) => quiz::list(service).await,
            (Route::Quizzes, &Method::POST) => quiz::create(service, read_json(body).await?).await,
            (Route::Quiz(id), &Method::GET) => quiz::get(service, id).await,
            (Route::Quiz(id), &Method::PUT) => quiz::update(service, id, read_json(body).await?).await,
            (Route::Quiz(id), &Method::DELETE) => quiz::delete(service, id).await,
            (Route::Populate(id), &Method::GET) => {
                let term = uri.query().and_then(|query| route::query_param(query, "term"));
                quiz::populate(service, id, term).await
            }
            (Route::AttachOne(id), &Method::POST) => quiz::attach_one(service, id, read_json(body).await?).await,
            (Route::AttachMany(id), &Method::POST) => quiz::attach_many(service, id, read_json(body).await?).await,
            _ => Err(Error::MethodNotAllowed),
        }
    }

    fn on_index(&self) -> Reply {
        let info = json!({
            "status": "ok",
            "service": SERVICE,
            "version": env!("CARGO_PKG_VERSION"),
            "endpoints": { "quizzes": "/quizzes", "questions": "/questions" },
        });
        reply::success(StatusCode::OK, info)
    }

    /// Full endpoint catalog. The base URL is echoed from the `Host` header.
    fn on_info(&self, host: Option<&str>) -> Reply {
        let info = json!({
            "service": SERVICE,
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Quiz and Question Management API",
            "baseUrl": host.map(|host| format!("http://{host}")),
            "endpoints": {
                "quizzes": {
                    "list": "GET /quizzes",
                    "create": "POST /quizzes",
                    "get": "GET /quizzes/:id",
                    "update": "PUT /quizzes/:id",
                    "delete": "DELETE /quizzes/:id",
                    "addQuestion": "POST /quizzes/:id/question",
                    "addQuestions": "POST /quizzes/:id/questions",
                    "populate": "GET /quizzes/:id/populate?term=capital",
                },
                "questions": {
                    "list": "GET /questions",
                    "create": "POST /questions",
                    "get": "GET /questions/:id",
                    "update": "PUT /questions/:id",
                    "delete": "DELETE /questions/:id",
                },
            },
            "cors": {
                "enabled": true,
                "origin": "*",
                "methods": ["GET", "POST", "PUT", "DELETE", "OPTIONS"],
                "headers": ["Content-Type", "Authorization"],
            },
        });
        reply::success(StatusCode::OK, info)
    }

    fn on_health(&self) -> Reply {
        let uptime = self.started.elapsed().as_secs();
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        reply::success(StatusCode::OK, json!({ "status": "healthy", "timestamp": timestamp, "uptime": uptime }))
    }
}

#[cfg(test)]
mod tests;
