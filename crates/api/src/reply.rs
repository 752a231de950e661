use hyper::{
    body::Bytes,
    header::{
        HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
        CONTENT_TYPE,
    },
    Response, StatusCode,
};
use http_body_util::Full;
use serde::Serialize;

pub type Reply = Response<Full<Bytes>>;

const APPLICATION_JSON: &str = "application/json";
const INTERNAL: &[u8] = br#"{"success":false,"message":"Internal Server Error"}"#;

/// The one response shape used by every endpoint.
#[derive(Serialize)]
struct Envelope<'m, T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'m str>,
}

fn finish(status: StatusCode, body: Full<Bytes>) -> Reply {
    let mut res = Response::new(body);
    *res.status_mut() = status;

    let head = res.headers_mut();
    assert!(head.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON)).is_none());
    assert!(head.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*")).is_none());
    assert!(head
        .insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"))
        .is_none());
    assert!(head
        .insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Origin, X-Requested-With, Content-Type, Accept, Authorization"),
        )
        .is_none());
    res
}

fn encode<T: Serialize>(status: StatusCode, envelope: &Envelope<T>) -> Reply {
    match serde_json::to_vec(envelope) {
        Ok(bytes) => finish(status, Full::new(bytes.into())),
        Err(err) => {
            log::error!("cannot serialize response: {err}");
            finish(StatusCode::INTERNAL_SERVER_ERROR, Full::new(Bytes::from_static(INTERNAL)))
        }
    }
}

pub fn success<T: Serialize>(status: StatusCode, data: T) -> Reply {
    encode(status, &Envelope { success: true, data: Some(data), message: None })
}

pub fn success_with_message<T: Serialize>(status: StatusCode, data: T, message: &str) -> Reply {
    encode(status, &Envelope { success: true, data: Some(data), message: Some(message) })
}

pub fn failure(status: StatusCode, message: &str) -> Reply {
    encode::<()>(status, &Envelope { success: false, data: None, message: Some(message) })
}

/// Empty response to CORS preflight requests.
pub fn preflight() -> Reply {
    finish(StatusCode::OK, Full::default())
}
