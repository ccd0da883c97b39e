//! Call envelope and method dispatch over dtjson.
//!
//! A browser client invokes a server method by sending a dtjson-encoded
//! envelope:
//!
//! ```json
//! {"method": "add_item", "args": ["buy milk"], "kwargs": {"due": {"__type__": "datetime", "isoformat": "..."}}}
//! ```
//!
//! The server side ([`Dispatcher`]) decodes the envelope, runs the named
//! method if (and only if) it was registered, and encodes the result. The
//! client side ([`interpret_reply`]) turns the status code and body of the
//! reply back into a [`Document`] or a typed [`RpcError::Server`].
//!
//! Transport is left to the host: this module only sees bodies and status
//! codes.
//!
//! # Example
//! ```
//! use dtjson_core::rpc::{interpret_reply, CallRequest, Dispatcher};
//! use dtjson_core::Document;
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.register("echo", |args, _kwargs| Ok(Document::Sequence(args.to_vec())));
//!
//! let body = CallRequest::new("echo").arg("hi").encode().unwrap();
//! let reply = dispatcher.respond(&body);
//! assert_eq!(reply.status, 200);
//!
//! let result = interpret_reply(reply.status, &reply.body).unwrap();
//! assert_eq!(result, Document::from(vec!["hi"]));
//! ```

use crate::decoder::decode;
use crate::encoder::encode;
use crate::error::DtJsonError;
use crate::types::{Document, Mapping};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

pub const METHOD_KEY: &str = "method";
pub const ARGS_KEY: &str = "args";
pub const KWARGS_KEY: &str = "kwargs";
/// Field of a 500 reply body carrying the error text.
pub const MESSAGE_KEY: &str = "message";

const GENERIC_SERVER_ERROR: &str = "Server Error";

/// Errors raised while dispatching or interpreting a call.
#[derive(Error, Debug)]
pub enum RpcError {
    /// The envelope had no string `method` field.
    #[error("call envelope has no method name")]
    MissingMethod,

    /// The method is not registered with the dispatcher.
    #[error("method not found: {0}")]
    MethodNotFound(String),

    /// The envelope decoded but has the wrong shape.
    #[error("bad call envelope: {0}")]
    BadRequest(String),

    /// The method ran and reported a failure.
    #[error("{0}")]
    Handler(String),

    /// Client side: the server answered with a non-2xx status.
    #[error("{message}")]
    Server { code: u16, message: String },

    /// The envelope or the result could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] DtJsonError),
}

impl RpcError {
    /// HTTP-style status code a server should reply with for this error.
    pub fn status(&self) -> u16 {
        match self {
            RpcError::MissingMethod | RpcError::MethodNotFound(_) => 404,
            RpcError::Server { code, .. } => *code,
            RpcError::BadRequest(_) | RpcError::Handler(_) | RpcError::Codec(_) => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, RpcError>;

/// A method invocation: name, positional arguments and keyword arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallRequest {
    pub method: String,
    pub args: Vec<Document>,
    pub kwargs: Mapping,
}

impl CallRequest {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..Self::default()
        }
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Document>) -> Self {
        self.args.push(value.into());
        self
    }

    /// Set a keyword argument, replacing any previous value for `name`.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Document>) -> Self {
        self.kwargs.insert(name.into(), value.into());
        self
    }

    pub fn to_document(&self) -> Document {
        let mut map = Mapping::with_capacity(3);
        map.insert(METHOD_KEY.to_string(), Document::String(self.method.clone()));
        map.insert(ARGS_KEY.to_string(), Document::Sequence(self.args.clone()));
        map.insert(KWARGS_KEY.to_string(), Document::Mapping(self.kwargs.clone()));
        Document::Mapping(map)
    }

    /// Encode the envelope as a request body.
    pub fn encode(&self) -> Result<String> {
        Ok(encode(&self.to_document())?)
    }

    /// Validate a decoded envelope. `method` must be a string, `args` a
    /// sequence and `kwargs` a mapping; all three are required.
    pub fn from_document(doc: Document) -> Result<Self> {
        let Document::Mapping(mut map) = doc else {
            return Err(RpcError::BadRequest("envelope must be a mapping".to_string()));
        };
        let method = match map.shift_remove(METHOD_KEY) {
            Some(Document::String(method)) => method,
            _ => return Err(RpcError::MissingMethod),
        };
        let args = match map.shift_remove(ARGS_KEY) {
            Some(Document::Sequence(args)) => args,
            Some(_) => return Err(RpcError::BadRequest(format!("{ARGS_KEY} must be a sequence"))),
            None => return Err(RpcError::BadRequest(format!("missing {ARGS_KEY}"))),
        };
        let kwargs = match map.shift_remove(KWARGS_KEY) {
            Some(Document::Mapping(kwargs)) => kwargs,
            Some(_) => return Err(RpcError::BadRequest(format!("{KWARGS_KEY} must be a mapping"))),
            None => return Err(RpcError::BadRequest(format!("missing {KWARGS_KEY}"))),
        };
        Ok(Self {
            method,
            args,
            kwargs,
        })
    }

    /// Decode and validate a request body.
    pub fn parse(body: &str) -> Result<Self> {
        Self::from_document(decode(body)?)
    }
}

/// A server method: positional and keyword arguments in, a document or an
/// error message out.
pub type Handler =
    Box<dyn Fn(&[Document], &Mapping) -> std::result::Result<Document, String> + Send + Sync>;

/// Registry of callable methods. Anything not registered is not callable.
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<String, Handler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expose `handler` under `name`, replacing an earlier registration.
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        F: Fn(&[Document], &Mapping) -> std::result::Result<Document, String>
            + Send
            + Sync
            + 'static,
    {
        self.handlers.insert(name.into(), Box::new(handler));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Run a decoded call.
    pub fn call(&self, request: &CallRequest) -> Result<Document> {
        let handler = self
            .handlers
            .get(&request.method)
            .ok_or_else(|| RpcError::MethodNotFound(request.method.clone()))?;
        handler(&request.args, &request.kwargs).map_err(RpcError::Handler)
    }

    /// Decode a request body, run the call and encode its result.
    pub fn handle(&self, body: &str) -> Result<String> {
        let request = CallRequest::parse(body)?;
        let result = self.call(&request)?;
        Ok(encode(&result)?)
    }

    /// Like [`handle`](Self::handle), but folds failures into a reply the
    /// host can send as-is.
    pub fn respond(&self, body: &str) -> Reply {
        match self.handle(body) {
            Ok(body) => Reply { status: 200, body },
            Err(err) => Reply::from_error(&err),
        }
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        methods.sort_unstable();
        f.debug_struct("Dispatcher").field("methods", &methods).finish()
    }
}

/// Status code and body to send back for a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    /// Error reply with a `{"message": ...}` body.
    pub fn from_error(err: &RpcError) -> Self {
        Reply {
            status: err.status(),
            body: json!({ MESSAGE_KEY: err.to_string() }).to_string(),
        }
    }
}

/// Client side: turn a reply into the call's result.
///
/// - 2xx: the body is decoded as dtjson.
/// - 500: [`RpcError::Server`] with the body's `message` field, or
///   `"Server Error"` when the body has none.
/// - anything else: [`RpcError::Server`] with `"Server Error: <status>"`.
pub fn interpret_reply(status: u16, body: &str) -> Result<Document> {
    match status {
        200..=299 => Ok(decode(body)?),
        500 => {
            let message = serde_json::from_str::<Value>(body)
                .ok()
                .and_then(|value| value.get(MESSAGE_KEY)?.as_str().map(str::to_string))
                .unwrap_or_else(|| GENERIC_SERVER_ERROR.to_string());
            Err(RpcError::Server { code: 500, message })
        }
        code => Err(RpcError::Server {
            code,
            message: format!("{GENERIC_SERVER_ERROR}: {code}"),
        }),
    }
}
