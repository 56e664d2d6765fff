use synapse_protocol::ActorId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("unable to resolve actor {0}")]
    UnresolvedActor(ActorId),

    #[error("Method {0} not found")]
    MethodNotFound(String),

    #[error("handler failed: {0}")]
    Handler(String),

    #[error("handler panicked: {0}")]
    HandlerPanic(String),

    #[error("actor {0} is already registered")]
    DuplicateActor(ActorId),

    #[error("reply dropped before the call settled")]
    ReplyDropped,

    #[error("reply value did not match the requested type")]
    ReplyTypeMismatch,

    #[error("actor system has been freed")]
    SystemFreed,

    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Settings(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
