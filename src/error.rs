//! 错误类型

use crate::parser::template::TemplateError;
use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{tag} should not be a self-closing tag")]
    Syntax { tag: String },

    #[error("can't decode an empty document")]
    EmptyDocument,

    #[error("component {name} is not registered")]
    NotRegistered { name: String },

    #[error("{type_name} is not a valid component: {reason}")]
    InvalidComponent { type_name: String, reason: String },

    #[error("{type_name}.{field} can't be set from attribute {attr}=\"{value}\": {message}")]
    Value {
        field: String,
        type_name: String,
        attr: String,
        value: String,
        message: String,
    },

    #[error("fail to execute render from {type_name}")]
    Render {
        type_name: String,
        #[source]
        source: TemplateError,
    },

    #[error("fail to decode render from {type_name}")]
    Decode {
        type_name: String,
        #[source]
        source: Box<Error>,
    },

    #[error("fail to mount {name}")]
    Mount {
        name: String,
        #[source]
        source: Box<Error>,
    },

    #[error("{type_name} is already mounted")]
    AlreadyMounted { type_name: String },

    #[error("no component with id {id} is mounted")]
    NotMounted { id: Uuid },

    #[error("{type_name} is not mounted")]
    Unmounted { type_name: String },

    #[error("env is not set")]
    MissingEnvironment,

    #[error("can't print component {name}")]
    UnresolvedComponent {
        name: String,
        #[source]
        source: Box<Error>,
    },

    #[error("{name} is nested deeper than {max_depth} levels")]
    TooDeep { name: String, max_depth: usize },

    #[error("{type_name} has no handler named {handler}")]
    UnknownHandler { type_name: String, handler: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// 包一层挂载上下文
    pub(crate) fn mount(name: &str, source: Error) -> Self {
        Error::Mount {
            name: name.to_string(),
            source: Box::new(source),
        }
    }

    /// 沿错误链找到最底层的错误
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::Decode { source, .. }
            | Error::Mount { source, .. }
            | Error::UnresolvedComponent { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
