use thiserror::Error;

/// Schema-authoring mistakes. These surface when rules are bound (or on the
/// first use of a message template) and are never expected at steady state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Unknown constraint `{name}` declared on {site}")]
    UnknownConstraint { name: String, site: String },

    #[error("Constraint `{constraint}` cannot be applied to type `{ty}` at {site}")]
    IncompatibleType {
        constraint: String,
        ty: String,
        site: String,
    },

    #[error("Constraint `{constraint}` at {site} requires argument `{argument}`")]
    MissingArgument {
        constraint: String,
        argument: String,
        site: String,
    },

    #[error("Constraint `{constraint}` at {site} has no argument named `{argument}`")]
    UnknownArgument {
        constraint: String,
        argument: String,
        site: String,
    },

    #[error("Argument `{argument}` of constraint `{constraint}` at {site}: {reason}")]
    InvalidArgument {
        constraint: String,
        argument: String,
        site: String,
        reason: String,
    },

    #[error("Invalid pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid expression `{expression}`: {reason}")]
    InvalidExpression { expression: String, reason: String },

    #[error("Constraint `{0}` is already registered")]
    DuplicateConstraint(String),

    #[error("Type `{0}` is defined more than once")]
    DuplicateType(String),

    #[error("Unknown type `{name}` referenced from {site}")]
    UnknownType { name: String, site: String },

    #[error("Invalid type reference `{0}`")]
    InvalidTypeReference(String),

    #[error("Unknown field {0}")]
    UnknownField(String),
}

/// Everything that can abort a validation run. Constraint failures are not
/// errors; they are collected as values.
#[derive(Error, Debug)]
pub enum SieveError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Internal consistency error at {path}: {message}")]
    Internal { path: String, message: String },
}

impl SieveError {
    pub fn internal(path: impl ToString, message: impl Into<String>) -> Self {
        Self::Internal {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SieveError>;
