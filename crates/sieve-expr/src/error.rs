use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExprError {
    /// The text is not a well-formed expression. Callers treat this as a
    /// configuration error.
    #[error("Syntax error in `{expression}` at offset {offset}: {message}")]
    Syntax {
        expression: String,
        offset: usize,
        message: String,
    },

    /// The expression parsed but could not be evaluated against the bindings
    /// it was given (type mismatch, division by zero, unknown method).
    #[error("Evaluation error in `{expression}`: {message}")]
    Evaluation { expression: String, message: String },
}

impl ExprError {
    pub fn is_syntax(&self) -> bool {
        matches!(self, ExprError::Syntax { .. })
    }
}
