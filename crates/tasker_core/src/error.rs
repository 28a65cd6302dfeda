use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    Parse(String),
    NotFound(String),
    Constraint(String),
    InvalidInput(String),
    InvalidData(String),
    Io(String),
    RegenerationFailed(String),
}

impl AppError {
    /// Builds a parse error that echoes the rejected input.
    pub fn parse<W: fmt::Display, I: AsRef<str>>(what: W, input: I) -> Self {
        Self::Parse(format!("cannot parse {what}: '{}'", input.as_ref()))
    }

    pub fn not_found<M: Into<String>>(message: M) -> Self {
        Self::NotFound(message.into())
    }

    pub fn constraint<M: Into<String>>(message: M) -> Self {
        Self::Constraint(message.into())
    }

    pub fn invalid_input<M: Into<String>>(message: M) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn invalid_data<M: Into<String>>(message: M) -> Self {
        Self::InvalidData(message.into())
    }

    pub fn io<M: Into<String>>(message: M) -> Self {
        Self::Io(message.into())
    }

    pub fn regeneration_failed<M: Into<String>>(message: M) -> Self {
        Self::RegenerationFailed(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Parse(_) => "parse_error",
            Self::NotFound(_) => "not_found",
            Self::Constraint(_) => "constraint_violation",
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidData(_) => "invalid_data",
            Self::Io(_) => "io_error",
            Self::RegenerationFailed(_) => "regeneration_failed",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Parse(message) => message,
            Self::NotFound(message) => message,
            Self::Constraint(message) => message,
            Self::InvalidInput(message) => message,
            Self::InvalidData(message) => message,
            Self::Io(message) => message,
            Self::RegenerationFailed(message) => message,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.code(), self.message())
    }
}

impl std::error::Error for AppError {}
