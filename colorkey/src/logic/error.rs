use super::sink::DecisionSink;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("{0}")]
    ImageLoad(#[from] chroma_key::Error),

    #[error("{0}")]
    Persistence(sqldb::Error),

    #[error("{0}")]
    Validation(String),
}

impl From<sqldb::Error> for SessionError {
    fn from(e: sqldb::Error) -> Self {
        match e {
            sqldb::Error::EmptyGroupName | sqldb::Error::InvalidTolerance(_) => {
                SessionError::Validation(e.to_string())
            }
            sqldb::Error::Sqlx(_) => SessionError::Persistence(e),
        }
    }
}

impl SessionError {
    pub fn validation(text: impl Into<String>) -> Self {
        SessionError::Validation(text.into())
    }

    /// Validation problems are warnings, everything else is an error
    pub fn report(&self, sink: &mut impl DecisionSink) {
        match self {
            SessionError::Validation(text) => sink.report_warning(text),
            SessionError::ImageLoad(_) => sink.report_error(&format!("Image error: {self}")),
            SessionError::Persistence(_) => sink.report_error(&format!("Catalog error: {self}")),
        }
    }
}
