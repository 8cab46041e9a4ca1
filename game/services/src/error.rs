use std::io;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("persistence I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed store record: {0}")]
    Corrupt(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
