use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(PartialEq, Eq, Error, Debug, Clone)]
pub enum Error {
    /// The user or output target cancelled a print job.
    #[error("cancelled")]
    Cancelled,

    /// A paginated session was driven out of order.
    #[error("session")]
    Session(String),

    /// Writing to the output target failed.
    #[error("io")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
