use thiserror::Error;

#[derive(Debug, Error)]
pub enum GunError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0} has no absolute X/Y axes")]
    NotAGun(String),
    #[error("guns are not supported here: {0}")]
    Unsupported(String),
}
