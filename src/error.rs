use crate::capture::CaptureError;
use crate::compositor::CropError;
use crate::export::EncodeError;

/// Operations invoked in a session phase that cannot serve them.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No confirmed selection to annotate or export")]
    NotAnnotating,

    #[error("No screen image has been captured")]
    NoSource,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Crop(#[from] CropError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

pub type Result<T> = std::result::Result<T, Error>;
