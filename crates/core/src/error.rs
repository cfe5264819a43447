use thiserror::Error;

use crate::model::{MediaRefError, ParseIdError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    MediaRef(#[from] MediaRefError),
    #[error(transparent)]
    ParseId(#[from] ParseIdError),
}
