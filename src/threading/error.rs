use rocket::http::Status;
use thiserror::Error;
use uuid::Uuid;

use super::model::ItemId;
use crate::store::StoreError;

pub type ThreadingResult<T> = Result<T, ThreadingError>;

#[derive(Debug, Error)]
pub enum ThreadingError {
    #[error("item identifier must not be empty")]
    InvalidItem,
    #[error("item {item} is already in a thread")]
    AlreadyThreaded { item: ItemId },
    #[error("item {item} is not in a thread")]
    NotThreaded { item: ItemId },
    #[error("thread {thread} was modified concurrently; retry the operation")]
    Conflict { thread: Uuid },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ThreadingError {
    pub fn status(&self) -> Status {
        match self {
            ThreadingError::InvalidItem => Status::BadRequest,
            ThreadingError::AlreadyThreaded { .. } | ThreadingError::Conflict { .. } => {
                Status::Conflict
            }
            ThreadingError::NotThreaded { .. } => Status::NotFound,
            ThreadingError::Store(_) => Status::InternalServerError,
        }
    }
}
