#![forbid(unsafe_code)]

pub mod memory;
pub mod repository;
pub mod snapshot;

pub use memory::InMemoryRepository;
pub use repository::{Collection, Storage, StorageError};
pub use snapshot::CourseSnapshot;
