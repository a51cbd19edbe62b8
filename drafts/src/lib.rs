pub mod autosave;
pub mod error;
pub mod publish;
pub mod snapshot;
pub mod store;

pub use autosave::{Autosave, Draft, purge_stale};
pub use error::StoreError;
pub use publish::{PublishPayload, UploadResponse};
pub use snapshot::{PostKey, Snapshot};
pub use store::{DirStore, MemoryStore, SnapshotStore};
