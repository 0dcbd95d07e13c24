//! Record persistence.
//!
//! # Data Flow
//! ```text
//! Resource handler
//!     → RecordStore::create / all / find / update / delete
//!     → Record { id, ...fields }
//!     → forwarded to the encoder as the reply payload
//! ```
//!
//! # Design Decisions
//! - Trait seam so handlers do not care how records are kept
//! - Ids are assigned by the store, start at 1 and are never reused
//! - `id` inside submitted fields is ignored

pub mod memory;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use memory::MemoryStore;

/// Arbitrary record attributes.
pub type Fields = Map<String, Value>;

/// A stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    #[serde(flatten)]
    pub fields: Fields,
}

/// Persistence collaborator used by resource handlers.
pub trait RecordStore: Send + Sync + std::fmt::Debug {
    /// Store a new record and return it with its id.
    fn create(&self, fields: Fields) -> Record;

    /// All records, ordered by id.
    fn all(&self) -> Vec<Record>;

    fn find(&self, id: u64) -> Option<Record>;

    /// Merge `fields` into an existing record.
    fn update(&self, id: u64, fields: Fields) -> Option<Record>;

    fn delete(&self, id: u64) -> Option<Record>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
