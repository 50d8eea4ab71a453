pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::{MongoStore, MongoTarget};

use crate::error::Result;
use crate::model::{ObjectRow, WorkspaceRow};

pub const COL_WORKSPACES: &str = "workspaces";
pub const COL_ACLS: &str = "workspaceACLs";
pub const COL_OBJECTS: &str = "workspaceObjects";
pub const COL_VERSIONS: &str = "workspaceObjVersions";

/// Read-only view of the four collections the report is built from.
pub trait WorkspaceStore {
    /// Workspaces not flagged deleted.
    fn live_workspaces(&self) -> Result<Vec<WorkspaceRow>>;

    /// Workspace ids carrying a read grant for the wildcard principal.
    fn public_workspace_ids(&self) -> Result<Vec<i64>>;

    fn count_live_objects(&self) -> Result<u64>;

    /// One page of non-deleted objects in `(ws, id)` order.
    fn live_objects(&self, skip: u64, limit: u64) -> Result<Vec<ObjectRow>>;

    /// The `type` field of version `version` of the object, if that version exists.
    fn object_version_type(&self, ws_id: i64, obj_id: i64, version: i64)
    -> Result<Option<String>>;
}
