use crate::error::Result;
use crate::model::{ObjectRow, WILDCARD_PRINCIPAL, WorkspaceRow};
use crate::store::WorkspaceStore;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct WorkspaceDoc {
    ws_id: i64,
    deleted: bool,
}

#[derive(Debug, Clone)]
struct AclDoc {
    principal: String,
    ws_id: i64,
}

#[derive(Debug, Clone)]
struct ObjectDoc {
    ws_id: i64,
    obj_id: i64,
    numver: i64,
    deleted: bool,
}

/// In-memory stand-in for the workspace collections.
///
/// Applies the same filters as the MongoDB queries: deleted workspaces and
/// objects are hidden, only wildcard ACLs are public, objects page in
/// `(ws, id)` order.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    workspaces: Vec<WorkspaceDoc>,
    acls: Vec<AclDoc>,
    objects: Vec<ObjectDoc>,
    versions: BTreeMap<(i64, i64, i64), String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workspace(mut self, ws_id: i64) -> Self {
        self.workspaces.push(WorkspaceDoc {
            ws_id,
            deleted: false,
        });
        self
    }

    pub fn with_deleted_workspace(mut self, ws_id: i64) -> Self {
        self.workspaces.push(WorkspaceDoc {
            ws_id,
            deleted: true,
        });
        self
    }

    /// Adds a workspace readable by everyone.
    pub fn with_public_workspace(self, ws_id: i64) -> Self {
        self.with_workspace(ws_id).with_acl(WILDCARD_PRINCIPAL, ws_id)
    }

    pub fn with_acl(mut self, principal: &str, ws_id: i64) -> Self {
        self.acls.push(AclDoc {
            principal: principal.to_string(),
            ws_id,
        });
        self
    }

    /// Adds an object whose versions carry `types` in order; the last one is current.
    pub fn with_object(mut self, ws_id: i64, obj_id: i64, types: &[&str]) -> Self {
        for (idx, type_string) in types.iter().enumerate() {
            self.versions
                .insert((ws_id, obj_id, idx as i64 + 1), type_string.to_string());
        }
        self.objects.push(ObjectDoc {
            ws_id,
            obj_id,
            numver: types.len() as i64,
            deleted: false,
        });
        self
    }

    pub fn with_deleted_object(mut self, ws_id: i64, obj_id: i64, type_string: &str) -> Self {
        self.versions
            .insert((ws_id, obj_id, 1), type_string.to_string());
        self.objects.push(ObjectDoc {
            ws_id,
            obj_id,
            numver: 1,
            deleted: true,
        });
        self
    }

    /// Drops one version record, leaving the object pointing at it.
    pub fn without_version(mut self, ws_id: i64, obj_id: i64, version: i64) -> Self {
        self.versions.remove(&(ws_id, obj_id, version));
        self
    }

    fn live_object_count(&self, ws_id: i64) -> i64 {
        self.objects
            .iter()
            .filter(|o| o.ws_id == ws_id && !o.deleted)
            .count() as i64
    }
}

impl WorkspaceStore for MemoryStore {
    fn live_workspaces(&self) -> Result<Vec<WorkspaceRow>> {
        Ok(self
            .workspaces
            .iter()
            .filter(|ws| !ws.deleted)
            .map(|ws| WorkspaceRow {
                ws_id: ws.ws_id,
                num_obj: self.live_object_count(ws.ws_id),
            })
            .collect())
    }

    fn public_workspace_ids(&self) -> Result<Vec<i64>> {
        Ok(self
            .acls
            .iter()
            .filter(|acl| acl.principal == WILDCARD_PRINCIPAL)
            .map(|acl| acl.ws_id)
            .collect())
    }

    fn count_live_objects(&self) -> Result<u64> {
        Ok(self.objects.iter().filter(|o| !o.deleted).count() as u64)
    }

    fn live_objects(&self, skip: u64, limit: u64) -> Result<Vec<ObjectRow>> {
        let mut rows: Vec<ObjectRow> = self
            .objects
            .iter()
            .filter(|o| !o.deleted)
            .map(|o| ObjectRow {
                ws_id: o.ws_id,
                obj_id: o.obj_id,
                numver: o.numver,
            })
            .collect();
        rows.sort();

        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(rows.into_iter().skip(skip).take(limit).collect())
    }

    fn object_version_type(
        &self,
        ws_id: i64,
        obj_id: i64,
        version: i64,
    ) -> Result<Option<String>> {
        Ok(self.versions.get(&(ws_id, obj_id, version)).cloned())
    }
}
