use crate::error::{Result, StatsError};
use crate::model::{ObjectRow, TypeString, TypeVersion, Visibility};
use crate::store::WorkspaceStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;
use tracing::{debug, info, trace, warn};

pub const DEFAULT_PAGE_SIZE: u64 = 10_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityCount {
    pub public: u64,
    pub private: u64,
}

impl VisibilityCount {
    pub fn add(&mut self, visibility: Visibility) {
        match visibility {
            Visibility::Public => self.public += 1,
            Visibility::Private => self.private += 1,
        }
    }

    pub fn merge(&mut self, other: &VisibilityCount) {
        self.public += other.public;
        self.private += other.private;
    }

    pub fn total(&self) -> u64 {
        self.public + self.private
    }
}

/// Public/private counters keyed by type name, then type version.
///
/// Counters appear on first use and are never dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeCounts {
    types: BTreeMap<String, BTreeMap<TypeVersion, VisibilityCount>>,
}

impl TypeCounts {
    pub fn record(&mut self, type_string: &TypeString, visibility: Visibility) {
        self.types
            .entry(type_string.name.clone())
            .or_default()
            .entry(type_string.version.clone())
            .or_default()
            .add(visibility);
    }

    pub fn get(&self, name: &str, version: &str) -> Option<VisibilityCount> {
        self.types
            .get(name)?
            .get(&TypeVersion::from(version))
            .copied()
    }

    /// Type names in order, each with its versions in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeMap<TypeVersion, VisibilityCount>)> {
        self.types
            .iter()
            .map(|(name, versions)| (name.as_str(), versions))
    }

    pub fn type_total(&self, name: &str) -> VisibilityCount {
        let mut total = VisibilityCount::default();
        if let Some(versions) = self.types.get(name) {
            for count in versions.values() {
                total.merge(count);
            }
        }
        total
    }

    pub fn grand_total(&self) -> VisibilityCount {
        let mut total = VisibilityCount::default();
        for versions in self.types.values() {
            for count in versions.values() {
                total.merge(count);
            }
        }
        total
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkspaceInfo {
    pub is_public: bool,
    pub num_obj: i64,
}

/// Visibility of every live workspace, taken once before the object scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkspaceSnapshot {
    workspaces: BTreeMap<i64, WorkspaceInfo>,
    /// Wildcard grants whose workspace was not in the snapshot.
    stale_acls: u64,
}

impl WorkspaceSnapshot {
    pub fn load<S: WorkspaceStore + ?Sized>(store: &S) -> Result<Self> {
        let mut snapshot = Self::default();
        for row in store.live_workspaces()? {
            snapshot.workspaces.insert(
                row.ws_id,
                WorkspaceInfo {
                    is_public: false,
                    num_obj: row.num_obj,
                },
            );
        }

        for ws_id in store.public_workspace_ids()? {
            match snapshot.workspaces.get_mut(&ws_id) {
                Some(info) => info.is_public = true,
                None => {
                    // deleted between the two queries
                    debug!(ws_id, "ignoring wildcard ACL of a workspace outside the snapshot");
                    snapshot.stale_acls += 1;
                }
            }
        }

        info!(
            workspaces = snapshot.workspaces.len(),
            public = snapshot.public_count(),
            "loaded workspace snapshot"
        );
        Ok(snapshot)
    }

    pub fn visibility(&self, ws_id: i64) -> Option<Visibility> {
        self.workspaces
            .get(&ws_id)
            .map(|info| Visibility::from_public(info.is_public))
    }

    pub fn public_count(&self) -> usize {
        self.workspaces.values().filter(|ws| ws.is_public).count()
    }

    pub fn len(&self) -> usize {
        self.workspaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty()
    }

    pub fn stale_acls(&self) -> u64 {
        self.stale_acls
    }

    pub fn summaries(&self) -> Vec<WorkspaceSummary> {
        self.workspaces
            .iter()
            .map(|(&ws_id, info)| WorkspaceSummary {
                ws_id,
                visibility: Visibility::from_public(info.is_public),
                num_obj: info.num_obj,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSummary {
    pub ws_id: i64,
    pub visibility: Visibility,
    pub num_obj: i64,
}

/// Objects whose workspace was missing from the snapshot; counted as private.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityGap {
    pub objects: u64,
    pub workspaces: BTreeSet<i64>,
}

impl VisibilityGap {
    fn record(&mut self, object: &ObjectRow) {
        if self.workspaces.insert(object.ws_id) {
            warn!(
                ws_id = object.ws_id,
                "workspace not in snapshot (deleted during scan?), counting its objects as private"
            );
        }
        self.objects += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.objects == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsReport {
    pub generated_at: DateTime<Utc>,
    pub page_size: u64,
    /// Live object count taken before the scan.
    pub expected_objects: u64,
    pub scanned_objects: u64,
    pub pages: u64,
    pub types: TypeCounts,
    pub workspaces: Vec<WorkspaceSummary>,
    pub visibility_gap: VisibilityGap,
    pub stale_acls: u64,
}

/// Builds a [`StatsReport`] from one pass over the store.
#[derive(Debug, Clone, Copy)]
pub struct StatsAggregator {
    page_size: u64,
}

impl Default for StatsAggregator {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl StatsAggregator {
    pub fn new(page_size: u64) -> Result<Self> {
        if page_size == 0 {
            return Err(StatsError::config(t!("errors.invalid_page_size")));
        }
        Ok(Self { page_size })
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Runs the whole scan. Any consistency error aborts it with nothing to report.
    pub fn run<S: WorkspaceStore + ?Sized>(&self, store: &S) -> Result<StatsReport> {
        let snapshot = WorkspaceSnapshot::load(store)?;

        let expected_objects = store.count_live_objects()?;
        info!("Total objects: {expected_objects}");

        let mut types = TypeCounts::default();
        let mut gap = VisibilityGap::default();
        let mut scanned_objects = 0u64;
        let mut pages = 0u64;
        let mut skip = 0u64;

        // Stop on an empty page rather than on the count: the store keeps changing.
        loop {
            info!("Skip: {skip}");
            let page = store.live_objects(skip, self.page_size)?;
            if page.is_empty() {
                break;
            }

            let started = Instant::now();
            for object in &page {
                self.classify(store, object, &snapshot, &mut types, &mut gap)?;
            }
            info!(
                objects = page.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "classified page"
            );

            scanned_objects += page.len() as u64;
            pages += 1;
            skip += self.page_size;
        }

        if scanned_objects != expected_objects {
            info!(
                expected_objects,
                scanned_objects, "object count changed while scanning"
            );
        }
        if !gap.is_empty() {
            warn!(
                objects = gap.objects,
                workspaces = gap.workspaces.len(),
                "objects in workspaces missing from the snapshot were counted as private"
            );
        }

        Ok(StatsReport {
            generated_at: Utc::now(),
            page_size: self.page_size,
            expected_objects,
            scanned_objects,
            pages,
            types,
            workspaces: snapshot.summaries(),
            visibility_gap: gap,
            stale_acls: snapshot.stale_acls(),
        })
    }

    fn classify<S: WorkspaceStore + ?Sized>(
        &self,
        store: &S,
        object: &ObjectRow,
        snapshot: &WorkspaceSnapshot,
        types: &mut TypeCounts,
        gap: &mut VisibilityGap,
    ) -> Result<()> {
        let raw = store
            .object_version_type(object.ws_id, object.obj_id, object.numver)?
            .ok_or(StatsError::MissingVersion {
                ws_id: object.ws_id,
                obj_id: object.obj_id,
                version: object.numver,
            })?;

        let type_string =
            TypeString::parse(&raw).ok_or_else(|| StatsError::MalformedType {
                ws_id: object.ws_id,
                obj_id: object.obj_id,
                version: object.numver,
                type_string: raw.clone(),
            })?;

        let visibility = match snapshot.visibility(object.ws_id) {
            Some(visibility) => visibility,
            None => {
                gap.record(object);
                Visibility::Private
            }
        };

        trace!(
            ws_id = object.ws_id,
            obj_id = object.obj_id,
            ver = object.numver,
            type_string = %raw,
            %visibility,
            "classified object"
        );
        types.record(&type_string, visibility);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn scenario_a() -> MemoryStore {
        MemoryStore::new()
            .with_public_workspace(1)
            .with_workspace(2)
            .with_object(1, 1, &["Genome-1"])
            .with_object(1, 2, &["Genome-1", "Genome-2"])
            .with_object(2, 1, &["Reads-1"])
    }

    #[test]
    fn test_new_rejects_zero_page_size() {
        let err = StatsAggregator::new(0).unwrap_err();
        assert!(matches!(err, StatsError::Config { .. }));
    }

    #[test]
    fn test_snapshot_marks_wildcard_workspaces_public() {
        let store = scenario_a();
        let snapshot = WorkspaceSnapshot::load(&store).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.visibility(1), Some(Visibility::Public));
        assert_eq!(snapshot.visibility(2), Some(Visibility::Private));
        assert_eq!(snapshot.visibility(3), None);
    }

    #[test]
    fn test_snapshot_ignores_acls_of_deleted_workspaces() {
        let store = MemoryStore::new()
            .with_workspace(1)
            .with_deleted_workspace(2)
            .with_acl("*", 2);
        let snapshot = WorkspaceSnapshot::load(&store).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.public_count(), 0);
        assert_eq!(snapshot.stale_acls(), 1);
    }

    #[test]
    fn test_run_counts_current_versions() {
        let report = StatsAggregator::new(2).unwrap().run(&scenario_a()).unwrap();

        assert_eq!(
            report.types.get("Genome", "1"),
            Some(VisibilityCount {
                public: 1,
                private: 0
            })
        );
        assert_eq!(
            report.types.get("Genome", "2"),
            Some(VisibilityCount {
                public: 1,
                private: 0
            })
        );
        assert_eq!(
            report.types.get("Reads", "1"),
            Some(VisibilityCount {
                public: 0,
                private: 1
            })
        );
        assert_eq!(report.types.type_total("Genome").total(), 2);
        assert_eq!(report.scanned_objects, 3);
        assert_eq!(report.expected_objects, 3);
        assert_eq!(report.pages, 2);
    }

    #[test]
    fn test_run_counts_gap_objects_as_private() {
        let store = MemoryStore::new()
            .with_public_workspace(1)
            .with_deleted_workspace(9)
            .with_object(1, 1, &["Genome-1"])
            .with_object(9, 1, &["Genome-1"])
            .with_object(9, 2, &["Genome-1"]);

        let report = StatsAggregator::default().run(&store).unwrap();
        assert_eq!(
            report.types.get("Genome", "1"),
            Some(VisibilityCount {
                public: 1,
                private: 2
            })
        );
        assert_eq!(report.visibility_gap.objects, 2);
        assert_eq!(
            report.visibility_gap.workspaces.iter().copied().collect::<Vec<_>>(),
            vec![9]
        );
    }

    #[test]
    fn test_run_aborts_on_malformed_type() {
        let store = MemoryStore::new()
            .with_workspace(1)
            .with_object(1, 4, &["Genome"]);

        let err = StatsAggregator::default().run(&store).unwrap_err();
        match err {
            StatsError::MalformedType {
                ws_id,
                obj_id,
                version,
                type_string,
            } => {
                assert_eq!((ws_id, obj_id, version), (1, 4, 1));
                assert_eq!(type_string, "Genome");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_type_counts_grand_total() {
        let mut counts = TypeCounts::default();
        let genome = TypeString::parse("Genome-1").unwrap();
        let reads = TypeString::parse("Reads-3").unwrap();
        counts.record(&genome, Visibility::Public);
        counts.record(&genome, Visibility::Private);
        counts.record(&reads, Visibility::Private);

        let total = counts.grand_total();
        assert_eq!(total.public, 1);
        assert_eq!(total.private, 2);
        assert_eq!(total.total(), 3);
        assert!(counts.type_total("Missing").total() == 0);
    }

    #[test]
    fn test_type_counts_merge_repeated_mixed_versions() {
        let mut counts = TypeCounts::default();
        for raw in ["T-10", "T-9", "T-1a", "T-10", "T-9", "T-1a"] {
            counts.record(&TypeString::parse(raw).unwrap(), Visibility::Private);
        }

        let rows: Vec<(&str, u64)> = counts
            .iter()
            .flat_map(|(_, versions)| versions.iter())
            .map(|(version, count)| (version.as_str(), count.total()))
            .collect();
        assert_eq!(rows, vec![("9", 2), ("10", 2), ("1a", 2)]);
        assert_eq!(counts.get("T", "1a").map(|c| c.private), Some(2));
    }
}
