use std::path::PathBuf;
use ws_stats::config::{DEFAULT_DB, DEFAULT_HOST, DEFAULT_PORT, RunConfig};
use ws_stats::credentials::DEFAULT_CREDS_SECTION;
use ws_stats::report::{OutputFormat, RenderOptions};
use ws_stats::store::{MemoryStore, MongoTarget};

/// One public workspace with two objects, one private workspace with one.
#[allow(dead_code)]
pub fn scenario_a() -> MemoryStore {
    MemoryStore::new()
        .with_public_workspace(1)
        .with_workspace(2)
        .with_object(1, 1, &["Genome-1"])
        .with_object(1, 2, &["Genome-1", "Genome-2"])
        .with_object(2, 1, &["Reads-1"])
}

/// A mixed store: stale ACLs, deleted objects, multi-version objects, private ACLs.
#[allow(dead_code)]
pub fn mixed_store() -> MemoryStore {
    let mut store = MemoryStore::new()
        .with_public_workspace(1)
        .with_workspace(2)
        .with_workspace(3)
        .with_acl("alice", 2)
        .with_acl("*", 3)
        .with_deleted_workspace(4)
        .with_acl("*", 4);

    for obj_id in 1..=7 {
        store = store.with_object(1, obj_id, &["Genome-1", "Genome-2"]);
    }
    for obj_id in 1..=5 {
        store = store.with_object(2, obj_id, &["Reads-1"]);
    }
    for obj_id in 1..=4 {
        store = store.with_object(3, obj_id, &["Assembly-10"]);
    }
    store
        .with_object(3, 5, &["Assembly-2"])
        .with_deleted_object(2, 99, "Reads-1")
}

#[allow(dead_code)]
pub fn run_config(page_size: u64, format: OutputFormat, show_workspaces: bool) -> RunConfig {
    RunConfig {
        target: MongoTarget {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database: DEFAULT_DB.to_string(),
            uri: None,
        },
        creds_file: PathBuf::from("ws_mongo_creds"),
        creds_section: DEFAULT_CREDS_SECTION.to_string(),
        page_size,
        render: RenderOptions {
            format,
            show_workspaces,
        },
    }
}
