use crate::credentials::Credentials;
use crate::error::{Result, StatsError};
use crate::model::{ObjectRow, PublicAclRow, VersionRow, WILDCARD_PRINCIPAL, WorkspaceRow};
use crate::store::{COL_ACLS, COL_OBJECTS, COL_VERSIONS, COL_WORKSPACES, WorkspaceStore};
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::{ClientOptions, Credential, ReadPreference, SelectionCriteria};
use mongodb::{Client, Collection, Database};
use std::fmt;
use tokio::runtime::{Builder, Runtime};
use tracing::{debug, info};

const APP_NAME: &str = "ws-stats";

/// Where the workspace database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MongoTarget {
    pub host: String,
    pub port: u16,
    pub database: String,
    /// Full connection string; replaces host and port when set.
    pub uri: Option<String>,
}

impl MongoTarget {
    pub fn connection_string(&self) -> String {
        match &self.uri {
            Some(uri) => uri.clone(),
            None => format!("mongodb://{}:{}/", self.host, self.port),
        }
    }
}

impl fmt::Display for MongoTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.uri {
            // connection strings may embed a password
            Some(_) => write!(f, "<uri>/{}", self.database),
            None => write!(f, "{}:{}/{}", self.host, self.port, self.database),
        }
    }
}

/// Secondary reads, falling back to the primary when no secondary is up.
fn secondary_preferred() -> SelectionCriteria {
    SelectionCriteria::ReadPreference(ReadPreference::SecondaryPreferred {
        options: Default::default(),
    })
}

/// Workspace collections in a live MongoDB, queried through a private runtime.
pub struct MongoStore {
    runtime: Runtime,
    db: Database,
}

impl MongoStore {
    /// Connects, authenticates against the target database and pings it.
    ///
    /// Reads are routed to secondaries when available so the scan stays off the primary.
    pub fn connect(target: &MongoTarget, credentials: &Credentials) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;

        info!(db = %target, user = %credentials.user, "connecting to workspace database");

        let db = runtime.block_on(async {
            let mut options = ClientOptions::parse(target.connection_string())
                .await
                .map_err(StatsError::Connection)?;
            options.app_name = Some(APP_NAME.to_string());
            options.selection_criteria = Some(secondary_preferred());
            options.credential = Some(
                Credential::builder()
                    .username(credentials.user.clone())
                    .password(credentials.pwd.clone())
                    .source(target.database.clone())
                    .build(),
            );

            let client = Client::with_options(options).map_err(StatsError::Connection)?;
            let db = client.database(&target.database);
            db.run_command(doc! { "ping": 1 })
                .selection_criteria(secondary_preferred())
                .await
                .map_err(StatsError::Connection)?;
            Ok::<_, StatsError>(db)
        })?;

        debug!("ping succeeded");
        Ok(Self { runtime, db })
    }

    fn workspaces(&self) -> Collection<WorkspaceRow> {
        self.db.collection(COL_WORKSPACES)
    }

    fn acls(&self) -> Collection<PublicAclRow> {
        self.db.collection(COL_ACLS)
    }

    fn objects(&self) -> Collection<ObjectRow> {
        self.db.collection(COL_OBJECTS)
    }

    fn versions(&self) -> Collection<VersionRow> {
        self.db.collection(COL_VERSIONS)
    }
}

impl WorkspaceStore for MongoStore {
    fn live_workspaces(&self) -> Result<Vec<WorkspaceRow>> {
        let collection = self.workspaces();
        self.runtime.block_on(async {
            let cursor = collection
                .find(doc! { "del": false })
                .projection(doc! { "ws": 1, "numObj": 1, "_id": 0 })
                .await?;
            let rows: Vec<WorkspaceRow> = cursor.try_collect().await?;
            Ok::<_, StatsError>(rows)
        })
    }

    fn public_workspace_ids(&self) -> Result<Vec<i64>> {
        let collection = self.acls();
        self.runtime.block_on(async {
            let cursor = collection
                .find(doc! { "user": WILDCARD_PRINCIPAL })
                .projection(doc! { "id": 1, "_id": 0 })
                .await?;
            let rows: Vec<PublicAclRow> = cursor.try_collect().await?;
            Ok::<_, StatsError>(rows.into_iter().map(|row| row.ws_id).collect())
        })
    }

    fn count_live_objects(&self) -> Result<u64> {
        let collection = self.objects();
        self.runtime.block_on(async {
            let count = collection.count_documents(doc! { "del": false }).await?;
            Ok::<_, StatsError>(count)
        })
    }

    fn live_objects(&self, skip: u64, limit: u64) -> Result<Vec<ObjectRow>> {
        let collection = self.objects();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.runtime.block_on(async {
            // (ws, id) carries a unique index, so skip/limit pages don't overlap
            let cursor = collection
                .find(doc! { "del": false })
                .projection(doc! { "ws": 1, "id": 1, "numver": 1, "_id": 0 })
                .sort(doc! { "ws": 1, "id": 1 })
                .skip(skip)
                .limit(limit)
                .await?;
            let rows: Vec<ObjectRow> = cursor.try_collect().await?;
            Ok::<_, StatsError>(rows)
        })
    }

    fn object_version_type(
        &self,
        ws_id: i64,
        obj_id: i64,
        version: i64,
    ) -> Result<Option<String>> {
        let collection = self.versions();
        self.runtime.block_on(async {
            let row = collection
                .find_one(doc! { "ws": ws_id, "id": obj_id, "ver": version })
                .projection(doc! { "type": 1, "_id": 0 })
                .await?;
            Ok::<_, StatsError>(row.map(|row| row.type_string))
        })
    }
}
