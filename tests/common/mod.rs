use async_trait::async_trait;
use crudnav::{COUNT_OPERATION, ConditionSet, FIND_OPERATION, ListQuery, ParameterSource, PathUrl, RecordSource};
use sea_orm::{ActiveModelTrait, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema, Set};
use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

pub mod post_entity;

pub fn params(uri: &str) -> ParameterSource {
    ParameterSource::from_url(PathUrl::parse(uri))
}

/// Route library logs to the test output; repeated calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect("sqlite::memory:").await?;

    let schema = Schema::new(db.get_database_backend());
    let stmt = schema.create_table_from_entity(post_entity::Entity);
    db.execute(db.get_database_backend().build(&stmt)).await?;

    Ok(db)
}

/// Insert `count` posts: ids 1..=count, `views = id * 10`, every third post a draft
pub async fn seed_posts(db: &DatabaseConnection, count: i32) -> Result<(), DbErr> {
    for i in 1..=count {
        post_entity::ActiveModel {
            id: Set(i),
            title: Set(format!("Post number {i}")),
            status: Set(if i % 3 == 0 { "draft" } else { "published" }.to_string()),
            views: Set(i * 10),
            created_at: Set(format!("2024-03-{:02} 12:00:00", (i - 1) % 28 + 1)),
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

/// In-memory record source of `total` numeric records, counting every call it receives
#[derive(Debug)]
pub struct MemorySource {
    pub total: u64,
    pub operations: Vec<&'static str>,
    pub counts: AtomicUsize,
    pub finds: AtomicUsize,
    pub last_query: Mutex<Option<ListQuery>>,
    pub last_conditions: Mutex<Option<ConditionSet>>,
}

impl MemorySource {
    pub fn new(total: u64) -> Self {
        Self::with_operations(total, vec![COUNT_OPERATION, FIND_OPERATION])
    }

    pub fn with_operations(total: u64, operations: Vec<&'static str>) -> Self {
        Self {
            total,
            operations,
            counts: AtomicUsize::new(0),
            finds: AtomicUsize::new(0),
            last_query: Mutex::new(None),
            last_conditions: Mutex::new(None),
        }
    }

    pub fn count_calls(&self) -> usize {
        self.counts.load(Ordering::SeqCst)
    }

    pub fn find_calls(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    type Record = u64;

    fn operations(&self) -> &[&str] {
        &self.operations
    }

    async fn count(&self, _operation: &str, conditions: &ConditionSet) -> Result<u64, DbErr> {
        self.counts.fetch_add(1, Ordering::SeqCst);
        *self.last_conditions.lock().unwrap() = Some(conditions.clone());
        Ok(self.total)
    }

    async fn find(&self, _operation: &str, query: &ListQuery) -> Result<Vec<u64>, DbErr> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some(query.clone());

        let start = query.offset + 1;
        let end = query
            .limit
            .map_or(self.total, |limit| (query.offset + limit).min(self.total));
        Ok((start..=end).collect())
    }
}

/// Source whose every operation fails
#[derive(Debug)]
pub struct FailingSource;

#[async_trait]
impl RecordSource for FailingSource {
    type Record = u64;

    fn operations(&self) -> &[&str] {
        &[COUNT_OPERATION, FIND_OPERATION]
    }

    async fn count(&self, _operation: &str, _conditions: &ConditionSet) -> Result<u64, DbErr> {
        Err(DbErr::Custom("count unavailable".to_string()))
    }

    async fn find(&self, _operation: &str, _query: &ListQuery) -> Result<Vec<u64>, DbErr> {
        Err(DbErr::Custom("find unavailable".to_string()))
    }
}
