use async_trait::async_trait;
use sea_orm::{
    DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use std::marker::PhantomData;

use crate::{filtering::ConditionSet, models::ListQuery};

/// Conventional name of the counting operation
pub const COUNT_OPERATION: &str = "Count";

/// Conventional name of the fetching operation
pub const FIND_OPERATION: &str = "Find";

/// Data-access collaborator a listing is bound to.
///
/// A record type exposes named operations. A listing counts through one of them and fetches
/// through another, so one source can back several listings with differently named operations.
/// Failures are returned as-is and propagate to the caller unmodified.
#[async_trait]
pub trait RecordSource: Send + Sync {
    type Record: Send;

    /// Names of the operations this source provides
    fn operations(&self) -> &[&str];

    /// Whether `operation` is one of [`RecordSource::operations`]
    fn provides(&self, operation: &str) -> bool {
        self.operations().contains(&operation)
    }

    /// Number of records matching `conditions`
    async fn count(&self, operation: &str, conditions: &ConditionSet) -> Result<u64, DbErr>;

    /// Records of one page of `query`
    async fn find(&self, operation: &str, query: &ListQuery) -> Result<Vec<Self::Record>, DbErr>;
}

/// Placeholder source of a listing that is not bound to any record type
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbound;

#[async_trait]
impl RecordSource for Unbound {
    type Record = ();

    fn operations(&self) -> &[&str] {
        &[]
    }

    async fn count(&self, operation: &str, _conditions: &ConditionSet) -> Result<u64, DbErr> {
        Err(DbErr::Custom(format!("Operation {operation} is not provided")))
    }

    async fn find(&self, operation: &str, _query: &ListQuery) -> Result<Vec<()>, DbErr> {
        Err(DbErr::Custom(format!("Operation {operation} is not provided")))
    }
}

/// Sea-ORM backed source for any entity
#[derive(Debug, Clone)]
pub struct EntitySource<E> {
    db: DatabaseConnection,
    operations: [&'static str; 2],
    entity: PhantomData<E>,
}

impl<E: EntityTrait> EntitySource<E> {
    /// Source providing the conventional `Count` and `Find` operations
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_operations(db, COUNT_OPERATION, FIND_OPERATION)
    }

    /// Source exposing its count and find operations under other names
    #[must_use]
    pub fn with_operations(db: DatabaseConnection, count: &'static str, find: &'static str) -> Self {
        Self {
            db,
            operations: [count, find],
            entity: PhantomData,
        }
    }

    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl<E> RecordSource for EntitySource<E>
where
    E: EntityTrait + Sync,
    E::Model: Send + Sync,
{
    type Record = E::Model;

    fn operations(&self) -> &[&str] {
        &self.operations
    }

    async fn count(&self, _operation: &str, conditions: &ConditionSet) -> Result<u64, DbErr> {
        E::find()
            .filter(conditions.to_condition())
            .count(&self.db)
            .await
    }

    async fn find(&self, _operation: &str, query: &ListQuery) -> Result<Vec<E::Model>, DbErr> {
        let mut select = E::find().filter(query.conditions.to_condition());

        if let Some(order) = &query.order {
            select = select.order_by(order.to_expr(), order.order());
        }
        if query.offset > 0 {
            select = select.offset(query.offset);
        }
        if let Some(limit) = query.limit {
            select = select.limit(limit);
        }

        select.all(&self.db).await
    }
}
