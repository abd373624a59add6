//! Soft deletion for entities carrying `is_active` / `deleted_at` columns.
//!
//! Every soft-deletable entity exposes two query builders:
//!
//! * [`SoftDelete::objects`] only ever sees active rows. Ordinary reads go
//!   through it.
//! * [`SoftDelete::all_objects`] sees every row and is meant for
//!   administrative access (trash listings, restoring, purging).
//!
//! Bulk operations on either builder compile to a single `UPDATE` or
//! `DELETE` statement. Single loaded models are handled by [`delete`],
//! [`restore`] and [`hard_delete`], which only write the two flag columns.

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use sea_orm::prelude::Expr;
use sea_orm::sea_query::IntoCondition;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    ModelTrait, PaginatorTrait, QueryFilter, Select,
};

/// An entity whose rows are flagged inactive instead of removed.
pub trait SoftDelete: EntityTrait {
    fn is_active_column() -> Self::Column;
    fn deleted_at_column() -> Self::Column;

    /// Default scope: active rows only.
    fn objects() -> SoftDeleteQuery<Self, ActiveOnly> {
        SoftDeleteQuery::new()
    }

    /// Administrative scope: all rows regardless of their flag.
    fn all_objects() -> SoftDeleteQuery<Self, Unrestricted> {
        SoftDeleteQuery::new()
    }
}

/// Row visibility of a [`SoftDeleteQuery`].
pub trait Scope {
    fn base_condition<E: SoftDelete>() -> Condition;
}

/// Marker for the default, active-only scope.
#[derive(Clone, Copy, Debug)]
pub struct ActiveOnly;

/// Marker for the unrestricted administrative scope.
#[derive(Clone, Copy, Debug)]
pub struct Unrestricted;

impl Scope for ActiveOnly {
    fn base_condition<E: SoftDelete>() -> Condition {
        Condition::all().add(E::is_active_column().eq(true))
    }
}

impl Scope for Unrestricted {
    fn base_condition<E: SoftDelete>() -> Condition {
        Condition::all()
    }
}

/// A filtered set of rows of `E` as seen through scope `S`.
#[derive(Clone, Debug)]
pub struct SoftDeleteQuery<E, S> {
    filters: Condition,
    _marker: PhantomData<(E, S)>,
}

impl<E: SoftDelete, S: Scope> SoftDeleteQuery<E, S> {
    fn new() -> Self {
        Self::with_filters(Condition::all())
    }

    fn with_filters(filters: Condition) -> Self {
        Self {
            filters,
            _marker: PhantomData,
        }
    }

    /// Narrow the set with an additional condition.
    pub fn filter<F: IntoCondition>(mut self, filter: F) -> Self {
        self.filters = self.filters.add(filter);
        self
    }

    /// The full `WHERE` condition: scope restriction plus caller filters.
    pub fn condition(&self) -> Condition {
        S::base_condition::<E>().add(self.filters.clone())
    }

    /// A plain select over the set, for ordering and pagination.
    pub fn find(&self) -> Select<E> {
        E::find().filter(self.condition())
    }

    pub async fn all<C: ConnectionTrait>(&self, db: &C) -> Result<Vec<E::Model>, DbErr> {
        self.find().all(db).await
    }

    pub async fn one<C: ConnectionTrait>(&self, db: &C) -> Result<Option<E::Model>, DbErr> {
        self.find().one(db).await
    }

    pub async fn count<C: ConnectionTrait>(&self, db: &C) -> Result<u64, DbErr>
    where
        E::Model: Sync,
    {
        self.find().count(db).await
    }

    /// Soft-delete every row in the set. Returns the number of rows touched.
    ///
    /// Rows that were already inactive get a fresh `deleted_at`.
    pub async fn delete<C: ConnectionTrait>(&self, db: &C) -> Result<u64, DbErr> {
        let result = E::update_many()
            .col_expr(E::is_active_column(), Expr::value(false))
            .col_expr(E::deleted_at_column(), Expr::value(Some(Utc::now())))
            .filter(self.condition())
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Physically remove every row in the set. Not recoverable.
    pub async fn hard_delete<C: ConnectionTrait>(&self, db: &C) -> Result<u64, DbErr> {
        let result = E::delete_many()
            .filter(self.condition())
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}

impl<E: SoftDelete> SoftDeleteQuery<E, ActiveOnly> {
    /// Switch to the inactive rows matching the same filters.
    pub fn inactive(self) -> SoftDeleteQuery<E, Unrestricted> {
        SoftDeleteQuery::<E, Unrestricted>::with_filters(self.filters).inactive()
    }
}

impl<E: SoftDelete> SoftDeleteQuery<E, Unrestricted> {
    pub fn active(self) -> Self {
        self.filter(E::is_active_column().eq(true))
    }

    pub fn inactive(self) -> Self {
        self.filter(E::is_active_column().eq(false))
    }

    /// Reactivate every row in the set. Returns the number of rows touched.
    pub async fn restore<C: ConnectionTrait>(&self, db: &C) -> Result<u64, DbErr> {
        let result = E::update_many()
            .col_expr(E::is_active_column(), Expr::value(true))
            .col_expr(
                E::deleted_at_column(),
                Expr::value(Option::<DateTime<Utc>>::None),
            )
            .filter(self.condition())
            .exec(db)
            .await?;
        Ok(result.rows_affected)
    }
}

/// Soft-delete a single loaded row, writing only `is_active` and `deleted_at`.
pub async fn delete<M, C>(db: &C, model: M) -> Result<M, DbErr>
where
    M: ModelTrait + IntoActiveModel<<M::Entity as EntityTrait>::ActiveModel>,
    M::Entity: SoftDelete + EntityTrait<Model = M>,
    <M::Entity as EntityTrait>::ActiveModel: Send,
    C: ConnectionTrait,
{
    set_flags(db, model, false, Some(Utc::now())).await
}

/// Reactivate a single loaded row, writing only `is_active` and `deleted_at`.
pub async fn restore<M, C>(db: &C, model: M) -> Result<M, DbErr>
where
    M: ModelTrait + IntoActiveModel<<M::Entity as EntityTrait>::ActiveModel>,
    M::Entity: SoftDelete + EntityTrait<Model = M>,
    <M::Entity as EntityTrait>::ActiveModel: Send,
    C: ConnectionTrait,
{
    set_flags(db, model, true, None).await
}

/// Physically remove a single row, bypassing the flag.
pub async fn hard_delete<M, C>(db: &C, model: M) -> Result<u64, DbErr>
where
    M: ModelTrait + IntoActiveModel<<M::Entity as EntityTrait>::ActiveModel>,
    M::Entity: SoftDelete + EntityTrait<Model = M>,
    <M::Entity as EntityTrait>::ActiveModel: Send,
    C: ConnectionTrait,
{
    let result = <M::Entity as EntityTrait>::delete(model.into_active_model())
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

async fn set_flags<M, C>(
    db: &C,
    model: M,
    is_active: bool,
    deleted_at: Option<DateTime<Utc>>,
) -> Result<M, DbErr>
where
    M: ModelTrait + IntoActiveModel<<M::Entity as EntityTrait>::ActiveModel>,
    M::Entity: SoftDelete + EntityTrait<Model = M>,
    <M::Entity as EntityTrait>::ActiveModel: Send,
    C: ConnectionTrait,
{
    // Converting a loaded model leaves every column unchanged, so the
    // UPDATE below only carries the two columns set here.
    let mut active = model.into_active_model();
    active.set(<M::Entity as SoftDelete>::is_active_column(), is_active.into());
    active.set(<M::Entity as SoftDelete>::deleted_at_column(), deleted_at.into());
    active.update(db).await
}
