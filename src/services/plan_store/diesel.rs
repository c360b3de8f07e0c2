// PostgreSQL-backed plan store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{PlanStore, StoreError};
use crate::db::DieselPool;
use crate::models::{AdStatus, NewSubscription, Plan, Subscription, SubscriptionStatus, User};
use crate::schema::{ads, highlights, plans, subscriptions, users};

#[derive(Clone)]
pub struct DieselPlanStore {
    diesel_pool: DieselPool,
}

impl DieselPlanStore {
    pub fn new(diesel_pool: DieselPool) -> Self {
        Self { diesel_pool }
    }

    async fn conn(
        &self,
    ) -> Result<
        bb8::PooledConnection<
            '_,
            diesel_async::pooled_connection::AsyncDieselConnectionManager<
                diesel_async::AsyncPgConnection,
            >,
        >,
        StoreError,
    > {
        self.diesel_pool
            .get()
            .await
            .map_err(|e| StoreError::Pool(e.to_string()))
    }
}

#[async_trait]
impl PlanStore for DieselPlanStore {
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        let mut conn = self.conn().await?;

        users::table
            .find(user_id)
            .select(User::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(StoreError::from)
    }

    async fn find_active_subscription(
        &self,
        user_id: Uuid,
    ) -> Result<Option<(Subscription, Plan)>, StoreError> {
        let mut conn = self.conn().await?;

        subscriptions::table
            .inner_join(plans::table)
            .filter(subscriptions::user_id.eq(user_id))
            .filter(subscriptions::status.eq(SubscriptionStatus::Active.as_str()))
            .order(subscriptions::starts_at.desc())
            .select((Subscription::as_select(), Plan::as_select()))
            .first::<(Subscription, Plan)>(&mut conn)
            .await
            .optional()
            .map_err(StoreError::from)
    }

    async fn find_plan_by_slug(&self, slug: &str) -> Result<Option<Plan>, StoreError> {
        let mut conn = self.conn().await?;

        plans::table
            .filter(plans::slug.eq(slug))
            .select(Plan::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(StoreError::from)
    }

    async fn find_plan_by_id(&self, plan_id: Uuid) -> Result<Option<Plan>, StoreError> {
        let mut conn = self.conn().await?;

        plans::table
            .find(plan_id)
            .select(Plan::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(StoreError::from)
    }

    async fn list_active_plans(&self) -> Result<Vec<Plan>, StoreError> {
        let mut conn = self.conn().await?;

        plans::table
            .filter(plans::is_active.eq(true))
            .order((plans::price_monthly_cents.asc(), plans::slug.asc()))
            .select(Plan::as_select())
            .load(&mut conn)
            .await
            .map_err(StoreError::from)
    }

    async fn count_active_ads(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<i64, StoreError> {
        let mut conn = self.conn().await?;

        ads::table
            .filter(ads::user_id.eq(user_id))
            .filter(ads::status.eq_any(AdStatus::counted_strs()))
            .filter(ads::expires_at.is_null().or(ads::expires_at.gt(now)))
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(StoreError::from)
    }

    async fn count_highlights_between(
        &self,
        user_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        let mut conn = self.conn().await?;

        highlights::table
            .filter(highlights::user_id.eq(user_id))
            .filter(highlights::created_at.ge(from))
            .filter(highlights::created_at.le(to))
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(StoreError::from)
    }

    #[instrument(skip(self, new_subscription), fields(user_id = %new_subscription.user_id, plan_id = %new_subscription.plan_id))]
    async fn replace_active_subscription(
        &self,
        new_subscription: NewSubscription,
    ) -> Result<Subscription, StoreError> {
        let mut conn = self.conn().await?;
        let now = Utc::now();

        let subscription = conn
            .build_transaction()
            .run::<_, diesel::result::Error, _>(|conn| {
                Box::pin(async move {
                    let cancelled = diesel::update(
                        subscriptions::table
                            .filter(subscriptions::user_id.eq(new_subscription.user_id))
                            .filter(subscriptions::status.eq(SubscriptionStatus::Active.as_str())),
                    )
                    .set((
                        subscriptions::status.eq(SubscriptionStatus::Cancelled.as_str()),
                        subscriptions::cancelled_at.eq(now),
                        subscriptions::updated_at.eq(now),
                    ))
                    .execute(conn)
                    .await?;

                    debug!("[PLANS] Cancelled {} active subscriptions", cancelled);

                    diesel::insert_into(subscriptions::table)
                        .values(&new_subscription)
                        .returning(Subscription::as_returning())
                        .get_result(conn)
                        .await
                })
            })
            .await?;

        Ok(subscription)
    }

    async fn set_user_subscription_plan(&self, user_id: Uuid, plan_slug: &str) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;

        let updated = diesel::update(users::table.find(user_id))
            .set((
                users::subscription_plan.eq(plan_slug),
                users::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .await?;

        if updated == 0 {
            return Err(StoreError::NotFound("User"));
        }

        Ok(())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;

        diesel::sql_query("SELECT 1")
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(StoreError::from)
    }
}
