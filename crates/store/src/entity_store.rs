//! Entity persistence with the timestamp lifecycle rule.

use std::sync::Arc;

use chrono::SubsecRound;
use townsquare_domain::{all_schemas, Record, Value, TIMESTAMP_PRECISION};

use crate::infrastructure::config::StoreConfig;
use crate::infrastructure::ports::{ClockPort, DatastorePort, StoreError};

/// Persists entities through a datastore driver, stamping creation and
/// update timestamps from the injected clock.
///
/// A persist that fails for any reason leaves the entity exactly as it was
/// before the call: no identity is assigned and no timestamp is changed.
pub struct EntityStore {
    datastore: Arc<dyn DatastorePort>,
    clock: Arc<dyn ClockPort>,
    validate_before_write: bool,
}

impl EntityStore {
    pub fn new(datastore: Arc<dyn DatastorePort>, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            datastore,
            clock,
            validate_before_write: true,
        }
    }

    pub fn from_config(
        datastore: Arc<dyn DatastorePort>,
        clock: Arc<dyn ClockPort>,
        config: &StoreConfig,
    ) -> Self {
        Self::new(datastore, clock).with_validation(config.validate_before_write)
    }

    pub fn with_validation(mut self, validate_before_write: bool) -> Self {
        self.validate_before_write = validate_before_write;
        self
    }

    /// Create every entity table.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for schema in all_schemas() {
            self.datastore.ensure_table(schema).await?;
        }
        tracing::info!(tables = all_schemas().len(), "Schema ready");
        Ok(())
    }

    /// Stamp and write `entity`, returning its identity.
    ///
    /// An unsaved entity gets its creation column and its update column set
    /// to the same instant and is inserted; a saved one only has its update
    /// column refreshed and is overwritten in place.
    ///
    /// # Errors
    ///
    /// - `StoreError::Validation` if a required field is missing or a value
    ///   is too long
    /// - `StoreError::Constraint` if a referenced row does not exist
    /// - `StoreError::NotFound` if a saved entity's row has been deleted
    /// - `StoreError::Persistence` if the datastore fails
    pub async fn persist<E: Record>(&self, entity: &mut E) -> Result<E::Id, StoreError> {
        let schema = E::schema();
        let entity_type = schema.kind.name();

        if self.validate_before_write {
            if let Err(e) = entity.validate() {
                tracing::warn!(entity_type, error = %e, "Rejected invalid entity");
                return Err(e.into());
            }
        }

        let state = entity.persist_state();
        let snapshot = entity.timestamps().snapshot();
        // Stored timestamps keep microseconds; stamp at the same precision.
        let now = self.clock.now().trunc_subsecs(TIMESTAMP_PRECISION);
        entity.timestamps().apply(now, state);
        let row = entity.to_row();

        let result = match entity.id() {
            None => self
                .datastore
                .insert(schema, row)
                .await
                .map(E::Id::from),
            Some(id) => self
                .datastore
                .update(schema, id.into(), row)
                .await
                .map(|()| id),
        };

        match result {
            Ok(id) => {
                entity.set_id(Some(id));
                tracing::debug!(entity_type, id = %id, ?state, "Persisted entity");
                Ok(id)
            }
            Err(e) => {
                entity.timestamps().restore(snapshot);
                tracing::warn!(entity_type, error = %e, "Persist failed");
                Err(e)
            }
        }
    }

    pub async fn load<E: Record>(&self, id: E::Id) -> Result<Option<E>, StoreError> {
        let row = self.datastore.fetch(E::schema(), id.into()).await?;
        match row {
            Some(row) => Ok(Some(E::from_row(id, &row)?)),
            None => Ok(None),
        }
    }

    /// Like [`EntityStore::load`], but a missing row is an error.
    pub async fn require<E: Record>(&self, id: E::Id) -> Result<E, StoreError> {
        self.load(id)
            .await?
            .ok_or_else(|| StoreError::not_found(E::schema().kind.name(), id))
    }

    /// Delete by identity. Rows referencing the deleted one are not touched.
    pub async fn delete<E: Record>(&self, id: E::Id) -> Result<bool, StoreError> {
        self.datastore.delete(E::schema(), id.into()).await
    }

    /// All entities whose `column` equals `value`, ordered by identity.
    pub async fn list_where<E: Record>(
        &self,
        column: &'static str,
        value: impl Into<Value>,
    ) -> Result<Vec<E>, StoreError> {
        let rows = self
            .datastore
            .select_where(E::schema(), column, value.into())
            .await?;
        rows.into_iter()
            .map(|(id, row)| E::from_row(E::Id::from(id), &row).map_err(StoreError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::{MockClockPort, MockDatastorePort};
    use chrono::{DateTime, TimeZone, Utc};
    use mockall::Sequence;
    use townsquare_domain::{
        ContentItemId, ContentItemParticipation, ContentItemTopic, ContentTopicFollow,
        ContentTopicId, EntityKind, PersistState, Profile, ProfileId, ProfileOrganization, Row,
    };

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn t1() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 0).unwrap()
    }

    /// A clock that answers `t0` then `t1`.
    fn two_tick_clock() -> MockClockPort {
        let mut clock = MockClockPort::new();
        let mut seq = Sequence::new();
        clock
            .expect_now()
            .times(1)
            .in_sequence(&mut seq)
            .returning(t0);
        clock
            .expect_now()
            .times(1)
            .in_sequence(&mut seq)
            .returning(t1);
        clock
    }

    fn member_profile() -> Profile {
        Profile::new(["member"].into_iter().collect())
    }

    #[tokio::test]
    async fn first_persist_inserts_with_equal_stamps() {
        let mut datastore = MockDatastorePort::new();
        let mut clock = MockClockPort::new();
        clock.expect_now().returning(t0);

        datastore
            .expect_insert()
            .withf(|schema, row| {
                schema.kind == EntityKind::Profile
                    && row.timestamp("created").ok().flatten() == Some(t0())
                    && row.timestamp("last_active").ok().flatten() == Some(t0())
            })
            .times(1)
            .returning(|_, _| Ok(11));

        let store = EntityStore::new(Arc::new(datastore), Arc::new(clock));
        let mut profile = member_profile();
        let id = store.persist(&mut profile).await.unwrap();

        assert_eq!(id, ProfileId::new(11));
        assert_eq!(profile.id, Some(ProfileId::new(11)));
        assert_eq!(profile.created, Some(t0()));
        assert_eq!(profile.created, profile.last_active);
        assert_eq!(profile.persist_state(), PersistState::Saved);
    }

    #[tokio::test]
    async fn stamps_are_truncated_to_microseconds() {
        let precise = t0() + chrono::Duration::nanoseconds(123_456_789);
        let stored = t0() + chrono::Duration::microseconds(123_456);

        let mut datastore = MockDatastorePort::new();
        let mut clock = MockClockPort::new();
        clock.expect_now().returning(move || precise);
        datastore
            .expect_insert()
            .withf(move |_, row| row.timestamp("created").ok().flatten() == Some(stored))
            .times(1)
            .returning(|_, _| Ok(1));

        let store = EntityStore::new(Arc::new(datastore), Arc::new(clock));
        let mut profile = member_profile();
        store.persist(&mut profile).await.unwrap();

        assert_eq!(profile.created, Some(stored));
        assert_eq!(profile.last_active, Some(stored));
    }

    #[tokio::test]
    async fn second_persist_updates_and_keeps_created() {
        let mut datastore = MockDatastorePort::new();
        datastore.expect_insert().times(1).returning(|_, _| Ok(1));
        datastore
            .expect_update()
            .withf(|_, id, row| {
                *id == 1
                    && row.integer("follower_count").ok() == Some(5)
                    && row.timestamp("created").ok().flatten() == Some(t0())
                    && row.timestamp("last_active").ok().flatten() == Some(t1())
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let store = EntityStore::new(Arc::new(datastore), Arc::new(two_tick_clock()));
        let mut profile = member_profile();
        store.persist(&mut profile).await.unwrap();
        assert_eq!(profile.created, Some(t0()));
        assert_eq!(profile.last_active, Some(t0()));

        profile.follower_count = 5;
        store.persist(&mut profile).await.unwrap();
        assert_eq!(profile.created, Some(t0()));
        assert_eq!(profile.last_active, Some(t1()));
        assert!(profile.last_active > profile.created);
    }

    #[tokio::test]
    async fn participation_stamps_posted_and_leaves_flags() {
        let mut datastore = MockDatastorePort::new();
        datastore.expect_insert().times(1).returning(|_, _| Ok(1));
        datastore.expect_update().times(1).returning(|_, _, _| Ok(()));

        let store = EntityStore::new(Arc::new(datastore), Arc::new(two_tick_clock()));
        let mut participation =
            ContentItemParticipation::new(ContentItemId::new(7), ProfileId::new(3), "member");

        store.persist(&mut participation).await.unwrap();
        assert_eq!(participation.posted, Some(t0()));
        assert_eq!(participation.updated, Some(t0()));
        assert_eq!(participation.liked, None);
        assert_eq!(participation.learned, None);
        assert_eq!(participation.hidden, None);
        assert_eq!(participation.flagged, None);

        store.persist(&mut participation).await.unwrap();
        assert_eq!(participation.posted, Some(t0()));
        assert_eq!(participation.updated, Some(t1()));
        assert_eq!(participation.liked, None);
    }

    #[tokio::test]
    async fn caller_supplied_flags_are_written_untouched() {
        let liked_at = Utc.with_ymd_and_hms(2023, 12, 25, 9, 0, 0).unwrap();
        let mut datastore = MockDatastorePort::new();
        datastore
            .expect_insert()
            .withf(move |_, row| row.timestamp("liked").ok().flatten() == Some(liked_at))
            .times(1)
            .returning(|_, _| Ok(1));
        let mut clock = MockClockPort::new();
        clock.expect_now().returning(t0);

        let store = EntityStore::new(Arc::new(datastore), Arc::new(clock));
        let mut participation =
            ContentItemParticipation::new(ContentItemId::new(7), ProfileId::new(3), "member");
        participation.like(liked_at);

        store.persist(&mut participation).await.unwrap();
        assert_eq!(participation.liked, Some(liked_at));
        assert_eq!(participation.posted, Some(t0()));
    }

    #[tokio::test]
    async fn entities_without_update_column_persist_repeatedly() {
        let mut datastore = MockDatastorePort::new();
        datastore.expect_insert().times(2).returning(|_, _| Ok(1));
        datastore.expect_update().times(4).returning(|_, _, _| Ok(()));
        let mut clock = MockClockPort::new();
        clock.expect_now().returning(t0);

        let store = EntityStore::new(Arc::new(datastore), Arc::new(clock));

        let mut follow =
            ContentTopicFollow::new(ContentTopicId::new(1), ProfileId::new(1), "member");
        let mut link = ContentItemTopic::new(ContentItemId::new(1), ContentTopicId::new(1));
        for _ in 0..3 {
            store.persist(&mut follow).await.unwrap();
            store.persist(&mut link).await.unwrap();
        }
        assert_eq!(follow.created, Some(t0()));
        assert!(link.id.is_some());
    }

    #[tokio::test]
    async fn invalid_entity_is_not_written_or_stamped() {
        // No expectations: any datastore or clock call fails the test.
        let datastore = MockDatastorePort::new();
        let clock = MockClockPort::new();
        let store = EntityStore::new(Arc::new(datastore), Arc::new(clock));

        let mut org = ProfileOrganization::new(ProfileId::new(1), "", "acme");
        let err = store.persist(&mut org).await.unwrap_err();

        assert!(err.is_validation());
        assert_eq!(org.id, None);
        assert_eq!(org.created, None);
        assert_eq!(org.updated, None);
    }

    #[tokio::test]
    async fn skipping_validation_defers_to_datastore() {
        let mut datastore = MockDatastorePort::new();
        datastore
            .expect_insert()
            .times(1)
            .returning(|_, _| Err(StoreError::validation("profile_organization: NOT NULL")));
        let mut clock = MockClockPort::new();
        clock.expect_now().returning(t0);

        let store =
            EntityStore::new(Arc::new(datastore), Arc::new(clock)).with_validation(false);
        let mut org = ProfileOrganization::new(ProfileId::new(1), "", "acme");
        let err = store.persist(&mut org).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(org.created, None);
    }

    #[tokio::test]
    async fn failed_insert_leaves_entity_unsaved() {
        let mut datastore = MockDatastorePort::new();
        datastore
            .expect_insert()
            .times(1)
            .returning(|_, _| Err(StoreError::constraint("FOREIGN KEY constraint failed")));
        let mut clock = MockClockPort::new();
        clock.expect_now().returning(t0);

        let store = EntityStore::new(Arc::new(datastore), Arc::new(clock));
        let mut participation =
            ContentItemParticipation::new(ContentItemId::new(7), ProfileId::new(3), "member");
        let err = store.persist(&mut participation).await.unwrap_err();

        assert!(err.is_constraint());
        assert_eq!(participation.persist_state(), PersistState::Unsaved);
        assert_eq!(participation.posted, None);
        assert_eq!(participation.updated, None);
    }

    #[tokio::test]
    async fn failed_update_restores_previous_stamp() {
        let mut datastore = MockDatastorePort::new();
        datastore.expect_insert().times(1).returning(|_, _| Ok(4));
        datastore
            .expect_update()
            .times(1)
            .returning(|_, _, _| Err(StoreError::persistence("update", "disk I/O error")));

        let store = EntityStore::new(Arc::new(datastore), Arc::new(two_tick_clock()));
        let mut profile = member_profile();
        store.persist(&mut profile).await.unwrap();

        let err = store.persist(&mut profile).await.unwrap_err();
        assert!(matches!(err, StoreError::Persistence { .. }));
        assert_eq!(profile.id, Some(ProfileId::new(4)));
        assert_eq!(profile.last_active, Some(t0()));
    }

    #[tokio::test]
    async fn load_maps_rows_and_missing_ids() {
        let mut datastore = MockDatastorePort::new();
        let row = {
            let mut profile = member_profile();
            profile.follower_count = 9;
            profile.to_row()
        };
        datastore
            .expect_fetch()
            .withf(|_, id| *id == 2)
            .returning(move |_, _| Ok(Some(row.clone())));
        datastore
            .expect_fetch()
            .withf(|_, id| *id == 3)
            .returning(|_, _| Ok(None));

        let store = EntityStore::new(Arc::new(datastore), Arc::new(MockClockPort::new()));

        let loaded: Profile = store.load(ProfileId::new(2)).await.unwrap().unwrap();
        assert_eq!(loaded.id, Some(ProfileId::new(2)));
        assert_eq!(loaded.follower_count, 9);

        assert!(store.load::<Profile>(ProfileId::new(3)).await.unwrap().is_none());
        let err = store.require::<Profile>(ProfileId::new(3)).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn list_where_passes_column_and_value() {
        let mut datastore = MockDatastorePort::new();
        datastore
            .expect_select_where()
            .withf(|schema, column, value| {
                schema.kind == EntityKind::ContentItemTopic
                    && column == "item_id"
                    && *value == Value::Integer(7)
            })
            .returning(|_, _, _| {
                Ok(vec![
                    (1, Row::new().with("item_id", 7_i64).with("topic_id", 2_i64)),
                    (5, Row::new().with("item_id", 7_i64).with("topic_id", 3_i64)),
                ])
            });

        let store = EntityStore::new(Arc::new(datastore), Arc::new(MockClockPort::new()));
        let links: Vec<ContentItemTopic> = store.list_where("item_id", 7_i64).await.unwrap();

        let topics: Vec<i64> = links.iter().map(|l| l.topic_id.as_i64()).collect();
        assert_eq!(topics, vec![2, 3]);
        assert_eq!(links[1].id.map(|id| id.as_i64()), Some(5));
    }

    #[tokio::test]
    async fn ensure_schema_creates_every_table() {
        let mut datastore = MockDatastorePort::new();
        datastore
            .expect_ensure_table()
            .times(EntityKind::ALL.len())
            .returning(|_| Ok(()));

        let store = EntityStore::new(Arc::new(datastore), Arc::new(MockClockPort::new()));
        store.ensure_schema().await.unwrap();
    }
}
