use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use mockall::Sequence;
use townsquare_domain::{
    ContentFollow, ContentItem, ContentItemComment, ContentItemEmbed, ContentItemHash, ContentItemId,
    ContentItemParticipation, ContentItemTopic, ContentTopic, ContentTopicFollow, IdSet,
    InviteBatch, InviteBatchRecipient, InviteCampaign, PageAttributes, Profile, ProfileId,
    ProfileMember, ProfileOrganization, ProfileSubCommunity, Record, TableNaming, TagSet,
};

use crate::entity_store::EntityStore;
use crate::infrastructure::{
    clock::{FixedClock, SystemClock},
    ports::{ClockPort, DatastorePort, MockClockPort},
    sqlite::SqliteDatastore,
};

async fn sqlite_store(naming: TableNaming) -> EntityStore {
    let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    sqlite_store_with_clock(naming, Arc::new(FixedClock(now))).await
}

async fn sqlite_store_with_clock(naming: TableNaming, clock: Arc<dyn ClockPort>) -> EntityStore {
    let datastore: Arc<dyn DatastorePort> = Arc::new(
        SqliteDatastore::in_memory(naming)
            .await
            .expect("open in-memory db"),
    );
    let store = EntityStore::new(datastore, clock);
    store.ensure_schema().await.expect("create schema");
    store
}

/// Answers each instant once, in order.
fn ticking_clock(ticks: Vec<DateTime<Utc>>) -> MockClockPort {
    let mut clock = MockClockPort::new();
    let mut seq = Sequence::new();
    for tick in ticks {
        clock
            .expect_now()
            .times(1)
            .in_sequence(&mut seq)
            .returning(move || tick);
    }
    clock
}

async fn saved_profile(store: &EntityStore) -> ProfileId {
    let mut profile = Profile::new(["member"].into_iter().collect());
    store.persist(&mut profile).await.expect("persist profile")
}

#[tokio::test]
async fn every_entity_round_trips_through_sqlite() {
    let store = sqlite_store(TableNaming::Standard).await;
    let profile_id = saved_profile(&store).await;
    let other_id = saved_profile(&store).await;

    let mut org = ProfileOrganization::new(profile_id, "Acme", "acme")
        .with_email_domains(["acme.org", "acme.io"].into_iter().collect())
        .with_alt_names(["ACME Inc"].into_iter().collect());
    let org_id = store.persist(&mut org).await.expect("org");
    let loaded: ProfileOrganization = store.require(org_id).await.expect("load org");
    assert_eq!(loaded, org);

    let mut campaign = InviteCampaign::new("Launch")
        .owned_by(org_id)
        .with_follows(IdSet::from(vec![other_id.as_i64(), profile_id.as_i64()]))
        .with_roles(["editor"].into_iter().collect());
    let campaign_id = store.persist(&mut campaign).await.expect("campaign");
    assert_eq!(store.require::<InviteCampaign>(campaign_id).await.expect("load"), campaign);

    let mut batch = InviteBatch::new(campaign_id).with_groups(IdSet::from(vec![1, 2]));
    let batch_id = store.persist(&mut batch).await.expect("batch");
    assert_eq!(store.require::<InviteBatch>(batch_id).await.expect("load"), batch);

    let mut recipient = InviteBatchRecipient::new(batch_id, "new@acme.org").with_name("New");
    let recipient_id = store.persist(&mut recipient).await.expect("recipient");
    assert_eq!(
        store
            .require::<InviteBatchRecipient>(recipient_id)
            .await
            .expect("load"),
        recipient
    );

    let mut member = ProfileMember::new(profile_id, 42, "m@acme.org", batch_id.as_i64());
    let member_id = store.persist(&mut member).await.expect("member");
    assert_eq!(store.require::<ProfileMember>(member_id).await.expect("load"), member);

    let mut sub = ProfileSubCommunity::new(profile_id, other_id, "Rustaceans").as_private();
    let sub_id = store.persist(&mut sub).await.expect("sub community");
    assert_eq!(
        store.require::<ProfileSubCommunity>(sub_id).await.expect("load"),
        sub
    );

    let mut topic = ContentTopic::new("Systems Programming");
    let topic_id = store.persist(&mut topic).await.expect("topic");
    assert_eq!(store.require::<ContentTopic>(topic_id).await.expect("load"), topic);

    let mut topic_follow = ContentTopicFollow::new(topic_id, profile_id, "member");
    let topic_follow_id = store.persist(&mut topic_follow).await.expect("topic follow");
    assert_eq!(
        store
            .require::<ContentTopicFollow>(topic_follow_id)
            .await
            .expect("load"),
        topic_follow
    );

    let mut item = ContentItem::new(profile_id, "member", PageAttributes::new("Ownership"))
        .with_url("https://example.org/ownership")
        .with_segments(IdSet::from(vec![5, 3]));
    let item_id = store.persist(&mut item).await.expect("item");
    assert_eq!(store.require::<ContentItem>(item_id).await.expect("load"), item);

    let mut link = ContentItemTopic::new(item_id, topic_id);
    let link_id = store.persist(&mut link).await.expect("item topic");
    assert_eq!(store.require::<ContentItemTopic>(link_id).await.expect("load"), link);

    let mut participation = ContentItemParticipation::new(item_id, profile_id, "member");
    let participation_id = store.persist(&mut participation).await.expect("participation");
    assert_eq!(
        store
            .require::<ContentItemParticipation>(participation_id)
            .await
            .expect("load"),
        participation
    );

    let mut hash = ContentItemHash::for_content(item_id, "ownership body");
    let hash_id = store.persist(&mut hash).await.expect("hash");
    assert_eq!(store.require::<ContentItemHash>(hash_id).await.expect("load"), hash);

    let mut follow = ContentFollow::new(profile_id.as_i64(), "member", topic_id.as_i64(), "topic");
    let follow_id = store.persist(&mut follow).await.expect("follow");
    assert_eq!(store.require::<ContentFollow>(follow_id).await.expect("load"), follow);

    let mut embed = ContentItemEmbed::new(item_id, "https://video.example/1")
        .with_thumbnail("https://video.example/1.jpg", 320, 180);
    let embed_id = store.persist(&mut embed).await.expect("embed");
    assert_eq!(store.require::<ContentItemEmbed>(embed_id).await.expect("load"), embed);

    let mut comment = ContentItemComment::new(item_id, profile_id.as_i64(), "member", "Nice");
    let comment_id = store.persist(&mut comment).await.expect("comment");
    assert_eq!(
        store.require::<ContentItemComment>(comment_id).await.expect("load"),
        comment
    );
}

#[tokio::test]
async fn set_fields_compare_regardless_of_order() {
    let store = sqlite_store(TableNaming::Standard).await;
    let mut profile = Profile::new(["member", "admin"].into_iter().collect());
    let id = store.persist(&mut profile).await.expect("persist");

    let loaded: Profile = store.require(id).await.expect("load");
    assert_eq!(
        loaded.profile_type,
        ["admin", "member"].into_iter().collect::<TagSet>()
    );
}

#[tokio::test]
async fn missing_foreign_key_target_is_a_constraint_error() {
    let store = sqlite_store(TableNaming::Standard).await;
    let mut participation =
        ContentItemParticipation::new(ContentItemId::new(404), ProfileId::new(404), "member");

    let err = store.persist(&mut participation).await.unwrap_err();
    assert!(err.is_constraint(), "got {err:?}");
    assert_eq!(participation.id, None);
    assert_eq!(participation.posted, None);
    assert_eq!(participation.updated, None);
}

#[tokio::test]
async fn datastore_constraints_apply_without_validation() {
    let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let datastore: Arc<dyn DatastorePort> = Arc::new(
        SqliteDatastore::in_memory(TableNaming::Standard)
            .await
            .expect("open"),
    );
    let store = EntityStore::new(datastore, Arc::new(FixedClock(now))).with_validation(false);
    store.ensure_schema().await.expect("schema");
    let profile_id = saved_profile(&store).await;

    let mut org = ProfileOrganization::new(profile_id, "x".repeat(256), "acme");
    let err = store.persist(&mut org).await.unwrap_err();
    assert!(err.is_validation(), "got {err:?}");
    assert_eq!(org.created, None);
}

#[tokio::test]
async fn legacy_naming_persists_content_items() {
    let store = sqlite_store(TableNaming::Legacy).await;
    let profile_id = saved_profile(&store).await;

    let mut item = ContentItem::new(profile_id, "member", PageAttributes::new("Legacy"));
    let item_id = store.persist(&mut item).await.expect("item");
    let mut participation = ContentItemParticipation::new(item_id, profile_id, "member");
    store
        .persist(&mut participation)
        .await
        .expect("participation");

    let found: Vec<ContentItemParticipation> = store
        .list_where("item_id", item_id.as_i64())
        .await
        .expect("list");
    assert_eq!(found, vec![participation]);
}

#[tokio::test]
async fn list_where_returns_children_in_identity_order() {
    let store = sqlite_store(TableNaming::Standard).await;
    let profile_id = saved_profile(&store).await;
    let mut item = ContentItem::new(profile_id, "member", PageAttributes::new("Thread"));
    let item_id = store.persist(&mut item).await.expect("item");

    for message in ["first", "second", "third"] {
        let mut comment = ContentItemComment::new(item_id, profile_id.as_i64(), "member", message);
        store.persist(&mut comment).await.expect("comment");
    }

    let comments: Vec<ContentItemComment> = store
        .list_where("item_id", item_id.as_i64())
        .await
        .expect("list");
    let messages: Vec<&str> = comments.iter().map(|c| c.message.as_str()).collect();
    assert_eq!(messages, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn delete_does_not_cascade() {
    let store = sqlite_store(TableNaming::Standard).await;
    let profile_id = saved_profile(&store).await;
    let mut follow = ContentFollow::new(profile_id.as_i64(), "member", 1, "topic");
    let follow_id = store.persist(&mut follow).await.expect("follow");

    assert!(store.delete::<ContentFollow>(follow_id).await.expect("delete"));
    assert!(store
        .load::<ContentFollow>(follow_id)
        .await
        .expect("load")
        .is_none());
    assert!(store.load::<Profile>(profile_id).await.expect("load").is_some());
}

#[tokio::test]
async fn updating_a_deleted_row_is_not_found() {
    let store = sqlite_store(TableNaming::Standard).await;
    let mut profile = Profile::new(TagSet::new());
    let id = store.persist(&mut profile).await.expect("persist");
    store.delete::<Profile>(id).await.expect("delete");

    let err = store.persist(&mut profile).await.unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");
}

#[tokio::test]
async fn system_clock_stamps_survive_a_round_trip() {
    let store = sqlite_store_with_clock(TableNaming::Standard, Arc::new(SystemClock::new())).await;
    let mut profile = Profile::new(["member"].into_iter().collect());
    let id = store.persist(&mut profile).await.expect("persist");

    let loaded: Profile = store.require(id).await.expect("load");
    assert_eq!(loaded, profile);
}

#[tokio::test]
async fn sub_microsecond_stamps_match_the_stored_row() {
    let base = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let clock = FixedClock(base + Duration::nanoseconds(987_654_321));
    let store = sqlite_store_with_clock(TableNaming::Standard, Arc::new(clock)).await;

    let mut topic = ContentTopic::new("Precision");
    let id = store.persist(&mut topic).await.expect("persist");

    assert_eq!(topic.created, Some(base + Duration::microseconds(987_654)));
    let loaded: ContentTopic = store.require(id).await.expect("load");
    assert_eq!(loaded, topic);
}

#[tokio::test]
async fn stored_update_stamp_advances_while_created_stays() {
    let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let t1 = t0 + Duration::minutes(5);
    let store =
        sqlite_store_with_clock(TableNaming::Standard, Arc::new(ticking_clock(vec![t0, t0, t1])))
            .await;
    let profile_id = saved_profile(&store).await;

    let mut org = ProfileOrganization::new(profile_id, "Acme", "acme");
    let id = store.persist(&mut org).await.expect("insert");
    org.name = "Acme Ltd".to_string();
    store.persist(&mut org).await.expect("update");

    let stored: ProfileOrganization = store.require(id).await.expect("load");
    assert_eq!(stored.name, "Acme Ltd");
    assert_eq!(stored.created, Some(t0));
    assert_eq!(stored.updated, Some(t1));
    assert!(stored.updated > stored.created);
    assert_eq!(stored, org);
}

#[tokio::test]
async fn stored_participation_keeps_posted_and_advances_updated() {
    let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let t1 = t0 + Duration::seconds(90);
    let store = sqlite_store_with_clock(
        TableNaming::Standard,
        Arc::new(ticking_clock(vec![t0, t0, t0, t1])),
    )
    .await;
    let profile_id = saved_profile(&store).await;
    let mut item = ContentItem::new(profile_id, "member", PageAttributes::new("Ticks"));
    let item_id = store.persist(&mut item).await.expect("item");

    let mut participation = ContentItemParticipation::new(item_id, profile_id, "member");
    let id = store.persist(&mut participation).await.expect("insert");
    let liked_at = t0 + Duration::seconds(30);
    participation.like(liked_at);
    store.persist(&mut participation).await.expect("update");

    let stored: ContentItemParticipation = store.require(id).await.expect("load");
    assert_eq!(stored.posted, Some(t0));
    assert_eq!(stored.updated, Some(t1));
    assert!(stored.updated > stored.posted);
    assert_eq!(stored.liked, Some(liked_at));
}

#[tokio::test]
async fn long_set_elements_are_rejected_without_validation() {
    let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let datastore: Arc<dyn DatastorePort> = Arc::new(
        SqliteDatastore::in_memory(TableNaming::Standard)
            .await
            .expect("open"),
    );
    let store = EntityStore::new(datastore, Arc::new(FixedClock(now))).with_validation(false);
    store.ensure_schema().await.expect("schema");

    let mut profile = Profile::new(["x".repeat(40)].into_iter().collect());
    assert!(profile.validate().is_err());
    let err = store.persist(&mut profile).await.unwrap_err();
    assert!(err.is_validation(), "got {err:?}");
    assert_eq!(profile.id, None);
    assert_eq!(profile.created, None);
}
