use application::{MessageRepository, RoomRepository, UserRepository};
use chrono::{Duration, TimeZone, Utc};
use domain::{
    AuthorName, Message, MessageId, MessageScope, MessageText, PasswordHash, RepositoryError, Room,
    RoomId, RoomName, Timestamp, User, UserId, Username,
};
use infrastructure::InMemoryStorage;

fn at(seconds: i64) -> Timestamp {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::seconds(seconds)
}

fn room(name: &str, created: i64) -> Room {
    Room::new(RoomId::generate(), RoomName::parse(name).unwrap(), at(created))
}

fn message(text: &str, scope: MessageScope, created: i64) -> Message {
    Message::new(
        MessageId::generate(),
        MessageText::new(text).unwrap(),
        AuthorName::new("alice").unwrap(),
        scope,
        at(created),
    )
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let storage = InMemoryStorage::new();
    let user = |id| {
        User::register(
            id,
            Username::parse("alice").unwrap(),
            PasswordHash::new("hash").unwrap(),
            at(0),
        )
    };

    storage.user_repository.create(user(UserId::generate())).await.unwrap();
    let err = storage
        .user_repository
        .create(user(UserId::generate()))
        .await
        .unwrap_err();
    assert_eq!(err, RepositoryError::Conflict);

    let found = storage
        .user_repository
        .find_by_username(&Username::parse("alice").unwrap())
        .await
        .unwrap();
    assert!(found.is_some());
}

#[tokio::test]
async fn room_upsert_returns_existing_row() {
    let storage = InMemoryStorage::new();
    let first = storage.room_repository.upsert(room("General", 0)).await.unwrap();
    let again = storage.room_repository.upsert(room("General", 5)).await.unwrap();

    assert_eq!(first, again);
    assert_eq!(storage.room_repository.list().await.unwrap().len(), 1);
    assert_eq!(
        storage.room_repository.find_by_name("General").await.unwrap(),
        Some(first.clone())
    );
    assert_eq!(
        storage.room_repository.find_by_id(first.id).await.unwrap(),
        Some(first)
    );
}

#[tokio::test]
async fn rooms_list_oldest_first() {
    let storage = InMemoryStorage::new();
    storage.room_repository.upsert(room("Later", 10)).await.unwrap();
    storage.room_repository.upsert(room("Earlier", 1)).await.unwrap();

    let names: Vec<String> = storage
        .room_repository
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|room| room.name.as_str().to_owned())
        .collect();
    assert_eq!(names, vec!["Earlier", "Later"]);
}

#[tokio::test]
async fn messages_are_scoped_and_newest_first() {
    let storage = InMemoryStorage::new();
    let general = RoomId::generate();
    let repo = &storage.message_repository;

    repo.create(message("one", MessageScope::Room(general), 1)).await.unwrap();
    repo.create(message("legacy", MessageScope::Global, 2)).await.unwrap();
    repo.create(message("two", MessageScope::Room(general), 3)).await.unwrap();
    repo.create(message("elsewhere", MessageScope::Room(RoomId::generate()), 4))
        .await
        .unwrap();

    let texts = |messages: Vec<Message>| -> Vec<String> {
        messages.into_iter().map(|m| m.text.as_str().to_owned()).collect()
    };

    assert_eq!(
        texts(repo.list_by_scope(MessageScope::Room(general)).await.unwrap()),
        vec!["two", "one"]
    );
    assert_eq!(
        texts(repo.list_by_scope(MessageScope::Global).await.unwrap()),
        vec!["legacy"]
    );
    assert!(repo
        .list_by_scope(MessageScope::Room(RoomId::generate()))
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn same_timestamp_lists_later_write_first() {
    let storage = InMemoryStorage::new();
    let repo = &storage.message_repository;

    repo.create(message("first", MessageScope::Global, 0)).await.unwrap();
    repo.create(message("second", MessageScope::Global, 0)).await.unwrap();

    let listed = repo.list_by_scope(MessageScope::Global).await.unwrap();
    assert_eq!(listed[0].text.as_str(), "second");
    assert_eq!(listed[1].text.as_str(), "first");
}
