//! Integration tests for `SqliteStore` against an in-memory database.

use agora_core::{
  content::{NewComment, NewPost},
  store::{ContentStore, StoreError as _},
  user::{NewUser, Role, User},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn new_user(email: &str) -> NewUser {
  NewUser {
    name:              "Lovelace".into(),
    first_name:        "Ada".into(),
    email:             email.into(),
    country:           "UK".into(),
    password_hash:     "$argon2id$placeholder".into(),
    verified:          false,
    verification_code: "123456".into(),
    role:              Role::User,
  }
}

async fn user(s: &SqliteStore, email: &str) -> User {
  s.insert_user(new_user(email)).await.unwrap()
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_user() {
  let s = store().await;
  let u = user(&s, "ada@example.com").await;

  let fetched = s.get_user(u.id).await.unwrap().unwrap();
  assert_eq!(fetched.email, "ada@example.com");
  assert_eq!(fetched.role, Role::User);
  assert!(!fetched.verified);
  assert_eq!(fetched.verification_code, "123456");
  assert_eq!(fetched.created_at, u.created_at);
}

#[tokio::test]
async fn get_user_missing_returns_none() {
  let s = store().await;
  assert!(s.get_user(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
  let s = store().await;
  user(&s, "ada@example.com").await;

  let err = s.insert_user(new_user("ada@example.com")).await.unwrap_err();
  assert!(matches!(err, Error::DuplicateEmail(ref e) if e == "ada@example.com"));
  assert!(err.is_duplicate());
}

#[tokio::test]
async fn email_lookup_is_case_sensitive() {
  let s = store().await;
  user(&s, "ada@example.com").await;

  assert!(s.find_user_by_email("ada@example.com").await.unwrap().is_some());
  assert!(s.find_user_by_email("ADA@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn save_user_persists_verification_and_role() {
  let s = store().await;
  let current = user(&s, "ada@example.com").await;
  let mut u = current.clone();

  assert!(u.verify("123456"));
  assert!(u.promote());
  let saved = s.save_user(&current, &u).await.unwrap().unwrap();
  assert!(saved.updated_at >= u.created_at);

  let fetched = s.get_user(u.id).await.unwrap().unwrap();
  assert!(fetched.verified);
  assert!(fetched.verification_code.is_empty());
  assert_eq!(fetched.role, Role::Admin);
}

#[tokio::test]
async fn has_admin_reflects_roles() {
  let s = store().await;
  assert!(!s.has_admin().await.unwrap());

  let current = user(&s, "ada@example.com").await;
  assert!(!s.has_admin().await.unwrap());

  let mut u = current.clone();
  u.promote();
  s.save_user(&current, &u).await.unwrap();
  assert!(s.has_admin().await.unwrap());
}

#[tokio::test]
async fn save_user_from_a_stale_read_is_refused() {
  let s = store().await;
  let current = user(&s, "ada@example.com").await;

  let mut first = current.clone();
  assert!(first.verify("123456"));
  let mut second = current.clone();
  assert!(second.verify("123456"));

  assert!(s.save_user(&current, &first).await.unwrap().is_some());
  assert!(s.save_user(&current, &second).await.unwrap().is_none());
}

#[tokio::test]
async fn second_promotion_from_the_same_read_is_refused() {
  let s = store().await;
  let current = user(&s, "ada@example.com").await;
  let mut promoted = current.clone();
  promoted.promote();

  assert!(s.save_user(&current, &promoted).await.unwrap().is_some());
  assert!(s.save_user(&current, &promoted).await.unwrap().is_none());
  assert_eq!(s.get_user(current.id).await.unwrap().unwrap().role, Role::Admin);
}

#[tokio::test]
async fn save_user_for_missing_user_returns_none() {
  let s = store().await;
  let ghost = user(&s, "ada@example.com").await;
  let mut ghost = User { id: Uuid::new_v4(), ..ghost };
  let current = ghost.clone();
  ghost.promote();

  assert!(s.save_user(&current, &ghost).await.unwrap().is_none());
}

// ─── Posts ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_post_and_read_view_with_owner() {
  let s = store().await;
  let u = user(&s, "ada@example.com").await;

  let post = s
    .insert_post(NewPost { owner_id: u.id, content: "first".into() })
    .await
    .unwrap();
  assert_eq!(post.version, 1);

  let view = s.get_post_view(post.id).await.unwrap().unwrap();
  assert_eq!(view.post, post);
  assert_eq!(view.owner.id, u.id);
  assert_eq!(view.owner.email, "ada@example.com");
  assert_eq!(view.owner.role, Role::User);
}

#[tokio::test]
async fn list_posts_newest_first() {
  let s = store().await;
  let u = user(&s, "ada@example.com").await;

  let a = s.insert_post(NewPost { owner_id: u.id, content: "a".into() }).await.unwrap();
  let b = s.insert_post(NewPost { owner_id: u.id, content: "b".into() }).await.unwrap();

  let ids: Vec<Uuid> = s.list_posts().await.unwrap().into_iter().map(|v| v.post.id).collect();
  assert_eq!(ids, vec![b.id, a.id]);
}

#[tokio::test]
async fn update_post_bumps_version() {
  let s = store().await;
  let u = user(&s, "ada@example.com").await;
  let mut post = s
    .insert_post(NewPost { owner_id: u.id, content: "draft".into() })
    .await
    .unwrap();

  post.content = "final".into();
  let updated = s.update_post(&post).await.unwrap().unwrap();
  assert_eq!(updated.version, 2);
  assert_eq!(updated.owner_id, u.id);

  let fetched = s.get_post(post.id).await.unwrap().unwrap();
  assert_eq!(fetched, updated);
}

#[tokio::test]
async fn update_post_with_stale_version_is_refused() {
  let s = store().await;
  let u = user(&s, "ada@example.com").await;
  let original = s
    .insert_post(NewPost { owner_id: u.id, content: "v1".into() })
    .await
    .unwrap();

  let mut first = original.clone();
  first.content = "writer one".into();
  let mut second = original.clone();
  second.content = "writer two".into();

  assert!(s.update_post(&first).await.unwrap().is_some());
  assert!(s.update_post(&second).await.unwrap().is_none());

  let stored = s.get_post(original.id).await.unwrap().unwrap();
  assert_eq!(stored.content, "writer one");
}

#[tokio::test]
async fn delete_post_cascades_to_comments() {
  let s = store().await;
  let u = user(&s, "ada@example.com").await;
  let post = s.insert_post(NewPost { owner_id: u.id, content: "p".into() }).await.unwrap();
  let comment = s
    .insert_comment(NewComment { owner_id: u.id, post_id: post.id, content: "c".into() })
    .await
    .unwrap();

  assert!(s.delete_post(post.id).await.unwrap());
  assert!(s.get_post(post.id).await.unwrap().is_none());
  assert!(s.get_comment(comment.id).await.unwrap().is_none());
  assert!(!s.delete_post(post.id).await.unwrap());
}

#[tokio::test]
async fn post_by_unknown_owner_is_a_missing_reference() {
  let s = store().await;
  let err = s
    .insert_post(NewPost { owner_id: Uuid::new_v4(), content: "orphan".into() })
    .await
    .unwrap_err();
  assert!(err.is_missing_reference());
  assert!(!err.is_duplicate());
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn comments_for_post_are_filtered_and_newest_first() {
  let s = store().await;
  let u = user(&s, "ada@example.com").await;
  let p1 = s.insert_post(NewPost { owner_id: u.id, content: "1".into() }).await.unwrap();
  let p2 = s.insert_post(NewPost { owner_id: u.id, content: "2".into() }).await.unwrap();

  let c1 = s
    .insert_comment(NewComment { owner_id: u.id, post_id: p1.id, content: "old".into() })
    .await
    .unwrap();
  let c2 = s
    .insert_comment(NewComment { owner_id: u.id, post_id: p1.id, content: "new".into() })
    .await
    .unwrap();
  s.insert_comment(NewComment { owner_id: u.id, post_id: p2.id, content: "other".into() })
    .await
    .unwrap();

  let ids: Vec<Uuid> = s
    .list_comments_for_post(p1.id)
    .await
    .unwrap()
    .into_iter()
    .map(|c| c.id)
    .collect();
  assert_eq!(ids, vec![c2.id, c1.id]);

  assert_eq!(s.list_comments().await.unwrap().len(), 3);
}

#[tokio::test]
async fn comment_on_deleted_post_is_a_missing_reference() {
  let s = store().await;
  let u = user(&s, "ada@example.com").await;
  let p = s.insert_post(NewPost { owner_id: u.id, content: "p".into() }).await.unwrap();
  s.delete_post(p.id).await.unwrap();

  let err = s
    .insert_comment(NewComment { owner_id: u.id, post_id: p.id, content: "late".into() })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::MissingReference(_)));
}

#[tokio::test]
async fn update_and_delete_comment() {
  let s = store().await;
  let u = user(&s, "ada@example.com").await;
  let p = s.insert_post(NewPost { owner_id: u.id, content: "p".into() }).await.unwrap();
  let mut c = s
    .insert_comment(NewComment { owner_id: u.id, post_id: p.id, content: "typo".into() })
    .await
    .unwrap();

  c.content = "fixed".into();
  let updated = s.update_comment(&c).await.unwrap().unwrap();
  assert_eq!(updated.version, 2);
  assert!(s.update_comment(&c).await.unwrap().is_none());

  assert!(s.delete_comment(c.id).await.unwrap());
  assert!(!s.delete_comment(c.id).await.unwrap());
}

#[tokio::test]
async fn repeated_reads_are_identical() {
  let s = store().await;
  let u = user(&s, "ada@example.com").await;
  let p = s.insert_post(NewPost { owner_id: u.id, content: "same".into() }).await.unwrap();

  let first = s.get_post_view(p.id).await.unwrap();
  let second = s.get_post_view(p.id).await.unwrap();
  assert_eq!(first, second);
}
