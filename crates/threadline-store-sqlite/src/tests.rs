//! Integration tests for `SqliteStore` against an in-memory database.

use threadline_core::{
  Classify, ErrorKind,
  identity::{Identity, NewIdentity, Role},
  message::{MessageFilter, NewMessage, SenderFilter},
  notification::NotificationType,
  store::MessageStore,
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

async fn user(s: &SqliteStore, name: &str) -> Identity {
  s.add_user(NewIdentity::new(name)).await.unwrap()
}

// ─── Identities ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_user() {
  let s = store().await;

  let mut input = NewIdentity::new("alice");
  input.email = Some("alice@example.com".into());
  input.role = Role::Host;
  let alice = s.add_user(input).await.unwrap();

  let fetched = s.get_user(alice.user_id).await.unwrap().unwrap();
  assert_eq!(fetched, alice);
  assert_eq!(fetched.role, Role::Host);
}

#[tokio::test]
async fn get_user_missing_returns_none() {
  let s = store().await;
  assert!(s.get_user(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_username_conflicts() {
  let s = store().await;
  user(&s, "alice").await;

  let err = s.add_user(NewIdentity::new("alice")).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[tokio::test]
async fn blank_username_is_rejected() {
  let s = store().await;
  let err = s.add_user(NewIdentity::new("  ")).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn get_users_skips_unknown_ids() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  let found = s
    .get_users(vec![alice.user_id, Uuid::new_v4(), bob.user_id])
    .await
    .unwrap();
  assert_eq!(found.len(), 2);
  assert!(s.get_users(Vec::new()).await.unwrap().is_empty());
}

// ─── Send ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn send_root_message_notifies_receiver() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  let m = s
    .send(NewMessage::new(alice.user_id, bob.user_id, "hi"))
    .await
    .unwrap();
  assert_eq!(m.parent_message_id, None);
  assert_eq!(m.thread_root_id, None);
  assert!(!m.is_edited);

  let fetched = s.get_message(m.message_id).await.unwrap().unwrap();
  assert_eq!(fetched, m);

  let notes = s.list_notifications(bob.user_id, false).await.unwrap();
  assert_eq!(notes.len(), 1);
  assert_eq!(notes[0].notification_type, NotificationType::Message);
  assert_eq!(notes[0].message_id, m.message_id);
  assert_eq!(notes[0].content, "alice sent you a message: hi");
  assert!(s.list_notifications(alice.user_id, false).await.unwrap().is_empty());
}

#[tokio::test]
async fn send_rejects_empty_content() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  let err = s
    .send(NewMessage::new(alice.user_id, bob.user_id, "   "))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
  assert!(s.list_unread(bob.user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn send_with_unknown_parent_is_not_found() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  let err = s
    .send(NewMessage::new(alice.user_id, bob.user_id, "hi").reply_to(Uuid::new_v4()))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(threadline_core::Error::MessageNotFound(_))
  ));
  assert!(s.list_unread(bob.user_id).await.unwrap().is_empty());
  assert!(s.list_notifications(bob.user_id, false).await.unwrap().is_empty());
}

#[tokio::test]
async fn send_to_unknown_user_is_not_found() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let err = s
    .send(NewMessage::new(alice.user_id, Uuid::new_v4(), "hi"))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(threadline_core::Error::UserNotFound(_))
  ));
}

#[tokio::test]
async fn reply_chain_points_at_root() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  let root = s
    .send(NewMessage::new(alice.user_id, bob.user_id, "m0"))
    .await
    .unwrap();

  let mut prev = root.clone();
  for i in 1..6 {
    let (from, to) = if i % 2 == 0 {
      (alice.user_id, bob.user_id)
    } else {
      (bob.user_id, alice.user_id)
    };
    let m = s
      .send(NewMessage::new(from, to, format!("m{i}")).reply_to(prev.message_id))
      .await
      .unwrap();
    assert_eq!(m.parent_message_id, Some(prev.message_id));
    assert_eq!(m.thread_root_id, Some(root.message_id));
    prev = m;
  }

  let stored = s.get_message(root.message_id).await.unwrap().unwrap();
  assert_eq!(stored.thread_root_id, None);
}

#[tokio::test]
async fn reply_notification_is_reply_type() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  let m1 = s
    .send(NewMessage::new(alice.user_id, bob.user_id, "hi"))
    .await
    .unwrap();
  s.send(NewMessage::new(bob.user_id, alice.user_id, "hello").reply_to(m1.message_id))
    .await
    .unwrap();

  let notes = s.list_notifications(alice.user_id, false).await.unwrap();
  assert_eq!(notes.len(), 1);
  assert_eq!(notes[0].notification_type, NotificationType::Reply);
  assert_eq!(notes[0].parent_message_id, Some(m1.message_id));
  assert_eq!(notes[0].content, "bob replied to your message: hello");
}

// ─── Threads ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_thread_of_fresh_message_is_just_that_message() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  let m = s
    .send(NewMessage::new(alice.user_id, bob.user_id, "hi"))
    .await
    .unwrap();

  let thread = s.get_thread(m.message_id).await.unwrap();
  assert_eq!(thread, vec![m]);
}

#[tokio::test]
async fn get_thread_from_any_member_returns_whole_thread_in_order() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  let root = s
    .send(NewMessage::new(alice.user_id, bob.user_id, "root"))
    .await
    .unwrap();
  let a = s
    .send(NewMessage::new(bob.user_id, alice.user_id, "a").reply_to(root.message_id))
    .await
    .unwrap();
  let b = s
    .send(NewMessage::new(alice.user_id, bob.user_id, "b").reply_to(a.message_id))
    .await
    .unwrap();
  // Unrelated thread.
  s.send(NewMessage::new(alice.user_id, bob.user_id, "other"))
    .await
    .unwrap();

  let expected = vec![root.message_id, a.message_id, b.message_id];
  for member in &expected {
    let ids: Vec<Uuid> = s
      .get_thread(*member)
      .await
      .unwrap()
      .into_iter()
      .map(|m| m.message_id)
      .collect();
    assert_eq!(ids, expected);
  }
}

#[tokio::test]
async fn get_thread_unknown_is_not_found() {
  let s = store().await;
  let err = s.get_thread(Uuid::new_v4()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ─── Listing ─────────────────────────────────────────────────────────────────

fn ids(messages: &[threadline_core::message::Message]) -> Vec<Uuid> {
  messages.iter().map(|m| m.message_id).collect()
}

#[tokio::test]
async fn list_messages_filters_by_sender_id_or_username() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  let a1 = s
    .send(NewMessage::new(alice.user_id, bob.user_id, "one"))
    .await
    .unwrap();
  s.send(NewMessage::new(bob.user_id, alice.user_id, "two"))
    .await
    .unwrap();
  let a2 = s
    .send(NewMessage::new(alice.user_id, bob.user_id, "three"))
    .await
    .unwrap();

  let by_id = s
    .list_messages(MessageFilter {
      sender: Some(SenderFilter::Id(alice.user_id)),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(ids(&by_id), vec![a1.message_id, a2.message_id]);

  let by_name = s
    .list_messages(MessageFilter {
      sender: Some(SenderFilter::Username("alice".into())),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(by_name, by_id);

  let nobody = s
    .list_messages(MessageFilter {
      sender: Some(SenderFilter::Username("mallory".into())),
      ..Default::default()
    })
    .await
    .unwrap();
  assert!(nobody.is_empty());
}

#[tokio::test]
async fn list_messages_date_range_is_inclusive() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  let mut sent = Vec::new();
  for text in ["a", "b", "c"] {
    sent.push(
      s.send(NewMessage::new(alice.user_id, bob.user_id, text))
        .await
        .unwrap(),
    );
  }

  let middle = s
    .list_messages(MessageFilter {
      start_date: Some(sent[1].timestamp),
      end_date: Some(sent[1].timestamp),
      ..Default::default()
    })
    .await
    .unwrap();
  assert!(middle.iter().any(|m| m.message_id == sent[1].message_id));
  assert!(middle.iter().all(|m| m.timestamp == sent[1].timestamp));

  let from_second = s
    .list_messages(MessageFilter {
      start_date: Some(sent[1].timestamp),
      ..Default::default()
    })
    .await
    .unwrap();
  assert!(!from_second.iter().any(|m| m.timestamp < sent[1].timestamp));
  assert!(from_second.iter().any(|m| m.message_id == sent[2].message_id));

  let err = s
    .list_messages(MessageFilter {
      start_date: Some(sent[2].timestamp),
      end_date: Some(sent[2].timestamp - chrono::Duration::seconds(1)),
      ..Default::default()
    })
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn list_messages_search_and_participant() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let carol = user(&s, "carol").await;

  let hit = s
    .send(NewMessage::new(alice.user_id, bob.user_id, "Lunch on FRIDAY?"))
    .await
    .unwrap();
  s.send(NewMessage::new(alice.user_id, bob.user_id, "see you monday"))
    .await
    .unwrap();
  let elsewhere = s
    .send(NewMessage::new(carol.user_id, alice.user_id, "friday works"))
    .await
    .unwrap();

  let found = s
    .list_messages(MessageFilter {
      search: Some("friday".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(ids(&found), vec![hit.message_id, elsewhere.message_id]);

  let bobs = s
    .list_messages(MessageFilter {
      participant: Some(bob.user_id),
      search: Some("friday".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(ids(&bobs), vec![hit.message_id]);

  let all = s.list_messages(MessageFilter::default()).await.unwrap();
  assert_eq!(all.len(), 3);
}

// ─── Edit ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn edit_records_history_and_notifies() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  let m1 = s
    .send(NewMessage::new(alice.user_id, bob.user_id, "hi"))
    .await
    .unwrap();
  let m2 = s
    .send(NewMessage::new(bob.user_id, alice.user_id, "hello").reply_to(m1.message_id))
    .await
    .unwrap();
  assert_eq!(m2.thread_root_id, Some(m1.message_id));

  let edited = s
    .edit(m1.message_id, alice.user_id, "hi!".into())
    .await
    .unwrap();
  assert!(edited.is_edited);
  assert_eq!(edited.content, "hi!");
  assert_eq!(s.get_message(m1.message_id).await.unwrap().unwrap(), edited);

  let history = s.get_history(m1.message_id).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].old_content, "hi");
  assert_eq!(history[0].editor_id, alice.user_id);

  let edits: Vec<_> = s
    .list_notifications(bob.user_id, false)
    .await
    .unwrap()
    .into_iter()
    .filter(|n| n.notification_type == NotificationType::Edit)
    .collect();
  assert_eq!(edits.len(), 1);
  assert_eq!(edits[0].message_id, m1.message_id);
}

#[tokio::test]
async fn repeated_edit_with_same_content_is_a_no_op() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  let m = s
    .send(NewMessage::new(alice.user_id, bob.user_id, "hi"))
    .await
    .unwrap();

  s.edit(m.message_id, alice.user_id, "hi!".into()).await.unwrap();
  let history_before = s.get_history(m.message_id).await.unwrap().len();
  let notes_before = s.list_notifications(bob.user_id, false).await.unwrap().len();

  let again = s.edit(m.message_id, alice.user_id, "hi!".into()).await.unwrap();
  assert_eq!(again.content, "hi!");

  assert_eq!(s.get_history(m.message_id).await.unwrap().len(), history_before);
  assert_eq!(
    s.list_notifications(bob.user_id, false).await.unwrap().len(),
    notes_before
  );
}

#[tokio::test]
async fn unchanged_first_edit_leaves_flag_clear() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  let m = s
    .send(NewMessage::new(alice.user_id, bob.user_id, "hi"))
    .await
    .unwrap();
  let same = s.edit(m.message_id, alice.user_id, "hi".into()).await.unwrap();
  assert!(!same.is_edited);
  assert!(s.get_history(m.message_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn edit_by_receiver_does_not_notify() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  let m = s
    .send(NewMessage::new(alice.user_id, bob.user_id, "hi"))
    .await
    .unwrap();
  s.edit(m.message_id, bob.user_id, "hi (annotated)".into())
    .await
    .unwrap();

  let notes = s.list_notifications(bob.user_id, false).await.unwrap();
  assert!(notes.iter().all(|n| n.notification_type != NotificationType::Edit));
  assert_eq!(s.get_history(m.message_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn history_is_append_only_and_ordered() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  let m = s
    .send(NewMessage::new(alice.user_id, bob.user_id, "v1"))
    .await
    .unwrap();
  s.edit(m.message_id, alice.user_id, "v2".into()).await.unwrap();
  s.edit(m.message_id, alice.user_id, "v3".into()).await.unwrap();

  let old: Vec<String> = s
    .get_history(m.message_id)
    .await
    .unwrap()
    .into_iter()
    .map(|h| h.old_content)
    .collect();
  assert_eq!(old, vec!["v1", "v2"]);
}

#[tokio::test]
async fn edit_missing_message_is_not_found() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let err = s
    .edit(Uuid::new_v4(), alice.user_id, "x".into())
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    crate::Error::Core(threadline_core::Error::MessageNotFound(_))
  ));
}

#[tokio::test]
async fn empty_edit_of_missing_message_is_not_found() {
  let s = store().await;
  let alice = user(&s, "alice").await;

  let err = s
    .edit(Uuid::new_v4(), alice.user_id, "  ".into())
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn edit_to_empty_content_is_rejected() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  let m = s
    .send(NewMessage::new(alice.user_id, bob.user_id, "hi"))
    .await
    .unwrap();
  let err = s.edit(m.message_id, alice.user_id, "".into()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
}

// ─── Unread and notifications ────────────────────────────────────────────────

#[tokio::test]
async fn list_unread_and_mark_read() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  let m1 = s
    .send(NewMessage::new(alice.user_id, bob.user_id, "one"))
    .await
    .unwrap();
  let m2 = s
    .send(NewMessage::new(alice.user_id, bob.user_id, "two").reply_to(m1.message_id))
    .await
    .unwrap();

  let unread = s.list_unread(bob.user_id).await.unwrap();
  assert_eq!(unread.len(), 2);
  assert_eq!(unread[1].message_id, m2.message_id);
  assert_eq!(unread[1].parent_message_id, Some(m1.message_id));
  assert_eq!(unread[1].sender_id, alice.user_id);

  let read = s.mark_read(m1.message_id).await.unwrap();
  assert!(read.read);

  let unread = s.list_unread(bob.user_id).await.unwrap();
  assert_eq!(unread.len(), 1);
  assert_eq!(unread[0].message_id, m2.message_id);
  assert!(s.list_unread(alice.user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn mark_read_missing_is_not_found() {
  let s = store().await;
  let err = s.mark_read(Uuid::new_v4()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn notifications_are_newest_first() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  let first = s
    .send(NewMessage::new(alice.user_id, bob.user_id, "first"))
    .await
    .unwrap();
  let second = s
    .send(NewMessage::new(alice.user_id, bob.user_id, "second"))
    .await
    .unwrap();

  let notes = s.list_notifications(bob.user_id, false).await.unwrap();
  let ids: Vec<Uuid> = notes.iter().map(|n| n.message_id).collect();
  assert_eq!(ids, vec![second.message_id, first.message_id]);
}

#[tokio::test]
async fn mark_notification_read_filters_unread() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  s.send(NewMessage::new(alice.user_id, bob.user_id, "a"))
    .await
    .unwrap();
  s.send(NewMessage::new(alice.user_id, bob.user_id, "b"))
    .await
    .unwrap();

  let notes = s.list_notifications(bob.user_id, true).await.unwrap();
  assert_eq!(notes.len(), 2);

  let marked = s
    .mark_notification_read(notes[0].notification_id)
    .await
    .unwrap();
  assert!(marked.is_read);

  let unread = s.list_notifications(bob.user_id, true).await.unwrap();
  assert_eq!(unread.len(), 1);
  assert_eq!(unread[0].notification_id, notes[1].notification_id);
  assert_eq!(s.list_notifications(bob.user_id, false).await.unwrap().len(), 2);

  let err = s.mark_notification_read(Uuid::new_v4()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn long_content_preview_is_truncated() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  let body = "x".repeat(80);
  s.send(NewMessage::new(alice.user_id, bob.user_id, body))
    .await
    .unwrap();

  let notes = s.list_notifications(bob.user_id, false).await.unwrap();
  let expected = format!("alice sent you a message: {}...", "x".repeat(50));
  assert_eq!(notes[0].content, expected);
}

// ─── Cascade deletion ────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_identity_removes_footprint() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let carol = user(&s, "carol").await;

  let m1 = s
    .send(NewMessage::new(alice.user_id, bob.user_id, "hi"))
    .await
    .unwrap();
  let m2 = s
    .send(NewMessage::new(bob.user_id, alice.user_id, "hello").reply_to(m1.message_id))
    .await
    .unwrap();
  // Alice edits a message carol sent her, leaving a history row she authored.
  let from_carol = s
    .send(NewMessage::new(carol.user_id, alice.user_id, "hey"))
    .await
    .unwrap();
  let kept = s
    .send(NewMessage::new(carol.user_id, bob.user_id, "unrelated"))
    .await
    .unwrap();
  s.edit(kept.message_id, carol.user_id, "unrelated!".into())
    .await
    .unwrap();

  let report = s.delete_identity(alice.user_id).await.unwrap();
  assert_eq!(report.messages, 3);
  assert!(report.notifications >= 2);

  assert!(s.get_user(alice.user_id).await.unwrap().is_none());
  for id in [m1.message_id, m2.message_id, from_carol.message_id] {
    assert!(s.get_message(id).await.unwrap().is_none());
    let err = s.get_thread(id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
  }

  // Bob keeps only what does not involve alice.
  let bob_notes = s.list_notifications(bob.user_id, false).await.unwrap();
  assert!(bob_notes.iter().all(|n| n.message_id == kept.message_id));
  assert_eq!(bob_notes.len(), 2);
  assert_eq!(s.get_history(kept.message_id).await.unwrap().len(), 1);
  assert_eq!(s.get_thread(kept.message_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn delete_identity_removes_authored_history_on_surviving_messages() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let carol = user(&s, "carol").await;

  let m = s
    .send(NewMessage::new(bob.user_id, carol.user_id, "draft"))
    .await
    .unwrap();
  s.edit(m.message_id, alice.user_id, "draft (fixed)".into())
    .await
    .unwrap();
  s.edit(m.message_id, bob.user_id, "final".into()).await.unwrap();

  let report = s.delete_identity(alice.user_id).await.unwrap();
  assert_eq!(report.history, 1);
  assert_eq!(report.messages, 0);

  let history = s.get_history(m.message_id).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].editor_id, bob.user_id);
  assert_eq!(s.get_message(m.message_id).await.unwrap().unwrap().content, "final");
}

#[tokio::test]
async fn deleting_a_thread_root_removes_third_party_replies() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let carol = user(&s, "carol").await;

  let root = s
    .send(NewMessage::new(alice.user_id, bob.user_id, "root"))
    .await
    .unwrap();
  let reply = s
    .send(NewMessage::new(bob.user_id, carol.user_id, "fwd").reply_to(root.message_id))
    .await
    .unwrap();
  let nested = s
    .send(NewMessage::new(carol.user_id, bob.user_id, "ack").reply_to(reply.message_id))
    .await
    .unwrap();

  s.delete_identity(alice.user_id).await.unwrap();

  assert!(s.get_message(reply.message_id).await.unwrap().is_none());
  assert!(s.get_message(nested.message_id).await.unwrap().is_none());
  assert!(s.list_notifications(carol.user_id, false).await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_the_root_of_a_very_deep_chain_succeeds() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let carol = user(&s, "carol").await;

  let root = s
    .send(NewMessage::new(alice.user_id, bob.user_id, "root"))
    .await
    .unwrap();
  let mut last = root.message_id;
  for i in 0..1500 {
    let (from, to) = if i % 2 == 0 {
      (bob.user_id, carol.user_id)
    } else {
      (carol.user_id, bob.user_id)
    };
    last = s
      .send(NewMessage::new(from, to, format!("r{i}")).reply_to(last))
      .await
      .unwrap()
      .message_id;
  }
  assert_eq!(s.get_thread(last).await.unwrap().len(), 1501);

  let report = s.delete_identity(alice.user_id).await.unwrap();
  assert_eq!(report.messages, 1);

  assert!(s.get_message(last).await.unwrap().is_none());
  assert_eq!(s.get_thread(last).await.unwrap_err().kind(), ErrorKind::NotFound);
  assert!(s.list_notifications(carol.user_id, false).await.unwrap().is_empty());
  assert!(s.list_unread(bob.user_id).await.unwrap().is_empty());
  assert!(s.get_user(bob.user_id).await.unwrap().is_some());
}

#[tokio::test]
async fn deleting_a_mid_chain_participant_keeps_the_chain_above() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;
  let carol = user(&s, "carol").await;

  let root = s
    .send(NewMessage::new(alice.user_id, bob.user_id, "root"))
    .await
    .unwrap();
  let mut last = root.message_id;
  for i in 0..1200 {
    let (from, to) = if i % 2 == 0 {
      (bob.user_id, alice.user_id)
    } else {
      (alice.user_id, bob.user_id)
    };
    last = s
      .send(NewMessage::new(from, to, format!("r{i}")).reply_to(last))
      .await
      .unwrap()
      .message_id;
  }
  let kept_tail = last;

  // Carol joins at depth 1201; everything below her message goes with her.
  let mut below = s
    .send(NewMessage::new(carol.user_id, alice.user_id, "cc").reply_to(last))
    .await
    .unwrap()
    .message_id;
  let carols = below;
  for i in 0..1100 {
    below = s
      .send(NewMessage::new(alice.user_id, bob.user_id, format!("s{i}")).reply_to(below))
      .await
      .unwrap()
      .message_id;
  }

  let report = s.delete_identity(carol.user_id).await.unwrap();
  assert_eq!(report.messages, 1);

  assert!(s.get_message(carols).await.unwrap().is_none());
  assert!(s.get_message(below).await.unwrap().is_none());
  assert!(s.get_message(kept_tail).await.unwrap().is_some());
  assert_eq!(s.get_thread(kept_tail).await.unwrap().len(), 1201);
}

#[tokio::test]
async fn delete_unknown_identity_is_not_found() {
  let s = store().await;
  let err = s.delete_identity(Uuid::new_v4()).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

// ─── Atomicity ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_notification_rolls_back_send() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  s.execute_batch(
    "CREATE TRIGGER fail_notifications BEFORE INSERT ON notifications
     BEGIN SELECT RAISE(ABORT, 'notifications unavailable'); END;",
  )
  .await
  .unwrap();

  let err = s
    .send(NewMessage::new(alice.user_id, bob.user_id, "hi"))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::TransactionFailure);
  assert!(s.list_unread(bob.user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_notification_rolls_back_edit() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  let m = s
    .send(NewMessage::new(alice.user_id, bob.user_id, "hi"))
    .await
    .unwrap();

  s.execute_batch(
    "CREATE TRIGGER fail_edit_notifications BEFORE INSERT ON notifications
     WHEN NEW.notification_type = 'edit'
     BEGIN SELECT RAISE(ABORT, 'notifications unavailable'); END;",
  )
  .await
  .unwrap();

  let err = s
    .edit(m.message_id, alice.user_id, "hi!".into())
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::TransactionFailure);

  let stored = s.get_message(m.message_id).await.unwrap().unwrap();
  assert_eq!(stored.content, "hi");
  assert!(!stored.is_edited);
  assert!(s.get_history(m.message_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_cascade_changes_nothing() {
  let s = store().await;
  let alice = user(&s, "alice").await;
  let bob = user(&s, "bob").await;

  let m = s
    .send(NewMessage::new(alice.user_id, bob.user_id, "hi"))
    .await
    .unwrap();

  s.execute_batch(
    "CREATE TRIGGER keep_users BEFORE DELETE ON users
     BEGIN SELECT RAISE(ABORT, 'users are locked'); END;",
  )
  .await
  .unwrap();

  let err = s.delete_identity(alice.user_id).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::TransactionFailure);

  assert!(s.get_user(alice.user_id).await.unwrap().is_some());
  assert!(s.get_message(m.message_id).await.unwrap().is_some());
  assert_eq!(s.list_notifications(bob.user_id, false).await.unwrap().len(), 1);
}
