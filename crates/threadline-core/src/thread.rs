//! Thread assembly: turn the flat output of
//! [`crate::store::MessageStore::get_thread`] into a reply tree.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{identity::UserRef, message::Message};

/// One message in a rendered thread, with its direct replies nested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreadNode {
  #[serde(rename = "id")]
  pub message_id:        Uuid,
  pub content:           String,
  pub timestamp:         DateTime<Utc>,
  pub is_edited:         bool,
  pub parent_message_id: Option<Uuid>,
  pub thread_root_id:    Option<Uuid>,
  pub sender:            UserRef,
  pub receiver:          UserRef,
  pub replies:           Vec<ThreadNode>,
}

impl ThreadNode {
  fn new(
    message: Message,
    replies: Vec<ThreadNode>,
    participants: &HashMap<Uuid, UserRef>,
  ) -> Self {
    let lookup = |id: Uuid| {
      participants
        .get(&id)
        .cloned()
        .unwrap_or(UserRef { id, username: String::new() })
    };

    Self {
      sender: lookup(message.sender_id),
      receiver: lookup(message.receiver_id),
      message_id: message.message_id,
      content: message.content,
      timestamp: message.timestamp,
      is_edited: message.is_edited,
      parent_message_id: message.parent_message_id,
      thread_root_id: message.thread_root_id,
      replies,
    }
  }

  /// Total number of nodes in this subtree, including `self`.
  pub fn subtree_size(&self) -> usize {
    1 + self.replies.iter().map(ThreadNode::subtree_size).sum::<usize>()
  }
}

/// Build the reply forest for one thread.
///
/// Messages without a parent become roots. A message whose parent is not in
/// `messages` is dropped together with everything below it; this is not an
/// error. Sibling order follows input order, so feeding timestamp-ordered
/// messages yields chronologically ordered replies.
///
/// Runs in O(n) and never recurses on thread depth.
pub fn build_tree(
  messages: Vec<Message>,
  participants: &HashMap<Uuid, UserRef>,
) -> Vec<ThreadNode> {
  let index: HashMap<Uuid, usize> = messages
    .iter()
    .enumerate()
    .map(|(i, m)| (m.message_id, i))
    .collect();

  let mut children: Vec<Vec<usize>> = vec![Vec::new(); messages.len()];
  let mut roots = Vec::new();
  for (i, m) in messages.iter().enumerate() {
    match m.parent_message_id {
      None => roots.push(i),
      Some(parent) => {
        if let Some(&p) = index.get(&parent) {
          children[p].push(i);
        }
      }
    }
  }

  // Pre-order walk from the roots; only reachable messages are visited.
  let mut order = Vec::with_capacity(messages.len());
  let mut stack = roots.clone();
  while let Some(i) = stack.pop() {
    order.push(i);
    stack.extend(children[i].iter().copied());
  }

  // Build bottom-up: every child is finished before its parent.
  let mut pending: Vec<Option<Message>> = messages.into_iter().map(Some).collect();
  let mut built: Vec<Option<ThreadNode>> = (0..pending.len()).map(|_| None).collect();
  for &i in order.iter().rev() {
    let Some(message) = pending[i].take() else { continue };
    let replies = children[i]
      .iter()
      .filter_map(|&c| built[c].take())
      .collect();
    built[i] = Some(ThreadNode::new(message, replies, participants));
  }

  roots.into_iter().filter_map(|r| built[r].take()).collect()
}
