//! Conversational context

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where an outcome must be delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationContext {
	/// Agent that issued the invite
	pub agent_id: Uuid,
	/// Conversation the invite was issued in
	pub room_id: Uuid,
	/// Participant asked to verify
	pub entity_id: Uuid,
}

impl ConversationContext {
	/// Creates a context
	pub fn new(agent_id: Uuid, room_id: Uuid, entity_id: Uuid) -> Self {
		Self {
			agent_id,
			room_id,
			entity_id,
		}
	}
}
