//! Delivery of outcomes back into the conversation

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::context::ConversationContext;
use crate::error::DeliveryError;
use crate::outcome::CallbackOutcome;

/// Conversational collaborator receiving resolved outcomes
#[async_trait]
pub trait OutcomeDelivery: Send + Sync {
	/// Delivers `outcome` to the conversation described by `context`
	async fn deliver_outcome(
		&self,
		outcome: &CallbackOutcome,
		context: &ConversationContext,
	) -> Result<(), DeliveryError>;
}

/// Logs outcomes instead of delivering them
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDelivery;

#[async_trait]
impl OutcomeDelivery for TracingDelivery {
	async fn deliver_outcome(
		&self,
		outcome: &CallbackOutcome,
		context: &ConversationContext,
	) -> Result<(), DeliveryError> {
		tracing::info!(
			kind = outcome.kind.name(),
			agent_id = %context.agent_id,
			room_id = %context.room_id,
			entity_id = %context.entity_id,
			summary = %outcome.summary(),
			"Verification outcome"
		);
		Ok(())
	}
}

/// Outcome as handed to an embedding runtime
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveredOutcome {
	/// Resolved outcome
	pub outcome: CallbackOutcome,
	/// Conversation to reply in
	pub context: ConversationContext,
	/// Reply text
	pub summary: String,
}

/// Forwards outcomes over a tokio channel
#[derive(Debug, Clone)]
pub struct ChannelDelivery {
	sender: mpsc::Sender<DeliveredOutcome>,
}

impl ChannelDelivery {
	/// Creates a delivery and the receiver the runtime reads from
	///
	/// A `buffer` of zero is raised to one.
	pub fn new(buffer: usize) -> (Self, mpsc::Receiver<DeliveredOutcome>) {
		let (sender, receiver) = mpsc::channel(buffer.max(1));
		(Self { sender }, receiver)
	}
}

#[async_trait]
impl OutcomeDelivery for ChannelDelivery {
	async fn deliver_outcome(
		&self,
		outcome: &CallbackOutcome,
		context: &ConversationContext,
	) -> Result<(), DeliveryError> {
		let delivered = DeliveredOutcome {
			outcome: outcome.clone(),
			context: *context,
			summary: outcome.summary(),
		};
		self.sender
			.send(delivered)
			.await
			.map_err(|_| DeliveryError::Closed)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::outcome::OutcomeKind;
	use rstest::rstest;
	use uuid::Uuid;

	fn outcome() -> CallbackOutcome {
		CallbackOutcome {
			sub: "did:example:alice".to_string(),
			reference: "ref-1".to_string(),
			kind: OutcomeKind::Auth,
		}
	}

	#[rstest]
	#[tokio::test]
	async fn test_channel_delivery_forwards_summary() {
		// Arrange
		let (delivery, mut receiver) = ChannelDelivery::new(4);
		let context = ConversationContext::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

		// Act
		delivery.deliver_outcome(&outcome(), &context).await.unwrap();

		// Assert
		let delivered = receiver.recv().await.unwrap();
		assert_eq!(delivered.context, context);
		assert_eq!(delivered.outcome, outcome());
		assert_eq!(
			delivered.summary,
			"You have successfully authenticated as did:example:alice"
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_zero_buffer_still_delivers() {
		let (delivery, mut receiver) = ChannelDelivery::new(0);
		let context = ConversationContext::new(Uuid::nil(), Uuid::nil(), Uuid::nil());

		delivery.deliver_outcome(&outcome(), &context).await.unwrap();

		assert_eq!(receiver.recv().await.unwrap().outcome, outcome());
	}

	#[rstest]
	#[tokio::test]
	async fn test_channel_delivery_reports_closed_receiver() {
		let (delivery, receiver) = ChannelDelivery::new(1);
		drop(receiver);
		let context = ConversationContext::new(Uuid::nil(), Uuid::nil(), Uuid::nil());

		let result = delivery.deliver_outcome(&outcome(), &context).await;

		assert_eq!(result, Err(DeliveryError::Closed));
	}

	#[rstest]
	#[tokio::test]
	async fn test_tracing_delivery_succeeds() {
		let context = ConversationContext::new(Uuid::nil(), Uuid::nil(), Uuid::nil());

		assert!(TracingDelivery.deliver_outcome(&outcome(), &context).await.is_ok());
	}
}
