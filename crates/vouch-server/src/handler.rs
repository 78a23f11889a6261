//! Request routing

use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::{Method, Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vouch_conf::CALLBACK_PATH;
use vouch_invite::{ConversationContext, Invite, VerificationScope, VerificationService};

use crate::error::ServerError;

/// Path of the invite endpoint
pub const INVITES_PATH: &str = "/api/invites";

/// Page shown once a callback has been resolved
pub const COMPLETED_MESSAGE: &str =
	"Verification complete. You can close this window and return to the conversation.";

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

#[derive(Debug, Deserialize)]
struct CallbackParams {
	response: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InviteRequest {
	#[serde(default)]
	scope: Option<String>,
	#[serde(default)]
	text: Option<String>,
	agent_id: Uuid,
	room_id: Uuid,
	entity_id: Uuid,
}

#[derive(Debug, Serialize)]
struct InviteResponse<'a> {
	#[serde(flatten)]
	invite: &'a Invite,
	#[serde(skip_serializing_if = "Option::is_none")]
	intent: Option<&'a str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	message: Option<&'a str>,
}

/// Routes requests to the verification service
#[derive(Clone)]
pub struct VerificationHandler {
	service: Arc<VerificationService>,
}

impl VerificationHandler {
	/// Creates a handler
	pub fn new(service: Arc<VerificationService>) -> Self {
		Self { service }
	}

	/// Handles one request with a fully read body
	///
	/// | Route | Success |
	/// |---|---|
	/// | `GET /api/oidc/callback?response=...` | 200, plain text |
	/// | `POST /api/oidc/callback` (form or JSON `response`) | 200, plain text |
	/// | `POST /api/invites` | 200, JSON `{url, ref}` |
	pub async fn handle(&self, request: Request<Bytes>) -> Response<Full<Bytes>> {
		let path = request.uri().path().to_string();
		match (request.method(), path.as_str()) {
			(&Method::GET, CALLBACK_PATH) => {
				let params = query_params(request.uri().query());
				text_response(self.callback(params).await)
			}
			(&Method::POST, CALLBACK_PATH) => {
				let params = body_params(&request);
				text_response(self.callback(params).await)
			}
			(&Method::POST, INVITES_PATH) => json_response(self.invite(request.body()).await),
			(_, CALLBACK_PATH) | (_, INVITES_PATH) => text_response(Err(ServerError::MethodNotAllowed)),
			_ => text_response(Err(ServerError::NotFound)),
		}
	}

	async fn callback(
		&self,
		params: Result<CallbackParams, ServerError>,
	) -> Result<String, ServerError> {
		let params = params?;
		match self.service.resolve_callback(&params.response).await {
			Ok(outcome) => {
				tracing::debug!(kind = outcome.kind.name(), "Callback completed");
				Ok(COMPLETED_MESSAGE.to_string())
			}
			Err(error) => {
				tracing::warn!(error = %error, "Callback failed");
				Err(error.into())
			}
		}
	}

	async fn invite(&self, body: &Bytes) -> Result<Vec<u8>, ServerError> {
		let request: InviteRequest = serde_json::from_slice(body)
			.map_err(|e| ServerError::BadRequest(format!("Invalid invite request: {}", e)))?;
		let context = ConversationContext::new(request.agent_id, request.room_id, request.entity_id);

		let (intent, invite) = match (request.scope, request.text) {
			(Some(scope), _) => {
				let scope: VerificationScope = scope.parse()?;
				(None, self.service.issue_invite(scope, context).await?)
			}
			(None, Some(text)) => match self.service.issue_invite_for_text(&text, context).await? {
				Some((intent, invite)) => (Some(intent), invite),
				None => {
					return Err(ServerError::BadRequest(
						"No verification matches the request text".to_string(),
					));
				}
			},
			(None, None) => {
				return Err(ServerError::BadRequest(
					"Either scope or text is required".to_string(),
				));
			}
		};

		let response = InviteResponse {
			invite: &invite,
			intent: intent.map(|i| i.label),
			message: intent.map(|i| i.reply),
		};
		serde_json::to_vec(&response).map_err(|e| ServerError::Upstream(e.to_string()))
	}
}

fn query_params(query: Option<&str>) -> Result<CallbackParams, ServerError> {
	serde_urlencoded::from_str(query.unwrap_or_default())
		.map_err(|_| ServerError::BadRequest("Missing response parameter".to_string()))
}

fn body_params(request: &Request<Bytes>) -> Result<CallbackParams, ServerError> {
	let is_json = request
		.headers()
		.get(CONTENT_TYPE)
		.and_then(|v| v.to_str().ok())
		.is_some_and(|v| v.starts_with(APPLICATION_JSON));

	let parsed = if is_json {
		serde_json::from_slice(request.body()).ok()
	} else {
		serde_urlencoded::from_bytes(request.body()).ok()
	};
	parsed.ok_or_else(|| ServerError::BadRequest("Missing response parameter".to_string()))
}

fn text_response(result: Result<String, ServerError>) -> Response<Full<Bytes>> {
	match result {
		Ok(body) => build(StatusCode::OK, TEXT_PLAIN, body.into_bytes()),
		Err(error) => build(error.status(), TEXT_PLAIN, error.public_message().into_bytes()),
	}
}

fn json_response(result: Result<Vec<u8>, ServerError>) -> Response<Full<Bytes>> {
	match result {
		Ok(body) => build(StatusCode::OK, APPLICATION_JSON, body),
		Err(error) => {
			if let ServerError::Upstream(detail) = &error {
				tracing::warn!(error = %detail, "Invite issuance failed");
			}
			let body = serde_json::json!({ "error": error.public_message() }).to_string();
			build(error.status(), APPLICATION_JSON, body.into_bytes())
		}
	}
}

fn build(status: StatusCode, content_type: &'static str, body: Vec<u8>) -> Response<Full<Bytes>> {
	let mut response = Response::new(Full::new(Bytes::from(body)));
	*response.status_mut() = status;
	response
		.headers_mut()
		.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
	response
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn post(content_type: &str, body: &str) -> Request<Bytes> {
		let mut request = Request::new(Bytes::from(body.to_string()));
		*request.method_mut() = Method::POST;
		request
			.headers_mut()
			.insert(CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
		request
	}

	#[rstest]
	#[case("application/x-www-form-urlencoded", "response=a.b.c")]
	#[case("application/json", r#"{"response":"a.b.c"}"#)]
	#[case("application/json; charset=utf-8", r#"{"response":"a.b.c"}"#)]
	fn test_body_params(#[case] content_type: &str, #[case] body: &str) {
		// Act
		let params = body_params(&post(content_type, body)).unwrap();

		// Assert
		assert_eq!(params.response, "a.b.c");
	}

	#[rstest]
	#[case(None)]
	#[case(Some("state=abc"))]
	fn test_query_without_response(#[case] query: Option<&str>) {
		// Act
		let result = query_params(query);

		// Assert
		assert!(matches!(result, Err(ServerError::BadRequest(_))));
	}

	#[rstest]
	fn test_query_params() {
		// Act
		let params = query_params(Some("response=a.b.c&iss=x")).unwrap();

		// Assert
		assert_eq!(params.response, "a.b.c");
	}

	#[rstest]
	fn test_build_sets_content_type() {
		// Act
		let response = build(StatusCode::BAD_GATEWAY, TEXT_PLAIN, b"nope".to_vec());

		// Assert
		assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
		assert_eq!(response.headers()[CONTENT_TYPE], TEXT_PLAIN);
	}
}
