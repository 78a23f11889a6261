//! Mock OIDC provider for testing
//!
//! Serves discovery, JWKS, PAR, authorization, token and userinfo endpoints on
//! an ephemeral local port. Authorization responses are JARM JWTs signed with
//! the provider's P-256 key; client assertions are checked against the
//! fixture RSA key.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use bytes::Bytes;
use chrono::Utc;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use jsonwebtoken::{Algorithm, Validation, decode};
use serde::Deserialize;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use tokio::net::TcpListener;
use url::Url;
use vouch_conf::{MemorySettings, names};

use crate::fixtures::{self, EcKeyPair};

/// Default subject of approved flows
pub const DEFAULT_SUBJECT: &str = "did:example:alice";

/// Redirect URI of the settings returned by [`MockProvider::settings`]
pub const REDIRECT_URI: &str = "http://localhost:3000/api/oidc/callback";

const ASSERTION_TYPE: &str = "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Endpoint selector for error simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
	Discovery,
	Jwks,
	Par,
	Token,
	UserInfo,
}

/// Error simulation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorMode {
	Success,
	InvalidResponse,
	Unauthorized,
	ServerError,
}

/// Deliberate protocol violations
#[derive(Debug, Clone, Default)]
pub struct Tampering {
	/// `state` placed in authorization responses instead of the pushed one
	pub state: Option<String>,
	/// `nonce` placed in ID tokens instead of the pushed one
	pub nonce: Option<String>,
	/// `sub` returned by userinfo instead of the token subject
	pub userinfo_subject: Option<String>,
	/// `aud` of authorization responses instead of the client id
	pub jarm_audience: Option<String>,
}

#[derive(Debug, Clone)]
struct IssuedCode {
	params: HashMap<String, String>,
	subject: String,
}

struct MockState {
	issuer: String,
	key: EcKeyPair,
	pkce_supported: bool,
	par_supported: bool,
	userinfo_as_jwt: bool,
	discovery_delay: Duration,
	discovery_hits: usize,
	jwks_hits: usize,
	errors: HashMap<Endpoint, ErrorMode>,
	tampering: Tampering,
	subject: String,
	userinfo_claims: Value,
	pushed: HashMap<String, HashMap<String, String>>,
	codes: HashMap<String, IssuedCode>,
	access_tokens: HashMap<String, String>,
	par_requests: Vec<HashMap<String, String>>,
	token_requests: Vec<HashMap<String, String>>,
}

/// Mock OIDC provider
pub struct MockProvider {
	state: Arc<Mutex<MockState>>,
	local_addr: SocketAddr,
}

impl MockProvider {
	/// Starts a provider on an ephemeral port
	pub async fn start() -> Self {
		let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
		let local_addr = listener.local_addr().unwrap();

		let state = Arc::new(Mutex::new(MockState {
			issuer: format!("http://{}", local_addr),
			key: EcKeyPair::generate("mock-provider-key"),
			pkce_supported: true,
			par_supported: true,
			userinfo_as_jwt: false,
			discovery_delay: Duration::ZERO,
			discovery_hits: 0,
			jwks_hits: 0,
			errors: HashMap::new(),
			tampering: Tampering::default(),
			subject: DEFAULT_SUBJECT.to_string(),
			userinfo_claims: json!({}),
			pushed: HashMap::new(),
			codes: HashMap::new(),
			access_tokens: HashMap::new(),
			par_requests: Vec::new(),
			token_requests: Vec::new(),
		}));

		let state_clone = state.clone();
		tokio::spawn(async move {
			let state = state_clone;
			loop {
				if let Ok((stream, _)) = listener.accept().await {
					let io = TokioIo::new(stream);
					let state = state.clone();

					tokio::spawn(async move {
						let service = hyper::service::service_fn(move |req: Request<Incoming>| {
							let state = state.clone();
							async move { handle_request(req, state).await }
						});

						let _ = hyper::server::conn::http1::Builder::new()
							.serve_connection(io, service)
							.await;
					});
				}
			}
		});

		Self { state, local_addr }
	}

	/// Issuer identifier (also the base URL)
	pub fn issuer(&self) -> String {
		format!("http://{}", self.local_addr)
	}

	/// Settings pointing a client at this provider with the fixture key
	pub fn settings(&self) -> MemorySettings {
		MemorySettings::new()
			.with(names::PROVIDER_URL, self.issuer())
			.with(names::CLIENT_ID, fixtures::CLIENT_ID)
			.with(names::PRIVATE_KEY, fixtures::CLIENT_JWK_SET)
			.with(names::SERVER_URL, "http://localhost")
			.with(names::SERVER_PORT, "3000")
	}

	/// Provider signing key
	pub fn signing_key(&self) -> EcKeyPair {
		self.state.lock().unwrap().key.clone()
	}

	/// Advertise (or stop advertising) `S256` PKCE
	pub fn set_pkce_supported(&self, supported: bool) {
		self.state.lock().unwrap().pkce_supported = supported;
	}

	/// Advertise (or stop advertising) a PAR endpoint
	pub fn set_par_supported(&self, supported: bool) {
		self.state.lock().unwrap().par_supported = supported;
	}

	/// Answer userinfo with a signed `application/jwt` body
	pub fn set_userinfo_as_jwt(&self, as_jwt: bool) {
		self.state.lock().unwrap().userinfo_as_jwt = as_jwt;
	}

	/// Delay discovery responses
	pub fn set_discovery_delay(&self, delay: Duration) {
		self.state.lock().unwrap().discovery_delay = delay;
	}

	/// Simulate a failure on one endpoint
	pub fn set_error_mode(&self, endpoint: Endpoint, mode: ErrorMode) {
		self.state.lock().unwrap().errors.insert(endpoint, mode);
	}

	/// Install protocol violations
	pub fn set_tampering(&self, tampering: Tampering) {
		self.state.lock().unwrap().tampering = tampering;
	}

	/// Subject of subsequently approved flows
	pub fn set_subject(&self, subject: impl Into<String>) {
		self.state.lock().unwrap().subject = subject.into();
	}

	/// Claims returned by userinfo next to `sub`
	pub fn set_userinfo_claims(&self, claims: Value) {
		self.state.lock().unwrap().userinfo_claims = claims;
	}

	/// Number of discovery requests served
	pub fn discovery_count(&self) -> usize {
		self.state.lock().unwrap().discovery_hits
	}

	/// Number of JWKS requests served
	pub fn jwks_count(&self) -> usize {
		self.state.lock().unwrap().jwks_hits
	}

	/// Replaces the signing key, publishing only the new one
	pub fn rotate_signing_key(&self, kid: impl Into<String>) -> EcKeyPair {
		let key = EcKeyPair::generate(kid);
		self.state.lock().unwrap().key = key.clone();
		key
	}

	/// Form bodies received by the PAR endpoint
	pub fn par_requests(&self) -> Vec<HashMap<String, String>> {
		self.state.lock().unwrap().par_requests.clone()
	}

	/// Form bodies received by the token endpoint
	pub fn token_requests(&self) -> Vec<HashMap<String, String>> {
		self.state.lock().unwrap().token_requests.clone()
	}

	/// Parameters pushed for the request referenced by `invite_url`
	pub fn pushed_params(&self, invite_url: &str) -> HashMap<String, String> {
		let request_uri = request_uri_of(invite_url);
		self.state
			.lock()
			.unwrap()
			.pushed
			.get(&request_uri)
			.cloned()
			.unwrap_or_else(|| panic!("unknown request_uri {}", request_uri))
	}

	/// Simulates the user approving the flow behind `invite_url`
	///
	/// Returns the JARM `response` the provider would send to the callback.
	pub fn approve(&self, invite_url: &str) -> String {
		let key = self.signing_key();
		self.approve_signed_by(invite_url, &key)
	}

	/// Like [`approve`](Self::approve), signing with an arbitrary key
	pub fn approve_signed_by(&self, invite_url: &str, key: &EcKeyPair) -> String {
		let request_uri = request_uri_of(invite_url);
		let mut state = self.state.lock().unwrap();
		let params = state
			.pushed
			.get(&request_uri)
			.cloned()
			.unwrap_or_else(|| panic!("unknown request_uri {}", request_uri));

		let code = URL_SAFE_NO_PAD.encode(uuid::Uuid::new_v4().as_bytes());
		let subject = state.subject.clone();
		state.codes.insert(code.clone(), IssuedCode {
			params: params.clone(),
			subject,
		});

		let now = Utc::now().timestamp();
		let claims = json!({
			"iss": state.issuer,
			"aud": state.tampering.jarm_audience.clone().unwrap_or_else(|| fixtures::CLIENT_ID.to_string()),
			"exp": now + 600,
			"iat": now,
			"state": state.tampering.state.clone().or_else(|| params.get("state").cloned()),
			"code": code,
		});
		key.sign(&claims)
	}

	/// Simulates the user refusing consent
	pub fn deny(&self, invite_url: &str, error: &str) -> String {
		let request_uri = request_uri_of(invite_url);
		let state = self.state.lock().unwrap();
		let params = state
			.pushed
			.get(&request_uri)
			.cloned()
			.unwrap_or_else(|| panic!("unknown request_uri {}", request_uri));

		let now = Utc::now().timestamp();
		let claims = json!({
			"iss": state.issuer,
			"aud": fixtures::CLIENT_ID,
			"exp": now + 600,
			"state": params.get("state"),
			"error": error,
			"error_description": "The user denied the request",
		});
		state.key.sign(&claims)
	}
}

fn request_uri_of(invite_url: &str) -> String {
	Url::parse(invite_url)
		.ok()
		.and_then(|url| {
			url.query_pairs()
				.find(|(k, _)| k == "request_uri")
				.map(|(_, v)| v.into_owned())
		})
		.unwrap_or_else(|| panic!("no request_uri in {}", invite_url))
}

type MockResponse = Response<Full<Bytes>>;

fn json_response(status: StatusCode, body: &Value) -> MockResponse {
	Response::builder()
		.status(status)
		.header("Content-Type", "application/json")
		.body(Full::from(Bytes::from(body.to_string())))
		.unwrap()
}

fn oauth_error(status: StatusCode, error: &str, description: &str) -> MockResponse {
	json_response(
		status,
		&json!({ "error": error, "error_description": description }),
	)
}

fn empty(status: StatusCode) -> MockResponse {
	Response::builder()
		.status(status)
		.body(Full::default())
		.unwrap()
}

fn simulated_error(mode: ErrorMode) -> Option<MockResponse> {
	match mode {
		ErrorMode::Success => None,
		ErrorMode::InvalidResponse => Some(
			Response::builder()
				.status(StatusCode::OK)
				.header("Content-Type", "application/json")
				.body(Full::from(Bytes::from("{invalid json!!! not valid")))
				.unwrap(),
		),
		ErrorMode::Unauthorized => Some(empty(StatusCode::UNAUTHORIZED)),
		ErrorMode::ServerError => Some(empty(StatusCode::INTERNAL_SERVER_ERROR)),
	}
}

/// Handle incoming requests
async fn handle_request(
	req: Request<Incoming>,
	state: Arc<Mutex<MockState>>,
) -> Result<MockResponse, hyper::Error> {
	let method = req.method().clone();
	let path = req.uri().path().to_string();
	let query = req.uri().query().unwrap_or_default().to_string();
	let authorization = req
		.headers()
		.get("Authorization")
		.and_then(|v| v.to_str().ok())
		.map(String::from);
	let body = req.into_body().collect().await?.to_bytes();

	let endpoint = match (&method, path.as_str()) {
		(&Method::GET, "/.well-known/openid-configuration") => Some(Endpoint::Discovery),
		(&Method::GET, "/jwks") => Some(Endpoint::Jwks),
		(&Method::POST, "/par") => Some(Endpoint::Par),
		(&Method::POST, "/token") => Some(Endpoint::Token),
		(&Method::GET, "/userinfo") => Some(Endpoint::UserInfo),
		_ => None,
	};

	if endpoint == Some(Endpoint::Discovery) {
		let delay = {
			let mut guard = state.lock().unwrap();
			guard.discovery_hits += 1;
			guard.discovery_delay
		};
		if !delay.is_zero() {
			tokio::time::sleep(delay).await;
		}
	}

	let mut guard = state.lock().unwrap();
	if endpoint == Some(Endpoint::Jwks) {
		guard.jwks_hits += 1;
	}
	if let Some(endpoint) = endpoint {
		let mode = guard
			.errors
			.get(&endpoint)
			.copied()
			.unwrap_or(ErrorMode::Success);
		if let Some(response) = simulated_error(mode) {
			return Ok(response);
		}
	}

	let response = match (method, path.as_str()) {
		(Method::GET, "/.well-known/openid-configuration") => discovery(&guard),
		(Method::GET, "/jwks") => Response::builder()
			.status(StatusCode::OK)
			.header("Content-Type", "application/json")
			.body(Full::from(Bytes::from(guard.key.public_jwk_set())))
			.unwrap(),
		(Method::POST, "/par") => par(&mut guard, &body),
		(Method::GET, "/authorize") => authorize(&guard, &query),
		(Method::POST, "/token") => token(&mut guard, &body),
		(Method::GET, "/userinfo") => userinfo(&guard, authorization.as_deref()),
		_ => empty(StatusCode::NOT_FOUND),
	};
	Ok(response)
}

fn discovery(state: &MockState) -> MockResponse {
	let issuer = &state.issuer;
	let mut document = json!({
		"issuer": issuer,
		"authorization_endpoint": format!("{}/authorize", issuer),
		"token_endpoint": format!("{}/token", issuer),
		"jwks_uri": format!("{}/jwks", issuer),
		"userinfo_endpoint": format!("{}/userinfo", issuer),
		"scopes_supported": ["openid", "over18", "profile", "rightToWork", "social:twitter", "social:github", "kyb"],
		"response_types_supported": ["code"],
		"response_modes_supported": ["jwt", "query.jwt"],
		"grant_types_supported": ["authorization_code", "refresh_token"],
		"token_endpoint_auth_methods_supported": ["private_key_jwt"],
		"id_token_signing_alg_values_supported": ["ES256"],
	});
	if state.pkce_supported {
		document["code_challenge_methods_supported"] = json!(["S256"]);
	}
	if state.par_supported {
		document["pushed_authorization_request_endpoint"] = json!(format!("{}/par", issuer));
	}
	json_response(StatusCode::OK, &document)
}

#[derive(Deserialize)]
struct AssertionClaims {
	sub: String,
}

fn check_client_assertion(state: &MockState, form: &HashMap<String, String>) -> Result<(), MockResponse> {
	let rejected = |description: &str| oauth_error(StatusCode::UNAUTHORIZED, "invalid_client", description);

	if form.get("client_assertion_type").map(String::as_str) != Some(ASSERTION_TYPE) {
		return Err(rejected("client_assertion_type must be jwt-bearer"));
	}
	let assertion = form
		.get("client_assertion")
		.ok_or_else(|| rejected("client_assertion is required"))?;

	let mut validation = Validation::new(Algorithm::RS256);
	validation.set_audience(&[&state.issuer]);
	validation.set_issuer(&[fixtures::CLIENT_ID]);
	let claims = decode::<AssertionClaims>(assertion, &fixtures::client_decoding_key(), &validation)
		.map_err(|e| rejected(&format!("client_assertion rejected: {}", e)))?
		.claims;

	if claims.sub != fixtures::CLIENT_ID {
		return Err(rejected("client_assertion subject mismatch"));
	}
	if form.get("client_id").is_some_and(|id| id != fixtures::CLIENT_ID) {
		return Err(rejected("unknown client"));
	}
	Ok(())
}

fn par(state: &mut MockState, body: &[u8]) -> MockResponse {
	let form: HashMap<String, String> = serde_urlencoded::from_bytes(body).unwrap_or_default();
	state.par_requests.push(form.clone());

	if !state.par_supported {
		return empty(StatusCode::NOT_FOUND);
	}
	if let Err(response) = check_client_assertion(state, &form) {
		return response;
	}
	for required in ["scope", "response_type", "state", "redirect_uri"] {
		if !form.contains_key(required) {
			return oauth_error(
				StatusCode::BAD_REQUEST,
				"invalid_request",
				&format!("{} is required", required),
			);
		}
	}

	let request_uri = format!("urn:ietf:params:oauth:request_uri:{}", uuid::Uuid::new_v4());
	state.pushed.insert(request_uri.clone(), form);
	json_response(
		StatusCode::CREATED,
		&json!({ "request_uri": request_uri, "expires_in": 60 }),
	)
}

fn authorize(state: &MockState, query: &str) -> MockResponse {
	let params: HashMap<String, String> = serde_urlencoded::from_str(query).unwrap_or_default();
	match params.get("request_uri").and_then(|uri| state.pushed.get(uri)) {
		Some(pushed) => {
			let redirect = pushed.get("redirect_uri").cloned().unwrap_or_default();
			Response::builder()
				.status(StatusCode::OK)
				.header("Content-Type", "text/plain")
				.body(Full::from(Bytes::from(format!("Approve to continue to {}", redirect))))
				.unwrap()
		}
		None => oauth_error(StatusCode::BAD_REQUEST, "invalid_request_uri", "unknown request_uri"),
	}
}

fn token(state: &mut MockState, body: &[u8]) -> MockResponse {
	let form: HashMap<String, String> = serde_urlencoded::from_bytes(body).unwrap_or_default();
	state.token_requests.push(form.clone());

	if let Err(response) = check_client_assertion(state, &form) {
		return response;
	}
	if form.get("grant_type").map(String::as_str) != Some("authorization_code") {
		return oauth_error(StatusCode::BAD_REQUEST, "unsupported_grant_type", "authorization_code only");
	}

	let invalid_grant = |description: &str| oauth_error(StatusCode::BAD_REQUEST, "invalid_grant", description);
	let Some(issued) = form.get("code").and_then(|code| state.codes.remove(code)) else {
		return invalid_grant("unknown or used code");
	};
	if form.get("redirect_uri") != issued.params.get("redirect_uri") {
		return invalid_grant("redirect_uri mismatch");
	}
	if let Some(challenge) = issued.params.get("code_challenge") {
		let verifier = form.get("code_verifier").map(String::as_str).unwrap_or_default();
		let computed = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
		if &computed != challenge {
			return invalid_grant("PKCE verification failed");
		}
	}

	let now = Utc::now().timestamp();
	let nonce = state
		.tampering
		.nonce
		.clone()
		.or_else(|| issued.params.get("nonce").cloned());
	let id_token = state.key.sign(&json!({
		"iss": state.issuer,
		"sub": issued.subject,
		"aud": fixtures::CLIENT_ID,
		"exp": now + 300,
		"iat": now,
		"nonce": nonce,
	}));

	let access_token = format!("at-{}", uuid::Uuid::new_v4());
	state
		.access_tokens
		.insert(access_token.clone(), issued.subject.clone());

	json_response(
		StatusCode::OK,
		&json!({
			"access_token": access_token,
			"token_type": "Bearer",
			"expires_in": 300,
			"id_token": id_token,
			"scope": issued.params.get("scope"),
		}),
	)
}

fn userinfo(state: &MockState, authorization: Option<&str>) -> MockResponse {
	let subject = authorization
		.and_then(|value| value.strip_prefix("Bearer "))
		.and_then(|token| state.access_tokens.get(token));
	let Some(subject) = subject else {
		return oauth_error(StatusCode::UNAUTHORIZED, "invalid_token", "unknown access token");
	};

	let mut claims = match &state.userinfo_claims {
		Value::Object(map) => map.clone(),
		_ => serde_json::Map::new(),
	};
	let sub = state
		.tampering
		.userinfo_subject
		.clone()
		.unwrap_or_else(|| subject.clone());
	claims.insert("sub".to_string(), Value::from(sub));

	if state.userinfo_as_jwt {
		claims.insert("iss".to_string(), Value::from(state.issuer.clone()));
		claims.insert("aud".to_string(), Value::from(fixtures::CLIENT_ID));
		let token = state.key.sign(&Value::Object(claims));
		return Response::builder()
			.status(StatusCode::OK)
			.header("Content-Type", "application/jwt")
			.body(Full::from(Bytes::from(token)))
			.unwrap();
	}

	json_response(StatusCode::OK, &Value::Object(claims))
}
