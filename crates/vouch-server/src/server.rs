//! HTTP/1.1 server loop

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};

use crate::error::ServerError;
use crate::handler::VerificationHandler;

/// Default maximum request body size (64 KB)
pub const DEFAULT_MAX_BODY_SIZE: usize = 64 * 1024;

/// Verification HTTP server
pub struct HttpServer {
	handler: VerificationHandler,
	max_body_size: usize,
}

impl HttpServer {
	/// Creates a server for `handler`
	pub fn new(handler: VerificationHandler) -> Self {
		Self {
			handler,
			max_body_size: DEFAULT_MAX_BODY_SIZE,
		}
	}

	/// Overrides the request body limit
	pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
		self.max_body_size = max_body_size;
		self
	}

	/// Binds `addr` and serves until an I/O error occurs
	pub async fn listen(self, addr: SocketAddr) -> std::io::Result<()> {
		let listener = TcpListener::bind(addr).await?;
		self.serve(listener, std::future::pending()).await
	}

	/// Serves connections from `listener` until `shutdown` completes
	///
	/// In-flight connections are not awaited once `shutdown` fires.
	///
	/// # Examples
	///
	/// ```no_run
	/// use std::sync::Arc;
	/// use tokio::net::TcpListener;
	/// use vouch_server::{HttpServer, VerificationHandler};
	///
	/// # async fn example(service: Arc<vouch_invite::VerificationService>) -> std::io::Result<()> {
	/// let listener = TcpListener::bind("127.0.0.1:3000").await?;
	/// HttpServer::new(VerificationHandler::new(service))
	/// 	.serve(listener, async {
	/// 		let _ = tokio::signal::ctrl_c().await;
	/// 	})
	/// 	.await?;
	/// # Ok(())
	/// # }
	/// ```
	pub async fn serve(
		self,
		listener: TcpListener,
		shutdown: impl Future<Output = ()>,
	) -> std::io::Result<()> {
		tracing::info!(addr = %listener.local_addr()?, "Verification server listening");
		tokio::pin!(shutdown);

		loop {
			tokio::select! {
				result = listener.accept() => {
					let (stream, peer) = result?;
					let handler = self.handler.clone();
					let max_body_size = self.max_body_size;

					tokio::task::spawn(async move {
						if let Err(err) = Self::handle_connection(stream, handler, max_body_size).await {
							tracing::debug!(peer = %peer, error = %err, "Connection closed with error");
						}
					});
				}
				_ = &mut shutdown => {
					tracing::info!("Shutdown signal received, stopping verification server");
					break;
				}
			}
		}

		Ok(())
	}

	/// Serves HTTP/1.1 requests on one connection
	pub async fn handle_connection(
		stream: TcpStream,
		handler: VerificationHandler,
		max_body_size: usize,
	) -> Result<(), hyper::Error> {
		let io = TokioIo::new(stream);
		let service = RequestService {
			handler,
			max_body_size,
		};

		http1::Builder::new().serve_connection(io, service).await
	}
}

/// Service implementation for hyper
struct RequestService {
	handler: VerificationHandler,
	max_body_size: usize,
}

impl Service<Request<Incoming>> for RequestService {
	type Response = Response<Full<Bytes>>;
	type Error = std::convert::Infallible;
	type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

	fn call(&self, req: Request<Incoming>) -> Self::Future {
		let handler = self.handler.clone();
		let max_body_size = self.max_body_size;

		Box::pin(async move {
			// Check Content-Length before reading body
			if let Some(content_length) = req.headers().get(hyper::header::CONTENT_LENGTH)
				&& let Ok(len_str) = content_length.to_str()
				&& let Ok(len) = len_str.parse::<usize>()
				&& len > max_body_size
			{
				return Ok(too_large());
			}

			let (parts, body) = req.into_parts();
			let body = match Limited::new(body, max_body_size).collect().await {
				Ok(collected) => collected.to_bytes(),
				Err(_) => return Ok(too_large()),
			};

			Ok(handler.handle(Request::from_parts(parts, body)).await)
		})
	}
}

fn too_large() -> Response<Full<Bytes>> {
	let error = ServerError::PayloadTooLarge;
	let mut response = Response::new(Full::new(Bytes::from(error.public_message())));
	*response.status_mut() = error.status();
	response
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_too_large_response() {
		// Act
		let response = too_large();

		// Assert
		assert_eq!(response.status(), hyper::StatusCode::PAYLOAD_TOO_LARGE);
	}
}
