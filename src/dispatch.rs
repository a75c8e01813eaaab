//! Request Dispatcher: signs resource requests, classifies failures, and retries within policy.
//!
//! Every attempt re-reads the current token and re-signs with a fresh timestamp, so a retry
//! after a token rejection or a long backoff never replays a stale signature. Errors that the
//! retry policy does not cover are returned unchanged; once attempts are exhausted the last
//! error is returned as-is.

mod envelope;
mod request;
mod retry;

pub use envelope::*;
pub use request::*;
pub use retry::*;

// self
use crate::{
	_prelude::*,
	client::Client,
	http::{ApiHttpClient, HttpMethod, HttpRequest},
	obs::{self, OpKind, OpOutcome, OpSpan},
	sign::{AuthFields, SIGN_FIELD, SignError, SignatureInput, encode_value},
};

impl<C> Client<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Sends `request` with authentication and signing, retrying per the configured policy.
	///
	/// Returns the success envelope; use [`Envelope::decode`] (or the typed helpers on the
	/// client) to obtain the payload.
	pub async fn execute(&self, request: ApiRequest) -> Result<Envelope> {
		request.validate()?;

		let span = OpSpan::new(OpKind::Dispatch, "execute").with_path(&request.path);

		obs::record_op_outcome(OpKind::Dispatch, OpOutcome::Attempt);

		let result = span.instrument(self.execute_with_retry(&request, &span)).await;

		match &result {
			Ok(_) => obs::record_op_outcome(OpKind::Dispatch, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(OpKind::Dispatch, OpOutcome::Failure),
		}

		result
	}

	/// Builds the signed transport request for one attempt.
	///
	/// Caller parameters named like the injected authentication fields are replaced.
	pub fn prepare(
		&self,
		request: &ApiRequest,
		access_token: &str,
		timestamp: i64,
	) -> Result<HttpRequest> {
		let body = request
			.body
			.iter()
			.filter(|(key, _)| !is_reserved(key))
			.map(|(key, value)| (key.clone(), value.clone()))
			.collect::<Map<_, _>>();
		let auth = AuthFields { app_key: self.config.app_id.expose(), access_token, timestamp };
		let input = SignatureInput::from_parts(&request.query, &body, auth);
		let signature = self.signer.sign(&input)?;
		let mut url = self.config.resource_url(&request.path);

		{
			let mut pairs = url.query_pairs_mut();

			for (key, value) in request.query.iter().filter(|(key, _)| !is_reserved(key)) {
				pairs.append_pair(key, &encode_value(value)?);
			}

			pairs
				.append_pair("app_key", auth.app_key)
				.append_pair("access_token", access_token)
				.append_pair("timestamp", &timestamp.to_string())
				.append_pair(SIGN_FIELD, &signature);
		}

		let body = match request.method {
			HttpMethod::Post =>
				Some(serde_json::to_vec(&body).map_err(|source| SignError::Encode { source })?),
			HttpMethod::Get => None,
		};

		Ok(HttpRequest::json(request.method, url, body))
	}

	async fn execute_with_retry(&self, request: &ApiRequest, span: &OpSpan) -> Result<Envelope> {
		let policy = self.config.retry;
		let mut attempt = 1;

		loop {
			span.record_attempt(attempt);

			let mut sent_token = None;
			let err = match self.attempt(request, &mut sent_token).await {
				Ok(envelope) => return Ok(envelope),
				Err(e) => e,
			};
			let decision = RetryDecision::for_error(&err);

			if decision.invalidate_token {
				match &sent_token {
					Some(access_token) => {
						self.tokens.invalidate_if_current(access_token);
					},
					// The rejection came from the refresh itself.
					None => self.tokens.invalidate(),
				}
			}

			let reason = match decision
				.reason
				.filter(|_| decision.should_retry && attempt < policy.max_attempts())
			{
				Some(reason) => reason,
				None => return Err(err),
			};
			let delay = policy.delay_for(attempt, err.retry_after());

			if request.deadline.is_some_and(|deadline| Instant::now() + delay > deadline) {
				return Err(Error::DeadlineExceeded { attempts: attempt, last: Box::new(err) });
			}

			obs::record_retry(reason);
			obs::event!(
				warn,
				path = %request.path,
				attempt,
				reason = reason.as_str(),
				delay_ms = delay.as_millis() as u64,
				error = %err,
				"Retrying request."
			);

			if !delay.is_zero() {
				tokio::time::sleep(delay).await;
			}

			attempt += 1;
		}
	}

	async fn attempt(&self, request: &ApiRequest, sent_token: &mut Option<String>) -> Result<Envelope> {
		let token = self.tokens.ensure_valid(false).await?;
		let access_token = token.access_token.expose();
		let timestamp = OffsetDateTime::now_utc().unix_timestamp();
		let http_request = self.prepare(request, access_token, timestamp)?;

		*sent_token = Some(access_token.to_owned());

		if self.config.debug {
			obs::event!(debug, method = %request.method, path = %request.path, "Dispatching request.");
		}

		let response = self.http_client.execute(http_request).await?;

		if self.config.debug {
			obs::event!(
				debug,
				path = %request.path,
				status = response.status,
				body = %response.body_preview(),
				"Request completed."
			);
		}

		interpret(&response, &self.format)
	}
}

fn is_reserved(key: &str) -> bool {
	RESERVED_PARAMS.contains(&key)
}
