//! Canonical request signing.
//!
//! Every authenticated request carries a `sign` parameter derived from the full parameter
//! set: keys are sorted, values serialized (strings verbatim, everything else as JSON), the
//! `k=v` pairs joined with `&`, hashed with MD5 into an uppercase hex digest, encrypted with
//! AES-ECB keyed by the application id, and finally Base64 encoded.

pub mod cipher;

pub use cipher::{BLOCK_SIZE, EcbCipher};

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use md5::{Digest, Md5};
// self
use crate::{_prelude::*, auth::AppId};

/// Parameter name carrying the signature.
pub const SIGN_FIELD: &str = "sign";

/// Errors raised while building or encrypting a signature.
#[derive(Debug, ThisError)]
pub enum SignError {
	/// The application id cannot key the block cipher.
	#[error("Application id is {len} bytes; signing requires a 16, 24, or 32 byte key.")]
	InvalidKeyLength {
		/// Length of the rejected key.
		len: usize,
	},
	/// A parameter value could not be JSON encoded.
	#[error("Parameter value could not be encoded.")]
	Encode {
		/// Underlying serializer failure.
		#[source]
		source: serde_json::Error,
	},
	/// Decrypted bytes did not end in valid padding.
	#[error("Cipher text carries invalid padding.")]
	Padding,
	/// Cipher text is not a positive multiple of the block size.
	#[error("Cipher text length {len} is not a positive multiple of the block size.")]
	CipherLength {
		/// Length of the rejected cipher text.
		len: usize,
	},
}

/// Authentication fields injected into every signed request.
#[derive(Clone, Copy, Debug)]
pub struct AuthFields<'a> {
	/// Application id, sent as `app_key`.
	pub app_key: &'a str,
	/// Current access token.
	pub access_token: &'a str,
	/// Unix timestamp in seconds.
	pub timestamp: i64,
}

/// Parameter set fed into the signer.
///
/// Backed by an ordered map so iteration order never depends on insertion order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SignatureInput(BTreeMap<String, Value>);
impl SignatureInput {
	/// Creates an empty parameter set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Merges query parameters, then body fields (one level deep), then the
	/// authentication fields. Later sources win on key collisions.
	pub fn from_parts(
		query: &BTreeMap<String, Value>,
		body: &Map<String, Value>,
		auth: AuthFields<'_>,
	) -> Self {
		let mut input = Self::new();

		input.merge_query(query);
		input.merge_body(body);
		input.insert("app_key", auth.app_key);
		input.insert("access_token", auth.access_token);
		input.insert("timestamp", auth.timestamp);

		input
	}

	/// Inserts a single parameter, replacing any previous value.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
		self.0.insert(key.into(), value.into());

		self
	}

	/// Serializes `value` and inserts it.
	pub fn insert_serialized<T>(&mut self, key: impl Into<String>, value: &T) -> Result<&mut Self, SignError>
	where
		T: ?Sized + Serialize,
	{
		let value = serde_json::to_value(value).map_err(|source| SignError::Encode { source })?;

		Ok(self.insert(key, value))
	}

	/// Copies query parameters into the set.
	pub fn merge_query(&mut self, query: &BTreeMap<String, Value>) -> &mut Self {
		for (k, v) in query {
			self.0.insert(k.clone(), v.clone());
		}

		self
	}

	/// Copies top-level body fields into the set; nested values stay JSON encoded.
	pub fn merge_body(&mut self, body: &Map<String, Value>) -> &mut Self {
		for (k, v) in body {
			self.0.insert(k.clone(), v.clone());
		}

		self
	}

	/// Returns the value stored for `key`.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	/// Number of parameters, excluding the signature field.
	pub fn len(&self) -> usize {
		self.iter().count()
	}

	/// Returns `true` when no parameter other than the signature field is present.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Iterates parameters in canonical order, skipping the signature field.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
		self.0.iter().filter(|(k, _)| k.as_str() != SIGN_FIELD).map(|(k, v)| (k.as_str(), v))
	}

	/// Builds the pre-hash string: sorted `key=value` pairs joined with `&`.
	pub fn canonical_string(&self) -> Result<String, SignError> {
		let mut out = String::new();

		for (i, (key, value)) in self.iter().enumerate() {
			if i > 0 {
				out.push('&');
			}

			out.push_str(key);
			out.push('=');
			out.push_str(&encode_value(value)?);
		}

		Ok(out)
	}
}
impl<K, V> FromIterator<(K, V)> for SignatureInput
where
	K: Into<String>,
	V: Into<Value>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}

/// Serializes a parameter value: strings verbatim, everything else as compact JSON.
pub fn encode_value(value: &Value) -> Result<String, SignError> {
	match value {
		Value::String(s) => Ok(s.clone()),
		other => serde_json::to_string(other).map_err(|source| SignError::Encode { source }),
	}
}

/// Signs parameter sets with a cipher keyed by the application id.
#[derive(Clone, Debug)]
pub struct Signer {
	cipher: EcbCipher,
}
impl Signer {
	/// Builds a signer; fails when the id length is not a valid AES key size.
	pub fn new(app_id: &AppId) -> Result<Self, SignError> {
		Ok(Self { cipher: EcbCipher::new(app_id.as_bytes())? })
	}

	/// Produces the Base64 signature for `input`.
	pub fn sign(&self, input: &SignatureInput) -> Result<String, SignError> {
		let digest = digest(&input.canonical_string()?);

		Ok(STANDARD.encode(self.cipher.encrypt(digest.as_bytes())))
	}

	/// Recovers the hex digest carried by `signature`.
	pub fn open(&self, signature: &str) -> Result<String, SignError> {
		let raw = STANDARD.decode(signature).map_err(|_| SignError::Padding)?;
		let plain = self.cipher.decrypt(&raw)?;

		String::from_utf8(plain).map_err(|_| SignError::Padding)
	}

	/// Returns `true` when `signature` matches `input`.
	pub fn verify(&self, input: &SignatureInput, signature: &str) -> Result<bool, SignError> {
		Ok(self.sign(input)? == signature)
	}
}

/// Uppercase hexadecimal MD5 digest of `canonical`.
pub fn digest(canonical: &str) -> String {
	Md5::digest(canonical.as_bytes()).iter().map(|byte| format!("{byte:02X}")).collect()
}

/// One-shot signing without keeping a [`Signer`] around.
pub fn sign(params: &SignatureInput, app_id: &AppId) -> Result<String, SignError> {
	Signer::new(app_id)?.sign(params)
}
