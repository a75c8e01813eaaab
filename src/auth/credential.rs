//! Strongly typed application credentials issued by the remote platform.

// std
use std::ops::Deref;
// self
use crate::_prelude::*;

macro_rules! def_credential {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new credential after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, CredentialError> {
				let view = value.as_ref();

				validate_view($kind, view)?;

				Ok(Self(view.to_owned()))
			}

			/// Returns the raw credential. Callers must avoid logging secrets.
			pub fn expose(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = CredentialError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl FromStr for $name {
			type Err = CredentialError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const CREDENTIAL_MAX_LEN: usize = 256;

/// Error returned when credential validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum CredentialError {
	/// The credential was empty.
	#[error("{kind} cannot be empty.")]
	Empty {
		/// Kind of credential (app id, app secret).
		kind: &'static str,
	},
	/// The credential contains whitespace characters.
	#[error("{kind} contains whitespace.")]
	ContainsWhitespace {
		/// Kind of credential (app id, app secret).
		kind: &'static str,
	},
	/// The credential exceeded the allowed length.
	#[error("{kind} exceeds {max} bytes.")]
	TooLong {
		/// Kind of credential (app id, app secret).
		kind: &'static str,
		/// Maximum permitted byte count.
		max: usize,
	},
}

def_credential! { AppId, "Application identifier; also keys the request signature cipher.", "App id" }
def_credential! { AppSecret, "Application secret exchanged for access tokens.", "App secret" }

impl Deref for AppId {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for AppId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Debug for AppId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "AppId({})", self.0)
	}
}
impl Display for AppId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

impl Debug for AppSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("AppSecret").field(&"<redacted>").finish()
	}
}
impl Display for AppSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

fn validate_view(kind: &'static str, view: &str) -> Result<(), CredentialError> {
	if view.is_empty() {
		return Err(CredentialError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(CredentialError::ContainsWhitespace { kind });
	}
	if view.len() > CREDENTIAL_MAX_LEN {
		return Err(CredentialError::TooLong { kind, max: CREDENTIAL_MAX_LEN });
	}

	Ok(())
}
