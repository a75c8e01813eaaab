//! AES in ECB mode with PKCS#7 padding, keyed by the application id.

// crates.io
use aes::{
	Aes128, Aes192, Aes256, Block,
	cipher::{BlockDecrypt, BlockEncrypt, KeyInit},
};
// self
use crate::{_prelude::*, sign::SignError};

/// AES block size in bytes; padding always targets this width.
pub const BLOCK_SIZE: usize = 16;

/// Appends PKCS#7 padding. Aligned input gains a full block.
pub fn pad(input: &[u8]) -> Vec<u8> {
	let fill = BLOCK_SIZE - input.len() % BLOCK_SIZE;
	let mut out = Vec::with_capacity(input.len() + fill);

	out.extend_from_slice(input);
	out.resize(input.len() + fill, fill as u8);

	out
}

/// Strips PKCS#7 padding, rejecting anything [`pad`] could not have produced.
pub fn unpad(input: &[u8]) -> Result<&[u8], SignError> {
	if input.is_empty() || input.len() % BLOCK_SIZE != 0 {
		return Err(SignError::CipherLength { len: input.len() });
	}

	let fill = input[input.len() - 1] as usize;

	if fill == 0 || fill > BLOCK_SIZE {
		return Err(SignError::Padding);
	}

	let (body, tail) = input.split_at(input.len() - fill);

	if tail.iter().any(|b| *b as usize != fill) {
		return Err(SignError::Padding);
	}

	Ok(body)
}

/// Block cipher selected by key length (16, 24, or 32 bytes).
#[derive(Clone)]
pub enum EcbCipher {
	/// 16-byte key.
	Aes128(Aes128),
	/// 24-byte key.
	Aes192(Aes192),
	/// 32-byte key.
	Aes256(Aes256),
}
impl EcbCipher {
	/// Builds the cipher for `key`.
	pub fn new(key: &[u8]) -> Result<Self, SignError> {
		let invalid = |_| SignError::InvalidKeyLength { len: key.len() };

		match key.len() {
			16 => Aes128::new_from_slice(key).map(Self::Aes128).map_err(invalid),
			24 => Aes192::new_from_slice(key).map(Self::Aes192).map_err(invalid),
			32 => Aes256::new_from_slice(key).map(Self::Aes256).map_err(invalid),
			len => Err(SignError::InvalidKeyLength { len }),
		}
	}

	/// Pads `plain` and encrypts every block independently.
	pub fn encrypt(&self, plain: &[u8]) -> Vec<u8> {
		let mut data = pad(plain);

		for chunk in data.chunks_exact_mut(BLOCK_SIZE) {
			let block = Block::from_mut_slice(chunk);

			match self {
				Self::Aes128(c) => c.encrypt_block(block),
				Self::Aes192(c) => c.encrypt_block(block),
				Self::Aes256(c) => c.encrypt_block(block),
			}
		}

		data
	}

	/// Decrypts every block and strips the padding.
	pub fn decrypt(&self, cipher: &[u8]) -> Result<Vec<u8>, SignError> {
		if cipher.is_empty() || cipher.len() % BLOCK_SIZE != 0 {
			return Err(SignError::CipherLength { len: cipher.len() });
		}

		let mut data = cipher.to_vec();

		for chunk in data.chunks_exact_mut(BLOCK_SIZE) {
			let block = Block::from_mut_slice(chunk);

			match self {
				Self::Aes128(c) => c.decrypt_block(block),
				Self::Aes192(c) => c.decrypt_block(block),
				Self::Aes256(c) => c.decrypt_block(block),
			}
		}

		let len = unpad(&data)?.len();

		data.truncate(len);

		Ok(data)
	}
}
impl Debug for EcbCipher {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let bits = match self {
			Self::Aes128(_) => 128,
			Self::Aes192(_) => 192,
			Self::Aes256(_) => 256,
		};

		write!(f, "EcbCipher(AES-{bits})")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn padding_round_trips_including_aligned_input() {
		for len in [0, 1, 15, 16, 17, 31, 32, 33] {
			let input = vec![0xAB; len];
			let padded = pad(&input);

			assert_eq!(padded.len() % BLOCK_SIZE, 0);
			assert!(padded.len() > input.len());
			assert_eq!(unpad(&padded).expect("Padding should strip."), input.as_slice());
		}

		assert_eq!(pad(&[0; 16]).len(), 32);
		assert_eq!(pad(&[]), vec![16; 16]);
	}

	#[test]
	fn unpad_rejects_corrupt_padding() {
		let mut padded = pad(b"hello");

		*padded.last_mut().expect("Padded buffer is never empty.") = 0;

		assert!(matches!(unpad(&padded), Err(SignError::Padding)));

		let mut padded = pad(b"hello");
		let len = padded.len();

		padded[len - 2] ^= 0xFF;

		assert!(matches!(unpad(&padded), Err(SignError::Padding)));
		assert!(matches!(unpad(&[1; 7]), Err(SignError::CipherLength { len: 7 })));
	}

	#[test]
	fn cipher_round_trips_for_every_key_size() {
		for key in [&b"0123456789abcdef"[..], b"0123456789abcdef01234567", b"0123456789abcdef0123456789abcdef"]
		{
			let cipher = EcbCipher::new(key).expect("Key size should be supported.");
			let encrypted = cipher.encrypt(b"ED04C91CF6F6AB5A01A31C0295C5DA34");

			assert_eq!(encrypted.len(), 48);
			assert_eq!(
				cipher.decrypt(&encrypted).expect("Cipher text should decrypt."),
				b"ED04C91CF6F6AB5A01A31C0295C5DA34"
			);
		}
	}

	#[test]
	fn rejects_unsupported_key_lengths() {
		assert!(matches!(EcbCipher::new(b"short"), Err(SignError::InvalidKeyLength { len: 5 })));
		assert!(matches!(EcbCipher::new(&[0; 17]), Err(SignError::InvalidKeyLength { len: 17 })));
	}
}
