//! Offset/limit pagination: cursor normalization, advancing, and last-page detection.
//!
//! Endpoints disagree on how the end of a list is signalled. Some return an authoritative
//! `total`, others only ever return short pages. [`PagePolicy`] names both contracts so each
//! endpoint descriptor can pick the one its server honours.

// self
use crate::{_prelude::*, error::ConfigError};

/// Default page size sent when a caller does not pick one.
pub const DEFAULT_LIMIT: u32 = 1000;
/// Largest page size the remote service accepts.
pub const MAX_LIMIT: u32 = 1000;

/// Configured page size bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageDefaults {
	/// Limit substituted for non-positive caller limits.
	pub default_limit: u32,
	/// Upper bound every limit is clamped to.
	pub max_limit: u32,
}
impl PageDefaults {
	/// Ensures `0 < default_limit <= max_limit`.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.default_limit == 0 || self.default_limit > self.max_limit {
			return Err(ConfigError::InvalidPageDefaults {
				default_limit: self.default_limit,
				max_limit: self.max_limit,
			});
		}

		Ok(())
	}
}
impl Default for PageDefaults {
	fn default() -> Self {
		Self { default_limit: DEFAULT_LIMIT, max_limit: MAX_LIMIT }
	}
}

/// Offset/limit window for one page request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageCursor {
	/// Zero-based index of the first item.
	pub offset: u64,
	/// Requested page size.
	pub limit: u32,
}
impl PageCursor {
	/// Creates a cursor without normalization.
	pub const fn new(offset: u64, limit: u32) -> Self {
		Self { offset, limit }
	}

	/// Offset of the page after this one.
	pub const fn next_offset(&self) -> u64 {
		self.offset.saturating_add(self.limit as u64)
	}
}

/// How the end of a list is detected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PagePolicy {
	/// Trust the server's `total` when supplied; otherwise fall back to [`Self::ItemCount`].
	///
	/// A short page does not end the list while `total` says more items remain past it;
	/// only `total <= next offset` or an empty page does.
	#[default]
	TotalCount,
	/// A page shorter than the limit is the last one; `total` is ignored.
	ItemCount,
}

/// Result of [`PageTracker::advance`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageStep {
	/// Cursor for the following page; always `offset + limit`.
	pub next: PageCursor,
	/// Whether the page just received was the last one.
	pub is_last_page: bool,
}

/// Stateless cursor arithmetic bound to a set of [`PageDefaults`].
#[derive(Clone, Copy, Debug, Default)]
pub struct PageTracker {
	defaults: PageDefaults,
}
impl PageTracker {
	/// Creates a tracker using `defaults`.
	pub const fn new(defaults: PageDefaults) -> Self {
		Self { defaults }
	}

	/// Returns the configured bounds.
	pub const fn defaults(&self) -> PageDefaults {
		self.defaults
	}

	/// First page: offset zero with the default limit.
	pub const fn first(&self) -> PageCursor {
		PageCursor::new(0, self.defaults.default_limit)
	}

	/// Builds a cursor from raw caller values.
	///
	/// Negative offsets become zero, non-positive limits become the default, and limits above
	/// the maximum are clamped.
	pub fn cursor(&self, offset: i64, limit: i64) -> PageCursor {
		let offset = u64::try_from(offset).unwrap_or(0);
		let limit = if limit <= 0 {
			self.defaults.default_limit
		} else {
			u32::try_from(limit).unwrap_or(u32::MAX).min(self.defaults.max_limit)
		};

		PageCursor::new(offset, limit)
	}

	/// Clamps an existing cursor into the configured bounds.
	pub fn normalize(&self, cursor: PageCursor) -> PageCursor {
		self.cursor(i64::try_from(cursor.offset).unwrap_or(i64::MAX), i64::from(cursor.limit))
	}

	/// Advances with the [`PagePolicy::TotalCount`] policy.
	pub fn advance(&self, current: PageCursor, count: usize, total: Option<u64>) -> PageStep {
		self.advance_with(PagePolicy::TotalCount, current, count, total)
	}

	/// Advances past `current` after receiving `count` items.
	pub fn advance_with(
		&self,
		policy: PagePolicy,
		current: PageCursor,
		count: usize,
		total: Option<u64>,
	) -> PageStep {
		let current = self.normalize(current);
		let next = PageCursor::new(current.next_offset(), current.limit);
		let short_page = (count as u64) < current.limit as u64;
		let is_last_page = match (policy, total) {
			(PagePolicy::TotalCount, Some(total)) => total <= next.offset || count == 0,
			_ => short_page,
		};

		PageStep { next, is_last_page }
	}
}

/// One decoded page of a list endpoint.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
	/// Decoded items.
	pub items: Vec<T>,
	/// Server-reported total, if any.
	pub total: Option<u64>,
	/// Cursor the page was requested with.
	pub cursor: PageCursor,
	/// Cursor for the following page.
	pub next: PageCursor,
	/// Whether no further page should be requested.
	pub is_last_page: bool,
}
