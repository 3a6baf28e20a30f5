use ahash::RandomState;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::error::{FeatureError, Result};

/// Process-wide escaper used by `Feature::new`.
static GLOBAL: Lazy<FeatureNameEscaper> = Lazy::new(FeatureNameEscaper::new);

/// Escape a feature name with the process-wide escaper
pub fn escape_feature_name(raw: &str) -> Result<String> {
    GLOBAL.escape(raw)
}

#[inline]
fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Uncached escaping: every char outside `[A-Za-z0-9_]` becomes `u` followed
/// by six uppercase hex digits of its code point.
pub fn escape_uncached(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if is_safe(c) {
            out.push(c);
        } else {
            out.push_str(&format!("u{:06X}", c as u32));
        }
    }
    out
}

/// Memoizing feature-name escaper
///
/// Escaped names only contain safe chars, so `escape(escape(x)) == escape(x)`.
/// Each escaped name remembers the first raw name that produced it; a second,
/// different raw name producing it is a collision, unless one of the two is the
/// escaped name itself (the idempotent case).
///
/// # Thread Safety
/// Lookups of already cached names go through shared shard locks and do not
/// block each other; compute-and-insert holds the write lock of one shard.
#[derive(Debug, Default)]
pub struct FeatureNameEscaper {
    /// raw -> escaped
    cache: DashMap<String, String, RandomState>,
    /// escaped -> first raw name that is not a fixed point
    owners: DashMap<String, String, RandomState>,
}

impl FeatureNameEscaper {
    pub fn new() -> Self {
        Self {
            cache: DashMap::with_hasher(RandomState::new()),
            owners: DashMap::with_hasher(RandomState::new()),
        }
    }

    pub fn escape(&self, raw: &str) -> Result<String> {
        if let Some(hit) = self.cache.get(raw) {
            return Ok(hit.value().clone());
        }
        let escaped = escape_uncached(raw);
        if escaped != raw {
            self.claim(&escaped, raw)?;
        }
        Ok(self
            .cache
            .entry(raw.to_string())
            .or_insert(escaped)
            .value()
            .clone())
    }

    fn claim(&self, escaped: &str, raw: &str) -> Result<()> {
        match self.owners.entry(escaped.to_string()) {
            Entry::Occupied(owner) => {
                if owner.get() != raw {
                    return Err(FeatureError::EscapeCollision {
                        escaped: escaped.to_string(),
                        first: owner.get().clone(),
                        second: raw.to_string(),
                    });
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(raw.to_string());
            }
        }
        Ok(())
    }

    /// Number of cached raw names
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
