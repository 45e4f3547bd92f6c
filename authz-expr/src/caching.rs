// Copyright 2024 Lars Wilhelmsen <sral-backwards@sral.org>. All rights reserved.
// Use of this source code is governed by the MIT or Apache-2.0 license that can be found in the LICENSE-MIT or LICENSE-APACHE files.

//! An optional, `cached`-backed memoization facade in front of
//! [`Evaluator::can_access`], generalized from a single implicit
//! authorization set to a caller-supplied cache key standing in for
//! whichever authorization set(s) an [`Evaluator`] was built from.

use cached::{proc_macro::cached, Cached, SizedCache};

use crate::error::ExpressionError;
use crate::evaluator::Evaluator;

/// Evaluates `expression` against `evaluator`, caching the result keyed on
/// `(expression, set_key)`. `set_key` is the caller's stand-in for
/// `evaluator`'s authorization sets (e.g. a principal id) since `Evaluator`
/// itself does not implement `Hash`.
///
/// Entries are evicted least-recently-used past 20,000 distinct keys.
pub fn cached_can_access(
    evaluator: &Evaluator,
    expression: &str,
    set_key: &str,
) -> Result<bool, ExpressionError> {
    cached_can_access_impl(evaluator, expression.to_owned(), set_key.to_owned())
}

#[cached(
    type = "SizedCache<String, Result<bool, ExpressionError>>",
    create = "{ SizedCache::with_size(20_000) }",
    convert = r##"{ format!("{set_key}\u{0}{expression}") }"##
)]
fn cached_can_access_impl(
    evaluator: &Evaluator,
    expression: String,
    set_key: String,
) -> Result<bool, ExpressionError> {
    #[cfg(feature = "trace")]
    log::trace!("caching: miss for set {set_key:?}, expression {expression:?}");
    evaluator.can_access(expression)
}

/// Clears every memoized `can_access` result.
pub fn clear_cache() -> Result<(), String> {
    let mut cache = CACHED_CAN_ACCESS_IMPL
        .lock()
        .map_err(|e| format!("failed to lock cache: {e}"))?;
    cache.cache_clear();
    Ok(())
}

/// Hit/miss/size counters for the memoization cache.
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

pub fn cache_stats() -> Result<CacheStats, String> {
    let cache = CACHED_CAN_ACCESS_IMPL
        .lock()
        .map_err(|e| format!("failed to lock cache: {e}"))?;
    Ok(CacheStats {
        hits: cache.cache_hits().unwrap_or(0),
        misses: cache.cache_misses().unwrap_or(0),
        size: cache.cache_size(),
    })
}
