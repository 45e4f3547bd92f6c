// Copyright 2024 Lars Wilhelmsen <sral-backwards@sral.org>. All rights reserved.
// Use of this source code is governed by the MIT or Apache-2.0 license that can be found in the LICENSE-MIT or LICENSE-APACHE files.

use crate::authorizations::{AuthorizationSet, Authorizer};
use crate::error::ExpressionError;
use crate::matcher::resolved;
use crate::parser;

/// Bundles one or more authorization sets (`k >= 1`) with a `can_access`
/// operation.
///
/// Conjoins `k >= 1` authorization sets, so `can_access` requires every set
/// to independently authorize the expression.
///
/// Immutable after construction and safe for concurrent read from any number
/// of threads; evaluating `can_access` never mutates the evaluator and
/// performs no I/O.
pub struct Evaluator {
    sets: Vec<Box<dyn Authorizer + Send + Sync>>,
}

impl Evaluator {
    /// Builds an evaluator over `k >= 1` authorization sets; `can_access`
    /// requires every set to authorize the expression.
    ///
    /// Panics if `sets` is empty — an evaluator with no authorization sets
    /// has no defined semantics; `can_access` requires at least one to
    /// conjoin.
    pub fn new(sets: Vec<AuthorizationSet>) -> Self {
        assert!(
            !sets.is_empty(),
            "Evaluator requires at least one authorization set"
        );
        Evaluator {
            sets: sets
                .into_iter()
                .map(|s| Box::new(s) as Box<dyn Authorizer + Send + Sync>)
                .collect(),
        }
    }

    /// Builds an evaluator over a single authorization set.
    pub fn single(set: AuthorizationSet) -> Self {
        Evaluator::new(vec![set])
    }

    /// Builds an evaluator backed by a single [`Authorizer`] — a predicate
    /// over already-unescaped authorization bytes — treated as one
    /// authorization set whose membership test delegates to it.
    pub fn from_authorizer<A>(authorizer: A) -> Self
    where
        A: Authorizer + Send + Sync + 'static,
    {
        Evaluator {
            sets: vec![Box::new(authorizer)],
        }
    }

    /// Validates `expression`, then evaluates it against every authorization
    /// set this evaluator holds. Returns `true` iff all of them do.
    ///
    /// The empty expression always returns `true`, regardless of the
    /// authorization sets held.
    ///
    /// Never returns `false` for a malformed expression — malformed input is
    /// always an `Err`, never treated as a denial.
    pub fn can_access(&self, expression: impl AsRef<[u8]>) -> Result<bool, ExpressionError> {
        let bytes = expression.as_ref();
        #[cfg(feature = "trace")]
        log::trace!("evaluator: can_access over {} authorization set(s)", self.sets.len());
        for set in &self.sets {
            let ok = parser::evaluate(bytes, &mut |buf, token| {
                set.is_authorized(resolved(buf, token).as_ref())
            })?;
            if !ok {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
