//! Aggregation of per-item failures from a bulk transfer.

use crate::error::{FailureKind, TransferError};
use crate::lost_inputs::LostInputs;
use std::borrow::Cow;
use std::fmt;

/// The failures of one bulk transfer, in the order they were observed.
///
/// Separates failures of remote communication from local ones and keeps every
/// constituent failure available for inspection. A bulk transfer reports at
/// least one failure, so an empty aggregate is not expected outside of
/// construction.
///
/// Appending is not synchronized. Concurrent sub-transfers should hand their
/// outcomes to a single task that builds the aggregate, see
/// [`collect_results`].
#[derive(Debug)]
pub struct BulkTransferError {
    errors: Vec<TransferError>,
    // True while no failure other than a cache miss has been added.
    all_not_found: bool,
}

impl BulkTransferError {
    pub fn new() -> Self {
        Self {
            errors: Vec::new(),
            all_not_found: true,
        }
    }

    /// Append a failure.
    pub fn add(&mut self, error: TransferError) {
        self.all_not_found &= error.kind() == FailureKind::NotFound;
        self.errors.push(error);
    }

    pub fn errors(&self) -> &[TransferError] {
        &self.errors
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TransferError> {
        self.errors.iter()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Whether every failure added so far was a cache miss.
    ///
    /// Vacuously true for an empty aggregate.
    pub fn only_caused_by_not_found(&self) -> bool {
        self.all_not_found
    }

    /// Whether `error` is a bulk transfer failure made up only of cache misses.
    ///
    /// Any other error is false, including a lone cache miss that was never
    /// aggregated.
    pub fn is_only_caused_by_not_found(error: &(dyn std::error::Error + 'static)) -> bool {
        error
            .downcast_ref::<BulkTransferError>()
            .is_some_and(BulkTransferError::only_caused_by_not_found)
    }

    /// Merge the failures into one [`LostInputs`] if they all describe lost inputs.
    ///
    /// A single failure that is itself a `LostInputs` is returned as is.
    /// Otherwise every failure must wrap a `LostInputs` as its direct cause;
    /// those are combined in order. Returns `None` for an empty aggregate or
    /// any other mix of failures.
    pub fn lost_inputs(&self) -> Option<Cow<'_, LostInputs>> {
        if let [TransferError::LostInputs(lost)] = self.errors.as_slice() {
            return Some(Cow::Borrowed(lost));
        }
        if self.errors.is_empty() {
            return None;
        }
        let wrapped = self
            .errors
            .iter()
            .map(TransferError::wrapped_lost_inputs)
            .collect::<Option<Vec<_>>>()?;
        Some(Cow::Owned(LostInputs::combine(
            wrapped.into_iter().cloned(),
        )))
    }

    /// Consuming form of [`lost_inputs`](Self::lost_inputs).
    ///
    /// Hands the aggregate back unchanged when the failures cannot be merged.
    pub fn into_lost_inputs(self) -> Result<LostInputs, Self> {
        let single_direct =
            self.errors.len() == 1 && matches!(self.errors[0], TransferError::LostInputs(_));
        let all_wrapped = !self.errors.is_empty()
            && self
                .errors
                .iter()
                .all(|e| e.wrapped_lost_inputs().is_some());
        if !single_direct && !all_wrapped {
            return Err(self);
        }

        let mut errors = self.errors;
        if single_direct && let Some(TransferError::LostInputs(lost)) = errors.pop() {
            return Ok(lost);
        }
        Ok(LostInputs::combine(
            errors
                .into_iter()
                .filter_map(TransferError::into_wrapped_lost_inputs),
        ))
    }
}

impl Default for BulkTransferError {
    fn default() -> Self {
        Self::new()
    }
}

impl From<TransferError> for BulkTransferError {
    fn from(error: TransferError) -> Self {
        let mut bulk = Self::new();
        bulk.add(error);
        bulk
    }
}

impl Extend<TransferError> for BulkTransferError {
    fn extend<I: IntoIterator<Item = TransferError>>(&mut self, iter: I) {
        for error in iter {
            self.add(error);
        }
    }
}

impl FromIterator<TransferError> for BulkTransferError {
    fn from_iter<I: IntoIterator<Item = TransferError>>(iter: I) -> Self {
        let mut bulk = Self::new();
        bulk.extend(iter);
        bulk
    }
}

impl IntoIterator for BulkTransferError {
    type Item = TransferError;
    type IntoIter = std::vec::IntoIter<TransferError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a BulkTransferError {
    type Item = &'a TransferError;
    type IntoIter = std::slice::Iter<'a, TransferError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl fmt::Display for BulkTransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [] => Ok(()),
            // A single failure reads the same as an unbatched one.
            [only] => write!(f, "{only}"),
            errors => {
                write!(f, "{} errors during bulk transfer:", errors.len())?;
                for error in errors {
                    write!(f, "\n{error}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for BulkTransferError {}

/// Reduce the outcomes of a bulk transfer.
///
/// Returns every value in order when nothing failed, otherwise all failures
/// in order. Successful values are dropped once any item has failed.
pub fn collect_results<T, I>(results: I) -> Result<Vec<T>, BulkTransferError>
where
    I: IntoIterator<Item = Result<T, TransferError>>,
{
    let mut values = Vec::new();
    let mut failures = BulkTransferError::new();
    for result in results {
        match result {
            Ok(value) => values.push(value),
            Err(error) => failures.add(error),
        }
    }
    if failures.is_empty() {
        Ok(values)
    } else {
        Err(failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheNotFound;
    use larder_core::Digest;

    fn not_found(data: &[u8]) -> TransferError {
        CacheNotFound::new(Digest::of(data)).into()
    }

    #[test]
    fn empty_aggregate_is_only_not_found() {
        let bulk = BulkTransferError::new();
        assert!(bulk.is_empty());
        assert!(bulk.only_caused_by_not_found());
        assert_eq!(bulk.to_string(), "");
    }

    #[test]
    fn flag_tracks_appends() {
        let mut bulk = BulkTransferError::from(not_found(b"a"));
        assert!(bulk.only_caused_by_not_found());
        bulk.add(TransferError::io("connection reset"));
        assert!(!bulk.only_caused_by_not_found());
        bulk.add(not_found(b"b"));
        assert!(!bulk.only_caused_by_not_found());
        assert_eq!(bulk.len(), 3);
    }

    #[test]
    fn collect_results_all_ok() {
        let results: Vec<Result<u32, TransferError>> = vec![Ok(1), Ok(2), Ok(3)];
        assert_eq!(collect_results(results).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn collect_results_keeps_failure_order() {
        let results = vec![
            Ok(1),
            Err(TransferError::io("first")),
            Ok(2),
            Err(TransferError::io("second")),
        ];
        let err = collect_results(results).unwrap_err();
        let messages: Vec<String> = err.iter().map(ToString::to_string).collect();
        assert_eq!(messages, vec!["first", "second"]);
    }
}
