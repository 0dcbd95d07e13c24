//! Append-only diagnostics log.
//!
//! # Responsibilities
//! - Append exactly one record per request
//! - Write each record to the log sink
//! - Answer filtered, chronological queries
//!
//! # Design Decisions
//! - Records are `Arc`ed and never mutated, so readers never block writers for long
//! - Queries are bounded by the log length at creation time and re-walk
//!   the log lazily on every iteration

use std::sync::{Arc, PoisonError, RwLock};

use axum::http::{Method, StatusCode};

use crate::diagnostics::fault::Fault;
use crate::diagnostics::record::{DiagnosticRecord, RecordEntry, RecordFilter};

type Log = Arc<RwLock<Vec<Arc<DiagnosticRecord>>>>;

/// The single owner of the process-wide diagnostics log.
#[derive(Debug, Default)]
pub struct Diagnostics {
    records: Log,
    log_records: bool,
}

impl Diagnostics {
    /// Create an empty log. When `log_records` is set, every appended
    /// record is also written through `tracing`.
    pub fn new(log_records: bool) -> Self {
        Self {
            records: Arc::default(),
            log_records,
        }
    }

    /// Append a record with only the required fields.
    pub fn record(
        &self,
        method: &Method,
        path: &str,
        status: StatusCode,
        fault: Option<Fault>,
    ) -> Arc<DiagnosticRecord> {
        self.append(RecordEntry::new(method.clone(), path, status).fault(fault))
    }

    /// Append a fully described record.
    pub fn append(&self, entry: RecordEntry) -> Arc<DiagnosticRecord> {
        let record = {
            let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
            let record = Arc::new(entry.into_record(records.len() as u64));
            records.push(record.clone());
            record
        };

        if self.log_records {
            emit(&record);
        }
        record
    }

    /// Records matching `filter`, in insertion order.
    pub fn query(&self, filter: RecordFilter) -> Query {
        Query {
            records: self.records.clone(),
            filter,
            end: self.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn emit(record: &DiagnosticRecord) {
    let route = record.route.as_deref().unwrap_or("-");
    match &record.fault {
        None => tracing::info!(
            request_id = %record.request_id,
            route,
            "{}", record
        ),
        Some(fault) if record.status.is_server_error() => tracing::error!(
            request_id = %record.request_id,
            route,
            kind = %fault.kind,
            "{}", record
        ),
        Some(fault) => tracing::warn!(
            request_id = %record.request_id,
            route,
            kind = %fault.kind,
            "{}", record
        ),
    }
}

/// A finite, restartable view over the log.
///
/// Iterating walks the log from the start each time; records appended
/// after the query was created are never yielded.
#[derive(Debug, Clone)]
pub struct Query {
    records: Log,
    filter: RecordFilter,
    end: usize,
}

impl Query {
    pub fn iter(&self) -> QueryIter<'_> {
        QueryIter { query: self, next: 0 }
    }

    /// Number of matching records. Walks the log.
    pub fn count(&self) -> usize {
        self.iter().count()
    }

    pub fn first(&self) -> Option<Arc<DiagnosticRecord>> {
        self.iter().next()
    }

    pub fn last(&self) -> Option<Arc<DiagnosticRecord>> {
        self.iter().last()
    }
}

impl<'a> IntoIterator for &'a Query {
    type Item = Arc<DiagnosticRecord>;
    type IntoIter = QueryIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy iterator over a [`Query`]. Takes the read lock once per step.
#[derive(Debug)]
pub struct QueryIter<'a> {
    query: &'a Query,
    next: usize,
}

impl Iterator for QueryIter<'_> {
    type Item = Arc<DiagnosticRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.query.end {
            let record = {
                let records = self.query.records.read().unwrap_or_else(PoisonError::into_inner);
                records[self.next].clone()
            };
            self.next += 1;
            if self.query.filter.matches(&record) {
                return Some(record);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.query.end - self.next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::fault::FaultKind;
    use std::thread;

    #[test]
    fn test_record_appends_in_order() {
        let diagnostics = Diagnostics::new(false);
        diagnostics.record(&Method::GET, "/movies", StatusCode::OK, None);
        diagnostics.record(&Method::GET, "/nope", StatusCode::NOT_FOUND, Some(Fault::not_found("no route")));
        diagnostics.record(&Method::POST, "/movies", StatusCode::NO_CONTENT, None);

        let paths: Vec<_> = diagnostics
            .query(RecordFilter::all())
            .iter()
            .map(|r| (r.seq, r.path.clone()))
            .collect();
        assert_eq!(paths, vec![(0, "/movies".into()), (1, "/nope".into()), (2, "/movies".into())]);
    }

    #[test]
    fn test_query_is_bounded_and_restartable() {
        let diagnostics = Diagnostics::new(false);
        diagnostics.record(&Method::GET, "/a", StatusCode::OK, None);
        let query = diagnostics.query(RecordFilter::all());
        diagnostics.record(&Method::GET, "/b", StatusCode::OK, None);

        assert_eq!(query.count(), 1);
        // Second pass sees the same records.
        assert_eq!(query.iter().map(|r| r.path.clone()).collect::<Vec<_>>(), vec!["/a"]);
        assert_eq!(diagnostics.query(RecordFilter::all()).count(), 2);
    }

    #[test]
    fn test_query_filters() {
        let diagnostics = Diagnostics::new(false);
        diagnostics.record(&Method::GET, "/a", StatusCode::OK, None);
        diagnostics.record(&Method::GET, "/b", StatusCode::NOT_FOUND, Some(Fault::not_found("x")));
        diagnostics.record(&Method::POST, "/a", StatusCode::CREATED, None);

        let faulted = diagnostics.query(RecordFilter::all().faulted());
        assert_eq!(faulted.count(), 1);
        assert_eq!(faulted.first().unwrap().fault_kind(), Some(FaultKind::NotFound));

        let posts = diagnostics.query(RecordFilter::all().method(Method::POST));
        assert_eq!(posts.last().unwrap().status, StatusCode::CREATED);

        assert_eq!(diagnostics.query(RecordFilter::all().path("/a")).count(), 2);
    }

    #[test]
    fn test_concurrent_appends_are_not_lost() {
        let diagnostics = Arc::new(Diagnostics::new(false));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let diagnostics = diagnostics.clone();
                thread::spawn(move || {
                    for i in 0..250 {
                        diagnostics.record(&Method::GET, &format!("/{}/{}", t, i), StatusCode::OK, None);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(diagnostics.len(), 2000);
        let seqs: Vec<u64> = diagnostics.query(RecordFilter::all()).iter().map(|r| r.seq).collect();
        assert_eq!(seqs, (0..2000).collect::<Vec<_>>());
    }
}
