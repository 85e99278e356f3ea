//! Background query runner
//!
//! Runs account queries on a worker thread so the table keeps drawing its
//! loading placeholder while a (possibly slow) query is in flight. Only the
//! newest query counts: starting a query drops the channel of the previous
//! one, so its result is discarded by the worker.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::model::account::Account;
use crate::model::pagination::Location;
use crate::services::query::{AccountQuery, QueryResult};

/// Message sent back by a query thread
enum QueryMessage {
    Completed(QueryResult),
}

/// A query running in the background
struct PendingQuery {
    receiver: Receiver<QueryMessage>,
    generation: u64,
    started: Instant,
}

pub struct QueryRunner {
    latency: Duration,
    generation: u64,
    pending: Option<PendingQuery>,
}

impl QueryRunner {
    pub fn new(latency_ms: u64) -> Self {
        Self {
            latency: Duration::from_millis(latency_ms),
            generation: 0,
            pending: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Start a query for `location`, superseding any running one
    pub fn spawn(&mut self, accounts: Arc<Vec<Account>>, location: &Location, default_limit: usize) {
        let (tx, rx) = mpsc::channel();
        let query = AccountQuery::from_location(location, default_limit);
        let latency = self.latency;
        self.generation += 1;
        let generation = self.generation;
        log::debug!("query #{} started for {}", generation, location);

        thread::spawn(move || {
            if !latency.is_zero() {
                thread::sleep(latency);
            }
            let result = query.run(&accounts);
            // The receiver is gone when a newer query replaced this one
            let _ = tx.send(QueryMessage::Completed(result));
        });

        self.pending = Some(PendingQuery {
            receiver: rx,
            generation,
            started: Instant::now(),
        });
    }

    /// Result of the current query once it has finished
    pub fn poll(&mut self) -> Option<QueryResult> {
        let pending = self.pending.as_ref()?;
        match pending.receiver.try_recv() {
            Ok(QueryMessage::Completed(result)) => {
                log::info!(
                    "query #{} finished in {:?}: {} of {} rows",
                    pending.generation,
                    pending.started.elapsed(),
                    result.rows.len(),
                    result.pagination.total
                );
                self.pending = None;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                log::warn!("query #{} thread exited without a result", pending.generation);
                self.pending = None;
                None
            }
        }
    }

    /// Block until the current query finishes
    pub fn wait(&mut self) -> Option<QueryResult> {
        let pending = self.pending.take()?;
        match pending.receiver.recv() {
            Ok(QueryMessage::Completed(result)) => Some(result),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::dataset::{sample_accounts, SAMPLE_SIZE};

    #[test]
    fn test_query_completes_in_background() {
        let accounts = Arc::new(sample_accounts());
        let mut runner = QueryRunner::new(0);
        runner.spawn(accounts, &"/accounts?limit=5".parse().unwrap(), 10);
        assert!(runner.is_loading());

        let result = runner.wait().unwrap();
        assert_eq!(result.rows.len(), 5);
        assert!(!runner.is_loading());
    }

    #[test]
    fn test_poll_returns_result_once() {
        let accounts = Arc::new(sample_accounts());
        let mut runner = QueryRunner::new(0);
        runner.spawn(accounts, &Location::new("/accounts"), 10);

        let deadline = Instant::now() + Duration::from_secs(5);
        let result = loop {
            if let Some(result) = runner.poll() {
                break result;
            }
            assert!(Instant::now() < deadline, "query never finished");
            thread::sleep(Duration::from_millis(5));
        };
        assert_eq!(result.pagination.total, SAMPLE_SIZE);
        assert!(runner.poll().is_none());
    }

    #[test]
    fn test_newer_query_supersedes_older() {
        let accounts = Arc::new(sample_accounts());
        let mut runner = QueryRunner::new(0);
        runner.spawn(accounts.clone(), &"/accounts?page=1".parse().unwrap(), 10);
        runner.spawn(accounts, &"/accounts?page=2".parse().unwrap(), 10);

        let result = runner.wait().unwrap();
        assert_eq!(result.pagination.page, 2);
    }
}
