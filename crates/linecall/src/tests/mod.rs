//! Behavioural test suites for the dispatch loop.
