//! Integration tests

mod allocation_test;
mod concurrency_test;
mod e2e_test;
