//! Test suites for the dispatcher bootstrap.

mod support;
