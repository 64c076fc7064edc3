//! Property-based tests for the credchain core library

mod support;

mod config_tests;
mod resolver_tests;
mod validator_tests;
