//! Common test utilities and fixtures
//!
//! Recording fakes for every collaborator the error handler talks to, so
//! tests can assert on waits, notifications, navigations and token clears
//! without a UI, a router or real time passing.

#![allow(dead_code)]

pub mod fakes;
pub mod responses;

#[allow(unused_imports)]
pub use fakes::{
    CountingCredentialStore, CountingNavigator, RecordingClock, RecordingNotifier, handler_with,
};
#[allow(unused_imports)]
pub use responses::{error_message_body, error_string_body, items_body};
