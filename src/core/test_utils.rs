//! Test utilities for arena-based testing.
//!
//! Sessions borrow their arena, so tests keep a [`test::TestContext`] alive
//! for the duration of the session they create.
