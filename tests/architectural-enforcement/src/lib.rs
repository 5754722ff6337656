//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural
//! principles for the docchat workspace:
//! - No blocking I/O in async production code
//! - Proper async I/O patterns
//!
//! These tests are designed to catch violations early in the development cycle.

#![allow(dead_code)]

pub fn placeholder() {
    // Placeholder to make this a valid library
}
