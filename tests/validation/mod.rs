//! Validation tests
