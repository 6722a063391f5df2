//! Utility functions for common operations.
//!
//! This module provides reusable text helpers used while normalizing feed
//! entries and matching filter terms:
//!
//! - **HTML cleanup**: extract readable text from feed descriptions
//! - **Truncation**: character-aware shortening with an ellipsis
//! - **Word matching**: boundary-aware term search for the relevance filter
//!
//! # Examples
//!
//! ```
//! use newsbot::util::{clean_html, contains_word, truncate_chars};
//!
//! let text = clean_html("<p>NVIDIA ships a <em>new</em> GPU</p>");
//! assert_eq!(text, "NVIDIA ships a new GPU");
//! assert!(contains_word(&text.to_lowercase(), "gpu"));
//! assert_eq!(truncate_chars(&text, 6), "NVIDIA...");
//! ```

mod text;

pub use text::{clean_html, collapse_whitespace, contains_word, truncate_chars};
