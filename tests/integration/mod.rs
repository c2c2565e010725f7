//! Integration tests for the built-in page presets.

mod page_presets;
