// ABOUTME: DOM traversal helpers shared by the extractors.
// ABOUTME: Provides readability-style candidate scoring over scraper's HTML tree.

//! DOM utilities for locating the main content of a document.

pub mod scoring;
