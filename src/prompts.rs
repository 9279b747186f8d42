//! Prompts sent to the extraction service.
//!
//! Centralising every prompt here means changing what is asked of the model
//! requires editing exactly one place, and unit tests can inspect prompts
//! without calling a real service.
//!
//! Callers can override the user instruction via
//! [`crate::config::PipelineConfig::prompt`]; the constants here are the
//! defaults.

/// System message framing the model as a document extractor.
pub const SYSTEM_PROMPT: &str =
    "You are an AI helpful assistant that extracts information from documents.";

/// The three-question instruction sent with every page image.
pub const EXTRACTION_PROMPT: &str = "Based on this image, answer the questions:
1) What is the customer name?
2) What is the account number?
3) What is the balance (in USD) in the account?";
