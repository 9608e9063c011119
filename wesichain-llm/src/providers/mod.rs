//! Provider-specific LLM clients

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "deepseek")]
pub mod deepseek;
