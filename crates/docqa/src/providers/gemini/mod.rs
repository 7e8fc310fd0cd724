//! Google Gemini (Generative Language API) provider

mod client;

pub use client::GeminiClient;
