pub mod draw_service;
pub mod gemini;
pub mod histogram;
pub mod reveal;
