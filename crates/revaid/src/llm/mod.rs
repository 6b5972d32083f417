//! Text generation providers.

mod gemini;
mod generator;

pub use gemini::GeminiGenerator;
pub use generator::{GeneratorError, Message, Role, TextGenerator};
