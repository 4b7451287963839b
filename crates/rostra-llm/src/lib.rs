pub mod anthropic;
pub mod decode;
pub mod research;
pub mod speech;

pub mod mock;

pub use anthropic::{AnthropicClient, AnthropicConfig};
pub use research::{TavilyClient, TavilyConfig};
pub use speech::{ElevenLabsClient, ElevenLabsConfig};
