//! Plain-language names and reasoning for k-means clusters.
//!
//! The cluster centroids of one page are sent to a chat-completion model as a
//! JSON prompt; the model's answer is merged back into the page's
//! [`survey::ClusterList`] only when it lines up with the clusters exactly.

pub mod cancel;
pub mod client;
pub mod enrich;
pub mod error;
pub mod messages;
pub mod prompt;
pub mod response;

pub use cancel::{CancelHandle, CancelSignal};
pub use client::{BoxFuture, LanguageModel, OpenAiClient, OpenAiConfig};
pub use enrich::Enricher;
pub use error::NarrativeError;
pub use messages::{Message, MessageLog};
pub use prompt::{Prompt, PromptCluster};
pub use response::{ClusterNarrative, NarrativeResponse};
