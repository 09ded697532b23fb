// [libs/infra/ai-clients/src/lib.rs]
/*!
 * =================================================================
 * APARATO: AI CLIENTS (ESTRATO L3)
 * RESPONSABILIDAD: ADAPTADORES HTTP HACIA PROSODIA REMOTA Y LLM LOCAL
 *
 * Consumidos exclusivamente por la cascada de sentimiento (C3) en
 * `broker-core-sentiment`. Cada cliente es un adaptador delgado; la
 * lógica de cascada, breaker y cuota vive aguas arriba.
 * =================================================================
 */

pub mod errors;
pub mod local_llm;
pub mod remote_prosody;

pub use errors::ClientError;
pub use local_llm::{LocalLlmClient, LocalLlmSentiment};
pub use remote_prosody::{ProsodyRequest, ProsodyResponse, RemoteProsodyClient};
