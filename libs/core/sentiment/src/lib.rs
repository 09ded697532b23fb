// [libs/core/sentiment/src/lib.rs]
/*!
 * =================================================================
 * APARATO: SENTIMENT CASCADE (C3)
 * CLASIFICACIÓN: CORE ORCHESTRATION (ESTRATO L3)
 * RESPONSABILIDAD: PIPELINE DE TRES NIVELES CON TERMINACIÓN GARANTIZADA
 *
 * Compone los breakers y el ledger de cuota de `broker-core-resilience`
 * con los clientes HTTP de `broker-infra-ai-clients` para producir un
 * SentimentRecord sin jamás fallar externamente: el nivel de palabras
 * clave siempre responde.
 * =================================================================
 */

pub mod cascade;
pub mod lexicon;

pub use cascade::SentimentCascade;
