// [apps/orchestrator/src/handlers/mod.rs]
/*!
 * Adaptadores de entrada del orquestador: el facade REST (C15) en
 * `api`, identidad y sesiones en `identity`, los comandos de centro de
 * mando en `command`, y el CommandCenterHub (C11) en `stream`.
 */

pub mod api;
pub mod command;
pub mod identity;
pub mod stream;
