/*
 * Responsibility
 * - service 層の公開インターフェース (re-export)
 */
pub mod auth;
