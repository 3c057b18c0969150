/*
 * Responsibility
 * - 認可 middleware の公開インターフェース
 */
pub mod access;

pub use access::{Guard, check_access};
