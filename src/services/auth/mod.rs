/*!
 * Access-token authorization services.
 *
 * Responsibility:
 * - bearer: Authorization ヘッダから token を取り出す
 * - jwks: 公開鍵セットの fetch / cache
 * - verify: 署名と標準 claim の検証
 * - permissions: permissions claim のチェック
 *
 * Public API:
 * - AuthService, Claims
 * - JwksCache, KeySet, Jwk
 * - AuthError
 */

pub mod bearer;
pub mod error;
pub mod jwks;
pub mod permissions;
pub mod verify;

pub use error::AuthError;
pub use jwks::JwksCache;
pub use verify::{AuthService, Claims};
