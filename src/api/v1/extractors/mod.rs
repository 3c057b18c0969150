/*!
 * Extractors for authenticated handlers.
 *
 * Public API:
 * - AccessClaims
 */
mod access_claims;

pub use access_claims::AccessClaims;
