//! Authentication: password digests, bearer tokens and the request gate.

pub mod gate;
pub mod password;
pub mod token;

pub use gate::{authenticate, require_admin, require_role};
pub use token::{TokenIssuer, VerificationError, TOKEN_TTL_HOURS};
