pub mod cognito;
pub mod guard;

pub use cognito::{access_token_from_headers, CognitoIdentity};
pub use guard::{ensure_owner, require_identity, Identity, IdentityProvider, StaticIdentity};
