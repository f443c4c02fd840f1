pub mod authorizer;
pub mod factory;
pub mod identity;
pub mod shared_secret;
pub mod token_codec;

pub use authorizer::{AuthorizationDecision, DenialReason, RequestAuthorizer, SystemFault};
pub use factory::build_authorizer;
pub use identity::{Identity, LookupError, UserDirectory};
