//! Session credentials: wire tokens, stored records, and the authority that
//! ties them together.

mod authority;
mod record;
mod token;

pub use authority::{
    CredentialSummary, DEFAULT_AUDIT_RETENTION, DEFAULT_LIFETIME, DEFAULT_MAX_CREDENTIALS,
    DEFAULT_REFRESH_WINDOW, IssueContext, IssuedCredential, SessionAuthority, SessionPolicy,
    VerifiedSession,
};
pub use record::{
    ACCOUNT_INDEX_KEY_PREFIX, CREDENTIAL_KEY_PREFIX, CredentialRecord, CredentialStatus,
    account_index_key, credential_key,
};
pub use token::{AccountId, CredentialClaims, InvalidAccountId, ParsedToken, TOKEN_FIELDS};
