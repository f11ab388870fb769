//! Account identifier handling.
//!
//! Accounts are configured either as a plain identifier (`myorg-myaccount`,
//! `xy12345`) or as `org.account`. The dotted form is rewritten to the
//! hyphenated `org-account` form for both the host name and the JWT claims.

/// Identifier used in host names: lower-case, `.` replaced by `-`.
pub fn host_identifier(account: &str) -> String {
    account.trim().to_ascii_lowercase().replace('.', "-")
}

/// Identifier used in key-pair JWT claims: upper-case, `.` replaced by `-`.
pub fn jwt_identifier(account: &str) -> String {
    account.trim().to_ascii_uppercase().replace('.', "-")
}

/// SQL API base URL for an account.
pub fn base_url(account: &str) -> String {
    format!("https://{}.snowflakecomputing.com", host_identifier(account))
}
