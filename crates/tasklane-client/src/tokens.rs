//! Token payload decoding
//!
//! The backend has answered with two shapes over time. Both are decoded here
//! and normalised into [`TokenPair`] right after the HTTP call returns.

use serde::Deserialize;

use crate::error::AuthFailure;

/// Tokens issued by the login or refresh endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub tenant_id: Option<String>,
}

/// Both payload shapes. Either access token field may be present, empty or null.
#[derive(Debug, Default, Deserialize)]
struct TokenPayload {
    #[serde(rename = "accessToken", default)]
    access_token: Option<String>,
    #[serde(default)]
    token: Option<String>,
    #[serde(rename = "refreshToken", default)]
    refresh_token: Option<String>,
    #[serde(default)]
    refresh: Option<String>,
    #[serde(rename = "tenantId", default)]
    tenant_id: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Decode a token response body.
///
/// The first non-empty of `accessToken` and `token` is the access token.
/// `fallback_refresh` is kept when the response carries no refresh token.
pub fn decode_tokens(
    body: &[u8],
    fallback_refresh: Option<&str>,
) -> Result<TokenPair, AuthFailure> {
    let payload: TokenPayload = serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "Token response did not match a known shape");
        AuthFailure::MalformedResponse
    })?;

    let access_token = non_empty(payload.access_token)
        .or_else(|| non_empty(payload.token))
        .ok_or(AuthFailure::MalformedResponse)?;

    let refresh_token = non_empty(payload.refresh_token)
        .or_else(|| non_empty(payload.refresh))
        .or_else(|| fallback_refresh.map(str::to_string));

    Ok(TokenPair {
        access_token,
        refresh_token,
        tenant_id: non_empty(payload.tenant_id),
    })
}
