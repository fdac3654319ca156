use http::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::config::AuthInfo;

/// Possible errors when setting up authentication
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid basic auth
    #[error("invalid basic auth: username and password must both be set")]
    IncompleteBasicAuth,

    /// Invalid bearer token
    #[error("invalid bearer token: {0}")]
    InvalidBearerToken(#[source] http::header::InvalidHeaderValue),
}

/// How requests are authenticated
///
/// Client certificates are handled by the TLS stack and show up here as `None`.
#[derive(Debug, Clone)]
pub(crate) enum Auth {
    None,
    Basic(String, SecretString),
    Bearer(SecretString),
}

impl TryFrom<&AuthInfo> for Auth {
    type Error = Error;

    fn try_from(auth_info: &AuthInfo) -> Result<Self, Self::Error> {
        match (&auth_info.username, &auth_info.password) {
            (Some(u), Some(p)) => return Ok(Self::Basic(u.to_owned(), p.to_owned())),
            (Some(_), None) | (None, Some(_)) => return Err(Error::IncompleteBasicAuth),
            (None, None) => {}
        }

        if let Some(token) = &auth_info.token {
            // AddAuthorizationLayer panics on invalid header values
            HeaderValue::try_from(format!("Bearer {}", token.expose_secret()))
                .map_err(Error::InvalidBearerToken)?;
            return Ok(Self::Bearer(token.clone()));
        }
        Ok(Self::None)
    }
}
