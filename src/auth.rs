use jsonwebtoken::{ decode, Algorithm, DecodingKey, Validation };
use log::debug;
use serde::{ Deserialize, Serialize };
use thiserror::Error;

/// Claims read from the access token issued by the platform's auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Access token is missing")]
    MissingToken,

    #[error("Invalid access token")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),
}

/// Checks the `access_token` carried in generation requests.
///
/// With a secret the HS256 signature is verified. Without one the token is
/// only decoded, leaving signature checks to the service that issued it.
/// `exp` is enforced when present.
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
    verifies_signature: bool,
}

impl TokenVerifier {
    pub fn new(secret: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims::<&str>(&[]);
        validation.validate_aud = false;

        match secret.filter(|s| !s.is_empty()) {
            Some(secret) => Self {
                key: DecodingKey::from_secret(secret.as_bytes()),
                validation,
                verifies_signature: true,
            },
            None => {
                validation.insecure_disable_signature_validation();
                Self {
                    key: DecodingKey::from_secret(&[]),
                    validation,
                    verifies_signature: false,
                }
            }
        }
    }

    pub fn verifies_signature(&self) -> bool {
        self.verifies_signature
    }

    pub fn verify(&self, token: Option<&str>) -> Result<AccessClaims, AuthError> {
        let token = token.map(str::trim).filter(|t| !t.is_empty()).ok_or(AuthError::MissingToken)?;
        let data = decode::<AccessClaims>(token, &self.key, &self.validation).map_err(|e| {
            debug!("Access token rejected: {}", e);
            AuthError::InvalidToken(e)
        })?;
        debug!("Access token accepted: sub={:?} email={:?}", data.claims.sub, data.claims.email);
        Ok(data.claims)
    }
}
