//! Compact JWS serialization for entity statements.

use jsonwebtoken::{encode, Header};
use minifed_core::SigningIdentity;
use serde::Serialize;

use crate::Result;

/// `typ` header value for entity configurations and subordinate statements.
pub const ENTITY_STATEMENT_TYP: &str = "entity-statement+jwt";

/// Sign `claims` with `identity`. The header carries the identity's
/// algorithm and `kid`, and `typ`.
pub fn sign<T: Serialize>(identity: &SigningIdentity, typ: &str, claims: &T) -> Result<String> {
    let mut header = Header::new(identity.algorithm().jwt_algorithm());
    header.kid = Some(identity.kid().to_string());
    header.typ = Some(typ.to_string());
    Ok(encode(&header, claims, identity.encoding_key())?)
}

/// Check `token` against the key in `jwks` named by its `kid`.
#[cfg(test)]
pub(crate) fn verify<T: serde::de::DeserializeOwned>(
    token: &str,
    jwks: &minifed_core::JwkSet,
) -> jsonwebtoken::errors::Result<jsonwebtoken::TokenData<T>> {
    use jsonwebtoken::errors::ErrorKind;
    use jsonwebtoken::jwk::AlgorithmParameters;
    use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};

    let header = decode_header(token)?;
    let jwk = header
        .kid
        .as_deref()
        .and_then(|kid| jwks.find(kid))
        .ok_or(ErrorKind::InvalidKeyFormat)?;
    let AlgorithmParameters::EllipticCurve(params) = &jwk.algorithm else {
        return Err(ErrorKind::InvalidKeyFormat.into());
    };
    let key = DecodingKey::from_ec_components(&params.x, &params.y)?;

    let mut validation = Validation::new(header.alg);
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    decode(token, &key, &validation)
}
