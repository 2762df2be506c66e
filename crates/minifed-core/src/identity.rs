//! Per-entity signing identities.
//!
//! Every entity gets a fresh ECDSA keypair at startup via `ring`. Keys are
//! never persisted, so identities regenerate on every run.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::jwk::{
    AlgorithmParameters, CommonParameters, EllipticCurve, EllipticCurveKeyParameters,
    EllipticCurveKeyType, Jwk, JwkSet, KeyAlgorithm, PublicKeyUse, ThumbprintHash,
};
use jsonwebtoken::{Algorithm, EncodingKey};
use ring::rand::SystemRandom;
use ring::signature::{
    EcdsaKeyPair, EcdsaSigningAlgorithm, KeyPair, ECDSA_P256_SHA256_FIXED_SIGNING,
    ECDSA_P384_SHA384_FIXED_SIGNING,
};
use std::fmt;
use std::str::FromStr;

use crate::{FedError, Result};

/// JWS signing algorithm of an entity key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SigningAlgorithm {
    /// ECDSA with P-256 and SHA-256.
    #[default]
    Es256,
    /// ECDSA with P-384 and SHA-384.
    Es384,
}

impl SigningAlgorithm {
    /// JWA name used in the JWS header and JWK `alg`.
    #[must_use]
    pub const fn jws_name(self) -> &'static str {
        match self {
            Self::Es256 => "ES256",
            Self::Es384 => "ES384",
        }
    }

    /// JWS header algorithm.
    #[must_use]
    pub const fn jwt_algorithm(self) -> Algorithm {
        match self {
            Self::Es256 => Algorithm::ES256,
            Self::Es384 => Algorithm::ES384,
        }
    }

    const fn key_algorithm(self) -> KeyAlgorithm {
        match self {
            Self::Es256 => KeyAlgorithm::ES256,
            Self::Es384 => KeyAlgorithm::ES384,
        }
    }

    const fn curve(self) -> EllipticCurve {
        match self {
            Self::Es256 => EllipticCurve::P256,
            Self::Es384 => EllipticCurve::P384,
        }
    }

    /// Byte length of one affine coordinate.
    const fn coordinate_len(self) -> usize {
        match self {
            Self::Es256 => 32,
            Self::Es384 => 48,
        }
    }

    fn ring_algorithm(self) -> &'static EcdsaSigningAlgorithm {
        match self {
            Self::Es256 => &ECDSA_P256_SHA256_FIXED_SIGNING,
            Self::Es384 => &ECDSA_P384_SHA384_FIXED_SIGNING,
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.jws_name())
    }
}

impl FromStr for SigningAlgorithm {
    type Err = FedError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ES256" => Ok(Self::Es256),
            "ES384" => Ok(Self::Es384),
            other => Err(FedError::Config(format!(
                "unsupported signing algorithm '{other}' (expected ES256 or ES384)"
            ))),
        }
    }
}

/// Signing JWK for an uncompressed SEC1 point (`0x04 || x || y`), with the
/// RFC 7638 SHA-256 thumbprint as `kid`.
fn signing_jwk(algorithm: SigningAlgorithm, point: &[u8]) -> Result<Jwk> {
    let n = algorithm.coordinate_len();
    if point.len() != 1 + 2 * n || point[0] != 0x04 {
        return Err(FedError::Construction(format!(
            "unexpected {algorithm} public key encoding ({} bytes)",
            point.len()
        )));
    }

    let mut jwk = Jwk {
        common: CommonParameters {
            public_key_use: Some(PublicKeyUse::Signature),
            key_algorithm: Some(algorithm.key_algorithm()),
            ..CommonParameters::default()
        },
        algorithm: AlgorithmParameters::EllipticCurve(EllipticCurveKeyParameters {
            key_type: EllipticCurveKeyType::EC,
            curve: algorithm.curve(),
            x: URL_SAFE_NO_PAD.encode(&point[1..=n]),
            y: URL_SAFE_NO_PAD.encode(&point[n + 1..]),
        }),
    };
    jwk.common.key_id = Some(jwk.thumbprint(ThumbprintHash::SHA256));
    Ok(jwk)
}

/// An entity's private signing key and its public JWK.
pub struct SigningIdentity {
    algorithm: SigningAlgorithm,
    encoding_key: EncodingKey,
    jwk: Jwk,
}

impl SigningIdentity {
    /// Generate a fresh keypair for `algorithm`.
    pub fn generate(algorithm: SigningAlgorithm) -> Result<Self> {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(algorithm.ring_algorithm(), &rng)
            .map_err(|_| FedError::Construction(format!("{algorithm} key generation failed")))?;
        let key_pair = EcdsaKeyPair::from_pkcs8(algorithm.ring_algorithm(), pkcs8.as_ref(), &rng)
            .map_err(|e| FedError::Construction(format!("{algorithm} key rejected: {e}")))?;
        let jwk = signing_jwk(algorithm, key_pair.public_key().as_ref())?;

        Ok(Self {
            algorithm,
            encoding_key: EncodingKey::from_ec_der(pkcs8.as_ref()),
            jwk,
        })
    }

    /// Algorithm this key signs with.
    #[must_use]
    pub const fn algorithm(&self) -> SigningAlgorithm {
        self.algorithm
    }

    /// Key ID published in JWS headers.
    #[must_use]
    pub fn kid(&self) -> &str {
        self.jwk.common.key_id.as_deref().unwrap_or_default()
    }

    /// Public key set containing only this key.
    #[must_use]
    pub fn jwks(&self) -> JwkSet {
        JwkSet {
            keys: vec![self.jwk.clone()],
        }
    }

    /// Private key for JWS signing.
    #[must_use]
    pub const fn encoding_key(&self) -> &EncodingKey {
        &self.encoding_key
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningIdentity")
            .field("algorithm", &self.algorithm)
            .field("kid", &self.kid())
            .field("private_key", &"[redacted]")
            .finish()
    }
}
