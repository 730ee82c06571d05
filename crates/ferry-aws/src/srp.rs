//! SRP-6a password verification as Cognito's `USER_SRP_AUTH` flow expects
//! it.
//!
//! The client sends `A = g^a mod N`; Cognito answers with `B`, a salt and a
//! secret block. The client derives a 16-byte key from the shared secret
//! and signs the pool name, user id, secret block and timestamp with it.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use hkdf::Hkdf;
use hmac::{Hmac, Mac};
use num_bigint::BigUint;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// RFC 3526 3072-bit MODP group prime.
const N_HEX: &str = concat!(
    "FFFFFFFFFFFFFFFFC90FDAA22168C234C4C6628B80DC1CD1",
    "29024E088A67CC74020BBEA63B139B22514A08798E3404DD",
    "EF9519B3CD3A431B302B0A6DF25F14374FE1356D6D51C245",
    "E485B576625E7EC6F44C42E9A637ED6B0BFF5CB6F406B7ED",
    "EE386BFB5A899FA5AE9F24117C4B1FE649286651ECE45B3D",
    "C2007CB8A163BF0598DA48361C55D39A69163FA8FD24CF5F",
    "83655D23DCA3AD961C62F356208552BB9ED529077096966D",
    "670C354E4ABC9804F1746C08CA18217C32905E462E36CE3B",
    "E39E772C180E86039B2783A2EC07A28FB5C55DF06F4C52C9",
    "DE2BCBF6955817183995497CEA956AE515D2261898FA0510",
    "15728E5A8AAAC42DAD33170D04507A33A85521ABDF1CBA64",
    "ECFB850458DBEF0A8AEA71575D060C7DB3970F85A6E1E4C7",
    "ABF5AE8CDB0933D71E8C94E04A25619DCEE3D2261AD2EE6B",
    "F12FFA06D98A0864D87602733EC86A64521F2B18177B200C",
    "BBE117577A615D6C770988C0BAD946E208E24FA074E5AB31",
    "43DB5BFCE0FD108E4B82D120A93AD2CAFFFFFFFFFFFFFFFF",
);

const G: u32 = 2;

const DERIVED_KEY_INFO: &[u8] = b"Caldera Derived Key";

/// Why a server challenge could not be answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SrpError {
    /// A challenge parameter was absent or not valid hex/base64.
    BadParameter(&'static str),
    /// `B mod N` or `u` was zero.
    UnsafeParameter(&'static str),
}

impl std::fmt::Display for SrpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SrpError::BadParameter(name) => write!(f, "invalid {} in challenge", name),
            SrpError::UnsafeParameter(name) => write!(f, "unsafe {} in challenge", name),
        }
    }
}

fn n() -> BigUint {
    // The constant is well-formed hex.
    BigUint::parse_bytes(N_HEX.as_bytes(), 16).unwrap_or_default()
}

fn g() -> BigUint {
    BigUint::from(G)
}

/// Lowercase hex of `value`, padded so it reads as a positive
/// two's-complement number: even length and a leading nibble below 8.
pub(crate) fn pad_hex(value: &BigUint) -> String {
    let hex = format!("{:x}", value);
    if hex.len() % 2 == 1 {
        format!("0{}", hex)
    } else if matches!(hex.as_bytes()[0], b'8'..=b'9' | b'a'..=b'f') {
        format!("00{}", hex)
    } else {
        hex
    }
}

/// SHA-256 of the bytes encoded by `hex`.
fn hex_hash(hex: &str) -> Vec<u8> {
    let bytes = hex::decode(hex).unwrap_or_default();
    Sha256::digest(bytes).to_vec()
}

fn hash_to_int(digest: &[u8]) -> BigUint {
    BigUint::from_bytes_be(digest)
}

fn padded_bytes(value: &BigUint) -> Vec<u8> {
    hex::decode(pad_hex(value)).unwrap_or_default()
}

pub(crate) fn multiplier() -> BigUint {
    hash_to_int(&hex_hash(&format!("{}{}", pad_hex(&n()), pad_hex(&g()))))
}

pub(crate) fn scrambler(big_a: &BigUint, big_b: &BigUint) -> BigUint {
    hash_to_int(&hex_hash(&format!("{}{}", pad_hex(big_a), pad_hex(big_b))))
}

/// Private key `x = H(salt || H(pool || user || ":" || password))`.
pub(crate) fn private_key(salt: &BigUint, pool_name: &str, user_id: &str, password: &str) -> BigUint {
    let inner = Sha256::digest(format!("{}{}:{}", pool_name, user_id, password).as_bytes());
    hash_to_int(&hex_hash(&format!("{}{}", pad_hex(salt), hex::encode(inner))))
}

/// HKDF-SHA256 over the shared secret, salted with `u`.
pub(crate) fn derive_key(secret: &BigUint, u: &BigUint) -> [u8; 16] {
    let salt = padded_bytes(u);
    let ikm = padded_bytes(secret);
    let mut okm = [0u8; 16];
    // 16 bytes is far below HKDF's output limit.
    let _ = Hkdf::<Sha256>::new(Some(&salt), &ikm).expand(DERIVED_KEY_INFO, &mut okm);
    okm
}

/// Timestamp in the form Cognito signs: `Tue Mar 5 07:08:09 UTC 2024`.
pub(crate) fn timestamp(now: DateTime<Utc>) -> String {
    now.format("%a %b %-d %H:%M:%S UTC %Y").to_string()
}

/// The answer to a `PASSWORD_VERIFIER` challenge.
#[derive(Debug, Clone)]
pub(crate) struct PasswordClaim {
    pub secret_block: String,
    pub timestamp: String,
    pub signature: String,
}

/// One SRP exchange: an ephemeral key pair and the pool it targets.
pub(crate) struct SrpClient {
    pool_name: String,
    a: BigUint,
    big_a: BigUint,
}

impl SrpClient {
    /// Generate a fresh ephemeral key pair for `pool_name`.
    pub fn new(pool_name: impl Into<String>) -> Self {
        let n = n();
        loop {
            let mut bytes = [0u8; 128];
            OsRng.fill_bytes(&mut bytes);
            let a = BigUint::from_bytes_be(&bytes);
            let big_a = g().modpow(&a, &n);
            if big_a.bits() != 0 {
                return Self {
                    pool_name: pool_name.into(),
                    a,
                    big_a,
                };
            }
        }
    }

    #[cfg(test)]
    fn with_private(pool_name: &str, a: BigUint) -> Self {
        let big_a = g().modpow(&a, &n());
        Self {
            pool_name: pool_name.to_string(),
            a,
            big_a,
        }
    }

    /// `A` as Cognito's `SRP_A` parameter.
    pub fn public_hex(&self) -> String {
        format!("{:x}", self.big_a)
    }

    /// The session key shared with the server.
    pub(crate) fn session_key(
        &self,
        user_id: &str,
        password: &str,
        srp_b: &str,
        salt: &str,
    ) -> Result<[u8; 16], SrpError> {
        let n = n();
        let big_b = BigUint::parse_bytes(srp_b.as_bytes(), 16)
            .ok_or(SrpError::BadParameter("SRP_B"))?;
        if (&big_b % &n).bits() == 0 {
            return Err(SrpError::UnsafeParameter("SRP_B"));
        }
        let salt =
            BigUint::parse_bytes(salt.as_bytes(), 16).ok_or(SrpError::BadParameter("SALT"))?;

        let u = scrambler(&self.big_a, &big_b);
        if u.bits() == 0 {
            return Err(SrpError::UnsafeParameter("u"));
        }

        let x = private_key(&salt, &self.pool_name, user_id, password);
        let kgx = (multiplier() * g().modpow(&x, &n)) % &n;
        // (B - k*g^x) mod N, kept non-negative.
        let base = ((&big_b % &n) + &n - kgx) % &n;
        let exponent = &self.a + &u * &x;
        let secret = base.modpow(&exponent, &n);

        Ok(derive_key(&secret, &u))
    }

    /// Sign the server's secret block at `now`.
    pub fn password_claim(
        &self,
        user_id: &str,
        password: &str,
        srp_b: &str,
        salt: &str,
        secret_block: &str,
        now: DateTime<Utc>,
    ) -> Result<PasswordClaim, SrpError> {
        let key = self.session_key(user_id, password, srp_b, salt)?;
        let block = STANDARD
            .decode(secret_block)
            .map_err(|_| SrpError::BadParameter("SECRET_BLOCK"))?;
        let timestamp = timestamp(now);

        let mut mac =
            HmacSha256::new_from_slice(&key).map_err(|_| SrpError::BadParameter("key"))?;
        mac.update(self.pool_name.as_bytes());
        mac.update(user_id.as_bytes());
        mac.update(&block);
        mac.update(timestamp.as_bytes());

        Ok(PasswordClaim {
            secret_block: secret_block.to_string(),
            timestamp,
            signature: STANDARD.encode(mac.finalize().into_bytes()),
        })
    }
}
