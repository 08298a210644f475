// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::EncryptionError;
use fhe::bfv::{BfvParameters, PublicKey, SecretKey};
use fhe_traits::{DeserializeParametrized, Serialize};
use rand::thread_rng;
use std::{fs, path::Path, sync::Arc};
use tracing::info;

/// A freshly generated BFV key pair in serialized form
pub struct KeyPair {
    pub public_key: Vec<u8>,
    pub secret_key: Vec<u8>,
}

pub fn generate_keypair(params: &Arc<BfvParameters>) -> Result<KeyPair, EncryptionError> {
    let mut rng = thread_rng();
    let sk = SecretKey::random(params, &mut rng);
    let pk = PublicKey::new(&sk, &mut rng);
    Ok(KeyPair {
        public_key: pk.to_bytes(),
        secret_key: SecretKeySerializer::to_bytes(&sk)?,
    })
}

pub fn decode_public_key(
    bytes: &[u8],
    params: &Arc<BfvParameters>,
) -> Result<PublicKey, EncryptionError> {
    PublicKey::from_bytes(bytes, params)
        .map_err(|e| EncryptionError::InvalidKey(format!("Error deserializing public key: {e}")))
}

pub fn decode_secret_key(
    bytes: &[u8],
    params: &Arc<BfvParameters>,
) -> Result<SecretKey, EncryptionError> {
    SecretKeySerializer::from_bytes(bytes, params)
}

/// Write both halves of a key pair, refusing to overwrite existing files
pub fn write_keypair(
    keypair: &KeyPair,
    public_key_path: &Path,
    secret_key_path: &Path,
) -> Result<(), EncryptionError> {
    for path in [public_key_path, secret_key_path] {
        if path.exists() {
            return Err(EncryptionError::InvalidKey(format!(
                "Refusing to overwrite {}",
                path.display()
            )));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(public_key_path, &keypair.public_key)?;
    fs::write(secret_key_path, &keypair.secret_key)?;
    info!(
        public_key = %public_key_path.display(),
        secret_key = %secret_key_path.display(),
        "Wrote BFV key pair"
    );
    Ok(())
}

pub fn read_key(path: &Path) -> Result<Vec<u8>, EncryptionError> {
    fs::read(path).map_err(|e| {
        EncryptionError::InvalidKey(format!("Could not read key file {}: {e}", path.display()))
    })
}

struct SecretKeySerializer;

#[derive(serde::Serialize, serde::Deserialize)]
struct SecretKeyData {
    coeffs: Box<[i64]>,
}

impl SecretKeySerializer {
    fn to_bytes(sk: &SecretKey) -> Result<Vec<u8>, EncryptionError> {
        bincode::serialize(&SecretKeyData {
            coeffs: sk.coeffs.clone(),
        })
        .map_err(|e| EncryptionError::InvalidKey(e.to_string()))
    }

    fn from_bytes(bytes: &[u8], params: &Arc<BfvParameters>) -> Result<SecretKey, EncryptionError> {
        let SecretKeyData { coeffs } = bincode::deserialize(bytes)
            .map_err(|e| EncryptionError::InvalidKey(format!("Error deserializing secret key: {e}")))?;
        if coeffs.len() != params.degree() {
            return Err(EncryptionError::InvalidKey(format!(
                "Secret key has {} coefficients, expected {}",
                coeffs.len(),
                params.degree()
            )));
        }
        Ok(SecretKey::new(coeffs.to_vec(), params))
    }
}
