// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Digests and encodings shared by the encryption client, the oracle and the contract.

use crate::EncryptionError;
use alloy::{
    primitives::{keccak256, Address, Bytes, Signature, B256, U256},
    sol_types::SolValue,
};
use tvr_evm_helpers::contracts::CiphertextHandle;

/// Binds a ciphertext to the contract and account it was produced for
pub fn input_proof(ciphertext: &[u8], target: Address, requester: Address) -> B256 {
    let mut buf = Vec::with_capacity(ciphertext.len() + 40);
    buf.extend_from_slice(ciphertext);
    buf.extend_from_slice(target.as_slice());
    buf.extend_from_slice(requester.as_slice());
    keccak256(buf)
}

pub fn handles_digest(handles: &[CiphertextHandle]) -> B256 {
    let mut buf = Vec::with_capacity(handles.len() * 32);
    for handle in handles {
        buf.extend_from_slice(keccak256(handle.as_bytes()).as_slice());
    }
    keccak256(buf)
}

/// The message signed by the decryption oracle
pub fn decryption_digest(
    handles: &[CiphertextHandle],
    target: Address,
    clear_values: &[u8],
) -> B256 {
    let mut buf = Vec::with_capacity(32 + 20 + clear_values.len());
    buf.extend_from_slice(handles_digest(handles).as_slice());
    buf.extend_from_slice(target.as_slice());
    buf.extend_from_slice(clear_values);
    keccak256(buf)
}

/// ABI encode clear values as `uint256[]`
pub fn encode_clear_values(values: &[u64]) -> Bytes {
    let words: Vec<U256> = values.iter().map(|v| U256::from(*v)).collect();
    Bytes::from(words.abi_encode())
}

pub fn decode_clear_values(data: &[u8]) -> Result<Vec<u64>, EncryptionError> {
    let words = Vec::<U256>::abi_decode(data)
        .map_err(|e| EncryptionError::Verification(format!("Malformed clear values: {e}")))?;
    words
        .into_iter()
        .map(|w| {
            u64::try_from(w).map_err(|_| {
                EncryptionError::Verification("Clear value larger than 64-bit".to_string())
            })
        })
        .collect()
}

/// Recover the account that signed a decryption proof
pub fn recover_signer(digest: B256, proof: &[u8]) -> Result<Address, EncryptionError> {
    let signature = Signature::try_from(proof)
        .map_err(|e| EncryptionError::Verification(format!("Malformed proof: {e}")))?;
    signature
        .recover_address_from_prehash(&digest)
        .map_err(|e| EncryptionError::Verification(format!("Unrecoverable proof: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::signers::{local::PrivateKeySigner, SignerSync};

    #[test]
    fn test_input_proof_binds_target_and_requester() {
        let ct = [1u8, 2, 3];
        let a = Address::repeat_byte(1);
        let b = Address::repeat_byte(2);
        assert_eq!(input_proof(&ct, a, b), input_proof(&ct, a, b));
        assert_ne!(input_proof(&ct, a, b), input_proof(&ct, b, a));
        assert_ne!(input_proof(&ct, a, b), input_proof(&[1, 2], a, b));
    }

    #[test]
    fn test_clear_values_encoding() {
        let encoded = encode_clear_values(&[7, 10]);
        assert_eq!(encoded.len(), 32 * 4);
        assert_eq!(decode_clear_values(&encoded).unwrap(), vec![7, 10]);
        assert!(decode_clear_values(&[1, 2, 3]).is_err());
    }

    #[test]
    fn test_signature_recovers_signer() {
        let signer = PrivateKeySigner::random();
        let handles = vec![CiphertextHandle::from(vec![9u8; 16])];
        let clear = encode_clear_values(&[7]);
        let digest = decryption_digest(&handles, Address::ZERO, &clear);
        let signature = signer.sign_hash_sync(&digest).unwrap();

        let recovered = recover_signer(digest, &signature.as_bytes()).unwrap();
        assert_eq!(recovered, signer.address());

        let other = decryption_digest(&handles, Address::repeat_byte(3), &clear);
        assert_ne!(recover_signer(other, &signature.as_bytes()).unwrap(), signer.address());
    }
}
