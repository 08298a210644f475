// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::EncryptionError;
use fhe::bfv::{BfvParameters, BfvParametersBuilder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Name of the default parameter preset
pub const DEFAULT_BFV_PRESET: &str = "SET_2048_1032193_1";

/// Constants for the default preset
pub mod set_2048_1032193_1 {
    pub const DEGREE: usize = 2048;
    pub const PLAINTEXT_MODULUS: u64 = 1032193;
    pub const MODULI: &[u64] = &[0x3FFFFFFF000001];
}

/// The values needed to construct `BfvParameters`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BfvParamSet {
    pub degree: usize,
    pub plaintext_modulus: u64,
    pub moduli: Vec<u64>,
}

impl BfvParamSet {
    /// Look up a named preset
    pub fn from_preset(name: &str) -> Result<Self, EncryptionError> {
        match name {
            DEFAULT_BFV_PRESET => Ok(Self {
                degree: set_2048_1032193_1::DEGREE,
                plaintext_modulus: set_2048_1032193_1::PLAINTEXT_MODULUS,
                moduli: set_2048_1032193_1::MODULI.to_vec(),
            }),
            other => Err(EncryptionError::InvalidParameters(format!(
                "Unknown preset: {other}"
            ))),
        }
    }

    pub fn build_arc(&self) -> Result<Arc<BfvParameters>, EncryptionError> {
        build_bfv_params_arc(self.degree, self.plaintext_modulus, &self.moduli)
    }
}

impl Default for BfvParamSet {
    fn default() -> Self {
        Self {
            degree: set_2048_1032193_1::DEGREE,
            plaintext_modulus: set_2048_1032193_1::PLAINTEXT_MODULUS,
            moduli: set_2048_1032193_1::MODULI.to_vec(),
        }
    }
}

pub fn build_bfv_params_arc(
    degree: usize,
    plaintext_modulus: u64,
    moduli: &[u64],
) -> Result<Arc<BfvParameters>, EncryptionError> {
    BfvParametersBuilder::new()
        .set_degree(degree)
        .set_plaintext_modulus(plaintext_modulus)
        .set_moduli(moduli)
        .build_arc()
        .map_err(|e| EncryptionError::InvalidParameters(e.to_string()))
}
