//! Verifiable credentials for registered assets
//!
//! A credential describes the asset at registration time. It is hashed
//! without its proof (SHA-256 over the serialized JSON) and signed with the
//! issuer's Ed25519 key.

use crate::error::{DispatchError, DispatchResult};
use chrono::{DateTime, Utc};
use ed25519_dalek::{Signature, Signer as DalekSigner, SigningKey, Verifier, VerifyingKey};
use fidei_core::{Asset, AssetType, ComplianceStatus, Trust};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const CREDENTIAL_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
pub const PROOF_TYPE: &str = "Ed25519Signature2020";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSubject {
    pub trust_id: String,
    pub trust_name: String,
    pub asset_id: String,
    pub asset_type: AssetType,
    pub value_mxn: Decimal,
    pub compliance_status: ComplianceStatus,
    pub compliant: bool,
    pub registered_at: DateTime<Utc>,
    pub registered_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialProof {
    #[serde(rename = "type")]
    pub proof_type: String,
    pub created: DateTime<Utc>,
    pub proof_purpose: String,
    pub verification_method: String,
    /// Public key (hex-encoded)
    pub public_key: String,
    /// Signature bytes (hex-encoded)
    pub signature: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    pub id: String,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    pub issuer: String,
    pub issuance_date: DateTime<Utc>,
    pub credential_subject: CredentialSubject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<CredentialProof>,
}

impl VerifiableCredential {
    /// Unsigned credential for an asset
    pub fn for_asset(asset: &Asset, trust: &Trust, issuer: &str, issued_at: DateTime<Utc>) -> Self {
        Self {
            context: vec![CREDENTIAL_CONTEXT.to_string()],
            id: format!("did:fidei:asset:{}", asset.id),
            types: vec![
                "VerifiableCredential".to_string(),
                "TrustAssetRegistration".to_string(),
            ],
            issuer: issuer.to_string(),
            issuance_date: issued_at,
            credential_subject: CredentialSubject {
                trust_id: trust.id.clone(),
                trust_name: trust.name.clone(),
                asset_id: asset.id.clone(),
                asset_type: asset.asset_type,
                value_mxn: asset.value_mxn.value(),
                compliance_status: asset.compliance_status,
                compliant: asset.compliant,
                registered_at: asset.registered_at,
                registered_by: asset.registered_by.clone(),
            },
            proof: None,
        }
    }

    /// Canonical bytes of the credential without its proof
    pub fn signable_bytes(&self) -> DispatchResult<Vec<u8>> {
        let unsigned = Self {
            proof: None,
            ..self.clone()
        };
        Ok(serde_json::to_vec(&unsigned)?)
    }

    /// SHA-256 hex of the unsigned credential
    pub fn hash(&self) -> DispatchResult<String> {
        let bytes = self.signable_bytes()?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }

    /// Check the attached proof against the credential body
    pub fn verify(&self) -> DispatchResult<()> {
        let proof = self
            .proof
            .as_ref()
            .ok_or_else(|| DispatchError::VerificationFailed("credential has no proof".into()))?;

        let pk_bytes = hex::decode(&proof.public_key)
            .map_err(|e| DispatchError::VerificationFailed(format!("Invalid public key hex: {}", e)))?;
        let sig_bytes = hex::decode(&proof.signature)
            .map_err(|e| DispatchError::VerificationFailed(format!("Invalid signature hex: {}", e)))?;

        let pk_array: [u8; 32] = pk_bytes
            .try_into()
            .map_err(|_| DispatchError::VerificationFailed("Public key must be 32 bytes".into()))?;
        let sig_array: [u8; 64] = sig_bytes
            .try_into()
            .map_err(|_| DispatchError::VerificationFailed("Signature must be 64 bytes".into()))?;

        let verifying_key = VerifyingKey::from_bytes(&pk_array)
            .map_err(|e| DispatchError::VerificationFailed(format!("Invalid public key: {}", e)))?;
        let signature = Signature::from_bytes(&sig_array);

        verifying_key
            .verify(&self.signable_bytes()?, &signature)
            .map_err(|e| DispatchError::VerificationFailed(e.to_string()))
    }
}

/// Issues signed credentials
pub trait CredentialIssuer: Send + Sync {
    fn issuer_did(&self) -> &str;

    fn issue(&self, asset: &Asset, trust: &Trust) -> DispatchResult<VerifiableCredential>;
}

/// Issuer holding an Ed25519 key
pub struct Ed25519Issuer {
    did: String,
    signing_key: SigningKey,
}

impl Ed25519Issuer {
    /// Create from a 32-byte seed (hex-encoded)
    pub fn from_hex(did: impl Into<String>, hex_seed: &str) -> DispatchResult<Self> {
        let bytes = hex::decode(hex_seed.trim())
            .map_err(|e| DispatchError::InvalidKey(format!("Invalid key hex: {}", e)))?;
        let seed: [u8; 32] = bytes
            .try_into()
            .map_err(|_| DispatchError::InvalidKey("Key must be 32 bytes".into()))?;

        Ok(Self {
            did: did.into(),
            signing_key: SigningKey::from_bytes(&seed),
        })
    }

    /// Generate a new random signing key
    pub fn generate(did: impl Into<String>) -> Self {
        let mut rng = rand::thread_rng();
        Self {
            did: did.into(),
            signing_key: SigningKey::generate(&mut rng),
        }
    }

    /// Export the seed as hex
    pub fn seed_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign an unsigned credential in place
    pub fn sign(&self, credential: &mut VerifiableCredential) -> DispatchResult<()> {
        let bytes = credential.signable_bytes()?;
        let signature = self.signing_key.sign(&bytes);

        credential.proof = Some(CredentialProof {
            proof_type: PROOF_TYPE.to_string(),
            created: Utc::now(),
            proof_purpose: "assertionMethod".to_string(),
            verification_method: format!("{}#key-1", self.did),
            public_key: self.public_key_hex(),
            signature: hex::encode(signature.to_bytes()),
        });
        Ok(())
    }
}

impl CredentialIssuer for Ed25519Issuer {
    fn issuer_did(&self) -> &str {
        &self.did
    }

    fn issue(&self, asset: &Asset, trust: &Trust) -> DispatchResult<VerifiableCredential> {
        let mut credential = VerifiableCredential::for_asset(asset, trust, &self.did, Utc::now());
        self.sign(&mut credential)?;
        Ok(credential)
    }
}
