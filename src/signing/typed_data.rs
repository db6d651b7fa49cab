//! Structured (EIP-712 style) authentication payload.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};

use crate::config::SigningConfig;
use crate::signing::SignatureRequest;

pub const PRIMARY_TYPE: &str = "Authentication";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedDataDomain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypedDataField {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticationMessage {
    pub wallet: String,
    pub nonce: String,
    /// `uint256` on the wire; serialized as a decimal string so no JSON
    /// consumer truncates it to a float.
    #[serde(serialize_with = "serialize_uint256")]
    pub timestamp: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedDataPayload {
    pub domain: TypedDataDomain,
    pub types: BTreeMap<&'static str, Vec<TypedDataField>>,
    pub primary_type: &'static str,
    pub message: AuthenticationMessage,
}

impl TypedDataPayload {
    /// Build the fixed `Authentication` schema for `request`.
    ///
    /// Requests are validated before reaching a strategy, so the timestamp
    /// is positive here; a negative value clamps to zero.
    pub fn for_request(request: &SignatureRequest, config: &SigningConfig) -> Self {
        let mut types = BTreeMap::new();
        types.insert(
            PRIMARY_TYPE,
            vec![
                TypedDataField {
                    name: "wallet",
                    kind: "address",
                },
                TypedDataField {
                    name: "nonce",
                    kind: "string",
                },
                TypedDataField {
                    name: "timestamp",
                    kind: "uint256",
                },
            ],
        );

        Self {
            domain: TypedDataDomain {
                name: config.domain_name.clone(),
                version: config.domain_version.clone(),
                chain_id: request.chain_id.unwrap_or(config.default_chain_id),
            },
            types,
            primary_type: PRIMARY_TYPE,
            message: AuthenticationMessage {
                wallet: request.wallet_address.clone(),
                nonce: request.nonce.clone(),
                timestamp: u128::try_from(request.timestamp).unwrap_or_default(),
            },
        }
    }
}

fn serialize_uint256<S>(value: &u128, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_string())
}
