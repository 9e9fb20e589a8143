// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::parsing::parse_u128_hex;
use crate::domain::security::{SecurityId, deserialize_amount, serialize_amount};
use alloy::primitives::{Address, Bytes, U256};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One fee alternative of a staged step: the gas price and the signed bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedVariant {
    pub fee_level: u128,
    pub raw: Bytes,
}

impl Serialize for SignedVariant {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (format!("0x{:x}", self.fee_level), &self.raw).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SignedVariant {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (fee, raw): (String, Bytes) = Deserialize::deserialize(deserializer)?;
        let fee_level = parse_u128_hex(&fee)
            .ok_or_else(|| D::Error::custom(format!("invalid fee level {fee:?}")))?;
        Ok(Self { fee_level, raw })
    }
}

/// The signed material carried by a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignedPayload {
    /// One signature per fee level, all at the same nonce.
    #[serde(rename = "signedTxes")]
    Variants(Vec<SignedVariant>),
    /// A single pre-signed transaction with its fee baked in.
    #[serde(rename = "signedTx")]
    Single(Bytes),
}

impl SignedPayload {
    pub fn variant_for(&self, fee_level: u128) -> Option<&SignedVariant> {
        match self {
            SignedPayload::Variants(variants) => {
                variants.iter().find(|v| v.fee_level == fee_level)
            }
            SignedPayload::Single(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SignedPayload::Variants(variants) => variants.len(),
            SignedPayload::Single(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Structured parameters of a step, one variant per transaction shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum StepParams {
    DeployCapTables {
        cap_tables_address: Address,
        controller_address: Address,
        nonce: u64,
    },
    InitializeCapTable {
        cap_tables_address: Address,
        #[serde(serialize_with = "serialize_amount", deserialize_with = "deserialize_amount")]
        supply: U256,
        controller_address: Address,
        nonce: u64,
    },
    Distribution {
        #[serde(serialize_with = "serialize_amount", deserialize_with = "deserialize_amount")]
        security_id: SecurityId,
        cap_tables_address: Address,
        controller_address: Address,
        investor: Address,
        #[serde(serialize_with = "serialize_amount", deserialize_with = "deserialize_amount")]
        amount: U256,
        nonce: u64,
    },
    DeployLogic {
        simplified_token_logic_address: Address,
        #[serde(serialize_with = "serialize_amount", deserialize_with = "deserialize_amount")]
        security_id: SecurityId,
        cap_tables_address: Address,
        controller_address: Address,
        resolver_address: Address,
        nonce: u64,
    },
    DeployFront {
        token_front_address: Address,
        simplified_token_logic_address: Address,
        admin: Address,
        controller_address: Address,
        nonce: u64,
    },
    MigrateCapTable {
        #[serde(serialize_with = "serialize_amount", deserialize_with = "deserialize_amount")]
        security_id: SecurityId,
        simplified_token_logic_address: Address,
        controller_address: Address,
        nonce: u64,
    },
    SetFront {
        token_front_address: Address,
        simplified_token_logic_address: Address,
        controller_address: Address,
        nonce: u64,
    },
    ChangeAdmin {
        admin: Address,
        simplified_token_logic_address: Address,
        nonce: u64,
    },
    SetResolver {
        owner_address: Address,
        new_resolver_address: Address,
        simplified_token_logic_address: Address,
        nonce: u64,
    },
}

impl StepParams {
    pub fn nonce(&self) -> u64 {
        match self {
            StepParams::DeployCapTables { nonce, .. }
            | StepParams::InitializeCapTable { nonce, .. }
            | StepParams::Distribution { nonce, .. }
            | StepParams::DeployLogic { nonce, .. }
            | StepParams::DeployFront { nonce, .. }
            | StepParams::MigrateCapTable { nonce, .. }
            | StepParams::SetFront { nonce, .. }
            | StepParams::ChangeAdmin { nonce, .. }
            | StepParams::SetResolver { nonce, .. } => *nonce,
        }
    }

    /// Address a deployment step is expected to create, if any.
    pub fn predicted_contract(&self) -> Option<Address> {
        match self {
            StepParams::DeployCapTables {
                cap_tables_address, ..
            } => Some(*cap_tables_address),
            StepParams::DeployLogic {
                simplified_token_logic_address,
                ..
            } => Some(*simplified_token_logic_address),
            StepParams::DeployFront {
                token_front_address,
                ..
            } => Some(*token_front_address),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub description: String,
    pub params: StepParams,
    #[serde(flatten)]
    pub signed: SignedPayload,
}

impl Step {
    pub fn nonce(&self) -> u64 {
        self.params.nonce()
    }
}

pub type Transcript = Vec<Step>;

/// The persisted result of offline staging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfflineReport {
    pub nonce: u64,
    pub stage1: Vec<(String, Step)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage2: Option<Vec<(String, Transcript)>>,
}

/// Output of `init`: the cap table every later stage points at, and the
/// signed deployment that creates it there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EcosystemInit {
    pub cap_tables: Address,
    pub transcript: Step,
}

/// Anything `publish-entry` accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryTranscript {
    Ecosystem(EcosystemInit),
    Step(Step),
}

impl EntryTranscript {
    pub fn into_step(self) -> Step {
        match self {
            EntryTranscript::Ecosystem(init) => init.transcript,
            EntryTranscript::Step(step) => step,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;
    use serde_json::json;

    fn init_step() -> Step {
        Step {
            description: "initialize the cap table".into(),
            params: StepParams::InitializeCapTable {
                cap_tables_address: address!("0000000000000000000000000000000000000c01"),
                supply: U256::from(10_100_000u64),
                controller_address: address!("0000000000000000000000000000000000000c02"),
                nonce: 0,
            },
            signed: SignedPayload::Variants(vec![
                SignedVariant {
                    fee_level: 5_000_000_000,
                    raw: Bytes::from(vec![0xf8, 0x01]),
                },
                SignedVariant {
                    fee_level: 7_000_000_000,
                    raw: Bytes::from(vec![0xf8, 0x02]),
                },
            ]),
        }
    }

    #[test]
    fn step_serializes_to_published_shape() {
        let value = serde_json::to_value(init_step()).unwrap();
        assert_eq!(value["description"], "initialize the cap table");
        assert_eq!(value["params"]["action"], "initializeCapTable");
        assert_eq!(value["params"]["supply"], "10100000");
        assert_eq!(value["params"]["nonce"], 0);
        assert_eq!(
            value["signedTxes"],
            json!([["0x12a05f200", "0xf801"], ["0x1a13b8600", "0xf802"]])
        );
        assert!(value.get("signedTx").is_none());
    }

    #[test]
    fn report_reads_back_both_payload_shapes() {
        let mut single = init_step();
        single.signed = SignedPayload::Single(Bytes::from(vec![0xaa]));
        let report = OfflineReport {
            nonce: 1,
            stage1: vec![("A".into(), init_step())],
            stage2: Some(vec![("A".into(), vec![single.clone()])]),
        };
        let body = serde_json::to_string(&report).unwrap();
        assert!(body.contains("\"signedTx\":\"0xaa\""));
        let back: OfflineReport = serde_json::from_str(&body).unwrap();
        assert_eq!(back, report);
        assert_eq!(back.stage2.unwrap()[0].1[0].signed.len(), 1);
    }

    #[test]
    fn entry_file_accepts_init_output_or_bare_step() {
        let cap_tables = address!("0000000000000000000000000000000000000ca7");
        let mut deploy = init_step();
        deploy.params = StepParams::DeployCapTables {
            cap_tables_address: cap_tables,
            controller_address: Address::ZERO,
            nonce: 0,
        };
        let init = EcosystemInit {
            cap_tables,
            transcript: deploy.clone(),
        };
        let body = serde_json::to_value(&init).unwrap();
        assert_eq!(body["capTables"], json!(cap_tables));
        assert_eq!(body["transcript"]["params"]["action"], "deployCapTables");

        let entry: EntryTranscript = serde_json::from_value(body).unwrap();
        assert_eq!(entry, EntryTranscript::Ecosystem(init));
        assert_eq!(entry.into_step().params.predicted_contract(), Some(cap_tables));

        let bare: EntryTranscript =
            serde_json::from_value(serde_json::to_value(init_step()).unwrap()).unwrap();
        assert_eq!(bare.into_step(), init_step());
    }

    #[test]
    fn only_deployments_predict_contracts() {
        let step = init_step();
        assert_eq!(step.params.predicted_contract(), None);
        let deploy = StepParams::DeployFront {
            token_front_address: address!("0000000000000000000000000000000000000f00"),
            simplified_token_logic_address: Address::ZERO,
            admin: Address::ZERO,
            controller_address: Address::ZERO,
            nonce: 4,
        };
        assert_eq!(
            deploy.predicted_contract(),
            Some(address!("0000000000000000000000000000000000000f00"))
        );
    }
}
