//! Addon registry for tests
//! A fixed subset of the published addons' actions and their outputs

use txtx_doctor::StaticAddonRegistry;

/// Registry shared by the doctor tests
pub fn test_addons() -> StaticAddonRegistry {
    let mut addons = StaticAddonRegistry::new();
    addons.add_namespace(
        "evm",
        [
            ("send_eth", vec!["tx_hash"]),
            ("deploy_contract", vec!["tx_hash", "abi", "contract_address"]),
            ("call_contract", vec!["tx_hash"]),
            ("sign_transaction", vec!["tx_hash"]),
            ("check_confirmations", vec!["contract_address", "logs"]),
            ("eth_call", vec!["result"]),
        ],
    );
    addons.add_namespace(
        "bitcoin",
        [("sign_transaction", vec!["signed_transaction_bytes"]), ("broadcast_transaction", vec!["tx_id"])],
    );
    addons.add_namespace("std", [("send_http_request", vec!["response_body", "status_code"])]);
    addons
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;
    use txtx_doctor::AddonRegistry;

    #[test_case("evm::send_eth", "tx_hash")]
    #[test_case("evm::deploy_contract", "contract_address")]
    #[test_case("std::send_http_request", "status_code")]
    fn test_known_outputs(action_type: &str, output: &str) {
        let addons = test_addons();
        assert!(addons.outputs_of(action_type).is_some_and(|outputs| outputs.contains(output)));
    }

    #[test]
    fn test_unknown_action() {
        assert!(!test_addons().is_known_action("evm::teleport"));
    }
}
