//! Wire types for the Open Platform wallet API.

use serde::{Deserialize, Serialize};

/// Metadata sent when creating a payment wallet for an order.
///
/// Field order matters here: the platform checks the request signature
/// against the exact bytes it receives, and this struct serializes in
/// declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletRequest {
    /// Order total as a decimal string.
    pub amount: String,
    pub order_key: String,
    /// Blockchains the buyer may pay on.
    pub payment_currency: Vec<String>,
    /// Currency the order is priced in.
    pub product_currency: String,
    /// Host platform identifier stamped on the wallet.
    pub source: String,
    pub test: bool,
    pub client_managed: bool,
}

/// One payment address attached to a wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletAddress {
    pub blockchain: String,
    pub address: String,
    /// Exchange rate captured at wallet creation, as a decimal string.
    pub rate: String,
    /// Private key material for client-managed wallets, encrypted with the
    /// merchant's password. Absent for platform-managed wallets.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted: Option<String>,
}

/// Response to a wallet-creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedWallet {
    pub blockchains: Vec<WalletAddress>,
}

impl CreatedWallet {
    /// The address polled during order sweeps. Wallet creation returns one
    /// address per accepted blockchain; the first is treated as primary.
    pub fn primary_address(&self) -> Option<&WalletAddress> {
        self.blockchains.first()
    }
}

/// A wallet owned by the configured API key, as listed by `wallet/details`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicWallet {
    pub order_key: String,
    pub amount: String,
    /// Sum paid so far. The platform omits this for untouched wallets.
    #[serde(default)]
    pub total_paid: String,
    pub currency: String,
    #[serde(default)]
    pub blockchains: Vec<WalletAddress>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_request_serializes_in_declaration_order() {
        let request = WalletRequest {
            amount: "10.00".to_string(),
            order_key: "wc_order_abc123".to_string(),
            payment_currency: vec!["BTC".to_string()],
            product_currency: "USD".to_string(),
            source: "woocommerce".to_string(),
            test: true,
            client_managed: false,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(
            json,
            "{\"amount\":\"10.00\",\"orderKey\":\"wc_order_abc123\",\
             \"paymentCurrency\":[\"BTC\"],\"productCurrency\":\"USD\",\
             \"source\":\"woocommerce\",\"test\":true,\"clientManaged\":false}"
        );
    }

    #[test]
    fn created_wallet_parses_platform_response() {
        let body = r#"{"blockchains":[{"blockchain":"BTC","address":"1A2bTestAddress","rate":"45000"}]}"#;
        let wallet: CreatedWallet = serde_json::from_str(body).unwrap();
        let primary = wallet.primary_address().unwrap();
        assert_eq!(primary.blockchain, "BTC");
        assert_eq!(primary.address, "1A2bTestAddress");
        assert_eq!(primary.rate, "45000");
        assert!(primary.encrypted.is_none());
    }

    #[test]
    fn encrypted_key_survives_round_trip() {
        let address = WalletAddress {
            blockchain: "ETH".to_string(),
            address: "0xabc".to_string(),
            rate: "2000".to_string(),
            encrypted: Some("deadbeef".to_string()),
        };
        let json = serde_json::to_string(&address).unwrap();
        assert!(json.contains("\"encrypted\":\"deadbeef\""));
        let back: WalletAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);
    }

    #[test]
    fn public_wallet_tolerates_missing_paid_fields() {
        let body = r#"{"orderKey":"k1","amount":"5.00","currency":"EUR"}"#;
        let wallet: PublicWallet = serde_json::from_str(body).unwrap();
        assert_eq!(wallet.total_paid, "");
        assert!(wallet.blockchains.is_empty());
    }
}
