/// Default base URL of the Open Platform public API. Always ends with a
/// trailing slash so endpoint paths can be appended directly.
pub const DEFAULT_API_URL: &str = "https://api.openfuture.io/public/api/v1/";

/// Endpoint that creates a payment wallet for an order.
pub const WALLET_PROCESS_ENDPOINT: &str = "wallet/process";

/// Endpoint listing the wallets owned by the configured API key.
pub const WALLET_DETAILS_ENDPOINT: &str = "wallet/details";

/// Endpoint reporting transactions seen for a payment address. The address
/// is appended to this path.
pub const ADDRESS_TRANSACTIONS_ENDPOINT: &str = "widget/transactions/address/";

/// Path under the widget host where the hosted payment page lives. The order
/// key is appended to this path.
pub const WIDGET_PAYMENT_PATH: &str = "widget/payment/order/";

/// Marker segment separating the widget host from the API path in the
/// configured API URL.
pub const PUBLIC_PATH_MARKER: &str = "public";

/// Request header carrying the merchant API key.
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// Request header carrying the HMAC-SHA256 signature of the request body.
pub const API_SIGNATURE_HEADER: &str = "X-API-SIGNATURE";

/// Request header carrying the unix timestamp the request was signed at.
pub const API_TIMESTAMP_HEADER: &str = "X-API-TIMESTAMP";

/// Webhook header carrying the HMAC-SHA256 signature of the delivery body.
pub const WEBHOOK_SIGNATURE_HEADER: &str = "X-Open-Webhook-Signature";

/// Webhook header carrying the unix timestamp of the delivery.
pub const WEBHOOK_TIMESTAMP_HEADER: &str = "X-Open-Webhook-Timestamp";

/// `source` value stamped on wallet-creation metadata.
pub const REQUEST_SOURCE: &str = "woocommerce";

/// Order meta key holding the payment addresses returned at wallet creation,
/// serialized as JSON.
pub const META_ADDRESS: &str = "_op_address";

/// Order meta key holding the blockchains the payment was offered in,
/// serialized as JSON.
pub const META_CURRENCY: &str = "_op_currency";

/// Order meta key holding the last platform status applied to the order.
pub const META_EXTERNAL_STATUS: &str = "_open_status";

/// Platform status meaning a payment was detected and processed.
pub const STATUS_PROCESSING: &str = "PROCESSING";

/// Platform status meaning the payment is confirmed and settled.
pub const STATUS_COMPLETED: &str = "COMPLETED";

/// Delay inserted between consecutive API lookups during an order sweep,
/// in milliseconds.
pub const SWEEP_REQUEST_DELAY_MS: u64 = 300;
