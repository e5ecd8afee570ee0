//! Configuration for the enabled donation methods.

use serde::{Deserialize, Serialize};

/// Fixed sandbox test ids substituted for real product ids in debug mode.
///
/// Querying or purchasing these ids exercises the billing service's test
/// responses instead of charging real money.
pub const SANDBOX_CATALOG: [&str; 5] = [
    "android.test.purchased",
    "android.test.canceled",
    "android.test.refunded",
    "android.test.item_unavailable",
    "android.test.this_does_not_exist",
];

/// One purchasable entry in the configured catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Product id as registered with the billing service.
    pub product_id: String,
    /// Display label for the donation amount picker.
    pub label: String,
}

impl CatalogEntry {
    /// Create a catalog entry.
    pub fn new(product_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            product_id: product_id.into(),
            label: label.into(),
        }
    }
}

/// Parameters for in-app purchase donations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleConfig {
    /// Public key the host uses to verify purchase signatures.
    pub public_key: String,
    /// Product ids offered for donation, with display labels.
    pub catalog: Vec<CatalogEntry>,
}

/// Parameters for web-redirect donations via PayPal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaypalConfig {
    /// Receiving PayPal account email.
    pub user: String,
    /// ISO currency code, e.g. "EUR".
    pub currency_code: String,
    /// Item name shown on the hosted donation page.
    pub item_name: String,
}

impl PaypalConfig {
    /// Hosted donation URL for this configuration.
    pub fn donation_uri(&self) -> String {
        format!(
            "https://www.paypal.com/cgi-bin/webscr?cmd=_donations&business={}&lc=US&item_name={}&no_note=1&no_shipping=1&currency_code={}",
            urlencoding::encode(&self.user),
            urlencoding::encode(&self.item_name),
            urlencoding::encode(&self.currency_code),
        )
    }
}

/// Parameters for Flattr donations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlattrConfig {
    /// The project URL registered on Flattr.
    pub project_url: String,
    /// The Flattr page URL, configured without a scheme.
    pub url: String,
}

impl FlattrConfig {
    /// The Flattr page URL with its scheme.
    pub fn badge_uri(&self) -> String {
        format!("https://{}", self.url)
    }
}

/// Parameters for bitcoin donations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitcoinConfig {
    /// Receiving address.
    pub address: String,
}

impl BitcoinConfig {
    /// Payment URI for wallet apps.
    pub fn donation_uri(&self) -> String {
        format!("bitcoin:{}", self.address)
    }
}

/// A donation method the host can offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DonationMethod {
    /// In-app purchases through the billing service.
    GoogleIap,
    /// Web redirect to PayPal.
    Paypal,
    /// Flattr page.
    Flattr,
    /// Bitcoin address display.
    Bitcoin,
}

/// Which donation methods are enabled, with their parameters.
///
/// A method is enabled by setting its configuration; `None` disables it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DonationsConfig {
    /// Redirect all product ids to the sandbox test catalog.
    pub debug: bool,
    /// In-app purchase donations.
    pub google: Option<GoogleConfig>,
    /// PayPal donations.
    pub paypal: Option<PaypalConfig>,
    /// Flattr donations.
    pub flattr: Option<FlattrConfig>,
    /// Bitcoin donations.
    pub bitcoin: Option<BitcoinConfig>,
}

impl DonationsConfig {
    /// Methods enabled by this configuration, in display order.
    pub fn enabled_methods(&self) -> Vec<DonationMethod> {
        let mut methods = Vec::new();
        if self.flattr.is_some() {
            methods.push(DonationMethod::Flattr);
        }
        if self.google.is_some() {
            methods.push(DonationMethod::GoogleIap);
        }
        if self.paypal.is_some() {
            methods.push(DonationMethod::Paypal);
        }
        if self.bitcoin.is_some() {
            methods.push(DonationMethod::Bitcoin);
        }
        methods
    }

    /// Translate a requested product id for the active mode.
    ///
    /// In debug mode the requested id selects a sandbox test id by its
    /// position in the configured catalog, falling back to the first
    /// sandbox entry when the id is unknown.
    pub(crate) fn effective_product_id(&self, requested: &str) -> String {
        if !self.debug {
            return requested.to_string();
        }
        let index = self
            .google
            .as_ref()
            .and_then(|google| {
                google
                    .catalog
                    .iter()
                    .position(|entry| entry.product_id == requested)
            })
            .unwrap_or(0)
            .min(SANDBOX_CATALOG.len() - 1);
        SANDBOX_CATALOG[index].to_string()
    }
}
