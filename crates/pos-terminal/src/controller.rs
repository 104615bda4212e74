//! Register page state and the operations a UI invokes on it.

use pos_client::{PosApiClient, PosBackend, PurchaseList, TaxSummary, format_yen};
use pos_core::{AppConfig, Product, ProductCode, ScannerConfig, TerminalConfig};
use pos_scanner::{DeviceHints, DeviceProfile, ScanConfig, ScanCoordinator, ScanOutcome};
use serde::Serialize;

/// User-facing messages.
pub mod messages {
    /// Search requested with nothing typed
    pub const ENTER_PRODUCT_CODE: &str = "Enter a product code";
    /// Lookup found nothing
    pub const PRODUCT_NOT_REGISTERED: &str = "Product is not registered";
    /// Lookup failed in transport
    pub const SEARCH_FAILED: &str = "An error occurred while searching for the product";
    /// Add requested without a current product
    pub const NO_PRODUCT_SELECTED: &str = "No product selected";
    /// Product added to the list
    pub const PRODUCT_ADDED: &str = "Added product to purchase list";
    /// Checkout requested on an empty list
    pub const NO_ITEMS: &str = "No items to purchase";
    /// Server refused the purchase
    pub const PURCHASE_FAILED: &str = "Purchase failed";
    /// Purchase failed in transport
    pub const PURCHASE_ERROR: &str = "An error occurred while processing the purchase";
    /// Manual entry was not a JAN code
    pub const INVALID_JAN: &str = "Enter a valid JAN code (8 or 13 digits)";
    /// Scan stopped before reading a code
    pub const SCAN_CANCELLED: &str = "Scan cancelled";
}

/// Renderable copy of the terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerminalView {
    /// Product code input field
    pub product_code: String,
    /// Product found by the last search
    pub current_product: Option<Product>,
    /// Purchase list rows
    pub purchase_list: PurchaseList,
    /// Sum of the purchase list
    pub total_amount: i64,
    /// Error banner
    pub error_message: Option<String>,
    /// Success banner
    pub success_message: Option<String>,
    /// Whether a request is in flight
    pub loading: bool,
    /// Breakdown of the last completed purchase
    pub tax_summary: Option<TaxSummary>,
}

/// Headless register controller.
pub struct PosTerminal<B: PosBackend> {
    backend: B,
    terminal: TerminalConfig,
    scanner: ScannerConfig,
    product_code: String,
    current_product: Option<Product>,
    purchase_list: PurchaseList,
    error_message: Option<String>,
    success_message: Option<String>,
    loading: bool,
    tax_summary: Option<TaxSummary>,
}

impl PosTerminal<PosApiClient> {
    /// Terminal talking to the API configured in `config`.
    pub fn from_config(config: &AppConfig) -> pos_client::Result<Self> {
        let client = PosApiClient::new(&config.api)?;
        tracing::info!(
            "Register {} using API at {}",
            config.terminal.pos_id,
            client.base_url()
        );
        Ok(Self::new(client, config))
    }
}

impl<B: PosBackend> PosTerminal<B> {
    /// Terminal over an arbitrary backend.
    pub fn new(backend: B, config: &AppConfig) -> Self {
        Self {
            backend,
            terminal: config.terminal.clone(),
            scanner: config.scanner.clone(),
            product_code: String::new(),
            current_product: None,
            purchase_list: PurchaseList::new(),
            error_message: None,
            success_message: None,
            loading: false,
            tax_summary: None,
        }
    }

    /// Current product code input.
    #[must_use]
    pub fn product_code(&self) -> &str {
        &self.product_code
    }

    /// Product found by the last search.
    #[must_use]
    pub fn current_product(&self) -> Option<&Product> {
        self.current_product.as_ref()
    }

    /// The purchase list.
    #[must_use]
    pub fn purchase_list(&self) -> &PurchaseList {
        &self.purchase_list
    }

    /// Error banner text.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Success banner text.
    #[must_use]
    pub fn success_message(&self) -> Option<&str> {
        self.success_message.as_deref()
    }

    /// Whether a lookup or purchase is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Breakdown of the last completed purchase.
    #[must_use]
    pub fn tax_summary(&self) -> Option<&TaxSummary> {
        self.tax_summary.as_ref()
    }

    /// Snapshot of everything a UI renders.
    #[must_use]
    pub fn view(&self) -> TerminalView {
        TerminalView {
            product_code: self.product_code.clone(),
            current_product: self.current_product.clone(),
            purchase_list: self.purchase_list.clone(),
            total_amount: self.total_amount(),
            error_message: self.error_message.clone(),
            success_message: self.success_message.clone(),
            loading: self.loading,
            tax_summary: self.tax_summary,
        }
    }

    /// Replace the product code input.
    pub fn set_product_code(&mut self, input: impl Into<String>) {
        self.product_code = input.into();
    }

    /// Look up the product code currently in the input.
    pub async fn search_product(&mut self) {
        let code = self.product_code.trim().to_string();
        if code.is_empty() {
            self.fail(messages::ENTER_PRODUCT_CODE);
            return;
        }

        self.clear_messages();
        self.loading = true;
        let result = self.backend.lookup_product(&code).await;
        self.loading = false;

        match result {
            Ok(Some(product)) => {
                tracing::debug!(
                    "Found product {} ({})",
                    product.product_code,
                    product.product_name
                );
                self.current_product = Some(product);
            }
            Ok(None) => {
                self.current_product = None;
                self.fail(messages::PRODUCT_NOT_REGISTERED);
            }
            Err(e) => {
                tracing::warn!("Product lookup for {} failed: {}", code, e);
                self.current_product = None;
                self.fail(messages::SEARCH_FAILED);
            }
        }
    }

    /// Move the current product into the purchase list.
    pub fn add_to_purchase_list(&mut self) {
        let Some(product) = self.current_product.take() else {
            self.fail(messages::NO_PRODUCT_SELECTED);
            return;
        };

        let quantity = self.purchase_list.add(product);
        tracing::debug!(
            "Purchase list now has {} row(s); quantity {}",
            self.purchase_list.len(),
            quantity
        );
        self.product_code.clear();
        self.error_message = None;
        self.success_message = Some(messages::PRODUCT_ADDED.to_string());
    }

    /// Remove a purchase list row. Out-of-range indices are ignored.
    pub fn remove_from_purchase_list(&mut self, index: usize) {
        if self.purchase_list.remove(index).is_none() {
            tracing::debug!("Ignoring removal of missing row {}", index);
        }
    }

    /// Sum of price × quantity over the purchase list.
    #[must_use]
    pub fn total_amount(&self) -> i64 {
        self.purchase_list.total()
    }

    /// Submit the purchase list as one transaction.
    pub async fn process_purchase(&mut self) {
        if self.purchase_list.is_empty() {
            self.fail(messages::NO_ITEMS);
            return;
        }

        self.clear_messages();
        self.loading = true;
        let request = self.purchase_list.build_request(&self.terminal);
        let result = self.backend.submit_purchase(&request).await;
        self.loading = false;

        match result {
            Ok(response) if response.success => {
                self.success_message = Some(format!(
                    "Purchase completed. Total: {}",
                    format_yen(response.total_amount)
                ));
                self.tax_summary = TaxSummary::from_response(&response);
                self.purchase_list.clear();
            }
            Ok(response) => {
                tracing::warn!(
                    "Purchase rejected: {}",
                    response.message.as_deref().unwrap_or("no reason given")
                );
                self.fail(messages::PURCHASE_FAILED);
            }
            Err(e) => {
                tracing::warn!("Purchase submission failed: {}", e);
                self.fail(messages::PURCHASE_ERROR);
            }
        }
    }

    /// Dismiss the tax breakdown of the last purchase.
    pub fn close_tax_summary(&mut self) {
        self.tax_summary = None;
    }

    /// Accept a hand-typed JAN code and search for it.
    ///
    /// Non-digits are dropped; anything but 8 or 13 digits is rejected.
    pub async fn submit_manual_code(&mut self, input: &str) {
        match ProductCode::from_manual_input(input) {
            Ok(code) => {
                self.product_code = code.into();
                self.search_product().await;
            }
            Err(e) => {
                tracing::debug!("Rejected manual code {:?}: {}", input, e);
                self.fail(messages::INVALID_JAN);
            }
        }
    }

    /// Scan settings for a device, taken from the scanner configuration.
    #[must_use]
    pub fn scan_config(&self, hints: &DeviceHints) -> ScanConfig {
        ScanConfig::from_scanner_config(&self.scanner, DeviceProfile::detect(hints))
    }

    /// Run one scan session and apply its outcome.
    pub async fn scan(
        &mut self,
        coordinator: &ScanCoordinator,
        config: ScanConfig,
    ) -> ScanOutcome {
        self.clear_messages();
        let outcome = coordinator.start_scan(config).await.outcome().await;
        self.apply_scan_outcome(outcome.clone()).await;
        outcome
    }

    /// Feed a scan outcome into the page: a code is searched, anything else
    /// becomes an error message.
    pub async fn apply_scan_outcome(&mut self, outcome: ScanOutcome) {
        match outcome {
            ScanOutcome::Success { code } => {
                self.product_code = code.into();
                self.search_product().await;
            }
            ScanOutcome::Error { message, .. } => self.fail(message),
            ScanOutcome::Cancelled => self.fail(messages::SCAN_CANCELLED),
        }
    }

    fn clear_messages(&mut self) {
        self.error_message = None;
        self.success_message = None;
    }

    fn fail(&mut self, message: impl Into<String>) {
        self.success_message = None;
        self.error_message = Some(message.into());
    }
}
