use async_trait::async_trait;
use pos_client::{ClientError, PosBackend};
use pos_core::{AppConfig, Product, PurchaseRequest, PurchaseResponse};
use pos_scanner::{
    CameraBackend, CameraError, DecodeAttempt, DecoderAttachment, DeviceHints, FrameDecoder,
    FrameSink, MediaConstraints, MediaStream, ScanCoordinator, ScanErrorKind, ScanOutcome,
    ScanStatus,
};
use pos_terminal::{messages, PosTerminal};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone, Copy, Default)]
enum Checkout {
    #[default]
    Accept,
    Reject,
    Unreachable,
}

#[derive(Default)]
struct FakeBackend {
    products: HashMap<String, Product>,
    lookup_down: bool,
    checkout: Checkout,
    lookups: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<PurchaseRequest>>>,
}

impl FakeBackend {
    fn with_catalogue() -> Self {
        let products = [product(1, "4901681143115", 150), product(2, "49016811", 800)]
            .into_iter()
            .map(|p| (p.product_code.clone(), p))
            .collect();
        Self {
            products,
            ..Self::default()
        }
    }
}

#[async_trait]
impl PosBackend for FakeBackend {
    async fn lookup_product(&self, code: &str) -> pos_client::Result<Option<Product>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.lookup_down {
            return Err(ClientError::ApiError {
                status: 503,
                message: "maintenance".to_string(),
            });
        }
        Ok(self.products.get(code).cloned())
    }

    async fn submit_purchase(
        &self,
        request: &PurchaseRequest,
    ) -> pos_client::Result<PurchaseResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let total: i64 = request.items.iter().map(|line| line.product_price).sum();
        match self.checkout {
            Checkout::Accept => Ok(PurchaseResponse {
                success: true,
                total_amount: total,
                total_amount_ex_tax: Some(1000),
                tax_amount: None,
                transaction_id: Some(77),
                message: None,
            }),
            Checkout::Reject => Ok(PurchaseResponse {
                success: false,
                total_amount: 0,
                total_amount_ex_tax: None,
                tax_amount: None,
                transaction_id: None,
                message: Some("register closed".to_string()),
            }),
            Checkout::Unreachable => Err(ClientError::InvalidRequest("offline".to_string())),
        }
    }
}

fn product(id: i64, code: &str, price: i64) -> Product {
    Product {
        product_id: id,
        product_code: code.to_string(),
        product_name: format!("Item {id}"),
        product_price: price,
        color: String::new(),
        item_code: String::new(),
        full_name: format!("Catalogue item {id}"),
    }
}

fn terminal(backend: FakeBackend) -> PosTerminal<FakeBackend> {
    PosTerminal::new(backend, &AppConfig::default())
}

#[tokio::test]
async fn test_search_requires_input() {
    let backend = FakeBackend::with_catalogue();
    let lookups = Arc::clone(&backend.lookups);
    let mut terminal = terminal(backend);

    terminal.set_product_code("   ");
    terminal.search_product().await;

    assert_eq!(terminal.error_message(), Some(messages::ENTER_PRODUCT_CODE));
    assert_eq!(lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_search_found_and_not_found() {
    let mut terminal = terminal(FakeBackend::with_catalogue());

    terminal.set_product_code("4901681143115");
    terminal.search_product().await;
    assert_eq!(terminal.current_product().map(|p| p.product_id), Some(1));
    assert_eq!(terminal.error_message(), None);
    assert!(!terminal.is_loading());

    terminal.set_product_code("12345678");
    terminal.search_product().await;
    assert!(terminal.current_product().is_none());
    assert_eq!(
        terminal.error_message(),
        Some(messages::PRODUCT_NOT_REGISTERED)
    );
}

#[tokio::test]
async fn test_search_transport_failure_clears_product() {
    let mut working = terminal(FakeBackend::with_catalogue());
    working.set_product_code("49016811");
    working.search_product().await;
    assert!(working.current_product().is_some());

    let mut terminal = terminal(FakeBackend {
        lookup_down: true,
        ..FakeBackend::with_catalogue()
    });
    terminal.set_product_code("49016811");
    terminal.search_product().await;
    assert!(terminal.current_product().is_none());
    assert_eq!(terminal.error_message(), Some(messages::SEARCH_FAILED));
}

#[tokio::test]
async fn test_add_merges_and_resets_input() {
    let mut terminal = terminal(FakeBackend::with_catalogue());

    terminal.add_to_purchase_list();
    assert_eq!(terminal.error_message(), Some(messages::NO_PRODUCT_SELECTED));

    for code in ["4901681143115", "49016811", "4901681143115"] {
        terminal.set_product_code(code);
        terminal.search_product().await;
        terminal.add_to_purchase_list();
    }

    assert_eq!(terminal.success_message(), Some(messages::PRODUCT_ADDED));
    assert_eq!(terminal.product_code(), "");
    assert!(terminal.current_product().is_none());
    assert_eq!(terminal.purchase_list().len(), 2);
    assert_eq!(terminal.purchase_list().items()[0].quantity, 2);
    assert_eq!(terminal.total_amount(), 1100);

    terminal.remove_from_purchase_list(9);
    assert_eq!(terminal.purchase_list().len(), 2);
    terminal.remove_from_purchase_list(1);
    assert_eq!(terminal.total_amount(), 300);
}

#[tokio::test]
async fn test_checkout_success() {
    let backend = FakeBackend::with_catalogue();
    let requests = Arc::clone(&backend.requests);
    let mut terminal = terminal(backend);

    terminal.process_purchase().await;
    assert_eq!(terminal.error_message(), Some(messages::NO_ITEMS));
    assert!(requests.lock().unwrap().is_empty());

    for code in ["4901681143115", "4901681143115", "49016811"] {
        terminal.set_product_code(code);
        terminal.search_product().await;
        terminal.add_to_purchase_list();
    }
    terminal.process_purchase().await;

    assert_eq!(
        terminal.success_message(),
        Some("Purchase completed. Total: ¥1,100")
    );
    assert_eq!(terminal.error_message(), None);
    assert!(terminal.purchase_list().is_empty());

    let summary = *terminal.tax_summary().expect("tax summary");
    assert_eq!(summary.total_amount, 1100);
    assert_eq!(summary.tax_amount, 100);
    assert_eq!(summary.transaction_id, Some(77));
    terminal.close_tax_summary();
    assert!(terminal.tax_summary().is_none());

    let sent = requests.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].items.len(), 3);
    assert_eq!(sent[0].items[0].product_name, "Catalogue item 1");
    assert_eq!(sent[0].register_staff_code.as_deref(), Some("9999999999"));
    assert_eq!(sent[0].pos_id.as_deref(), Some("90"));
}

#[tokio::test]
async fn test_checkout_rejected_and_unreachable() {
    for (checkout, expected) in [
        (Checkout::Reject, messages::PURCHASE_FAILED),
        (Checkout::Unreachable, messages::PURCHASE_ERROR),
    ] {
        let mut terminal = terminal(FakeBackend {
            checkout,
            ..FakeBackend::with_catalogue()
        });
        terminal.set_product_code("49016811");
        terminal.search_product().await;
        terminal.add_to_purchase_list();
        terminal.process_purchase().await;

        assert_eq!(terminal.error_message(), Some(expected));
        assert_eq!(terminal.success_message(), None);
        assert_eq!(terminal.purchase_list().len(), 1);
        assert!(terminal.tax_summary().is_none());
    }
}

#[tokio::test]
async fn test_manual_code_entry() {
    let backend = FakeBackend::with_catalogue();
    let lookups = Arc::clone(&backend.lookups);
    let mut terminal = terminal(backend);

    terminal.submit_manual_code("12345").await;
    assert_eq!(terminal.error_message(), Some(messages::INVALID_JAN));
    assert_eq!(lookups.load(Ordering::SeqCst), 0);

    terminal.submit_manual_code(" 4901-6811 ").await;
    assert_eq!(terminal.product_code(), "49016811");
    assert_eq!(terminal.current_product().map(|p| p.product_id), Some(2));
    assert_eq!(terminal.error_message(), None);
}

#[tokio::test]
async fn test_view_reflects_state() {
    let mut terminal = terminal(FakeBackend::with_catalogue());
    terminal.set_product_code("49016811");
    terminal.search_product().await;
    terminal.add_to_purchase_list();

    let view = terminal.view();
    assert_eq!(view.total_amount, 800);
    assert_eq!(view.purchase_list.len(), 1);
    assert_eq!(view.success_message.as_deref(), Some(messages::PRODUCT_ADDED));
    assert!(!view.loading);
}

struct StillStream;

impl MediaStream for StillStream {
    fn id(&self) -> &str {
        "still"
    }

    fn stop_tracks(&mut self) {}
}

struct Camera {
    error: Option<CameraError>,
    hang: bool,
}

#[async_trait]
impl CameraBackend for Camera {
    async fn open(
        &self,
        _constraints: &MediaConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraError> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(Box::new(StillStream)),
        }
    }
}

struct Attachment;

impl DecoderAttachment for Attachment {
    fn detach(&mut self) {}
}

/// Reads `payload` from the very first frame.
struct Decoder {
    payload: Option<String>,
}

impl FrameDecoder for Decoder {
    fn attach(
        &self,
        _stream: &dyn MediaStream,
        sink: FrameSink,
    ) -> Result<Box<dyn DecoderAttachment>, CameraError> {
        if let Some(payload) = &self.payload {
            sink.deliver(DecodeAttempt::Decoded(payload.clone()));
        }
        Ok(Box::new(Attachment))
    }
}

fn coordinator(camera: Camera, payload: Option<&str>) -> ScanCoordinator {
    ScanCoordinator::new(
        Arc::new(camera),
        Arc::new(Decoder {
            payload: payload.map(str::to_string),
        }),
    )
}

fn desktop_hints() -> DeviceHints {
    DeviceHints {
        viewport_width: 1280,
        user_agent: "Mozilla/5.0 (X11; Linux x86_64)".to_string(),
    }
}

#[tokio::test]
async fn test_scan_success_searches_product() {
    let coordinator = coordinator(
        Camera {
            error: None,
            hang: false,
        },
        Some("490168114311"),
    );
    let backend = FakeBackend {
        products: [(
            "0490168114311".to_string(),
            product(3, "0490168114311", 420),
        )]
        .into_iter()
        .collect(),
        ..FakeBackend::default()
    };
    let mut terminal = terminal(backend);
    let config = terminal.scan_config(&desktop_hints());

    let outcome = terminal.scan(&coordinator, config).await;
    assert_eq!(outcome.status(), ScanStatus::Completed);
    assert_eq!(terminal.product_code(), "0490168114311");
    assert_eq!(terminal.current_product().map(|p| p.product_id), Some(3));
}

#[tokio::test]
async fn test_scan_error_shows_friendly_message() {
    let coordinator = coordinator(
        Camera {
            error: Some(CameraError::new("NotAllowedError", "Permission denied by user")),
            hang: false,
        },
        None,
    );
    let mut terminal = terminal(FakeBackend::with_catalogue());
    let config = terminal.scan_config(&desktop_hints());

    terminal.scan(&coordinator, config).await;
    assert_eq!(
        terminal.error_message(),
        Some(ScanErrorKind::PermissionDenied.message())
    );
    assert!(terminal.current_product().is_none());
}

#[tokio::test]
async fn test_scan_cancelled() {
    let coordinator = coordinator(
        Camera {
            error: None,
            hang: true,
        },
        None,
    );
    let mut terminal = terminal(FakeBackend::with_catalogue());
    let config = terminal.scan_config(&desktop_hints());

    let (outcome, cancelled) = tokio::join!(terminal.scan(&coordinator, config), async {
        while coordinator.status() != ScanStatus::Requesting {
            tokio::task::yield_now().await;
        }
        coordinator.cancel_scan().await
    });

    assert!(cancelled);
    assert_eq!(outcome, ScanOutcome::Cancelled);
    assert_eq!(terminal.error_message(), Some(messages::SCAN_CANCELLED));
}

#[test]
fn test_scan_config_follows_device() {
    let terminal = terminal(FakeBackend::default());
    assert_eq!(
        terminal.scan_config(&desktop_hints()).timeout,
        Duration::from_secs(15)
    );

    let phone = DeviceHints {
        viewport_width: 390,
        user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)".to_string(),
    };
    assert_eq!(terminal.scan_config(&phone).timeout, Duration::from_secs(10));
}
