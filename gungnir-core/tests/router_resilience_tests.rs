//! Router pipeline behavior under failure
//!
//! Driven with scripted transports and the paused tokio clock, so retry
//! schedules and rate-limit waits run instantly and deterministically.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use gungnir_core::{
    BookRegistry, CircuitBreaker, CircuitBreakerConfig, CircuitState, ExchangeResponse,
    ExchangeTransport, Order, OrderRouter, RateLimiter, RateLimiterConfig, RetryPolicy,
    RouterConfig, RoutingError, ShutdownSignal, Side, SlippageEstimator, Symbol, TransportConfig,
    TransportError,
};

/// Scripted transport: counts calls, answers per the configured behavior
struct ScriptedTransport {
    calls: Arc<AtomicU32>,
    behavior: Behavior,
}

enum Behavior {
    Accept,
    AlwaysTimeout,
    AlwaysReject,
    /// Fail `n` times, then accept
    FailThenAccept(u32),
    NeverReturns,
}

impl ScriptedTransport {
    fn new(behavior: Behavior) -> (Self, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        (
            Self {
                calls: Arc::clone(&calls),
                behavior,
            },
            calls,
        )
    }
}

#[async_trait]
impl ExchangeTransport for ScriptedTransport {
    async fn send_order(&self, order: &Order) -> Result<ExchangeResponse, TransportError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        match &self.behavior {
            Behavior::Accept => Ok(accept(order)),
            Behavior::AlwaysTimeout => Err(TransportError::Timeout(Duration::from_secs(5))),
            Behavior::AlwaysReject => Err(TransportError::Rejected {
                reason: "insufficient buying power".into(),
            }),
            Behavior::FailThenAccept(n) => {
                if call <= *n {
                    Err(TransportError::ConnectionReset)
                } else {
                    Ok(accept(order))
                }
            }
            Behavior::NeverReturns => {
                std::future::pending::<()>().await;
                unreachable!()
            }
        }
    }
}

fn accept(order: &Order) -> ExchangeResponse {
    ExchangeResponse {
        exchange_order_id: format!("x-{}", order.id),
        client_order_id: order.id,
        accepted_quantity: order.quantity,
        timestamp: SystemTime::now(),
    }
}

struct RouterBuilder {
    config: RouterConfig,
    breaker_config: CircuitBreakerConfig,
    limiter_config: RateLimiterConfig,
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self {
            config: RouterConfig {
                max_slippage_bps: 25,
                rate_limit_wait: Duration::from_secs(2),
                retry: RetryPolicy {
                    max_attempts: 3,
                    base_delay: Duration::from_millis(10),
                    max_delay: Duration::from_millis(100),
                    multiplier: 2.0,
                    jitter: 0.0,
                },
            },
            // High threshold so retry tests are not short-circuited
            breaker_config: CircuitBreakerConfig {
                failure_threshold: 100,
                cool_down: Duration::from_secs(30),
            },
            limiter_config: RateLimiterConfig::standard(),
        }
    }
}

impl RouterBuilder {
    fn build(
        self,
        transport: ScriptedTransport,
    ) -> (
        OrderRouter<ScriptedTransport>,
        Arc<CircuitBreaker>,
        Arc<BookRegistry>,
        ShutdownSignal,
    ) {
        let books = Arc::new(BookRegistry::new());
        let breaker = Arc::new(CircuitBreaker::new(self.breaker_config));
        let shutdown = ShutdownSignal::new();
        let router = OrderRouter::new(
            transport,
            TransportConfig::new("https://api.exchange.example", "key", "secret"),
            self.config,
            Arc::clone(&books),
            SlippageEstimator::default(),
            RateLimiter::new(self.limiter_config),
            Arc::clone(&breaker),
            shutdown.clone(),
        )
        .expect("valid transport config");
        (router, breaker, books, shutdown)
    }
}

fn market_buy() -> Order {
    Order::market(Symbol::new(1), Side::Buy, 100_000_000)
}

#[tokio::test(start_paused = true)]
async fn retry_budget_is_respected_exactly() {
    let (transport, calls) = ScriptedTransport::new(Behavior::AlwaysTimeout);
    let (router, _breaker, _books, _shutdown) = RouterBuilder::default().build(transport);

    let result = router.route(&market_buy()).await;

    assert_eq!(calls.load(Ordering::SeqCst), 3, "exactly max_attempts dispatches");
    match result {
        Err(RoutingError::RoutingFailed {
            attempts,
            last_error,
        }) => {
            assert_eq!(attempts, 3);
            assert!(matches!(last_error, TransportError::Timeout(_)));
        }
        other => panic!("expected RoutingFailed, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn transient_failures_recover_within_budget() {
    let (transport, calls) = ScriptedTransport::new(Behavior::FailThenAccept(2));
    let (router, breaker, _books, _shutdown) = RouterBuilder::default().build(transport);

    let response = router.route(&market_buy()).await.expect("third attempt succeeds");

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(response.accepted_quantity, 100_000_000);
    // Success wiped the failure streak
    assert_eq!(breaker.failure_count(), 0);
    assert_eq!(breaker.state(), CircuitState::Closed);
}

#[tokio::test(start_paused = true)]
async fn business_rejection_is_never_retried() {
    let (transport, calls) = ScriptedTransport::new(Behavior::AlwaysReject);
    let (router, breaker, _books, _shutdown) = RouterBuilder::default().build(transport);

    let result = router.route(&market_buy()).await;

    assert_eq!(calls.load(Ordering::SeqCst), 1, "no retry on business rejection");
    assert!(matches!(result, Err(RoutingError::BusinessRejection { .. })));
    // Business rejections do not feed the breaker
    assert_eq!(breaker.failure_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn open_breaker_blocks_all_transport_calls() {
    let (transport, calls) = ScriptedTransport::new(Behavior::AlwaysTimeout);
    let mut builder = RouterBuilder::default();
    builder.breaker_config = CircuitBreakerConfig {
        failure_threshold: 3,
        cool_down: Duration::from_secs(3600),
    };
    builder.config.retry.max_attempts = 10;
    let (router, breaker, _books, _shutdown) = builder.build(transport);

    // First call burns through failures until the breaker opens mid-retry
    let first = router.route(&market_buy()).await;
    assert!(matches!(first, Err(RoutingError::CircuitOpen)));
    assert_eq!(calls.load(Ordering::SeqCst), 3, "threshold failures, then open");
    assert_eq!(breaker.state(), CircuitState::Open);

    // While Open, routing makes zero transport calls
    for _ in 0..5 {
        let result = router.route(&market_buy()).await;
        assert!(matches!(result, Err(RoutingError::CircuitOpen)));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3, "no calls while open");
}

#[tokio::test(start_paused = true)]
async fn half_open_probe_closes_breaker_on_success() {
    let (transport, calls) = ScriptedTransport::new(Behavior::FailThenAccept(3));
    let mut builder = RouterBuilder::default();
    builder.breaker_config = CircuitBreakerConfig {
        failure_threshold: 3,
        cool_down: Duration::from_secs(10),
    };
    builder.config.retry.max_attempts = 5;
    let (router, breaker, _books, _shutdown) = builder.build(transport);

    let first = router.route(&market_buy()).await;
    assert!(matches!(first, Err(RoutingError::CircuitOpen)));
    assert_eq!(breaker.state(), CircuitState::Open);

    // After the cool-down the probe is admitted and succeeds
    tokio::time::sleep(Duration::from_secs(11)).await;
    let response = router.route(&market_buy()).await.expect("probe succeeds");
    assert_eq!(response.accepted_quantity, 100_000_000);
    assert_eq!(breaker.state(), CircuitState::Closed);
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn burst_over_rate_limit_is_delayed() {
    // 10 tokens with a 10/s refill: a burst of 15 gets 10 immediate
    // dispatches and 5 delayed by at least half a second
    let (transport, _calls) = ScriptedTransport::new(Behavior::Accept);
    let mut builder = RouterBuilder::default();
    builder.limiter_config = RateLimiterConfig {
        burst_capacity: 10,
        refill_rate: 10.0,
        refill_interval: Duration::from_secs(1),
    };
    builder.config.rate_limit_wait = Duration::from_secs(5);
    let (router, _breaker, _books, _shutdown) = builder.build(transport);

    let router = Arc::new(router);
    let started = tokio::time::Instant::now();

    let mut handles = Vec::new();
    for _ in 0..15 {
        let router = Arc::clone(&router);
        handles.push(tokio::spawn(async move {
            let before = tokio::time::Instant::now();
            router.route(&market_buy()).await.expect("all orders accepted");
            before.elapsed()
        }));
    }

    let mut immediate = 0u32;
    let mut delayed = 0u32;
    for handle in handles {
        let waited = handle.await.unwrap();
        if waited < Duration::from_millis(1) {
            immediate += 1;
        } else {
            assert!(waited >= Duration::from_millis(500), "waited only {:?}", waited);
            delayed += 1;
        }
    }

    assert_eq!(immediate, 10);
    assert_eq!(delayed, 5);
    assert!(started.elapsed() >= Duration::from_millis(900));
}

#[tokio::test(start_paused = true)]
async fn rate_limit_timeout_surfaces() {
    let (transport, calls) = ScriptedTransport::new(Behavior::Accept);
    let mut builder = RouterBuilder::default();
    builder.limiter_config = RateLimiterConfig {
        burst_capacity: 1,
        refill_rate: 1.0,
        refill_interval: Duration::from_secs(60),
    };
    builder.config.rate_limit_wait = Duration::from_secs(1);
    let (router, _breaker, _books, _shutdown) = builder.build(transport);

    router.route(&market_buy()).await.expect("first order passes");

    let result = router.route(&market_buy()).await;
    assert!(matches!(result, Err(RoutingError::RateLimitTimeout { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 1, "no dispatch without a token");
}

#[tokio::test(start_paused = true)]
async fn shutdown_aborts_pending_dispatch() {
    let (transport, _calls) = ScriptedTransport::new(Behavior::NeverReturns);
    let (router, _breaker, _books, shutdown) = RouterBuilder::default().build(transport);

    let router = Arc::new(router);
    let handle = {
        let router = Arc::clone(&router);
        tokio::spawn(async move { router.route(&market_buy()).await })
    };

    tokio::time::sleep(Duration::from_millis(10)).await;
    shutdown.cancel();

    let result = handle.await.unwrap();
    assert!(matches!(result, Err(RoutingError::Cancelled)));
}

#[tokio::test(start_paused = true)]
async fn slippage_gate_runs_before_any_dispatch() {
    let (transport, calls) = ScriptedTransport::new(Behavior::Accept);
    let mut builder = RouterBuilder::default();
    builder.config.max_slippage_bps = 1;
    let (router, _breaker, books, _shutdown) = builder.build(transport);

    // Thin ask ladder: a deep buy walks far past the touch
    books.apply_update(Symbol::new(1), Side::Sell, 100_000_000_000, 1_000_000_000);
    books.apply_update(Symbol::new(1), Side::Sell, 103_000_000_000, 50_000_000_000);

    let order = Order::limit(Symbol::new(1), Side::Buy, 103_000_000_000, 20_000_000_000);
    let result = router.route(&order).await;

    match result {
        Err(RoutingError::SlippageExceeded {
            estimated_bps,
            max_bps,
        }) => {
            assert!(estimated_bps > 1.0);
            assert_eq!(max_bps, 1);
        }
        other => panic!("expected SlippageExceeded, got {:?}", other),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0, "rejected before the network");

    // The same book fills a small order at the touch with zero slippage
    let small = Order::limit(Symbol::new(1), Side::Buy, 100_000_000_000, 500_000_000);
    router.route(&small).await.expect("small order routes");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn insufficient_liquidity_blocks_routing() {
    let (transport, calls) = ScriptedTransport::new(Behavior::Accept);
    let (router, _breaker, books, _shutdown) = RouterBuilder::default().build(transport);

    books.apply_update(Symbol::new(1), Side::Sell, 100_000_000_000, 1_000_000_000);

    let order = Order::limit(Symbol::new(1), Side::Buy, 100_000_000_000, 50_000_000_000);
    let result = router.route(&order).await;

    assert!(matches!(
        result,
        Err(RoutingError::InsufficientLiquidity { .. })
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
