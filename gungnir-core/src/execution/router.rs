//! Order routing - the dispatch pipeline around the exchange transport
//!
//! `route()` runs a fixed pipeline, cheapest rejection first, no network
//! activity until every local gate has passed:
//!
//! ```text
//! 1. slippage gate      estimate against the latest snapshot (limit orders)
//! 2. rate limit         non-blocking fast path, then bounded wait
//! 3. transport checks   encrypted endpoint + credentials, every dispatch
//! 4. breaker gate       fail fast while the exchange is unhealthy
//! 5. dispatch + retry   transient faults backed off and retried,
//!                       business rejections surfaced immediately
//! ```
//!
//! Every suspension point (rate-limit wait, dispatch await, backoff sleep)
//! selects against the shutdown signal, so cancellation aborts the wait
//! instead of letting it run to expiry.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::core::fixed_point::SCALE;
use crate::core::Order;
use crate::execution::error::RoutingError;
use crate::execution::transport::{ConfigurationError, ExchangeTransport, TransportConfig};
use crate::execution::types::{ExchangeResponse, TransportError};
use crate::orderbook::{BookRegistry, SlippageEstimator, SlippageResult};
use crate::resilience::{CircuitBreaker, RetryPolicy, ShutdownSignal};
use crate::risk::{RateLimiter, WaitOutcome};

/// Routing-stage configuration
#[derive(Debug, Clone, Copy)]
pub struct RouterConfig {
    /// Maximum tolerated slippage estimate, whole basis points
    pub max_slippage_bps: u32,
    /// How long a call may wait for a rate-limit token
    pub rate_limit_wait: Duration,
    /// Retry schedule for transient dispatch failures
    pub retry: RetryPolicy,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_slippage_bps: 25,
            rate_limit_wait: Duration::from_secs(1),
            retry: RetryPolicy::default(),
        }
    }
}

/// Routes validated orders to the exchange with rate limiting, retry and
/// failure isolation
pub struct OrderRouter<T: ExchangeTransport> {
    transport: T,
    transport_config: TransportConfig,
    config: RouterConfig,
    books: Arc<BookRegistry>,
    estimator: SlippageEstimator,
    rate_limiter: RateLimiter,
    breaker: Arc<CircuitBreaker>,
    shutdown: ShutdownSignal,
}

impl<T: ExchangeTransport> OrderRouter<T> {
    /// Build a router, validating the transport configuration up front
    ///
    /// An unencrypted endpoint or empty credentials fail construction; the
    /// same validation runs again before every dispatch.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        transport: T,
        transport_config: TransportConfig,
        config: RouterConfig,
        books: Arc<BookRegistry>,
        estimator: SlippageEstimator,
        rate_limiter: RateLimiter,
        breaker: Arc<CircuitBreaker>,
        shutdown: ShutdownSignal,
    ) -> Result<Self, ConfigurationError> {
        transport_config.validate()?;
        Ok(Self {
            transport,
            transport_config,
            config,
            books,
            estimator,
            rate_limiter,
            breaker,
            shutdown,
        })
    }

    /// Shared breaker handle, for wiring the risk gate to the same instance
    pub fn breaker(&self) -> Arc<CircuitBreaker> {
        Arc::clone(&self.breaker)
    }

    /// Run one order through the dispatch pipeline
    pub async fn route(&self, order: &Order) -> Result<ExchangeResponse, RoutingError> {
        // 1. Slippage gate: price the market impact before spending anything
        //    else on this order. Market orders carry no price expectation to
        //    gate against.
        if order.limit_price.is_some() {
            let max_levels = self.estimator.config().max_levels;
            let snapshot = self
                .books
                .snapshot(order.symbol, max_levels)
                .ok_or(RoutingError::BookUnavailable {
                    symbol: order.symbol,
                })?;

            match self.estimator.estimate(order, &snapshot) {
                SlippageResult::Estimate(bps) => {
                    let limit = self.config.max_slippage_bps as u64 * SCALE as u64;
                    if bps > limit {
                        let estimated_bps = bps as f64 / SCALE as f64;
                        warn!(
                            order_id = %order.id,
                            estimated_bps,
                            max_bps = self.config.max_slippage_bps,
                            "slippage gate rejected order"
                        );
                        return Err(RoutingError::SlippageExceeded {
                            estimated_bps,
                            max_bps: self.config.max_slippage_bps,
                        });
                    }
                }
                SlippageResult::InsufficientLiquidity => {
                    return Err(RoutingError::InsufficientLiquidity { max_levels });
                }
            }
        }

        // 2. Rate limit: fast path first, then suspend bounded by the wait
        //    budget
        if !self.rate_limiter.try_acquire() {
            match self
                .rate_limiter
                .acquire(self.config.rate_limit_wait, &self.shutdown)
                .await
            {
                WaitOutcome::Acquired => {}
                WaitOutcome::TimedOut => {
                    return Err(RoutingError::RateLimitTimeout {
                        waited: self.config.rate_limit_wait,
                    });
                }
                WaitOutcome::Cancelled => return Err(RoutingError::Cancelled),
            }
        }

        // 3. Transport security: re-checked on every dispatch, fatal on
        //    violation
        self.transport_config.validate()?;

        // 4 + 5. Breaker gate and dispatch with bounded retry
        self.dispatch_with_retry(order).await
    }

    async fn dispatch_with_retry(
        &self,
        order: &Order,
    ) -> Result<ExchangeResponse, RoutingError> {
        let max_attempts = self.config.retry.max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            if !self.breaker.is_call_permitted() {
                return Err(RoutingError::CircuitOpen);
            }

            let result = tokio::select! {
                result = self.transport.send_order(order) => result,
                _ = self.shutdown.cancelled() => return Err(RoutingError::Cancelled),
            };
            attempt += 1;

            match result {
                Ok(response) => {
                    self.breaker.record_success();
                    debug!(order_id = %order.id, attempt, "order accepted");
                    return Ok(response);
                }
                Err(TransportError::Rejected { reason }) => {
                    debug!(order_id = %order.id, %reason, "business rejection, not retrying");
                    return Err(RoutingError::BusinessRejection { reason });
                }
                Err(transient) => {
                    // Every transient failure feeds the breaker, whether or
                    // not budget remains for this call
                    self.breaker.record_failure();

                    if attempt >= max_attempts {
                        warn!(
                            order_id = %order.id,
                            attempts = attempt,
                            error = %transient,
                            "retry budget exhausted"
                        );
                        return Err(RoutingError::RoutingFailed {
                            attempts: attempt,
                            last_error: transient,
                        });
                    }

                    let delay = self.config.retry.delay_for(attempt - 1);
                    debug!(
                        order_id = %order.id,
                        attempt,
                        ?delay,
                        error = %transient,
                        "transient failure, backing off"
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = self.shutdown.cancelled() => return Err(RoutingError::Cancelled),
                    }
                }
            }
        }
    }
}
