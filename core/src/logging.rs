//! # Logging
//!
//! Standardised `tracing` initialisation shared by every long-lived
//! Gridloop process (the Supervisor binary, and any integration test that
//! wants readable output). Mirrors the teacher's two initialisers
//! (human-readable / JSON) and its noise-filter layer, retargeted here
//! from filtering a replica-state-update span to filtering the
//! once-per-second per-cycle "manage" tick span, which would otherwise
//! dominate logs at `debug` level across dozens of concurrently running
//! cycles.
//!
//! ```rust,ignore
//! gridloop_core::logging::init_logging();
//! tracing::info!("supervisor started");
//! ```

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// The span name the Cycle Engine opens once per tick for a single
/// cycle's management pass (§4.5.2). Filtered out of `info`-level logs by
/// [`CycleTickSpanFilter`] so a fleet of active cycles doesn't drown out
/// everything else; still visible at `debug` and above via `RUST_LOG`.
pub const CYCLE_TICK_SPAN_NAME: &str = "cycle_manage_tick";

/// Initialises human-readable logging, honouring `RUST_LOG` with an
/// `info` default.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(CycleTickSpanFilter)
        .init()
}

/// Initialises JSON logging for aggregators, same filtering behaviour as
/// [`init_logging`].
pub fn init_json_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::filter::EnvFilter::builder()
                .with_default_directive(tracing_subscriber::filter::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
        .with(CycleTickSpanFilter)
        .init()
}

struct CycleTickSpanFilter;

impl<S> tracing_subscriber::layer::Layer<S> for CycleTickSpanFilter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fn event_enabled(
        &self,
        event: &tracing::Event<'_>,
        ctx: tracing_subscriber::layer::Context<'_, S>,
    ) -> bool {
        if event.metadata().level() <= &tracing::Level::WARN {
            return true;
        }
        if let Some(span) = ctx.lookup_current() {
            span.name() != CYCLE_TICK_SPAN_NAME
        } else {
            true
        }
    }
}
