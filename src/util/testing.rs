use std::sync::Once;

use tracing::info;
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::arena::DataSet;

static TEST_SETUP: Once = Once::new();

/// Installs the tracing subscriber once per test process.
pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        setup_test_logging();
        info!("Test Setup complete");
    });
}

fn setup_test_logging() {
    // TUKEY_TEST_LOG=trace for span enter/close events of the tree engines
    let env_filter = EnvFilter::try_from_env("TUKEY_TEST_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("tukey=debug"));

    let crate_only = filter_fn(|metadata| metadata.target().starts_with("tukey"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_test_writer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(crate_only)
            .with_filter(env_filter),
    );

    if tracing::dispatcher::has_been_set() {
        info!("Tracing subscriber already set");
    } else if let Err(e) = subscriber.try_init() {
        eprintln!("Error: Failed to set up logging: {}", e);
    }
}

/// Expense report fixture shared by unit and integration tests:
/// two offices with monthly amounts, one month unreported.
pub fn expense_report() -> DataSet {
    DataSet::branch(
        "Expenses",
        vec![
            DataSet::branch(
                "Office 1",
                vec![
                    DataSet::leaf("January", 100),
                    DataSet::leaf("February", 600),
                ],
            ),
            DataSet::branch(
                "Office 2",
                vec![DataSet::leaf("January", 150), DataSet::empty("February")],
            ),
        ],
    )
}
