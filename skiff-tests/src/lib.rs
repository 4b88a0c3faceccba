mod crud;
mod entities;
mod fake;
mod reads;
mod transaction1;

pub use entities::*;
pub use fake::*;

use crate::{crud::crud, reads::reads, transaction1::transaction1};
use log::LevelFilter;
use skiff_core::{Configuration, DbDriver, DbProviderFactory, SessionFactory};
use std::{env, sync::Arc};

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Session factory on `provider` using the driver returned by `create`.
pub fn session_factory<D, F>(provider: &FakeProvider, create: F) -> SessionFactory
where
    D: DbDriver + 'static,
    F: FnOnce(Arc<dyn DbProviderFactory>, String) -> D,
{
    let provider: Arc<dyn DbProviderFactory> = Arc::new(provider.clone());
    let connection_string = "Data Source=memory".to_string();
    let driver = create(provider.clone(), connection_string.clone());
    let configuration = Configuration::new(
        "fake",
        connection_string,
        driver.dialect().name(),
        provider,
    );
    SessionFactory::new(configuration, Arc::new(driver)).expect("Could not create the factory")
}

/// Session behavior every driver must show, checked against the calls `provider` records.
pub async fn execute_tests(factory: &SessionFactory, provider: &FakeProvider) {
    crud(factory, provider).await;
    reads(factory, provider).await;
    transaction1(factory, provider).await;
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
