// [libs/shared/heimdall/src/lib.rs]
/*!
 * Inicialización de tracing compartida por los binarios del broker:
 * filtro dinámico vía `RUST_LOG`, salida JSON en release y compacta en
 * debug, y un panic hook que enruta los pánicos a través de `tracing`
 * antes de que el proceso termine.
 */

use std::panic;

use tracing::{error, info, instrument};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[instrument(skip_all)]
pub fn init_tracing(service_name: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "{}={level},tower_http=warn,hyper=warn,libsql=error",
            service_name,
            level = if cfg!(debug_assertions) { "debug" } else { "info" }
        )
        .into()
    });

    if cfg!(debug_assertions) {
        tracing_subscriber::registry().with(filter).with(fmt::layer().compact().with_target(false)).init();
    } else {
        tracing_subscriber::registry().with(filter).with(fmt::layer().json().flatten_event(true)).init();
    }

    let service = service_name.to_string();
    panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()))
            .unwrap_or_else(|| "unknown".to_string());

        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| info.payload().downcast_ref::<String>().map(|s| s.as_str()))
            .unwrap_or("non-string panic payload");

        error!(target: "panic_monitor", service = %service, location = %location, "thread panicked: {}", payload);
    }));

    info!(service = %service_name, "tracing initialized");
}
