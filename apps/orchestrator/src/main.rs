// [apps/orchestrator/src/main.rs]
/*!
 * Punto de entrada del binario: carga `.env`, inicializa tracing vía
 * Heimdall, lee la configuración del broker y enciende el kernel.
 */

use broker_domain_models::config::BrokerConfig;
use broker_orchestrator::kernel::OrchestratorKernel;
use broker_shared_heimdall::init_tracing;
use dotenvy::dotenv;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_tracing("broker_orchestrator");

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(async {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let database_token = std::env::var("TURSO_AUTH_TOKEN").ok();
        let port: u16 = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().unwrap_or(3000);

        let config_path = std::env::var("BROKER_CONFIG_PATH").expect("BROKER_CONFIG_PATH must be set");
        let raw_config = std::fs::read_to_string(&config_path).unwrap_or_else(|e| panic!("failed to read config at {config_path}: {e}"));
        let config = BrokerConfig::from_toml_str(&raw_config).unwrap_or_else(|e| panic!("invalid config at {config_path}: {e}"));

        let kernel = OrchestratorKernel::ignite(&database_url, database_token, port, config).await;

        info!(port, "broker orchestrator online");
        kernel.launch_sovereign_operations().await;

        Ok(())
    })
}
