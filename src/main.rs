use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use tokio::signal;
use tracing::{error, info, warn, Level};

use fleet_operations::clients::SupabaseStore;
use fleet_operations::config::{DatabaseConfig, EnvironmentConfig, StoreBackend};
use fleet_operations::repositories::{EntityRepository, EntityStore, InMemoryStore, PostgresStore};
use fleet_operations::routes::create_app_router;
use fleet_operations::{AppError, AppState, FleetSession};

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    let config = EnvironmentConfig::from_env()?;

    // Configurar logging
    let level = config.log_level.parse::<Level>().unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    info!("🚚 Fleet Operations - API de gestión de flota");
    info!("================================================");
    info!("🌍 Entorno: {} | backend: {:?}", config.environment, config.store_backend);

    let store = match build_store(&config).await {
        Ok(store) => store,
        Err(e) => {
            error!("❌ Error inicializando el store: {}", e);
            return Err(anyhow::anyhow!("Error de store: {}", e));
        }
    };

    // Abrir la sesión: carga todas las colecciones
    let session = FleetSession::open(EntityRepository::new(store), config.operator_id).await?;
    if config.operator_id.is_none() {
        warn!("⚠️ OPERATOR_ID no definido: los registros se crearán sin operador");
    }

    let addr: SocketAddr = config.server_url().parse()?;
    let app = create_app_router(AppState::new(config, session));

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health");
    info!("   /api/drivers /api/vehicles /api/inventory /api/complaints");
    info!("   /api/fuel-cards /api/tours /api/stops /api/controls");
    info!("   /api/dashboard /api/assignments/audit /api/reconciliation/retry");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!("❌ Error del servidor: {}", e);
            e
        })?;

    info!("👋 Servidor terminado");
    Ok(())
}

/// Construir el backend de persistencia configurado
async fn build_store(config: &EnvironmentConfig) -> Result<Arc<dyn EntityStore>, AppError> {
    match config.store_backend {
        StoreBackend::Memory => {
            warn!("⚠️ Usando store en memoria: los datos se pierden al reiniciar");
            Ok(Arc::new(InMemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| AppError::Config("DATABASE_URL no definido".to_string()))?;
            let pool = DatabaseConfig::new(url).create_pool().await?;
            let store = PostgresStore::new(pool);
            store.ensure_schema().await?;
            info!("✅ PostgreSQL conectado y esquema verificado");
            Ok(Arc::new(store))
        }
        StoreBackend::Supabase => {
            let (url, key) = config
                .supabase_url
                .as_deref()
                .zip(config.supabase_key.as_deref())
                .ok_or_else(|| AppError::Config("SUPABASE_URL / SUPABASE_KEY no definidos".to_string()))?;
            Ok(Arc::new(SupabaseStore::new(url, key)?))
        }
    }
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
