use crate::http::create_router;
use crate::rules::default_rules;
use anyhow::{Context, Result};
use flux_config::AppConfig;
use flux_metrics::{AlertingEngine, MetricMappingItem, MetricRegistry, SensorMetricMapping};
use flux_notify::{
    NotifyManager, NtfyNotifier, TokenCredentialEnvProvider, TokenCredentialProvider,
};
use flux_shutdown::{ShutdownCoordinator, SignalHandler};
use flux_smartcitizen::{
    ApiExporter, HttpProvider, HttpProviderConfig, TelemetryProvider, UserCredentialEnvProvider,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// 通知队列容量
pub const NOTIFICATION_QUEUE_CAPACITY: usize = 64;

/// 默认映射叠加配置中的额外条目
pub fn build_mapping(config: &AppConfig) -> SensorMetricMapping {
    let mapping = SensorMetricMapping::with_defaults();
    for entry in &config.sensor_mapping {
        mapping.add(
            entry.sensor.clone(),
            MetricMappingItem::new(entry.metric.clone(), entry.category.clone()),
        );
    }
    mapping
}

/// 建立 ntfy 连接的超时
const NTFY_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// 令牌环境变量未设置时以匿名方式发布
fn build_notifier(config: &AppConfig) -> Result<NtfyNotifier> {
    let client = reqwest::Client::builder()
        .connect_timeout(NTFY_CONNECT_TIMEOUT)
        .timeout(Duration::from_secs(config.ntfy.request_timeout_secs))
        .build()
        .context("Failed to build ntfy HTTP client")?;
    let notifier = NtfyNotifier::new(config.ntfy.endpoint.clone(), client);
    let credentials = TokenCredentialEnvProvider::new(config.ntfy.token_env.clone());

    match credentials.retrieve() {
        Ok(_) => Ok(notifier.with_credentials(credentials)),
        Err(e) => {
            warn!(error = %e, "No ntfy token configured, publishing anonymously");
            Ok(notifier)
        }
    }
}

/// 建立认证会话并检查 API 可用
async fn connect(config: &AppConfig, registry: &MetricRegistry) -> Result<HttpProvider> {
    let smc = &config.smartcitizen;
    let credential =
        UserCredentialEnvProvider::new(&smc.username_env, &smc.password_env, &smc.token_env)
            .retrieve()
            .context("Failed to retrieve SmartCitizen credentials")?;

    let provider = HttpProvider::new(
        HttpProviderConfig {
            endpoint: smc.endpoint.clone(),
            api_version: smc.api_version.clone(),
            request_timeout: Duration::from_secs(smc.request_timeout_secs),
        },
        registry,
    )?;

    provider
        .authenticate(&credential)
        .await
        .context("Failed to authenticate with SmartCitizen API")?;
    provider
        .ping()
        .await
        .context("Failed to ping SmartCitizen API")?;

    let user = provider.get_me().await?;
    info!(
        user_id = user.id,
        username = %user.username,
        devices = user.devices.len(),
        "Authenticated user"
    );

    Ok(provider)
}

/// 组装并运行探针
///
/// `once` 为真时只执行一个轮询周期，投递完已入队的通知后退出。
pub async fn run(config: AppConfig, once: bool) -> Result<()> {
    let addr: SocketAddr = config
        .server
        .bind_address()
        .parse()
        .with_context(|| format!("Invalid server address {}", config.server.bind_address()))?;

    let registry = Arc::new(MetricRegistry::new(config.namespace.clone()));
    let mapping = Arc::new(build_mapping(&config));
    let provider = Arc::new(connect(&config, &registry).await?);

    let (notify_manager, queue) =
        NotifyManager::new(Arc::new(build_notifier(&config)?), NOTIFICATION_QUEUE_CAPACITY);

    let engine = Arc::new(AlertingEngine::new().with_registry(registry.clone()));
    for rule in default_rules(&config.battery_sensor_name, &queue, &config.ntfy.topic) {
        engine.add_rule(rule);
    }

    let exporter = Arc::new(
        ApiExporter::new(provider, registry.clone(), mapping)?.with_alerting(engine),
    );

    let signal_handler = SignalHandler::new();
    let token = signal_handler.token();
    let mut coordinator = ShutdownCoordinator::builder()
        .with_signal_handler(signal_handler.clone())
        .build();

    coordinator.spawn("notifications", notify_manager.run(token.clone()));

    if once {
        let result = exporter.update_metrics(&token).await;
        signal_handler.trigger_shutdown();
        coordinator.run().await;
        result?;
        return Ok(());
    }

    let server = axum::Server::try_bind(&addr)
        .with_context(|| format!("Failed to bind {}", addr))?
        .serve(create_router(registry).into_make_service());
    info!(address = %addr, "HTTP server listening");

    {
        let token = token.clone();
        let handler = signal_handler.clone();
        coordinator.spawn("http", async move {
            let graceful = server.with_graceful_shutdown(async move { token.cancelled().await });
            if let Err(e) = graceful.await {
                error!(error = %e, "HTTP server failed");
                handler.trigger_shutdown();
            }
        });
    }

    {
        let exporter = exporter.clone();
        let token = token.clone();
        let interval = Duration::from_secs(config.smartcitizen.poll_interval_secs);
        coordinator.spawn("poller", async move { exporter.start(interval, token).await });
    }

    {
        let handler = signal_handler.clone();
        coordinator.spawn("signals", async move {
            match handler.wait_for_system_signal().await {
                Ok(signal) => info!(signal = ?signal, "Shutting down"),
                Err(e) => {
                    error!(error = %e, "Failed to install signal handlers");
                    handler.trigger_shutdown();
                }
            }
        });
    }

    let report = coordinator.run().await;
    if !report.is_clean() {
        error!(tasks = ?report.timed_out, "Some tasks did not stop in time");
    }

    Ok(())
}
