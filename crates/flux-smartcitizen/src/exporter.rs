use crate::converter::{default_converter, TelemetryRecord};
use crate::error::{Result, SmartCitizenError};
use crate::model::{DeviceDetail, User};
use crate::provider::TelemetryProvider;
use crate::snapshot::device_metrics;
use flux_metrics::{AlertingEngine, CombinedConverter, MetricRegistry, SensorMetricMapping};
use prometheus::{Counter, CounterVec};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// 一次抓取的结果
#[derive(Debug, Clone, Default)]
pub struct UserDeviceCollection {
    pub user: User,
    pub devices: Vec<DeviceDetail>,
}

/// 一个处理周期的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub devices: usize,
    pub sensors: usize,
    pub errors: usize,
}

/// 轮询导出器
///
/// 每个周期抓取一次用户设备，转换为 Prometheus 指标，
/// 并将快照交给告警引擎。单个设备或传感器的转换失败只影响自身。
pub struct ApiExporter {
    provider: Arc<dyn TelemetryProvider>,
    registry: Arc<MetricRegistry>,
    converter: CombinedConverter<TelemetryRecord>,
    engine: Option<Arc<AlertingEngine>>,
    requests_total: Counter,
    requests_success: Counter,
    api_errors: CounterVec,
    data_errors: CounterVec,
}

impl ApiExporter {
    pub fn new(
        provider: Arc<dyn TelemetryProvider>,
        registry: Arc<MetricRegistry>,
        mapping: Arc<SensorMetricMapping>,
    ) -> Result<Self> {
        let requests_total =
            registry.get_or_create_counter("api_requests_total", "Total number of poll cycles")?;
        let requests_success = registry.get_or_create_counter(
            "api_requests_success_total",
            "Total number of successful poll cycles",
        )?;
        let api_errors = registry.get_or_create_counter_vec(
            "api_errors_total",
            "Total number of API errors",
            &["type"],
        )?;
        let data_errors = registry.get_or_create_counter_vec(
            "data_errors_total",
            "Total number of data conversion errors",
            &["type"],
        )?;
        registry.get_or_create_info("exporter_info", "SmartCitizen exporter information")?;

        Ok(Self {
            provider,
            registry,
            converter: default_converter(mapping),
            engine: None,
            requests_total,
            requests_success,
            api_errors,
            data_errors,
        })
    }

    pub fn with_alerting(mut self, engine: Arc<AlertingEngine>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub fn registry(&self) -> &Arc<MetricRegistry> {
        &self.registry
    }

    /// 抓取当前用户及其全部设备详情，任一请求失败则整体失败
    pub async fn fetch(&self) -> Result<UserDeviceCollection> {
        let user = self.provider.get_me().await?;
        let mut devices = Vec::with_capacity(user.devices.len());

        for summary in &user.devices {
            let device = self.provider.get_device(summary.id).await?;
            debug!(device_id = summary.id, sensors = device.data.sensors.len(), "Fetched device");
            devices.push(device);
        }

        Ok(UserDeviceCollection { user, devices })
    }

    /// 转换并评估一次抓取结果
    pub fn process(&self, data: UserDeviceCollection) -> CycleSummary {
        let mut summary = CycleSummary::default();

        for mut device in data.devices {
            let snapshots = device_metrics(&device);
            let sensors = std::mem::take(&mut device.data.sensors);
            let device_id = device.id;
            summary.devices += 1;

            if let Err(e) = self
                .converter
                .convert(&self.registry, &TelemetryRecord::Device(device))
            {
                error!(device_id, error = %e, "Failed to convert device");
                self.data_errors.with_label_values(&["mapping_error"]).inc();
                summary.errors += 1;
            }

            for sensor in sensors {
                summary.sensors += 1;
                let sensor_name = sensor.name.clone();
                if let Err(e) = self
                    .converter
                    .convert(&self.registry, &TelemetryRecord::Sensor(sensor))
                {
                    error!(
                        device_id,
                        sensor = %sensor_name,
                        error = %e,
                        "Failed to convert sensor"
                    );
                    self.data_errors.with_label_values(&["mapping_error"]).inc();
                    summary.errors += 1;
                }
            }

            if let Some(engine) = &self.engine {
                engine.evaluate_all(&snapshots);
            }
        }

        summary
    }

    /// 执行一个轮询周期，取消时返回 Cancelled
    pub async fn update_metrics(&self, cancel: &CancellationToken) -> Result<CycleSummary> {
        self.requests_total.inc();

        let data = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Poll cycle cancelled during fetch");
                return Err(SmartCitizenError::Cancelled);
            }
            result = self.fetch() => result,
        };

        let data = match data {
            Ok(data) => data,
            Err(e) => {
                error!(error = %e, "Failed to fetch data");
                self.api_errors.with_label_values(&["fetch_error"]).inc();
                return Err(e);
            }
        };

        self.requests_success.inc();
        let summary = self.process(data);
        info!(
            devices = summary.devices,
            sensors = summary.sensors,
            errors = summary.errors,
            "Metrics updated"
        );
        Ok(summary)
    }

    /// 立即执行一次，然后按固定间隔轮询，直到取消
    pub async fn start(&self, interval: Duration, cancel: CancellationToken) {
        info!(interval_secs = interval.as_secs(), "Starting metrics updater");

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            if let Err(e) = self.update_metrics(&cancel).await {
                if matches!(e, SmartCitizenError::Cancelled) {
                    break;
                }
                warn!(error = %e, "Poll cycle failed, metrics left unchanged");
            }
        }

        info!("Metrics updater stopped");
    }
}
