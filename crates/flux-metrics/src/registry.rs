use crate::error::{MetricsError, Result};
use prometheus::core::Collector as PromCollector;
use prometheus::proto::MetricFamily;
use prometheus::{
    Counter, CounterVec, Encoder, Gauge, GaugeVec, Histogram, HistogramOpts, HistogramVec, Opts,
    Registry, TextEncoder,
};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, warn};

/// 已注册的指标
#[derive(Clone)]
enum Collector {
    Gauge(Gauge),
    GaugeVec(GaugeVec),
    Counter(Counter),
    CounterVec(CounterVec),
    Histogram(Histogram),
    HistogramVec(HistogramVec),
}

impl Collector {
    fn kind(&self) -> &'static str {
        match self {
            Collector::Gauge(_) => Gauge::KIND,
            Collector::GaugeVec(_) => GaugeVec::KIND,
            Collector::Counter(_) => Counter::KIND,
            Collector::CounterVec(_) => CounterVec::KIND,
            Collector::Histogram(_) => Histogram::KIND,
            Collector::HistogramVec(_) => HistogramVec::KIND,
        }
    }
}

/// 指标类型与 `Collector` 之间的转换
trait MetricKind: PromCollector + Clone + 'static {
    const KIND: &'static str;

    fn wrap(self) -> Collector;
    fn extract(collector: &Collector) -> Option<Self>;
}

macro_rules! metric_kind {
    ($ty:ident, $kind:literal) => {
        impl MetricKind for $ty {
            const KIND: &'static str = $kind;

            fn wrap(self) -> Collector {
                Collector::$ty(self)
            }

            fn extract(collector: &Collector) -> Option<Self> {
                match collector {
                    Collector::$ty(inner) => Some(inner.clone()),
                    _ => None,
                }
            }
        }
    };
}

metric_kind!(Gauge, "gauge");
metric_kind!(GaugeVec, "gauge_vec");
metric_kind!(Counter, "counter");
metric_kind!(CounterVec, "counter_vec");
metric_kind!(Histogram, "histogram");
metric_kind!(HistogramVec, "histogram_vec");

struct Entry {
    collector: Collector,
    labels: Vec<String>,
}

/// 指标注册表
///
/// 按逻辑名称惰性创建指标并注册到 Prometheus 注册表。
/// 同一名称在注册表生命周期内只对应一个指标实例，标签在首次创建时固定。
pub struct MetricRegistry {
    namespace: String,
    registry: Registry,
    collectors: RwLock<HashMap<String, Entry>>,
}

impl MetricRegistry {
    /// 创建带命名空间的注册表
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            registry: Registry::new(),
            collectors: RwLock::new(HashMap::new()),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// 获取或创建 Gauge
    pub fn get_or_create_gauge(&self, name: &str, help: &str) -> Result<Gauge> {
        self.get_or_create(name, &[], || Gauge::with_opts(self.opts(name, help)))
    }

    /// 获取或创建信息类 Gauge（值固定为 1）
    pub fn get_or_create_info(&self, name: &str, help: &str) -> Result<Gauge> {
        let gauge = self.get_or_create_gauge(name, help)?;
        gauge.set(1.0);
        Ok(gauge)
    }

    /// 获取或创建 GaugeVec
    pub fn get_or_create_gauge_vec(
        &self,
        name: &str,
        help: &str,
        labels: &[&str],
    ) -> Result<GaugeVec> {
        self.get_or_create(name, labels, || {
            GaugeVec::new(self.opts(name, help), labels)
        })
    }

    /// 获取或创建 Counter
    pub fn get_or_create_counter(&self, name: &str, help: &str) -> Result<Counter> {
        self.get_or_create(name, &[], || Counter::with_opts(self.opts(name, help)))
    }

    /// 获取或创建 CounterVec
    pub fn get_or_create_counter_vec(
        &self,
        name: &str,
        help: &str,
        labels: &[&str],
    ) -> Result<CounterVec> {
        self.get_or_create(name, labels, || {
            CounterVec::new(self.opts(name, help), labels)
        })
    }

    /// 获取或创建 Histogram
    pub fn get_or_create_histogram(
        &self,
        name: &str,
        help: &str,
        buckets: &[f64],
    ) -> Result<Histogram> {
        self.get_or_create(name, &[], || {
            Histogram::with_opts(self.histogram_opts(name, help, buckets))
        })
    }

    /// 获取或创建 HistogramVec
    pub fn get_or_create_histogram_vec(
        &self,
        name: &str,
        help: &str,
        buckets: &[f64],
        labels: &[&str],
    ) -> Result<HistogramVec> {
        self.get_or_create(name, labels, || {
            HistogramVec::new(self.histogram_opts(name, help, buckets), labels)
        })
    }

    /// 已创建的指标数量
    pub fn len(&self) -> usize {
        self.collectors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 收集所有指标族
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// 导出为 Prometheus 文本格式
    pub fn export(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    fn opts(&self, name: &str, help: &str) -> Opts {
        Opts::new(name, help).namespace(self.namespace.clone())
    }

    fn histogram_opts(&self, name: &str, help: &str, buckets: &[f64]) -> HistogramOpts {
        let opts = HistogramOpts::new(name, help).namespace(self.namespace.clone());
        if buckets.is_empty() {
            opts
        } else {
            opts.buckets(buckets.to_vec())
        }
    }

    fn get_or_create<T, F>(&self, name: &str, labels: &[&str], create: F) -> Result<T>
    where
        T: MetricKind,
        F: FnOnce() -> prometheus::Result<T>,
    {
        // 常见路径：读锁查找
        {
            let collectors = self
                .collectors
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(entry) = collectors.get(name) {
                return Self::reuse(name, entry, labels);
            }
        }

        let mut collectors = self
            .collectors
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        // 写锁下重新检查，并发创建者只有一个能成功
        if let Some(entry) = collectors.get(name) {
            return Self::reuse(name, entry, labels);
        }

        let metric = create()?;
        self.registry.register(Box::new(metric.clone()))?;

        debug!(
            namespace = %self.namespace,
            metric = %name,
            kind = T::KIND,
            "Registered new collector"
        );

        collectors.insert(
            name.to_string(),
            Entry {
                collector: metric.clone().wrap(),
                labels: labels.iter().map(|l| l.to_string()).collect(),
            },
        );

        Ok(metric)
    }

    fn reuse<T: MetricKind>(name: &str, entry: &Entry, labels: &[&str]) -> Result<T> {
        let metric = T::extract(&entry.collector).ok_or_else(|| MetricsError::KindMismatch {
            name: name.to_string(),
            existing: entry.collector.kind(),
            requested: T::KIND,
        })?;

        if !entry.labels.iter().map(String::as_str).eq(labels.iter().copied()) {
            warn!(
                metric = %name,
                existing = ?entry.labels,
                requested = ?labels,
                "Label schema differs from the registered collector, reusing existing"
            );
        }

        Ok(metric)
    }
}
