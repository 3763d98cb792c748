use crate::error::ConvertError;
use crate::registry::MetricRegistry;
use std::fmt::Debug;
use tracing::debug;

/// 可分发的数据记录，通过标签选择转换器
pub trait Tagged {
    type Tag: Copy + Eq + Debug;

    fn tag(&self) -> Self::Tag;
}

/// 转换器接口
///
/// 将一条类型化记录写入注册表中的零个或多个指标。
/// 对相同输入重复转换必须得到与单次转换相同的结果。
pub trait Converter<V: Tagged>: Send + Sync {
    fn name(&self) -> &str;

    fn matches(&self, tag: V::Tag) -> bool;

    fn convert(&self, registry: &MetricRegistry, value: &V) -> Result<(), ConvertError>;
}

/// 组合转换器
pub struct CombinedConverter<V: Tagged> {
    converters: Vec<Box<dyn Converter<V>>>,
}

impl<V: Tagged> CombinedConverter<V> {
    pub fn new() -> Self {
        Self {
            converters: Vec::new(),
        }
    }

    pub fn add(&mut self, converter: Box<dyn Converter<V>>) {
        debug!(converter = %converter.name(), "Adding converter");
        self.converters.push(converter);
    }

    pub fn with(mut self, converter: impl Converter<V> + 'static) -> Self {
        self.add(Box::new(converter));
        self
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// 按注册顺序调用所有匹配的转换器，遇到第一个错误即返回
    pub fn convert(&self, registry: &MetricRegistry, value: &V) -> Result<(), ConvertError> {
        let tag = value.tag();
        let mut matched = 0;

        for converter in self.converters.iter().filter(|c| c.matches(tag)) {
            matched += 1;
            converter.convert(registry, value)?;
        }

        if matched == 0 {
            debug!(tag = ?tag, "No converters match the given tag");
        }

        Ok(())
    }
}

impl<V: Tagged> Default for CombinedConverter<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Kind {
        Reading,
        Status,
        Other,
    }

    struct Record {
        kind: Kind,
        value: f64,
    }

    impl Tagged for Record {
        type Tag = Kind;

        fn tag(&self) -> Kind {
            self.kind
        }
    }

    struct Recording {
        name: &'static str,
        accepts: Kind,
        fail: bool,
        calls: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Converter<Record> for Recording {
        fn name(&self) -> &str {
            self.name
        }

        fn matches(&self, tag: Kind) -> bool {
            tag == self.accepts
        }

        fn convert(&self, registry: &MetricRegistry, value: &Record) -> Result<(), ConvertError> {
            self.calls.lock().unwrap().push(self.name);
            if self.fail {
                return Err(ConvertError::MissingField("value".to_string()));
            }
            registry
                .get_or_create_gauge_vec("reading", "Reading value", &["source"])?
                .with_label_values(&[self.name])
                .set(value.value);
            Ok(())
        }
    }

    fn recording(
        name: &'static str,
        accepts: Kind,
        fail: bool,
        calls: &Arc<Mutex<Vec<&'static str>>>,
    ) -> Recording {
        Recording {
            name,
            accepts,
            fail,
            calls: calls.clone(),
        }
    }

    fn record(kind: Kind, value: f64) -> Record {
        Record { kind, value }
    }

    #[test]
    fn test_dispatches_matching_converters_in_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let converter = CombinedConverter::new()
            .with(recording("first", Kind::Reading, false, &calls))
            .with(recording("status", Kind::Status, false, &calls))
            .with(recording("second", Kind::Reading, false, &calls));
        let registry = MetricRegistry::new("test");

        converter.convert(&registry, &record(Kind::Reading, 1.0)).unwrap();

        assert_eq!(*calls.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_unmatched_tag_is_not_an_error() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let converter =
            CombinedConverter::new().with(recording("first", Kind::Reading, false, &calls));
        let registry = MetricRegistry::new("test");

        converter.convert(&registry, &record(Kind::Other, 1.0)).unwrap();

        assert!(calls.lock().unwrap().is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_first_error_stops_dispatch() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let converter = CombinedConverter::new()
            .with(recording("broken", Kind::Reading, true, &calls))
            .with(recording("after", Kind::Reading, false, &calls));
        let registry = MetricRegistry::new("test");

        let result = converter.convert(&registry, &record(Kind::Reading, 1.0));

        assert!(result.is_err());
        assert_eq!(*calls.lock().unwrap(), vec!["broken"]);
    }

    #[test]
    fn test_repeated_conversion_is_last_write_wins() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let converter =
            CombinedConverter::new().with(recording("gauge", Kind::Reading, false, &calls));
        let registry = MetricRegistry::new("test");

        converter.convert(&registry, &record(Kind::Reading, 12.3)).unwrap();
        converter.convert(&registry, &record(Kind::Reading, 16.0)).unwrap();

        let gauge = registry
            .get_or_create_gauge_vec("reading", "Reading value", &["source"])
            .unwrap();
        assert_eq!(gauge.with_label_values(&["gauge"]).get(), 16.0);
    }
}
