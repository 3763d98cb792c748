use serde::{Deserialize, Serialize};

/// 通知级别
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotifyLevel {
    /// 信息
    #[default]
    Info,
    /// 警告
    Warning,
    /// 严重
    Critical,
}

impl NotifyLevel {
    /// ntfy 优先级（1-5）
    pub fn priority(self) -> u8 {
        match self {
            NotifyLevel::Info => 3,
            NotifyLevel::Warning => 4,
            NotifyLevel::Critical => 5,
        }
    }
}

/// 通知消息，按 ntfy JSON 发布格式序列化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotifyMessage {
    /// 主题
    pub topic: String,

    /// 标题
    pub title: String,

    /// 内容
    pub message: String,

    /// 优先级
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,

    /// 标签
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// 点击跳转地址
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click: Option<String>,

    /// 附件地址
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attach: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl NotifyMessage {
    pub fn new(
        topic: impl Into<String>,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            title: title.into(),
            message: message.into(),
            priority: None,
            tags: Vec::new(),
            click: None,
            attach: None,
            filename: None,
        }
    }

    pub fn with_level(mut self, level: NotifyLevel) -> Self {
        self.priority = Some(level.priority());
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority.clamp(1, 5));
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_click_url(mut self, click: impl Into<String>) -> Self {
        self.click = Some(click.into());
        self
    }

    pub fn with_attachment(mut self, attach: impl Into<String>) -> Self {
        self.attach = Some(attach.into());
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}
