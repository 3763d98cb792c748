use crate::credential::UserCredential;
use crate::error::{Result, SmartCitizenError};
use crate::instrument::{extract_endpoint, status_category, REQUEST_DURATION_BUCKETS};
use crate::model::{DeviceDetail, User};
use async_trait::async_trait;
use flux_metrics::MetricRegistry;
use prometheus::HistogramVec;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const DEFAULT_ENDPOINT: &str = "https://api.smartcitizen.me";
pub const DEFAULT_API_VERSION: &str = "v0";

/// 遥测数据源
#[async_trait]
pub trait TelemetryProvider: Send + Sync {
    /// 建立会话，令牌优先于用户名密码
    async fn authenticate(&self, credential: &UserCredential) -> Result<()>;

    fn has_session(&self) -> bool;

    async fn ping(&self) -> Result<()>;

    /// 当前用户及其设备摘要
    async fn get_me(&self) -> Result<User>;

    async fn get_device(&self, device_id: i64) -> Result<DeviceDetail>;
}

#[derive(Debug, Clone)]
pub struct HttpProviderConfig {
    pub endpoint: String,
    pub api_version: String,
    pub request_timeout: Duration,
}

impl Default for HttpProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct OauthSession {
    access_token: String,
}

/// 基于 reqwest 的 SmartCitizen API 客户端
///
/// 每个请求的耗时按端点、状态分类和方法记录到
/// `api_request_duration_seconds` 直方图。
pub struct HttpProvider {
    config: HttpProviderConfig,
    client: Client,
    session: RwLock<Option<OauthSession>>,
    request_duration: HistogramVec,
}

impl HttpProvider {
    pub fn new(config: HttpProviderConfig, registry: &MetricRegistry) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        let request_duration = registry.get_or_create_histogram_vec(
            "api_request_duration_seconds",
            "Duration of SmartCitizen API requests in seconds",
            REQUEST_DURATION_BUCKETS,
            &["endpoint", "status", "method"],
        )?;

        Ok(Self {
            config,
            client,
            session: RwLock::new(None),
            request_duration,
        })
    }

    fn url(&self, path: &str) -> String {
        let base = format!(
            "{}/{}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.api_version
        );
        if path.is_empty() {
            base
        } else {
            format!("{}/{}", base, path.trim_start_matches('/'))
        }
    }

    fn token(&self) -> Option<String> {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    fn set_session(&self, session: Option<OauthSession>) {
        *self.session.write().unwrap_or_else(PoisonError::into_inner) = session;
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// 发送请求并记录耗时
    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let request = builder.build()?;
        let endpoint = extract_endpoint(request.url().path());
        let method = request.method().to_string();

        let start = Instant::now();
        let result = self.client.execute(request).await;
        let status = match &result {
            Ok(response) => status_category(response.status().as_u16()),
            Err(_) => "error",
        };
        self.request_duration
            .with_label_values(&[endpoint.as_str(), status, method.as_str()])
            .observe(start.elapsed().as_secs_f64());

        debug!(endpoint = %endpoint, method = %method, status = %status, "API request completed");

        let response = result?;
        if response.status() != StatusCode::OK {
            return Err(SmartCitizenError::Status {
                endpoint,
                status: response.status().as_u16(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        if !self.has_session() {
            return Err(SmartCitizenError::NoSession);
        }
        let response = self.send(self.request(Method::GET, path)).await?;
        Ok(response.json::<T>().await?)
    }

    async fn login(&self, credential: &UserCredential) -> Result<()> {
        let builder = self.client.post(self.url("sessions")).form(&[
            ("username", credential.username.as_str()),
            ("password", credential.password.as_str()),
        ]);

        let session = match self.send(builder).await {
            Ok(response) => response.json::<OauthSession>().await?,
            Err(SmartCitizenError::Status { status, .. }) => {
                return Err(SmartCitizenError::Authentication(format!(
                    "login rejected with status code {}",
                    status
                )))
            }
            Err(e) => return Err(e),
        };

        self.set_session(Some(session));
        Ok(())
    }
}

#[async_trait]
impl TelemetryProvider for HttpProvider {
    async fn authenticate(&self, credential: &UserCredential) -> Result<()> {
        if !credential.token.is_empty() {
            self.set_session(Some(OauthSession {
                access_token: credential.token.clone(),
            }));

            if let Err(e) = self.get_me().await {
                warn!(error = %e, "Token validation failed");
                self.set_session(None);
                return Err(SmartCitizenError::Authentication(format!(
                    "token rejected: {}",
                    e
                )));
            }

            info!(username = %credential.username, "Authenticated with access token");
            return Ok(());
        }

        if credential.password.is_empty() {
            return Err(SmartCitizenError::Credential(
                "either password or token must be provided".to_string(),
            ));
        }

        self.login(credential).await?;
        info!(username = %credential.username, "Authenticated with username and password");
        Ok(())
    }

    fn has_session(&self) -> bool {
        self.session
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    async fn ping(&self) -> Result<()> {
        self.send(self.request(Method::GET, "")).await?;
        Ok(())
    }

    async fn get_me(&self) -> Result<User> {
        self.get_json("me").await
    }

    async fn get_device(&self, device_id: i64) -> Result<DeviceDetail> {
        let mut device: DeviceDetail = self.get_json(&format!("devices/{}", device_id)).await?;
        device.attach_sensors();
        Ok(device)
    }
}
