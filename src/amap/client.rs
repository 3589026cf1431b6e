//! Two-stage AMap lookup: district resolution, then live weather.

use super::error::AmapError;
use super::transport::{AmapTransport, HttpTransport};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// District-lookup endpoint (name → adcode).
pub const DISTRICT_PATH: &str = "/v3/config/district";

/// Live-weather endpoint (adcode → weather record).
pub const WEATHER_PATH: &str = "/v3/weather/weatherInfo";

const STATUS_OK: &str = "1";

/// Output of the resolution stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoResolution {
    pub code: String,
    pub name: String,
}

/// One live-weather record as returned by AMap. Absent fields decode as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherLive {
    pub province: String,
    pub city: String,
    pub adcode: String,
    pub weather: String,
    pub temperature: String,
    pub winddirection: String,
    pub windpower: String,
    pub humidity: String,
    pub reporttime: String,
    pub temperature_float: String,
    pub humidity_float: String,
}

// -- Wire types ---------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct DistrictResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    info: String,
    #[serde(default)]
    districts: Vec<District>,
}

#[derive(Debug, Deserialize)]
struct District {
    adcode: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    info: String,
    #[serde(default)]
    lives: Vec<WeatherLive>,
}

/// AMap API client.
#[derive(Clone)]
pub struct AmapClient {
    key: String,
    transport: Arc<dyn AmapTransport>,
}

impl std::fmt::Debug for AmapClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AmapClient").finish_non_exhaustive()
    }
}

impl AmapClient {
    /// Create a client talking HTTP to `base_url`, each request bounded by `timeout`.
    pub fn new(base_url: &str, key: &str, timeout: Duration) -> Result<Self> {
        let transport = HttpTransport::new(base_url, timeout)?;
        Ok(Self::with_transport(key, Arc::new(transport)))
    }

    pub fn with_transport(key: &str, transport: Arc<dyn AmapTransport>) -> Self {
        Self {
            key: key.to_string(),
            transport,
        }
    }

    /// Resolve a free-text place name to its district code and canonical name.
    pub async fn resolve(&self, place: &str) -> Result<GeoResolution, AmapError> {
        let body = self
            .transport
            .get(
                DISTRICT_PATH,
                &[("key", self.key.as_str()), ("keywords", place), ("subdistrict", "0")],
            )
            .await?;
        let resp: DistrictResponse = decode(DISTRICT_PATH, body)?;

        if resp.status != STATUS_OK {
            return Err(AmapError::ResolutionFailed {
                place: place.to_string(),
                info: resp.info,
            });
        }

        let district = resp
            .districts
            .into_iter()
            .next()
            .ok_or_else(|| AmapError::ResolutionFailed {
                place: place.to_string(),
                info: "no matching district".into(),
            })?;

        debug!("Resolved '{}' to {} ({})", place, district.name, district.adcode);
        Ok(GeoResolution {
            code: district.adcode,
            name: district.name,
        })
    }

    /// Fetch the live weather record for a resolved district code.
    pub async fn fetch(&self, code: &str) -> Result<WeatherLive, AmapError> {
        let body = self
            .transport
            .get(
                WEATHER_PATH,
                &[("key", self.key.as_str()), ("city", code), ("extensions", "base")],
            )
            .await?;
        let resp: WeatherResponse = decode(WEATHER_PATH, body)?;

        if resp.status != STATUS_OK {
            return Err(AmapError::DataUnavailable {
                code: code.to_string(),
                info: resp.info,
            });
        }

        resp.lives
            .into_iter()
            .next()
            .ok_or_else(|| AmapError::DataUnavailable {
                code: code.to_string(),
                info: "empty result list".into(),
            })
    }

    /// Resolve then fetch. Stage 2 is never attempted if resolution failed.
    pub async fn weather(&self, place: &str) -> Result<WeatherLive, AmapError> {
        let geo = self.resolve(place).await?;
        let live = self.fetch(&geo.code).await?;
        info!("Weather for {} ({}): {}", geo.name, geo.code, live.weather);
        Ok(live)
    }
}

fn decode<T: serde::de::DeserializeOwned>(endpoint: &str, body: Value) -> Result<T, AmapError> {
    serde_json::from_value(body).map_err(|e| AmapError::UnexpectedResponse {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Canned-response transport that counts calls per endpoint.
    #[derive(Default)]
    pub(crate) struct StubTransport {
        pub district: Mutex<Option<Result<Value, AmapError>>>,
        pub weather: Mutex<Option<Result<Value, AmapError>>>,
        pub district_calls: AtomicUsize,
        pub weather_calls: AtomicUsize,
        pub queries: Mutex<Vec<Vec<(String, String)>>>,
    }

    impl StubTransport {
        pub(crate) fn new(district: Result<Value, AmapError>, weather: Result<Value, AmapError>) -> Self {
            Self {
                district: Mutex::new(Some(district)),
                weather: Mutex::new(Some(weather)),
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl AmapTransport for StubTransport {
        async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, AmapError> {
            self.queries.lock().unwrap().push(
                query
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            );
            let slot = match path {
                DISTRICT_PATH => {
                    self.district_calls.fetch_add(1, Ordering::SeqCst);
                    &self.district
                }
                WEATHER_PATH => {
                    self.weather_calls.fetch_add(1, Ordering::SeqCst);
                    &self.weather
                }
                other => panic!("unexpected path {}", other),
            };
            slot.lock().unwrap().clone().expect("no canned response")
        }
    }

    pub(crate) fn beijing_district() -> Value {
        json!({
            "status": "1",
            "info": "OK",
            "districts": [{"adcode": "110000", "name": "北京市", "level": "province"}]
        })
    }

    pub(crate) fn beijing_weather() -> Value {
        json!({
            "status": "1",
            "info": "OK",
            "lives": [{
                "province": "北京",
                "city": "北京市",
                "adcode": "110000",
                "weather": "晴",
                "temperature": "23",
                "winddirection": "西南",
                "windpower": "≤3",
                "humidity": "40",
                "reporttime": "2025-05-01 14:00:00",
                "temperature_float": "23.0",
                "humidity_float": "40.0"
            }]
        })
    }

    fn client(stub: &Arc<StubTransport>) -> AmapClient {
        AmapClient::with_transport("test-key", stub.clone())
    }

    #[tokio::test]
    async fn weather_runs_both_stages() {
        let stub = Arc::new(StubTransport::new(Ok(beijing_district()), Ok(beijing_weather())));
        let live = client(&stub).weather("北京").await.unwrap();
        assert_eq!(live.city, "北京市");
        assert_eq!(live.temperature, "23");
        assert_eq!(stub.district_calls.load(Ordering::SeqCst), 1);
        assert_eq!(stub.weather_calls.load(Ordering::SeqCst), 1);

        let queries = stub.queries.lock().unwrap().clone();
        assert!(queries[0].contains(&("keywords".into(), "北京".into())));
        assert!(queries[0].contains(&("subdistrict".into(), "0".into())));
        assert!(queries[1].contains(&("city".into(), "110000".into())));
        assert!(queries[1].contains(&("extensions".into(), "base".into())));
        assert!(queries[1].contains(&("key".into(), "test-key".into())));
    }

    #[tokio::test]
    async fn resolution_status_zero_skips_stage_two() {
        let stub = Arc::new(StubTransport::new(
            Ok(json!({"status": "0", "info": "INVALID_USER_KEY", "infocode": "10001"})),
            Ok(beijing_weather()),
        ));
        let err = client(&stub).weather("北京").await.unwrap_err();
        assert!(matches!(err, AmapError::ResolutionFailed { ref info, .. } if info == "INVALID_USER_KEY"));
        assert!(!err.is_retryable());
        assert_eq!(stub.weather_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_district_list_is_resolution_failure() {
        let stub = Arc::new(StubTransport::new(
            Ok(json!({"status": "1", "info": "OK", "districts": []})),
            Ok(beijing_weather()),
        ));
        let err = client(&stub).weather("atlantis").await.unwrap_err();
        assert!(matches!(err, AmapError::ResolutionFailed { .. }));
        assert_eq!(stub.weather_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn weather_status_zero_is_data_unavailable() {
        let stub = Arc::new(StubTransport::new(
            Ok(beijing_district()),
            Ok(json!({"status": "0", "info": "DAILY_QUERY_OVER_LIMIT"})),
        ));
        let err = client(&stub).weather("北京").await.unwrap_err();
        assert_eq!(
            err,
            AmapError::DataUnavailable {
                code: "110000".into(),
                info: "DAILY_QUERY_OVER_LIMIT".into()
            }
        );
    }

    #[tokio::test]
    async fn transport_failure_is_kept_distinct() {
        let stub = Arc::new(StubTransport::new(
            Err(AmapError::Transport {
                endpoint: DISTRICT_PATH.into(),
                message: "timed out after 10s".into(),
            }),
            Ok(beijing_weather()),
        ));
        let err = client(&stub).weather("北京").await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(stub.weather_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn wrong_shape_is_not_retryable() {
        let stub = Arc::new(StubTransport::new(
            Ok(json!({"status": "1", "info": "OK", "districts": "北京"})),
            Ok(beijing_weather()),
        ));
        let err = client(&stub).weather("北京").await.unwrap_err();
        assert!(matches!(err, AmapError::UnexpectedResponse { ref endpoint, .. } if endpoint == DISTRICT_PATH));
        assert!(!err.is_retryable());
        assert_eq!(err.kind(), crate::types::FailureKind::TransportFailure);
        assert_eq!(stub.weather_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_weather_fields_decode_empty() {
        let stub = Arc::new(StubTransport::new(
            Ok(beijing_district()),
            Ok(json!({"status": "1", "lives": [{"city": "北京市"}]})),
        ));
        let live = client(&stub).fetch("110000").await.unwrap();
        assert_eq!(live.city, "北京市");
        assert_eq!(live.humidity, "");
    }
}
