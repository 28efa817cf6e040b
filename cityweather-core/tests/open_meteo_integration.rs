//! Integration tests for the Open-Meteo client using wiremock.

use std::time::Duration;

use cityweather_core::{
    GeocodingProvider, Location, WeatherCondition, WeatherError, WeatherProvider,
    provider::open_meteo::OpenMeteoClient,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, timeout: Duration) -> OpenMeteoClient {
    OpenMeteoClient::new(server.uri(), server.uri(), timeout).unwrap()
}

fn forecast_body() -> serde_json::Value {
    serde_json::json!({
        "latitude": 51.5,
        "longitude": -0.12,
        "current_weather": { "temperature": 15, "windspeed": 10, "winddirection": 200, "weathercode": 3 },
        "daily": {
            "time": ["2024-06-03", "2024-06-04", "2024-06-05", "2024-06-06", "2024-06-07", "2024-06-08", "2024-06-09"],
            "temperature_2m_max": [20.0, 21.0, 22.0, 23.0, 24.0, 25.0, 26.0],
            "temperature_2m_min": [10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0],
            "weathercode": [3, 2, 1, 0, 61, 63, 95],
            "windspeed_10m_max": [12.0, 13.0, 14.0, 15.0, 16.0, 17.0, 18.0]
        }
    })
}

#[tokio::test]
async fn test_search_sends_name_and_count() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("name", "Lond"))
        .and(query_param("count", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "results": [
                { "id": 1, "name": "London", "latitude": 51.5, "longitude": -0.12, "country": "United Kingdom" },
                { "id": 2, "name": "London", "latitude": 42.98, "longitude": -81.23, "country": "Canada" },
                { "id": 3, "name": "Londonderry", "latitude": 55.0, "longitude": -7.3 },
                { "id": 4, "latitude": 1.0, "longitude": 1.0 }
            ],
            "generationtime_ms": 0.5
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let results = client(&mock_server, Duration::from_secs(5)).search("Lond", 10).await.unwrap();

    // The client passes results through; dedup happens in the search service.
    let names: Vec<_> = results.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, ["London", "London", "Londonderry"]);
    assert_eq!(results[1].latitude, Some(42.98));
}

#[tokio::test]
async fn test_search_without_results_is_malformed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "generationtime_ms": 0.2
        })))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server, Duration::from_secs(5)).search("Qqqq", 10).await.unwrap_err();
    assert!(matches!(err, WeatherError::MalformedResponse(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn test_search_server_error_is_network_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server, Duration::from_secs(5)).search("Oslo", 10).await.unwrap_err();
    assert!(err.is_network());
    assert!(err.to_string().contains("500"), "error should mention status: {err}");
}

#[tokio::test]
async fn test_forecast_request_and_shaping() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("latitude", "51.5"))
        .and(query_param("longitude", "-0.12"))
        .and(query_param("current_weather", "true"))
        .and(query_param(
            "daily",
            "temperature_2m_max,temperature_2m_min,weathercode,windspeed_10m_max",
        ))
        .and(query_param("timezone", "auto"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report =
        client(&mock_server, Duration::from_secs(5)).forecast(51.5, -0.12).await.unwrap();

    assert_eq!(report.conditions.temperature, 15.0);
    assert_eq!(report.conditions.windspeed, 10.0);
    assert_eq!(report.conditions.wind_gust, None);
    assert_eq!(report.conditions.condition, Some(WeatherCondition::Overcast));
    assert_eq!(report.forecast.len(), 5);

    let days: Vec<_> = report.forecast.days().collect();
    assert_eq!(days[0].weekday_name(), "Monday");
    assert_eq!(days[4].short_date(), "06/07");
    assert_eq!(days[4].max_temp, 24.0);
    assert_eq!(days[4].min_temp, 14.0);
    assert_eq!(days[4].condition, Some(WeatherCondition::Rain));
}

#[tokio::test]
async fn test_forecast_missing_daily_is_malformed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "current_weather": { "temperature": 15, "windspeed": 10 }
        })))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server, Duration::from_secs(5)).forecast(1.0, 2.0).await.unwrap_err();
    assert!(matches!(err, WeatherError::MalformedResponse(_)));
}

#[tokio::test]
async fn test_forecast_timeout_is_network_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(forecast_body())
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let err = client(&mock_server, Duration::from_millis(200))
        .forecast(51.5, -0.12)
        .await
        .unwrap_err();
    assert!(err.is_network());
}

#[tokio::test]
async fn test_unreachable_host_is_network_failure() {
    let client =
        OpenMeteoClient::new("http://127.0.0.1:9", "http://127.0.0.1:9", Duration::from_secs(1))
            .unwrap();

    let err = client.search("Oslo", 10).await.unwrap_err();
    assert!(err.is_network());

    let location = Location::new("Oslo", 59.9, 10.7);
    let (lat, lon) = location.coordinates().unwrap();
    assert!(client.forecast(lat, lon).await.unwrap_err().is_network());
}
