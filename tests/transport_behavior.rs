//! Behavior-driven tests for retry, pagination and token refresh over real HTTP.

mod support;

use std::sync::Arc;

use atsbridge_core::{
    AtsAdapter, AtsConfig, CandidateCreate, Credentials, ErrorKind, JobStatus, ProviderId,
    ReqwestHttpClient, Transport, ZohoRecruitAdapter,
};
use serde_json::{json, Value};
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::{adapter, fast_retry, greenhouse_config, greenhouse_job, requests, zoho_config, zoho_token};

// =============================================================================
// Retry and backoff
// =============================================================================

#[tokio::test]
async fn rate_limited_twice_then_success_returns_jobs() {
    // Given: Greenhouse answers 429 twice before serving the job list
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/jobs"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/jobs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([greenhouse_job(1, "open")])))
        .mount(&server)
        .await;

    // When: jobs are listed
    let jobs = adapter(greenhouse_config(&server))
        .get_jobs(None)
        .await
        .expect("third attempt succeeds");

    // Then: the job arrives after exactly three requests
    assert_eq!(jobs.len(), 1);
    assert_eq!(requests(&server).await.len(), 3);
}

#[tokio::test]
async fn persistent_rate_limit_surfaces_after_retry_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/jobs"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
        .expect(3)
        .mount(&server)
        .await;

    let error = adapter(greenhouse_config(&server))
        .get_jobs(None)
        .await
        .expect_err("rate limit outlasts the retry budget");

    assert_eq!(error.kind(), ErrorKind::RateLimit);
    assert!(error.retryable());
    assert_eq!(error.details()["retry_after_secs"], json!(0));
}

#[tokio::test]
async fn long_retry_after_is_reported_instead_of_cut_short() {
    // Given: the vendor asks for an hour of quiet
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/jobs"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "3600"))
        .expect(1)
        .mount(&server)
        .await;

    // When: jobs are listed
    let error = adapter(greenhouse_config(&server))
        .get_jobs(None)
        .await
        .expect_err("rate limited");

    // Then: the caller gets the full hint rather than an early retry
    assert_eq!(error.kind(), ErrorKind::RateLimit);
    assert_eq!(error.details()["retry_after_secs"], json!(3600));
}

#[tokio::test]
async fn unauthorized_is_never_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/jobs"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid Basic Auth credentials"})))
        .expect(1)
        .mount(&server)
        .await;

    let error = adapter(greenhouse_config(&server))
        .get_jobs(None)
        .await
        .expect_err("unauthorized");

    assert_eq!(error.kind(), ErrorKind::Authentication);
    assert!(!error.retryable());
}

#[tokio::test]
async fn server_errors_are_retried_then_reported_as_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/jobs"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let error = adapter(greenhouse_config(&server))
        .get_jobs(None)
        .await
        .expect_err("service unavailable");

    assert_eq!(error.kind(), ErrorKind::Service);
    assert!(error.retryable());
    assert_eq!(error.details()["status"], json!(503));
}

#[tokio::test]
async fn candidate_writes_are_not_replayed_after_server_error() {
    // Given: the write endpoint fails with a 500
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/candidates"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    // When: a candidate is submitted
    let candidate = CandidateCreate::new("Ada Lovelace", "ada@example.com", "4012")
        .expect("valid candidate");
    let error = adapter(greenhouse_config(&server))
        .create_candidate(&candidate)
        .await
        .expect_err("server error");

    // Then: the write went out once and the failure is reported
    assert_eq!(error.kind(), ErrorKind::Service);
}

#[tokio::test]
async fn unreachable_vendor_is_a_connection_error() {
    let config = AtsConfig::for_provider("greenhouse")
        .with_api_key("key")
        .with_base_url("http://127.0.0.1:9/v1")
        .with_retry_policy(fast_retry())
        .without_throttling();

    let error = adapter(config).get_jobs(None).await.expect_err("nothing listens on port 9");

    assert_eq!(error.kind(), ErrorKind::Connection);
    assert!(error.retryable());
}

// =============================================================================
// Pagination
// =============================================================================

#[tokio::test]
async fn link_header_pagination_yields_every_item_in_order() {
    // Given: three pages of 100, 100 and 37 jobs chained by Link headers
    let server = MockServer::start().await;
    let page = |start: u64, len: u64| -> Value {
        Value::Array((start..start + len).map(|id| greenhouse_job(id, "open")).collect())
    };
    let link = |page: u32| format!("<{}/v1/jobs?page={page}&per_page=100>; rel=\"next\"", server.uri());

    Mock::given(method("GET"))
        .and(path("/v1/jobs"))
        .and(query_param_is_missing("page"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(1, 100)).insert_header("link", link(2).as_str()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/jobs"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(101, 100)).insert_header("link", link(3).as_str()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/jobs"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(201, 37)))
        .expect(1)
        .mount(&server)
        .await;

    // When: all jobs are fetched
    let jobs = adapter(greenhouse_config(&server))
        .get_jobs(Some(JobStatus::Open))
        .await
        .expect("all pages");

    // Then: 237 jobs in vendor order from exactly three requests
    assert_eq!(jobs.len(), 237);
    let ids = jobs.iter().map(|job| job.id.parse::<u64>().expect("numeric id")).collect::<Vec<_>>();
    assert_eq!(ids, (1..=237).collect::<Vec<_>>());
    assert_eq!(requests(&server).await.len(), 3);
}

#[tokio::test]
async fn offset_pagination_stops_after_short_page() {
    // Given: 50 records on the first page and 12 on the second
    let server = MockServer::start().await;
    let records = |start: u64, len: u64| -> Value {
        json!({
            "data": (start..start + len)
                .map(|id| json!({"id": id.to_string(), "Posting_Title": "Nurse", "Job_Opening_Status": "In-progress"}))
                .collect::<Vec<_>>()
        })
    };
    Mock::given(method("GET"))
        .and(path("/recruit/v2/Job_Openings"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(records(1, 50)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/recruit/v2/Job_Openings"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(records(51, 12)))
        .expect(1)
        .mount(&server)
        .await;

    let base_url = Url::parse(&format!("{}/recruit/v2", server.uri())).expect("mock url");
    let transport = Transport::new(
        ProviderId::ZohoRecruit,
        base_url,
        Arc::new(ReqwestHttpClient::new()),
        Credentials::Bearer(String::from("static-token")),
    )
    .with_throttle(None)
    .with_retry_policy(fast_retry());
    let adapter = ZohoRecruitAdapter::new(transport, "https://recruit.zoho.com").with_page_size(50);

    // When: jobs are listed
    let jobs = adapter.get_jobs(None).await.expect("two pages");

    // Then: no third request is issued
    assert_eq!(jobs.len(), 62);
    assert_eq!(requests(&server).await.len(), 2);
}

#[tokio::test]
async fn page_cap_aborts_a_never_ending_listing() {
    let server = MockServer::start().await;
    let self_link = format!("<{}/v1/jobs?page=2>; rel=\"next\"", server.uri());
    Mock::given(method("GET"))
        .and(path("/v1/jobs"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([greenhouse_job(1, "open")]))
                .insert_header("link", self_link.as_str()),
        )
        .expect(5)
        .mount(&server)
        .await;

    let error = adapter(greenhouse_config(&server).with_max_pages(5))
        .get_jobs(None)
        .await
        .expect_err("page cap reached");

    assert_eq!(error.kind(), ErrorKind::Service);
    assert!(!error.retryable());
}

// =============================================================================
// OAuth2 token refresh
// =============================================================================

#[tokio::test]
async fn expired_zoho_token_is_refreshed_once_and_the_call_replayed() {
    // Given: the first token is rejected and the second one accepted
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(zoho_token("token-one")))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(zoho_token("token-two")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/recruit/v2/Job_Openings"))
        .and(header("authorization", "Zoho-oauthtoken token-one"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"code": "INVALID_TOKEN", "status": "error"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/recruit/v2/Job_Openings"))
        .and(header("authorization", "Zoho-oauthtoken token-two"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "7001", "Posting_Title": "Chef", "Job_Opening_Status": "Filled"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    // When: jobs are listed
    let jobs = adapter(zoho_config(&server)).get_jobs(None).await.expect("replayed call");

    // Then: two token requests and two data requests were made
    assert_eq!(jobs[0].status, JobStatus::Closed);
    let token_calls = requests(&server)
        .await
        .iter()
        .filter(|request| request.url.path() == "/oauth/v2/token")
        .count();
    assert_eq!(token_calls, 2);
}

#[tokio::test]
async fn concurrent_calls_share_one_token_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(zoho_token("shared-token")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/recruit/v2/Job_Openings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(4)
        .mount(&server)
        .await;

    let adapter = adapter(zoho_config(&server));
    let calls = (0..4).map(|_| adapter.get_jobs(None));
    let results = futures::future::join_all(calls).await;

    assert!(results.iter().all(Result::is_ok));
}
