//! `HttpSectionFetcher` against a local storefront stand-in.

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use qrshop_facets::{FacetError, HttpSectionFetcher, SectionFetcher};

#[tokio::test]
async fn fetches_section_markup_relative_to_origin() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/collections/all"))
        .and(query_param("section_id", "grid"))
        .and(query_param("filter.v.color", "red"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<div id=\"ProductGridContainer\">x</div>"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = HttpSectionFetcher::new(&format!("{}/", server.uri()), 5).unwrap();
    let body = fetcher
        .fetch("/collections/all?section_id=grid&filter.v.color=red")
        .await
        .unwrap();

    assert_eq!(body, "<div id=\"ProductGridContainer\">x</div>");
}

#[tokio::test]
async fn non_success_status_is_reported_with_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let fetcher = HttpSectionFetcher::new(&server.uri(), 5).unwrap();
    let err = fetcher
        .fetch("/collections/all?section_id=grid&")
        .await
        .unwrap_err();

    match err {
        FacetError::UnexpectedStatus { status, url } => {
            assert_eq!(status, 500);
            assert!(url.ends_with("/collections/all?section_id=grid&"), "{url}");
        }
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn not_found_is_not_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = HttpSectionFetcher::new(&server.uri(), 5).unwrap();
    let err = fetcher.fetch("/missing?section_id=grid&").await.unwrap_err();

    assert!(!err.is_retryable());
}
