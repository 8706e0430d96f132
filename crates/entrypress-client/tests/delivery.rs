//! HTTP-level tests for the delivery client against a mock API.

use entrypress_client::{ContentSource, DeliveryClient, EntryQuery, FetchError};
use entrypress_core::config::ContentfulConfig;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> DeliveryClient {
    let config = ContentfulConfig {
        access_token: Some("token".to_string()),
        space_id: Some("space".to_string()),
        host: Some(server.uri()),
        page_size: 2,
        ..Default::default()
    };
    DeliveryClient::new(&config).expect("client")
}

#[tokio::test]
async fn fetches_content_type_descriptor() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/spaces/space/content_types/blogPost"))
        .and(header("authorization", "Bearer token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sys": { "id": "blogPost", "type": "ContentType" },
            "name": "Blog Post",
            "displayField": "title",
            "fields": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let descriptor = client_for(&server).content_type("blogPost").await.unwrap();

    assert_eq!(descriptor.id, "blogPost");
    assert_eq!(descriptor.name, "Blog Post");
    assert_eq!(descriptor.display_field.as_deref(), Some("title"));
}

#[tokio::test]
async fn paginates_and_resolves_links() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/spaces/space/entries"))
        .and(query_param("content_type", "blogPost"))
        .and(query_param("skip", "0"))
        .and(query_param("limit", "2"))
        .and(query_param("fields.category", "news"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 3,
            "skip": 0,
            "limit": 2,
            "items": [
                { "sys": { "id": "1" }, "fields": {
                    "title": "Title C",
                    "image": { "sys": { "type": "Link", "linkType": "Asset", "id": "img" } }
                } },
                { "sys": { "id": "2" }, "fields": { "title": "Title B" } }
            ],
            "includes": {
                "Asset": [
                    { "sys": { "id": "img" }, "fields": { "file": { "url": "//images.example/wow.jpg" } } }
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/spaces/space/entries"))
        .and(query_param("skip", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 3,
            "skip": 2,
            "limit": 2,
            "items": [
                { "sys": { "id": "3" }, "fields": { "title": "Title A" } }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = EntryQuery::new("blogPost").with_filter("fields.category", "news");
    let entries = client_for(&server).entries(&query).await.unwrap();

    let titles: Vec<_> = entries
        .iter()
        .filter_map(|e| e.get("title").and_then(|v| v.as_str()))
        .collect();
    assert_eq!(titles, vec!["Title C", "Title B", "Title A"]);

    let image = serde_json::to_value(entries[0].get("image").unwrap()).unwrap();
    assert_eq!(image["fields"]["file"]["url"], "//images.example/wow.jpg");
}

#[tokio::test]
async fn surfaces_api_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/spaces/space/entries"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "sys": { "type": "Error", "id": "AccessTokenInvalid" },
            "message": "The access token you sent could not be found or is invalid."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .entries(&EntryQuery::new("blogPost"))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(401));
    assert!(err.to_string().contains("access token"));
}

#[tokio::test]
async fn rejects_malformed_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/spaces/space/content_types/blogPost"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .content_type("blogPost")
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Decode { .. }));
}
