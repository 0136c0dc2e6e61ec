use super::*;
use catalog_relay::integrations::WooCommerceClient;
use catalog_relay::integrations::sinks::StorefrontSink;
use catalog_relay::integrations::traits::ProductSink;
use catalog_relay::integrations::woocommerce::NewProduct;
use catalog_relay::models::{MergedProduct, ProductTable};
use catalog_relay::normalizer::Normalizer;
use reqwest::Client;
use wiremock::matchers::{basic_auth, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PRODUCTS_PATH: &str = "/wp-json/wc/v3/products";

fn client(server: &MockServer) -> WooCommerceClient {
    WooCommerceClient::new(Client::new(), &server.uri(), "wc/v3", "ck_test", "cs_test").expect("valid store URL")
}

fn merged(asin: &str, domains: &[Domain]) -> MergedProduct {
    let normalizer = Normalizer::default();
    let listings = [Domain::Us, Domain::Mx]
        .into_iter()
        .map(|domain| {
            let listing = domains
                .contains(&domain)
                .then(|| normalizer.normalize(&keepa_record(asin, domain, 1299)))
                .transpose()
                .expect("fixture normalizes");
            (domain, listing)
        })
        .collect();
    MergedProduct::new(asin.to_string(), listings)
}

#[tokio::test]
async fn test_create_product_posts_payload() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PRODUCTS_PATH))
        .and(basic_auth("ck_test", "cs_test"))
        .and(body_partial_json(json!({
            "name": "B0LAMP0001 title US",
            "type": "simple",
            "sku": "B0LAMP0001",
            "regular_price": "12.99",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 501, "sku": "B0LAMP0001"})))
        .expect(1)
        .mount(&server)
        .await;

    let payload = NewProduct::from_merged(&merged("B0LAMP0001", &[Domain::Us, Domain::Mx])).expect("has listing");
    let created = client(&server).create_product(&payload).await?;

    assert_eq!(created["id"], 501);
    Ok(())
}

#[tokio::test]
async fn test_list_products() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(PRODUCTS_PATH))
        .and(basic_auth("ck_test", "cs_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}, {"id": 2}])))
        .mount(&server)
        .await;

    let products = client(&server).list_products().await?;
    assert_eq!(products.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_rejected_credentials() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PRODUCTS_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "woocommerce_rest_cannot_create",
            "message": "Sorry, you are not allowed to create resources."
        })))
        .mount(&server)
        .await;

    let payload = NewProduct::from_merged(&merged("B0LAMP0001", &[Domain::Us])).expect("has listing");
    let err = client(&server).create_product(&payload).await.unwrap_err();

    assert!(matches!(err, AppError::Transport { ref service, .. } if service == "woocommerce"));
    assert!(err.to_string().contains("not allowed"));
    Ok(())
}

#[tokio::test]
async fn test_storefront_sink_skips_rows_without_listings() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PRODUCTS_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 7})))
        .expect(2)
        .mount(&server)
        .await;

    let table = ProductTable::new(
        vec![Domain::Us, Domain::Mx],
        vec![
            merged("B0LAMP0001", &[Domain::Us]),
            merged("B0GONE0001", &[]),
            // Only MX listed; the MX listing becomes the product
            merged("B0MUG00001", &[Domain::Mx]),
        ],
    );

    let sink = StorefrontSink::new(client(&server));
    let report = sink.write(&table).await?;

    assert!(!sink.is_idempotent());
    assert_eq!(report.rows_written, 2);
    assert_eq!(report.created.len(), 2);

    let requests = server.received_requests().await.unwrap_or_default();
    let last: Value = serde_json::from_slice(&requests[1].body)?;
    assert_eq!(last["name"], "B0MUG00001 title MX");
    Ok(())
}
