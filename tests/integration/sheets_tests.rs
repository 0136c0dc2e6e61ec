use super::*;
use catalog_relay::integrations::SheetsClient;
use catalog_relay::integrations::sinks::SpreadsheetSink;
use catalog_relay::integrations::traits::ProductSink;
use catalog_relay::models::{MergedProduct, ProductTable};
use reqwest::Client;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const VALUES_PATH: &str = "/v4/spreadsheets/sheet123/values/Products!A1:K";
const DATA_PATH: &str = "/v4/spreadsheets/sheet123/values/Products!A2:K";

fn client(server: &MockServer) -> SheetsClient {
    SheetsClient::new(Client::new(), &server.uri(), "sheet123", "Products!A1:K", "ya29.token")
        .expect("valid base URL")
}

async fn mount_table(server: &MockServer, values: Value) {
    Mock::given(method("GET"))
        .and(path(VALUES_PATH))
        .and(header("authorization", "Bearer ya29.token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "range": "Products!A1:K",
            "majorDimension": "ROWS",
            "values": values,
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_read_identifier_column() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_table(
        &server,
        json!([["Title", "ASIN"], ["Lamp", "B0LAMP0001"], ["Mug"], ["Cable", "B0CABLE001"]]),
    )
    .await;

    let asins = client(&server).read_column("ASIN").await?;
    assert_eq!(asins, vec!["B0LAMP0001", "", "B0CABLE001"]);
    Ok(())
}

#[tokio::test]
async fn test_read_multiple_columns_with_numbers() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_table(&server, json!([["ASIN", "Stock"], ["B0LAMP0001", 12]])).await;

    let rows = client(&server).read_columns(&["Stock", "ASIN"]).await?;
    assert_eq!(rows, vec![vec!["12".to_string(), "B0LAMP0001".to_string()]]);
    Ok(())
}

#[tokio::test]
async fn test_empty_sheet_has_no_column() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(VALUES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"range": "Products!A1:K"})))
        .mount(&server)
        .await;

    let result = client(&server).read_column("ASIN").await;
    assert!(matches!(result, Err(AppError::ColumnNotFound { .. })));
    Ok(())
}

#[tokio::test]
async fn test_write_rows_updates_then_clears_leftovers() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/sheet123/values/Products!A4:K:clear"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"clearedRange": "Products!A4:K1000"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(DATA_PATH))
        .and(query_param("valueInputOption", "RAW"))
        .and(body_json(json!({
            "majorDimension": "ROWS",
            "values": [["B0LAMP0001", "Desk Lamp"], ["B0CABLE001", "Cable"]],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "updatedRange": "Products!A2:B3",
            "updatedRows": 2,
            "updatedCells": 4
        })))
        .expect(1)
        .mount(&server)
        .await;

    let rows = vec![
        vec!["B0LAMP0001".to_string(), "Desk Lamp".to_string()],
        vec!["B0CABLE001".to_string(), "Cable".to_string()],
    ];
    let cells = client(&server).write_rows(&rows).await?;
    assert_eq!(cells, 4);

    let requests = server.received_requests().await.unwrap_or_default();
    let order: Vec<String> = requests.iter().map(|r| r.method.to_string()).collect();
    assert_eq!(order, vec!["PUT", "POST"]);
    Ok(())
}

#[tokio::test]
async fn test_failed_update_keeps_existing_rows() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(DATA_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "Requested writing within range, but tried writing to column [L]"}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let rows = vec![vec!["B0LAMP0001".to_string(), "Desk Lamp".to_string()]];
    let err = client(&server).write_rows(&rows).await.unwrap_err();

    assert!(matches!(err, AppError::Transport { .. }));
    Ok(())
}

#[tokio::test]
async fn test_rows_wider_than_range_rejected_before_any_request() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let input = client(&server).with_range("Input!A1:A");
    let rows = vec![vec!["B0LAMP0001".to_string(), "Desk Lamp".to_string()]];
    let result = input.write_rows(&rows).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
    Ok(())
}

#[tokio::test]
async fn test_bare_sheet_name_range() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v4/spreadsheets/sheet123/values/MX!A2:ZZZ"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"updatedCells": 1})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/sheet123/values/MX!A3:ZZZ:clear"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let cells = client(&server)
        .with_range("MX")
        .write_rows(&[vec!["B0LAMP0001".to_string()]])
        .await?;
    assert_eq!(cells, 1);
    Ok(())
}

#[tokio::test]
async fn test_writing_no_rows_only_clears() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("{}:clear", DATA_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let sink = SpreadsheetSink::new(Box::new(client(&server)));
    let report = sink.write(&ProductTable::new(vec![Domain::Us], Vec::new())).await?;

    assert_eq!(report.rows_written, 0);
    assert_eq!(report.cells_written, Some(0));
    Ok(())
}

#[tokio::test]
async fn test_spreadsheet_sink_writes_table_rows() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/sheet123/values/Products!A3:K:clear"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(DATA_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"updatedCells": 6})))
        .expect(1)
        .mount(&server)
        .await;

    let normalizer = catalog_relay::normalizer::Normalizer::default();
    let listing = normalizer.normalize(&keepa_record("B0LAMP0001", Domain::Us, 2499))?;
    let table = ProductTable::new(
        vec![Domain::Us],
        vec![MergedProduct::new("B0LAMP0001".to_string(), vec![(Domain::Us, Some(listing))])],
    );

    let report = SpreadsheetSink::new(Box::new(client(&server))).write(&table).await?;
    assert_eq!(report.rows_written, 1);
    assert_eq!(report.cells_written, Some(6));

    let requests = server.received_requests().await.unwrap_or_default();
    let put = requests
        .iter()
        .find(|r| r.method.to_string() == "PUT")
        .expect("update request sent");
    let body: Value = serde_json::from_slice(&put.body)?;
    assert_eq!(
        body["values"][0],
        json!(["B0LAMP0001", "B0LAMP0001 title US", "Acme", "Electronics", "B0LAMP0001 description", "24.99"])
    );
    Ok(())
}

#[tokio::test]
async fn test_dedicated_output_range_gets_header() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v4/spreadsheets/sheet123/values/Products!A1:K1"))
        .and(body_json(json!({
            "majorDimension": "ROWS",
            "values": [["ASIN", "Title US", "Title MX", "Brand US", "Brand MX", "Category US", "Category MX",
                        "Description US", "Description MX", "Price US", "Price MX"]],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"updatedCells": 11})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("{}:clear", DATA_PATH)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let sink = SpreadsheetSink::with_header(Box::new(client(&server)));
    let report = sink
        .write(&ProductTable::new(vec![Domain::Us, Domain::Mx], Vec::new()))
        .await?;

    assert_eq!(report.cells_written, Some(11));
    Ok(())
}

#[tokio::test]
async fn test_update_column_rewrites_data_rows() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_table(&server, json!([["ASIN", "Price"], ["B0LAMP0001", "20.00"], ["B0CABLE001"]])).await;
    Mock::given(method("POST"))
        .and(path("/v4/spreadsheets/sheet123/values/Products!A4:K:clear"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(DATA_PATH))
        .and(body_json(json!({
            "majorDimension": "ROWS",
            "values": [["B0LAMP0001", "24.99"], ["B0CABLE001", "7.49"]],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"updatedCells": 4})))
        .expect(1)
        .mount(&server)
        .await;

    let prices = vec!["24.99".to_string(), "7.49".to_string()];
    let cells = client(&server).update_column("Price", &prices).await?;
    assert_eq!(cells, 4);
    Ok(())
}

#[tokio::test]
async fn test_status_mapping() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": {"message": "Requested entity was not found."}})))
        .mount(&server)
        .await;

    let result = client(&server).read_table().await;
    assert!(matches!(result, Err(AppError::NotFound { .. })));

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let err = client(&server).read_table().await.unwrap_err();
    assert!(err.is_transient());
    Ok(())
}
