mod common;

use http::StatusCode;
use serde_json::{Value, json};

use common::TestApp;

fn items(name: &str, price: f64, quantity: u32) -> Value {
    json!([{
        "produtoId": "p1",
        "nome": name,
        "preco": price,
        "quantidade": quantity,
        "totalItem": price * f64::from(quantity),
    }])
}

#[tokio::test]
async fn test_dashboard_summary_cards() {
    let app = TestApp::new().await;
    let token = app.login().await;
    app.seed_order("finalizada", 56.8, items("Pizza", 25.9, 2)).await;
    app.seed_order("finalizada", 43.9, items("Lasanha", 38.9, 1)).await;
    app.seed_order("cancelada", 20.0, items("Suco", 5.0, 3)).await;
    app.wait_finalized(2).await;

    let res = app.get("/api/sales", Some(&token)).await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    let data = res.json()["data"].clone();
    assert_eq!(data["date"], common::TODAY);
    assert_eq!(data["cards"]["total_sales"], "R$ 100,70");
    assert_eq!(data["cards"]["sales_count"], "2 vendas");
    assert_eq!(data["cards"]["best_product"], "Pizza");
    assert_eq!(data["counts"]["cancelled"], 1);
    assert_eq!(data["rows"].as_array().unwrap().len(), 2);

    let res = app
        .get("/api/sales?bucket=finalizadas&search=lasanha", Some(&token))
        .await;
    assert_eq!(res.json()["data"]["rows"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_dashboard_rejects_unknown_bucket() {
    let app = TestApp::new().await;
    let token = app.login().await;
    let res = app.get("/api/sales?bucket=entregues", Some(&token)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["message"], "Aba inválida: entregues");
}

#[tokio::test]
async fn test_export_finalized_csv() {
    let app = TestApp::new().await;
    let token = app.login().await;
    app.seed_order("finalizada", 56.8, items("Pizza", 25.9, 2)).await;
    app.wait_finalized(1).await;

    let res = app
        .get("/api/sales/export?bucket=finalizadas", Some(&token))
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(
        res.headers[http::header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    let disposition = res.headers[http::header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap();
    assert!(disposition.contains("vendas_finalizadas_2024-06-01.csv"));
    assert!(
        res.body
            .starts_with("ID Pedido;Produto;Quantidade;Valor Unitário;Total;Data;Hora;Status")
    );
    assert!(res.body.contains("Pizza"));
}

#[tokio::test]
async fn test_export_empty_bucket() {
    let app = TestApp::new().await;
    let token = app.login().await;
    let res = app
        .get("/api/sales/export?bucket=canceladas", Some(&token))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        res.json()["message"],
        "Não há dados de canceladas para exportar!"
    );
}

#[tokio::test]
async fn test_migrate_legacy_orders() {
    let app = TestApp::new().await;
    let token = app.login().await;
    app.seed_order("entregue", 10.0, items("Suco", 5.0, 2)).await;

    let res = app
        .post(
            "/api/sales/migrations/status",
            Some(&token),
            json!({ "confirmed": false }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .post(
            "/api/sales/migrations/status",
            Some(&token),
            json!({ "confirmed": true }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.body);
    assert_eq!(res.json()["data"]["migrated"], 1);
    assert_eq!(
        res.json()["message"],
        "1 pedidos foram atualizados para status 'finalizada'"
    );
    app.wait_finalized(1).await;
}
