//! Integration tests for the HTML page and the add/edit/delete forms.

mod common;

use axum::http::StatusCode;
use cashkey::services::state_codec;
use common::TestClient;
use serde_json::json;

/// Adding through the forms accumulates state in the redirect target.
#[tokio::test]
async fn test_add_items_via_forms() {
    let client = TestClient::without_sample_data();

    let s = client.add_item("incomes", "", "💼 Client", "1,000").await;
    let s = client.add_item("expenses", &s, "🏠 Rent", "400").await;
    let s = client
        .add_item_with(
            "expenses",
            &s,
            &[("name", "📱 Phone"), ("amount", "50"), ("period", "monthly")],
        )
        .await;

    let state = state_codec::decode(&s).expect("redirect carries a valid state");
    assert_eq!(state.incomes().len(), 1);
    assert_eq!(state.incomes()[0].amount, 1000);
    let expenses: Vec<(&str, i64)> = state
        .expenses()
        .iter()
        .map(|e| (e.name.as_str(), e.amount))
        .collect();
    assert_eq!(expenses, vec![("🏠 Rent", 400), ("📱 Phone", 600)]);
}

/// The VAT checkbox splits a gross income into net amount and VAT.
#[tokio::test]
async fn test_add_vat_inclusive_income() {
    let client = TestClient::without_sample_data();
    let s = client
        .add_item_with(
            "incomes",
            "",
            &[("name", "Client"), ("amount", "1200"), ("vat_included", "on")],
        )
        .await;

    let state = state_codec::decode(&s).unwrap();
    assert_eq!(state.incomes()[0].amount, 1000);
    assert_eq!(state.incomes()[0].vat_amount(), 200);
    assert_eq!(state.incomes()[0].entered_amount(), 1200);
}

#[tokio::test]
async fn test_edit_keeps_id() {
    let client = TestClient::without_sample_data();
    let s = client.add_item("incomes", "", "Client", "100").await;
    let id = state_codec::decode(&s).unwrap().incomes()[0].id.to_string();

    let (status, location) = client
        .post_form(
            &format!("/incomes/{}/update", id),
            &[("s", s.as_str()), ("name", "Big Client"), ("amount", "900")],
        )
        .await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let state = state_codec::decode(&common::fragment_from_location(&location.unwrap())).unwrap();
    assert_eq!(state.incomes().len(), 1);
    assert_eq!(state.incomes()[0].id.to_string(), id);
    assert_eq!(state.incomes()[0].name, "Big Client");
    assert_eq!(state.incomes()[0].amount, 900);
}

#[tokio::test]
async fn test_delete_item() {
    let client = TestClient::without_sample_data();
    let s = client.add_item("expenses", "", "Rent", "100").await;
    let s = client.add_item("expenses", &s, "Food", "50").await;
    let rent_id = state_codec::decode(&s).unwrap().expenses()[0].id.to_string();

    let (status, location) = client
        .post_form(&format!("/expenses/{}/delete", rent_id), &[("s", s.as_str())])
        .await;
    assert_eq!(status, StatusCode::SEE_OTHER);

    let state = state_codec::decode(&common::fragment_from_location(&location.unwrap())).unwrap();
    let names: Vec<&str> = state.expenses().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["Food"]);
}

/// A missing state starts from the sample data; an empty one stays empty.
#[tokio::test]
async fn test_missing_and_empty_states() {
    let client = TestClient::new();
    let s = client.add_item("expenses", "", "Extra", "100").await;
    let state = state_codec::decode(&s).unwrap();
    // Sample data plus the new line
    assert_eq!(state.expenses().len(), 10);

    let empty = state_codec::encode(&Default::default());
    let (_, flow) = client.get(&format!("/api/flow?s={}", empty)).await;
    assert_eq!(flow, r#"{"nodes":[],"links":[]}"#);
}

#[tokio::test]
async fn test_invalid_amount_shows_error_page() {
    let client = TestClient::without_sample_data();
    let (status, location) = client
        .post_form("/incomes", &[("s", ""), ("name", "Client"), ("amount", "free")])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(location.is_none());
}

#[tokio::test]
async fn test_unknown_item_is_not_found() {
    let client = TestClient::without_sample_data();
    let (status, _) = client
        .post_form("/incomes/missing/delete", &[("s", "")])
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

/// The page renders the state, summary and embedded graph.
#[tokio::test]
async fn test_index_page_renders_state() {
    let client = TestClient::without_sample_data();
    let s = client.add_item("incomes", "", "Client <Ltd>", "1000").await;
    let s = client.add_item("expenses", &s, "Rent", "1500").await;

    let (status, body) = client.get(&format!("/?s={}", s)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Client &lt;Ltd&gt;"));
    assert!(body.contains("Deficit"));
    assert!(body.contains(&format!("value=\"{}\"", s)));
    assert!(body.contains("id=\"flow-data\""));
    // Names inside the embedded JSON cannot close the script tag
    assert!(!body.contains("Client <Ltd>"));
}

/// Forms are wired to the JSON endpoint, which replaces the address in place.
#[tokio::test]
async fn test_page_forms_update_address_without_navigation() {
    let client = TestClient::without_sample_data();
    let s = client.add_item("incomes", "", "Client", "1000").await;
    let id = state_codec::decode(&s).unwrap().incomes()[0].id.to_string();

    let (_, body) = client.get(&format!("/?s={}", s)).await;
    assert!(body.contains("data-action=\"add\" data-side=\"income\""));
    assert!(body.contains("data-action=\"add\" data-side=\"expense\""));
    assert!(body.contains(&format!(
        "data-action=\"edit\" data-side=\"income\" data-id=\"{}\"",
        id
    )));
    assert!(body.contains(&format!(
        "data-action=\"delete\" data-side=\"income\" data-id=\"{}\"",
        id
    )));
    assert!(body.contains("fetch(\"/api/update\""));
    assert!(body.contains("history.replaceState(null, \"\", target)"));
    assert!(!body.contains("pushState"));

    // What the script sends for the edit form, and the page it swaps in
    let (status, update) = client
        .post_json(
            "/api/update",
            &json!({
                "s": s,
                "action": {
                    "type": "edit",
                    "side": "income",
                    "id": id,
                    "item": {
                        "name": "Big Client",
                        "amount": "900",
                        "period": "annual",
                        "vat_included": false,
                    },
                },
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let fragment = update["fragment"].as_str().expect("fragment");

    let (status, page) = client.get(&format!("/?s={}", fragment)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(page.contains("Big Client"));
    assert!(page.contains(&format!("href=\"/?s={}\"", fragment)));
    assert!(page.contains(&format!("name=\"s\" value=\"{}\"", fragment)));
    assert!(page.contains(&format!("data-state=\"{}\"", fragment)));
}

#[tokio::test]
async fn test_oversized_amounts_are_rejected() {
    let client = TestClient::without_sample_data();
    let (status, location) = client
        .post_form(
            "/incomes",
            &[
                ("s", ""),
                ("name", "Whale"),
                ("amount", "99999999999999999"),
                ("vat_included", "on"),
            ],
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(location.is_none());

    let (status, location) = client
        .post_form(
            "/expenses",
            &[("s", ""), ("name", "Whale"), ("amount", "100000000000000"), ("period", "monthly")],
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(location.is_none());

    let (status, body) = client
        .post_json(
            "/api/update",
            &json!({
                "action": {
                    "type": "add",
                    "side": "income",
                    "item": {"name": "Whale", "amount": "99999999999999999", "vat_included": true},
                },
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_index_page_with_sample_data() {
    let client = TestClient::new();
    let (status, body) = client.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Phone Bill"));
    assert!(body.contains("Surplus"));
}

#[tokio::test]
async fn test_unknown_route_renders_error_page() {
    let client = TestClient::new();
    let (status, body) = client.get("/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("404"));
    assert!(body.contains("Not Found"));
}
