//! Invoice client against a mock eAPI server

use mockito::{Matcher, Server, ServerGuard};
use rsge_api::invoice::{Invoice, InvoiceCategory, InvoiceFilter, InvoiceListType};
use rsge_api::{AuthState, ClientConfig, DeviceInfo, InvoiceClient, RsgeError};
use serde_json::json;

fn client(server: &ServerGuard) -> InvoiceClient {
    InvoiceClient::with_config(&ClientConfig::new(&server.url()))
}

/// Client already holding access token `tok`
fn signed_in(server: &mut ServerGuard) -> InvoiceClient {
    let _auth = server
        .mock("POST", "/Users/Authenticate")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "DATA": { "ACCESS_TOKEN": "tok", "EXPIRES_IN": 3600 },
                "STATUS": { "ID": 0, "TEXT": "OK" }
            })
            .to_string(),
        )
        .create();

    let mut client = client(server);
    client.authenticate("user", "password", "").unwrap();
    client
}

#[test]
fn test_single_factor_login() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/Users/Authenticate")
        .match_header("content-type", "application/json")
        .match_body(Matcher::Json(json!({ "USERNAME": "user", "PASSWORD": "password" })))
        .with_status(200)
        .with_body(json!({ "DATA": { "ACCESS_TOKEN": "tok" }, "STATUS": { "ID": 0 } }).to_string())
        .create();

    let mut client = client(&server);
    let auth = client.authenticate("user", "password", "").unwrap();

    assert!(!auth.needs_pin());
    assert!(client.is_authenticated());
    mock.assert();
}

#[test]
fn test_two_factor_login() {
    let mut server = Server::new();
    let first = server
        .mock("POST", "/Users/Authenticate")
        .match_body(Matcher::PartialJson(json!({ "DEVICE_CODE": "laptop-1" })))
        .with_status(200)
        .with_body(
            json!({
                "DATA": { "PIN_TOKEN": "pin-tok", "MASKED_MOBILE": "5*****12" },
                "STATUS": { "ID": 0 }
            })
            .to_string(),
        )
        .create();
    let second = server
        .mock("POST", "/Users/AuthenticatePin")
        .match_body(Matcher::Json(json!({
            "PIN_TOKEN": "pin-tok",
            "PIN": "1234",
            "DEVICE_CODE": "laptop-1",
            "ADDRESS": null,
            "BROWSER": null,
            "OPER_SYSTEM": null
        })))
        .with_status(200)
        .with_body(json!({ "DATA": { "ACCESS_TOKEN": "tok" }, "STATUS": { "ID": 0 } }).to_string())
        .create();

    let mut client = client(&server);
    let auth = client.authenticate("user", "password", "laptop-1").unwrap();
    assert!(auth.needs_pin());
    assert_eq!(auth.masked_mobile, "5*****12");
    assert!(matches!(client.auth_state(), AuthState::PinPending { .. }));
    assert!(!client.is_authenticated());

    client
        .authenticate_pin(&auth.pin_token, "1234", &DeviceInfo::new("laptop-1"))
        .unwrap();
    assert!(client.is_authenticated());

    first.assert();
    second.assert();
}

#[test]
fn test_rejected_login_is_authentication_error() {
    let mut server = Server::new();
    let _mock = server
        .mock("POST", "/Users/Authenticate")
        .with_status(200)
        .with_body(json!({ "DATA": null, "STATUS": { "ID": -1, "TEXT": "Invalid username" } }).to_string())
        .create();

    let mut client = client(&server);
    let err = client.authenticate("user", "wrong", "").unwrap_err();

    assert!(matches!(err, RsgeError::Authentication { code: Some(-1), .. }));
    assert_eq!(err.message(), "Invalid username");
    assert_eq!(client.auth_state(), &AuthState::Anonymous);
}

#[test]
fn test_guarded_calls_never_reach_the_network() {
    let mut server = Server::new();
    let mock = server.mock("POST", Matcher::Any).expect(0).create();

    let client = client(&server);
    let err = client.get_units().unwrap_err();

    assert!(matches!(err, RsgeError::Authentication { .. }));
    assert!(client.delete_invoice(7).is_err());
    mock.assert();
}

#[test]
fn test_bearer_token_is_sent() {
    let mut server = Server::new();
    let client = signed_in(&mut server);
    let mock = server
        .mock("POST", "/Common/GetUnits")
        .match_header("authorization", "bearer tok")
        .with_status(200)
        .with_body(
            json!({
                "DATA": [{ "value": 1, "label": "ცალი" }, { "value": "2", "label": "კგ" }],
                "STATUS": { "ID": 0 }
            })
            .to_string(),
        )
        .create();

    let units = client.get_units().unwrap();

    assert_eq!(units.len(), 2);
    assert_eq!(units[1].value, "2");
    mock.assert();
}

#[test]
fn test_expired_token_is_authentication_error() {
    let mut server = Server::new();
    let client = signed_in(&mut server);
    let _mock = server.mock("POST", "/Invoice/GetActions").with_status(401).create();

    let err = client.get_actions().unwrap_err();
    assert!(matches!(err, RsgeError::Authentication { code: Some(401), .. }));
}

#[test]
fn test_server_error_carries_remote_text() {
    let mut server = Server::new();
    let client = signed_in(&mut server);
    let _mock = server
        .mock("POST", "/Invoice/GetActions")
        .with_status(500)
        .with_body(json!({ "STATUS": { "ID": -500, "TEXT": "Service unavailable" } }).to_string())
        .create();

    let err = client.get_actions().unwrap_err();
    assert!(matches!(err, RsgeError::Connection { code: Some(500), .. }));
    assert_eq!(err.message(), "Service unavailable");
}

#[test]
fn test_negative_status_is_api_error() {
    let mut server = Server::new();
    let client = signed_in(&mut server);
    let _mock = server
        .mock("POST", "/Invoice/DeleteInvoice")
        .match_body(Matcher::Json(json!({ "INVOICE": { "ID": 7 } })))
        .with_status(200)
        .with_body(json!({ "STATUS": { "ID": -3012, "TEXT": "Invoice is active" } }).to_string())
        .create();

    let err = client.delete_invoice(7).unwrap_err();
    assert!(matches!(err, RsgeError::Api { code: Some(-3012), .. }));
}

#[test]
fn test_save_then_resolve_transaction() {
    let mut server = Server::new();
    let client = signed_in(&mut server);

    let save = server
        .mock("POST", "/Invoice/SaveInvoice")
        .match_body(Matcher::PartialJson(json!({
            "INVOICE": { "INV_CATEGORY": 1, "TIN_BUYER": "206322102", "FOREIGN_BUYER": "false" }
        })))
        .with_status(200)
        .with_body(json!({ "STATUS": { "ID": 0 } }).to_string())
        .create();

    let mut invoice = Invoice {
        inv_category: InvoiceCategory::GoodsService.into(),
        tin_buyer: "206322102".to_string(),
        ..Invoice::default()
    };
    invoice.add_goods("მაცივარი", 1.0, 1200.0);

    let transaction_id = client.save_invoice(&invoice, "").unwrap();
    assert_eq!(transaction_id.len(), 36);
    save.assert();

    let resolve = server
        .mock("POST", "/Common/GetTransactionResult")
        .match_body(Matcher::Json(json!({ "TransactionId": transaction_id })))
        .with_status(200)
        .with_body(json!({ "DATA": { "INVOICE_ID": 123456 }, "STATUS": { "ID": 0 } }).to_string())
        .create();

    let result = client.get_transaction_result(&transaction_id).unwrap();
    assert_eq!(result.invoice_id, 123456);
    resolve.assert();
}

#[test]
fn test_caller_transaction_id_is_kept() {
    let mut server = Server::new();
    let client = signed_in(&mut server);
    let _mock = server
        .mock("POST", "/Invoice/ActivateInvoice")
        .match_body(Matcher::PartialJson(json!({ "TransactionId": "tx-42" })))
        .with_status(200)
        .with_body(json!({ "STATUS": { "ID": 0 } }).to_string())
        .create();

    let id = client.activate_invoice(&Invoice::default(), "tx-42").unwrap();
    assert_eq!(id, "tx-42");
}

#[test]
fn test_list_invoices_zips_tabular_rows() {
    let mut server = Server::new();
    let client = signed_in(&mut server);
    let mock = server
        .mock("POST", "/Invoice/ListInvoices")
        .match_body(Matcher::PartialJson(json!({ "TYPE": 1, "TIN_BUYER": "206322102" })))
        .with_status(200)
        .with_body(
            json!({
                "DATA": {
                    "Data": {
                        "Fields": ["ID", "INV_NUMBER", "AMOUNT_FULL", "INV_CATEGORY"],
                        "Rows": [[11, "ეა-11", "1200.00", 1], [12, "ეა-12", 99.5, 42]]
                    }
                },
                "STATUS": { "ID": 0 }
            })
            .to_string(),
        )
        .create();

    let filter = InvoiceFilter::new()
        .list_type(InvoiceListType::SellerDocs)
        .tin_buyer("206322102");
    let invoices = client.list_invoices(&filter).unwrap();

    assert_eq!(invoices.len(), 2);
    assert_eq!(invoices[0].id, 11);
    assert_eq!(invoices[0].amount_full, 1200.0);
    assert_eq!(invoices[0].inv_category.known(), Some(InvoiceCategory::GoodsService));
    assert_eq!(invoices[1].inv_category.to_wire(), 42);
    mock.assert();
}

#[test]
fn test_declaration_period() {
    let mut server = Server::new();
    let client = signed_in(&mut server);
    let mock = server
        .mock("POST", "/Invoice/GetSeqNum")
        .match_body(Matcher::Json(json!({ "OperationPeriod": "202403" })))
        .with_status(200)
        .with_body(json!({ "DATA": { "SeqNum": "00017" }, "STATUS": { "ID": 0 } }).to_string())
        .create();

    assert_eq!(client.get_seq_num(2024, Some(3)).unwrap(), "00017");
    assert!(matches!(
        client.create_decl(&[11], 2024, Some(13)),
        Err(RsgeError::Validation { .. })
    ));
    mock.assert();
}

#[test]
fn test_sign_out_is_idempotent() {
    let mut server = Server::new();
    let mut client = signed_in(&mut server);
    let mock = server
        .mock("POST", "/Users/SignOut")
        .match_header("authorization", "bearer tok")
        .with_status(200)
        .with_body(json!({ "STATUS": { "ID": 0 } }).to_string())
        .expect(1)
        .create();

    client.sign_out();
    client.sign_out();

    assert!(!client.is_authenticated());
    mock.assert();
}

#[test]
fn test_sign_out_clears_state_when_server_fails() {
    let mut server = Server::new();
    let mut client = signed_in(&mut server);
    let _mock = server.mock("POST", "/Users/SignOut").with_status(500).create();

    client.sign_out();
    assert_eq!(client.auth_state(), &AuthState::Anonymous);
}
