//! Customs client against a mock REST server

use mockito::{Matcher, Server, ServerGuard};
use rsge_api::{ClientConfig, CustomsClient, DeviceInfo, RsgeError};
use serde_json::json;

fn signed_in(server: &mut ServerGuard) -> CustomsClient {
    let _auth = server
        .mock("POST", "/Authenticate")
        .with_status(200)
        .with_body(json!({ "DATA": { "ACCESS_TOKEN": "ctok" }, "STATUS": { "CODE": 0 } }).to_string())
        .create();

    let mut client = CustomsClient::with_config(&ClientConfig::new(&server.url()));
    client.authenticate("broker", "password", "").unwrap();
    client
}

#[test]
fn test_pin_login_can_save_device() {
    let mut server = Server::new();
    let _first = server
        .mock("POST", "/Authenticate")
        .with_status(200)
        .with_body(json!({ "DATA": { "PIN_TOKEN": "p-1" }, "STATUS": { "CODE": 0 } }).to_string())
        .create();
    let second = server
        .mock("POST", "/AuthenticatePin")
        .match_body(Matcher::PartialJson(json!({
            "PIN_TOKEN": "p-1",
            "PIN": "4321",
            "DEVICE_CODE": "office-pc",
            "SAVE_DEVICE": true
        })))
        .with_status(200)
        .with_body(json!({ "DATA": { "ACCESS_TOKEN": "ctok" }, "STATUS": { "CODE": 0 } }).to_string())
        .create();

    let mut client = CustomsClient::with_config(&ClientConfig::new(&server.url()));
    let auth = client.authenticate("broker", "password", "").unwrap();
    assert!(auth.needs_pin());

    client
        .authenticate_pin(&auth.pin_token, "4321", &DeviceInfo::new("office-pc"), true)
        .unwrap();
    assert!(client.is_authenticated());
    second.assert();
}

#[test]
fn test_declarations_in_date_range() {
    let mut server = Server::new();
    let client = signed_in(&mut server);
    let mock = server
        .mock("GET", "/GetAsycudaDeclarations")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("dateFrom".into(), "2024-01-01".into()),
            Matcher::UrlEncoded("dateTo".into(), "2024-01-31".into()),
        ]))
        .match_header("authorization", "bearer ctok")
        .with_status(200)
        .with_body(
            json!({
                "DATA": [
                    { "DECLARATION_NUMBER": "C-1001", "CUSTOMS_VALUE": "15000.50", "COUNTRY_OF_ORIGIN": "TR" },
                    { "DECLARATION_NUMBER": "C-1002", "VAT_AMOUNT": 2700 }
                ],
                "STATUS": { "CODE": 0, "MESSAGE": "" }
            })
            .to_string(),
        )
        .create();

    let declarations = client.get_declarations("2024-01-01", "2024-01-31").unwrap();

    assert_eq!(declarations.len(), 2);
    assert_eq!(declarations[0].customs_value, 15000.5);
    assert_eq!(declarations[1].vat_amount, 2700.0);
    mock.assert();
}

#[test]
fn test_non_zero_status_code_is_api_error() {
    let mut server = Server::new();
    let client = signed_in(&mut server);
    let _mock = server
        .mock("GET", "/GetAsycudaDeclarations")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({ "DATA": null, "STATUS": { "CODE": 12, "MESSAGE": "" } }).to_string())
        .create();

    let err = client.get_declarations("2024-01-01", "2024-01-31").unwrap_err();
    assert!(matches!(err, RsgeError::Api { code: Some(12), .. }));
    assert_eq!(err.message(), "Unknown error");
}

#[test]
fn test_sign_out_posts_once() {
    let mut server = Server::new();
    let mut client = signed_in(&mut server);
    let mock = server
        .mock("POST", "/SignOut")
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create();

    client.sign_out();
    client.sign_out();

    assert!(!client.is_authenticated());
    mock.assert();
}
