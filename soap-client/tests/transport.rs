//! HTTP-level tests for the SOAP transport against a local mock server

use mockito::{Matcher, Server};
use soap_client::{Nesting, SoapClient, SoapError, SoapParams};

fn envelope(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?><soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body>{}</soap:Body></soap:Envelope>"#,
        body
    )
}

#[test]
fn test_call_sends_soap_headers_and_parses_result() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/WayBillService.asmx")
        .match_header("content-type", "text/xml; charset=utf-8")
        .match_header("soapaction", "http://tempuri.org/get_server_time")
        .match_body(Matcher::Regex(r#"<get_server_time xmlns="http://tempuri.org/">"#.to_string()))
        .with_status(200)
        .with_header("content-type", "text/xml; charset=utf-8")
        .with_body(envelope(
            "<get_server_timeResponse xmlns=\"http://tempuri.org/\"><get_server_timeResult>2024-01-15T10:30:00</get_server_timeResult></get_server_timeResponse>",
        ))
        .create();

    let client = SoapClient::new(&format!("{}/WayBillService.asmx", server.url()));
    let reply = client.call("get_server_time", &SoapParams::new()).unwrap();

    assert_eq!(reply.nesting(), Nesting::Result);
    assert_eq!(reply.text(), "2024-01-15T10:30:00");
    mock.assert();
}

#[test]
fn test_params_are_serialized_in_order() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/")
        .match_body(Matcher::Regex(
            r"(?s)<su>user:1</su>.*<sp>p&amp;w</sp>.*<waybill_id>42</waybill_id>".to_string(),
        ))
        .with_status(200)
        .with_body(envelope(
            "<del_waybillResponse><del_waybillResult>1</del_waybillResult></del_waybillResponse>",
        ))
        .create();

    let client = SoapClient::new(&server.url());
    let params = SoapParams::new()
        .param("su", "user:1")
        .param("sp", "p&w")
        .param("waybill_id", 42);
    let reply = client.call("del_waybill", &params).unwrap();

    assert_eq!(reply.text(), "1");
    mock.assert();
}

#[test]
fn test_http_error_carries_fault_string() {
    let mut server = Server::new();
    let _mock = server
        .mock("POST", "/")
        .with_status(500)
        .with_body(envelope(
            "<soap:Fault><faultcode>soap:Server</faultcode><faultstring>Object reference not set</faultstring></soap:Fault>",
        ))
        .create();

    let client = SoapClient::new(&server.url());
    let err = client.call("get_waybill", &SoapParams::new()).unwrap_err();

    match err {
        SoapError::Http { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "Object reference not set");
        }
        other => panic!("Expected SoapError::Http, got {:?}", other),
    }
}

#[test]
fn test_http_error_without_fault() {
    let mut server = Server::new();
    let _mock = server.mock("POST", "/").with_status(503).with_body("busy").create();

    let client = SoapClient::new(&server.url());
    let err = client.call("get_waybill", &SoapParams::new()).unwrap_err();
    assert_eq!(err.status(), Some(503));
}

#[test]
fn test_fault_with_ok_status_is_an_error() {
    let mut server = Server::new();
    let _mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_body(envelope(
            "<soap:Fault><faultcode>soap:Server</faultcode><faultstring>boom</faultstring></soap:Fault>",
        ))
        .create();

    let client = SoapClient::new(&server.url());
    let err = client.call("get_waybill_units", &SoapParams::new()).unwrap_err();

    match err {
        SoapError::Fault { code, message } => {
            assert_eq!(code, "soap:Server");
            assert_eq!(message, "boom");
        }
        other => panic!("Expected SoapError::Fault, got {:?}", other),
    }
}

#[test]
fn test_closed_client_makes_no_request() {
    let mut server = Server::new();
    let mock = server.mock("POST", "/").expect(0).create();

    let mut client = SoapClient::new(&server.url());
    client.close();
    let err = client.call("get_waybill", &SoapParams::new()).unwrap_err();

    assert!(matches!(err, SoapError::Closed));
    mock.assert();
}

#[test]
fn test_connection_refused_is_network_error() {
    let client = SoapClient::new("http://127.0.0.1:1/WayBillService.asmx");
    let err = client.call("get_waybill", &SoapParams::new()).unwrap_err();
    assert!(matches!(err, SoapError::Network(_)));
}
