//! Private SOAP client for the rs.ge waybill web service
//!
//! This crate provides a minimal SOAP 1.1 client for the ASMX endpoint behind
//! `WayBillService.asmx`. It builds the envelope, posts it over one persistent
//! `ureq` agent and digs the `<MethodResponse><MethodResult>` node out of the
//! reply. Endpoints that drop one level of nesting are tolerated: the reply
//! records which level was actually found (see [`Nesting`]).

mod error;

pub use error::SoapError;

use std::time::Duration;
use tracing::{debug, warn};
use xmltree::Element;

/// Namespace of every waybill service method, also the SOAPAction prefix
pub const NAMESPACE: &str = "http://tempuri.org/";

/// SOAP 1.1 envelope namespace
pub const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Ordered request parameters for one SOAP call.
///
/// Simple parameters are XML-escaped and written first, raw XML parameters
/// are inserted verbatim after them. Insertion order is kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SoapParams {
    simple: Vec<(String, String)>,
    raw: Vec<(String, String)>,
}

impl SoapParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a simple parameter; its text is escaped when the envelope is built
    pub fn param(mut self, name: &str, value: impl ToString) -> Self {
        self.simple.push((name.to_string(), value.to_string()));
        self
    }

    /// Append a parameter whose value is pre-built XML
    pub fn xml(mut self, name: &str, xml: impl Into<String>) -> Self {
        self.raw.push((name.to_string(), xml.into()));
        self
    }

    /// Append every parameter of `other` after the ones already present
    pub fn extend(mut self, other: SoapParams) -> Self {
        self.simple.extend(other.simple);
        self.raw.extend(other.raw);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.simple.is_empty() && self.raw.is_empty()
    }
}

/// Which wrapper level a reply was extracted from.
///
/// The chain is tried in order `Result` → `Response` → `Body`; the first
/// level that exists wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nesting {
    /// `<{method}Result>` inside `<{method}Response>`
    Result,
    /// `<{method}Response>` without a result child
    Response,
    /// Neither wrapper present, the SOAP Body itself
    Body,
}

/// Parsed reply of a SOAP call
#[derive(Debug, Clone)]
pub struct SoapReply {
    node: Element,
    response: Option<Element>,
    nesting: Nesting,
}

impl SoapReply {
    /// Best available node according to the fallback chain
    pub fn node(&self) -> &Element {
        &self.node
    }

    pub fn nesting(&self) -> Nesting {
        self.nesting
    }

    /// Trimmed text of the result node, empty when it has none
    pub fn text(&self) -> String {
        self.node
            .get_text()
            .map(|t| t.trim().to_string())
            .unwrap_or_default()
    }

    /// Look up an output parameter by name.
    ///
    /// ASMX methods with `out` arguments put them next to `<{method}Result>`
    /// inside the response wrapper, so the result node is searched first and
    /// the wrapper second.
    pub fn out_param(&self, name: &str) -> Option<&Element> {
        self.node
            .get_child(name)
            .or_else(|| self.response.as_ref().and_then(|r| r.get_child(name)))
    }
}

/// A minimal SOAP client bound to one endpoint URL
#[derive(Debug)]
pub struct SoapClient {
    url: String,
    timeout: Duration,
    agent: Option<ureq::Agent>,
}

impl SoapClient {
    /// Create a client for `url` with the default 30 second timeout
    pub fn new(url: &str) -> Self {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    /// Create a client for `url` with a fixed per-request timeout
    pub fn with_timeout(url: &str, timeout: Duration) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            timeout,
            agent: Some(ureq::AgentBuilder::new().timeout(timeout).build()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send a SOAP request and return the extracted reply
    pub fn call(&self, method: &str, params: &SoapParams) -> Result<SoapReply, SoapError> {
        let agent = self.agent.as_ref().ok_or(SoapError::Closed)?;

        let envelope = build_envelope(method, params);
        let soap_action = format!("{}{}", NAMESPACE, method);
        debug!(method, url = %self.url, "dispatching SOAP call");

        let response = agent
            .post(&self.url)
            .set("Content-Type", "text/xml; charset=utf-8")
            .set("SOAPAction", &soap_action)
            .send_string(&envelope)
            .map_err(|e| match e {
                ureq::Error::Status(status, response) => {
                    let message = response
                        .into_string()
                        .ok()
                        .and_then(|body| fault_string(&body))
                        .unwrap_or_else(|| "request rejected by server".to_string());
                    SoapError::Http { status, message }
                }
                ureq::Error::Transport(transport) => SoapError::Network(transport.to_string()),
            })?;

        let xml_text = response
            .into_string()
            .map_err(|e| SoapError::Network(e.to_string()))?;

        parse_reply(&xml_text, method)
    }

    /// Release the underlying HTTP agent. Calling it again is a no-op.
    pub fn close(&mut self) {
        if self.agent.take().is_some() {
            debug!(url = %self.url, "SOAP session closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.agent.is_none()
    }
}

/// Escape the characters that would break element text
pub fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Build the complete SOAP 1.1 envelope for `method`
pub fn build_envelope(method: &str, params: &SoapParams) -> String {
    let mut parts = vec![format!(r#"<{} xmlns="{}">"#, method, NAMESPACE)];
    for (name, value) in &params.simple {
        parts.push(format!("<{name}>{}</{name}>", escape_text(value)));
    }
    for (name, xml) in &params.raw {
        parts.push(format!("<{name}>{xml}</{name}>"));
    }
    parts.push(format!("</{}>", method));

    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
               xmlns:xsd="http://www.w3.org/2001/XMLSchema"
               xmlns:soap="{ns}">
  <soap:Body>
    {body}
  </soap:Body>
</soap:Envelope>"#,
        ns = SOAP_ENV_NS,
        body = parts.join("\n")
    )
}

/// Parse a raw response body and extract the reply for `method`
pub fn parse_reply(xml_text: &str, method: &str) -> Result<SoapReply, SoapError> {
    let xml_text = xml_text.strip_prefix('\u{feff}').unwrap_or(xml_text);
    let root = Element::parse(xml_text.as_bytes()).map_err(|e| SoapError::Parse(e.to_string()))?;

    let body = find_body(&root).ok_or(SoapError::MissingBody)?;

    if let Some(fault) = body
        .children
        .iter()
        .filter_map(|n| n.as_element())
        .next()
        .filter(|e| e.name == "Fault")
    {
        let code = child_text(fault, "faultcode").unwrap_or_default();
        let message = child_text(fault, "faultstring")
            .unwrap_or_else(|| "fault without faultstring".to_string());
        warn!(method, %code, %message, "SOAP fault in successful reply");
        return Err(SoapError::Fault { code, message });
    }

    let response_name = format!("{}Response", method);
    let Some(response) = body.get_child(response_name.as_str()) else {
        warn!(method, "missing {} wrapper, falling back to SOAP Body", response_name);
        return Ok(SoapReply {
            node: body.clone(),
            response: None,
            nesting: Nesting::Body,
        });
    };

    let result_name = format!("{}Result", method);
    match response.get_child(result_name.as_str()) {
        Some(result) => Ok(SoapReply {
            node: result.clone(),
            response: Some(response.clone()),
            nesting: Nesting::Result,
        }),
        None => {
            debug!(method, "missing {} element, using response wrapper", result_name);
            Ok(SoapReply {
                node: response.clone(),
                response: Some(response.clone()),
                nesting: Nesting::Response,
            })
        }
    }
}

fn find_body(root: &Element) -> Option<&Element> {
    find_descendant(root, &|e| {
        e.name == "Body" && e.namespace.as_deref() == Some(SOAP_ENV_NS)
    })
    .or_else(|| find_descendant(root, &|e| e.name == "Body"))
}

fn find_descendant<'a>(el: &'a Element, pred: &dyn Fn(&Element) -> bool) -> Option<&'a Element> {
    for child in el.children.iter().filter_map(|n| n.as_element()) {
        if pred(child) {
            return Some(child);
        }
        if let Some(found) = find_descendant(child, pred) {
            return Some(found);
        }
    }
    None
}

fn fault_string(body: &str) -> Option<String> {
    let body = body.strip_prefix('\u{feff}').unwrap_or(body);
    let root = Element::parse(body.as_bytes()).ok()?;
    let fault = find_descendant(&root, &|e| e.name == "Fault")?;
    child_text(fault, "faultstring")
}

fn child_text(el: &Element, name: &str) -> Option<String> {
    el.get_child(name)
        .and_then(|c| c.get_text())
        .map(|t| t.trim().to_string())
}
