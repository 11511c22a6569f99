use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use super::enums::InvoiceListType;
use super::models::{
    BarCode, ExciseRecord, Invoice, InvoiceAction, InvoiceAuthResponse, OrgInfo, TransactionResult,
    Unit,
};
use crate::codec::json::{self, as_flag, as_text, path, zip_rows};
use crate::codec::WireCode;
use crate::config::ClientConfig;
use crate::error::{Result, RsgeError};
use crate::rest::{AuthState, DeviceInfo, RestSession};

const DEFAULT_MAXIMUM_ROWS: u32 = 10;

/// Filters for [`InvoiceClient::list_invoices`]
///
/// Keys are the service's own (`INV_NUMBER`, `TIN_BUYER`, `OPERATION_DATE`,
/// `DECL_OPERATION_PERIOD`, ...). Date filters take `DD-MM-YYYY:DD-MM-YYYY`
/// ranges. The typed setters cover the common ones and [`InvoiceFilter::with`]
/// any other key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvoiceFilter {
    params: Map<String, Value>,
}

impl InvoiceFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    pub fn list_type(self, list_type: InvoiceListType) -> Self {
        self.with("TYPE", list_type.code())
    }

    pub fn tin_buyer(self, tin: &str) -> Self {
        self.with("TIN_BUYER", tin)
    }

    pub fn operation_date(self, range: &str) -> Self {
        self.with("OPERATION_DATE", range)
    }

    pub fn create_date(self, range: &str) -> Self {
        self.with("CREATE_DATE", range)
    }

    /// 0 returns every row
    pub fn maximum_rows(self, rows: u32) -> Self {
        self.with("MAXIMUM_ROWS", rows)
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }
}

/// Filters for [`InvoiceClient::list_excise`]
#[derive(Debug, Clone, PartialEq)]
pub struct ExciseFilter {
    pub product_name: String,
    /// `DD-MM-YYYY:DD-MM-YYYY`
    pub effect_date: String,
    pub end_date: String,
    /// 0 returns every row
    pub maximum_rows: u32,
}

impl Default for ExciseFilter {
    fn default() -> Self {
        Self {
            product_name: String::new(),
            effect_date: String::new(),
            end_date: String::new(),
            maximum_rows: DEFAULT_MAXIMUM_ROWS,
        }
    }
}

impl ExciseFilter {
    /// Only the filters that differ from the service defaults are sent
    fn to_payload(&self) -> Map<String, Value> {
        let mut payload = Map::new();
        insert_text(&mut payload, "PRODUCT_NAME", &self.product_name);
        insert_text(&mut payload, "EFFECT_DATE", &self.effect_date);
        insert_text(&mut payload, "END_DATE", &self.end_date);
        if self.maximum_rows != DEFAULT_MAXIMUM_ROWS {
            payload.insert("MAXIMUM_ROWS".to_string(), self.maximum_rows.into());
        }
        payload
    }
}

/// Filters for [`InvoiceClient::list_bar_codes`]
#[derive(Debug, Clone, PartialEq)]
pub struct BarCodeFilter {
    pub barcode: String,
    pub goods_name: String,
    pub unit_txt: String,
    pub vat_type_txt: String,
    pub unit_price: Option<f64>,
    pub maximum_rows: u32,
}

impl Default for BarCodeFilter {
    fn default() -> Self {
        Self {
            barcode: String::new(),
            goods_name: String::new(),
            unit_txt: String::new(),
            vat_type_txt: String::new(),
            unit_price: None,
            maximum_rows: DEFAULT_MAXIMUM_ROWS,
        }
    }
}

impl BarCodeFilter {
    fn to_payload(&self) -> Map<String, Value> {
        let mut payload = Map::new();
        insert_text(&mut payload, "BARCODE", &self.barcode);
        insert_text(&mut payload, "GOODS_NAME", &self.goods_name);
        insert_text(&mut payload, "UNIT_TXT", &self.unit_txt);
        insert_text(&mut payload, "VAT_TYPE_TXT", &self.vat_type_txt);
        if let Some(price) = self.unit_price {
            payload.insert("UNIT_PRICE".to_string(), json!(price));
        }
        if self.maximum_rows != DEFAULT_MAXIMUM_ROWS {
            payload.insert("MAXIMUM_ROWS".to_string(), self.maximum_rows.into());
        }
        payload
    }
}

#[derive(Serialize)]
struct InvoicePayload<'a> {
    #[serde(rename = "INVOICE")]
    invoice: &'a Invoice,
    #[serde(rename = "TransactionId")]
    transaction_id: &'a str,
}

/// Client for the eAPI invoice and declaration service
///
/// Authenticate first; every other call fails with
/// [`RsgeError::Authentication`] before touching the network until an access
/// token is held.
///
/// Saving and activating are asynchronous on the service side. Both return
/// the transaction id, which [`InvoiceClient::get_transaction_result`]
/// resolves to the invoice id once processed.
#[derive(Debug)]
pub struct InvoiceClient {
    session: RestSession,
}

impl Default for InvoiceClient {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceClient {
    pub fn new() -> Self {
        Self::with_config(&ClientConfig::invoice())
    }

    pub fn with_config(config: &ClientConfig) -> Self {
        Self {
            session: RestSession::new(config),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn auth_state(&self) -> &AuthState {
        self.session.state()
    }

    /// First (or only) authentication step
    ///
    /// When the account uses two-factor authentication the response carries
    /// a PIN token instead of an access token; check
    /// [`InvoiceAuthResponse::needs_pin`] and continue with
    /// [`InvoiceClient::authenticate_pin`]. An empty `device_code` is not
    /// sent.
    pub fn authenticate(
        &mut self,
        username: &str,
        password: &str,
        device_code: &str,
    ) -> Result<InvoiceAuthResponse> {
        let mut payload = Map::new();
        payload.insert("USERNAME".to_string(), username.into());
        payload.insert("PASSWORD".to_string(), password.into());
        insert_text(&mut payload, "DEVICE_CODE", device_code);

        let response = InvoiceAuthResponse::from_response(
            &self.session.auth_post("/Users/Authenticate", &payload)?,
        );
        self.session.apply_tokens(&response.access_token, &response.pin_token);
        Ok(response)
    }

    /// Complete two-factor authentication; empty device fields are sent as
    /// `null`
    pub fn authenticate_pin(
        &mut self,
        pin_token: &str,
        pin: &str,
        device: &DeviceInfo,
    ) -> Result<InvoiceAuthResponse> {
        let payload = json!({
            "PIN_TOKEN": pin_token,
            "PIN": pin,
            "DEVICE_CODE": non_empty(&device.device_code),
            "ADDRESS": non_empty(&device.address),
            "BROWSER": non_empty(&device.browser),
            "OPER_SYSTEM": non_empty(&device.oper_system),
        });

        let response = InvoiceAuthResponse::from_response(
            &self.session.auth_post("/Users/AuthenticatePin", &payload)?,
        );
        self.session.apply_tokens(&response.access_token, &response.pin_token);
        Ok(response)
    }

    /// Invalidate the access token; never fails
    pub fn sign_out(&mut self) {
        self.session.sign_out("/Users/SignOut");
    }

    // Organizations and reference data

    pub fn get_vat_payer_status(&self, tin: &str, vat_date: &str) -> Result<bool> {
        let mut payload = Map::new();
        payload.insert("Tin".to_string(), tin.into());
        insert_text(&mut payload, "VatDate", vat_date);

        let response = self.post("/Org/GetVatPayerStatus", &payload)?;
        Ok(as_flag(path(&response, &["DATA", "IsVatPayer"])))
    }

    pub fn get_org_info(&self, tin: &str) -> Result<OrgInfo> {
        let response = self.post("/Org/GetOrgInfoByTin", &json!({ "Tin": tin }))?;
        Ok(json::record(path(&response, &["DATA"])))
    }

    pub fn get_units(&self) -> Result<Vec<Unit>> {
        let response = self.post("/Common/GetUnits", &json!({}))?;
        Ok(json::records(path(&response, &["DATA"])))
    }

    /// Resolve the transaction id returned by a save or activation
    pub fn get_transaction_result(&self, transaction_id: &str) -> Result<TransactionResult> {
        let response = self.post(
            "/Common/GetTransactionResult",
            &json!({ "TransactionId": transaction_id }),
        )?;
        Ok(json::record(path(&response, &["DATA"])))
    }

    pub fn get_actions(&self) -> Result<Vec<InvoiceAction>> {
        let response = self.post("/Invoice/GetActions", &json!({}))?;
        Ok(json::records(path(&response, &["DATA"])))
    }

    // Invoices

    /// Fetch one invoice by id or by number; pass 0 for the unused keys
    pub fn get_invoice(
        &self,
        invoice_id: i64,
        invoice_number: i64,
        parent_invoice_id: i64,
    ) -> Result<Invoice> {
        let payload = json!({
            "InvoiceID": invoice_id,
            "InvoiceNumber": invoice_number,
            "parentInvoiceID": parent_invoice_id,
        });
        let response = self.post("/Invoice/GetInvoice", &payload)?;
        Ok(Invoice::from_json(path(&response, &["DATA", "INVOICE"])))
    }

    /// Create (`id == 0`) or update an invoice; returns the transaction id
    ///
    /// A fresh UUID v4 is used when `transaction_id` is empty.
    pub fn save_invoice(&self, invoice: &Invoice, transaction_id: &str) -> Result<String> {
        self.submit("/Invoice/SaveInvoice", invoice, transaction_id)
    }

    /// Send an invoice for registration; returns the transaction id
    pub fn activate_invoice(&self, invoice: &Invoice, transaction_id: &str) -> Result<String> {
        self.submit("/Invoice/ActivateInvoice", invoice, transaction_id)
    }

    pub fn activate_invoices(&self, invoice_ids: &[i64]) -> Result<()> {
        self.batch("/Invoice/ActivateInvoices", invoice_ids)
    }

    /// Delete a draft
    pub fn delete_invoice(&self, invoice_id: i64) -> Result<()> {
        self.single("/Invoice/DeleteInvoice", invoice_id)
    }

    /// Request cancellation of an active invoice
    pub fn cancel_invoice(&self, invoice_id: i64) -> Result<()> {
        self.single("/Invoice/CancelInvoice", invoice_id)
    }

    pub fn refuse_invoice(&self, invoice_id: i64) -> Result<()> {
        self.single("/Invoice/RefuseInvoice", invoice_id)
    }

    pub fn refuse_invoices(&self, invoice_ids: &[i64]) -> Result<()> {
        self.batch("/Invoice/RefuseInvoices", invoice_ids)
    }

    pub fn confirm_invoice(&self, invoice_id: i64) -> Result<()> {
        self.single("/Invoice/ConfirmInvoice", invoice_id)
    }

    pub fn confirm_invoices(&self, invoice_ids: &[i64]) -> Result<()> {
        self.batch("/Invoice/ConfirmInvoices", invoice_ids)
    }

    /// List invoices; rows come back in the tabular `Fields`/`Rows` shape
    pub fn list_invoices(&self, filter: &InvoiceFilter) -> Result<Vec<Invoice>> {
        let response = self.post("/Invoice/ListInvoices", filter.params())?;
        let invoices: Vec<Invoice> = zip_rows(path(&response, &["DATA", "Data"]))
            .into_iter()
            .map(|row| Invoice::from_json(&Value::Object(row)))
            .collect();
        debug!(count = invoices.len(), "invoice list received");
        Ok(invoices)
    }

    /// Invoices with their goods lines populated
    pub fn list_goods(&self, invoice_ids: &[i64]) -> Result<Vec<Invoice>> {
        let response = self.post("/Invoice/ListGoods", &json!({ "Invoices": id_list(invoice_ids) }))?;
        let invoices = match path(&response, &["DATA", "INVOICES"]) {
            Value::Array(items) => items
                .iter()
                .map(|item| Invoice::from_json(path(item, &["INVOICE"])))
                .collect(),
            _ => Vec::new(),
        };
        Ok(invoices)
    }

    pub fn list_excise(&self, filter: &ExciseFilter) -> Result<Vec<ExciseRecord>> {
        let response = self.post("/Invoice/ListExcise", &filter.to_payload())?;
        Ok(zip_rows(path(&response, &["DATA", "Data"]))
            .into_iter()
            .map(ExciseRecord::new)
            .collect())
    }

    pub fn list_bar_codes(&self, filter: &BarCodeFilter) -> Result<Vec<BarCode>> {
        let response = self.post("/Invoice/ListBarCodes", &filter.to_payload())?;
        Ok(zip_rows(path(&response, &["DATA", "Data"]))
            .into_iter()
            .map(|row| json::record(&Value::Object(row)))
            .collect())
    }

    pub fn get_bar_code(&self, barcode: &str) -> Result<BarCode> {
        let response = self.post("/Invoice/GetBarCode", &json!({ "barCode": barcode }))?;
        Ok(json::record(path(&response, &["DATA", "RESULT"])))
    }

    pub fn clear_bar_codes(&self) -> Result<()> {
        self.post("/Invoice/ClearBarCodes", &json!({}))?;
        Ok(())
    }

    // Declarations

    /// Declaration sequence number for a year, or a month when given
    pub fn get_seq_num(&self, year: i32, month: Option<u32>) -> Result<String> {
        let period = operation_period(year, month)?;
        let response = self.post("/Invoice/GetSeqNum", &json!({ "OperationPeriod": period }))?;
        Ok(as_text(path(&response, &["DATA", "SeqNum"])))
    }

    /// Bind invoices to the VAT declaration of a period
    pub fn create_decl(&self, invoice_ids: &[i64], year: i32, month: Option<u32>) -> Result<()> {
        let payload = json!({
            "Invoices": id_list(invoice_ids),
            "OperationPeriod": operation_period(year, month)?,
        });
        self.post("/Invoice/CreateDecl", &payload)?;
        info!(count = invoice_ids.len(), "invoices bound to declaration");
        Ok(())
    }

    /// Release the HTTP agent; idempotent
    pub fn close(&mut self) {
        self.session.close();
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_closed()
    }

    fn post<P: Serialize>(&self, path: &str, payload: &P) -> Result<Value> {
        self.session.require_auth()?;
        self.session.post(path, payload)
    }

    fn submit(&self, path: &str, invoice: &Invoice, transaction_id: &str) -> Result<String> {
        let transaction_id = if transaction_id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            transaction_id.to_string()
        };

        let payload = InvoicePayload {
            invoice,
            transaction_id: &transaction_id,
        };
        self.post(path, &payload)?;
        info!(%path, %transaction_id, "invoice submitted");
        Ok(transaction_id)
    }

    fn single(&self, path: &str, invoice_id: i64) -> Result<()> {
        self.post(path, &json!({ "INVOICE": { "ID": invoice_id } }))?;
        Ok(())
    }

    fn batch(&self, path: &str, invoice_ids: &[i64]) -> Result<()> {
        self.post(path, &json!({ "Invoices": id_list(invoice_ids) }))?;
        Ok(())
    }
}

/// `YYYY` or `YYYYMM`
pub fn operation_period(year: i32, month: Option<u32>) -> Result<String> {
    match month {
        None => Ok(year.to_string()),
        Some(m @ 1..=12) => Ok(format!("{}{:02}", year, m)),
        Some(m) => Err(RsgeError::validation(format!("month out of range: {}", m))),
    }
}

fn id_list(ids: &[i64]) -> Vec<Value> {
    ids.iter().map(|id| json!({ "ID": id })).collect()
}

fn insert_text(payload: &mut Map<String, Value>, key: &str, value: &str) {
    if !value.is_empty() {
        payload.insert(key.to_string(), value.into());
    }
}

fn non_empty(value: &str) -> Value {
    if value.is_empty() {
        Value::Null
    } else {
        Value::String(value.to_string())
    }
}
