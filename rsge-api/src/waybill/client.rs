use chrono::NaiveDateTime;
use soap_client::{SoapClient, SoapParams, SoapReply};
use tracing::{debug, info, warn};
use xmltree::Element;

use super::enums::WayBillType;
use super::models::{
    AkcizCode, BarCode, ErrorCode, ServiceUser, TransportType, WayBill, WayBillFilter,
    WayBillListItem, WayBillSaveResult, WayBillTemplate, WayBillTypeInfo, WayBillUnit, WoodType,
};
use crate::codec::xml::{self, FromXml, ToXml};
use crate::codec::Code;
use crate::config::ClientConfig;
use crate::error::{Result, RsgeError};

/// Result code for rejected service credentials
pub const INVALID_CREDENTIALS: i64 = -100;
/// Result code for an attempt to modify another taxpayer's waybill
pub const FOREIGN_WAYBILL: i64 = -101;

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// A date argument for the waybill service
///
/// Strings are sent as given; `NaiveDateTime` values are rendered as
/// `YYYY-MM-DDTHH:MM:SS`.
pub trait ServiceDate {
    fn to_service_date(&self) -> String;
}

impl ServiceDate for str {
    fn to_service_date(&self) -> String {
        self.to_string()
    }
}

impl ServiceDate for String {
    fn to_service_date(&self) -> String {
        self.clone()
    }
}

impl ServiceDate for NaiveDateTime {
    fn to_service_date(&self) -> String {
        self.format(DATE_FORMAT).to_string()
    }
}

impl<T: ServiceDate + ?Sized> ServiceDate for &T {
    fn to_service_date(&self) -> String {
        (**self).to_service_date()
    }
}

/// Map a bare integer result code onto the error taxonomy
///
/// Non-negative codes pass. `-100` is an authentication failure, `-101` a
/// permission failure and every other negative code an API error carrying
/// the code.
pub fn check_error_code(code: i64, context: &str) -> Result<()> {
    match code {
        INVALID_CREDENTIALS => Err(RsgeError::authentication(format!(
            "Invalid service credentials. {}",
            context
        ))
        .with_code(code)),
        FOREIGN_WAYBILL => Err(RsgeError::permission(format!(
            "cannot modify another user's waybill. {}",
            context
        ))
        .with_code(code)),
        c if c < 0 => Err(RsgeError::api(format!("API error {}. {}", c, context)).with_code(c)),
        _ => Ok(()),
    }
}

/// Parse a bare integer result; empty or non-numeric text is `-1`
pub fn parse_code(text: &str) -> i64 {
    text.trim().parse().unwrap_or(-1)
}

/// Transporter-side details for a forwarded waybill
#[derive(Debug, Clone, PartialEq)]
pub struct TransporterDetails {
    pub car_number: String,
    pub driver_tin: String,
    pub check_driver_tin: i64,
    pub driver_name: String,
    pub transport_type_id: i64,
    pub transport_type_txt: String,
    pub reception_info: String,
    pub receiver_info: String,
}

impl Default for TransporterDetails {
    fn default() -> Self {
        Self {
            car_number: String::new(),
            driver_tin: String::new(),
            check_driver_tin: 1,
            driver_name: String::new(),
            transport_type_id: 1,
            transport_type_txt: String::new(),
            reception_info: String::new(),
            receiver_info: String::new(),
        }
    }
}

/// Client for the rs.ge electronic waybill SOAP service
///
/// Every call carries the service user credentials (`su`/`sp`) ahead of its
/// own parameters. The client holds one HTTP agent for its whole lifetime;
/// [`WayBillClient::close`] releases it early.
///
/// ```rust,no_run
/// use rsge_api::waybill::{GoodsItem, WayBillClient, WayBillType};
///
/// let client = WayBillClient::new("user:206322102", "secret");
/// let (un_id, _) = client.check_service_user()?;
///
/// let mut waybill = client.create_waybill(
///     WayBillType::Transportation,
///     "206322102",
///     "შპს მყიდველი",
///     "თბილისი",
///     "ბათუმი",
/// );
/// waybill.seller_un_id = un_id;
/// waybill.add_goods(GoodsItem::new("ფქვილი", 2, 500.0, 2.50, "4860001"));
///
/// let saved = client.save_waybill(&waybill)?;
/// let number = client.activate_waybill(saved.waybill_id)?;
/// # Ok::<(), rsge_api::RsgeError>(())
/// ```
pub struct WayBillClient {
    soap: SoapClient,
    su: String,
    sp: String,
}

impl std::fmt::Debug for WayBillClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WayBillClient")
            .field("url", &self.soap.url())
            .field("su", &self.su)
            .finish_non_exhaustive()
    }
}

impl WayBillClient {
    /// Client against the production endpoint
    pub fn new(service_user: &str, service_password: &str) -> Self {
        Self::with_config(service_user, service_password, &ClientConfig::waybill())
    }

    pub fn with_config(service_user: &str, service_password: &str, config: &ClientConfig) -> Self {
        Self {
            soap: SoapClient::with_timeout(&config.base_url, config.timeout),
            su: service_user.to_string(),
            sp: service_password.to_string(),
        }
    }

    pub fn url(&self) -> &str {
        self.soap.url()
    }

    /// Authenticated call: `su` and `sp` go first
    fn call(&self, method: &str, params: SoapParams) -> Result<SoapReply> {
        let params = SoapParams::new()
            .param("su", &self.su)
            .param("sp", &self.sp)
            .extend(params);
        Ok(self.soap.call(method, &params)?)
    }

    /// Call returning a bare integer code, checked against the error table
    fn call_code(&self, method: &str, params: SoapParams) -> Result<i64> {
        let code = parse_code(&self.call(method, params)?.text());
        check_error_code(code, method)?;
        Ok(code)
    }

    fn call_flag(&self, method: &str, params: SoapParams) -> Result<bool> {
        let reply = self.call(method, params)?;
        Ok(reply.text().eq_ignore_ascii_case("true"))
    }

    // Service users

    pub fn update_service_user(
        &self,
        user_name: &str,
        user_password: &str,
        ip: &str,
        name: &str,
    ) -> Result<bool> {
        self.call_flag(
            "update_service_user",
            SoapParams::new()
                .param("user_name", user_name)
                .param("user_password", user_password)
                .param("ip", ip)
                .param("name", name),
        )
    }

    /// List the service users of a taxpayer portal account
    ///
    /// Authenticates with the portal credentials instead of `su`/`sp`.
    pub fn get_service_users(&self, user_name: &str, user_password: &str) -> Result<Vec<ServiceUser>> {
        let params = SoapParams::new()
            .param("user_name", user_name)
            .param("user_password", user_password);
        let reply = self.soap.call("get_service_users", &params)?;
        Ok(xml::collect(reply.node(), "ServiceUser"))
    }

    /// Verify the service credentials
    ///
    /// Returns `(un_id, s_user_id)`.
    ///
    /// # Errors
    /// [`RsgeError::Authentication`] when both ids are zero and the service
    /// answered `false`.
    pub fn check_service_user(&self) -> Result<(i64, i64)> {
        let reply = self.call("chek_service_user", SoapParams::new())?;
        let un_id = out_int(&reply, "un_id");
        let s_user_id = out_int(&reply, "s_user_id");

        if un_id == 0 && s_user_id == 0 && reply.text().eq_ignore_ascii_case("false") {
            return Err(RsgeError::authentication("Invalid service credentials"));
        }
        debug!(un_id, s_user_id, "service user verified");
        Ok((un_id, s_user_id))
    }

    // Reference data

    pub fn get_akciz_codes(&self) -> Result<Vec<AkcizCode>> {
        self.reference("get_akciz_codes", "AKCIZ_CODE")
    }

    pub fn get_waybill_types(&self) -> Result<Vec<WayBillTypeInfo>> {
        self.reference("get_waybill_types", "WAYBILL_TYPE")
    }

    pub fn get_waybill_units(&self) -> Result<Vec<WayBillUnit>> {
        self.reference("get_waybill_units", "WAYBILL_UNIT")
    }

    pub fn get_transport_types(&self) -> Result<Vec<TransportType>> {
        self.reference("get_trans_types", "TRANSPORT_TYPE")
    }

    pub fn get_wood_types(&self) -> Result<Vec<WoodType>> {
        self.reference("get_wood_types", "WOOD_TYPES")
    }

    /// Error code table; entries are read from `ERROR_CODE` elements, or
    /// from `WAYBILL_TYPE` elements on deployments that reuse that tag
    pub fn get_error_codes(&self) -> Result<Vec<ErrorCode>> {
        let reply = self.call("get_error_codes", SoapParams::new())?;
        let codes: Vec<ErrorCode> = xml::collect(reply.node(), "ERROR_CODE");
        if codes.is_empty() {
            return Ok(xml::collect(reply.node(), "WAYBILL_TYPE"));
        }
        Ok(codes)
    }

    /// Registered name of a taxpayer, empty when unknown
    pub fn get_name_from_tin(&self, tin: &str) -> Result<String> {
        Ok(self.call("get_name_from_tin", SoapParams::new().param("tin", tin))?.text())
    }

    fn reference<T: FromXml>(&self, method: &str, item: &str) -> Result<Vec<T>> {
        let reply = self.call(method, SoapParams::new())?;
        Ok(xml::collect(reply.node(), item))
    }

    // Waybill lifecycle

    /// Build a new unsaved waybill with service defaults
    ///
    /// Nothing is sent; adjust the remaining fields, add goods and pass it to
    /// [`WayBillClient::save_waybill`].
    pub fn create_waybill(
        &self,
        waybill_type: WayBillType,
        buyer_tin: &str,
        buyer_name: &str,
        start_address: &str,
        end_address: &str,
    ) -> WayBill {
        WayBill {
            waybill_type: Code::Known(waybill_type),
            buyer_tin: buyer_tin.to_string(),
            buyer_name: buyer_name.to_string(),
            start_address: start_address.to_string(),
            end_address: end_address.to_string(),
            ..WayBill::default()
        }
    }

    /// Create (`id == 0`) or update a waybill
    ///
    /// A rejected save is reported through [`WayBillSaveResult::status`] and
    /// the per-line errors. Only the credential and ownership codes are
    /// raised as errors.
    pub fn save_waybill(&self, waybill: &WayBill) -> Result<WayBillSaveResult> {
        let body = xml::to_string(&waybill.to_xml())?;
        let reply = self.call("save_waybill", SoapParams::new().xml("waybill", body))?;
        let node = reply.node().get_child("RESULT").unwrap_or(reply.node());
        let result = WayBillSaveResult::from_xml(node);

        if matches!(result.status, INVALID_CREDENTIALS | FOREIGN_WAYBILL) {
            check_error_code(result.status, "save_waybill")?;
        }
        if result.is_success() {
            info!(waybill_id = result.waybill_id, "waybill saved");
        } else {
            warn!(status = result.status, "waybill save rejected");
        }
        Ok(result)
    }

    pub fn get_waybill(&self, waybill_id: i64) -> Result<WayBill> {
        let reply = self.call("get_waybill", SoapParams::new().param("waybill_id", waybill_id))?;
        Ok(WayBill::from_xml(waybill_node(reply.node())))
    }

    /// Seller-side list; `filter.counterparty_tin` filters by buyer
    pub fn get_waybills(&self, filter: &WayBillFilter) -> Result<Vec<WayBillListItem>> {
        self.list("get_waybills", filter.to_params("buyer_tin"))
    }

    /// Buyer-side list; `filter.counterparty_tin` filters by seller
    pub fn get_buyer_waybills(&self, filter: &WayBillFilter) -> Result<Vec<WayBillListItem>> {
        self.list("get_buyer_waybills", filter.to_params("seller_tin"))
    }

    /// Seller-side list with the buyer confirmation filter
    pub fn get_waybills_ex(&self, filter: &WayBillFilter) -> Result<Vec<WayBillListItem>> {
        let params = filter
            .to_params("buyer_tin")
            .param("is_confirmed", filter.is_confirmed);
        self.list("get_waybills_ex", params)
    }

    pub fn get_buyer_waybills_ex(&self, filter: &WayBillFilter) -> Result<Vec<WayBillListItem>> {
        let params = filter
            .to_params("seller_tin")
            .param("is_confirmed", filter.is_confirmed);
        self.list("get_buyer_waybills_ex", params)
    }

    /// Waybills changed within a last-update window (at most three days)
    pub fn get_waybills_v1(
        &self,
        last_update_date_s: impl ServiceDate,
        last_update_date_e: impl ServiceDate,
        buyer_tin: &str,
    ) -> Result<Vec<WayBillListItem>> {
        let params = SoapParams::new()
            .param("buyer_tin", buyer_tin)
            .param("last_update_date_s", last_update_date_s.to_service_date())
            .param("last_update_date_e", last_update_date_e.to_service_date());
        self.list("get_waybills_v1", params)
    }

    fn list(&self, method: &str, params: SoapParams) -> Result<Vec<WayBillListItem>> {
        let reply = self.call(method, params)?;
        let items: Vec<WayBillListItem> = xml::collect(reply.node(), "WAYBILL");
        debug!(method, count = items.len(), "waybill list received");
        Ok(items)
    }

    /// Activate a saved waybill and return its number.
    ///
    /// An empty reply still counts as success and yields `""`, which is not
    /// a waybill number; read the waybill back to learn it.
    pub fn activate_waybill(&self, waybill_id: i64) -> Result<String> {
        let reply = self.call("send_waybill", SoapParams::new().param("waybill_id", waybill_id))?;
        activation_number(reply.text(), "send_waybill")
    }

    /// Activate with a transport start date in the future
    pub fn activate_waybill_with_date(
        &self,
        waybill_id: i64,
        begin_date: impl ServiceDate,
    ) -> Result<String> {
        let params = SoapParams::new()
            .param("begin_date", begin_date.to_service_date())
            .param("waybill_id", waybill_id);
        let reply = self.call("send_waybill_vd", params)?;
        activation_number(reply.text(), "send_waybill_vd")
    }

    pub fn close_waybill(&self, waybill_id: i64) -> Result<i64> {
        self.call_code("close_waybill", SoapParams::new().param("waybill_id", waybill_id))
    }

    pub fn close_waybill_with_date(
        &self,
        waybill_id: i64,
        delivery_date: impl ServiceDate,
    ) -> Result<i64> {
        let params = SoapParams::new()
            .param("delivery_date", delivery_date.to_service_date())
            .param("waybill_id", waybill_id);
        self.call_code("close_waybill_vd", params)
    }

    /// Delete a waybill that was never activated
    pub fn delete_waybill(&self, waybill_id: i64) -> Result<i64> {
        self.call_code("del_waybill", SoapParams::new().param("waybill_id", waybill_id))
    }

    /// Cancel an active or completed waybill
    pub fn cancel_waybill(&self, waybill_id: i64) -> Result<i64> {
        self.call_code("ref_waybill", SoapParams::new().param("waybill_id", waybill_id))
    }

    pub fn confirm_waybill(&self, waybill_id: i64) -> Result<bool> {
        self.call_flag("confirm_waybill", SoapParams::new().param("waybill_id", waybill_id))
    }

    pub fn reject_waybill(&self, waybill_id: i64) -> Result<bool> {
        self.call_flag("reject_waybill", SoapParams::new().param("waybill_id", waybill_id))
    }

    // Transporter

    pub fn save_waybill_transporter(&self, waybill_id: i64, details: &TransporterDetails) -> Result<i64> {
        let params = SoapParams::new()
            .param("waybill_id", waybill_id)
            .param("car_number", &details.car_number)
            .param("driver_tin", &details.driver_tin)
            .param("chek_driver_tin", details.check_driver_tin)
            .param("driver_name", &details.driver_name)
            .param("trans_id", details.transport_type_id)
            .param("trans_txt", &details.transport_type_txt)
            .param("reception_info", &details.reception_info)
            .param("receiver_info", &details.receiver_info);
        self.call_code("save_waybill_transporter", params)
    }

    /// Activate as transporter; returns `(code, waybill_number)`
    pub fn activate_waybill_transporter(
        &self,
        waybill_id: i64,
        begin_date: impl ServiceDate,
    ) -> Result<(i64, String)> {
        let params = SoapParams::new()
            .param("waybill_id", waybill_id)
            .param("begin_date", begin_date.to_service_date());
        let reply = self.call("send_waybill_transporter", params)?;

        let code = parse_code(&xml::own_text(reply.node()));
        check_error_code(code, "send_waybill_transporter")?;
        let number = reply
            .out_param("waybill_number")
            .map(xml::own_text)
            .unwrap_or_default();
        Ok((code, number))
    }

    pub fn close_waybill_transporter(
        &self,
        waybill_id: i64,
        delivery_date: impl ServiceDate,
        reception_info: &str,
        receiver_info: &str,
    ) -> Result<i64> {
        let params = SoapParams::new()
            .param("waybill_id", waybill_id)
            .param("reception_info", reception_info)
            .param("receiver_info", receiver_info)
            .param("delivery_date", delivery_date.to_service_date());
        self.call_code("close_waybill_transporter", params)
    }

    /// Issue a tax invoice from a waybill; returns `(code, invoice_id)`
    ///
    /// Pass `invoice_id = 0` to create a new invoice.
    pub fn save_invoice(&self, waybill_id: i64, invoice_id: i64) -> Result<(i64, i64)> {
        let params = SoapParams::new()
            .param("waybill_id", waybill_id)
            .param("in_inv_id", invoice_id);
        let reply = self.call("save_invoice", params)?;

        let code = parse_code(&xml::own_text(reply.node()));
        let out_id = out_int(&reply, "out_inv_id");
        check_error_code(code, "save_invoice")?;
        Ok((code, out_id))
    }

    // Templates

    pub fn save_waybill_template(&self, name: &str, waybill: &WayBill) -> Result<i64> {
        let body = xml::to_string(&waybill.to_xml())?;
        let params = SoapParams::new().param("v_name", name).xml("waybill", body);
        self.call_code("save_waybill_tamplate", params)
    }

    pub fn get_waybill_templates(&self) -> Result<Vec<WayBillTemplate>> {
        let reply = self.call("get_waybill_tamplates", SoapParams::new())?;
        Ok(xml::walk(reply.node())
            .into_iter()
            .filter(|el| xml::int(el, "ID", 0) != 0)
            .map(WayBillTemplate::from_xml)
            .collect())
    }

    pub fn get_waybill_template(&self, template_id: i64) -> Result<WayBill> {
        let reply = self.call("get_waybill_tamplate", SoapParams::new().param("id", template_id))?;
        Ok(WayBill::from_xml(waybill_node(reply.node())))
    }

    pub fn delete_waybill_template(&self, template_id: i64) -> Result<i64> {
        self.call_code("delete_waybill_tamplate", SoapParams::new().param("id", template_id))
    }

    // Personal catalogs

    pub fn save_bar_code(&self, entry: &BarCode) -> Result<i64> {
        let params = SoapParams::new()
            .param("bar_code", &entry.bar_code)
            .param("goods_name", &entry.goods_name)
            .param("unit_id", entry.unit_id)
            .param("unit_txt", &entry.unit_txt)
            .param("a_id", entry.akciz_id);
        self.call_code("save_bar_code", params)
    }

    pub fn delete_bar_code(&self, bar_code: &str) -> Result<i64> {
        self.call_code("delete_bar_code", SoapParams::new().param("bar_code", bar_code))
    }

    /// Catalog entries matching `bar_code`; an empty string lists everything
    pub fn get_bar_codes(&self, bar_code: &str) -> Result<Vec<BarCode>> {
        let reply = self.call("get_bar_codes", SoapParams::new().param("bar_code", bar_code))?;
        Ok(xml::walk(reply.node())
            .into_iter()
            .filter(|el| !xml::text(el, "bar_code").is_empty())
            .map(BarCode::from_xml)
            .collect())
    }

    /// Register a vehicle for distribution waybills
    pub fn save_car_number(&self, car_number: &str) -> Result<i64> {
        self.call_code("save_car_numbers", SoapParams::new().param("car_number", car_number))
    }

    pub fn delete_car_number(&self, car_number: &str) -> Result<i64> {
        self.call_code("delete_car_numbers", SoapParams::new().param("car_number", car_number))
    }

    pub fn get_car_numbers(&self) -> Result<Vec<String>> {
        let reply = self.call("get_car_numbers", SoapParams::new())?;
        Ok(xml::walk(reply.node())
            .into_iter()
            .map(xml::own_text)
            .filter(|text| !text.is_empty())
            .collect())
    }

    /// Release the HTTP agent; later calls fail with a connection error
    pub fn close(&mut self) {
        self.soap.close();
    }

    pub fn is_closed(&self) -> bool {
        self.soap.is_closed()
    }
}

fn out_int(reply: &SoapReply, name: &str) -> i64 {
    reply
        .out_param(name)
        .map(xml::own_text)
        .and_then(|text| text.parse().ok())
        .unwrap_or(0)
}

fn waybill_node(node: &Element) -> &Element {
    node.get_child("WAYBILL").unwrap_or(node)
}

/// The activation reply is the waybill number, or a negative code on failure.
/// An empty reply is accepted as success and passed through as `""`.
fn activation_number(text: String, context: &str) -> Result<String> {
    if let Ok(code) = text.parse::<i64>() {
        check_error_code(code, context)?;
    }
    info!(waybill_number = %text, "waybill activated");
    Ok(text)
}
