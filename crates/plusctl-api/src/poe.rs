// Power-over-Ethernet operations.
//
// Reads return the raw page text: the status/settings tables are rendered
// HTML whose scraping belongs to the consumer, not this crate. Writes are
// fully handled here -- sparse form encoding, model-correct endpoint
// routing, and the device-reported error check.

use serde::{Deserialize, Serialize};

use crate::auth::{ModelFamily, extract_error_message};
use crate::client::SwitchClient;
use crate::error::Error;
use crate::transport::Form;

/// PoE power negotiation mode.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
pub enum PoeMode {
    #[strum(serialize = "802.3af")]
    #[serde(rename = "802.3af")]
    Ieee8023af,
    #[strum(serialize = "802.3at")]
    #[serde(rename = "802.3at")]
    Ieee8023at,
    #[strum(serialize = "legacy")]
    #[serde(rename = "legacy")]
    Legacy,
    #[strum(serialize = "pre-802.3at")]
    #[serde(rename = "pre-802.3at")]
    Pre8023at,
}

/// Port priority under power budget pressure.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PoePriority {
    Low,
    High,
    Critical,
}

/// How the per-port power limit is determined.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PoeLimitType {
    None,
    Class,
    User,
}

/// Sparse PoE port update: only the fields that are set are transmitted.
///
/// An update with no fields set is rejected as a no-op error rather than
/// sent to the device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoePortUpdate {
    pub port_id: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<PoeMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<PoePriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_limit_type: Option<PoeLimitType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub power_limit_w: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_type: Option<String>,
}

impl PoePortUpdate {
    /// An update for `port_id` with no changes set yet.
    pub fn new(port_id: u16) -> Self {
        Self {
            port_id,
            ..Self::default()
        }
    }

    /// Whether no field is set.
    pub fn is_noop(&self) -> bool {
        self.enabled.is_none()
            && self.mode.is_none()
            && self.priority.is_none()
            && self.power_limit_type.is_none()
            && self.power_limit_w.is_none()
            && self.detection_type.is_none()
    }

    fn form(&self) -> Form {
        let mut form: Form = vec![("port".to_owned(), self.port_id.to_string())];
        if let Some(enabled) = self.enabled {
            form.push(("enabled".to_owned(), bool_field(enabled)));
        }
        if let Some(mode) = self.mode {
            form.push(("mode".to_owned(), mode.to_string()));
        }
        if let Some(priority) = self.priority {
            form.push(("priority".to_owned(), priority.to_string()));
        }
        if let Some(limit_type) = self.power_limit_type {
            form.push(("power_limit_type".to_owned(), limit_type.to_string()));
        }
        if let Some(watts) = self.power_limit_w {
            form.push(("power_limit_w".to_owned(), format!("{watts:.2}")));
        }
        if let Some(detection) = &self.detection_type {
            form.push(("detection_type".to_owned(), detection.clone()));
        }
        form
    }
}

pub(crate) fn bool_field(value: bool) -> String {
    if value { "1" } else { "0" }.to_owned()
}

fn status_endpoint(family: ModelFamily) -> &'static str {
    match family {
        ModelFamily::Session => "/getPoePortStatus.cgi",
        ModelFamily::Gambit => "/iss/specific/poePortStatus.html",
    }
}

fn config_endpoint(family: ModelFamily) -> &'static str {
    match family {
        ModelFamily::Session => "/PoEPortConfig.cgi",
        ModelFamily::Gambit => "/iss/specific/poePortConf.html",
    }
}

impl SwitchClient {
    /// Fetch the PoE status page for all ports, as raw HTML.
    pub async fn poe_status_page(&self) -> Result<String, Error> {
        self.get_page(status_endpoint(self.model().family())).await
    }

    /// Fetch the PoE settings page for all ports, as raw HTML.
    pub async fn poe_settings_page(&self) -> Result<String, Error> {
        self.get_page(config_endpoint(self.model().family())).await
    }

    /// Apply PoE updates, one request per record.
    ///
    /// Rejects an empty update list and any record with no fields set.
    /// Each response body is checked for a device-reported error.
    pub async fn update_poe_ports(&self, updates: &[PoePortUpdate]) -> Result<(), Error> {
        if updates.is_empty() {
            return Err(Error::operation("no updates provided"));
        }
        if let Some(noop) = updates.iter().find(|u| u.is_noop()) {
            return Err(Error::operation(format!(
                "update for port {} has no fields set",
                noop.port_id
            )));
        }

        let endpoint = config_endpoint(self.model().family());
        for update in updates {
            let body = self.post(endpoint, update.form()).await?;
            if let Some(message) = extract_error_message(&body) {
                return Err(Error::operation(format!(
                    "update failed for port {}: {message}",
                    update.port_id
                )));
            }
        }
        Ok(())
    }

    /// Power-cycle the given PoE ports, one request per port.
    pub async fn cycle_poe_power(&self, ports: &[u16]) -> Result<(), Error> {
        if ports.is_empty() {
            return Err(Error::operation("no ports specified for power cycle"));
        }

        let endpoint = config_endpoint(self.model().family());
        for port in ports {
            let form: Form = vec![
                ("port".to_owned(), port.to_string()),
                ("action".to_owned(), "cycle".to_owned()),
            ];
            let body = self.post(endpoint, form).await?;
            if let Some(message) = extract_error_message(&body) {
                return Err(Error::operation(format!(
                    "power cycle failed for port {port}: {message}"
                )));
            }
        }
        Ok(())
    }

    /// Enable or disable PoE delivery on one port.
    pub async fn set_poe_enabled(&self, port_id: u16, enabled: bool) -> Result<(), Error> {
        self.update_poe_ports(&[PoePortUpdate {
            enabled: Some(enabled),
            ..PoePortUpdate::new(port_id)
        }])
        .await
    }

    /// Set the PoE mode on one port.
    pub async fn set_poe_mode(&self, port_id: u16, mode: PoeMode) -> Result<(), Error> {
        self.update_poe_ports(&[PoePortUpdate {
            mode: Some(mode),
            ..PoePortUpdate::new(port_id)
        }])
        .await
    }

    /// Set the PoE priority on one port.
    pub async fn set_poe_priority(&self, port_id: u16, priority: PoePriority) -> Result<(), Error> {
        self.update_poe_ports(&[PoePortUpdate {
            priority: Some(priority),
            ..PoePortUpdate::new(port_id)
        }])
        .await
    }

    /// Set the power limit on one port.
    pub async fn set_poe_power_limit(
        &self,
        port_id: u16,
        limit_type: PoeLimitType,
        watts: f64,
    ) -> Result<(), Error> {
        self.update_poe_ports(&[PoePortUpdate {
            power_limit_type: Some(limit_type),
            power_limit_w: Some(watts),
            ..PoePortUpdate::new(port_id)
        }])
        .await
    }
}
