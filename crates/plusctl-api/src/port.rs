// Switch port (interface) operations.
//
// Same shape as the PoE module: raw page reads, fully handled sparse
// writes with model-correct routing.

use serde::{Deserialize, Serialize};

use crate::auth::{ModelFamily, extract_error_message};
use crate::client::SwitchClient;
use crate::error::Error;
use crate::poe::bool_field;
use crate::transport::Form;

/// Forced speed/duplex setting for a port. `Disable` shuts the port down.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
pub enum PortSpeed {
    #[strum(serialize = "auto")]
    #[serde(rename = "auto")]
    Auto,
    #[strum(serialize = "10M half")]
    #[serde(rename = "10M half")]
    TenHalf,
    #[strum(serialize = "10M full")]
    #[serde(rename = "10M full")]
    TenFull,
    #[strum(serialize = "100M half")]
    #[serde(rename = "100M half")]
    HundredHalf,
    #[strum(serialize = "100M full")]
    #[serde(rename = "100M full")]
    HundredFull,
    #[strum(serialize = "disable")]
    #[serde(rename = "disable")]
    Disable,
}

/// Sparse port update: only the fields that are set are transmitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortUpdate {
    pub port_id: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<PortSpeed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingress_limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub egress_limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow_control: Option<bool>,
}

impl PortUpdate {
    /// An update for `port_id` with no changes set yet.
    pub fn new(port_id: u16) -> Self {
        Self {
            port_id,
            ..Self::default()
        }
    }

    /// Whether no field is set.
    pub fn is_noop(&self) -> bool {
        self.name.is_none()
            && self.speed.is_none()
            && self.ingress_limit.is_none()
            && self.egress_limit.is_none()
            && self.flow_control.is_none()
    }

    fn form(&self) -> Form {
        let mut form: Form = vec![("port".to_owned(), self.port_id.to_string())];
        if let Some(name) = &self.name {
            form.push(("name".to_owned(), name.clone()));
        }
        if let Some(speed) = self.speed {
            form.push(("speed".to_owned(), speed.to_string()));
        }
        if let Some(limit) = &self.ingress_limit {
            form.push(("ingress_limit".to_owned(), limit.clone()));
        }
        if let Some(limit) = &self.egress_limit {
            form.push(("egress_limit".to_owned(), limit.clone()));
        }
        if let Some(flow_control) = self.flow_control {
            form.push(("flow_control".to_owned(), bool_field(flow_control)));
        }
        form
    }
}

fn settings_endpoint(family: ModelFamily) -> &'static str {
    match family {
        ModelFamily::Session => "/PortStatistics.cgi",
        ModelFamily::Gambit => "/iss/specific/interface.html",
    }
}

fn update_endpoint(family: ModelFamily) -> &'static str {
    match family {
        ModelFamily::Session => "/PortConfig.cgi",
        ModelFamily::Gambit => "/iss/specific/interface.html",
    }
}

impl SwitchClient {
    /// Fetch the port settings/statistics page, as raw HTML.
    pub async fn port_settings_page(&self) -> Result<String, Error> {
        self.get_page(settings_endpoint(self.model().family())).await
    }

    /// Apply port updates, one request per record.
    ///
    /// Rejects an empty update list and any record with no fields set.
    pub async fn update_ports(&self, updates: &[PortUpdate]) -> Result<(), Error> {
        if updates.is_empty() {
            return Err(Error::operation("no updates provided"));
        }
        if let Some(noop) = updates.iter().find(|u| u.is_noop()) {
            return Err(Error::operation(format!(
                "update for port {} has no fields set",
                noop.port_id
            )));
        }

        let endpoint = update_endpoint(self.model().family());
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

    /// Force a speed/duplex setting on one port.
    pub async fn set_port_speed(&self, port_id: u16, speed: PortSpeed) -> Result<(), Error> {
        self.update_ports(&[PortUpdate {
            speed: Some(speed),
            ..PortUpdate::new(port_id)
        }])
        .await
    }

    /// Toggle flow control on one port.
    pub async fn set_port_flow_control(&self, port_id: u16, enabled: bool) -> Result<(), Error> {
        self.update_ports(&[PortUpdate {
            flow_control: Some(enabled),
            ..PortUpdate::new(port_id)
        }])
        .await
    }

    /// Set ingress/egress rate limits on one port.
    pub async fn set_port_limits(
        &self,
        port_id: u16,
        ingress: impl Into<String>,
        egress: impl Into<String>,
    ) -> Result<(), Error> {
        self.update_ports(&[PortUpdate {
            ingress_limit: Some(ingress.into()),
            egress_limit: Some(egress.into()),
            ..PortUpdate::new(port_id)
        }])
        .await
    }

    /// Re-enable a port with auto-negotiation.
    pub async fn enable_port(&self, port_id: u16) -> Result<(), Error> {
        self.set_port_speed(port_id, PortSpeed::Auto).await
    }

    /// Administratively shut a port down.
    pub async fn disable_port(&self, port_id: u16) -> Result<(), Error> {
        self.set_port_speed(port_id, PortSpeed::Disable).await
    }
}
