use crate::cert::Certificate;
use crate::config::settings::Settings;
use crate::config::{ConfigError, InvalidParameterValueSnafu, MalformedSettingSnafu};
use chrono::Duration;
use std::sync::Arc;

/// Order in which revocation sources are consulted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RevocationMode {
    #[default]
    PreferOcsp,
    PreferCrls,
    OnlyCrls,
}

#[derive(Debug, Clone)]
pub struct RevocationConfig {
    pub mode: RevocationMode,
    /// Consult only the preferred source.
    pub no_fallback: bool,
    /// Accept a certificate whose status could not be determined because
    /// every source was unreachable.
    pub soft_fail: bool,
    /// Check the target only, not the intermediates.
    pub only_end_entity: bool,
    pub ocsp_enabled: bool,
    pub crldp_enabled: bool,
    /// Responder used instead of the certificate's AIA.
    pub ocsp_responder_url: Option<String>,
    /// Certificate the configured responder signs with.
    pub ocsp_responder_cert: Option<Arc<Certificate>>,
    pub ocsp_nonce: bool,
    pub max_clock_skew: Duration,
}

impl Default for RevocationConfig {
    fn default() -> Self {
        Self {
            mode: RevocationMode::PreferOcsp,
            no_fallback: false,
            soft_fail: false,
            only_end_entity: false,
            ocsp_enabled: true,
            crldp_enabled: true,
            ocsp_responder_url: None,
            ocsp_responder_cert: None,
            ocsp_nonce: false,
            max_clock_skew: Duration::minutes(15),
        }
    }
}

impl RevocationConfig {
    pub fn from_settings(settings: &dyn Settings) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(mode) = settings.get_string("revocation_mode") {
            config.mode = match mode.to_uppercase().as_str() {
                "PREFER_OCSP" => RevocationMode::PreferOcsp,
                "PREFER_CRLS" => RevocationMode::PreferCrls,
                "ONLY_CRLS" => RevocationMode::OnlyCrls,
                _ => {
                    return InvalidParameterValueSnafu {
                        parameter: "revocation_mode",
                        value: mode,
                        explanation: "Allowed values are PREFER_OCSP, PREFER_CRLS and ONLY_CRLS",
                    }
                    .fail();
                }
            };
        }
        let flags: [(&str, &mut bool); 6] = [
            ("revocation_no_fallback", &mut config.no_fallback),
            ("revocation_soft_fail", &mut config.soft_fail),
            ("revocation_only_end_entity", &mut config.only_end_entity),
            ("ocsp_enabled", &mut config.ocsp_enabled),
            ("crldp_enabled", &mut config.crldp_enabled),
            ("ocsp_nonce", &mut config.ocsp_nonce),
        ];
        for (key, flag) in flags {
            if let Some(value) = settings.get_bool(key) {
                *flag = value;
            }
        }
        if let Some(url) = settings.get_string("ocsp_responder_url") {
            if url::Url::parse(&url).is_err() {
                return InvalidParameterValueSnafu {
                    parameter: "ocsp_responder_url",
                    value: url,
                    explanation: "Not a valid URL",
                }
                .fail();
            }
            config.ocsp_responder_url = Some(url);
        }
        if let Some(der) = settings.get_bytes("ocsp_responder_cert") {
            let cert = Certificate::from_der(&der).map_err(|e| {
                MalformedSettingSnafu {
                    parameter: "ocsp_responder_cert",
                    message: e.to_string(),
                }
                .build()
            })?;
            config.ocsp_responder_cert = Some(Arc::new(cert));
        }
        if let Some(secs) = settings.get_int("revocation_max_clock_skew_secs") {
            if secs < 0 {
                return InvalidParameterValueSnafu {
                    parameter: "revocation_max_clock_skew_secs",
                    value: secs.to_string(),
                    explanation: "Clock skew cannot be negative",
                }
                .fail();
            }
            config.max_clock_skew = Duration::seconds(secs);
        }
        Ok(config)
    }
}
