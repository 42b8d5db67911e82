use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use ceiba_core::config::FiscalConfig;

/// Refusal for identifications that are neither a NIT nor a CUI.
pub const INVALID_IDENTIFICATION: &str = "failed: La identificación proporcionada no es válida. \
     Debe ser un NIT (9 dígitos) o un CUI (13 dígitos).";

const LOOKUP_TIMEOUT_SECS: u64 = 15;

/// Taxpayer-registry lookups against the Guatemalan SAT.
#[async_trait]
pub trait FiscalLookup: Send + Sync {
    async fn lookup_nit(&self, nit: &str) -> Result<String>;
    async fn lookup_cui(&self, cui: &str) -> Result<String>;
}

/// HTTP bridge to the SAT web service.
pub struct SatWebService {
    client: reqwest::Client,
    base_url: String,
}

impl SatWebService {
    pub fn new(config: &FiscalConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(LOOKUP_TIMEOUT_SECS))
            .build()
            .context("could not build the fiscal HTTP client")?;
        Ok(Self { client, base_url: config.base_url.trim_end_matches('/').to_string() })
    }

    async fn fetch_name(&self, kind: &str, identification: &str) -> Result<String> {
        let url = format!("{}/{kind}/{identification}", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("fiscal request could not be sent")?
            .error_for_status()
            .context("fiscal service rejected the request")?;
        let payload: TaxpayerRecord =
            response.json().await.context("could not decode the fiscal response")?;
        Ok(payload.nombre)
    }
}

#[derive(Deserialize)]
struct TaxpayerRecord {
    nombre: String,
}

#[async_trait]
impl FiscalLookup for SatWebService {
    async fn lookup_nit(&self, nit: &str) -> Result<String> {
        self.fetch_name("nit", nit).await
    }

    async fn lookup_cui(&self, cui: &str) -> Result<String> {
        self.fetch_name("cui", cui).await
    }
}

/// Resolves a taxpayer name by identification, routing on the document
/// length: 9 digits is a NIT, 13 a CUI. Service failures come back as text,
/// never as an error.
pub async fn consultar_identificacion(lookup: &dyn FiscalLookup, identificacion: &str) -> String {
    let id = identificacion.trim();
    let resolved = match id.chars().count() {
        9 => lookup.lookup_nit(id).await,
        13 => lookup.lookup_cui(id).await,
        _ => return INVALID_IDENTIFICATION.to_string(),
    };
    match resolved {
        Ok(nombre) => nombre,
        Err(error) => format!("Error al consultar la identificación en el SAT: {error}"),
    }
}
