//! CLI Commands

pub mod check;
pub mod config;
pub mod fill;
pub mod schema;

use crate::config::Config;
use crate::output::OutputFormat;
use anyhow::Result;
use dynform_client::{HttpSchemaService, ServiceConfig};

/// Settings resolved from flags, environment and the config file
pub struct Context {
    pub api_url: String,
    pub format: OutputFormat,
    pub profile: Option<String>,
    pub config: Config,
}

impl Context {
    pub fn service(&self) -> Result<HttpSchemaService> {
        tracing::debug!(api_url = %self.api_url, "using schema service");
        Ok(HttpSchemaService::new(ServiceConfig::new(self.api_url.as_str()))?)
    }
}
