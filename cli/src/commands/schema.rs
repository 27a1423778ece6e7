//! Schema command

use super::Context;
use anyhow::{Context as _, Result};
use dynform_client::SchemaService;

pub async fn handle(roll_number: Option<String>, ctx: &Context) -> Result<()> {
    let roll_number = roll_number
        .or_else(|| ctx.config.roll_number.clone())
        .context("no roll number given; pass --roll-number or run `dynform config set roll_number <value>`")?;

    let form = ctx.service()?.fetch_form(&roll_number).await?;
    ctx.format.print(&form)
}
