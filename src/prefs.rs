//! Client preference file pointing the client app at the current address.
use crate::config::ConfigDocument;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::net::Ipv4Addr;
use std::path::PathBuf;

pub const PREFERENCES_FILE_NAME: &str = "config.pref";
/// Port of the streaming service the preference file connects to.
pub const STREAM_PORT: u16 = 8089;

pub fn render_preferences(address: Ipv4Addr) -> String {
    format!(
        r#"<?xml version="1.0" standalone="yes"?>
<preferences>
    <preference version="1" name="cot_streams">
        <entry key="count" class="class java.lang.Integer">1</entry>
        <entry key="description0" class="class java.lang.String">BLOX-TAK-SERVER</entry>
        <entry key="enabled0" class="class java.lang.Boolean">true</entry>
        <entry key="connectString0" class="class java.lang.String">{address}:{STREAM_PORT}:ssl</entry>
    </preference>
    <preference version="1" name="com.atakmap.app_preferences">
        <entry key="displayServerConnectionWidget" class="class java.lang.Boolean">true</entry>
    </preference>
</preferences>
"#
    )
}

/// Write `<paths.preferences_output>/config.pref` for the stored address.
pub fn write_preferences(doc: &ConfigDocument) -> Result<PathBuf> {
    let address: Ipv4Addr = doc
        .network
        .external_ip
        .trim()
        .parse()
        .map_err(|_| {
            anyhow!(
                "network.external_ip {:?} is not an IPv4 address (run `troster resolve-ip` first)",
                doc.network.external_ip
            )
        })?;
    let dir = doc
        .paths
        .preferences_output
        .as_ref()
        .ok_or_else(|| anyhow!("paths.preferences_output is not set"))?;
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let path = dir.join(PREFERENCES_FILE_NAME);
    fs::write(&path, render_preferences(address))
        .with_context(|| format!("write {}", path.display()))?;
    tracing::info!(path = %path.display(), %address, "preference file written");
    Ok(path)
}
