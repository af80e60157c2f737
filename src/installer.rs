use crate::panel::{truthy, InstallRequest, PluginHost};
use std::io::Write;

/// Run the whole install flow against `host`, writing progress to `out`.
///
/// Returns the process exit code: 0 when the panel accepted the install,
/// 1 for every failure (panel missing, call failed, non-success result).
pub fn run(host: &dyn PluginHost, out: &mut dyn Write) -> anyhow::Result<u8> {
    writeln!(out, "{}", "=".repeat(50))?;
    writeln!(out, "Installing Nginx via aaPanel API")?;
    writeln!(out, "{}", "=".repeat(50))?;

    if let Err(e) = host.probe() {
        writeln!(out, "Error locating aaPanel modules: {}", e)?;
        writeln!(out)?;
        writeln!(
            out,
            "This tool must be run on a server with aaPanel installed."
        )?;
        return Ok(1);
    }

    let request = InstallRequest::nginx();
    writeln!(out, "Attempting to install nginx...")?;
    writeln!(out, "Plugin name: {}", request.display_name)?;
    writeln!(out, "Version: {}", request.version)?;
    writeln!(out)?;

    let result = match host.install(&request) {
        Ok(result) => result,
        Err(e) => {
            writeln!(out, "Error during installation: {}", e)?;
            writeln!(out, "{:?}", anyhow::Error::from(e))?;
            return Ok(1);
        }
    };

    writeln!(out, "Installation result:")?;
    writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?;

    if result.get("status").map(truthy).unwrap_or(false) {
        writeln!(out)?;
        writeln!(out, "✓ Nginx installation started successfully!")?;
        writeln!(
            out,
            "This may take a few minutes. You can check the progress in the aaPanel web interface."
        )?;
        Ok(0)
    } else {
        let msg = result
            .get("msg")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error");
        writeln!(out)?;
        writeln!(out, "✗ Failed to start nginx installation")?;
        writeln!(out, "Error: {}", msg)?;
        Ok(1)
    }
}
