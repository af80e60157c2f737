use serde::Serialize;
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Root of an aaPanel installation. Fixed by the panel, not configurable.
pub const PANEL_DIR: &str = "/www/server/panel";
/// Directory holding the panel's plugin-management modules.
pub const PANEL_CLASS_DIR: &str = "/www/server/panel/class";

/// Bridge exit code reserved for "panelPlugin could not be imported".
const IMPORT_FAILED: i32 = 3;

/// Parameters for one panel install call.
///
/// The panel reads these through dict-style access with per-field
/// defaults; the serialized keys follow the panel's own naming.
#[derive(Debug, Serialize)]
pub struct InstallRequest {
    #[serde(rename = "name")]
    pub identifier: &'static str,
    #[serde(rename = "sName")]
    pub display_name: &'static str,
    pub version: &'static str,
    #[serde(rename = "type")]
    pub type_code: &'static str,
}

impl InstallRequest {
    /// The one request this tool ever makes: nginx, latest stable branch.
    pub fn nginx() -> Self {
        Self {
            identifier: "nginx",
            display_name: "nginx",
            version: "1.26",
            type_code: "0",
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        match field {
            "identifier" => Some(self.identifier),
            "display_name" => Some(self.display_name),
            "version" => Some(self.version),
            "type_code" => Some(self.type_code),
            _ => None,
        }
    }

    pub fn get_or<'a>(&'a self, field: &str, default: &'a str) -> &'a str {
        self.get(field).unwrap_or(default)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PanelError {
    #[error("aaPanel files not found at {0}")]
    NotInstalled(PathBuf),
    #[error("panel bridge failed: {0}")]
    Bridge(String),
    #[error("could not run the panel bridge")]
    Io(#[from] std::io::Error),
    #[error("panel returned unparseable output")]
    BadOutput(#[from] serde_json::Error),
}

/// The external capability: something that can accept one install request.
pub trait PluginHost {
    /// Verify the panel's plugin interface is reachable.
    fn probe(&self) -> Result<(), PanelError>;

    /// Ask the panel to start installing the requested package. Blocks
    /// until the panel has accepted (not completed) the request.
    fn install(&self, request: &InstallRequest) -> Result<Value, PanelError>;
}

/// Interprets a result field the way the panel's own runtime would.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Real adapter: drives the panel's Python plugin interface in a child
/// process, passing the request on stdin and reading the result as JSON
/// from stdout.
pub struct Aapanel;

fn bridge_program() -> String {
    format!(
        r#"import sys, json
sys.path.insert(0, {root:?})
sys.path.insert(0, {class_dir:?})
try:
    import panelPlugin
except ImportError as exc:
    sys.stderr.write(str(exc))
    sys.exit({import_failed})

class Args:
    def __init__(self, fields):
        self.__dict__.update(fields)
    def __getitem__(self, key):
        return getattr(self, key, None)
    def get(self, key, default=None):
        return getattr(self, key, default)

result = panelPlugin.panelPlugin().install(Args(json.load(sys.stdin)))
print(json.dumps(result))
"#,
        root = PANEL_DIR,
        class_dir = PANEL_CLASS_DIR,
        import_failed = IMPORT_FAILED,
    )
}

impl PluginHost for Aapanel {
    fn probe(&self) -> Result<(), PanelError> {
        let root = Path::new(PANEL_DIR);
        let class_dir = Path::new(PANEL_CLASS_DIR);
        if !root.is_dir() || !class_dir.is_dir() {
            return Err(PanelError::NotInstalled(root.to_path_buf()));
        }
        let plugin_module = class_dir.join("panelPlugin.py");
        if !plugin_module.exists() {
            return Err(PanelError::NotInstalled(plugin_module));
        }
        Ok(())
    }

    fn install(&self, request: &InstallRequest) -> Result<Value, PanelError> {
        let mut child = Command::new("python3")
            .arg("-c")
            .arg(bridge_program())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let payload = serde_json::to_vec(request)?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&payload)?;
        }

        let output = child.wait_with_output()?;
        if output.status.code() == Some(IMPORT_FAILED) {
            return Err(PanelError::NotInstalled(PathBuf::from(PANEL_CLASS_DIR)));
        }
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(PanelError::Bridge(if stderr.is_empty() {
                format!("bridge exited with {}", output.status)
            } else {
                stderr
            }));
        }
        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_known_fields() {
        let r = InstallRequest::nginx();
        assert_eq!(r.get("identifier"), Some("nginx"));
        assert_eq!(r.get("display_name"), Some("nginx"));
        assert_eq!(r.get("version"), Some("1.26"));
        assert_eq!(r.get("type_code"), Some("0"));
    }

    #[test]
    fn request_unknown_fields_fall_back_to_default() {
        let r = InstallRequest::nginx();
        assert_eq!(r.get("channel"), None);
        assert_eq!(r.get_or("channel", "stable"), "stable");
        assert_eq!(r.get_or("version", "stable"), "1.26");
    }

    #[test]
    fn request_serializes_with_panel_keys() {
        let wire = serde_json::to_value(InstallRequest::nginx()).expect("serialize request");
        assert_eq!(
            wire,
            json!({"name": "nginx", "sName": "nginx", "version": "1.26", "type": "0"})
        );
    }

    #[test]
    fn truthiness_follows_panel_rules() {
        assert!(truthy(&json!(true)));
        assert!(truthy(&json!(1)));
        assert!(truthy(&json!("ok")));
        assert!(truthy(&json!({"msg": "done"})));
        assert!(!truthy(&json!(false)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!("")));
        assert!(!truthy(&json!(null)));
        assert!(!truthy(&json!([])));
    }

    #[test]
    fn bridge_program_reaches_panel_paths() {
        let code = bridge_program();
        assert!(code.contains(PANEL_DIR));
        assert!(code.contains(PANEL_CLASS_DIR));
        assert!(code.contains("import panelPlugin"));
    }
}
