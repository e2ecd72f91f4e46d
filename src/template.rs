use crate::config::McpConfigDocument;
use anyhow::{Context, Result};

/// Example project document shown by `mcp-sync template`.
const DEFAULT_TEMPLATE: &str = r#"{
  "mcpServers": {
    "filesystem": {
      "command": "npx",
      "args": ["-y", "@modelcontextprotocol/server-filesystem", "/path/to/directory"]
    },
    "custom-server": {
      "command": "python",
      "args": ["/path/to/custom/server.py"],
      "env": {"API_KEY": "your-api-key"}
    }
  }
}"#;

/// The example project document, decoded.
///
/// # Errors
///
/// Returns an error if the embedded template does not decode.
pub fn project_template() -> Result<McpConfigDocument> {
    serde_json::from_str(DEFAULT_TEMPLATE).context("Failed to parse built-in project template")
}

/// The example project document as pretty JSON, ready to paste into `.mcp.json`.
///
/// # Errors
///
/// Returns an error if the template cannot be decoded or encoded.
pub fn render_project_template() -> Result<String> {
    let template = project_template()?;
    serde_json::to_string_pretty(&template).context("Failed to render project template")
}
