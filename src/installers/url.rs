//! # Download URL Templates
//!
//! Tools that are not fetched from a GitHub release carry a download URL template such as
//!
//! ```text
//! https://dl.k8s.io/release/{{.Version}}/bin/{{.OS}}/{{.Arch}}/kubectl{{.FileExt}}
//! ```
//!
//! Placeholders use the `{{.Name}}` form (whitespace inside the braces is fine) and are limited
//! to a fixed set of names:
//!
//! | Placeholder    | Value                                        |
//! |----------------|----------------------------------------------|
//! | `Version`      | resolved version as given, e.g. `v1.30.0`    |
//! | `VersionNum`   | resolved version without a leading `v`       |
//! | `OS`           | platform OS token, e.g. `linux`              |
//! | `Arch`         | platform arch token, e.g. `amd64`            |
//! | `ArchBIT`      | native pointer width in bits, e.g. `64`      |
//! | `FileExt`      | native executable suffix (`.exe` or empty)   |

use crate::libs::errors::FetchError;
use crate::libs::utilities::platform::Platform;
use crate::log_debug;

/// Looks up the value of a single placeholder.
fn placeholder_value(name: &str, version: &str, platform: &Platform) -> Option<String> {
    let value = match name {
        "Version" => version.to_string(),
        "VersionNum" => version.strip_prefix('v').unwrap_or(version).to_string(),
        "OS" => platform.os.clone(),
        "Arch" => platform.arch.clone(),
        "ArchBIT" => usize::BITS.to_string(),
        "FileExt" => platform.exe_suffix().to_string(),
        _ => return None,
    };
    Some(value)
}

/// Substitutes every `{{.Name}}` placeholder in `template`.
///
/// # Errors
/// `FetchError::Template` for an unknown placeholder or an unterminated `{{`.
pub fn render_template(template: &str, version: &str, platform: &Platform) -> Result<String, FetchError> {
    let error = |reason: String| FetchError::Template {
        template: template.to_string(),
        reason,
    };

    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        rendered.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let end = after_open
            .find("}}")
            .ok_or_else(|| error("unterminated '{{'".to_string()))?;
        let inner = after_open[..end].trim();
        let name = inner
            .strip_prefix('.')
            .ok_or_else(|| error(format!("expected '{{{{.Name}}}}', found '{{{{{inner}}}}}'")))?;
        let value = placeholder_value(name, version, platform)
            .ok_or_else(|| error(format!("unknown placeholder '{name}'")))?;
        rendered.push_str(&value);
        rest = &after_open[end + 2..];
    }
    rendered.push_str(rest);

    log_debug!("[URL] Rendered {} to {}", template, rendered);
    Ok(rendered)
}
