//! Runtime-plugin name normalization (§4.5): "Normalizes input names by
//! ensuring a prefix (`xllr.`)".

const PREFIX: &str = "xllr.";

/// Ensure `name` carries the `xllr.` prefix, adding it if absent.
pub fn normalize(name: &str) -> String {
    if name.starts_with(PREFIX) {
        name.to_string()
    } else {
        format!("{PREFIX}{name}")
    }
}
