//! Plugin package naming helpers.
//!
//! Plugins are npm-style packages following a naming convention:
//! official plugins are `@kiln/cli-plugin-<name>`, community plugins are
//! `kiln-cli-plugin-<name>` or `@scope/kiln-cli-plugin-<name>`. The core
//! service package is `@kiln/cli-service`.

/// Package id of the core service plugin, always invoked first.
pub const SERVICE_ID: &str = "@kiln/cli-service";

const OFFICIAL_PREFIX: &str = "@kiln/cli-plugin-";
const COMMUNITY_PREFIX: &str = "kiln-cli-plugin-";
const SCOPED_MARKER: &str = "/kiln-cli-plugin-";

/// Check whether a package id follows the plugin naming convention.
///
/// The service package is not itself a plugin.
///
/// # Examples
///
/// ```
/// use kiln_core::is_plugin;
///
/// assert!(is_plugin("@kiln/cli-plugin-babel"));
/// assert!(is_plugin("kiln-cli-plugin-markdown"));
/// assert!(is_plugin("@acme/kiln-cli-plugin-deploy"));
/// assert!(!is_plugin("@kiln/cli-service"));
/// assert!(!is_plugin("left-pad"));
/// ```
pub fn is_plugin(id: &str) -> bool {
    if id.starts_with(OFFICIAL_PREFIX) || id.starts_with(COMMUNITY_PREFIX) {
        return true;
    }
    if let Some(stripped) = id.strip_prefix('@')
        && let Some(pos) = stripped.find('/')
    {
        return stripped[pos..].starts_with(SCOPED_MARKER);
    }
    false
}

/// Strip the plugin naming convention from a package id.
///
/// Ids that do not follow the convention are returned unchanged.
///
/// # Examples
///
/// ```
/// use kiln_core::to_short_id;
///
/// assert_eq!(to_short_id("@kiln/cli-plugin-babel"), "babel");
/// assert_eq!(to_short_id("kiln-cli-plugin-markdown"), "markdown");
/// assert_eq!(to_short_id("@acme/kiln-cli-plugin-deploy"), "deploy");
/// assert_eq!(to_short_id("@kiln/cli-service"), "@kiln/cli-service");
/// ```
pub fn to_short_id(id: &str) -> &str {
    if let Some(short) = id.strip_prefix(OFFICIAL_PREFIX) {
        return short;
    }
    if let Some(short) = id.strip_prefix(COMMUNITY_PREFIX) {
        return short;
    }
    if id.starts_with('@')
        && let Some(pos) = id.find(SCOPED_MARKER)
    {
        return &id[pos + SCOPED_MARKER.len()..];
    }
    id
}

/// Check whether user input names a known plugin id.
///
/// Accepts the full package id, its short form, or the scoped shorthand
/// `@scope/<short>` for a plugin published under that scope.
///
/// # Examples
///
/// ```
/// use kiln_core::matches_plugin_id;
///
/// assert!(matches_plugin_id("babel", "@kiln/cli-plugin-babel"));
/// assert!(matches_plugin_id("@kiln/cli-plugin-babel", "@kiln/cli-plugin-babel"));
/// assert!(matches_plugin_id("@acme/deploy", "@acme/kiln-cli-plugin-deploy"));
/// assert!(!matches_plugin_id("babel", "@kiln/cli-plugin-router"));
/// ```
pub fn matches_plugin_id(input: &str, full_id: &str) -> bool {
    if input == full_id || to_short_id(input) == to_short_id(full_id) {
        return true;
    }
    if input.starts_with('@')
        && is_plugin(full_id)
        && let Some((scope, short)) = input.split_once('/')
        && let Some((full_scope, _)) = full_id.split_once('/')
        && scope == full_scope
    {
        return to_short_id(full_id) == short;
    }
    false
}
