// Sources a tool can be installed from.
// `github` resolves releases and their assets, `url` renders download URL templates
// (used for both `downloadURL` and `google` tools).
pub mod github;
pub mod url;
