// Helpers shared by the installer: downloading, unpacking, locating and placing binaries,
// plus the optional post-processing steps.

// Declare the `assets` module (HTTP downloads).
pub mod assets;
pub mod binary;
// Declare the `compression` module (archive extraction).
pub mod compression;
pub mod path_helpers;
pub mod platform;
pub mod upx;
pub mod validation;
