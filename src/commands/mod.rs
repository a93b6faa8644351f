// Register application subcommands.
// Each module corresponds to a specific `toolbox` command-line action.

// Adds a tool to the configuration, or updates an existing one.
pub mod add;
// Downloads and installs the configured tools.
pub mod fetch;
// Displays the version of toolbox.
pub mod version;
