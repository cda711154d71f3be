//! # upd-cli — Operator CLI for the Update Server
//!
//! Runs the `upd-core` pipeline offline, without the HTTP service.
//!
//! ## Subcommands
//!
//! - `upd digest` — SHA-512 and size of a single file.
//! - `upd manifest` — print the manifest the server would return, e.g. to
//!   publish a static `latest.yml` next to the installers.
//! - `upd check` — list which platform/arch artifacts are present for a
//!   release.
//!
//! ```bash
//! upd digest updates/Editor-1.2.0-win32-x64.exe
//! upd manifest --dir updates --product Editor --version 1.2.0 --format yaml > updates/latest.yml
//! upd check --dir updates --product Editor --version 1.2.0
//! ```
//!
//! Every handler returns the process exit code (`0` success, `1` failure).

pub mod check;
pub mod digest;
pub mod manifest;
