//! Server-side `xdg-foreign` protocol support.
//!
//! The `xdg-foreign-unstable-v1` protocol pair lets one client designate a surface it owns
//! as exported and receive an opaque, unguessable handle for it; any other client can
//! redeem that handle for a `zxdg_imported_v1` proxy and declare one of its own surfaces a
//! transient child of the exported surface. The resulting cross-client parent/child
//! relationship is what a compositor uses for stacking and focus decisions, for example to
//! keep an out-of-process dialog above the sandboxed window that spawned it.
//!
//! # Overview
//!
//! [`XdgForeignState`] owns the `zxdg_exporter_v1` and `zxdg_importer_v1` globals along
//! with the export table, the import records and the transient relationship graph. The
//! compositor state implements [`XdgForeignHandler`] to receive notifications and wires up
//! dispatching with [`delegate_xdg_foreign!`]; [`XdgForeignState::transient_for`] then
//! answers the stacking query.
//!
//! Surface lifetimes are observed through smithay's compositor module, so surfaces handled
//! here must belong to a compositor using [`smithay::wayland::compositor`]. Any of the
//! three participants of a relationship (the exported surface, the importing client's
//! proxy, the claimed child surface) may die at any time, in any order; the state absorbs
//! every such teardown and reports the survivors through
//! [`XdgForeignHandler::transient_changed`].
//!
//! ```no_run
//! use xdg_foreign::reexports::wayland_server::Display;
//! use xdg_foreign::{delegate_xdg_foreign, XdgForeignHandler, XdgForeignState};
//!
//! struct App {
//!     foreign: XdgForeignState,
//! }
//!
//! impl XdgForeignHandler for App {
//!     fn xdg_foreign_state(&mut self) -> &mut XdgForeignState {
//!         &mut self.foreign
//!     }
//! }
//!
//! delegate_xdg_foreign!(App);
//!
//! let display = Display::<App>::new().unwrap();
//! let app = App {
//!     foreign: XdgForeignState::new::<App>(&display.handle()),
//! };
//! # let _ = app;
//! ```

mod graph;
mod handle;
mod protocol;
mod registry;

pub use handle::ExportHandle;
pub use protocol::{ExportedData, ImportedData, XdgForeignHandler, XdgForeignState};

pub mod reexports {
    pub use smithay::reexports::{wayland_protocols, wayland_server};
}
