//! Wire-level protocol handling and the compositor-facing facade.

mod exporter;
mod importer;

use std::hash::{Hash, Hasher};

use rustc_hash::FxHashSet;
use smithay::reexports::{
    wayland_protocols::xdg::foreign::zv1::server::{
        zxdg_exporter_v1::ZxdgExporterV1, zxdg_imported_v1::ZxdgImportedV1,
        zxdg_importer_v1::ZxdgImporterV1,
    },
    wayland_server::{
        backend::{GlobalId, ObjectId},
        protocol::wl_surface::WlSurface,
        DisplayHandle, GlobalDispatch, Resource,
    },
};

use crate::{
    graph::{TransientChanged, TransientGraph},
    handle::ExportHandle,
    registry::{Exports, Imports},
};

pub use exporter::ExportedData;
pub use importer::ImportedData;

const VERSION: u32 = 1;

/// Identity-comparable reference to a `wl_surface`.
///
/// Registry and graph state is keyed by protocol object identity; the underlying handle is
/// kept alongside so notifications can name the surviving participants.
#[derive(Debug, Clone)]
pub(crate) struct SurfaceRef(pub(crate) WlSurface);

impl SurfaceRef {
    fn id(&self) -> ObjectId {
        self.0.id()
    }
}

impl PartialEq for SurfaceRef {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for SurfaceRef {}

impl Hash for SurfaceRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

/// State of the `zxdg_exporter_v1` and `zxdg_importer_v1` globals.
///
/// Every table lives on this instance and is torn down with it; nothing is process global.
/// All mutation happens on the dispatch thread through the compositor state, so no further
/// synchronization is involved.
#[derive(Debug)]
pub struct XdgForeignState {
    exporter: GlobalId,
    importer: GlobalId,
    pub(crate) exports: Exports<SurfaceRef>,
    pub(crate) imports: Imports<ObjectId, SurfaceRef>,
    pub(crate) graph: TransientGraph<SurfaceRef>,
    /// Surfaces that already carry a destruction hook.
    pub(crate) hooked: FxHashSet<ObjectId>,
}

impl XdgForeignState {
    /// Creates the `zxdg_exporter_v1` and `zxdg_importer_v1` globals.
    pub fn new<D>(display: &DisplayHandle) -> Self
    where
        D: GlobalDispatch<ZxdgExporterV1, ()> + GlobalDispatch<ZxdgImporterV1, ()> + 'static,
    {
        let exporter = display.create_global::<D, ZxdgExporterV1, _>(VERSION, ());
        let importer = display.create_global::<D, ZxdgImporterV1, _>(VERSION, ());

        Self {
            exporter,
            importer,
            exports: Exports::new(),
            imports: Imports::new(),
            graph: TransientGraph::new(),
            hooked: FxHashSet::default(),
        }
    }

    /// Id of the `zxdg_exporter_v1` global.
    pub fn exporter_global(&self) -> GlobalId {
        self.exporter.clone()
    }

    /// Id of the `zxdg_importer_v1` global.
    pub fn importer_global(&self) -> GlobalId {
        self.importer.clone()
    }

    /// The surface currently exported under `handle`.
    ///
    /// The record survives destruction of the surface itself, so the returned handle may be
    /// dead; imports check for that when redeeming.
    pub fn exported_surface(&self, handle: &str) -> Option<&WlSurface> {
        self.exports.record(handle).map(|record| &record.surface.0)
    }

    /// Surfaces currently imported under `handle`.
    pub fn imported_surfaces(&self, handle: &str) -> impl Iterator<Item = &WlSurface> + '_ {
        self.imports.records_for(handle).map(|record| &record.surface.0)
    }

    /// The current transient parent of `surface`.
    ///
    /// This is the query a compositor uses to resolve cross-client stacking and focus;
    /// `None` when `surface` has no transient parent.
    pub fn transient_for(&self, surface: &WlSurface) -> Option<&WlSurface> {
        self.graph.transient_for(&SurfaceRef(surface.clone())).map(|parent| &parent.0)
    }

    /// The child currently claimed under the exported surface `surface`.
    pub fn child_of(&self, surface: &WlSurface) -> Option<&WlSurface> {
        self.graph.child_of(&SurfaceRef(surface.clone())).map(|child| &child.0)
    }
}

/// Handler for xdg-foreign notifications.
///
/// Every notification has a default empty body; a compositor only implements the ones its
/// policy cares about.
pub trait XdgForeignHandler: Sized {
    fn xdg_foreign_state(&mut self) -> &mut XdgForeignState;

    /// A surface was exported; `handle` now names it.
    fn surface_exported(&mut self, handle: &ExportHandle, surface: &WlSurface) {
        let _ = (handle, surface);
    }

    /// A handle was redeemed; a live proxy for `surface` now exists in some client.
    fn surface_imported(&mut self, handle: &ExportHandle, surface: &WlSurface) {
        let _ = (handle, surface);
    }

    /// An import proxy claimed `child` as the transient child of the surface it represents.
    fn child_changed(&mut self, imported: &ZxdgImportedV1, child: &WlSurface) {
        let _ = (imported, child);
    }

    /// The transient relationship of a pair of surfaces changed.
    ///
    /// A side is `None` when the entity on that side is gone: `(None, parent)` after the
    /// child died, `(child, None)` after the parent identity or the importing client's
    /// proxy died.
    fn transient_changed(&mut self, child: Option<&WlSurface>, parent: Option<&WlSurface>) {
        let _ = (child, parent);
    }
}

/// Delivers a graph event once all map mutation for it is complete, so a handler that
/// re-enters the facade observes a consistent graph.
pub(crate) fn emit_transient_changed<D>(state: &mut D, changed: TransientChanged<SurfaceRef>)
where
    D: XdgForeignHandler,
{
    let TransientChanged { child, parent } = changed;
    state.transient_changed(child.as_ref().map(|s| &s.0), parent.as_ref().map(|s| &s.0));
}

/// Delegates `zxdg_exporter_v1` and `zxdg_importer_v1` handling to [`XdgForeignState`].
#[macro_export]
macro_rules! delegate_xdg_foreign {
    ($(@<$( $lt:tt $( : $clt:tt $(+ $dlt:tt )* )? ),+>)? $ty: ty) => {
        $crate::reexports::wayland_server::delegate_global_dispatch!($(@< $($lt $( : $clt $(+ $dlt )* )? ),+ >)? $ty: [
            $crate::reexports::wayland_protocols::xdg::foreign::zv1::server::zxdg_exporter_v1::ZxdgExporterV1: ()
        ] => $crate::XdgForeignState);
        $crate::reexports::wayland_server::delegate_dispatch!($(@< $($lt $( : $clt $(+ $dlt )* )? ),+ >)? $ty: [
            $crate::reexports::wayland_protocols::xdg::foreign::zv1::server::zxdg_exporter_v1::ZxdgExporterV1: ()
        ] => $crate::XdgForeignState);
        $crate::reexports::wayland_server::delegate_dispatch!($(@< $($lt $( : $clt $(+ $dlt )* )? ),+ >)? $ty: [
            $crate::reexports::wayland_protocols::xdg::foreign::zv1::server::zxdg_exported_v1::ZxdgExportedV1: $crate::ExportedData
        ] => $crate::XdgForeignState);
        $crate::reexports::wayland_server::delegate_global_dispatch!($(@< $($lt $( : $clt $(+ $dlt )* )? ),+ >)? $ty: [
            $crate::reexports::wayland_protocols::xdg::foreign::zv1::server::zxdg_importer_v1::ZxdgImporterV1: ()
        ] => $crate::XdgForeignState);
        $crate::reexports::wayland_server::delegate_dispatch!($(@< $($lt $( : $clt $(+ $dlt )* )? ),+ >)? $ty: [
            $crate::reexports::wayland_protocols::xdg::foreign::zv1::server::zxdg_importer_v1::ZxdgImporterV1: ()
        ] => $crate::XdgForeignState);
        $crate::reexports::wayland_server::delegate_dispatch!($(@< $($lt $( : $clt $(+ $dlt )* )? ),+ >)? $ty: [
            $crate::reexports::wayland_protocols::xdg::foreign::zv1::server::zxdg_imported_v1::ZxdgImportedV1: $crate::ImportedData
        ] => $crate::XdgForeignState);
    };
}
