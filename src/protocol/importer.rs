//! `zxdg_importer_v1` and `zxdg_imported_v1` handling.
//!
//! Importing is where all three lifetimes meet: the export record, the importing client's
//! proxy and the surface later claimed as a child can each die at an arbitrary time, so
//! every path through here funnels into the graph's single-consumption destruction
//! channels.

use smithay::{
    reexports::{
        wayland_protocols::xdg::foreign::zv1::server::{
            zxdg_imported_v1::{self, ZxdgImportedV1},
            zxdg_importer_v1::{self, ZxdgImporterV1},
        },
        wayland_server::{
            backend::ClientId, protocol::wl_surface::WlSurface, Client, DataInit, Dispatch,
            DisplayHandle, GlobalDispatch, New, Resource,
        },
    },
    wayland::compositor,
};

use super::{emit_transient_changed, SurfaceRef, XdgForeignHandler, XdgForeignState};
use crate::handle::ExportHandle;

/// User data of a `zxdg_imported_v1` resource.
#[derive(Debug)]
pub struct ImportedData {
    handle: ExportHandle,
    /// The exported surface this proxy represents; `None` for proxies that were dead on
    /// arrival (unknown or stale handle). Requests on such a proxy are ignored.
    surface: Option<SurfaceRef>,
}

impl ImportedData {
    /// The handle this import redeemed.
    pub fn handle(&self) -> &ExportHandle {
        &self.handle
    }
}

impl<D> GlobalDispatch<ZxdgImporterV1, (), D> for XdgForeignState
where
    D: GlobalDispatch<ZxdgImporterV1, ()>
        + Dispatch<ZxdgImporterV1, ()>
        + XdgForeignHandler
        + 'static,
{
    fn bind(
        _state: &mut D,
        _display: &DisplayHandle,
        _client: &Client,
        resource: New<ZxdgImporterV1>,
        _global_data: &(),
        data_init: &mut DataInit<'_, D>,
    ) {
        data_init.init(resource, ());
    }
}

impl<D> Dispatch<ZxdgImporterV1, (), D> for XdgForeignState
where
    D: Dispatch<ZxdgImporterV1, ()>
        + Dispatch<ZxdgImportedV1, ImportedData>
        + XdgForeignHandler
        + 'static,
{
    fn request(
        state: &mut D,
        _client: &Client,
        _importer: &ZxdgImporterV1,
        request: zxdg_importer_v1::Request,
        _data: &(),
        _display: &DisplayHandle,
        data_init: &mut DataInit<'_, D>,
    ) {
        match request {
            zxdg_importer_v1::Request::Import { id, handle } => {
                // Resolve the handle, treating a record whose surface is already gone the
                // same as no record at all.
                let resolved = state.xdg_foreign_state().exports.record(&handle).and_then(|record| {
                    record
                        .surface
                        .0
                        .is_alive()
                        .then(|| (record.handle.clone(), record.surface.clone()))
                });

                let Some((handle, surface)) = resolved else {
                    // Not a protocol error: the new object is told it is already dead and
                    // nothing is registered. The importing client treats created then
                    // immediately destroyed as a failed import.
                    tracing::debug!(%handle, "import of unknown or stale handle");

                    let imported = data_init.init(
                        id,
                        ImportedData {
                            handle: ExportHandle::from_wire(handle),
                            surface: None,
                        },
                    );
                    imported.destroyed();
                    return;
                };

                let imported = data_init.init(
                    id,
                    ImportedData {
                        handle: handle.clone(),
                        surface: Some(surface.clone()),
                    },
                );
                state
                    .xdg_foreign_state()
                    .imports
                    .insert(handle.clone(), imported.id(), surface.clone());

                tracing::debug!(%handle, surface = ?surface.id(), "imported surface");
                state.surface_imported(&handle, &surface.0);
            }

            zxdg_importer_v1::Request::Destroy => {}

            _ => unreachable!(),
        }
    }
}

impl<D> Dispatch<ZxdgImportedV1, ImportedData, D> for XdgForeignState
where
    D: Dispatch<ZxdgImportedV1, ImportedData> + XdgForeignHandler + 'static,
{
    fn request(
        state: &mut D,
        _client: &Client,
        imported: &ZxdgImportedV1,
        request: zxdg_imported_v1::Request,
        data: &ImportedData,
        _display: &DisplayHandle,
        _data_init: &mut DataInit<'_, D>,
    ) {
        match request {
            zxdg_imported_v1::Request::SetParentOf { surface: child } => {
                let Some(parent) = data.surface.clone() else {
                    return;
                };

                // A participant the client already destroyed cannot enter the graph.
                if !child.is_alive() || !parent.0.is_alive() {
                    tracing::debug!("ignoring set_parent_of with a dead participant");
                    return;
                }

                let changed = {
                    let foreign = state.xdg_foreign_state();
                    match foreign.graph.set_parent(SurfaceRef(child.clone()), parent.clone()) {
                        Ok(changed) => changed,
                        Err(err) => {
                            tracing::debug!(%err, "ignoring set_parent_of");
                            return;
                        }
                    }
                };

                arm_destruction_hook::<D>(state, &child);
                arm_destruction_hook::<D>(state, &parent.0);

                tracing::trace!(child = ?child.id(), parent = ?parent.id(), "transient parent set");

                state.child_changed(imported, &child);
                emit_transient_changed(state, changed);
            }

            zxdg_imported_v1::Request::Destroy => {}

            _ => unreachable!(),
        }
    }

    fn destroyed(state: &mut D, _client: ClientId, imported: &ZxdgImportedV1, data: &ImportedData) {
        let Some(parent) = data.surface.as_ref() else {
            return;
        };

        // The underlying surface may well be alive; only this client's view of it is gone.
        let changed = {
            let foreign = state.xdg_foreign_state();
            foreign.imports.remove(&imported.id());
            foreign.graph.import_destroyed(parent)
        };

        tracing::debug!(handle = %data.handle, "import released");

        if let Some(changed) = changed {
            emit_transient_changed(state, changed);
        }
    }
}

/// Arms the fire-once destruction hook for `surface`, at most once per surface.
///
/// The fired hook consults the graph's per-edge triggers, so firing after the edge is
/// already gone, or for a surface whose edges were replaced long ago, is absorbed as a
/// no-op rather than a duplicate notification.
fn arm_destruction_hook<D>(state: &mut D, surface: &WlSurface)
where
    D: XdgForeignHandler + 'static,
{
    if !state.xdg_foreign_state().hooked.insert(surface.id()) {
        return;
    }

    compositor::add_destruction_hook(surface, |state: &mut D, surface: &WlSurface| {
        let events = {
            let foreign = state.xdg_foreign_state();
            foreign.hooked.remove(&surface.id());
            foreign.graph.surface_destroyed(&SurfaceRef(surface.clone()))
        };

        for changed in events {
            emit_transient_changed(state, changed);
        }
    });
}
