//! `zxdg_exporter_v1` and `zxdg_exported_v1` handling.

use smithay::reexports::{
    wayland_protocols::xdg::foreign::zv1::server::{
        zxdg_exported_v1::{self, ZxdgExportedV1},
        zxdg_exporter_v1::{self, ZxdgExporterV1},
    },
    wayland_server::{
        backend::ClientId, Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New,
        Resource,
    },
};

use super::{SurfaceRef, XdgForeignHandler, XdgForeignState};
use crate::handle::ExportHandle;

/// User data of a `zxdg_exported_v1` resource.
#[derive(Debug)]
pub struct ExportedData {
    handle: ExportHandle,
}

impl ExportedData {
    /// The handle this export is registered under.
    pub fn handle(&self) -> &ExportHandle {
        &self.handle
    }
}

impl<D> GlobalDispatch<ZxdgExporterV1, (), D> for XdgForeignState
where
    D: GlobalDispatch<ZxdgExporterV1, ()>
        + Dispatch<ZxdgExporterV1, ()>
        + XdgForeignHandler
        + 'static,
{
    fn bind(
        _state: &mut D,
        _display: &DisplayHandle,
        _client: &Client,
        resource: New<ZxdgExporterV1>,
        _global_data: &(),
        data_init: &mut DataInit<'_, D>,
    ) {
        data_init.init(resource, ());
    }
}

impl<D> Dispatch<ZxdgExporterV1, (), D> for XdgForeignState
where
    D: Dispatch<ZxdgExporterV1, ()>
        + Dispatch<ZxdgExportedV1, ExportedData>
        + XdgForeignHandler
        + 'static,
{
    fn request(
        state: &mut D,
        _client: &Client,
        _exporter: &ZxdgExporterV1,
        request: zxdg_exporter_v1::Request,
        _data: &(),
        _display: &DisplayHandle,
        data_init: &mut DataInit<'_, D>,
    ) {
        match request {
            zxdg_exporter_v1::Request::Export { id, surface } => {
                let handle = state.xdg_foreign_state().exports.insert(SurfaceRef(surface.clone()));

                // The handle is only sent once the export object is established, never
                // before.
                let exported = data_init.init(id, ExportedData { handle: handle.clone() });
                exported.handle(handle.to_string());

                tracing::debug!(%handle, surface = ?surface.id(), "exported surface");
                state.surface_exported(&handle, &surface);
            }

            zxdg_exporter_v1::Request::Destroy => {}

            _ => unreachable!(),
        }
    }
}

impl<D> Dispatch<ZxdgExportedV1, ExportedData, D> for XdgForeignState
where
    D: Dispatch<ZxdgExportedV1, ExportedData> + XdgForeignHandler + 'static,
{
    fn request(
        _state: &mut D,
        _client: &Client,
        _exported: &ZxdgExportedV1,
        request: zxdg_exported_v1::Request,
        _data: &ExportedData,
        _display: &DisplayHandle,
        _data_init: &mut DataInit<'_, D>,
    ) {
        match request {
            zxdg_exported_v1::Request::Destroy => {}

            _ => unreachable!(),
        }
    }

    fn destroyed(state: &mut D, _client: ClientId, _exported: &ZxdgExportedV1, data: &ExportedData) {
        // Destroying the export object revokes the handle. Death of the exported surface
        // does not: such records stay in the table and later imports of them fail the
        // staleness check instead.
        if let Some(record) = state.xdg_foreign_state().exports.remove(&data.handle) {
            tracing::debug!(handle = %record.handle, "unexported surface");
        }
    }
}
