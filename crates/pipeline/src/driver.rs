use tracing::{info, instrument, warn};

use brep_geometry::GeometryModel;
use brep_mesh::Mesh;

use crate::collaborators::{MesherStatus, SurfaceMesher, SurfaceOptimizer, VolumeMesher};
use crate::edges;
use crate::errors::MeshingError;
use crate::params::{MeshSizePoint, MeshingParameters, MeshingStep};
use crate::progress::{Progress, TaskGuard};
use crate::sizing;
use crate::surface;

/// The external engines a run may use. The surface mesher is required;
/// volume meshing and surface optimization are optional and skipped when
/// absent.
pub struct Collaborators<'a> {
    pub surface: &'a mut dyn SurfaceMesher,
    pub volume: Option<&'a mut dyn VolumeMesher>,
    pub optimizer: Option<&'a mut dyn SurfaceOptimizer>,
}

/// Run the pipeline: analyse, edges, surface (+optimization), volume
/// (+optimization), honouring the inclusive `perfstepsstart`/`perfstepsend`
/// range and polling for cooperative cancellation between stages.
/// Cancellation is a silent early success.
#[instrument(skip_all)]
pub fn generate_mesh<'a>(
    model: &GeometryModel,
    mesh: &mut Mesh,
    mp: &MeshingParameters,
    collab: &'a mut Collaborators<'a>,
    progress: &dyn Progress,
) -> Result<(), MeshingError> {
    progress.set_percent(0.0);

    // copy so the caller's parameter set stays untouched
    let mut mp = mp.clone();
    for (p, h) in &model.restricted_h {
        mp.meshsize_points.push(MeshSizePoint::new(*p, *h));
    }

    if mp.perfstepsstart <= MeshingStep::Analyse {
        sizing::analyse(model, mesh, &mp, progress)?;
    }
    if progress.is_cancelled() || mp.perfstepsend <= MeshingStep::Analyse {
        return Ok(());
    }

    if mp.perfstepsstart <= MeshingStep::MeshEdges {
        edges::mesh_edges(model, mesh, &mp, progress)?;
    }
    if progress.is_cancelled() || mp.perfstepsend <= MeshingStep::MeshEdges {
        return Ok(());
    }

    if model.dimension == 1 {
        finalize_mesh(model, mesh);
        mesh.dimension = 1;
        return Ok(());
    }

    if mp.perfstepsstart <= MeshingStep::MeshSurface {
        let optimizer = collab.optimizer.as_mut().map(|o| &mut **o);
        let n_failed =
            surface::mesh_surface(model, mesh, &mp, collab.surface, optimizer, progress)?;
        if n_failed > 0 {
            warn!(n_failed, "surface meshing errors, skipping volume steps");
            return Ok(());
        }
    }
    if progress.is_cancelled() || mp.perfstepsend <= MeshingStep::OptSurface {
        return Ok(());
    }

    if model.dimension == 2 {
        finalize_mesh(model, mesh);
        mesh.dimension = 2;
        return Ok(());
    }

    if mp.perfstepsstart <= MeshingStep::MeshVolume {
        let _task = TaskGuard::new(progress, "Volume meshing");
        if let Some(volume) = collab.volume.as_mut() {
            if volume.mesh_volume(&mp, mesh) != MesherStatus::Ok {
                return Err(MeshingError::VolumeFailed);
            }
            if progress.is_cancelled() {
                return Ok(());
            }
            volume.analyze_quality(mesh);
        } else {
            info!("no volume mesher attached, skipping volume stage");
        }
    }
    if progress.is_cancelled() || mp.perfstepsend <= MeshingStep::MeshVolume {
        return Ok(());
    }

    if mp.perfstepsstart <= MeshingStep::OptVolume {
        let _task = TaskGuard::new(progress, "Volume optimization");
        if let Some(volume) = collab.volume.as_mut() {
            volume.optimize_volume(&mp, mesh);
        }
        if progress.is_cancelled() {
            return Ok(());
        }
    }

    finalize_mesh(model, mesh);
    Ok(())
}

/// Carry solid names into the mesh material table.
fn finalize_mesh(model: &GeometryModel, mesh: &mut Mesh) {
    for (i, solid) in model.solids.iter().enumerate() {
        if let Some(name) = &solid.properties.name {
            mesh.set_material(i + 1, name.clone());
        }
    }
}
