use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
    thread,
};

use cgmath::Matrix4;
use futures::channel::mpsc::{self, UnboundedReceiver};

use crate::error::LoadError;
use crate::gfx::scene::{Mesh, SceneNode};

/// Bytes read from the geometry file between progress reports
const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Color for parts whose material has no diffuse term
const DEFAULT_PART_COLOR: [f32; 3] = [0.8, 0.8, 0.8];

/// Events reported by a running [`ModelLoader`]
#[derive(Debug)]
pub enum LoadEvent {
    /// Geometry bytes read so far out of the file's total size
    Progress { loaded: u64, total: u64 },
    Loaded(ModelPatch),
    Failed(LoadError),
}

impl LoadEvent {
    /// `Loaded` and `Failed` end the stream
    pub fn is_terminal(&self) -> bool {
        !matches!(self, LoadEvent::Progress { .. })
    }
}

/// A parsed model ready to be appended to the scene
///
/// `root` is a group named `model`; every part is one mesh from the OBJ file
/// and becomes a direct child of the root.
#[derive(Debug)]
pub struct ModelPatch {
    pub root: SceneNode,
    pub parts: Vec<SceneNode>,
}

impl ModelPatch {
    pub fn node_count(&self) -> usize {
        1 + self.parts.len()
    }

    /// Applies a uniform scale at the root
    pub fn scaled(mut self, scale: f32) -> Self {
        self.root.transform = self.root.transform * Matrix4::from_scale(scale);
        self
    }

    /// Sets `cast_shadow` on the root and every part
    pub fn casting_shadows(mut self) -> Self {
        self.root.cast_shadow = true;
        for part in &mut self.parts {
            part.cast_shadow = true;
        }
        self
    }
}

/// Loads an OBJ/MTL pair off the render thread.
pub struct ModelLoader {
    material_path: PathBuf,
    geometry_path: PathBuf,
    chunk_size: usize,
}

impl ModelLoader {
    pub fn new(material_path: impl Into<PathBuf>, geometry_path: impl Into<PathBuf>) -> Self {
        Self {
            material_path: material_path.into(),
            geometry_path: geometry_path.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Starts loading on a background thread
    ///
    /// Exactly one terminal event (`Loaded` or `Failed`) follows any number of
    /// `Progress` events.
    pub fn spawn(self) -> LoadHandle {
        let (sender, receiver) = mpsc::unbounded();

        let spawned = thread::Builder::new()
            .name("model-loader".to_string())
            .spawn(move || {
                let progress_sender = sender.clone();
                let result = self.load(|loaded, total| {
                    // A dropped handle means nobody is listening anymore
                    let _ = progress_sender.unbounded_send(LoadEvent::Progress { loaded, total });
                });

                let event = match result {
                    Ok(patch) => LoadEvent::Loaded(patch),
                    Err(err) => LoadEvent::Failed(err),
                };
                let _ = sender.unbounded_send(event);
            });

        // The closure, and with it the sender, is dropped on failure; the
        // handle then reports `Disconnected`.
        if let Err(err) = spawned {
            log::error!("Failed to start model loader thread: {}", err);
        }

        LoadHandle::new(receiver)
    }

    /// Loads synchronously, reporting geometry read progress through `on_progress`
    pub fn load(&self, mut on_progress: impl FnMut(u64, u64)) -> Result<ModelPatch, LoadError> {
        let material_bytes = read_all(&self.material_path)?;
        let (materials, material_names) = tobj::load_mtl_buf(&mut material_bytes.as_slice())
            .map_err(|source| LoadError::Material {
                path: self.material_path.clone(),
                source,
            })?;
        log::debug!(
            "Parsed {} material(s) from {}",
            materials.len(),
            self.material_path.display()
        );

        let geometry_bytes = read_chunked(&self.geometry_path, self.chunk_size, &mut on_progress)?;

        // The material library is already in memory; any `mtllib` line resolves to it
        let (models, _) = tobj::load_obj_buf(
            &mut geometry_bytes.as_slice(),
            &tobj::LoadOptions {
                triangulate: true,
                single_index: true,
                ..Default::default()
            },
            |_| Ok((materials.clone(), material_names.clone())),
        )
        .map_err(|source| LoadError::Geometry {
            path: self.geometry_path.clone(),
            source,
        })?;

        let parts: Vec<SceneNode> = models
            .iter()
            .filter(|model| !model.mesh.indices.is_empty())
            .map(|model| {
                let mesh = &model.mesh;
                log::debug!(
                    "Part '{}': {} vertices, {} triangles",
                    model.name,
                    mesh.positions.len() / 3,
                    mesh.indices.len() / 3
                );

                let normals = if mesh.normals.len() == mesh.positions.len() {
                    mesh.normals.clone()
                } else {
                    Mesh::calculate_face_normals(&mesh.positions, &mesh.indices)
                };

                let color = mesh
                    .material_id
                    .and_then(|id| materials.get(id))
                    .and_then(|material| material.diffuse)
                    .unwrap_or(DEFAULT_PART_COLOR);

                SceneNode::mesh(
                    &model.name,
                    Mesh::new(mesh.positions.clone(), normals, mesh.indices.clone()),
                )
                .with_color(color)
            })
            .collect();

        if parts.is_empty() {
            return Err(LoadError::Empty {
                path: self.geometry_path.clone(),
            });
        }

        Ok(ModelPatch {
            root: SceneNode::group("model"),
            parts,
        })
    }
}

fn read_all(path: &Path) -> Result<Vec<u8>, LoadError> {
    std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_chunked(
    path: &Path,
    chunk_size: usize,
    on_progress: &mut impl FnMut(u64, u64),
) -> Result<Vec<u8>, LoadError> {
    let io_error = |source: std::io::Error| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(io_error)?;
    let total = file.metadata().map_err(io_error)?.len();

    let mut bytes = Vec::with_capacity(total as usize);
    let mut chunk = vec![0u8; chunk_size];
    loop {
        let read = file.read(&mut chunk).map_err(io_error)?;
        if read == 0 {
            break;
        }
        bytes.extend_from_slice(&chunk[..read]);
        on_progress(bytes.len() as u64, total.max(bytes.len() as u64));
    }

    Ok(bytes)
}

/// Receiving end of a [`ModelLoader`]
///
/// Dropping the handle abandons the load; the loader's remaining sends are
/// discarded.
pub struct LoadHandle {
    receiver: UnboundedReceiver<LoadEvent>,
    finished: bool,
}

impl LoadHandle {
    fn new(receiver: UnboundedReceiver<LoadEvent>) -> Self {
        Self {
            receiver,
            finished: false,
        }
    }

    /// Drains every event available right now without blocking
    ///
    /// A loader that disappears without a terminal event yields
    /// `Failed(LoadError::Disconnected)` once.
    pub fn poll(&mut self) -> Vec<LoadEvent> {
        let mut events = Vec::new();
        while !self.finished {
            match self.receiver.try_next() {
                Ok(Some(event)) => {
                    self.finished = event.is_terminal();
                    events.push(event);
                }
                Ok(None) => {
                    self.finished = true;
                    events.push(LoadEvent::Failed(LoadError::Disconnected));
                }
                // Channel open but empty
                Err(_) => break,
            }
        }
        events
    }

    /// Blocks until the loader finishes, returning every event it sent
    pub fn wait(self) -> Vec<LoadEvent> {
        let mut events = Vec::new();
        for event in futures::executor::block_on_stream(self.receiver) {
            let terminal = event.is_terminal();
            events.push(event);
            if terminal {
                return events;
            }
        }
        events.push(LoadEvent::Failed(LoadError::Disconnected));
        events
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAWN_MTL: &str = "newmtl Ivory\nKd 0.9 0.85 0.7\n";

    const TWO_PART_OBJ: &str = "\
mtllib Pawn.mtl
o Head
v 0 1 0
v 1 1 0
v 0.5 2 0.5
f 1 2 3
o Base
v 0 0 0
v 1 0 0
v 1 0 1
v 0 0 1
usemtl Ivory
f 4 5 6 7
";

    fn fixture_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pawnview-loader-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).expect("create fixture dir");
        dir
    }

    fn write_fixture(name: &str, mtl: &str, obj: &str) -> (PathBuf, PathBuf) {
        let dir = fixture_dir(name);
        let mtl_path = dir.join("Pawn.mtl");
        let obj_path = dir.join("Pawn.obj");
        std::fs::write(&mtl_path, mtl).expect("write mtl");
        std::fs::write(&obj_path, obj).expect("write obj");
        (mtl_path, obj_path)
    }

    #[test]
    fn test_load_builds_root_and_parts() {
        let (mtl, obj) = write_fixture("parts", PAWN_MTL, TWO_PART_OBJ);
        let patch = ModelLoader::new(mtl, obj).load(|_, _| {}).expect("fixture loads");

        assert_eq!(patch.root.name, "model");
        assert_eq!(patch.node_count(), 3);
        assert_eq!(patch.parts[0].name, "Head");
        assert_eq!(patch.parts[0].material.color, DEFAULT_PART_COLOR);
        assert_eq!(patch.parts[1].name, "Base");
        assert_eq!(patch.parts[1].material.color, [0.9, 0.85, 0.7]);

        // The quad is triangulated
        let base = patch.parts[1].mesh_ref().expect("mesh part");
        assert_eq!(base.indices().len(), 6);
    }

    #[test]
    fn test_progress_reaches_file_size() {
        let (mtl, obj) = write_fixture("progress", PAWN_MTL, TWO_PART_OBJ);
        let mut reports = Vec::new();
        ModelLoader::new(mtl, obj)
            .with_chunk_size(16)
            .load(|loaded, total| reports.push((loaded, total)))
            .expect("fixture loads");

        let total = TWO_PART_OBJ.len() as u64;
        assert!(reports.len() > 1);
        assert!(reports.windows(2).all(|pair| pair[0].0 < pair[1].0));
        assert_eq!(reports.last(), Some(&(total, total)));
    }

    #[test]
    fn test_missing_geometry_fails_with_io() {
        let (mtl, _) = write_fixture("missing", PAWN_MTL, TWO_PART_OBJ);
        let missing = fixture_dir("missing").join("Nope.obj");

        let err = ModelLoader::new(mtl, &missing).load(|_, _| {}).unwrap_err();
        assert!(matches!(err, LoadError::Io { ref path, .. } if *path == missing));
    }

    #[test]
    fn test_geometry_without_faces_is_empty() {
        let (mtl, obj) = write_fixture("empty", PAWN_MTL, "v 0 0 0\nv 1 0 0\n");
        let err = ModelLoader::new(mtl, obj).load(|_, _| {}).unwrap_err();
        assert!(matches!(err, LoadError::Empty { .. }));
    }

    #[test]
    fn test_spawned_loader_ends_with_loaded() {
        let (mtl, obj) = write_fixture("spawn", PAWN_MTL, TWO_PART_OBJ);
        let events = ModelLoader::new(mtl, obj).with_chunk_size(32).spawn().wait();

        assert!(events.len() >= 2);
        assert!(matches!(events.first(), Some(LoadEvent::Progress { .. })));
        assert!(matches!(events.last(), Some(LoadEvent::Loaded(patch)) if patch.node_count() == 3));
    }

    #[test]
    fn test_spawned_loader_reports_failure() {
        let dir = fixture_dir("spawn-missing");
        let events = ModelLoader::new(dir.join("a.mtl"), dir.join("a.obj")).spawn().wait();

        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], LoadEvent::Failed(LoadError::Io { .. })));
    }

    #[test]
    fn test_dropped_sender_reports_disconnected() {
        let (sender, receiver) = mpsc::unbounded::<LoadEvent>();
        drop(sender);

        let mut handle = LoadHandle::new(receiver);
        let events = handle.poll();
        assert!(matches!(events.as_slice(), [LoadEvent::Failed(LoadError::Disconnected)]));
        assert!(handle.is_finished());
        assert!(handle.poll().is_empty());
    }

    #[test]
    fn test_patch_scaling_and_shadow_flags() {
        let (mtl, obj) = write_fixture("flags", PAWN_MTL, TWO_PART_OBJ);
        let patch = ModelLoader::new(mtl, obj)
            .load(|_, _| {})
            .expect("fixture loads")
            .scaled(0.5)
            .casting_shadows();

        assert_eq!(patch.root.transform, Matrix4::from_scale(0.5));
        assert!(patch.root.cast_shadow);
        assert!(patch.parts.iter().all(|part| part.cast_shadow));
    }
}
