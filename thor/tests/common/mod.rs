pub mod topologies;
pub mod virtual_mesh;
