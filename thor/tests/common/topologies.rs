use crate::common::virtual_mesh::VirtualMesh;

/// The canonical three-node story: node 1 has a payload for the sink,
/// node 2 is a mule with no uplink, node 3 is the gateway.
pub fn victim_mule_gateway() -> VirtualMesh {
    VirtualMesh::create(
        &[(1, false), (2, false), (3, true)],
        &[(1, 2, -65), (2, 3, -72)],
    )
}

/// One hub with a spread of candidate hops: a too-close gateway, an
/// ideal-band gateway, a mule that knows a gateway (indirect) and a plain
/// explorer.
pub fn crowded_neighbourhood() -> VirtualMesh {
    VirtualMesh::create(
        &[(1, false), (2, true), (3, true), (4, false), (5, false)],
        &[(1, 2, -40), (1, 3, -60), (1, 4, -65), (1, 5, -70), (4, 3, -75)],
    )
}
