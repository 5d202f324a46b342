use crate::resources::geometry::Geometry;

#[must_use]
pub fn create_box(width: f32, height: f32, depth: f32) -> Geometry {
    let w = width / 2.0;
    let h = height / 2.0;
    let d = depth / 2.0;

    // 24 vertices (4 per face)
    let positions = vec![
        // Front face (+Z)
        [-w, -h, d],
        [w, -h, d],
        [w, h, d],
        [-w, h, d],
        // Back face (-Z)
        [-w, -h, -d],
        [-w, h, -d],
        [w, h, -d],
        [w, -h, -d],
        // Top face (+Y)
        [-w, h, -d],
        [-w, h, d],
        [w, h, d],
        [w, h, -d],
        // Bottom face (-Y)
        [-w, -h, -d],
        [w, -h, -d],
        [w, -h, d],
        [-w, -h, d],
        // Right face (+X)
        [w, -h, -d],
        [w, h, -d],
        [w, h, d],
        [w, -h, d],
        // Left face (-X)
        [-w, -h, -d],
        [-w, -h, d],
        [-w, h, d],
        [-w, h, -d],
    ];

    // All 4 vertices of each face share the same normal.
    let face_normals: [[f32; 3]; 6] = [
        [0.0, 0.0, 1.0],
        [0.0, 0.0, -1.0],
        [0.0, 1.0, 0.0],
        [0.0, -1.0, 0.0],
        [1.0, 0.0, 0.0],
        [-1.0, 0.0, 0.0],
    ];
    let normals: Vec<[f32; 3]> = face_normals
        .iter()
        .flat_map(|n| std::iter::repeat_n(*n, 4))
        .collect();

    let uvs: Vec<[f32; 2]> = (0..6)
        .flat_map(|_| [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]])
        .collect();

    // 2 triangles per face, CCW winding.
    let indices: Vec<u32> = (0..6u32)
        .flat_map(|face| {
            let base = face * 4;
            [base, base + 1, base + 2, base, base + 2, base + 3]
        })
        .collect();

    let mut geo = Geometry::new();
    geo.name = "Box".to_string();
    geo.positions = positions;
    geo.normals = normals;
    geo.uvs = uvs;
    geo.indices = indices;
    geo.compute_bounding_volume();

    geo
}
