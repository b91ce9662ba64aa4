pub struct Tessellation {
    pub vertices: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub tex_coords: Vec<[f32; 2]>,
}

impl Tessellation {
    pub fn with_capacity(vertex_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            normals: Vec::with_capacity(vertex_count),
            tex_coords: Vec::with_capacity(vertex_count),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn push(&mut self, position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) {
        self.vertices.push(position);
        self.normals.push(normal);
        self.tex_coords.push(tex_coord);
    }
}
