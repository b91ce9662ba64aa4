pub mod light;
pub mod mesh;
pub mod surface;

pub use light::LightAnimation;
pub use mesh::Tessellation;
pub use surface::SurfaceParameters;
