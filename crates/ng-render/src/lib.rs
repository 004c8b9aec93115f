pub mod hit;
pub mod path;

pub use hit::{Hit, HitConfig, NodeRegion, hit_test};
pub use path::{LinkPath, guide_line, link_path, link_paths, svg_path};
