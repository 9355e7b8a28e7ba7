//! Shader sources
//!
//! The sprite program is a WGSL vertex/fragment pair read from disk before
//! the loop starts. A missing file is logged and the copy compiled into the
//! binary is used instead, so the loop still has something to draw with.

use std::path::Path;

pub const SPRITE_VERTEX_WGSL: &str = include_str!("../../../assets/shaders/sprite.vert.wgsl");
pub const SPRITE_FRAGMENT_WGSL: &str = include_str!("../../../assets/shaders/sprite.frag.wgsl");

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Source text for one program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex_label: String,
    pub vertex: String,
    pub fragment_label: String,
    pub fragment: String,
}

impl ShaderSources {
    pub fn embedded_sprite() -> Self {
        Self {
            vertex_label: "sprite.vert.wgsl (embedded)".to_string(),
            vertex: SPRITE_VERTEX_WGSL.to_string(),
            fragment_label: "sprite.frag.wgsl (embedded)".to_string(),
            fragment: SPRITE_FRAGMENT_WGSL.to_string(),
        }
    }

    /// Read both stages from disk, falling back per stage to the embedded
    /// sprite shaders.
    pub fn load_or_embedded(vertex_path: &Path, fragment_path: &Path) -> Self {
        let (vertex_label, vertex) = read_stage(vertex_path, "sprite.vert.wgsl", SPRITE_VERTEX_WGSL);
        let (fragment_label, fragment) =
            read_stage(fragment_path, "sprite.frag.wgsl", SPRITE_FRAGMENT_WGSL);
        Self {
            vertex_label,
            vertex,
            fragment_label,
            fragment,
        }
    }
}

fn read_stage(path: &Path, embedded_name: &str, embedded: &str) -> (String, String) {
    match std::fs::read_to_string(path) {
        Ok(source) => {
            tracing::info!(path = %path.display(), "Shader source loaded");
            (path.display().to_string(), source)
        }
        Err(err) => {
            tracing::error!(
                path = %path.display(),
                error = %err,
                "Failed to read shader source, using embedded copy"
            );
            (format!("{} (embedded)", embedded_name), embedded.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_sources_define_entry_points() {
        let sources = ShaderSources::embedded_sprite();
        assert!(sources.vertex.contains(VERTEX_ENTRY));
        assert!(sources.fragment.contains(FRAGMENT_ENTRY));
    }

    #[test]
    fn test_missing_files_fall_back_to_embedded() {
        let sources = ShaderSources::load_or_embedded(
            Path::new("no/such/vertex.wgsl"),
            Path::new("no/such/fragment.wgsl"),
        );
        assert_eq!(sources.vertex, SPRITE_VERTEX_WGSL);
        assert_eq!(sources.fragment, SPRITE_FRAGMENT_WGSL);
        assert!(sources.vertex_label.ends_with("(embedded)"));
    }

    #[test]
    fn test_files_on_disk_are_preferred() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/shaders");
        let sources = ShaderSources::load_or_embedded(
            &root.join("sprite.vert.wgsl"),
            &root.join("sprite.frag.wgsl"),
        );
        assert!(!sources.vertex_label.ends_with("(embedded)"));
        assert_eq!(sources.vertex, SPRITE_VERTEX_WGSL);
    }
}
