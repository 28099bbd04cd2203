//! Command-line configuration

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "orbview")]
#[command(about = "View 3D models and 360° panoramas with orbit controls")]
pub struct ViewerConfig {
    /// JSON catalog listing models and panoramas
    #[arg(short, long)]
    pub catalog: Option<PathBuf>,

    /// Page to open, e.g. "/3dModel" or "/360house"
    #[arg(short, long, default_value = "/")]
    pub route: String,

    /// Prefix all routes are mounted under
    #[arg(long, default_value = "/")]
    pub base: String,

    /// Directory relative asset URLs are resolved against. Defaults to the
    /// catalog's directory.
    #[arg(long)]
    pub asset_root: Option<PathBuf>,

    /// Initial window width in logical pixels
    #[arg(long, default_value_t = 1200)]
    pub width: u32,

    /// Initial window height in logical pixels
    #[arg(long, default_value_t = 800)]
    pub height: u32,

    /// Disable multisampling
    #[arg(long)]
    pub no_antialias: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            catalog: None,
            route: "/".to_string(),
            base: "/".to_string(),
            asset_root: None,
            width: 1200,
            height: 800,
            no_antialias: false,
        }
    }
}

impl ViewerConfig {
    pub fn asset_root(&self) -> Option<PathBuf> {
        self.asset_root.clone().or_else(|| {
            self.catalog
                .as_ref()
                .and_then(|catalog| catalog.parent())
                .filter(|dir| !dir.as_os_str().is_empty())
                .map(|dir| dir.to_path_buf())
        })
    }
}
