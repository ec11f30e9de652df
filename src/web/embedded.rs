use rust_embed::RustEmbed;

/// Static client assets, served by the SPA fallback handler.
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/ui/dist/"]
pub struct Assets;
